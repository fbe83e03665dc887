use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::models::CodeRecord;
use crate::services::store::{CodeStore, Durability, StoreError};

/// In-process code cache used when the durable store is unreachable
///
/// Records here are only visible to this instance and are lost on restart,
/// so every write reports [`Durability::Local`].
pub struct LocalCodeCache {
    entries: moka::future::Cache<String, CodeRecord>,
}

impl LocalCodeCache {
    /// Create a cache holding at most `capacity` codes, each kept no longer than `ttl`
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let entries = moka::future::CacheBuilder::new(capacity)
            .time_to_live(ttl)
            .build();

        Self { entries }
    }
}

#[async_trait]
impl CodeStore for LocalCodeCache {
    async fn put(&self, record: &CodeRecord) -> Result<Durability, StoreError> {
        let key = CacheKey::code(&record.code);
        if self.entries.contains_key(&key) {
            return Err(StoreError::Conflict(record.code.clone()));
        }
        self.entries.insert(key, record.clone()).await;

        tracing::trace!("Local cache set: {}", record.code);
        Ok(Durability::Local)
    }

    async fn fetch(&self, code: &str) -> Result<Option<CodeRecord>, StoreError> {
        let hit = self.entries.get(&CacheKey::code(code)).await;
        if hit.is_some() {
            tracing::trace!("Local cache hit: {}", code);
        } else {
            tracing::trace!("Local cache miss: {}", code);
        }
        Ok(hit)
    }

    async fn record_use(&self, code: &str) -> Result<(), StoreError> {
        let key = CacheKey::code(code);
        if let Some(mut record) = self.entries.get(&key).await {
            record.uses = record.uses.saturating_add(1);
            self.entries.insert(key, record).await;
        }
        Ok(())
    }

    async fn deactivate(&self, code: &str) -> Result<bool, StoreError> {
        let key = CacheKey::code(code);
        match self.entries.get(&key).await {
            Some(mut record) => {
                record.active = false;
                self.entries.insert(key, record).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.entries.remove(&CacheKey::code(code)).await.is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, record)| record.is_expired(now))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        for key in &expired {
            self.entries.invalidate(key).await;
        }

        tracing::debug!("Purged {} expired codes from local cache", expired.len());
        Ok(expired.len() as u64)
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a compatibility code
    pub fn code(code: &str) -> String {
        format!("code:{}", code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BirthProfile, PartyRef, ReadingDocument, ReadingSnapshot};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn create_record(code: &str, expires_at: DateTime<Utc>) -> CodeRecord {
        CodeRecord {
            code: code.to_string(),
            issuer: PartyRef::new("u1", "Ana"),
            snapshot: ReadingSnapshot {
                display_name: "Ana".to_string(),
                reading: ReadingDocument {
                    lines: BTreeMap::new(),
                    mounts: BTreeMap::new(),
                },
                profile: BirthProfile {
                    name: "Ana".to_string(),
                    date_of_birth: NaiveDate::from_ymd_opt(1990, 8, 5).unwrap(),
                    time_of_birth: None,
                    place_of_birth: None,
                    relationship_status: None,
                },
            },
            issued_at: expires_at - chrono::Duration::days(30),
            expires_at,
            active: true,
            uses: 0,
        }
    }

    #[tokio::test]
    async fn test_cache_put_fetch_use() {
        let cache = LocalCodeCache::new(100, Duration::from_secs(3600));
        let record = create_record("ABCD2345", Utc::now() + chrono::Duration::days(1));

        assert_eq!(cache.put(&record).await.unwrap(), Durability::Local);
        assert!(matches!(cache.put(&record).await, Err(StoreError::Conflict(_))));

        cache.record_use("ABCD2345").await.unwrap();
        let fetched = cache.fetch("ABCD2345").await.unwrap().unwrap();
        assert_eq!(fetched.uses, 1);

        assert!(cache.remove("ABCD2345").await.unwrap());
        assert!(cache.fetch("ABCD2345").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_purge_expired() {
        let cache = LocalCodeCache::new(100, Duration::from_secs(3600));
        let now = Utc::now();
        cache.put(&create_record("OLD00001", now)).await.unwrap();
        cache
            .put(&create_record("NEW00001", now + chrono::Duration::days(1)))
            .await
            .unwrap();

        let purged = cache.purge_expired(now).await.unwrap();

        assert_eq!(purged, 1);
        assert!(cache.fetch("OLD00001").await.unwrap().is_none());
        assert!(cache.fetch("NEW00001").await.unwrap().is_some());
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::code("ABCD2345"), "code:ABCD2345");
    }
}
