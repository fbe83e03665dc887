use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::models::CodeRecord;
use crate::services::store::{with_timeout, CodeStore, Durability, StoreError};

/// A code record together with the store it was read from
#[derive(Debug, Clone)]
pub struct Located {
    pub record: CodeRecord,
    pub source: Durability,
}

/// Decorator that tries the durable store first and falls back to a local cache
///
/// Durable calls are bounded by `timeout`; a timeout counts as a failure and
/// takes the fallback path.
pub struct FallbackCodeStore {
    durable: Arc<dyn CodeStore>,
    local: Arc<dyn CodeStore>,
    timeout: Duration,
}

impl FallbackCodeStore {
    pub fn new(durable: Arc<dyn CodeStore>, local: Arc<dyn CodeStore>, timeout: Duration) -> Self {
        Self {
            durable,
            local,
            timeout,
        }
    }

    /// Find a code and report which store answered
    ///
    /// The local cache is consulted when the durable lookup fails, and also on a
    /// durable miss, since codes issued during an outage only exist locally.
    /// A durable failure that the local cache cannot answer is returned as is.
    pub async fn locate(&self, code: &str) -> Result<Option<Located>, StoreError> {
        let durable_error = match with_timeout(self.timeout, self.durable.fetch(code)).await {
            Ok(Some(record)) => {
                return Ok(Some(Located {
                    record,
                    source: Durability::Durable,
                }))
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Durable lookup for {} failed, using local cache: {}", code, e);
                Some(e)
            }
        };

        match self.local.fetch(code).await? {
            Some(record) => Ok(Some(Located {
                record,
                source: Durability::Local,
            })),
            None => match durable_error {
                Some(e) => Err(e),
                None => Ok(None),
            },
        }
    }

    pub async fn record_use_in(&self, code: &str, source: Durability) -> Result<(), StoreError> {
        match source {
            Durability::Durable => with_timeout(self.timeout, self.durable.record_use(code)).await,
            Durability::Local => self.local.record_use(code).await,
        }
    }

    pub async fn remove_from(&self, code: &str, source: Durability) -> Result<bool, StoreError> {
        match source {
            Durability::Durable => with_timeout(self.timeout, self.durable.remove(code)).await,
            Durability::Local => self.local.remove(code).await,
        }
    }
}

#[async_trait]
impl CodeStore for FallbackCodeStore {
    async fn put(&self, record: &CodeRecord) -> Result<Durability, StoreError> {
        match with_timeout(self.timeout, self.durable.put(record)).await {
            Ok(durability) => Ok(durability),
            // A clash is a real answer from the durable store, not an outage
            Err(StoreError::Conflict(code)) => Err(StoreError::Conflict(code)),
            Err(e) => {
                tracing::warn!(
                    "Durable write for {} failed, storing in local cache only: {}",
                    record.code,
                    e
                );
                self.local.put(record).await
            }
        }
    }

    async fn fetch(&self, code: &str) -> Result<Option<CodeRecord>, StoreError> {
        Ok(self.locate(code).await?.map(|located| located.record))
    }

    async fn record_use(&self, code: &str) -> Result<(), StoreError> {
        match self.locate(code).await? {
            Some(located) => self.record_use_in(code, located.source).await,
            None => Ok(()),
        }
    }

    async fn deactivate(&self, code: &str) -> Result<bool, StoreError> {
        match self.locate(code).await? {
            Some(located) => match located.source {
                Durability::Durable => {
                    with_timeout(self.timeout, self.durable.deactivate(code)).await
                }
                Durability::Local => self.local.deactivate(code).await,
            },
            None => Ok(false),
        }
    }

    async fn remove(&self, code: &str) -> Result<bool, StoreError> {
        let durable = with_timeout(self.timeout, self.durable.remove(code))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Durable remove for {} failed: {}", code, e);
                false
            });
        let local = self.local.remove(code).await?;
        Ok(durable || local)
    }

    /// Sweep both stores; a durable failure is reported after the local sweep ran
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let local = self.local.purge_expired(now).await?;
        let durable = with_timeout(self.timeout, self.durable.purge_expired(now)).await?;
        Ok(durable + local)
    }
}
