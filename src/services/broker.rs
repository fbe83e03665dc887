use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

use crate::models::{CodeRecord, PartyRef, ReadingSnapshot, ValidationError};
use crate::services::clock::Clock;
use crate::services::codes::{generate_code, is_well_formed, normalize_code};
use crate::services::fallback::FallbackCodeStore;
use crate::services::store::{CodeStore, Durability, StoreError};

/// Attempts at finding an unused code before giving up
const MAX_ISSUE_ATTEMPTS: usize = 5;

/// Errors returned by the code broker
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("code not recognized")]
    NotFound,

    #[error("this code is no longer valid")]
    Expired,

    #[error("only the issuer can revoke this code")]
    NotIssuer,

    #[error("Durable store unavailable: {0}")]
    DurableStoreUnavailable(StoreError),

    #[error("Could not allocate an unused code after {0} attempts")]
    CodeSpaceExhausted(usize),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result of issuing a code
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedCode {
    pub code: String,
    /// False when the record only reached the local cache
    pub durable: bool,
    pub expires_at: DateTime<Utc>,
}

/// Result of resolving a code
#[derive(Debug, Clone)]
pub struct ResolvedCode {
    /// The record, with `uses` including this resolution
    pub record: CodeRecord,
    pub source: Durability,
}

/// Issues and resolves compatibility codes
pub struct CodeBroker {
    store: FallbackCodeStore,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
}

impl CodeBroker {
    pub fn new(store: FallbackCodeStore, clock: Arc<dyn Clock>, ttl: chrono::Duration) -> Self {
        Self { store, clock, ttl }
    }

    /// Bind a snapshot of the issuer's reading to a new code
    ///
    /// Still succeeds while the durable store is down; the result is then marked
    /// non-durable and the caller should warn that other devices may not resolve it.
    pub async fn issue(
        &self,
        issuer: &PartyRef,
        snapshot: ReadingSnapshot,
    ) -> Result<IssuedCode, BrokerError> {
        snapshot.validate().map_err(ValidationError::from)?;

        let issued_at = self.clock.now();
        let expires_at = issued_at + self.ttl;
        let mut record = CodeRecord {
            code: String::new(),
            issuer: issuer.clone(),
            snapshot,
            issued_at,
            expires_at,
            active: true,
            uses: 0,
        };

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            record.code = generate_code(issued_at);

            match self.store.put(&record).await {
                Ok(durability) => {
                    let durable = durability == Durability::Durable;
                    tracing::info!(
                        "Issued code {} for {} (durable: {}, expires {})",
                        record.code,
                        issuer.user_id,
                        durable,
                        expires_at
                    );
                    return Ok(IssuedCode {
                        code: record.code,
                        durable,
                        expires_at,
                    });
                }
                Err(StoreError::Conflict(code)) => {
                    tracing::debug!("Code {} already taken (attempt {})", code, attempt);
                }
                Err(e) => {
                    tracing::error!("Failed to store code in any store: {}", e);
                    return Err(BrokerError::DurableStoreUnavailable(e));
                }
            }
        }

        Err(BrokerError::CodeSpaceExhausted(MAX_ISSUE_ATTEMPTS))
    }

    /// Look up a code, check it is still usable and count the use
    ///
    /// Expiry is evaluated against the clock on every call.
    pub async fn resolve(&self, input: &str) -> Result<ResolvedCode, BrokerError> {
        self.resolve_checked(input, None).await
    }

    /// Resolve a code on behalf of someone comparing against it
    ///
    /// The issuer is rejected before the use is counted.
    pub async fn resolve_for(
        &self,
        input: &str,
        caller: &PartyRef,
    ) -> Result<ResolvedCode, BrokerError> {
        self.resolve_checked(input, Some(caller)).await
    }

    async fn resolve_checked(
        &self,
        input: &str,
        comparer: Option<&PartyRef>,
    ) -> Result<ResolvedCode, BrokerError> {
        let code = normalize_code(input);
        if !is_well_formed(&code) {
            return Err(BrokerError::NotFound);
        }

        let located = self
            .store
            .locate(&code)
            .await
            .map_err(BrokerError::DurableStoreUnavailable)?
            .ok_or(BrokerError::NotFound)?;

        let now = self.clock.now();
        let mut record = located.record;

        if !record.is_usable(now) {
            if located.source == Durability::Local && record.is_expired(now) {
                if let Err(e) = self.store.remove_from(&code, Durability::Local).await {
                    tracing::warn!("Failed to drop expired local code {}: {}", code, e);
                }
            }
            tracing::debug!("Code {} is expired or inactive", code);
            return Err(BrokerError::Expired);
        }

        if comparer.is_some_and(|caller| caller.user_id == record.issuer.user_id) {
            return Err(ValidationError::InvalidField {
                field: "code".to_string(),
                message: "cannot compare against your own code".to_string(),
            }
            .into());
        }

        if let Err(e) = self.store.record_use_in(&code, located.source).await {
            tracing::warn!("Failed to count use of code {}: {}", code, e);
        }
        record.uses = record.uses.saturating_add(1);

        tracing::debug!("Resolved code {} (uses: {})", code, record.uses);

        Ok(ResolvedCode {
            record,
            source: located.source,
        })
    }

    /// Deactivate a code; only its issuer may do so
    pub async fn revoke(&self, input: &str, caller: &PartyRef) -> Result<(), BrokerError> {
        let code = normalize_code(input);
        if !is_well_formed(&code) {
            return Err(BrokerError::NotFound);
        }

        let located = self
            .store
            .locate(&code)
            .await
            .map_err(BrokerError::DurableStoreUnavailable)?
            .ok_or(BrokerError::NotFound)?;

        if located.record.issuer.user_id != caller.user_id {
            return Err(BrokerError::NotIssuer);
        }

        self.store
            .deactivate(&code)
            .await
            .map_err(BrokerError::DurableStoreUnavailable)?;

        tracing::info!("Code {} revoked by {}", code, caller.user_id);
        Ok(())
    }

    /// Purge every expired code from both stores
    pub async fn sweep_expired(&self) -> Result<u64, BrokerError> {
        let now = self.clock.now();
        let purged = self
            .store
            .purge_expired(now)
            .await
            .map_err(BrokerError::DurableStoreUnavailable)?;

        tracing::info!("Swept {} expired codes", purged);
        Ok(purged)
    }
}
