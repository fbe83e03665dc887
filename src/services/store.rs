use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CodeRecord, CompatibilityMatch, MatchAnalysis, MatchInvitation, MatchScores, PartyRef,
};

/// Errors that can occur in any store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Duplicate key: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}

/// Where a code record lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Durability {
    /// Shared store, resolvable from any device
    Durable,
    /// This instance's cache only
    Local,
}

/// Narrow persistence interface for compatibility codes
///
/// Codes passed in are already normalised to uppercase.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Insert a new record; fails with [`StoreError::Conflict`] if the code exists
    async fn put(&self, record: &CodeRecord) -> Result<Durability, StoreError>;

    async fn fetch(&self, code: &str) -> Result<Option<CodeRecord>, StoreError>;

    /// Increment the usage counter; a lost increment under concurrency is acceptable
    async fn record_use(&self, code: &str) -> Result<(), StoreError>;

    /// Clear the `active` flag; returns false when the code does not exist
    async fn deactivate(&self, code: &str) -> Result<bool, StoreError>;

    async fn remove(&self, code: &str) -> Result<bool, StoreError>;

    /// Delete every record with `expires_at <= now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Durable persistence for invitations and matches
///
/// The conditional transitions (`accept_invitation`, `complete_match`,
/// `publish_match`) must check and write in one atomic step.
#[async_trait]
pub trait LifecycleStore: Send + Sync {
    async fn insert_invitation(&self, invitation: &MatchInvitation) -> Result<(), StoreError>;

    async fn invitation_by_code(&self, code: &str) -> Result<Option<MatchInvitation>, StoreError>;

    /// Set `to_party` and `status = accepted` if the invitation is still pending and
    /// `now < expires_at`. Returns `None` when the condition did not hold.
    async fn accept_invitation(
        &self,
        code: &str,
        to_party: &PartyRef,
        now: DateTime<Utc>,
    ) -> Result<Option<MatchInvitation>, StoreError>;

    /// Move a pending invitation to `expired`
    async fn mark_invitation_expired(&self, code: &str) -> Result<bool, StoreError>;

    /// Move every pending invitation with `expires_at <= now` to `expired`
    async fn expire_invitations(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn insert_match(&self, compat_match: &CompatibilityMatch) -> Result<(), StoreError>;

    async fn get_match(&self, id: Uuid) -> Result<Option<CompatibilityMatch>, StoreError>;

    /// pending -> completed; `None` when the match is not pending
    async fn complete_match(
        &self,
        id: Uuid,
        scores: &MatchScores,
        analysis: &MatchAnalysis,
        now: DateTime<Utc>,
    ) -> Result<Option<CompatibilityMatch>, StoreError>;

    /// completed|shared -> shared, sets `is_public` and bumps the share counter;
    /// `None` when the match is still pending
    async fn publish_match(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<CompatibilityMatch>, StoreError>;

    /// Public matches, newest first
    async fn public_matches(&self, limit: usize) -> Result<Vec<CompatibilityMatch>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// Bound a store call by `limit`, mapping elapsed time to [`StoreError::Timeout`]
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
