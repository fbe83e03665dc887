use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{
    CodeRecord, CompatibilityMatch, InvitationStatus, MatchAnalysis, MatchInvitation, MatchScores,
    MatchStatus, MatchType, PartyRef, ReadingSnapshot,
};
use crate::services::store::{CodeStore, Durability, LifecycleStore, StoreError};

/// Match type as stored in PostgreSQL
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_type", rename_all = "lowercase")]
pub enum DbMatchType {
    Romantic,
    Friendship,
    Platonic,
}

impl From<MatchType> for DbMatchType {
    fn from(value: MatchType) -> Self {
        match value {
            MatchType::Romantic => DbMatchType::Romantic,
            MatchType::Friendship => DbMatchType::Friendship,
            MatchType::Platonic => DbMatchType::Platonic,
        }
    }
}

impl From<DbMatchType> for MatchType {
    fn from(value: DbMatchType) -> Self {
        match value {
            DbMatchType::Romantic => MatchType::Romantic,
            DbMatchType::Friendship => MatchType::Friendship,
            DbMatchType::Platonic => MatchType::Platonic,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
pub enum DbInvitationStatus {
    Pending,
    Accepted,
    Expired,
}

impl From<DbInvitationStatus> for InvitationStatus {
    fn from(value: DbInvitationStatus) -> Self {
        match value {
            DbInvitationStatus::Pending => InvitationStatus::Pending,
            DbInvitationStatus::Accepted => InvitationStatus::Accepted,
            DbInvitationStatus::Expired => InvitationStatus::Expired,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
pub enum DbMatchStatus {
    Pending,
    Completed,
    Shared,
}

impl From<DbMatchStatus> for MatchStatus {
    fn from(value: DbMatchStatus) -> Self {
        match value {
            DbMatchStatus::Pending => MatchStatus::Pending,
            DbMatchStatus::Completed => MatchStatus::Completed,
            DbMatchStatus::Shared => MatchStatus::Shared,
        }
    }
}

/// PostgreSQL-backed durable store for codes, invitations and matches
///
/// Conditional transitions are single `UPDATE ... WHERE <guard> RETURNING`
/// statements, so concurrent callers cannot both win.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
        )
        .await
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn count(value: i32) -> u32 {
    value.max(0) as u32
}

fn code_from_row(row: &PgRow) -> Result<CodeRecord, StoreError> {
    let snapshot: Json<ReadingSnapshot> = row.try_get("snapshot")?;
    Ok(CodeRecord {
        code: row.try_get("code")?,
        issuer: PartyRef {
            user_id: row.try_get("issuer_id")?,
            display_name: row.try_get("issuer_name")?,
        },
        snapshot: snapshot.0,
        issued_at: row.try_get("issued_at")?,
        expires_at: row.try_get("expires_at")?,
        active: row.try_get("active")?,
        uses: count(row.try_get("uses")?),
    })
}

fn invitation_from_row(row: &PgRow) -> Result<MatchInvitation, StoreError> {
    let to_id: Option<String> = row.try_get("to_id")?;
    let to_name: Option<String> = row.try_get("to_name")?;
    let to_party = match (to_id, to_name) {
        (Some(user_id), Some(display_name)) => Some(PartyRef {
            user_id,
            display_name,
        }),
        (None, None) => None,
        _ => {
            return Err(StoreError::InvalidRecord(
                "invitation has half of its accepting party".to_string(),
            ))
        }
    };

    Ok(MatchInvitation {
        id: row.try_get("id")?,
        invite_code: row.try_get("invite_code")?,
        from_party: PartyRef {
            user_id: row.try_get("from_id")?,
            display_name: row.try_get("from_name")?,
        },
        to_party,
        message: row.try_get("message")?,
        match_type: row.try_get::<DbMatchType, _>("match_type")?.into(),
        status: row.try_get::<DbInvitationStatus, _>("status")?.into(),
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
        accepted_at: row.try_get("accepted_at")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<CompatibilityMatch, StoreError> {
    let scores: Option<Json<MatchScores>> = row.try_get("scores")?;
    let analysis: Option<Json<MatchAnalysis>> = row.try_get("analysis")?;

    Ok(CompatibilityMatch {
        id: row.try_get("id")?,
        party_a: PartyRef {
            user_id: row.try_get("party_a_id")?,
            display_name: row.try_get("party_a_name")?,
        },
        party_b: PartyRef {
            user_id: row.try_get("party_b_id")?,
            display_name: row.try_get("party_b_name")?,
        },
        match_type: row.try_get::<DbMatchType, _>("match_type")?.into(),
        status: row.try_get::<DbMatchStatus, _>("status")?.into(),
        scores: scores.map(|s| s.0),
        analysis: analysis.map(|a| a.0),
        is_public: row.try_get("is_public")?,
        share_count: count(row.try_get("share_count")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl CodeStore for PostgresStore {
    async fn put(&self, record: &CodeRecord) -> Result<Durability, StoreError> {
        let query = r#"
            INSERT INTO compatibility_codes
                (code, issuer_id, issuer_name, snapshot, issued_at, expires_at, active, uses)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (code) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(&record.code)
            .bind(&record.issuer.user_id)
            .bind(&record.issuer.display_name)
            .bind(Json(&record.snapshot))
            .bind(record.issued_at)
            .bind(record.expires_at)
            .bind(record.active)
            .bind(record.uses as i32)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(record.code.clone()));
        }

        tracing::debug!("Stored code {}", record.code);
        Ok(Durability::Durable)
    }

    async fn fetch(&self, code: &str) -> Result<Option<CodeRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM compatibility_codes WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(code_from_row).transpose()
    }

    async fn record_use(&self, code: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE compatibility_codes SET uses = uses + 1 WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn deactivate(&self, code: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE compatibility_codes SET active = FALSE WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, code: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM compatibility_codes WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM compatibility_codes WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Purged {} expired codes", result.rows_affected());
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl LifecycleStore for PostgresStore {
    async fn insert_invitation(&self, invitation: &MatchInvitation) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO match_invitations
                (id, invite_code, from_id, from_name, message, match_type, status, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8)
            ON CONFLICT (invite_code) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(invitation.id)
            .bind(&invitation.invite_code)
            .bind(&invitation.from_party.user_id)
            .bind(&invitation.from_party.display_name)
            .bind(&invitation.message)
            .bind(DbMatchType::from(invitation.match_type))
            .bind(invitation.created_at)
            .bind(invitation.expires_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(invitation.invite_code.clone()));
        }
        Ok(())
    }

    async fn invitation_by_code(&self, code: &str) -> Result<Option<MatchInvitation>, StoreError> {
        let row = sqlx::query("SELECT * FROM match_invitations WHERE invite_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(invitation_from_row).transpose()
    }

    async fn accept_invitation(
        &self,
        code: &str,
        to_party: &PartyRef,
        now: DateTime<Utc>,
    ) -> Result<Option<MatchInvitation>, StoreError> {
        let query = r#"
            UPDATE match_invitations
            SET to_id = $2, to_name = $3, status = 'accepted', accepted_at = $4
            WHERE invite_code = $1 AND status = 'pending' AND expires_at > $4
            RETURNING *
        "#;

        let row = sqlx::query(query)
            .bind(code)
            .bind(&to_party.user_id)
            .bind(&to_party.display_name)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(invitation_from_row).transpose()
    }

    async fn mark_invitation_expired(&self, code: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE match_invitations SET status = 'expired' WHERE invite_code = $1 AND status = 'pending'",
        )
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn expire_invitations(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE match_invitations SET status = 'expired' WHERE status = 'pending' AND expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_match(&self, compat_match: &CompatibilityMatch) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO compatibility_matches
                (id, party_a_id, party_a_name, party_b_id, party_b_name, match_type,
                 status, is_public, share_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', FALSE, 0, $7, $8)
            ON CONFLICT (id) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(compat_match.id)
            .bind(&compat_match.party_a.user_id)
            .bind(&compat_match.party_a.display_name)
            .bind(&compat_match.party_b.user_id)
            .bind(&compat_match.party_b.display_name)
            .bind(DbMatchType::from(compat_match.match_type))
            .bind(compat_match.created_at)
            .bind(compat_match.updated_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(compat_match.id.to_string()));
        }
        Ok(())
    }

    async fn get_match(&self, id: Uuid) -> Result<Option<CompatibilityMatch>, StoreError> {
        let row = sqlx::query("SELECT * FROM compatibility_matches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn complete_match(
        &self,
        id: Uuid,
        scores: &MatchScores,
        analysis: &MatchAnalysis,
        now: DateTime<Utc>,
    ) -> Result<Option<CompatibilityMatch>, StoreError> {
        let query = r#"
            UPDATE compatibility_matches
            SET status = 'completed', scores = $2, analysis = $3, updated_at = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING *
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .bind(Json(scores))
            .bind(Json(analysis))
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn publish_match(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<CompatibilityMatch>, StoreError> {
        let query = r#"
            UPDATE compatibility_matches
            SET status = 'shared', is_public = TRUE, share_count = share_count + 1, updated_at = $2
            WHERE id = $1 AND status IN ('completed', 'shared')
            RETURNING *
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn public_matches(&self, limit: usize) -> Result<Vec<CompatibilityMatch>, StoreError> {
        let query = r#"
            SELECT *
            FROM compatibility_matches
            WHERE is_public
            ORDER BY created_at DESC
            LIMIT $1
        "#;

        let rows = sqlx::query(query)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(match_from_row).collect()
    }

    /// Health check - verify database connectivity
    async fn health_check(&self) -> Result<bool, StoreError> {
        let result: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(result == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_type_conversion() {
        for match_type in [MatchType::Romantic, MatchType::Friendship, MatchType::Platonic] {
            let db = DbMatchType::from(match_type);
            assert_eq!(MatchType::from(db), match_type);
        }
    }

    #[test]
    fn test_negative_counts_clamp_to_zero() {
        assert_eq!(count(-3), 0);
        assert_eq!(count(12), 12);
    }

    #[test]
    fn test_status_conversion() {
        assert_eq!(MatchStatus::from(DbMatchStatus::Shared), MatchStatus::Shared);
        assert_eq!(
            InvitationStatus::from(DbInvitationStatus::Accepted),
            InvitationStatus::Accepted
        );
    }
}
