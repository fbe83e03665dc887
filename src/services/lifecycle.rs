use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CompatibilityMatch, InvitationStatus, MatchAnalysis, MatchInvitation, MatchScores, MatchStatus,
    MatchType, PartyRef, ShareSummary, ValidationError,
};
use crate::services::clock::Clock;
use crate::services::codes::{generate_code, is_well_formed, normalize_code};
use crate::services::store::{with_timeout, LifecycleStore, StoreError};

const MAX_CODE_ATTEMPTS: usize = 5;

/// Errors returned by invitation and match transitions
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invitation code not recognized")]
    InvalidCode,

    #[error("this invitation has already been accepted")]
    AlreadyUsed,

    #[error("this invitation has expired")]
    Expired,

    #[error("match not found")]
    NotFound,

    #[error("this match is not ready to share yet")]
    NotReady,

    #[error("this match was already completed with different results")]
    AlreadyCompleted,

    #[error("only the two participants can do that")]
    NotParticipant,

    #[error("Durable store unavailable: {0}")]
    DurableStoreUnavailable(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A shared match and its public summary
#[derive(Debug, Clone)]
pub struct PublishedMatch {
    pub compat_match: CompatibilityMatch,
    pub summary: ShareSummary,
}

/// Invitation and match state machines
///
/// Invitations: pending -> accepted | expired.
/// Matches: pending -> completed -> shared, never backwards.
///
/// Every transition goes to the durable store; there is no local fallback here,
/// so a store outage surfaces as [`LifecycleError::DurableStoreUnavailable`].
pub struct Lifecycle {
    store: Arc<dyn LifecycleStore>,
    clock: Arc<dyn Clock>,
    invitation_ttl: ChronoDuration,
    timeout: Duration,
}

impl Lifecycle {
    pub fn new(
        store: Arc<dyn LifecycleStore>,
        clock: Arc<dyn Clock>,
        invitation_ttl: ChronoDuration,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            invitation_ttl,
            timeout,
        }
    }

    pub async fn create_invitation(
        &self,
        from: &PartyRef,
        match_type: MatchType,
        message: Option<String>,
    ) -> Result<MatchInvitation, LifecycleError> {
        let now = self.clock.now();
        let mut invitation = MatchInvitation {
            id: Uuid::new_v4(),
            invite_code: String::new(),
            from_party: from.clone(),
            to_party: None,
            message: message.filter(|m| !m.trim().is_empty()),
            match_type,
            status: InvitationStatus::Pending,
            created_at: now,
            expires_at: now + self.invitation_ttl,
            accepted_at: None,
        };

        for _ in 0..MAX_CODE_ATTEMPTS {
            invitation.invite_code = generate_code(now);
            match with_timeout(self.timeout, self.store.insert_invitation(&invitation)).await {
                Ok(()) => {
                    tracing::info!(
                        "Invitation {} created by {} ({})",
                        invitation.invite_code,
                        from.user_id,
                        match_type
                    );
                    return Ok(invitation);
                }
                Err(StoreError::Conflict(code)) => {
                    tracing::debug!("Invite code {} already taken, retrying", code);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::Conflict("invite code space exhausted".to_string()).into())
    }

    /// Accept an invitation as `to`
    ///
    /// Checks run in order: existence, status, expiry. The final write is
    /// conditional, so of two concurrent accepts only one succeeds.
    pub async fn accept(&self, input: &str, to: &PartyRef) -> Result<MatchInvitation, LifecycleError> {
        let code = normalize_code(input);
        if !is_well_formed(&code) {
            return Err(LifecycleError::InvalidCode);
        }

        let invitation = self
            .load_invitation(&code)
            .await?
            .ok_or(LifecycleError::InvalidCode)?;
        self.check_acceptable(&invitation).await?;

        let now = self.clock.now();
        match with_timeout(self.timeout, self.store.accept_invitation(&code, to, now)).await? {
            Some(accepted) => {
                tracing::info!("Invitation {} accepted by {}", code, to.user_id);
                Ok(accepted)
            }
            None => {
                // Lost a race; re-read to report what happened
                let current = self
                    .load_invitation(&code)
                    .await?
                    .ok_or(LifecycleError::InvalidCode)?;
                self.check_acceptable(&current).await?;
                Err(LifecycleError::AlreadyUsed)
            }
        }
    }

    async fn load_invitation(&self, code: &str) -> Result<Option<MatchInvitation>, LifecycleError> {
        Ok(with_timeout(self.timeout, self.store.invitation_by_code(code)).await?)
    }

    async fn check_acceptable(&self, invitation: &MatchInvitation) -> Result<(), LifecycleError> {
        match invitation.status {
            InvitationStatus::Accepted => return Err(LifecycleError::AlreadyUsed),
            InvitationStatus::Expired => return Err(LifecycleError::Expired),
            InvitationStatus::Pending => {}
        }

        if invitation.is_expired(self.clock.now()) {
            let code = &invitation.invite_code;
            if let Err(e) = with_timeout(self.timeout, self.store.mark_invitation_expired(code)).await {
                tracing::warn!("Failed to mark invitation {} expired: {}", code, e);
            }
            return Err(LifecycleError::Expired);
        }

        Ok(())
    }

    /// Mark every overdue pending invitation as expired
    pub async fn expire_invitations(&self) -> Result<u64, LifecycleError> {
        let now = self.clock.now();
        let count = with_timeout(self.timeout, self.store.expire_invitations(now)).await?;
        tracing::info!("Expired {} invitations", count);
        Ok(count)
    }

    pub async fn create_match(
        &self,
        party_a: &PartyRef,
        party_b: &PartyRef,
        match_type: MatchType,
    ) -> Result<CompatibilityMatch, LifecycleError> {
        if party_a.user_id == party_b.user_id {
            return Err(ValidationError::InvalidField {
                field: "partyB".to_string(),
                message: "a match needs two different parties".to_string(),
            }
            .into());
        }

        let now = self.clock.now();
        let compat_match = CompatibilityMatch {
            id: Uuid::new_v4(),
            party_a: party_a.clone(),
            party_b: party_b.clone(),
            match_type,
            status: MatchStatus::Pending,
            scores: None,
            analysis: None,
            is_public: false,
            share_count: 0,
            created_at: now,
            updated_at: now,
        };

        with_timeout(self.timeout, self.store.insert_match(&compat_match)).await?;
        tracing::info!(
            "Match {} created: {} x {} ({})",
            compat_match.id,
            party_a.user_id,
            party_b.user_id,
            match_type
        );

        Ok(compat_match)
    }

    /// Attach scores and analysis; repeating the same payload is a no-op
    pub async fn complete_match(
        &self,
        id: Uuid,
        scores: MatchScores,
        analysis: MatchAnalysis,
    ) -> Result<CompatibilityMatch, LifecycleError> {
        validate_scores(&scores)?;

        let current = self.load_match(id).await?;
        if current.status == MatchStatus::Pending {
            let now = self.clock.now();
            let updated = with_timeout(
                self.timeout,
                self.store.complete_match(id, &scores, &analysis, now),
            )
            .await?;
            if let Some(completed) = updated {
                tracing::info!("Match {} completed (overall {})", id, scores.overall);
                return Ok(completed);
            }
        }

        // Already completed, either earlier or by a concurrent caller
        let current = self.load_match(id).await?;
        if current.scores == Some(scores) && current.analysis.as_ref() == Some(&analysis) {
            tracing::debug!("Match {} already completed with the same payload", id);
            Ok(current)
        } else {
            Err(LifecycleError::AlreadyCompleted)
        }
    }

    /// Make a completed match public; each call counts as one share
    pub async fn publish(&self, id: Uuid, caller: &PartyRef) -> Result<PublishedMatch, LifecycleError> {
        let current = self.load_match(id).await?;
        if !current.involves(&caller.user_id) {
            return Err(LifecycleError::NotParticipant);
        }
        if current.status == MatchStatus::Pending {
            return Err(LifecycleError::NotReady);
        }

        let now = self.clock.now();
        let shared = with_timeout(self.timeout, self.store.publish_match(id, now))
            .await?
            .ok_or(LifecycleError::NotReady)?;
        let summary = shared.share_summary().ok_or(LifecycleError::NotReady)?;

        tracing::info!("Match {} shared by {} (shares: {})", id, caller.user_id, shared.share_count);

        Ok(PublishedMatch {
            compat_match: shared,
            summary,
        })
    }

    /// Fetch a match visible to `caller`: their own, or any public one
    pub async fn get_match(&self, id: Uuid, caller: &PartyRef) -> Result<CompatibilityMatch, LifecycleError> {
        let compat_match = self.load_match(id).await?;
        if compat_match.is_public || compat_match.involves(&caller.user_id) {
            Ok(compat_match)
        } else {
            Err(LifecycleError::NotFound)
        }
    }

    /// Newest public matches for the discovery feed
    pub async fn public_feed(&self, limit: usize) -> Result<Vec<ShareSummary>, LifecycleError> {
        let matches = with_timeout(self.timeout, self.store.public_matches(limit)).await?;
        Ok(matches.iter().filter_map(|m| m.share_summary()).collect())
    }

    pub async fn health_check(&self) -> bool {
        with_timeout(self.timeout, self.store.health_check())
            .await
            .unwrap_or(false)
    }

    async fn load_match(&self, id: Uuid) -> Result<CompatibilityMatch, LifecycleError> {
        with_timeout(self.timeout, self.store.get_match(id))
            .await?
            .ok_or(LifecycleError::NotFound)
    }
}

fn validate_scores(scores: &MatchScores) -> Result<(), ValidationError> {
    let all = [
        ("overall", scores.overall),
        ("affinity", scores.affinity),
        ("communication", scores.communication),
        ("lifeDirection", scores.life_direction),
        ("vitality", scores.vitality),
    ];
    match all.iter().find(|(_, value)| *value > 100) {
        Some((field, value)) => Err(ValidationError::InvalidField {
            field: field.to_string(),
            message: format!("score {} is above 100", value),
        }),
        None => Ok(()),
    }
}
