use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    CodeRecord, CompatibilityMatch, InvitationStatus, MatchAnalysis, MatchInvitation, MatchScores,
    MatchStatus, PartyRef,
};
use crate::services::store::{CodeStore, Durability, LifecycleStore, StoreError};

/// HashMap-backed store for development and tests
///
/// Acts as the durable store: it is the single source of truth for the process.
/// Each conditional transition runs under one write lock.
#[derive(Default)]
pub struct InMemoryStore {
    codes: RwLock<HashMap<String, CodeRecord>>,
    invitations: RwLock<HashMap<String, MatchInvitation>>,
    matches: RwLock<HashMap<Uuid, CompatibilityMatch>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodeStore for InMemoryStore {
    async fn put(&self, record: &CodeRecord) -> Result<Durability, StoreError> {
        let mut codes = self.codes.write().await;
        if codes.contains_key(&record.code) {
            return Err(StoreError::Conflict(record.code.clone()));
        }
        codes.insert(record.code.clone(), record.clone());
        Ok(Durability::Durable)
    }

    async fn fetch(&self, code: &str) -> Result<Option<CodeRecord>, StoreError> {
        Ok(self.codes.read().await.get(code).cloned())
    }

    async fn record_use(&self, code: &str) -> Result<(), StoreError> {
        if let Some(record) = self.codes.write().await.get_mut(code) {
            record.uses = record.uses.saturating_add(1);
        }
        Ok(())
    }

    async fn deactivate(&self, code: &str) -> Result<bool, StoreError> {
        match self.codes.write().await.get_mut(code) {
            Some(record) => {
                record.active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.codes.write().await.remove(code).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut codes = self.codes.write().await;
        let before = codes.len();
        codes.retain(|_, record| !record.is_expired(now));
        Ok((before - codes.len()) as u64)
    }
}

#[async_trait]
impl LifecycleStore for InMemoryStore {
    async fn insert_invitation(&self, invitation: &MatchInvitation) -> Result<(), StoreError> {
        let mut invitations = self.invitations.write().await;
        if invitations.contains_key(&invitation.invite_code) {
            return Err(StoreError::Conflict(invitation.invite_code.clone()));
        }
        invitations.insert(invitation.invite_code.clone(), invitation.clone());
        Ok(())
    }

    async fn invitation_by_code(&self, code: &str) -> Result<Option<MatchInvitation>, StoreError> {
        Ok(self.invitations.read().await.get(code).cloned())
    }

    async fn accept_invitation(
        &self,
        code: &str,
        to_party: &PartyRef,
        now: DateTime<Utc>,
    ) -> Result<Option<MatchInvitation>, StoreError> {
        let mut invitations = self.invitations.write().await;
        match invitations.get_mut(code) {
            Some(invitation)
                if invitation.status == InvitationStatus::Pending && !invitation.is_expired(now) =>
            {
                invitation.to_party = Some(to_party.clone());
                invitation.status = InvitationStatus::Accepted;
                invitation.accepted_at = Some(now);
                Ok(Some(invitation.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_invitation_expired(&self, code: &str) -> Result<bool, StoreError> {
        let mut invitations = self.invitations.write().await;
        match invitations.get_mut(code) {
            Some(invitation) if invitation.status == InvitationStatus::Pending => {
                invitation.status = InvitationStatus::Expired;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn expire_invitations(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut invitations = self.invitations.write().await;
        let mut count = 0;
        for invitation in invitations.values_mut() {
            if invitation.status == InvitationStatus::Pending && invitation.is_expired(now) {
                invitation.status = InvitationStatus::Expired;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn insert_match(&self, compat_match: &CompatibilityMatch) -> Result<(), StoreError> {
        let mut matches = self.matches.write().await;
        if matches.contains_key(&compat_match.id) {
            return Err(StoreError::Conflict(compat_match.id.to_string()));
        }
        matches.insert(compat_match.id, compat_match.clone());
        Ok(())
    }

    async fn get_match(&self, id: Uuid) -> Result<Option<CompatibilityMatch>, StoreError> {
        Ok(self.matches.read().await.get(&id).cloned())
    }

    async fn complete_match(
        &self,
        id: Uuid,
        scores: &MatchScores,
        analysis: &MatchAnalysis,
        now: DateTime<Utc>,
    ) -> Result<Option<CompatibilityMatch>, StoreError> {
        let mut matches = self.matches.write().await;
        match matches.get_mut(&id) {
            Some(m) if m.status == MatchStatus::Pending => {
                m.status = MatchStatus::Completed;
                m.scores = Some(*scores);
                m.analysis = Some(analysis.clone());
                m.updated_at = now;
                Ok(Some(m.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn publish_match(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<CompatibilityMatch>, StoreError> {
        let mut matches = self.matches.write().await;
        match matches.get_mut(&id) {
            Some(m) if m.status >= MatchStatus::Completed => {
                m.status = MatchStatus::Shared;
                m.is_public = true;
                m.share_count = m.share_count.saturating_add(1);
                m.updated_at = now;
                Ok(Some(m.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn public_matches(&self, limit: usize) -> Result<Vec<CompatibilityMatch>, StoreError> {
        let matches = self.matches.read().await;
        let mut public: Vec<CompatibilityMatch> =
            matches.values().filter(|m| m.is_public).cloned().collect();
        public.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        public.truncate(limit);
        Ok(public)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
