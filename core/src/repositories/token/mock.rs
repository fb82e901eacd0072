//! Mock implementation of RefreshTokenRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::token::{RefreshToken, RevocationReason};
use crate::errors::{DomainError, DomainResult};

use super::r#trait::{RefreshTokenRepository, RotationOutcome};

/// In-memory token store keyed by id
#[derive(Clone, Default)]
pub struct MockRefreshTokenRepository {
    tokens: Arc<RwLock<HashMap<Uuid, RefreshToken>>>,
    failing: Arc<AtomicBool>,
}

impl MockRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the store were down
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn all(&self) -> Vec<RefreshToken> {
        self.tokens.read().await.values().cloned().collect()
    }

    pub async fn get(&self, id: Uuid) -> Option<RefreshToken> {
        self.tokens.read().await.get(&id).cloned()
    }

    pub async fn put(&self, token: RefreshToken) {
        self.tokens.write().await.insert(token.id, token);
    }

    fn check(&self) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::unavailable("mock token store down"));
        }
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for MockRefreshTokenRepository {
    async fn insert_superseding(&self, token: &RefreshToken, now: DateTime<Utc>) -> DomainResult<u64> {
        self.check()?;
        let mut tokens = self.tokens.write().await;
        if tokens.values().any(|t| t.token_hash == token.token_hash) {
            return Err(DomainError::internal("duplicate token hash"));
        }

        let mut superseded = 0;
        for existing in tokens.values_mut() {
            if existing.user_id == token.user_id
                && existing.device_id == token.device_id
                && existing.is_active(now)
                && existing.revoke(RevocationReason::NewLogin, None, now)
            {
                superseded += 1;
            }
        }
        tokens.insert(token.id, token.clone());
        Ok(superseded)
    }

    async fn find_by_hash(&self, token_hash: &str) -> DomainResult<Option<RefreshToken>> {
        self.check()?;
        let tokens = self.tokens.read().await;
        Ok(tokens.values().find(|t| t.token_hash == token_hash).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<RefreshToken>> {
        self.check()?;
        Ok(self.tokens.read().await.get(&id).cloned())
    }

    async fn find_active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<RefreshToken>> {
        self.check()?;
        let tokens = self.tokens.read().await;
        Ok(tokens
            .values()
            .filter(|t| t.user_id == user_id && t.is_active(now))
            .cloned()
            .collect())
    }

    async fn rotate(
        &self,
        old_id: Uuid,
        child: &RefreshToken,
        now: DateTime<Utc>,
    ) -> DomainResult<RotationOutcome> {
        self.check()?;
        let mut tokens = self.tokens.write().await;
        let Some(old) = tokens.get_mut(&old_id) else {
            return Ok(RotationOutcome::AlreadyRevoked);
        };
        if !old.revoke(RevocationReason::Rotated, Some(child.id), now) {
            return Ok(RotationOutcome::AlreadyRevoked);
        }
        tokens.insert(child.id, child.clone());
        Ok(RotationOutcome::Rotated)
    }

    async fn revoke_if_active(
        &self,
        id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        self.check()?;
        let mut tokens = self.tokens.write().await;
        Ok(tokens
            .get_mut(&id)
            .map(|t| t.revoke(reason, None, now))
            .unwrap_or(false))
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<u64> {
        self.check()?;
        let mut tokens = self.tokens.write().await;
        let mut count = 0;
        for token in tokens.values_mut() {
            if token.user_id == user_id && token.revoke(reason, None, now) {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn purge(&self, older_than: DateTime<Utc>) -> DomainResult<u64> {
        self.check()?;
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| {
            let revoked_long_ago = matches!(t.revoked_at, Some(at) if at < older_than);
            let expired_long_ago = t.expires_at < older_than;
            !(revoked_long_ago || expired_long_ago)
        });
        Ok((before - tokens.len()) as u64)
    }
}
