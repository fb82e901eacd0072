//! Token blacklist backed by the shared key-value store
//!
//! Two independent mechanisms, both self-expiring:
//! - per token: `blacklist:jti:{jti}`, kept for the token's remaining lifetime
//! - per user: `blacklist:user:{user_id}`, kept for a long fixed window; any
//!   access token with `iat` before the marker is rejected
//!
//! Reads fail open. They sit on every authenticated request and a store
//! outage must not reject all traffic; writes report failure to the caller.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tg_shared::config::BlacklistConfig;

use crate::domain::entities::revocation::{AccessTokenRevocation, UserRevocationMarker};
use crate::errors::{DomainError, DomainResult};
use crate::repositories::CacheStore;

const JTI_KEY_PREFIX: &str = "blacklist:jti:";
const USER_KEY_PREFIX: &str = "blacklist:user:";

pub struct TokenBlacklist<C: CacheStore> {
    store: Arc<C>,
    config: BlacklistConfig,
}

impl<C: CacheStore> TokenBlacklist<C> {
    pub fn new(store: Arc<C>, config: BlacklistConfig) -> Self {
        Self { store, config }
    }

    fn jti_key(jti: &str) -> String {
        format!("{}{}", JTI_KEY_PREFIX, jti)
    }

    fn user_key(user_id: Uuid) -> String {
        format!("{}{}", USER_KEY_PREFIX, user_id)
    }

    /// Blacklist a single access token until it would have expired anyway
    ///
    /// # Returns
    /// * `Ok(true)` - Entry written
    /// * `Ok(false)` - Token already expired, nothing to do
    pub async fn revoke_token(
        &self,
        jti: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let remaining = expires_at - now;
        let Ok(ttl) = remaining.to_std() else {
            debug!(jti = %jti, "Access token already expired, skipping blacklist entry");
            return Ok(false);
        };
        if ttl.is_zero() {
            return Ok(false);
        }

        let entry = AccessTokenRevocation {
            jti: jti.to_string(),
            revoked_at: now,
            expires_at,
        };
        let value = serde_json::to_string(&entry)
            .map_err(|e| DomainError::internal(format!("Failed to encode revocation: {}", e)))?;
        self.store.set_with_ttl(&Self::jti_key(jti), &value, ttl).await?;

        info!(jti = %jti, ttl_seconds = ttl.as_secs(), "Access token blacklisted");
        Ok(true)
    }

    /// Invalidate every access token of `user_id` issued before `now`
    pub async fn revoke_user(&self, user_id: Uuid, now: DateTime<Utc>) -> DomainResult<()> {
        let marker = UserRevocationMarker::new(user_id, now);
        let value = serde_json::to_string(&marker)
            .map_err(|e| DomainError::internal(format!("Failed to encode revocation marker: {}", e)))?;
        let ttl = Duration::days(self.config.user_marker_ttl_days)
            .to_std()
            .map_err(|_| DomainError::internal("Invalid user marker TTL"))?;
        self.store.set_with_ttl(&Self::user_key(user_id), &value, ttl).await?;

        info!(user_id = %user_id, "User revocation marker set");
        Ok(())
    }

    pub async fn is_revoked(&self, jti: &str) -> bool {
        match self.store.get(&Self::jti_key(jti)).await {
            Ok(entry) => entry.is_some(),
            Err(e) => {
                warn!(
                    jti = %jti,
                    error = %e,
                    event = "blacklist_store_unavailable",
                    "Blacklist lookup failed, treating token as not revoked"
                );
                false
            }
        }
    }

    /// True when a user marker exists and `issued_at` (the `iat` claim) predates it
    pub async fn is_user_revoked(&self, user_id: Uuid, issued_at: i64) -> bool {
        let raw = match self.store.get(&Self::user_key(user_id)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    error = %e,
                    event = "blacklist_store_unavailable",
                    "User revocation lookup failed, treating token as not revoked"
                );
                return false;
            }
        };

        match serde_json::from_str::<UserRevocationMarker>(&raw) {
            Ok(marker) => marker.revokes(issued_at),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Unreadable user revocation marker");
                false
            }
        }
    }
}
