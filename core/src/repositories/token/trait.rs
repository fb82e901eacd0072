//! Refresh token store contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::token::{RefreshToken, RevocationReason};
use crate::errors::DomainResult;

/// Result of a compare-and-set rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The old token was active; it is now revoked and the child stored
    Rotated,
    /// The old token had already been revoked, by a concurrent rotation or
    /// otherwise; nothing was written
    AlreadyRevoked,
}

/// Repository trait for refresh token persistence
///
/// Implementations must provide read-your-writes consistency on lookups and
/// perform `insert_superseding` and `rotate` atomically, since both are relied
/// on to keep at most one active token per (user, device).
///
/// # Security Considerations
/// - Only token hashes are stored
/// - Rows are revoked, never deleted, except by `purge`
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Store a new token, revoking with `new_login` any token still active
    /// for the same (user, device)
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of tokens superseded
    /// * `Err(DomainError)` - Nothing was written
    async fn insert_superseding(&self, token: &RefreshToken, now: DateTime<Utc>) -> DomainResult<u64>;

    /// Find a token by the SHA-256 hash of its plaintext
    async fn find_by_hash(&self, token_hash: &str) -> DomainResult<Option<RefreshToken>>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<RefreshToken>>;

    /// Tokens of a user that are neither revoked nor expired at `now`
    async fn find_active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<RefreshToken>>;

    /// Revoke `old_id` with reason `rotated` and insert `child`, both or neither
    ///
    /// The revoke is conditional on `old_id` not being revoked yet, so exactly
    /// one of several concurrent callers observes `Rotated`.
    async fn rotate(
        &self,
        old_id: Uuid,
        child: &RefreshToken,
        now: DateTime<Utc>,
    ) -> DomainResult<RotationOutcome>;

    /// Revoke a single token if it is not revoked yet
    ///
    /// # Returns
    /// * `Ok(true)` - This call revoked the token
    /// * `Ok(false)` - Unknown or already revoked
    async fn revoke_if_active(
        &self,
        id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<bool>;

    /// Revoke every non-revoked token of a user, on all devices
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of tokens revoked
    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<u64>;

    /// Delete tokens revoked or expired before `older_than`
    async fn purge(&self, older_than: DateTime<Utc>) -> DomainResult<u64>;
}
