//! OTP verification store contract.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::otp_verification::OtpVerification;
use crate::errors::DomainResult;

#[async_trait]
pub trait OtpVerificationRepository: Send + Sync {
    async fn insert(&self, record: &OtpVerification) -> DomainResult<()>;

    /// Most recently created record for the user, in any state
    async fn find_latest_for_user(&self, user_id: Uuid) -> DomainResult<Option<OtpVerification>>;

    /// Most recent record that is neither verified nor expired at `now`
    async fn find_latest_pending(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<OtpVerification>>;

    /// Count a failed guess in a single atomic update
    ///
    /// Follows [`OtpVerification::try_increment_attempts`]: `attempts` never
    /// passes `max_attempts` and `lock` is applied once the cap is reached.
    ///
    /// # Returns
    /// * `Ok(Some(record))` - The record after the update
    /// * `Ok(None)` - No such record
    async fn try_increment_attempts(
        &self,
        id: Uuid,
        lock: Option<Duration>,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<OtpVerification>>;

    /// Mark verified, conditional on the record still being valid at `now`
    ///
    /// # Returns
    /// * `Ok(true)` - This call verified the record
    /// * `Ok(false)` - Already verified, expired, locked or exhausted
    async fn mark_verified(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<bool>;

    /// Return a record to `Pending` with a new hash and expiry
    async fn reset_code(
        &self,
        id: Uuid,
        code_hash: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> DomainResult<bool>;

    /// Delete records that expired before `older_than`
    async fn purge_expired(&self, older_than: DateTime<Utc>) -> DomainResult<u64>;
}
