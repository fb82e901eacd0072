//! External identity store consumed by the login orchestrators.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::user::UserAccount;
use crate::errors::DomainResult;

/// Account lookup and credential checks owned by the identity system
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> DomainResult<Option<UserAccount>>;

    /// Lookup by login name or email
    async fn find_by_login(&self, login_name_or_email: &str) -> DomainResult<Option<UserAccount>>;

    /// Lookup by normalized E.164 phone number
    async fn find_by_phone(&self, phone_number: &str) -> DomainResult<Option<UserAccount>>;

    /// Create an account for a phone number, or return the one that already exists
    async fn create_for_phone(&self, phone_number: &str, now: DateTime<Utc>) -> DomainResult<UserAccount>;

    async fn confirm_phone(&self, user_id: Uuid) -> DomainResult<()>;

    async fn check_password(&self, user_id: Uuid, password: &str) -> DomainResult<bool>;

    async fn is_locked_out(&self, user_id: Uuid, now: DateTime<Utc>) -> DomainResult<bool>;

    /// Increment the consecutive failure counter and return the new value
    async fn record_failed_attempt(&self, user_id: Uuid) -> DomainResult<i32>;

    async fn set_lockout_end(&self, user_id: Uuid, lockout_end: Option<DateTime<Utc>>) -> DomainResult<()>;

    async fn reset_failed_attempts(&self, user_id: Uuid) -> DomainResult<()>;
}
