//! Login attempt log contract (append-only).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::login_attempt::LoginAttempt;
use crate::errors::DomainResult;

#[async_trait]
pub trait LoginAttemptRepository: Send + Sync {
    async fn append(&self, attempt: &LoginAttempt) -> DomainResult<()>;

    /// Failed and locked-out attempts from `ip` at or after `since`
    async fn count_failed_from_ip(&self, ip: &str, since: DateTime<Utc>) -> DomainResult<u64>;

    async fn purge_older_than(&self, before: DateTime<Utc>) -> DomainResult<u64>;
}
