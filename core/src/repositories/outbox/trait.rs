//! Security event outbox contract.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::outbox::OutboxMessage;
use crate::errors::DomainResult;

#[async_trait]
pub trait OutboxRepository: Send + Sync {
    async fn enqueue(&self, message: &OutboxMessage) -> DomainResult<()>;

    /// Claim up to `limit` pending messages with `available_at <= now`
    ///
    /// Claimed messages have `attempts` incremented and `available_at` pushed
    /// to `now + lease`, so a dispatcher that dies mid-batch leaves them to be
    /// picked up again once the lease runs out.
    async fn claim_due(
        &self,
        limit: u32,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> DomainResult<Vec<OutboxMessage>>;

    async fn mark_dispatched(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<()>;

    /// Record a delivery failure
    ///
    /// `retry_at = Some(t)` makes the message claimable again at `t`;
    /// `None` moves it to the dead-letter state.
    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> DomainResult<()>;

    /// Delete dispatched messages older than `before`
    async fn purge_dispatched(&self, before: DateTime<Utc>) -> DomainResult<u64>;
}
