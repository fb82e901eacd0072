//! Device store contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::device::DeviceRecord;
use crate::errors::DomainResult;

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn find(&self, user_id: Uuid, device_id: &str) -> DomainResult<Option<DeviceRecord>>;

    /// Create the record on first sight, otherwise refresh agent, IP and `last_seen_at`
    async fn touch(
        &self,
        user_id: Uuid,
        device_id: &str,
        user_agent: &str,
        ip: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<DeviceRecord>;

    /// Devices of the user with `trusted_until >= now`
    async fn list_trusted(&self, user_id: Uuid, now: DateTime<Utc>) -> DomainResult<Vec<DeviceRecord>>;

    async fn set_trusted_until(
        &self,
        user_id: Uuid,
        device_id: &str,
        trusted_until: DateTime<Utc>,
    ) -> DomainResult<bool>;

    async fn clear_trust(&self, user_id: Uuid, device_id: &str) -> DomainResult<bool>;

    /// Clear trust on devices last seen before `idle_before`, for one user or all
    async fn clear_idle_trust(
        &self,
        user_id: Option<Uuid>,
        idle_before: DateTime<Utc>,
    ) -> DomainResult<u64>;
}
