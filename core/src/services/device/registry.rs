//! Device registry
//!
//! Trust changes for a user are serialized by a short-lived lock in the
//! shared key-value store, keyed per user, so that "count trusted devices,
//! maybe evict, then grant" is atomic across processes.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use tg_shared::config::DeviceConfig;

use crate::domain::entities::device::DeviceRecord;
use crate::domain::entities::outbox::SecurityEvent;
use crate::domain::value_objects::ClientContext;
use crate::errors::{DomainError, DomainResult};
use crate::repositories::{CacheStore, DeviceRepository};
use crate::services::outbox::SecurityEventPublisher;

const TRUST_LOCK_PREFIX: &str = "device_trust_lock:";

pub struct DeviceRegistry<D: DeviceRepository, C: CacheStore> {
    devices: Arc<D>,
    locks: Arc<C>,
    events: SecurityEventPublisher,
    config: DeviceConfig,
}

impl<D: DeviceRepository, C: CacheStore> DeviceRegistry<D, C> {
    pub fn new(
        devices: Arc<D>,
        locks: Arc<C>,
        events: SecurityEventPublisher,
        config: DeviceConfig,
    ) -> Self {
        Self {
            devices,
            locks,
            events,
            config,
        }
    }

    /// Create or touch the device record and sweep idle trust for the user
    pub async fn upsert(
        &self,
        user_id: Uuid,
        client: &ClientContext,
        now: DateTime<Utc>,
    ) -> DomainResult<DeviceRecord> {
        let record = self
            .devices
            .touch(user_id, &client.device_id, &client.user_agent, &client.ip_address, now)
            .await?;

        if self.config.inactivity_days.is_some() {
            if let Err(e) = self.deactivate_idle(Some(user_id), now).await {
                warn!(user_id = %user_id, error = %e, "Idle device sweep failed");
            }
        }
        Ok(record)
    }

    /// Trusted means a record exists with `trusted_until >= now`
    ///
    /// A lookup failure reports the device as untrusted, which only ever
    /// asks for more verification.
    pub async fn is_trusted(&self, user_id: Uuid, device_id: &str, now: DateTime<Utc>) -> bool {
        match self.devices.find(user_id, device_id).await {
            Ok(Some(record)) => record.is_trusted(now),
            Ok(None) => false,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Device lookup failed, treating as untrusted");
                false
            }
        }
    }

    /// Grant or extend trust for a known device
    ///
    /// The window is clamped to `max_trust_days`. An existing grant is only
    /// ever extended. When the user is at `max_trusted_devices_per_user`, the
    /// trusted device expiring first is evicted.
    ///
    /// # Returns
    /// * `Ok(trusted_until)` - The effective trust expiry
    /// * `Err(DomainError::NotFound)` - The device was never seen
    /// * `Err(DomainError::Unavailable)` - The per-user lock was not obtained
    pub async fn trust(
        &self,
        user_id: Uuid,
        device_id: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> DomainResult<DateTime<Utc>> {
        if window <= Duration::zero() {
            return Err(DomainError::Validation {
                message: "Trust window must be positive".to_string(),
            });
        }

        let lock_key = format!("{}{}", TRUST_LOCK_PREFIX, user_id);
        let owner = Uuid::new_v4().to_string();
        self.acquire_trust_lock(&lock_key, &owner).await?;

        let result = self.trust_locked(user_id, device_id, window, now).await;

        if let Err(e) = self.locks.release_lock(&lock_key, &owner).await {
            warn!(user_id = %user_id, error = %e, "Failed to release device trust lock");
        }
        result
    }

    async fn acquire_trust_lock(&self, key: &str, owner: &str) -> DomainResult<()> {
        let ttl = std::time::Duration::from_millis(self.config.lock_ttl_ms);
        let retry = std::time::Duration::from_millis(self.config.lock_retry_interval_ms.max(1));
        let deadline = tokio::time::Instant::now()
            + std::time::Duration::from_millis(self.config.lock_wait_ms);

        loop {
            if self.locks.try_acquire_lock(key, owner, ttl).await? {
                return Ok(());
            }
            if tokio::time::Instant::now() + retry > deadline {
                return Err(DomainError::unavailable("device trust lock busy"));
            }
            tokio::time::sleep(retry).await;
        }
    }

    async fn trust_locked(
        &self,
        user_id: Uuid,
        device_id: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> DomainResult<DateTime<Utc>> {
        if self.devices.find(user_id, device_id).await?.is_none() {
            return Err(DomainError::NotFound {
                resource: "device".to_string(),
            });
        }

        let desired = now + window.min(Duration::days(self.config.max_trust_days));
        let mut trusted = self.devices.list_trusted(user_id, now).await?;

        if let Some(current) = trusted.iter().find(|d| d.device_id == device_id) {
            let until = current.trusted_until.map_or(desired, |t| t.max(desired));
            self.devices.set_trusted_until(user_id, device_id, until).await?;
            return Ok(until);
        }

        // Earliest expiry first
        trusted.sort_by_key(|d| d.trusted_until);
        let cap = self.config.max_trusted_devices_per_user.max(1);
        let excess = (trusted.len() + 1).saturating_sub(cap);
        for evicted in trusted.iter().take(excess) {
            self.devices.clear_trust(user_id, &evicted.device_id).await?;
            info!(
                user_id = %user_id,
                evicted_device = %evicted.device_id,
                trusted_device = %device_id,
                event = "device_trust_evicted",
                "Evicted trusted device to respect per-user cap"
            );
            self.events
                .publish(SecurityEvent::DeviceTrustEvicted {
                    user_id,
                    evicted_device_id: evicted.device_id.clone(),
                    trusted_device_id: device_id.to_string(),
                })
                .await;
        }

        self.devices.set_trusted_until(user_id, device_id, desired).await?;
        info!(user_id = %user_id, device_id = %device_id, trusted_until = %desired, "Device trusted");
        Ok(desired)
    }

    pub async fn untrust(&self, user_id: Uuid, device_id: &str) -> DomainResult<bool> {
        self.devices.clear_trust(user_id, device_id).await
    }

    /// Clear trust on devices idle past `inactivity_days`; no-op when unset
    pub async fn deactivate_idle(&self, user_id: Option<Uuid>, now: DateTime<Utc>) -> DomainResult<u64> {
        let Some(days) = self.config.inactivity_days else {
            return Ok(0);
        };
        let cleared = self
            .devices
            .clear_idle_trust(user_id, now - Duration::days(days))
            .await?;
        if cleared > 0 {
            info!(cleared = cleared, "Cleared trust on idle devices");
        }
        Ok(cleared)
    }
}
