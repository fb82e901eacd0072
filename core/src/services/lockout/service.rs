//! Account lockout with clamped durations

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use tg_shared::config::LockoutConfig;

use crate::domain::entities::outbox::SecurityEvent;
use crate::errors::DomainResult;
use crate::repositories::IdentityStore;
use crate::services::outbox::SecurityEventPublisher;

pub struct LockoutService<I: IdentityStore> {
    identity: Arc<I>,
    events: SecurityEventPublisher,
    config: LockoutConfig,
}

impl<I: IdentityStore> LockoutService<I> {
    pub fn new(identity: Arc<I>, events: SecurityEventPublisher, config: LockoutConfig) -> Self {
        Self {
            identity,
            events,
            config,
        }
    }

    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    /// Clamp a requested lockout end into `[now + min, now + max]`
    pub fn clamp_lockout_end(&self, requested_end: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        let earliest = now + Duration::seconds(self.config.min_lockout_seconds);
        let latest = now + Duration::days(self.config.max_lockout_days);
        requested_end.clamp(earliest, latest)
    }

    /// Lock the account until the clamped end; locking again simply moves the end
    pub async fn lock(
        &self,
        user_id: Uuid,
        requested_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DomainResult<DateTime<Utc>> {
        let lockout_end = self.clamp_lockout_end(requested_end, now);
        self.identity.set_lockout_end(user_id, Some(lockout_end)).await?;

        info!(user_id = %user_id, lockout_end = %lockout_end, event = "account_locked", "Account locked");
        self.events
            .publish(SecurityEvent::AccountLocked { user_id, lockout_end })
            .await;
        Ok(lockout_end)
    }

    /// End the lockout now and reset the failure counter
    pub async fn unlock(&self, user_id: Uuid, now: DateTime<Utc>) -> DomainResult<()> {
        self.identity.set_lockout_end(user_id, Some(now)).await?;
        self.identity.reset_failed_attempts(user_id).await?;

        info!(user_id = %user_id, event = "account_unlocked", "Account unlocked");
        self.events
            .publish(SecurityEvent::AccountUnlocked { user_id })
            .await;
        Ok(())
    }
}
