//! Append-only login attempt recording

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::entities::login_attempt::LoginAttempt;
use crate::errors::DomainResult;
use crate::repositories::LoginAttemptRepository;

/// Writes login attempts without ever failing the login that produced them
#[derive(Clone)]
pub struct LoginAttemptRecorder {
    repository: Arc<dyn LoginAttemptRepository>,
}

impl LoginAttemptRecorder {
    pub fn new(repository: Arc<dyn LoginAttemptRepository>) -> Self {
        Self { repository }
    }

    /// Best-effort append; `None` when the write failed
    pub async fn record(&self, attempt: LoginAttempt) -> Option<Uuid> {
        match self.repository.append(&attempt).await {
            Ok(()) => {
                debug!(
                    attempt_id = %attempt.id,
                    status = attempt.status.as_str(),
                    ip = %attempt.ip_address,
                    "Login attempt recorded"
                );
                Some(attempt.id)
            }
            Err(e) => {
                warn!(
                    status = attempt.status.as_str(),
                    user_id = ?attempt.user_id,
                    ip = %attempt.ip_address,
                    error = %e,
                    "Failed to record login attempt"
                );
                None
            }
        }
    }

    /// Failed and locked-out attempts from `ip` within the trailing `window`
    pub async fn failed_attempts_from_ip(
        &self,
        ip: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> DomainResult<u64> {
        self.repository.count_failed_from_ip(ip, now - window).await
    }
}
