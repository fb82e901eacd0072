//! Background job configuration: retention and outbox dispatch

use serde::{Deserialize, Serialize};

/// Retention windows for the purge job
///
/// There is intentionally no `Default`: how long revoked refresh tokens are
/// kept for replay detection must be chosen by the operator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    /// Revoked or expired refresh tokens older than this are deleted
    pub revoked_token_retention_days: i64,

    #[serde(default = "default_otp_retention_days")]
    pub otp_retention_days: i64,

    #[serde(default = "default_login_attempt_retention_days")]
    pub login_attempt_retention_days: i64,

    #[serde(default = "default_outbox_retention_days")]
    pub outbox_retention_days: i64,

    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl RetentionConfig {
    /// Retention with the given refresh-token window and stock values elsewhere
    pub fn with_token_retention_days(days: i64) -> Self {
        Self {
            revoked_token_retention_days: days,
            otp_retention_days: default_otp_retention_days(),
            login_attempt_retention_days: default_login_attempt_retention_days(),
            outbox_retention_days: default_outbox_retention_days(),
            interval_seconds: default_interval_seconds(),
            enabled: default_enabled(),
        }
    }
}

/// Security event outbox dispatcher
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutboxConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Delivery attempts before a message is dead-lettered
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,

    #[serde(default = "default_base_backoff_seconds")]
    pub base_backoff_seconds: i64,

    /// How long a claimed message stays invisible to other dispatchers
    #[serde(default = "default_lease_seconds")]
    pub lease_seconds: i64,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
            base_backoff_seconds: default_base_backoff_seconds(),
            lease_seconds: default_lease_seconds(),
        }
    }
}

fn default_otp_retention_days() -> i64 {
    7
}

fn default_login_attempt_retention_days() -> i64 {
    180
}

fn default_outbox_retention_days() -> i64 {
    14
}

fn default_interval_seconds() -> u64 {
    3600
}

fn default_enabled() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_batch_size() -> u32 {
    50
}

fn default_max_attempts() -> i32 {
    8
}

fn default_base_backoff_seconds() -> i64 {
    5
}

fn default_lease_seconds() -> i64 {
    60
}
