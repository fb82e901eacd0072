//! Device registry configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    #[serde(default = "default_max_trusted_devices")]
    pub max_trusted_devices_per_user: usize,

    /// Upper bound for any trust grant
    #[serde(default = "default_max_trust_days")]
    pub max_trust_days: i64,

    /// Devices idle longer than this lose their trust; `None` disables the sweep
    #[serde(default)]
    pub inactivity_days: Option<i64>,

    /// Lifetime of the per-user trust lock
    #[serde(default = "default_lock_ttl_ms")]
    pub lock_ttl_ms: u64,

    /// How long a trust request waits for the per-user lock
    #[serde(default = "default_lock_wait_ms")]
    pub lock_wait_ms: u64,

    #[serde(default = "default_lock_retry_interval_ms")]
    pub lock_retry_interval_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            max_trusted_devices_per_user: default_max_trusted_devices(),
            max_trust_days: default_max_trust_days(),
            inactivity_days: None,
            lock_ttl_ms: default_lock_ttl_ms(),
            lock_wait_ms: default_lock_wait_ms(),
            lock_retry_interval_ms: default_lock_retry_interval_ms(),
        }
    }
}

fn default_max_trusted_devices() -> usize {
    3
}

fn default_max_trust_days() -> i64 {
    90
}

fn default_lock_ttl_ms() -> u64 {
    5000
}

fn default_lock_wait_ms() -> u64 {
    2000
}

fn default_lock_retry_interval_ms() -> u64 {
    50
}
