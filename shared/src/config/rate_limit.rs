//! Rate limiting configuration module

use serde::{Deserialize, Serialize};

/// A fixed-window limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WindowLimit {
    pub limit: u64,
    pub window_seconds: u64,
}

impl WindowLimit {
    pub const fn new(limit: u64, window_seconds: u64) -> Self {
        Self { limit, window_seconds }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Short per-phone window for OTP sends
    #[serde(default = "default_otp_send")]
    pub otp_send: WindowLimit,

    #[serde(default = "default_otp_per_phone_per_hour")]
    pub otp_per_phone_per_hour: u64,

    #[serde(default = "default_otp_per_phone_per_day")]
    pub otp_per_phone_per_day: u64,

    #[serde(default = "default_otp_per_phone_per_month")]
    pub otp_per_phone_per_month: u64,

    /// Per-IP hourly cap for OTP sends; `None` disables it
    #[serde(default)]
    pub otp_per_ip_per_hour: Option<u64>,

    /// Password login attempts per login name and IP
    #[serde(default = "default_login_per_ip")]
    pub login_per_ip: WindowLimit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            otp_send: default_otp_send(),
            otp_per_phone_per_hour: default_otp_per_phone_per_hour(),
            otp_per_phone_per_day: default_otp_per_phone_per_day(),
            otp_per_phone_per_month: default_otp_per_phone_per_month(),
            otp_per_ip_per_hour: None,
            login_per_ip: default_login_per_ip(),
        }
    }
}

impl RateLimitConfig {
    /// Every limit switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_otp_send() -> WindowLimit {
    WindowLimit::new(1, 60)
}

fn default_otp_per_phone_per_hour() -> u64 {
    5
}

fn default_otp_per_phone_per_day() -> u64 {
    10
}

fn default_otp_per_phone_per_month() -> u64 {
    60
}

fn default_login_per_ip() -> WindowLimit {
    WindowLimit::new(10, 300)
}
