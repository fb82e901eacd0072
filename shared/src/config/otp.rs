//! OTP and SMS delivery configuration

use serde::{Deserialize, Serialize};

/// One-time password configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    #[serde(default = "default_expiry_minutes")]
    pub expiry_minutes: i64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,

    /// Lock applied once `max_attempts` is reached
    #[serde(default = "default_lock_minutes")]
    pub lock_minutes: i64,

    #[serde(default = "default_resend_cooldown_seconds")]
    pub resend_cooldown_seconds: i64,

    /// Server secret keying the code HMAC
    #[serde(default)]
    pub hmac_secret: String,

    /// Minimum duration of every failed verification
    #[serde(default = "default_failure_delay_ms")]
    pub failure_delay_ms: u64,

    /// Country calling code applied to national numbers, e.g. `61`
    #[serde(default = "default_country_code")]
    pub default_country_code: String,

    /// Trust window granted when the caller asks to remember the device
    #[serde(default = "default_trust_window_days")]
    pub trust_window_days: i64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            expiry_minutes: default_expiry_minutes(),
            max_attempts: default_max_attempts(),
            lock_minutes: default_lock_minutes(),
            resend_cooldown_seconds: default_resend_cooldown_seconds(),
            hmac_secret: String::new(),
            failure_delay_ms: default_failure_delay_ms(),
            default_country_code: default_country_code(),
            trust_window_days: default_trust_window_days(),
        }
    }
}

/// SMS provider selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsProvider {
    #[default]
    Mock,
    Twilio,
}

/// SMS delivery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmsConfig {
    #[serde(default)]
    pub provider: SmsProvider,

    #[serde(default)]
    pub account_sid: String,

    #[serde(default)]
    pub auth_token: String,

    #[serde(default)]
    pub from_number: String,

    /// Delivery attempts per message, including the first
    #[serde(default = "default_sms_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff between attempts, doubled on each retry
    #[serde(default = "default_sms_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_sms_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            provider: SmsProvider::Mock,
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            max_attempts: default_sms_max_attempts(),
            retry_delay_ms: default_sms_retry_delay_ms(),
            request_timeout_secs: default_sms_request_timeout_secs(),
        }
    }
}

fn default_code_length() -> usize {
    6
}

fn default_expiry_minutes() -> i64 {
    5
}

fn default_max_attempts() -> i32 {
    3
}

fn default_lock_minutes() -> i64 {
    15
}

fn default_resend_cooldown_seconds() -> i64 {
    60
}

fn default_failure_delay_ms() -> u64 {
    400
}

fn default_country_code() -> String {
    "61".to_string()
}

fn default_trust_window_days() -> i64 {
    30
}

fn default_sms_max_attempts() -> u32 {
    3
}

fn default_sms_retry_delay_ms() -> u64 {
    500
}

fn default_sms_request_timeout_secs() -> u64 {
    10
}
