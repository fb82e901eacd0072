//! Token signing, blacklist and lockout configuration

use serde::{Deserialize, Serialize};

/// Signing algorithm accepted for access tokens
///
/// Exactly one algorithm is configured; tokens whose header names a
/// different algorithm are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum JwtAlgorithm {
    #[default]
    HS256,
    RS256,
}

/// Access and refresh token configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// HMAC secret (HS256 only)
    #[serde(default)]
    pub secret: String,

    #[serde(default)]
    pub algorithm: JwtAlgorithm,

    /// PEM private key path (RS256 only)
    #[serde(default)]
    pub private_key_path: Option<String>,

    /// PEM public key path (RS256 only)
    #[serde(default)]
    pub public_key_path: Option<String>,

    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(default = "default_audience")]
    pub audience: String,

    #[serde(default = "default_access_token_ttl_minutes")]
    pub access_token_ttl_minutes: i64,

    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: JwtAlgorithm::HS256,
            private_key_path: None,
            public_key_path: None,
            issuer: default_issuer(),
            audience: default_audience(),
            access_token_ttl_minutes: default_access_token_ttl_minutes(),
            refresh_token_ttl_days: default_refresh_token_ttl_days(),
        }
    }
}

impl JwtConfig {
    /// HS256 configuration with the given secret
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }
}

/// Revocation marker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlacklistConfig {
    /// Lifetime of a per-user revocation marker; must outlive any access token
    #[serde(default = "default_user_marker_ttl_days")]
    pub user_marker_ttl_days: i64,
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            user_marker_ttl_days: default_user_marker_ttl_days(),
        }
    }
}

/// Password login lockout configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LockoutConfig {
    /// Floor applied to any requested lockout end
    #[serde(default = "default_min_lockout_seconds")]
    pub min_lockout_seconds: i64,

    /// Ceiling applied to any requested lockout end
    #[serde(default = "default_max_lockout_days")]
    pub max_lockout_days: i64,

    /// Consecutive password failures that trigger a lockout
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,

    /// Lockout applied after `max_failed_attempts`
    #[serde(default = "default_lockout_minutes")]
    pub lockout_minutes: i64,

    /// Window for counting failed attempts per IP
    #[serde(default = "default_failed_ip_window_minutes")]
    pub failed_ip_window_minutes: i64,

    /// Failed attempts from one IP inside the window before logins are refused
    #[serde(default = "default_failed_ip_threshold")]
    pub failed_ip_threshold: u64,

    /// Require an OTP challenge when the device is not trusted
    #[serde(default = "default_require_otp")]
    pub require_otp_for_untrusted_devices: bool,

    /// Minimum duration of a failed password login; keep it above the
    /// password hash cost so unknown and existing accounts look alike
    #[serde(default = "default_login_failure_delay_ms")]
    pub failure_delay_ms: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            min_lockout_seconds: default_min_lockout_seconds(),
            max_lockout_days: default_max_lockout_days(),
            max_failed_attempts: default_max_failed_attempts(),
            lockout_minutes: default_lockout_minutes(),
            failed_ip_window_minutes: default_failed_ip_window_minutes(),
            failed_ip_threshold: default_failed_ip_threshold(),
            require_otp_for_untrusted_devices: default_require_otp(),
            failure_delay_ms: default_login_failure_delay_ms(),
        }
    }
}

fn default_issuer() -> String {
    "tokengate".to_string()
}

fn default_audience() -> String {
    "tokengate-api".to_string()
}

fn default_access_token_ttl_minutes() -> i64 {
    15
}

fn default_refresh_token_ttl_days() -> i64 {
    30
}

fn default_user_marker_ttl_days() -> i64 {
    90
}

fn default_min_lockout_seconds() -> i64 {
    5
}

fn default_max_lockout_days() -> i64 {
    7
}

fn default_max_failed_attempts() -> u32 {
    5
}

fn default_lockout_minutes() -> i64 {
    15
}

fn default_failed_ip_window_minutes() -> i64 {
    15
}

fn default_login_failure_delay_ms() -> u64 {
    400
}

fn default_failed_ip_threshold() -> u64 {
    20
}

fn default_require_otp() -> bool {
    true
}
