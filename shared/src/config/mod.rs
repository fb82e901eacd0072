//! Configuration module with one sub-module per concern
//!
//! - `auth` - access token signing, revocation markers and lockout
//! - `cache` - Redis key-value store
//! - `database` - MySQL connection pool
//! - `device` - trusted device registry
//! - `environment` - environment detection and logging
//! - `jobs` - retention and outbox dispatch
//! - `otp` - one-time passwords and SMS delivery
//! - `rate_limit` - fixed-window limits

pub mod auth;
pub mod cache;
pub mod database;
pub mod device;
pub mod environment;
pub mod jobs;
pub mod otp;
pub mod rate_limit;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{BlacklistConfig, JwtAlgorithm, JwtConfig, LockoutConfig};
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use device::DeviceConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use jobs::{OutboxConfig, RetentionConfig};
pub use otp::{OtpConfig, SmsConfig, SmsProvider};
pub use rate_limit::{RateLimitConfig, WindowLimit};

/// Prefix for environment variable overrides, e.g. `TOKENGATE__JWT__SECRET`
pub const ENV_PREFIX: &str = "TOKENGATE";

/// Minimum HS256 secret length in bytes
const MIN_HS256_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub jwt: JwtConfig,

    #[serde(default)]
    pub blacklist: BlacklistConfig,

    #[serde(default)]
    pub otp: OtpConfig,

    #[serde(default)]
    pub sms: SmsConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub lockout: LockoutConfig,

    /// Required; see [`RetentionConfig`]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub outbox: OutboxConfig,
}

impl AppConfig {
    /// Load configuration from `.env`, optional TOML files and `TOKENGATE__*` variables
    ///
    /// Later sources override earlier ones:
    /// 1. `config/tokengate.toml`
    /// 2. `config/tokengate.<environment>.toml`
    /// 3. environment variables
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = std::env::var("TOKENGATE_ENV")
            .ok()
            .and_then(|value| value.parse::<Environment>().ok())
            .unwrap_or_default();

        let settings = config::Config::builder()
            .set_default("environment", environment.to_string())?
            .add_source(config::File::with_name("config/tokengate").required(false))
            .add_source(config::File::with_name(environment.config_file()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = settings.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject configurations that would run the engine in an unsafe state
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.jwt.algorithm {
            JwtAlgorithm::HS256 if self.jwt.secret.len() < MIN_HS256_SECRET_LEN => {
                return Err(ConfigError::invalid(format!(
                    "jwt.secret must be at least {} bytes for HS256",
                    MIN_HS256_SECRET_LEN
                )));
            }
            JwtAlgorithm::RS256
                if self.jwt.private_key_path.is_none() || self.jwt.public_key_path.is_none() =>
            {
                return Err(ConfigError::invalid(
                    "jwt.private_key_path and jwt.public_key_path are required for RS256",
                ));
            }
            _ => {}
        }

        if self.jwt.access_token_ttl_minutes <= 0 || self.jwt.refresh_token_ttl_days <= 0 {
            return Err(ConfigError::invalid("token lifetimes must be positive"));
        }
        if self.otp.hmac_secret.is_empty() {
            return Err(ConfigError::invalid("otp.hmac_secret must be set"));
        }
        if self.otp.max_attempts <= 0 || self.otp.code_length < 4 {
            return Err(ConfigError::invalid(
                "otp.max_attempts must be positive and otp.code_length at least 4",
            ));
        }
        if self.device.max_trusted_devices_per_user == 0 {
            return Err(ConfigError::invalid(
                "device.max_trusted_devices_per_user must be at least 1",
            ));
        }
        if self.lockout.min_lockout_seconds > self.lockout.max_lockout_days * 86_400 {
            return Err(ConfigError::invalid(
                "lockout.min_lockout_seconds exceeds lockout.max_lockout_days",
            ));
        }
        if self.retention.revoked_token_retention_days <= 0 {
            return Err(ConfigError::invalid(
                "retention.revoked_token_retention_days must be positive",
            ));
        }
        if self.blacklist.user_marker_ttl_days * 24 * 60 < self.jwt.access_token_ttl_minutes {
            return Err(ConfigError::invalid(
                "blacklist.user_marker_ttl_days must cover the access token lifetime",
            ));
        }
        Ok(())
    }

    /// Local development configuration with explicit placeholder secrets
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            logging: LoggingConfig::for_environment(Environment::Development),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            jwt: JwtConfig::with_secret("development-only-secret-change-me-0123456789"),
            blacklist: BlacklistConfig::default(),
            otp: OtpConfig {
                hmac_secret: "development-only-otp-secret".to_string(),
                ..Default::default()
            },
            sms: SmsConfig::default(),
            rate_limit: RateLimitConfig::default(),
            device: DeviceConfig::default(),
            lockout: LockoutConfig::default(),
            retention: RetentionConfig::with_token_retention_days(30),
            outbox: OutboxConfig::default(),
        }
    }
}
