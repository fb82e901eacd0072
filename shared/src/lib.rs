//! Shared configuration and utilities for the TokenGate engine
//!
//! This crate provides functionality used across all TokenGate crates:
//! - Configuration types and loading
//! - Phone number normalization and masking

pub mod config;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, BlacklistConfig, CacheConfig, ConfigError, DatabaseConfig, DeviceConfig,
    Environment, JwtAlgorithm, JwtConfig, LockoutConfig, LogFormat, LoggingConfig, OtpConfig,
    OutboxConfig, RateLimitConfig, RetentionConfig, SmsConfig, SmsProvider, WindowLimit,
};
pub use utils::phone;
