//! # Infrastructure Layer
//!
//! Concrete implementations of the store contracts defined in `tg_core`.
//!
//! ## Architecture
//!
//! - **Database**: MySQL stores for refresh tokens, OTP records, devices,
//!   login attempts, the security outbox and the identity projection (SQLx)
//! - **Cache**: Redis key-value store for counters, revocation markers and locks
//! - **SMS**: Twilio over HTTP and a logging mock
//!
//! ## Features
//!
//! - `mysql`: MySQL stores (default)
//! - `redis-cache`: Redis key-value store (default)
//! - `twilio-sms`: Twilio SMS sender (default)

/// Redis key-value store
#[cfg(feature = "redis-cache")]
pub mod cache;

/// MySQL stores using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// SMS senders
pub mod sms;

/// Infrastructure-specific error types
///
/// Used while building connections and clients. Once running, store
/// implementations report failures as `DomainError::Unavailable`.
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Redis error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP client error for external services
    #[cfg(feature = "twilio-sms")]
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Connecting did not finish in time
    #[error("Timed out connecting to {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
