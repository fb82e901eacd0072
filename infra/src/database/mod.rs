//! Database module - MySQL implementations using SQLx
//!
//! This module provides:
//! - Connection pool management and embedded migrations
//! - Store implementations for every persistent contract in `tg_core`

pub mod connection;
pub mod mysql;


// Re-export commonly used types
pub use connection::{DatabasePool, PoolStatistics};
pub use mysql::{
    MySqlDeviceRepository, MySqlIdentityStore, MySqlLoginAttemptRepository, MySqlOtpRepository,
    MySqlOutboxRepository, MySqlRefreshTokenRepository,
};
