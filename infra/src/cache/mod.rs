//! Cache module - Redis implementation of the key-value store contract
//!
//! Counters, revocation markers and short-lived locks all go through
//! [`RedisCacheStore`]. Each command is bounded by the configured operation
//! timeout so a slow Redis degrades into `DomainError::Unavailable`.

pub mod redis_store;


pub use redis_store::RedisCacheStore;

// Re-export commonly used types
pub use tg_shared::config::CacheConfig;
