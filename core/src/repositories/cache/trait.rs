//! Shared low-latency key-value store contract.
//!
//! Backs rate-limit counters, revocation markers and short-lived locks.
//! Every operation is a single round-trip and must be bounded by a timeout
//! in the implementation.

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::DomainResult;

/// Counter value after an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterState {
    pub count: u64,
    /// Time until the counter resets
    pub ttl: Duration,
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Atomically increment `key`, setting its expiry to `window` only when
    /// this increment created it
    async fn increment_with_expiry(&self, key: &str, window: Duration) -> DomainResult<CounterState>;

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> DomainResult<()>;

    async fn get(&self, key: &str) -> DomainResult<Option<String>>;

    async fn delete(&self, key: &str) -> DomainResult<bool>;

    /// Set `key` to `owner` only if absent
    async fn try_acquire_lock(&self, key: &str, owner: &str, ttl: Duration) -> DomainResult<bool>;

    /// Delete `key` only if it still holds `owner`
    async fn release_lock(&self, key: &str, owner: &str) -> DomainResult<bool>;
}
