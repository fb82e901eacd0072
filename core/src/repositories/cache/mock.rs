//! Mock implementation of CacheStore for testing
//!
//! Expiry follows `tokio::time`, so tests running with a paused clock can
//! move windows forward with `tokio::time::advance`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::{DomainError, DomainResult};

use super::r#trait::{CacheStore, CounterState};

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Clone, Default)]
pub struct MockCacheStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    failing: Arc<AtomicBool>,
}

impl MockCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Live value, ignoring the failure toggle
    pub fn peek(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone())
    }

    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.lock().unwrap();
        let now = Instant::now();
        entries
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.expires_at - now)
    }

    fn check(&self) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::unavailable("mock cache down"));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MockCacheStore {
    async fn increment_with_expiry(&self, key: &str, window: Duration) -> DomainResult<CounterState> {
        self.check()?;
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                value: "0".to_string(),
                expires_at: now + window,
            });
        if entry.expires_at <= now {
            entry.value = "0".to_string();
            entry.expires_at = now + window;
        }
        let count = entry.value.parse::<u64>().unwrap_or(0) + 1;
        entry.value = count.to_string();
        Ok(CounterState {
            count,
            ttl: entry.expires_at - now,
        })
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> DomainResult<()> {
        self.check()?;
        self.entries.lock().unwrap().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        self.check()?;
        Ok(self.peek(key))
    }

    async fn delete(&self, key: &str) -> DomainResult<bool> {
        self.check()?;
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }

    async fn try_acquire_lock(&self, key: &str, owner: &str, ttl: Duration) -> DomainResult<bool> {
        self.check()?;
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        if entries.get(key).is_some_and(|e| e.expires_at > now) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: owner.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn release_lock(&self, key: &str, owner: &str) -> DomainResult<bool> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        if entries.get(key).is_some_and(|e| e.value == owner) {
            entries.remove(key);
            return Ok(true);
        }
        Ok(false)
    }
}
