//! Fixed-window rate limiter
//!
//! One atomic "increment, set expiry on first increment" per check. When the
//! store is unavailable the limiter fails open: it guards against abuse, not
//! correctness, and must not take logins down with it.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::repositories::CacheStore;

/// Result of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests counted in the current window, including this one
    pub count: u64,
    pub limit: u64,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Seconds until the window resets, at least one
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> u64 {
        (self.reset_at - now).num_seconds().max(1) as u64
    }
}

/// Build a composite `action:identity:ipHash` key
///
/// The IP is hashed so raw addresses never appear in the store; `-` stands in
/// when the limit is not scoped by IP.
pub fn rate_limit_key(action: &str, identity: &str, ip: Option<&str>) -> String {
    let ip_part = match ip {
        Some(ip) => {
            let digest = Sha256::digest(ip.as_bytes());
            hex::encode(&digest[..8])
        }
        None => "-".to_string(),
    };
    format!("{}:{}:{}", action, identity, ip_part)
}

pub struct RateLimiter<C: CacheStore> {
    store: Arc<C>,
}

impl<C: CacheStore> Clone for RateLimiter<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<C: CacheStore> RateLimiter<C> {
    pub fn new(store: Arc<C>) -> Self {
        Self { store }
    }

    /// Count a request against `key` and decide whether it may proceed
    ///
    /// `allowed` is `count <= limit`.
    pub async fn should_allow(&self, key: &str, limit: u64, window: Duration) -> RateLimitDecision {
        let now = Utc::now();
        match self.store.increment_with_expiry(key, window).await {
            Ok(state) => {
                let reset_in = chrono::Duration::from_std(state.ttl)
                    .unwrap_or_else(|_| chrono::Duration::seconds(window.as_secs() as i64));
                let decision = RateLimitDecision {
                    allowed: state.count <= limit,
                    count: state.count,
                    limit,
                    reset_at: now + reset_in,
                };
                if !decision.allowed {
                    warn!(
                        key = %key,
                        count = state.count,
                        limit = limit,
                        event = "rate_limit_exceeded",
                        "Rate limit exceeded"
                    );
                }
                decision
            }
            Err(e) => {
                warn!(
                    key = %key,
                    error = %e,
                    event = "rate_limit_store_unavailable",
                    "Rate limiter store unavailable, allowing request"
                );
                RateLimitDecision {
                    allowed: true,
                    count: 0,
                    limit,
                    reset_at: now + chrono::Duration::seconds(window.as_secs() as i64),
                }
            }
        }
    }
}
