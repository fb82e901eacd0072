//! Fixed-window rate limiting over the shared key-value store

mod limiter;


pub use limiter::{rate_limit_key, RateLimitDecision, RateLimiter};
