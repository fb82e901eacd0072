//! Uniform response timing for verification failures

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Pads a failing call so it never returns before `minimum` has elapsed
///
/// "No such code" and "wrong code" take different paths through the stores;
/// padding every failure to the same floor hides which one happened.
#[derive(Debug, Clone, Copy)]
pub struct UniformDelay {
    minimum: Duration,
}

impl UniformDelay {
    pub fn new(minimum: Duration) -> Self {
        Self { minimum }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn start(&self) -> Instant {
        Instant::now()
    }

    /// Sleep until `minimum` after `started`; returns at once if already past
    pub async fn pad(&self, started: Instant) {
        let deadline = started + self.minimum;
        let now = Instant::now();
        if deadline > now {
            debug!(delay_ms = (deadline - now).as_millis() as u64, "Padding failed verification");
            tokio::time::sleep_until(deadline).await;
        }
    }
}
