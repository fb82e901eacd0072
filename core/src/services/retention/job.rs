//! Retention job for refresh tokens, OTP records, login attempts and the outbox
//!
//! Revoked refresh tokens are kept for replay detection until the configured
//! window has passed; only then are they physically deleted.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use tg_shared::config::RetentionConfig;

use crate::errors::DomainResult;
use crate::repositories::{
    LoginAttemptRepository, OtpVerificationRepository, OutboxRepository, RefreshTokenRepository,
};

/// Result of one retention cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub refresh_tokens_purged: u64,
    pub otp_records_purged: u64,
    pub login_attempts_purged: u64,
    pub outbox_messages_purged: u64,
    /// One entry per failed step
    pub errors: Vec<String>,
}

impl CleanupReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_purged(&self) -> u64 {
        self.refresh_tokens_purged
            + self.otp_records_purged
            + self.login_attempts_purged
            + self.outbox_messages_purged
    }
}

pub struct RetentionJob {
    tokens: Arc<dyn RefreshTokenRepository>,
    otps: Arc<dyn OtpVerificationRepository>,
    attempts: Arc<dyn LoginAttemptRepository>,
    outbox: Arc<dyn OutboxRepository>,
    config: RetentionConfig,
}

impl RetentionJob {
    pub fn new(
        tokens: Arc<dyn RefreshTokenRepository>,
        otps: Arc<dyn OtpVerificationRepository>,
        attempts: Arc<dyn LoginAttemptRepository>,
        outbox: Arc<dyn OutboxRepository>,
        config: RetentionConfig,
    ) -> Self {
        Self {
            tokens,
            otps,
            attempts,
            outbox,
            config,
        }
    }

    /// Run every purge step once
    ///
    /// A failing step is logged and recorded in the report; the remaining
    /// steps still run.
    pub async fn run_once(&self, now: DateTime<Utc>) -> CleanupReport {
        let mut report = CleanupReport::default();
        if !self.config.enabled {
            return report;
        }

        info!("Starting retention cycle");

        let cutoff = now - Duration::days(self.config.revoked_token_retention_days);
        report.refresh_tokens_purged = Self::step(
            &mut report.errors,
            "refresh_tokens",
            self.tokens.purge(cutoff).await,
        );

        let cutoff = now - Duration::days(self.config.otp_retention_days);
        report.otp_records_purged = Self::step(
            &mut report.errors,
            "otp_verifications",
            self.otps.purge_expired(cutoff).await,
        );

        let cutoff = now - Duration::days(self.config.login_attempt_retention_days);
        report.login_attempts_purged = Self::step(
            &mut report.errors,
            "login_attempts",
            self.attempts.purge_older_than(cutoff).await,
        );

        let cutoff = now - Duration::days(self.config.outbox_retention_days);
        report.outbox_messages_purged = Self::step(
            &mut report.errors,
            "outbox",
            self.outbox.purge_dispatched(cutoff).await,
        );

        info!(
            refresh_tokens = report.refresh_tokens_purged,
            otp_records = report.otp_records_purged,
            login_attempts = report.login_attempts_purged,
            outbox_messages = report.outbox_messages_purged,
            failed_steps = report.errors.len(),
            "Retention cycle completed"
        );
        report
    }

    fn step(errors: &mut Vec<String>, name: &str, result: DomainResult<u64>) -> u64 {
        match result {
            Ok(count) => count,
            Err(e) => {
                error!(step = name, error = %e, "Retention step failed");
                errors.push(format!("{}: {}", name, e));
                0
            }
        }
    }

    /// Run a cycle every `interval_seconds` until `cancel` fires
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        if !self.config.enabled {
            warn!("Retention job is disabled");
            return;
        }

        let period = std::time::Duration::from_secs(self.config.interval_seconds.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_seconds = self.config.interval_seconds, "Retention job started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let report = self.run_once(Utc::now()).await;
            if !report.is_success() {
                warn!(errors = ?report.errors, "Retention cycle completed with errors");
            }
        }
        info!("Retention job stopped");
    }

    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
