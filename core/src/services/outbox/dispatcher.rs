//! Background delivery of outbox messages

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use tg_shared::config::OutboxConfig;

use crate::domain::entities::outbox::OutboxMessage;
use crate::errors::DomainResult;
use crate::repositories::OutboxRepository;

const MAX_BACKOFF_SECONDS: i64 = 3600;

/// Destination for dispatched security events
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, message: &OutboxMessage) -> DomainResult<()>;
}

/// Writes every event to the `security_audit` tracing target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn deliver(&self, message: &OutboxMessage) -> DomainResult<()> {
        info!(
            target: "security_audit",
            event_id = %message.id,
            event_type = %message.event_type,
            created_at = %message.created_at,
            payload = %message.payload,
            "Security event"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub retried: usize,
    pub dead_lettered: usize,
}

impl DispatchReport {
    pub fn processed(&self) -> usize {
        self.delivered + self.retried + self.dead_lettered
    }
}

/// Polls the outbox and hands claimed messages to an [`EventSink`]
///
/// Failed deliveries are rescheduled with exponential backoff; once a message
/// has been attempted `max_attempts` times it is dead-lettered.
pub struct OutboxDispatcher<S: EventSink> {
    outbox: Arc<dyn OutboxRepository>,
    sink: S,
    config: OutboxConfig,
}

impl<S: EventSink + 'static> OutboxDispatcher<S> {
    pub fn new(outbox: Arc<dyn OutboxRepository>, sink: S, config: OutboxConfig) -> Self {
        Self {
            outbox,
            sink,
            config,
        }
    }

    /// Claim and deliver one batch of due messages
    pub async fn dispatch_batch(&self, now: DateTime<Utc>) -> DomainResult<DispatchReport> {
        let lease = Duration::seconds(self.config.lease_seconds);
        let batch = self
            .outbox
            .claim_due(self.config.batch_size, now, lease)
            .await?;

        let mut report = DispatchReport::default();
        for message in &batch {
            match self.sink.deliver(message).await {
                Ok(()) => {
                    self.outbox.mark_dispatched(message.id, now).await?;
                    report.delivered += 1;
                }
                Err(e) if message.attempts >= self.config.max_attempts => {
                    error!(
                        event_id = %message.id,
                        event_type = %message.event_type,
                        attempts = message.attempts,
                        error = %e,
                        "Outbox message dead-lettered"
                    );
                    self.outbox
                        .mark_failed(message.id, &e.to_string(), None)
                        .await?;
                    report.dead_lettered += 1;
                }
                Err(e) => {
                    let retry_at = now + self.backoff(message.attempts);
                    warn!(
                        event_id = %message.id,
                        event_type = %message.event_type,
                        attempts = message.attempts,
                        retry_at = %retry_at,
                        error = %e,
                        "Outbox delivery failed, rescheduling"
                    );
                    self.outbox
                        .mark_failed(message.id, &e.to_string(), Some(retry_at))
                        .await?;
                    report.retried += 1;
                }
            }
        }

        if report.processed() > 0 {
            debug!(
                delivered = report.delivered,
                retried = report.retried,
                dead_lettered = report.dead_lettered,
                "Outbox batch dispatched"
            );
        }
        Ok(report)
    }

    /// Delay before the next attempt after `attempts` failures
    pub fn backoff(&self, attempts: i32) -> Duration {
        let exponent = attempts.saturating_sub(1).clamp(0, 30) as u32;
        let seconds = self
            .config
            .base_backoff_seconds
            .max(1)
            .saturating_mul(1i64 << exponent)
            .min(MAX_BACKOFF_SECONDS);
        Duration::seconds(seconds)
    }

    /// Poll until `cancel` fires; a batch already running is finished first
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let period = std::time::Duration::from_millis(self.config.poll_interval_ms.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(poll_interval_ms = self.config.poll_interval_ms, "Outbox dispatcher started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.dispatch_batch(Utc::now()).await {
                error!(error = %e, "Outbox dispatch cycle failed");
            }
        }
        info!("Outbox dispatcher stopped");
    }

    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
