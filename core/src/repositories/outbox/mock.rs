//! Mock implementation of OutboxRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::entities::outbox::{OutboxMessage, OutboxStatus};
use crate::errors::{DomainError, DomainResult};

use super::r#trait::OutboxRepository;

#[derive(Clone, Default)]
pub struct MockOutboxRepository {
    pub messages: Arc<Mutex<Vec<OutboxMessage>>>,
    failing: Arc<AtomicBool>,
}

impl MockOutboxRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<OutboxMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.snapshot().into_iter().map(|m| m.event_type).collect()
    }

    fn check(&self) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::unavailable("mock outbox down"));
        }
        Ok(())
    }
}

#[async_trait]
impl OutboxRepository for MockOutboxRepository {
    async fn enqueue(&self, message: &OutboxMessage) -> DomainResult<()> {
        self.check()?;
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn claim_due(
        &self,
        limit: u32,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> DomainResult<Vec<OutboxMessage>> {
        self.check()?;
        let mut messages = self.messages.lock().unwrap();
        let mut claimed = Vec::new();
        for message in messages.iter_mut() {
            if claimed.len() as u32 >= limit {
                break;
            }
            if message.status == OutboxStatus::Pending && message.available_at <= now {
                message.attempts += 1;
                message.available_at = now + lease;
                claimed.push(message.clone());
            }
        }
        Ok(claimed)
    }

    async fn mark_dispatched(&self, id: Uuid, now: DateTime<Utc>) -> DomainResult<()> {
        self.check()?;
        if let Some(message) = self.messages.lock().unwrap().iter_mut().find(|m| m.id == id) {
            message.status = OutboxStatus::Dispatched;
            message.dispatched_at = Some(now);
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> DomainResult<()> {
        self.check()?;
        if let Some(message) = self.messages.lock().unwrap().iter_mut().find(|m| m.id == id) {
            message.last_error = Some(error.to_string());
            match retry_at {
                Some(at) => message.available_at = at,
                None => message.status = OutboxStatus::DeadLetter,
            }
        }
        Ok(())
    }

    async fn purge_dispatched(&self, before: DateTime<Utc>) -> DomainResult<u64> {
        self.check()?;
        let mut messages = self.messages.lock().unwrap();
        let count = messages.len();
        messages.retain(|m| {
            !(m.status == OutboxStatus::Dispatched && matches!(m.dispatched_at, Some(at) if at < before))
        });
        Ok((count - messages.len()) as u64)
    }
}
