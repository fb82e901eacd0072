//! Best-effort security event publisher

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::entities::outbox::{OutboxMessage, SecurityEvent};
use crate::repositories::OutboxRepository;

/// Writes security events to the outbox
///
/// Publishing never fails the caller: the return value says whether the event
/// was stored and a failure is logged with the full event.
#[derive(Clone)]
pub struct SecurityEventPublisher {
    outbox: Arc<dyn OutboxRepository>,
}

impl SecurityEventPublisher {
    pub fn new(outbox: Arc<dyn OutboxRepository>) -> Self {
        Self { outbox }
    }

    pub async fn publish(&self, event: SecurityEvent) -> Option<Uuid> {
        let message = match OutboxMessage::new(&event, Utc::now()) {
            Ok(message) => message,
            Err(e) => {
                error!(event_type = event.event_type(), error = %e, "Failed to encode security event");
                return None;
            }
        };

        match self.outbox.enqueue(&message).await {
            Ok(()) => {
                debug!(
                    message_id = %message.id,
                    event_type = %message.event_type,
                    "Security event queued"
                );
                Some(message.id)
            }
            Err(e) => {
                error!(
                    event_type = %message.event_type,
                    user_id = %event.user_id(),
                    payload = %message.payload,
                    error = %e,
                    "Failed to queue security event"
                );
                None
            }
        }
    }
}
