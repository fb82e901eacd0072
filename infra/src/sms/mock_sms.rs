//! Development SMS sender

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::info;
use uuid::Uuid;

use tg_core::errors::{DomainError, DomainResult};
use tg_core::services::SmsSender;
use tg_shared::phone::{is_valid_e164, mask_phone_number};

/// Logs messages instead of sending them
#[derive(Debug, Default)]
pub struct MockSmsSender {
    sent: AtomicUsize,
    simulate_failure: AtomicBool,
}

impl MockSmsSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_simulate_failure(&self, fail: bool) {
        self.simulate_failure.store(fail, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmsSender for MockSmsSender {
    async fn send_sms(&self, phone: &str, message: &str) -> DomainResult<String> {
        if !is_valid_e164(phone) {
            return Err(DomainError::Validation {
                message: "phone number must be E.164".to_string(),
            });
        }
        if self.simulate_failure.load(Ordering::SeqCst) {
            return Err(DomainError::unavailable("mock sms failure"));
        }

        self.sent.fetch_add(1, Ordering::SeqCst);
        let message_id = format!("mock_{}", Uuid::new_v4().simple());
        info!(
            phone = %mask_phone_number(phone),
            message_id = %message_id,
            length = message.len(),
            "Mock SMS accepted"
        );
        // Only in debug builds, so local runs can read the code
        #[cfg(debug_assertions)]
        tracing::debug!(body = %message, "Mock SMS body");
        Ok(message_id)
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
