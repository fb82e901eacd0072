//! SMS delivery contract and bounded retry

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use tg_shared::config::SmsConfig;
use tg_shared::phone::mask_phone_number;

use crate::errors::DomainResult;

/// Outbound SMS collaborator
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Send `message` to an E.164 number, returning the provider message id
    async fn send_sms(&self, phone: &str, message: &str) -> DomainResult<String>;

    fn provider_name(&self) -> &str;
}

#[async_trait]
impl<T: SmsSender + ?Sized> SmsSender for Arc<T> {
    async fn send_sms(&self, phone: &str, message: &str) -> DomainResult<String> {
        (**self).send_sms(phone, message).await
    }

    fn provider_name(&self) -> &str {
        (**self).provider_name()
    }
}

/// Retry budget for SMS delivery
#[derive(Debug, Clone, Copy)]
pub struct DeliveryPolicy {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure
    pub base_delay: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self::from(&SmsConfig::default())
    }
}

impl From<&SmsConfig> for DeliveryPolicy {
    fn from(sms: &SmsConfig) -> Self {
        Self {
            max_attempts: sms.max_attempts.max(1),
            base_delay: Duration::from_millis(sms.retry_delay_ms),
        }
    }
}

/// Deliver with exponential backoff; exhaustion is logged, never returned
///
/// # Returns
/// * `Some(message_id)` - Accepted by the provider
/// * `None` - Every attempt failed
pub async fn deliver_with_retry<S: SmsSender + ?Sized>(
    sender: &S,
    phone: &str,
    message: &str,
    policy: DeliveryPolicy,
) -> Option<String> {
    let masked = mask_phone_number(phone);
    let mut delay = policy.base_delay;

    for attempt in 1..=policy.max_attempts {
        match sender.send_sms(phone, message).await {
            Ok(message_id) => {
                info!(
                    phone = %masked,
                    provider = sender.provider_name(),
                    message_id = %message_id,
                    attempt = attempt,
                    "SMS delivered"
                );
                return Some(message_id);
            }
            Err(e) => {
                warn!(
                    phone = %masked,
                    provider = sender.provider_name(),
                    attempt = attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "SMS delivery attempt failed"
                );
                if attempt < policy.max_attempts {
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }

    warn!(
        phone = %masked,
        provider = sender.provider_name(),
        event = "sms_delivery_exhausted",
        "SMS delivery gave up"
    );
    None
}
