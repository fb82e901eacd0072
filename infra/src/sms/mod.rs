//! SMS Sender Module
//!
//! Implementations of the core `SmsSender` contract. Retries live in the OTP
//! service; a sender makes a single delivery attempt per call.
//!
//! ## Providers
//!
//! - **Mock**: logs a masked number, for development and tests
//! - **Twilio**: Messages API over HTTPS (feature `twilio-sms`)

use std::sync::Arc;

use tg_core::services::SmsSender;
use tg_shared::config::{SmsConfig, SmsProvider};

use crate::InfrastructureError;

pub mod mock_sms;

#[cfg(feature = "twilio-sms")]
pub mod twilio;

pub use mock_sms::MockSmsSender;

#[cfg(feature = "twilio-sms")]
pub use twilio::TwilioSmsSender;

#[cfg(test)]
mod tests;

/// Build the sender selected by `config.provider`
///
/// A provider that is selected but not compiled in, or missing credentials,
/// is a startup error rather than a silent fallback to the mock.
pub fn create_sms_sender(config: &SmsConfig) -> Result<Arc<dyn SmsSender>, InfrastructureError> {
    match config.provider {
        SmsProvider::Mock => {
            tracing::warn!("Using mock SMS sender, codes will only appear in logs");
            Ok(Arc::new(MockSmsSender::new()))
        }
        #[cfg(feature = "twilio-sms")]
        SmsProvider::Twilio => Ok(Arc::new(TwilioSmsSender::new(config)?)),
        #[cfg(not(feature = "twilio-sms"))]
        SmsProvider::Twilio => Err(InfrastructureError::Config(
            "sms.provider is twilio but the twilio-sms feature is disabled".to_string(),
        )),
    }
}
