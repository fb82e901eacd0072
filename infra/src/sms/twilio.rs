//! Twilio Messages API sender
//!
//! Posts to `/2010-04-01/Accounts/{sid}/Messages.json` with basic auth and
//! returns the message SID. One HTTP request per call.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

use tg_core::errors::{DomainError, DomainResult};
use tg_core::services::SmsSender;
use tg_shared::config::SmsConfig;
use tg_shared::phone::{is_valid_e164, mask_phone_number};

use crate::InfrastructureError;

const TWILIO_API_BASE: &str = "https://api.twilio.com";
/// Twilio rejects bodies longer than this
const MAX_BODY_CHARS: usize = 1600;

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

pub struct TwilioSmsSender {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base: String,
}

impl TwilioSmsSender {
    pub fn new(config: &SmsConfig) -> Result<Self, InfrastructureError> {
        if config.account_sid.is_empty() || config.auth_token.is_empty() {
            return Err(InfrastructureError::Config(
                "twilio account_sid and auth_token are required".to_string(),
            ));
        }
        if !is_valid_e164(&config.from_number) {
            return Err(InfrastructureError::Config(
                "sms.from_number must be in E.164 format".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;

        info!(
            from = %mask_phone_number(&config.from_number),
            "Twilio SMS sender initialized"
        );

        Ok(Self {
            client,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            api_base: TWILIO_API_BASE.to_string(),
        })
    }

    /// Point the sender at another host, e.g. a local stub
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub(crate) fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send_sms(&self, phone: &str, message: &str) -> DomainResult<String> {
        if !is_valid_e164(phone) {
            return Err(DomainError::Validation {
                message: "phone number must be E.164".to_string(),
            });
        }
        if message.chars().count() > MAX_BODY_CHARS {
            return Err(DomainError::Validation {
                message: format!("message exceeds {} characters", MAX_BODY_CHARS),
            });
        }

        let masked = mask_phone_number(phone);
        debug!(phone = %masked, "Sending SMS via Twilio");

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", phone), ("From", self.from_number.as_str()), ("Body", message)])
            .send()
            .await
            .map_err(|e| {
                error!(phone = %masked, error = %e, "Twilio request failed");
                DomainError::unavailable(format!("twilio request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorResponse>()
                .await
                .map(|body| format!("{} (code {:?})", body.message, body.code))
                .unwrap_or_else(|_| status.to_string());
            error!(phone = %masked, status = status.as_u16(), detail = %detail, "Twilio rejected SMS");
            return Err(DomainError::unavailable(format!("twilio returned {}: {}", status, detail)));
        }

        let body: MessageResponse = response.json().await.map_err(|e| {
            error!(phone = %masked, error = %e, "Unreadable Twilio response");
            DomainError::unavailable(format!("twilio response: {}", e))
        })?;
        Ok(body.sid)
    }

    fn provider_name(&self) -> &str {
        "twilio"
    }
}
