//! Configuration for the OTP orchestrator

use tg_shared::config::{OtpConfig, RateLimitConfig, SmsConfig};

use super::delivery::DeliveryPolicy;

#[derive(Debug, Clone)]
pub struct OtpAuthConfig {
    pub otp: OtpConfig,
    pub rate_limit: RateLimitConfig,
    pub delivery: DeliveryPolicy,
}

impl OtpAuthConfig {
    pub fn new(otp: OtpConfig, rate_limit: RateLimitConfig, sms: &SmsConfig) -> Self {
        Self {
            otp,
            rate_limit,
            delivery: DeliveryPolicy::from(sms),
        }
    }

    pub fn code_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.otp.expiry_minutes)
    }

    pub fn resend_cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.otp.resend_cooldown_seconds)
    }

    /// Lock applied when attempts run out; none when `lock_minutes` is zero
    pub fn lock_duration(&self) -> Option<chrono::Duration> {
        (self.otp.lock_minutes > 0).then(|| chrono::Duration::minutes(self.otp.lock_minutes))
    }
}
