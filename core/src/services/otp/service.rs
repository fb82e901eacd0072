//! OTP authentication orchestrator

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tg_shared::phone::{mask_phone_number, normalize_phone_number};

use crate::domain::entities::login_attempt::{LoginAttempt, LoginStatus};
use crate::domain::entities::otp_verification::OtpVerification;
use crate::domain::entities::user::UserAccount;
use crate::domain::value_objects::{ClientContext, OtpDispatch, VerifiedLogin};
use crate::errors::{AuthError, DomainError, DomainResult};
use crate::repositories::{
    CacheStore, DeviceRepository, IdentityStore, OtpVerificationRepository, RefreshTokenRepository,
};
use crate::services::device::DeviceRegistry;
use crate::services::lockout::LoginAttemptRecorder;
use crate::services::rate_limit::{rate_limit_key, RateLimiter};
use crate::services::token::TokenService;

use super::code::{codes_match, generate_numeric_code, hash_code};
use super::config::OtpAuthConfig;
use super::delay::UniformDelay;
use super::delivery::{deliver_with_retry, SmsSender};

const HOUR_SECONDS: u64 = 3_600;
const DAY_SECONDS: u64 = 86_400;
const MONTH_SECONDS: u64 = 30 * DAY_SECONDS;

/// Phone verification lifecycle and OTP login
pub struct OtpAuthService<I, O, R, D, C, S>
where
    I: IdentityStore,
    O: OtpVerificationRepository,
    R: RefreshTokenRepository,
    D: DeviceRepository,
    C: CacheStore,
    S: SmsSender,
{
    identity: Arc<I>,
    verifications: Arc<O>,
    tokens: Arc<TokenService<R, C>>,
    devices: Arc<DeviceRegistry<D, C>>,
    rate_limiter: RateLimiter<C>,
    attempts: LoginAttemptRecorder,
    sms_sender: Arc<S>,
    delay: UniformDelay,
    config: OtpAuthConfig,
}

impl<I, O, R, D, C, S> OtpAuthService<I, O, R, D, C, S>
where
    I: IdentityStore,
    O: OtpVerificationRepository,
    R: RefreshTokenRepository,
    D: DeviceRepository,
    C: CacheStore,
    S: SmsSender,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identity: Arc<I>,
        verifications: Arc<O>,
        tokens: Arc<TokenService<R, C>>,
        devices: Arc<DeviceRegistry<D, C>>,
        rate_limiter: RateLimiter<C>,
        attempts: LoginAttemptRecorder,
        sms_sender: Arc<S>,
        config: OtpAuthConfig,
    ) -> Self {
        Self {
            identity,
            verifications,
            tokens,
            devices,
            rate_limiter,
            attempts,
            sms_sender,
            delay: UniformDelay::from_millis(config.otp.failure_delay_ms),
            config,
        }
    }

    /// Send a login code to `phone`
    ///
    /// Creates the account on first use. Delivery failures are logged only:
    /// the code stays valid until its expiry.
    ///
    /// # Errors
    /// * `AuthError::InvalidPhoneFormat` - The number cannot be normalized
    /// * `AuthError::RateLimitExceeded` - A send limit is exhausted
    /// * `AuthError::ResendCooldown` - A code was sent moments ago
    /// * `AuthError::VerificationLocked` - Too many wrong codes recently
    pub async fn send_otp(&self, phone: &str, client: &ClientContext) -> DomainResult<OtpDispatch> {
        let phone = normalize_phone_number(phone, &self.config.otp.default_country_code)
            .ok_or(DomainError::Auth(AuthError::InvalidPhoneFormat))?;
        let masked = mask_phone_number(&phone);

        self.enforce_send_limits(&phone, client).await?;

        let now = Utc::now();
        let existing = self.identity.find_by_phone(&phone).await?;
        let latest = match &existing {
            Some(user) => self.verifications.find_latest_for_user(user.id).await?,
            None => None,
        };

        if let Some(record) = &latest {
            self.check_resend_allowed(record, &masked, now)?;
        }

        let user = match existing {
            Some(user) => user,
            None => {
                let user = self.identity.create_for_phone(&phone, now).await?;
                info!(user_id = %user.id, phone = %masked, "Account created for phone");
                user
            }
        };

        let code = generate_numeric_code(self.config.otp.code_length);
        let code_hash = hash_code(&self.config.otp.hmac_secret, &phone, &code)?;
        let ttl = self.config.code_ttl();

        // Resend reuses the latest unverified record
        let reusable = latest.filter(|r| !r.is_verified);
        let reset = match &reusable {
            Some(record) => self.verifications.reset_code(record.id, &code_hash, ttl, now).await?,
            None => false,
        };

        let verification_id = match reusable {
            Some(record) if reset => record.id,
            _ => {
                let record = OtpVerification::new(
                    user.id,
                    phone.as_str(),
                    code_hash,
                    ttl,
                    self.config.otp.max_attempts,
                    now,
                );
                self.verifications.insert(&record).await?;
                record.id
            }
        };

        info!(
            user_id = %user.id,
            phone = %masked,
            verification_id = %verification_id,
            event = "otp_generated",
            "Verification code issued"
        );

        let message = format!(
            "Your verification code is {}. It expires in {} minutes.",
            code, self.config.otp.expiry_minutes
        );
        deliver_with_retry(self.sms_sender.as_ref(), &phone, &message, self.config.delivery).await;

        self.attempts
            .record(LoginAttempt::new(
                Some(user.id),
                LoginStatus::OtpSent,
                client,
                Some(phone.clone()),
                now,
            ))
            .await;

        Ok(OtpDispatch {
            verification_id,
            expires_at: now + ttl,
            resend_available_at: now + self.config.resend_cooldown(),
        })
    }

    async fn enforce_send_limits(&self, phone: &str, client: &ClientContext) -> DomainResult<()> {
        let limits = &self.config.rate_limit;
        if !limits.enabled {
            return Ok(());
        }

        let mut checks = vec![
            (
                rate_limit_key("otp_send", phone, None),
                limits.otp_send.limit,
                limits.otp_send.window_seconds,
            ),
            (rate_limit_key("otp_send_hour", phone, None), limits.otp_per_phone_per_hour, HOUR_SECONDS),
            (rate_limit_key("otp_send_day", phone, None), limits.otp_per_phone_per_day, DAY_SECONDS),
            (rate_limit_key("otp_send_month", phone, None), limits.otp_per_phone_per_month, MONTH_SECONDS),
        ];
        if let Some(per_ip) = limits.otp_per_ip_per_hour {
            checks.push((
                rate_limit_key("otp_send_ip", "any", Some(&client.ip_address)),
                per_ip,
                HOUR_SECONDS,
            ));
        }

        for (key, limit, window_seconds) in checks {
            let decision = self
                .rate_limiter
                .should_allow(&key, limit, std::time::Duration::from_secs(window_seconds))
                .await;
            if !decision.allowed {
                return Err(DomainError::Auth(AuthError::RateLimitExceeded {
                    retry_after_seconds: decision.retry_after_seconds(Utc::now()),
                }));
            }
        }
        Ok(())
    }

    fn check_resend_allowed(&self, latest: &OtpVerification, masked: &str, now: DateTime<Utc>) -> DomainResult<()> {
        if latest.is_locked(now) {
            warn!(phone = %masked, event = "otp_resend_locked", "Resend rejected while verification is locked");
            return Err(DomainError::Auth(AuthError::VerificationLocked {
                retry_after_seconds: latest.lock_remaining_seconds(now),
            }));
        }

        if !latest.is_verified && !latest.is_expired(now) {
            let resend_at = latest.created_at + self.config.resend_cooldown();
            if now < resend_at {
                debug!(phone = %masked, "Resend rejected during cooldown");
                return Err(DomainError::Auth(AuthError::ResendCooldown {
                    retry_after_seconds: (resend_at - now).num_seconds().max(1) as u64,
                }));
            }
        }
        Ok(())
    }

    /// Verify a code and sign the user in
    ///
    /// Every failure, whatever its cause, returns
    /// `AuthError::AuthenticationFailed` (or a store error) no sooner than
    /// `failure_delay_ms` after the call started.
    pub async fn verify_otp(
        &self,
        phone: &str,
        code: &str,
        client: &ClientContext,
        trust_device: bool,
    ) -> DomainResult<VerifiedLogin> {
        let started = self.delay.start();
        let result = self.verify_inner(phone, code, client, trust_device).await;
        if result.is_err() {
            self.delay.pad(started).await;
        }
        result
    }

    async fn verify_inner(
        &self,
        phone: &str,
        code: &str,
        client: &ClientContext,
        trust_device: bool,
    ) -> DomainResult<VerifiedLogin> {
        let now = Utc::now();
        let Some(phone) = normalize_phone_number(phone, &self.config.otp.default_country_code) else {
            debug!("Verification with unparseable phone number");
            return Err(DomainError::authentication_failed());
        };
        let masked = mask_phone_number(&phone);

        let Some(user) = self.identity.find_by_phone(&phone).await? else {
            debug!(phone = %masked, "Verification for unknown phone");
            self.record(None, LoginStatus::Failed, client, &phone, now).await;
            return Err(DomainError::authentication_failed());
        };

        let record = match self.verifications.find_latest_pending(user.id, now).await? {
            Some(record) if record.is_valid(now) => record,
            Some(record) => {
                debug!(
                    user_id = %user.id,
                    status = ?record.status(now),
                    "Verification against locked or exhausted code"
                );
                self.record(Some(user.id), LoginStatus::Failed, client, &phone, now).await;
                return Err(DomainError::authentication_failed());
            }
            None => {
                debug!(user_id = %user.id, "No pending code");
                self.record(Some(user.id), LoginStatus::Failed, client, &phone, now).await;
                return Err(DomainError::authentication_failed());
            }
        };

        let candidate = hash_code(&self.config.otp.hmac_secret, &phone, code)?;
        if !codes_match(&record.code_hash, &candidate) {
            let updated = self
                .verifications
                .try_increment_attempts(record.id, self.config.lock_duration(), now)
                .await?;
            let (attempts, locked) = updated
                .map(|r| (r.attempts, r.is_locked(now)))
                .unwrap_or((record.attempts, false));
            warn!(
                user_id = %user.id,
                phone = %masked,
                attempts = attempts,
                max_attempts = record.max_attempts,
                locked = locked,
                event = "otp_verification_failed",
                "Wrong verification code"
            );
            self.record(Some(user.id), LoginStatus::Failed, client, &phone, now).await;
            return Err(DomainError::authentication_failed());
        }

        if !self.verifications.mark_verified(record.id, now).await? {
            warn!(user_id = %user.id, verification_id = %record.id, "Code consumed concurrently");
            return Err(DomainError::authentication_failed());
        }

        self.complete_login(user, client, trust_device, &phone, now).await
    }

    async fn complete_login(
        &self,
        user: UserAccount,
        client: &ClientContext,
        trust_device: bool,
        phone: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<VerifiedLogin> {
        if !user.phone_confirmed {
            self.identity.confirm_phone(user.id).await?;
        }

        let registered = match self.devices.upsert(user.id, client, now).await {
            Ok(_) => true,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Device registration failed");
                false
            }
        };

        let device_trusted_until = if trust_device && registered {
            let window = Duration::days(self.config.otp.trust_window_days);
            match self.devices.trust(user.id, &client.device_id, window, now).await {
                Ok(until) => Some(until),
                Err(e) => {
                    warn!(user_id = %user.id, error = %e, "Device trust not granted");
                    None
                }
            }
        } else {
            None
        };

        let tokens = self.tokens.issue(user.id, client).await?;
        self.record(Some(user.id), LoginStatus::Success, client, phone, now).await;

        info!(user_id = %user.id, device_id = %client.device_id, event = "otp_login", "OTP login succeeded");
        Ok(VerifiedLogin {
            user_id: user.id,
            tokens,
            device_trusted_until,
        })
    }

    async fn record(
        &self,
        user_id: Option<Uuid>,
        status: LoginStatus,
        client: &ClientContext,
        phone: &str,
        now: DateTime<Utc>,
    ) {
        self.attempts
            .record(LoginAttempt::new(user_id, status, client, Some(phone.to_string()), now))
            .await;
    }
}
