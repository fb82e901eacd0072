//! Password login with lockout and untrusted-device challenge

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tg_shared::config::{LockoutConfig, RateLimitConfig};

use crate::domain::entities::login_attempt::{LoginAttempt, LoginStatus};
use crate::domain::entities::user::UserAccount;
use crate::domain::value_objects::{ClientContext, LoginOutcome};
use crate::errors::{AuthError, DomainError, DomainResult};
use crate::repositories::{
    CacheStore, DeviceRepository, IdentityStore, OtpVerificationRepository, RefreshTokenRepository,
};
use crate::services::device::DeviceRegistry;
use crate::services::lockout::{LockoutService, LoginAttemptRecorder};
use crate::services::otp::{OtpAuthService, SmsSender, UniformDelay};
use crate::services::rate_limit::{rate_limit_key, RateLimiter};
use crate::services::token::TokenService;

#[derive(Debug, Clone, Default)]
pub struct LoginServiceConfig {
    pub lockout: LockoutConfig,
    pub rate_limit: RateLimitConfig,
}

pub struct LoginService<I, O, R, D, C, S>
where
    I: IdentityStore,
    O: OtpVerificationRepository,
    R: RefreshTokenRepository,
    D: DeviceRepository,
    C: CacheStore,
    S: SmsSender,
{
    identity: Arc<I>,
    tokens: Arc<TokenService<R, C>>,
    devices: Arc<DeviceRegistry<D, C>>,
    otp: Arc<OtpAuthService<I, O, R, D, C, S>>,
    lockout: Arc<LockoutService<I>>,
    attempts: LoginAttemptRecorder,
    rate_limiter: RateLimiter<C>,
    delay: UniformDelay,
    config: LoginServiceConfig,
}

impl<I, O, R, D, C, S> LoginService<I, O, R, D, C, S>
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
        tokens: Arc<TokenService<R, C>>,
        devices: Arc<DeviceRegistry<D, C>>,
        otp: Arc<OtpAuthService<I, O, R, D, C, S>>,
        lockout: Arc<LockoutService<I>>,
        attempts: LoginAttemptRecorder,
        rate_limiter: RateLimiter<C>,
        config: LoginServiceConfig,
    ) -> Self {
        Self {
            identity,
            tokens,
            devices,
            otp,
            lockout,
            attempts,
            rate_limiter,
            delay: UniformDelay::from_millis(config.lockout.failure_delay_ms),
            config,
        }
    }

    /// Authenticate with login name (or email) and password
    ///
    /// Unknown accounts, wrong passwords and locked accounts all return
    /// `AuthError::AuthenticationFailed`, and no failure returns sooner than
    /// `lockout.failure_delay_ms` after the call started.
    ///
    /// # Returns
    /// * `LoginOutcome::Authenticated` - Trusted device, tokens issued
    /// * `LoginOutcome::OtpChallenge` - Code sent to the confirmed phone
    /// * `LoginOutcome::MfaRequired` - Untrusted device and nothing to challenge with
    pub async fn login(
        &self,
        login_name_or_email: &str,
        password: &str,
        client: &ClientContext,
    ) -> DomainResult<LoginOutcome> {
        let started = self.delay.start();
        let result = self.authenticate(login_name_or_email, password, client).await;
        if result.is_err() {
            self.delay.pad(started).await;
        }
        result
    }

    async fn authenticate(
        &self,
        login_name_or_email: &str,
        password: &str,
        client: &ClientContext,
    ) -> DomainResult<LoginOutcome> {
        let now = Utc::now();
        self.enforce_ip_limits(login_name_or_email, client, now).await?;

        let Some(user) = self.identity.find_by_login(login_name_or_email).await? else {
            debug!(ip = %client.ip_address, "Login for unknown account");
            self.record(None, LoginStatus::Failed, client, login_name_or_email, now).await;
            return Err(DomainError::authentication_failed());
        };

        if self.identity.is_locked_out(user.id, now).await? {
            info!(user_id = %user.id, event = "login_locked_out", "Login attempt on locked account");
            self.record(Some(user.id), LoginStatus::LockedOut, client, login_name_or_email, now).await;
            return Err(DomainError::authentication_failed());
        }

        if !self.identity.check_password(user.id, password).await? {
            self.handle_bad_password(&user, client, login_name_or_email, now).await?;
            return Err(DomainError::authentication_failed());
        }

        if user.access_failed_count > 0 {
            self.identity.reset_failed_attempts(user.id).await?;
        }

        let trusted = !self.config.lockout.require_otp_for_untrusted_devices
            || self.devices.is_trusted(user.id, &client.device_id, now).await;

        if trusted {
            if let Err(e) = self.devices.upsert(user.id, client, now).await {
                warn!(user_id = %user.id, error = %e, "Device registration failed");
            }
            let tokens = self.tokens.issue(user.id, client).await?;
            self.record(Some(user.id), LoginStatus::Success, client, login_name_or_email, now).await;
            info!(user_id = %user.id, device_id = %client.device_id, event = "password_login", "Login succeeded");
            return Ok(LoginOutcome::Authenticated {
                user_id: user.id,
                tokens,
            });
        }

        match user.confirmed_phone() {
            Some(phone) => {
                // The code send records its own OtpSent attempt
                let dispatch = self.otp.send_otp(phone, client).await?;
                info!(user_id = %user.id, device_id = %client.device_id, "Untrusted device challenged with OTP");
                Ok(LoginOutcome::OtpChallenge {
                    user_id: user.id,
                    dispatch,
                })
            }
            None => {
                self.record(Some(user.id), LoginStatus::RequiresMfa, client, login_name_or_email, now)
                    .await;
                info!(user_id = %user.id, "Untrusted device with no confirmed phone");
                Ok(LoginOutcome::MfaRequired { user_id: user.id })
            }
        }
    }

    async fn enforce_ip_limits(
        &self,
        login_name_or_email: &str,
        client: &ClientContext,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let limits = &self.config.rate_limit;
        if limits.enabled {
            let key = rate_limit_key("login", login_name_or_email, Some(&client.ip_address));
            let decision = self
                .rate_limiter
                .should_allow(
                    &key,
                    limits.login_per_ip.limit,
                    std::time::Duration::from_secs(limits.login_per_ip.window_seconds),
                )
                .await;
            if !decision.allowed {
                return Err(DomainError::Auth(AuthError::RateLimitExceeded {
                    retry_after_seconds: decision.retry_after_seconds(now),
                }));
            }
        }

        let window = Duration::minutes(self.config.lockout.failed_ip_window_minutes);
        match self
            .attempts
            .failed_attempts_from_ip(&client.ip_address, window, now)
            .await
        {
            Ok(failed) if failed >= self.config.lockout.failed_ip_threshold => {
                warn!(
                    ip = %client.ip_address,
                    failed = failed,
                    event = "login_ip_throttled",
                    "Too many failed logins from address"
                );
                Err(DomainError::Auth(AuthError::RateLimitExceeded {
                    retry_after_seconds: window.num_seconds().max(1) as u64,
                }))
            }
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(ip = %client.ip_address, error = %e, "Failed-attempt count unavailable, skipping IP check");
                Ok(())
            }
        }
    }

    async fn handle_bad_password(
        &self,
        user: &UserAccount,
        client: &ClientContext,
        login_name_or_email: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let failures = self.identity.record_failed_attempt(user.id).await?;
        let max_failures = self.config.lockout.max_failed_attempts as i32;

        if failures >= max_failures {
            let requested = now + Duration::minutes(self.config.lockout.lockout_minutes);
            let lockout_end = self.lockout.lock(user.id, requested, now).await?;
            self.identity.reset_failed_attempts(user.id).await?;
            warn!(
                user_id = %user.id,
                failures = failures,
                lockout_end = %lockout_end,
                "Account locked after repeated password failures"
            );
            self.record(Some(user.id), LoginStatus::LockedOut, client, login_name_or_email, now).await;
        } else {
            debug!(user_id = %user.id, failures = failures, "Wrong password");
            self.record(Some(user.id), LoginStatus::Failed, client, login_name_or_email, now).await;
        }
        Ok(())
    }

    async fn record(
        &self,
        user_id: Option<Uuid>,
        status: LoginStatus,
        client: &ClientContext,
        login_name_or_email: &str,
        now: DateTime<Utc>,
    ) {
        self.attempts
            .record(LoginAttempt::new(
                user_id,
                status,
                client,
                Some(login_name_or_email.to_string()),
                now,
            ))
            .await;
    }
}
