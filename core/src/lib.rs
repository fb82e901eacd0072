//! # TokenGate Core
//!
//! Authentication session and token security engine.
//! This crate contains domain entities, the store contracts the engine runs
//! against, error types, and the services: token issuance and rotation with
//! reuse detection, access token revocation, rate limiting, device trust,
//! OTP and password login with lockout, the security event outbox and the
//! retention job.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::*;
pub use domain::value_objects::*;
pub use errors::{AuthError, DomainError, DomainResult, TokenError, ValidationError};
pub use repositories::{
    CacheStore, CounterState, DeviceRepository, IdentityStore, LoginAttemptRepository,
    OtpVerificationRepository, OutboxRepository, RefreshTokenRepository, RotationOutcome,
};
pub use services::{
    DeviceRegistry, DispatchReport, EventSink, LockoutService, LoginAttemptRecorder, LoginService,
    LoginServiceConfig, OtpAuthConfig, OtpAuthService, OutboxDispatcher, RateLimitDecision,
    RateLimiter, RetentionJob, CleanupReport, SecurityEventPublisher, SigningKeys, SmsSender,
    TokenBlacklist, TokenService, TokenServiceConfig, TracingEventSink,
};
