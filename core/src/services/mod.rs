//! Engine services: tokens, rate limiting, device trust, OTP and password
//! login, lockout, and the background outbox and retention jobs.

pub mod blacklist;
pub mod device;
pub mod lockout;
pub mod login;
pub mod otp;
pub mod outbox;
pub mod rate_limit;
pub mod retention;
pub mod token;

// Re-export commonly used types
pub use blacklist::TokenBlacklist;
pub use device::DeviceRegistry;
pub use lockout::{LockoutService, LoginAttemptRecorder};
pub use login::{LoginService, LoginServiceConfig};
pub use otp::{OtpAuthConfig, OtpAuthService, SmsSender};
pub use outbox::{DispatchReport, EventSink, OutboxDispatcher, SecurityEventPublisher, TracingEventSink};
pub use rate_limit::{rate_limit_key, RateLimitDecision, RateLimiter};
pub use retention::{CleanupReport, RetentionJob};
pub use token::{SigningKeys, TokenService, TokenServiceConfig};
