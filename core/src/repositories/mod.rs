//! Store contracts consumed by the services.
//!
//! Persistent stores (refresh tokens, OTP records, devices, login attempts,
//! outbox) need read-your-writes consistency and conditional updates. The
//! key-value store backs counters, revocation markers and locks.

pub mod cache;
pub mod device;
pub mod identity;
pub mod login_attempt;
pub mod otp;
pub mod outbox;
pub mod token;

pub use cache::{CacheStore, CounterState};
pub use device::DeviceRepository;
pub use identity::IdentityStore;
pub use login_attempt::LoginAttemptRepository;
pub use otp::OtpVerificationRepository;
pub use outbox::OutboxRepository;
pub use token::{RefreshTokenRepository, RotationOutcome};

#[cfg(test)]
pub use cache::MockCacheStore;
#[cfg(test)]
pub use device::MockDeviceRepository;
#[cfg(test)]
pub use identity::MockIdentityStore;
#[cfg(test)]
pub use login_attempt::MockLoginAttemptRepository;
#[cfg(test)]
pub use otp::MockOtpVerificationRepository;
#[cfg(test)]
pub use outbox::MockOutboxRepository;
#[cfg(test)]
pub use token::MockRefreshTokenRepository;
