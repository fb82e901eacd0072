//! Domain entities representing core business objects.

pub mod device;
pub mod login_attempt;
pub mod otp_verification;
pub mod outbox;
pub mod revocation;
pub mod token;
pub mod user;


// Re-export commonly used types
pub use device::DeviceRecord;
pub use login_attempt::{LoginAttempt, LoginStatus};
pub use otp_verification::{OtpStatus, OtpVerification};
pub use outbox::{OutboxMessage, OutboxStatus, SecurityEvent};
pub use revocation::{AccessTokenRevocation, UserRevocationMarker};
pub use token::{AccessClaims, IssuedTokens, RefreshToken, RevocationReason};
pub use user::UserAccount;
