//! Results returned by the login orchestrators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::IssuedTokens;

/// Receipt for a dispatched one-time code
///
/// Carries no information about whether the account existed beforehand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpDispatch {
    pub verification_id: Uuid,
    pub expires_at: DateTime<Utc>,
    /// Earliest instant a resend will be accepted
    pub resend_available_at: DateTime<Utc>,
}

/// Outcome of a password login that passed credential checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoginOutcome {
    /// Tokens issued
    Authenticated { user_id: Uuid, tokens: IssuedTokens },
    /// Untrusted device; a code was sent to the confirmed phone
    OtpChallenge { user_id: Uuid, dispatch: OtpDispatch },
    /// Untrusted device and no confirmed phone to challenge
    MfaRequired { user_id: Uuid },
}

/// Result of a successful code verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedLogin {
    pub user_id: Uuid,
    pub tokens: IssuedTokens,
    /// Set when trust was requested and granted for the calling device
    pub device_trusted_until: Option<DateTime<Utc>>,
}
