//! Error types for authentication, token and validation failures
//!
//! Security-relevant failures collapse into a small set of generic variants
//! (`AuthError::AuthenticationFailed`, `TokenError::InvalidRefreshToken`) so
//! that callers cannot distinguish an unknown account from a wrong secret.
//! The precise cause is logged where the failure happens.

use thiserror::Error;

/// Authentication-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid phone format")]
    InvalidPhoneFormat,

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    #[error("A code was sent recently, retry after {retry_after_seconds} seconds")]
    ResendCooldown { retry_after_seconds: u64 },

    #[error("Verification temporarily locked, retry after {retry_after_seconds} seconds")]
    VerificationLocked { retry_after_seconds: u64 },
}

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Token generation failed")]
    TokenGenerationFailed,

    #[error("Key load error: {message}")]
    KeyLoadError { message: String },
}

/// Input validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field: {field}")]
    RequiredField { field: String },

    #[error("Invalid format: {field}")]
    InvalidFormat { field: String },

    #[error("Out of range: {field} (min: {min}, max: {max})")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },
}
