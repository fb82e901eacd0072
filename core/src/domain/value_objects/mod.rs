//! Value objects representing immutable domain concepts.

pub mod auth_outcome;
pub mod client_context;

// Re-export commonly used types
pub use auth_outcome::{LoginOutcome, OtpDispatch, VerifiedLogin};
pub use client_context::ClientContext;
