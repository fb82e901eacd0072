//! Token service module
//!
//! This module handles all token-related operations including:
//! - Access token signing, validation and introspection
//! - Refresh token issuance and rotation with reuse detection
//! - Session revocation, per token and per user
//! - HS256 / RS256 key loading

mod config;
mod keys;
mod service;

#[cfg(test)]
mod tests;

pub use config::TokenServiceConfig;
pub use keys::SigningKeys;
pub use service::{hash_refresh_token, TokenService};
