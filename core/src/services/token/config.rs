//! Configuration for the token service

use chrono::Duration;

use tg_shared::config::JwtConfig;

/// Claim values and lifetimes used when minting tokens
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    pub issuer: String,
    pub audience: String,
    /// Access token lifetime (minutes in practice)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (days in practice)
    pub refresh_token_ttl: Duration,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self::from(&JwtConfig::default())
    }
}

impl From<&JwtConfig> for TokenServiceConfig {
    fn from(jwt: &JwtConfig) -> Self {
        Self {
            issuer: jwt.issuer.clone(),
            audience: jwt.audience.clone(),
            access_token_ttl: Duration::minutes(jwt.access_token_ttl_minutes),
            refresh_token_ttl: Duration::days(jwt.refresh_token_ttl_days),
        }
    }
}
