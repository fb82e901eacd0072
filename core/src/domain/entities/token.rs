//! Token entities: access token claims and persisted refresh tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Claims carried by a signed access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Unique token identifier, used as the blacklist key
    pub jti: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
    /// Not before (seconds since epoch)
    pub nbf: i64,
    pub iss: String,
    pub aud: String,
}

impl AccessClaims {
    pub fn new(
        user_id: Uuid,
        issuer: &str,
        audience: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
        }
    }

    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Why a refresh token stopped being active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// Superseded by a fresh login on the same device
    NewLogin,
    /// Exchanged for a child token
    Rotated,
    /// Swept by a cascade after a rotated token was replayed
    ReuseDetected,
    /// Explicit logout of this token
    Manual,
    /// Logout from every device
    GlobalLogout,
}

impl RevocationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationReason::NewLogin => "new_login",
            RevocationReason::Rotated => "rotated",
            RevocationReason::ReuseDetected => "reuse_detected",
            RevocationReason::Manual => "manual",
            RevocationReason::GlobalLogout => "global_logout",
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevocationReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_login" => Ok(RevocationReason::NewLogin),
            "rotated" => Ok(RevocationReason::Rotated),
            "reuse_detected" => Ok(RevocationReason::ReuseDetected),
            "manual" => Ok(RevocationReason::Manual),
            "global_logout" => Ok(RevocationReason::GlobalLogout),
            other => Err(format!("Unknown revocation reason: {}", other)),
        }
    }
}

/// Refresh token row
///
/// Only the SHA-256 hash of the opaque token is stored. Rows are never
/// deleted by normal operation; revocation fills in the `revoked_*` fields
/// and rotation links parent and child through `replaced_by_token_id` /
/// `parent_token_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub device_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_reason: Option<RevocationReason>,
    pub replaced_by_token_id: Option<Uuid>,
    pub parent_token_id: Option<Uuid>,
    pub created_by_ip: String,
    pub user_agent: String,
}

impl RefreshToken {
    /// Creates the first token of a new chain
    pub fn new(
        user_id: Uuid,
        token_hash: String,
        device_id: impl Into<String>,
        created_by_ip: impl Into<String>,
        user_agent: impl Into<String>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            device_id: device_id.into(),
            created_at: now,
            expires_at: now + ttl,
            revoked_at: None,
            revoked_reason: None,
            replaced_by_token_id: None,
            parent_token_id: None,
            created_by_ip: created_by_ip.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Creates the child produced by rotating `self`
    ///
    /// The child inherits user, device and client metadata and gets a fresh
    /// lifetime.
    pub fn child(&self, token_hash: String, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            token_hash,
            device_id: self.device_id.clone(),
            created_at: now,
            expires_at: now + ttl,
            revoked_at: None,
            revoked_reason: None,
            replaced_by_token_id: None,
            parent_token_id: Some(self.id),
            created_by_ip: self.created_by_ip.clone(),
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Neither revoked nor expired
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired(now)
    }

    /// Revokes the token unless it already is
    ///
    /// Returns `false` when the token was already revoked, leaving the
    /// original revocation untouched.
    pub fn revoke(
        &mut self,
        reason: RevocationReason,
        replaced_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> bool {
        if self.is_revoked() {
            return false;
        }
        self.revoked_at = Some(now);
        self.revoked_reason = Some(reason);
        self.replaced_by_token_id = replaced_by;
        true
    }
}

/// Token pair handed to the caller after issuance or rotation
///
/// The refresh token plaintext exists only here and is redacted from `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub refresh_token_id: Uuid,
    pub jti: String,
}

impl IssuedTokens {
    /// Seconds until the access token expires
    pub fn expires_in(&self, now: DateTime<Utc>) -> i64 {
        (self.access_expires_at - now).num_seconds().max(0)
    }
}

impl fmt::Debug for IssuedTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .field("refresh_token_id", &self.refresh_token_id)
            .field("jti", &self.jti)
            .finish()
    }
}
