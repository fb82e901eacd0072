//! Access token revocation markers held in the key-value store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Invalidates every access token of a user issued up to `revoked_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRevocationMarker {
    pub user_id: Uuid,
    pub revoked_at: DateTime<Utc>,
}

impl UserRevocationMarker {
    pub fn new(user_id: Uuid, revoked_at: DateTime<Utc>) -> Self {
        Self { user_id, revoked_at }
    }

    /// `iat` only has whole seconds, so a token minted in the same second as
    /// the marker is revoked too
    pub fn revokes(&self, issued_at: i64) -> bool {
        issued_at <= self.revoked_at.timestamp()
    }
}

/// Blacklist entry for a single access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRevocation {
    pub jti: String,
    pub revoked_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
