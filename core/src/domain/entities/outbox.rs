//! Durable security event outbox.
//!
//! Events are written to a table by the request path and delivered by a
//! separate dispatcher, so a crash between the two loses nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::token::RevocationReason;

/// Security events published by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecurityEvent {
    /// A revoked refresh token was presented again
    RefreshTokenReuse {
        user_id: Uuid,
        token_id: Uuid,
        device_id: String,
        revoked_reason: Option<RevocationReason>,
        tokens_revoked: u64,
    },
    /// Every session of a user was revoked
    SessionsRevoked {
        user_id: Uuid,
        reason: RevocationReason,
        tokens_revoked: u64,
    },
    AccountLocked {
        user_id: Uuid,
        lockout_end: DateTime<Utc>,
    },
    AccountUnlocked {
        user_id: Uuid,
    },
    /// A trusted device lost its trust to make room for another
    DeviceTrustEvicted {
        user_id: Uuid,
        evicted_device_id: String,
        trusted_device_id: String,
    },
}

impl SecurityEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            SecurityEvent::RefreshTokenReuse { .. } => "refresh_token_reuse",
            SecurityEvent::SessionsRevoked { .. } => "sessions_revoked",
            SecurityEvent::AccountLocked { .. } => "account_locked",
            SecurityEvent::AccountUnlocked { .. } => "account_unlocked",
            SecurityEvent::DeviceTrustEvicted { .. } => "device_trust_evicted",
        }
    }

    pub fn user_id(&self) -> Uuid {
        match self {
            SecurityEvent::RefreshTokenReuse { user_id, .. }
            | SecurityEvent::SessionsRevoked { user_id, .. }
            | SecurityEvent::AccountLocked { user_id, .. }
            | SecurityEvent::AccountUnlocked { user_id }
            | SecurityEvent::DeviceTrustEvicted { user_id, .. } => *user_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    Pending,
    Dispatched,
    DeadLetter,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "pending",
            OutboxStatus::Dispatched => "dispatched",
            OutboxStatus::DeadLetter => "dead_letter",
        }
    }
}

impl FromStr for OutboxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OutboxStatus::Pending),
            "dispatched" => Ok(OutboxStatus::Dispatched),
            "dead_letter" => Ok(OutboxStatus::DeadLetter),
            other => Err(format!("Unknown outbox status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub status: OutboxStatus,
    pub attempts: i32,
    /// Not claimable before this instant (backoff and leases)
    pub available_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl OutboxMessage {
    pub fn new(event: &SecurityEvent, now: DateTime<Utc>) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            event_type: event.event_type().to_string(),
            payload: serde_json::to_value(event)?,
            status: OutboxStatus::Pending,
            attempts: 0,
            available_at: now,
            created_at: now,
            dispatched_at: None,
            last_error: None,
        })
    }

    pub fn event(&self) -> Result<SecurityEvent, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}
