//! Identity as seen by the authentication engine.
//!
//! Accounts live in an external identity store; this is the projection the
//! login flows need.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub login_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub phone_confirmed: bool,
    pub lockout_end: Option<DateTime<Utc>>,
    pub access_failed_count: i32,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Account created on first OTP send to an unknown number
    pub fn for_phone(phone_number: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            login_name: None,
            email: None,
            phone_number: Some(phone_number.into()),
            phone_confirmed: false,
            lockout_end: None,
            access_failed_count: 0,
            created_at: now,
        }
    }

    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        matches!(self.lockout_end, Some(end) if end > now)
    }

    /// Phone number usable for an OTP challenge
    pub fn confirmed_phone(&self) -> Option<&str> {
        self.phone_number
            .as_deref()
            .filter(|_| self.phone_confirmed)
    }
}
