//! Phone verification (OTP) record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Derived lifecycle state of an [`OtpVerification`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpStatus {
    Pending,
    Verified,
    Locked,
    Expired,
}

/// A sent one-time code awaiting verification
///
/// Only a keyed hash of the code is stored. Every time-dependent predicate
/// takes `now` explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpVerification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code_hash: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub max_attempts: i32,
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub locked_until: Option<DateTime<Utc>>,
}

impl OtpVerification {
    pub fn new(
        user_id: Uuid,
        phone_number: impl Into<String>,
        code_hash: String,
        ttl: Duration,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            code_hash,
            phone_number: phone_number.into(),
            created_at: now,
            expires_at: now + ttl,
            attempts: 0,
            max_attempts,
            is_verified: false,
            verified_at: None,
            locked_until: None,
        }
    }

    /// Expiry is inclusive: a code is dead at exactly `expires_at`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.locked_until, Some(until) if now < until)
    }

    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// A code can still be checked against this record
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_verified && !self.is_expired(now) && !self.is_locked(now) && !self.attempts_exhausted()
    }

    pub fn status(&self, now: DateTime<Utc>) -> OtpStatus {
        if self.is_verified {
            OtpStatus::Verified
        } else if self.is_locked(now) || self.attempts_exhausted() {
            OtpStatus::Locked
        } else if self.is_expired(now) {
            OtpStatus::Expired
        } else {
            OtpStatus::Pending
        }
    }

    /// Records a failed guess
    ///
    /// Returns `true` while attempts remain after this one. The call that
    /// reaches `max_attempts` returns `false` and applies `lock` (when given);
    /// calls made after that leave `attempts` at the cap and re-apply `lock`.
    pub fn try_increment_attempts(&mut self, lock: Option<Duration>, now: DateTime<Utc>) -> bool {
        if self.attempts >= self.max_attempts {
            if let Some(duration) = lock {
                self.locked_until = Some(now + duration);
            }
            return false;
        }

        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            if let Some(duration) = lock {
                self.locked_until = Some(now + duration);
            }
            return false;
        }
        true
    }

    pub fn mark_verified(&mut self, now: DateTime<Utc>) {
        self.is_verified = true;
        self.verified_at = Some(now);
    }

    /// Returns the record to `Pending` with a new code and expiry
    pub fn reset_code(&mut self, code_hash: String, ttl: Duration, now: DateTime<Utc>) {
        self.code_hash = code_hash;
        self.created_at = now;
        self.expires_at = now + ttl;
        self.attempts = 0;
        self.is_verified = false;
        self.verified_at = None;
        self.locked_until = None;
    }

    /// Seconds remaining on an active lock
    pub fn lock_remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        match self.locked_until {
            Some(until) if now < until => (until - now).num_seconds().max(1) as u64,
            _ => 0,
        }
    }
}
