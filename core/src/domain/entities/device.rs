//! Known device per user, with an optional trust grant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub user_id: Uuid,
    pub device_id: String,
    pub user_agent: String,
    pub last_ip: String,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub trusted_until: Option<DateTime<Utc>>,
}

impl DeviceRecord {
    pub fn new(
        user_id: Uuid,
        device_id: impl Into<String>,
        user_agent: impl Into<String>,
        last_ip: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            device_id: device_id.into(),
            user_agent: user_agent.into(),
            last_ip: last_ip.into(),
            first_seen_at: now,
            last_seen_at: now,
            trusted_until: None,
        }
    }

    /// Trust is inclusive of its end instant
    pub fn is_trusted(&self, now: DateTime<Utc>) -> bool {
        matches!(self.trusted_until, Some(until) if until >= now)
    }

    pub fn touch(&mut self, user_agent: &str, ip: &str, now: DateTime<Utc>) {
        self.user_agent = user_agent.to_string();
        self.last_ip = ip.to_string();
        self.last_seen_at = now;
    }
}
