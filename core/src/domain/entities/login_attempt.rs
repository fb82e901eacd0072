//! Append-only login attempt log entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::value_objects::ClientContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginStatus {
    Success,
    Failed,
    LockedOut,
    RequiresMfa,
    OtpSent,
}

impl LoginStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginStatus::Success => "success",
            LoginStatus::Failed => "failed",
            LoginStatus::LockedOut => "locked_out",
            LoginStatus::RequiresMfa => "requires_mfa",
            LoginStatus::OtpSent => "otp_sent",
        }
    }

    /// Statuses counted by IP-based throttling
    pub fn is_failure(&self) -> bool {
        matches!(self, LoginStatus::Failed | LoginStatus::LockedOut)
    }
}

impl FromStr for LoginStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(LoginStatus::Success),
            "failed" => Ok(LoginStatus::Failed),
            "locked_out" => Ok(LoginStatus::LockedOut),
            "requires_mfa" => Ok(LoginStatus::RequiresMfa),
            "otp_sent" => Ok(LoginStatus::OtpSent),
            other => Err(format!("Unknown login status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: LoginStatus,
    pub ip_address: String,
    pub user_agent: String,
    pub device_id: String,
    pub login_name_or_email: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl LoginAttempt {
    pub fn new(
        user_id: Option<Uuid>,
        status: LoginStatus,
        client: &ClientContext,
        login_name_or_email: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            status,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            device_id: client.device_id.clone(),
            login_name_or_email,
            attempted_at: now,
        }
    }
}
