use serde::{Deserialize, Serialize};

/// Caller metadata attached to every login, refresh and trust decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContext {
    pub ip_address: String,
    pub user_agent: String,
    /// Client-generated stable device identifier
    pub device_id: String,
}

impl ClientContext {
    pub fn new(
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
            device_id: device_id.into(),
        }
    }
}
