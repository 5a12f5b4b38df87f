use serde::{Deserialize, Serialize};

/// Response of the unread-count endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    /// Number of unread notifications for the current user.
    #[serde(default)]
    pub count: u64,
}
