use serde::{Deserialize, Serialize};

/// Token refresh request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The refresh token issued at login.
    pub refresh_token: String,
}
