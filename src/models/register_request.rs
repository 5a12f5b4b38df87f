use serde::{Deserialize, Serialize};

/// Registration request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Legal name.
    pub name: String,
    /// Public display name.
    pub nickname: String,
    /// Optional phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}
