use serde::{Deserialize, Serialize};

/// The authenticated user, as returned by the current-user endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-assigned user id. Also scopes the personal push queue.
    pub id: i64,
    /// Account email address.
    pub email: String,
    /// Public display name.
    pub nickname: String,
    /// Profile image URL, if set.
    #[serde(default)]
    pub profile_image: Option<String>,
    /// Account role (e.g. "USER", "BUSINESS", "ADMIN").
    #[serde(default)]
    pub role: Option<String>,
}
