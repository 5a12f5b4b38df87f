use serde::{Deserialize, Serialize};

/// Token refresh response.
///
/// Only a new access token is issued; the refresh token stays valid until
/// logout or server-side revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// The replacement access token.
    pub access_token: String,
}
