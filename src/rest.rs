//! REST collaborators: authentication endpoints and the notification API.
//!
//! Two thin wrappers around `reqwest`:
//!
//! - [`AuthApi`] talks to the token endpoints and carries no session state;
//!   the session manager owns it.
//! - [`NotificationApi`] performs authorized calls with the standard
//!   refresh protocol: on a 401 it refreshes the access token once and
//!   retries the call once. A second 401 is surfaced to the caller.

use crate::{
    error::{BistroLinkError, Result},
    models::{
        AuthResponse, LoginRequest, NotificationPage, RefreshRequest, RefreshResponse,
        RegisterRequest, UnreadCountResponse, User,
    },
    session::SessionManager,
};
use log::{debug, warn};
use std::sync::Arc;

/// Extract an error from a non-2xx response.
///
/// Prefers a JSON `{"message": ...}` body, falls back to the raw text.
async fn error_from_response(response: reqwest::Response) -> BistroLinkError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or(body);
    let message = if message.is_empty() {
        format!("HTTP {}", status)
    } else {
        message
    };
    BistroLinkError::from_status(status, message)
}

/// Await a response and require a 2xx status.
async fn require_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(response).await)
    }
}

// ── Authentication endpoints ────────────────────────────────────────────────

/// Wrapper for the token endpoints (`/auth/*`, `/members/me`).
#[derive(Clone)]
pub(crate) struct AuthApi {
    base_url: String,
    http: reqwest::Client,
}

impl AuthApi {
    pub(crate) fn new(base_url: String, http: reqwest::Client) -> Self {
        Self { base_url, http }
    }

    /// Exchange credentials for a token pair.
    pub(crate) async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        let url = format!("{}/auth/login", self.base_url);
        debug!("[AUTH] POST {} (email={})", url, request.email);
        let response = self.http.post(&url).json(request).send().await?;
        let response = require_success(response).await?;
        Ok(response.json::<AuthResponse>().await?)
    }

    /// Create an account.
    pub(crate) async fn register(&self, request: &RegisterRequest) -> Result<User> {
        let url = format!("{}/auth/register", self.base_url);
        debug!("[AUTH] POST {}", url);
        let response = self.http.post(&url).json(request).send().await?;
        let response = require_success(response).await?;
        Ok(response.json::<User>().await?)
    }

    /// Exchange the refresh token for a new access token.
    pub(crate) async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let url = format!("{}/auth/refresh", self.base_url);
        debug!("[AUTH] POST {}", url);
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let response = self.http.post(&url).json(&body).send().await?;
        let response = require_success(response).await?;
        Ok(response.json::<RefreshResponse>().await?)
    }

    /// Invalidate the session server-side. Callers treat failures as
    /// best-effort; local state is already gone by the time this runs.
    pub(crate) async fn logout(&self, access_token: &str) -> Result<()> {
        let url = format!("{}/auth/logout", self.base_url);
        debug!("[AUTH] POST {}", url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .send()
            .await?;
        require_success(response).await?;
        Ok(())
    }

    /// Fetch the user the access token belongs to.
    pub(crate) async fn me(&self, access_token: &str) -> Result<User> {
        let url = format!("{}/members/me", self.base_url);
        debug!("[AUTH] GET {}", url);
        let response = self.http.get(&url).bearer_auth(access_token).send().await?;
        let response = require_success(response).await?;
        Ok(response.json::<User>().await?)
    }
}

// ── Notification endpoints ──────────────────────────────────────────────────

/// Authorized wrapper for the notification endpoints.
#[derive(Clone)]
pub(crate) struct NotificationApi {
    base_url: String,
    http: reqwest::Client,
    session: Arc<SessionManager>,
}

impl NotificationApi {
    pub(crate) fn new(
        base_url: String,
        http: reqwest::Client,
        session: Arc<SessionManager>,
    ) -> Self {
        Self {
            base_url,
            http,
            session,
        }
    }

    /// Send an authorized request, refreshing the access token and retrying
    /// exactly once on 401.
    ///
    /// The builder closure is invoked fresh per attempt; request builders
    /// with bodies cannot be cloned.
    async fn send_authorized<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn(&reqwest::Client, &str) -> reqwest::RequestBuilder,
    {
        let token = self.session.access_token().ok_or_else(|| {
            BistroLinkError::AuthenticationError("No active session".to_string())
        })?;

        let response = build(&self.http, &token).send().await?;
        if response.status().as_u16() != 401 {
            return require_success(response).await;
        }

        debug!("[REST] 401 received, refreshing access token and retrying once");
        let token = self.session.refresh_access_token().await?;

        let response = build(&self.http, &token).send().await?;
        if response.status().as_u16() == 401 {
            warn!("[REST] Request still unauthorized after token refresh");
        }
        require_success(response).await
    }

    /// Fetch the latest page of notifications.
    pub(crate) async fn list(&self, size: u32) -> Result<NotificationPage> {
        let url = format!("{}/notifications", self.base_url);
        let response = self
            .send_authorized(|http, token| {
                http.get(&url).query(&[("size", size)]).bearer_auth(token)
            })
            .await?;
        Ok(response.json::<NotificationPage>().await?)
    }

    /// Fetch the server-side unread counter.
    pub(crate) async fn unread_count(&self) -> Result<u64> {
        let url = format!("{}/notifications/unread-count", self.base_url);
        let response = self
            .send_authorized(|http, token| http.get(&url).bearer_auth(token))
            .await?;
        Ok(response.json::<UnreadCountResponse>().await?.count)
    }

    /// Mark a single notification as read.
    pub(crate) async fn mark_read(&self, id: i64) -> Result<()> {
        let url = format!("{}/notifications/{}/read", self.base_url, id);
        self.send_authorized(|http, token| http.patch(&url).bearer_auth(token))
            .await?;
        Ok(())
    }

    /// Mark every notification as read.
    pub(crate) async fn mark_all_read(&self) -> Result<()> {
        let url = format!("{}/notifications/read-all", self.base_url);
        self.send_authorized(|http, token| http.patch(&url).bearer_auth(token))
            .await?;
        Ok(())
    }

    /// Delete a single notification.
    pub(crate) async fn delete(&self, id: i64) -> Result<()> {
        let url = format!("{}/notifications/{}", self.base_url, id);
        self.send_authorized(|http, token| http.delete(&url).bearer_auth(token))
            .await?;
        Ok(())
    }
}
