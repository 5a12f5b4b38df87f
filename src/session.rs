//! Session management: token pair, auth state, inactivity timeout.
//!
//! The [`SessionManager`] owns the access/refresh token pair and publishes
//! authentication transitions on a watch channel that the connection
//! coordinator consumes. It also arms a 30-minute inactivity timer for
//! non-persistent sessions, re-armed by any [`HostSignal::Activity`].
//!
//! Invariants:
//!
//! - At most one live [`Session`] per manager; a new sign-in replaces it.
//! - `logout()` is infallible: local state is cleared and the
//!   unauthenticated transition published *before* the best-effort remote
//!   invalidation call runs.
//! - Any refresh failure is fatal: the session is torn down and the error
//!   surfaced as [`AuthenticationError`](crate::BistroLinkError::AuthenticationError).

use crate::{
    error::{BistroLinkError, Result},
    models::{LoginRequest, RegisterRequest, User},
    rest::AuthApi,
    signals::{HostSignal, SignalSource},
};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// The authenticated token pair plus the identity it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// User id the tokens were issued for.
    pub user_id: i64,
    /// Whether the session outlives host inactivity ("remember me").
    pub persistent: bool,
}

/// Authentication state, published on a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No live session.
    Unauthenticated,
    /// A session is live.
    Authenticated {
        /// User id of the session owner; scopes the personal queue.
        user_id: i64,
        /// Current access token, presented at push-connect time.
        access_token: String,
    },
}

impl AuthState {
    /// Whether a session is live.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Owns the session and its lifecycle.
pub struct SessionManager {
    auth_api: AuthApi,
    session: RwLock<Option<Session>>,
    user: RwLock<Option<User>>,
    auth_tx: watch::Sender<AuthState>,
    signals: SignalSource,
    inactivity_timeout: Duration,
    inactivity_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub(crate) fn new(
        auth_api: AuthApi,
        signals: SignalSource,
        inactivity_timeout: Duration,
    ) -> Arc<Self> {
        let (auth_tx, _) = watch::channel(AuthState::Unauthenticated);
        Arc::new(Self {
            auth_api,
            session: RwLock::new(None),
            user: RwLock::new(None),
            auth_tx,
            signals,
            inactivity_timeout,
            inactivity_task: Mutex::new(None),
        })
    }

    /// Subscribe to authentication transitions.
    pub fn auth_state(&self) -> watch::Receiver<AuthState> {
        self.auth_tx.subscribe()
    }

    /// Whether a session is currently live.
    pub fn is_authenticated(&self) -> bool {
        self.session.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// The current access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// A snapshot of the current session, if any.
    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The user the session belongs to, if known.
    pub fn current_user(&self) -> Option<User> {
        self.user.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Exchange credentials for a session.
    ///
    /// `persistent` selects a "remember me" session exempt from the
    /// inactivity timeout. Invalid credentials surface as
    /// [`AuthenticationError`](BistroLinkError::AuthenticationError);
    /// transport failures as [`NetworkError`](BistroLinkError::NetworkError).
    pub async fn login(
        self: &Arc<Self>,
        email: &str,
        password: &str,
        persistent: bool,
    ) -> Result<User> {
        let auth = self
            .auth_api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.complete_sign_in(auth.access_token, auth.refresh_token, persistent)
            .await
    }

    /// Create an account, then sign in with the same credentials.
    pub async fn register(self: &Arc<Self>, request: RegisterRequest) -> Result<User> {
        self.auth_api.register(&request).await?;
        self.login(&request.email, &request.password, false).await
    }

    /// Accept externally issued tokens (federated sign-in / OAuth hand-off)
    /// and materialize a session without a password exchange.
    pub async fn set_tokens(
        self: &Arc<Self>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<User> {
        self.complete_sign_in(access_token.into(), refresh_token.into(), true)
            .await
    }

    async fn complete_sign_in(
        self: &Arc<Self>,
        access_token: String,
        refresh_token: String,
        persistent: bool,
    ) -> Result<User> {
        let user = self.auth_api.me(&access_token).await?;
        self.install_session(
            Session {
                access_token,
                refresh_token,
                user_id: user.id,
                persistent,
            },
            Some(user.clone()),
        );
        info!(
            "[SESSION] Signed in user {} (persistent={})",
            user.id, persistent
        );
        Ok(user)
    }

    /// Install a session and publish the authenticated transition.
    ///
    /// Also the entry point tests use to materialize a session without a
    /// live auth server.
    pub(crate) fn install_session(self: &Arc<Self>, session: Session, user: Option<User>) {
        let persistent = session.persistent;
        let state = AuthState::Authenticated {
            user_id: session.user_id,
            access_token: session.access_token.clone(),
        };
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = Some(session);
        if user.is_some() {
            *self.user.write().unwrap_or_else(|e| e.into_inner()) = user;
        }
        self.auth_tx.send_replace(state);

        if persistent {
            self.disarm_inactivity_timer();
        } else {
            self.arm_inactivity_timer();
        }
    }

    /// Tear down the session.
    ///
    /// Local state is cleared and the unauthenticated transition published
    /// first; the remote invalidation call runs afterwards and its failure
    /// is only logged. Never fails.
    pub async fn logout(&self) {
        let taken = self.session.write().unwrap_or_else(|e| e.into_inner()).take();
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.auth_tx.send_replace(AuthState::Unauthenticated);

        if let Some(session) = taken {
            info!("[SESSION] Logged out user {}", session.user_id);
            if let Err(e) = self.auth_api.logout(&session.access_token).await {
                warn!("[SESSION] Remote logout failed (ignored): {}", e);
            }
        }
    }

    /// Obtain a fresh access token from the refresh endpoint.
    ///
    /// Any failure here is fatal: the session is logged out before the
    /// error is returned.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let refresh_token = {
            let guard = self.session.read().unwrap_or_else(|e| e.into_inner());
            match guard.as_ref() {
                Some(s) => s.refresh_token.clone(),
                None => {
                    return Err(BistroLinkError::AuthenticationError(
                        "No active session".to_string(),
                    ))
                },
            }
        };

        match self.auth_api.refresh(&refresh_token).await {
            Ok(response) => {
                let token = response.access_token;
                let state = {
                    let mut guard = self.session.write().unwrap_or_else(|e| e.into_inner());
                    match guard.as_mut() {
                        Some(s) => {
                            s.access_token = token.clone();
                            AuthState::Authenticated {
                                user_id: s.user_id,
                                access_token: token.clone(),
                            }
                        },
                        // Logged out while the refresh round trip was in flight.
                        None => {
                            return Err(BistroLinkError::AuthenticationError(
                                "Session ended during token refresh".to_string(),
                            ))
                        },
                    }
                };
                self.auth_tx.send_replace(state);
                debug!("[SESSION] Access token refreshed");
                Ok(token)
            },
            Err(e) => {
                warn!("[SESSION] Token refresh failed, forcing logout: {}", e);
                self.logout().await;
                Err(BistroLinkError::AuthenticationError(format!(
                    "Refresh token rejected: {}",
                    e
                )))
            },
        }
    }

    /// Stop background work. Keeps the session tokens; this is component
    /// teardown, not logout.
    pub(crate) fn shutdown(&self) {
        self.disarm_inactivity_timer();
    }

    // ── Inactivity timer ────────────────────────────────────────────────

    fn arm_inactivity_timer(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let window = self.inactivity_timeout;
        let mut signal_rx = self.signals.subscribe();
        let mut auth_rx = self.auth_tx.subscribe();

        let handle = tokio::spawn(async move {
            let mut deadline = Instant::now() + window;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {
                        if let Some(manager) = weak.upgrade() {
                            info!(
                                "[SESSION] No activity for {:?}, logging out",
                                window
                            );
                            manager.logout().await;
                        }
                        return;
                    }
                    signal = signal_rx.recv() => {
                        match signal {
                            Ok(HostSignal::Activity) => {
                                deadline = Instant::now() + window;
                            },
                            Ok(_) => {},
                            // Missed signals almost certainly included
                            // activity; err on the side of keeping the
                            // session alive.
                            Err(broadcast::error::RecvError::Lagged(_)) => {
                                deadline = Instant::now() + window;
                            },
                            Err(broadcast::error::RecvError::Closed) => return,
                        }
                    }
                    changed = auth_rx.changed() => {
                        match changed {
                            Ok(()) => {
                                if !auth_rx.borrow().is_authenticated() {
                                    return;
                                }
                            },
                            Err(_) => return,
                        }
                    }
                }
            }
        });

        let mut guard = self
            .inactivity_task
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(old) = guard.replace(handle) {
            old.abort();
        }
    }

    fn disarm_inactivity_timer(&self) {
        let mut guard = self
            .inactivity_task
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(task) = guard.take() {
            task.abort();
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        let mut guard = self
            .inactivity_task
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(task) = guard.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const WINDOW: Duration = Duration::from_secs(30 * 60);

    /// Build a manager whose auth endpoints point at a closed port; remote
    /// calls fail fast and are ignored where the contract requires it.
    fn make_manager(signals: &SignalSource) -> Arc<SessionManager> {
        let auth_api = AuthApi::new(
            "http://127.0.0.1:9".to_string(),
            reqwest::Client::new(),
        );
        SessionManager::new(auth_api, signals.clone(), WINDOW)
    }

    fn test_session(persistent: bool) -> Session {
        Session {
            access_token: "at-1".to_string(),
            refresh_token: "rt-1".to_string(),
            user_id: 42,
            persistent,
        }
    }

    async fn wait_for_unauthenticated(rx: &mut watch::Receiver<AuthState>) {
        tokio::time::timeout(Duration::from_secs(3600), async {
            while rx.borrow().is_authenticated() {
                rx.changed().await.expect("auth channel closed");
            }
        })
        .await
        .expect("expected a logout transition");
    }

    #[tokio::test]
    async fn test_install_session_publishes_authenticated() {
        let signals = SignalSource::new();
        let manager = make_manager(&signals);
        assert!(!manager.is_authenticated());

        manager.install_session(test_session(true), None);
        assert!(manager.is_authenticated());
        assert_eq!(manager.access_token().as_deref(), Some("at-1"));

        let state = manager.auth_state().borrow().clone();
        assert_eq!(
            state,
            AuthState::Authenticated {
                user_id: 42,
                access_token: "at-1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_logout_clears_state_even_if_remote_fails() {
        let signals = SignalSource::new();
        let manager = make_manager(&signals);
        manager.install_session(test_session(true), None);

        // The remote endpoint is unreachable; logout must still succeed.
        manager.logout().await;
        assert!(!manager.is_authenticated());
        assert!(manager.access_token().is_none());
        assert!(!manager.auth_state().borrow().is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_without_session_is_auth_error() {
        let signals = SignalSource::new();
        let manager = make_manager(&signals);
        let err = manager.refresh_access_token().await.unwrap_err();
        assert!(err.is_auth_error());
    }

    #[tokio::test]
    async fn test_refresh_failure_forces_logout() {
        let signals = SignalSource::new();
        let manager = make_manager(&signals);
        manager.install_session(test_session(true), None);

        // Unreachable refresh endpoint → fatal.
        let err = manager.refresh_access_token().await.unwrap_err();
        assert!(err.is_auth_error());
        assert!(!manager.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactivity_logs_out_non_persistent_session() {
        let signals = SignalSource::new();
        let manager = make_manager(&signals);
        manager.install_session(test_session(false), None);

        let mut rx = manager.auth_state();
        wait_for_unauthenticated(&mut rx).await;
        assert!(!manager.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_rearms_inactivity_deadline() {
        let signals = SignalSource::new();
        let manager = make_manager(&signals);
        manager.install_session(test_session(false), None);
        tokio::task::yield_now().await;

        // 29:59 idle, still signed in.
        tokio::time::advance(WINDOW - Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(manager.is_authenticated());

        // Activity re-arms the deadline.
        signals.activity();
        tokio::task::yield_now().await;

        // Another 29:59 idle, still signed in.
        tokio::time::advance(WINDOW - Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(manager.is_authenticated());

        // Two more seconds push past the re-armed deadline.
        tokio::time::advance(Duration::from_secs(2)).await;
        let mut rx = manager.auth_state();
        wait_for_unauthenticated(&mut rx).await;
        assert!(!manager.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_session_is_exempt_from_inactivity() {
        let signals = SignalSource::new();
        let manager = make_manager(&signals);
        manager.install_session(test_session(true), None);
        tokio::task::yield_now().await;

        tokio::time::advance(WINDOW + Duration::from_secs(60)).await;
        tokio::task::yield_now().await;
        assert!(manager.is_authenticated());
    }
}
