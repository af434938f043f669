//! Session lifecycle: login, logout, and the protected-view gate.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::dto::{TokenPairDto, error_detail};
use super::ports::{ApiTransport, OutboundRequest, SessionStore};
use super::{
    AuthStatus, AuthStatusFeed, AuthenticatedClient, ClientError, LoginCredentials, Session, View,
};

/// Login endpoint, relative to the API base URL.
pub const LOGIN_PATH: &str = "auth/login/";

/// Message shown when a login failure carries no server detail.
pub const LOGIN_FALLBACK_MESSAGE: &str = "Unable to sign in";

/// Owns the stored session and publishes its state.
#[derive(Clone)]
pub struct SessionService {
    transport: Arc<dyn ApiTransport>,
    sessions: Arc<dyn SessionStore>,
    status: AuthStatusFeed,
}

impl SessionService {
    /// Build the service, reporting `SignedIn` when the store already holds
    /// a session from an earlier run.
    ///
    /// A store that cannot be read at start-up is treated as signed out.
    pub fn new(transport: Arc<dyn ApiTransport>, sessions: Arc<dyn SessionStore>) -> Self {
        let initial = match sessions.load() {
            Ok(Some(_)) => AuthStatus::SignedIn,
            Ok(None) => AuthStatus::SignedOut,
            Err(error) => {
                warn!(%error, "could not read stored session; starting signed out");
                AuthStatus::SignedOut
            }
        };
        Self {
            transport,
            sessions,
            status: AuthStatusFeed::new(initial),
        }
    }

    /// Authenticated client sharing this service's store and status feed.
    pub fn api_client(&self) -> AuthenticatedClient {
        AuthenticatedClient::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.sessions),
            self.status.clone(),
        )
    }

    /// Exchange credentials for a new session and store it.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Auth`] when the inputs are blank or the API rejects
    ///   them. The message is the server `detail` when present, otherwise
    ///   [`LOGIN_FALLBACK_MESSAGE`].
    /// - [`ClientError::Network`] when the login endpoint is unreachable.
    /// - [`ClientError::Decode`] when the success body lacks usable tokens.
    /// - [`ClientError::Storage`] when the new session cannot be stored.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let credentials = LoginCredentials::try_from_parts(username, password)
            .map_err(|error| ClientError::auth(error.to_string()))?;

        let request = OutboundRequest::anonymous_post(LOGIN_PATH, credentials.to_login_body());
        let response = self.transport.send(&request).await?;
        if !response.is_success() {
            let message = error_detail(&response.body)
                .unwrap_or_else(|| LOGIN_FALLBACK_MESSAGE.to_owned());
            info!(
                username = credentials.username(),
                status = response.status,
                "login rejected"
            );
            return Err(ClientError::auth(message));
        }

        let tokens: TokenPairDto = serde_json::from_slice(&response.body)
            .map_err(|error| ClientError::decode(format!("invalid login payload: {error}")))?;
        let session = Session::try_from_parts(&tokens.access, &tokens.refresh)
            .map_err(|error| ClientError::decode(format!("invalid login tokens: {error}")))?;

        self.sessions.save(&session)?;
        self.status.publish(AuthStatus::SignedIn);
        info!(username = credentials.username(), "login succeeded");
        Ok(session)
    }

    /// Forget the stored session. Never fails; storage errors are logged.
    pub fn logout(&self) {
        if let Err(error) = self.sessions.clear() {
            warn!(%error, "failed to clear stored session during logout");
        }
        self.status.publish(AuthStatus::SignedOut);
        info!("logged out");
    }

    /// Stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] when the store cannot be read.
    pub fn current_session(&self) -> Result<Option<Session>, ClientError> {
        Ok(self.sessions.load()?)
    }

    /// Latest published status.
    pub fn status(&self) -> AuthStatus {
        self.status.current()
    }

    /// Whether protected views may be shown.
    pub fn is_authenticated(&self) -> bool {
        self.status().is_authenticated()
    }

    /// Subscribe to status changes, including expiry after a failed refresh.
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    /// Resolve `requested` against the current status.
    pub fn resolve_view(&self, requested: View) -> View {
        requested.resolve(self.status())
    }
}

#[cfg(test)]
#[path = "session_service_tests.rs"]
mod tests;
