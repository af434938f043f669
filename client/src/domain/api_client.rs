//! Authenticated HTTP client with a single silent refresh on `401`.
//!
//! A logical request moves through `Pending -> Sent -> {Succeeded,
//! AuthFailed}`. `AuthFailed` on the original attempt triggers one refresh;
//! a successful refresh resends the request once, a failed refresh clears the
//! stored session and ends in [`ClientError::SessionExpired`]. A `401` on a
//! request sent without a stored session ends the same way.
//!
//! Refreshes are serialised. A request that waited behind another refresh
//! reuses the token that refresh stored instead of exchanging the refresh
//! token a second time.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::dto::{AccessTokenDto, HealthDto};
use super::ports::{ApiTransport, OutboundRequest, SessionStore, TransportResponse};
use super::{
    ApiRequest, AuthStatus, AuthStatusFeed, ClientError, HttpMethod, RequestAttempt, Session,
};

/// Refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: &str = "auth/refresh/";
/// Health endpoint, relative to the API base URL.
pub const HEALTH_PATH: &str = "health/";

/// Decoded `GET health/` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    /// Machine-readable status, when the API reports one.
    pub status: Option<String>,
    /// Human-readable status message.
    pub message: String,
}

/// JSON API client that attaches and refreshes bearer tokens.
///
/// Cloning is cheap; clones share the transport, the session store, the
/// status feed, and the refresh lock.
#[derive(Clone)]
pub struct AuthenticatedClient {
    transport: Arc<dyn ApiTransport>,
    sessions: Arc<dyn SessionStore>,
    status: AuthStatusFeed,
    refresh_lock: Arc<Mutex<()>>,
}

impl AuthenticatedClient {
    /// Build a client over the given transport and session store.
    ///
    /// ```rust,ignore
    /// let client = AuthenticatedClient::new(transport, sessions, feed);
    /// let workers = client.get("workers/").await?;
    /// ```
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        sessions: Arc<dyn SessionStore>,
        status: AuthStatusFeed,
    ) -> Self {
        Self {
            transport,
            sessions,
            status,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Status feed shared with the session service.
    pub fn status_feed(&self) -> &AuthStatusFeed {
        &self.status
    }

    /// Send `request`, refreshing the access token once on `401`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Network`] when no response arrived.
    /// - [`ClientError::SessionExpired`] when the refresh failed; the stored
    ///   session has been cleared.
    /// - [`ClientError::Api`] for any other non-2xx status, including a `401`
    ///   on the resend after a refresh.
    /// - [`ClientError::Decode`] when a success body is not JSON.
    /// - [`ClientError::Storage`] when the session store fails.
    pub async fn request(&self, request: ApiRequest) -> Result<Value, ClientError> {
        let mut attempt = RequestAttempt::original(&request);
        let mut access_token = self.stored_access_token()?;

        loop {
            let response = self.dispatch(attempt, access_token.as_deref()).await?;
            if response.is_unauthorized() && attempt.may_refresh() {
                let refreshed = self.refresh_after_rejection(access_token.as_deref()).await?;
                access_token = Some(refreshed);
                attempt = attempt.retried();
                continue;
            }
            return decode_success(attempt, &response);
        }
    }

    /// `GET path`.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn get(&self, path: &str) -> Result<Value, ClientError> {
        self.request(ApiRequest::new(HttpMethod::Get, path, None)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn post(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.request(ApiRequest::new(HttpMethod::Post, path, Some(body))).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn put(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.request(ApiRequest::new(HttpMethod::Put, path, Some(body))).await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn patch(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.request(ApiRequest::new(HttpMethod::Patch, path, Some(body))).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        self.request(ApiRequest::new(HttpMethod::Delete, path, None)).await
    }

    /// Query the API health endpoint.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`]; a body without `message` is a
    /// [`ClientError::Decode`] error.
    pub async fn health_check(&self) -> Result<HealthStatus, ClientError> {
        let body = self.get(HEALTH_PATH).await?;
        let dto: HealthDto = serde_json::from_value(body)
            .map_err(|error| ClientError::decode(format!("invalid health payload: {error}")))?;
        Ok(HealthStatus {
            status: dto.status,
            message: dto.message,
        })
    }

    fn stored_access_token(&self) -> Result<Option<String>, ClientError> {
        Ok(self
            .sessions
            .load()?
            .map(|session| session.access_token().to_owned()))
    }

    async fn dispatch(
        &self,
        attempt: RequestAttempt<'_>,
        access_token: Option<&str>,
    ) -> Result<TransportResponse, ClientError> {
        let request = attempt.request();
        let outbound = OutboundRequest {
            method: request.method(),
            path: request.path().to_owned(),
            bearer_token: access_token.map(str::to_owned),
            headers: request.headers().to_vec(),
            body: request.body().cloned(),
        };
        debug!(
            method = %request.method(),
            path = request.path(),
            attempt = attempt.label(),
            authenticated = access_token.is_some(),
            "sending api request"
        );
        let response = self.transport.send(&outbound).await?;
        debug!(
            method = %request.method(),
            path = request.path(),
            attempt = attempt.label(),
            status = response.status,
            "api response received"
        );
        Ok(response)
    }

    /// Obtain a usable access token after a `401`.
    ///
    /// `rejected` is the token that was refused, or `None` when the request
    /// went out without one. With no stored session there is nothing to
    /// exchange, so the session is expired straight away.
    async fn refresh_after_rejection(&self, rejected: Option<&str>) -> Result<String, ClientError> {
        let _guard = self.refresh_lock.lock().await;

        let Some(session) = self.sessions.load()? else {
            if rejected.is_some() {
                debug!("session cleared while waiting to refresh");
            } else {
                self.expire("unauthorised without a stored session");
            }
            return Err(ClientError::session_expired());
        };
        if Some(session.access_token()) != rejected {
            debug!("access token replaced while waiting to refresh");
            return Ok(session.access_token().to_owned());
        }

        match self.exchange_refresh_token(&session).await {
            Ok(refreshed) => {
                self.sessions.save(&refreshed)?;
                info!("access token refreshed");
                Ok(refreshed.access_token().to_owned())
            }
            Err(reason) => {
                self.expire(&reason);
                Err(ClientError::session_expired())
            }
        }
    }

    async fn exchange_refresh_token(&self, session: &Session) -> Result<Session, String> {
        let request = OutboundRequest::anonymous_post(
            REFRESH_PATH,
            json!({ "refresh": session.refresh_token() }),
        );
        let response = self
            .transport
            .send(&request)
            .await
            .map_err(|error| error.to_string())?;
        if !response.is_success() {
            return Err(format!("refresh endpoint returned status {}", response.status));
        }
        let dto: AccessTokenDto = serde_json::from_slice(&response.body)
            .map_err(|error| format!("invalid refresh payload: {error}"))?;
        session
            .with_access_token(&dto.access)
            .map_err(|error| error.to_string())
    }

    /// Clear the session and publish `Expired`.
    ///
    /// `Expired` is published even when clearing fails. The stale tokens left
    /// in the store are rejected again on the next request, which retries the
    /// clear.
    fn expire(&self, reason: &str) {
        warn!(reason, "session expired; clearing stored tokens");
        if let Err(error) = self.sessions.clear() {
            error!(%error, "failed to clear expired session; stale tokens remain stored");
        }
        self.status.publish(AuthStatus::Expired);
    }
}

fn decode_success(
    attempt: RequestAttempt<'_>,
    response: &TransportResponse,
) -> Result<Value, ClientError> {
    let request = attempt.request();
    if !response.is_success() {
        debug!(
            method = %request.method(),
            path = request.path(),
            attempt = attempt.label(),
            status = response.status,
            "api request failed"
        );
        return Err(ClientError::from_status(response.status, &response.body));
    }
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&response.body).map_err(|error| {
        ClientError::decode(format!(
            "{} {}: {error}",
            request.method(),
            request.path()
        ))
    })
}

#[cfg(test)]
#[path = "api_client_tests.rs"]
mod tests;
