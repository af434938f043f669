//! Errors surfaced to callers of the client and session service.
//!
//! Port errors are folded into [`ClientError`] at the service boundary so
//! callers only match on one enum.

use super::dto::error_detail;
use super::ports::{ApiTransportError, SessionStoreError, define_port_error};

define_port_error! {
    /// Failure categories visible to callers.
    pub enum ClientError {
        /// The request never produced a response.
        Network { message: String } =>
            "network error: {message}",
        /// Login was rejected; `message` is suitable for display as-is.
        Auth { message: String } =>
            "{message}",
        /// The access token was rejected and could not be refreshed. The
        /// stored session has been cleared.
        SessionExpired =>
            "session expired; sign in again",
        /// The API answered with a non-2xx status. `body` is the response
        /// body text, unchanged.
        Api { status: u16, body: String } =>
            "api request failed with status {status}",
        /// A success response could not be decoded.
        Decode { message: String } =>
            "could not decode api response: {message}",
        /// The session store failed.
        Storage { message: String } =>
            "session storage failed: {message}",
    }
}

impl ClientError {
    /// HTTP status for [`ClientError::Api`] errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the caller must send the user back to the login view.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Server-provided `detail` message for API errors, when present.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Api { body, .. } => error_detail(body.as_bytes()),
            _ => None,
        }
    }

    pub(crate) fn from_status(status: u16, body: &[u8]) -> Self {
        Self::api(status, String::from_utf8_lossy(body).into_owned())
    }
}

impl From<ApiTransportError> for ClientError {
    fn from(error: ApiTransportError) -> Self {
        Self::network(error.to_string())
    }
}

impl From<SessionStoreError> for ClientError {
    fn from(error: SessionStoreError) -> Self {
        Self::storage(error.to_string())
    }
}
