//! Driven port for sending HTTP requests to the JSON API.
//!
//! The domain decides *what* to send (path, bearer token, body) and how to
//! react to the status code; adapters only move bytes over the wire. Keeping
//! the port this narrow lets the refresh logic be exercised without a socket.

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;
use crate::domain::HttpMethod;

/// One fully resolved outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the API base URL, for example `auth/login/`.
    pub path: String,
    /// Access token to send as `Authorization: Bearer <token>`.
    pub bearer_token: Option<String>,
    /// Extra headers as `(name, value)` pairs.
    pub headers: Vec<(String, String)>,
    /// JSON body, when the request carries one.
    pub body: Option<Value>,
}

impl OutboundRequest {
    /// Build an unauthenticated `POST` with a JSON body.
    ///
    /// # Examples
    /// ```
    /// use platanera_client::domain::HttpMethod;
    /// use platanera_client::domain::ports::OutboundRequest;
    /// use serde_json::json;
    ///
    /// let request = OutboundRequest::anonymous_post("auth/refresh/", json!({ "refresh": "R" }));
    /// assert_eq!(request.method, HttpMethod::Post);
    /// assert!(request.bearer_token.is_none());
    /// ```
    pub fn anonymous_post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            bearer_token: None,
            headers: Vec::new(),
            body: Some(body),
        }
    }
}

/// Raw response handed back by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Undecoded response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Build a response from a status and a JSON body.
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    /// Whether the status is in the `2xx` range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the server rejected the credentials with `401`.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

define_port_error! {
    /// Errors raised before a response status was received.
    pub enum ApiTransportError {
        /// Connection, TLS, or body streaming failed.
        Transport { message: String } =>
            "api transport failed: {message}",
        /// The request exceeded the configured timeout.
        Timeout { message: String } =>
            "api request timed out: {message}",
        /// The adapter could not build a request from the inputs.
        InvalidRequest { message: String } =>
            "api request invalid: {message}",
    }
}

/// Port for sending requests to the JSON API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Send one request and return the raw response, whatever its status.
    ///
    /// Non-2xx statuses are *not* errors at this level; only failures that
    /// prevent a response from arriving are.
    async fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, ApiTransportError>;
}
