//! Outbound request descriptions and the single-retry attempt guard.

use std::fmt;

use serde_json::Value;

const AUTHORIZATION_HEADER: &str = "authorization";

/// HTTP methods used against the JSON API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown method name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnsupportedMethod(pub String);

impl std::str::FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(UnsupportedMethod(raw.to_owned())),
        }
    }
}

/// A logical API call made by a caller of the authenticated client.
///
/// # Examples
/// ```
/// use platanera_client::domain::{ApiRequest, HttpMethod};
/// use serde_json::json;
///
/// let request = ApiRequest::new(HttpMethod::Post, "/workers/", Some(json!({ "name": "Ana" })));
/// assert_eq!(request.path(), "workers/");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: HttpMethod,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    /// Describe a call. A leading `/` on `path` is dropped so the path is
    /// always resolved relative to the API base URL.
    pub fn new(method: HttpMethod, path: &str, body: Option<Value>) -> Self {
        Self {
            method,
            path: path.trim_start_matches('/').to_owned(),
            headers: Vec::new(),
            body,
        }
    }

    /// Add an extra header, for example `Accept-Language`.
    ///
    /// `Authorization` belongs to the client, which sets it from the stored
    /// session; a caller-supplied `Authorization` header is dropped.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let name = name.trim();
        if !name.eq_ignore_ascii_case(AUTHORIZATION_HEADER) {
            self.headers.push((name.to_owned(), value.to_owned()));
        }
        self
    }

    /// HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path relative to the API base URL.
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Extra headers in the order they were added.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Optional JSON body.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// Which send of a logical request this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    /// First send, with whatever access token was stored.
    Original,
    /// The one resend allowed after a successful token refresh.
    RetriedAfterRefresh,
}

impl AttemptKind {
    fn label(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::RetriedAfterRefresh => "retried_after_refresh",
        }
    }
}

/// A request paired with its attempt kind.
///
/// Only an `Original` attempt may trigger a refresh, and the only way to
/// obtain a `RetriedAfterRefresh` attempt is [`RequestAttempt::retried`], so
/// a logical request can refresh at most once.
#[derive(Debug, Clone, Copy)]
pub struct RequestAttempt<'a> {
    request: &'a ApiRequest,
    kind: AttemptKind,
}

impl<'a> RequestAttempt<'a> {
    /// First attempt for `request`.
    pub fn original(request: &'a ApiRequest) -> Self {
        Self {
            request,
            kind: AttemptKind::Original,
        }
    }

    /// The resend that follows a successful refresh.
    #[must_use]
    pub fn retried(self) -> Self {
        Self {
            request: self.request,
            kind: AttemptKind::RetriedAfterRefresh,
        }
    }

    /// Request being sent.
    pub fn request(&self) -> &'a ApiRequest {
        self.request
    }

    /// Attempt kind.
    pub fn kind(&self) -> AttemptKind {
        self.kind
    }

    /// Whether a `401` on this attempt may be answered with a refresh.
    pub fn may_refresh(&self) -> bool {
        self.kind == AttemptKind::Original
    }

    /// Stable label used in log fields.
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}
