//! Login credentials accepted by the session lifecycle.
//!
//! Inputs are validated before any network call so an obviously empty form
//! never reaches the login endpoint.

use std::fmt;

use serde_json::{Value, json};
use zeroize::Zeroizing;

/// Validation failures for raw login inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials.
///
/// ## Invariants
/// - `username` is trimmed and non-empty.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use platanera_client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" alice ", "secret").unwrap();
/// assert_eq!(creds.username(), "alice");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username sent to the login endpoint.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password sent to the login endpoint.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// JSON body for `POST auth/login/`.
    pub(crate) fn to_login_body(&self) -> Value {
        json!({
            "username": self.username(),
            "password": self.password(),
        })
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
