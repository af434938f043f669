//! Domain primitives and services.
//!
//! Purpose: keep the authentication flow independent of HTTP libraries and
//! storage media. Services talk to the outside world only through the traits
//! in [`ports`].
//!
//! Public surface:
//! - `AuthenticatedClient`: bearer-token client with refresh-on-401.
//! - `SessionService`: login, logout, and the protected-view gate.
//! - `Session`, `LoginCredentials`: validated credential values.
//! - `ClientError`: every failure a caller can observe.

mod api_client;
mod auth;
mod auth_status;
mod dto;
mod error;
pub mod ports;
mod request;
mod session;
mod session_service;
#[cfg(test)]
mod test_doubles;

pub use self::api_client::{AuthenticatedClient, HEALTH_PATH, HealthStatus, REFRESH_PATH};
pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::auth_status::{AuthStatus, AuthStatusFeed, View};
pub use self::error::ClientError;
pub use self::request::{ApiRequest, AttemptKind, HttpMethod, RequestAttempt, UnsupportedMethod};
pub use self::session::{Session, SessionValidationError};
pub use self::session_service::{LOGIN_FALLBACK_MESSAGE, LOGIN_PATH, SessionService};
