//! Authenticated client library for the Finca Platanera JSON API.
//!
//! The [`domain`] module holds the authentication flow (bearer tokens,
//! refresh-on-401, login/logout) behind ports; [`outbound`] provides the
//! reqwest and file-system adapters; [`config`] loads settings.

pub mod config;
pub mod domain;
pub mod outbound;

pub use config::ClientSettings;
pub use domain::{AuthenticatedClient, ClientError, Session, SessionService};
