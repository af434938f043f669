//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed `ApiTransport`
//! - **session_store**: file-backed `SessionStore`
//!
//! Adapters are thin translators between domain types and wire or disk
//! representations. They contain no authentication logic.

pub mod http;
pub mod session_store;
