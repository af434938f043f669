//! Driven port for the durable client-local session.
//!
//! Exactly one session exists at a time. Writes replace whatever was stored
//! before, so racing writers resolve as last-writer-wins.

use std::sync::Mutex;

use super::define_port_error;
use crate::domain::Session;

define_port_error! {
    /// Errors raised by session storage adapters.
    pub enum SessionStoreError {
        /// The backing storage could not be read or written.
        Unavailable { message: String } =>
            "session storage unavailable: {message}",
        /// Stored data exists but cannot be turned back into a session.
        Corrupt { message: String } =>
            "stored session is corrupt: {message}",
    }
}

/// Port for reading, replacing, and clearing the stored session.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// Return the stored session, or `None` when logged out.
    fn load(&self) -> Result<Option<Session>, SessionStoreError>;

    /// Replace the stored session.
    fn save(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Remove the stored session. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), SessionStoreError>;
}

/// Process-local store that forgets the session when dropped.
///
/// # Examples
/// ```
/// use platanera_client::domain::Session;
/// use platanera_client::domain::ports::{InMemorySessionStore, SessionStore};
///
/// let store = InMemorySessionStore::default();
/// let session = Session::try_from_parts("A", "R").unwrap();
/// store.save(&session).unwrap();
/// assert_eq!(store.load().unwrap(), Some(session));
/// store.clear().unwrap();
/// assert!(store.load().unwrap().is_none());
/// ```
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl InMemorySessionStore {
    /// Build a store that already holds `session`.
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    fn with_slot<T>(
        &self,
        f: impl FnOnce(&mut Option<Session>) -> T,
    ) -> Result<T, SessionStoreError> {
        let mut slot = self
            .session
            .lock()
            .map_err(|_| SessionStoreError::unavailable("in-memory session lock poisoned"))?;
        Ok(f(&mut slot))
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        self.with_slot(|slot| slot.clone())
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        self.with_slot(|slot| *slot = Some(session.clone()))
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        self.with_slot(|slot| *slot = None)
    }
}
