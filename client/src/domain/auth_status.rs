//! Observable authentication state and the protected-view gate.
//!
//! The client and the session service share one [`AuthStatusFeed`]; front
//! ends subscribe to it to leave protected views when a session expires.

use std::sync::Arc;

use tokio::sync::watch;

/// Whether a session is currently available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// No session stored.
    SignedOut,
    /// A session is stored.
    SignedIn,
    /// The session was cleared because a refresh failed.
    Expired,
}

impl AuthStatus {
    /// Whether protected views may be shown.
    pub fn is_authenticated(self) -> bool {
        self == Self::SignedIn
    }
}

/// Views a front end can ask to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Entry point; redirects to the dashboard.
    Root,
    /// Login form. Always reachable.
    Login,
    /// Protected landing view.
    Dashboard,
}

impl View {
    /// Resolve which view to render for `status`.
    ///
    /// # Examples
    /// ```
    /// use platanera_client::domain::{AuthStatus, View};
    ///
    /// assert_eq!(View::Root.resolve(AuthStatus::SignedIn), View::Dashboard);
    /// assert_eq!(View::Dashboard.resolve(AuthStatus::Expired), View::Login);
    /// ```
    #[must_use]
    pub fn resolve(self, status: AuthStatus) -> Self {
        match self {
            Self::Login => Self::Login,
            Self::Root | Self::Dashboard if status.is_authenticated() => Self::Dashboard,
            Self::Root | Self::Dashboard => Self::Login,
        }
    }
}

/// Shared publisher for [`AuthStatus`] changes.
#[derive(Debug, Clone)]
pub struct AuthStatusFeed {
    sender: Arc<watch::Sender<AuthStatus>>,
}

impl AuthStatusFeed {
    /// Start the feed at `initial`.
    pub fn new(initial: AuthStatus) -> Self {
        let (sender, _receiver) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Current status.
    pub fn current(&self) -> AuthStatus {
        *self.sender.borrow()
    }

    /// Subscribe to future changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.sender.subscribe()
    }

    /// Publish a new status, whether or not anyone is listening.
    pub fn publish(&self, status: AuthStatus) {
        self.sender.send_replace(status);
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(View::Root, AuthStatus::SignedIn, View::Dashboard)]
    #[case(View::Root, AuthStatus::SignedOut, View::Login)]
    #[case(View::Dashboard, AuthStatus::SignedIn, View::Dashboard)]
    #[case(View::Dashboard, AuthStatus::SignedOut, View::Login)]
    #[case(View::Dashboard, AuthStatus::Expired, View::Login)]
    #[case(View::Login, AuthStatus::SignedIn, View::Login)]
    #[case(View::Login, AuthStatus::Expired, View::Login)]
    fn gates_protected_views(
        #[case] requested: View,
        #[case] status: AuthStatus,
        #[case] expected: View,
    ) {
        assert_eq!(requested.resolve(status), expected);
    }

    #[tokio::test]
    async fn subscribers_observe_published_changes() {
        let feed = AuthStatusFeed::new(AuthStatus::SignedIn);
        let mut receiver = feed.subscribe();

        feed.publish(AuthStatus::Expired);

        receiver.changed().await.expect("sender alive");
        assert_eq!(*receiver.borrow(), AuthStatus::Expired);
        assert_eq!(feed.current(), AuthStatus::Expired);
    }

    #[test]
    fn publishing_without_subscribers_still_updates_current() {
        let feed = AuthStatusFeed::new(AuthStatus::SignedOut);
        feed.publish(AuthStatus::SignedIn);
        assert!(feed.current().is_authenticated());
    }
}
