//! The access/refresh token pair representing a signed-in user.

use std::fmt;

use zeroize::Zeroizing;

/// Validation failures for raw token values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionValidationError {
    /// Access token was missing or blank.
    #[error("access token must not be empty")]
    EmptyAccessToken,
    /// Refresh token was missing or blank.
    #[error("refresh token must not be empty")]
    EmptyRefreshToken,
}

/// Authenticated session.
///
/// ## Invariants
/// - Both tokens are non-empty once trimmed. Tokens are stored verbatim.
/// - Token material is zeroized on drop and never printed by `Debug`.
///
/// # Examples
/// ```
/// use platanera_client::domain::Session;
///
/// let session = Session::try_from_parts("A", "R").unwrap();
/// let refreshed = session.with_access_token("A2").unwrap();
/// assert_eq!(refreshed.access_token(), "A2");
/// assert_eq!(refreshed.refresh_token(), "R");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: Zeroizing<String>,
    refresh_token: Zeroizing<String>,
}

impl Session {
    /// Build a session from the tokens returned by the login endpoint.
    pub fn try_from_parts(
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Self, SessionValidationError> {
        let access_token = validated_access_token(access_token)?;
        if refresh_token.trim().is_empty() {
            return Err(SessionValidationError::EmptyRefreshToken);
        }
        Ok(Self {
            access_token,
            refresh_token: Zeroizing::new(refresh_token.to_owned()),
        })
    }

    /// Short-lived token attached to protected requests.
    pub fn access_token(&self) -> &str {
        self.access_token.as_str()
    }

    /// Long-lived token exchanged for a new access token.
    pub fn refresh_token(&self) -> &str {
        self.refresh_token.as_str()
    }

    /// Return a copy of this session with a replacement access token.
    pub fn with_access_token(&self, access_token: &str) -> Result<Self, SessionValidationError> {
        Ok(Self {
            access_token: validated_access_token(access_token)?,
            refresh_token: self.refresh_token.clone(),
        })
    }
}

fn validated_access_token(raw: &str) -> Result<Zeroizing<String>, SessionValidationError> {
    if raw.trim().is_empty() {
        return Err(SessionValidationError::EmptyAccessToken);
    }
    Ok(Zeroizing::new(raw.to_owned()))
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}
