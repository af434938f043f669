//! On-disk shape of the stored session.
//!
//! The two keys mirror the client-local storage entries the web front end
//! used, so a session file stays readable by other tooling.

use serde::{Deserialize, Serialize};

use crate::domain::{Session, SessionValidationError};

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct StoredSessionDto {
    pub(super) access_token: String,
    pub(super) refresh_token: String,
}

impl From<&Session> for StoredSessionDto {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token().to_owned(),
            refresh_token: session.refresh_token().to_owned(),
        }
    }
}

impl TryFrom<StoredSessionDto> for Session {
    type Error = SessionValidationError;

    fn try_from(dto: StoredSessionDto) -> Result<Self, Self::Error> {
        Self::try_from_parts(&dto.access_token, &dto.refresh_token)
    }
}
