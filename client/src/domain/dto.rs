//! Wire DTOs for the authentication and health endpoints.
//!
//! Responses are decoded into these shapes first and then turned into domain
//! values, so field names from the API never leak past this module.

use serde::Deserialize;

/// `POST auth/login/` success body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenPairDto {
    pub(crate) access: String,
    pub(crate) refresh: String,
}

/// `POST auth/refresh/` success body.
#[derive(Debug, Deserialize)]
pub(crate) struct AccessTokenDto {
    pub(crate) access: String,
}

/// Error body carrying a human-readable `detail`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetailDto {
    #[serde(default)]
    pub(crate) detail: Option<String>,
}

/// `GET health/` body.
#[derive(Debug, Deserialize)]
pub(crate) struct HealthDto {
    #[serde(default)]
    pub(crate) status: Option<String>,
    pub(crate) message: String,
}

/// Extract a non-blank `detail` string from an error body, if any.
pub(crate) fn error_detail(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorDetailDto>(body)
        .ok()
        .and_then(|dto| dto.detail)
        .map(|detail| detail.trim().to_owned())
        .filter(|detail| !detail.is_empty())
}
