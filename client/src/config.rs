//! Client configuration loaded via OrthoConfig.
//!
//! Values come from `PLATANERA_*` environment variables or an OrthoConfig
//! configuration file; command-line flags are handled by the binary itself.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// API root used when nothing is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const SESSION_DIR_NAME: &str = ".platanera";
const SESSION_FILE_NAME: &str = "session.json";

/// Errors raised while loading or interpreting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Configuration sources could not be merged.
    #[error("failed to load settings: {0}")]
    Load(String),
    /// The configured base URL is not an absolute URL.
    #[error("invalid api base url '{value}': {source}")]
    InvalidBaseUrl {
        /// Configured value.
        value: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The base URL cannot carry relative paths.
    #[error("api base url '{0}' cannot be used as a base")]
    NotABase(String),
}

/// Settings controlling where the client talks to and where it keeps the
/// session.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PLATANERA")]
pub struct ClientSettings {
    /// Root of the JSON API, for example `http://localhost:8000/api`.
    pub api_base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Location of the durable session file.
    pub session_file: Option<PathBuf>,
}

impl ClientSettings {
    /// Load settings from the environment and configuration files only.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Load`] when a configuration source is
    /// malformed.
    pub fn load_from_env() -> Result<Self, SettingsError> {
        Self::load_from_iter([OsString::from("platanera")])
            .map_err(|error| SettingsError::Load(error.to_string()))
    }

    /// Parsed API base URL, falling back to [`DEFAULT_API_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Returns an error when the configured value is not an absolute URL.
    pub fn api_base_url(&self) -> Result<Url, SettingsError> {
        let raw = self
            .api_base_url
            .as_deref()
            .map_or(DEFAULT_API_BASE_URL, str::trim);
        let url = Url::parse(raw).map_err(|source| SettingsError::InvalidBaseUrl {
            value: raw.to_owned(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(SettingsError::NotABase(raw.to_owned()));
        }
        Ok(url)
    }

    /// Per-request timeout. Zero is raised to one second.
    pub fn request_timeout(&self) -> Duration {
        let seconds = self
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
            .max(1);
        Duration::from_secs(seconds)
    }

    /// Session file location, falling back to `~/.platanera/session.json`
    /// (or `./.platanera/session.json` without a home directory).
    pub fn session_file(&self) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(default_session_file)
    }
}

fn default_session_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SESSION_DIR_NAME)
        .join(SESSION_FILE_NAME)
}
