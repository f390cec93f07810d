//! Client configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};

pub const BASE_URL_ENV: &str = "TUTALLER_API_BASE_URL";
/// Accepted when [`BASE_URL_ENV`] is unset (name used by the web build).
pub const LEGACY_BASE_URL_ENV: &str = "NEXT_PUBLIC_API_BASE_URL";
pub const TIMEOUT_ENV: &str = "TUTALLER_API_TIMEOUT_SECS";
pub const TOKEN_PATH_ENV: &str = "TUTALLER_TOKEN_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without trailing slash.
    pub base_url: String,
    pub timeout: Duration,
    /// File for the persisted token; in-memory storage when `None`.
    pub token_path: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.as_ref()),
            timeout: Duration::from_secs(30),
            token_path: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(BASE_URL_ENV)
            .or_else(|| lookup(LEGACY_BASE_URL_ENV))
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(BASE_URL_ENV))?;

        let mut config = Self::new(base_url);

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs = parse_secs(TIMEOUT_ENV, &raw)?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(path) = lookup(TOKEN_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            config.token_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// The token store this configuration asks for: a file store at
    /// `token_path`, otherwise a process-local one.
    pub fn credential_store(&self) -> Arc<dyn CredentialStore> {
        match &self.token_path {
            Some(path) => Arc::new(FileCredentialStore::new(path)),
            None => Arc::new(MemoryCredentialStore::new()),
        }
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Parse a positive number of seconds.
pub fn parse_secs(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or_else(|| ConfigError::Invalid {
            name,
            value: raw.to_string(),
        })
}
