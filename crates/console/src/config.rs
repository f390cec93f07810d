//! Console server configuration, read once at startup.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use tutaller_client::config::{BASE_URL_ENV, LEGACY_BASE_URL_ENV, parse_secs};

pub const BIND_ADDR_ENV: &str = "TUTALLER_BIND_ADDR";
pub const AUTH_TIMEOUT_ENV: &str = "TUTALLER_AUTH_TIMEOUT_SECS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for TUTALLER_BIND_ADDR: '{0}'")]
    BindAddr(String),

    #[error(transparent)]
    Client(#[from] tutaller_client::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub bind_addr: SocketAddr,
    /// Backend the guard checks sessions against.
    pub api_base_url: String,
    /// Upper bound for one identity lookup.
    pub auth_timeout: Duration,
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr = lookup(BIND_ADDR_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::BindAddr(raw_addr.clone()))?;

        let api_base_url = lookup(BASE_URL_ENV)
            .or_else(|| lookup(LEGACY_BASE_URL_ENV))
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .ok_or(tutaller_client::ConfigError::Missing(BASE_URL_ENV))?;

        let auth_timeout = match lookup(AUTH_TIMEOUT_ENV) {
            Some(raw) => Duration::from_secs(parse_secs(AUTH_TIMEOUT_ENV, &raw)?),
            None => DEFAULT_AUTH_TIMEOUT,
        };

        Ok(Self {
            bind_addr,
            api_base_url,
            auth_timeout,
        })
    }
}
