//! HTTP implementation of [`IdentityResolver`].
//!
//! Used by the console's route guard: it checks a token taken from the
//! incoming request, so it neither reads the credential store nor keeps
//! cookies, and it never goes through the refresh protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CACHE_CONTROL;

use tutaller_auth::{Identity, IdentityResolver, Profile, ResolveError, endpoints};

use crate::config::{ConfigError, normalize_base_url};

#[derive(Debug, Clone)]
pub struct HttpIdentityResolver {
    http: reqwest::Client,
    base_url: String,
}

impl HttpIdentityResolver {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: normalize_base_url(base_url.as_ref()),
        })
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn resolve_identity(&self, token: &str) -> Result<Identity, ResolveError> {
        let url = format!("{}{}", self.base_url, endpoints::IDENTITY);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| ResolveError::Transport(e.to_string()))?;

        match resp.status() {
            StatusCode::OK => {
                let profile: Profile = resp
                    .json()
                    .await
                    .map_err(|e| ResolveError::Malformed(e.to_string()))?;
                Identity::from_profile(profile)
            }
            StatusCode::UNAUTHORIZED => Err(ResolveError::Unauthorized),
            other => Err(ResolveError::UnexpectedStatus(other.as_u16())),
        }
    }
}
