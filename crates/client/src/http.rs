//! HTTP client core.
//!
//! Every call goes through [`ApiClient::request`]:
//!
//! ```text
//! request ─► attach credentials ─► backend
//!                                    │
//!             2xx ◄──────────────────┤
//!                                    │ failure
//!                                    ▼
//!                               normalize
//!                                    │
//!        ┌────── 401 ────────────────┴──────── other ───────┐
//!        ▼                                                  ▼
//!  /auth/me or skip_auth_redirect ─► clear, reject     broadcast unless silent,
//!  first attempt ─► refresh ─► ok: replay once         reject
//!                          └─► fail: clear, login redirect, reject
//!  replayed attempt ─► clear, login redirect, reject
//! ```
//!
//! The caller is always handed the [`NormalizedError`], even when a login
//! redirect has already been issued.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use tutaller_auth::{Identity, Profile, endpoints, is_login_surface, login_redirect};
use tutaller_events::{Broadcaster, InMemoryBroadcaster, Listener, Subscription};

use crate::config::{ClientConfig, ConfigError};
use crate::credentials::CredentialStore;
use crate::error::NormalizedError;
use crate::navigator::Navigator;

/// Per-call behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// On 401: clear credentials and reject, without refresh or redirect.
    pub skip_auth_redirect: bool,
    /// Never publish this call's failure on the error broadcaster.
    pub silent: bool,
}

impl RequestOptions {
    pub fn skip_auth_redirect() -> Self {
        Self {
            skip_auth_redirect: true,
            silent: false,
        }
    }

    pub fn silent() -> Self {
        Self {
            skip_auth_redirect: false,
            silent: true,
        }
    }

    /// Both switches: used for the session endpoints themselves.
    pub fn quiet() -> Self {
        Self {
            skip_auth_redirect: true,
            silent: true,
        }
    }
}

/// Immutable per-attempt state of one logical request.
///
/// A fresh context is created per call; the replay after a refresh gets
/// `retry()` of it. There is no way back to the first attempt, which bounds
/// the protocol to a single refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RequestContext {
    attempt: u8,
}

impl RequestContext {
    pub(crate) fn first() -> Self {
        Self::default()
    }

    pub(crate) fn retry(self) -> Self {
        Self {
            attempt: self.attempt.saturating_add(1),
        }
    }

    pub(crate) fn is_retry(&self) -> bool {
        self.attempt > 0
    }
}

/// What to do about a 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnauthorizedAction {
    /// Clear credentials and reject; no refresh, no redirect.
    Reject,
    /// Try one refresh, then replay.
    Refresh,
    /// Clear credentials, redirect to login, reject.
    Expire,
}

pub(crate) fn unauthorized_action(path: &str, options: RequestOptions, ctx: RequestContext) -> UnauthorizedAction {
    if targets_identity_lookup(path) || options.skip_auth_redirect {
        UnauthorizedAction::Reject
    } else if !ctx.is_retry() {
        UnauthorizedAction::Refresh
    } else {
        UnauthorizedAction::Expire
    }
}

fn targets_identity_lookup(path: &str) -> bool {
    let path = tutaller_auth::redirect::path_of(path).trim_end_matches('/');
    path.ends_with(endpoints::IDENTITY)
}

/// Session changes announced by the client core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The credential store was cleared (logout or unrecoverable 401).
    CredentialsCleared,
}

/// Successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body; `Null` when empty, a string when not JSON.
    pub body: Value,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, NormalizedError> {
        serde_json::from_value(self.body.clone()).map_err(|e| {
            NormalizedError::local(
                Some(self.status),
                format!("unexpected response body: {e}"),
                self.body.clone(),
            )
        })
    }
}

/// A failed round trip before normalization.
#[derive(Debug)]
struct Failure {
    status: Option<u16>,
    body: Option<Value>,
    transport_message: String,
}

impl Failure {
    fn normalize(&self) -> NormalizedError {
        NormalizedError::normalize(self.status, self.body.as_ref(), Some(&self.transport_message))
    }
}

/// Client for the Tu Taller backend.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    cookies: Arc<Jar>,
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    errors: Arc<dyn Broadcaster<NormalizedError>>,
    sessions: InMemoryBroadcaster<SessionEvent>,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        errors: Arc<dyn Broadcaster<NormalizedError>>,
    ) -> Result<Self, ConfigError> {
        // Session cookies set by the backend ride along automatically.
        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            cookies,
            credentials,
            navigator,
            errors,
            sessions: InMemoryBroadcaster::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Cookie jar shared by every request of this client.
    pub fn cookies(&self) -> &Arc<Jar> {
        &self.cookies
    }

    /// Listen for [`SessionEvent`]s.
    pub fn on_session_event(&self, listener: Listener<SessionEvent>) -> Subscription {
        self.sessions.subscribe(listener)
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, NormalizedError> {
        self.request(Method::GET, path, None, RequestOptions::default()).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NormalizedError> {
        self.get(path).await?.json()
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse, NormalizedError> {
        let body = serde_json::to_value(body)
            .map_err(|e| NormalizedError::local(None, format!("unserializable request body: {e}"), Value::Null))?;
        self.request(Method::POST, path, Some(body), options).await
    }

    /// Issue `method path` and run the failure protocol on the result.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse, NormalizedError> {
        let mut ctx = RequestContext::first();

        loop {
            let failure = match self.dispatch(&method, path, body.as_ref()).await {
                Ok(response) => return Ok(response),
                Err(failure) => failure,
            };

            let err = failure.normalize();

            if !err.is_unauthorized() {
                if !options.silent {
                    self.errors.publish(&err);
                }
                return Err(err);
            }

            match unauthorized_action(path, options, ctx) {
                UnauthorizedAction::Reject => {
                    tracing::debug!(%method, path, "401 with redirect suppressed");
                    self.clear_credentials();
                    return Err(err);
                }
                UnauthorizedAction::Refresh => {
                    tracing::debug!(%method, path, "401; attempting session refresh");
                    if self.try_refresh().await {
                        ctx = ctx.retry();
                        continue;
                    }
                    self.expire_session();
                    return Err(err);
                }
                UnauthorizedAction::Expire => {
                    tracing::info!(%method, path, "401 after refresh; session expired");
                    self.expire_session();
                    return Err(err);
                }
            }
        }
    }

    /// Best-effort `POST /auth/refresh` (no redirect, no broadcast).
    pub async fn refresh_session(&self) -> Result<(), NormalizedError> {
        self.request(Method::POST, endpoints::REFRESH, None, RequestOptions::quiet())
            .await
            .map(|_| ())
    }

    /// `GET /auth/me`, reduced to an [`Identity`].
    ///
    /// Shares [`Identity::from_profile`] with [`HttpIdentityResolver`], but
    /// goes through the request pipeline so a 401 clears the credential
    /// store. The resolver only reports the failure to the route guard.
    ///
    /// [`HttpIdentityResolver`]: crate::HttpIdentityResolver
    pub async fn current_identity(&self) -> Result<Identity, NormalizedError> {
        let profile: Profile = self.get_json(endpoints::IDENTITY).await?;
        Ok(Identity::from_profile(profile)?)
    }

    /// Clear the credential store and tell session listeners about it.
    pub fn clear_credentials(&self) {
        if let Err(e) = self.credentials.clear() {
            tracing::warn!(error = %e, "failed to clear stored credentials");
        }
        self.sessions.publish(&SessionEvent::CredentialsCleared);
    }

    async fn try_refresh(&self) -> bool {
        match self.dispatch(&Method::POST, endpoints::REFRESH, None).await {
            Ok(_) => true,
            Err(failure) => {
                tracing::warn!(
                    status = ?failure.status,
                    error = %failure.transport_message,
                    "session refresh failed"
                );
                false
            }
        }
    }

    fn expire_session(&self) {
        self.clear_credentials();

        let location = self.navigator.location();
        if !is_login_surface(&location) {
            self.navigator.navigate(&login_redirect(&location));
        }
    }

    /// One round trip with credentials attached.
    async fn dispatch(&self, method: &Method, path: &str, body: Option<&Value>) -> Result<ApiResponse, Failure> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method.clone(), &url);

        if let Some(token) = self.credentials.token() {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        tracing::debug!(%method, %url, "api request");

        let resp = req.send().await.map_err(|e| Failure {
            status: None,
            body: None,
            transport_message: e.to_string(),
        })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| Failure {
            status: Some(status.as_u16()),
            body: None,
            transport_message: e.to_string(),
        })?;
        let body = parse_body(&bytes);

        if status.is_success() {
            Ok(ApiResponse {
                status: status.as_u16(),
                body: body.unwrap_or(Value::Null),
            })
        } else {
            Err(Failure {
                status: Some(status.as_u16()),
                body,
                transport_message: status_message(status),
            })
        }
    }
}

impl core::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    Some(
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
    )
}

fn status_message(status: StatusCode) -> String {
    format!("Request failed with status code {}", status.as_u16())
}
