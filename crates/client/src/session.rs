//! Auth session: the client-side cache of who is logged in.
//!
//! ```text
//! Unresolved ──► Resolving ──► Resolved(identity)
//!                    │               │ logout / credentials cleared
//!                    └──► Anonymous ◄┘
//! ```
//!
//! Every transition into `Resolved` re-fetches `/auth/me`; there is no stale
//! state. UI code observes the state through [`AuthSession::watch`].

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use tutaller_auth::redirect::return_target;
use tutaller_auth::{Identity, LOGIN_PATH, endpoints, is_login_surface, login_redirect};
use tutaller_events::Subscription;

use crate::error::NormalizedError;
use crate::http::{ApiClient, RequestOptions, SessionEvent};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum IdentityState {
    #[default]
    Unresolved,
    Resolving,
    Resolved(Identity),
    Anonymous,
}

impl IdentityState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            IdentityState::Resolved(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, IdentityState::Unresolved | IdentityState::Resolving)
    }
}

/// What the dashboard shell should do for the current path.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewGate {
    Loading,
    Render(Identity),
    Redirect(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginFormError {
    #[error("invalid email address")]
    InvalidEmail,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoginError {
    #[error(transparent)]
    Invalid(#[from] LoginFormError),

    #[error(transparent)]
    Rejected(#[from] NormalizedError),
}

/// Login form payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), LoginFormError> {
        if !looks_like_email(&self.email) {
            return Err(LoginFormError::InvalidEmail);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(LoginFormError::PasswordTooShort { min: MIN_PASSWORD_LEN });
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

/// `POST /auth/login` response; the token may also arrive only as a cookie.
#[derive(Debug, Default, Deserialize)]
struct LoginResponse {
    #[serde(rename = "accessToken", alias = "token", alias = "access_token", default)]
    access_token: Option<String>,
}

pub struct AuthSession {
    client: Arc<ApiClient>,
    state: Arc<watch::Sender<IdentityState>>,
    _session_events: Subscription,
}

impl AuthSession {
    pub fn new(client: Arc<ApiClient>) -> Self {
        let (tx, _rx) = watch::channel(IdentityState::Unresolved);
        let state = Arc::new(tx);

        // Credentials cleared elsewhere (unrecoverable 401) end a resolved session.
        let listener_state = Arc::clone(&state);
        let session_events = client.on_session_event(Arc::new(move |event: &SessionEvent| {
            match event {
                SessionEvent::CredentialsCleared => {
                    listener_state.send_if_modified(|current| {
                        if matches!(current, IdentityState::Resolved(_)) {
                            tracing::info!("credentials cleared; dropping resolved identity");
                            *current = IdentityState::Anonymous;
                            true
                        } else {
                            false
                        }
                    });
                }
            }
        }));

        Self {
            client,
            state,
            _session_events: session_events,
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn state(&self) -> IdentityState {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn watch(&self) -> watch::Receiver<IdentityState> {
        self.state.subscribe()
    }

    /// Mount-time resolution; runs once, later calls are no-ops.
    pub async fn initialize(&self) {
        let claimed = self.state.send_if_modified(|state| {
            if matches!(state, IdentityState::Unresolved) {
                *state = IdentityState::Resolving;
                true
            } else {
                false
            }
        });
        if claimed {
            self.lookup().await;
        }
    }

    /// Re-fetch the identity. Failures leave the session anonymous.
    pub async fn resolve(&self) -> Option<Identity> {
        self.set(IdentityState::Resolving);
        self.lookup().await
    }

    async fn lookup(&self) -> Option<Identity> {
        match self.client.current_identity().await {
            Ok(identity) => {
                tracing::info!(user = %identity.id(), role = %identity.role(), "identity resolved");
                self.set(IdentityState::Resolved(identity.clone()));
                Some(identity)
            }
            Err(e) => {
                tracing::debug!(error = %e, "identity lookup failed");
                self.set(IdentityState::Anonymous);
                None
            }
        }
    }

    /// Log in and resolve the identity.
    ///
    /// When called from the login surface, navigates to the `next` target
    /// (or `/`) on success.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, LoginError> {
        let form = LoginForm::new(email, password);
        form.validate()?;

        self.set(IdentityState::Resolving);

        let outcome = self.login_and_resolve(&form).await;
        match &outcome {
            Ok(identity) => {
                tracing::info!(user = %identity.id(), role = %identity.role(), "logged in");
                self.set(IdentityState::Resolved(identity.clone()));

                let navigator = self.client.navigator();
                let location = navigator.location();
                if is_login_surface(&location) {
                    let target = return_target(&location).unwrap_or_else(|| "/".to_string());
                    navigator.navigate(&target);
                }
            }
            Err(e) => {
                tracing::info!(error = %e, "login failed");
                self.set(IdentityState::Anonymous);
            }
        }

        outcome.map_err(LoginError::from)
    }

    async fn login_and_resolve(&self, form: &LoginForm) -> Result<Identity, NormalizedError> {
        // Bad credentials are a form error, not an expired session.
        let resp = self
            .client
            .post(endpoints::LOGIN, form, RequestOptions::skip_auth_redirect())
            .await?;

        let login: LoginResponse = resp.json().unwrap_or_default();
        if let Some(token) = login.access_token.filter(|t| !t.is_empty()) {
            if let Err(e) = self.client.credentials().set_for_session(&token) {
                tracing::warn!(error = %e, "failed to persist session token");
            }
        }

        self.client.current_identity().await
    }

    /// Log out. The backend call is best-effort; local state is always cleared.
    pub async fn logout(&self) {
        if let Err(e) = self
            .client
            .request(Method::POST, endpoints::LOGOUT, None, RequestOptions::quiet())
            .await
        {
            tracing::debug!(error = %e, "logout call failed; clearing local session anyway");
        }

        self.client.clear_credentials();
        self.set(IdentityState::Anonymous);

        let navigator = self.client.navigator();
        if !is_login_surface(&navigator.location()) {
            navigator.navigate(LOGIN_PATH);
        }
    }

    /// Best-effort session refresh; never navigates. A 401 from the backend
    /// clears the credentials, which ends a resolved session.
    pub async fn refresh(&self) -> bool {
        match self.client.refresh_session().await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "session refresh failed");
                false
            }
        }
    }

    /// Dashboard shell decision for `path`.
    pub fn gate(&self, path: &str) -> ViewGate {
        match &*self.state.borrow() {
            IdentityState::Unresolved | IdentityState::Resolving => ViewGate::Loading,
            IdentityState::Resolved(identity) => ViewGate::Render(identity.clone()),
            IdentityState::Anonymous => ViewGate::Redirect(login_redirect(path)),
        }
    }

    fn set(&self, next: IdentityState) {
        self.state.send_replace(next);
    }
}

impl core::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthSession")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
