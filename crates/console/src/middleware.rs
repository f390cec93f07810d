//! Session guard.
//!
//! Runs once per navigation, before any page handler:
//!
//! 1. public path → forward untouched
//! 2. no `tutaller_token` cookie → login redirect
//! 3. identity lookup against the backend; any failure → login redirect
//! 4. role check by path prefix; denied → `/dashboard`
//! 5. forward with `x-user-role` and a [`PrincipalContext`] extension
//!
//! The guard never answers with an error status.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use tutaller_auth::session::{ROLE_HEADER, SESSION_TOKEN_KEY};
use tutaller_auth::{
    DEFAULT_LANDING_PATH, IdentityResolver, ResolveError, authorize_path, is_public_path, login_redirect,
};

use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct GuardState {
    pub resolver: Arc<dyn IdentityResolver>,
}

pub async fn session_guard(
    State(state): State<GuardState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    if is_public_path(&path) {
        return next.run(req).await;
    }

    let Some(token) = session_token(req.headers()) else {
        tracing::debug!(path, "no session cookie");
        return Redirect::temporary(&login_redirect(&path)).into_response();
    };

    let identity = match state.resolver.resolve_identity(&token).await {
        Ok(identity) => identity,
        Err(e) => {
            log_resolve_failure(&path, &e);
            return Redirect::temporary(&login_redirect(&path)).into_response();
        }
    };

    if let Err(e) = authorize_path(&path, identity.role()) {
        tracing::info!(path, user = %identity.id(), error = %e, "navigation denied");
        return Redirect::temporary(DEFAULT_LANDING_PATH).into_response();
    }

    req.headers_mut()
        .insert(ROLE_HEADER, HeaderValue::from_static(identity.role().as_str()));
    req.extensions_mut().insert(PrincipalContext::new(identity));

    next.run(req).await
}

/// The session cookie's value, when present and non-empty.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(SESSION_TOKEN_KEY)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

fn log_resolve_failure(path: &str, err: &ResolveError) {
    match err {
        ResolveError::Unauthorized | ResolveError::NoRole | ResolveError::UnknownRole(_) => {
            tracing::debug!(path, error = %err, "session rejected");
        }
        ResolveError::UnexpectedStatus(_) | ResolveError::Malformed(_) | ResolveError::Transport(_) => {
            tracing::warn!(path, error = %err, "identity lookup failed; redirecting to login");
        }
    }
}
