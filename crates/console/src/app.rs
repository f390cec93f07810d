//! Console router.
//!
//! Pages are placeholders that report what the guard established (path and
//! role); rendering itself lives in the UI shell.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Serialize;
use tower::ServiceBuilder;

use tutaller_auth::navigation::entries_for;
use tutaller_auth::session::ROLE_HEADER;
use tutaller_auth::{DEFAULT_LANDING_PATH, IdentityResolver};

use crate::context::PrincipalContext;
use crate::middleware::{GuardState, session_guard};

/// Build the full console router (public entrypoint used by `main.rs`).
pub fn build_app(resolver: Arc<dyn IdentityResolver>) -> Router {
    let guard = GuardState { resolver };

    Router::new()
        .route("/", get(|| async { Redirect::temporary(DEFAULT_LANDING_PATH) }))
        .route("/health", get(health))
        .route("/login", get(login_page))
        .fallback(page)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(guard, session_guard)))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

async fn login_page() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "page": "login" }))
}

#[derive(Debug, Serialize)]
struct PageView<'a> {
    path: &'a str,
    role: &'a str,
    user: &'a str,
    name: &'a str,
    menu: Vec<&'static str>,
}

async fn page(uri: Uri, headers: HeaderMap, principal: Option<Extension<PrincipalContext>>) -> Response {
    let path = uri.path();

    let Some(Extension(principal)) = principal else {
        // Public path without a dedicated route (static assets are served elsewhere).
        return StatusCode::NOT_FOUND.into_response();
    };

    let role = headers
        .get(ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    Json(PageView {
        path,
        role,
        user: principal.user_id().as_str(),
        name: principal.name(),
        menu: entries_for(principal.role()).into_iter().map(|e| e.href).collect(),
    })
    .into_response()
}
