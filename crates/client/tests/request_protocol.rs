mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::Method;
use serde_json::json;

use common::{Backend, Harness, Reply, TestServer, unreachable_base_url};
use tutaller_client::error::FALLBACK_MESSAGE;
use tutaller_client::{ErrorCode, Navigator, RequestOptions, SessionEvent};

#[tokio::test]
async fn unauthorized_request_is_refreshed_once_and_replayed() {
    let srv = TestServer::spawn().await;
    srv.backend.script_orders([Reply::unauthorized()]);
    let h = Harness::new(&srv.base_url, "/orders", Some("stale"));

    let resp = h.client.get("/orders").await.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!({ "items": [] }));
    assert_eq!(Backend::count(&srv.backend.hits.orders), 2);
    assert_eq!(Backend::count(&srv.backend.hits.refresh), 1);
    assert_eq!(h.token().as_deref(), Some("stale"));
    assert_eq!(h.navigator.location(), "/orders");
    assert!(h.published().is_empty());
}

#[tokio::test]
async fn replay_failure_after_refresh_reaches_the_caller() {
    let srv = TestServer::spawn().await;
    srv.backend
        .script_orders([Reply::unauthorized(), Reply::new(500, json!({ "message": "boom" }))]);
    let h = Harness::new(&srv.base_url, "/orders", Some("stale"));

    let err = h.client.get("/orders").await.unwrap_err();

    assert_eq!(err.status, Some(500));
    assert_eq!(err.message, "boom");
    assert_eq!(Backend::count(&srv.backend.hits.orders), 2);
    assert_eq!(Backend::count(&srv.backend.hits.refresh), 1);
    assert_eq!(h.published(), vec![err]);
    assert_eq!(h.token().as_deref(), Some("stale"));
    assert_eq!(h.navigator.location(), "/orders");
}

#[tokio::test]
async fn failed_refresh_clears_credentials_and_redirects_to_login() {
    let srv = TestServer::spawn().await;
    srv.backend.set_orders(Reply::unauthorized());
    srv.backend.set_refresh(Reply::unauthorized());
    let h = Harness::new(&srv.base_url, "/orders?page=2", Some("stale"));

    let err = h.client.get("/orders").await.unwrap_err();

    assert_eq!(err.status, Some(401));
    assert_eq!(err.message, "Unauthorized");
    assert_eq!(Backend::count(&srv.backend.hits.orders), 1);
    assert_eq!(Backend::count(&srv.backend.hits.refresh), 1);
    assert_eq!(h.token(), None);
    assert_eq!(h.navigator.location(), "/login?next=%2Forders%3Fpage%3D2");
    assert!(h.published().is_empty());
}

#[tokio::test]
async fn second_unauthorized_after_refresh_does_not_refresh_again() {
    let srv = TestServer::spawn().await;
    srv.backend.set_orders(Reply::unauthorized());
    let h = Harness::new(&srv.base_url, "/workshop/orders", Some("stale"));

    let err = h.client.get("/orders").await.unwrap_err();

    assert_eq!(err.status, Some(401));
    assert_eq!(Backend::count(&srv.backend.hits.orders), 2);
    assert_eq!(Backend::count(&srv.backend.hits.refresh), 1);
    assert_eq!(h.token(), None);
    assert_eq!(h.navigator.location(), "/login?next=%2Fworkshop%2Forders");
}

#[tokio::test]
async fn no_redirect_while_already_on_login() {
    let srv = TestServer::spawn().await;
    srv.backend.set_orders(Reply::unauthorized());
    srv.backend.set_refresh(Reply::unauthorized());
    let h = Harness::new(&srv.base_url, "/login?next=%2Forders", Some("stale"));

    let err = h.client.get("/orders").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(h.token(), None);
    assert_eq!(h.navigator.location(), "/login?next=%2Forders");
}

#[tokio::test]
async fn identity_lookup_unauthorized_clears_without_refresh_or_redirect() {
    let srv = TestServer::spawn().await;
    srv.backend.set_me(Reply::unauthorized());
    let h = Harness::new(&srv.base_url, "/dashboard", Some("stale"));

    let err = h.client.get("/auth/me").await.unwrap_err();

    assert_eq!(err.status, Some(401));
    assert_eq!(Backend::count(&srv.backend.hits.refresh), 0);
    assert_eq!(h.token(), None);
    assert_eq!(h.navigator.location(), "/dashboard");
    assert!(h.published().is_empty());
}

#[tokio::test]
async fn skip_auth_redirect_rejects_without_refresh() {
    let srv = TestServer::spawn().await;
    srv.backend.set_orders(Reply::unauthorized());
    let h = Harness::new(&srv.base_url, "/orders", Some("stale"));

    let err = h
        .client
        .request(Method::GET, "/orders", None, RequestOptions::skip_auth_redirect())
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(Backend::count(&srv.backend.hits.refresh), 0);
    assert_eq!(h.token(), None);
    assert_eq!(h.navigator.location(), "/orders");
}

#[tokio::test]
async fn expiry_announces_cleared_credentials() {
    let srv = TestServer::spawn().await;
    srv.backend.set_orders(Reply::unauthorized());
    srv.backend.set_refresh(Reply::unauthorized());
    let h = Harness::new(&srv.base_url, "/orders", Some("stale"));

    let cleared = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&cleared);
    let _sub = h.client.on_session_event(Arc::new(move |event: &SessionEvent| {
        assert_eq!(*event, SessionEvent::CredentialsCleared);
        seen.fetch_add(1, Ordering::SeqCst);
    }));

    let _ = h.client.get("/orders").await;

    assert_eq!(cleared.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn server_errors_are_normalized_and_broadcast() {
    let srv = TestServer::spawn().await;
    srv.backend.set_orders(Reply::new(500, json!({ "message": "boom", "code": "E_BOOM" })));
    let h = Harness::new(&srv.base_url, "/orders", Some("t"));

    let err = h.client.get("/orders").await.unwrap_err();

    assert_eq!(err.status, Some(500));
    assert_eq!(err.code, Some(ErrorCode::Text("E_BOOM".to_string())));
    assert_eq!(err.message, "boom");
    assert_eq!(err.raw, json!({ "message": "boom", "code": "E_BOOM" }));
    assert_eq!(h.published(), vec![err]);
    assert_eq!(h.token().as_deref(), Some("t"));
    assert_eq!(Backend::count(&srv.backend.hits.refresh), 0);
}

#[tokio::test]
async fn validation_failures_keep_details_and_fall_back_to_status_code() {
    let srv = TestServer::spawn().await;
    let body = json!({ "error": "Unprocessable", "errors": { "email": ["taken"] } });
    srv.backend.set_orders(Reply::new(422, body.clone()));
    let h = Harness::new(&srv.base_url, "/orders", None);

    let err = h
        .client
        .post("/orders", &json!({ "plate": "ABC-123" }), RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.status, Some(422));
    assert_eq!(err.code, Some(ErrorCode::Number(422)));
    assert_eq!(err.message, "Unprocessable");
    assert_eq!(err.details, Some(json!({ "email": ["taken"] })));
    assert_eq!(err.raw, body);
}

#[tokio::test]
async fn empty_error_body_uses_the_transport_message() {
    let srv = TestServer::spawn().await;
    srv.backend.set_orders(Reply::new(503, serde_json::Value::Null));
    let h = Harness::new(&srv.base_url, "/orders", None);

    let err = h.client.get("/orders").await.unwrap_err();

    assert_eq!(err.status, Some(503));
    assert_eq!(err.message, "Request failed with status code 503");
    assert_eq!(err.details, None);
}

#[tokio::test]
async fn silent_requests_are_not_broadcast() {
    let srv = TestServer::spawn().await;
    srv.backend.set_orders(Reply::new(500, json!({ "message": "boom" })));
    let h = Harness::new(&srv.base_url, "/orders", None);

    let err = h
        .client
        .request(Method::GET, "/orders", None, RequestOptions::silent())
        .await
        .unwrap_err();

    assert_eq!(err.message, "boom");
    assert!(h.published().is_empty());
}

#[tokio::test]
async fn transport_failure_has_no_status() {
    let base_url = unreachable_base_url().await;
    let h = Harness::new(&base_url, "/orders", Some("t"));

    let err = h.client.get("/orders").await.unwrap_err();

    assert_eq!(err.status, None);
    assert_eq!(err.code, None);
    assert!(!err.message.is_empty());
    assert_ne!(err.message, FALLBACK_MESSAGE);
    assert_eq!(h.published().len(), 1);
    assert_eq!(h.token().as_deref(), Some("t"));
    assert_eq!(h.navigator.location(), "/orders");
}

#[tokio::test]
async fn stored_token_is_sent_as_bearer() {
    let srv = TestServer::spawn().await;

    let with_token = Harness::new(&srv.base_url, "/orders", Some("abc"));
    with_token.client.get("/orders").await.unwrap();

    let without_token = Harness::new(&srv.base_url, "/orders", None);
    without_token.client.get("/orders").await.unwrap();

    assert_eq!(
        srv.backend.authorization_headers(),
        vec![Some("Bearer abc".to_string()), None]
    );
}

#[tokio::test]
async fn current_identity_takes_the_first_role() {
    let srv = TestServer::spawn().await;
    srv.backend.set_me(Reply::ok(json!({
        "id": "u-9",
        "name": "Luis Pérez",
        "roles": [{ "role": "MECHANIC" }, { "role": "SUPER_ADMIN" }]
    })));
    let h = Harness::new(&srv.base_url, "/", Some("t"));

    let identity = h.client.current_identity().await.unwrap();

    assert_eq!(identity.id().as_str(), "u-9");
    assert_eq!(identity.role(), tutaller_auth::Role::Mechanic);
    assert_eq!(identity.initials(), "LP");
}

#[tokio::test]
async fn profile_without_roles_is_not_an_identity() {
    let srv = TestServer::spawn().await;
    srv.backend.set_me(Reply::ok(json!({ "id": "u-9", "name": "Nobody", "roles": [] })));
    let h = Harness::new(&srv.base_url, "/", Some("t"));

    let err = h.client.current_identity().await.unwrap_err();

    assert_eq!(err.status, None);
    assert_eq!(h.token().as_deref(), Some("t"));
}
