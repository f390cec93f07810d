#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use tutaller_client::{
    ApiClient, ClientConfig, CredentialStore, MemoryCredentialStore, NormalizedError, WatchNavigator,
};
use tutaller_events::{Broadcaster, InMemoryBroadcaster};

/// Scripted reply: status plus JSON body (`Null` for an empty body).
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn unauthorized() -> Self {
        Self::new(401, json!({ "message": "Unauthorized" }))
    }

    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.body.is_null() {
            status.into_response()
        } else {
            (status, Json(self.body)).into_response()
        }
    }
}

#[derive(Default)]
pub struct Hits {
    pub orders: AtomicUsize,
    pub refresh: AtomicUsize,
    pub me: AtomicUsize,
    pub login: AtomicUsize,
    pub logout: AtomicUsize,
}

/// Fake backend. Each endpoint replays its script front to back and then
/// repeats its fallback reply.
pub struct Backend {
    pub hits: Hits,
    orders: Mutex<VecDeque<Reply>>,
    orders_fallback: Mutex<Reply>,
    refresh: Mutex<Reply>,
    me: Mutex<Reply>,
    login: Mutex<Reply>,
    logout: Mutex<Reply>,
    authorization: Mutex<Vec<Option<String>>>,
    login_bodies: Mutex<Vec<Value>>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            hits: Hits::default(),
            orders: Mutex::new(VecDeque::new()),
            orders_fallback: Mutex::new(Reply::ok(json!({ "items": [] }))),
            refresh: Mutex::new(Reply::ok(json!({ "ok": true }))),
            me: Mutex::new(Reply::ok(profile("u-1", "Ana Torres", "WORKSHOP_ADMIN"))),
            login: Mutex::new(Reply::ok(json!({ "accessToken": "issued-token" }))),
            logout: Mutex::new(Reply::new(204, Value::Null)),
            authorization: Mutex::new(Vec::new()),
            login_bodies: Mutex::new(Vec::new()),
        }
    }
}

impl Backend {
    pub fn script_orders(&self, replies: impl IntoIterator<Item = Reply>) {
        self.orders.lock().unwrap().extend(replies);
    }

    pub fn set_orders(&self, reply: Reply) {
        *self.orders_fallback.lock().unwrap() = reply;
    }

    pub fn set_refresh(&self, reply: Reply) {
        *self.refresh.lock().unwrap() = reply;
    }

    pub fn set_me(&self, reply: Reply) {
        *self.me.lock().unwrap() = reply;
    }

    pub fn set_login(&self, reply: Reply) {
        *self.login.lock().unwrap() = reply;
    }

    pub fn set_logout(&self, reply: Reply) {
        *self.logout.lock().unwrap() = reply;
    }

    /// `Authorization` headers seen on `/orders`, in order.
    pub fn authorization_headers(&self) -> Vec<Option<String>> {
        self.authorization.lock().unwrap().clone()
    }

    pub fn login_bodies(&self) -> Vec<Value> {
        self.login_bodies.lock().unwrap().clone()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub fn profile(id: &str, name: &str, role: &str) -> Value {
    json!({ "id": id, "name": name, "roles": [{ "role": role, "tenantId": "t-1" }] })
}

async fn orders(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.hits.orders.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    backend.authorization.lock().unwrap().push(auth);

    let scripted = backend.orders.lock().unwrap().pop_front();
    scripted
        .unwrap_or_else(|| backend.orders_fallback.lock().unwrap().clone())
        .into_response()
}

async fn refresh(State(backend): State<Arc<Backend>>) -> Response {
    backend.hits.refresh.fetch_add(1, Ordering::SeqCst);
    backend.refresh.lock().unwrap().clone().into_response()
}

async fn me(State(backend): State<Arc<Backend>>) -> Response {
    backend.hits.me.fetch_add(1, Ordering::SeqCst);
    backend.me.lock().unwrap().clone().into_response()
}

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    backend.hits.login.fetch_add(1, Ordering::SeqCst);
    backend.login_bodies.lock().unwrap().push(body);
    backend.login.lock().unwrap().clone().into_response()
}

async fn logout(State(backend): State<Arc<Backend>>) -> Response {
    backend.hits.logout.fetch_add(1, Ordering::SeqCst);
    backend.logout.lock().unwrap().clone().into_response()
}

pub struct TestServer {
    pub base_url: String,
    pub backend: Arc<Backend>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let backend = Arc::new(Backend::default());
        let app = Router::new()
            .route("/orders", get(orders).post(orders))
            .route("/auth/refresh", post(refresh))
            .route("/auth/me", get(me))
            .route("/auth/login", post(login))
            .route("/auth/logout", post(logout))
            .with_state(Arc::clone(&backend));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            backend,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Base URL of a port nothing listens on.
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Client wired to in-memory collaborators the tests can inspect.
pub struct Harness {
    pub client: Arc<ApiClient>,
    pub store: Arc<MemoryCredentialStore>,
    pub navigator: Arc<WatchNavigator>,
    pub errors: InMemoryBroadcaster<NormalizedError>,
    pub published: Arc<Mutex<Vec<NormalizedError>>>,
}

impl Harness {
    pub fn new(base_url: &str, location: &str, token: Option<&str>) -> Self {
        let store = Arc::new(match token {
            Some(token) => MemoryCredentialStore::with_token(token),
            None => MemoryCredentialStore::new(),
        });
        let navigator = Arc::new(WatchNavigator::new(location));
        let errors = InMemoryBroadcaster::<NormalizedError>::new();

        let published = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&published);
        errors
            .subscribe(Arc::new(move |e: &NormalizedError| sink.lock().unwrap().push(e.clone())))
            .detach();

        let client = ApiClient::new(
            &ClientConfig::new(base_url),
            store.clone(),
            navigator.clone(),
            Arc::new(errors.clone()),
        )
        .unwrap();

        Self {
            client: Arc::new(client),
            store,
            navigator,
            errors,
            published,
        }
    }

    pub fn token(&self) -> Option<String> {
        self.store.token()
    }

    pub fn published(&self) -> Vec<NormalizedError> {
        self.published.lock().unwrap().clone()
    }
}
