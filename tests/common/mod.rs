//! Shared utilities for integration testing: programmable mock environments
//! and an in-process gateway bound to an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use ownership_gateway::config::GatewayConfig;
use ownership_gateway::{HttpServer, Shutdown};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Call order across every mock environment in a test.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

/// How a mock answers `POST /checkUser`.
#[derive(Debug, Clone)]
pub enum CheckBehavior {
    /// `{"exists": <bool>, "id": "u-1"}`
    Exists(bool),
    /// Exists only for emails ending with the given suffix.
    OwnsSuffix(&'static str),
    /// Arbitrary status and body.
    Reply(u16, &'static str),
    /// Sleep, then answer `{"exists": true}`.
    Stall(Duration),
}

/// A request the mock received outside `/checkUser`.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct MockState {
    name: &'static str,
    check: CheckBehavior,
    journal: Journal,
    check_calls: AtomicUsize,
    checked: Mutex<Vec<Value>>,
    forwarded: Mutex<Vec<RecordedRequest>>,
}

pub struct MockEnvironment {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockEnvironment {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn check_calls(&self) -> usize {
        self.state.check_calls.load(Ordering::SeqCst)
    }

    /// JSON bodies received on `/checkUser`.
    pub fn checked(&self) -> Vec<Value> {
        self.state.checked.lock().unwrap().clone()
    }

    pub fn forwarded(&self) -> Vec<RecordedRequest> {
        self.state.forwarded.lock().unwrap().clone()
    }
}

/// Start a mock environment.
///
/// Forwarded requests are answered with `418`, `x-test: v`,
/// `x-environment: <name>` and body `{"ok":false}`, except:
/// - `/slow...` sleeps 3s first
/// - `/fail...` answers `500 backend exploded`
pub async fn start_environment(
    name: &'static str,
    check: CheckBehavior,
    journal: &Journal,
) -> MockEnvironment {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = Arc::new(MockState {
        name,
        check,
        journal: journal.clone(),
        check_calls: AtomicUsize::new(0),
        checked: Mutex::new(Vec::new()),
        forwarded: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/checkUser", post(check_user))
        .fallback(record_forward)
        .with_state(state.clone());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockEnvironment { addr, state }
}

async fn check_user(State(state): State<Arc<MockState>>, body: Bytes) -> Response {
    state.check_calls.fetch_add(1, Ordering::SeqCst);
    state
        .journal
        .lock()
        .unwrap()
        .push(format!("{}:checkUser", state.name));

    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let email = request["email"].as_str().unwrap_or_default().to_string();
    state.checked.lock().unwrap().push(request);

    match &state.check {
        CheckBehavior::Exists(exists) => Json(json!({ "exists": exists, "id": "u-1" })).into_response(),
        CheckBehavior::OwnsSuffix(suffix) => {
            Json(json!({ "exists": email.ends_with(suffix) })).into_response()
        }
        CheckBehavior::Reply(status, body) => {
            (StatusCode::from_u16(*status).unwrap(), *body).into_response()
        }
        CheckBehavior::Stall(delay) => {
            tokio::time::sleep(*delay).await;
            Json(json!({ "exists": true })).into_response()
        }
    }
}

async fn record_forward(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    state
        .journal
        .lock()
        .unwrap()
        .push(format!("{}:{} {}", state.name, method, path_and_query));
    state.forwarded.lock().unwrap().push(RecordedRequest {
        method,
        path_and_query: path_and_query.clone(),
        headers,
        body,
    });

    if path_and_query.starts_with("/slow") {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    if path_and_query.starts_with("/fail") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "backend exploded").into_response();
    }

    (
        StatusCode::IM_A_TEAPOT,
        [("x-test", "v"), ("x-environment", state.name)],
        r#"{"ok":false}"#,
    )
        .into_response()
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Config pointing at the two given base URLs, with short test deadlines.
pub fn test_config(primary: &str, secondary: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.environments.primary.base_url = primary.into();
    config.environments.secondary.base_url = secondary.into();
    config.timeouts.check_ms = 300;
    config.timeouts.forward_ms = 1_000;
    config.timeouts.request_ms = 5_000;
    config
}

/// Run a gateway in the background; trigger the returned `Shutdown` to stop it.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
