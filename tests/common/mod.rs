//! Shared utilities for integration and load testing.
#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use failover_gateway::config::parse_config;
use failover_gateway::lifecycle::Shutdown;
use failover_gateway::GatewayServer;

/// A programmable mock backend.
///
/// Answers `/health` with 200 while healthy and 503 otherwise. Every other
/// path answers `"<name>:<METHOD> <path>"` while healthy and 500 otherwise.
#[derive(Clone)]
pub struct MockBackend {
    pub name: &'static str,
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    healthy: Arc<AtomicBool>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Non-health requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

/// Start a mock backend on an ephemeral loopback port.
pub async fn start_backend(name: &'static str) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = MockBackend {
        name,
        addr: listener.local_addr().unwrap(),
        hits: Arc::new(AtomicUsize::new(0)),
        healthy: Arc::new(AtomicBool::new(true)),
    };

    let app = Router::new()
        .route("/health", get(health))
        .fallback(echo)
        .with_state(backend.clone());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    backend
}

async fn health(State(backend): State<MockBackend>) -> StatusCode {
    if backend.healthy.load(Ordering::SeqCst) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn echo(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    if !backend.healthy.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "down").into_response();
    }

    let text = if body.is_empty() {
        format!("{}:{} {}", backend.name, method, uri.path())
    } else {
        format!(
            "{}:{} {} {}",
            backend.name,
            method,
            uri.path(),
            String::from_utf8_lossy(&body)
        )
    };

    let mut response = (StatusCode::OK, text).into_response();
    let echoed = response.headers_mut();
    echoed.insert("connection", HeaderValue::from_static("keep-alive"));
    for (from, to) in [
        ("x-request-id", "x-upstream-request-id"),
        ("x-forwarded-for", "x-upstream-forwarded-for"),
    ] {
        if let Some(value) = headers.get(from) {
            echoed.insert(to, value.clone());
        }
    }
    response
}

/// A loopback URL nobody listens on.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Gateway configuration for `urls` plus extra TOML sections.
pub fn gateway_config(urls: &[String], extra: &str) -> String {
    let list = urls
        .iter()
        .map(|u| format!("\"{u}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"
[backends]
urls = [{list}]

[timeouts]
connect_secs = 1
request_secs = 2

{extra}
"#
    )
}

/// Start a gateway on an ephemeral port. Trigger the returned handle to stop it.
pub async fn start_gateway(config: &str) -> (SocketAddr, Shutdown) {
    let config = parse_config(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = GatewayServer::new(config);
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
