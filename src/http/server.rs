//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the pipeline components from configuration
//! - Create the Axum router with the proxy and admin handlers
//! - Wire up middleware (tracing, request ID, timeout, body limit)
//! - Run the health monitor alongside the server
//! - Serve until the shutdown signal fires

use axum::{
    body::Bytes,
    extract::{ConnectInfo, DefaultBodyLimit, Query, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::cache::ResponseCache;
use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::health::{HealthMonitor, HealthRegistry};
use crate::http::request::{GatewayRequestId, ProxyRequest};
use crate::load_balancer::RoundRobin;
use crate::observability::metrics;
use crate::resilience::CircuitBreaker;
use crate::security::RateLimiter;
use crate::transport::{HealthProbe, HyperTransport, Transport};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// Query string of `/proxy`.
#[derive(Debug, Default, Deserialize)]
pub struct ProxyQuery {
    #[serde(default)]
    pub path: String,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    dispatcher: Arc<Dispatcher>,
    probe: Arc<dyn HealthProbe>,
}

impl GatewayServer {
    /// Create a server that talks to backends over HTTP.
    pub fn new(config: GatewayConfig) -> Self {
        let transport = Arc::new(HyperTransport::from_config(&config.timeouts, &config.limits));
        Self::with_transport(config, transport.clone(), transport)
    }

    /// Create a server with explicit outbound collaborators.
    pub fn with_transport(
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
        probe: Arc<dyn HealthProbe>,
    ) -> Self {
        let registry = Arc::new(HealthRegistry::from_config(&config.backends, &config.health_check));
        let balancer = Arc::new(RoundRobin::new(registry.clone()));
        let breaker = Arc::new(CircuitBreaker::from_config(&config.circuit_breaker));

        let mut dispatcher = Dispatcher::new(registry, balancer, breaker, transport);
        if config.rate_limit.enabled {
            dispatcher = dispatcher.with_rate_limiter(Arc::new(RateLimiter::from_config(&config.rate_limit)));
        }
        if config.cache.enabled {
            dispatcher = dispatcher.with_cache(Arc::new(ResponseCache::from_config(&config.cache)));
        }
        let dispatcher = Arc::new(dispatcher);

        let state = AppState {
            dispatcher: dispatcher.clone(),
        };
        let router = Self::build_router(&config, state);

        Self {
            router,
            config,
            dispatcher,
            probe,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route(
                "/proxy",
                get(proxy_handler)
                    .post(proxy_handler)
                    .put(proxy_handler)
                    .delete(proxy_handler),
            )
            .merge(admin::setup_admin_router())
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(request_deadline(config)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(GatewayRequestId))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires, sweeping backend health meanwhile.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = ?self.config.backends.urls,
            "HTTP server starting"
        );

        let monitor = HealthMonitor::new(
            self.dispatcher.registry().clone(),
            self.probe.clone(),
            self.config.health_check.interval(),
        );
        let monitor_handle = tokio::spawn(monitor.run(shutdown.resubscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Err(e) = monitor_handle.await {
            tracing::error!(error = %e, "Health monitor task failed");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Whole-request deadline: every backend may be tried once.
fn request_deadline(config: &GatewayConfig) -> Duration {
    let per_attempt = config.timeouts.connect() + config.timeouts.request();
    let attempts = u32::try_from(config.backends.urls.len().max(1)).unwrap_or(u32::MAX);
    per_attempt.saturating_mul(attempts)
}

/// `/proxy` handler for every supported method.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    Query(query): Query<ProxyQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let request = ProxyRequest::new(method, &query.path, addr.ip().to_string())
        .with_headers(headers)
        .with_body(body);

    tracing::debug!(
        request_id = %request.request_id(),
        method = %request.method,
        path = %request.path,
        client = %request.client_id,
        "Proxying request"
    );

    let method = request.method.clone();
    let response = state.dispatcher.dispatch(request).await;
    metrics::record_request(method.as_str(), response.status.as_u16(), start);

    response.into_response()
}
