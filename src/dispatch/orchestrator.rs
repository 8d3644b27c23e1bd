//! Retry/failover orchestration.
//!
//! # Responsibilities
//! - Admit the request through the rate limiter
//! - Serve reads from the cache, invalidate on writes
//! - Try distinct healthy backends until one answers with a 2xx
//! - Feed every outcome back into the circuit breaker and health registry
//!
//! # Data Flow
//! ```text
//! ProxyRequest
//!     → RateLimiter::allow_request      (deny ⇒ 429)
//!     → ResponseCache::get (GET only)   (hit ⇒ cached response)
//!     → ResponseCache::evict (writes)
//!     → loop until every healthy backend is tried:
//!         LoadBalancer::select_server   (none ⇒ stop)
//!         already tried?                ⇒ reselect, no attempt used
//!         CircuitBreaker::is_open       ⇒ skip
//!         Transport::send
//!             2xx ⇒ record_success, cache, return
//!             err ⇒ record_failure, mark_unhealthy, next
//!     → 503
//! ```
//!
//! # Design Decisions
//! - Per-attempt failures never reach the caller; only the final outcome does
//! - An open circuit is a skip and does not count as another failure
//! - No component lock is held across a call into another component

use axum::http::header;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::ResponseCache;
use crate::error::{DispatchError, TransportError};
use crate::health::HealthRegistry;
use crate::http::request::ProxyRequest;
use crate::http::response::{
    ProxyResponse, X_CACHE, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET,
};
use crate::load_balancer::LoadBalancer;
use crate::observability::metrics;
use crate::resilience::CircuitBreaker;
use crate::security::headers::forward_headers;
use crate::security::RateLimiter;
use crate::transport::Transport;

const UNAVAILABLE_BODY: &str = "All backend servers are unavailable";
const RATE_LIMITED_BODY: &str = "Rate limit exceeded. Please try again later.";

/// Sequences the pipeline components for each inbound request.
pub struct Dispatcher {
    registry: Arc<HealthRegistry>,
    balancer: Arc<dyn LoadBalancer>,
    breaker: Arc<CircuitBreaker>,
    transport: Arc<dyn Transport>,
    limiter: Option<Arc<RateLimiter>>,
    cache: Option<Arc<ResponseCache>>,
}

impl Dispatcher {
    /// A dispatcher with rate limiting and caching disabled.
    pub fn new(
        registry: Arc<HealthRegistry>,
        balancer: Arc<dyn LoadBalancer>,
        breaker: Arc<CircuitBreaker>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            registry,
            balancer,
            breaker,
            transport,
            limiter: None,
            cache: None,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn registry(&self) -> &Arc<HealthRegistry> {
        &self.registry
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn cache(&self) -> Option<&Arc<ResponseCache>> {
        self.cache.as_ref()
    }

    /// Run one request through the pipeline. Always produces a response.
    pub async fn dispatch(&self, request: ProxyRequest) -> ProxyResponse {
        if let Some(limiter) = &self.limiter {
            if !limiter.allow_request(&request.client_id) {
                return self.reject(limiter, &request);
            }
        }

        let mut response = self.serve(&request).await;

        if let Some(limiter) = &self.limiter {
            set_rate_limit_headers(&mut response, limiter, &request.client_id);
        }
        response
    }

    fn reject(&self, limiter: &RateLimiter, request: &ProxyRequest) -> ProxyResponse {
        let reset = limiter.get_reset_time(&request.client_id);
        let retry_after_secs = reset.saturating_sub(now_epoch_secs()).max(1);
        let rejection = DispatchError::RateLimitExceeded {
            client: request.client_id.clone(),
            retry_after_secs,
        };
        tracing::warn!(
            client = %request.client_id,
            retry_after_secs,
            "{rejection}"
        );
        metrics::record_rate_limited();

        let mut response = ProxyResponse::plain_text(rejection.status_code(), RATE_LIMITED_BODY);
        response.set_header(X_RATELIMIT_LIMIT, limiter.capacity());
        response.set_header(X_RATELIMIT_REMAINING, 0);
        response.set_header(X_RATELIMIT_RESET, reset);
        response.set_header(header::RETRY_AFTER, retry_after_secs);
        response
    }

    async fn serve(&self, request: &ProxyRequest) -> ProxyResponse {
        let read_cache = self.cache.as_ref().filter(|_| request.is_read());

        if let Some(cache) = read_cache {
            let hit = cache.get(&request.path);
            metrics::record_cache_lookup(hit.is_some());
            if let Some(entry) = hit {
                tracing::debug!(path = %request.path, "Cache hit");
                let mut response = entry.to_response();
                response.set_header(X_CACHE, "HIT");
                response.set_header(header::AGE, entry.age().as_secs());
                return response;
            }
        }

        if request.is_mutating() {
            if let Some(cache) = &self.cache {
                cache.evict(&request.path);
            }
        }

        let start = Instant::now();
        let mut response = match self.forward(request).await {
            Ok(response) => {
                if let Some(cache) = read_cache {
                    cache.put(request.path.clone(), &response);
                }
                response
            }
            Err(e) => {
                tracing::error!(
                    method = %request.method,
                    path = %request.path,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "All backend servers unavailable"
                );
                ProxyResponse::plain_text(e.status_code(), UNAVAILABLE_BODY)
            }
        };

        if read_cache.is_some() {
            response.set_header(X_CACHE, "MISS");
        }
        response
    }

    /// The retry loop. Returns the first successful backend response, relayable as-is.
    ///
    /// Reselecting an already-tried backend does not use up an attempt. The
    /// loop ends once every backend in the current snapshot has been tried,
    /// with selections capped at the square of the starting snapshot size.
    pub async fn forward(&self, request: &ProxyRequest) -> Result<ProxyResponse, DispatchError> {
        let max_attempts = self.registry.snapshot().len();
        if max_attempts == 0 {
            return Err(DispatchError::NoAvailableBackends);
        }

        let headers = forward_headers(&request.headers, &request.client_id);
        let mut tried: HashSet<String> = HashSet::with_capacity(max_attempts);
        let max_selections = max_attempts * max_attempts;

        for _ in 0..max_selections {
            if self.registry.snapshot().iter().all(|url| tried.contains(url)) {
                break;
            }

            let url = match self.balancer.select_server() {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(attempts = tried.len(), error = %e, "No backend to select");
                    break;
                }
            };

            if !tried.insert(url.clone()) {
                continue;
            }
            let attempt = tried.len();

            if self.breaker.is_open(&url) {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    backend = %url,
                    "Skipped backend: circuit open"
                );
                metrics::record_upstream_attempt(&url, "skipped");
                continue;
            }

            let target = format!("{}{}", url, request.path);
            tracing::info!(method = %request.method, path = %request.path, backend = %url, attempt, "Forwarding request");
            let start = Instant::now();

            let result = self
                .transport
                .send(request.method.clone(), &target, headers.clone(), request.body.clone())
                .await
                .and_then(require_success);

            match result {
                Ok(response) => {
                    self.breaker.record_success(&url);
                    metrics::record_upstream_attempt(&url, "success");
                    tracing::info!(
                        method = %request.method,
                        path = %request.path,
                        backend = %url,
                        status = response.status.as_u16(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Backend responded"
                    );
                    return Ok(response.relayed());
                }
                Err(source) => {
                    let failure = DispatchError::TransportFailure {
                        url: url.clone(),
                        source,
                    };
                    tracing::warn!(
                        method = %request.method,
                        path = %request.path,
                        attempt,
                        "{failure}, retrying"
                    );
                    metrics::record_upstream_attempt(&url, "failure");
                    self.breaker.record_failure(&url);
                    self.registry.mark_unhealthy(&url);
                }
            }
        }

        Err(DispatchError::AllBackendsExhausted {
            attempts: tried.len(),
        })
    }
}

fn require_success(response: ProxyResponse) -> Result<ProxyResponse, TransportError> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(TransportError::UnexpectedStatus(response.status))
    }
}

fn set_rate_limit_headers(response: &mut ProxyResponse, limiter: &RateLimiter, client_id: &str) {
    response.set_header(X_RATELIMIT_LIMIT, limiter.capacity());
    response.set_header(X_RATELIMIT_REMAINING, limiter.get_remaining(client_id));
    response.set_header(X_RATELIMIT_RESET, limiter.get_reset_time(client_id));
}

fn now_epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("backends", &self.registry.backends())
            .field("rate_limited", &self.limiter.is_some())
            .field("cached", &self.cache.is_some())
            .finish()
    }
}
