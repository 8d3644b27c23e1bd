//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every inbound request
//! - Model the inbound request handed to the dispatch pipeline
//! - Classify methods as read or mutating
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Cache key is the target path only; the method decides whether the cache applies

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatewayRequestId;

impl MakeRequestId for GatewayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// An inbound request as seen by the dispatch pipeline.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Path appended to the selected backend's base URL; also the cache key.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Caller identity for rate limiting (peer IP address).
    pub client_id: String,
}

impl ProxyRequest {
    pub fn new(method: Method, path: &str, client_id: impl Into<String>) -> Self {
        Self {
            method,
            path: normalize_path(path),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            client_id: client_id.into(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Reads are served from and stored into the cache.
    pub fn is_read(&self) -> bool {
        self.method == Method::GET
    }

    /// Mutations invalidate the cache entry for their path.
    pub fn is_mutating(&self) -> bool {
        matches!(self.method, Method::POST | Method::PUT | Method::DELETE)
    }

    pub fn request_id(&self) -> &str {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

/// Ensure a non-empty target path starts with `/`.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "");
        assert_eq!(normalize_path("/users"), "/users");
        assert_eq!(normalize_path("users/1"), "/users/1");
    }

    #[test]
    fn test_method_classification() {
        assert!(ProxyRequest::new(Method::GET, "/a", "c").is_read());
        assert!(!ProxyRequest::new(Method::GET, "/a", "c").is_mutating());
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let request = ProxyRequest::new(method, "/a", "c");
            assert!(request.is_mutating());
            assert!(!request.is_read());
        }
        // PATCH is not routed through `/proxy`.
        assert!(!ProxyRequest::new(Method::PATCH, "/a", "c").is_mutating());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let mut maker = GatewayRequestId;
        let request = Request::new(());
        let a = maker.make_request_id(&request).unwrap();
        let b = maker.make_request_id(&request).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }
}
