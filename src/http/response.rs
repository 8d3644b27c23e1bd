//! Response model and transformation.
//!
//! # Responsibilities
//! - Buffered response shared by the transport, the cache and the inbound handler
//! - Gateway-generated responses (429, 503) with plain-text bodies
//! - Conversion into an axum response
//!
//! # Design Decisions
//! - Bodies are fully buffered so a response can be cached and replayed
//! - Hop-by-hop headers are stripped before a backend response is relayed

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::security::headers::relay_headers;

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");
pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self { status, headers, body }
    }

    /// A gateway-generated response with a `text/plain` body.
    pub fn plain_text(status: StatusCode, message: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self::new(status, headers, Bytes::from_static(message.as_bytes()))
    }

    /// Copy of this backend response that is safe to relay to the caller.
    pub fn relayed(&self) -> Self {
        Self::new(self.status, relay_headers(&self.headers), self.body.clone())
    }

    /// Set a header from any displayable value, replacing previous values.
    pub fn set_header(&mut self, name: HeaderName, value: impl std::fmt::Display) {
        if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
            self.headers.insert(name, value);
        }
    }

    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
