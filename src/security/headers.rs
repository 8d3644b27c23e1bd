//! Header manipulation.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Set X-Forwarded-For on requests sent to backends
//! - Drop framing headers that are recomputed for the relayed body
//!
//! # Design Decisions
//! - Explicit denylist checked per header name, nothing reflective
//! - Never trust an inbound X-Forwarded-For; it is replaced with the peer address

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Connection-scoped headers that must not be relayed by a proxy.
pub const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::TRANSFER_ENCODING,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
];

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Headers to relay from a backend response to the caller.
pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    filter(upstream, |name| !is_hop_by_hop(name) && name != header::CONTENT_LENGTH)
}

/// Headers to send to a backend for an inbound request from `client_ip`.
pub fn forward_headers(inbound: &HeaderMap, client_ip: &str) -> HeaderMap {
    let mut headers = filter(inbound, |name| {
        !is_hop_by_hop(name)
            && name != header::HOST
            && name != header::CONTENT_LENGTH
            && name != X_FORWARDED_FOR
    });
    if let Ok(value) = HeaderValue::from_str(client_ip) {
        headers.insert(X_FORWARDED_FOR, value);
    }
    headers
}

fn filter(source: &HeaderMap, keep: impl Fn(&HeaderName) -> bool) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(source.len());
    for (name, value) in source.iter() {
        if keep(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}
