//! Outbound transport.
//!
//! # Data Flow
//! ```text
//! Orchestrator attempt
//!     → Transport::send(method, full_url, headers, body)
//!     → ProxyResponse (any status) | TransportError
//!
//! Health sweep
//!     → HealthProbe::probe(url + health path)
//!     → Ok (2xx) | TransportError
//! ```
//!
//! # Design Decisions
//! - Traits at the seam so the pipeline can be driven by fakes in tests
//! - `send` reports every status as Ok; classifying non-2xx is the caller's job

pub mod client;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method};

use crate::error::TransportError;
use crate::http::response::ProxyResponse;

pub use client::HyperTransport;

/// Issues one HTTP request and buffers the response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<ProxyResponse, TransportError>;
}

/// Checks whether a backend's health endpoint answers.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<(), TransportError>;
}
