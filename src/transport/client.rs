//! Hyper-based outbound client.

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::Duration;
use tokio::time;

use crate::config::{LimitsConfig, TimeoutConfig};
use crate::error::TransportError;
use crate::http::response::ProxyResponse;
use crate::transport::{HealthProbe, Transport};

/// Pooled HTTP/1.1 client with connect and whole-call deadlines.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
    request_timeout: Duration,
    max_body_bytes: usize,
}

impl HyperTransport {
    pub fn new(connect_timeout: Duration, request_timeout: Duration, max_body_bytes: usize) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            request_timeout,
            max_body_bytes,
        }
    }

    pub fn from_config(timeouts: &TimeoutConfig, limits: &LimitsConfig) -> Self {
        Self::new(timeouts.connect(), timeouts.request(), limits.max_body_bytes)
    }

    async fn execute(&self, request: Request<Body>) -> Result<ProxyResponse, TransportError> {
        let call = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;

            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(Body::new(body), self.max_body_bytes)
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?;

            Ok::<_, TransportError>(ProxyResponse::new(parts.status, parts.headers, body))
        };

        match time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.request_timeout)),
        }
    }
}

fn build_request(
    method: Method,
    url: &str,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Request<Body>, TransportError> {
    let uri: Uri = url
        .parse()
        .map_err(|e| TransportError::InvalidRequest(format!("{url}: {e}")))?;

    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(target) = builder.headers_mut() {
        target.extend(headers);
    }

    builder
        .body(Body::from(body))
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<ProxyResponse, TransportError> {
        let request = build_request(method, url, headers, body)?;
        self.execute(request).await
    }
}

#[async_trait]
impl HealthProbe for HyperTransport {
    async fn probe(&self, url: &str) -> Result<(), TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("failover-gateway-health-check"));

        let request = build_request(Method::GET, url, headers, Bytes::new())?;
        let response = self.execute(request).await?;

        if response.status.is_success() {
            Ok(())
        } else {
            Err(TransportError::UnexpectedStatus(response.status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_copies_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("abc"));

        let request = build_request(
            Method::POST,
            "http://127.0.0.1:9001/items",
            headers,
            Bytes::from_static(b"{}"),
        )
        .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri().path(), "/items");
        assert_eq!(request.headers()["x-request-id"], "abc");
    }

    #[test]
    fn test_build_request_rejects_bad_url() {
        let err = build_request(Method::GET, "http://bad host/", HeaderMap::new(), Bytes::new())
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HyperTransport::new(Duration::from_millis(500), Duration::from_secs(2), 1024);
        let err = transport.probe(&format!("http://{addr}/health")).await.unwrap_err();
        assert!(matches!(err, TransportError::Connect(_)));
    }
}
