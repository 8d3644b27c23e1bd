//! Error types for the dispatch pipeline.

use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single outbound call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established or was dropped.
    #[error("connection error: {0}")]
    Connect(String),

    /// The call did not complete within the request deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The outbound request could not be built (bad URL or header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response body could not be read or exceeded the size limit.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The backend answered, but not with a 2xx status.
    #[error("unexpected status {0}")]
    UnexpectedStatus(StatusCode),
}

/// Outcomes of the dispatch pipeline that are not a relayed backend response.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The healthy snapshot is empty; the load balancer has nothing to select.
    #[error("no available backends")]
    NoAvailableBackends,

    /// One attempt against one backend failed. Absorbed by the retry loop.
    #[error("transport failure on {url}: {source}")]
    TransportFailure {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The client ran out of tokens. Never touches a backend.
    #[error("rate limit exceeded for client {client}")]
    RateLimitExceeded { client: String, retry_after_secs: u64 },

    /// Every candidate was tried or skipped without a successful response.
    #[error("all backends exhausted after {attempts} attempts")]
    AllBackendsExhausted { attempts: usize },
}

impl DispatchError {
    /// HTTP status surfaced to the inbound caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            DispatchError::TransportFailure { .. } => StatusCode::BAD_GATEWAY,
            DispatchError::NoAvailableBackends | DispatchError::AllBackendsExhausted { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(DispatchError::NoAvailableBackends.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            DispatchError::AllBackendsExhausted { attempts: 2 }.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            DispatchError::RateLimitExceeded { client: "1.2.3.4".into(), retry_after_secs: 1 }
                .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_transport_failure_display_includes_source() {
        let err = DispatchError::TransportFailure {
            url: "http://a".into(),
            source: TransportError::UnexpectedStatus(StatusCode::INTERNAL_SERVER_ERROR),
        };
        assert_eq!(
            err.to_string(),
            "transport failure on http://a: unexpected status 500 Internal Server Error"
        );
    }
}
