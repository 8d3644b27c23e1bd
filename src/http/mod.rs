//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, /proxy and /admin routes)
//!     → request.rs (request ID, ProxyRequest model)
//!     → dispatch pipeline
//!     → response.rs (buffered ProxyResponse, relay, gateway replies)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{GatewayRequestId, ProxyRequest, X_REQUEST_ID};
pub use response::ProxyResponse;
pub use server::{AppState, GatewayServer};
