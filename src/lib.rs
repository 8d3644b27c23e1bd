//! Failover Gateway
//!
//! A reverse-proxy gateway that spreads requests over a pool of backends
//! and keeps serving while some of them fail.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http::server (/proxy) ──▶ dispatch::Dispatcher
//!                                          │
//!            ┌─────────────────────────────┼──────────────────────────────┐
//!            ▼                 ▼           ▼              ▼               ▼
//!    security::RateLimiter  cache::   load_balancer::  resilience::   transport::
//!                           Response  RoundRobin       CircuitBreaker Transport ──▶ Backend
//!                           Cache          │                ▲              │
//!                                          ▼                └── outcome ───┤
//!                                   health::HealthRegistry ◀── mark_unhealthy
//!                                          ▲
//!                                   health::HealthMonitor (periodic sweep)
//! ```

// Core pipeline
pub mod cache;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod load_balancer;
pub mod resilience;
pub mod security;
pub mod transport;

// Surfaces
pub mod admin;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use dispatch::Dispatcher;
pub use error::{DispatchError, TransportError};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
