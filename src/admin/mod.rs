//! Admin endpoints for inspecting and operating the gateway.
//!
//! All routes are unauthenticated; bind the gateway to a trusted network.

pub mod handlers;

use axum::{routing::get, Router};

use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/backends", get(get_backends))
        .route("/admin/cache", get(get_cache).delete(clear_cache))
}
