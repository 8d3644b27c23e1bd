use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct BackendStatus {
    pub url: String,
    pub healthy: bool,
    pub circuit_state: &'static str,
    pub consecutive_failures: u32,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

/// Every configured backend, in configured order.
pub async fn get_backends(State(state): State<AppState>) -> Json<Vec<BackendStatus>> {
    let registry = state.dispatcher.registry();
    let breaker = state.dispatcher.breaker();
    let snapshot = registry.snapshot();

    let statuses = registry
        .backends()
        .iter()
        .map(|url| BackendStatus {
            url: url.clone(),
            healthy: snapshot.contains(url),
            circuit_state: breaker.get_state(url).as_str(),
            consecutive_failures: breaker.failure_count(url),
        })
        .collect();

    Json(statuses)
}

pub async fn get_cache(State(state): State<AppState>) -> Json<serde_json::Value> {
    let entries = state.dispatcher.cache().map(|cache| cache.len());
    Json(serde_json::json!({
        "enabled": entries.is_some(),
        "entries": entries.unwrap_or(0),
    }))
}

pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    if let Some(cache) = state.dispatcher.cache() {
        cache.clear();
    }
    StatusCode::NO_CONTENT
}
