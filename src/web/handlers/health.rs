//! Health check HTTP handler

use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use serde::Serialize;

use crate::web::{AppState, responses::ok};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: i64,
    pub remote_configured: bool,
    pub catalog_initialized: bool,
    pub is_syncing: bool,
    pub images_cached: usize,
}

/// Basic liveness plus a few catalog and cache indicators
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.catalog.snapshot().await;

    ok(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: (Utc::now() - state.start_time).num_seconds(),
        remote_configured: state.catalog.repository().is_configured(),
        catalog_initialized: snapshot.is_initialized,
        is_syncing: snapshot.is_syncing,
        images_cached: state.images.len(),
    })
}
