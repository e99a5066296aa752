//! Health, capability, metrics and plugin status handlers.

use axum::Json;
use axum::extract::State;

use docserve_plugin::PluginInfo;
use plugin_pandoc::MetricsSnapshot;

use crate::dto::{ApiResponse, FormatsResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/formats
pub async fn formats(State(state): State<AppState>) -> Json<ApiResponse<FormatsResponse>> {
    let capabilities = state.renderer.capabilities();
    Json(ApiResponse::ok(FormatsResponse {
        available: capabilities.available,
        version: capabilities.version.clone(),
        formats: capabilities.catalog(),
    }))
}

/// GET /api/metrics
pub async fn metrics(State(state): State<AppState>) -> Json<ApiResponse<MetricsSnapshot>> {
    Json(ApiResponse::ok(state.renderer.metrics().snapshot()))
}

/// GET /api/plugins
pub async fn plugins(State(state): State<AppState>) -> Json<ApiResponse<Vec<PluginInfo>>> {
    Json(ApiResponse::ok(state.plugins.list_plugins().await))
}
