//! System endpoints: health check and realtime stats.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Realtime statistics response.
#[derive(Debug, Serialize, ToSchema)]
struct StatsResponse {
    /// Number of distinct users with at least one live session.
    online_users: usize,
    /// Number of WebSocket connections subscribed to the hub.
    hub_receivers: usize,
}

/// `GET /stats` — Realtime gateway statistics.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "System",
    summary = "Realtime statistics",
    description = "Returns the number of online users and live hub subscriptions.",
    responses(
        (status = 200, description = "Current gateway statistics", body = StatsResponse),
    )
)]
pub async fn stats_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(StatsResponse {
            online_users: state.presence.online_count().await,
            hub_receivers: state.hub.receiver_count(),
        }),
    )
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
}
