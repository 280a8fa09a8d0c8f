//! beacon-gateway server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket and system endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use beacon_gateway::api;
use beacon_gateway::app_state::AppState;
use beacon_gateway::config::GatewayConfig;
use beacon_gateway::domain::{EventHub, PresenceRegistry};
use beacon_gateway::service::RelayService;
use beacon_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    tracing::info!(addr = %config.listen_addr, "starting beacon-gateway");

    // Build domain layer
    let hub = EventHub::new(config.hub_capacity);
    let presence = Arc::new(PresenceRegistry::new());

    // Build service layer
    let relay = Arc::new(RelayService::new(hub.clone()).with_max_chat_bytes(config.max_chat_bytes));

    // Build application state
    let app_state = AppState {
        relay,
        hub,
        presence,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
