//! REST API layer: system endpoints and router composition.
//!
//! The gateway exposes no domain REST resources (feed, articles, and
//! chat history live behind the main platform API); only operational
//! endpoints are served here.

pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Builds the API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    system::routes()
}
