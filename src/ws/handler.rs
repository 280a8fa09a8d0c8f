//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::Credential;
use crate::error::RealtimeError;

/// Authentication query parameters for the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    /// Session token issued at login.
    pub token: Option<String>,
    /// User identity the session belongs to.
    pub user_id: Option<uuid::Uuid>,
}

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// Rejects with `401` before upgrading when the credential is missing
/// or blank.
///
/// # Errors
///
/// Returns [`RealtimeError::InvalidCredential`] when `token` or
/// `user_id` is absent or the token is blank.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsAuthParams>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, RealtimeError> {
    let credential = Credential::from_parts(params.token, params.user_id)?;
    let user_id = credential.user_id();

    let event_rx = state.hub.subscribe();
    let relay = Arc::clone(&state.relay);
    let presence = Arc::clone(&state.presence);

    Ok(ws.on_upgrade(move |socket| run_connection(socket, event_rx, relay, presence, user_id)))
}
