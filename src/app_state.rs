//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::{EventHub, PresenceRegistry};
use crate::service::RelayService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relay service for intent validation and event publication.
    pub relay: Arc<RelayService>,
    /// Event hub for WebSocket fan-out.
    pub hub: EventHub,
    /// Online presence bookkeeping.
    pub presence: Arc<PresenceRegistry>,
}
