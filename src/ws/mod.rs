//! WebSocket layer: connection handling, wire frames, room membership.
//!
//! The WebSocket endpoint at `/ws` provides bidirectional communication
//! for real-time event delivery and client intents.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod rooms;
