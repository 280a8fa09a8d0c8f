//! Domain layer: identity, credentials, events, and the fan-out hub.
//!
//! This module contains the shared domain model: typed user identity,
//! the session credential, the real-time event contract, the broadcast
//! hub that fans events out to WebSocket connections, and online
//! presence bookkeeping.

pub mod credential;
pub mod event_hub;
pub mod live_event;
pub mod presence;
pub mod user_id;

pub use credential::Credential;
pub use event_hub::{Audience, Envelope, EventHub};
pub use live_event::{EventKind, LiveEvent, StorySummary};
pub use presence::PresenceRegistry;
pub use user_id::UserId;
