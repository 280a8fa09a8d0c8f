//! Client session layer: connection management and event routing.
//!
//! Everything a consumer application needs to stay live-updated:
//! construct one [`SubscriptionRouter`] and one [`ConnectionManager`]
//! at startup, share both with every UI surface, subscribe per-surface
//! on mount, and unsubscribe on teardown. The manager keeps the single
//! gateway connection alive across drops with capped exponential
//! backoff; the router fans each inbound event out to whoever is
//! subscribed at dispatch time.

pub mod backoff;
pub mod manager;
pub mod router;
pub mod state;
pub mod transport;

pub use backoff::{Backoff, BackoffPolicy};
pub use manager::{ClientConfig, ConnectionManager, WsConnectionManager};
pub use router::{Subscription, SubscriptionRouter};
pub use state::ConnectionState;
pub use transport::{Transport, TransportLink, WsTransport};
