//! Connection lifecycle states.

use serde::Serialize;

/// Lifecycle state of the realtime connection.
///
/// Transitions: `Disconnected → Connecting → Connected`, back to
/// `Disconnected` on transport drop, and `Disconnected → Connecting`
/// again on each automatic retry until
/// [`disconnect`](super::ConnectionManager::disconnect) is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No transport is live and no attempt is in flight.
    Disconnected,
    /// A connection attempt is in flight. `send()` still fails with
    /// `NotConnected` in this state.
    Connecting,
    /// The transport is live and the personal room has been joined.
    Connected,
}

impl ConnectionState {
    /// Returns the lowercase wire/name form of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
