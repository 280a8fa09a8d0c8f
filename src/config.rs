//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment
//! variables (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Capacity of the EventHub broadcast channel.
    pub hub_capacity: usize,

    /// Upper bound on chat message bytes accepted by the relay.
    pub max_chat_bytes: usize,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed
    /// as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let hub_capacity = parse_env("EVENT_HUB_CAPACITY", 4096);
        let max_chat_bytes = parse_env("MAX_CHAT_BYTES", 4096);

        Ok(Self {
            listen_addr,
            hub_capacity,
            max_chat_bytes,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on
/// missing or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_on_missing() {
        assert_eq!(parse_env("BEACON_TEST_UNSET_KEY", 42_usize), 42);
    }
}
