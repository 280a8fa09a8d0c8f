//! Relay service: validates client intents and publishes events.

use chrono::Utc;

use crate::domain::{Envelope, EventHub, LiveEvent, UserId};
use crate::error::RealtimeError;

/// Default upper bound on chat message bytes.
pub const DEFAULT_MAX_CHAT_BYTES: usize = 4096;

/// Orchestration layer between inbound intents and the [`EventHub`].
///
/// Stateless coordinator: every relay method follows the pattern
/// validate → enrich → publish → return the enriched event. The REST
/// layer uses [`RelayService::broadcast`] to announce story lifecycle
/// and counter changes; the WebSocket layer uses the typed relay
/// methods for client intents.
#[derive(Debug, Clone)]
pub struct RelayService {
    hub: EventHub,
    max_chat_bytes: usize,
}

impl RelayService {
    /// Creates a new `RelayService` publishing into `hub`.
    #[must_use]
    pub fn new(hub: EventHub) -> Self {
        Self {
            hub,
            max_chat_bytes: DEFAULT_MAX_CHAT_BYTES,
        }
    }

    /// Overrides the chat message size limit.
    #[must_use]
    pub fn with_max_chat_bytes(mut self, max_chat_bytes: usize) -> Self {
        self.max_chat_bytes = max_chat_bytes;
        self
    }

    /// Returns a reference to the inner [`EventHub`].
    #[must_use]
    pub const fn hub(&self) -> &EventHub {
        &self.hub
    }

    /// Relays a direct chat message from `from` to `to`.
    ///
    /// The message is enriched with a fresh id and server timestamp,
    /// then published to both participants' rooms (once when the
    /// sender messages themselves). Returns the enriched event so the
    /// caller can acknowledge with it.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::InvalidIntent`] if the text is empty,
    /// whitespace-only, or exceeds the size limit.
    pub fn relay_chat(
        &self,
        from: UserId,
        to: UserId,
        text: &str,
    ) -> Result<LiveEvent, RealtimeError> {
        if text.trim().is_empty() {
            return Err(RealtimeError::InvalidIntent(
                "empty chat text".to_string(),
            ));
        }
        if text.len() > self.max_chat_bytes {
            return Err(RealtimeError::InvalidIntent(format!(
                "chat text exceeds {} bytes",
                self.max_chat_bytes
            )));
        }

        let event = LiveEvent::ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            from,
            to,
            text: text.to_string(),
            timestamp: Utc::now(),
        };

        self.hub.publish(Envelope::to_user(to, event.clone()));
        if from != to {
            self.hub.publish(Envelope::to_user(from, event.clone()));
        }
        tracing::debug!(%from, %to, "chat message relayed");
        Ok(event)
    }

    /// Relays a typing indicator to the recipient's room.
    ///
    /// Transient and fire-and-forget: no validation beyond identity,
    /// no acknowledgement. Returns the number of receivers reached.
    pub fn relay_typing(&self, from: UserId, to: UserId, is_typing: bool) -> usize {
        let event = LiveEvent::Typing { from, to, is_typing };
        self.hub.publish(Envelope::to_user(to, event))
    }

    /// Relays a story like/unlike toggle to every connected session.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::InvalidIntent`] if the story id is
    /// empty.
    pub fn relay_story_reaction(
        &self,
        story_id: &str,
        by: UserId,
        liked: bool,
    ) -> Result<(), RealtimeError> {
        if story_id.is_empty() {
            return Err(RealtimeError::InvalidIntent(
                "empty story id".to_string(),
            ));
        }
        let event = if liked {
            LiveEvent::StoryLiked {
                story_id: story_id.to_string(),
                by,
            }
        } else {
            LiveEvent::StoryUnliked {
                story_id: story_id.to_string(),
                by,
            }
        };
        self.hub.publish(Envelope::broadcast(event));
        Ok(())
    }

    /// Publishes a server-originated event to every connected session.
    ///
    /// This is the seam the REST layer calls after a successful
    /// mutation: story lifecycle, article and post counter updates.
    /// Returns the number of receivers reached.
    pub fn broadcast(&self, event: LiveEvent) -> usize {
        let kind = event.kind();
        let reached = self.hub.publish(Envelope::broadcast(event));
        tracing::debug!(%kind, reached, "event broadcast");
        reached
    }
}
