//! WebSocket message types: envelope, intents, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{LiveEvent, UserId};
use crate::error::RealtimeError;

/// Top-level WebSocket message envelope.
///
/// Both directions use the same shape. The payload of an `intent`
/// frame decodes to a [`ClientIntent`]; the payload of an `event`
/// frame decodes to a [`LiveEvent`]; `ack` and `error` payloads are
/// frame-specific JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFrame {
    /// Client-provided ID for intents; server-generated for events.
    pub id: String,
    /// Frame type discriminator.
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WireFrame {
    /// Wraps a client intent in an outbound frame with a fresh id.
    #[must_use]
    pub fn intent(intent: &ClientIntent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            frame_type: FrameType::Intent,
            timestamp: Utc::now(),
            payload: serde_json::to_value(intent).unwrap_or_default(),
        }
    }

    /// Wraps a live event in a server-originated frame.
    #[must_use]
    pub fn event(event: &LiveEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            frame_type: FrameType::Event,
            timestamp: Utc::now(),
            payload: serde_json::to_value(event).unwrap_or_default(),
        }
    }

    /// Builds an acknowledgement for the intent frame with `request_id`.
    #[must_use]
    pub fn ack(request_id: String, payload: serde_json::Value) -> Self {
        Self {
            id: request_id,
            frame_type: FrameType::Ack,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error frame answering the intent frame with
    /// `request_id`, carrying the error's numeric code and message.
    #[must_use]
    pub fn error(request_id: String, error: &RealtimeError) -> Self {
        Self {
            id: request_id,
            frame_type: FrameType::Error,
            timestamp: Utc::now(),
            payload: serde_json::json!({
                "code": error.error_code(),
                "message": error.to_string(),
            }),
        }
    }
}

/// Discriminator for WebSocket frame types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    /// Client → Server action.
    Intent,
    /// Server → Client acknowledgement of an intent.
    Ack,
    /// Server → Client real-time event.
    Event,
    /// Server → Client error.
    Error,
}

/// Client-originated actions carried inside `intent` frames.
///
/// Tagged with the same wire names as the matching [`LiveEvent`]
/// variants, so `chat-message` means the same thing in both
/// directions. Fire-and-forget from the sender's perspective: any
/// confirmation arrives as a later `ack` or `event` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientIntent {
    /// Subscribe this connection to a user's personal notification
    /// room. Sent automatically after every successful connect.
    JoinUser {
        /// Room owner; must match the authenticated session user.
        user_id: UserId,
    },

    /// Send a direct message. The server assigns id, sender, and
    /// timestamp before fanning the message out.
    ChatMessage {
        /// Receiving user.
        to: UserId,
        /// Message body.
        text: String,
    },

    /// Signal transient typing state to a chat peer.
    Typing {
        /// User being typed at.
        to: UserId,
        /// Whether the sender is currently typing.
        is_typing: bool,
    },

    /// Like a story.
    StoryLiked {
        /// Story being liked.
        story_id: String,
    },

    /// Remove a like from a story.
    StoryUnliked {
        /// Story being unliked.
        story_id: String,
    },
}
