//! Domain events pushed to connected clients in real time.
//!
//! Every [`LiveEvent`] travels through the [`super::EventHub`] wrapped
//! in an [`super::Envelope`] and reaches each admitted WebSocket
//! connection as an `event` wire frame. The serde tag names are the
//! wire contract: consumers match on them and ignore kinds they do not
//! recognize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Named category of real-time notification.
///
/// One value per [`LiveEvent`] variant; [`EventKind::as_str`] returns
/// the stable wire name used as the serde tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A direct message sent or received.
    ChatMessage,
    /// Transient typing-indicator state.
    Typing,
    /// A new ephemeral story was published.
    NewStory,
    /// An existing story was edited.
    StoryUpdated,
    /// A story was deleted or expired.
    StoryDeleted,
    /// A story gained a like.
    StoryLiked,
    /// A story lost a like.
    StoryUnliked,
    /// An article's like counter changed server-side.
    ArticleLikeUpdated,
    /// An article's comment thread changed server-side.
    ArticleCommentUpdated,
    /// A feed post's like counter changed server-side.
    PostLikeUpdated,
    /// A feed post's comment counter changed server-side.
    PostCommentUpdated,
}

impl EventKind {
    /// Every event kind, in wire-contract order.
    pub const ALL: [Self; 11] = [
        Self::ChatMessage,
        Self::Typing,
        Self::NewStory,
        Self::StoryUpdated,
        Self::StoryDeleted,
        Self::StoryLiked,
        Self::StoryUnliked,
        Self::ArticleLikeUpdated,
        Self::ArticleCommentUpdated,
        Self::PostLikeUpdated,
        Self::PostCommentUpdated,
    ];

    /// Returns the stable wire name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ChatMessage => "chat-message",
            Self::Typing => "typing",
            Self::NewStory => "new-story",
            Self::StoryUpdated => "story-updated",
            Self::StoryDeleted => "story-deleted",
            Self::StoryLiked => "story-liked",
            Self::StoryUnliked => "story-unliked",
            Self::ArticleLikeUpdated => "article-like-updated",
            Self::ArticleCommentUpdated => "article-comment-updated",
            Self::PostLikeUpdated => "post-like-updated",
            Self::PostCommentUpdated => "post-comment-updated",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compact story representation carried by story lifecycle events.
///
/// The full story (media, viewers, reactions) lives behind the REST
/// API; events carry just enough for a consumer to update or refetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySummary {
    /// Opaque story identifier.
    pub id: String,
    /// Author of the story.
    pub author: UserId,
    /// Optional caption text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Publication timestamp.
    pub created_at: DateTime<Utc>,
}

/// Real-time notification pushed by the gateway.
///
/// Content identifiers (story, article, post) are opaque strings owned
/// by the REST layer; user identity is typed. The serde tag is the
/// wire event name from the contract table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum LiveEvent {
    /// A direct message between two users.
    ChatMessage {
        /// Server-assigned message id, unique per message.
        id: String,
        /// Sending user.
        from: UserId,
        /// Receiving user.
        to: UserId,
        /// Message body.
        text: String,
        /// Server-side send timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Transient typing-indicator state. Not persisted anywhere.
    Typing {
        /// User whose typing state changed.
        from: UserId,
        /// User being typed at.
        to: UserId,
        /// Whether `from` is currently typing.
        is_typing: bool,
    },

    /// A new story was published.
    NewStory {
        /// Summary of the published story.
        story: StorySummary,
    },

    /// An existing story was edited.
    StoryUpdated {
        /// Summary of the story after the edit.
        story: StorySummary,
    },

    /// A story was deleted or expired.
    StoryDeleted {
        /// Identifier of the removed story.
        story_id: String,
    },

    /// A user liked a story.
    StoryLiked {
        /// Story that was liked.
        story_id: String,
        /// User who liked it.
        by: UserId,
    },

    /// A user removed their like from a story.
    StoryUnliked {
        /// Story that was unliked.
        story_id: String,
        /// User who removed the like.
        by: UserId,
    },

    /// An article's like counter changed.
    ArticleLikeUpdated {
        /// Article whose counter changed.
        article_id: String,
        /// New aggregate like count.
        like_count: u64,
    },

    /// An article's comment thread changed.
    ArticleCommentUpdated {
        /// Article whose comments changed.
        article_id: String,
        /// New aggregate comment count.
        comment_count: u64,
    },

    /// A feed post's like counter changed.
    PostLikeUpdated {
        /// Post whose counter changed.
        post_id: String,
        /// New aggregate like count.
        like_count: u64,
    },

    /// A feed post's comment counter changed.
    PostCommentUpdated {
        /// Post whose comments changed.
        post_id: String,
        /// New aggregate comment count.
        comment_count: u64,
    },
}

impl LiveEvent {
    /// Returns the kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ChatMessage { .. } => EventKind::ChatMessage,
            Self::Typing { .. } => EventKind::Typing,
            Self::NewStory { .. } => EventKind::NewStory,
            Self::StoryUpdated { .. } => EventKind::StoryUpdated,
            Self::StoryDeleted { .. } => EventKind::StoryDeleted,
            Self::StoryLiked { .. } => EventKind::StoryLiked,
            Self::StoryUnliked { .. } => EventKind::StoryUnliked,
            Self::ArticleLikeUpdated { .. } => EventKind::ArticleLikeUpdated,
            Self::ArticleCommentUpdated { .. } => EventKind::ArticleCommentUpdated,
            Self::PostLikeUpdated { .. } => EventKind::PostLikeUpdated,
            Self::PostCommentUpdated { .. } => EventKind::PostCommentUpdated,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn serde_tag_matches_kind_wire_name() {
        let events = [
            LiveEvent::Typing {
                from: UserId::new(),
                to: UserId::new(),
                is_typing: true,
            },
            LiveEvent::StoryDeleted {
                story_id: "s-1".to_string(),
            },
            LiveEvent::ArticleLikeUpdated {
                article_id: "a-1".to_string(),
                like_count: 7,
            },
            LiveEvent::PostCommentUpdated {
                post_id: "p-1".to_string(),
                comment_count: 3,
            },
        ];
        for event in events {
            let json = serde_json::to_string(&event).unwrap_or_default();
            let expected = format!("\"event\":\"{}\"", event.kind());
            assert!(json.contains(&expected), "{json} missing {expected}");
        }
    }

    #[test]
    fn chat_message_round_trip() {
        let event = LiveEvent::ChatMessage {
            id: "m-42".to_string(),
            from: UserId::new(),
            to: UserId::new(),
            text: "hello".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        let parsed: Option<LiveEvent> = serde_json::from_str(&json).ok();
        assert_eq!(parsed, Some(event));
    }

    #[test]
    fn unknown_event_tag_fails_to_parse() {
        let json = r#"{"event":"club-renamed","club_id":"c-1"}"#;
        let parsed: Result<LiveEvent, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn story_caption_is_optional_on_the_wire() {
        let json = format!(
            r#"{{"event":"new-story","story":{{"id":"s-9","author":"{}","created_at":"2026-08-01T00:00:00Z"}}}}"#,
            UserId::new()
        );
        let parsed: Option<LiveEvent> = serde_json::from_str(&json).ok();
        let Some(LiveEvent::NewStory { story }) = parsed else {
            panic!("expected new-story event");
        };
        assert_eq!(story.caption, None);
    }

    #[test]
    fn all_kinds_are_distinct_wire_names() {
        let mut names: Vec<&str> = EventKind::ALL.iter().map(EventKind::as_str).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EventKind::ALL.len());
    }
}
