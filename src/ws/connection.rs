//! WebSocket connection loop.
//!
//! Handles the read/write loop for a single authenticated WebSocket
//! connection: decodes inbound intent frames, relays them through the
//! [`RelayService`], and forwards hub envelopes admitted by the
//! connection's [`RoomSet`].

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{ClientIntent, WireFrame};
use super::rooms::RoomSet;
use crate::domain::{Envelope, PresenceRegistry, UserId};
use crate::error::RealtimeError;
use crate::service::RelayService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads intent frames from the client and relays them.
/// - Forwards admitted envelopes from the [`broadcast::Receiver`] to
///   the client.
/// - Keeps the presence registry in sync with the session lifetime.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<Envelope>,
    relay: Arc<RelayService>,
    presence: Arc<PresenceRegistry>,
    user_id: UserId,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut rooms = RoomSet::new();
    let sessions = presence.mark_online(user_id).await;
    tracing::debug!(%user_id, sessions, "ws session opened");

    loop {
        tokio::select! {
            // Incoming frame from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_frame(&text, user_id, &mut rooms, &relay);
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Envelope from EventHub
            envelope = event_rx.recv() => {
                match envelope {
                    Ok(envelope) => {
                        if rooms.admits(&envelope.audience) {
                            let frame = WireFrame::event(&envelope.event);
                            let json = serde_json::to_string(&frame).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(%user_id, lagged = n, "ws client lagged behind event hub");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    let sessions = presence.mark_offline(user_id).await;
    tracing::debug!(%user_id, sessions, "ws session closed");
}

/// Handles a text frame from the client, returning an optional JSON
/// response frame.
fn handle_text_frame(
    text: &str,
    user_id: UserId,
    rooms: &mut RoomSet,
    relay: &RelayService,
) -> Option<String> {
    let Ok(frame) = serde_json::from_str::<WireFrame>(text) else {
        let err = RealtimeError::MalformedFrame("undecodable frame envelope".to_string());
        return to_json(WireFrame::error(String::new(), &err));
    };

    let intent = match serde_json::from_value::<ClientIntent>(frame.payload) {
        Ok(intent) => intent,
        Err(error) => {
            let err = RealtimeError::MalformedFrame(format!("unrecognized intent: {error}"));
            return to_json(WireFrame::error(frame.id, &err));
        }
    };

    match intent {
        ClientIntent::JoinUser { user_id: requested } => {
            if requested != user_id {
                let err = RealtimeError::InvalidIntent(format!(
                    "cannot join room of user {requested}"
                ));
                return to_json(WireFrame::error(frame.id, &err));
            }
            rooms.join(requested);
            to_json(WireFrame::ack(
                frame.id,
                serde_json::json!({
                    "joined": requested,
                    "rooms": rooms.len(),
                }),
            ))
        }
        ClientIntent::ChatMessage { to, text } => {
            match relay.relay_chat(user_id, to, &text) {
                Ok(event) => to_json(WireFrame::ack(
                    frame.id,
                    serde_json::to_value(&event).unwrap_or_default(),
                )),
                Err(err) => to_json(WireFrame::error(frame.id, &err)),
            }
        }
        ClientIntent::Typing { to, is_typing } => {
            // Transient state, no acknowledgement.
            relay.relay_typing(user_id, to, is_typing);
            None
        }
        ClientIntent::StoryLiked { story_id } => {
            match relay.relay_story_reaction(&story_id, user_id, true) {
                Ok(()) => None,
                Err(err) => to_json(WireFrame::error(frame.id, &err)),
            }
        }
        ClientIntent::StoryUnliked { story_id } => {
            match relay.relay_story_reaction(&story_id, user_id, false) {
                Ok(()) => None,
                Err(err) => to_json(WireFrame::error(frame.id, &err)),
            }
        }
    }
}

fn to_json(frame: WireFrame) -> Option<String> {
    serde_json::to_string(&frame).ok()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::EventHub;
    use crate::ws::messages::FrameType;

    fn relay() -> RelayService {
        RelayService::new(EventHub::new(64))
    }

    fn intent_json(intent: &ClientIntent) -> String {
        serde_json::to_string(&WireFrame::intent(intent)).unwrap_or_default()
    }

    fn parse(response: Option<String>) -> WireFrame {
        let Some(json) = response else {
            panic!("expected a response frame");
        };
        let Ok(frame) = serde_json::from_str::<WireFrame>(&json) else {
            panic!("response frame failed to parse");
        };
        frame
    }

    #[test]
    fn malformed_json_yields_error_frame() {
        let mut rooms = RoomSet::new();
        let frame = parse(handle_text_frame("{not json", UserId::new(), &mut rooms, &relay()));
        assert_eq!(frame.frame_type, FrameType::Error);
        assert_eq!(frame.payload.get("code").and_then(|v| v.as_u64()), Some(1002));
    }

    #[test]
    fn join_own_room_is_acknowledged() {
        let user = UserId::new();
        let mut rooms = RoomSet::new();
        let json = intent_json(&ClientIntent::JoinUser { user_id: user });

        let frame = parse(handle_text_frame(&json, user, &mut rooms, &relay()));
        assert_eq!(frame.frame_type, FrameType::Ack);
        assert_eq!(rooms.len(), 1);
        assert!(rooms.admits(&crate::domain::Audience::User(user)));
    }

    #[test]
    fn foreign_join_is_refused() {
        let mut rooms = RoomSet::new();
        let json = intent_json(&ClientIntent::JoinUser {
            user_id: UserId::new(),
        });

        let frame = parse(handle_text_frame(&json, UserId::new(), &mut rooms, &relay()));
        assert_eq!(frame.frame_type, FrameType::Error);
        assert_eq!(frame.payload.get("code").and_then(|v| v.as_u64()), Some(1003));
        assert!(rooms.is_empty());
    }

    #[test]
    fn chat_ack_carries_enriched_event() {
        let user = UserId::new();
        let mut rooms = RoomSet::new();
        let json = intent_json(&ClientIntent::ChatMessage {
            to: UserId::new(),
            text: "hi there".to_string(),
        });

        let frame = parse(handle_text_frame(&json, user, &mut rooms, &relay()));
        assert_eq!(frame.frame_type, FrameType::Ack);
        let Ok(event) = serde_json::from_value::<crate::domain::LiveEvent>(frame.payload) else {
            panic!("ack payload is not a live event");
        };
        let crate::domain::LiveEvent::ChatMessage { from, text, .. } = event else {
            panic!("expected chat-message event");
        };
        assert_eq!(from, user);
        assert_eq!(text, "hi there");
    }

    #[test]
    fn empty_chat_yields_error_frame() {
        let mut rooms = RoomSet::new();
        let json = intent_json(&ClientIntent::ChatMessage {
            to: UserId::new(),
            text: String::new(),
        });

        let frame = parse(handle_text_frame(&json, UserId::new(), &mut rooms, &relay()));
        assert_eq!(frame.frame_type, FrameType::Error);
        assert_eq!(frame.payload.get("code").and_then(|v| v.as_u64()), Some(1003));
    }

    #[test]
    fn typing_produces_no_response() {
        let mut rooms = RoomSet::new();
        let json = intent_json(&ClientIntent::Typing {
            to: UserId::new(),
            is_typing: true,
        });
        let response = handle_text_frame(&json, UserId::new(), &mut rooms, &relay());
        assert!(response.is_none());
    }
}
