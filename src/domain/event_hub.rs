//! Broadcast channel for real-time events.
//!
//! [`EventHub`] wraps a [`tokio::sync::broadcast`] channel. Every
//! intent relay and REST-side announcement publishes an [`Envelope`]
//! through the hub, and all WebSocket connections subscribe to receive
//! audience-filtered events.

use tokio::sync::broadcast;

use super::{LiveEvent, UserId};

/// Delivery scope for a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every connected session receives the event.
    Everyone,
    /// Only sessions that joined this user's personal room receive it.
    User(UserId),
}

impl Audience {
    /// Returns `true` if a session subscribed to `user`'s room should
    /// receive an event with this audience.
    #[must_use]
    pub fn includes(&self, user: UserId) -> bool {
        match self {
            Self::Everyone => true,
            Self::User(addressee) => *addressee == user,
        }
    }
}

/// An event paired with its delivery scope.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Who should receive the event.
    pub audience: Audience,
    /// The event itself.
    pub event: LiveEvent,
}

impl Envelope {
    /// Wraps an event for delivery to every connected session.
    #[must_use]
    pub const fn broadcast(event: LiveEvent) -> Self {
        Self {
            audience: Audience::Everyone,
            event,
        }
    }

    /// Wraps an event for delivery to one user's sessions.
    #[must_use]
    pub const fn to_user(user: UserId, event: LiveEvent) -> Self {
        Self {
            audience: Audience::User(user),
            event,
        }
    }
}

/// Broadcast bus for [`Envelope`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity.
/// When the ring buffer is full, the oldest events are dropped for
/// lagging receivers.
#[derive(Debug, Clone)]
pub struct EventHub {
    sender: broadcast::Sender<Envelope>,
}

impl EventHub {
    /// Creates a new `EventHub` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an envelope to all subscribed connections.
    ///
    /// Returns the number of receivers that received it. If there are
    /// no active receivers, the envelope is silently dropped.
    pub fn publish(&self, envelope: Envelope) -> usize {
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future envelopes.
    ///
    /// Each WebSocket connection should call this once on upgrade.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_event() -> LiveEvent {
        LiveEvent::PostLikeUpdated {
            post_id: "p-1".to_string(),
            like_count: 5,
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let hub = EventHub::new(64);
        let count = hub.publish(Envelope::broadcast(make_event()));
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn subscriber_receives_envelope() {
        let hub = EventHub::new(64);
        let mut rx = hub.subscribe();

        hub.publish(Envelope::broadcast(make_event()));

        let envelope = rx.recv().await;
        let Ok(envelope) = envelope else {
            panic!("expected to receive envelope");
        };
        assert_eq!(envelope.audience, Audience::Everyone);
        assert_eq!(envelope.event, make_event());
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_envelope() {
        let hub = EventHub::new(64);
        let mut rx1 = hub.subscribe();
        let mut rx2 = hub.subscribe();

        let count = hub.publish(Envelope::broadcast(make_event()));
        assert_eq!(count, 2);

        let Ok(e1) = rx1.recv().await else {
            panic!("rx1 failed");
        };
        let Ok(e2) = rx2.recv().await else {
            panic!("rx2 failed");
        };
        assert_eq!(e1.event, e2.event);
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let hub = EventHub::new(64);
        assert_eq!(hub.receiver_count(), 0);

        let _rx1 = hub.subscribe();
        assert_eq!(hub.receiver_count(), 1);

        let _rx2 = hub.subscribe();
        assert_eq!(hub.receiver_count(), 2);

        drop(_rx1);
        assert_eq!(hub.receiver_count(), 1);
    }

    #[test]
    fn audience_filter() {
        let alice = UserId::new();
        let bob = UserId::new();
        assert!(Audience::Everyone.includes(alice));
        assert!(Audience::User(alice).includes(alice));
        assert!(!Audience::User(alice).includes(bob));
    }
}
