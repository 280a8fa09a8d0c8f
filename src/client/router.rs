//! Process-wide subscription registry for inbound events.
//!
//! [`SubscriptionRouter`] decouples the connection's inbound stream
//! from UI consumers: each consumer registers callbacks for the event
//! kinds it cares about and removes them by handle on teardown.
//! Delivery is at-most-once and best-effort — whoever is subscribed at
//! dispatch time receives the event; nobody else ever will.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::{EventKind, LiveEvent};
use crate::error::RealtimeError;

/// Callback invoked with every dispatched event of a subscribed kind.
pub type EventCallback = dyn Fn(&LiveEvent) + Send + Sync;

/// Opaque handle identifying one registration.
///
/// Returned by [`SubscriptionRouter::subscribe`]; pass it back to
/// [`SubscriptionRouter::unsubscribe`] on teardown. Every `subscribe`
/// call yields a distinct handle, even for identical callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
}

impl Subscription {
    /// Returns the event kind this subscription listens for.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }
}

struct RouterEntry {
    id: u64,
    callback: Arc<EventCallback>,
}

#[derive(Default)]
struct RouterInner {
    next_id: u64,
    registry: HashMap<EventKind, Vec<RouterEntry>>,
}

/// Registry mapping event kind to an ordered list of callbacks.
///
/// # Concurrency
///
/// The registry lock is held only while mutating or snapshotting the
/// callback list, never while invoking callbacks. A callback may
/// therefore subscribe or unsubscribe (itself included) during
/// dispatch; the in-flight dispatch keeps working off its snapshot.
#[derive(Default)]
pub struct SubscriptionRouter {
    inner: Mutex<RouterInner>,
}

impl SubscriptionRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for events of `kind`.
    ///
    /// Multiple callbacks may register under the same kind; each
    /// receives every matching event independently, in registration
    /// order. No deduplication: registering the same callback twice
    /// creates two registrations.
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&LiveEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let mut inner = self.lock();
        inner.next_id = inner.next_id.wrapping_add(1);
        let id = inner.next_id;
        inner.registry.entry(kind).or_default().push(RouterEntry {
            id,
            callback: Arc::new(callback),
        });
        Subscription { kind, id }
    }

    /// Removes the registration identified by `subscription`.
    ///
    /// Removing a handle that is not currently registered is a no-op,
    /// not an error, so component teardown can unsubscribe defensively.
    pub fn unsubscribe(&self, subscription: &Subscription) {
        let mut inner = self.lock();
        if let Some(entries) = inner.registry.get_mut(&subscription.kind) {
            entries.retain(|entry| entry.id != subscription.id);
            if entries.is_empty() {
                inner.registry.remove(&subscription.kind);
            }
        }
    }

    /// Delivers `event` to every callback currently registered for its
    /// kind, in registration order.
    ///
    /// Each invocation is isolated: a panicking callback is caught and
    /// logged, and later callbacks in the same dispatch still run.
    /// Returns the number of callbacks invoked.
    pub fn dispatch(&self, event: &LiveEvent) -> usize {
        let kind = event.kind();
        // Snapshot under the lock, invoke outside it, so callbacks may
        // mutate the registry mid-dispatch.
        let snapshot: Vec<Arc<EventCallback>> = {
            let inner = self.lock();
            inner
                .registry
                .get(&kind)
                .map(|entries| entries.iter().map(|e| Arc::clone(&e.callback)).collect())
                .unwrap_or_default()
        };

        let mut delivered = 0;
        for callback in snapshot {
            delivered += 1;
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                let error = RealtimeError::Subscriber { kind };
                tracing::error!(%error, "subscriber callback panicked");
            }
        }
        delivered
    }

    /// Removes all registrations for all event kinds.
    ///
    /// Called on full teardown (logout) so callbacks referencing
    /// unmounted UI state cannot leak.
    pub fn clear(&self) {
        self.lock().registry.clear();
    }

    /// Returns the number of callbacks registered for `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.lock().registry.get(&kind).map_or(0, Vec::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RouterInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SubscriptionRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        let total: usize = inner.registry.values().map(Vec::len).sum();
        f.debug_struct("SubscriptionRouter")
            .field("kinds", &inner.registry.len())
            .field("subscriptions", &total)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use std::sync::Mutex as StdMutex;

    fn post_like(post_id: &str, like_count: u64) -> LiveEvent {
        LiveEvent::PostLikeUpdated {
            post_id: post_id.to_string(),
            like_count,
        }
    }

    fn chat(text: &str) -> LiveEvent {
        LiveEvent::ChatMessage {
            id: "m-1".to_string(),
            from: UserId::new(),
            to: UserId::new(),
            text: text.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn dispatch_invokes_registered_callbacks_in_order() {
        let router = SubscriptionRouter::new();
        let log = Arc::new(StdMutex::new(Vec::new()));

        for tag in 0..3_u32 {
            let log = Arc::clone(&log);
            router.subscribe(EventKind::PostLikeUpdated, move |_| {
                if let Ok(mut log) = log.lock() {
                    log.push(tag);
                }
            });
        }

        let delivered = router.dispatch(&post_like("42", 5));
        assert_eq!(delivered, 3);
        assert_eq!(log.lock().ok().map(|v| v.clone()), Some(vec![0, 1, 2]));
    }

    #[test]
    fn callback_receives_the_exact_payload_once() {
        let router = SubscriptionRouter::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let seen_cb = Arc::clone(&seen);
        let sub = router.subscribe(EventKind::PostLikeUpdated, move |event| {
            if let Ok(mut seen) = seen_cb.lock() {
                seen.push(event.clone());
            }
        });

        let event = post_like("42", 5);
        router.dispatch(&event);
        assert_eq!(seen.lock().ok().map(|v| v.clone()), Some(vec![event.clone()]));

        // After unsubscribing, the same event is not delivered again.
        router.unsubscribe(&sub);
        router.dispatch(&event);
        assert_eq!(seen.lock().ok().map(|v| v.len()), Some(1));
    }

    #[test]
    fn identical_callbacks_register_independently() {
        let router = SubscriptionRouter::new();
        let hits = Arc::new(StdMutex::new(0_u32));

        let make = |hits: Arc<StdMutex<u32>>| {
            move |_: &LiveEvent| {
                if let Ok(mut hits) = hits.lock() {
                    *hits += 1;
                }
            }
        };
        let a = router.subscribe(EventKind::ChatMessage, make(Arc::clone(&hits)));
        let b = router.subscribe(EventKind::ChatMessage, make(Arc::clone(&hits)));
        assert_ne!(a, b);

        router.dispatch(&chat("hello"));
        assert_eq!(hits.lock().ok().map(|h| *h), Some(2));
    }

    #[test]
    fn unsubscribe_removes_exactly_one_registration() {
        let router = SubscriptionRouter::new();
        let first = router.subscribe(EventKind::ChatMessage, |_| {});
        let _second = router.subscribe(EventKind::ChatMessage, |_| {});

        router.unsubscribe(&first);
        assert_eq!(router.subscriber_count(EventKind::ChatMessage), 1);

        // Unsubscribing the same handle again is a no-op.
        router.unsubscribe(&first);
        assert_eq!(router.subscriber_count(EventKind::ChatMessage), 1);
    }

    #[test]
    fn one_component_unsubscribing_does_not_affect_the_other() {
        let router = SubscriptionRouter::new();
        let feed_hits = Arc::new(StdMutex::new(0_u32));
        let chat_hits = Arc::new(StdMutex::new(0_u32));

        let feed_cb = Arc::clone(&feed_hits);
        let feed = router.subscribe(EventKind::ChatMessage, move |_| {
            if let Ok(mut hits) = feed_cb.lock() {
                *hits += 1;
            }
        });
        let chat_cb = Arc::clone(&chat_hits);
        let _chat_sub = router.subscribe(EventKind::ChatMessage, move |_| {
            if let Ok(mut hits) = chat_cb.lock() {
                *hits += 1;
            }
        });

        router.dispatch(&chat("one"));
        router.unsubscribe(&feed);
        router.dispatch(&chat("two"));

        assert_eq!(feed_hits.lock().ok().map(|h| *h), Some(1));
        assert_eq!(chat_hits.lock().ok().map(|h| *h), Some(2));
    }

    #[test]
    fn panicking_callback_does_not_stop_dispatch() {
        let router = SubscriptionRouter::new();
        let survived = Arc::new(StdMutex::new(false));

        router.subscribe(EventKind::Typing, |_| {
            panic!("subscriber bug");
        });
        let survived_cb = Arc::clone(&survived);
        router.subscribe(EventKind::Typing, move |_| {
            if let Ok(mut survived) = survived_cb.lock() {
                *survived = true;
            }
        });

        let delivered = router.dispatch(&LiveEvent::Typing {
            from: UserId::new(),
            to: UserId::new(),
            is_typing: false,
        });
        assert_eq!(delivered, 2);
        assert_eq!(survived.lock().ok().map(|s| *s), Some(true));
    }

    #[test]
    fn callback_may_unsubscribe_itself_during_dispatch() {
        let router = Arc::new(SubscriptionRouter::new());
        let slot: Arc<StdMutex<Option<Subscription>>> = Arc::new(StdMutex::new(None));

        let router_cb = Arc::clone(&router);
        let slot_cb = Arc::clone(&slot);
        let sub = router.subscribe(EventKind::StoryDeleted, move |_| {
            if let Ok(guard) = slot_cb.lock()
                && let Some(sub) = guard.as_ref()
            {
                router_cb.unsubscribe(sub);
            }
        });
        if let Ok(mut guard) = slot.lock() {
            *guard = Some(sub);
        }

        let event = LiveEvent::StoryDeleted {
            story_id: "s-1".to_string(),
        };
        assert_eq!(router.dispatch(&event), 1);
        assert_eq!(router.dispatch(&event), 0);
    }

    #[test]
    fn clear_drops_every_registration() {
        let router = SubscriptionRouter::new();
        router.subscribe(EventKind::ChatMessage, |_| {});
        router.subscribe(EventKind::NewStory, |_| {});

        router.clear();
        assert_eq!(router.subscriber_count(EventKind::ChatMessage), 0);
        assert_eq!(router.subscriber_count(EventKind::NewStory), 0);
        assert_eq!(router.dispatch(&chat("nobody home")), 0);
    }

    #[test]
    fn dispatch_without_subscribers_is_a_noop() {
        let router = SubscriptionRouter::new();
        assert_eq!(router.dispatch(&post_like("1", 1)), 0);
    }
}
