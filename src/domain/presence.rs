//! Online-presence bookkeeping for connected users.
//!
//! [`PresenceRegistry`] tracks how many live WebSocket sessions each
//! user currently has. A user is online while at least one session is
//! open; a second device opening a session does not change their
//! online status, and closing one of several sessions does not mark
//! them offline.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::UserId;

/// Process-wide map of user id to live session count.
///
/// # Concurrency
///
/// A single `RwLock` over the whole map: presence updates are cheap
/// and happen only on connection open/close, so per-entry locking
/// would buy nothing here.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    sessions: RwLock<HashMap<UserId, usize>>,
}

impl PresenceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new live session for `user`, returning their session
    /// count after the increment.
    pub async fn mark_online(&self, user: UserId) -> usize {
        let mut map = self.sessions.write().await;
        let count = map.entry(user).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Records a closed session for `user`, returning their remaining
    /// session count. The entry is removed once the count reaches zero;
    /// marking an unknown user offline is a no-op returning zero.
    pub async fn mark_offline(&self, user: UserId) -> usize {
        let mut map = self.sessions.write().await;
        let Some(count) = map.get_mut(&user) else {
            return 0;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            map.remove(&user);
            0
        } else {
            *count
        }
    }

    /// Returns `true` if `user` has at least one live session.
    pub async fn is_online(&self, user: UserId) -> bool {
        self.sessions.read().await.contains_key(&user)
    }

    /// Returns the number of distinct users currently online.
    pub async fn online_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns the ids of every user currently online.
    pub async fn snapshot(&self) -> Vec<UserId> {
        self.sessions.read().await.keys().copied().collect()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn online_and_offline_round_trip() {
        let registry = PresenceRegistry::new();
        let user = UserId::new();

        assert!(!registry.is_online(user).await);
        assert_eq!(registry.mark_online(user).await, 1);
        assert!(registry.is_online(user).await);

        assert_eq!(registry.mark_offline(user).await, 0);
        assert!(!registry.is_online(user).await);
    }

    #[tokio::test]
    async fn second_device_keeps_user_online() {
        let registry = PresenceRegistry::new();
        let user = UserId::new();

        assert_eq!(registry.mark_online(user).await, 1);
        assert_eq!(registry.mark_online(user).await, 2);

        assert_eq!(registry.mark_offline(user).await, 1);
        assert!(registry.is_online(user).await);

        assert_eq!(registry.mark_offline(user).await, 0);
        assert!(!registry.is_online(user).await);
    }

    #[tokio::test]
    async fn offline_unknown_user_is_noop() {
        let registry = PresenceRegistry::new();
        assert_eq!(registry.mark_offline(UserId::new()).await, 0);
        assert_eq!(registry.online_count().await, 0);
    }

    #[tokio::test]
    async fn online_count_counts_users_not_sessions() {
        let registry = PresenceRegistry::new();
        let alice = UserId::new();
        let bob = UserId::new();

        registry.mark_online(alice).await;
        registry.mark_online(alice).await;
        registry.mark_online(bob).await;

        assert_eq!(registry.online_count().await, 2);
        let snapshot = registry.snapshot().await;
        assert!(snapshot.contains(&alice));
        assert!(snapshot.contains(&bob));
    }
}
