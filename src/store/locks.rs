//! Per-user serialization point.
//!
//! Every request holds its user's lock across load → mutate → save, so two
//! requests for the same user never interleave their disk I/O. Requests for
//! different users proceed in parallel.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Guard held for the duration of one request against one user.
pub type UserGuard = OwnedMutexGuard<()>;

/// Registry of per-username async mutexes.
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    inner: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `username`.
    pub async fn lock(&self, username: &str) -> UserGuard {
        // Clone the Arc out so the map shard is not held across the await.
        let mutex = Arc::clone(self.inner.entry(username.to_string()).or_default().value());
        mutex.lock_owned().await
    }

    /// Number of users that have been locked at least once.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_is_exclusive() {
        let locks = UserLocks::new();
        let guard = locks.lock("alice").await;

        let contender = locks.clone();
        let blocked = tokio::time::timeout(Duration::from_millis(50), async move {
            contender.lock("alice").await
        })
        .await;
        assert!(blocked.is_err(), "second lock on alice should wait");

        drop(guard);
        let _again = locks.lock("alice").await;
    }

    #[tokio::test]
    async fn different_users_do_not_block() {
        let locks = UserLocks::new();
        let _alice = locks.lock("alice").await;

        let bob = tokio::time::timeout(Duration::from_millis(50), locks.lock("bob")).await;
        assert!(bob.is_ok());
        assert_eq!(locks.len(), 2);
    }
}
