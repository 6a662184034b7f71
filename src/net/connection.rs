//! Connection identity, state and lifetime tracking.
//!
//! # State Machine
//! ```text
//! AwaitingData → Buffering → Dispatching → Responding → Closed
//!       │            │
//!       └────────────┴──→ Responding (timeout, oversize, bad input)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is enough; only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Where a connection is in its single request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted, nothing received yet.
    AwaitingData,
    /// Some bytes received, request not complete.
    Buffering,
    /// Request complete, being executed.
    Dispatching,
    /// Writing the response.
    Responding,
    /// Response written (or peer gone); connection finished.
    Closed,
}

impl ConnectionState {
    /// Whether moving from `self` to `next` is a legal step.
    pub fn can_transition(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (AwaitingData, Buffering)
                | (AwaitingData | Buffering, Dispatching)
                | (AwaitingData | Buffering | Dispatching, Responding)
                | (_, Closed)
        )
    }
}

/// Counts live connections so shutdown can wait for them to drain.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        let count = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_active_connections(count);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every tracked connection has closed, or `deadline` passes.
    /// Returns whether the drain completed.
    pub async fn wait_for_drain(&self, deadline: Duration) -> bool {
        let drained = async {
            while self.active_count() > 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        tokio::time::timeout(deadline, drained).await.is_ok()
    }
}

/// Guard that tracks a connection's lifetime.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let remaining = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::record_active_connections(remaining);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::ConnectionState::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("conn-"));
    }

    #[test]
    fn connection_tracker_counts() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        let guard2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);
        assert_ne!(guard1.id(), guard2.id());

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);
        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn state_transitions() {
        assert!(AwaitingData.can_transition(Buffering));
        assert!(Buffering.can_transition(Dispatching));
        assert!(Dispatching.can_transition(Responding));
        assert!(Responding.can_transition(Closed));
        assert!(Buffering.can_transition(Responding));

        assert!(!Responding.can_transition(Dispatching));
        assert!(!Dispatching.can_transition(Buffering));
        assert!(!Closed.can_transition(AwaitingData));
    }

    #[tokio::test]
    async fn drain_waits_for_guards() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.track();
        assert!(!tracker.wait_for_drain(Duration::from_millis(60)).await);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(guard);
        });
        assert!(tracker.wait_for_drain(Duration::from_secs(2)).await);
    }
}
