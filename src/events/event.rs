//! # Lifecycle events emitted by the registry and subscribers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Channel events**: channel creation and value publication
//! - **Listener events**: listener registration/removal and listener failures
//! - **Subscriber events**: setup, rollback and teardown of a subscriber
//!
//! The [`Event`] struct carries additional metadata such as timestamps, topic name,
//! listener id and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use databus::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ListenerFailed)
//!     .with_topic("cart")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::ListenerFailed);
//! assert_eq!(ev.topic.as_deref(), Some("cart"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::bus::ListenerId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of bus events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Channel events ===
    /// A channel was created on first reference by name.
    ///
    /// Sets:
    /// - `topic`: channel name
    ChannelCreated,

    /// A value was stored and delivered to the channel's listeners.
    ///
    /// Sets:
    /// - `topic`: channel name
    /// - `listeners`: number of listeners invoked
    Published,

    /// A value arrived while a delivery was running and was queued.
    ///
    /// Sets:
    /// - `topic`: channel name
    PublishQueued,

    // === Listener events ===
    /// A listener was registered.
    ///
    /// Sets:
    /// - `topic`: channel name
    /// - `listener`: assigned id
    ListenerAdded,

    /// A listener was removed.
    ///
    /// Sets:
    /// - `topic`: channel name
    /// - `listener`: removed id
    ListenerRemoved,

    /// Removal of an id that is not live on the channel (no-op).
    ///
    /// Sets:
    /// - `topic`: channel name
    /// - `listener`: requested id
    RemovalIgnored,

    /// A listener returned an error during delivery.
    ///
    /// Sets:
    /// - `topic`: channel name
    /// - `listener`: failing id
    /// - `reason`: error message
    ListenerFailed,

    // === Subscriber events ===
    /// A subscriber finished setup.
    ///
    /// Sets:
    /// - `listeners`: number of subscriptions
    SubscriptionOpened,

    /// A subscriber setup failed and its listeners were removed.
    ///
    /// Sets:
    /// - `topic`: topic that failed
    /// - `reason`: error message
    /// - `listeners`: number of listeners rolled back
    SetupRolledBack,

    /// A subscriber was torn down.
    ///
    /// Sets:
    /// - `listeners`: number of subscriptions released
    SubscriptionClosed,
}

/// Bus event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Channel name, if applicable.
    pub topic: Option<Arc<str>>,
    /// Listener id, if applicable.
    pub listener: Option<ListenerId>,
    /// Human-readable reason (errors).
    pub reason: Option<Arc<str>>,
    /// Listener/subscription count, if applicable.
    pub listeners: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            topic: None,
            listener: None,
            reason: None,
            listeners: None,
        }
    }

    /// Attaches a channel name.
    #[inline]
    pub fn with_topic(mut self, topic: impl Into<Arc<str>>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Attaches a listener id.
    #[inline]
    pub fn with_listener(mut self, id: &ListenerId) -> Self {
        self.listener = Some(id.clone());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a listener count.
    #[inline]
    pub fn with_listeners(mut self, n: usize) -> Self {
        self.listeners = Some(n);
        self
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ListenerFailed | EventKind::SetupRolledBack
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::Published);
        let b = Event::new(EventKind::Published);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builders_fill_fields() {
        let id = ListenerId::from("user__1");
        let ev = Event::new(EventKind::RemovalIgnored)
            .with_topic("user")
            .with_listener(&id)
            .with_listeners(2);
        assert_eq!(ev.topic.as_deref(), Some("user"));
        assert_eq!(ev.listener, Some(id));
        assert_eq!(ev.listeners, Some(2));
        assert!(!ev.is_failure());
    }
}
