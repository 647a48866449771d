//! # LogWriter: tracing-backed event writer
//!
//! A minimal observer that writes incoming [`Event`]s as `tracing` records.
//! Failures are logged at `warn`, listener churn at `debug`, deliveries at `trace`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG databus: channel-created topic="user"
//! DEBUG databus: listener-added topic="user" listener=user__1
//! TRACE databus: published topic="user" listeners=1
//!  WARN databus: listener-failed topic="cart" listener=cart__2 err="boom"
//! DEBUG databus: subscription-closed subscriptions=2
//! ```

use crate::events::{Event, EventKind};
use crate::observers::Observe;

/// Event writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Observe for LogWriter {
    fn on_event(&self, e: &Event) {
        let topic = e.topic.as_deref().unwrap_or("-");
        let listener = e.listener.as_ref().map(|id| id.as_str()).unwrap_or("-");
        match e.kind {
            EventKind::ChannelCreated => {
                tracing::debug!(target: "databus", seq = e.seq, topic, "channel-created");
            }
            EventKind::Published => {
                tracing::trace!(
                    target: "databus",
                    seq = e.seq,
                    topic,
                    listeners = e.listeners,
                    "published"
                );
            }
            EventKind::PublishQueued => {
                tracing::trace!(target: "databus", seq = e.seq, topic, "publish-queued");
            }
            EventKind::ListenerAdded => {
                tracing::debug!(target: "databus", seq = e.seq, topic, listener, "listener-added");
            }
            EventKind::ListenerRemoved => {
                tracing::debug!(
                    target: "databus",
                    seq = e.seq,
                    topic,
                    listener,
                    "listener-removed"
                );
            }
            EventKind::RemovalIgnored => {
                tracing::debug!(target: "databus", seq = e.seq, topic, listener, "removal-ignored");
            }
            EventKind::ListenerFailed => {
                tracing::warn!(
                    target: "databus",
                    seq = e.seq,
                    topic,
                    listener,
                    err = e.reason.as_deref().unwrap_or("unknown"),
                    "listener-failed"
                );
            }
            EventKind::SubscriptionOpened => {
                tracing::debug!(
                    target: "databus",
                    seq = e.seq,
                    subscriptions = e.listeners,
                    "subscription-opened"
                );
            }
            EventKind::SetupRolledBack => {
                tracing::warn!(
                    target: "databus",
                    seq = e.seq,
                    topic,
                    rolled_back = e.listeners,
                    err = e.reason.as_deref().unwrap_or("unknown"),
                    "setup-rolled-back"
                );
            }
            EventKind::SubscriptionClosed => {
                tracing::debug!(
                    target: "databus",
                    seq = e.seq,
                    subscriptions = e.listeners,
                    "subscription-closed"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
