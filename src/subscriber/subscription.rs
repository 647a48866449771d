use std::sync::Arc;

use crate::bus::ListenerId;

/// One live binding of a subscriber to a topic.
///
/// The list of subscriptions is the subscriber's teardown index: each entry
/// names the listener to remove from which channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    /// Channel name.
    pub topic: Arc<str>,
    /// Listener registered on that channel.
    pub listener_id: ListenerId,
}
