//! # Listener ids and their generator.
//!
//! [`ListenerId`] is an opaque token naming one listener on one channel.
//! Ids come from an injected [`IdGenerator`]; the default [`SequentialIds`]
//! produces topic-prefixed ids (`user__1`, `cart__2`, ...).

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque listener id, cheap to clone.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(Arc<str>);

impl ListenerId {
    /// Returns the id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ListenerId {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for ListenerId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Source of listener ids.
///
/// Implementations must return distinct ids for the lifetime of a registry;
/// an id that collides with a live listener on the same channel is rejected
/// with [`BusError::DuplicateListenerId`](crate::BusError::DuplicateListenerId).
pub trait IdGenerator: Send + Sync + 'static {
    /// Produces a fresh id for a listener on `topic`.
    fn next_id(&self, topic: &str, separator: &str) -> ListenerId;
}

/// Counter-based generator: `{topic}{separator}{n}` with `n` starting at 1.
///
/// The counter is shared by all topics of one generator, so ids stay unique
/// even when two topic names concatenate ambiguously.
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    /// Creates a generator starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, topic: &str, separator: &str) -> ListenerId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        ListenerId::from(format!("{topic}{separator}{n}"))
    }
}
