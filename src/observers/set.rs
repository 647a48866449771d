//! # ObserverSet: synchronous fan-out over multiple observers
//!
//! [`ObserverSet`] distributes each [`Event`] to every observer in order.
//!
//! ## What it guarantees
//! - Observers see events in the order they were emitted by one thread.
//! - Panics inside observers are caught and logged (isolation).
//! - Events are not even constructed when the set is empty ([`ObserverSet::emit_with`]).
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        ├──► O1.on_event()
//!        ├──► O2.on_event()
//!        └──► ON.on_event()
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::events::Event;

use super::Observe;

/// Ordered fan-out to observers.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn Observe>>,
}

impl ObserverSet {
    /// Creates a set over the given observers.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observe>>) -> Self {
        Self { observers }
    }

    /// Fan-out one event to all observers.
    pub fn emit(&self, event: &Event) {
        for obs in &self.observers {
            if let Err(panic_err) = catch_unwind(AssertUnwindSafe(|| obs.on_event(event))) {
                tracing::warn!(
                    observer = obs.name(),
                    seq = event.seq,
                    panic = ?panic_err,
                    "observer panicked"
                );
            }
        }
    }

    /// Builds the event only when someone is listening, then fans it out.
    #[inline]
    pub fn emit_with(&self, build: impl FnOnce() -> Event) {
        if !self.observers.is_empty() {
            self.emit(&build());
        }
    }

    /// True if there are no observers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Number of observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.observers.iter().map(|o| o.name()).collect();
        f.debug_struct("ObserverSet").field("observers", &names).finish()
    }
}
