//! # Bus observer trait.
//!
//! Provides [`Observe`] an extension point for plugging custom event handlers into a registry.
//!
//! ## Rules
//! - Observers are called synchronously, on the thread that produced the event.
//! - Observers are called in the order they were given to the builder.
//! - Panics are caught and reported; other observers are unaffected.
//! - Observers must not register/unregister listeners or publish from `on_event`
//!   on the same registry; events can be emitted while channel state is being updated.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use databus::{Event, EventKind, Observe};
//!
//! #[derive(Default)]
//! struct FailureCounter(AtomicUsize);
//!
//! impl Observe for FailureCounter {
//!     fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::ListenerFailed) {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

use crate::events::Event;

/// Event observer for registry observability.
///
/// ### Implementation requirements
/// - Return quickly; the publisher waits for every observer.
/// - Handle errors internally; do not panic.
pub trait Observe: Send + Sync + 'static {
    /// Processes a single event.
    fn on_event(&self, event: &Event);

    /// Returns the observer name used in panic reports.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
