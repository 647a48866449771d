//! Bus events: types emitted by the registry and subscribers.
//!
//! This module groups the event **data model** used to report channel,
//! listener and subscriber lifecycle to [`Observe`](crate::Observe) implementations.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//!
//! ## Quick reference
//! - **Publishers**: `Registry` (channel/listener events), `Subscriber` (setup/teardown).
//! - **Consumers**: `ObserverSet`, which fans out to user observers.

mod event;

pub use event::{Event, EventKind};
