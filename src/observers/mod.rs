//! # Bus observers.
//!
//! This module provides the [`Observe`] trait and the [`ObserverSet`] fan-out
//! used by the [`Registry`](crate::Registry) to report lifecycle [`Event`](crate::Event)s.
//!
//! ## Architecture
//! ```text
//! Registry / Subscriber ── emit(Event) ──► ObserverSet ──► Observe::on_event(&Event)
//!                                                               │
//!                                                     ┌─────────┼─────────┐
//!                                                     ▼         ▼         ▼
//!                                                 LogWriter  Metrics   Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod observer;
mod set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observer::Observe;
pub use set::ObserverSet;
