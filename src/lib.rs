//! # databus
//!
//! **Databus** keeps a consumer's local state in sync with values published on
//! independently named, shared topics.
//!
//! It provides a shared channel registry, lightweight topic handles, and a
//! subscriber that maps each topic's value into a slice of state and merges
//! the slices into one ordered [`State`]. Subscribers release their listeners
//! on teardown (or drop), so consumers never leak callbacks.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Producer   │   │   Producer   │   │   Producer   │
//!     │ publish(user)│   │ publish(cart)│   │ publish(...) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Registry (shared, injectable)                                    │
//! │  - Channel per name (current value + ordered listeners)           │
//! │  - IdGenerator (listener ids: user__1, cart__2, ...)              │
//! │  - ObserverSet (lifecycle events → LogWriter / custom)            │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     listener           listener           listener     (registration order)
//!        │                  │                  │
//!        ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Subscriber (one per consumer)                                    │
//! │  - Mappers: topic value → partial State                           │
//! │  - Accumulator: last-write-wins merge, declared order on setup    │
//! │  - Subscriptions: topic → listener id (teardown index)            │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       state() / watch() → consumer
//! ```
//!
//! ### Lifecycle
//! ```text
//! Subscriber::subscribe(registry, mappers)
//!   ├─► validate (empty/duplicate topic → SubscribeError, nothing registered)
//!   ├─► per topic, in order: add listener → record subscription → initial merge
//!   └─► any failure → remove listeners added so far (rollback)
//!
//! registry.publish(topic, value)
//!   └─► listeners (in registration order) → mapper → merge → watch
//!
//! subscriber.teardown() / drop(subscriber)
//!   └─► registry.unregister(topic, id) for every subscription (idempotent)
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                       |
//! |-------------------|-----------------------------------------------------------------|------------------------------------------|
//! | **Bus**           | Named channels, listener registration, serialized publishing.   | [`Registry`], [`Topic`], [`ListenerId`]  |
//! | **Subscribers**   | Topic-to-state mapping with leak-free teardown.                  | [`Subscriber`], [`Mappers`], [`State`]   |
//! | **Observers**     | Hook into channel/listener/subscriber lifecycle events.         | [`Observe`], [`Event`]                   |
//! | **Errors**        | Typed errors for configuration, registration and mappers.       | [`SubscribeError`], [`BusError`]         |
//! | **Configuration** | Listener id format and per-channel limits.                       | [`Config`]                               |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] observer backed by `tracing`.
//!
//! ## Example
//! ```rust
//! use databus::{Mappers, Registry, State, Subscriber};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Value {
//!     Text(String),
//!     Items(Vec<String>),
//! }
//!
//! let registry = Registry::<Value>::new();
//! registry.publish("user", Value::Text("alice".into()))?;
//! registry.publish("cart", Value::Items(vec![]))?;
//!
//! let mappers = Mappers::new()
//!     .map("user", |v: Option<&Value>, _: &str| match v {
//!         Some(Value::Text(name)) => State::new().with("greeting", format!("hi {name}")),
//!         _ => State::new(),
//!     })
//!     .map("cart", |v: Option<&Value>, _: &str| match v {
//!         Some(Value::Items(items)) => State::new().with("cart_size", items.len().to_string()),
//!         _ => State::new(),
//!     });
//!
//! let sub = Subscriber::subscribe(&registry, mappers)?;
//! assert_eq!(sub.state().get("greeting").map(String::as_str), Some("hi alice"));
//! assert_eq!(sub.state().get("cart_size").map(String::as_str), Some("0"));
//!
//! registry.publish("cart", Value::Items(vec!["item1".into()]))?;
//! assert_eq!(sub.state().get("cart_size").map(String::as_str), Some("1"));
//!
//! drop(sub);
//! assert_eq!(registry.listener_count("cart"), 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
mod bus;
mod config;
mod error;
mod events;
mod observers;
mod subscriber;

// ---- Public re-exports ----

pub use bus::{IdGenerator, Listener, ListenerId, Registry, RegistryBuilder, SequentialIds, Topic};
pub use config::Config;
pub use error::{BusError, ListenerFailure, MapperError, SubscribeError};
pub use events::{Event, EventKind};
pub use observers::{Observe, ObserverSet};
pub use subscriber::{Mapper, MapperEntry, Mappers, State, Subscriber, Subscription, merge};

// Optional: expose a built-in tracing logger observer.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;
