//! # Subscribers: topic-to-state coordination.
//!
//! This module turns a set of topics into one consumer-visible [`State`].
//!
//! ## Contents
//! - [`Mappers`] / [`Mapper`] ordered configuration (topic → partial state)
//! - [`State`] / [`merge`] the state aggregator
//! - [`Subscriber`] the coordinator owning listeners and merged state
//! - [`Subscription`] one topic → listener binding
//!
//! ## Architecture
//! ```text
//!   Mappers { user: map_user, cart: map_cart }
//!        │
//!        ▼
//!   Subscriber::subscribe ──► Topic("user").add_listener ──┐
//!                        └──► Topic("cart").add_listener ──┤
//!                                                          ▼
//!   publish("cart", v) ──► listener ──► map_cart(v) ──► Accumulator ──► watch / state()
//! ```

mod coordinator;
mod mapper;
mod state;
mod subscription;

pub use coordinator::Subscriber;
pub use mapper::{Mapper, MapperEntry, Mappers};
pub use state::{State, merge};
pub use subscription::Subscription;
