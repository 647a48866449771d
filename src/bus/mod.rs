//! # The data bus: named channels, listeners and topic handles.
//!
//! ## Contents
//! - [`Registry`] / [`RegistryBuilder`] shared table of channels
//! - [`Topic`] handle scoped to one channel name
//! - [`ListenerId`], [`IdGenerator`], [`SequentialIds`] listener identity
//! - [`Listener`] callback type
//!
//! ## Publish contract
//! Publishing stores the value as the channel's current value, then invokes
//! every live listener synchronously, in registration order. Delivery is
//! serialized per channel; see `channel.rs` for the queueing rules.

mod builder;
mod channel;
mod id;
mod registry;
mod topic;

pub use builder::RegistryBuilder;
pub use channel::Listener;
pub use id::{IdGenerator, ListenerId, SequentialIds};
pub use registry::Registry;
pub use topic::Topic;
