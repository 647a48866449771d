//! # Topic handle
//!
//! [`Topic`] is a thin façade over the [`Registry`] scoped to one channel name.
//! It holds nothing but the name and the shared registry, so it is cheap to
//! construct, clone and discard. Two handles with equal names on the same
//! registry always operate on the same channel.
//!
//! ## Example
//! ```rust
//! use databus::{MapperError, Registry};
//!
//! let registry = Registry::<String>::new();
//! let a = registry.topic("user");
//! let b = registry.topic("user");
//!
//! let id = a.add_listener(|name: &String| {
//!     println!("user is now {name}");
//!     Ok::<_, MapperError>(())
//! })?;
//! assert_eq!(b.listener_count(), 1);
//!
//! b.publish("alice".to_string())?;
//! assert_eq!(a.value().as_deref(), Some("alice"));
//!
//! assert!(b.remove_listener(&id));
//! assert!(!a.remove_listener(&id));
//! # Ok::<(), databus::BusError>(())
//! ```

use std::sync::Arc;

use crate::error::{BusError, MapperError};

use super::{Listener, ListenerId, Registry};

/// Handle bound to one channel name.
#[derive(Clone)]
pub struct Topic<V> {
    name: Arc<str>,
    registry: Arc<Registry<V>>,
}

impl<V> Topic<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a handle, creating the channel on first reference.
    pub fn new(registry: &Arc<Registry<V>>, name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        registry.resolve(&name);
        Self {
            name,
            registry: Arc::clone(registry),
        }
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a listener and returns its id.
    pub fn add_listener<F>(&self, f: F) -> Result<ListenerId, BusError>
    where
        F: Fn(&V) -> Result<(), MapperError> + Send + Sync + 'static,
    {
        self.registry.register(&self.name, Arc::new(f))
    }

    /// Registers an already shared listener.
    pub fn add_shared_listener(&self, listener: Listener<V>) -> Result<ListenerId, BusError> {
        self.registry.register(&self.name, listener)
    }

    /// Removes a listener. Returns `false` (no-op) if the id is not live.
    pub fn remove_listener(&self, id: &ListenerId) -> bool {
        self.registry.unregister(&self.name, id)
    }

    /// Publishes a value on this channel; see [`Registry::publish`].
    pub fn publish(&self, value: V) -> Result<(), BusError> {
        self.registry.publish(&self.name, value)
    }

    /// Latest delivered value.
    pub fn value(&self) -> Option<V> {
        self.registry.value(&self.name)
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.listener_count(&self.name)
    }

    /// True if `other` resolves to the same underlying channel.
    pub fn same_channel(&self, other: &Topic<V>) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry)
            && self.registry.same_channel(&self.name, &other.name)
    }
}

impl<V> std::fmt::Debug for Topic<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_names_share_channel() {
        let reg = Registry::<u32>::new();
        let a = reg.topic("user");
        let b = Topic::new(&reg, "user");
        let other = reg.topic("cart");

        assert!(a.same_channel(&b));
        assert!(!a.same_channel(&other));
        assert_eq!(reg.topics(), vec!["cart".to_string(), "user".to_string()]);
    }

    #[test]
    fn test_handles_observe_each_others_registrations() {
        let reg = Registry::<u32>::new();
        let a = reg.topic("user");
        let id = a.add_listener(|_| Ok(())).unwrap();

        let b = reg.topic("user");
        assert_eq!(b.listener_count(), 1);
        assert!(b.remove_listener(&id));
        assert_eq!(a.listener_count(), 0);
    }

    #[test]
    fn test_handles_on_different_registries_are_isolated() {
        let a = Registry::<u32>::new().topic("user");
        let b = Registry::<u32>::new().topic("user");

        a.publish(1).unwrap();
        assert!(!a.same_channel(&b));
        assert_eq!(b.value(), None);
    }
}
