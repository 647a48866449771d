//! # Channel registry - the shared table of named topics.
//!
//! The registry maps a channel name to its [`Channel`] (current value + listeners).
//! It is the single source of truth: every [`Topic`] handle with the same name
//! observes the same channel.
//!
//! ## Architecture
//! ```text
//! Topic("user") ─┐
//! Topic("user") ─┼──► Registry.resolve("user") ──► Arc<Channel>  (created on first use)
//! Subscriber    ─┘         │
//!                          ├─► register(name, listener) → ListenerId   (IdGenerator)
//!                          ├─► unregister(name, id)     → bool         (no-op if absent)
//!                          └─► publish(name, value)     → Result       (serialized per channel)
//! ```
//!
//! ## Rules
//! - Channels are created lazily and live as long as the registry.
//! - Only the registry mutates listener sets.
//! - Unregistering an unknown id (or on an unknown channel) is a no-op.
//! - Lookups that only read (`value`, `listener_count`, `unregister`) never create channels.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{BusError, MapperError};
use crate::events::{Event, EventKind};
use crate::observers::ObserverSet;

use super::builder::RegistryBuilder;
use super::channel::{Channel, Listener};
use super::id::{IdGenerator, ListenerId};
use super::topic::Topic;

/// Shared registry of named channels.
///
/// Create one with [`Registry::new`] or [`Registry::builder`], then hand the
/// `Arc` to every [`Topic`] and [`Subscriber`](crate::Subscriber) that must
/// share channels.
pub struct Registry<V> {
    channels: RwLock<HashMap<Arc<str>, Arc<Channel<V>>>>,
    ids: Arc<dyn IdGenerator>,
    observers: ObserverSet,
    cfg: Config,
}

impl<V> Registry<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a registry with default configuration and no observers.
    pub fn new() -> Arc<Self> {
        RegistryBuilder::new(Config::default()).build()
    }

    /// Returns a builder for a configured registry.
    pub fn builder(cfg: Config) -> RegistryBuilder<V> {
        RegistryBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        cfg: Config,
        ids: Arc<dyn IdGenerator>,
        observers: ObserverSet,
    ) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            ids,
            observers,
            cfg,
        }
    }

    /// Returns the registry configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns a handle bound to `name`, creating the channel if needed.
    pub fn topic(self: &Arc<Self>, name: impl Into<Arc<str>>) -> Topic<V> {
        Topic::new(self, name)
    }

    /// Returns the channel for `name`, creating it on first reference.
    pub(crate) fn resolve(&self, name: &str) -> Arc<Channel<V>> {
        if let Some(ch) = self.channels.read().get(name) {
            return Arc::clone(ch);
        }

        let (channel, created) = {
            let mut channels = self.channels.write();
            match channels.get(name) {
                Some(ch) => (Arc::clone(ch), false),
                None => {
                    let key: Arc<str> = Arc::from(name);
                    let ch = Arc::new(Channel::new(Arc::clone(&key)));
                    channels.insert(key, Arc::clone(&ch));
                    (ch, true)
                }
            }
        };

        if created {
            self.observers
                .emit_with(|| Event::new(EventKind::ChannelCreated).with_topic(name));
        }
        channel
    }

    /// Looks up an existing channel without creating it.
    fn lookup(&self, name: &str) -> Option<Arc<Channel<V>>> {
        self.channels.read().get(name).cloned()
    }

    /// Registers `listener` on `name` and returns its fresh id.
    ///
    /// Fails with [`BusError::ListenerLimit`] when the channel is full, or
    /// [`BusError::DuplicateListenerId`] if the id generator repeats a live id.
    pub fn register(&self, name: &str, listener: Listener<V>) -> Result<ListenerId, BusError> {
        let channel = self.resolve(name);
        let id = self.ids.next_id(name, &self.cfg.id_separator);
        channel.add(id.clone(), listener, self.cfg.listener_limit())?;

        self.observers.emit_with(|| {
            Event::new(EventKind::ListenerAdded)
                .with_topic(name)
                .with_listener(&id)
        });
        Ok(id)
    }

    /// Registers a closure as a listener on `name`.
    pub fn register_fn<F>(&self, name: &str, f: F) -> Result<ListenerId, BusError>
    where
        F: Fn(&V) -> Result<(), MapperError> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(f))
    }

    /// Removes listener `id` from `name`.
    ///
    /// Returns `true` if a listener was removed. Unknown ids and unknown
    /// channels are a no-op returning `false`, so repeated teardown is safe.
    pub fn unregister(&self, name: &str, id: &ListenerId) -> bool {
        let removed = self
            .lookup(name)
            .map(|channel| channel.remove(id))
            .unwrap_or(false);

        self.observers.emit_with(|| {
            let kind = if removed {
                EventKind::ListenerRemoved
            } else {
                EventKind::RemovalIgnored
            };
            Event::new(kind).with_topic(name).with_listener(id)
        });
        removed
    }

    /// Publishes `value` on `name` and synchronously notifies its listeners
    /// in registration order.
    ///
    /// If another thread is delivering on that channel, this call waits for it
    /// and then delivers `value` itself. A publish from inside a listener on the
    /// same channel is queued behind the running delivery and returns `Ok(())`;
    /// its failures surface from the outer publish.
    /// Listener failures are collected into [`BusError::Delivery`].
    pub fn publish(&self, name: &str, value: V) -> Result<(), BusError> {
        self.resolve(name)
            .publish(value, self.cfg.pending_limit(), &self.observers)
    }

    /// Returns the latest delivered value of `name`, if any.
    pub fn value(&self, name: &str) -> Option<V> {
        self.lookup(name).and_then(|ch| ch.value())
    }

    /// Returns the number of live listeners on `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.lookup(name).map(|ch| ch.listener_count()).unwrap_or(0)
    }

    /// True if a channel named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.channels.read().contains_key(name)
    }

    /// Returns sorted list of channel names.
    pub fn topics(&self) -> Vec<String> {
        let channels = self.channels.read();
        let mut names: Vec<String> = channels.keys().map(|k| k.to_string()).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn observers(&self) -> &ObserverSet {
        &self.observers
    }

    /// True if both names resolve to the same channel instance.
    pub(crate) fn same_channel(&self, a: &str, b: &str) -> bool {
        match (self.lookup(a), self.lookup(b)) {
            (Some(x), Some(y)) => Arc::ptr_eq(&x, &y),
            _ => false,
        }
    }
}

impl<V> std::fmt::Debug for Registry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("channels", &self.channels.read().len())
            .field("observers", &self.observers)
            .field("cfg", &self.cfg)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::Observe;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Kinds(Mutex<Vec<EventKind>>);

    impl Observe for Kinds {
        fn on_event(&self, event: &Event) {
            self.0.lock().push(event.kind);
        }
    }

    #[test]
    fn test_resolve_is_lookup_or_create() {
        let reg = Registry::<u32>::new();
        assert!(!reg.contains("user"));

        let a = reg.resolve("user");
        let b = reg.resolve("user");

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(reg.topics(), vec!["user".to_string()]);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let reg = Registry::<u32>::new();
        let id = reg.register_fn("user", |_| Ok(())).unwrap();

        assert!(reg.unregister("user", &id));
        assert!(!reg.unregister("user", &id));
        assert!(!reg.unregister("ghost", &id));
        assert!(!reg.contains("ghost"));
        assert_eq!(reg.listener_count("user"), 0);
    }

    #[test]
    fn test_publish_stores_value_and_notifies() {
        let reg = Registry::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        reg.register_fn("n", move |v| {
            sink.lock().push(*v);
            Ok(())
        })
        .unwrap();

        reg.publish("n", 1).unwrap();
        reg.publish("n", 2).unwrap();

        assert_eq!(*seen.lock(), vec![1, 2]);
        assert_eq!(reg.value("n"), Some(2));
        assert_eq!(reg.value("missing"), None);
    }

    #[test]
    fn test_listener_limit_from_config() {
        let reg = Registry::<u32>::builder(Config {
            max_listeners: 1,
            ..Config::default()
        })
        .build();

        reg.register_fn("n", |_| Ok(())).unwrap();
        let err = reg.register_fn("n", |_| Ok(())).unwrap_err();
        assert!(matches!(err, BusError::ListenerLimit { limit: 1, .. }));
    }

    #[test]
    fn test_observers_see_lifecycle() {
        let kinds = Arc::new(Kinds::default());
        let reg = Registry::<u32>::builder(Config::default())
            .with_observers(vec![kinds.clone() as Arc<dyn Observe>])
            .build();

        let id = reg.register_fn("n", |_| Ok(())).unwrap();
        reg.publish("n", 1).unwrap();
        reg.unregister("n", &id);
        reg.unregister("n", &id);

        assert_eq!(
            *kinds.0.lock(),
            vec![
                EventKind::ChannelCreated,
                EventKind::ListenerAdded,
                EventKind::Published,
                EventKind::ListenerRemoved,
                EventKind::RemovalIgnored,
            ]
        );
    }
}
