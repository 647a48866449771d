//! # Subscriber - keeps one consumer's state in sync with a set of topics.
//!
//! A [`Subscriber`] owns, for one consumer, a listener per configured topic and
//! the merged state those listeners maintain.
//!
//! ## Lifecycle
//! ```text
//! Subscriber::subscribe(registry, mappers)
//!   ├─► mappers.validate()          (empty/duplicate names → error, nothing registered)
//!   └─► for (topic, mapper) in declaration order {
//!         ├─ id = topic.add_listener(|v| merge(topic, mapper(Some(v), topic)))
//!         ├─ subscriptions.push(Subscription { topic, id })
//!         └─ merge(topic, mapper(topic.value(), topic))     (initial state)
//!       }                           (any failure → remove every listener added so far)
//!
//! publish(topic, v) ──► listener ──► mapper ──► Accumulator::merge ──► watch::Sender
//!
//! teardown() / Drop ──► registry.unregister(topic, id) for each subscription
//! ```
//!
//! ## Rules
//! - Setup either fully succeeds or leaves no listener behind.
//! - The consumer sees [`State`] only; the topic → listener bindings stay internal.
//! - A mapper failure during a live update leaves the merged state untouched and
//!   surfaces to the publisher through [`BusError::Delivery`](crate::BusError::Delivery).
//! - Teardown is idempotent; after it returns no listener of this subscriber is
//!   registered or still running, so later publishes cannot reach it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::bus::{ListenerId, Registry};
use crate::error::{MapperError, SubscribeError};
use crate::events::{Event, EventKind};

use super::mapper::Mappers;
use super::state::{Accumulator, State};
use super::subscription::Subscription;

/// Merge target shared between the subscriber and its listeners.
struct Shared<O> {
    acc: Mutex<Accumulator<O>>,
    tx: watch::Sender<State<O>>,
}

impl<O> Shared<O>
where
    O: Clone + PartialEq + Send + Sync + 'static,
{
    fn merge(&self, topic: &Arc<str>, partial: &State<O>) {
        let mut acc = self.acc.lock();
        if acc.merge(topic, partial) {
            self.tx.send_replace(acc.state().clone());
        }
    }
}

/// Subscription coordinator for one consumer.
///
/// Dropping the subscriber tears it down.
pub struct Subscriber<V, O>
where
    V: Clone + Send + Sync + 'static,
    O: Clone + PartialEq + Send + Sync + 'static,
{
    registry: Arc<Registry<V>>,
    shared: Arc<Shared<O>>,
    subscriptions: Mutex<Vec<Subscription>>,
    active: AtomicBool,
}

impl<V, O> Subscriber<V, O>
where
    V: Clone + Send + Sync + 'static,
    O: Clone + PartialEq + Send + Sync + 'static,
{
    /// Registers one listener per configured topic and computes the initial state.
    ///
    /// Topics are processed in declaration order, so on overlapping output keys
    /// the later-declared topic wins the initial state.
    ///
    /// ### Errors
    /// - [`SubscribeError::EmptyTopic`] / [`SubscribeError::DuplicateTopic`]:
    ///   detected before anything is registered.
    /// - [`SubscribeError::Registration`] / [`SubscribeError::Mapper`]:
    ///   every listener registered so far is removed before returning.
    pub fn subscribe(
        registry: &Arc<Registry<V>>,
        mappers: Mappers<V, O>,
    ) -> Result<Self, SubscribeError> {
        mappers.validate()?;

        let (tx, _rx) = watch::channel(State::new());
        let shared = Arc::new(Shared {
            acc: Mutex::new(Accumulator::new()),
            tx,
        });
        let mut subscriptions = Vec::with_capacity(mappers.len());

        for entry in mappers.entries() {
            let topic = registry.topic(Arc::clone(&entry.topic));

            let listener = {
                let shared = Arc::clone(&shared);
                let mapper = Arc::clone(&entry.mapper);
                let name = Arc::clone(&entry.topic);
                move |value: &V| -> Result<(), MapperError> {
                    let partial = mapper(Some(value), &name)?;
                    shared.merge(&name, &partial);
                    Ok(())
                }
            };

            let listener_id = match topic.add_listener(listener) {
                Ok(id) => id,
                Err(source) => {
                    let err = SubscribeError::Registration {
                        topic: entry.topic.to_string(),
                        source,
                    };
                    return Err(rollback(registry, &subscriptions, &entry.topic, err));
                }
            };
            subscriptions.push(Subscription {
                topic: Arc::clone(&entry.topic),
                listener_id,
            });

            let present = topic.value();
            match (entry.mapper)(present.as_ref(), &entry.topic) {
                Ok(partial) => shared.merge(&entry.topic, &partial),
                Err(source) => {
                    let err = SubscribeError::Mapper {
                        topic: entry.topic.to_string(),
                        source,
                    };
                    return Err(rollback(registry, &subscriptions, &entry.topic, err));
                }
            }
        }

        registry.observers().emit_with(|| {
            Event::new(EventKind::SubscriptionOpened).with_listeners(subscriptions.len())
        });

        Ok(Self {
            registry: Arc::clone(registry),
            shared,
            subscriptions: Mutex::new(subscriptions),
            active: AtomicBool::new(true),
        })
    }

    /// Snapshot of the consumer-visible state.
    pub fn state(&self) -> State<O> {
        self.shared.acc.lock().state().clone()
    }

    /// Returns a receiver that observes every state change.
    ///
    /// The receiver starts at the current state (marked as seen); each merge
    /// that changes the state sends a new value.
    ///
    /// New values are sent from the publishing thread while the merge lock is
    /// held. Holding a [`watch::Ref`] from `borrow()` across a publish on one of
    /// this subscriber's topics on the same thread deadlocks; drop the
    /// reference (or clone the state out) before publishing.
    pub fn watch(&self) -> watch::Receiver<State<O>> {
        self.shared.tx.subscribe()
    }

    /// Topic that most recently wrote `key`.
    pub fn last_writer(&self, key: &str) -> Option<Arc<str>> {
        self.shared.acc.lock().writer(key)
    }

    /// Current topic → listener bindings (empty after teardown).
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.lock().clone()
    }

    /// Listener id bound to `topic`, if subscribed.
    pub fn listener_id(&self, topic: &str) -> Option<ListenerId> {
        self.subscriptions
            .lock()
            .iter()
            .find(|s| &*s.topic == topic)
            .map(|s| s.listener_id.clone())
    }

    /// True until [`Self::teardown`] runs.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Registry this subscriber is bound to.
    pub fn registry(&self) -> &Arc<Registry<V>> {
        &self.registry
    }

    /// Removes every listener this subscriber registered.
    ///
    /// Safe to call any number of times; only the first call does work.
    /// Listeners or channels that vanished in the meantime are skipped.
    /// A merge already running on a publishing thread finishes before this
    /// returns; none starts afterwards.
    pub fn teardown(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        for sub in &subscriptions {
            self.registry.unregister(&sub.topic, &sub.listener_id);
        }

        self.registry.observers().emit_with(|| {
            Event::new(EventKind::SubscriptionClosed).with_listeners(subscriptions.len())
        });
    }

    /// Waits for `token` to be cancelled, then tears down.
    ///
    /// Binds the subscriber to a host runtime's shutdown signal.
    pub async fn teardown_on(&self, token: CancellationToken) {
        token.cancelled().await;
        self.teardown();
    }
}

impl<V, O> Drop for Subscriber<V, O>
where
    V: Clone + Send + Sync + 'static,
    O: Clone + PartialEq + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<V, O> std::fmt::Debug for Subscriber<V, O>
where
    V: Clone + Send + Sync + 'static,
    O: Clone + PartialEq + Send + Sync + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("state", &self.state())
            .field("subscriptions", &*self.subscriptions.lock())
            .field("active", &self.is_active())
            .finish()
    }
}

/// Removes the listeners registered by a failed setup and returns `err`.
fn rollback<V>(
    registry: &Registry<V>,
    subscriptions: &[Subscription],
    failed_topic: &str,
    err: SubscribeError,
) -> SubscribeError
where
    V: Clone + Send + Sync + 'static,
{
    for sub in subscriptions {
        registry.unregister(&sub.topic, &sub.listener_id);
    }
    registry.observers().emit_with(|| {
        Event::new(EventKind::SetupRolledBack)
            .with_topic(failed_topic)
            .with_reason(err.as_message())
            .with_listeners(subscriptions.len())
    });
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::BusError;

    fn echo(v: Option<&u32>, topic: &str) -> State<u32> {
        State::new().with(topic, v.copied().unwrap_or(0))
    }

    #[test]
    fn test_initial_state_reflects_present_values() {
        let reg = Registry::<u32>::new();
        reg.publish("a", 7).unwrap();

        let sub =
            Subscriber::subscribe(&reg, Mappers::new().map("a", echo).map("b", echo)).unwrap();

        assert_eq!(sub.state(), State::new().with("a", 7).with("b", 0));
        assert_eq!(sub.subscriptions().len(), 2);
        assert_eq!(reg.listener_count("a"), 1);
        assert_eq!(reg.listener_count("b"), 1);
    }

    #[test]
    fn test_update_merges_only_own_slice() {
        let reg = Registry::<u32>::new();
        let sub =
            Subscriber::subscribe(&reg, Mappers::new().map("a", echo).map("b", echo)).unwrap();

        reg.publish("b", 3).unwrap();

        assert_eq!(sub.state(), State::new().with("a", 0).with("b", 3));
        assert_eq!(sub.last_writer("b").as_deref(), Some("b"));
    }

    #[test]
    fn test_teardown_is_idempotent_and_stops_merges() {
        let reg = Registry::<u32>::new();
        let sub = Subscriber::subscribe(&reg, Mappers::new().map("a", echo)).unwrap();

        sub.teardown();
        sub.teardown();

        assert!(!sub.is_active());
        assert!(sub.subscriptions().is_empty());
        assert_eq!(reg.listener_count("a"), 0);

        reg.publish("a", 9).unwrap();
        assert_eq!(sub.state().get("a"), Some(&0));
    }

    #[test]
    fn test_drop_releases_listeners() {
        let reg = Registry::<u32>::new();
        {
            let _sub = Subscriber::subscribe(&reg, Mappers::new().map("a", echo)).unwrap();
            assert_eq!(reg.listener_count("a"), 1);
        }
        assert_eq!(reg.listener_count("a"), 0);
    }

    #[test]
    fn test_mapper_failure_rolls_back_setup() {
        let reg = Registry::<u32>::new();
        let mappers = Mappers::new()
            .map("a", echo)
            .try_map("b", |_v: Option<&u32>, _t: &str| Err(MapperError::new("bad b")));

        let err = Subscriber::subscribe(&reg, mappers).unwrap_err();

        assert_eq!(err.as_label(), "subscribe_mapper_failed");
        assert_eq!(reg.listener_count("a"), 0);
        assert_eq!(reg.listener_count("b"), 0);
    }

    #[test]
    fn test_registration_failure_rolls_back_setup() {
        let reg = Registry::<u32>::builder(Config {
            max_listeners: 1,
            ..Config::default()
        })
        .build();
        let _holder = reg.register_fn("b", |_| Ok(())).unwrap();

        let err = Subscriber::subscribe(&reg, Mappers::new().map("a", echo).map("b", echo))
            .unwrap_err();

        assert!(matches!(
            err,
            SubscribeError::Registration {
                source: BusError::ListenerLimit { .. },
                ..
            }
        ));
        assert_eq!(reg.listener_count("a"), 0);
        assert_eq!(reg.listener_count("b"), 1);
    }

    #[test]
    fn test_live_mapper_failure_keeps_previous_state() {
        let reg = Registry::<u32>::new();
        let sub = Subscriber::subscribe(
            &reg,
            Mappers::new().try_map("a", |v: Option<&u32>, t: &str| match v {
                Some(n) if *n > 100 => Err(MapperError::new("too large")),
                _ => Ok(echo(v, t)),
            }),
        )
        .unwrap();

        reg.publish("a", 5).unwrap();
        let err = reg.publish("a", 500).unwrap_err();

        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].error, MapperError::new("too large"));
        assert_eq!(sub.state().get("a"), Some(&5));
    }

    #[test]
    fn test_listener_id_lookup() {
        let reg = Registry::<u32>::new();
        let sub = Subscriber::subscribe(&reg, Mappers::new().map("a", echo)).unwrap();

        let id = sub.listener_id("a").unwrap();
        assert!(id.as_str().starts_with("a__"));
        assert_eq!(sub.listener_id("missing"), None);
    }

    #[tokio::test]
    async fn test_watch_sees_changes_only() {
        let reg = Registry::<u32>::new();
        let sub = Subscriber::subscribe(&reg, Mappers::new().map("a", echo)).unwrap();
        let mut rx = sub.watch();
        assert_eq!(rx.borrow().get("a"), Some(&0));

        reg.publish("a", 0).unwrap();
        assert!(!rx.has_changed().unwrap());

        reg.publish("a", 4).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().get("a"), Some(&4));
    }

    #[tokio::test]
    async fn test_teardown_on_cancellation() {
        let reg = Registry::<u32>::new();
        let sub = Arc::new(Subscriber::subscribe(&reg, Mappers::new().map("a", echo)).unwrap());
        let token = CancellationToken::new();

        let waiter = {
            let sub = Arc::clone(&sub);
            let token = token.clone();
            tokio::spawn(async move { sub.teardown_on(token).await })
        };
        assert!(sub.is_active());

        token.cancel();
        waiter.await.unwrap();

        assert!(!sub.is_active());
        assert_eq!(reg.listener_count("a"), 0);
    }
}
