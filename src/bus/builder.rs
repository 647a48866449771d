use std::marker::PhantomData;
use std::sync::Arc;

use crate::{
    config::Config,
    observers::{Observe, ObserverSet},
};
use super::{id::{IdGenerator, SequentialIds}, registry::Registry};

/// Builder for constructing a [`Registry`] with optional collaborators.
pub struct RegistryBuilder<V> {
    cfg: Config,
    observers: Vec<Arc<dyn Observe>>,
    ids: Option<Arc<dyn IdGenerator>>,
    _value: PhantomData<fn() -> V>,
}

impl<V> RegistryBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            observers: Vec::new(),
            ids: None,
            _value: PhantomData,
        }
    }

    /// Sets event observers for observability.
    ///
    /// Observers receive channel/listener/subscriber lifecycle events
    /// synchronously, in the given order.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Replaces the listener id source (default: [`SequentialIds`]).
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Builds and returns the shared registry.
    pub fn build(self) -> Arc<Registry<V>> {
        let ids: Arc<dyn IdGenerator> = match self.ids {
            Some(ids) => ids,
            None => Arc::new(SequentialIds::new()),
        };

        Arc::new(Registry::from_parts(
            self.cfg,
            ids,
            ObserverSet::new(self.observers),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ListenerId;

    struct Fixed;

    impl IdGenerator for Fixed {
        fn next_id(&self, topic: &str, _separator: &str) -> ListenerId {
            ListenerId::from(format!("{topic}-fixed"))
        }
    }

    #[test]
    fn test_custom_id_generator_is_used() {
        let reg = RegistryBuilder::<u8>::new(Config::default())
            .with_id_generator(Arc::new(Fixed))
            .build();

        let id = reg.register_fn("a", |_| Ok(())).unwrap();
        assert_eq!(id.as_str(), "a-fixed");

        let err = reg.register_fn("a", |_| Ok(())).unwrap_err();
        assert_eq!(err.as_label(), "bus_duplicate_listener_id");
    }

    #[test]
    fn test_separator_from_config() {
        let reg = RegistryBuilder::<u8>::new(Config {
            id_separator: ".".into(),
            ..Config::default()
        })
        .build();

        let id = reg.register_fn("cart", |_| Ok(())).unwrap();
        assert_eq!(id.as_str(), "cart.1");
    }
}
