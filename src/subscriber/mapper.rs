//! # Mapper configuration.
//!
//! A mapper projects a topic's current value into a partial [`State`].
//! [`Mappers`] is the ordered configuration handed to
//! [`Subscriber::subscribe`](crate::Subscriber::subscribe): declaration order
//! is merge order, so later entries win overlapping keys on setup.
//!
//! ## Example
//! ```rust
//! use databus::{Mappers, MapperError, State};
//!
//! let mappers: Mappers<String, String> = Mappers::new()
//!     .map("user", |v: Option<&String>, _topic: &str| {
//!         State::new().with("user", v.cloned().unwrap_or_default())
//!     })
//!     .try_map("theme", |v: Option<&String>, _topic: &str| match v.map(String::as_str) {
//!         Some("dark") | Some("light") | None => {
//!             Ok(State::new().with("theme", v.cloned().unwrap_or_else(|| "light".into())))
//!         }
//!         Some(other) => Err(MapperError::new(format!("unknown theme {other}"))),
//!     });
//!
//! assert_eq!(mappers.topics().collect::<Vec<_>>(), vec!["user", "theme"]);
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{MapperError, SubscribeError};

use super::State;

/// Shared mapper: `(topic value, topic name) -> partial state`.
///
/// The value is `None` while nothing has been published on the topic yet.
pub type Mapper<V, O> =
    Arc<dyn Fn(Option<&V>, &str) -> Result<State<O>, MapperError> + Send + Sync>;

/// One (topic, mapper) configuration entry.
pub struct MapperEntry<V, O> {
    pub(crate) topic: Arc<str>,
    pub(crate) mapper: Mapper<V, O>,
}

impl<V, O> MapperEntry<V, O> {
    /// Topic name.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn mapper(&self) -> &Mapper<V, O> {
        &self.mapper
    }
}

impl<V, O> Clone for MapperEntry<V, O> {
    fn clone(&self) -> Self {
        Self {
            topic: Arc::clone(&self.topic),
            mapper: Arc::clone(&self.mapper),
        }
    }
}

/// Ordered configuration of mappers.
///
/// The builder accepts anything; empty or repeated topic names are reported
/// by [`Mappers::validate`] when the subscriber is set up.
pub struct Mappers<V, O> {
    entries: Vec<MapperEntry<V, O>>,
}

impl<V, O> Default for Mappers<V, O> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V, O> Clone for Mappers<V, O> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<V: 'static, O: 'static> Mappers<V, O> {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an infallible mapper.
    #[must_use]
    pub fn map<F>(self, topic: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(Option<&V>, &str) -> State<O> + Send + Sync + 'static,
    {
        self.try_map(topic, move |v: Option<&V>, t: &str| Ok(f(v, t)))
    }

    /// Appends a fallible mapper.
    #[must_use]
    pub fn try_map<F>(mut self, topic: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(Option<&V>, &str) -> Result<State<O>, MapperError> + Send + Sync + 'static,
    {
        self.push(topic, Arc::new(f));
        self
    }

    /// Appends an already shared mapper.
    pub fn push(&mut self, topic: impl Into<Arc<str>>, mapper: Mapper<V, O>) {
        self.entries.push(MapperEntry {
            topic: topic.into(),
            mapper,
        });
    }
}

impl<V, O> Mappers<V, O> {
    /// Topic names in declaration order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(MapperEntry::topic)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks that every topic name is non-empty and unique.
    pub fn validate(&self) -> Result<(), SubscribeError> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.topic.is_empty() {
                return Err(SubscribeError::EmptyTopic { index });
            }
            if !seen.insert(&*entry.topic) {
                return Err(SubscribeError::DuplicateTopic {
                    topic: entry.topic.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Configured entries in declaration order.
    pub fn entries(&self) -> &[MapperEntry<V, O>] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_v: Option<&u32>, _t: &str) -> State<u32> {
        State::new()
    }

    #[test]
    fn test_validate_accepts_unique_names() {
        let m = Mappers::new().map("a", noop).map("b", noop);
        assert!(m.validate().is_ok());
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_validate_rejects_duplicate_added_programmatically() {
        let mut m = Mappers::new().map("user", noop);
        m.push(
            "user",
            Arc::new(|_v: Option<&u32>, _t: &str| Ok::<_, MapperError>(State::<u32>::new())),
        );

        assert_eq!(
            m.validate(),
            Err(SubscribeError::DuplicateTopic {
                topic: "user".into()
            })
        );
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let m = Mappers::new().map("a", noop).map("", noop);
        assert_eq!(m.validate(), Err(SubscribeError::EmptyTopic { index: 1 }));
    }

    #[test]
    fn test_map_passes_value_and_topic() {
        let m: Mappers<u32, u32> =
            Mappers::new().map("n", |v: Option<&u32>, t: &str| {
                State::new().with(t, v.copied().unwrap_or(0) * 2)
            });
        let entry = &m.entries()[0];
        let out = (entry.mapper())(Some(&21), entry.topic()).unwrap();
        assert_eq!(out.get("n"), Some(&42));
    }
}
