//! # State aggregation.
//!
//! [`State`] is an insertion-ordered, string-keyed map used both for a mapper's
//! partial output and for the accumulated, consumer-visible state.
//!
//! ## Merge policy
//! Merging is a shallow, last-write-wins overlay:
//! - keys present in the partial replace same-named keys,
//! - keys absent from the partial are kept unchanged,
//! - new keys are appended in the partial's order.
//!
//! Collisions between topics are not detected: whichever topic merged last
//! owns the key. [`Accumulator`] additionally remembers that owner.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// Ordered key-value state.
#[derive(Clone, PartialEq, Eq)]
pub struct State<O> {
    entries: IndexMap<String, O>,
}

impl<O> Default for State<O> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<O> State<O> {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    ///
    /// # Example
    /// ```
    /// use databus::State;
    ///
    /// let s = State::new().with("name", "alice").with("count", "0");
    /// assert_eq!(s.get("name"), Some(&"alice"));
    /// assert_eq!(s.keys().collect::<Vec<_>>(), vec!["name", "count"]);
    /// ```
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: O) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: O) -> Option<O> {
        self.entries.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&O> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &O)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<O: Clone + PartialEq> State<O> {
    /// Overlays `partial` in place. Returns `true` if any key changed.
    pub fn apply(&mut self, partial: &State<O>) -> bool {
        let mut changed = false;
        for (key, value) in &partial.entries {
            match self.entries.get_mut(key) {
                Some(current) if *current == *value => {}
                Some(current) => {
                    *current = value.clone();
                    changed = true;
                }
                None => {
                    self.entries.insert(key.clone(), value.clone());
                    changed = true;
                }
            }
        }
        changed
    }
}

/// Returns `previous` with `partial` applied on top (pure form of [`State::apply`]).
///
/// # Example
/// ```
/// use databus::{merge, State};
///
/// let prev = State::new().with("user", 1).with("items", 0);
/// let next = merge(&prev, &State::new().with("items", 2));
///
/// assert_eq!(next.get("user"), Some(&1));
/// assert_eq!(next.get("items"), Some(&2));
/// assert_eq!(prev.get("items"), Some(&0));
/// ```
#[must_use]
pub fn merge<O: Clone + PartialEq>(previous: &State<O>, partial: &State<O>) -> State<O> {
    let mut next = previous.clone();
    next.apply(partial);
    next
}

impl<O: fmt::Debug> fmt::Debug for State<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K: Into<String>, O> FromIterator<(K, O)> for State<O> {
    fn from_iter<I: IntoIterator<Item = (K, O)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<O> IntoIterator for State<O> {
    type Item = (String, O);
    type IntoIter = indexmap::map::IntoIter<String, O>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Accumulated state plus the topic that last wrote each key.
pub(crate) struct Accumulator<O> {
    state: State<O>,
    writers: HashMap<String, Arc<str>>,
}

impl<O: Clone + PartialEq> Accumulator<O> {
    pub(crate) fn new() -> Self {
        Self {
            state: State::new(),
            writers: HashMap::new(),
        }
    }

    /// Merges `topic`'s partial on top. Returns `true` if the state changed.
    pub(crate) fn merge(&mut self, topic: &Arc<str>, partial: &State<O>) -> bool {
        for key in partial.keys() {
            self.writers.insert(key.to_string(), Arc::clone(topic));
        }
        self.state.apply(partial)
    }

    pub(crate) fn state(&self) -> &State<O> {
        &self.state
    }

    pub(crate) fn writer(&self, key: &str) -> Option<Arc<str>> {
        self.writers.get(key).cloned()
    }
}
