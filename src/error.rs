//! Error types used by the data bus and subscribers.
//!
//! This module defines the error surface of the crate:
//!
//! - [`BusError`]: errors raised by the channel registry (registration, publishing).
//! - [`SubscribeError`]: errors raised while setting up a [`Subscriber`](crate::Subscriber).
//! - [`MapperError`]: failure reported by a mapper or listener body.
//!
//! All enums provide helper methods (`as_label`, `as_message`) for logging/metrics.
//!
//! Removing a listener id that a channel never issued (or already removed) is
//! **not** an error; see [`Registry::unregister`](crate::Registry::unregister).

use thiserror::Error;

use crate::bus::ListenerId;

/// # Failure reported by a mapper or a listener body.
///
/// The core never swallows it: during setup it aborts the subscriber, during a
/// live update it surfaces to whoever published the value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("mapper failed: {error}")]
pub struct MapperError {
    /// The underlying error message.
    pub error: String,
}

impl MapperError {
    /// Creates a mapper error from anything printable.
    ///
    /// # Example
    /// ```
    /// use databus::MapperError;
    ///
    /// let err = MapperError::new("cart is not a list");
    /// assert_eq!(err.to_string(), "mapper failed: cart is not a list");
    /// ```
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

/// One listener that failed during a delivery cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    /// Listener that returned the error.
    pub listener: ListenerId,
    /// The error it returned.
    pub error: MapperError,
}

/// # Errors produced by the channel registry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The channel already holds the configured maximum number of listeners.
    #[error("topic {topic:?} reached its listener limit ({limit})")]
    ListenerLimit {
        /// Channel name.
        topic: String,
        /// Configured limit.
        limit: usize,
    },

    /// The id generator produced an id that is already live on the channel.
    #[error("listener id {id} is already registered on topic {topic:?}")]
    DuplicateListenerId {
        /// Channel name.
        topic: String,
        /// The conflicting id.
        id: ListenerId,
    },

    /// A publish arrived during delivery and the pending queue was full.
    #[error("topic {topic:?} pending queue is full ({capacity})")]
    QueueFull {
        /// Channel name.
        topic: String,
        /// Configured queue capacity.
        capacity: usize,
    },

    /// One or more listeners failed while the value was delivered.
    ///
    /// Delivery still reached every other live listener.
    #[error("{} listener(s) failed on topic {topic:?}", .failures.len())]
    Delivery {
        /// Channel name.
        topic: String,
        /// Failures in delivery order.
        failures: Vec<ListenerFailure>,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use databus::BusError;
    ///
    /// let err = BusError::ListenerLimit { topic: "user".into(), limit: 4 };
    /// assert_eq!(err.as_label(), "bus_listener_limit");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::ListenerLimit { .. } => "bus_listener_limit",
            BusError::DuplicateListenerId { .. } => "bus_duplicate_listener_id",
            BusError::QueueFull { .. } => "bus_queue_full",
            BusError::Delivery { .. } => "bus_delivery_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::ListenerLimit { topic, limit } => {
                format!("listener limit {limit} reached; topic={topic}")
            }
            BusError::DuplicateListenerId { topic, id } => {
                format!("duplicate listener id {id}; topic={topic}")
            }
            BusError::QueueFull { topic, capacity } => {
                format!("pending queue full (capacity={capacity}); topic={topic}")
            }
            BusError::Delivery { topic, failures } => {
                let ids: Vec<&str> = failures.iter().map(|f| f.listener.as_str()).collect();
                format!("delivery failed; topic={topic} listeners={ids:?}")
            }
        }
    }

    /// Returns the listener failures for a [`BusError::Delivery`], empty otherwise.
    pub fn failures(&self) -> &[ListenerFailure] {
        match self {
            BusError::Delivery { failures, .. } => failures,
            _ => &[],
        }
    }
}

/// # Errors produced while setting up a subscriber.
///
/// Setup either fully succeeds or rolls back every listener it registered,
/// so none of these leave a partial subscription set behind.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscribeError {
    /// A configuration entry has an empty topic name.
    #[error("mapper entry #{index} has an empty topic name")]
    EmptyTopic {
        /// Position of the entry in the configuration.
        index: usize,
    },

    /// The same topic name appears more than once in the configuration.
    #[error("topic {topic:?} is configured more than once")]
    DuplicateTopic {
        /// The repeated name.
        topic: String,
    },

    /// The registry refused the listener.
    #[error("registering a listener on topic {topic:?} failed: {source}")]
    Registration {
        /// Topic being set up.
        topic: String,
        /// Registry error.
        #[source]
        source: BusError,
    },

    /// The initial mapper run failed.
    #[error("initial mapping of topic {topic:?} failed: {source}")]
    Mapper {
        /// Topic being set up.
        topic: String,
        /// Mapper error, unmodified.
        #[source]
        source: MapperError,
    },
}

impl SubscribeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use databus::SubscribeError;
    ///
    /// let err = SubscribeError::DuplicateTopic { topic: "user".into() };
    /// assert_eq!(err.as_label(), "subscribe_duplicate_topic");
    /// assert!(err.is_configuration());
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubscribeError::EmptyTopic { .. } => "subscribe_empty_topic",
            SubscribeError::DuplicateTopic { .. } => "subscribe_duplicate_topic",
            SubscribeError::Registration { .. } => "subscribe_registration_failed",
            SubscribeError::Mapper { .. } => "subscribe_mapper_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SubscribeError::EmptyTopic { index } => format!("empty topic name at entry {index}"),
            SubscribeError::DuplicateTopic { topic } => format!("duplicate topic: {topic}"),
            SubscribeError::Registration { topic, source } => {
                format!("registration failed; topic={topic} cause={}", source.as_message())
            }
            SubscribeError::Mapper { topic, source } => {
                format!("mapper failed; topic={topic} error={}", source.error)
            }
        }
    }

    /// Indicates whether the configuration itself is invalid.
    ///
    /// Returns `true` for [`SubscribeError::EmptyTopic`] and
    /// [`SubscribeError::DuplicateTopic`], `false` otherwise.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SubscribeError::EmptyTopic { .. } | SubscribeError::DuplicateTopic { .. }
        )
    }
}
