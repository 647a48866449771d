//! # Registry configuration.
//!
//! Provides [`Config`] centralized settings for a [`Registry`](crate::Registry).
//!
//! ## Sentinel values
//! - `max_listeners = 0` → unlimited listeners per channel
//! - `max_pending = 0` → unlimited re-entrant publishes queued per channel

use std::borrow::Cow;

/// Configuration for a channel registry.
///
/// ## Field semantics
/// - `id_separator`: joins topic name and counter in generated listener ids (`user__1`)
/// - `max_listeners`: per-channel listener cap (`0` = unlimited)
/// - `max_pending`: per-channel cap on re-entrant publishes queued during a delivery (`0` = unlimited)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Separator between the topic prefix and the counter in listener ids.
    pub id_separator: Cow<'static, str>,

    /// Maximum number of live listeners on one channel.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = registering the `n+1`-th listener fails with `BusError::ListenerLimit`
    pub max_listeners: usize,

    /// Maximum number of values queued on one channel by listeners publishing
    /// back into it while a delivery is running.
    ///
    /// Publishers on other threads wait instead of queueing and are not counted.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = further re-entrant publishes fail with `BusError::QueueFull`
    pub max_pending: usize,
}

impl Config {
    /// Returns the per-channel listener cap as an `Option`.
    #[inline]
    pub fn listener_limit(&self) -> Option<usize> {
        if self.max_listeners == 0 {
            None
        } else {
            Some(self.max_listeners)
        }
    }

    /// Returns the per-channel pending queue cap as an `Option`.
    #[inline]
    pub fn pending_limit(&self) -> Option<usize> {
        if self.max_pending == 0 {
            None
        } else {
            Some(self.max_pending)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `id_separator = "__"`
    /// - `max_listeners = 0` (unlimited)
    /// - `max_pending = 0` (unlimited)
    fn default() -> Self {
        Self {
            id_separator: Cow::Borrowed("__"),
            max_listeners: 0,
            max_pending: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unlimited() {
        let cfg = Config::default();
        assert_eq!(cfg.listener_limit(), None);
        assert_eq!(cfg.pending_limit(), None);
        assert_eq!(cfg.id_separator, "__");
    }

    #[test]
    fn test_limits_as_option() {
        let cfg = Config {
            max_listeners: 3,
            max_pending: 8,
            ..Config::default()
        };
        assert_eq!(cfg.listener_limit(), Some(3));
        assert_eq!(cfg.pending_limit(), Some(8));
    }
}
