//! # Channel: one named topic with its value and listener set.
//!
//! ## Rules
//! - Listeners are kept in registration order and notified in that order.
//! - Delivery is serialized per channel. One thread at a time is the deliverer.
//! - A publish from another thread waits until the running delivery ends, then
//!   delivers its own value, so every publisher receives its own failures and
//!   the channel holds its value when `publish` returns.
//! - A re-entrant publish (from a listener, on the deliverer's thread) is queued
//!   and delivered by the running deliverer after the current value, in FIFO
//!   order. Its failures are reported to the outermost publish on that thread.
//! - Callbacks never run under the channel lock, so listeners may add/remove
//!   listeners or publish without deadlocking.
//! - A listener removed mid-delivery is skipped for the rest of that delivery.
//!   Removal from another thread waits for a running invocation of that listener
//!   to return, so nothing it does lands after `remove` returns.
//!
//! ## Delivery loop
//! ```text
//! publish(v)
//!   ├─ deliverer == this thread ──► pending.push_back(v) ──► Ok(())
//!   ├─ deliverer == other thread ─► wait(idle), retry
//!   └─ none ─► deliverer = this thread
//!            loop {
//!              value = v; snapshot listeners        (locked)
//!              for live listener: cb(&v)            (unlocked, entry gate held)
//!              pending.pop_front() or break         (locked)
//!            }
//!            deliverer = None; idle.notify_one()
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex, ReentrantMutex};

use crate::error::{BusError, ListenerFailure, MapperError};
use crate::events::{Event, EventKind};
use crate::observers::ObserverSet;

use super::ListenerId;

/// Callback registered on a channel.
///
/// Receives the value being delivered. An `Err` is collected and reported
/// to the publisher; delivery to the remaining listeners continues.
pub type Listener<V> = Arc<dyn Fn(&V) -> Result<(), MapperError> + Send + Sync>;

/// Registered listener with its liveness flag.
struct Entry<V> {
    id: ListenerId,
    callback: Listener<V>,
    live: AtomicBool,
    /// Held for the duration of each invocation.
    gate: ReentrantMutex<()>,
}

/// Lock-protected part of a channel.
struct ChannelState<V> {
    value: Option<V>,
    listeners: Vec<Arc<Entry<V>>>,
    deliverer: Option<ThreadId>,
    pending: VecDeque<V>,
}

/// One named topic.
pub(crate) struct Channel<V> {
    name: Arc<str>,
    state: Mutex<ChannelState<V>>,
    idle: Condvar,
}

impl<V> Channel<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(name: Arc<str>) -> Self {
        Self {
            name,
            state: Mutex::new(ChannelState {
                value: None,
                listeners: Vec::new(),
                deliverer: None,
                pending: VecDeque::new(),
            }),
            idle: Condvar::new(),
        }
    }

    /// Latest delivered value.
    pub(crate) fn value(&self) -> Option<V> {
        self.state.lock().value.clone()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    /// Appends a listener; fails on id collision or when the cap is reached.
    pub(crate) fn add(
        &self,
        id: ListenerId,
        callback: Listener<V>,
        limit: Option<usize>,
    ) -> Result<(), BusError> {
        let mut state = self.state.lock();

        if let Some(limit) = limit {
            if state.listeners.len() >= limit {
                return Err(BusError::ListenerLimit {
                    topic: self.name.to_string(),
                    limit,
                });
            }
        }
        if state.listeners.iter().any(|e| e.id == id) {
            return Err(BusError::DuplicateListenerId {
                topic: self.name.to_string(),
                id,
            });
        }

        state.listeners.push(Arc::new(Entry {
            id,
            callback,
            live: AtomicBool::new(true),
            gate: ReentrantMutex::new(()),
        }));
        Ok(())
    }

    /// Removes a listener by id. Returns `false` if the id is not live here.
    ///
    /// If the listener is running on another thread, waits for it to return.
    pub(crate) fn remove(&self, id: &ListenerId) -> bool {
        let entry = {
            let mut state = self.state.lock();
            match state.listeners.iter().position(|e| &e.id == id) {
                Some(pos) => state.listeners.remove(pos),
                None => return false,
            }
        };
        entry.live.store(false, Ordering::Release);
        drop(entry.gate.lock());
        true
    }

    /// Stores `value` and notifies listeners.
    ///
    /// Waits out a delivery running on another thread; queues the value if the
    /// delivery is running on this one.
    pub(crate) fn publish(
        &self,
        value: V,
        pending_limit: Option<usize>,
        observers: &ObserverSet,
    ) -> Result<(), BusError> {
        let me = thread::current().id();
        {
            let mut state = self.state.lock();
            loop {
                let deliverer = state.deliverer;
                match deliverer {
                    None => break,
                    Some(owner) if owner == me => {
                        if let Some(capacity) = pending_limit {
                            if state.pending.len() >= capacity {
                                return Err(BusError::QueueFull {
                                    topic: self.name.to_string(),
                                    capacity,
                                });
                            }
                        }
                        state.pending.push_back(value);
                        drop(state);
                        observers.emit_with(|| {
                            Event::new(EventKind::PublishQueued).with_topic(self.name.clone())
                        });
                        return Ok(());
                    }
                    Some(_) => self.idle.wait(&mut state),
                }
            }
            state.deliverer = Some(me);
        }

        let guard = DeliveryGuard { channel: self };
        let mut failures = Vec::new();
        let mut current = value;

        loop {
            let snapshot = {
                let mut state = self.state.lock();
                state.value = Some(current.clone());
                state.listeners.clone()
            };

            let mut invoked = 0usize;
            for entry in &snapshot {
                let _running = entry.gate.lock();
                if !entry.live.load(Ordering::Acquire) {
                    continue;
                }
                invoked += 1;
                if let Err(error) = (entry.callback)(&current) {
                    observers.emit_with(|| {
                        Event::new(EventKind::ListenerFailed)
                            .with_topic(self.name.clone())
                            .with_listener(&entry.id)
                            .with_reason(error.error.as_str())
                    });
                    failures.push(ListenerFailure {
                        listener: entry.id.clone(),
                        error,
                    });
                }
            }
            observers.emit_with(|| {
                Event::new(EventKind::Published)
                    .with_topic(self.name.clone())
                    .with_listeners(invoked)
            });

            match self.state.lock().pending.pop_front() {
                Some(next) => current = next,
                None => break,
            }
        }
        drop(guard);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(BusError::Delivery {
                topic: self.name.to_string(),
                failures,
            })
        }
    }
}

/// Hands the channel to the next waiting publisher, also when a listener panics.
///
/// Values queued behind a panicking delivery are not delivered, but the newest
/// of them still becomes the channel's current value.
struct DeliveryGuard<'a, V> {
    channel: &'a Channel<V>,
}

impl<V> Drop for DeliveryGuard<'_, V> {
    fn drop(&mut self) {
        let mut state = self.channel.state.lock();
        state.deliverer = None;
        if let Some(last) = state.pending.pop_back() {
            state.value = Some(last);
            state.pending.clear();
        }
        drop(state);
        self.channel.idle.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::time::Duration;

    fn channel() -> Arc<Channel<u32>> {
        Arc::new(Channel::new(Arc::from("t")))
    }

    fn recorder(log: &Arc<Mutex<Vec<(u8, u32)>>>, tag: u8) -> Listener<u32> {
        let log = Arc::clone(log);
        Arc::new(move |v: &u32| -> Result<(), MapperError> {
            log.lock().push((tag, *v));
            Ok(())
        })
    }

    #[test]
    fn test_registration_order_delivery() {
        let ch = channel();
        let log = Arc::new(Mutex::new(Vec::new()));
        ch.add("a".into(), recorder(&log, 1), None).unwrap();
        ch.add("b".into(), recorder(&log, 2), None).unwrap();

        ch.publish(5, None, &ObserverSet::default()).unwrap();

        assert_eq!(*log.lock(), vec![(1, 5), (2, 5)]);
        assert_eq!(ch.value(), Some(5));
    }

    #[test]
    fn test_reentrant_publish_is_queued_not_interleaved() {
        let ch = channel();
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner = Arc::clone(&ch);
        let inner_log = Arc::clone(&log);
        ch.add(
            "first".into(),
            Arc::new(move |v: &u32| -> Result<(), MapperError> {
                inner_log.lock().push((1, *v));
                if *v == 1 {
                    inner
                        .publish(2, None, &ObserverSet::default())
                        .map_err(MapperError::new)?;
                }
                Ok(())
            }),
            None,
        )
        .unwrap();
        ch.add("second".into(), recorder(&log, 2), None).unwrap();

        ch.publish(1, None, &ObserverSet::default()).unwrap();

        assert_eq!(*log.lock(), vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
        assert_eq!(ch.value(), Some(2));
    }

    #[test]
    fn test_removed_mid_delivery_is_skipped() {
        let ch = channel();
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner = Arc::clone(&ch);
        ch.add(
            "remover".into(),
            Arc::new(move |_v: &u32| -> Result<(), MapperError> {
                inner.remove(&ListenerId::from("victim"));
                Ok(())
            }),
            None,
        )
        .unwrap();
        ch.add("victim".into(), recorder(&log, 9), None).unwrap();

        ch.publish(1, None, &ObserverSet::default()).unwrap();

        assert!(log.lock().is_empty());
        assert_eq!(ch.listener_count(), 1);
    }

    #[test]
    fn test_failures_are_collected_and_delivery_continues() {
        let ch = channel();
        let log = Arc::new(Mutex::new(Vec::new()));
        ch.add(
            "bad".into(),
            Arc::new(|_v: &u32| -> Result<(), MapperError> { Err(MapperError::new("boom")) }),
            None,
        )
        .unwrap();
        ch.add("good".into(), recorder(&log, 2), None).unwrap();

        let err = ch.publish(3, None, &ObserverSet::default()).unwrap_err();

        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].listener.as_str(), "bad");
        assert_eq!(*log.lock(), vec![(2, 3)]);
    }

    #[test]
    fn test_listener_limit_and_duplicate_id() {
        let ch = channel();
        let log = Arc::new(Mutex::new(Vec::new()));
        ch.add("a".into(), recorder(&log, 1), Some(2)).unwrap();

        let dup = ch.add("a".into(), recorder(&log, 1), Some(2)).unwrap_err();
        assert_eq!(dup.as_label(), "bus_duplicate_listener_id");

        ch.add("b".into(), recorder(&log, 2), Some(2)).unwrap();
        let full = ch.add("c".into(), recorder(&log, 3), Some(2)).unwrap_err();
        assert_eq!(full.as_label(), "bus_listener_limit");
    }

    #[test]
    fn test_pending_queue_limit() {
        let ch = channel();
        let inner = Arc::clone(&ch);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_inner = Arc::clone(&seen);
        ch.add(
            "a".into(),
            Arc::new(move |v: &u32| -> Result<(), MapperError> {
                if *v == 0 {
                    let first = inner.publish(1, Some(1), &ObserverSet::default());
                    let second = inner.publish(2, Some(1), &ObserverSet::default());
                    seen_inner.lock().push((first.is_ok(), second.is_err()));
                }
                Ok(())
            }),
            None,
        )
        .unwrap();

        ch.publish(0, Some(1), &ObserverSet::default()).unwrap();

        assert_eq!(*seen.lock(), vec![(true, true)]);
        assert_eq!(ch.value(), Some(1));
    }

    #[test]
    fn test_panicking_listener_releases_channel() {
        let ch = channel();
        ch.add(
            "p".into(),
            Arc::new(|v: &u32| -> Result<(), MapperError> {
                if *v == 1 {
                    panic!("listener bug");
                }
                Ok(())
            }),
            None,
        )
        .unwrap();

        let inner = Arc::clone(&ch);
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _ = inner.publish(1, None, &ObserverSet::default());
        }));
        assert!(res.is_err());

        ch.publish(2, None, &ObserverSet::default()).unwrap();
        assert_eq!(ch.value(), Some(2));
    }

    #[test]
    fn test_publisher_on_other_thread_waits_and_gets_own_failure() {
        let ch = channel();
        let barrier = Arc::new(Barrier::new(2));
        let inner = Arc::clone(&barrier);
        ch.add(
            "a".into(),
            Arc::new(move |v: &u32| -> Result<(), MapperError> {
                match *v {
                    1 => {
                        inner.wait();
                        thread::sleep(Duration::from_millis(50));
                        Ok(())
                    }
                    99 => Err(MapperError::new("rejected")),
                    _ => Ok(()),
                }
            }),
            None,
        )
        .unwrap();

        let first = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || ch.publish(1, None, &ObserverSet::default()))
        };
        barrier.wait();

        let err = ch.publish(99, None, &ObserverSet::default()).unwrap_err();
        assert_eq!(ch.value(), Some(99));
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].error, MapperError::new("rejected"));

        assert_eq!(first.join().unwrap(), Ok(()));
    }

    #[test]
    fn test_panic_keeps_newest_queued_value() {
        let ch = channel();
        let inner = Arc::clone(&ch);
        ch.add(
            "p".into(),
            Arc::new(move |v: &u32| -> Result<(), MapperError> {
                if *v == 1 {
                    inner
                        .publish(7, None, &ObserverSet::default())
                        .map_err(MapperError::new)?;
                    panic!("listener bug");
                }
                Ok(())
            }),
            None,
        )
        .unwrap();

        let outer = Arc::clone(&ch);
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _ = outer.publish(1, None, &ObserverSet::default());
        }));

        assert!(res.is_err());
        assert_eq!(ch.value(), Some(7));
    }

    #[test]
    fn test_waiting_publisher_proceeds_after_panic() {
        let ch = channel();
        let barrier = Arc::new(Barrier::new(2));
        let inner = Arc::clone(&barrier);
        ch.add(
            "p".into(),
            Arc::new(move |v: &u32| -> Result<(), MapperError> {
                if *v == 1 {
                    inner.wait();
                    thread::sleep(Duration::from_millis(30));
                    panic!("listener bug");
                }
                Ok(())
            }),
            None,
        )
        .unwrap();

        let first = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || ch.publish(1, None, &ObserverSet::default()))
        };
        barrier.wait();

        assert_eq!(ch.publish(7, None, &ObserverSet::default()), Ok(()));
        assert_eq!(ch.value(), Some(7));
        assert!(first.join().is_err());
    }

    #[test]
    fn test_remove_waits_for_running_invocation() {
        let ch = channel();
        let barrier = Arc::new(Barrier::new(2));
        let done = Arc::new(AtomicBool::new(false));
        {
            let barrier = Arc::clone(&barrier);
            let done = Arc::clone(&done);
            ch.add(
                "slow".into(),
                Arc::new(move |_v: &u32| -> Result<(), MapperError> {
                    barrier.wait();
                    thread::sleep(Duration::from_millis(50));
                    done.store(true, Ordering::Release);
                    Ok(())
                }),
                None,
            )
            .unwrap();
        }

        let publisher = {
            let ch = Arc::clone(&ch);
            thread::spawn(move || ch.publish(1, None, &ObserverSet::default()))
        };
        barrier.wait();

        assert!(ch.remove(&ListenerId::from("slow")));
        assert!(done.load(Ordering::Acquire));
        assert_eq!(publisher.join().unwrap(), Ok(()));
    }
}
