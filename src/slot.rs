//! Single-element latest-wins mailbox.
//!
//! The teacher's `rpc::channels` module is built on
//! `embassy_sync::channel::Channel`, a bounded FIFO: a full channel
//! blocks or rejects the sender. `Slot` is not that — a publish that
//! lands while a previous value is still unread *replaces* it rather
//! than queuing or blocking, which is the whole point: a serial port
//! can only ever be catching up to the newest frame, never draining a
//! backlog. This is the one place the async TCP side and the blocking
//! serial side actually touch.

use std::sync::{Condvar, Mutex};

struct Inner<T> {
    value: Option<T>,
    closed: bool,
}

/// A mailbox holding at most one pending value of `T`. `publish`
/// never blocks and never fails; `take` blocks until a value (or
/// shutdown) is available.
pub struct Slot<T> {
    inner: Mutex<Inner<T>>,
    cond: Condvar,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { value: None, closed: false }),
            cond: Condvar::new(),
        }
    }

    /// Publish `value`, overwriting any value not yet taken. Returns
    /// `true` if an unread value was discarded (the router counts
    /// this as a drop-by-replacement).
    pub fn publish(&self, value: T) -> bool {
        let mut guard = self.inner.lock().unwrap();
        let replaced = guard.value.replace(value).is_some();
        drop(guard);
        self.cond.notify_one();
        replaced
    }

    /// Block until a value is published or the slot is closed.
    /// Returns `None` only after `close` has been called and no
    /// value remains.
    pub fn take(&self) -> Option<T> {
        let mut guard = self.inner.lock().unwrap();
        loop {
            if let Some(value) = guard.value.take() {
                return Some(value);
            }
            if guard.closed {
                return None;
            }
            guard = self.cond.wait(guard).unwrap();
        }
    }

    /// Wake any blocked `take` with a permanent shutdown sentinel.
    /// Idempotent.
    pub fn close(&self) {
        let mut guard = self.inner.lock().unwrap();
        guard.closed = true;
        drop(guard);
        self.cond.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn publish_then_take_round_trips() {
        let slot: Slot<u32> = Slot::new();
        assert!(!slot.publish(7));
        assert_eq!(slot.take(), Some(7));
    }

    #[test]
    fn second_publish_before_take_reports_replacement() {
        let slot: Slot<u32> = Slot::new();
        assert!(!slot.publish(1));
        assert!(slot.publish(2));
        assert_eq!(slot.take(), Some(2));
    }

    #[test]
    fn close_unblocks_pending_take() {
        let slot: Arc<Slot<u32>> = Arc::new(Slot::new());
        let reader = {
            let slot = slot.clone();
            std::thread::spawn(move || slot.take())
        };
        std::thread::sleep(Duration::from_millis(20));
        slot.close();
        assert_eq!(reader.join().unwrap(), None);
    }

    #[test]
    fn close_after_publish_still_delivers_pending_value() {
        let slot: Slot<u32> = Slot::new();
        slot.publish(42);
        slot.close();
        assert_eq!(slot.take(), Some(42));
        assert_eq!(slot.take(), None);
    }
}
