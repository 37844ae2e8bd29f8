//! Broadcast-once signal
//!
//! A `Signal` starts unfired and can be fired exactly once. Firing drops the
//! only sender of a zero-capacity channel, which disconnects every receiver at
//! the same instant, so any number of waiters are released together. There is
//! no reset.

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Signal {
    inner: Arc<SignalInner>,
}

struct SignalInner {
    sender: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
}

impl Signal {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            inner: Arc::new(SignalInner {
                sender: Mutex::new(Some(tx)),
                receiver: rx,
            }),
        }
    }

    /// Fire the signal. Returns `true` only for the call that actually fired it.
    pub fn fire(&self) -> bool {
        let sender = self.inner.sender.lock().take();
        sender.is_some()
    }

    pub fn is_fired(&self) -> bool {
        self.inner.sender.lock().is_none()
    }

    /// Block until the signal fires
    pub fn wait(&self) {
        // Nothing is ever sent, so recv only returns once the sender is gone
        let _ = self.inner.receiver.recv();
    }

    /// Block until the signal fires or `timeout` elapses. Returns `true` if fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(
            self.inner.receiver.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// Receiver that becomes ready (disconnected) when the signal fires.
    /// Intended for `crossbeam::channel::select!`.
    pub fn receiver(&self) -> Receiver<()> {
        self.inner.receiver.clone()
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("fired", &self.is_fired())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_fire_only_once() {
        let signal = Signal::new();
        assert!(!signal.is_fired());
        assert!(signal.fire());
        assert!(!signal.fire());
        assert!(signal.is_fired());
    }

    #[test]
    fn test_wait_returns_after_fire() {
        let signal = Signal::new();
        signal.fire();
        signal.wait();
        assert!(signal.wait_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn test_wait_timeout_unfired() {
        let signal = Signal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_all_waiters_released() {
        let signal = Signal::new();
        let released = Arc::new(AtomicUsize::new(0));

        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let signal = signal.clone();
                let released = Arc::clone(&released);
                thread::spawn(move || {
                    signal.wait();
                    released.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        assert_eq!(released.load(Ordering::SeqCst), 0);

        signal.fire();
        for waiter in waiters {
            waiter.join().unwrap();
        }
        assert_eq!(released.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_concurrent_fire_has_single_winner() {
        let signal = Signal::new();
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let signal = signal.clone();
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    if signal.fire() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }
}
