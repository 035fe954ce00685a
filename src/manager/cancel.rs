//! Cancellation token built on channel disconnection.
//!
//! The token owns the only sender of a zero-capacity channel that never
//! carries a message. Cancelling drops the sender, which disconnects the
//! channel and wakes every receiver at once, including receivers taking
//! part in a `crossbeam_channel::Select`.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A cloneable, one-way cancellation signal.
///
/// Pass one to [`Manager::start`](crate::Manager::start) to stop the
/// manager from elsewhere; cancelling has the same effect as calling
/// [`Manager::stop`](crate::Manager::stop).
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

struct Inner {
    trigger: Mutex<Option<Sender<Infallible>>>,
    signal: Receiver<Infallible>,
}

impl CancelToken {
    /// Create a token that has not been cancelled.
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                trigger: Mutex::new(Some(trigger)),
                signal,
            }),
        }
    }

    /// Cancel the token. Cancelling twice is a no-op.
    pub fn cancel(&self) {
        self.inner.trigger.lock().take();
    }

    /// Whether [`CancelToken::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.trigger.lock().is_none()
    }

    /// Block until the token is cancelled.
    pub fn wait(&self) {
        // Nothing is ever sent, so this only returns on disconnect.
        let _ = self.inner.signal.recv();
    }

    /// Block until the token is cancelled or `timeout` elapses.
    ///
    /// Returns `true` if the token was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(
            self.inner.signal.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// Receiver that becomes ready (disconnected) once cancelled.
    pub(crate) fn receiver(&self) -> &Receiver<Infallible> {
        &self.inner.signal
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_cancel() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(!token.wait_timeout(Duration::from_millis(10)));

        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.wait_timeout(Duration::from_millis(10)));

        // idempotent
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_wakes_clones_across_threads() {
        let token = CancelToken::new();
        let waiter = token.clone();

        let handle = thread::spawn(move || {
            let start = Instant::now();
            waiter.wait();
            start.elapsed()
        });

        thread::sleep(Duration::from_millis(20));
        token.cancel();

        let waited = handle.join().unwrap();
        assert!(waited >= Duration::from_millis(10));
    }
}
