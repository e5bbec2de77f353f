//! Frame-available notifications.
//!
//! A session tells its consumer "a pull is valid now" through a single
//! registered [`FrameAvailableListener`]. Only two events fire it:
//! a successful `reconfigure()` and releasing a delivered frame. Pulling a
//! frame never does.
//!
//! [`frame_signal`] provides the usual listener: a one-slot channel. At most
//! one notification is outstanding; firing again before the consumer takes it
//! coalesces into the pending one.
//!
//! ```text
//! reconfigure() ──┐
//!                 ├──► FrameNotifier ──► [ 1 slot ] ──► FrameWaiter ──► request_frame()
//! Frame::release ─┘       try_send                      blocking_wait()
//! ```

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tracing::debug;

/// Callback fired in-line, on the calling thread, when a frame may be pulled.
pub trait FrameAvailableListener: Send + Sync {
    fn on_frame_available(&self);
}

impl<F> FrameAvailableListener for F
where
    F: Fn() + Send + Sync,
{
    fn on_frame_available(&self) {
        self()
    }
}

/// Create a connected notifier / waiter pair.
pub fn frame_signal() -> (FrameNotifier, FrameWaiter) {
    let (tx, rx) = mpsc::channel(1);
    (FrameNotifier { tx }, FrameWaiter { rx })
}

/// Producer side; register it with `set_frame_available_listener`.
#[derive(Clone)]
pub struct FrameNotifier {
    tx: mpsc::Sender<()>,
}

impl FrameAvailableListener for FrameNotifier {
    fn on_frame_available(&self) {
        match self.tx.try_send(()) {
            Ok(()) => {}
            Err(TrySendError::Full(())) => debug!("frame notification already pending"),
            Err(TrySendError::Closed(())) => debug!("frame waiter dropped, notification ignored"),
        }
    }
}

/// Consumer side.
pub struct FrameWaiter {
    rx: mpsc::Receiver<()>,
}

impl FrameWaiter {
    /// Consume a pending notification without blocking.
    pub fn try_take(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(()) => true,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => false,
        }
    }

    /// Block the current thread until notified. Returns `false` once every
    /// notifier is gone and nothing is pending.
    ///
    /// Must not be called from inside an async runtime.
    pub fn blocking_wait(&mut self) -> bool {
        self.rx.blocking_recv().is_some()
    }

    pub async fn wait(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn notifications_coalesce_into_one_slot() {
        let (notifier, mut waiter) = frame_signal();
        notifier.on_frame_available();
        notifier.on_frame_available();
        notifier.on_frame_available();
        assert!(waiter.try_take());
        assert!(!waiter.try_take());
    }

    #[test]
    fn blocking_wait_wakes_across_threads() {
        let (notifier, mut waiter) = frame_signal();
        let handle = std::thread::spawn(move || waiter.blocking_wait());
        notifier.on_frame_available();
        assert!(handle.join().expect("waiter thread"));
    }

    #[test]
    fn waiter_sees_close_after_notifier_drop() {
        let (notifier, mut waiter) = frame_signal();
        notifier.on_frame_available();
        drop(notifier);
        assert!(waiter.blocking_wait());
        assert!(!waiter.blocking_wait());
    }

    #[test]
    fn closures_are_listeners() {
        let hits = Arc::new(AtomicU32::new(0));
        let h = Arc::clone(&hits);
        let listener = move || {
            h.fetch_add(1, Ordering::Relaxed);
        };
        listener.on_frame_available();
        listener.on_frame_available();
        assert_eq!(hits.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn async_wait() {
        let (notifier, mut waiter) = frame_signal();
        notifier.on_frame_available();
        assert!(waiter.wait().await);
    }
}
