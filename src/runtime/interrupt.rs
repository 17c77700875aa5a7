//! Cooperative interruption of a running drive loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag asking a runtime to stop after the event in flight.
///
/// Clone it into a signal handler or another thread. The runtime checks
/// it only between events, so an event is always applied completely.
#[derive(Clone, Debug, Default)]
pub struct InterruptHandle {
    requested: Arc<AtomicBool>,
}

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop.
    pub fn interrupt(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Consume a pending request.
    pub(crate) fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let handle = InterruptHandle::new();
        let remote = handle.clone();

        remote.interrupt();

        assert!(handle.is_interrupted());
    }

    #[test]
    fn take_consumes_request() {
        let handle = InterruptHandle::new();
        handle.interrupt();

        assert!(handle.take());
        assert!(!handle.take());
        assert!(!handle.is_interrupted());
    }

    #[test]
    fn interrupt_from_another_thread() {
        let handle = InterruptHandle::new();
        let remote = handle.clone();

        std::thread::spawn(move || remote.interrupt())
            .join()
            .unwrap();

        assert!(handle.is_interrupted());
    }
}
