//! Completion signal for callback-style waits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Completion signal handed to the action of
/// [`TestContext::wait_until_done`](crate::TestContext::wait_until_done).
///
/// Clones share the same flag. Signalling more than once is harmless.
#[derive(Debug, Clone, Default)]
pub struct Done {
    signaled: Arc<AtomicBool>,
}

impl Done {
    /// Create an unsignalled flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the awaited work as finished.
    pub fn signal(&self) {
        self.signaled.store(true, Ordering::SeqCst);
    }

    /// Whether [`signal`](Self::signal) was called on any clone.
    #[must_use]
    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }
}

/// Signals its [`Done`] when dropped, including during a panic unwind.
#[derive(Debug)]
pub(crate) struct SignalOnDrop(pub(crate) Done);

impl Drop for SignalOnDrop {
    fn drop(&mut self) {
        self.0.signal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_signal() {
        let done = Done::new();
        let other = done.clone();
        assert!(!done.is_signaled());
        other.signal();
        assert!(done.is_signaled());
    }

    #[test]
    fn test_signal_on_drop() {
        let done = Done::new();
        drop(SignalOnDrop(done.clone()));
        assert!(done.is_signaled());
    }

    #[test]
    fn test_signal_on_unwind() {
        let done = Done::new();
        let guard_done = done.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = SignalOnDrop(guard_done);
            panic!("body blew up");
        });
        assert!(result.is_err());
        assert!(done.is_signaled());
    }
}
