//! Process-wide cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to the single process-wide cancellation flag.
///
/// Set by the signal handler, and by the classifier when the store becomes
/// unreachable. Every stage observes it between queue operations.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    flag: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown. Idempotent.
    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_visible_to_clones() {
        let flag = ShutdownFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_requested());
        flag.request();
        assert!(observer.is_requested());
        flag.request();
        assert!(observer.is_requested());
    }
}
