//! Cooperative cancellation for concurrent fetches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation token. Cancelling stops tasks that have not started
/// yet and is observed cooperatively by running ones; completed tasks keep
/// their outcome.
#[derive(Debug, Clone, Default)]
pub struct FetchCancellation {
    flag: Arc<AtomicBool>,
}

impl FetchCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to every holder of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
