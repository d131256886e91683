//! Cooperative cancellation for the one active pipeline run.
//!
//! A run holds a `CancelToken` and checks it before every network round trip
//! and before every upload chunk. Observing the token unwinds the run; the
//! coordinator has already moved on, so the unwind is silent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome marker for a run stopped by the user. Deliberately not part of
/// the error taxonomy: cancellation is a control-flow result, never a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cancelled by user")
    }
}

impl std::error::Error for Cancelled {}

/// Shared cancel flag for one pipeline run. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. The run sees it at its next checkpoint.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Checkpoint: returns `Err(Cancelled)` once `cancel()` has been called.
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
