//! Cooperative cancellation.
//!
//! Long runs (probing thousands of screenshots) can be abandoned from another
//! thread. The pipeline checks the flag after its read-only phase and before
//! its first write, so a cancelled run never leaves a partial set of
//! artifacts. Writes that already landed are not rolled back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
