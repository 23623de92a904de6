//! Cooperative cancellation.
//!
//! The flag is set at most once, from any thread (typically the signal
//! listener), and polled by the driver between candidates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop request observed at candidate boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent.
    #[inline]
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Release);
    }

    /// Non-blocking check.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }
}
