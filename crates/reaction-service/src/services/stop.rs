//! Cooperative stop flag
//!
//! Workers check the flag before fetching each page, so a stop takes effect once
//! the page in flight has been flushed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop-after-current-page request
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every worker holding a clone to stop after its current page
    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
