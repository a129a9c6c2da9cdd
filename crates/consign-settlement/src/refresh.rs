//! Refresh hook handed to orchestrators.
//!
//! Orchestrators never touch the holdings list. After a successful
//! submission they mark the list stale; the list owner reloads on its next
//! sync.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "list is stale" flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct RefreshHook {
    stale: Arc<AtomicBool>,
}

impl RefreshHook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    /// Clear the flag, returning whether it was set.
    pub fn take_stale(&self) -> bool {
        self.stale.swap(false, Ordering::AcqRel)
    }
}
