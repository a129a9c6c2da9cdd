//! The lock window: a minimum holding period anchored at acquisition time.
//!
//! Derived, never stored. See `consign_precheck::eligibility` for the
//! calculation.

use serde::{Deserialize, Serialize};

/// Result of evaluating a holding's lock window at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockWindow {
    /// The full window has elapsed.
    pub passed: bool,
    /// Whole hours left, rounded up. Zero once passed.
    pub hours_remaining: u32,
    /// The anchor timestamp was usable.
    pub has_valid_anchor: bool,
}

impl LockWindow {
    /// Window for a missing or unusable anchor: locked, full duration left.
    #[must_use]
    pub fn invalid_anchor(window_hours: u32) -> Self {
        Self {
            passed: false,
            hours_remaining: window_hours,
            has_valid_anchor: false,
        }
    }

    /// Window that has fully elapsed.
    #[must_use]
    pub fn elapsed() -> Self {
        Self {
            passed: true,
            hours_remaining: 0,
            has_valid_anchor: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_anchor_reports_full_window() {
        let w = LockWindow::invalid_anchor(48);
        assert!(!w.passed);
        assert_eq!(w.hours_remaining, 48);
        assert!(!w.has_valid_anchor);
    }

    #[test]
    fn elapsed_has_nothing_remaining() {
        let w = LockWindow::elapsed();
        assert!(w.passed);
        assert_eq!(w.hours_remaining, 0);
    }
}
