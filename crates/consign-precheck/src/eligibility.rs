//! Eligibility calculator — pure functions over a holding's recorded state.
//!
//! ## Lock window
//!
//! A holding may only be consigned once the lock window (48h by default)
//! anchored at its acquisition time has elapsed. Anchors arrive in seconds
//! or milliseconds; values above `1e12` are milliseconds.
//!
//! Bad data never unlocks: a missing, zero, negative, non-finite or future
//! anchor yields a locked window with the full duration remaining.

use chrono::{DateTime, Utc};
use consign_types::{
    CollectibleHolding, ConsignError, ConsignStatus, DeliveryStatus, HoldingId, LockWindow,
    constants,
};

const MILLIS_PER_HOUR: u64 = 3_600_000;

/// Normalise a raw anchor timestamp to whole milliseconds since the epoch.
///
/// Returns `None` for non-finite or non-positive values.
#[allow(clippy::cast_possible_truncation)]
fn anchor_millis(raw: f64) -> Option<i64> {
    if !raw.is_finite() || raw <= 0.0 {
        return None;
    }
    let millis = if raw > constants::MILLIS_THRESHOLD {
        raw
    } else {
        raw * 1000.0
    };
    // `as` saturates on overflow; a saturated anchor is in the future anyway.
    Some(millis.round() as i64)
}

/// Evaluate the lock window for `anchor` at `now`.
///
/// `hours_remaining` is ceiling-rounded and never negative; it is zero once
/// the window has passed and `window_hours` when the anchor is unusable.
#[must_use]
pub fn check_lock_window(anchor: Option<f64>, now: DateTime<Utc>, window_hours: u32) -> LockWindow {
    let Some(anchor_ms) = anchor.and_then(anchor_millis) else {
        return LockWindow::invalid_anchor(window_hours);
    };

    let Some(elapsed_ms) = now.timestamp_millis().checked_sub(anchor_ms) else {
        return LockWindow::invalid_anchor(window_hours);
    };
    if elapsed_ms < 0 {
        return LockWindow::invalid_anchor(window_hours);
    }

    let window_ms = u64::from(window_hours) * MILLIS_PER_HOUR;
    let elapsed_ms = elapsed_ms.unsigned_abs();
    if elapsed_ms >= window_ms {
        return LockWindow::elapsed();
    }

    let hours = (window_ms - elapsed_ms).div_ceil(MILLIS_PER_HOUR);
    LockWindow {
        passed: false,
        hours_remaining: u32::try_from(hours).unwrap_or(window_hours),
        has_valid_anchor: true,
    }
}

/// Not mid-consignment and not sold.
#[must_use]
pub fn is_transferable(holding: &CollectibleHolding) -> bool {
    !matches!(
        holding.consign_status,
        ConsignStatus::Consigning | ConsignStatus::Sold
    )
}

#[must_use]
pub fn is_delivered(holding: &CollectibleHolding) -> bool {
    holding.delivery_status == DeliveryStatus::Delivered
}

/// Any consignment status other than NOT_CONSIGNED, including SOLD.
#[must_use]
pub fn has_prior_transfer_history(holding: &CollectibleHolding) -> bool {
    holding.consign_status != ConsignStatus::NotConsigned
}

/// Why a transfer action may not be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferBlocker {
    InConsignment,
    Sold,
    Delivered,
}

impl TransferBlocker {
    #[must_use]
    pub fn into_error(self, holding: Option<HoldingId>) -> ConsignError {
        match self {
            Self::InConsignment => ConsignError::AlreadyConsigning(holding),
            Self::Sold => ConsignError::AlreadySold(holding),
            Self::Delivered => ConsignError::AlreadyDelivered(holding),
        }
    }
}

/// Blocker for any transfer action (consignment or rights delivery), most
/// specific reason first.
#[must_use]
pub fn transfer_blocker(holding: &CollectibleHolding) -> Option<TransferBlocker> {
    if holding.consign_status == ConsignStatus::Sold {
        Some(TransferBlocker::Sold)
    } else if is_delivered(holding) {
        Some(TransferBlocker::Delivered)
    } else if !is_transferable(holding) {
        Some(TransferBlocker::InConsignment)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[allow(clippy::cast_precision_loss)]
    fn secs(at: DateTime<Utc>) -> Option<f64> {
        Some(at.timestamp() as f64)
    }

    #[allow(clippy::cast_precision_loss)]
    fn millis(at: DateTime<Utc>) -> Option<f64> {
        Some(at.timestamp_millis() as f64)
    }

    #[test]
    fn forty_seven_hours_is_locked_with_one_hour_left() {
        let now = Utc::now();
        let w = check_lock_window(millis(now - Duration::hours(47)), now, 48);
        assert!(!w.passed);
        assert_eq!(w.hours_remaining, 1);
        assert!(w.has_valid_anchor);
    }

    #[test]
    fn forty_nine_hours_is_passed() {
        let now = Utc::now();
        let w = check_lock_window(secs(now - Duration::hours(49)), now, 48);
        assert!(w.passed);
        assert_eq!(w.hours_remaining, 0);
    }

    #[test]
    fn exactly_the_window_is_passed() {
        let now = Utc::now();
        let w = check_lock_window(millis(now - Duration::hours(48)), now, 48);
        assert!(w.passed);
    }

    #[test]
    fn seconds_and_millis_agree() {
        let now = Utc::now();
        let at = now - Duration::hours(10);
        let a = check_lock_window(secs(at), now, 48);
        let b = check_lock_window(millis(at), now, 48);
        assert_eq!(a.passed, b.passed);
        assert_eq!(a.hours_remaining, 38);
        assert_eq!(b.hours_remaining, 38);
    }

    #[test]
    fn partial_hours_round_up() {
        let now = Utc::now();
        let w = check_lock_window(millis(now - Duration::minutes(30)), now, 48);
        assert_eq!(w.hours_remaining, 48);
        let w = check_lock_window(millis(now - Duration::minutes(90)), now, 48);
        assert_eq!(w.hours_remaining, 47);
    }

    #[test]
    fn invalid_anchors_are_locked_with_full_window() {
        let now = Utc::now();
        for anchor in [
            None,
            Some(0.0),
            Some(-5.0),
            Some(f64::NAN),
            Some(f64::INFINITY),
            millis(now + Duration::hours(1)),
        ] {
            let w = check_lock_window(anchor, now, 48);
            assert!(!w.passed, "anchor {anchor:?} must not unlock");
            assert!(!w.has_valid_anchor, "anchor {anchor:?} must be invalid");
            assert_eq!(w.hours_remaining, 48);
        }
    }

    #[test]
    fn passed_iff_elapsed_at_least_window() {
        let now = Utc::now();
        for minutes in (0..=60 * 72).step_by(37) {
            let w = check_lock_window(millis(now - Duration::minutes(minutes)), now, 48);
            assert_eq!(w.passed, minutes >= 48 * 60, "minutes={minutes}");
        }
    }

    #[test]
    fn transferability_by_status() {
        let cases = [
            (ConsignStatus::NotConsigned, true, false),
            (ConsignStatus::Pending, true, true),
            (ConsignStatus::Consigning, false, true),
            (ConsignStatus::Sold, false, true),
        ];
        for (status, transferable, history) in cases {
            let h = CollectibleHolding::dummy_with_status("h", status);
            assert_eq!(is_transferable(&h), transferable, "{status}");
            assert_eq!(has_prior_transfer_history(&h), history, "{status}");
        }
    }

    #[test]
    fn blockers_are_most_specific() {
        let sold = CollectibleHolding::dummy_with_status("a", ConsignStatus::Sold);
        assert_eq!(transfer_blocker(&sold), Some(TransferBlocker::Sold));

        let mut delivered = CollectibleHolding::dummy("b", "s", "z");
        delivered.delivery_status = DeliveryStatus::Delivered;
        assert_eq!(transfer_blocker(&delivered), Some(TransferBlocker::Delivered));

        let listed = CollectibleHolding::dummy_with_status("c", ConsignStatus::Consigning);
        assert_eq!(
            transfer_blocker(&listed),
            Some(TransferBlocker::InConsignment)
        );

        let pending = CollectibleHolding::dummy_with_status("d", ConsignStatus::Pending);
        assert_eq!(transfer_blocker(&pending), None);
    }

    #[test]
    fn blocker_errors_carry_holding() {
        let err = TransferBlocker::Sold.into_error(Some(HoldingId::new("x")));
        assert!(matches!(err, ConsignError::AlreadySold(Some(ref id)) if id.as_str() == "x"));
        assert!(matches!(
            TransferBlocker::Delivered.into_error(None),
            ConsignError::AlreadyDelivered(None)
        ));
    }
}
