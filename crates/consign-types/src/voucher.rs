//! # TransferVoucher — the single-use consignment entitlement
//!
//! A voucher authorises **at most one** consignment, and only for a holding
//! whose (session, zone) pair equals the voucher's bound pair.
//!
//! ## State Machine
//!
//! ```text
//!   ┌───────────┐  consignment accepted   ┌──────────┐
//!   │ AVAILABLE ├────────────────────────▶│ CONSUMED │
//!   └───────────┘      (server-side)      └──────────┘
//! ```
//!
//! Vouchers are issued and consumed by the backend. The client only
//! observes them; it never mutates a voucher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SessionId, VoucherId, ZoneId};

/// Lifecycle state of a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherState {
    #[default]
    Available,
    /// Spent by a consignment. **Irreversible.**
    Consumed,
}

impl VoucherState {
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!((self, target), (Self::Available, Self::Consumed))
    }
}

impl std::fmt::Display for VoucherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "AVAILABLE"),
            Self::Consumed => write!(f, "CONSUMED"),
        }
    }
}

/// A single-use entitlement bound to one trading session and price zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferVoucher {
    #[serde(default)]
    pub id: Option<VoucherId>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub zone_id: Option<ZoneId>,
    #[serde(default)]
    pub state: VoucherState,
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TransferVoucher {
    /// Whether the voucher has passed its expiry time at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| now >= expiry)
    }

    /// Whether the voucher can still authorise a consignment at `now`.
    #[must_use]
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        self.state == VoucherState::Available && !self.is_expired_at(now)
    }

    /// Whether the voucher is bound to exactly this (session, zone) pair.
    #[must_use]
    pub fn binds(&self, session: &SessionId, zone: &ZoneId) -> bool {
        self.session_id.as_ref() == Some(session) && self.zone_id.as_ref() == Some(zone)
    }
}

/// Test helpers. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl TransferVoucher {
    /// An available voucher with a random id, valid for a day.
    pub fn dummy(session: &str, zone: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Some(VoucherId::from(rand::random::<u64>())),
            session_id: Some(SessionId::new(session)),
            zone_id: Some(ZoneId::new(zone)),
            state: VoucherState::Available,
            issued_at: Some(now),
            expires_at: Some(now + chrono::Duration::days(1)),
        }
    }

    /// A voucher with no identifier (exercises synthesised dedupe keys).
    pub fn dummy_anonymous(session: &str, zone: &str) -> Self {
        Self {
            id: None,
            ..Self::dummy(session, zone)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_transitions() {
        assert!(VoucherState::Available.can_transition_to(VoucherState::Consumed));
        assert!(!VoucherState::Consumed.can_transition_to(VoucherState::Available));
        assert!(!VoucherState::Consumed.can_transition_to(VoucherState::Consumed));
    }

    #[test]
    fn binds_requires_both_session_and_zone() {
        let v = TransferVoucher::dummy("s1", "z1");
        assert!(v.binds(&SessionId::new("s1"), &ZoneId::new("z1")));
        assert!(!v.binds(&SessionId::new("s1"), &ZoneId::new("z2")));
        assert!(!v.binds(&SessionId::new("s2"), &ZoneId::new("z1")));
    }

    #[test]
    fn expired_voucher_is_unavailable() {
        let mut v = TransferVoucher::dummy("s1", "z1");
        let now = Utc::now();
        assert!(v.is_available_at(now));
        v.expires_at = Some(now - chrono::Duration::seconds(1));
        assert!(!v.is_available_at(now));
    }

    #[test]
    fn consumed_voucher_is_unavailable() {
        let mut v = TransferVoucher::dummy("s1", "z1");
        v.state = VoucherState::Consumed;
        assert!(!v.is_available_at(Utc::now()));
    }

    #[test]
    fn numeric_bindings_deserialize() {
        let json = r#"{"id": 5, "sessionId": 12, "zoneId": 3, "state": "available"}"#;
        let v: TransferVoucher = serde_json::from_str(json).unwrap();
        assert!(v.binds(&SessionId::new("12"), &ZoneId::new("3")));
        assert!(v.expires_at.is_none());
    }
}
