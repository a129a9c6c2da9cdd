//! # CollectibleHolding — one unit of ownership
//!
//! ## Consignment State Machine
//!
//! ```text
//!   ┌───────────────┐      ┌─────────┐      ┌────────────┐      ┌──────┐
//!   │ NOT_CONSIGNED ├─────▶│ PENDING ├─────▶│ CONSIGNING ├─────▶│ SOLD │
//!   └──────┬────────┘      └─────────┘      └────────────┘      └──────┘
//!          │                                       ▲
//!          └───────────────────────────────────────┘
//! ```
//!
//! Delivery runs on its own axis: `NOT_DELIVERED → DELIVERED`.
//!
//! SOLD and DELIVERED are mutually exclusive terminal states. Once either is
//! reached no transfer action may be attempted. All transitions happen on
//! the server; the client only re-fetches.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{HoldingId, SessionId, ZoneId};

/// Consignment status of a holding. Carried on the wire as a numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ConsignStatus {
    /// Never offered for resale.
    #[default]
    NotConsigned,
    /// A consignment request was accepted and awaits market admission.
    Pending,
    /// Listed on the market.
    Consigning,
    /// Sold on the market. **Terminal.**
    Sold,
}

impl ConsignStatus {
    /// Wire code of this status.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::NotConsigned => 0,
            Self::Pending => 1,
            Self::Consigning => 2,
            Self::Sold => 3,
        }
    }

    /// Decode a wire code.
    ///
    /// Unknown codes decode as `Pending`: still transferable (the server
    /// decides), but counted as prior transfer history so delivery asks for
    /// confirmation.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::NotConsigned,
            1 => Self::Pending,
            2 => Self::Consigning,
            3 => Self::Sold,
            other => {
                tracing::warn!(code = other, "Unknown consign status code, treating as PENDING");
                Self::Pending
            }
        }
    }

    fn rank(self) -> u8 {
        match self {
            Self::NotConsigned => 0,
            Self::Pending => 1,
            Self::Consigning => 2,
            Self::Sold => 3,
        }
    }

    /// Transitions are monotonic: a status only ever moves forward.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        target.rank() > self.rank()
    }

    /// Default display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NotConsigned => "Held",
            Self::Pending => "Pending consignment",
            Self::Consigning => "Consigning",
            Self::Sold => "Sold",
        }
    }
}

impl From<i64> for ConsignStatus {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<ConsignStatus> for i64 {
    fn from(status: ConsignStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for ConsignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConsigned => write!(f, "NOT_CONSIGNED"),
            Self::Pending => write!(f, "PENDING"),
            Self::Consigning => write!(f, "CONSIGNING"),
            Self::Sold => write!(f, "SOLD"),
        }
    }
}

/// Rights-delivery status of a holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum DeliveryStatus {
    #[default]
    NotDelivered,
    /// Rights converted into a recurring payout. **Terminal.**
    Delivered,
}

impl DeliveryStatus {
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!((self, target), (Self::NotDelivered, Self::Delivered))
    }
}

impl From<i64> for DeliveryStatus {
    fn from(code: i64) -> Self {
        if code == 1 {
            Self::Delivered
        } else {
            Self::NotDelivered
        }
    }
}

impl From<DeliveryStatus> for i64 {
    fn from(status: DeliveryStatus) -> Self {
        match status {
            DeliveryStatus::NotDelivered => 0,
            DeliveryStatus::Delivered => 1,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDelivered => write!(f, "NOT_DELIVERED"),
            Self::Delivered => write!(f, "DELIVERED"),
        }
    }
}

/// What to show as a holding's status: the coded statuses, or a label the
/// backend supplied as an authoritative override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusIndicator {
    Coded {
        consign: ConsignStatus,
        delivery: DeliveryStatus,
    },
    Labeled(String),
}

impl StatusIndicator {
    /// Text to display.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Labeled(label) => label.clone(),
            Self::Coded {
                delivery: DeliveryStatus::Delivered,
                ..
            } => "Delivered".to_string(),
            Self::Coded { consign, .. } => consign.label().to_string(),
        }
    }
}

/// One unit of a collectible owned by an actor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectibleHolding {
    /// Primary identifier.
    #[serde(default)]
    pub holding_id: Option<HoldingId>,
    /// Legacy order identifier (first fallback).
    #[serde(default)]
    pub legacy_order_id: Option<HoldingId>,
    /// Legacy record identifier (second fallback).
    #[serde(default)]
    pub legacy_record_id: Option<HoldingId>,
    /// Catalog item identifier (last fallback).
    #[serde(default)]
    pub catalog_id: Option<HoldingId>,
    #[serde(default)]
    pub title: Option<String>,
    /// Acquisition price.
    #[serde(default)]
    pub buy_price: Option<Decimal>,
    /// Raw acquisition (payment) timestamp, seconds or milliseconds.
    #[serde(default, alias = "payTime")]
    pub acquired_at: Option<f64>,
    /// Appreciation rate as a fraction (0.05 = 5%).
    #[serde(default)]
    pub appreciation_rate: Option<Decimal>,
    #[serde(default)]
    pub consign_status: ConsignStatus,
    #[serde(default)]
    pub delivery_status: DeliveryStatus,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub zone_id: Option<ZoneId>,
    /// Backend display override; wins over the coded statuses when present.
    #[serde(default)]
    pub status_label: Option<String>,
}

impl CollectibleHolding {
    /// Resolve the identifier to act on.
    ///
    /// Order: primary → legacy order id → legacy record id → catalog id.
    /// Blank identifiers count as absent.
    #[must_use]
    pub fn resolve_id(&self) -> Option<HoldingId> {
        [
            &self.holding_id,
            &self.legacy_order_id,
            &self.legacy_record_id,
            &self.catalog_id,
        ]
        .into_iter()
        .flatten()
        .find(|id| !id.is_blank())
        .cloned()
    }

    /// Resolve the status to display. A non-blank label takes precedence.
    #[must_use]
    pub fn status_indicator(&self) -> StatusIndicator {
        match self.status_label.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => StatusIndicator::Labeled(label.to_string()),
            _ => StatusIndicator::Coded {
                consign: self.consign_status,
                delivery: self.delivery_status,
            },
        }
    }

    /// Whether the holding reached SOLD or DELIVERED.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.consign_status == ConsignStatus::Sold
            || self.delivery_status == DeliveryStatus::Delivered
    }

    /// Both terminal states at once: a backend data defect.
    #[must_use]
    pub fn has_conflicting_terminal_states(&self) -> bool {
        self.consign_status == ConsignStatus::Sold
            && self.delivery_status == DeliveryStatus::Delivered
    }

    /// Human-readable reference for logs: resolved id or `"<unresolved>"`.
    #[must_use]
    pub fn log_ref(&self) -> String {
        self.resolve_id()
            .map_or_else(|| "<unresolved>".to_string(), |id| id.to_string())
    }
}

/// Test helpers. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl CollectibleHolding {
    /// A consignable holding: bought for 500 at 5% appreciation, not consigned.
    pub fn dummy(id: &str, session: &str, zone: &str) -> Self {
        Self {
            holding_id: Some(HoldingId::new(id)),
            title: Some(format!("Collectible {id}")),
            buy_price: Some(Decimal::new(500, 0)),
            acquired_at: None,
            appreciation_rate: Some(Decimal::new(5, 2)),
            session_id: Some(SessionId::new(session)),
            zone_id: Some(ZoneId::new(zone)),
            ..Self::default()
        }
    }

    /// Same as [`dummy`](Self::dummy) with a given consignment status.
    pub fn dummy_with_status(id: &str, status: ConsignStatus) -> Self {
        Self {
            consign_status: status,
            ..Self::dummy(id, "s1", "z1")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_id_prefers_primary() {
        let mut h = CollectibleHolding::dummy("primary", "s", "z");
        h.legacy_order_id = Some(HoldingId::new("order"));
        assert_eq!(h.resolve_id(), Some(HoldingId::new("primary")));
    }

    #[test]
    fn resolve_id_falls_back_in_order() {
        let h = CollectibleHolding {
            legacy_record_id: Some(HoldingId::new("record")),
            catalog_id: Some(HoldingId::new("catalog")),
            ..CollectibleHolding::default()
        };
        assert_eq!(h.resolve_id(), Some(HoldingId::new("record")));

        let h = CollectibleHolding {
            holding_id: Some(HoldingId::new("  ")),
            catalog_id: Some(HoldingId::new("catalog")),
            ..CollectibleHolding::default()
        };
        assert_eq!(h.resolve_id(), Some(HoldingId::new("catalog")));
    }

    #[test]
    fn resolve_id_none_when_all_absent() {
        assert!(CollectibleHolding::default().resolve_id().is_none());
        assert_eq!(CollectibleHolding::default().log_ref(), "<unresolved>");
    }

    #[test]
    fn status_transitions_forward_only() {
        assert!(ConsignStatus::NotConsigned.can_transition_to(ConsignStatus::Pending));
        assert!(ConsignStatus::Pending.can_transition_to(ConsignStatus::Consigning));
        assert!(ConsignStatus::Consigning.can_transition_to(ConsignStatus::Sold));
        assert!(!ConsignStatus::Sold.can_transition_to(ConsignStatus::Consigning));
        assert!(!ConsignStatus::Consigning.can_transition_to(ConsignStatus::Consigning));
        assert!(DeliveryStatus::NotDelivered.can_transition_to(DeliveryStatus::Delivered));
        assert!(!DeliveryStatus::Delivered.can_transition_to(DeliveryStatus::NotDelivered));
    }

    #[test]
    fn label_takes_precedence() {
        let mut h = CollectibleHolding::dummy_with_status("a", ConsignStatus::Consigning);
        assert_eq!(h.status_indicator().text(), "Consigning");

        h.status_label = Some("Awaiting match".into());
        assert_eq!(
            h.status_indicator(),
            StatusIndicator::Labeled("Awaiting match".into())
        );

        h.status_label = Some("   ".into());
        assert!(matches!(h.status_indicator(), StatusIndicator::Coded { .. }));
    }

    #[test]
    fn delivered_display_wins_over_consign_code() {
        let mut h = CollectibleHolding::dummy("a", "s", "z");
        h.delivery_status = DeliveryStatus::Delivered;
        assert_eq!(h.status_indicator().text(), "Delivered");
        assert!(h.is_terminal());
    }

    #[test]
    fn deserializes_wire_shape() {
        let json = r#"{
            "holdingId": 88,
            "buyPrice": "500",
            "payTime": 1700000000000,
            "appreciationRate": 0.05,
            "consignStatus": 2,
            "deliveryStatus": 0,
            "sessionId": 3,
            "zoneId": "7",
            "statusLabel": null
        }"#;
        let h: CollectibleHolding = serde_json::from_str(json).unwrap();
        assert_eq!(h.resolve_id(), Some(HoldingId::new("88")));
        assert_eq!(h.consign_status, ConsignStatus::Consigning);
        assert_eq!(h.session_id, Some(SessionId::new("3")));
        assert_eq!(h.buy_price, Some(Decimal::new(500, 0)));
        assert_eq!(h.acquired_at, Some(1_700_000_000_000.0));
    }

    #[test]
    fn unknown_status_code_is_pending() {
        assert_eq!(ConsignStatus::from_code(42), ConsignStatus::Pending);
        assert_eq!(DeliveryStatus::from(7), DeliveryStatus::NotDelivered);
    }

    #[test]
    fn conflicting_terminal_states_detected() {
        let mut h = CollectibleHolding::dummy_with_status("a", ConsignStatus::Sold);
        assert!(!h.has_conflicting_terminal_states());
        h.delivery_status = DeliveryStatus::Delivered;
        assert!(h.has_conflicting_terminal_states());
    }
}
