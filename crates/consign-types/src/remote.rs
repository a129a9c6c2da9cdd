//! Request/response shapes of the remote commerce backend.
//!
//! Only the fields the engine depends on are modelled; unknown fields are
//! ignored. Every optional field is genuinely optional on the wire.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CollectibleHolding, HoldingId, TransferVoucher};

/// Authoritative consignment-eligibility verdict for one holding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityCheck {
    #[serde(default)]
    pub unlocked: Option<bool>,
    #[serde(default)]
    pub can_consign: Option<bool>,
    #[serde(default)]
    pub remaining_seconds: Option<f64>,
    #[serde(default)]
    pub buy_price: Option<Decimal>,
    #[serde(default)]
    pub appreciation_rate: Option<Decimal>,
    #[serde(default)]
    pub is_old_asset_package: Option<bool>,
}

impl EligibilityCheck {
    /// The explicit boolean verdict, if the backend gave one.
    ///
    /// `can_consign` is consulted when `unlocked` is absent; when both are
    /// present, both must be true.
    #[must_use]
    pub fn explicit_verdict(&self) -> Option<bool> {
        match (self.unlocked, self.can_consign) {
            (Some(a), Some(b)) => Some(a && b),
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }
}

/// Response to a rights-delivery submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to a single consignment submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsignSubmitResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub voucher_consumed: Option<bool>,
    #[serde(default)]
    pub voucher_remaining: Option<u32>,
}

impl ConsignSubmitResponse {
    /// "voucher consumed / remaining" annotation, when the backend sent one.
    #[must_use]
    pub fn voucher_annotation(&self) -> Option<String> {
        match (self.voucher_consumed, self.voucher_remaining) {
            (Some(true), Some(left)) => Some(format!("1 voucher used, {left} remaining")),
            (Some(true), None) => Some("1 voucher used".to_string()),
            (_, Some(left)) => Some(format!("{left} voucher(s) remaining")),
            _ => None,
        }
    }
}

/// One line of a batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerItemResult {
    pub holding_id: HoldingId,
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to a bulk consignment submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSubmitResponse {
    pub total_count: u32,
    pub success_count: u32,
    pub failure_count: u32,
    #[serde(default)]
    pub per_item_results: Option<Vec<PerItemResult>>,
    #[serde(default)]
    pub failure_reason_histogram: Option<BTreeMap<String, u32>>,
    #[serde(default)]
    pub note: Option<String>,
}

/// One page of an actor's holdings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsPage {
    #[serde(default)]
    pub list: Vec<CollectibleHolding>,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub voucher_count_hint: Option<u32>,
}

/// One page of an actor's available vouchers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherPage {
    #[serde(default)]
    pub list: Vec<TransferVoucher>,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Trading-window statistics reported alongside batch candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingStats {
    pub is_trading_window_open: bool,
    #[serde(default)]
    pub current_time: Option<String>,
    #[serde(default)]
    pub active_session_count: u32,
    #[serde(default)]
    pub available_now_count: u32,
}

/// Backend-suggested batch candidates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCandidates {
    #[serde(default)]
    pub items: Vec<CollectibleHolding>,
    #[serde(default)]
    pub stats: Option<TradingStats>,
}
