//! Remote gate, the boundary to the commerce backend.
//!
//! The engine consumes [`RemoteGate`]; it never implements the backend. The
//! backend's eligibility verdict is authoritative and always overrides the
//! client-side lock-window estimate:
//!
//! ```text
//!   explicit unlocked / canConsign  >  remainingSeconds  >  local LockWindow
//! ```

use async_trait::async_trait;
use consign_types::{
    ActorId, BatchCandidates, BatchSubmitResponse, ConsignSubmitResponse, EligibilityCheck,
    HoldingId, HoldingsPage, ListFilter, LockWindow, Partition, Result, SubmissionKey,
    SubmitResponse, VoucherPage,
};
use rust_decimal::Decimal;

/// Operations the engine consumes from the commerce backend.
///
/// Implementations return [`ConsignError::Transport`](consign_types::ConsignError::Transport)
/// when a request does not complete. A request that completes with a
/// server-reported failure is `Ok` with `success == false`.
#[async_trait]
pub trait RemoteGate: Send + Sync {
    /// One page (1-based) of a holdings partition.
    async fn holdings(
        &self,
        actor: &ActorId,
        partition: Partition,
        filter: &ListFilter,
        page: u32,
        page_size: u32,
    ) -> Result<HoldingsPage>;

    /// Authoritative lock/eligibility verdict for one holding.
    async fn consignment_eligibility(&self, holding: &HoldingId) -> Result<EligibilityCheck>;

    /// One page (1-based) of the actor's available vouchers.
    async fn vouchers(&self, actor: &ActorId, page: u32, page_size: u32) -> Result<VoucherPage>;

    async fn submit_delivery(
        &self,
        holding: &HoldingId,
        key: SubmissionKey,
    ) -> Result<SubmitResponse>;

    async fn submit_consignment(
        &self,
        holding: &HoldingId,
        price: Decimal,
        key: SubmissionKey,
    ) -> Result<ConsignSubmitResponse>;

    async fn submit_batch(
        &self,
        holdings: &[HoldingId],
        key: SubmissionKey,
    ) -> Result<BatchSubmitResponse>;

    /// Backend-suggested batch candidates plus trading-window statistics.
    async fn batch_candidates(&self, actor: &ActorId) -> Result<BatchCandidates>;

    /// Server-provided consignment price for `(buy_price, appreciation_rate)`.
    ///
    /// `None` means the engine derives `buy_price × (1 + rate)` itself.
    fn consignment_price(&self, _buy_price: Decimal, _appreciation_rate: Decimal) -> Option<Decimal> {
        None
    }
}

/// Which input decided a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictSource {
    /// Backend `unlocked` / `canConsign` flag.
    Explicit,
    /// Backend `remainingSeconds`.
    RemainingSeconds,
    /// Client-side lock-window estimate.
    LocalWindow,
}

/// Final consignment gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Open {
        source: VerdictSource,
    },
    Locked {
        /// Hours left when known; `None` when the backend refused without
        /// a time and the local window has no estimate.
        hours_remaining: Option<u32>,
        source: VerdictSource,
    },
}

impl GateVerdict {
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}

/// Whole hours (rounded up, at least one) for a positive second count.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn hours_from_seconds(seconds: f64) -> u32 {
    let hours = (seconds / 3600.0).ceil().max(1.0);
    if hours >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        hours as u32
    }
}

/// Usable remaining seconds: finite values only.
fn remaining_seconds(check: &EligibilityCheck) -> Option<f64> {
    check.remaining_seconds.filter(|s| s.is_finite())
}

/// Combine the backend check (when available) with the local estimate.
#[must_use]
pub fn resolve_gate_verdict(check: Option<&EligibilityCheck>, local: LockWindow) -> GateVerdict {
    let local_hours = (!local.passed).then_some(local.hours_remaining);

    let Some(check) = check else {
        return if local.passed {
            GateVerdict::Open {
                source: VerdictSource::LocalWindow,
            }
        } else {
            GateVerdict::Locked {
                hours_remaining: local_hours,
                source: VerdictSource::LocalWindow,
            }
        };
    };

    if let Some(open) = check.explicit_verdict() {
        return if open {
            GateVerdict::Open {
                source: VerdictSource::Explicit,
            }
        } else {
            let hours = remaining_seconds(check)
                .filter(|s| *s > 0.0)
                .map(hours_from_seconds)
                .or(local_hours);
            GateVerdict::Locked {
                hours_remaining: hours,
                source: VerdictSource::Explicit,
            }
        };
    }

    if let Some(seconds) = remaining_seconds(check) {
        return if seconds > 0.0 {
            GateVerdict::Locked {
                hours_remaining: Some(hours_from_seconds(seconds)),
                source: VerdictSource::RemainingSeconds,
            }
        } else {
            GateVerdict::Open {
                source: VerdictSource::RemainingSeconds,
            }
        };
    }

    resolve_gate_verdict(None, local)
}
