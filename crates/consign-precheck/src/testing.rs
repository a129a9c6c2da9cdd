//! Scripted in-memory [`RemoteGate`] for tests. **Never use in production.**
//!
//! Every response is scripted up front; every call is recorded. Unscripted
//! calls get permissive defaults (empty pages, successful submissions).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use consign_types::{
    ActorId, BatchCandidates, BatchSubmitResponse, ConsignError, ConsignSubmitResponse,
    EligibilityCheck, HoldingId, HoldingsPage, ListFilter, Partition, PerItemResult, Result,
    SubmissionKey, SubmitResponse, VoucherPage,
};
use rust_decimal::Decimal;

use crate::gate::RemoteGate;

/// One recorded gate call.
#[derive(Debug, Clone, PartialEq)]
pub enum GateCall {
    Holdings { partition: Partition, page: u32 },
    Eligibility { holding: HoldingId },
    Vouchers { page: u32 },
    Delivery { holding: HoldingId, key: SubmissionKey },
    Consignment { holding: HoldingId, price: Decimal, key: SubmissionKey },
    Batch { holdings: Vec<HoldingId>, key: SubmissionKey },
    BatchCandidates,
}

#[derive(Default)]
struct Script {
    holdings: HashMap<Partition, Vec<HoldingsPage>>,
    holdings_down: bool,
    eligibility: HashMap<HoldingId, EligibilityCheck>,
    eligibility_down: bool,
    vouchers: Vec<VoucherPage>,
    vouchers_fail_from: Option<u32>,
    delivery: Option<SubmitResponse>,
    consignment: Option<ConsignSubmitResponse>,
    batch: Option<BatchSubmitResponse>,
    submissions_down: bool,
    candidates: BatchCandidates,
    server_price: Option<Decimal>,
    submit_delay: Option<Duration>,
    calls: Vec<GateCall>,
}

/// Scripted backend.
#[derive(Default)]
pub struct ScriptedGate {
    script: Mutex<Script>,
}

fn transport(reason: &str) -> ConsignError {
    ConsignError::Transport {
        reason: reason.to_string(),
    }
}

impl ScriptedGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append the next page of `partition`.
    pub fn push_holdings_page(&self, partition: Partition, page: HoldingsPage) {
        self.script().holdings.entry(partition).or_default().push(page);
    }

    /// Make holdings listings fail with a transport error.
    pub fn fail_holdings(&self, down: bool) {
        self.script().holdings_down = down;
    }

    pub fn set_eligibility(&self, holding: &str, check: EligibilityCheck) {
        self.script()
            .eligibility
            .insert(HoldingId::new(holding), check);
    }

    /// Make eligibility checks fail with a transport error.
    pub fn fail_eligibility(&self, down: bool) {
        self.script().eligibility_down = down;
    }

    /// Append the next voucher page.
    pub fn push_voucher_page(&self, page: VoucherPage) {
        self.script().vouchers.push(page);
    }

    /// Make voucher requests for `page` and later fail.
    pub fn fail_vouchers_from_page(&self, page: u32) {
        self.script().vouchers_fail_from = Some(page);
    }

    pub fn set_delivery_response(&self, response: SubmitResponse) {
        self.script().delivery = Some(response);
    }

    pub fn set_consignment_response(&self, response: ConsignSubmitResponse) {
        self.script().consignment = Some(response);
    }

    pub fn set_batch_response(&self, response: BatchSubmitResponse) {
        self.script().batch = Some(response);
    }

    /// Make every submission fail with a transport error.
    pub fn fail_submissions(&self, down: bool) {
        self.script().submissions_down = down;
    }

    pub fn set_batch_candidates(&self, candidates: BatchCandidates) {
        self.script().candidates = candidates;
    }

    /// Price the backend quotes instead of the engine's own derivation.
    pub fn set_server_price(&self, price: Decimal) {
        self.script().server_price = Some(price);
    }

    /// Delay every submission, to widen race windows in tests.
    pub fn set_submit_delay(&self, delay: Duration) {
        self.script().submit_delay = Some(delay);
    }

    /// All calls so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GateCall> {
        self.script().calls.clone()
    }

    #[must_use]
    pub fn voucher_pages_requested(&self) -> usize {
        self.count(|c| matches!(c, GateCall::Vouchers { .. }))
    }

    /// Number of submissions of any kind.
    #[must_use]
    pub fn submission_count(&self) -> usize {
        self.count(|c| {
            matches!(
                c,
                GateCall::Delivery { .. } | GateCall::Consignment { .. } | GateCall::Batch { .. }
            )
        })
    }

    fn count(&self, pred: impl Fn(&GateCall) -> bool) -> usize {
        self.script().calls.iter().filter(|c| pred(c)).count()
    }

    /// Record a submission and return the configured delay. The lock is
    /// released before the caller sleeps.
    fn record_submission(&self, call: GateCall) -> Result<Option<Duration>> {
        let mut script = self.script();
        script.calls.push(call);
        if script.submissions_down {
            return Err(transport("submission endpoint unreachable"));
        }
        Ok(script.submit_delay)
    }
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl RemoteGate for ScriptedGate {
    async fn holdings(
        &self,
        _actor: &ActorId,
        partition: Partition,
        _filter: &ListFilter,
        page: u32,
        _page_size: u32,
    ) -> Result<HoldingsPage> {
        let mut script = self.script();
        script.calls.push(GateCall::Holdings { partition, page });
        if script.holdings_down {
            return Err(transport("holdings unavailable"));
        }
        let index = page.saturating_sub(1) as usize;
        Ok(script
            .holdings
            .get(&partition)
            .and_then(|pages| pages.get(index))
            .cloned()
            .unwrap_or_else(|| HoldingsPage {
                has_more: Some(false),
                ..HoldingsPage::default()
            }))
    }

    async fn consignment_eligibility(&self, holding: &HoldingId) -> Result<EligibilityCheck> {
        let mut script = self.script();
        script.calls.push(GateCall::Eligibility {
            holding: holding.clone(),
        });
        if script.eligibility_down {
            return Err(transport("eligibility endpoint unreachable"));
        }
        Ok(script
            .eligibility
            .get(holding)
            .cloned()
            .unwrap_or_default())
    }

    async fn vouchers(&self, _actor: &ActorId, page: u32, _page_size: u32) -> Result<VoucherPage> {
        let mut script = self.script();
        script.calls.push(GateCall::Vouchers { page });
        if script.vouchers_fail_from.is_some_and(|from| page >= from) {
            return Err(transport("voucher endpoint unreachable"));
        }
        let index = page.saturating_sub(1) as usize;
        Ok(script.vouchers.get(index).cloned().unwrap_or_default())
    }

    async fn submit_delivery(
        &self,
        holding: &HoldingId,
        key: SubmissionKey,
    ) -> Result<SubmitResponse> {
        let delay = self.record_submission(GateCall::Delivery {
            holding: holding.clone(),
            key,
        })?;
        pause(delay).await;
        Ok(self.script().delivery.clone().unwrap_or(SubmitResponse {
            success: true,
            message: None,
        }))
    }

    async fn submit_consignment(
        &self,
        holding: &HoldingId,
        price: Decimal,
        key: SubmissionKey,
    ) -> Result<ConsignSubmitResponse> {
        let delay = self.record_submission(GateCall::Consignment {
            holding: holding.clone(),
            price,
            key,
        })?;
        pause(delay).await;
        Ok(self
            .script()
            .consignment
            .clone()
            .unwrap_or(ConsignSubmitResponse {
                success: true,
                ..ConsignSubmitResponse::default()
            }))
    }

    async fn submit_batch(
        &self,
        holdings: &[HoldingId],
        key: SubmissionKey,
    ) -> Result<BatchSubmitResponse> {
        let delay = self.record_submission(GateCall::Batch {
            holdings: holdings.to_vec(),
            key,
        })?;
        pause(delay).await;
        if let Some(response) = self.script().batch.clone() {
            return Ok(response);
        }
        let count = u32::try_from(holdings.len()).unwrap_or(u32::MAX);
        Ok(BatchSubmitResponse {
            total_count: count,
            success_count: count,
            failure_count: 0,
            per_item_results: Some(
                holdings
                    .iter()
                    .map(|id| PerItemResult {
                        holding_id: id.clone(),
                        success: true,
                        message: None,
                    })
                    .collect(),
            ),
            ..BatchSubmitResponse::default()
        })
    }

    async fn batch_candidates(&self, _actor: &ActorId) -> Result<BatchCandidates> {
        let mut script = self.script();
        script.calls.push(GateCall::BatchCandidates);
        Ok(script.candidates.clone())
    }

    fn consignment_price(&self, _buy_price: Decimal, _appreciation_rate: Decimal) -> Option<Decimal> {
        self.script().server_price
    }
}
