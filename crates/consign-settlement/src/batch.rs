//! Batch consignment: many holdings, one request.
//!
//! The backend settles each item independently and answers with aggregate
//! counts plus per-item lines or a failure-reason histogram. Counts are
//! shown as reported; a broken `success + failure == total` identity is
//! logged, never corrected.

use std::collections::HashSet;
use std::sync::Arc;

use consign_precheck::RemoteGate;
use consign_types::{
    BatchSettlementResult, CollectibleHolding, ConsignError, HoldingId, Result, SubmissionKey,
};

use crate::notify::{Dialog, Notifier, Severity};
use crate::refresh::RefreshHook;

const TITLE: &str = "Batch consignment";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The candidate set was empty; no request was sent.
    Empty,
    Settled(BatchSettlementResult),
}

pub struct BatchOrchestrator {
    gate: Arc<dyn RemoteGate>,
    notifier: Arc<dyn Notifier>,
    refresh: RefreshHook,
}

impl BatchOrchestrator {
    pub fn new(gate: Arc<dyn RemoteGate>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gate,
            notifier,
            refresh: RefreshHook::new(),
        }
    }

    #[must_use]
    pub fn with_refresh_hook(mut self, refresh: RefreshHook) -> Self {
        self.refresh = refresh;
        self
    }

    /// Submit the candidate set as one bulk request.
    ///
    /// Eligibility belongs to whoever built the candidate set; the backend
    /// judges each item. Only candidates without a resolvable id are left
    /// out, logged as data-integrity errors.
    ///
    /// # Errors
    /// [`ConsignError::UnresolvableHolding`] when no candidate resolves, or
    /// the transport error when the request does not complete. Neither case
    /// sends or infers partial results.
    pub async fn submit_batch(&self, candidates: &[CollectibleHolding]) -> Result<BatchOutcome> {
        if candidates.is_empty() {
            self.notifier
                .show_toast(Severity::Info, TITLE, Some("No eligible items to consign"))
                .await;
            return Ok(BatchOutcome::Empty);
        }

        let ids = match resolve_ids(candidates) {
            Ok(ids) => ids,
            Err(err) => {
                self.report_failure(&err, candidates.len()).await;
                return Err(err);
            }
        };

        let key = SubmissionKey::new();
        tracing::debug!(batch = ids.len(), key = %key, "Submitting batch consignment");
        let response = match self.gate.submit_batch(&ids, key).await {
            Ok(response) => response,
            Err(err) => {
                self.report_failure(&err, ids.len()).await;
                return Err(err);
            }
        };

        let result = BatchSettlementResult::from_response(response);
        if !result.is_consistent() {
            tracing::warn!(
                total = result.total_count,
                success = result.success_count,
                failure = result.failure_count,
                "Batch accounting discrepancy: success + failure != total"
            );
        }
        if result.success_count > 0 {
            self.refresh.mark_stale();
        }

        if result.has_failures() {
            tracing::info!(
                batch = ids.len(),
                success = result.success_count,
                failure = result.failure_count,
                "Batch consignment settled with failures"
            );
            let dialog = Dialog::acknowledge(
                format!(
                    "{} succeeded, {} failed",
                    result.success_count, result.failure_count
                ),
                result.failure_report(),
            );
            self.notifier.show_blocking_dialog(dialog).await;
        } else {
            tracing::info!(batch = ids.len(), success = result.success_count, "Batch consignment settled");
            let message = format!("{} item(s) consigned", result.success_count);
            self.notifier
                .show_toast(Severity::Success, TITLE, Some(&message))
                .await;
        }

        Ok(BatchOutcome::Settled(result))
    }

    async fn report_failure(&self, err: &ConsignError, batch: usize) {
        tracing::error!(batch, kind = ?err.kind(), error = %err, "Batch consignment failed");
        self.notifier
            .show_toast(
                Severity::Error,
                &format!("{TITLE} failed"),
                Some(&err.user_message()),
            )
            .await;
    }
}

/// Resolved, de-duplicated ids in candidate order.
fn resolve_ids(candidates: &[CollectibleHolding]) -> Result<Vec<HoldingId>> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(candidates.len());
    for holding in candidates {
        match holding.resolve_id() {
            Some(id) => {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
            None => {
                tracing::error!(
                    title = holding.title.as_deref().unwrap_or(""),
                    "Batch candidate has no resolvable identifier; leaving it out"
                );
            }
        }
    }
    if ids.is_empty() {
        return Err(ConsignError::UnresolvableHolding {
            context: format!("batch of {} candidates, none resolvable", candidates.len()),
        });
    }
    Ok(ids)
}
