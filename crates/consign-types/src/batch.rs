//! Batch settlement results.
//!
//! A [`BatchSettlementResult`] is the client-side expansion of one bulk
//! consignment response. It is ephemeral: built, reported, discarded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{BatchSubmitResponse, HoldingId};

/// Outcome of one holding inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    pub holding_id: HoldingId,
    pub success: bool,
    pub message: String,
}

/// Aggregate and per-item accounting of a batch submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettlementResult {
    pub total_count: u32,
    pub success_count: u32,
    pub failure_count: u32,
    /// Per-item lines, when the backend reported them.
    pub items: Vec<ItemResult>,
    /// Failure reason → count, when per-item lines are unavailable.
    pub failure_reasons: BTreeMap<String, u32>,
    /// Server-supplied advisory.
    pub note: Option<String>,
}

impl BatchSettlementResult {
    /// Expand a backend response. Counts are taken as reported, never corrected.
    #[must_use]
    pub fn from_response(response: BatchSubmitResponse) -> Self {
        let items = response
            .per_item_results
            .unwrap_or_default()
            .into_iter()
            .map(|item| ItemResult {
                holding_id: item.holding_id,
                success: item.success,
                message: item
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| {
                        if item.success {
                            "consigned".to_string()
                        } else {
                            "failed".to_string()
                        }
                    }),
            })
            .collect();

        Self {
            total_count: response.total_count,
            success_count: response.success_count,
            failure_count: response.failure_count,
            items,
            failure_reasons: response.failure_reason_histogram.unwrap_or_default(),
            note: response.note.filter(|n| !n.trim().is_empty()),
        }
    }

    /// Whether `success + failure == total`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        u64::from(self.success_count) + u64::from(self.failure_count)
            == u64::from(self.total_count)
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failure_count > 0
    }

    /// Per-item lines for failed holdings only.
    pub fn failed_items(&self) -> impl Iterator<Item = &ItemResult> {
        self.items.iter().filter(|item| !item.success)
    }

    /// Multi-line failure report.
    ///
    /// Per-item `id: message` lines are preferred; otherwise the reason
    /// histogram as `reason: count`. The advisory note, if any, comes last.
    #[must_use]
    pub fn failure_report(&self) -> String {
        let mut lines: Vec<String> = self
            .failed_items()
            .map(|item| format!("{}: {}", item.holding_id, item.message))
            .collect();

        if lines.is_empty() {
            lines.extend(
                self.failure_reasons
                    .iter()
                    .map(|(reason, count)| format!("{reason}: {count}")),
            );
        }

        if let Some(note) = &self.note {
            lines.push(note.clone());
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PerItemResult;

    fn item(id: &str, success: bool, message: Option<&str>) -> PerItemResult {
        PerItemResult {
            holding_id: HoldingId::new(id),
            success,
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn report_prefers_per_item_lines() {
        let result = BatchSettlementResult::from_response(BatchSubmitResponse {
            total_count: 3,
            success_count: 1,
            failure_count: 2,
            per_item_results: Some(vec![
                item("a", true, None),
                item("b", false, Some("locked")),
                item("c", false, None),
            ]),
            failure_reason_histogram: Some(BTreeMap::from([("locked".to_string(), 1)])),
            note: Some("try later".into()),
        });
        assert!(result.is_consistent());
        assert_eq!(result.failure_report(), "b: locked\nc: failed\ntry later");
    }

    #[test]
    fn report_falls_back_to_histogram() {
        let result = BatchSettlementResult::from_response(BatchSubmitResponse {
            total_count: 4,
            success_count: 1,
            failure_count: 3,
            per_item_results: None,
            failure_reason_histogram: Some(BTreeMap::from([
                ("locked".to_string(), 2),
                ("no voucher".to_string(), 1),
            ])),
            note: None,
        });
        assert_eq!(result.failure_report(), "locked: 2\nno voucher: 1");
    }

    #[test]
    fn inconsistent_counts_are_kept_as_reported() {
        let result = BatchSettlementResult::from_response(BatchSubmitResponse {
            total_count: 5,
            success_count: 4,
            failure_count: 4,
            ..BatchSubmitResponse::default()
        });
        assert!(!result.is_consistent());
        assert_eq!(result.success_count, 4);
        assert_eq!(result.failure_report(), "");
    }

    #[test]
    fn blank_note_dropped() {
        let result = BatchSettlementResult::from_response(BatchSubmitResponse {
            note: Some("  ".into()),
            ..BatchSubmitResponse::default()
        });
        assert!(result.note.is_none());
    }
}
