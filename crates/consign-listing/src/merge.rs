//! Page merging and partition re-filtering.

use std::collections::HashSet;

use consign_types::{CollectibleHolding, HoldingId, Partition};

/// Append `incoming` to `existing`, skipping holdings whose resolved id is
/// already present. First occurrence wins. Holdings without a resolvable id
/// cannot be compared and are always kept.
///
/// Returns the number of holdings appended.
pub fn merge_unique(existing: &mut Vec<CollectibleHolding>, incoming: Vec<CollectibleHolding>) -> usize {
    let mut seen: HashSet<HoldingId> = existing
        .iter()
        .filter_map(CollectibleHolding::resolve_id)
        .collect();
    let before = existing.len();
    let mut duplicates = 0usize;

    for holding in incoming {
        match holding.resolve_id() {
            Some(id) => {
                if seen.insert(id) {
                    existing.push(holding);
                } else {
                    duplicates += 1;
                }
            }
            None => {
                tracing::debug!(
                    title = holding.title.as_deref().unwrap_or(""),
                    "Keeping holding without resolvable id"
                );
                existing.push(holding);
            }
        }
    }

    let added = existing.len() - before;
    tracing::debug!(added, duplicates, total = existing.len(), "Merged holdings page");
    added
}

/// Keep only holdings that semantically belong to `partition`.
///
/// Backend filter endpoints are not exactly aligned with partition
/// boundaries; e.g. a holding mid-consignment may still appear under
/// "holding".
pub fn refilter(partition: Partition, holdings: Vec<CollectibleHolding>) -> Vec<CollectibleHolding> {
    let before = holdings.len();
    let kept: Vec<_> = holdings
        .into_iter()
        .filter(|holding| {
            if holding.has_conflicting_terminal_states() {
                tracing::warn!(
                    holding = %holding.log_ref(),
                    "Holding is both SOLD and DELIVERED"
                );
            }
            partition.admits(holding)
        })
        .collect();
    if kept.len() != before {
        tracing::debug!(
            %partition,
            dropped = before - kept.len(),
            "Dropped holdings outside partition boundary"
        );
    }
    kept
}
