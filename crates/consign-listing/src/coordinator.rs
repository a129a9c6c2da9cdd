//! List coordinator — the single writer of an actor's holdings view.
//!
//! Each [`Partition`] is paginated on its own. Pages are re-filtered to the
//! partition boundary and merged without duplicates. Orchestrators never
//! write here: they get a [`RefreshHook`] and the coordinator reloads on its
//! next [`sync`](ListCoordinator::sync).
//!
//! A failed fetch leaves the view exactly as it was.

use std::collections::HashMap;
use std::sync::Arc;

use consign_precheck::{Clock, RemoteGate, SystemClock};
use consign_settlement::RefreshHook;
use consign_types::{
    ActorId, CollectibleHolding, EngineConfig, HoldingsPage, ListFilter, Partition, Result,
};

use crate::candidates::BatchCandidateSet;
use crate::merge::{merge_unique, refilter};
use crate::snapshot::{ListSnapshot, SnapshotStore, list_identity};

/// Snapshot view name of the holdings list.
const HOLDINGS_VIEW: &str = "holdings";

/// Loaded state of one partition.
#[derive(Debug, Clone, Default)]
pub struct PartitionView {
    pub items: Vec<CollectibleHolding>,
    /// Pages loaded so far (the page cursor).
    pub pages_loaded: u32,
    pub has_more: bool,
    /// Total reported by the backend.
    pub total: Option<u64>,
    /// Voucher count reported alongside the latest page.
    pub voucher_count_hint: Option<u32>,
    /// Raw holdings received, before re-filtering.
    fetched: u64,
}

impl PartitionView {
    /// `received` is the raw page length before re-filtering; pagination
    /// follows the backend's page, not what survived the partition boundary.
    fn absorb(&mut self, page: HoldingsPage, received: usize, page_size: u32) {
        self.fetched += received as u64;
        self.pages_loaded += 1;
        self.total = page.total.or(self.total);
        if page.voucher_count_hint.is_some() {
            self.voucher_count_hint = page.voucher_count_hint;
        }
        let reached_total = self.total.is_some_and(|total| self.fetched >= total);
        self.has_more = page
            .has_more
            .unwrap_or(received >= page_size as usize)
            && !reached_total;
        merge_unique(&mut self.items, page.list);
    }
}

pub struct ListCoordinator {
    gate: Arc<dyn RemoteGate>,
    clock: Arc<dyn Clock>,
    actor: ActorId,
    page_size: u32,
    filter: ListFilter,
    active: Partition,
    views: HashMap<Partition, PartitionView>,
    refresh: RefreshHook,
    snapshots: SnapshotStore,
}

impl ListCoordinator {
    /// # Errors
    /// [`ConsignError::Configuration`](consign_types::ConsignError::Configuration)
    /// if `config` does not validate.
    pub fn new(gate: Arc<dyn RemoteGate>, actor: ActorId, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            gate,
            clock: Arc::new(SystemClock),
            actor,
            page_size: config.list_page_size,
            filter: ListFilter::default(),
            active: Partition::Holding,
            views: HashMap::new(),
            refresh: RefreshHook::new(),
            snapshots: SnapshotStore::from_config(config),
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Hook to hand to orchestrators; it shares this coordinator's stale flag.
    pub fn refresh_hook(&self) -> RefreshHook {
        self.refresh.clone()
    }

    pub fn active_partition(&self) -> Partition {
        self.active
    }

    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    pub fn view(&self, partition: Partition) -> Option<&PartitionView> {
        self.views.get(&partition)
    }

    pub fn items(&self, partition: Partition) -> &[CollectibleHolding] {
        self.views
            .get(&partition)
            .map(|view| view.items.as_slice())
            .unwrap_or(&[])
    }

    /// Fetch one page and re-filter it. Also returns the raw page length.
    async fn fetch(&self, partition: Partition, page: u32) -> Result<(HoldingsPage, usize)> {
        let mut fetched = self
            .gate
            .holdings(&self.actor, partition, &self.filter, page, self.page_size)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    actor = %self.actor,
                    %partition,
                    page,
                    error = %err,
                    "Holdings page failed to load"
                );
            })?;
        let received = fetched.list.len();
        fetched.list = refilter(partition, std::mem::take(&mut fetched.list));
        Ok((fetched, received))
    }

    /// Fetch pages `1..=pages` into a fresh view.
    async fn fetch_view(&self, partition: Partition, pages: u32) -> Result<PartitionView> {
        let mut view = PartitionView::default();
        for page in 1..=pages.max(1) {
            let (fetched, received) = self.fetch(partition, page).await?;
            view.absorb(fetched, received, self.page_size);
            if !view.has_more {
                break;
            }
        }
        Ok(view)
    }

    /// (Re)load `partition` from its first page. Returns the item count.
    pub async fn load_first_page(&mut self, partition: Partition) -> Result<usize> {
        let view = self.fetch_view(partition, 1).await?;
        let count = view.items.len();
        self.views.insert(partition, view);
        Ok(count)
    }

    /// Load the next page of `partition` and merge it. Returns the number of
    /// new holdings; zero when the partition is exhausted.
    pub async fn load_next_page(&mut self, partition: Partition) -> Result<usize> {
        let next = match self.views.get(&partition) {
            None => return self.load_first_page(partition).await,
            Some(view) if !view.has_more => return Ok(0),
            Some(view) => view.pages_loaded + 1,
        };
        let (fetched, received) = self.fetch(partition, next).await?;
        let view = self.views.entry(partition).or_default();
        let before = view.items.len();
        view.absorb(fetched, received, self.page_size);
        Ok(view.items.len() - before)
    }

    /// Make `partition` the active tab, loading it on first visit.
    pub async fn switch_partition(&mut self, partition: Partition) -> Result<()> {
        self.active = partition;
        if !self.views.contains_key(&partition) {
            self.load_first_page(partition).await?;
        }
        Ok(())
    }

    /// Replace the filters. Every partition is invalidated and the active
    /// one is reloaded.
    pub async fn set_filter(&mut self, filter: ListFilter) -> Result<()> {
        if filter == self.filter {
            return Ok(());
        }
        self.filter = filter;
        self.views.clear();
        self.load_first_page(self.active).await?;
        Ok(())
    }

    /// Reload every loaded partition (to its current page cursor) if an
    /// orchestrator marked the list stale. Returns whether a reload happened.
    ///
    /// # Errors
    /// A failed reload keeps the old views and leaves the list marked stale.
    pub async fn sync(&mut self) -> Result<bool> {
        if !self.refresh.take_stale() {
            return Ok(false);
        }

        let mut targets: Vec<(Partition, u32)> = self
            .views
            .iter()
            .map(|(partition, view)| (*partition, view.pages_loaded))
            .collect();
        if !self.views.contains_key(&self.active) {
            targets.push((self.active, 1));
        }
        targets.sort_unstable();

        let mut reloaded = Vec::with_capacity(targets.len());
        for (partition, pages) in targets {
            match self.fetch_view(partition, pages).await {
                Ok(view) => reloaded.push((partition, view)),
                Err(err) => {
                    self.refresh.mark_stale();
                    return Err(err);
                }
            }
        }

        tracing::info!(actor = %self.actor, partitions = reloaded.len(), "Holdings list reloaded");
        self.views.extend(reloaded);
        Ok(true)
    }

    /// Current batch candidate set.
    ///
    /// Uses the backend's batch listing; if it cannot be fetched, falls back
    /// to the loaded holding partition with the trading window unknown.
    pub async fn batch_candidate_set(&self) -> BatchCandidateSet {
        match self.gate.batch_candidates(&self.actor).await {
            Ok(candidates) => BatchCandidateSet::build(candidates.items, candidates.stats),
            Err(err) => {
                tracing::warn!(
                    actor = %self.actor,
                    error = %err,
                    "Batch candidate listing failed; using loaded holdings"
                );
                BatchCandidateSet::build(self.items(Partition::Holding).to_vec(), None)
            }
        }
    }

    fn snapshot_key(&self) -> String {
        list_identity(&self.actor, HOLDINGS_VIEW)
    }

    /// Remember the current position of the list.
    pub fn save_snapshot(&mut self, scroll_offset: u32) {
        let snapshot = ListSnapshot {
            partition: self.active,
            page: self
                .views
                .get(&self.active)
                .map_or(1, |view| view.pages_loaded.max(1)),
            filter: self.filter.clone(),
            scroll_offset,
            saved_at: self.clock.now(),
        };
        self.snapshots.save(self.snapshot_key(), snapshot);
    }

    /// Restore the saved position. A view already loaded under the same
    /// filter up to the saved page cursor is reused as is; otherwise the
    /// partition is reloaded up to that cursor. `None` when no fresh
    /// snapshot exists.
    pub async fn restore_snapshot(&mut self) -> Result<Option<ListSnapshot>> {
        let key = self.snapshot_key();
        let Some(snapshot) = self.snapshots.restore(&key, self.clock.now()) else {
            return Ok(None);
        };

        let filter_changed = snapshot.filter != self.filter;
        let reusable = !filter_changed
            && self
                .views
                .get(&snapshot.partition)
                .is_some_and(|view| view.pages_loaded >= snapshot.page);

        if !reusable {
            // Fetch under the saved filter; a failure leaves the list as it was.
            let previous = std::mem::replace(&mut self.filter, snapshot.filter.clone());
            let view = match self.fetch_view(snapshot.partition, snapshot.page).await {
                Ok(view) => view,
                Err(err) => {
                    self.filter = previous;
                    return Err(err);
                }
            };
            if filter_changed {
                self.views.clear();
            }
            self.views.insert(snapshot.partition, view);
        }
        self.active = snapshot.partition;
        tracing::debug!(
            partition = %snapshot.partition,
            page = snapshot.page,
            scroll_offset = snapshot.scroll_offset,
            reused = reusable,
            "Restored list snapshot"
        );
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use consign_precheck::testing::{GateCall, ScriptedGate};
    use consign_types::ConsignStatus;

    use super::*;

    fn page(ids: std::ops::Range<u32>, has_more: Option<bool>) -> HoldingsPage {
        HoldingsPage {
            list: ids
                .map(|i| CollectibleHolding::dummy(&format!("h{i}"), "s", "z"))
                .collect(),
            has_more,
            total: None,
            voucher_count_hint: None,
        }
    }

    fn coordinator(gate: &Arc<ScriptedGate>) -> ListCoordinator {
        ListCoordinator::new(gate.clone(), ActorId::new("u"), &EngineConfig::default()).unwrap()
    }

    fn holdings_requests(gate: &ScriptedGate) -> usize {
        gate.calls()
            .iter()
            .filter(|c| matches!(c, GateCall::Holdings { .. }))
            .count()
    }

    #[tokio::test]
    async fn pages_merge_without_duplicates() {
        let gate = Arc::new(ScriptedGate::new());
        gate.push_holdings_page(Partition::Holding, page(0..10, Some(true)));
        gate.push_holdings_page(Partition::Holding, page(8..18, Some(false)));
        let mut list = coordinator(&gate);

        assert_eq!(list.load_first_page(Partition::Holding).await.unwrap(), 10);
        assert_eq!(list.load_next_page(Partition::Holding).await.unwrap(), 8);
        assert_eq!(list.items(Partition::Holding).len(), 18);
        assert_eq!(list.load_next_page(Partition::Holding).await.unwrap(), 0);
        assert_eq!(
            gate.calls()
                .iter()
                .filter(|c| matches!(c, GateCall::Holdings { .. }))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn short_page_without_has_more_ends_pagination() {
        let gate = Arc::new(ScriptedGate::new());
        gate.push_holdings_page(Partition::Sold, {
            let mut p = page(0..3, None);
            for h in &mut p.list {
                h.consign_status = ConsignStatus::Sold;
            }
            p
        });
        let mut list = coordinator(&gate);
        list.switch_partition(Partition::Sold).await.unwrap();
        assert_eq!(list.active_partition(), Partition::Sold);
        assert!(!list.view(Partition::Sold).unwrap().has_more);
    }

    #[tokio::test]
    async fn holding_tab_drops_misfiled_items() {
        let gate = Arc::new(ScriptedGate::new());
        let mut p = page(0..3, Some(false));
        p.list[1].consign_status = ConsignStatus::Consigning;
        gate.push_holdings_page(Partition::Holding, p);
        let mut list = coordinator(&gate);
        assert_eq!(list.load_first_page(Partition::Holding).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn full_page_with_misfiled_item_keeps_paginating() {
        let gate = Arc::new(ScriptedGate::new());
        let mut first = page(0..10, None);
        first.list[3].consign_status = ConsignStatus::Consigning;
        gate.push_holdings_page(Partition::Holding, first);
        gate.push_holdings_page(Partition::Holding, page(10..20, None));
        let mut list = coordinator(&gate);

        assert_eq!(list.load_first_page(Partition::Holding).await.unwrap(), 9);
        assert!(list.view(Partition::Holding).unwrap().has_more);
        assert_eq!(list.load_next_page(Partition::Holding).await.unwrap(), 10);
        assert_eq!(list.items(Partition::Holding).len(), 19);
    }

    #[tokio::test]
    async fn total_counts_raw_items_not_refiltered_ones() {
        let gate = Arc::new(ScriptedGate::new());
        let mut only = page(0..4, Some(true));
        only.total = Some(4);
        only.list[0].consign_status = ConsignStatus::Consigning;
        gate.push_holdings_page(Partition::Holding, only);
        let mut list = coordinator(&gate);

        list.load_first_page(Partition::Holding).await.unwrap();
        assert!(!list.view(Partition::Holding).unwrap().has_more);
    }

    #[tokio::test]
    async fn restore_reuses_loaded_view_without_refetch() {
        let gate = Arc::new(ScriptedGate::new());
        gate.push_holdings_page(Partition::Holding, page(0..3, Some(false)));
        let mut list = coordinator(&gate);
        list.load_first_page(Partition::Holding).await.unwrap();
        list.save_snapshot(120);

        let restored = list.restore_snapshot().await.unwrap().unwrap();
        assert_eq!(restored.scroll_offset, 120);
        assert_eq!(list.items(Partition::Holding).len(), 3);
        assert_eq!(holdings_requests(&gate), 1);
    }

    #[tokio::test]
    async fn restore_refetches_under_a_different_filter() {
        let gate = Arc::new(ScriptedGate::new());
        gate.push_holdings_page(Partition::Holding, page(0..3, Some(false)));
        let mut list = coordinator(&gate);
        list.load_first_page(Partition::Holding).await.unwrap();
        list.save_snapshot(0);
        list.set_filter(ListFilter {
            keyword: Some("comet".into()),
            ..ListFilter::default()
        })
        .await
        .unwrap();
        assert_eq!(holdings_requests(&gate), 2);

        list.restore_snapshot().await.unwrap().unwrap();
        assert_eq!(list.filter(), &ListFilter::default());
        assert_eq!(holdings_requests(&gate), 3);
    }

    #[tokio::test]
    async fn failed_sync_keeps_views_and_stays_stale() {
        let gate = Arc::new(ScriptedGate::new());
        gate.push_holdings_page(Partition::Holding, page(0..2, Some(false)));
        let mut list = coordinator(&gate);
        list.load_first_page(Partition::Holding).await.unwrap();
        let before: Vec<_> = list
            .items(Partition::Holding)
            .iter()
            .map(CollectibleHolding::resolve_id)
            .collect();

        gate.fail_holdings(true);
        list.refresh_hook().mark_stale();
        assert!(list.sync().await.is_err());

        let after: Vec<_> = list
            .items(Partition::Holding)
            .iter()
            .map(CollectibleHolding::resolve_id)
            .collect();
        assert_eq!(before, after);
        assert!(list.refresh_hook().is_stale());

        gate.fail_holdings(false);
        assert!(list.sync().await.unwrap());
        assert!(!list.refresh_hook().is_stale());
    }

    #[tokio::test]
    async fn sync_reloads_only_when_stale() {
        let gate = Arc::new(ScriptedGate::new());
        gate.push_holdings_page(Partition::Holding, page(0..2, Some(false)));
        let mut list = coordinator(&gate);
        list.load_first_page(Partition::Holding).await.unwrap();

        assert!(!list.sync().await.unwrap());
        list.refresh_hook().mark_stale();
        assert!(list.sync().await.unwrap());
        assert!(!list.refresh_hook().is_stale());
        assert_eq!(
            gate.calls()
                .iter()
                .filter(|c| matches!(c, GateCall::Holdings { .. }))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn set_filter_invalidates_all_partitions() {
        let gate = Arc::new(ScriptedGate::new());
        gate.push_holdings_page(Partition::Holding, page(0..2, Some(false)));
        let mut list = coordinator(&gate);
        list.load_first_page(Partition::Holding).await.unwrap();
        list.load_first_page(Partition::Consigning).await.unwrap();

        list.set_filter(ListFilter {
            keyword: Some("comet".into()),
            ..ListFilter::default()
        })
        .await
        .unwrap();
        assert!(list.view(Partition::Consigning).is_none());
        assert!(list.view(Partition::Holding).is_some());
    }
}
