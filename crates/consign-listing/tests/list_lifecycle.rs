//! List coordinator working with the settlement orchestrators.

use std::sync::Arc;

use chrono::{Duration, Utc};
use consign_listing::ListCoordinator;
use consign_precheck::FixedClock;
use consign_precheck::testing::{GateCall, ScriptedGate};
use consign_settlement::{BatchOrchestrator, BatchOutcome, RecordingNotifier};
use consign_types::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn holdings(ids: &[&str]) -> HoldingsPage {
    HoldingsPage {
        list: ids
            .iter()
            .map(|id| CollectibleHolding::dummy(id, "s1", "z1"))
            .collect(),
        has_more: Some(false),
        total: Some(ids.len() as u64),
        voucher_count_hint: Some(2),
    }
}

fn holdings_requests(gate: &ScriptedGate) -> usize {
    gate.calls()
        .iter()
        .filter(|c| matches!(c, GateCall::Holdings { .. }))
        .count()
}

#[tokio::test]
async fn batch_success_marks_list_stale_and_sync_reloads() {
    init_tracing();
    let gate = Arc::new(ScriptedGate::new());
    gate.push_holdings_page(Partition::Holding, holdings(&["a", "b", "c"]));
    gate.set_batch_candidates(BatchCandidates {
        items: holdings(&["a", "b"]).list,
        stats: Some(TradingStats {
            is_trading_window_open: true,
            ..TradingStats::default()
        }),
    });

    let mut list =
        ListCoordinator::new(gate.clone(), ActorId::new("u"), &EngineConfig::default()).unwrap();
    list.load_first_page(Partition::Holding).await.unwrap();
    assert_eq!(
        list.view(Partition::Holding).unwrap().voucher_count_hint,
        Some(2)
    );

    let candidates = list.batch_candidate_set().await;
    assert!(candidates.show_batch_control());

    let batch = BatchOrchestrator::new(gate.clone(), Arc::new(RecordingNotifier::new()))
        .with_refresh_hook(list.refresh_hook());
    let outcome = batch.submit_batch(&candidates.items).await.unwrap();
    assert!(matches!(outcome, BatchOutcome::Settled(ref r) if r.success_count == 2));

    assert_eq!(holdings_requests(&gate), 1);
    assert!(list.sync().await.unwrap());
    assert_eq!(holdings_requests(&gate), 2);
    assert!(!list.sync().await.unwrap());
}

#[tokio::test]
async fn empty_candidate_listing_hides_batch_control() {
    init_tracing();
    let gate = Arc::new(ScriptedGate::new());
    gate.push_holdings_page(Partition::Holding, holdings(&["a"]));
    let mut list =
        ListCoordinator::new(gate.clone(), ActorId::new("u"), &EngineConfig::default()).unwrap();
    list.load_first_page(Partition::Holding).await.unwrap();

    assert!(!list.batch_candidate_set().await.show_batch_control());
}

#[tokio::test]
async fn snapshot_restores_position_until_it_expires() {
    init_tracing();
    let gate = Arc::new(ScriptedGate::new());
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let mut list =
        ListCoordinator::new(gate.clone(), ActorId::new("u"), &EngineConfig::default())
            .unwrap()
            .with_clock(clock.clone());

    let filter = ListFilter {
        keyword: Some("nebula".into()),
        sort: SortOrder::PriceHighToLow,
        ..ListFilter::default()
    };
    list.switch_partition(Partition::Consigning).await.unwrap();
    list.set_filter(filter.clone()).await.unwrap();
    list.save_snapshot(480);

    list.set_filter(ListFilter::default()).await.unwrap();
    list.switch_partition(Partition::Sold).await.unwrap();

    clock.advance(Duration::minutes(10));
    let restored = list.restore_snapshot().await.unwrap().unwrap();
    assert_eq!(restored.scroll_offset, 480);
    assert_eq!(list.active_partition(), Partition::Consigning);
    assert_eq!(list.filter(), &filter);

    list.save_snapshot(0);
    clock.advance(Duration::minutes(31));
    assert!(list.restore_snapshot().await.unwrap().is_none());
}
