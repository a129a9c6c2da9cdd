//! Batch candidate set and batch-control visibility.

use consign_precheck::is_transferable;
use consign_types::{CollectibleHolding, Partition, TradingStats};

/// Holdings eligible for one bulk consignment.
#[derive(Debug, Clone, Default)]
pub struct BatchCandidateSet {
    pub items: Vec<CollectibleHolding>,
    /// Trading-window statistics, when the backend reported them.
    pub stats: Option<TradingStats>,
}

impl BatchCandidateSet {
    /// Keep holdings in the holding partition that are transferable. When
    /// the backend reports a closed trading window, nothing qualifies.
    pub fn build(holdings: Vec<CollectibleHolding>, stats: Option<TradingStats>) -> Self {
        let trading_closed = stats
            .as_ref()
            .is_some_and(|s| !s.is_trading_window_open);
        let items = if trading_closed {
            Vec::new()
        } else {
            holdings
                .into_iter()
                .filter(|h| Partition::Holding.admits(h) && is_transferable(h))
                .collect()
        };
        Self { items, stats }
    }

    /// `Some(open)` when the backend reported the trading window.
    pub fn trading_window_open(&self) -> Option<bool> {
        self.stats.as_ref().map(|s| s.is_trading_window_open)
    }

    /// The batch control is hidden when there is nothing to submit or the
    /// trading window is closed.
    pub fn show_batch_control(&self) -> bool {
        !self.items.is_empty() && self.trading_window_open() != Some(false)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
