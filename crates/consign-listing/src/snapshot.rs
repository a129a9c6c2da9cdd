//! TTL list snapshots.
//!
//! A snapshot records where the user was in a list (partition, page cursor,
//! filters, scroll offset) so the view can be restored after navigating
//! away. Snapshots are keyed by list identity and expire after a TTL;
//! expired entries are dropped when read.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use consign_types::{ActorId, EngineConfig, ListFilter, Partition};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Saved position in a holdings list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSnapshot {
    pub partition: Partition,
    /// Last page loaded (1-based).
    pub page: u32,
    pub filter: ListFilter,
    pub scroll_offset: u32,
    pub saved_at: DateTime<Utc>,
}

/// Stable key of a list: `SHA-256(domain || actor || view)`, hex encoded.
///
/// Each part is length-prefixed so `("ab", "c")` and `("a", "bc")` differ.
#[must_use]
pub fn list_identity(actor: &ActorId, view: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"consign:list:v1:");
    for part in [actor.as_str(), view] {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Bounded store of list snapshots with TTL expiry.
#[derive(Debug)]
pub struct SnapshotStore {
    entries: HashMap<String, ListSnapshot>,
    /// Insertion order (front = oldest).
    order: VecDeque<String>,
    ttl: Duration,
    capacity: usize,
}

impl SnapshotStore {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        assert!(capacity > 0, "SnapshotStore capacity must be > 0");
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            ttl,
            capacity,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let ttl = i64::try_from(config.list_snapshot_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self::new(ttl, config.list_snapshot_capacity)
    }

    /// Save or replace the snapshot under `key`.
    pub fn save(&mut self, key: String, snapshot: ListSnapshot) {
        self.order.retain(|k| *k != key);
        while self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, snapshot);
    }

    /// The snapshot under `key`, unless it expired at `now`. Expired
    /// snapshots are removed.
    pub fn restore(&mut self, key: &str, now: DateTime<Utc>) -> Option<ListSnapshot> {
        let saved_at = self.entries.get(key)?.saved_at;
        if now - saved_at >= self.ttl {
            tracing::debug!(key, "Discarding expired list snapshot");
            self.remove(key);
            return None;
        }
        self.entries.get(key).cloned()
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
