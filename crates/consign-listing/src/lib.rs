//! # consign-listing
//!
//! **List plane**: the partitioned, paginated view of an actor's holdings.
//!
//! ## Architecture
//!
//! 1. **Merge**: de-duplicating page merge and partition re-filtering (pure)
//! 2. **Candidates**: the batch candidate set and batch-control visibility
//! 3. **Coordinator**: [`ListCoordinator`], the only writer of the list
//! 4. **Snapshots**: TTL-bounded saved list positions keyed by list identity

pub mod candidates;
pub mod coordinator;
pub mod merge;
pub mod snapshot;

pub use candidates::BatchCandidateSet;
pub use coordinator::{ListCoordinator, PartitionView};
pub use merge::{merge_unique, refilter};
pub use snapshot::{ListSnapshot, SnapshotStore, list_identity};
