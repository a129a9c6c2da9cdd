//! # consign-types
//!
//! Shared types, errors, and configuration for the **consignment lifecycle
//! engine**.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`HoldingId`], [`VoucherId`], [`SessionId`], [`ZoneId`], [`ActorId`], [`SubmissionKey`]
//! - **Holding model**: [`CollectibleHolding`], [`ConsignStatus`], [`DeliveryStatus`], [`StatusIndicator`]
//! - **Voucher model**: [`TransferVoucher`], [`VoucherState`]
//! - **Lock window**: [`LockWindow`]
//! - **Partitions**: [`Partition`], [`ListFilter`], [`SortOrder`]
//! - **Batch model**: [`BatchSettlementResult`], [`ItemResult`]
//! - **Wire model**: [`EligibilityCheck`], [`SubmitResponse`], [`BatchSubmitResponse`], pages
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`ConsignError`] with `CS_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod batch;
pub mod config;
pub mod constants;
pub mod error;
pub mod holding;
pub mod ids;
pub mod lock_window;
pub mod partition;
pub mod remote;
pub mod voucher;

// Re-export all primary types at crate root for ergonomic imports:
//   use consign_types::{CollectibleHolding, TransferVoucher, ConsignError, ...};

pub use batch::*;
pub use config::*;
pub use error::*;
pub use holding::*;
pub use ids::*;
pub use lock_window::*;
pub use partition::*;
pub use remote::*;
pub use voucher::*;

// Constants are accessed via `consign_types::constants::FOO`
// (not re-exported to avoid name collisions).
