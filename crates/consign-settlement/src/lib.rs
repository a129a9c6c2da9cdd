//! # consign-settlement
//!
//! **Settlement plane**: turns a user's intent into backend submissions.
//!
//! ## Architecture
//!
//! 1. [`ActionOrchestrator`]: single-item delivery and consignment, each
//!    attempt tracked per holding by the [`InFlightGuard`]
//! 2. [`BatchOrchestrator`]: one bulk consignment request, expanded into a
//!    [`BatchSettlementResult`](consign_types::BatchSettlementResult)
//! 3. [`Notifier`]: the toast/dialog surface the host implements
//! 4. [`RefreshHook`]: the only way an orchestrator affects the holdings list
//!
//! Client-side checks fail fast; the backend behind
//! [`RemoteGate`](consign_precheck::RemoteGate) decides.

pub mod action;
pub mod batch;
pub mod in_flight;
pub mod notify;
pub mod refresh;

pub use action::{ActionOrchestrator, ActionOutcome, derive_consignment_price};
pub use batch::{BatchOrchestrator, BatchOutcome};
pub use in_flight::{ActionPhase, Attempt, InFlightGuard};
pub use notify::{Dialog, DialogKind, Notifier, Severity};
#[cfg(any(test, feature = "test-helpers"))]
pub use notify::{RecordingNotifier, Toast};
pub use refresh::RefreshHook;
