//! # consign-precheck
//!
//! **Pre-check plane**: everything the engine decides before a submission
//! leaves the client.
//!
//! ## Architecture
//!
//! 1. **Clock**: injectable notion of "now" ([`Clock`], [`SystemClock`], [`FixedClock`])
//! 2. **Eligibility**: lock-window calculation and transfer blockers (pure)
//! 3. **Entitlement**: session/zone voucher matching (pure) and paginated voucher loading
//! 4. **Gate**: the [`RemoteGate`] boundary and authoritative verdict resolution
//!
//! Client-side checks here are an optimisation: they fail fast with a
//! specific reason. The backend behind [`RemoteGate`] stays authoritative.

pub mod clock;
pub mod eligibility;
pub mod entitlement;
pub mod gate;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use clock::{Clock, FixedClock, SystemClock};
pub use eligibility::{
    TransferBlocker, check_lock_window, has_prior_transfer_history, is_delivered, is_transferable,
    transfer_blocker,
};
pub use entitlement::{EntitlementMatcher, MatchMode, VoucherMatch, load_available_vouchers};
pub use gate::{GateVerdict, RemoteGate, VerdictSource, resolve_gate_verdict};
