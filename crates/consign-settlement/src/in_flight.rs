//! In-flight submission guard — one attempt per holding at a time.
//!
//! Each action attempt walks the per-holding phase machine:
//!
//! ```text
//!   Idle ──▶ Validating ──▶ Submitting ──▶ Success
//!              │   │            │
//!              │   └────────────┴────────▶ Error
//!              └──▶ Idle  (confirmation declined)
//! ```
//!
//! Starting an attempt while another one for the same holding is
//! `Validating` or `Submitting` returns
//! [`ConsignError::SubmissionInFlight`]. Finished phases are remembered
//! for observation in a bounded, oldest-first evicting record.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use consign_types::{ConsignError, HoldingId, Result};

/// Phase of the most recent action attempt on a holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Success,
    Error,
}

impl ActionPhase {
    /// Whether an attempt is still running.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Validating | Self::Submitting)
    }

    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Idle | Self::Success | Self::Error, Self::Validating)
                | (Self::Validating, Self::Submitting | Self::Error | Self::Idle)
                | (Self::Submitting, Self::Success | Self::Error)
        )
    }
}

#[derive(Debug, Default)]
struct Phases {
    current: HashMap<HoldingId, ActionPhase>,
    /// Holdings in a finished phase, oldest first.
    finished: VecDeque<HoldingId>,
}

/// Tracks the action phase of every holding touched by an orchestrator.
#[derive(Debug)]
pub struct InFlightGuard {
    phases: Mutex<Phases>,
    max_finished: usize,
}

impl InFlightGuard {
    /// Create a guard remembering at most `max_finished` finished attempts.
    ///
    /// # Panics
    /// Panics if `max_finished` is zero.
    pub fn new(max_finished: usize) -> Self {
        assert!(max_finished > 0, "InFlightGuard max_finished must be > 0");
        Self {
            phases: Mutex::new(Phases::default()),
            max_finished,
        }
    }

    fn phases(&self) -> MutexGuard<'_, Phases> {
        self.phases.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current phase of `holding`; `Idle` when never touched or evicted.
    pub fn phase(&self, holding: &HoldingId) -> ActionPhase {
        self.phases()
            .current
            .get(holding)
            .copied()
            .unwrap_or_default()
    }

    /// Start an attempt on `holding`.
    ///
    /// # Errors
    /// Returns [`ConsignError::SubmissionInFlight`] if an attempt on the
    /// same holding is still active.
    pub fn begin(&self, holding: &HoldingId) -> Result<Attempt<'_>> {
        let mut phases = self.phases();
        if phases
            .current
            .get(holding)
            .is_some_and(|phase| phase.is_active())
        {
            return Err(ConsignError::SubmissionInFlight(holding.clone()));
        }
        phases.finished.retain(|id| id != holding);
        phases
            .current
            .insert(holding.clone(), ActionPhase::Validating);
        Ok(Attempt {
            guard: self,
            holding: holding.clone(),
            done: false,
        })
    }

    fn set(&self, holding: &HoldingId, next: ActionPhase) {
        let mut phases = self.phases();
        let previous = phases.current.get(holding).copied().unwrap_or_default();
        if !previous.can_transition_to(next) {
            tracing::warn!(
                holding = %holding,
                from = ?previous,
                to = ?next,
                "Ignoring illegal action phase transition"
            );
            return;
        }

        match next {
            ActionPhase::Idle => {
                phases.current.remove(holding);
            }
            ActionPhase::Success | ActionPhase::Error => {
                phases.current.insert(holding.clone(), next);
                phases.finished.push_back(holding.clone());
                while phases.finished.len() > self.max_finished {
                    if let Some(oldest) = phases.finished.pop_front() {
                        phases.current.remove(&oldest);
                    }
                }
            }
            ActionPhase::Validating | ActionPhase::Submitting => {
                phases.current.insert(holding.clone(), next);
            }
        }
    }

    /// Number of holdings with an active attempt.
    pub fn active_count(&self) -> usize {
        self.phases()
            .current
            .values()
            .filter(|phase| phase.is_active())
            .count()
    }
}

/// A running attempt. Dropping it unfinished records `Error`.
#[derive(Debug)]
pub struct Attempt<'a> {
    guard: &'a InFlightGuard,
    holding: HoldingId,
    done: bool,
}

impl Attempt<'_> {
    /// Validation passed; the request is about to go out.
    pub fn submitting(&self) {
        self.guard.set(&self.holding, ActionPhase::Submitting);
    }

    pub fn succeed(mut self) {
        self.finish(ActionPhase::Success);
    }

    /// The user declined; the holding returns to `Idle`.
    pub fn abandon(mut self) {
        self.finish(ActionPhase::Idle);
    }

    fn finish(&mut self, phase: ActionPhase) {
        self.done = true;
        self.guard.set(&self.holding, phase);
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.finish(ActionPhase::Error);
        }
    }
}
