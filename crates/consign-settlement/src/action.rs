//! Single-item actions: rights delivery and consignment.
//!
//! Both actions re-validate everything client-side before a request leaves,
//! then let the backend have the final word:
//!
//! ```text
//!   deliver:  blockers ─▶ resolve id ─▶ confirm (prior history) ─▶ submit
//!   consign:  blockers ─▶ resolve id ─▶ ┌ fresh lock check ┐ ─▶ price ─▶ submit
//!                                       └ voucher listing  ┘
//! ```
//!
//! Every failure is logged with the holding reference, shown as an error
//! toast and returned. Nothing here mutates the holdings list; a success
//! only marks it stale through the [`RefreshHook`].

use std::sync::Arc;

use consign_precheck::{
    Clock, EntitlementMatcher, GateVerdict, MatchMode, RemoteGate, SystemClock, check_lock_window,
    has_prior_transfer_history, load_available_vouchers, resolve_gate_verdict, transfer_blocker,
};
use consign_types::{
    ActorId, CollectibleHolding, ConsignError, EligibilityCheck, EngineConfig, HoldingId, Result,
    SubmissionKey,
};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::in_flight::{ActionPhase, Attempt, InFlightGuard};
use crate::notify::{Dialog, Notifier, Severity};
use crate::refresh::RefreshHook;

/// Finished attempts remembered for [`ActionOrchestrator::phase`].
const PHASE_HISTORY: usize = 256;

/// Result of a single-item action that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Delivered {
        holding: HoldingId,
        message: Option<String>,
    },
    Consigned {
        holding: HoldingId,
        price: Decimal,
        voucher_match: MatchMode,
        /// "voucher consumed / remaining" annotation, when reported.
        annotation: Option<String>,
    },
    /// The user declined the confirmation; nothing was submitted.
    Declined,
}

/// `buy_price × (1 + rate)` rounded to `scale` decimal places.
///
/// # Errors
/// [`ConsignError::InvalidPrice`] when the computation overflows or the
/// result is not strictly positive.
pub fn derive_consignment_price(
    holding: &HoldingId,
    buy_price: Decimal,
    appreciation_rate: Decimal,
    scale: u32,
) -> Result<Decimal> {
    let price = Decimal::ONE
        .checked_add(appreciation_rate)
        .and_then(|factor| buy_price.checked_mul(factor));
    validate_price(holding, price, scale)
}

fn validate_price(holding: &HoldingId, price: Option<Decimal>, scale: u32) -> Result<Decimal> {
    match price.map(|p| p.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)) {
        Some(p) if p > Decimal::ZERO => Ok(p),
        rounded => Err(ConsignError::InvalidPrice {
            holding: holding.clone(),
            price: rounded,
        }),
    }
}

/// Drives single-item delivery and consignment for one actor.
pub struct ActionOrchestrator {
    gate: Arc<dyn RemoteGate>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    actor: ActorId,
    matcher: EntitlementMatcher,
    in_flight: InFlightGuard,
    refresh: RefreshHook,
}

impl ActionOrchestrator {
    /// # Errors
    /// [`ConsignError::Configuration`] if `config` does not validate.
    pub fn new(
        gate: Arc<dyn RemoteGate>,
        notifier: Arc<dyn Notifier>,
        actor: ActorId,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            gate,
            notifier,
            clock: Arc::new(SystemClock),
            matcher: EntitlementMatcher::from_config(&config),
            config,
            actor,
            in_flight: InFlightGuard::new(PHASE_HISTORY),
            refresh: RefreshHook::new(),
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share the list owner's stale flag.
    #[must_use]
    pub fn with_refresh_hook(mut self, refresh: RefreshHook) -> Self {
        self.refresh = refresh;
        self
    }

    /// Phase of the latest attempt on `holding`.
    pub fn phase(&self, holding: &HoldingId) -> ActionPhase {
        self.in_flight.phase(holding)
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    /// Deliver the holding's rights.
    ///
    /// Holdings with prior transfer history need explicit confirmation;
    /// declining returns [`ActionOutcome::Declined`] without a network call.
    pub async fn submit_delivery(&self, holding: &CollectibleHolding) -> Result<ActionOutcome> {
        let result = self.deliver(holding).await;
        if let Err(err) = &result {
            self.report_failure("Delivery", holding, err).await;
        }
        result
    }

    async fn deliver(&self, holding: &CollectibleHolding) -> Result<ActionOutcome> {
        let id = self.precheck(holding, "delivery")?;
        let attempt = self.in_flight.begin(&id)?;

        if has_prior_transfer_history(holding) {
            let dialog = Dialog::confirm(
                "Confirm delivery",
                format!(
                    "Holding {id} is currently {}. Deliver its rights anyway?",
                    holding.status_indicator().text()
                ),
            );
            if !self.notifier.show_blocking_dialog(dialog).await {
                tracing::info!(holding = %id, "Delivery declined by user");
                attempt.abandon();
                return Ok(ActionOutcome::Declined);
            }
        }

        let key = SubmissionKey::new();
        attempt.submitting();
        tracing::debug!(holding = %id, key = %key, "Submitting delivery");
        let response = self.gate.submit_delivery(&id, key).await?;
        if !response.success {
            return Err(ConsignError::RemoteRejected {
                message: response.message,
            });
        }

        self.complete(attempt);
        tracing::info!(holding = %id, "Delivery accepted");
        self.notifier
            .show_toast(Severity::Success, "Delivery submitted", response.message.as_deref())
            .await;
        Ok(ActionOutcome::Delivered {
            holding: id,
            message: response.message,
        })
    }

    /// Consign the holding to the market.
    ///
    /// `cached_check` is an eligibility check obtained earlier (e.g. when the
    /// list was rendered). It is only used if the fresh check cannot be
    /// fetched.
    pub async fn submit_consignment(
        &self,
        holding: &CollectibleHolding,
        cached_check: Option<&EligibilityCheck>,
    ) -> Result<ActionOutcome> {
        let result = self.consign(holding, cached_check).await;
        if let Err(err) = &result {
            self.report_failure("Consignment", holding, err).await;
        }
        result
    }

    async fn consign(
        &self,
        holding: &CollectibleHolding,
        cached_check: Option<&EligibilityCheck>,
    ) -> Result<ActionOutcome> {
        let id = self.precheck(holding, "consignment")?;
        let attempt = self.in_flight.begin(&id)?;

        let now = self.clock.now();
        let local = check_lock_window(holding.acquired_at, now, self.config.lock_window_hours);

        let (fresh, vouchers) = tokio::join!(
            self.gate.consignment_eligibility(&id),
            load_available_vouchers(self.gate.as_ref(), &self.actor, &self.config),
        );

        let check = match fresh {
            Ok(check) => Some(check),
            Err(err) => {
                tracing::warn!(
                    holding = %id,
                    error = %err,
                    has_cached = cached_check.is_some(),
                    "Fresh eligibility check failed; falling back"
                );
                cached_check.cloned()
            }
        };

        match resolve_gate_verdict(check.as_ref(), local) {
            GateVerdict::Open { source } => {
                tracing::debug!(holding = %id, ?source, "Lock window open");
            }
            GateVerdict::Locked {
                hours_remaining: Some(hours_remaining),
                ..
            } => {
                return Err(ConsignError::LockWindowActive {
                    holding: id,
                    hours_remaining,
                });
            }
            GateVerdict::Locked {
                hours_remaining: None,
                ..
            } => return Err(ConsignError::ConsignmentNotPermitted(id)),
        }

        let vouchers = vouchers?;
        let voucher_match = self
            .matcher
            .find_matching_voucher(holding, &vouchers, now)
            .ok_or_else(|| ConsignError::NoEligibleVoucher(id.clone()))?;
        let mode = voucher_match.mode;

        let price = self.consignment_price(&id, holding, check.as_ref())?;

        let key = SubmissionKey::new();
        attempt.submitting();
        tracing::debug!(holding = %id, %price, key = %key, "Submitting consignment");
        let response = self.gate.submit_consignment(&id, price, key).await?;
        if !response.success {
            return Err(ConsignError::RemoteRejected {
                message: response.message,
            });
        }

        self.complete(attempt);
        let annotation = response.voucher_annotation();
        tracing::info!(holding = %id, %price, voucher_match = ?mode, "Consignment accepted");
        let detail = match (response.message.as_deref(), annotation.as_deref()) {
            (Some(msg), Some(note)) => Some(format!("{msg} ({note})")),
            (Some(msg), None) => Some(msg.to_string()),
            (None, note) => note.map(str::to_string),
        };
        self.notifier
            .show_toast(Severity::Success, "Consignment submitted", detail.as_deref())
            .await;

        Ok(ActionOutcome::Consigned {
            holding: id,
            price,
            voucher_match: mode,
            annotation,
        })
    }

    /// Blockers first, then identifier resolution. No network involved.
    fn precheck(&self, holding: &CollectibleHolding, action: &str) -> Result<HoldingId> {
        if let Some(blocker) = transfer_blocker(holding) {
            return Err(blocker.into_error(holding.resolve_id()));
        }
        holding
            .resolve_id()
            .ok_or_else(|| ConsignError::UnresolvableHolding {
                context: format!("{action} for actor {}", self.actor),
            })
    }

    /// Fresh-check values win over the holding's own; a server price wins
    /// over local derivation.
    fn consignment_price(
        &self,
        id: &HoldingId,
        holding: &CollectibleHolding,
        check: Option<&EligibilityCheck>,
    ) -> Result<Decimal> {
        let buy_price = check
            .and_then(|c| c.buy_price)
            .or(holding.buy_price)
            .ok_or_else(|| ConsignError::MissingBuyPrice(id.clone()))?;
        let rate = check
            .and_then(|c| c.appreciation_rate)
            .or(holding.appreciation_rate)
            .unwrap_or(Decimal::ZERO);

        match self.gate.consignment_price(buy_price, rate) {
            Some(quoted) => validate_price(id, Some(quoted), self.config.price_scale),
            None => derive_consignment_price(id, buy_price, rate, self.config.price_scale),
        }
    }

    fn complete(&self, attempt: Attempt<'_>) {
        attempt.succeed();
        self.refresh.mark_stale();
    }

    async fn report_failure(&self, title: &str, holding: &CollectibleHolding, err: &ConsignError) {
        tracing::error!(
            holding = %holding.log_ref(),
            actor = %self.actor,
            kind = ?err.kind(),
            error = %err,
            "{title} failed"
        );
        let message = err.user_message();
        self.notifier
            .show_toast(Severity::Error, &format!("{title} failed"), Some(&message))
            .await;
    }
}
