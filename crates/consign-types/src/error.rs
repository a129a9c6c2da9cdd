//! Error types for the consignment engine.
//!
//! All errors use the `CS_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Ineligibility (business-rule rejections)
//! - 2xx: Data integrity
//! - 3xx: Validation
//! - 4xx: Remote / transport
//! - 8xx: Submission guard
//! - 9xx: Configuration / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::HoldingId;

/// Coarse error taxonomy used by callers to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A business rule rejected the action. Never retried automatically.
    Ineligible,
    /// Upstream data is defective (e.g. no resolvable identifier).
    DataIntegrity,
    /// A computed value failed validation (e.g. non-positive price).
    Validation,
    /// Network failure or server-reported failure.
    Remote,
    /// Invalid engine configuration.
    Configuration,
    /// Unexpected internal state.
    Internal,
}

/// Central error enum for all consignment operations.
#[derive(Debug, Error)]
pub enum ConsignError {
    // =================================================================
    // Ineligibility (1xx)
    // =================================================================
    // Blocker variants carry the id only when the holding has one.
    /// The holding is already handed over to the market.
    #[error("CS_ERR_100: Holding {} is already in consignment", holding_ref(.0.as_ref()))]
    AlreadyConsigning(Option<HoldingId>),

    /// The holding has been sold; no further transfer is possible.
    #[error("CS_ERR_101: Holding {} is already sold", holding_ref(.0.as_ref()))]
    AlreadySold(Option<HoldingId>),

    /// The holding's rights have been delivered; no further transfer is possible.
    #[error("CS_ERR_102: Holding {} is already delivered", holding_ref(.0.as_ref()))]
    AlreadyDelivered(Option<HoldingId>),

    /// The lock window after acquisition has not elapsed yet.
    #[error("CS_ERR_103: Lock window active for holding {holding}: {hours_remaining}h remaining")]
    LockWindowActive {
        holding: HoldingId,
        hours_remaining: u32,
    },

    /// The backend refused consignment without quoting a remaining time.
    #[error("CS_ERR_104: Consignment not permitted for holding {0}")]
    ConsignmentNotPermitted(HoldingId),

    /// The actor holds no voucher bound to the holding's session and zone.
    #[error("CS_ERR_105: No eligible voucher for holding {0}")]
    NoEligibleVoucher(HoldingId),

    // =================================================================
    // Data integrity (2xx)
    // =================================================================
    /// None of the holding's identifiers resolved.
    #[error("CS_ERR_200: Holding identifier unresolvable ({context})")]
    UnresolvableHolding { context: String },

    // =================================================================
    // Validation (3xx)
    // =================================================================
    /// The consignment price is non-finite or not strictly positive.
    #[error("CS_ERR_300: Invalid consignment price for holding {holding}: {price:?}")]
    InvalidPrice {
        holding: HoldingId,
        price: Option<Decimal>,
    },

    /// The holding carries no acquisition price to derive a listing price from.
    #[error("CS_ERR_301: Missing acquisition price for holding {0}")]
    MissingBuyPrice(HoldingId),

    // =================================================================
    // Remote (4xx)
    // =================================================================
    /// The request did not complete (network, decoding, timeout).
    #[error("CS_ERR_400: Transport failure: {reason}")]
    Transport { reason: String },

    /// The server processed the request and reported failure.
    #[error("CS_ERR_401: Remote rejected request: {}", .message.as_deref().unwrap_or("no message"))]
    RemoteRejected { message: Option<String> },

    // =================================================================
    // Submission guard (8xx)
    // =================================================================
    /// A submission for this holding is already in flight.
    #[error("CS_ERR_800: Submission already in flight for holding {0}")]
    SubmissionInFlight(HoldingId),

    // =================================================================
    // Configuration / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("CS_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("CS_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, out-of-range values, etc.).
    #[error("CS_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl ConsignError {
    /// Classify the error into the engine's taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyConsigning(_)
            | Self::AlreadySold(_)
            | Self::AlreadyDelivered(_)
            | Self::LockWindowActive { .. }
            | Self::ConsignmentNotPermitted(_)
            | Self::NoEligibleVoucher(_)
            | Self::SubmissionInFlight(_) => ErrorKind::Ineligible,
            Self::UnresolvableHolding { .. } => ErrorKind::DataIntegrity,
            Self::InvalidPrice { .. } | Self::MissingBuyPrice(_) => ErrorKind::Validation,
            Self::Transport { .. } | Self::RemoteRejected { .. } => ErrorKind::Remote,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Internal(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Text suitable for a user-facing toast.
    ///
    /// Server-provided messages are passed through verbatim; everything else
    /// maps to a short reason without internal codes.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AlreadyConsigning(_) => "This item is already being consigned".to_string(),
            Self::AlreadySold(_) => "This item has already been sold".to_string(),
            Self::AlreadyDelivered(_) => "This item has already been delivered".to_string(),
            Self::LockWindowActive {
                hours_remaining, ..
            } => format!("Holding time not yet elapsed, about {hours_remaining} hour(s) remaining"),
            Self::ConsignmentNotPermitted(_) => {
                "This item cannot be consigned right now".to_string()
            }
            Self::NoEligibleVoucher(_) => {
                "No eligible voucher for this item's session and zone".to_string()
            }
            Self::UnresolvableHolding { .. } => {
                "Item data is incomplete, please refresh and try again".to_string()
            }
            Self::InvalidPrice { .. } | Self::MissingBuyPrice(_) => {
                "Invalid consignment price".to_string()
            }
            Self::RemoteRejected {
                message: Some(message),
            } if !message.trim().is_empty() => message.clone(),
            Self::SubmissionInFlight(_) => "A submission is already in progress".to_string(),
            Self::Transport { .. }
            | Self::RemoteRejected { .. }
            | Self::Internal(_)
            | Self::Serialization(_)
            | Self::Configuration(_) => "Operation failed, please try again later".to_string(),
        }
    }
}

fn holding_ref(holding: Option<&HoldingId>) -> String {
    holding.map_or_else(|| "(no id)".to_string(), ToString::to_string)
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ConsignError>;

impl From<serde_json::Error> for ConsignError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = ConsignError::AlreadySold(Some(HoldingId::new("h-1")));
        let msg = format!("{err}");
        assert!(msg.starts_with("CS_ERR_101"), "Got: {msg}");
        assert!(msg.contains("h-1"));
    }

    #[test]
    fn blocker_without_id_says_so() {
        let msg = ConsignError::AlreadyDelivered(None).to_string();
        assert_eq!(msg, "CS_ERR_102: Holding (no id) is already delivered");
    }

    #[test]
    fn lock_window_display() {
        let err = ConsignError::LockWindowActive {
            holding: HoldingId::new("h-2"),
            hours_remaining: 5,
        };
        let msg = format!("{err}");
        assert!(msg.contains("CS_ERR_103"));
        assert!(msg.contains("5h"));
        assert!(err.user_message().contains('5'));
    }

    #[test]
    fn remote_message_passes_through() {
        let err = ConsignError::RemoteRejected {
            message: Some("market closed".into()),
        };
        assert_eq!(err.user_message(), "market closed");

        let blank = ConsignError::RemoteRejected {
            message: Some("  ".into()),
        };
        assert_eq!(blank.user_message(), "Operation failed, please try again later");
    }

    #[test]
    fn taxonomy() {
        assert_eq!(
            ConsignError::NoEligibleVoucher(HoldingId::new("a")).kind(),
            ErrorKind::Ineligible
        );
        assert_eq!(
            ConsignError::UnresolvableHolding {
                context: "x".into()
            }
            .kind(),
            ErrorKind::DataIntegrity
        );
        assert_eq!(
            ConsignError::InvalidPrice {
                holding: HoldingId::new("a"),
                price: None,
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ConsignError::Transport {
                reason: "timeout".into()
            }
            .kind(),
            ErrorKind::Remote
        );
    }

    #[test]
    fn all_errors_have_cs_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(ConsignError::AlreadyConsigning(Some(HoldingId::new("a")))),
            Box::new(ConsignError::SubmissionInFlight(HoldingId::new("a"))),
            Box::new(ConsignError::RemoteRejected { message: None }),
            Box::new(ConsignError::Internal("test".into())),
            Box::new(ConsignError::Configuration("bad".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("CS_ERR_"),
                "Error missing CS_ERR_ prefix: {msg}"
            );
        }
    }
}
