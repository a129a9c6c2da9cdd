//! Identifiers used throughout the consignment engine.
//!
//! Backend identifiers are opaque and arrive either as JSON numbers or as
//! strings, so every remote identifier is normalised to a string when it is
//! deserialised. Comparisons between identifiers are therefore plain string
//! equality. Client-generated submission keys use UUIDv7.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire form of an identifier: a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FlexId {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl FlexId {
    /// Normalise to the canonical string form.
    ///
    /// Integral floats drop their fractional part (`12.0` → `"12"`), and
    /// surrounding whitespace is trimmed from strings.
    #[must_use]
    pub fn normalize(self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::UInt(v) => v.to_string(),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 => {
                (v as i64).to_string()
            }
            Self::Float(v) => v.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(from = "FlexId")]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Parse a raw value; blank values are treated as absent.
            #[must_use]
            pub fn parse(value: &str) -> Option<Self> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self(trimmed.to_string()))
                }
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier carries no usable value.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl From<FlexId> for $name {
            fn from(raw: FlexId) -> Self {
                Self(raw.normalize())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// HoldingId
// ---------------------------------------------------------------------------

string_id!(
    /// Identifier of one holding (or one of its legacy fallback identifiers).
    HoldingId
);

// ---------------------------------------------------------------------------
// VoucherId
// ---------------------------------------------------------------------------

string_id!(
    /// Identifier of a single-use transfer voucher.
    VoucherId
);

// ---------------------------------------------------------------------------
// SessionId / ZoneId
// ---------------------------------------------------------------------------

string_id!(
    /// Trading session a holding was acquired in (and a voucher is bound to).
    SessionId
);

string_id!(
    /// Price zone within a trading session.
    ZoneId
);

// ---------------------------------------------------------------------------
// ActorId
// ---------------------------------------------------------------------------

string_id!(
    /// The account whose holdings and vouchers are being acted on.
    ActorId
);

// ---------------------------------------------------------------------------
// SubmissionKey
// ---------------------------------------------------------------------------

/// Client-generated key attached to every submission so a backend that
/// supports it can de-duplicate repeated requests. Uses UUIDv7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SubmissionKey(pub Uuid);

impl SubmissionKey {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubmissionKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
