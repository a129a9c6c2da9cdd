//! Holdings partitions (list tabs) and list filters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CollectibleHolding, ConsignStatus, DeliveryStatus, SessionId, ZoneId};

/// The four mutually exclusive views of an actor's holdings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    /// Owned, untouched holdings.
    Holding,
    /// Pending or listed on the market.
    Consigning,
    Sold,
    /// Delivered holdings earning a recurring payout.
    DividendEligible,
}

impl Partition {
    pub const ALL: [Self; 4] = [
        Self::Holding,
        Self::Consigning,
        Self::Sold,
        Self::DividendEligible,
    ];

    /// Whether a holding semantically belongs to this partition.
    ///
    /// Used to re-filter backend pages whose filter endpoint is not exactly
    /// aligned with the partition boundary.
    #[must_use]
    pub fn admits(self, holding: &CollectibleHolding) -> bool {
        let delivered = holding.delivery_status == DeliveryStatus::Delivered;
        match self {
            Self::Holding => {
                !delivered
                    && matches!(holding.consign_status, ConsignStatus::NotConsigned)
            }
            Self::Consigning => {
                !delivered
                    && matches!(
                        holding.consign_status,
                        ConsignStatus::Pending | ConsignStatus::Consigning
                    )
            }
            Self::Sold => holding.consign_status == ConsignStatus::Sold,
            Self::DividendEligible => {
                delivered && holding.consign_status != ConsignStatus::Sold
            }
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Holding => write!(f, "holding"),
            Self::Consigning => write!(f, "consigning"),
            Self::Sold => write!(f, "sold"),
            Self::DividendEligible => write!(f, "dividend_eligible"),
        }
    }
}

/// Sort order for a holdings list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    PriceHighToLow,
    PriceLowToHigh,
}

/// Filters applied to a holdings list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListFilter {
    pub session: Option<SessionId>,
    pub zone: Option<ZoneId>,
    pub keyword: Option<String>,
    pub sort: SortOrder,
}
