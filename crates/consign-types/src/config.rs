//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::{ConsignError, Result, constants};

/// Tunables of the consignment engine.
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum holding period before consignment, in hours.
    pub lock_window_hours: u32,
    /// Page size used when listing vouchers.
    pub voucher_page_size: u32,
    /// Hard cap on voucher pages per action.
    pub voucher_max_pages: u32,
    /// Page size for holdings partitions.
    pub list_page_size: u32,
    /// How long a saved list snapshot stays valid.
    pub list_snapshot_ttl_secs: u64,
    /// Maximum number of list snapshots kept.
    pub list_snapshot_capacity: usize,
    /// Refuse voucher matching for holdings without session/zone metadata
    /// instead of accepting any available voucher.
    pub strict_voucher_metadata: bool,
    /// Decimal places of submitted prices.
    pub price_scale: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_window_hours: constants::DEFAULT_LOCK_WINDOW_HOURS,
            voucher_page_size: constants::DEFAULT_VOUCHER_PAGE_SIZE,
            voucher_max_pages: constants::MAX_VOUCHER_PAGES,
            list_page_size: constants::DEFAULT_LIST_PAGE_SIZE,
            list_snapshot_ttl_secs: constants::DEFAULT_LIST_SNAPSHOT_TTL_SECS,
            list_snapshot_capacity: constants::DEFAULT_LIST_SNAPSHOT_CAPACITY,
            strict_voucher_metadata: false,
            price_scale: constants::DEFAULT_PRICE_SCALE,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| ConsignError::Configuration(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.lock_window_hours == 0 {
            return Err(ConsignError::Configuration(
                "lock_window_hours must be > 0".into(),
            ));
        }
        if self.voucher_page_size == 0 || self.list_page_size == 0 {
            return Err(ConsignError::Configuration("page sizes must be > 0".into()));
        }
        if self.voucher_max_pages == 0 || self.voucher_max_pages > constants::MAX_VOUCHER_PAGES {
            return Err(ConsignError::Configuration(format!(
                "voucher_max_pages must be within 1..={}",
                constants::MAX_VOUCHER_PAGES
            )));
        }
        if self.list_snapshot_capacity == 0 {
            return Err(ConsignError::Configuration(
                "list_snapshot_capacity must be > 0".into(),
            ));
        }
        if self.price_scale > 8 {
            return Err(ConsignError::Configuration("price_scale must be <= 8".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.lock_window_hours, 48);
        assert_eq!(cfg.voucher_max_pages, 20);
        assert!(!cfg.strict_voucher_metadata);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = EngineConfig::from_json(r#"{"strict_voucher_metadata": true}"#).unwrap();
        assert!(cfg.strict_voucher_metadata);
        assert_eq!(cfg.list_page_size, 10);
    }

    #[test]
    fn rejects_page_cap_above_hard_limit() {
        let err = EngineConfig::from_json(r#"{"voucher_max_pages": 50}"#).unwrap_err();
        assert!(matches!(err, ConsignError::Configuration(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = EngineConfig::from_json("{not json").unwrap_err();
        assert!(format!("{err}").starts_with("CS_ERR_902"));
    }
}
