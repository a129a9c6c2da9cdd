//! System-wide constants for the consignment engine.

/// Minimum holding period after acquisition before consignment is allowed.
pub const DEFAULT_LOCK_WINDOW_HOURS: u32 = 48;

/// Raw timestamps above this magnitude are milliseconds, not seconds.
pub const MILLIS_THRESHOLD: f64 = 1e12;

/// Page size used when listing an actor's vouchers.
pub const DEFAULT_VOUCHER_PAGE_SIZE: u32 = 50;

/// Hard cap on voucher pages fetched for one action.
pub const MAX_VOUCHER_PAGES: u32 = 20;

/// Page size used for holdings partitions.
pub const DEFAULT_LIST_PAGE_SIZE: u32 = 10;

/// Time-to-live of a saved list snapshot, in seconds.
pub const DEFAULT_LIST_SNAPSHOT_TTL_SECS: u64 = 30 * 60;

/// Maximum number of list snapshots kept in memory.
pub const DEFAULT_LIST_SNAPSHOT_CAPACITY: usize = 32;

/// Decimal places of a submitted consignment price.
pub const DEFAULT_PRICE_SCALE: u32 = 2;
