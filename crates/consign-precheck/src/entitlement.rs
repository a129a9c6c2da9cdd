//! Entitlement matcher: does the actor hold a voucher for this holding?
//!
//! A voucher matches a holding when both its session and its zone equal the
//! holding's, compared on normalised string form. Matching is pure: the same
//! inputs always give the same answer.
//!
//! ## Degraded mode
//!
//! Holdings whose backend record lacks session or zone metadata cannot be
//! matched exactly. By default any available voucher is then accepted and the
//! match is tagged [`MatchMode::Degraded`] and logged at warn level. With
//! `strict_voucher_metadata` such holdings have no match at all.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use consign_types::{ActorId, CollectibleHolding, EngineConfig, Result, TransferVoucher};

use crate::gate::RemoteGate;

/// How a voucher was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Session and zone both equal.
    Exact,
    /// Holding lacked metadata; any available voucher was accepted.
    Degraded,
}

/// A voucher selected for a holding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoucherMatch<'a> {
    pub voucher: &'a TransferVoucher,
    pub mode: MatchMode,
}

fn same_id(a: &str, b: &str) -> bool {
    a.trim() == b.trim()
}

/// Session/zone voucher matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitlementMatcher {
    strict_metadata: bool,
}

impl EntitlementMatcher {
    #[must_use]
    pub fn new(strict_metadata: bool) -> Self {
        Self { strict_metadata }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.strict_voucher_metadata)
    }

    /// Find a voucher that authorises consigning `holding` at `now`.
    ///
    /// Only available, unexpired vouchers are considered. The first match in
    /// input order wins.
    #[must_use]
    pub fn find_matching_voucher<'a>(
        &self,
        holding: &CollectibleHolding,
        vouchers: &'a [TransferVoucher],
        now: DateTime<Utc>,
    ) -> Option<VoucherMatch<'a>> {
        let mut available = vouchers.iter().filter(|v| v.is_available_at(now));

        let session = holding.session_id.as_ref().filter(|s| !s.is_blank());
        let zone = holding.zone_id.as_ref().filter(|z| !z.is_blank());

        let (Some(session), Some(zone)) = (session, zone) else {
            if self.strict_metadata {
                tracing::warn!(
                    holding = %holding.log_ref(),
                    "Holding lacks session/zone metadata; strict mode refuses voucher match"
                );
                return None;
            }
            let voucher = available.next()?;
            tracing::warn!(
                holding = %holding.log_ref(),
                voucher = ?voucher.id,
                "Holding lacks session/zone metadata; accepting any available voucher"
            );
            return Some(VoucherMatch {
                voucher,
                mode: MatchMode::Degraded,
            });
        };

        available
            .find(|v| {
                v.session_id
                    .as_ref()
                    .is_some_and(|s| same_id(s.as_str(), session.as_str()))
                    && v.zone_id
                        .as_ref()
                        .is_some_and(|z| same_id(z.as_str(), zone.as_str()))
            })
            .map(|voucher| VoucherMatch {
                voucher,
                mode: MatchMode::Exact,
            })
    }
}

/// Dedupe key: voucher id, or `session:zone:page:index` when the id is absent.
fn voucher_key(voucher: &TransferVoucher, page: u32, index: usize) -> String {
    match voucher.id.as_ref().filter(|id| !id.is_blank()) {
        Some(id) => format!("id:{id}"),
        None => format!(
            "anon:{}:{}:{page}:{index}",
            voucher.session_id.as_ref().map_or("", |s| s.as_str()),
            voucher.zone_id.as_ref().map_or("", |z| z.as_str()),
        ),
    }
}

/// Load all available vouchers of `actor`, deduplicated.
///
/// Pages are fetched in order (1-based) up to `voucher_max_pages`. Loading
/// stops on a short page, on `hasMore == false`, or once the deduplicated
/// count reaches the reported total.
///
/// # Errors
/// A transport failure on the first page is returned. A failure on a later
/// page ends pagination and keeps what was already loaded.
pub async fn load_available_vouchers<G>(
    gate: &G,
    actor: &ActorId,
    config: &EngineConfig,
) -> Result<Vec<TransferVoucher>>
where
    G: RemoteGate + ?Sized,
{
    let page_size = config.voucher_page_size;
    let mut seen = HashSet::new();
    let mut vouchers = Vec::new();

    for page in 1..=config.voucher_max_pages {
        let listing = match gate.vouchers(actor, page, page_size).await {
            Ok(listing) => listing,
            Err(err) if page == 1 => return Err(err),
            Err(err) => {
                tracing::warn!(
                    actor = %actor,
                    page,
                    error = %err,
                    "Voucher page failed; continuing with vouchers loaded so far"
                );
                break;
            }
        };

        let fetched = listing.list.len();
        for (index, voucher) in listing.list.into_iter().enumerate() {
            if seen.insert(voucher_key(&voucher, page, index)) {
                vouchers.push(voucher);
            }
        }

        let short_page = fetched < page_size as usize;
        let no_more = listing.has_more == Some(false);
        let reached_total = listing
            .total
            .is_some_and(|total| vouchers.len() as u64 >= total);
        if short_page || no_more || reached_total {
            break;
        }
        if page == config.voucher_max_pages {
            tracing::warn!(
                actor = %actor,
                pages = page,
                loaded = vouchers.len(),
                "Voucher pagination hit the page cap"
            );
        }
    }

    tracing::debug!(actor = %actor, count = vouchers.len(), "Loaded available vouchers");
    Ok(vouchers)
}
