//! Partition local mint records by marketplace signal.

use crate::db::models::LocalRecord;
use crate::market::index::MarketplaceIndex;
use crate::market::models::{AuctionRecord, ListingRecord};

/// Three independent views over the same records. A record may appear in
/// any combination of them. Records without a join key can only land in
/// `local_listed`.
#[derive(Debug, Default)]
pub struct Partitions<'a> {
    pub local_listed: Vec<&'a LocalRecord>,
    pub onchain_listed: Vec<(&'a LocalRecord, &'a ListingRecord)>,
    pub onchain_auctioned: Vec<(&'a LocalRecord, &'a AuctionRecord)>,
}

pub fn partition<'a>(records: &'a [LocalRecord], index: &'a MarketplaceIndex) -> Partitions<'a> {
    let mut partitions = Partitions::default();

    for record in records {
        if record.marketplace.is_listed {
            partitions.local_listed.push(record);
        }

        let Some(key) = record.key() else {
            continue;
        };
        if let Some(listing) = index.listing(&key) {
            partitions.onchain_listed.push((record, listing));
        }
        if let Some(auction) = index.auction(&key) {
            partitions.onchain_auctioned.push((record, auction));
        }
    }

    partitions
}
