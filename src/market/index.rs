//! Composite-key lookup tables over a marketplace snapshot.
//!
//! On-chain records and local mint records are joined on
//! `"<tokenId>_<lowercased contract address>"`. Both sides must build the
//! key through [`listing_key`] or lookups silently miss on address casing.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::market::models::{AuctionRecord, ListingRecord, MarketplaceSignal, MarketplaceSnapshot};

/// Build the join key for a token on a contract.
pub fn listing_key(token_id: &str, contract_address: &str) -> String {
    format!("{}_{}", token_id, contract_address.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Listing,
    Auction,
}

/// An indexed record tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Indexed<T> {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(flatten)]
    pub record: T,
}

/// Listings and auctions keyed by composite key.
///
/// Duplicate keys keep the last record seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceIndex {
    pub listings_by_key: BTreeMap<String, Indexed<ListingRecord>>,
    pub auctions_by_key: BTreeMap<String, Indexed<AuctionRecord>>,
}

impl MarketplaceIndex {
    pub fn from_snapshot(snapshot: MarketplaceSnapshot) -> Self {
        let mut index = Self::default();

        for listing in snapshot.listings {
            let key = listing_key(&listing.token_id, &listing.asset_contract_address);
            index.listings_by_key.insert(
                key,
                Indexed {
                    kind: EntryKind::Listing,
                    record: listing,
                },
            );
        }

        for auction in snapshot.auctions {
            let key = listing_key(&auction.token_id, &auction.asset_contract_address);
            index.auctions_by_key.insert(
                key,
                Indexed {
                    kind: EntryKind::Auction,
                    record: auction,
                },
            );
        }

        index
    }

    pub fn listing(&self, key: &str) -> Option<&ListingRecord> {
        self.listings_by_key.get(key).map(|e| &e.record)
    }

    pub fn auction(&self, key: &str) -> Option<&AuctionRecord> {
        self.auctions_by_key.get(key).map(|e| &e.record)
    }

    /// Strongest signal for a key: an auction outranks a listing.
    pub fn signal(&self, key: &str) -> MarketplaceSignal<'_> {
        if let Some(auction) = self.auction(key) {
            MarketplaceSignal::Auctioned(auction)
        } else if let Some(listing) = self.listing(key) {
            MarketplaceSignal::Listed(listing)
        } else {
            MarketplaceSignal::None
        }
    }

    pub fn listings_len(&self) -> usize {
        self.listings_by_key.len()
    }

    pub fn auctions_len(&self) -> usize {
        self.auctions_by_key.len()
    }
}
