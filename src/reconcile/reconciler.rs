//! Merge local and on-chain marketplace signals.
//!
//! Listing status is the OR of the local flag and on-chain listing
//! presence; it is never overridden downward. Auction status comes only
//! from the chain. A token may be listed and auctioned at once.
//!
//! Display price precedence: live auction, then on-chain listing, then the
//! locally cached price, then [`NOT_LISTED`].

use serde::Serialize;

use crate::db::models::LocalRecord;
use crate::market::index::MarketplaceIndex;
use crate::market::models::{format_ether, AuctionRecord, ListingRecord, MarketplaceSignal};
use crate::reconcile::filter::Partitions;

pub const NOT_LISTED: &str = "Not listed";

/// Display-ready marketplace status of one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledItem {
    pub token_id: Option<String>,
    pub contract_address: String,
    pub owner: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub nft_type: String,
    pub image_url: Option<String>,
    pub is_listed: bool,
    pub is_auction: bool,
    pub price: String,
    pub thirdweb_data: Option<ListingRecord>,
    pub thirdweb_auction_data: Option<AuctionRecord>,
    /// Listing signals contributed by the local record store.
    #[serde(rename = "mongoListedCount")]
    pub local_listed_count: usize,
    pub thirdweb_listed_count: usize,
    pub thirdweb_auction_count: usize,
}

/// Marketplace status of a whole collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReconciliation {
    pub is_listed: bool,
    pub is_auction: bool,
    pub price: String,
    pub listing: Option<ListingRecord>,
    pub auction: Option<AuctionRecord>,
    pub local_listed_count: usize,
    pub onchain_listed_count: usize,
    pub onchain_auction_count: usize,
}

/// Auction display price: the minimum bid, or the buyout when an auction
/// opens at zero with a buyout set.
pub fn auction_price(auction: &AuctionRecord) -> String {
    match auction.buyout_bid_amount {
        Some(buyout) if auction.minimum_bid_amount.is_zero() => {
            format!("{} (Buyout)", format_ether(buyout))
        }
        _ => format!("{} (Bid)", format_ether(auction.minimum_bid_amount)),
    }
}

pub fn select_price(signal: MarketplaceSignal<'_>, local_price: Option<&str>) -> String {
    match signal {
        MarketplaceSignal::Auctioned(auction) => auction_price(auction),
        MarketplaceSignal::Listed(listing) => listing.display_price(),
        MarketplaceSignal::None => local_price.unwrap_or(NOT_LISTED).to_string(),
    }
}

pub fn reconcile_token(record: &LocalRecord, index: &MarketplaceIndex) -> ReconciledItem {
    let key = record.key();
    let listing = key.as_deref().and_then(|k| index.listing(k));
    let auction = key.as_deref().and_then(|k| index.auction(k));
    let signal = key
        .as_deref()
        .map_or(MarketplaceSignal::None, |k| index.signal(k));

    let locally_listed = record.marketplace.is_listed;
    let local_price = if locally_listed {
        record.marketplace.price_formatted.as_deref()
    } else {
        None
    };

    ReconciledItem {
        token_id: record.token_id.clone(),
        contract_address: record.contract_address.clone(),
        owner: record.owner.clone(),
        name: record.name.clone(),
        nft_type: record.nft_type.clone(),
        image_url: record.image_url.clone(),
        is_listed: locally_listed || listing.is_some(),
        is_auction: auction.is_some(),
        price: select_price(signal, local_price),
        thirdweb_data: listing.cloned(),
        thirdweb_auction_data: auction.cloned(),
        local_listed_count: usize::from(locally_listed),
        thirdweb_listed_count: usize::from(listing.is_some()),
        thirdweb_auction_count: usize::from(auction.is_some()),
    }
}

pub fn reconcile_collection(partitions: &Partitions<'_>) -> CollectionReconciliation {
    let listing = partitions.onchain_listed.first().map(|(_, l)| *l);
    let auction = partitions.onchain_auctioned.first().map(|(_, a)| *a);

    let signal = match (auction, listing) {
        (Some(a), _) => MarketplaceSignal::Auctioned(a),
        (None, Some(l)) => MarketplaceSignal::Listed(l),
        (None, None) => MarketplaceSignal::None,
    };
    let local_price = partitions
        .local_listed
        .iter()
        .find_map(|r| r.marketplace.price_formatted.as_deref());

    CollectionReconciliation {
        is_listed: !partitions.local_listed.is_empty() || !partitions.onchain_listed.is_empty(),
        is_auction: !partitions.onchain_auctioned.is_empty(),
        price: select_price(signal, local_price),
        listing: listing.cloned(),
        auction: auction.cloned(),
        local_listed_count: partitions.local_listed.len(),
        onchain_listed_count: partitions.onchain_listed.len(),
        onchain_auction_count: partitions.onchain_auctioned.len(),
    }
}
