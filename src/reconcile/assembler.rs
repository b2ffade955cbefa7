//! Uniform output records for the API layer.

use serde::Serialize;

use crate::db::models::{CollectionRow, MintQuery};
use crate::market::index::MarketplaceIndex;
use crate::market::models::{AuctionRecord, ListingRecord};
use crate::reconcile::reconciler::{CollectionReconciliation, ReconciledItem};

/// What the marketplace read contributed to a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThirdwebStatus {
    pub marketplace_address: Option<String>,
    pub chain_id: u64,
    /// False when no marketplace is deployed on the chain or the read failed.
    pub available: bool,
    pub listings_count: usize,
    pub auctions_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NftStats {
    pub total: usize,
    pub listed: usize,
    pub auctions: usize,
    pub not_listed: usize,
    pub mongo_listed: usize,
    pub thirdweb_listed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NftPage {
    pub data: Vec<ReconciledItem>,
    pub stats: NftStats,
    pub filters: MintQuery,
    pub thirdweb: ThirdwebStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingsPage {
    pub data: MarketplaceIndex,
    pub thirdweb: ThirdwebStatus,
}

/// Display record for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub contract_address: String,
    pub creator: Option<String>,
    pub image_url: Option<String>,
    pub total_supply: u64,
    pub minted_count: usize,
    pub is_listed: bool,
    pub is_auction: bool,
    pub price: String,
    pub thirdweb_data: Option<ListingRecord>,
    pub thirdweb_auction_data: Option<AuctionRecord>,
    pub mongo_listed_count: usize,
    pub thirdweb_listed_count: usize,
    pub thirdweb_auction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionsPage {
    pub data: Vec<CollectionView>,
    pub thirdweb: ThirdwebStatus,
}

pub fn nft_stats(items: &[ReconciledItem]) -> NftStats {
    let mut stats = NftStats {
        total: items.len(),
        ..NftStats::default()
    };

    for item in items {
        if item.is_listed {
            stats.listed += 1;
        }
        if item.is_auction {
            stats.auctions += 1;
        }
        if !item.is_listed && !item.is_auction {
            stats.not_listed += 1;
        }
        stats.mongo_listed += item.local_listed_count;
        stats.thirdweb_listed += item.thirdweb_listed_count;
    }

    stats
}

pub fn assemble_nft_page(
    items: Vec<ReconciledItem>,
    filters: MintQuery,
    thirdweb: ThirdwebStatus,
) -> NftPage {
    NftPage {
        stats: nft_stats(&items),
        data: items,
        filters,
        thirdweb,
    }
}

/// `minted_count` counts every stored mint, including records the
/// reconciler could not key.
pub fn assemble_collection(
    collection: &CollectionRow,
    minted_count: usize,
    reconciliation: CollectionReconciliation,
) -> CollectionView {
    let total_supply = collection
        .total_supply
        .filter(|s| *s > 0)
        .map(|s| s as u64)
        .unwrap_or(minted_count as u64);

    CollectionView {
        id: collection.id.clone(),
        name: collection.name.clone(),
        category: collection.category.clone(),
        contract_address: collection.contract_address.clone(),
        creator: collection.creator.clone(),
        image_url: collection.image_url.clone(),
        total_supply,
        minted_count,
        is_listed: reconciliation.is_listed,
        is_auction: reconciliation.is_auction,
        price: reconciliation.price,
        thirdweb_data: reconciliation.listing,
        thirdweb_auction_data: reconciliation.auction,
        mongo_listed_count: reconciliation.local_listed_count,
        thirdweb_listed_count: reconciliation.onchain_listed_count,
        thirdweb_auction_count: reconciliation.onchain_auction_count,
    }
}
