//! Concurrent listing/auction fetch for one marketplace contract.

use tracing::{info, instrument};

use crate::market::models::{MarketplaceContract, MarketplaceSnapshot};
use crate::market::{FetchError, MarketplaceReader};

/// Fetch the first `page_size` valid listings and auctions, concurrently.
///
/// Either read failing fails the whole snapshot. Callers decide whether to
/// fall back to an empty snapshot.
#[instrument(skip(reader), fields(reader = reader.name(), chain_id = contract.chain_id, address = %contract.address))]
pub async fn fetch_snapshot(
    reader: &dyn MarketplaceReader,
    contract: &MarketplaceContract,
    page_size: u32,
) -> Result<MarketplaceSnapshot, FetchError> {
    let (listings, auctions) = tokio::join!(
        reader.get_all_valid_listings(contract, 0, page_size),
        reader.get_all_auctions(contract, 0, page_size),
    );

    let snapshot = MarketplaceSnapshot {
        listings: listings?,
        auctions: auctions?,
    };

    info!(
        listings = snapshot.listings.len(),
        auctions = snapshot.auctions.len(),
        "Marketplace snapshot fetched"
    );

    Ok(snapshot)
}
