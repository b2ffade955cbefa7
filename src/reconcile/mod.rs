//! Dual-source marketplace reconciliation.
//!
//! Every call re-reads the marketplace contract, rebuilds the key index,
//! and merges it with local mint records. Nothing is cached between calls.

pub mod assembler;
pub mod filter;
pub mod reconciler;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::config::MarketplaceConfig;
use crate::db::models::{local_records, MintQuery};
use crate::db::RecordSource;
use crate::market::fetcher::fetch_snapshot;
use crate::market::index::MarketplaceIndex;
use crate::market::models::{MarketplaceContract, MarketplaceSnapshot};
use crate::market::MarketplaceReader;
use crate::reconcile::assembler::{
    assemble_collection, assemble_nft_page, CollectionsPage, ListingsPage, NftPage, ThirdwebStatus,
};
use crate::reconcile::filter::partition;
use crate::reconcile::reconciler::{reconcile_collection, reconcile_token};

pub struct MarketplaceService {
    reader: Arc<dyn MarketplaceReader>,
    records: Arc<dyn RecordSource>,
    config: MarketplaceConfig,
}

impl MarketplaceService {
    pub fn new(
        reader: Arc<dyn MarketplaceReader>,
        records: Arc<dyn RecordSource>,
        config: MarketplaceConfig,
    ) -> Self {
        Self {
            reader,
            records,
            config,
        }
    }

    pub fn default_chain_id(&self) -> u64 {
        self.config.default_chain_id
    }

    /// Build the marketplace index for a chain, degrading to an empty index
    /// when no marketplace is deployed there or the read fails.
    pub async fn load_index(&self, chain_id: u64) -> (MarketplaceIndex, ThirdwebStatus) {
        let Some(address) = self.config.address_for(chain_id) else {
            warn!(chain_id, "No marketplace deployed on chain; on-chain signals unavailable");
            return (
                MarketplaceIndex::default(),
                ThirdwebStatus {
                    marketplace_address: None,
                    chain_id,
                    available: false,
                    listings_count: 0,
                    auctions_count: 0,
                },
            );
        };

        let contract = MarketplaceContract {
            chain_id,
            address: address.to_string(),
        };

        let (snapshot, available) =
            match fetch_snapshot(self.reader.as_ref(), &contract, self.config.page_size).await {
                Ok(snapshot) => (snapshot, true),
                Err(e) => {
                    warn!(
                        chain_id,
                        address,
                        error = %e,
                        "Marketplace fetch failed; continuing with local records only"
                    );
                    (MarketplaceSnapshot::default(), false)
                }
            };

        let index = MarketplaceIndex::from_snapshot(snapshot);
        let status = ThirdwebStatus {
            marketplace_address: Some(contract.address),
            chain_id,
            available,
            listings_count: index.listings_len(),
            auctions_count: index.auctions_len(),
        };

        (index, status)
    }

    /// Listings and auctions keyed by composite key.
    #[instrument(skip(self))]
    pub async fn marketplace_listings(&self, chain_id: u64) -> ListingsPage {
        let (index, thirdweb) = self.load_index(chain_id).await;
        ListingsPage {
            data: index,
            thirdweb,
        }
    }

    /// Per-token marketplace status for minted NFTs matching the query.
    #[instrument(skip(self), fields(chain_id = query.chain_id))]
    pub async fn reconcile_nfts(&self, query: MintQuery) -> Result<NftPage> {
        let (rows, (index, thirdweb)) = tokio::join!(
            self.records.minted_records(&query),
            self.load_index(query.chain_id),
        );
        let records = local_records(rows?);

        let items: Vec<_> = records
            .iter()
            .map(|record| reconcile_token(record, &index))
            .collect();

        let page = assemble_nft_page(items, query, thirdweb);
        info!(
            total = page.stats.total,
            listed = page.stats.listed,
            auctions = page.stats.auctions,
            onchain_available = page.thirdweb.available,
            "NFTs reconciled"
        );

        Ok(page)
    }

    /// Collection-level marketplace status for every collection on a chain.
    #[instrument(skip(self))]
    pub async fn custom_collections(&self, chain_id: u64) -> Result<CollectionsPage> {
        let (collections, (index, thirdweb)) = tokio::join!(
            self.records.collections(chain_id),
            self.load_index(chain_id),
        );

        let mut data = Vec::new();
        for collection in collections? {
            let rows = self.records.collection_mints(&collection.id).await?;
            let minted_count = rows.len();
            let records = local_records(rows);

            let reconciliation = reconcile_collection(&partition(&records, &index));
            data.push(assemble_collection(&collection, minted_count, reconciliation));
        }

        info!(collections = data.len(), "Collections reconciled");
        Ok(CollectionsPage { data, thirdweb })
    }
}
