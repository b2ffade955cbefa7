pub mod models;
pub mod store;

use anyhow::Result;
use async_trait::async_trait;

use crate::db::models::{CollectionRow, MintQuery, MintRow};

/// Off-chain mint record store, read-only from the reconciler's side.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Minted records matching the query, newest first.
    async fn minted_records(&self, query: &MintQuery) -> Result<Vec<MintRow>>;

    /// Collections deployed on a chain.
    async fn collections(&self, chain_id: u64) -> Result<Vec<CollectionRow>>;

    /// Every mint record belonging to one collection.
    async fn collection_mints(&self, collection_id: &str) -> Result<Vec<MintRow>>;
}
