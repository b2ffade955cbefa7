use serde::Serialize;
use sqlx::FromRow;
use tracing::debug;

use crate::market::index::listing_key;

/// A mint document as stored. Written by the minting flow; optional
/// columns may be missing on records created by older versions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MintRow {
    pub id: Option<i64>,
    pub collection_id: Option<String>,
    pub token_id: Option<String>,
    pub contract_address: String,
    pub chain_id: i64,
    pub minter_address: String,
    pub owner: Option<String>,
    pub name: Option<String>,
    pub nft_type: String,
    pub image_url: Option<String>,
    pub is_listed: bool,
    pub price_formatted: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CollectionRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub contract_address: String,
    pub chain_id: i64,
    pub creator: Option<String>,
    pub total_supply: Option<i64>,
    pub image_url: Option<String>,
    pub created_at: Option<String>,
}

/// Local marketplace state recorded at mint or listing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMarketplace {
    pub is_listed: bool,
    pub price_formatted: Option<String>,
}

/// A mint record with every field the reconciler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRecord {
    /// Missing on mints whose token id was never written back.
    pub token_id: Option<String>,
    pub contract_address: String,
    pub minter_address: String,
    /// Current owner, or the minter when ownership was never recorded.
    pub owner: String,
    pub name: Option<String>,
    pub nft_type: String,
    pub image_url: Option<String>,
    pub marketplace: LocalMarketplace,
}

impl LocalRecord {
    /// Join key against on-chain records. `None` when the record has no
    /// token id or contract; such records only carry the local signal.
    pub fn key(&self) -> Option<String> {
        let token_id = self.token_id.as_deref()?;
        if self.contract_address.trim().is_empty() {
            return None;
        }
        Some(listing_key(token_id, &self.contract_address))
    }
}

impl From<MintRow> for LocalRecord {
    fn from(row: MintRow) -> Self {
        let token_id = row
            .token_id
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let owner = row
            .owner
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| row.minter_address.clone());

        Self {
            token_id,
            contract_address: row.contract_address.trim().to_string(),
            minter_address: row.minter_address,
            owner,
            name: row.name,
            nft_type: row.nft_type,
            image_url: row.image_url,
            marketplace: LocalMarketplace {
                is_listed: row.is_listed,
                price_formatted: row.price_formatted.filter(|p| !p.is_empty()),
            },
        }
    }
}

/// Convert raw rows. Unkeyable rows are kept: their local listing flag
/// still counts, only the on-chain lookups are skipped for them.
pub fn local_records(rows: Vec<MintRow>) -> Vec<LocalRecord> {
    rows.into_iter()
        .map(|row| {
            let id = row.id;
            let record = LocalRecord::from(row);
            if record.key().is_none() {
                debug!(
                    mint_id = ?id,
                    "Mint record has no token id or contract; on-chain lookups skipped"
                );
            }
            record
        })
        .collect()
}

/// Filter over minted records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintQuery {
    pub owner: Option<String>,
    pub chain_id: u64,
    #[serde(rename = "type")]
    pub nft_type: Option<String>,
    pub limit: u32,
}
