//! Shared fakes for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use alloy::primitives::U256;
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::DateTime;
use rust_decimal::Decimal;

use marketplace_sync::config::{MarketplaceConfig, MarketplaceDeployment};
use marketplace_sync::db::models::{CollectionRow, MintQuery, MintRow};
use marketplace_sync::db::RecordSource;
use marketplace_sync::market::models::{AuctionRecord, ListingRecord, MarketplaceContract};
use marketplace_sync::market::{FetchError, MarketplaceReader};

pub const CHAIN_ID: u64 = 80002;
pub const MARKETPLACE: &str = "0xMarket";

pub fn marketplace_config() -> MarketplaceConfig {
    MarketplaceConfig {
        engine_url: "http://unused".to_string(),
        default_chain_id: CHAIN_ID,
        page_size: 200,
        request_timeout_seconds: 5,
        max_retries: 0,
        deployments: vec![MarketplaceDeployment {
            chain_id: CHAIN_ID,
            address: MARKETPLACE.to_string(),
        }],
    }
}

#[derive(Default)]
pub struct FakeReader {
    pub listings: Vec<ListingRecord>,
    pub auctions: Vec<AuctionRecord>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl MarketplaceReader for FakeReader {
    async fn get_all_valid_listings(
        &self,
        _contract: &MarketplaceContract,
        _start: u32,
        count: u32,
    ) -> Result<Vec<ListingRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FetchError::Status {
                status: 504,
                body: "gateway timeout".to_string(),
            });
        }
        Ok(self.listings.iter().take(count as usize).cloned().collect())
    }

    async fn get_all_auctions(
        &self,
        _contract: &MarketplaceContract,
        _start: u32,
        count: u32,
    ) -> Result<Vec<AuctionRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FetchError::Status {
                status: 504,
                body: "gateway timeout".to_string(),
            });
        }
        Ok(self.auctions.iter().take(count as usize).cloned().collect())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[derive(Default)]
pub struct FakeRecords {
    pub mints: Vec<MintRow>,
    pub collections: Vec<CollectionRow>,
    pub fail: bool,
}

#[async_trait]
impl RecordSource for FakeRecords {
    async fn minted_records(&self, query: &MintQuery) -> Result<Vec<MintRow>> {
        if self.fail {
            bail!("connection refused");
        }
        Ok(self
            .mints
            .iter()
            .filter(|m| m.chain_id as u64 == query.chain_id)
            .filter(|m| match &query.owner {
                Some(owner) => m
                    .owner
                    .as_deref()
                    .unwrap_or(m.minter_address.as_str())
                    .eq_ignore_ascii_case(owner),
                None => true,
            })
            .filter(|m| match &query.nft_type {
                Some(t) => m.nft_type.eq_ignore_ascii_case(t),
                None => true,
            })
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn collections(&self, chain_id: u64) -> Result<Vec<CollectionRow>> {
        if self.fail {
            bail!("connection refused");
        }
        Ok(self
            .collections
            .iter()
            .filter(|c| c.chain_id as u64 == chain_id)
            .cloned()
            .collect())
    }

    async fn collection_mints(&self, collection_id: &str) -> Result<Vec<MintRow>> {
        Ok(self
            .mints
            .iter()
            .filter(|m| m.collection_id.as_deref() == Some(collection_id))
            .cloned()
            .collect())
    }
}

pub fn mint(token_id: Option<&str>, contract: &str, is_listed: bool) -> MintRow {
    MintRow {
        id: None,
        collection_id: Some("col-1".to_string()),
        token_id: token_id.map(str::to_string),
        contract_address: contract.to_string(),
        chain_id: CHAIN_ID as i64,
        minter_address: "0xMinter".to_string(),
        owner: None,
        name: None,
        nft_type: "jersey".to_string(),
        image_url: None,
        is_listed,
        price_formatted: None,
        created_at: None,
    }
}

pub fn listing(token_id: &str, contract: &str, price: Decimal) -> ListingRecord {
    ListingRecord {
        listing_id: format!("listing-{token_id}"),
        token_id: token_id.to_string(),
        asset_contract_address: contract.to_string(),
        price_per_token: price,
        currency_symbol: "MATIC".to_string(),
        end_time: None,
    }
}

pub fn auction(token_id: &str, contract: &str, minimum_bid_wei: u128) -> AuctionRecord {
    AuctionRecord {
        auction_id: format!("auction-{token_id}"),
        token_id: token_id.to_string(),
        asset_contract_address: contract.to_string(),
        minimum_bid_amount: U256::from(minimum_bid_wei),
        buyout_bid_amount: None,
        currency_contract_address: "0xCurrency".to_string(),
        start_timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        end_timestamp: DateTime::from_timestamp(1_700_604_800, 0).unwrap(),
    }
}

pub fn collection(id: &str, total_supply: Option<i64>) -> CollectionRow {
    CollectionRow {
        id: id.to_string(),
        name: "Derby Day Jerseys".to_string(),
        category: "jersey".to_string(),
        contract_address: "0xAAA".to_string(),
        chain_id: CHAIN_ID as i64,
        creator: Some("0xCreator".to_string()),
        total_supply,
        image_url: None,
        created_at: None,
    }
}

pub fn query() -> MintQuery {
    MintQuery {
        owner: None,
        chain_id: CHAIN_ID,
        nft_type: None,
        limit: 50,
    }
}
