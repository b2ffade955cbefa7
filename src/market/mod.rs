pub mod fetcher;
pub mod index;
pub mod models;
pub mod thirdweb;

use async_trait::async_trait;

use crate::market::models::{AuctionRecord, ListingRecord, MarketplaceContract};

/// Errors from the on-chain marketplace read API.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("marketplace request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("marketplace API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("marketplace API rejected credentials ({status})")]
    Unauthorized { status: u16 },
    #[error("failed to decode marketplace response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Unauthorized { .. } | Self::Decode(_) => false,
        }
    }
}

/// Read side of a marketplace contract.
/// Mirrors the two contract reads the reconciliation depends on.
#[async_trait]
pub trait MarketplaceReader: Send + Sync {
    /// Currently valid direct listings, starting at `start`, at most `count`.
    async fn get_all_valid_listings(
        &self,
        contract: &MarketplaceContract,
        start: u32,
        count: u32,
    ) -> Result<Vec<ListingRecord>, FetchError>;

    /// English auctions, starting at `start`, at most `count`.
    async fn get_all_auctions(
        &self,
        contract: &MarketplaceContract,
        start: u32,
        count: u32,
    ) -> Result<Vec<AuctionRecord>, FetchError>;

    /// Human-readable name of this reader.
    fn name(&self) -> &str;
}
