use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// A marketplace contract on a specific chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceContract {
    pub chain_id: u64,
    pub address: String,
}

/// Snapshot of one valid direct listing at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub listing_id: String,
    pub token_id: String,
    pub asset_contract_address: String,
    /// Price per token in whole currency units (e.g. 1.5 MATIC).
    pub price_per_token: Decimal,
    pub currency_symbol: String,
    pub end_time: Option<DateTime<Utc>>,
}

impl ListingRecord {
    /// Price as shown to buyers, without trailing zeros.
    pub fn display_price(&self) -> String {
        self.price_per_token.normalize().to_string()
    }
}

/// Snapshot of one English auction at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionRecord {
    pub auction_id: String,
    pub token_id: String,
    pub asset_contract_address: String,
    #[serde(serialize_with = "serialize_wei")]
    pub minimum_bid_amount: U256,
    #[serde(serialize_with = "serialize_optional_wei")]
    pub buyout_bid_amount: Option<U256>,
    pub currency_contract_address: String,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,
}

/// Everything read from the marketplace contract in one pass.
#[derive(Debug, Clone, Default)]
pub struct MarketplaceSnapshot {
    pub listings: Vec<ListingRecord>,
    pub auctions: Vec<AuctionRecord>,
}

/// Strongest on-chain marketplace state known for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketplaceSignal<'a> {
    Auctioned(&'a AuctionRecord),
    Listed(&'a ListingRecord),
    None,
}

/// Format a wei amount as whole ether units, dropping trailing zeros.
///
/// `2_000_000_000_000_000_000` formats as `"2"`, `1_500_000_000_000_000_000`
/// as `"1.5"`.
pub fn format_ether(wei: U256) -> String {
    let unit = U256::from(WEI_PER_ETHER);
    let whole = wei / unit;
    let fraction = wei % unit;

    if fraction.is_zero() {
        return whole.to_string();
    }

    let digits = format!("{:0>18}", fraction.to_string());
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

fn serialize_wei<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

fn serialize_optional_wei<S: Serializer>(
    value: &Option<U256>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_str(&v.to_string()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_ether_whole() {
        let wei = U256::from(2_000_000_000_000_000_000u128);
        assert_eq!(format_ether(wei), "2");
    }

    #[test]
    fn test_format_ether_fraction() {
        let wei = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(format_ether(wei), "1.5");

        let tiny = U256::from(1u64);
        assert_eq!(format_ether(tiny), "0.000000000000000001");
    }

    #[test]
    fn test_format_ether_zero() {
        assert_eq!(format_ether(U256::ZERO), "0");
    }

    #[test]
    fn test_listing_display_price_strips_zeros() {
        let listing = ListingRecord {
            listing_id: "1".to_string(),
            token_id: "42".to_string(),
            asset_contract_address: "0xAAA".to_string(),
            price_per_token: dec!(1.500),
            currency_symbol: "MATIC".to_string(),
            end_time: None,
        };
        assert_eq!(listing.display_price(), "1.5");
    }

    #[test]
    fn test_auction_serializes_wei_as_decimal_string() {
        let auction = AuctionRecord {
            auction_id: "7".to_string(),
            token_id: "42".to_string(),
            asset_contract_address: "0xAAA".to_string(),
            minimum_bid_amount: U256::from(2_000_000_000_000_000_000u128),
            buyout_bid_amount: None,
            currency_contract_address: "0xCUR".to_string(),
            start_timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            end_timestamp: DateTime::from_timestamp(1_700_086_400, 0).unwrap(),
        };
        let json = serde_json::to_value(&auction).unwrap();
        assert_eq!(json["minimumBidAmount"], "2000000000000000000");
        assert!(json["buyoutBidAmount"].is_null());
    }
}
