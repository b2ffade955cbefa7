//! Thirdweb Engine marketplace read client.
//!
//! Reads valid direct listings and English auctions from a MarketplaceV3
//! contract through Engine's HTTP API, with rate limiting, bounded retry,
//! and conversion of Engine's loosely-typed payloads into domain records.

use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::{debug, instrument, warn};

use crate::config::{AppConfig, RateLimitConfig, Secrets};
use crate::market::models::{format_ether, AuctionRecord, ListingRecord, MarketplaceContract};
use crate::market::{FetchError, MarketplaceReader};

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Clone)]
struct RetryPolicy {
    max_retries: u32,
    backoff_base_ms: u64,
    backoff_max_ms: u64,
}

pub struct ThirdwebClient {
    http: reqwest::Client,
    /// Engine base URL, without trailing slash
    engine_url: String,
    secret_key: Option<SecretString>,
    limiter: Arc<Limiter>,
    retry: RetryPolicy,
}

impl ThirdwebClient {
    pub fn new(config: &AppConfig, secrets: &Secrets) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.marketplace.request_timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            engine_url: config.marketplace.engine_url.trim_end_matches('/').to_string(),
            secret_key: secrets.thirdweb_secret_key.clone(),
            limiter: create_rate_limiter(&config.rate_limit),
            retry: RetryPolicy {
                max_retries: config.marketplace.max_retries,
                backoff_base_ms: config.rate_limit.backoff_base_ms,
                backoff_max_ms: config.rate_limit.backoff_max_ms,
            },
        })
    }

    async fn get_result<T: DeserializeOwned>(
        &self,
        path: &str,
        start: u32,
        count: u32,
    ) -> Result<Vec<T>, FetchError> {
        let url = format!("{}{}", self.engine_url, path);

        self.with_retry(|| {
            let url = url.clone();
            async move {
                self.limiter.until_ready().await;

                let mut request = self
                    .http
                    .get(&url)
                    .query(&[("start", start.to_string()), ("count", count.to_string())]);
                if let Some(ref key) = self.secret_key {
                    request = request.bearer_auth(key.expose_secret());
                }

                let resp = request.send().await?;
                let status = resp.status();

                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN
                {
                    return Err(FetchError::Unauthorized {
                        status: status.as_u16(),
                    });
                }
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }

                let body = resp.bytes().await?;
                serde_json::from_slice::<EngineResponse<T>>(&body)
                    .map(|r| r.result)
                    .map_err(|e| FetchError::Decode(e.to_string()))
            }
        })
        .await
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, FetchError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;

                    if !e.is_retryable() || attempt > self.retry.max_retries {
                        return Err(e);
                    }

                    let backoff_ms = std::cmp::min(
                        self.retry
                            .backoff_base_ms
                            .saturating_mul(2u64.saturating_pow(attempt - 1)),
                        self.retry.backoff_max_ms,
                    );

                    warn!(
                        attempt,
                        backoff_ms,
                        error = %e,
                        "Retrying marketplace read after transient failure"
                    );

                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }
}

#[async_trait]
impl MarketplaceReader for ThirdwebClient {
    #[instrument(skip(self), fields(chain_id = contract.chain_id, address = %contract.address))]
    async fn get_all_valid_listings(
        &self,
        contract: &MarketplaceContract,
        start: u32,
        count: u32,
    ) -> Result<Vec<ListingRecord>, FetchError> {
        let path = format!(
            "/marketplace/{}/{}/direct-listings/get-all-valid",
            contract.chain_id, contract.address
        );
        let raw: Vec<EngineListing> = self.get_result(&path, start, count).await?;
        Ok(raw.into_iter().filter_map(convert_listing).collect())
    }

    #[instrument(skip(self), fields(chain_id = contract.chain_id, address = %contract.address))]
    async fn get_all_auctions(
        &self,
        contract: &MarketplaceContract,
        start: u32,
        count: u32,
    ) -> Result<Vec<AuctionRecord>, FetchError> {
        let path = format!(
            "/marketplace/{}/{}/english-auctions/get-all",
            contract.chain_id, contract.address
        );
        let raw: Vec<EngineAuction> = self.get_result(&path, start, count).await?;
        Ok(raw.into_iter().filter_map(convert_auction).collect())
    }

    fn name(&self) -> &str {
        "thirdweb_engine"
    }
}

fn create_rate_limiter(config: &RateLimitConfig) -> Arc<Limiter> {
    let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(config.burst_size).unwrap_or(rps);

    let quota = Quota::per_second(rps).allow_burst(burst);
    Arc::new(RateLimiter::direct(quota))
}

// --- Engine API Response Types ---

#[derive(Debug, Deserialize)]
struct EngineResponse<T> {
    result: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineCurrencyValue {
    symbol: Option<String>,
    display_value: Option<String>,
}

/// Engine returns ids and amounts as strings, but older deployments
/// sometimes send plain JSON numbers. Both are accepted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineListing {
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    asset_contract_address: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    token_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    price_per_token: Option<String>,
    currency_value_per_token: Option<EngineCurrencyValue>,
    end_time_in_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineAuction {
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    asset_contract_address: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    token_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    minimum_bid_amount: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    buyout_bid_amount: Option<String>,
    currency_contract_address: Option<String>,
    start_time_in_seconds: Option<i64>,
    end_time_in_seconds: Option<i64>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn parse_wei(s: &str) -> Option<U256> {
    U256::from_str(s.trim()).ok()
}

fn timestamp(seconds: Option<i64>) -> Option<DateTime<Utc>> {
    seconds.and_then(|s| DateTime::from_timestamp(s, 0))
}

/// Convert an Engine listing into a domain record. Listings without a
/// token id, contract or price are dropped.
fn convert_listing(raw: EngineListing) -> Option<ListingRecord> {
    let (Some(token_id), Some(asset_contract_address)) = (raw.token_id, raw.asset_contract_address)
    else {
        debug!(listing_id = ?raw.id, "Skipping listing without token id or contract");
        return None;
    };

    let (display_value, currency_symbol) = match raw.currency_value_per_token {
        Some(v) => (v.display_value, v.symbol.unwrap_or_default()),
        None => (None, String::new()),
    };

    let price_per_token = display_value
        .and_then(|s| Decimal::from_str(s.trim()).ok())
        .or_else(|| {
            let wei = parse_wei(raw.price_per_token.as_deref()?)?;
            Decimal::from_str(&format_ether(wei)).ok()
        });
    let Some(price_per_token) = price_per_token else {
        debug!(token_id = %token_id, "Skipping listing without a readable price");
        return None;
    };

    Some(ListingRecord {
        listing_id: raw.id.unwrap_or_default(),
        token_id,
        asset_contract_address,
        price_per_token,
        currency_symbol,
        end_time: timestamp(raw.end_time_in_seconds),
    })
}

/// Convert an Engine auction into a domain record. A zero buyout means
/// the auction has no buyout price.
fn convert_auction(raw: EngineAuction) -> Option<AuctionRecord> {
    let (Some(token_id), Some(asset_contract_address)) = (raw.token_id, raw.asset_contract_address)
    else {
        debug!(auction_id = ?raw.id, "Skipping auction without token id or contract");
        return None;
    };

    let minimum_bid_amount = raw
        .minimum_bid_amount
        .as_deref()
        .and_then(parse_wei)
        .unwrap_or(U256::ZERO);
    let buyout_bid_amount = raw
        .buyout_bid_amount
        .as_deref()
        .and_then(parse_wei)
        .filter(|v| !v.is_zero());

    let epoch = DateTime::<Utc>::default();

    Some(AuctionRecord {
        auction_id: raw.id.unwrap_or_default(),
        token_id,
        asset_contract_address,
        minimum_bid_amount,
        buyout_bid_amount,
        currency_contract_address: raw.currency_contract_address.unwrap_or_default(),
        start_timestamp: timestamp(raw.start_time_in_seconds).unwrap_or(epoch),
        end_timestamp: timestamp(raw.end_time_in_seconds).unwrap_or(epoch),
    })
}
