use std::str::FromStr;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::db::models::MintQuery;

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 500;

/// Successful response body: `{ "success": true, ...payload }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    pub fn ok(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

/// Query parameters as sent by the front end. Numeric values arrive as
/// strings and may be empty or garbage; those fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftParams {
    pub owner: Option<String>,
    pub chain_id: Option<String>,
    #[serde(rename = "type")]
    pub nft_type: Option<String>,
    pub limit: Option<String>,
}

impl NftParams {
    pub fn into_query(self, default_chain_id: u64) -> MintQuery {
        MintQuery {
            owner: self.owner.filter(|o| !o.trim().is_empty()),
            chain_id: parse_or(self.chain_id.as_deref(), default_chain_id),
            nft_type: self.nft_type.filter(|t| !t.trim().is_empty()),
            limit: parse_or(self.limit.as_deref(), DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainParams {
    pub chain_id: Option<String>,
}

impl ChainParams {
    pub fn chain_id_or(&self, default_chain_id: u64) -> u64 {
        parse_or(self.chain_id.as_deref(), default_chain_id)
    }
}

fn parse_or<T: FromStr>(value: Option<&str>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

// -- Route Handlers --

#[instrument(skip(state), fields(request_id = %Uuid::new_v4()))]
pub async fn nfts_handler(
    State(state): State<AppState>,
    params: Result<Query<NftParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(ApiError::bad_request)?;
    let query = params.into_query(state.service.default_chain_id());
    let page = state
        .service
        .reconcile_nfts(query)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch marketplace NFTs", &e))?;

    state.health.record_request(&page.thirdweb).await;
    Ok(Json(Envelope::ok(page)))
}

#[instrument(skip(state), fields(request_id = %Uuid::new_v4()))]
pub async fn collections_handler(
    State(state): State<AppState>,
    params: Result<Query<ChainParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(ApiError::bad_request)?;
    let chain_id = params.chain_id_or(state.service.default_chain_id());
    let page = state
        .service
        .custom_collections(chain_id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch collections", &e))?;

    state.health.record_request(&page.thirdweb).await;
    Ok(Json(Envelope::ok(page)))
}

#[instrument(skip(state), fields(request_id = %Uuid::new_v4()))]
pub async fn listings_handler(
    State(state): State<AppState>,
    params: Result<Query<ChainParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(ApiError::bad_request)?;
    let chain_id = params.chain_id_or(state.service.default_chain_id());
    let page = state.service.marketplace_listings(chain_id).await;

    state.health.record_request(&page.thirdweb).await;
    Ok(Json(Envelope::ok(page)))
}

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.health.to_json().await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let query = NftParams::default().into_query(80002);
        assert_eq!(
            query,
            MintQuery {
                owner: None,
                chain_id: 80002,
                nft_type: None,
                limit: 50,
            }
        );
    }

    #[test]
    fn test_params_blank_filters_are_ignored_and_limit_clamped() {
        let params = NftParams {
            owner: Some("  ".to_string()),
            chain_id: Some("137".to_string()),
            nft_type: Some(String::new()),
            limit: Some("10000".to_string()),
        };
        let query = params.into_query(80002);
        assert_eq!(query.owner, None);
        assert_eq!(query.nft_type, None);
        assert_eq!(query.chain_id, 137);
        assert_eq!(query.limit, MAX_LIMIT);
    }

    #[test]
    fn test_params_unparseable_numbers_use_defaults() {
        for (chain_id, limit) in [("", ""), ("abc", "abc"), ("-5", "-1")] {
            let params = NftParams {
                chain_id: Some(chain_id.to_string()),
                limit: Some(limit.to_string()),
                ..NftParams::default()
            };
            let query = params.into_query(80002);
            assert_eq!(query.chain_id, 80002);
            assert_eq!(query.limit, DEFAULT_LIMIT);
        }

        let zero = NftParams {
            limit: Some("0".to_string()),
            ..NftParams::default()
        };
        assert_eq!(zero.into_query(80002).limit, 1);
    }

    #[test]
    fn test_chain_params_fallback() {
        let blank = ChainParams {
            chain_id: Some(" ".to_string()),
        };
        assert_eq!(blank.chain_id_or(80002), 80002);
        let set = ChainParams {
            chain_id: Some("137".to_string()),
        };
        assert_eq!(set.chain_id_or(80002), 137);
    }

    #[test]
    fn test_envelope_flattens_body() {
        #[derive(Serialize)]
        struct Body {
            data: Vec<u32>,
        }
        let json = serde_json::to_value(Envelope::ok(Body { data: vec![1] })).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": [1]}));
    }
}
