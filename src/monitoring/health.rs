//! Service health state.
//!
//! Tracks request volume and whether the most recent marketplace read
//! succeeded, so uptime monitors can tell "serving local data only" apart
//! from "fully healthy".

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::reconcile::assembler::ThirdwebStatus;

/// Shared health state updated by request handlers.
#[derive(Clone)]
pub struct HealthState {
    inner: Arc<RwLock<HealthData>>,
}

#[derive(Debug, Clone, Serialize)]
struct HealthData {
    status: String,
    started_at: DateTime<Utc>,
    uptime_seconds: i64,
    requests_served: u64,
    last_fetch_at: Option<DateTime<Utc>>,
    last_fetch_available: Option<bool>,
    last_fetch_chain_id: Option<u64>,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HealthData {
                status: "ok".to_string(),
                started_at: Utc::now(),
                uptime_seconds: 0,
                requests_served: 0,
                last_fetch_at: None,
                last_fetch_available: None,
                last_fetch_chain_id: None,
            })),
        }
    }

    /// Record a served request and the marketplace read it triggered.
    pub async fn record_request(&self, thirdweb: &ThirdwebStatus) {
        let mut data = self.inner.write().await;
        data.requests_served += 1;
        data.last_fetch_at = Some(Utc::now());
        data.last_fetch_available = Some(thirdweb.available);
        data.last_fetch_chain_id = Some(thirdweb.chain_id);
        data.status = if thirdweb.available {
            "ok".to_string()
        } else {
            "degraded".to_string()
        };
    }

    pub async fn to_json(&self) -> serde_json::Value {
        let mut data = self.inner.read().await.clone();
        data.uptime_seconds = (Utc::now() - data.started_at).num_seconds();
        serde_json::to_value(&data).unwrap_or_else(|_| {
            serde_json::json!({"status": "error", "message": "serialization failed"})
        })
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}
