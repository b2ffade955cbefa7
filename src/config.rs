use std::path::Path;

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub marketplace: MarketplaceConfig,
    pub rate_limit: RateLimitConfig,
    pub database: DatabaseConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketplaceConfig {
    pub engine_url: String,
    pub default_chain_id: u64,
    pub page_size: u32,
    pub request_timeout_seconds: u64,
    pub max_retries: u32,
    #[serde(default)]
    pub deployments: Vec<MarketplaceDeployment>,
}

/// A marketplace contract deployed on one chain.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketplaceDeployment {
    pub chain_id: u64,
    pub address: String,
}

impl MarketplaceConfig {
    /// Marketplace contract address for a chain, if one is deployed there.
    pub fn address_for(&self, chain_id: u64) -> Option<&str> {
        self.deployments
            .iter()
            .find(|d| d.chain_id == chain_id)
            .map(|d| d.address.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    /// JSON lines when true, human-readable output otherwise.
    #[serde(default)]
    pub json: bool,
}

/// Secrets loaded exclusively from environment variables.
/// Not serializable, not stored in config files.
pub struct Secrets {
    pub thirdweb_secret_key: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            thirdweb_secret_key: std::env::var("THIRDWEB_SECRET_KEY")
                .ok()
                .filter(|s| !s.is_empty())
                .map(SecretString::from),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, overlaying environment variables for secrets.
    pub fn load(config_path: &Path) -> Result<(Self, Secrets)> {
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let secrets = Secrets::from_env();

        Ok((config, secrets))
    }
}
