use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use marketplace_sync::api::{self, AppState};
use marketplace_sync::config::{AppConfig, DEFAULT_CONFIG_PATH};
use marketplace_sync::api::routes::NftParams;
use marketplace_sync::db::models::MintQuery;
use marketplace_sync::db::store::Store;
use marketplace_sync::market::thirdweb::ThirdwebClient;
use marketplace_sync::monitoring::health::HealthState;
use marketplace_sync::monitoring::logger;
use marketplace_sync::reconcile::MarketplaceService;

#[derive(Debug, Parser)]
#[command(name = "marketplace-sync", about = "Reconciles on-chain marketplace state with local mint records")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Reconcile once and print the result as JSON
    Reconcile {
        #[arg(long)]
        chain_id: Option<u64>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long = "type")]
        nft_type: Option<String>,
        #[arg(long, default_value_t = api::routes::DEFAULT_LIMIT)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, secrets) = AppConfig::load(&cli.config)?;

    logger::init_logging(&config.monitoring)?;

    tracing::info!(
        engine_url = %config.marketplace.engine_url,
        default_chain_id = config.marketplace.default_chain_id,
        deployments = config.marketplace.deployments.len(),
        database = %config.database.url(),
        "Marketplace sync starting"
    );

    let store = Store::new(&config.database.path).await?;
    let reader = ThirdwebClient::new(&config, &secrets)?;
    let service = MarketplaceService::new(
        Arc::new(reader),
        Arc::new(store),
        config.marketplace.clone(),
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let state = AppState::new(service, HealthState::new());
            api::serve(state, &config.server.bind, config.server.port).await
        }
        Command::Reconcile {
            chain_id,
            owner,
            nft_type,
            limit,
        } => {
            let query = cli_query(
                chain_id,
                owner,
                nft_type,
                limit,
                config.marketplace.default_chain_id,
            );
            let page = service.reconcile_nfts(query).await?;
            let json = serde_json::to_string_pretty(&page).context("Failed to render result")?;
            println!("{json}");
            Ok(())
        }
    }
}

/// Same normalization as the HTTP query: blank filters dropped, limit clamped.
fn cli_query(
    chain_id: Option<u64>,
    owner: Option<String>,
    nft_type: Option<String>,
    limit: u32,
    default_chain_id: u64,
) -> MintQuery {
    NftParams {
        owner,
        chain_id: chain_id.map(|c| c.to_string()),
        nft_type,
        limit: Some(limit.to_string()),
    }
    .into_query(default_chain_id)
}
