use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::db::models::{CollectionRow, MintQuery, MintRow};
use crate::db::RecordSource;

pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn new(database_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))
            .context("Invalid database path")?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        // Each in-memory connection is its own database, so keep exactly
        // one connection alive for the life of the pool
        let pool_options = if database_path == ":memory:" {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        let migration_sql = include_str!("../../migrations/001_init.sql");
        // Execute each statement separately (sqlx doesn't support multiple statements in one call)
        for statement in migration_sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .with_context(|| format!("Failed to execute migration: {trimmed}"))?;
            }
        }
        Ok(())
    }

    // --- Collection operations ---

    pub async fn insert_collection(&self, collection: &CollectionRow) -> Result<()> {
        sqlx::query(
            "INSERT INTO collections (id, name, category, contract_address, chain_id, creator, total_supply, image_url)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&collection.id)
        .bind(&collection.name)
        .bind(&collection.category)
        .bind(&collection.contract_address)
        .bind(collection.chain_id)
        .bind(&collection.creator)
        .bind(collection.total_supply)
        .bind(&collection.image_url)
        .execute(&self.pool)
        .await
        .context("Failed to insert collection")?;
        Ok(())
    }

    pub async fn get_collections(&self, chain_id: u64) -> Result<Vec<CollectionRow>> {
        let collections = sqlx::query_as::<_, CollectionRow>(
            "SELECT * FROM collections WHERE chain_id = ? ORDER BY created_at DESC, id",
        )
        .bind(chain_id as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch collections")?;
        Ok(collections)
    }

    // --- Mint operations ---

    pub async fn insert_mint(&self, mint: &MintRow) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO mints (collection_id, token_id, contract_address, chain_id, minter_address, owner, name, nft_type, image_url, is_listed, price_formatted)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&mint.collection_id)
        .bind(&mint.token_id)
        .bind(&mint.contract_address)
        .bind(mint.chain_id)
        .bind(&mint.minter_address)
        .bind(&mint.owner)
        .bind(&mint.name)
        .bind(&mint.nft_type)
        .bind(&mint.image_url)
        .bind(mint.is_listed)
        .bind(&mint.price_formatted)
        .execute(&self.pool)
        .await
        .context("Failed to insert mint")?;

        Ok(result.last_insert_rowid())
    }

    /// Record the local listing flag for a token, as the listing flow does.
    pub async fn update_listing_flag(
        &self,
        mint_id: i64,
        is_listed: bool,
        price_formatted: Option<&str>,
    ) -> Result<()> {
        sqlx::query("UPDATE mints SET is_listed = ?, price_formatted = ? WHERE id = ?")
            .bind(is_listed)
            .bind(price_formatted)
            .bind(mint_id)
            .execute(&self.pool)
            .await
            .context("Failed to update listing flag")?;
        Ok(())
    }

    pub async fn get_mints(&self, query: &MintQuery) -> Result<Vec<MintRow>> {
        let mints = sqlx::query_as::<_, MintRow>(
            "SELECT * FROM mints
             WHERE chain_id = ?
               AND (? IS NULL OR lower(coalesce(owner, minter_address)) = lower(?))
               AND (? IS NULL OR lower(nft_type) = lower(?))
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(query.chain_id as i64)
        .bind(&query.owner)
        .bind(&query.owner)
        .bind(&query.nft_type)
        .bind(&query.nft_type)
        .bind(i64::from(query.limit))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch mints")?;
        Ok(mints)
    }

    pub async fn get_mints_by_collection(&self, collection_id: &str) -> Result<Vec<MintRow>> {
        let mints = sqlx::query_as::<_, MintRow>(
            "SELECT * FROM mints WHERE collection_id = ? ORDER BY id",
        )
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch collection mints")?;
        Ok(mints)
    }
}

#[async_trait]
impl RecordSource for Store {
    async fn minted_records(&self, query: &MintQuery) -> Result<Vec<MintRow>> {
        self.get_mints(query).await
    }

    async fn collections(&self, chain_id: u64) -> Result<Vec<CollectionRow>> {
        self.get_collections(chain_id).await
    }

    async fn collection_mints(&self, collection_id: &str) -> Result<Vec<MintRow>> {
        self.get_mints_by_collection(collection_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mint(token_id: &str, owner: Option<&str>, nft_type: &str) -> MintRow {
        MintRow {
            id: None,
            collection_id: Some("col-1".to_string()),
            token_id: Some(token_id.to_string()),
            contract_address: "0xAAA".to_string(),
            chain_id: 80002,
            minter_address: "0xMinter".to_string(),
            owner: owner.map(str::to_string),
            name: None,
            nft_type: nft_type.to_string(),
            image_url: None,
            is_listed: false,
            price_formatted: None,
            created_at: None,
        }
    }

    fn query(owner: Option<&str>, nft_type: Option<&str>, limit: u32) -> MintQuery {
        MintQuery {
            owner: owner.map(str::to_string),
            chain_id: 80002,
            nft_type: nft_type.map(str::to_string),
            limit,
        }
    }

    #[tokio::test]
    async fn test_store_create_and_migrate() {
        let store = Store::new(":memory:").await.expect("should create store");
        let id = store
            .insert_mint(&mint("1", None, "jersey"))
            .await
            .expect("should insert mint");
        assert!(id > 0);
    }

    #[tokio::test]
    async fn test_memory_store_never_recycles_its_connection() {
        let store = Store::new(":memory:").await.expect("should create store");
        let options = store.pool.options();
        assert_eq!(options.get_max_connections(), 1);
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), None);

        store.insert_mint(&mint("1", None, "jersey")).await.unwrap();
        let mints = store.get_mints(&query(None, None, 50)).await.unwrap();
        assert_eq!(mints.len(), 1);
    }

    #[tokio::test]
    async fn test_mint_filters() {
        let store = Store::new(":memory:").await.expect("should create store");
        store.insert_mint(&mint("1", None, "jersey")).await.unwrap();
        store.insert_mint(&mint("2", Some("0xOwner"), "stadium")).await.unwrap();
        store.insert_mint(&mint("3", Some("0xOWNER"), "jersey")).await.unwrap();

        let all = store.get_mints(&query(None, None, 50)).await.unwrap();
        assert_eq!(all.len(), 3);
        // Newest first
        assert_eq!(all[0].token_id.as_deref(), Some("3"));

        let owned = store.get_mints(&query(Some("0xowner"), None, 50)).await.unwrap();
        assert_eq!(owned.len(), 2);

        // Unowned records match on minter
        let minted = store.get_mints(&query(Some("0xminter"), None, 50)).await.unwrap();
        assert_eq!(minted.len(), 1);

        let jerseys = store.get_mints(&query(None, Some("JERSEY"), 50)).await.unwrap();
        assert_eq!(jerseys.len(), 2);

        let limited = store.get_mints(&query(None, None, 1)).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_listing_flag_update() {
        let store = Store::new(":memory:").await.expect("should create store");
        let id = store.insert_mint(&mint("9", None, "badge")).await.unwrap();
        store
            .update_listing_flag(id, true, Some("3 MATIC"))
            .await
            .unwrap();

        let mints = store.get_mints_by_collection("col-1").await.unwrap();
        assert_eq!(mints.len(), 1);
        assert!(mints[0].is_listed);
        assert_eq!(mints[0].price_formatted.as_deref(), Some("3 MATIC"));
    }

    #[tokio::test]
    async fn test_collections_by_chain() {
        let store = Store::new(":memory:").await.expect("should create store");
        for (id, chain_id) in [("a", 80002), ("b", 137)] {
            store
                .insert_collection(&CollectionRow {
                    id: id.to_string(),
                    name: format!("Collection {id}"),
                    category: "jersey".to_string(),
                    contract_address: "0xAAA".to_string(),
                    chain_id,
                    creator: None,
                    total_supply: None,
                    image_url: None,
                    created_at: None,
                })
                .await
                .unwrap();
        }

        let collections = store.collections(80002).await.unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].id, "a");
    }
}
