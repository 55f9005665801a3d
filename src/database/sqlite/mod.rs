use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::database::sqlite::models::{
    Collection, CollectionStats, EmbeddingRecord, NewRecord, QaPair, StoredRecord,
};
use crate::database::sqlite::queries::RecordQueries;


pub mod models;
pub mod queries;

pub type DbPool = Pool<Sqlite>;

/// Validated contents of one collection
#[derive(Debug, Clone, Default)]
pub struct CollectionScan {
    /// Records with a usable embedding, in insertion order
    pub records: Vec<EmbeddingRecord>,
    /// Rows dropped because their embedding was missing or malformed
    pub skipped: usize,
}

/// Connection to the document store
///
/// Cheap to clone; every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    pub async fn initialize_from_base_dir(base_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(base_dir).with_context(|| {
            format!("Failed to create store directory: {}", base_dir.display())
        })?;

        Self::new(base_dir.join("store.db")).await
    }

    pub async fn insert_record(&self, record: NewRecord) -> Result<StoredRecord> {
        RecordQueries::create(&self.pool, record).await
    }

    pub async fn insert_qa_pair(
        &self,
        pair: &QaPair,
        question_embedding: Option<Vec<f32>>,
    ) -> Result<StoredRecord> {
        RecordQueries::create(&self.pool, NewRecord::qa_pair(pair, question_embedding)).await
    }

    pub async fn list_raw_records(&self, collection: Collection) -> Result<Vec<StoredRecord>> {
        RecordQueries::list_by_collection(&self.pool, collection).await
    }

    /// Fetch a whole collection, keeping only rows whose embedding validates
    pub async fn fetch_collection(&self, collection: Collection) -> Result<CollectionScan> {
        let rows = self.list_raw_records(collection).await?;
        let total = rows.len();

        let records: Vec<EmbeddingRecord> = rows
            .into_iter()
            .filter_map(StoredRecord::into_embedding_record)
            .collect();

        let skipped = total - records.len();
        if skipped > 0 {
            debug!(
                "Skipped {} of {} records in {} without a usable embedding",
                skipped, total, collection
            );
        }

        Ok(CollectionScan { records, skipped })
    }

    pub async fn collection_stats(&self, collection: Collection) -> Result<CollectionStats> {
        let total = RecordQueries::count_by_collection(&self.pool, collection).await?;
        let scan = self.fetch_collection(collection).await?;

        Ok(CollectionStats {
            collection,
            total,
            searchable: i64::try_from(scan.records.len()).unwrap_or(i64::MAX),
        })
    }

    pub async fn clear_collection(&self, collection: Collection) -> Result<u64> {
        let deleted = RecordQueries::delete_collection(&self.pool, collection).await?;
        info!("Removed {} records from {}", deleted, collection);
        Ok(deleted)
    }
}
