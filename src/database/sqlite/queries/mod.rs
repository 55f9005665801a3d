#[cfg(test)]
mod tests;

use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

pub struct RecordQueries;

impl RecordQueries {
    /// Append a record; the store assigns its identifier and creation time
    #[inline]
    pub async fn create(pool: &SqlitePool, new_record: NewRecord) -> Result<StoredRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let embedding = new_record
            .embedding
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize embedding")?;
        let metadata =
            serde_json::to_string(&new_record.metadata).context("Failed to serialize metadata")?;

        sqlx::query(
            "INSERT INTO records (id, collection, content, embedding, metadata, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(new_record.collection)
        .bind(new_record.content.as_str())
        .bind(embedding.as_deref())
        .bind(metadata.as_str())
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to insert record")?;

        debug!("Inserted record {} into {}", id, new_record.collection);

        Self::get_by_id(pool, &id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created record"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<StoredRecord>> {
        let result = sqlx::query_as::<_, StoredRecord>(
            r#"
            SELECT id, collection, content, embedding, metadata, created_at
            FROM records WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get record by id")?;

        Ok(result)
    }

    /// Every record of one collection in insertion order
    #[inline]
    pub async fn list_by_collection(
        pool: &SqlitePool,
        collection: Collection,
    ) -> Result<Vec<StoredRecord>> {
        let records = sqlx::query_as::<_, StoredRecord>(
            r#"
            SELECT id, collection, content, embedding, metadata, created_at
            FROM records WHERE collection = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(collection)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to list records in {}", collection))?;

        Ok(records)
    }

    #[inline]
    pub async fn count_by_collection(pool: &SqlitePool, collection: Collection) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE collection = ?")
            .bind(collection)
            .fetch_one(pool)
            .await
            .context("Failed to count records")?;

        Ok(count)
    }

    #[inline]
    pub async fn delete_collection(pool: &SqlitePool, collection: Collection) -> Result<u64> {
        let result = sqlx::query("DELETE FROM records WHERE collection = ?")
            .bind(collection)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to clear {}", collection))?;

        Ok(result.rows_affected())
    }
}
