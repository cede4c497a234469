//! Resume vector store: full-dimension embeddings plus payload, keyed by filename.
//!
//! `PgResumeStore` persists to Postgres (`REAL[]` vectors); the test-only
//! `InMemoryResumeStore` mirrors it. Both return records in ingestion order, which
//! is the corpus order the retriever uses to break ties.

#[cfg(test)]
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Vector dimension mismatch for collection '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },
}

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumePayload {
    pub filename: String,
    pub filepath: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRecord {
    pub id: String,
    pub filename: String,
    pub filepath: String,
    pub text: String,
    pub vector: Vec<f32>,
    pub ingested_at: DateTime<Utc>,
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Creates the collection if missing and checks its vector dimension.
    async fn ensure_collection(&self) -> Result<(), StoreError>;

    /// Inserts or replaces the vector stored under `id`.
    async fn upsert(
        &self,
        id: &str,
        vector: Vec<f32>,
        payload: ResumePayload,
    ) -> Result<(), StoreError>;

    /// All records in ingestion order, optionally filtered by filename.
    async fn scroll(&self, filename: Option<&str>) -> Result<Vec<ResumeRecord>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Removes every record from the collection.
    async fn clear(&self) -> Result<(), StoreError>;

    async fn get_resume_text(&self, filename: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .scroll(Some(filename))
            .await?
            .into_iter()
            .next()
            .map(|r| r.text))
    }
}

fn check_dimension(collection: &str, expected: usize, actual: usize) -> Result<(), StoreError> {
    if expected != actual {
        return Err(StoreError::DimensionMismatch {
            collection: collection.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres
// ────────────────────────────────────────────────────────────────────────────

pub struct PgResumeStore {
    pool: PgPool,
    collection: String,
    dimension: usize,
}

impl PgResumeStore {
    pub fn new(pool: PgPool, collection: impl Into<String>, dimension: usize) -> Self {
        Self {
            pool,
            collection: collection.into(),
            dimension,
        }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn ensure_collection(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vector_collections (
                name TEXT PRIMARY KEY,
                dimension INTEGER NOT NULL,
                distance TEXT NOT NULL DEFAULT 'cosine'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resume_vectors (
                collection TEXT NOT NULL REFERENCES vector_collections(name) ON DELETE CASCADE,
                point_id TEXT NOT NULL,
                filename TEXT NOT NULL,
                filepath TEXT NOT NULL,
                text TEXT NOT NULL,
                vector REAL[] NOT NULL,
                ingested_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (collection, point_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "INSERT INTO vector_collections (name, dimension) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
        )
        .bind(&self.collection)
        .bind(self.dimension as i32)
        .execute(&self.pool)
        .await?;

        let stored: i32 =
            sqlx::query_scalar("SELECT dimension FROM vector_collections WHERE name = $1")
                .bind(&self.collection)
                .fetch_one(&self.pool)
                .await?;
        check_dimension(&self.collection, self.dimension, stored as usize)?;

        info!(
            "Vector collection '{}' ready ({} dims, cosine)",
            self.collection, self.dimension
        );
        Ok(())
    }

    async fn upsert(
        &self,
        id: &str,
        vector: Vec<f32>,
        payload: ResumePayload,
    ) -> Result<(), StoreError> {
        check_dimension(&self.collection, self.dimension, vector.len())?;

        sqlx::query(
            r#"
            INSERT INTO resume_vectors (collection, point_id, filename, filepath, text, vector)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (collection, point_id) DO UPDATE
            SET filename = EXCLUDED.filename,
                filepath = EXCLUDED.filepath,
                text = EXCLUDED.text,
                vector = EXCLUDED.vector,
                ingested_at = now()
            "#,
        )
        .bind(&self.collection)
        .bind(id)
        .bind(&payload.filename)
        .bind(&payload.filepath)
        .bind(&payload.text)
        .bind(&vector)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn scroll(&self, filename: Option<&str>) -> Result<Vec<ResumeRecord>, StoreError> {
        let records = sqlx::query_as::<_, ResumeRecord>(
            r#"
            SELECT point_id AS id, filename, filepath, text, vector, ingested_at
            FROM resume_vectors
            WHERE collection = $1 AND ($2::TEXT IS NULL OR filename = $2)
            ORDER BY ingested_at, point_id
            "#,
        )
        .bind(&self.collection)
        .bind(filename)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM resume_vectors WHERE collection = $1")
                .bind(&self.collection)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM resume_vectors WHERE collection = $1")
            .bind(&self.collection)
            .execute(&self.pool)
            .await?
            .rows_affected();
        info!("Cleared {deleted} resumes from '{}'", self.collection);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub struct InMemoryResumeStore {
    collection: String,
    dimension: usize,
    records: RwLock<Vec<ResumeRecord>>,
}

#[cfg(test)]
impl InMemoryResumeStore {
    pub fn new(collection: impl Into<String>, dimension: usize) -> Self {
        Self {
            collection: collection.into(),
            dimension,
            records: RwLock::new(Vec::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl ResumeStore for InMemoryResumeStore {
    async fn ensure_collection(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert(
        &self,
        id: &str,
        vector: Vec<f32>,
        payload: ResumePayload,
    ) -> Result<(), StoreError> {
        check_dimension(&self.collection, self.dimension, vector.len())?;

        let record = ResumeRecord {
            id: id.to_string(),
            filename: payload.filename,
            filepath: payload.filepath,
            text: payload.text,
            vector,
            ingested_at: Utc::now(),
        };

        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        match records.iter_mut().find(|r| r.id == id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn scroll(&self, filename: Option<&str>) -> Result<Vec<ResumeRecord>, StoreError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .iter()
            .filter(|r| filename.map_or(true, |f| r.filename == f))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.records.read().unwrap_or_else(|e| e.into_inner()).len() as u64)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        Ok(())
    }
}
