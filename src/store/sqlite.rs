//! SQLite-backed vector store.
//!
//! In-process store for local deployments and tests: passages and metadata
//! in SQLite, embeddings as little-endian f32 blobs, brute-force cosine
//! similarity at query time. No external server required.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use crate::core::errors::RetrievalError;
use super::{apply_filters, DocumentRecord, SearchFilter, SearchResult, VectorStore};

/// Handle bound to one search index inside a SQLite database file.
pub struct SqliteVectorStore {
    pool: SqlitePool,
    index_name: String,
}

impl SqliteVectorStore {
    /// Open (creating the file if missing) and bind to `index_name`.
    ///
    /// The index itself must be registered with [`create_index`] before
    /// the first search; searching an unregistered index fails with
    /// [`RetrievalError::IndexNotFound`].
    ///
    /// [`create_index`]: SqliteVectorStore::create_index
    pub async fn open(db_path: impl AsRef<Path>, index_name: &str) -> Result<Self, RetrievalError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(RetrievalError::store)?;

        let store = Self {
            pool,
            index_name: index_name.to_string(),
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), RetrievalError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS search_indexes (
                name TEXT PRIMARY KEY,
                dimension INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(RetrievalError::store)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                doc_id TEXT PRIMARY KEY,
                index_name TEXT NOT NULL REFERENCES search_indexes(name),
                content TEXT NOT NULL,
                metadata TEXT DEFAULT '{}',
                embedding BLOB NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(RetrievalError::store)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_index ON documents(index_name)")
            .execute(&self.pool)
            .await
            .map_err(RetrievalError::store)?;

        Ok(())
    }

    /// Register the bound index with its fixed dimensionality.
    pub async fn create_index(&self, dimension: usize) -> Result<(), RetrievalError> {
        if dimension == 0 {
            return Err(RetrievalError::InvalidRequest(
                "index dimension must be >= 1".to_string(),
            ));
        }
        sqlx::query("INSERT OR REPLACE INTO search_indexes (name, dimension) VALUES (?1, ?2)")
            .bind(&self.index_name)
            .bind(dimension as i64)
            .execute(&self.pool)
            .await
            .map_err(RetrievalError::store)?;
        Ok(())
    }

    /// Insert or replace a document with its embedding. Population helper
    /// for local deployments and fixtures; the query path never writes.
    pub async fn upsert(
        &self,
        document: DocumentRecord,
        embedding: Vec<f32>,
    ) -> Result<(), RetrievalError> {
        let dimension = self.index_dimension().await?;
        if embedding.len() != dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: dimension,
                got: embedding.len(),
            });
        }

        let metadata = document
            .metadata
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "{}".to_string());

        sqlx::query(
            "INSERT OR REPLACE INTO documents (doc_id, index_name, content, metadata, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&document.id)
        .bind(&self.index_name)
        .bind(&document.content)
        .bind(&metadata)
        .bind(serialize_embedding(&embedding))
        .execute(&self.pool)
        .await
        .map_err(RetrievalError::store)?;

        Ok(())
    }

    /// The dimensionality the bound index was registered with.
    async fn index_dimension(&self) -> Result<usize, RetrievalError> {
        let row = sqlx::query("SELECT dimension FROM search_indexes WHERE name = ?1")
            .bind(&self.index_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(RetrievalError::store)?;

        match row {
            Some(row) => {
                let dimension: i64 = row.get("dimension");
                Ok(dimension as usize)
            }
            None => Err(RetrievalError::IndexNotFound(self.index_name.clone())),
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filters: &[SearchFilter],
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        let dimension = self.index_dimension().await?;
        if vector.len() != dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: dimension,
                got: vector.len(),
            });
        }

        // Candidates come back in rowid order; the stable sort below keeps
        // that order for equal scores.
        let rows = sqlx::query(
            "SELECT doc_id, content, metadata, embedding
             FROM documents WHERE index_name = ?1 ORDER BY rowid",
        )
        .bind(&self.index_name)
        .fetch_all(&self.pool)
        .await
        .map_err(RetrievalError::store)?;

        let mut scored: Vec<SearchResult> = rows
            .iter()
            .map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                let stored = deserialize_embedding(&embedding_bytes);
                let doc_id: String = row.get("doc_id");
                let metadata_str: String = row.get("metadata");

                let metadata = match serde_json::from_str(&metadata_str) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::warn!(
                            doc_id = %doc_id,
                            error = %e,
                            "stored metadata is not valid JSON, treating as absent"
                        );
                        None
                    }
                };

                SearchResult {
                    document: DocumentRecord {
                        id: doc_id,
                        content: row.get("content"),
                        metadata,
                    },
                    score: cosine_similarity(vector, &stored),
                }
            })
            .collect();

        apply_filters(&mut scored, filters);

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        Ok(scored)
    }
}

fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}
