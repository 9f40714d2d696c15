#[cfg(test)]
mod tests;

pub mod models;

use anyhow::{Context, Result};
use itertools::Itertools;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::SupabaseConfig;
use models::{NewDocument, RetrievedDocument, TypeStats};

/// Statements run by the one-time provisioner. Table and index creation is
/// unguarded: re-running fails once the objects exist.
const CREATE_VECTOR_EXTENSION: &str = "CREATE EXTENSION IF NOT EXISTS vector";

const CREATE_DOCUMENTS_TABLE: &str = "\
CREATE TABLE documents (
    id uuid DEFAULT gen_random_uuid() PRIMARY KEY,
    content text NOT NULL,
    embedding vector(1536),
    metadata jsonb,
    document_type text NOT NULL,
    created_at timestamptz DEFAULT now()
)";

const CREATE_CHAT_HISTORY_TABLE: &str = "\
CREATE TABLE chat_history (
    id uuid DEFAULT gen_random_uuid() PRIMARY KEY,
    session_id uuid NOT NULL,
    role text NOT NULL,
    content text NOT NULL,
    created_at timestamptz DEFAULT now()
)";

const CREATE_USER_SESSIONS_TABLE: &str = "\
CREATE TABLE user_sessions (
    id uuid DEFAULT gen_random_uuid() PRIMARY KEY,
    user_id uuid,
    created_at timestamptz DEFAULT now()
)";

const CREATE_EMBEDDING_INDEX: &str = "\
CREATE INDEX ON documents
USING ivfflat (embedding vector_cosine_ops)
WITH (lists = 100)";

const CREATE_DOCUMENT_TYPE_INDEX: &str = "CREATE INDEX ON documents (document_type)";

const CREATE_SESSION_INDEX: &str = "CREATE INDEX ON chat_history (session_id)";

/// What happened to one row during a chunk batch write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Uuid),
    /// The store rejected this row; remaining rows are still attempted
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    #[inline]
    pub async fn connect(config: &SupabaseConfig) -> Result<Self> {
        let options = PgConnectOptions::from_str(&config.url)
            .context("Failed to parse SUPABASE_URL as a Postgres connection string")?
            .password(&config.service_key);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        Ok(Self { pool })
    }

    #[inline]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// One-time schema setup: tables, the vector extension, and indexes
    #[inline]
    pub async fn provision(&self) -> Result<()> {
        info!("Enabling vector extension");
        sqlx::query(CREATE_VECTOR_EXTENSION)
            .execute(&self.pool)
            .await
            .context("Failed to enable vector extension")?;

        info!("Creating tables");
        sqlx::query(CREATE_DOCUMENTS_TABLE)
            .execute(&self.pool)
            .await
            .context("Failed to create documents table")?;
        sqlx::query(CREATE_CHAT_HISTORY_TABLE)
            .execute(&self.pool)
            .await
            .context("Failed to create chat_history table")?;
        sqlx::query(CREATE_USER_SESSIONS_TABLE)
            .execute(&self.pool)
            .await
            .context("Failed to create user_sessions table")?;

        info!("Creating indexes");
        sqlx::query(CREATE_EMBEDDING_INDEX)
            .execute(&self.pool)
            .await
            .context("Failed to create embedding index")?;
        sqlx::query(CREATE_DOCUMENT_TYPE_INDEX)
            .execute(&self.pool)
            .await
            .context("Failed to create document_type index")?;
        sqlx::query(CREATE_SESSION_INDEX)
            .execute(&self.pool)
            .await
            .context("Failed to create session_id index")?;

        info!("Database provisioning completed");
        Ok(())
    }

    /// Insert a single chunk row, returning its generated id
    async fn insert_document(&self, document: &NewDocument) -> Result<Uuid, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO documents (content, embedding, metadata, document_type)
             VALUES ($1, $2::vector, $3, $4)
             RETURNING id",
        )
        .bind(&document.content)
        .bind(vector_literal(&document.embedding))
        .bind(&document.metadata)
        .bind(document.document_type.as_str())
        .fetch_one(&self.pool)
        .await
    }

    /// Write a batch of chunks. Rows the store rejects are logged and
    /// skipped; any other error aborts the remaining rows and propagates.
    #[inline]
    pub async fn store_chunks(&self, documents: &[NewDocument]) -> Result<Vec<InsertOutcome>> {
        let mut outcomes = Vec::with_capacity(documents.len());

        for document in documents {
            match self.insert_document(document).await {
                Ok(id) => {
                    debug!("Inserted chunk {id}");
                    outcomes.push(InsertOutcome::Inserted(id));
                }
                Err(sqlx::Error::Database(db_error)) => {
                    error!("Error inserting chunk: {db_error}");
                    outcomes.push(InsertOutcome::Rejected(db_error.to_string()));
                }
                Err(error) => {
                    error!("Error storing chunks: {error}");
                    return Err(error).context("Failed to store chunk batch");
                }
            }
        }

        Ok(outcomes)
    }

    /// Nearest-neighbor search by cosine distance over the embedding column
    #[inline]
    pub async fn similarity_search(
        &self,
        embedding: &[f32],
        limit: i64,
    ) -> Result<Vec<RetrievedDocument>> {
        let documents = sqlx::query_as::<_, RetrievedDocument>(
            "SELECT content, metadata, document_type
             FROM documents
             ORDER BY embedding <=> $1::vector
             LIMIT $2",
        )
        .bind(vector_literal(embedding))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to run similarity search")?;

        debug!("Similarity search returned {} document(s)", documents.len());
        Ok(documents)
    }

    /// Row counts and latest insert time per document type
    #[inline]
    pub async fn document_counts(&self) -> Result<Vec<TypeStats>> {
        sqlx::query_as::<_, TypeStats>(
            "SELECT document_type,
                    COUNT(*) AS row_count,
                    MAX(created_at) AS last_created_at
             FROM documents
             GROUP BY document_type
             ORDER BY document_type",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load document statistics")
    }
}

/// pgvector input literal, e.g. `[0.1,0.2,0.3]`
fn vector_literal(embedding: &[f32]) -> String {
    format!("[{}]", embedding.iter().join(","))
}
