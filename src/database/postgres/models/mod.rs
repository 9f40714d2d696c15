
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Label applied to every chunk row from a source directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Historical,
    Headmaster,
}

impl DocumentType {
    /// The stored `document_type` column value
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Historical => "historical",
            DocumentType::Headmaster => "headmaster",
        }
    }
}

impl std::fmt::Display for DocumentType {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chunk ready to be written to the documents table
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: serde_json::Value,
    pub document_type: DocumentType,
}

/// A chunk returned by similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RetrievedDocument {
    pub content: String,
    pub metadata: Option<serde_json::Value>,
    pub document_type: String,
}

/// Per-type ingestion statistics for the status report
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TypeStats {
    pub document_type: String,
    pub row_count: i64,
    pub last_created_at: Option<DateTime<Utc>>,
}
