
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::loader::DocumentRecord;

/// Configuration for the sliding-window splitter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SplitterConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Characters shared between adjacent chunks
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// A chunk of document text carrying a copy of its originating metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub content: String,
    pub metadata: serde_json::Value,
    /// Position of this chunk within its source record
    pub chunk_index: usize,
}

/// Split text into overlapping character windows. Windows advance by
/// `chunk_size - chunk_overlap` and never split a UTF-8 character.
#[inline]
pub fn split_text(text: &str, config: &SplitterConfig) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    // byte offsets of char boundaries, one extra entry for the end of input
    let mut boundaries: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();
    boundaries.push(text.len());
    let char_len = boundaries.len() - 1;

    let stride = config
        .chunk_size
        .saturating_sub(config.chunk_overlap)
        .max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < char_len {
        let end = (start + config.chunk_size).min(char_len);
        let chunk = text.get(boundaries[start]..boundaries[end]).unwrap_or("");
        chunks.push(chunk.to_string());
        start += stride;
    }

    chunks
}

/// Split a sequence of document records into embedding-ready chunks, each
/// retaining the metadata of the record it came from.
#[inline]
pub fn split_documents(records: &[DocumentRecord], config: &SplitterConfig) -> Vec<TextChunk> {
    let mut chunks = Vec::new();

    for record in records {
        for (chunk_index, content) in split_text(&record.content, config).into_iter().enumerate() {
            chunks.push(TextChunk {
                content,
                metadata: record.metadata.clone(),
                chunk_index,
            });
        }
    }

    debug!(
        "Split {} document record(s) into {} chunks",
        records.len(),
        chunks.len()
    );

    chunks
}
