// Batch processor
// Walks the configured source directories and runs load -> split -> embed -> store per file


use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::{Config, SourceConfig};
use crate::database::postgres::models::{DocumentType, NewDocument};
use crate::database::postgres::{Database, InsertOutcome};
use crate::embeddings::chunking::{SplitterConfig, TextChunk, split_documents};
use crate::embeddings::openai::OpenAiClient;
use crate::loader::{is_supported, load_document};

/// Statistics for one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub files_processed: usize,
    pub chunks_created: usize,
    pub rows_inserted: usize,
    pub rows_rejected: usize,
}

pub struct Ingestor {
    database: Database,
    embeddings: OpenAiClient,
    splitter: SplitterConfig,
    sources: Vec<SourceConfig>,
}

impl Ingestor {
    #[inline]
    pub fn new(database: Database, embeddings: OpenAiClient, config: &Config) -> Self {
        Self {
            database,
            embeddings,
            splitter: config.splitter.clone(),
            sources: config.sources.clone(),
        }
    }

    /// Process every configured source directory sequentially. The first
    /// load, embedding, or batch-level storage error aborts the run.
    #[inline]
    pub async fn process_all(&self) -> Result<IngestStats> {
        let mut stats = IngestStats::default();

        for source in &self.sources {
            info!(
                "Processing {} documents from {}",
                source.document_type,
                source.dir.display()
            );
            self.process_directory(source, &mut stats).await?;
        }

        info!("Document processing completed successfully");
        Ok(stats)
    }

    async fn process_directory(
        &self,
        source: &SourceConfig,
        stats: &mut IngestStats,
    ) -> Result<()> {
        let files = list_source_files(&source.dir)?;
        let progress = ProgressBar::new(files.len() as u64);

        for path in files {
            progress.set_message(path.display().to_string());
            self.process_file(&path, source.document_type, stats).await?;
            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(())
    }

    async fn process_file(
        &self,
        path: &Path,
        document_type: DocumentType,
        stats: &mut IngestStats,
    ) -> Result<()> {
        info!("Processing {} document: {}", document_type, path.display());

        let chunks = collect_chunks(path, &self.splitter)?;
        if chunks.is_empty() {
            stats.files_processed += 1;
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        let embeddings = self.embeddings.embed_batch(&texts).inspect_err(|error| {
            error!("Error processing document {}: {error:#}", path.display());
        })?;

        let documents: Vec<NewDocument> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| NewDocument {
                content: chunk.content,
                embedding,
                metadata: chunk.metadata,
                document_type,
            })
            .collect();

        let outcomes = self
            .database
            .store_chunks(&documents)
            .await
            .inspect_err(|error| {
                error!("Error storing chunks: {error:#}");
            })?;

        stats.files_processed += 1;
        stats.chunks_created += documents.len();
        for outcome in &outcomes {
            match outcome {
                InsertOutcome::Inserted(_) => stats.rows_inserted += 1,
                InsertOutcome::Rejected(_) => stats.rows_rejected += 1,
            }
        }

        Ok(())
    }
}

/// Load one file and split it into chunks. Errors are logged and re-raised.
#[inline]
pub fn collect_chunks(path: &Path, splitter: &SplitterConfig) -> Result<Vec<TextChunk>> {
    let records = load_document(path).inspect_err(|error| {
        error!("Error processing document {}: {error:#}", path.display());
    })?;

    Ok(split_documents(&records, splitter))
}

/// Files with a recognized extension in the directory, sorted by name
#[inline]
pub fn list_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read source directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .context("Failed to read directory entry")?
            .path();
        if path.is_file() && is_supported(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
