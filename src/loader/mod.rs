// Document loader module
// Dispatches on file extension: .pdf is parsed per page, anything else is read as text


use anyhow::{Context, Result};
use lopdf::Document as PdfDocument;
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::RagError;

/// A raw document record: extracted text plus source metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub content: String,
    pub metadata: serde_json::Value,
}

/// Load a file into one or more document records. PDF files produce one
/// record per page; any other extension is treated as plain text.
#[inline]
pub fn load_document(path: &Path) -> Result<Vec<DocumentRecord>> {
    let records = if has_extension(path, "pdf") {
        load_pdf(path)?
    } else {
        load_text(path)?
    };

    debug!(
        "Loaded {} record(s) from {}",
        records.len(),
        path.display()
    );

    Ok(records)
}

/// Whether the batch processor picks this file up
#[inline]
pub fn is_supported(path: &Path) -> bool {
    has_extension(path, "pdf") || has_extension(path, "txt")
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

fn load_text(path: &Path) -> Result<Vec<DocumentRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read text file: {}", path.display()))?;

    Ok(vec![DocumentRecord {
        content,
        metadata: json!({ "source": path.to_string_lossy() }),
    }])
}

fn load_pdf(path: &Path) -> Result<Vec<DocumentRecord>> {
    let document = PdfDocument::load(path)
        .with_context(|| format!("Failed to parse PDF file: {}", path.display()))?;

    let pages = document.get_pages();
    if pages.is_empty() {
        return Err(
            RagError::Document(format!("PDF contains no pages: {}", path.display())).into(),
        );
    }

    let mut records = Vec::with_capacity(pages.len());
    for page_number in pages.keys() {
        let content = document.extract_text(&[*page_number]).with_context(|| {
            format!(
                "Failed to extract text from page {} of {}",
                page_number,
                path.display()
            )
        })?;

        records.push(DocumentRecord {
            content,
            metadata: json!({
                "source": path.to_string_lossy(),
                "page": page_number - 1,
            }),
        });
    }

    Ok(records)
}
