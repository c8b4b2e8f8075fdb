//! Format-dispatching document extraction. Every `File` chunk/outline
//! request funnels through here; the dispatch is purely by extension, with
//! plain-text chunking as the universal fallback.

pub mod docx;
pub mod pdf;
pub mod pptx;
pub mod text;
pub mod toc;

use std::path::Path;

use crate::budget::Budget;
use crate::error::DslError;

#[derive(Debug, Clone)]
pub struct OutlineEntry {
    pub level: usize,
    pub title: String,
    pub page: Option<usize>,
}

fn extension_lower(path: &Path) -> String {
    path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase()
}

/// Extracts the page/chunk sequence for `path`. Never returns an empty
/// vector: a document with no recoverable text still produces one empty
/// page, so page-indexed operations have something to address. `chunk_lines`
/// only affects plain-text chunking (native, or the docx/pptx fallback).
pub fn chunks_for_path(path: &Path, budget: &Budget, chunk_lines: usize) -> Result<Vec<String>, DslError> {
    let chunks = match extension_lower(path).as_str() {
        "pdf" => pdf::extract_pages(path, budget)?,
        "docx" => docx::extract_chunks(path, budget, chunk_lines)?,
        "pptx" => pptx::extract_chunks(path, budget, chunk_lines)?,
        _ => text::extract_chunks(path, budget, chunk_lines)?,
    };
    if chunks.is_empty() {
        Ok(vec![String::new()])
    } else {
        Ok(chunks)
    }
}

/// Outline dispatch mirrors chunk dispatch: a format-native reader first,
/// falling back to a regex scan of the already-materialized chunks when the
/// native reader finds nothing (or the format has no native outline at all,
/// as with plain text).
pub fn outline_for_path(path: &Path, chunks: &[String], max_items: usize) -> Vec<OutlineEntry> {
    let native = match extension_lower(path).as_str() {
        "pdf" => pdf::read_outline(path, max_items),
        "docx" => docx::read_outline(path, max_items),
        "pptx" => pptx::read_outline(path, max_items),
        _ => Vec::new(),
    };
    if native.is_empty() {
        toc::scan_text_toc(chunks, max_items)
    } else {
        native
    }
}
