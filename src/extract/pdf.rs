//! PDF extraction: page text via `pdf-extract`, bookmark outline via
//! `lopdf`. The two libraries serve different needs — `pdf-extract` does
//! text layout reconstruction well but exposes no bookmark tree, `lopdf`
//! gives raw object access to walk `/Outlines` but no text extraction.

use std::collections::HashMap;
use std::panic;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use crate::budget::Budget;
use crate::error::DslError;
use crate::extract::OutlineEntry;

pub fn extract_pages(path: &Path, budget: &Budget) -> Result<Vec<String>, DslError> {
    budget.check("extract:pdf")?;
    let owned = path.to_path_buf();
    let pages = panic::catch_unwind(move || pdf_extract::extract_text_by_pages(&owned))
        .map_err(|_| pdf_error(path, "pdf-extract panicked while parsing the document"))?
        .map_err(|e| pdf_error(path, &e.to_string()))?;

    Ok(pages.into_iter().map(|page| page.trim().to_string()).collect())
}

fn pdf_error(path: &Path, detail: &str) -> DslError {
    DslError::runtime(format!("Failed to read PDF '{}': {detail}", file_name(path)))
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Walks the document's `/Outlines` bookmark tree. Returns an empty vector
/// (never an error) on anything malformed — the caller falls back to
/// regex-scanning the page text instead.
pub fn read_outline(path: &Path, max_items: usize) -> Vec<OutlineEntry> {
    try_read_outline(path, max_items).unwrap_or_default()
}

fn try_read_outline(path: &Path, max_items: usize) -> Option<Vec<OutlineEntry>> {
    let doc = Document::load(path).ok()?;
    let pages_by_object = doc.get_pages();
    let page_numbers: HashMap<ObjectId, u32> = pages_by_object.into_iter().map(|(num, id)| (id, num)).collect();

    let catalog = doc.catalog().ok()?;
    let outlines_ref = catalog.get(b"Outlines").ok()?;
    let outlines_dict = doc.get_object(outlines_ref.as_reference().ok()?).ok()?.as_dict().ok()?;
    let first_ref = outlines_dict.get(b"First").ok()?.as_reference().ok()?;

    let mut entries = Vec::new();
    walk_outline(&doc, first_ref, 1, &page_numbers, max_items, &mut entries);
    Some(entries)
}

fn walk_outline(
    doc: &Document,
    node_ref: ObjectId,
    level: usize,
    page_numbers: &HashMap<ObjectId, u32>,
    max_items: usize,
    entries: &mut Vec<OutlineEntry>,
) {
    if entries.len() >= max_items {
        return;
    }
    let Ok(node) = doc.get_object(node_ref) else { return };
    let Ok(dict) = node.as_dict() else { return };

    if let Ok(title_obj) = dict.get(b"Title") {
        if let Ok(title_bytes) = title_obj.as_str() {
            let title = decode_pdf_string(title_bytes);
            if !title.is_empty() {
                let page = resolve_dest_page(doc, dict, page_numbers);
                entries.push(OutlineEntry { level, title, page });
            }
        }
    }

    if entries.len() < max_items {
        if let Ok(first_child) = dict.get(b"First").and_then(Object::as_reference) {
            walk_outline(doc, first_child, level + 1, page_numbers, max_items, entries);
        }
    }

    if entries.len() < max_items {
        if let Ok(next) = dict.get(b"Next").and_then(Object::as_reference) {
            walk_outline(doc, next, level, page_numbers, max_items, entries);
        }
    }
}

fn resolve_dest_page(doc: &Document, dict: &lopdf::Dictionary, page_numbers: &HashMap<ObjectId, u32>) -> Option<usize> {
    let dest_array = if let Ok(dest) = dict.get(b"Dest") {
        dest.as_array().ok().map(|a| a.to_vec())
    } else if let Ok(action) = dict.get(b"A").and_then(Object::as_dict) {
        action.get(b"D").ok().and_then(|d| d.as_array().ok()).map(|a| a.to_vec())
    } else {
        None
    }?;

    let page_ref = dest_array.first()?.as_reference().ok()?;
    doc.get_object(page_ref)
        .ok()
        .and_then(|_| page_numbers.get(&page_ref))
        .map(|&n| n as usize)
}

fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16_lossy(&utf16).trim().to_string()
    } else {
        String::from_utf8_lossy(bytes).trim().to_string()
    }
}
