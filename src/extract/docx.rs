//! DOCX extraction via `zip` + `quick-xml` over `word/document.xml`.
//!
//! No dependency on a full OOXML object model: we stream the document body
//! into a flat sequence of paragraphs (with style) and tables, in document
//! order, then fold that into chunks / headings as needed.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::budget::Budget;
use crate::error::DslError;
use crate::extract::OutlineEntry;

enum Block {
    Paragraph { text: String, style: Option<String> },
    Table(Vec<Vec<String>>),
}

pub fn extract_chunks(path: &Path, budget: &Budget, chunk_lines: usize) -> Result<Vec<String>, DslError> {
    let blocks = match parse_body(path, budget) {
        Ok(blocks) => blocks,
        Err(err @ DslError::Timeout { .. }) => return Err(err),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "DOCX body unreadable, falling back to plain-text chunking");
            return crate::extract::text::extract_chunks(path, budget, chunk_lines);
        }
    };
    let mut chunks = Vec::new();
    let mut group: Vec<String> = Vec::new();

    for block in blocks {
        match block {
            Block::Paragraph { text, style } => {
                if text.trim().is_empty() {
                    continue;
                }
                if is_heading_style(style.as_deref()) && !group.is_empty() {
                    chunks.push(group.join("\n"));
                    group = Vec::new();
                }
                group.push(text);
            }
            Block::Table(rows) => {
                if !group.is_empty() {
                    chunks.push(group.join("\n"));
                    group = Vec::new();
                }
                let table_text = rows
                    .into_iter()
                    .map(|cells| cells.join(" | "))
                    .collect::<Vec<_>>()
                    .join("\n");
                chunks.push(table_text);
            }
        }
    }
    if !group.is_empty() {
        chunks.push(group.join("\n"));
    }

    if chunks.is_empty() {
        Ok(vec![String::new()])
    } else {
        Ok(chunks)
    }
}

pub fn read_outline(path: &Path, max_items: usize) -> Vec<OutlineEntry> {
    let Ok(blocks) = parse_body(path, &Budget::unbounded()) else {
        return Vec::new();
    };
    let mut entries = Vec::new();
    for block in blocks {
        if entries.len() >= max_items {
            break;
        }
        if let Block::Paragraph { text, style } = block {
            if let Some(level) = heading_level(style.as_deref()) {
                let title = text.trim().to_string();
                if !title.is_empty() {
                    entries.push(OutlineEntry { level, title, page: None });
                }
            }
        }
    }
    entries
}

fn is_heading_style(style: Option<&str>) -> bool {
    heading_level(style).is_some()
}

fn heading_level(style: Option<&str>) -> Option<usize> {
    let style = style?;
    if style.eq_ignore_ascii_case("Title") {
        return Some(1);
    }
    let digits: String = style.chars().filter(|c| c.is_ascii_digit()).collect();
    if style.starts_with("Heading") && !digits.is_empty() {
        digits.parse().ok()
    } else {
        None
    }
}

fn parse_body(path: &Path, budget: &Budget) -> Result<Vec<Block>, DslError> {
    let file = File::open(path).map_err(|e| docx_error(path, &e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| docx_error(path, &e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| docx_error(path, &e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| docx_error(path, &e.to_string()))?;

    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(false);

    let mut blocks = Vec::new();
    let mut buf = Vec::new();

    let mut in_paragraph = false;
    let mut para_text = String::new();
    let mut para_style: Option<String> = None;
    let mut in_table = false;
    let mut table_rows: Vec<Vec<String>> = Vec::new();
    let mut row_cells: Vec<String> = Vec::new();
    let mut cell_text = String::new();
    let mut in_cell = false;
    let mut in_text_run = false;

    loop {
        budget.check("extract:docx")?;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"p" => {
                    in_paragraph = true;
                    para_text.clear();
                    para_style = None;
                }
                b"pStyle" => {
                    if let Some(val) = attr_value(&e, b"val") {
                        para_style = Some(val);
                    }
                }
                b"t" => in_text_run = true,
                b"tbl" => {
                    in_table = true;
                    table_rows.clear();
                }
                b"tr" => row_cells.clear(),
                b"tc" => {
                    in_cell = true;
                    cell_text.clear();
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_text_run => {
                let decoded = e.decode().unwrap_or_default().into_owned();
                if in_cell {
                    cell_text.push_str(&decoded);
                } else {
                    para_text.push_str(&decoded);
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text_run = false,
                b"p" => {
                    if in_paragraph && !in_cell {
                        blocks.push(Block::Paragraph {
                            text: para_text.clone(),
                            style: para_style.clone(),
                        });
                    }
                    in_paragraph = false;
                }
                b"tc" => {
                    row_cells.push(cell_text.trim().to_string());
                    in_cell = false;
                }
                b"tr" => table_rows.push(row_cells.clone()),
                b"tbl" => {
                    blocks.push(Block::Table(table_rows.clone()));
                    in_table = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(docx_error(path, &e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    let _ = in_table;
    Ok(blocks)
}

fn local_name(qualified: &[u8]) -> &[u8] {
    match qualified.iter().position(|&b| b == b':') {
        Some(idx) => &qualified[idx + 1..],
        None => qualified,
    }
}

fn attr_value(tag: &quick_xml::events::BytesStart, local: &[u8]) -> Option<String> {
    tag.attributes().flatten().find_map(|attr| {
        if local_name(attr.key.as_ref()) == local {
            Some(String::from_utf8_lossy(&attr.value).into_owned())
        } else {
            None
        }
    })
}

fn docx_error(path: &Path, detail: &str) -> DslError {
    DslError::runtime(format!("Failed to read DOCX '{}': {detail}", file_name(path)))
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}
