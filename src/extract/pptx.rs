//! PPTX extraction via `zip` + `quick-xml` over `ppt/slides/slideN.xml` and
//! `ppt/notesSlides/notesSlideN.xml`. Slide order is taken from the numeric
//! suffix of the slide filename, which matches document order for the
//! overwhelming majority of real decks.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::budget::Budget;
use crate::error::DslError;
use crate::extract::OutlineEntry;

pub fn extract_chunks(path: &Path, budget: &Budget, chunk_lines: usize) -> Result<Vec<String>, DslError> {
    let opened = File::open(path).map_err(|e| pptx_error(path, &e.to_string())).and_then(|file| {
        ZipArchive::new(file).map_err(|e| pptx_error(path, &e.to_string()))
    });
    let mut archive = match opened {
        Ok(archive) => archive,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "PPTX archive unreadable, falling back to plain-text chunking");
            return crate::extract::text::extract_chunks(path, budget, chunk_lines);
        }
    };
    let slide_numbers = slide_numbers(&archive);

    let mut chunks = Vec::new();
    for (index, number) in slide_numbers.iter().enumerate() {
        budget.check("extract:pptx")?;
        let slide_path = format!("ppt/slides/slide{number}.xml");
        let shapes = read_shape_texts(&mut archive, &slide_path).unwrap_or_default();

        let mut body = if shapes.is_empty() {
            format!("[Slide {}]", index + 1)
        } else {
            shapes.join("\n")
        };

        let notes_path = format!("ppt/notesSlides/notesSlide{number}.xml");
        if let Some(notes) = read_shape_texts(&mut archive, &notes_path) {
            let notes_text = notes.join("\n");
            if !notes_text.trim().is_empty() {
                body.push_str("\n[Notes]\n");
                body.push_str(&notes_text);
            }
        }
        chunks.push(body);
    }

    if chunks.is_empty() {
        Ok(vec![String::new()])
    } else {
        Ok(chunks)
    }
}

pub fn read_outline(path: &Path, max_items: usize) -> Vec<OutlineEntry> {
    try_read_outline(path, max_items).unwrap_or_default()
}

fn try_read_outline(path: &Path, max_items: usize) -> Option<Vec<OutlineEntry>> {
    let file = File::open(path).ok()?;
    let mut archive = ZipArchive::new(file).ok()?;
    let slide_numbers = slide_numbers(&archive);

    let mut entries = Vec::new();
    for (index, number) in slide_numbers.iter().enumerate() {
        if entries.len() >= max_items {
            break;
        }
        let slide_path = format!("ppt/slides/slide{number}.xml");
        if let Some(title) = read_title(&mut archive, &slide_path) {
            entries.push(OutlineEntry {
                level: 1,
                title,
                page: Some(index + 1),
            });
        }
    }
    Some(entries)
}

fn slide_numbers<R: Read + std::io::Seek>(archive: &ZipArchive<R>) -> Vec<u32> {
    let mut numbers: Vec<u32> = archive
        .file_names()
        .filter_map(|name| {
            let rest = name.strip_prefix("ppt/slides/slide")?;
            let digits = rest.strip_suffix(".xml")?;
            digits.parse().ok()
        })
        .collect();
    numbers.sort_unstable();
    numbers
}

fn read_shape_texts<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, entry_path: &str) -> Option<Vec<String>> {
    let mut xml = String::new();
    archive.by_name(entry_path).ok()?.read_to_string(&mut xml).ok()?;

    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut texts = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if local_name(e.name().as_ref()) == b"t" => in_text = true,
            Ok(Event::Text(e)) if in_text => {
                current.push_str(&e.decode().unwrap_or_default());
            }
            Ok(Event::End(e)) if local_name(e.name().as_ref()) == b"t" => {
                in_text = false;
            }
            Ok(Event::End(e)) if local_name(e.name().as_ref()) == b"p" => {
                if !current.is_empty() {
                    texts.push(std::mem::take(&mut current));
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    if !current.is_empty() {
        texts.push(current);
    }
    Some(texts)
}

fn read_title<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, entry_path: &str) -> Option<String> {
    let mut xml = String::new();
    archive.by_name(entry_path).ok()?.read_to_string(&mut xml).ok()?;

    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut in_title_shape = false;
    let mut shape_depth = 0i32;
    let mut in_text = false;
    let mut title = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"sp" => shape_depth += 1,
                b"ph" => {
                    if shape_depth > 0 {
                        if let Some(kind) = attr_value(&e, b"type") {
                            if kind == "title" || kind == "ctrTitle" {
                                in_title_shape = true;
                            }
                        }
                    }
                }
                b"t" if in_title_shape => in_text = true,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                title.push_str(&e.decode().unwrap_or_default());
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"sp" => {
                    shape_depth -= 1;
                    if shape_depth == 0 && in_title_shape && !title.trim().is_empty() {
                        return Some(title.trim().to_string());
                    }
                    in_title_shape = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    None
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

fn pptx_error(path: &Path, detail: &str) -> DslError {
    DslError::runtime(format!("Failed to read PPTX '{}': {detail}", file_name(path)))
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}
