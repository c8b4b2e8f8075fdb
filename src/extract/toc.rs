//! Regex-based table-of-contents recovery for plain text and as the
//! fallback when a format-native outline is absent or empty.

use std::sync::OnceLock;

use regex::Regex;

use crate::extract::OutlineEntry;

const MAX_SCANNED_CHUNKS: usize = 8;

fn numbered_dotted() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)*)\s+(.+?)\.{2,}\s*(\d+)$").unwrap())
}

fn numbered_plain() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)*)\s+(.+?)\s+(\d+)$").unwrap())
}

fn titled_dotted() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?)\.{2,}\s*(\d+)$").unwrap())
}

pub fn scan_text_toc(chunks: &[String], max_items: usize) -> Vec<OutlineEntry> {
    let mut entries = Vec::new();
    let mut seen = std::collections::HashSet::new();

    'chunks: for chunk in chunks.iter().take(MAX_SCANNED_CHUNKS) {
        for raw_line in chunk.lines() {
            let line = raw_line.trim();
            if line.len() < 8 {
                continue;
            }

            let (level, title, page) = if let Some(caps) = numbered_dotted().captures(line).or_else(|| numbered_plain().captures(line)) {
                let section = caps[1].trim().to_string();
                let body = caps[2].trim().to_string();
                let title = format!("{section} {body}").trim().to_string();
                let page: usize = match caps[3].parse() {
                    Ok(p) => p,
                    Err(_) => continue,
                };
                let level = section.matches('.').count() + 1;
                (level, title, Some(page))
            } else if let Some(caps) = titled_dotted().captures(line) {
                let title = caps[1].trim().to_string();
                let page: usize = match caps[2].parse() {
                    Ok(p) => p,
                    Err(_) => continue,
                };
                (1, title, Some(page))
            } else {
                continue;
            };

            if title.is_empty() {
                continue;
            }
            let key = (level, title.clone(), page);
            if !seen.insert(key) {
                continue;
            }
            entries.push(OutlineEntry { level, title, page });
            if entries.len() >= max_items {
                break 'chunks;
            }
        }
    }
    entries
}

/// Renders the entries as an indented tree: 2 spaces per level beyond the
/// first, `title (p.N)` or bare `title` when no page number was found.
pub fn format_toc_tree(entries: &[OutlineEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let indent = "  ".repeat(entry.level.saturating_sub(1));
            match entry.page {
                Some(page) => format!("{indent}{} (p.{page})", entry.title),
                None => format!("{indent}{}", entry.title),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_numbered_dotted_entries() {
        let chunk = "1 Intro ....... 1\n1.1 Scope ..... 2\n2 Methods .... 5\n".to_string();
        let entries = scan_text_toc(&[chunk], 50);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].title, "1 Intro");
        assert_eq!(entries[0].page, Some(1));
        assert_eq!(entries[1].level, 2);
    }

    #[test]
    fn renders_tree_with_indentation() {
        let entries = vec![
            OutlineEntry { level: 1, title: "1 Intro".into(), page: Some(1) },
            OutlineEntry { level: 2, title: "1.1 Scope".into(), page: Some(2) },
        ];
        assert_eq!(format_toc_tree(&entries), "1 Intro (p.1)\n  1.1 Scope (p.2)");
    }

    #[test]
    fn short_lines_are_ignored() {
        let chunk = "hi\n".to_string();
        assert!(scan_text_toc(&[chunk], 50).is_empty());
    }
}
