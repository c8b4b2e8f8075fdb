//! `File` object: a uniform view over a document as an ordered sequence of
//! page strings, with lazily materialized chunks and outline.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use regex::RegexBuilder;

use crate::budget::Budget;
use crate::config::ExtractionSettings;
use crate::error::DslError;
use crate::extract::{self, toc, OutlineEntry};
use crate::runtime::{display_relative, relative_posix};
use crate::semantic::index::IndexCache;
use crate::value::Value;

const DEFAULT_SNIPPET_MAX_RESULTS: usize = 5;
const DEFAULT_SNIPPET_CONTEXT_CHARS: usize = 80;
const DEFAULT_SEMANTIC_TOP_K: usize = 5;

pub struct File {
    path: PathBuf,
    display_root: PathBuf,
    settings: ExtractionSettings,
    chunks: RefCell<Option<Vec<String>>>,
    outline: RefCell<Option<Vec<OutlineEntry>>>,
}

impl File {
    pub fn new(path: PathBuf, display_root: PathBuf, settings: ExtractionSettings) -> Self {
        Self {
            path,
            display_root,
            settings,
            chunks: RefCell::new(None),
            outline: RefCell::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn display_path(&self) -> String {
        display_relative(&self.path, &self.display_root)
    }

    fn ensure_chunks(&self, cache: &IndexCache, budget: &Budget) -> Result<(), DslError> {
        if self.chunks.borrow().is_some() {
            return Ok(());
        }
        if let Some((root, index)) = cache.find_for_path(&self.path) {
            let relative = relative_posix(&self.path, &root);
            if index.covers_file(&relative) {
                tracing::debug!(path = %self.path.display(), "Materializing chunks from semantic index");
                let pages = index.pages_for_file(&relative);
                *self.chunks.borrow_mut() = Some(pages.into_iter().map(|(_, text)| text).collect());
                return Ok(());
            }
        }
        tracing::debug!(path = %self.path.display(), "Extracting chunks from source file");
        let chunks = extract::chunks_for_path(&self.path, budget, self.settings.chunk_lines)?;
        *self.chunks.borrow_mut() = Some(chunks);
        Ok(())
    }

    fn chunks(&self, cache: &IndexCache, budget: &Budget) -> Result<Vec<String>, DslError> {
        self.ensure_chunks(cache, budget)?;
        Ok(self.chunks.borrow().clone().unwrap_or_default())
    }

    fn ensure_outline(&self, cache: &IndexCache, budget: &Budget) -> Result<(), DslError> {
        if self.outline.borrow().is_some() {
            return Ok(());
        }
        let chunks = self.chunks(cache, budget)?;
        let scan_window: Vec<String> = chunks.iter().take(self.settings.toc_scan_limit).cloned().collect();
        let entries = extract::outline_for_path(&self.path, &scan_window, usize::MAX);
        *self.outline.borrow_mut() = Some(entries);
        Ok(())
    }

    pub fn read(&self, cache: &IndexCache, budget: &Budget, pages: Option<Value>) -> Result<Value, DslError> {
        let chunks = self.chunks(cache, budget)?;
        let Some(pages) = pages else {
            return Ok(Value::Str(chunks.join("\n\n")));
        };

        let requested: Vec<i64> = match pages {
            Value::Int(n) => vec![n],
            Value::Seq(items) => items
                .into_iter()
                .map(|v| match v {
                    Value::Int(n) => Ok(n),
                    other => Err(DslError::runtime(format!(
                        "pages list must contain only integers, got {}",
                        other.type_name()
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => {
                return Err(DslError::runtime(format!(
                    "pages must be an integer or a list of integers, got {}",
                    other.type_name()
                )))
            }
        };

        let total = chunks.len() as i64;
        let mut seen = std::collections::HashSet::new();
        let mut selected = Vec::new();
        for page in requested {
            if page < 1 || page > total {
                return Err(DslError::runtime(format!(
                    "Page {page} is out of range for {} (1..{total})",
                    self.name()
                )));
            }
            if seen.insert(page) {
                selected.push(Value::Str(chunks[(page - 1) as usize].clone()));
            }
        }
        Ok(Value::Seq(selected))
    }

    pub fn search(&self, cache: &IndexCache, budget: &Budget, pattern: &str, ignore_case: bool) -> Result<Vec<usize>, DslError> {
        let chunks = self.chunks(cache, budget)?;
        let regex = compile_regex(pattern, ignore_case)?;
        Ok(chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| regex.is_match(chunk))
            .map(|(idx, _)| idx + 1)
            .collect())
    }

    pub fn contains(&self, cache: &IndexCache, budget: &Budget, pattern: &str, ignore_case: bool) -> Result<bool, DslError> {
        Ok(!self.search(cache, budget, pattern, ignore_case)?.is_empty())
    }

    pub fn head(&self, cache: &IndexCache, budget: &Budget) -> Result<String, DslError> {
        let chunks = self.chunks(cache, budget)?;
        Ok(chunks.first().cloned().unwrap_or_default())
    }

    pub fn tail(&self, cache: &IndexCache, budget: &Budget) -> Result<String, DslError> {
        let chunks = self.chunks(cache, budget)?;
        Ok(chunks.last().cloned().unwrap_or_default())
    }

    pub fn table(&self, cache: &IndexCache, budget: &Budget, max_items: Option<i64>) -> Result<String, DslError> {
        let max_items = positive_usize_arg(max_items, self.settings.table_max_items, "max_items")?;
        self.ensure_outline(cache, budget)?;
        let entries = self.outline.borrow().clone().unwrap_or_default();
        let capped: Vec<OutlineEntry> = entries.into_iter().take(max_items).collect();
        if capped.is_empty() {
            return Ok(format!("No table of contents detected for {}", self.display_path()));
        }
        Ok(toc::format_toc_tree(&capped))
    }

    pub fn snippets(
        &self,
        cache: &IndexCache,
        budget: &Budget,
        pattern: &str,
        max_results: Option<i64>,
        context_chars: Option<i64>,
        ignore_case: bool,
    ) -> Result<Vec<String>, DslError> {
        let max_results = positive_usize_arg(max_results, DEFAULT_SNIPPET_MAX_RESULTS, "max_results")?;
        let context_chars = non_negative_usize_arg(context_chars, DEFAULT_SNIPPET_CONTEXT_CHARS, "context_chars")?;
        let regex = compile_regex(pattern, ignore_case)?;
        let chunks = self.chunks(cache, budget)?;

        let mut snippets = Vec::new();
        for (page_index, chunk) in chunks.iter().enumerate() {
            let char_indices: Vec<(usize, char)> = chunk.char_indices().collect();
            for m in regex.find_iter(chunk) {
                let match_start_char = char_indices.iter().position(|&(byte, _)| byte == m.start()).unwrap_or(0);
                let match_end_char = char_indices.iter().position(|&(byte, _)| byte == m.end()).unwrap_or(char_indices.len());
                let start_char = match_start_char.saturating_sub(context_chars);
                let end_char = (match_end_char + context_chars).min(char_indices.len());
                let excerpt: String = char_indices[start_char..end_char]
                    .iter()
                    .map(|&(_, c)| if c == '\n' { ' ' } else { c })
                    .collect();
                snippets.push(format!("[page {}] {}", page_index + 1, excerpt.trim()));
                if snippets.len() >= max_results {
                    return Ok(snippets);
                }
            }
        }
        Ok(snippets)
    }

    pub fn semantic_search(&self, cache: &IndexCache, query: &str, top_k: Option<i64>) -> Result<Vec<usize>, DslError> {
        if query.trim().is_empty() {
            return Err(DslError::runtime("query must be a non-empty string"));
        }
        let top_k = positive_usize_arg(top_k, DEFAULT_SEMANTIC_TOP_K, "top_k")?;
        let Some((root, index)) = cache.find_for_path(&self.path) else {
            return Err(DslError::missing_index(self.display_path()));
        };
        let relative = relative_posix(&self.path, &root);
        Ok(index.search(&relative, query.trim(), top_k))
    }

    fn name(&self) -> String {
        self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| self.display_path())
    }
}

fn compile_regex(pattern: &str, ignore_case: bool) -> Result<regex::Regex, DslError> {
    RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| DslError::runtime(format!("Invalid regex pattern: {e}")))
}

fn positive_usize_arg(value: Option<i64>, default: usize, name: &str) -> Result<usize, DslError> {
    match value {
        None => Ok(default),
        Some(n) if n >= 1 => Ok(n as usize),
        Some(_) => Err(DslError::runtime(format!("{name} must be a positive integer"))),
    }
}

fn non_negative_usize_arg(value: Option<i64>, default: usize, name: &str) -> Result<usize, DslError> {
    match value {
        None => Ok(default),
        Some(n) if n >= 0 => Ok(n as usize),
        Some(_) => Err(DslError::runtime(format!("{name} must be a non-negative integer"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::index::IndexCache;
    use std::fs;

    fn make_file(dir: &std::path::Path, name: &str, content: &str) -> File {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        File::new(path, dir.to_path_buf(), ExtractionSettings::default())
    }

    #[test]
    fn read_joins_pages_with_blank_line() {
        let dir = tempfile::tempdir().unwrap();
        let file = make_file(dir.path(), "a.txt", &"x\n".repeat(100));
        let cache = IndexCache::new();
        let budget = Budget::unbounded();
        let whole = file.read(&cache, &budget, None).unwrap();
        match whole {
            Value::Str(s) => assert!(s.contains("\n\n")),
            _ => panic!("expected string"),
        }
    }

    #[test]
    fn read_out_of_range_page_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = make_file(dir.path(), "a.txt", "alpha\n");
        let cache = IndexCache::new();
        let budget = Budget::unbounded();
        let err = file.read(&cache, &budget, Some(Value::Int(5))).unwrap_err();
        assert!(matches!(err, DslError::Runtime { .. }));
    }

    #[test]
    fn search_and_contains_agree() {
        let dir = tempfile::tempdir().unwrap();
        let file = make_file(dir.path(), "a.txt", "alpha\nbeta\ngamma\n");
        let cache = IndexCache::new();
        let budget = Budget::unbounded();
        let pages = file.search(&cache, &budget, "beta", false).unwrap();
        assert_eq!(pages, vec![1]);
        assert!(file.contains(&cache, &budget, "beta", false).unwrap());
        assert!(!file.contains(&cache, &budget, "zzz", false).unwrap());
    }

    #[test]
    fn table_reports_no_toc_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let file = make_file(dir.path(), "a.txt", "just some prose\n");
        let cache = IndexCache::new();
        let budget = Budget::unbounded();
        let table = file.table(&cache, &budget, None).unwrap();
        assert!(table.starts_with("No table of contents detected for"));
    }

    #[test]
    fn table_finds_dotted_toc_entries() {
        let dir = tempfile::tempdir().unwrap();
        let file = make_file(
            dir.path(),
            "toc.txt",
            "1 Intro ....... 1\n1.1 Scope ..... 2\n2 Methods .... 5\n",
        );
        let cache = IndexCache::new();
        let budget = Budget::unbounded();
        let table = file.table(&cache, &budget, None).unwrap();
        assert!(table.contains("1 Intro (p.1)"));
        assert!(table.contains("  1.1 Scope (p.2)"));
    }

    #[test]
    fn snippets_collapse_newlines_and_trim() {
        let dir = tempfile::tempdir().unwrap();
        let file = make_file(dir.path(), "a.txt", "line one\nneedle here\nline three\n");
        let cache = IndexCache::new();
        let budget = Budget::unbounded();
        let snippets = file.snippets(&cache, &budget, "needle", None, None, false).unwrap();
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].starts_with("[page 1]"));
        assert!(!snippets[0].contains('\n'));
    }
}
