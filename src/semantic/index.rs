//! On-disk prepared index: `records.json` + `vectors.json` + a marker file
//! under `<folder>/.fdsl_index`, with an in-memory cache shared across
//! invocations, keyed by `(path, mtime, size)` of the marker file.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::budget::Budget;
use crate::config::Config;
use crate::error::DslError;
use crate::extract;
use crate::semantic::embed::{cosine_similarity, embed_text};
use crate::text::normalize_text;

pub const INDEX_DIRNAME: &str = ".fdsl_index";
const MARKER_FILENAME: &str = "index.marker";
const BATCH_SIZE: usize = 64;
/// At least eight distinct prepared indexes may be cached simultaneously.
const CACHE_CAPACITY: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub relative_path: String,
    pub file_name: String,
    pub page: usize,
    pub text: String,
}

#[derive(Debug)]
pub struct PreparedIndex {
    pub records: Vec<Record>,
    pub vectors: Vec<Vec<f32>>,
}

impl PreparedIndex {
    pub fn pages_for_file(&self, relative_path: &str) -> Vec<(usize, String)> {
        let mut pages: Vec<(usize, String)> = self
            .records
            .iter()
            .filter(|r| r.relative_path == relative_path)
            .map(|r| (r.page, r.text.clone()))
            .collect();
        pages.sort_by_key(|(page, _)| *page);
        pages
    }

    pub fn covers_file(&self, relative_path: &str) -> bool {
        self.records.iter().any(|r| r.relative_path == relative_path)
    }

    /// Top-`top_k` 1-based page numbers for `relative_path` ranked by
    /// cosine similarity against `query`, ties broken by lower page first.
    pub fn search(&self, relative_path: &str, query: &str, top_k: usize) -> Vec<usize> {
        let query_vector = embed_text(query);
        let mut scored: Vec<(f32, usize)> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.relative_path == relative_path)
            .filter_map(|(idx, r)| {
                let vector = self.vectors.get(idx)?;
                let score = cosine_similarity(vector, &query_vector)?;
                Some((score, r.page))
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1)));
        scored.into_iter().take(top_k).map(|(_, page)| page).collect()
    }

    /// Relative paths of indexed files under `prefix` (posix style, ""
    /// meaning the index root). `recursive=false` restricts to files whose
    /// immediate parent equals `prefix`.
    pub fn files_under(&self, prefix: &str, recursive: bool) -> Vec<String> {
        let mut seen = std::collections::BTreeSet::new();
        for record in &self.records {
            let rel = &record.relative_path;
            let under_prefix = if prefix.is_empty() {
                true
            } else {
                rel == prefix || rel.starts_with(&format!("{prefix}/"))
            };
            if !under_prefix {
                continue;
            }
            if !recursive {
                let parent = match rel.rsplit_once('/') {
                    Some((p, _)) => p,
                    None => "",
                };
                if parent != prefix {
                    continue;
                }
            }
            seen.insert(rel.clone());
        }
        seen.into_iter().collect()
    }
}

#[derive(Debug, Clone)]
pub struct PrepareStats {
    pub folder: PathBuf,
    pub db_path: PathBuf,
    pub indexed_files: usize,
    pub indexed_pages: usize,
}

pub fn prepare(folder: &Path, budget: &Budget) -> Result<PrepareStats, DslError> {
    tracing::info!(folder = %folder.display(), "Preparing semantic index");
    if !folder.is_dir() {
        return Err(DslError::runtime(format!("Path is not a directory: {}", folder.display())));
    }
    let chunk_lines = Config::load(folder).chunk_lines_or_default();
    let db_path = folder.join(INDEX_DIRNAME);
    fs::create_dir_all(&db_path)
        .map_err(|e| DslError::runtime(format!("Failed to create index folder: {e}")))?;

    let mut paths: Vec<PathBuf> = WalkDir::new(folder)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| !p.starts_with(&db_path))
        .collect();
    paths.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));

    let mut records = Vec::new();
    let mut vectors = Vec::new();
    let mut indexed_files = 0usize;
    let mut indexed_pages = 0usize;

    for path in paths {
        budget.check("semantic:prepare:file")?;
        let relative = relative_posix(&path, folder);
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let chunks = extract::chunks_for_path(&path, budget, chunk_lines)?;
        indexed_files += 1;

        for (offset, chunk) in chunks.iter().enumerate() {
            let page = offset + 1;
            let cleaned = normalize_text(chunk).trim().to_string();
            let embedding_input = if cleaned.is_empty() {
                format!("File: {relative}")
            } else {
                format!("File: {relative}\n{cleaned}")
            };
            records.push(Record {
                relative_path: relative.clone(),
                file_name: file_name.clone(),
                page,
                text: cleaned,
            });
            vectors.push(embed_text(&embedding_input));
            indexed_pages += 1;
            if vectors.len() % BATCH_SIZE == 0 {
                budget.check("semantic:prepare:batch")?;
            }
        }
    }

    let records_json = serde_json::to_vec(&records)
        .map_err(|e| DslError::runtime(format!("Failed to serialize index records: {e}")))?;
    let vectors_json = serde_json::to_vec(&vectors)
        .map_err(|e| DslError::runtime(format!("Failed to serialize index vectors: {e}")))?;
    fs::write(db_path.join("records.json"), records_json)
        .map_err(|e| DslError::runtime(format!("Failed to write index records: {e}")))?;
    fs::write(db_path.join("vectors.json"), vectors_json)
        .map_err(|e| DslError::runtime(format!("Failed to write index vectors: {e}")))?;
    fs::write(db_path.join(MARKER_FILENAME), b"prepared")
        .map_err(|e| DslError::runtime(format!("Failed to write index marker: {e}")))?;

    tracing::info!(indexed_files, indexed_pages, "Semantic index prepared");
    Ok(PrepareStats {
        folder: folder.to_path_buf(),
        db_path,
        indexed_files,
        indexed_pages,
    })
}

fn relative_posix(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
}

type CacheKey = (PathBuf, u128, u64);

pub struct IndexCache {
    entries: RwLock<HashMap<CacheKey, Arc<PreparedIndex>>>,
    order: Mutex<VecDeque<CacheKey>>,
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            order: Mutex::new(VecDeque::new()),
        }
    }

    /// Walks up from `start` looking for a `.fdsl_index` marker, loading
    /// (and caching) the first one found. Returns the index root directory
    /// alongside the loaded index.
    pub fn find_for_path(&self, start: &Path) -> Option<(PathBuf, Arc<PreparedIndex>)> {
        for ancestor in start.ancestors() {
            let marker = ancestor.join(INDEX_DIRNAME).join(MARKER_FILENAME);
            if marker.is_file() {
                if let Ok(index) = self.load(ancestor) {
                    return Some((ancestor.to_path_buf(), index));
                }
            }
        }
        None
    }

    fn load(&self, root: &Path) -> Result<Arc<PreparedIndex>, DslError> {
        let db_path = root.join(INDEX_DIRNAME);
        let marker = db_path.join(MARKER_FILENAME);
        let meta = fs::metadata(&marker).map_err(|e| DslError::runtime(format!("Failed to stat index marker: {e}")))?;
        let mtime_nanos = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let key: CacheKey = (db_path.clone(), mtime_nanos, meta.len());

        if let Some(found) = self.entries.read().unwrap().get(&key) {
            tracing::debug!(root = %root.display(), "Index cache hit");
            self.touch(&key);
            return Ok(found.clone());
        }
        tracing::debug!(root = %root.display(), "Index cache miss, loading from disk");

        let records: Vec<Record> = serde_json::from_str(
            &fs::read_to_string(db_path.join("records.json"))
                .map_err(|e| DslError::runtime(format!("Failed to read index records: {e}")))?,
        )
        .map_err(|e| DslError::runtime(format!("Failed to parse index records: {e}")))?;
        let vectors: Vec<Vec<f32>> = serde_json::from_str(
            &fs::read_to_string(db_path.join("vectors.json"))
                .map_err(|e| DslError::runtime(format!("Failed to read index vectors: {e}")))?,
        )
        .map_err(|e| DslError::runtime(format!("Failed to parse index vectors: {e}")))?;

        let index = Arc::new(PreparedIndex { records, vectors });
        let mut guard = self.entries.write().unwrap();
        guard.insert(key.clone(), index.clone());
        drop(guard);
        self.touch(&key);
        Ok(index)
    }

    fn touch(&self, key: &CacheKey) {
        let mut order = self.order.lock().unwrap();
        order.retain(|k| k != key);
        order.push_back(key.clone());
        while order.len() > CACHE_CAPACITY {
            if let Some(oldest) = order.pop_front() {
                tracing::debug!(root = %oldest.0.display(), "Evicting index cache entry");
                self.entries.write().unwrap().remove(&oldest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn prepare_indexes_a_text_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "alpha beta\n").unwrap();
        let stats = prepare(dir.path(), &Budget::unbounded()).unwrap();
        assert_eq!(stats.indexed_files, 1);
        assert_eq!(stats.indexed_pages, 1);
        assert!(dir.path().join(INDEX_DIRNAME).join("records.json").exists());
    }

    #[test]
    fn cache_finds_nearest_ancestor_index() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("a.txt"), "hello\n").unwrap();
        prepare(dir.path(), &Budget::unbounded()).unwrap();

        let cache = IndexCache::new();
        let found = cache.find_for_path(&sub.join("a.txt"));
        assert!(found.is_some());
    }

    #[test]
    fn search_ranks_by_similarity_with_page_tiebreak() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("doc.txt"), "alpha\nbeta\nalpha beta\n".repeat(30)).unwrap();
        prepare(dir.path(), &Budget::unbounded()).unwrap();
        let cache = IndexCache::new();
        let (_, index) = cache.find_for_path(&dir.path().join("doc.txt")).unwrap();
        let results = index.search("doc.txt", "alpha", 3);
        assert!(!results.is_empty());
    }

    #[test]
    fn files_under_honors_recursive_flag() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("top.txt"), "x\n").unwrap();
        fs::write(dir.path().join("sub/nested.txt"), "y\n").unwrap();
        prepare(dir.path(), &Budget::unbounded()).unwrap();
        let cache = IndexCache::new();
        let (_, index) = cache.find_for_path(dir.path()).unwrap();
        let recursive = index.files_under("", true);
        let non_recursive = index.files_under("", false);
        assert_eq!(recursive.len(), 2);
        assert_eq!(non_recursive.len(), 1);
    }
}
