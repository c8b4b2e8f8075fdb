//! `Directory` object: iteration, search, and tree rendering over a
//! filesystem subtree, consulting the semantic index first when one covers
//! the directory (so results survive the original documents being deleted).

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use regex::RegexBuilder;
use walkdir::WalkDir;

use crate::budget::Budget;
use crate::config::ExtractionSettings;
use crate::error::DslError;
use crate::runtime::file::File;
use crate::runtime::{display_relative, relative_posix, sorted};
use crate::semantic::index::IndexCache;

const DEFAULT_TREE_MAX_DEPTH: usize = 5;
const DEFAULT_TREE_MAX_ENTRIES: usize = 500;

pub struct Directory {
    path: PathBuf,
    display_root: PathBuf,
    recursive: bool,
    settings: ExtractionSettings,
}

impl Directory {
    pub fn new(path: PathBuf, display_root: PathBuf, recursive: bool, settings: ExtractionSettings) -> Self {
        Self { path, display_root, recursive, settings }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn display_path(&self) -> String {
        display_relative(&self.path, &self.display_root)
    }

    /// Enumerates files under this directory, preferring the semantic
    /// index when an ancestor has one (the index was built by walking the
    /// whole subtree, so it covers every descendant regardless of whether
    /// the original documents still exist on disk).
    pub fn enumerate_files(&self, cache: &IndexCache, recursive_override: Option<bool>) -> Result<Vec<Rc<File>>, DslError> {
        let recursive = recursive_override.unwrap_or(self.recursive);

        if let Some((root, index)) = cache.find_for_path(&self.path) {
            tracing::debug!(path = %self.path.display(), "Enumerating via semantic index");
            let prefix = relative_posix(&self.path, &root);
            let mut paths: Vec<PathBuf> = index.files_under(&prefix, recursive).into_iter().map(|rel| root.join(rel)).collect();
            paths = sorted(paths);
            return Ok(paths.into_iter().map(|p| Rc::new(File::new(p, self.display_root.clone(), self.settings))).collect());
        }

        let paths = sorted(self.walk_filesystem(recursive));
        Ok(paths.into_iter().map(|p| Rc::new(File::new(p, self.display_root.clone(), self.settings))).collect())
    }

    fn walk_filesystem(&self, recursive: bool) -> Vec<PathBuf> {
        if recursive {
            WalkDir::new(&self.path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .collect()
        } else {
            fs::read_dir(&self.path)
                .into_iter()
                .flatten()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .collect()
        }
    }

    pub fn len(&self, cache: &IndexCache, recursive_override: Option<bool>) -> Result<usize, DslError> {
        Ok(self.enumerate_files(cache, recursive_override)?.len())
    }

    pub fn search(
        &self,
        cache: &IndexCache,
        budget: &Budget,
        pattern: &str,
        scope: &str,
        in_content: bool,
        recursive_override: Option<bool>,
        ignore_case: bool,
    ) -> Result<Vec<Rc<File>>, DslError> {
        let effective_scope = if in_content { "content" } else { scope };
        if !matches!(effective_scope, "name" | "content" | "both") {
            return Err(DslError::runtime("scope must be one of: 'name', 'content', 'both'"));
        }

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| DslError::runtime(format!("Invalid regex pattern: {e}")))?;

        let files = self.enumerate_files(cache, recursive_override)?;
        let mut matches = Vec::new();
        for file in files {
            budget.check("directory:search")?;
            let relative = relative_posix(file.path(), &self.path);
            let name = file.path().file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            let name_match = regex.is_match(&name) || regex.is_match(&relative);
            let content_match = if matches!(effective_scope, "content" | "both") {
                file.contains(cache, budget, pattern, ignore_case)?
            } else {
                false
            };

            let is_match = match effective_scope {
                "name" => name_match,
                "content" => content_match,
                "both" => name_match || content_match,
                _ => unreachable!(),
            };
            if is_match {
                matches.push(file);
            }
        }
        Ok(matches)
    }

    pub fn tree(&self, max_depth: Option<i64>, max_entries: Option<i64>) -> Result<String, DslError> {
        let max_depth = positive_usize(max_depth, DEFAULT_TREE_MAX_DEPTH, "max_depth")?;
        let max_entries = positive_usize(max_entries, DEFAULT_TREE_MAX_ENTRIES, "max_entries")?;

        let mut lines = vec![format!("{}/", self.display_path())];
        let mut emitted = 0usize;
        let mut truncated = false;
        render_tree(&self.path, 1, max_depth, max_entries, &mut emitted, &mut truncated, &mut lines);
        if truncated {
            lines.push(format!("... truncated after {emitted} entries"));
        }
        Ok(lines.join("\n"))
    }
}

fn render_tree(
    dir: &Path,
    depth: usize,
    max_depth: usize,
    max_entries: usize,
    emitted: &mut usize,
    truncated: &mut bool,
    lines: &mut Vec<String>,
) {
    if depth > max_depth || *truncated {
        return;
    }
    let Ok(read_dir) = fs::read_dir(dir) else { return };
    let mut entries: Vec<(String, PathBuf, bool)> = read_dir
        .filter_map(|e| e.ok())
        .map(|e| {
            let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
            (e.file_name().to_string_lossy().into_owned(), e.path(), is_dir)
        })
        .collect();
    entries.sort_by(|a, b| match (a.2, b.2) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.0.to_lowercase().cmp(&b.0.to_lowercase()),
    });

    for (name, path, is_dir) in entries {
        if *emitted >= max_entries {
            *truncated = true;
            return;
        }
        let indent = "  ".repeat(depth);
        if is_dir {
            lines.push(format!("{indent}{name}/"));
        } else {
            lines.push(format!("{indent}{name}"));
        }
        *emitted += 1;
        if is_dir {
            render_tree(&path, depth + 1, max_depth, max_entries, emitted, truncated, lines);
            if *truncated {
                return;
            }
        }
    }
}

fn positive_usize(value: Option<i64>, default: usize, name: &str) -> Result<usize, DslError> {
    match value {
        None => Ok(default),
        Some(n) if n >= 1 => Ok(n as usize),
        Some(_) => Err(DslError::runtime(format!("{name} must be a positive integer"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::index::IndexCache;
    use std::fs;

    #[test]
    fn enumerate_files_recursive_finds_nested() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        fs::write(dir.path().join("sub/b.txt"), "b\n").unwrap();

        let directory = Directory::new(dir.path().to_path_buf(), dir.path().to_path_buf(), true, ExtractionSettings::default());
        let cache = IndexCache::new();
        let files = directory.enumerate_files(&cache, None).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn non_recursive_excludes_nested() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        fs::write(dir.path().join("sub/b.txt"), "b\n").unwrap();

        let directory = Directory::new(dir.path().to_path_buf(), dir.path().to_path_buf(), false, ExtractionSettings::default());
        let cache = IndexCache::new();
        let files = directory.enumerate_files(&cache, None).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn search_unknown_scope_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        let directory = Directory::new(dir.path().to_path_buf(), dir.path().to_path_buf(), true, ExtractionSettings::default());
        let cache = IndexCache::new();
        let budget = Budget::unbounded();
        let err = directory.search(&cache, &budget, "a", "bogus", false, None, false).unwrap_err();
        assert!(matches!(err, DslError::Runtime { .. }));
    }

    #[test]
    fn tree_lists_directories_before_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("zdir")).unwrap();
        fs::write(dir.path().join("afile.txt"), "x\n").unwrap();
        let directory = Directory::new(dir.path().to_path_buf(), dir.path().to_path_buf(), true, ExtractionSettings::default());
        let tree = directory.tree(None, None).unwrap();
        let zdir_pos = tree.find("zdir/").unwrap();
        let afile_pos = tree.find("afile.txt").unwrap();
        assert!(zdir_pos < afile_pos);
    }
}
