//! `Directory` and `File` runtime objects: thin, reference-counted handles
//! over a resolved path plus a display root, with lazily-materialized and
//! cached chunk/outline data.

pub mod directory;
pub mod file;

use std::path::{Path, PathBuf};

/// Posix-style path of `path` relative to `root`, falling back to the
/// absolute posix rendering if `path` doesn't descend from `root`.
pub(crate) fn relative_posix(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
}

/// Renders `path` relative to `display_root` when possible (posix-style),
/// falling back to the absolute path otherwise — used for `print()` and the
/// textual tree/table renderers.
pub(crate) fn display_relative(path: &Path, display_root: &Path) -> String {
    match path.strip_prefix(display_root) {
        Ok(relative) if !relative.as_os_str().is_empty() => {
            relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
        }
        Ok(_) => ".".to_string(),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

pub(crate) fn sorted(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
    paths
}
