//! Path containment. Every path the DSL touches — `Directory(...)` arguments,
//! files discovered while walking — is resolved to its canonical form and
//! checked against the sandbox root before any I/O happens.

use std::path::{Path, PathBuf};

use crate::error::DslError;

#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// `root` must already exist on disk; it is canonicalized once at
    /// construction so every later containment check is a cheap prefix test.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let canonical = dunce::canonicalize(root.as_ref())?;
        Ok(Self { root: canonical })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `path` (absolute or relative to the sandbox root) and fails
    /// with `DslError::Sandbox` unless the result is the root itself or one
    /// of its descendants. Does not require `path` to exist: canonicalizing
    /// a nonexistent path falls back to lexical joining against the root so
    /// that writes-that-don't-exist-yet and simple not-found cases are still
    /// checked rather than silently allowed through.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, DslError> {
        let requested = path.as_ref();
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        };

        let candidate = match dunce::canonicalize(&joined) {
            Ok(canonical) => canonical,
            Err(_) => lexically_normalize(&joined),
        };

        if self.contains(&candidate) {
            Ok(candidate)
        } else {
            Err(DslError::sandbox(candidate, self.root.clone()))
        }
    }

    fn contains(&self, candidate: &Path) -> bool {
        candidate == self.root || candidate.starts_with(&self.root)
    }
}

/// Lexically collapses `.` and `..` components without touching the
/// filesystem, for paths that don't exist yet (e.g. a typo'd subpath).
fn lexically_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn allows_paths_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        let resolved = sandbox.resolve("sub").unwrap();
        assert!(resolved.starts_with(sandbox.root()));
    }

    #[test]
    fn rejects_escaping_path() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        let err = sandbox.resolve(outside.path()).unwrap_err();
        assert!(matches!(err, DslError::Sandbox { .. }));
    }

    #[test]
    fn rejects_dotdot_escape() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        let err = sandbox.resolve("../outside").unwrap_err();
        assert!(matches!(err, DslError::Sandbox { .. }));
    }

    #[test]
    fn root_itself_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        let resolved = sandbox.resolve(".").unwrap();
        assert_eq!(resolved, sandbox.root());
    }
}
