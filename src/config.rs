//! Configuration file support for fdsl.
//!
//! Config files are loaded in order (later overrides earlier):
//! 1. `~/.config/fdsl/config.toml` (user defaults)
//! 2. `.fdsl.toml` in the sandbox root (project overrides)
//!
//! CLI flags override all config file values. Every field has a built-in
//! default, so a config file is never required.

use serde::Deserialize;
use std::path::Path;

/// Configuration options loaded from config files.
///
/// # Example
///
/// ```toml
/// # ~/.config/fdsl/config.toml or .fdsl.toml
/// timeout_secs = 30.0     # Default script execution budget
/// chunk_lines = 80        # Plain-text page size
/// toc_scan_limit = 8      # Pages scanned for a fallback table of contents
/// table_max_items = 50    # Default File.table() cap
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default execution budget in seconds; `None` means unbounded.
    pub timeout_secs: Option<f64>,
    /// Plain-text chunk size, in lines (overridden by no per-call argument;
    /// the DSL itself exposes no knob for this).
    pub chunk_lines: Option<usize>,
    /// Number of leading pages scanned for a fallback table of contents.
    pub toc_scan_limit: Option<usize>,
    /// Default `File.table(max_items)` cap when the script omits one.
    pub table_max_items: Option<usize>,
}

impl Config {
    pub const DEFAULT_CHUNK_LINES: usize = 80;
    pub const DEFAULT_TOC_SCAN_LIMIT: usize = 8;
    pub const DEFAULT_TABLE_MAX_ITEMS: usize = 50;

    /// Load configuration from user and project config files.
    pub fn load(sandbox_root: &Path) -> Self {
        let user_config = dirs::config_dir()
            .map(|d| d.join("fdsl/config.toml"))
            .and_then(|p| Self::load_file(&p))
            .unwrap_or_default();

        let project_config = Self::load_file(&sandbox_root.join(".fdsl.toml")).unwrap_or_default();

        let merged = user_config.override_with(project_config);
        tracing::debug!(
            timeout_secs = ?merged.timeout_secs,
            chunk_lines = ?merged.chunk_lines,
            toc_scan_limit = ?merged.toc_scan_limit,
            table_max_items = ?merged.table_max_items,
            "Effective config after merge"
        );
        merged
    }

    /// Load configuration from a specific file.
    fn load_file(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read config {}: {}", path.display(), e);
                return None;
            }
        };

        match toml::from_str::<Self>(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "Loaded config");
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Layer another config on top (`other` overrides `self` where present).
    fn override_with(self, other: Self) -> Self {
        Config {
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            chunk_lines: other.chunk_lines.or(self.chunk_lines),
            toc_scan_limit: other.toc_scan_limit.or(self.toc_scan_limit),
            table_max_items: other.table_max_items.or(self.table_max_items),
        }
    }

    pub fn chunk_lines_or_default(&self) -> usize {
        self.chunk_lines.unwrap_or(Self::DEFAULT_CHUNK_LINES)
    }

    pub fn toc_scan_limit_or_default(&self) -> usize {
        self.toc_scan_limit.unwrap_or(Self::DEFAULT_TOC_SCAN_LIMIT)
    }

    pub fn table_max_items_or_default(&self) -> usize {
        self.table_max_items.unwrap_or(Self::DEFAULT_TABLE_MAX_ITEMS)
    }

    /// Collapses the three extraction-related fields into the plain value
    /// type that `Directory`/`File` carry, so those modules don't need to
    /// know about config files or TOML at all.
    pub fn extraction_settings(&self) -> ExtractionSettings {
        ExtractionSettings {
            chunk_lines: self.chunk_lines_or_default(),
            toc_scan_limit: self.toc_scan_limit_or_default(),
            table_max_items: self.table_max_items_or_default(),
        }
    }
}

/// Per-project extraction knobs, resolved from [`Config`] once and then
/// carried by value into `Directory`/`File` and the extraction dispatch.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionSettings {
    pub chunk_lines: usize,
    pub toc_scan_limit: usize,
    pub table_max_items: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Config::default().extraction_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_valid_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(".fdsl.toml");
        std::fs::write(&config_path, "timeout_secs = 10.0\nchunk_lines = 40\n").unwrap();

        let config = Config::load_file(&config_path).unwrap();
        assert_eq!(config.timeout_secs, Some(10.0));
        assert_eq!(config.chunk_lines, Some(40));
    }

    #[test]
    fn load_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_file(&dir.path().join("nonexistent.toml"));
        assert!(config.is_none());
    }

    #[test]
    fn load_malformed_toml_returns_none() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(".fdsl.toml");
        std::fs::write(&config_path, "not valid [[[").unwrap();

        let config = Config::load_file(&config_path);
        assert!(config.is_none());
    }

    #[test]
    fn override_with_prefers_other_when_present() {
        let base = Config {
            timeout_secs: Some(10.0),
            chunk_lines: Some(40),
            ..Default::default()
        };
        let project = Config {
            chunk_lines: Some(120),
            table_max_items: Some(20),
            ..Default::default()
        };

        let merged = base.override_with(project);
        assert_eq!(merged.timeout_secs, Some(10.0));
        assert_eq!(merged.chunk_lines, Some(120));
        assert_eq!(merged.table_max_items, Some(20));
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::default();
        assert_eq!(config.chunk_lines_or_default(), 80);
        assert_eq!(config.toc_scan_limit_or_default(), 8);
        assert_eq!(config.table_max_items_or_default(), 50);
    }
}
