//! Error taxonomy for the FilesDSL interpreter.
//!
//! Every user-visible failure is one of the five kinds below, each carrying
//! enough context to be rendered without re-reading the source.

use std::path::PathBuf;

use thiserror::Error;

/// `(line >= 1, column >= 1)` into the original source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Error)]
pub enum DslError {
    #[error("{message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
        source_line: String,
    },

    #[error("{message}")]
    Runtime {
        message: String,
        loc: Option<SourceLocation>,
        source_line: Option<String>,
    },

    #[error("Access denied. '{path}' is outside sandbox root '{root}'")]
    Sandbox { path: String, root: String },

    #[error("Timed out after {elapsed_s:.3}s in {phase}")]
    Timeout {
        elapsed_s: f64,
        phase: String,
        partial_output: Option<String>,
    },

    #[error("No semantic index found for {path}. Run `fdsl prepare <folder>` first.")]
    MissingIndex { path: String },
}

impl DslError {
    pub fn syntax(message: impl Into<String>, line: usize, column: usize, source_line: impl Into<String>) -> Self {
        DslError::Syntax {
            message: message.into(),
            line,
            column,
            source_line: source_line.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        DslError::Runtime {
            message: message.into(),
            loc: None,
            source_line: None,
        }
    }

    pub fn runtime_at(message: impl Into<String>, loc: SourceLocation, source_line: impl Into<String>) -> Self {
        DslError::Runtime {
            message: message.into(),
            loc: Some(loc),
            source_line: Some(source_line.into()),
        }
    }

    pub fn sandbox(path: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        DslError::Sandbox {
            path: path.into().to_string_lossy().into_owned(),
            root: root.into().to_string_lossy().into_owned(),
        }
    }

    pub fn missing_index(path: impl Into<PathBuf>) -> Self {
        DslError::MissingIndex {
            path: path.into().to_string_lossy().into_owned(),
        }
    }

    /// Render the `message\n  at line L, column C\n    <source>\n    ^` form
    /// used for `Syntax` and located `Runtime` errors; falls back to the bare
    /// message for everything else.
    pub fn format_pretty(&self) -> String {
        match self {
            DslError::Syntax {
                message,
                line,
                column,
                source_line,
            } => format_located("SyntaxError", message, *line, *column, source_line),
            DslError::Runtime {
                message,
                loc: Some(loc),
                source_line: Some(source_line),
            } => format_located("RuntimeError", message, loc.line, loc.column, source_line),
            DslError::Runtime { message, .. } => format!("RuntimeError: {message}"),
            other => other.to_string(),
        }
    }
}

fn format_located(kind: &str, message: &str, line: usize, column: usize, source_line: &str) -> String {
    let pointer_len = column.saturating_sub(1);
    let pointer = format!("{}^", " ".repeat(pointer_len));
    format!("{kind}: {message}\n  at line {line}, column {column}\n    {source_line}\n    {pointer}")
}

pub type DslResult<T> = Result<T, DslError>;
