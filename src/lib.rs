//! # filesdsl
//!
//! A small, sandboxed scripting language for exploring a tree of documents
//! (text, PDF, DOCX, PPTX) by name, content, regular expression, table of
//! contents structure, and semantic similarity over a prebuilt page-level
//! vector index.
//!
//! Two entry points embed the interpreter:
//!
//! - [`run_script`] parses and evaluates a script, returning the final
//!   variable environment.
//! - [`execute_fdsl`] additionally captures everything the script printed
//!   and returns it as a string.

pub mod ast;
pub mod budget;
pub mod cli;
pub mod config;
pub mod error;
pub mod eval;
pub mod extract;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod sandbox;
pub mod semantic;
pub mod text;
pub mod value;

use std::path::Path;
use std::time::Duration;

pub use budget::Budget;
pub use error::{DslError, DslResult, SourceLocation};
pub use eval::Environment;
pub use semantic::index::{IndexCache, PrepareStats};
pub use value::Value;

/// Parses and evaluates `source`, writing anything the script `print()`s to
/// `stdout`, and returns the final variable environment. `cwd` is both the
/// directory relative paths resolve against and the display root for
/// printed `Directory`/`File` paths; `sandbox_root` confines every path the
/// script touches.
pub fn run_script(
    source: &str,
    cwd: &Path,
    sandbox_root: &Path,
    stdout: &mut dyn std::io::Write,
) -> Result<Environment, DslError> {
    let program = parser::Parser::parse(source)?;
    let sandbox = sandbox::Sandbox::new(sandbox_root)
        .map_err(|e| DslError::runtime(format!("Failed to resolve sandbox root: {e}")))?;
    let budget = Budget::unbounded();
    let cache = IndexCache::new();
    let settings = config::Config::load(sandbox_root).extraction_settings();
    let mut evaluator = eval::Evaluator::new(&sandbox, &budget, &cache, cwd.to_path_buf(), settings, stdout);
    evaluator.run(&program)?;
    Ok(evaluator.into_environment())
}

/// Parses and evaluates `code` with a fresh, private stdout sink, optionally
/// bounded by `timeout`, and returns everything the script printed. Two
/// concurrent calls never share a sink, so their output cannot interleave.
pub fn execute_fdsl(code: &str, cwd: &Path, sandbox_root: &Path, timeout: Option<Duration>) -> Result<String, DslError> {
    let program = parser::Parser::parse(code)?;
    let sandbox = sandbox::Sandbox::new(sandbox_root)
        .map_err(|e| DslError::runtime(format!("Failed to resolve sandbox root: {e}")))?;
    let budget = Budget::new(timeout);
    let cache = IndexCache::new();
    let settings = config::Config::load(sandbox_root).extraction_settings();
    let mut stdout = Vec::new();
    let mut evaluator = eval::Evaluator::new(&sandbox, &budget, &cache, cwd.to_path_buf(), settings, &mut stdout);
    let result = evaluator.run(&program);
    let captured = String::from_utf8_lossy(&stdout).into_owned();
    match result {
        Ok(()) => Ok(captured),
        Err(DslError::Timeout { elapsed_s, phase, .. }) => Err(DslError::Timeout {
            elapsed_s,
            phase,
            partial_output: Some(captured),
        }),
        Err(other) => Err(other),
    }
}

/// Builds a semantic index in place for `folder`. Thin wrapper around
/// [`semantic::index::prepare`] for the CLI `prepare` subcommand.
pub fn prepare_index(folder: &Path, budget: &Budget) -> Result<PrepareStats, DslError> {
    semantic::index::prepare(folder, budget)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_script_returns_final_environment() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = Vec::new();
        let env = run_script("x = 1 + 2\n", dir.path(), dir.path(), &mut sink).unwrap();
        match env.get("x") {
            Some(Value::Int(3)) => {}
            other => panic!("expected Int(3), got {other:?}"),
        }
    }

    #[test]
    fn execute_fdsl_captures_printed_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = execute_fdsl("print(1)\nprint(2)\n", dir.path(), dir.path(), None).unwrap();
        assert_eq!(output, "1\n2\n");
    }

    #[test]
    fn execute_fdsl_keeps_partial_output_on_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let source = "print(\"before\")\nfor i in [1:1000000000]:\n    x = i\n";
        let err = execute_fdsl(source, dir.path(), dir.path(), Some(Duration::from_millis(1))).unwrap_err();
        match err {
            DslError::Timeout { partial_output: Some(output), .. } => assert!(output.contains("before")),
            other => panic!("expected Timeout with partial output, got {other:?}"),
        }
    }
}
