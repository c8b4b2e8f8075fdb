//! CLI implementation for fdsl.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::budget::Budget;
use crate::{execute_fdsl, prepare_index};

#[repr(i32)]
#[allow(dead_code)]
pub enum ExitCode {
    Success = 0,
    ScriptError = 1,
    ScriptNotFound = 2,
}

#[derive(Parser)]
#[command(name = "fdsl")]
#[command(about = "Sandboxed scripting language for exploring a tree of documents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a FilesDSL script
    Run {
        /// Path to the .fdsl script file
        script: PathBuf,

        /// Sandbox root; defaults to the script's parent directory
        #[arg(long)]
        sandbox_root: Option<PathBuf>,

        /// Wall-clock timeout in seconds
        #[arg(long)]
        timeout: Option<f64>,
    },
    /// Build a semantic index in place for a folder
    Prepare {
        /// Folder to index
        folder: PathBuf,

        /// Wall-clock timeout in seconds
        #[arg(long)]
        timeout: Option<f64>,
    },
}

pub fn run_with(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { script, sandbox_root, timeout } => run_script_command(script, sandbox_root, timeout),
        Commands::Prepare { folder, timeout } => prepare_command(folder, timeout),
    }
}

fn run_script_command(script: PathBuf, sandbox_root: Option<PathBuf>, timeout: Option<f64>) -> Result<()> {
    tracing::info!(script = %script.display(), "Running script");
    if !script.is_file() {
        tracing::warn!(script = %script.display(), "Script file not found");
        eprintln!("Script file not found: {}", script.display());
        std::process::exit(ExitCode::ScriptNotFound as i32);
    }
    let source = fs::read_to_string(&script).with_context(|| format!("Failed to read {}", script.display()))?;
    let cwd = script
        .parent()
        .map(|p| p.to_path_buf())
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("."));
    let sandbox_root = sandbox_root.unwrap_or_else(|| cwd.clone());
    let config = crate::config::Config::load(&sandbox_root);
    let timeout = timeout.or(config.timeout_secs).map(Duration::from_secs_f64);

    match execute_fdsl(&source, &cwd, &sandbox_root, timeout) {
        Ok(output) => {
            print!("{output}");
            Ok(())
        }
        Err(err) => {
            tracing::warn!(error = %err, "Script execution failed");
            eprintln!("{}", err.format_pretty());
            std::process::exit(ExitCode::ScriptError as i32);
        }
    }
}

fn prepare_command(folder: PathBuf, timeout: Option<f64>) -> Result<()> {
    tracing::info!(folder = %folder.display(), "Preparing semantic index via CLI");
    let config = crate::config::Config::load(&folder);
    let timeout = timeout.or(config.timeout_secs);
    let budget = Budget::new(timeout.map(Duration::from_secs_f64));
    match prepare_index(&folder, &budget) {
        Ok(stats) => {
            println!("Prepared semantic index for {}", stats.folder.display());
            println!("Database: {}", stats.db_path.display());
            println!("Indexed files: {}", stats.indexed_files);
            println!("Indexed pages: {}", stats.indexed_pages);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.format_pretty());
            std::process::exit(ExitCode::ScriptError as i32);
        }
    }
}
