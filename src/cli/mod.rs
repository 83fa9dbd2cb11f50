//! The confscript Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::Parser;
use miette::{IntoDiagnostic, Report, Result, WrapErr};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use crate::cli::args::{Command, ConfscriptArgs};
use crate::cli::output::{print_diagnostics, print_summary, CheckSummary};
use crate::syntax::{translate_into, translate_named, BuilderOptions};
use crate::DiagnosticSink;

pub mod args;
pub mod output;

const CONFIG_EXTENSIONS: [&str; 2] = ["config", "conf"];

/// The main entry point for the CLI.
pub fn run() {
    let args = ConfscriptArgs::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Command::Ast {
            file,
            tolerant,
            json,
        } => handle_ast(&file, BuilderOptions { tolerant }, json),
        Command::Check { paths, tolerant } => handle_check(&paths, BuilderOptions { tolerant }),
        Command::Lower { file } => handle_lower(&file),
    };

    if let Err(report) = result {
        eprintln!("{report:?}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "confscript=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second initialisation only happens when embedded; keep the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

/// Handles the `ast` subcommand.
fn handle_ast(path: &Path, options: BuilderOptions, json: bool) -> Result<()> {
    let (name, source) = read_source(path)?;
    let translation = translate_named(&name, &source, options)?;

    if json {
        let rendered = serde_json::to_string_pretty(&translation.module)
            .into_diagnostic()
            .wrap_err("failed to serialise the AST")?;
        println!("{rendered}");
    } else {
        println!("{}", translation.module.pretty());
    }
    print_diagnostics(&name, &translation.diagnostics);
    Ok(())
}

/// Handles the `lower` subcommand.
fn handle_lower(path: &Path) -> Result<()> {
    let (name, source) = read_source(path)?;
    let translation = translate_named(&name, &source, BuilderOptions::default())?;
    println!("{}", translation.module.lower().pretty());
    Ok(())
}

/// Handles the `check` subcommand.
fn handle_check(paths: &[PathBuf], options: BuilderOptions) -> Result<()> {
    let files = collect_files(paths)?;
    let sink = DiagnosticSink::new();
    let mut summary = CheckSummary::default();

    for file in &files {
        let (name, source) = read_source(file)?;
        match translate_into(&name, &source, options, &sink) {
            Ok(translation) => {
                print_diagnostics(&name, &translation.diagnostics);
                summary.record_success(translation.diagnostics.len());
            }
            Err(err) => {
                eprintln!("{:?}", Report::new(err));
                summary.record_failure();
            }
        }
    }

    debug!(files = files.len(), diagnostics = sink.len(), "check finished");
    print_summary(&summary, sink.len());
    if summary.failed > 0 {
        return Err(miette::miette!("{} of {} files failed", summary.failed, summary.files));
    }
    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

fn read_source(path: &Path) -> Result<(String, String)> {
    let source = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    Ok((path.display().to_string(), source))
}

/// Expands directories into the config files they contain, in a stable order.
fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.into_diagnostic()?;
            let is_config = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| CONFIG_EXTENSIONS.contains(&ext));
            if entry.file_type().is_file() && is_config {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}
