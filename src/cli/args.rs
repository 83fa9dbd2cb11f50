//! Defines the command-line arguments and subcommands for the confscript CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "confscript",
    version,
    about = "Translate scriptable configuration files into an abstract syntax tree."
)]
pub struct ConfscriptArgs {
    /// Log translation internals to stderr (same as RUST_LOG=confscript=debug).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the Abstract Syntax Tree (AST) for a config file.
    Ast {
        /// The path to the config file to parse.
        #[arg(required = true)]
        file: PathBuf,
        /// Keep going past unparsable statements.
        #[arg(long)]
        tolerant: bool,
        /// Print the tree as JSON instead of s-expressions.
        #[arg(long)]
        json: bool,
    },
    /// Translate files and report every diagnostic.
    Check {
        /// Files or directories; directories are searched for *.config and *.conf.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Keep going past unparsable statements.
        #[arg(long)]
        tolerant: bool,
    },
    /// Print config statements as calls to includeConfig, assign and block.
    Lower {
        /// The path to the config file to lower.
        #[arg(required = true)]
        file: PathBuf,
    },
}
