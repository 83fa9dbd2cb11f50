//! Source text to AST.
//!
//! [`translate`] runs the whole front end for one unit: the dual-mode [`driver`] parses
//! the text with the pest grammar, then the [`builder`] walks the parse tree into a
//! [`Module`]. Each call owns its own builder, so independent units can be translated
//! on separate threads and report into one shared [`DiagnosticSink`].

use pest_derive::Parser;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::Module;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::errors::{ConfigError, SourceContext};

pub mod builder;
pub mod driver;
mod expression;
pub mod literal;
pub mod operators;

pub use builder::AstBuilder;
pub use driver::{ParseDriver, PredictionMode};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
pub struct ConfigParser;

/// Construction-time options for the builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Downgrade unparsable statements to placeholders plus diagnostics.
    pub tolerant: bool,
}

impl BuilderOptions {
    pub fn tolerant() -> Self {
        Self { tolerant: true }
    }
}

/// Result of translating one source unit.
#[derive(Debug, Clone)]
pub struct Translation {
    pub module: Module,
    /// Non-fatal diagnostics; only tolerant mode produces any.
    pub diagnostics: Vec<Diagnostic>,
    /// Prediction mode that produced the tree.
    pub mode: PredictionMode,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Translates an anonymous unit.
pub fn translate(source: &str, options: BuilderOptions) -> Result<Translation, ConfigError> {
    translate_named("<input>", source, options)
}

/// Translates a unit whose name is used in error reports.
pub fn translate_named(
    name: &str,
    source: &str,
    options: BuilderOptions,
) -> Result<Translation, ConfigError> {
    let ctx = SourceContext::new(name, source);
    let parsed = ParseDriver::new(source, &ctx, options.tolerant).parse()?;
    debug!(unit = name, mode = ?parsed.mode, "parsed");
    AstBuilder::new(&ctx, source, options).build(parsed)
}

/// Translates a unit and appends every diagnostic it produces to `sink`.
///
/// Diagnostics reach the sink whether or not the translation succeeds.
pub fn translate_into(
    name: &str,
    source: &str,
    options: BuilderOptions,
    sink: &DiagnosticSink,
) -> Result<Translation, ConfigError> {
    match translate_named(name, source, options) {
        Ok(translation) => {
            sink.extend(translation.diagnostics.iter().cloned());
            Ok(translation)
        }
        Err(err) => {
            sink.extend(err.diagnostics().iter().cloned());
            Err(err)
        }
    }
}
