//! Front end for a scriptable configuration language.
//!
//! Configuration files mix declarative `key = value` assignments, nested blocks and
//! selector blocks with a full expression language. [`translate`] turns source text
//! into an AST [`Module`](ast::Module); [`Module::lower`](ast::Module::lower) rewrites
//! every config statement into calls against the `includeConfig`, `assign` and `block`
//! protocol verbs.

pub use crate::ast::Span;
pub use crate::diagnostics::{Diagnostic, DiagnosticSink, LineIndex, Location};
pub use crate::errors::{ConfigError, ErrorType, SourceContext};
pub use crate::syntax::{
    translate, translate_into, translate_named, BuilderOptions, PredictionMode, Translation,
};

pub mod ast;
pub mod cli;
pub mod diagnostics;
pub mod errors;
pub mod syntax;
