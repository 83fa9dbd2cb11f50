//! Confscript error handling
//!
//! # Overview
//!
//! Every failure of a translation is a [`ConfigError`]. Each variant carries the
//! positioned [`Diagnostic`]s that describe it (always at least one) and an
//! [`ErrorContext`] used to render a `miette` report against the named source.
//!
//! # Construction
//!
//! - Build errors through a [`SourceContext`]: `ctx.structural("message", span)`.
//!   The context supplies the named source and the line index in one place.
//! - Syntax errors gather several diagnostics; use [`SourceContext::syntax`] with the
//!   full list. The first entry becomes the primary label, the rest related labels.

use std::sync::Arc;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::diagnostics::{Diagnostic, LineIndex};
use crate::Span;

// Type aliases for clarity and brevity
pub type SourceArc = Arc<NamedSource<String>>;

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// A named source unit with its precomputed line table.
#[derive(Debug, Clone)]
pub struct SourceContext {
    name: String,
    source: SourceArc,
    index: Arc<LineIndex>,
}

impl SourceContext {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        let content = content.into();
        let index = Arc::new(LineIndex::new(&content));
        Self {
            source: Arc::new(NamedSource::new(name.clone(), content)),
            name,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn named_source(&self) -> SourceArc {
        Arc::clone(&self.source)
    }

    pub fn diagnostic(&self, message: impl Into<String>, span: Span) -> Diagnostic {
        Diagnostic::new(message, span, &self.index)
    }

    pub fn lexical(&self, message: impl Into<String>, span: Span) -> ConfigError {
        let (message, diagnostics, ctx) = self.single(message, span);
        ConfigError::Lexical {
            message,
            diagnostics,
            ctx,
        }
    }

    pub fn structural(&self, message: impl Into<String>, span: Span) -> ConfigError {
        let (message, diagnostics, ctx) = self.single(message, span);
        ConfigError::Structural {
            message,
            diagnostics,
            ctx,
        }
    }

    pub fn incomplete(&self, message: impl Into<String>, span: Span) -> ConfigError {
        let (message, diagnostics, mut ctx) = self.single(message, span);
        ctx.help = Some("complete the statement, or translate in tolerant mode".to_string());
        ConfigError::Incomplete {
            message,
            diagnostics,
            ctx,
        }
    }

    pub fn numeric(&self, message: impl Into<String>, span: Span) -> ConfigError {
        let (message, diagnostics, ctx) = self.single(message, span);
        ConfigError::NumericDecode {
            message,
            diagnostics,
            ctx,
        }
    }

    /// Wraps parser diagnostics. An empty list yields one generic diagnostic at the start.
    pub fn syntax(&self, mut diagnostics: Vec<Diagnostic>) -> ConfigError {
        if diagnostics.is_empty() {
            diagnostics.push(self.diagnostic("Syntax error", Span::default()));
        }
        let primary = &diagnostics[0];
        let related = diagnostics[1..]
            .iter()
            .map(|diagnostic| RelatedLabel {
                source: self.named_source(),
                span: diagnostic.span,
                label: diagnostic.message.clone(),
            })
            .collect();
        let ctx = ErrorContext {
            source: Some(self.named_source()),
            span: Some(primary.span),
            help: None,
            related,
        };
        ConfigError::Syntax {
            message: primary.message.clone(),
            diagnostics,
            ctx,
        }
    }

    fn single(
        &self,
        message: impl Into<String>,
        span: Span,
    ) -> (String, Vec<Diagnostic>, ErrorContext) {
        let message = message.into();
        let diagnostic = self.diagnostic(message.clone(), span);
        let ctx = ErrorContext::with_source_and_span(self.named_source(), span);
        (message, vec![diagnostic], ctx)
    }
}

// ============================================================================
// ERROR CONTEXT
// ============================================================================

/// A single additional label for multi-span diagnostics.
#[derive(Debug, Clone)]
pub struct RelatedLabel {
    pub source: SourceArc,
    pub span: Span,
    pub label: String,
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The primary source for this error (if any).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
    /// Additional labeled spans for multi-label diagnostics.
    pub related: Vec<RelatedLabel>,
}

impl ErrorContext {
    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
            related: vec![],
        }
    }
}

// ============================================================================
// CONFIG ERROR
// ============================================================================

/// Unified failure of one translation unit.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Malformed token stream; never retried.
    #[error("Lexical error: {message}")]
    Lexical {
        message: String,
        diagnostics: Vec<Diagnostic>,
        ctx: ErrorContext,
    },
    /// One or more statements the grammar rejects.
    #[error("Syntax error: {message}")]
    Syntax {
        message: String,
        diagnostics: Vec<Diagnostic>,
        ctx: ErrorContext,
    },
    /// Grammar-accepted text that breaks a static rule.
    #[error("Invalid construct: {message}")]
    Structural {
        message: String,
        diagnostics: Vec<Diagnostic>,
        ctx: ErrorContext,
    },
    #[error("Incomplete statement: {message}")]
    Incomplete {
        message: String,
        diagnostics: Vec<Diagnostic>,
        ctx: ErrorContext,
    },
    #[error("Invalid number: {message}")]
    NumericDecode {
        message: String,
        diagnostics: Vec<Diagnostic>,
        ctx: ErrorContext,
    },
}

/// Coarse classification, handy for tests and CLI summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    Lexical,
    Syntax,
    Structural,
    Incomplete,
    NumericDecode,
}

impl ConfigError {
    fn parts(&self) -> (&str, &[Diagnostic], &ErrorContext) {
        match self {
            ConfigError::Lexical {
                message,
                diagnostics,
                ctx,
            }
            | ConfigError::Syntax {
                message,
                diagnostics,
                ctx,
            }
            | ConfigError::Structural {
                message,
                diagnostics,
                ctx,
            }
            | ConfigError::Incomplete {
                message,
                diagnostics,
                ctx,
            }
            | ConfigError::NumericDecode {
                message,
                diagnostics,
                ctx,
            } => (message.as_str(), diagnostics.as_slice(), ctx),
        }
    }

    pub fn message(&self) -> &str {
        self.parts().0
    }

    /// The positioned messages describing this failure; never empty.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.parts().1
    }

    pub fn context(&self) -> &ErrorContext {
        self.parts().2
    }

    /// Appends diagnostics gathered before this error was raised.
    pub fn with_diagnostics(mut self, earlier: impl IntoIterator<Item = Diagnostic>) -> Self {
        match &mut self {
            ConfigError::Lexical {
                diagnostics, ctx, ..
            }
            | ConfigError::Syntax {
                diagnostics, ctx, ..
            }
            | ConfigError::Structural {
                diagnostics, ctx, ..
            }
            | ConfigError::Incomplete {
                diagnostics, ctx, ..
            }
            | ConfigError::NumericDecode {
                diagnostics, ctx, ..
            } => {
                for diagnostic in earlier {
                    if let Some(source) = &ctx.source {
                        ctx.related.push(RelatedLabel {
                            source: Arc::clone(source),
                            span: diagnostic.span,
                            label: diagnostic.message.clone(),
                        });
                    }
                    diagnostics.push(diagnostic);
                }
            }
        }
        self
    }

    pub fn error_type(&self) -> ErrorType {
        match self {
            ConfigError::Lexical { .. } => ErrorType::Lexical,
            ConfigError::Syntax { .. } => ErrorType::Syntax,
            ConfigError::Structural { .. } => ErrorType::Structural,
            ConfigError::Incomplete { .. } => ErrorType::Incomplete,
            ConfigError::NumericDecode { .. } => ErrorType::NumericDecode,
        }
    }

    /// Whether the driver may retry the whole unit with exhaustive prediction.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConfigError::Syntax { .. })
    }
}

impl MietteDiagnostic for ConfigError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match self.error_type() {
            ErrorType::Lexical => "confscript::lexical",
            ErrorType::Syntax => "confscript::syntax",
            ErrorType::Structural => "confscript::structure",
            ErrorType::Incomplete => "confscript::incomplete",
            ErrorType::NumericDecode => "confscript::number",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.context()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.context()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.context();
        let mut labels = Vec::new();
        if let Some(span) = ctx.span {
            labels.push(LabeledSpan::new(
                Some(self.message().to_string()),
                span.start,
                span.len(),
            ));
        }
        for rel in &ctx.related {
            labels.push(LabeledSpan::new(
                Some(rel.label.clone()),
                rel.span.start,
                rel.span.len(),
            ));
        }
        if labels.is_empty() {
            None
        } else {
            Some(Box::new(labels.into_iter()))
        }
    }
}

#[cfg(test)]
mod tests {
    use miette::Report;

    use super::*;

    #[test]
    fn structural_error_carries_one_positioned_diagnostic() {
        let src = SourceContext::new("main.config", "a = 1\nb(x, x) = 2");
        let err = src.structural("Duplicate parameter 'x'", Span::new(10, 11));
        assert_eq!(err.error_type(), ErrorType::Structural);
        let diagnostics = err.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].start_line, 2);
        assert_eq!(diagnostics[0].start_col, 4);
    }

    #[test]
    fn syntax_error_labels_every_diagnostic() {
        let src = SourceContext::new("main.config", "a = \nb = \n");
        let err = src.syntax(vec![
            src.diagnostic("first problem", Span::new(3, 4)),
            src.diagnostic("second problem", Span::new(8, 9)),
        ]);
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("first problem"));
        assert!(output.contains("second problem"));
    }

    #[test]
    fn earlier_diagnostics_follow_the_primary_one() {
        let src = SourceContext::new("main.config", "a = )\nb = 0x");
        let err = src
            .numeric("Number '0x' has no digits", Span::new(10, 12))
            .with_diagnostics(vec![src.diagnostic("Unexpected ')'", Span::new(4, 5))]);
        let lines: Vec<usize> = err.diagnostics().iter().map(|d| d.start_line).collect();
        assert_eq!(lines, vec![2, 1]);
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("Unexpected ')'"), "{output}");
    }

    #[test]
    fn empty_syntax_error_still_has_a_diagnostic() {
        let src = SourceContext::new("main.config", "");
        let err = src.syntax(vec![]);
        assert_eq!(err.diagnostics().len(), 1);
        assert!(err.is_retryable());
    }

    #[test]
    fn incomplete_error_offers_help() {
        let src = SourceContext::new("main.config", "process.");
        let err = src.incomplete("Incomplete statement", Span::new(0, 8));
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("tolerant mode"));
    }
}
