//! Positioned diagnostics and the shared sink they are collected into.
//!
//! Every syntax-level failure, whether raised by the parser, the lexical scan or the tree
//! walker, is normalised into a [`Diagnostic`]: a message plus a start/end position with
//! 1-based lines and 0-based columns. Diagnostics for a translation unit are appended to a
//! [`DiagnosticSink`], which may be shared by several units translated concurrently.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::ast::Span;

// ============================================================================
// POSITIONS
// ============================================================================

/// Line/column range of a span. Lines are 1-based, columns 0-based.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

/// Byte offsets of line starts, used to turn spans into [`Location`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => line_starts.push(i + 1),
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => line_starts.push(i + 1),
                _ => {}
            }
            i += 1;
        }
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Returns the (1-based line, 0-based column) of a byte offset. Columns count bytes.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.line_starts[line])
    }

    pub fn location(&self, span: Span) -> Location {
        let (start_line, start_col) = self.line_col(span.start);
        let (end_line, end_col) = self.line_col(span.end);
        Location {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

// ============================================================================
// DIAGNOSTIC
// ============================================================================

/// A single positioned message produced while translating a source unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    /// Byte span of the offending text; not part of the wire shape.
    #[serde(skip)]
    pub span: Span,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, span: Span, index: &LineIndex) -> Self {
        Self::at(message, span, index.location(span))
    }

    pub fn at(message: impl Into<String>, span: Span, location: Location) -> Self {
        Self {
            message: message.into(),
            start_line: location.start_line,
            start_col: location.start_col,
            end_line: location.end_line,
            end_col: location.end_col,
            span,
        }
    }

    pub fn location(&self) -> Location {
        Location {
            start_line: self.start_line,
            start_col: self.start_col,
            end_line: self.end_line,
            end_col: self.end_col,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ line {}, column {}",
            self.message,
            self.start_line,
            self.start_col + 1
        )
    }
}

// ============================================================================
// SINK
// ============================================================================

/// Append-only diagnostic collector. Cloning yields another handle to the same sink.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    inner: Arc<Mutex<Vec<Diagnostic>>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries().push(diagnostic);
    }

    pub fn extend(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.entries().extend(diagnostics);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Copies out everything collected so far.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries().clone()
    }

    // A panic while holding the lock cannot leave a half-appended entry, so poisoning is ignored.
    fn entries(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
