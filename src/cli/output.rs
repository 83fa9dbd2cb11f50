//! Handles all user-facing output for the CLI.
//!
//! Non-fatal diagnostics and the `check` summary go to stderr, coloured when the
//! terminal supports it. Fatal errors are rendered by miette in `cli::run`.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::Diagnostic;

// ============================================================================
// CHECK SUMMARY
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckSummary {
    pub files: usize,
    pub failed: usize,
    /// Diagnostics attached to files that still translated (tolerant mode).
    pub warnings: usize,
}

impl CheckSummary {
    pub fn record_success(&mut self, diagnostics: usize) {
        self.files += 1;
        self.warnings += diagnostics;
    }

    pub fn record_failure(&mut self) {
        self.files += 1;
        self.failed += 1;
    }

    pub fn headline(&self) -> String {
        let passed = self.files - self.failed;
        format!("{} files checked: {} ok, {} failed", self.files, passed, self.failed)
    }
}

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Prints tolerant-mode diagnostics as `name:line:col: message` lines.
pub fn print_diagnostics(name: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    for diagnostic in diagnostics {
        if write_diagnostic(&mut stderr, name, diagnostic).is_err() {
            eprintln!("{}: {}", name, diagnostic);
        }
    }
    let _ = stderr.reset();
}

/// Prints the coloured `check` summary line.
pub fn print_summary(summary: &CheckSummary, diagnostics: usize) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let color = if summary.failed > 0 {
        Color::Red
    } else if summary.warnings > 0 {
        Color::Yellow
    } else {
        Color::Green
    };
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = write!(stderr, "{}", summary.headline());
    let _ = stderr.reset();
    let _ = writeln!(stderr, " ({diagnostics} diagnostics)");
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn write_diagnostic(
    writer: &mut impl WriteColor,
    name: &str,
    diagnostic: &Diagnostic,
) -> std::io::Result<()> {
    write!(
        writer,
        "{}:{}:{}: ",
        name,
        diagnostic.start_line,
        diagnostic.start_col + 1
    )?;
    writer.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
    write!(writer, "warning")?;
    writer.reset()?;
    writeln!(writer, ": {}", diagnostic.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LineIndex, Span};
    use termcolor::NoColor;

    #[test]
    fn summary_counts_failures() {
        let mut summary = CheckSummary::default();
        summary.record_success(2);
        summary.record_failure();
        assert_eq!(summary.headline(), "2 files checked: 1 ok, 1 failed");
        assert_eq!(summary.warnings, 2);
    }

    #[test]
    fn diagnostic_line_is_one_based() {
        let index = LineIndex::new("a = 1\nb = )");
        let diagnostic = Diagnostic::new("Unexpected ')'", Span::new(10, 11), &index);
        let mut out = NoColor::new(Vec::new());
        write_diagnostic(&mut out, "x.config", &diagnostic).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(text, "x.config:2:5: warning: Unexpected ')'\n");
    }
}
