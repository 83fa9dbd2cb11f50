//! Dual-mode parse driver.
//!
//! The unit is first parsed with the strict `compilation_unit` rule. When that fails
//! the driver classifies the failure with a token-level scan: a lexical failure is
//! final, anything else moves the driver to exhaustive mode, where `recovering_unit`
//! isolates each unparsable statement as a `syntax_error` fragment and every fragment
//! is re-parsed on its own to obtain a precise diagnostic.

use std::collections::BTreeMap;

use pest::error::{Error as PestError, ErrorVariant, InputLocation};
use pest::iterators::Pair;
use pest::Parser;
use tracing::{debug, trace};

use super::operators::describe;
use super::{ConfigParser, Rule};
use crate::diagnostics::Diagnostic;
use crate::errors::{ConfigError, SourceContext};
use crate::Span;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PredictionMode {
    /// Strict whole-unit parse; no diagnostics are collected.
    Optimistic,
    /// Recovering parse with one diagnostic per unparsable statement.
    Exhaustive,
}

/// A successfully parsed unit, ready for the tree walker.
#[derive(Debug)]
pub struct ParsedUnit<'i> {
    pub root: Pair<'i, Rule>,
    pub mode: PredictionMode,
    /// Diagnostics for `syntax_error` fragments, keyed by fragment start offset.
    pub fragments: BTreeMap<usize, Diagnostic>,
}

pub struct ParseDriver<'a> {
    source: &'a str,
    ctx: &'a SourceContext,
    tolerant: bool,
}

impl<'a> ParseDriver<'a> {
    pub fn new(source: &'a str, ctx: &'a SourceContext, tolerant: bool) -> Self {
        Self {
            source,
            ctx,
            tolerant,
        }
    }

    pub fn parse(&self) -> Result<ParsedUnit<'a>, ConfigError> {
        let mut mode = PredictionMode::Optimistic;
        loop {
            match mode {
                PredictionMode::Optimistic => {
                    match ConfigParser::parse(Rule::compilation_unit, self.source) {
                        Ok(mut pairs) => {
                            let root = self.first(pairs.next())?;
                            return Ok(ParsedUnit {
                                root,
                                mode,
                                fragments: BTreeMap::new(),
                            });
                        }
                        Err(err) => {
                            trace!(unit = self.ctx.name(), error = %err, "optimistic parse failed");
                            self.scan_tokens()?;
                            debug!(unit = self.ctx.name(), "retrying with exhaustive prediction");
                            mode = PredictionMode::Exhaustive;
                        }
                    }
                }
                PredictionMode::Exhaustive => return self.parse_exhaustive(),
            }
        }
    }

    fn parse_exhaustive(&self) -> Result<ParsedUnit<'a>, ConfigError> {
        let mut pairs = ConfigParser::parse(Rule::recovering_unit, self.source)
            .map_err(|err| self.ctx.syntax(vec![self.pest_diagnostic(err, 0)]))?;
        let root = self.first(pairs.next())?;

        let fragments: BTreeMap<usize, Diagnostic> = root
            .clone()
            .into_inner()
            .flatten()
            .filter(|pair| matches!(pair.as_rule(), Rule::syntax_error | Rule::block_error))
            .map(|pair| {
                let span = Span::from(pair.as_span());
                (span.start, self.probe(pair.as_str(), span))
            })
            .collect();
        debug!(
            unit = self.ctx.name(),
            fragments = fragments.len(),
            "exhaustive parse finished"
        );

        if !fragments.is_empty() && !self.tolerant {
            return Err(self.ctx.syntax(fragments.into_values().collect()));
        }
        Ok(ParsedUnit {
            root,
            mode: PredictionMode::Exhaustive,
            fragments,
        })
    }

    /// Re-parses one fragment alone and positions the failure in the whole unit.
    fn probe(&self, text: &str, span: Span) -> Diagnostic {
        match ConfigParser::parse(Rule::statement_probe, text) {
            Err(err) => self.pest_diagnostic(err, span.start),
            Ok(_) => self.ctx.diagnostic("Unexpected input", span),
        }
    }

    /// Token-level scan; a failure here is a lexical error and ends the translation.
    fn scan_tokens(&self) -> Result<(), ConfigError> {
        let Err(err) = ConfigParser::parse(Rule::lexical_unit, self.source) else {
            return Ok(());
        };
        let offset = match err.location {
            InputLocation::Pos(pos) => pos,
            InputLocation::Span((start, _)) => start,
        };
        let rest = &self.source[offset..];
        let message = if rest.starts_with('\'') || rest.starts_with('"') {
            "Unterminated string literal".to_string()
        } else if rest.starts_with("/*") {
            "Unterminated comment".to_string()
        } else {
            match rest.chars().next() {
                Some(c) => format!("Unexpected character '{}'", c.escape_debug()),
                None => "Unexpected end of input".to_string(),
            }
        };
        debug!(unit = self.ctx.name(), offset, %message, "lexical error");
        Err(self.ctx.lexical(message, self.widen(offset)))
    }

    fn pest_diagnostic(&self, err: PestError<Rule>, base: usize) -> Diagnostic {
        let span = match err.location {
            InputLocation::Pos(pos) => self.widen(base + pos),
            InputLocation::Span((start, end)) => Span::new(base + start, base + end),
        };
        let found = match self.source[span.start..].chars().next() {
            Some(c) => format!("'{}'", c.escape_debug()),
            None => "end of input".to_string(),
        };
        self.ctx
            .diagnostic(format!("Unexpected {}: {}", found, expectation(&err.variant)), span)
    }

    /// Zero-width positions cover the character they point at.
    fn widen(&self, offset: usize) -> Span {
        let offset = offset.min(self.source.len());
        let len = self.source[offset..]
            .chars()
            .next()
            .map_or(0, char::len_utf8);
        Span::new(offset, offset + len)
    }

    fn first(&self, pair: Option<Pair<'a, Rule>>) -> Result<Pair<'a, Rule>, ConfigError> {
        pair.ok_or_else(|| {
            self.ctx
                .structural("Parser produced an empty tree", Span::new(0, 0))
        })
    }
}

/// Condenses a pest failure into "expected a, b, or c" with each name listed once.
fn expectation(variant: &ErrorVariant<Rule>) -> String {
    let (positives, negatives) = match variant {
        ErrorVariant::ParsingError {
            positives,
            negatives,
        } => (positives, negatives),
        ErrorVariant::CustomError { message } => return message.clone(),
    };
    let expected = described(positives);
    let unexpected = described(negatives);
    match (expected.is_empty(), unexpected.is_empty()) {
        (true, true) => "unknown parsing error".to_string(),
        (false, true) => format!("expected {}", enumerate(&expected)),
        (true, false) => format!("unexpected {}", enumerate(&unexpected)),
        (false, false) => format!(
            "unexpected {}; expected {}",
            enumerate(&unexpected),
            enumerate(&expected)
        ),
    }
}

fn described(rules: &[Rule]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in rules.iter().map(describe) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn enumerate(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} or {second}"),
        [init @ .., last] => format!("{}, or {last}", init.join(", ")),
    }
}
