//! Tree walker: turns a parsed unit into a [`Module`].
//!
//! Statements and config constructs are built here; expressions, literals and call
//! disambiguation live in `expression.rs`. The walker borrows the parse tree, never
//! mutates it, and either returns a complete module or an error.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use pest::iterators::{Pair, Pairs};
use tracing::debug;

use super::driver::ParsedUnit;
use super::literal::decode_string;
use super::{BuilderOptions, Rule, Translation};
use crate::ast::{
    AssignOp, AssignTarget, ConfigAssignStatement, ConfigBlockStatement, DeclarationTarget,
    ExprKind, Expression, IncludeStatement, IncompleteStatement, Module, Parameter, Spanned,
    Statement, StatementKind, TupleElement, TypeRef,
};
use crate::diagnostics::Diagnostic;
use crate::errors::{ConfigError, SourceContext};
use crate::Span;

/// Per-unit state threaded through the walk.
#[derive(Debug, Default)]
pub(super) struct Accumulator {
    /// First numeral that failed to decode; raised once the walk is over.
    numeric_error: RefCell<Option<ConfigError>>,
    diagnostics: RefCell<Vec<Diagnostic>>,
}

pub struct AstBuilder<'a> {
    pub(super) ctx: &'a SourceContext,
    pub(super) source: &'a str,
    options: BuilderOptions,
    fragments: BTreeMap<usize, Diagnostic>,
    pub(super) acc: Accumulator,
}

impl<'a> AstBuilder<'a> {
    pub fn new(ctx: &'a SourceContext, source: &'a str, options: BuilderOptions) -> Self {
        Self {
            ctx,
            source,
            options,
            fragments: BTreeMap::new(),
            acc: Accumulator::default(),
        }
    }

    /// Builds the module for one parsed unit.
    pub fn build(mut self, parsed: ParsedUnit<'_>) -> Result<Translation, ConfigError> {
        self.fragments = parsed.fragments;
        let span = Span::from(parsed.root.as_span());
        let statements = self.config_statements(parsed.root.into_inner(), false)?;

        if let Some(err) = self.acc.numeric_error.take() {
            let collected = self.acc.diagnostics.into_inner();
            debug!(
                unit = self.ctx.name(),
                error = %err,
                collected = collected.len(),
                "raising deferred numeric error"
            );
            return Err(err.with_diagnostics(collected));
        }

        debug!(
            unit = self.ctx.name(),
            statements = statements.len(),
            mode = ?parsed.mode,
            "built module"
        );
        Ok(Translation {
            module: Module { statements, span },
            diagnostics: self.acc.diagnostics.into_inner(),
            mode: parsed.mode,
        })
    }

    // ------------------------------------------------------------------------
    // Accumulator access
    // ------------------------------------------------------------------------

    pub(super) fn record_numeric_error(&self, message: String, span: Span) {
        let mut slot = self.acc.numeric_error.borrow_mut();
        if slot.is_none() {
            *slot = Some(self.ctx.numeric(message, span));
        }
    }

    /// Drops the pending numeric error if it was raised for `span`.
    pub(super) fn retract_numeric_error(&self, span: Span) {
        let mut slot = self.acc.numeric_error.borrow_mut();
        let raised_here = slot
            .as_ref()
            .and_then(|err| err.diagnostics().first())
            .is_some_and(|diagnostic| diagnostic.span == span);
        if raised_here {
            *slot = None;
        }
    }

    fn record_diagnostic(&self, diagnostic: Diagnostic) {
        self.acc.diagnostics.borrow_mut().push(diagnostic);
    }

    pub(super) fn unexpected(&self, pair: &Pair<'_, Rule>) -> ConfigError {
        self.ctx.structural(
            format!("Unexpected {:?} node", pair.as_rule()),
            pair.as_span().into(),
        )
    }

    // ========================================================================
    // CONFIG STATEMENTS
    // ========================================================================

    fn config_statements(
        &self,
        pairs: Pairs<'_, Rule>,
        in_selector: bool,
    ) -> Result<Vec<Statement>, ConfigError> {
        let mut statements = Vec::new();
        for pair in pairs {
            match pair.as_rule() {
                Rule::EOI => {}
                Rule::config_assignment => statements.push(self.config_assignment(pair)?),
                Rule::config_incomplete | Rule::syntax_error | Rule::block_error => {
                    statements.push(self.incomplete(pair)?)
                }
                Rule::config_include
                | Rule::config_block
                | Rule::config_selector
                | Rule::recovering_block
                | Rule::recovering_selector
                    if in_selector =>
                {
                    return Err(self.ctx.structural(
                        "Only assignments are allowed inside a selector block",
                        pair.as_span().into(),
                    ));
                }
                Rule::config_include => statements.push(self.config_include(pair)?),
                Rule::config_block | Rule::recovering_block => {
                    statements.push(self.config_block(pair)?)
                }
                Rule::config_selector | Rule::recovering_selector => {
                    statements.push(self.config_selector(pair)?)
                }
                _ => return Err(self.unexpected(&pair)),
            }
        }
        Ok(statements)
    }

    fn config_include(&self, pair: Pair<'_, Rule>) -> Result<Statement, ConfigError> {
        let span = Span::from(pair.as_span());
        let source = match significant(pair).next() {
            Some(expr) => self.expression(expr)?,
            None => return Err(self.ctx.structural("Missing include source", span)),
        };
        Ok(Statement::new(
            StatementKind::Include(IncludeStatement { source }),
            span,
        ))
    }

    fn config_assignment(&self, pair: Pair<'_, Rule>) -> Result<Statement, ConfigError> {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner();
        let (Some(path), Some(value)) = (inner.next(), inner.next()) else {
            return Err(self.ctx.structural("Malformed assignment", span));
        };
        let mut names = Vec::new();
        let mut constants = Vec::new();
        for segment in path.into_inner() {
            let (name, segment_span) = self.config_name(segment)?;
            constants.push(Expression::string(name.clone(), segment_span));
            names.push(name);
        }
        let value = self.expression(value)?;
        Ok(Statement::new(
            StatementKind::ConfigAssign(ConfigAssignStatement {
                names,
                path: constants,
                value,
            }),
            span,
        ))
    }

    fn config_block(&self, pair: Pair<'_, Rule>) -> Result<Statement, ConfigError> {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner();
        let Some(name) = inner.next() else {
            return Err(self.ctx.structural("Malformed block", span));
        };
        let (name, name_span) = self.config_name(name)?;
        let statements = self.config_statements(inner, false)?;
        Ok(Statement::new(
            StatementKind::ConfigBlock(ConfigBlockStatement {
                kind: None,
                name,
                name_span,
                statements,
            }),
            span,
        ))
    }

    fn config_selector(&self, pair: Pair<'_, Rule>) -> Result<Statement, ConfigError> {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner();
        let (Some(kind), Some(target)) = (inner.next(), inner.next()) else {
            return Err(self.ctx.structural("Malformed selector", span));
        };
        let (name, name_span) = self.config_name(target)?;
        let statements = self.config_statements(inner, true)?;
        Ok(Statement::new(
            StatementKind::ConfigBlock(ConfigBlockStatement {
                kind: Some(kind.as_str().to_string()),
                name,
                name_span,
                statements,
            }),
            span,
        ))
    }

    /// A path segment, block name or selector target: identifier or constant string.
    fn config_name(&self, pair: Pair<'_, Rule>) -> Result<(String, Span), ConfigError> {
        let span = Span::from(pair.as_span());
        match pair.as_rule() {
            Rule::name => Ok((pair.as_str().to_string(), span)),
            Rule::sq_string | Rule::tsq_string => Ok((decode_string(pair.as_str()), span)),
            Rule::dq_string => {
                let value = self.string_literal(pair)?;
                match value.as_string_constant() {
                    Some(text) => Ok((text.to_string(), span)),
                    None => Err(self.ctx.structural(
                        "Interpolated strings cannot be used as config names",
                        span,
                    )),
                }
            }
            _ => Err(self.unexpected(&pair)),
        }
    }

    fn incomplete(&self, pair: Pair<'_, Rule>) -> Result<Statement, ConfigError> {
        let start = pair.as_span().start();
        // Fragments may run into trailing blanks before the separator.
        let text = pair.as_str().trim_end().to_string();
        let span = Span::new(start, start + text.len());
        if !self.options.tolerant {
            return Err(self.ctx.incomplete("Incomplete statement", span));
        }
        let diagnostic = match pair.as_rule() {
            Rule::syntax_error | Rule::block_error => self
                .fragments
                .get(&span.start)
                .cloned()
                .unwrap_or_else(|| self.ctx.diagnostic("Unexpected input", span)),
            _ => self.ctx.diagnostic("Incomplete statement", span),
        };
        self.record_diagnostic(diagnostic);
        Ok(Statement::new(
            StatementKind::Incomplete(IncompleteStatement { text }),
            span,
        ))
    }

    // ========================================================================
    // CLOSURE STATEMENTS
    // ========================================================================

    pub(super) fn statements(&self, pairs: Pairs<'_, Rule>) -> Result<Vec<Statement>, ConfigError> {
        pairs.map(|pair| self.statement(pair)).collect()
    }

    pub(super) fn statement(&self, pair: Pair<'_, Rule>) -> Result<Statement, ConfigError> {
        let span = Span::from(pair.as_span());
        let kind = match pair.as_rule() {
            Rule::expression_statement => match pair.into_inner().next() {
                Some(expr) => StatementKind::Expression(self.expression(expr)?),
                None => return Err(self.ctx.structural("Empty statement", span)),
            },
            Rule::block_statement => StatementKind::Block(self.statements(pair.into_inner())?),
            Rule::return_statement => {
                let value = significant(pair).next().map(|p| self.expression(p)).transpose()?;
                StatementKind::Return(value)
            }
            Rule::assert_statement => {
                let mut inner = significant(pair);
                let condition = match inner.next() {
                    Some(expr) => self.expression(expr)?,
                    None => return Err(self.ctx.structural("Missing assertion", span)),
                };
                let message = inner.next().map(|p| self.expression(p)).transpose()?;
                StatementKind::Assert { condition, message }
            }
            Rule::if_statement => self.if_statement(pair)?,
            Rule::declaration => self.declaration(pair)?,
            Rule::assignment_statement => self.assignment(pair)?,
            Rule::command_statement => {
                StatementKind::Expression(self.command_expression(pair)?)
            }
            _ => return Err(self.unexpected(&pair)),
        };
        Ok(Statement::new(kind, span))
    }

    fn if_statement(&self, pair: Pair<'_, Rule>) -> Result<StatementKind, ConfigError> {
        let span = Span::from(pair.as_span());
        let mut inner = significant(pair);
        let (Some(condition), Some(then_branch)) = (inner.next(), inner.next()) else {
            return Err(self.ctx.structural("Malformed if statement", span));
        };
        Ok(StatementKind::If {
            condition: self.expression(condition)?,
            then_branch: Box::new(self.statement(then_branch)?),
            else_branch: inner
                .next()
                .map(|p| self.statement(p).map(Box::new))
                .transpose()?,
        })
    }

    fn declaration(&self, pair: Pair<'_, Rule>) -> Result<StatementKind, ConfigError> {
        let span = Span::from(pair.as_span());
        let mut type_ref = None;
        let mut target = None;
        let mut value = None;
        for part in significant(pair) {
            match part.as_rule() {
                Rule::declared_type => type_ref = Some(self.declared_type(part)?),
                Rule::identifier => {
                    target = Some(DeclarationTarget::Name(Spanned::new(
                        part.as_str().to_string(),
                        part.as_span().into(),
                    )))
                }
                Rule::declaration_tuple => {
                    target = Some(DeclarationTarget::Tuple(self.tuple_elements(part)?))
                }
                Rule::expression => value = Some(self.expression(part)?),
                _ => return Err(self.unexpected(&part)),
            }
        }
        let target =
            target.ok_or_else(|| self.ctx.structural("Missing declaration target", span))?;
        Ok(StatementKind::Declaration {
            type_ref,
            target,
            value,
        })
    }

    fn tuple_elements(&self, pair: Pair<'_, Rule>) -> Result<Vec<TupleElement>, ConfigError> {
        let mut elements = Vec::new();
        let mut seen = HashSet::new();
        for element in pair.into_inner() {
            let span = Span::from(element.as_span());
            let mut type_ref = None;
            let mut name = String::new();
            for part in element.into_inner() {
                match part.as_rule() {
                    Rule::declared_type => type_ref = Some(self.declared_type(part)?),
                    Rule::identifier => name = part.as_str().to_string(),
                    _ => return Err(self.unexpected(&part)),
                }
            }
            if !seen.insert(name.clone()) {
                return Err(self.ctx.structural(
                    format!("Duplicate variable '{name}' in multiple assignment"),
                    span,
                ));
            }
            elements.push(TupleElement {
                name,
                type_ref,
                span,
            });
        }
        Ok(elements)
    }

    fn assignment(&self, pair: Pair<'_, Rule>) -> Result<StatementKind, ConfigError> {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner();
        let (Some(target), Some(operator), Some(value)) = (inner.next(), inner.next(), inner.next())
        else {
            return Err(self.ctx.structural("Malformed assignment", span));
        };
        let op = AssignOp::from_symbol(operator.as_str()).ok_or_else(|| {
            self.ctx.structural(
                format!("Unknown assignment operator '{}'", operator.as_str()),
                operator.as_span().into(),
            )
        })?;
        let target_span = Span::from(target.as_span());
        let target = match target.as_rule() {
            Rule::tuple_target => AssignTarget::Tuple(self.tuple_elements(target)?),
            _ => self.assignment_target(self.operand(target)?)?,
        };
        if matches!(target, AssignTarget::Tuple(_)) && op != AssignOp::Assign {
            return Err(self.ctx.structural(
                format!("Operator '{op}' cannot be used with multiple assignment"),
                target_span,
            ));
        }
        Ok(StatementKind::Assign {
            target,
            op,
            value: self.expression(value)?,
        })
    }

    fn assignment_target(&self, target: Expression) -> Result<AssignTarget, ConfigError> {
        match &target.kind {
            ExprKind::Identifier(name) if target.grouping_depth == 1 => {
                Ok(AssignTarget::Tuple(vec![TupleElement {
                    name: name.clone(),
                    type_ref: None,
                    span: target.span,
                }]))
            }
            ExprKind::Identifier(_) if target.grouping_depth > 1 => Err(self.ctx.structural(
                "Nested parenthesis is not allowed in multiple assignment, e.g. ((a)) = b",
                target.span,
            )),
            ExprKind::Identifier(_) | ExprKind::Property { .. } | ExprKind::Index { .. } => {
                Ok(AssignTarget::Single(target))
            }
            _ => Err(self.ctx.structural(
                "The left-hand side of an assignment must be a variable, property or index",
                target.span,
            )),
        }
    }

    // ------------------------------------------------------------------------
    // Types and parameters
    // ------------------------------------------------------------------------

    pub(super) fn declared_type(&self, pair: Pair<'_, Rule>) -> Result<TypeRef, ConfigError> {
        let span = Span::from(pair.as_span());
        match pair.into_inner().next() {
            Some(type_ref) => self.type_ref(type_ref),
            None => Err(self.ctx.structural("Missing type", span)),
        }
    }

    pub(super) fn type_ref(&self, pair: Pair<'_, Rule>) -> Result<TypeRef, ConfigError> {
        let span = Span::from(pair.as_span());
        let mut type_ref = TypeRef {
            name: String::new(),
            generics: Vec::new(),
            array_dims: 0,
            span,
        };
        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::qualified_name => type_ref.name = part.as_str().to_string(),
                Rule::type_arguments => {
                    for argument in part.into_inner() {
                        type_ref.generics.push(match argument.as_rule() {
                            Rule::wildcard_type => None,
                            _ => Some(self.type_ref(argument)?),
                        });
                    }
                }
                Rule::array_dims => type_ref.array_dims = part.as_str().matches('[').count(),
                _ => return Err(self.unexpected(&part)),
            }
        }
        Ok(type_ref)
    }

    /// Parameters of a closure header; a var-arg must come last and names must be unique.
    pub(super) fn parameters(&self, header: Pair<'_, Rule>) -> Result<Vec<Parameter>, ConfigError> {
        let mut parameters: Vec<Parameter> = Vec::new();
        for pair in header.into_inner() {
            let span = Span::from(pair.as_span());
            let mut parameter = Parameter {
                name: String::new(),
                type_ref: None,
                default: None,
                var_args: false,
                span,
            };
            for part in pair.into_inner() {
                match part.as_rule() {
                    Rule::declared_type => parameter.type_ref = Some(self.declared_type(part)?),
                    Rule::var_args => parameter.var_args = true,
                    Rule::identifier => parameter.name = part.as_str().to_string(),
                    Rule::expression => parameter.default = Some(self.expression(part)?),
                    _ => return Err(self.unexpected(&part)),
                }
            }
            if parameters.iter().any(|p| p.name == parameter.name) {
                return Err(self.ctx.structural(
                    format!("Duplicated parameter '{}' found", parameter.name),
                    span,
                ));
            }
            parameters.push(parameter);
        }
        if let Some(misplaced) = parameters
            .iter()
            .rev()
            .skip(1)
            .find(|parameter| parameter.var_args)
        {
            return Err(self.ctx.structural(
                format!(
                    "The var-arg parameter '{}' must be the last parameter",
                    misplaced.name
                ),
                misplaced.span,
            ));
        }
        Ok(parameters)
    }
}

/// Inner pairs with keyword tokens removed.
pub(super) fn significant<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule()))
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_include
            | Rule::kw_if
            | Rule::kw_else
            | Rule::kw_return
            | Rule::kw_assert
            | Rule::kw_def
            | Rule::kw_new
            | Rule::kw_as
            | Rule::kw_in
            | Rule::kw_instanceof
            | Rule::kw_not_instanceof
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorType;
    use crate::syntax::translate;

    #[test]
    fn first_numeric_error_wins() {
        let ctx = SourceContext::new("unit.config", "a = 0x\nb = 0b");
        let builder = AstBuilder::new(&ctx, "a = 0x\nb = 0b", BuilderOptions::default());
        builder.record_numeric_error("first".into(), Span::new(4, 6));
        builder.record_numeric_error("second".into(), Span::new(11, 13));
        let pending = builder.acc.numeric_error.borrow();
        assert_eq!(pending.as_ref().map(|err| err.message()), Some("first"));
    }

    #[test]
    fn retraction_only_matches_its_own_span() {
        let ctx = SourceContext::new("unit.config", "a = 0x");
        let builder = AstBuilder::new(&ctx, "a = 0x", BuilderOptions::default());
        builder.record_numeric_error("bad".into(), Span::new(4, 6));
        builder.retract_numeric_error(Span::new(0, 1));
        assert!(builder.acc.numeric_error.borrow().is_some());
        builder.retract_numeric_error(Span::new(4, 6));
        assert!(builder.acc.numeric_error.borrow().is_none());
    }

    #[test]
    fn structural_errors_preempt_deferred_numeric_errors() {
        let err = translate("a = 0x\nb = { x, x -> x }", BuilderOptions::default()).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Structural);
    }

    #[test]
    fn tolerant_incomplete_statement_records_a_diagnostic() {
        let translation = translate("process.\ncpus = 2", BuilderOptions::tolerant()).unwrap();
        assert_eq!(translation.diagnostics.len(), 1);
        assert!(matches!(
            translation.module.statements[0].kind,
            StatementKind::Incomplete(_)
        ));
    }
}
