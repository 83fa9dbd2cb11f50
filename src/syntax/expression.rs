//! Expression construction.
//!
//! Operator structure comes from the Pratt table; everything else is a direct match
//! on the rule of each pair. Call-shape disambiguation is decided purely by the
//! syntactic category of the receiver:
//!
//! 1. property access: member call on the property's object
//! 2. bare identifier, string or interpolated string: implicit-this call
//! 3. anything else: a `call` invocation on the receiver

use pest::iterators::Pair;

use super::builder::{significant, AstBuilder};
use super::literal::{decode_number, decode_string, normalize_newlines, unescape, QuoteStyle};
use super::operators::{binary_op, range_bounds, unary_op, PRATT};
use super::Rule;
use crate::ast::{Arguments, ExprKind, Expression, Literal, MapEntry, Spanned, UnaryOp};
use crate::errors::ConfigError;
use crate::Span;

type BuildResult = Result<Expression, ConfigError>;

const PRIMITIVE_TYPES: [&str; 8] = [
    "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

impl<'a> AstBuilder<'a> {
    pub(super) fn expression(&self, pair: Pair<'_, Rule>) -> BuildResult {
        if pair.as_rule() != Rule::expression {
            return Err(self.unexpected(&pair));
        }
        PRATT
            .map_primary(|primary| self.operand(primary))
            .map_prefix(|op, rhs| self.prefix(op, rhs?))
            .map_postfix(|lhs, op| self.postfix(lhs?, op))
            .map_infix(|lhs, op, rhs| self.infix(lhs?, op, rhs?))
            .parse(pair.into_inner())
    }

    // ========================================================================
    // OPERATORS
    // ========================================================================

    fn prefix(&self, op: Pair<'_, Rule>, operand: Expression) -> BuildResult {
        let span = Span::from(op.as_span()).cover(operand.span);
        if op.as_rule() == Rule::cast_op {
            let type_ref = match op.into_inner().next() {
                Some(type_ref) => self.type_ref(type_ref)?,
                None => return Err(self.ctx.structural("Missing cast type", span)),
            };
            return Ok(Expression::new(
                ExprKind::Cast {
                    type_ref,
                    operand: Box::new(operand),
                    coerce: false,
                },
                span,
            ));
        }

        let Some(unary) = unary_op(op.as_rule()) else {
            return Err(self.unexpected(&op));
        };
        if unary == UnaryOp::Negative && self.is_numeral(&operand) {
            return Ok(self.negated_number(&operand, span));
        }
        Ok(Expression::new(
            ExprKind::Unary {
                op: unary,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// An ungrouped numeral, including one that failed to decode on its own.
    fn is_numeral(&self, expr: &Expression) -> bool {
        let starts_with_digit = self.source[expr.span.start..]
            .starts_with(|c: char| c.is_ascii_digit());
        !expr.is_grouped()
            && starts_with_digit
            && matches!(
                expr.kind,
                ExprKind::Constant(Literal::Number(_) | Literal::Null)
            )
    }

    /// Folds `-` into the numeral so `-2147483648` stays an int.
    fn negated_number(&self, operand: &Expression, span: Span) -> Expression {
        self.retract_numeric_error(operand.span);
        let digits = &self.source[operand.span.start..operand.span.end];
        self.number(&format!("-{digits}"), span)
    }

    fn postfix(&self, operand: Expression, op: Pair<'_, Rule>) -> BuildResult {
        let span = operand.span.cover(op.as_span().into());
        let rule = op.as_rule();
        let type_ref = match significant(op).next() {
            Some(type_ref) => self.type_ref(type_ref)?,
            None => return Err(self.ctx.structural("Missing type", span)),
        };
        let kind = match rule {
            Rule::as_op => ExprKind::Cast {
                type_ref,
                operand: Box::new(operand),
                coerce: true,
            },
            Rule::instanceof_op | Rule::not_instanceof_op => ExprKind::TypeCheck {
                operand: Box::new(operand),
                type_ref,
                negated: rule == Rule::not_instanceof_op,
            },
            _ => return Err(self.ctx.structural(format!("Unexpected {rule:?}"), span)),
        };
        Ok(Expression::new(kind, span))
    }

    fn infix(&self, left: Expression, op: Pair<'_, Rule>, right: Expression) -> BuildResult {
        let span = left.span.cover(right.span);
        let kind = match op.as_rule() {
            Rule::ternary_op => {
                let then_branch = match op.into_inner().next() {
                    Some(expr) => self.expression(expr)?,
                    None => return Err(self.ctx.structural("Missing ternary branch", span)),
                };
                ExprKind::Ternary {
                    condition: Box::new(left),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(right),
                }
            }
            Rule::elvis_op => ExprKind::Elvis {
                value: Box::new(left),
                fallback: Box::new(right),
            },
            Rule::range_or_shift => {
                let Some(token) = op.into_inner().next() else {
                    return Err(self.ctx.structural("Missing range or shift token", span));
                };
                if let Some((exclusive_left, exclusive_right)) = range_bounds(token.as_rule()) {
                    ExprKind::Range {
                        from: Box::new(left),
                        to: Box::new(right),
                        exclusive_left,
                        exclusive_right,
                    }
                } else if let Some(shift) = binary_op(token.as_rule()) {
                    ExprKind::Binary {
                        op: shift,
                        left: Box::new(left),
                        right: Box::new(right),
                    }
                } else {
                    return Err(self.unexpected(&token));
                }
            }
            rule => match binary_op(rule) {
                Some(binary) => ExprKind::Binary {
                    op: binary,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                None => return Err(self.unexpected(&op)),
            },
        };
        Ok(Expression::new(kind, span))
    }

    // ========================================================================
    // OPERANDS AND PATH ELEMENTS
    // ========================================================================

    pub(super) fn operand(&self, pair: Pair<'_, Rule>) -> BuildResult {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner();
        let mut expr = match inner.next() {
            Some(primary) => self.primary(primary)?,
            None => return Err(self.ctx.structural("Missing operand", span)),
        };
        for element in inner {
            expr = match element.as_rule() {
                Rule::member_access => self.member_access(expr, element)?,
                Rule::arguments => {
                    let arguments = self.arguments(element)?;
                    self.call(expr, arguments)?
                }
                Rule::index_access => self.index_access(expr, element)?,
                Rule::closure => {
                    let closure = self.closure(element)?;
                    self.trailing_closure(expr, closure)?
                }
                _ => return Err(self.unexpected(&element)),
            };
        }
        Ok(expr)
    }

    fn primary(&self, pair: Pair<'_, Rule>) -> BuildResult {
        let span = Span::from(pair.as_span());
        match pair.as_rule() {
            Rule::parenthesized => {
                let mut expr = match pair.into_inner().next() {
                    Some(inner) => self.expression(inner)?,
                    None => return Err(self.ctx.structural("Empty parentheses", span)),
                };
                expr.grouping_depth += 1;
                expr.span = span;
                Ok(expr)
            }
            Rule::identifier => Ok(Expression::identifier(pair.as_str(), span)),
            Rule::integer_literal | Rule::float_literal => Ok(self.number(pair.as_str(), span)),
            Rule::boolean_literal => Ok(Expression::new(
                ExprKind::Constant(Literal::Bool(pair.as_str() == "true")),
                span,
            )),
            Rule::null_literal => Ok(Expression::null(span)),
            Rule::sq_string
            | Rule::tsq_string
            | Rule::dq_string
            | Rule::tdq_string
            | Rule::slashy_string => self.string_literal(pair),
            Rule::list_literal => {
                let elements = pair
                    .into_inner()
                    .map(|element| self.list_element(element))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expression::new(
                    ExprKind::List {
                        elements,
                        wrapped: false,
                    },
                    span,
                ))
            }
            Rule::map_literal => {
                let entries = pair
                    .into_inner()
                    .map(|entry| self.map_entry(entry))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expression::new(ExprKind::Map(entries), span))
            }
            Rule::closure => self.closure(pair),
            Rule::constructor => {
                let mut inner = significant(pair);
                let (Some(type_ref), Some(arguments)) = (inner.next(), inner.next()) else {
                    return Err(self.ctx.structural("Malformed constructor call", span));
                };
                Ok(Expression::new(
                    ExprKind::Constructor {
                        type_ref: self.type_ref(type_ref)?,
                        arguments: self.arguments(arguments)?,
                    },
                    span,
                ))
            }
            _ => Err(self.unexpected(&pair)),
        }
    }

    fn member_access(&self, object: Expression, pair: Pair<'_, Rule>) -> BuildResult {
        let span = object.span.cover(pair.as_span().into());
        let mut inner = pair.into_inner();
        let (Some(operator), Some(name)) = (inner.next(), inner.next()) else {
            return Err(self.ctx.structural("Malformed member access", span));
        };
        let spread_safe = operator.as_rule() == Rule::spread_dot;
        let safe = spread_safe || operator.as_rule() == Rule::safe_dot;
        let property = match name.as_rule() {
            Rule::name => Expression::string(name.as_str(), name.as_span().into()),
            _ => self.string_literal(name)?,
        };
        Ok(Expression::new(
            ExprKind::Property {
                object: Box::new(object),
                property: Box::new(property),
                safe,
                spread_safe,
            },
            span,
        ))
    }

    fn index_access(&self, object: Expression, pair: Pair<'_, Rule>) -> BuildResult {
        let index_span = Span::from(pair.as_span());
        let span = object.span.cover(index_span);
        let mut indices = pair
            .into_inner()
            .map(|element| self.list_element(element))
            .collect::<Result<Vec<_>, _>>()?;
        let index = match indices.len() {
            0 => return Err(self.ctx.structural("Missing index", index_span)),
            1 if matches!(indices[0].kind, ExprKind::Spread(_)) => Expression::new(
                ExprKind::List {
                    elements: indices,
                    wrapped: false,
                },
                index_span,
            ),
            1 => indices.remove(0),
            _ => Expression::new(
                ExprKind::List {
                    elements: indices,
                    wrapped: true,
                },
                index_span,
            ),
        };
        Ok(Expression::new(
            ExprKind::Index {
                object: Box::new(object),
                index: Box::new(index),
            },
            span,
        ))
    }

    fn list_element(&self, pair: Pair<'_, Rule>) -> BuildResult {
        match pair.as_rule() {
            Rule::spread_argument => self.spread(pair),
            _ => self.expression(pair),
        }
    }

    fn spread(&self, pair: Pair<'_, Rule>) -> BuildResult {
        let span = Span::from(pair.as_span());
        match pair.into_inner().next() {
            Some(value) => Ok(Expression::new(
                ExprKind::Spread(Box::new(self.expression(value)?)),
                span,
            )),
            None => Err(self.ctx.structural("Missing spread operand", span)),
        }
    }

    fn map_entry(&self, pair: Pair<'_, Rule>) -> Result<MapEntry, ConfigError> {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner();
        let (Some(key), Some(value)) = (inner.next(), inner.next()) else {
            return Err(self.ctx.structural("Malformed map entry", span));
        };
        let value = self.expression(value)?;
        let key_span = Span::from(key.as_span());
        let key = match key.as_rule() {
            Rule::spread_map_key => return Ok(MapEntry::Spread { value, span }),
            Rule::name => Expression::string(key.as_str(), key_span),
            Rule::parenthesized | Rule::integer_literal | Rule::float_literal => {
                self.primary(key)?
            }
            _ => self.string_literal(key)?,
        };
        Ok(MapEntry::Pair { key, value, span })
    }

    pub(super) fn arguments(&self, pair: Pair<'_, Rule>) -> Result<Arguments, ConfigError> {
        let mut arguments = Arguments {
            span: pair.as_span().into(),
            ..Arguments::default()
        };
        for argument in pair.into_inner() {
            match argument.as_rule() {
                Rule::map_entry => arguments.named.push(self.map_entry(argument)?),
                Rule::spread_argument => arguments.positional.push(self.spread(argument)?),
                _ => arguments.positional.push(self.expression(argument)?),
            }
        }
        Ok(arguments)
    }

    // ========================================================================
    // CALLS
    // ========================================================================

    fn call(&self, receiver: Expression, arguments: Arguments) -> BuildResult {
        let span = receiver.span.cover(arguments.span);

        // A parenthesised receiver is always invoked through `call`.
        if receiver.is_grouped() {
            return Ok(call_on(receiver, arguments, span));
        }

        if let ExprKind::Property {
            object,
            property,
            safe,
            spread_safe,
        } = receiver.kind
        {
            return Ok(Expression::new(
                ExprKind::MethodCall {
                    object,
                    method: property,
                    arguments,
                    implicit_this: false,
                    safe: safe && !spread_safe,
                    spread_safe,
                },
                span,
            ));
        }

        let method = match &receiver.kind {
            ExprKind::Identifier(name) => {
                if name == "void" || PRIMITIVE_TYPES.contains(&name.as_str()) {
                    return Err(self.ctx.structural(
                        format!("'{name}' cannot be used as a method name"),
                        receiver.span,
                    ));
                }
                Some(Expression::string(name.clone(), receiver.span))
            }
            ExprKind::Constant(Literal::String(_)) | ExprKind::GString { .. } => {
                Some(receiver.clone())
            }
            _ => None,
        };
        if let Some(method) = method {
            return Ok(Expression::new(
                ExprKind::MethodCall {
                    object: Box::new(Expression::identifier("this", receiver.span)),
                    method: Box::new(method),
                    arguments,
                    implicit_this: true,
                    safe: false,
                    spread_safe: false,
                },
                span,
            ));
        }

        Ok(call_on(receiver, arguments, span))
    }

    fn trailing_closure(&self, receiver: Expression, closure: Expression) -> BuildResult {
        let span = receiver.span.cover(closure.span);
        match receiver {
            Expression {
                kind: ExprKind::MethodCall { .. },
                grouping_depth: 0,
                ..
            } => {
                let mut call = receiver;
                if let ExprKind::MethodCall { arguments, .. } = &mut call.kind {
                    arguments.span = arguments.span.cover(closure.span);
                    arguments.positional.push(closure);
                }
                call.span = span;
                Ok(call)
            }
            receiver => {
                let closure_span = closure.span;
                self.call(receiver, Arguments::positional(vec![closure], closure_span))
            }
        }
    }

    /// `println 'x'` and `foo.bar a, b: 1` become ordinary calls.
    pub(super) fn command_expression(&self, pair: Pair<'_, Rule>) -> BuildResult {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner();
        let receiver = match inner.next() {
            Some(operand) => self.operand(operand)?,
            None => return Err(self.ctx.structural("Missing command", span)),
        };
        let mut arguments = Arguments::default();
        let mut arguments_span: Option<Span> = None;
        for argument in inner {
            let argument_span = Span::from(argument.as_span());
            arguments_span = Some(arguments_span.map_or(argument_span, |s| s.cover(argument_span)));
            match argument.as_rule() {
                Rule::map_entry => arguments.named.push(self.map_entry(argument)?),
                _ => arguments.positional.push(self.expression(argument)?),
            }
        }
        arguments.span = arguments_span.unwrap_or(span);
        let mut call = self.call(receiver, arguments)?;
        call.span = span;
        Ok(call)
    }

    pub(super) fn closure(&self, pair: Pair<'_, Rule>) -> BuildResult {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner().peekable();
        let parameters = match inner.peek().map(|p| p.as_rule()) {
            Some(Rule::closure_header) => match inner.next() {
                Some(header) => Some(self.parameters(header)?),
                None => None,
            },
            _ => None,
        };
        let body = inner
            .map(|statement| self.statement(statement))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Expression::new(ExprKind::Closure { parameters, body }, span))
    }

    // ========================================================================
    // LITERALS
    // ========================================================================

    pub(super) fn number(&self, text: &str, span: Span) -> Expression {
        match decode_number(text) {
            Ok(number) => Expression::new(ExprKind::Constant(Literal::Number(number)), span),
            Err(message) => {
                self.record_numeric_error(message, span);
                Expression::null(span)
            }
        }
    }

    /// Constant string, or interpolated string when the literal embeds values.
    pub(super) fn string_literal(&self, pair: Pair<'_, Rule>) -> BuildResult {
        let span = Span::from(pair.as_span());
        let style = match pair.as_rule() {
            Rule::sq_string | Rule::tsq_string => {
                return Ok(Expression::string(decode_string(pair.as_str()), span))
            }
            Rule::dq_string => QuoteStyle::Double,
            Rule::tdq_string => QuoteStyle::TripleDouble,
            Rule::slashy_string => QuoteStyle::Slashy,
            _ => return Err(self.unexpected(&pair)),
        };

        let close = span.end.saturating_sub(style.delimiter_len());
        let mut strings: Vec<Spanned<String>> = Vec::new();
        let mut values = Vec::new();
        let mut text = String::new();
        let mut text_span: Option<Span> = None;
        for part in pair.into_inner() {
            let part_span = Span::from(part.as_span());
            match part.as_rule() {
                Rule::dq_text | Rule::tdq_text | Rule::slashy_text => {
                    let raw = if style.is_multiline() {
                        normalize_newlines(part.as_str())
                    } else {
                        part.as_str().to_string()
                    };
                    text.push_str(&unescape(&raw, style));
                    text_span = Some(text_span.map_or(part_span, |s| s.cover(part_span)));
                }
                Rule::interpolated_expression | Rule::interpolated_path => {
                    let segment_span =
                        text_span.take().unwrap_or(Span::new(part_span.start, part_span.start));
                    strings.push(Spanned::new(std::mem::take(&mut text), segment_span));
                    values.push(self.interpolation(part)?);
                }
                _ => return Err(self.unexpected(&part)),
            }
        }

        if values.is_empty() {
            return Ok(Expression::string(text, span));
        }
        let segment_span = text_span.unwrap_or(Span::new(close, close));
        strings.push(Spanned::new(text, segment_span));
        Ok(Expression::new(ExprKind::GString { strings, values }, span))
    }

    fn interpolation(&self, pair: Pair<'_, Rule>) -> BuildResult {
        let span = Span::from(pair.as_span());
        match pair.as_rule() {
            Rule::interpolated_expression => match pair.into_inner().next() {
                Some(expr) => self.expression(expr),
                None => Ok(Expression::null(span)),
            },
            _ => {
                // `$a.b.c` is a chain of property reads rooted at `a`.
                let mut names = pair.into_inner();
                let Some(root) = names.next() else {
                    return Err(self.ctx.structural("Empty interpolation", span));
                };
                let mut expr = Expression::identifier(root.as_str(), root.as_span().into());
                for name in names {
                    let name_span = Span::from(name.as_span());
                    let object_span = expr.span;
                    expr = Expression::new(
                        ExprKind::Property {
                            object: Box::new(expr),
                            property: Box::new(Expression::string(name.as_str(), name_span)),
                            safe: false,
                            spread_safe: false,
                        },
                        object_span.cover(name_span),
                    );
                }
                Ok(expr)
            }
        }
    }
}

/// `receiver.call(arguments)`.
fn call_on(receiver: Expression, arguments: Arguments, span: Span) -> Expression {
    let call_name = Expression::string("call", arguments.span);
    Expression::new(
        ExprKind::MethodCall {
            object: Box::new(receiver),
            method: Box::new(call_name),
            arguments,
            implicit_this: false,
            safe: false,
            spread_safe: false,
        },
        span,
    )
}
