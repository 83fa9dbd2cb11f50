//! Configuration statements and their lowering to protocol calls.
//!
//! The runtime understands config statements only through four verbs invoked on an
//! implicit receiver:
//!
//! | statement                 | lowered call                        |
//! |---------------------------|-------------------------------------|
//! | `includeConfig src`       | `includeConfig(src)`                |
//! | `a.b = v`                 | `assign(['a', 'b'], v)`             |
//! | `name { ... }`            | `block('name', { -> ... })`         |
//! | `kind:'target' { ... }`   | `kind('target', { -> ... })`        |

use serde::{Deserialize, Serialize};

use super::{
    Arguments, AssignTarget, ExprKind, Expression, Span, Statement, StatementKind,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludeStatement {
    pub source: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigAssignStatement {
    /// Dotted path segments as written, e.g. `["params", "foo"]`.
    pub names: Vec<String>,
    /// The same path as string constants, one per segment.
    pub path: Vec<Expression>,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigBlockStatement {
    /// Selector qualifier such as `withLabel`; `None` for plain blocks.
    pub kind: Option<String>,
    pub name: String,
    pub name_span: Span,
    pub statements: Vec<Statement>,
}

impl ConfigBlockStatement {
    pub fn is_selector(&self) -> bool {
        self.kind.is_some()
    }
}

/// Placeholder for a dangling path such as `process.` (tolerant mode only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncompleteStatement {
    pub text: String,
}

impl Statement {
    /// Lowers config statements to implicit-receiver calls, recursing into nested bodies.
    pub fn lower(&self) -> Statement {
        let span = self.span;
        let kind = match &self.kind {
            StatementKind::Include(include) => StatementKind::Expression(Expression::implicit_call(
                "includeConfig",
                Arguments::positional(vec![include.source.clone()], include.source.span),
                span,
            )),
            StatementKind::ConfigAssign(assign) => {
                let path_span = assign
                    .path
                    .iter()
                    .map(|segment| segment.span)
                    .reduce(Span::cover)
                    .unwrap_or(span);
                let path = Expression::new(
                    ExprKind::List {
                        elements: assign.path.clone(),
                        wrapped: false,
                    },
                    path_span,
                );
                StatementKind::Expression(Expression::implicit_call(
                    "assign",
                    Arguments::positional(vec![path, assign.value.clone()], span),
                    span,
                ))
            }
            StatementKind::ConfigBlock(block) => {
                let verb = block.kind.as_deref().unwrap_or("block");
                let body = Expression::new(
                    ExprKind::Closure {
                        parameters: Some(Vec::new()),
                        body: block.statements.iter().map(Statement::lower).collect(),
                    },
                    span,
                );
                let name = Expression::string(block.name.clone(), block.name_span);
                StatementKind::Expression(Expression::implicit_call(
                    verb,
                    Arguments::positional(vec![name, body], span),
                    span,
                ))
            }
            StatementKind::Block(statements) => {
                StatementKind::Block(statements.iter().map(Statement::lower).collect())
            }
            StatementKind::Incomplete(_)
            | StatementKind::Expression(_)
            | StatementKind::Assign { .. }
            | StatementKind::Declaration { .. }
            | StatementKind::If { .. }
            | StatementKind::Return(_)
            | StatementKind::Assert { .. } => self.kind.clone(),
        };
        Statement::new(kind, span)
    }
}

impl AssignTarget {
    pub fn span(&self) -> Span {
        match self {
            AssignTarget::Single(expression) => expression.span,
            AssignTarget::Tuple(elements) => elements
                .iter()
                .map(|element| element.span)
                .reduce(Span::cover)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Literal, Number};

    fn int(value: i32, span: Span) -> Expression {
        Expression::new(ExprKind::Constant(Literal::Number(Number::Integer(value))), span)
    }

    #[test]
    fn assignment_lowers_to_assign_call() {
        let statement = Statement::new(
            StatementKind::ConfigAssign(ConfigAssignStatement {
                names: vec!["params".into(), "foo".into()],
                path: vec![
                    Expression::string("params", Span::new(0, 6)),
                    Expression::string("foo", Span::new(7, 10)),
                ],
                value: int(1, Span::new(13, 14)),
            }),
            Span::new(0, 14),
        );
        assert_eq!(statement.lower().pretty(), "(call this assign (list \"params\" \"foo\") 1)");
    }

    #[test]
    fn selector_lowers_to_its_kind() {
        let statement = Statement::new(
            StatementKind::ConfigBlock(ConfigBlockStatement {
                kind: Some("withLabel".into()),
                name: "big_mem".into(),
                name_span: Span::new(10, 19),
                statements: vec![],
            }),
            Span::new(0, 22),
        );
        assert_eq!(
            statement.lower().pretty(),
            "(call this withLabel \"big_mem\" (closure ()))"
        );
    }

    #[test]
    fn non_config_statements_are_unchanged() {
        let statement = Statement::new(
            StatementKind::Return(Some(int(3, Span::new(7, 8)))),
            Span::new(0, 8),
        );
        assert_eq!(statement.lower(), statement);
    }
}
