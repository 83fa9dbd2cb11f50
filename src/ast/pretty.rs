//! S-expression rendering of the AST, used by the CLI and by tests.
//!
//! ```text
//! params.foo = 1            (assign (params foo) 1)
//! profiles { cpus = 2 }     (block profiles (assign (cpus) 2))
//! foo(1, x: 2)              (call this foo (named ("x" 2)) 1)
//! ```

use super::{
    Arguments, AssignTarget, DeclarationTarget, ExprKind, Expression, Literal, MapEntry, Module,
    Number, Parameter, Statement, StatementKind, TupleElement,
};

impl Module {
    pub fn pretty(&self) -> String {
        self.statements
            .iter()
            .map(Statement::pretty)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Statement {
    pub fn pretty(&self) -> String {
        match &self.kind {
            StatementKind::Include(include) => format!("(include {})", include.source.pretty()),
            StatementKind::ConfigAssign(assign) => {
                format!("(assign ({}) {})", assign.names.join(" "), assign.value.pretty())
            }
            StatementKind::ConfigBlock(block) => {
                let head = match &block.kind {
                    Some(kind) => format!("select {} {}", kind, block.name),
                    None => format!("block {}", block.name),
                };
                list_with(head, block.statements.iter().map(Statement::pretty))
            }
            StatementKind::Incomplete(incomplete) => {
                format!("(incomplete {:?})", incomplete.text)
            }
            StatementKind::Expression(expression) => expression.pretty(),
            StatementKind::Assign { target, op, value } => {
                let target = match target {
                    AssignTarget::Single(expression) => expression.pretty(),
                    AssignTarget::Tuple(elements) => pretty_tuple(elements),
                };
                format!("({} {} {})", op, target, value.pretty())
            }
            StatementKind::Declaration {
                type_ref,
                target,
                value,
            } => {
                let mut parts = vec!["def".to_string()];
                if let Some(type_ref) = type_ref {
                    parts.push(type_ref.to_string());
                }
                parts.push(match target {
                    DeclarationTarget::Name(name) => name.value.clone(),
                    DeclarationTarget::Tuple(elements) => pretty_tuple(elements),
                });
                if let Some(value) = value {
                    parts.push(value.pretty());
                }
                format!("({})", parts.join(" "))
            }
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    condition.pretty(),
                    then_branch.pretty(),
                    else_branch.pretty()
                ),
                None => format!("(if {} {})", condition.pretty(), then_branch.pretty()),
            },
            StatementKind::Block(statements) => {
                list_with("do".to_string(), statements.iter().map(Statement::pretty))
            }
            StatementKind::Return(value) => match value {
                Some(value) => format!("(return {})", value.pretty()),
                None => "(return)".to_string(),
            },
            StatementKind::Assert { condition, message } => match message {
                Some(message) => format!("(assert {} {})", condition.pretty(), message.pretty()),
                None => format!("(assert {})", condition.pretty()),
            },
        }
    }
}

impl Expression {
    pub fn pretty(&self) -> String {
        match &self.kind {
            ExprKind::Identifier(name) => name.clone(),
            ExprKind::Constant(literal) => pretty_literal(literal),
            ExprKind::GString { strings, values } => {
                let mut parts = Vec::with_capacity(strings.len() + values.len());
                for (i, segment) in strings.iter().enumerate() {
                    parts.push(format!("{:?}", segment.value));
                    if let Some(value) = values.get(i) {
                        parts.push(value.pretty());
                    }
                }
                list_with("gstring".to_string(), parts.into_iter())
            }
            ExprKind::List { elements, wrapped } => {
                let head = if *wrapped { "indices" } else { "list" };
                list_with(head.to_string(), elements.iter().map(Expression::pretty))
            }
            ExprKind::Map(entries) => list_with("map".to_string(), entries.iter().map(pretty_entry)),
            ExprKind::Range {
                from,
                to,
                exclusive_left,
                exclusive_right,
            } => {
                let op = match (exclusive_left, exclusive_right) {
                    (false, false) => "..",
                    (false, true) => "..<",
                    (true, false) => "<..",
                    (true, true) => "<..<",
                };
                format!("({} {} {})", op, from.pretty(), to.pretty())
            }
            ExprKind::Unary { op, operand } => format!("({} {})", op, operand.pretty()),
            ExprKind::Binary { op, left, right } => {
                format!("({} {} {})", op, left.pretty(), right.pretty())
            }
            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(? {} {} {})",
                condition.pretty(),
                then_branch.pretty(),
                else_branch.pretty()
            ),
            ExprKind::Elvis { value, fallback } => {
                format!("(?: {} {})", value.pretty(), fallback.pretty())
            }
            ExprKind::Property {
                object,
                property,
                safe,
                spread_safe,
            } => {
                let op = match (safe, spread_safe) {
                    (_, true) => "*.",
                    (true, false) => "?.",
                    (false, false) => ".",
                };
                format!("({} {} {})", op, object.pretty(), pretty_name(property))
            }
            ExprKind::Index { object, index } => {
                format!("(index {} {})", object.pretty(), index.pretty())
            }
            ExprKind::MethodCall {
                object,
                method,
                arguments,
                safe,
                spread_safe,
                ..
            } => {
                let head = match (safe, spread_safe) {
                    (_, true) => "spread-call",
                    (true, false) => "safe-call",
                    (false, false) => "call",
                };
                let head = format!("{} {} {}", head, object.pretty(), pretty_name(method));
                list_with(head, pretty_arguments(arguments).into_iter())
            }
            ExprKind::Closure { parameters, body } => {
                let mut parts = Vec::new();
                if let Some(parameters) = parameters {
                    let names = parameters.iter().map(pretty_parameter).collect::<Vec<_>>();
                    parts.push(format!("({})", names.join(" ")));
                }
                parts.extend(body.iter().map(Statement::pretty));
                list_with("closure".to_string(), parts.into_iter())
            }
            ExprKind::Constructor {
                type_ref,
                arguments,
            } => list_with(format!("new {type_ref}"), pretty_arguments(arguments).into_iter()),
            ExprKind::Cast {
                type_ref,
                operand,
                coerce,
            } => {
                let head = if *coerce { "as" } else { "cast" };
                format!("({} {} {})", head, type_ref, operand.pretty())
            }
            ExprKind::TypeCheck {
                operand,
                type_ref,
                negated,
            } => {
                let head = if *negated { "!instanceof" } else { "instanceof" };
                format!("({} {} {})", head, operand.pretty(), type_ref)
            }
            ExprKind::Spread(value) => format!("(* {})", value.pretty()),
        }
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

fn list_with(head: String, items: impl Iterator<Item = String>) -> String {
    let mut out = format!("({head}");
    for item in items {
        out.push(' ');
        out.push_str(&item);
    }
    out.push(')');
    out
}

/// Member and method names print bare when they are constant strings.
fn pretty_name(name: &Expression) -> String {
    match name.as_string_constant() {
        Some(text) => text.to_string(),
        None => name.pretty(),
    }
}

fn pretty_literal(literal: &Literal) -> String {
    match literal {
        Literal::Null => "null".to_string(),
        Literal::Bool(value) => value.to_string(),
        Literal::String(value) => format!("{value:?}"),
        Literal::Number(number) => match number {
            Number::Integer(value) => value.to_string(),
            Number::Long(value) => format!("{value}L"),
            Number::BigInteger(digits) => format!("{digits}G"),
            Number::Float(value) => format!("{value}f"),
            Number::Double(value) => format!("{value}d"),
            Number::BigDecimal(text) => text.clone(),
        },
    }
}

fn pretty_entry(entry: &MapEntry) -> String {
    match entry {
        MapEntry::Pair { key, value, .. } => format!("({} {})", key.pretty(), value.pretty()),
        MapEntry::Spread { value, .. } => format!("(*: {})", value.pretty()),
    }
}

fn pretty_arguments(arguments: &Arguments) -> Vec<String> {
    let mut parts = Vec::new();
    if !arguments.named.is_empty() {
        parts.push(list_with(
            "named".to_string(),
            arguments.named.iter().map(pretty_entry),
        ));
    }
    parts.extend(arguments.positional.iter().map(Expression::pretty));
    parts
}

fn pretty_parameter(parameter: &Parameter) -> String {
    let mut out = String::new();
    if let Some(type_ref) = &parameter.type_ref {
        out.push_str(&format!("{type_ref}:"));
    }
    if parameter.var_args {
        out.push_str("...");
    }
    out.push_str(&parameter.name);
    if let Some(default) = &parameter.default {
        out.push('=');
        out.push_str(&default.pretty());
    }
    out
}

fn pretty_tuple(elements: &[TupleElement]) -> String {
    let names = elements
        .iter()
        .map(|element| match &element.type_ref {
            Some(type_ref) => format!("{type_ref}:{}", element.name),
            None => element.name.clone(),
        })
        .collect::<Vec<_>>();
    list_with("tuple".to_string(), names.into_iter())
}
