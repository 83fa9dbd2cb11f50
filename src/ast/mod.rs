//! AST module for the Confscript language
//!
//! This module provides the node types produced by the tree walker: an ordered
//! [`Module`] of [`Statement`]s, each built from the parse pairs it covers and
//! carrying the byte span of that origin text.

// ============================================================================
// IMPORTS
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod ops;
pub mod pretty;

pub use config::{
    ConfigAssignStatement, ConfigBlockStatement, IncludeStatement, IncompleteStatement,
};
pub use ops::{AssignOp, BinaryOp, UnaryOp};

// ============================================================================
// SPANS
// ============================================================================

/// Represents a span in the source code as byte offsets.
///
/// # Examples
///
/// ```rust
/// use confscript::ast::Span;
/// let span = Span::new(2, 7).cover(Span::new(0, 3));
/// assert_eq!(span, Span { start: 0, end: 7 });
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span containing both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<pest::Span<'_>> for Span {
    fn from(span: pest::Span<'_>) -> Self {
        Span {
            start: span.start(),
            end: span.end(),
        }
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.len()).into()
    }
}

/// Wrapper for carrying source span information with any value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}

// ============================================================================
// MODULE AND STATEMENTS
// ============================================================================

/// The translation of one source unit: its top-level statements in source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Module {
    /// Replaces every config statement with its protocol invocation.
    pub fn lower(&self) -> Module {
        Module {
            statements: self.statements.iter().map(Statement::lower).collect(),
            span: self.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

impl Statement {
    pub fn new(kind: StatementKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    Include(IncludeStatement),
    ConfigAssign(ConfigAssignStatement),
    ConfigBlock(ConfigBlockStatement),
    Incomplete(IncompleteStatement),
    Expression(Expression),
    Assign {
        target: AssignTarget,
        op: AssignOp,
        value: Expression,
    },
    Declaration {
        type_ref: Option<TypeRef>,
        target: DeclarationTarget,
        value: Option<Expression>,
    },
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    Block(Vec<Statement>),
    Return(Option<Expression>),
    Assert {
        condition: Expression,
        message: Option<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignTarget {
    Single(Expression),
    /// Destructuring: `(a, b) = ...` or the single-element `(a) = ...`.
    Tuple(Vec<TupleElement>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclarationTarget {
    Name(Spanned<String>),
    Tuple(Vec<TupleElement>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleElement {
    pub name: String,
    pub type_ref: Option<TypeRef>,
    pub span: Span,
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExprKind,
    pub span: Span,
    /// Number of redundant parentheses wrapped around this expression.
    pub grouping_depth: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Identifier(String),
    Constant(Literal),
    /// Interpolated string; `strings` has exactly one more entry than `values`.
    GString {
        strings: Vec<Spanned<String>>,
        values: Vec<Expression>,
    },
    List {
        elements: Vec<Expression>,
        /// Set for index lists written with several comma-separated indices.
        wrapped: bool,
    },
    Map(Vec<MapEntry>),
    Range {
        from: Box<Expression>,
        to: Box<Expression>,
        exclusive_left: bool,
        exclusive_right: bool,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Ternary {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Box<Expression>,
    },
    Elvis {
        value: Box<Expression>,
        fallback: Box<Expression>,
    },
    Property {
        object: Box<Expression>,
        property: Box<Expression>,
        safe: bool,
        spread_safe: bool,
    },
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },
    MethodCall {
        object: Box<Expression>,
        method: Box<Expression>,
        arguments: Arguments,
        implicit_this: bool,
        safe: bool,
        spread_safe: bool,
    },
    Closure {
        /// `None` when the closure has no `->` header.
        parameters: Option<Vec<Parameter>>,
        body: Vec<Statement>,
    },
    Constructor {
        type_ref: TypeRef,
        arguments: Arguments,
    },
    Cast {
        type_ref: TypeRef,
        operand: Box<Expression>,
        /// `expr as T` rather than `(T) expr`.
        coerce: bool,
    },
    TypeCheck {
        operand: Box<Expression>,
        type_ref: TypeRef,
        negated: bool,
    },
    Spread(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

/// A decoded numeral. Big values keep their canonical decimal text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Number {
    Integer(i32),
    Long(i64),
    BigInteger(String),
    Float(f32),
    Double(f64),
    BigDecimal(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapEntry {
    Pair {
        key: Expression,
        value: Expression,
        span: Span,
    },
    /// `*: expr`
    Spread { value: Expression, span: Span },
}

impl MapEntry {
    pub fn span(&self) -> Span {
        match self {
            MapEntry::Pair { span, .. } | MapEntry::Spread { span, .. } => *span,
        }
    }
}

/// Call arguments: positional values (a trailing closure included) plus named entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Arguments {
    pub positional: Vec<Expression>,
    pub named: Vec<MapEntry>,
    pub span: Span,
}

impl Arguments {
    pub fn positional(values: Vec<Expression>, span: Span) -> Self {
        Self {
            positional: values,
            named: Vec::new(),
            span,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_ref: Option<TypeRef>,
    pub default: Option<Expression>,
    pub var_args: bool,
    pub span: Span,
}

/// A type reference such as `java.util.List<String>[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    /// `None` for the `?` wildcard inside generic arguments.
    pub generics: Vec<Option<TypeRef>>,
    pub array_dims: usize,
    pub span: Span,
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.generics.is_empty() {
            f.write_str("<")?;
            for (i, generic) in self.generics.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                match generic {
                    Some(type_ref) => write!(f, "{type_ref}")?,
                    None => f.write_str("?")?,
                }
            }
            f.write_str(">")?;
        }
        for _ in 0..self.array_dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

// ============================================================================
// CONSTRUCTION HELPERS
// ============================================================================

impl Expression {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            grouping_depth: 0,
        }
    }

    pub fn identifier(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Identifier(name.into()), span)
    }

    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Constant(Literal::String(value.into())), span)
    }

    pub fn null(span: Span) -> Self {
        Self::new(ExprKind::Constant(Literal::Null), span)
    }

    /// Implicit-receiver call, e.g. `assign(...)` against the runtime's `this`.
    pub fn implicit_call(name: &str, arguments: Arguments, span: Span) -> Self {
        Self::new(
            ExprKind::MethodCall {
                object: Box::new(Self::identifier("this", span)),
                method: Box::new(Self::string(name, span)),
                arguments,
                implicit_this: true,
                safe: false,
                spread_safe: false,
            },
            span,
        )
    }

    pub fn as_string_constant(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Constant(Literal::String(value)) => Some(value),
            _ => None,
        }
    }

    pub fn is_grouped(&self) -> bool {
        self.grouping_depth > 0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}
