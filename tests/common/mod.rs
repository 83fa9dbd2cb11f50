//! Shared helpers for the integration tests.
#![allow(dead_code)]

use confscript::ast::{ConfigAssignStatement, ConfigBlockStatement, Module, Statement, StatementKind};
use confscript::{translate, BuilderOptions, ConfigError, Translation};

pub fn strict(source: &str) -> Translation {
    translate(source, BuilderOptions::default())
        .unwrap_or_else(|err| panic!("translation of {source:?} failed: {err:?}"))
}

pub fn tolerant(source: &str) -> Translation {
    translate(source, BuilderOptions::tolerant())
        .unwrap_or_else(|err| panic!("tolerant translation of {source:?} failed: {err:?}"))
}

pub fn strict_err(source: &str) -> ConfigError {
    match translate(source, BuilderOptions::default()) {
        Ok(translation) => panic!("expected {source:?} to fail, got {}", translation.module),
        Err(err) => err,
    }
}

/// S-expression form of a strictly translated module.
pub fn pretty(source: &str) -> String {
    strict(source).module.pretty()
}

pub fn only_statement(module: &Module) -> &Statement {
    assert_eq!(module.statements.len(), 1, "module: {module}");
    &module.statements[0]
}

pub fn as_assign(statement: &Statement) -> &ConfigAssignStatement {
    match &statement.kind {
        StatementKind::ConfigAssign(assign) => assign,
        other => panic!("expected a config assignment, got {other:?}"),
    }
}

pub fn as_block(statement: &Statement) -> &ConfigBlockStatement {
    match &statement.kind {
        StatementKind::ConfigBlock(block) => block,
        other => panic!("expected a config block, got {other:?}"),
    }
}
