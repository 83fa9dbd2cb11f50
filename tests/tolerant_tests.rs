//! Tolerant translation: unparsable statements become placeholders plus diagnostics.

mod common;

use common::{as_assign, as_block, tolerant};
use confscript::ast::StatementKind;
use confscript::{translate, translate_into, BuilderOptions, DiagnosticSink, ErrorType, PredictionMode};

fn placeholders(source: &str) -> Vec<String> {
    tolerant(source)
        .module
        .statements
        .iter()
        .filter_map(|statement| match &statement.kind {
            StatementKind::Incomplete(incomplete) => Some(incomplete.text.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn one_bad_fragment_among_valid_statements() {
    let source = "a = 1\nb = 2\nc = )\nd { e = 3 }";
    let translation = tolerant(source);
    assert_eq!(translation.module.statements.len(), 4);
    assert_eq!(translation.diagnostics.len(), 1);
    assert_eq!(translation.diagnostics[0].start_line, 3);
    assert_eq!(translation.mode, PredictionMode::Exhaustive);
    assert_eq!(placeholders(source), vec!["c = )"]);
}

#[test]
fn each_fragment_gets_exactly_one_diagnostic() {
    let source = "a = (\nb = 1\nc = ]\nd = 2\ne = ?";
    let translation = tolerant(source);
    assert_eq!(translation.module.statements.len(), 5);
    assert_eq!(translation.diagnostics.len(), 3);
    let lines: Vec<usize> = translation.diagnostics.iter().map(|d| d.start_line).collect();
    assert_eq!(lines, vec![1, 3, 5]);
}

#[test]
fn dangling_path_is_an_incomplete_statement() {
    let translation = tolerant("process.\ncpus = 2");
    assert_eq!(translation.module.statements.len(), 2);
    assert_eq!(translation.diagnostics.len(), 1);
    assert_eq!(translation.diagnostics[0].message, "Incomplete statement");
    // The unit itself parsed, so no re-parse was needed.
    assert_eq!(translation.mode, PredictionMode::Optimistic);
}

#[test]
fn incomplete_statements_inside_blocks() {
    let translation = tolerant("process {\n    exec\n    cpus = 2\n}");
    let process = as_block(&translation.module.statements[0]);
    assert_eq!(process.statements.len(), 2);
    assert!(matches!(process.statements[0].kind, StatementKind::Incomplete(_)));
    assert_eq!(translation.diagnostics.len(), 1);
}

#[test]
fn broken_braces_are_contained() {
    let source = "a = 1\nb { c = ) }\nd = 4";
    let translation = tolerant(source);
    assert!(placeholders(source).is_empty());
    assert_eq!(translation.module.statements.len(), 3);
    let block = as_block(&translation.module.statements[1]);
    assert!(matches!(
        &block.statements[0].kind,
        StatementKind::Incomplete(incomplete) if incomplete.text == "c = )"
    ));
    assert_eq!(translation.diagnostics.len(), 1);
}

#[test]
fn valid_lines_in_a_broken_block_survive() {
    let translation = tolerant("foo {\n    x = )\n    y = 2\n}");
    assert_eq!(translation.module.statements.len(), 1);
    let foo = as_block(&translation.module.statements[0]);
    assert_eq!(foo.name, "foo");
    assert_eq!(foo.statements.len(), 2);
    assert!(matches!(foo.statements[0].kind, StatementKind::Incomplete(_)));
    assert_eq!(as_assign(&foo.statements[1]).names, vec!["y"]);
    assert_eq!(translation.diagnostics.len(), 1);
    assert_eq!(translation.diagnostics[0].start_line, 2);
}

#[test]
fn selectors_recover_per_assignment() {
    let translation = tolerant("withLabel:big {\n    cpus = ]\n    memory = '8 GB'\n}");
    let selector = as_block(&translation.module.statements[0]);
    assert_eq!(selector.kind.as_deref(), Some("withLabel"));
    assert_eq!(selector.statements.len(), 2);
    assert_eq!(as_assign(&selector.statements[1]).names, vec!["memory"]);
    assert_eq!(translation.diagnostics.len(), 1);
}

#[test]
fn unclosed_brackets_keep_their_continuation_lines() {
    let source = "a = 1\nb = [1,\n2\nc = 3";
    let translation = tolerant(source);
    assert_eq!(translation.module.statements.len(), 3);
    assert_eq!(translation.diagnostics.len(), 1);
    assert_eq!(placeholders(source), vec!["b = [1,\n2"]);
    assert_eq!(as_assign(&translation.module.statements[2]).names, vec!["c"]);
}

#[test]
fn unclosed_parentheses_keep_their_continuation_lines() {
    let source = "a = 1\nb = (1 +\n 2\nc = 3";
    let translation = tolerant(source);
    assert_eq!(translation.module.statements.len(), 3);
    assert_eq!(translation.diagnostics.len(), 1);
    assert_eq!(placeholders(source), vec!["b = (1 +\n 2"]);
}

#[test]
fn bad_numerals_keep_fragment_diagnostics() {
    let sink = DiagnosticSink::new();
    let err = translate_into(
        "unit.config",
        "a = )\nb = 0x\nc = ]",
        BuilderOptions::tolerant(),
        &sink,
    )
    .unwrap_err();
    assert_eq!(err.error_type(), ErrorType::NumericDecode);
    let lines: Vec<usize> = err.diagnostics().iter().map(|d| d.start_line).collect();
    assert_eq!(lines, vec![2, 1, 3]);
    assert_eq!(sink.len(), 3);
}

#[test]
fn lexical_errors_stay_fatal_in_tolerant_mode() {
    let err = translate("a = 1\nb = 'open", BuilderOptions::tolerant()).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Lexical);
}

#[test]
fn structural_errors_stay_fatal_in_tolerant_mode() {
    let err = translate("a = { x, x -> x }\nb = )", BuilderOptions::tolerant()).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Structural);
}

#[test]
fn lowering_keeps_placeholders() {
    let module = tolerant("a = 1\nb = )").module.lower();
    assert_eq!(
        module.pretty(),
        "(call this assign (list \"a\") 1)\n(incomplete \"b = )\")"
    );
}
