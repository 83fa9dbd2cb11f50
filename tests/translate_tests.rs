mod common;

use common::{as_assign, as_block, only_statement, pretty, strict, strict_err};
use confscript::ast::{ExprKind, Literal, Number, StatementKind};
use confscript::{translate, BuilderOptions, ErrorType, PredictionMode, Span};

// ============================================================================
// WORKED EXAMPLES
// ============================================================================

#[test]
fn dotted_assignment() {
    let translation = strict("params.foo = 1");
    let assign = as_assign(only_statement(&translation.module));
    assert_eq!(assign.names, vec!["params", "foo"]);
    assert_eq!(
        assign.value.kind,
        ExprKind::Constant(Literal::Number(Number::Integer(1)))
    );
    let path: Vec<_> = assign
        .path
        .iter()
        .map(|segment| segment.as_string_constant().unwrap())
        .collect();
    assert_eq!(path, vec!["params", "foo"]);
}

#[test]
fn nested_blocks() {
    let translation = strict("profiles { standard { cpus = 2 } }");
    let profiles = as_block(only_statement(&translation.module));
    assert_eq!(profiles.name, "profiles");
    assert_eq!(profiles.kind, None);
    let standard = as_block(&profiles.statements[0]);
    assert_eq!(standard.name, "standard");
    let cpus = as_assign(&standard.statements[0]);
    assert_eq!(cpus.names, vec!["cpus"]);
    assert_eq!(
        cpus.value.kind,
        ExprKind::Constant(Literal::Number(Number::Integer(2)))
    );
}

#[test]
fn selector_block() {
    let translation = strict("withLabel:'big_mem' { memory = '8 GB' }");
    let selector = as_block(only_statement(&translation.module));
    assert_eq!(selector.kind.as_deref(), Some("withLabel"));
    assert_eq!(selector.name, "big_mem");
    assert!(selector.is_selector());
    let memory = as_assign(&selector.statements[0]);
    assert_eq!(memory.value.as_string_constant(), Some("8 GB"));
}

#[test]
fn include_statement() {
    let translation = strict("includeConfig \"base.conf\"");
    match &only_statement(&translation.module).kind {
        StatementKind::Include(include) => {
            assert_eq!(include.source.as_string_constant(), Some("base.conf"))
        }
        other => panic!("expected include, got {other:?}"),
    }
}

#[test]
fn numeral_without_digits_fails_after_the_build() {
    let err = strict_err("a = 1\nb = 0x\nc = 'still built'");
    assert_eq!(err.error_type(), ErrorType::NumericDecode);
    assert_eq!(err.diagnostics().len(), 1);
    assert_eq!(err.diagnostics()[0].span, Span::new(10, 12));
    assert_eq!(err.diagnostics()[0].start_line, 2);
    assert!(err.message().contains("no digits"));
}

#[test]
fn structural_errors_are_not_deferred_behind_numeric_ones() {
    let err = strict_err("a = 0x\nb = { x, x -> x }");
    assert_eq!(err.error_type(), ErrorType::Structural);
    assert_eq!(err.message(), "Duplicated parameter 'x' found");
}

#[test]
fn only_the_first_bad_numeral_is_reported() {
    let err = strict_err("a = 0x\nb = 99999999999999999999i");
    assert_eq!(err.diagnostics()[0].start_line, 1);
}

// ============================================================================
// CONFIG STATEMENTS
// ============================================================================

#[test]
fn quoted_config_names() {
    assert_eq!(pretty("'my-key'.\"sub\" = 1"), "(assign (my-key sub) 1)");
    assert_eq!(pretty("\"odd name\" { a = 1 }"), "(block odd name (assign (a) 1))");
}

#[test]
fn interpolated_config_name_is_rejected() {
    let err = strict_err("\"$x\" { a = 1 }");
    assert_eq!(err.error_type(), ErrorType::Structural);
}

#[test]
fn selector_body_is_assignment_only() {
    let err = strict_err("withName:foo { inner { a = 1 } }");
    assert_eq!(err.error_type(), ErrorType::Structural);
    assert_eq!(err.message(), "Only assignments are allowed inside a selector block");

    let err = strict_err("withName:foo { withLabel:bar { a = 1 } }");
    assert_eq!(err.error_type(), ErrorType::Structural);
}

#[test]
fn selectors_may_sit_inside_blocks() {
    assert_eq!(
        pretty("process { withLabel:big { cpus = 8 } }"),
        "(block process (select withLabel big (assign (cpus) 8)))"
    );
}

#[test]
fn statements_split_on_semicolons_and_newlines() {
    assert_eq!(pretty("a = 1; b = 2\n\nc = 3;"), "(assign (a) 1)\n(assign (b) 2)\n(assign (c) 3)");
}

#[test]
fn comments_and_shebang_are_ignored() {
    let source = "#!/usr/bin/env confscript\n// note\na = 1 /* inline */\n/* multi\nline */ b = 2";
    assert_eq!(pretty(source), "(assign (a) 1)\n(assign (b) 2)");
}

#[test]
fn values_may_start_on_the_next_line() {
    assert_eq!(pretty("a =\n    1"), "(assign (a) 1)");
}

#[test]
fn empty_module() {
    assert!(strict("\n\n// nothing\n").module.statements.is_empty());
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[test]
fn closures_in_config_values() {
    assert_eq!(
        pretty("memory = { 4.GB * task.attempt }"),
        "(assign (memory) (closure (* (. 4 GB) (. task attempt))))"
    );
}

#[test]
fn call_shape_is_a_function_of_the_receiver() {
    assert_eq!(pretty("a = foo(1)"), "(assign (a) (call this foo 1))");
    assert_eq!(pretty("a = x.foo(1)"), "(assign (a) (call x foo 1))");
    assert_eq!(pretty("a = x?.foo()"), "(assign (a) (safe-call x foo))");
    assert_eq!(pretty("a = x*.foo()"), "(assign (a) (spread-call x foo))");
    assert_eq!(pretty("a = (foo)(1)"), "(assign (a) (call foo call 1))");
    assert_eq!(pretty("a = (x.foo)(1)"), "(assign (a) (call (. x foo) call 1))");
    assert_eq!(pretty("a = [1][0](2)"), "(assign (a) (call (index (list 1) 0) call 2))");
}

#[test]
fn call_shape_ignores_surrounding_context() {
    let inner = "(call this foo 1)";
    assert_eq!(pretty("a = foo(1)"), format!("(assign (a) {inner})"));
    assert_eq!(pretty("a = [foo(1)]"), format!("(assign (a) (list {inner}))"));
    assert_eq!(pretty("a = 2 + foo(1)"), format!("(assign (a) (+ 2 {inner}))"));
    assert_eq!(
        pretty("a = { foo(1) }"),
        format!("(assign (a) (closure {inner}))")
    );
}

#[test]
fn trailing_closures() {
    assert_eq!(
        pretty("a = list.each { it }"),
        "(assign (a) (call list each (closure it)))"
    );
    assert_eq!(
        pretty("a = list.inject(0) { acc, v -> acc + v }"),
        "(assign (a) (call list inject 0 (closure (acc v) (+ acc v))))"
    );
}

#[test]
fn index_and_map_rules() {
    assert_eq!(pretty("a = m[1, 2]"), "(assign (a) (index m (indices 1 2)))");
    assert_eq!(pretty("a = m[*r]"), "(assign (a) (index m (list (* r))))");
    assert_eq!(pretty("a = m['k']"), "(assign (a) (index m \"k\"))");
    assert_eq!(
        pretty("a = [name: 1, (dyn): 2, *: rest]"),
        "(assign (a) (map (\"name\" 1) (dyn 2) (*: rest)))"
    );
}

#[test]
fn numerals() {
    assert_eq!(pretty("a = 2147483647"), "(assign (a) 2147483647)");
    assert_eq!(pretty("a = 2147483648"), "(assign (a) 2147483648L)");
    assert_eq!(pretty("a = -2147483648"), "(assign (a) -2147483648)");
    assert_eq!(pretty("a = 0xFF"), "(assign (a) 255)");
    assert_eq!(pretty("a = 0b1010"), "(assign (a) 10)");
    assert_eq!(pretty("a = 017"), "(assign (a) 15)");
    assert_eq!(pretty("a = 1_000"), "(assign (a) 1000)");
    assert_eq!(pretty("a = 1.50"), "(assign (a) 1.50)");
    assert_eq!(pretty("a = 2.5f"), "(assign (a) 2.5f)");
    assert_eq!(pretty("a = 10G"), "(assign (a) 10G)");
}

#[test]
fn interpolated_strings() {
    assert_eq!(
        pretty("a = \"$baseDir/data\""),
        "(assign (a) (gstring \"\" baseDir \"/data\"))"
    );
    assert_eq!(
        pretty("a = \"x=${x + 1}!\""),
        "(assign (a) (gstring \"x=\" (+ x 1) \"!\"))"
    );
    assert_eq!(
        pretty("a = \"\"\"\n${a.b}\"\"\""),
        "(assign (a) (gstring \"\\n\" (. a b) \"\"))"
    );
}

#[test]
fn gstring_has_one_more_segment_than_values() {
    let translation = strict("a = \"${x}${y}\"");
    let assign = as_assign(only_statement(&translation.module));
    let ExprKind::GString { strings, values } = &assign.value.kind else {
        panic!("expected gstring");
    };
    assert_eq!(values.len(), 2);
    assert_eq!(strings.len(), 3);
    assert!(strings.iter().all(|segment| segment.value.is_empty()));
}

#[test]
fn multiline_strings_normalise_carriage_returns() {
    let translation = strict("a = '''one\r\ntwo'''");
    let assign = as_assign(only_statement(&translation.module));
    assert_eq!(assign.value.as_string_constant(), Some("one\ntwo"));
}

// ============================================================================
// CLOSURE STATEMENTS
// ============================================================================

#[test]
fn closure_statements() {
    let source = "a = {\n  def x = 1\n  int y\n  x += 2\n  if (x > y) { return x } else return y\n  assert x : 'msg'\n}";
    assert_eq!(
        pretty(source),
        "(assign (a) (closure (def x 1) (def int y) (+= x 2) (if (> x y) (do (return x)) (return y)) (assert x \"msg\")))"
    );
}

#[test]
fn command_expressions() {
    assert_eq!(
        pretty("a = { println 'hi' }"),
        "(assign (a) (closure (call this println \"hi\")))"
    );
    assert_eq!(
        pretty("a = { log.info 'x', level: 2 }"),
        "(assign (a) (closure (call log info (named (\"level\" 2)) \"x\")))"
    );
}

#[test]
fn destructuring() {
    assert_eq!(
        pretty("a = { def (x, String y) = pair }"),
        "(assign (a) (closure (def (tuple x String:y) pair)))"
    );
    assert_eq!(pretty("a = { (x, y) = pair }"), "(assign (a) (closure (= (tuple x y) pair)))");
    assert_eq!(pretty("a = { (x) = pair }"), "(assign (a) (closure (= (tuple x) pair)))");
}

#[test]
fn destructuring_violations() {
    let err = strict_err("a = { ((x)) = pair }");
    assert_eq!(err.error_type(), ErrorType::Structural);
    assert!(err.message().starts_with("Nested parenthesis is not allowed"));

    let err = strict_err("a = { (x, y) += pair }");
    assert_eq!(err.error_type(), ErrorType::Structural);

    let err = strict_err("a = { def (x, x) = pair }");
    assert_eq!(err.error_type(), ErrorType::Structural);

    let err = strict_err("a = { foo() = 1 }");
    assert_eq!(err.error_type(), ErrorType::Structural);
}

#[test]
fn parameter_validation() {
    let err = strict_err("a = { String... rest, x -> x }");
    assert_eq!(err.message(), "The var-arg parameter 'rest' must be the last parameter");
    assert_eq!(
        pretty("a = { x, String... rest -> x }"),
        "(assign (a) (closure (x String:...rest) x))"
    );
}

// ============================================================================
// SPANS, LOWERING AND DETERMINISM
// ============================================================================

#[test]
fn spans_cover_their_origin_text() {
    let source = "params.foo = bar.baz(1, 2)";
    let translation = strict(source);
    let statement = only_statement(&translation.module);
    assert_eq!(statement.span, Span::new(0, source.len()));
    let assign = as_assign(statement);
    assert_eq!(&source[assign.path[1].span.start..assign.path[1].span.end], "foo");
    assert_eq!(
        &source[assign.value.span.start..assign.value.span.end],
        "bar.baz(1, 2)"
    );
    let ExprKind::MethodCall {
        object, arguments, ..
    } = &assign.value.kind
    else {
        panic!("expected call");
    };
    assert_eq!(&source[object.span.start..object.span.end], "bar");
    assert_eq!(&source[arguments.span.start..arguments.span.end], "(1, 2)");
}

#[test]
fn lowering_targets_protocol_verbs() {
    let module = strict("includeConfig 'a.conf'\np.q = 1\nb { withLabel:x { c = 2 } }").module;
    assert_eq!(
        module.lower().pretty(),
        [
            "(call this includeConfig \"a.conf\")",
            "(call this assign (list \"p\" \"q\") 1)",
            "(call this block \"b\" (closure () (call this withLabel \"x\" (closure () (call this assign (list \"c\") 2)))))",
        ]
        .join("\n")
    );
}

#[test]
fn translation_is_deterministic_across_modes() {
    let source = "a = 1\nb = [x: 2]\nc { d = \"$e\" }";
    let first = strict(source);
    let second = strict(source);
    assert_eq!(first.module, second.module);
    assert_eq!(first.mode, PredictionMode::Optimistic);

    // A broken statement forces the exhaustive path; the intact statements match.
    let recovered = translate(&format!("{source}\nz = )"), BuilderOptions::tolerant()).unwrap();
    assert_eq!(recovered.mode, PredictionMode::Exhaustive);
    assert_eq!(recovered.module.statements[..3], first.module.statements[..]);
}

#[test]
fn ast_serialises_to_json() {
    let module = strict("a.b = [1, 'x']").module;
    let json = serde_json::to_value(&module).unwrap();
    assert!(json.to_string().contains("\"names\":[\"a\",\"b\"]"));
}
