//! Property tests for string quoting.

use confscript::syntax::literal::{escape, unescape, QuoteStyle};
use confscript::{translate, BuilderOptions};
use proptest::prelude::*;

fn any_style() -> impl Strategy<Value = QuoteStyle> {
    prop_oneof![
        Just(QuoteStyle::Single),
        Just(QuoteStyle::Double),
        Just(QuoteStyle::TripleSingle),
        Just(QuoteStyle::TripleDouble),
        Just(QuoteStyle::Slashy),
    ]
}

fn quoted(value: &str, style: QuoteStyle) -> String {
    let body = escape(value, style);
    match style {
        QuoteStyle::Single => format!("'{body}'"),
        QuoteStyle::Double => format!("\"{body}\""),
        QuoteStyle::TripleSingle => format!("'''{body}'''"),
        QuoteStyle::TripleDouble => format!("\"\"\"{body}\"\"\""),
        QuoteStyle::Slashy => format!("/{body}/"),
    }
}

proptest! {
    #[test]
    fn unescape_inverts_escape(value in "\\PC*", style in any_style()) {
        prop_assert_eq!(unescape(&escape(&value, style), style), value);
    }

    #[test]
    fn unescape_inverts_escape_with_control_characters(
        value in "[a-z\\\\'\"$/\n\r\t\u{8}\u{c}]{0,24}",
        style in any_style(),
    ) {
        prop_assert_eq!(unescape(&escape(&value, style), style), value);
    }

    #[test]
    fn quoted_literals_translate_back_to_their_value(
        value in "[ -~\t\n]{0,24}",
        style in prop_oneof![
            Just(QuoteStyle::Single),
            Just(QuoteStyle::Double),
            Just(QuoteStyle::TripleSingle),
            Just(QuoteStyle::TripleDouble),
        ],
    ) {
        let source = format!("a = {}", quoted(&value, style));
        let translation = translate(&source, BuilderOptions::default())
            .map_err(|err| TestCaseError::fail(format!("{source:?}: {err}")))?;
        let statement = &translation.module.statements[0];
        let confscript::ast::StatementKind::ConfigAssign(assign) = &statement.kind else {
            return Err(TestCaseError::fail("expected a config assignment"));
        };
        prop_assert_eq!(assign.value.as_string_constant(), Some(value.as_str()));
    }
}
