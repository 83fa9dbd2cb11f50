//! Operator precedence and the mapping from operator rules to node kinds.

use once_cell::sync::Lazy;
use pest::pratt_parser::{Assoc, Op, PrattParser};

use super::Rule;
use crate::ast::{BinaryOp, UnaryOp};

/// Precedence table, loosest binding first.
pub static PRATT: Lazy<PrattParser<Rule>> = Lazy::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::ternary_op, Assoc::Right) | Op::infix(Rule::elvis_op, Assoc::Right))
        .op(Op::infix(Rule::or_op, Assoc::Left))
        .op(Op::infix(Rule::and_op, Assoc::Left))
        .op(Op::infix(Rule::bit_or_op, Assoc::Left))
        .op(Op::infix(Rule::bit_xor_op, Assoc::Left))
        .op(Op::infix(Rule::bit_and_op, Assoc::Left))
        .op(Op::infix(Rule::eq_op, Assoc::Left)
            | Op::infix(Rule::ne_op, Assoc::Left)
            | Op::infix(Rule::identical_op, Assoc::Left)
            | Op::infix(Rule::not_identical_op, Assoc::Left)
            | Op::infix(Rule::spaceship_op, Assoc::Left)
            | Op::infix(Rule::regex_find_op, Assoc::Left)
            | Op::infix(Rule::regex_match_op, Assoc::Left))
        .op(Op::infix(Rule::lt_op, Assoc::Left)
            | Op::infix(Rule::le_op, Assoc::Left)
            | Op::infix(Rule::gt_op, Assoc::Left)
            | Op::infix(Rule::ge_op, Assoc::Left)
            | Op::infix(Rule::in_op, Assoc::Left)
            | Op::infix(Rule::not_in_op, Assoc::Left)
            | Op::postfix(Rule::as_op)
            | Op::postfix(Rule::instanceof_op)
            | Op::postfix(Rule::not_instanceof_op))
        .op(Op::infix(Rule::range_or_shift, Assoc::Left))
        .op(Op::infix(Rule::add_op, Assoc::Left) | Op::infix(Rule::sub_op, Assoc::Left))
        .op(Op::infix(Rule::mul_op, Assoc::Left)
            | Op::infix(Rule::div_op, Assoc::Left)
            | Op::infix(Rule::mod_op, Assoc::Left))
        .op(Op::prefix(Rule::negative_op) | Op::prefix(Rule::positive_op))
        .op(Op::infix(Rule::power_op, Assoc::Left))
        .op(Op::prefix(Rule::not_op)
            | Op::prefix(Rule::bitwise_not_op)
            | Op::prefix(Rule::cast_op))
});

pub fn binary_op(rule: Rule) -> Option<BinaryOp> {
    let op = match rule {
        Rule::or_op => BinaryOp::Or,
        Rule::and_op => BinaryOp::And,
        Rule::bit_or_op => BinaryOp::BitOr,
        Rule::bit_xor_op => BinaryOp::BitXor,
        Rule::bit_and_op => BinaryOp::BitAnd,
        Rule::eq_op => BinaryOp::Equal,
        Rule::ne_op => BinaryOp::NotEqual,
        Rule::identical_op => BinaryOp::Identical,
        Rule::not_identical_op => BinaryOp::NotIdentical,
        Rule::spaceship_op => BinaryOp::Compare,
        Rule::regex_find_op => BinaryOp::RegexFind,
        Rule::regex_match_op => BinaryOp::RegexMatch,
        Rule::lt_op => BinaryOp::Less,
        Rule::le_op => BinaryOp::LessEqual,
        Rule::gt_op => BinaryOp::Greater,
        Rule::ge_op => BinaryOp::GreaterEqual,
        Rule::in_op => BinaryOp::In,
        Rule::not_in_op => BinaryOp::NotIn,
        Rule::shift_left => BinaryOp::ShiftLeft,
        Rule::shift_right => BinaryOp::ShiftRight,
        Rule::unsigned_shift_right => BinaryOp::UnsignedShiftRight,
        Rule::add_op => BinaryOp::Add,
        Rule::sub_op => BinaryOp::Subtract,
        Rule::mul_op => BinaryOp::Multiply,
        Rule::div_op => BinaryOp::Divide,
        Rule::mod_op => BinaryOp::Modulo,
        Rule::power_op => BinaryOp::Power,
        _ => return None,
    };
    Some(op)
}

pub fn unary_op(rule: Rule) -> Option<UnaryOp> {
    let op = match rule {
        Rule::not_op => UnaryOp::Not,
        Rule::bitwise_not_op => UnaryOp::BitwiseNot,
        Rule::negative_op => UnaryOp::Negative,
        Rule::positive_op => UnaryOp::Positive,
        _ => return None,
    };
    Some(op)
}

/// Range flags `(exclusive_left, exclusive_right)` for a range sub-rule.
pub fn range_bounds(rule: Rule) -> Option<(bool, bool)> {
    match rule {
        Rule::range_inclusive => Some((false, false)),
        Rule::range_exclusive_right => Some((false, true)),
        Rule::range_exclusive_left => Some((true, false)),
        Rule::range_exclusive_both => Some((true, true)),
        _ => None,
    }
}

/// Human names for rules in parser error messages.
pub fn describe(rule: &Rule) -> String {
    let text = match rule {
        Rule::EOI => "end of input",
        Rule::expression
        | Rule::operand
        | Rule::expression_statement
        | Rule::parenthesized
        | Rule::constructor
        | Rule::boolean_literal
        | Rule::null_literal
        | Rule::spread_argument
        | Rule::not_op
        | Rule::bitwise_not_op
        | Rule::negative_op
        | Rule::positive_op
        | Rule::cast_op => "expression",
        Rule::config_assignment => "assignment",
        Rule::config_block | Rule::recovering_block => "block",
        Rule::config_selector | Rule::recovering_selector => "selector",
        Rule::config_include | Rule::kw_include => "include",
        Rule::config_path | Rule::config_incomplete => "config path",
        Rule::identifier | Rule::name | Rule::interpolated_name => "identifier",
        Rule::integer_literal | Rule::float_literal => "number",
        Rule::sq_string | Rule::dq_string | Rule::tsq_string | Rule::tdq_string => "string",
        Rule::slashy_string => "slashy string",
        Rule::arguments => "'('",
        Rule::index_access | Rule::list_literal | Rule::map_literal => "'['",
        Rule::closure | Rule::block_statement => "'{'",
        Rule::member_access | Rule::dot | Rule::safe_dot | Rule::spread_dot => "'.'",
        Rule::assignment_operator => "'='",
        Rule::type_ref | Rule::qualified_name | Rule::declared_type => "type",
        Rule::map_entry | Rule::spread_map_key => "map entry",
        Rule::parameter => "parameter",
        Rule::closure_header => "'->'",
        Rule::statement_probe
        | Rule::compilation_unit
        | Rule::recovering_unit
        | Rule::syntax_error
        | Rule::block_error => "statement",
        Rule::elvis_op
        | Rule::ternary_op
        | Rule::range_or_shift
        | Rule::as_op
        | Rule::instanceof_op
        | Rule::not_instanceof_op => "operator",
        other if binary_op(*other).is_some() || range_bounds(*other).is_some() => "operator",
        _ => {
            let name = format!("{rule:?}");
            return if name.ends_with("_op") {
                "operator".to_string()
            } else if let Some(keyword) = name.strip_prefix("kw_") {
                format!("'{}'", keyword.replace("not_", "!"))
            } else {
                name.replace('_', " ")
            };
        }
    };
    text.to_string()
}
