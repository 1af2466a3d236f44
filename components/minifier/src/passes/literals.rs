//! Literal evaluation
//!
//! Folds operators applied to constants when the folded literal is exact and
//! no longer than the expression it replaces, combines adjacent string
//! literals, normalizes BigInt literals, and finally rewrites `true`/`false`
//! as `!0`/`!1`. Replacement literals that resolved to nothing are never
//! folded.

use num_bigint::BigUint;
use num_traits::Num;
use parser::ast::{BinaryOp, Literal, UnaryOp};
use parser::{Ast, CodeSettings, NodeId, NodeKind, TreeModifications};
use tracing::trace;

use crate::text::format_number;

/// Folds constant expressions below `root`, bottom-up.
pub fn run(ast: &mut Ast, settings: &CodeSettings, root: NodeId) -> usize {
    let allowed = |m: TreeModifications| settings.is_modification_allowed(m);
    let mut changes = 0;

    let mut nodes = ast.descendants(root);
    nodes.reverse();
    for id in nodes {
        let folded = match ast.kind(id) {
            NodeKind::Unary { op, operand } if settings.eval_literal_expressions => {
                fold_unary(ast, *op, *operand, &allowed)
            }
            NodeKind::Binary { op, left, right } if settings.eval_literal_expressions => {
                fold_binary(ast, *op, *left, *right, &allowed)
            }
            NodeKind::BigInt { digits } if allowed(TreeModifications::MINIFY_NUMERIC_LITERALS) => {
                normalize_bigint(digits).map(|digits| NodeKind::BigInt { digits })
            }
            _ => None,
        };
        if let Some(kind) = folded {
            trace!(node = id.0, "folded literal expression");
            ast.set_kind(id, kind);
            changes += 1;
        } else if settings.eval_literal_expressions
            && allowed(TreeModifications::COMBINE_ADJACENT_STRING_LITERALS)
            && merge_string_tail(ast, id)
        {
            changes += 1;
        }
    }

    if allowed(TreeModifications::BOOLEAN_LITERALS_TO_NOT_OPERATORS) {
        changes += booleans_to_not(ast, root);
    }
    changes
}

fn constant(ast: &Ast, id: NodeId) -> Option<&Literal> {
    match ast.kind(ast.unwrap_grouping(id)) {
        NodeKind::Constant(literal) => Some(literal),
        _ => None,
    }
}

fn number(ast: &Ast, id: NodeId) -> Option<f64> {
    match constant(ast, id) {
        Some(Literal::Number(n)) => Some(*n),
        _ => None,
    }
}

fn fold_unary(
    ast: &Ast,
    op: UnaryOp,
    operand: NodeId,
    allowed: &impl Fn(TreeModifications) -> bool,
) -> Option<NodeKind> {
    match (op, constant(ast, operand)?) {
        (UnaryOp::Minus, Literal::Number(n))
            if allowed(TreeModifications::APPLY_UNARY_MINUS_TO_NUMERIC_LITERAL) =>
        {
            Some(NodeKind::Constant(Literal::Number(-n)))
        }
        (UnaryOp::Plus, Literal::Number(n))
            if allowed(TreeModifications::REMOVE_UNARY_PLUS_ON_NUMERIC_LITERAL) =>
        {
            Some(NodeKind::Constant(Literal::Number(*n)))
        }
        (UnaryOp::Not, Literal::Boolean(b)) => Some(NodeKind::Constant(Literal::Boolean(!b))),
        _ => None,
    }
}

fn fold_binary(
    ast: &Ast,
    op: BinaryOp,
    left: NodeId,
    right: NodeId,
    allowed: &impl Fn(TreeModifications) -> bool,
) -> Option<NodeKind> {
    if let (Some(a), Some(b)) = (number(ast, left), number(ast, right)) {
        if !allowed(TreeModifications::EVALUATE_NUMERIC_EXPRESSIONS) {
            return None;
        }
        let value = numeric_result(op, a, b)?;
        let folded_len = match &value {
            Literal::Number(n) => format_number(*n).len(),
            _ => 2,
        };
        let original_len = format_number(a).len() + op.as_str().len() + format_number(b).len();
        return (folded_len <= original_len).then_some(NodeKind::Constant(value));
    }

    if op != BinaryOp::Add || !allowed(TreeModifications::COMBINE_ADJACENT_STRING_LITERALS) {
        return None;
    }
    let Some(Literal::String(tail)) = constant(ast, right) else {
        return None;
    };
    match constant(ast, left) {
        Some(Literal::String(head)) => Some(NodeKind::Constant(Literal::String(format!("{}{}", head, tail)))),
        _ => None,
    }
}

/// `(x + "a") + "b"` to `x + "ab"`.
fn merge_string_tail(ast: &mut Ast, id: NodeId) -> bool {
    let NodeKind::Binary {
        op: BinaryOp::Add,
        left,
        right,
    } = ast.kind(id)
    else {
        return false;
    };
    let Some(Literal::String(tail)) = constant(ast, *right) else {
        return false;
    };
    let NodeKind::Binary {
        op: BinaryOp::Add,
        left: inner_left,
        right: inner_right,
    } = ast.kind(ast.unwrap_grouping(*left))
    else {
        return false;
    };
    let Some(Literal::String(middle)) = constant(ast, *inner_right) else {
        return false;
    };
    let merged = format!("{}{}", middle, tail);
    let (inner_left, inner_right) = (*inner_left, *inner_right);
    ast.set_kind(inner_right, NodeKind::Constant(Literal::String(merged)));
    ast.set_kind(id, NodeKind::Binary {
        op: BinaryOp::Add,
        left: inner_left,
        right: inner_right,
    });
    true
}

fn numeric_result(op: BinaryOp, a: f64, b: f64) -> Option<Literal> {
    let number = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        BinaryOp::BitAnd => (to_int32(a) & to_int32(b)) as f64,
        BinaryOp::BitOr => (to_int32(a) | to_int32(b)) as f64,
        BinaryOp::BitXor => (to_int32(a) ^ to_int32(b)) as f64,
        BinaryOp::LeftShift => to_int32(a).wrapping_shl(to_uint32(b) & 31) as f64,
        BinaryOp::RightShift => (to_int32(a) >> (to_uint32(b) & 31)) as f64,
        BinaryOp::UnsignedRightShift => (to_uint32(a) >> (to_uint32(b) & 31)) as f64,
        BinaryOp::Lt => return Some(Literal::Boolean(a < b)),
        BinaryOp::LtEq => return Some(Literal::Boolean(a <= b)),
        BinaryOp::Gt => return Some(Literal::Boolean(a > b)),
        BinaryOp::GtEq => return Some(Literal::Boolean(a >= b)),
        BinaryOp::Eq | BinaryOp::StrictEq => return Some(Literal::Boolean(a == b)),
        BinaryOp::NotEq | BinaryOp::StrictNotEq => return Some(Literal::Boolean(a != b)),
        _ => return None,
    };
    number.is_finite().then_some(Literal::Number(number))
}

fn to_uint32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(4_294_967_296.0) as u32
}

fn to_int32(value: f64) -> i32 {
    to_uint32(value) as i32
}

/// Drops numeric separators and rewrites radix-prefixed BigInt digits in
/// decimal when that is shorter.
fn normalize_bigint(digits: &str) -> Option<String> {
    let plain: String = digits.chars().filter(|c| *c != '_').collect();
    let lower = plain.to_ascii_lowercase();
    let radix = match lower.get(..2) {
        Some("0x") => 16,
        Some("0o") => 8,
        Some("0b") => 2,
        _ => 10,
    };
    let best = if radix == 10 {
        plain
    } else {
        match BigUint::from_str_radix(&lower[2..], radix) {
            Ok(value) => {
                let decimal = value.to_str_radix(10);
                if decimal.len() < plain.len() {
                    decimal
                } else {
                    plain
                }
            }
            Err(_) => plain,
        }
    };
    (best != digits).then_some(best)
}

fn booleans_to_not(ast: &mut Ast, root: NodeId) -> usize {
    let mut changes = 0;
    for id in ast.descendants(root) {
        let NodeKind::Constant(Literal::Boolean(value)) = ast.kind(id) else {
            continue;
        };
        let digit = if *value { 0.0 } else { 1.0 };
        let context = ast.context(id);
        let operand = ast.alloc(NodeKind::Constant(Literal::Number(digit)), context);
        ast.set_kind(id, NodeKind::Unary {
            op: UnaryOp::Not,
            operand,
        });
        changes += 1;
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::parse;

    fn fold(source: &str) -> (parser::Parsed, usize) {
        let settings = CodeSettings::default();
        let mut parsed = parse(source, &settings);
        let changes = run(&mut parsed.ast, &settings, parsed.root);
        (parsed, changes)
    }

    fn first(parsed: &parser::Parsed) -> &NodeKind {
        parsed.ast.kind(parsed.ast.statements(parsed.root)[0])
    }

    #[test]
    fn test_numeric_folding() {
        let (parsed, _) = fold("(1 + 2) * 3;");
        assert_eq!(first(&parsed), &NodeKind::Constant(Literal::Number(9.0)));
    }

    #[test]
    fn test_longer_result_not_folded() {
        let (parsed, changes) = fold("1 / 3;");
        assert_eq!(changes, 0);
        assert!(matches!(first(&parsed), NodeKind::Binary { .. }));
    }

    #[test]
    fn test_string_concatenation() {
        let (parsed, _) = fold("'a' + 'b' + 'c';");
        assert_eq!(first(&parsed), &NodeKind::Constant(Literal::String("abc".to_string())));
    }

    #[test]
    fn test_string_tail_merged_after_expression() {
        let (parsed, _) = fold("x + 'a' + 'b';");
        let NodeKind::Binary { right, .. } = first(&parsed) else {
            panic!("expected addition");
        };
        assert_eq!(parsed.ast.kind(*right), &NodeKind::Constant(Literal::String("ab".to_string())));
        assert!(parsed.ast.check_parent_links(parsed.root));
    }

    #[test]
    fn test_unary_minus_applied() {
        let (parsed, _) = fold("-(5);");
        assert_eq!(first(&parsed), &NodeKind::Constant(Literal::Number(-5.0)));
    }

    #[test]
    fn test_booleans_become_not_operators() {
        let (parsed, _) = fold("x = true;");
        let NodeKind::Binary { right, .. } = first(&parsed) else {
            panic!("expected assignment");
        };
        assert!(matches!(
            parsed.ast.kind(*right),
            NodeKind::Unary {
                op: UnaryOp::Not,
                ..
            }
        ));
    }

    #[test]
    fn test_comparison_folds_to_boolean() {
        let (parsed, _) = fold("x = 1 < 2;");
        let NodeKind::Binary { right, .. } = first(&parsed) else {
            panic!("expected assignment");
        };
        let NodeKind::Unary { operand, .. } = parsed.ast.kind(*right) else {
            panic!("expected !0");
        };
        assert_eq!(parsed.ast.kind(*operand), &NodeKind::Constant(Literal::Number(0.0)));
    }

    #[test]
    fn test_bigint_normalized() {
        assert_eq!(normalize_bigint("0xFFFFFFFFFF"), None);
        assert_eq!(normalize_bigint("0x10"), Some("16".to_string()));
        assert_eq!(normalize_bigint("0b1111"), Some("15".to_string()));
        assert_eq!(normalize_bigint("1_000"), Some("1000".to_string()));
        assert_eq!(normalize_bigint("42"), None);
    }

    #[test]
    fn test_fold_is_idempotent() {
        let settings = CodeSettings::default();
        let mut parsed = parse("x = 2 * 3 + 'px'; y = false;", &settings);
        assert!(run(&mut parsed.ast, &settings, parsed.root) > 0);
        assert_eq!(run(&mut parsed.ast, &settings, parsed.root), 0);
    }

    #[test]
    fn test_int32_conversion() {
        assert_eq!(to_int32(4_294_967_295.0), -1);
        assert_eq!(to_uint32(-1.0), 4_294_967_295);
        assert_eq!(to_int32(f64::NAN), 0);
    }
}
