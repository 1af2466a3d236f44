//! Tree transforms
//!
//! Each pass is a function over the arena that rewrites nodes in place and
//! returns how many rewrites it made. Passes are gated by
//! [`TreeModifications`] bits, never look at source text, and reach a fixed
//! point after one run: running a pass over its own output changes nothing.
//!
//! Passes that remove statements never touch conditional-compilation
//! comments; their contents only run under engines that honor them.

pub mod combine;
pub mod dead_code;
pub mod debug;
pub mod literals;
pub mod rewrite;

use parser::ast::{FunctionKind, Literal, UnaryOp};
use parser::{Ast, CodeSettings, NodeId, NodeKind, ScopeTree, TreeModifications};
use tracing::{debug, debug_span};

/// Runs every enabled pass, in pipeline order, over the given chunk roots.
pub fn run_all(ast: &mut Ast, scopes: &ScopeTree, settings: &CodeSettings, roots: &[NodeId]) -> usize {
    let mut total = 0;
    for &root in roots {
        let _span = debug_span!("passes", root = root.0).entered();
        if settings.strip_debug_statements
            && settings.is_modification_allowed(TreeModifications::STRIP_DEBUG_STATEMENTS)
        {
            total += counted("strip_debug", debug::run(ast, settings, root));
        }
        total += counted("literals", literals::run(ast, settings, root));
        total += counted("rewrite", rewrite::run(ast, scopes, settings, root));
        if settings.remove_unneeded_code {
            total += counted("dead_code", dead_code::run(ast, scopes, settings, root));
        }
        total += counted("combine", combine::run(ast, settings, root));
    }
    total
}

fn counted(pass: &str, changes: usize) -> usize {
    debug!(pass, changes, "pass finished");
    changes
}

/// Whether `id` is still reachable from `root` through parent links.
pub(crate) fn is_live(ast: &Ast, id: NodeId, root: NodeId) -> bool {
    id == root || ast.ancestors(id).any(|a| a == root)
}

/// Statement lists below `root` that passes may edit: program, block and
/// case bodies. Concise arrow bodies and conditional-compilation comments
/// are left alone.
pub(crate) fn editable_lists(ast: &Ast, root: NodeId) -> Vec<NodeId> {
    ast.descendants(root)
        .into_iter()
        .filter(|id| match ast.kind(*id) {
            NodeKind::Program { .. } | NodeKind::SwitchCase { .. } => true,
            NodeKind::Block { concise, .. } => !concise,
            _ => false,
        })
        .filter(|id| !inside_cc_comment(ast, *id))
        .collect()
}

fn inside_cc_comment(ast: &Ast, id: NodeId) -> bool {
    ast.ancestors(id)
        .any(|a| matches!(ast.kind(a), NodeKind::CcComment { .. }))
}

/// Compile-time truth value of a side-effect free condition.
pub(crate) fn truthiness(ast: &Ast, id: NodeId) -> Option<bool> {
    match ast.kind(ast.unwrap_grouping(id)) {
        NodeKind::Constant(Literal::Boolean(b)) => Some(*b),
        NodeKind::Constant(Literal::Number(n)) => Some(*n != 0.0 && !n.is_nan()),
        NodeKind::Constant(Literal::String(s)) => Some(!s.is_empty()),
        NodeKind::Constant(Literal::Null) => Some(false),
        NodeKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => truthiness(ast, *operand).map(|b| !b),
        _ => None,
    }
}

/// Whether a statement declares `var` names or functions that are hoisted
/// out of it. Nested function bodies are not searched.
pub(crate) fn contains_hoisted(ast: &Ast, id: NodeId) -> bool {
    let mut stack = vec![id];
    while let Some(node) = stack.pop() {
        let kind = ast.kind(node);
        if kind.is_hoisted_declaration() {
            return true;
        }
        if matches!(kind, NodeKind::FunctionObject { .. } | NodeKind::Class { .. }) {
            continue;
        }
        stack.extend(ast.children(node));
    }
    false
}

/// Whether a statement ends control flow unconditionally.
pub(crate) fn is_jump(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Return { .. }
            | NodeKind::Throw { .. }
            | NodeKind::Break { .. }
            | NodeKind::Continue { .. }
    )
}

/// Whether a statement introduces a binding of any kind.
pub(crate) fn is_declaration(kind: &NodeKind) -> bool {
    match kind {
        NodeKind::Var { .. } | NodeKind::Import { .. } | NodeKind::Export { .. } => true,
        NodeKind::FunctionObject { kind, .. } => *kind == FunctionKind::Declaration,
        NodeKind::Class { is_expression, .. } => !is_expression,
        _ => false,
    }
}

/// The single statement of a scope-less block, or the statement itself.
pub(crate) fn single_statement(ast: &Ast, id: NodeId) -> Option<NodeId> {
    match ast.kind(id) {
        NodeKind::Block {
            statements,
            scope: None,
            concise: false,
        } => match statements.as_slice() {
            [only] => Some(*only),
            _ => None,
        },
        NodeKind::Block { .. } => None,
        _ => Some(id),
    }
}

/// Puts a new node built around `old` into `old`'s slot.
pub(crate) fn wrap(ast: &mut Ast, old: NodeId, build: impl FnOnce(NodeId) -> NodeKind) -> NodeId {
    let context = ast.context(old);
    let placeholder = ast.alloc(NodeKind::Empty, context);
    ast.replace(old, placeholder);
    let new = ast.alloc(build(old), context);
    ast.replace(placeholder, new);
    new
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::parse;

    #[test]
    fn test_truthiness_of_constants() {
        let parsed = parse("0; 'a'; !0; null; x;", &CodeSettings::default());
        let s = parsed.ast.statements(parsed.root).to_vec();
        let values: Vec<Option<bool>> = s.iter().map(|id| truthiness(&parsed.ast, *id)).collect();
        assert_eq!(values, vec![Some(false), Some(true), Some(true), Some(false), None]);
    }

    #[test]
    fn test_hoisted_search_stops_at_functions() {
        let parsed = parse(
            "if (a) { var x; } if (b) { (function () { var y; }); }",
            &CodeSettings::default(),
        );
        let s = parsed.ast.statements(parsed.root).to_vec();
        assert!(contains_hoisted(&parsed.ast, s[0]));
        assert!(!contains_hoisted(&parsed.ast, s[1]));
    }

    #[test]
    fn test_wrap_keeps_parent_links() {
        let mut parsed = parse("a; b;", &CodeSettings::default());
        let first = parsed.ast.statements(parsed.root)[0];
        let wrapped = wrap(&mut parsed.ast, first, |inner| NodeKind::Grouping { expression: inner });
        assert_eq!(parsed.ast.statements(parsed.root)[0], wrapped);
        assert_eq!(parsed.ast.parent(first), Some(wrapped));
        assert!(parsed.ast.check_parent_links(parsed.root));
    }
}
