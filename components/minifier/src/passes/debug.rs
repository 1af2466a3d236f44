//! Debug statement stripping
//!
//! Removes `debugger` statements and expression statements rooted at one of
//! the configured debug lookups (`Debug.assert(...)`, `WAssert(...)`, ...).

use parser::analyzer::is_debug_reference;
use parser::{Ast, CodeSettings, NodeId, NodeKind};
use tracing::trace;

use super::{editable_lists, is_live};

/// Strips debug-only statements below `root`.
pub fn run(ast: &mut Ast, settings: &CodeSettings, root: NodeId) -> usize {
    let mut removed = 0;
    for list in editable_lists(ast, root) {
        if !is_live(ast, list, root) {
            continue;
        }
        let statements = ast.statements(list).to_vec();
        for statement in statements {
            if is_debug_statement(ast, statement, settings) {
                trace!(node = statement.0, "removing debug statement");
                ast.remove_statement(statement);
                removed += 1;
            }
        }
    }

    // Debug statements used as the body of a compound statement.
    for id in ast.descendants(root) {
        let Some(parent) = ast.parent(id) else {
            continue;
        };
        let in_list = ast.statements(parent).contains(&id);
        if !in_list && is_body_slot(ast, parent, id) && is_debug_statement(ast, id, settings) {
            let empty = ast.alloc(NodeKind::Empty, ast.context(id));
            ast.replace(id, empty);
            removed += 1;
        }
    }
    removed
}

fn is_debug_statement(ast: &Ast, id: NodeId, settings: &CodeSettings) -> bool {
    match ast.kind(id) {
        NodeKind::Debugger => true,
        kind if kind.is_expression() => is_debug_reference(ast, id, settings),
        _ => false,
    }
}

fn is_body_slot(ast: &Ast, parent: NodeId, child: NodeId) -> bool {
    match ast.kind(parent) {
        NodeKind::If {
            consequent,
            alternate,
            ..
        } => *consequent == child || *alternate == Some(child),
        NodeKind::While { body, .. }
        | NodeKind::DoWhile { body, .. }
        | NodeKind::For { body, .. }
        | NodeKind::ForIn { body, .. }
        | NodeKind::With { body, .. }
        | NodeKind::Labeled { body, .. } => *body == child,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::parse;

    #[test]
    fn test_removes_debugger_and_debug_calls() {
        let settings = CodeSettings::default();
        let mut parsed = parse("debugger; Debug.assert(x); keep(); $Debug.trace('t');", &settings);
        let removed = run(&mut parsed.ast, &settings, parsed.root);
        assert_eq!(removed, 3);
        assert_eq!(parsed.ast.statements(parsed.root).len(), 1);
    }

    #[test]
    fn test_debug_body_becomes_empty_statement() {
        let settings = CodeSettings::default();
        let mut parsed = parse("if (a) debugger; else WAssert(b);", &settings);
        assert_eq!(run(&mut parsed.ast, &settings, parsed.root), 2);
        let statement = parsed.ast.statements(parsed.root)[0];
        if let NodeKind::If { consequent, alternate, .. } = parsed.ast.kind(statement) {
            assert_eq!(parsed.ast.kind(*consequent), &NodeKind::Empty);
            assert_eq!(parsed.ast.kind(alternate.unwrap()), &NodeKind::Empty);
        } else {
            panic!("expected if statement");
        }
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let settings = CodeSettings::default();
        let mut parsed = parse("function f() { debugger; return 1; }", &settings);
        assert_eq!(run(&mut parsed.ast, &settings, parsed.root), 1);
        assert_eq!(run(&mut parsed.ast, &settings, parsed.root), 0);
    }
}
