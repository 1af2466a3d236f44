//! Local expression rewrites
//!
//! - `a["b"]` to `a.b` when the key is a valid identifier
//! - `new Array(...)` / `new Object()` to literals when those names are the
//!   undeclared built-ins
//! - `new Date().getTime()` to `+new Date`
//! - quoted object literal keys to bare names

use parser::ast::{Literal, UnaryOp};
use parser::lexer::is_valid_identifier;
use parser::{Ast, CodeSettings, FieldKind, NodeId, NodeKind, ScopeTree, TreeModifications};
use tracing::trace;

/// Applies the enabled rewrites below `root`.
pub fn run(ast: &mut Ast, scopes: &ScopeTree, settings: &CodeSettings, root: NodeId) -> usize {
    let allowed = |m: TreeModifications| settings.is_modification_allowed(m);
    let mut changes = 0;
    for id in ast.descendants(root) {
        let rewritten = match ast.kind(id) {
            NodeKind::Index {
                object,
                index,
                optional,
            } if allowed(TreeModifications::BRACKET_MEMBER_TO_DOT_MEMBER) => {
                match ast.kind(ast.unwrap_grouping(*index)) {
                    NodeKind::Constant(Literal::String(name)) if is_valid_identifier(name) => {
                        Some(NodeKind::Member {
                            object: *object,
                            name: name.clone(),
                            optional: *optional,
                        })
                    }
                    _ => None,
                }
            }
            NodeKind::Call {
                callee,
                arguments,
                is_new: true,
                ..
            } if settings.collapse_to_literal => {
                collapse_constructor(ast, scopes, *callee, arguments, &allowed)
            }
            NodeKind::Call {
                callee,
                arguments,
                is_new: false,
                optional: false,
            } if arguments.is_empty() && allowed(TreeModifications::DATE_GET_TIME_TO_UNARY_PLUS) => {
                current_time(ast, scopes, *callee)
            }
            _ => None,
        };
        if let Some(kind) = rewritten {
            trace!(node = id.0, "rewrote expression");
            ast.set_kind(id, kind);
            changes += 1;
        }
    }

    if allowed(TreeModifications::REMOVE_QUOTES_FROM_OBJECT_LITERAL_NAMES) {
        changes += unquote_keys(ast, root);
    }
    changes
}

/// Whether a callee is the built-in global of that name.
fn is_builtin(ast: &Ast, scopes: &ScopeTree, callee: NodeId, name: &str) -> bool {
    match ast.kind(callee) {
        NodeKind::Lookup {
            name: found,
            field: Some(field),
            ..
        } if found == name => {
            let root = scopes.field(scopes.outermost(*field));
            root.kind == FieldKind::Predefined
        }
        _ => false,
    }
}

fn collapse_constructor(
    ast: &Ast,
    scopes: &ScopeTree,
    callee: NodeId,
    arguments: &[NodeId],
    allowed: &impl Fn(TreeModifications) -> bool,
) -> Option<NodeKind> {
    if allowed(TreeModifications::NEW_OBJECT_TO_OBJECT_LITERAL)
        && arguments.is_empty()
        && is_builtin(ast, scopes, callee, "Object")
    {
        return Some(NodeKind::ObjectLiteral {
            properties: Vec::new(),
            preserve_quotes: false,
        });
    }
    if !allowed(TreeModifications::NEW_ARRAY_TO_ARRAY_LITERAL) || !is_builtin(ast, scopes, callee, "Array") {
        return None;
    }
    // A single numeric argument is a length, and spreads could be one.
    let convertible = match arguments {
        [] => true,
        [only] => matches!(ast.kind(*only), NodeKind::Constant(Literal::String(_))),
        many => many
            .iter()
            .all(|a| !matches!(ast.kind(*a), NodeKind::Spread { .. })),
    };
    convertible.then(|| NodeKind::ArrayLiteral {
        elements: arguments.iter().map(|a| Some(*a)).collect(),
    })
}

/// `+new Date` for a callee of the form `new Date().getTime`.
fn current_time(ast: &Ast, scopes: &ScopeTree, callee: NodeId) -> Option<NodeKind> {
    let NodeKind::Member {
        object,
        name,
        optional: false,
    } = ast.kind(callee)
    else {
        return None;
    };
    if name != "getTime" {
        return None;
    }
    match ast.kind(*object) {
        NodeKind::Call {
            callee: constructor,
            arguments,
            is_new: true,
            ..
        } if arguments.is_empty() && is_builtin(ast, scopes, *constructor, "Date") => Some(NodeKind::Unary {
            op: UnaryOp::Plus,
            operand: *object,
        }),
        _ => None,
    }
}

fn unquote_keys(ast: &mut Ast, root: NodeId) -> usize {
    let mut changes = 0;
    for id in ast.descendants(root) {
        let key = match ast.kind(id) {
            NodeKind::ObjectProperty {
                key,
                computed: false,
                ..
            } => {
                let preserved = ast.parent(id).is_some_and(|p| {
                    matches!(
                        ast.kind(p),
                        NodeKind::ObjectLiteral {
                            preserve_quotes: true,
                            ..
                        }
                    )
                });
                if preserved {
                    continue;
                }
                *key
            }
            NodeKind::ClassMember {
                key, computed: false, ..
            } => *key,
            _ => continue,
        };
        if let NodeKind::Constant(Literal::String(name)) = ast.kind(key) {
            if is_valid_identifier(name) {
                let name = name.clone();
                ast.set_kind(key, NodeKind::PropertyName { name });
                changes += 1;
            }
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::parse;

    fn rewrite(source: &str) -> parser::Parsed {
        let settings = CodeSettings::default();
        let mut parsed = parse(source, &settings);
        run(&mut parsed.ast, &parsed.scopes, &settings, parsed.root);
        parsed
    }

    fn first(parsed: &parser::Parsed) -> &NodeKind {
        parsed.ast.kind(parsed.ast.statements(parsed.root)[0])
    }

    #[test]
    fn test_bracket_to_dot() {
        let parsed = rewrite("a['b'];");
        assert!(matches!(first(&parsed), NodeKind::Member { name, .. } if name == "b"));
        let parsed = rewrite("a['b-c']; a['class'];");
        assert!(matches!(first(&parsed), NodeKind::Index { .. }));
        let second = parsed.ast.statements(parsed.root)[1];
        assert!(matches!(parsed.ast.kind(second), NodeKind::Index { .. }));
    }

    #[test]
    fn test_builtin_constructors_collapse() {
        let parsed = rewrite("new Object(); new Array(); new Array(1, 2); new Array(5);");
        let kinds: Vec<&NodeKind> = parsed
            .ast
            .statements(parsed.root)
            .iter()
            .map(|s| parsed.ast.kind(*s))
            .collect();
        assert!(matches!(kinds[0], NodeKind::ObjectLiteral { .. }));
        assert!(matches!(kinds[1], NodeKind::ArrayLiteral { elements } if elements.is_empty()));
        assert!(matches!(kinds[2], NodeKind::ArrayLiteral { elements } if elements.len() == 2));
        assert!(matches!(kinds[3], NodeKind::Call { .. }));
    }

    #[test]
    fn test_shadowed_constructor_kept() {
        let parsed = rewrite("function f(Array) { return new Array(); }");
        let calls = parsed
            .ast
            .descendants(parsed.root)
            .into_iter()
            .filter(|id| matches!(parsed.ast.kind(*id), NodeKind::Call { is_new: true, .. }))
            .count();
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_date_get_time_becomes_unary_plus() {
        let parsed = rewrite("new Date().getTime();");
        match first(&parsed) {
            NodeKind::Unary {
                op: UnaryOp::Plus,
                operand,
            } => assert!(matches!(parsed.ast.kind(*operand), NodeKind::Call { is_new: true, .. })),
            other => panic!("unexpected {:?}", other),
        }
        assert!(parsed.ast.check_parent_links(parsed.root));

        let parsed = rewrite("function f(Date) { return new Date().getTime(); } new Date(0).getTime();");
        let plus = parsed
            .ast
            .descendants(parsed.root)
            .into_iter()
            .filter(|id| matches!(parsed.ast.kind(*id), NodeKind::Unary { .. }))
            .count();
        assert_eq!(plus, 0);
    }

    #[test]
    fn test_object_keys_unquoted() {
        let parsed = rewrite("x = { 'a': 1, 'b c': 2 };");
        let keys: Vec<&NodeKind> = parsed
            .ast
            .descendants(parsed.root)
            .into_iter()
            .filter_map(|id| match parsed.ast.kind(id) {
                NodeKind::ObjectProperty { key, .. } => Some(parsed.ast.kind(*key)),
                _ => None,
            })
            .collect();
        assert!(matches!(keys[0], NodeKind::PropertyName { name } if name == "a"));
        assert!(matches!(keys[1], NodeKind::Constant(Literal::String(_))));
    }
}
