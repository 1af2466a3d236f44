//! Statement combination
//!
//! Turns `if` statements with empty, expression or return branches into
//! expressions and merges neighbors in each statement list: adjacent
//! declarations of the same kind and adjacent expression statements.

use std::collections::HashSet;

use parser::ast::{BinaryOp, Literal};
use parser::{Ast, CodeSettings, NodeId, NodeKind, TreeModifications};
use tracing::trace;

use super::{editable_lists, is_live, single_statement, wrap};

/// Combines statements below `root`.
pub fn run(ast: &mut Ast, settings: &CodeSettings, root: NodeId) -> usize {
    if !settings.minify_code {
        return 0;
    }
    let allowed = |m: TreeModifications| settings.is_modification_allowed(m);
    let mut changes = 0;

    // Children before parents, so a branch is already merged down to one
    // statement when its `if` is visited.
    let lists: HashSet<NodeId> = editable_lists(ast, root).into_iter().collect();
    let mut nodes = ast.descendants(root);
    nodes.reverse();
    for id in nodes {
        if !is_live(ast, id, root) {
            continue;
        }
        if lists.contains(&id) {
            changes += merge_neighbors(ast, id, &allowed);
        } else if matches!(ast.kind(id), NodeKind::If { .. })
            && !in_cc_comment(ast, id)
            && convert_if(ast, id, &allowed)
        {
            changes += 1;
        }
    }
    changes
}

fn in_cc_comment(ast: &Ast, id: NodeId) -> bool {
    ast.ancestors(id)
        .any(|a| matches!(ast.kind(a), NodeKind::CcComment { .. }))
}

/// Expression statement that may be merged or moved into an expression.
fn is_plain_expression(ast: &Ast, id: NodeId) -> bool {
    let kind = ast.kind(id);
    kind.is_expression() && !matches!(kind, NodeKind::Constant(Literal::String(_)))
}

fn is_empty_statement(ast: &Ast, id: NodeId) -> bool {
    match ast.kind(id) {
        NodeKind::Empty => true,
        NodeKind::Block {
            statements,
            scope: None,
            concise: false,
        } => statements.is_empty(),
        _ => false,
    }
}

fn returned_value(ast: &Ast, id: NodeId) -> Option<NodeId> {
    match ast.kind(id) {
        NodeKind::Return { value } => *value,
        _ => None,
    }
}

fn convert_if(ast: &mut Ast, id: NodeId, allowed: &impl Fn(TreeModifications) -> bool) -> bool {
    let NodeKind::If {
        condition,
        consequent,
        alternate,
    } = ast.kind(id).clone()
    else {
        return false;
    };
    let context = ast.context(id);
    if alternate.is_none()
        && is_empty_statement(ast, consequent)
        && !matches!(ast.kind(condition), NodeKind::Constant(Literal::String(_)))
    {
        if !allowed(TreeModifications::IF_EMPTY_TO_EXPRESSION) {
            return false;
        }
        trace!(node = id.0, "if with empty branch to expression");
        return ast.replace(id, condition);
    }
    let Some(then_branch) = single_statement(ast, consequent) else {
        return false;
    };

    let replacement = match alternate {
        None => {
            if !allowed(TreeModifications::IF_CONDITION_CALL_TO_CONDITION_AND_CALL)
                || !is_plain_expression(ast, then_branch)
            {
                return false;
            }
            ast.alloc(
                NodeKind::Binary {
                    op: BinaryOp::And,
                    left: condition,
                    right: then_branch,
                },
                context,
            )
        }
        Some(alternate) => {
            let Some(else_branch) = single_statement(ast, alternate) else {
                return false;
            };
            if is_plain_expression(ast, then_branch) && is_plain_expression(ast, else_branch) {
                if !allowed(TreeModifications::IF_EXPRESSIONS_TO_EXPRESSION) {
                    return false;
                }
                ast.alloc(
                    NodeKind::Conditional {
                        condition,
                        consequent: then_branch,
                        alternate: else_branch,
                    },
                    context,
                )
            } else {
                let (Some(yes), Some(no)) = (returned_value(ast, then_branch), returned_value(ast, else_branch))
                else {
                    return false;
                };
                if !allowed(TreeModifications::IF_ELSE_RETURN_TO_RETURN_CONDITIONAL) {
                    return false;
                }
                let choice = ast.alloc(
                    NodeKind::Conditional {
                        condition,
                        consequent: yes,
                        alternate: no,
                    },
                    context,
                );
                ast.alloc(NodeKind::Return { value: Some(choice) }, context)
            }
        }
    };
    trace!(node = id.0, "converted if statement");
    ast.replace(id, replacement)
}

fn merge_neighbors(ast: &mut Ast, list: NodeId, allowed: &impl Fn(TreeModifications) -> bool) -> usize {
    let mut changes = 0;
    let mut index = 0;
    loop {
        let statements = ast.statements(list);
        let (Some(&first), Some(&second)) = (statements.get(index), statements.get(index + 1)) else {
            break;
        };
        let merged = match (ast.kind(first).clone(), ast.kind(second).clone()) {
            (
                NodeKind::Var {
                    kind,
                    declarators: mut head,
                },
                NodeKind::Var {
                    kind: next_kind,
                    declarators: tail,
                },
            ) if kind == next_kind && allowed(TreeModifications::COMBINE_VAR_STATEMENTS) => {
                ast.remove_at(list, index + 1);
                head.extend(tail);
                ast.set_kind(first, NodeKind::Var {
                    kind,
                    declarators: head,
                });
                true
            }
            _ if is_plain_expression(ast, first)
                && is_plain_expression(ast, second)
                && allowed(TreeModifications::COMBINE_ADJACENT_EXPRESSION_STATEMENTS) =>
            {
                ast.remove_at(list, index + 1);
                wrap(ast, first, |left| NodeKind::Binary {
                    op: BinaryOp::Comma,
                    left,
                    right: second,
                });
                true
            }
            _ => false,
        };
        if merged {
            changes += 1;
        } else {
            index += 1;
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::parse;

    fn combine(source: &str) -> parser::Parsed {
        let settings = CodeSettings::default();
        let mut parsed = parse(source, &settings);
        run(&mut parsed.ast, &settings, parsed.root);
        assert!(parsed.ast.check_parent_links(parsed.root));
        parsed
    }

    #[test]
    fn test_expression_statements_joined_with_comma() {
        let parsed = combine("a(); b(); c();");
        let statements = parsed.ast.statements(parsed.root);
        assert_eq!(statements.len(), 1);
        assert!(matches!(
            parsed.ast.kind(statements[0]),
            NodeKind::Binary {
                op: BinaryOp::Comma,
                ..
            }
        ));
    }

    #[test]
    fn test_var_statements_merged_by_kind() {
        let parsed = combine("var a = 1; var b; let c; let d; var e;");
        let sizes: Vec<usize> = parsed
            .ast
            .statements(parsed.root)
            .iter()
            .map(|s| match parsed.ast.kind(*s) {
                NodeKind::Var { declarators, .. } => declarators.len(),
                _ => 0,
            })
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_if_call_becomes_and() {
        let parsed = combine("if (a) { b(); }");
        let statement = parsed.ast.statements(parsed.root)[0];
        assert!(matches!(
            parsed.ast.kind(statement),
            NodeKind::Binary { op: BinaryOp::And, .. }
        ));
    }

    #[test]
    fn test_empty_if_becomes_condition() {
        let parsed = combine("if (a()) ; if (b()) {}");
        let statement = parsed.ast.statements(parsed.root)[0];
        assert!(matches!(
            parsed.ast.kind(statement),
            NodeKind::Binary {
                op: BinaryOp::Comma,
                ..
            }
        ));
        let parsed = combine("if ('text') ;");
        assert!(matches!(
            parsed.ast.kind(parsed.ast.statements(parsed.root)[0]),
            NodeKind::If { .. }
        ));
    }

    #[test]
    fn test_if_else_return_becomes_conditional() {
        let parsed = combine("function f(a) { if (a) return 1; else return 2; }");
        let returns: Vec<NodeId> = parsed
            .ast
            .descendants(parsed.root)
            .into_iter()
            .filter(|id| matches!(parsed.ast.kind(*id), NodeKind::Return { .. }))
            .collect();
        assert_eq!(returns.len(), 1);
        let value = returned_value(&parsed.ast, returns[0]).unwrap();
        assert!(matches!(parsed.ast.kind(value), NodeKind::Conditional { .. }));
    }

    #[test]
    fn test_directive_not_merged() {
        let parsed = combine("'use strict'; a(); b();");
        assert_eq!(parsed.ast.statements(parsed.root).len(), 2);
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let settings = CodeSettings::default();
        let mut parsed = parse("x(); if (y) z(); var a; var b; if (c) d(); else e();", &settings);
        assert!(run(&mut parsed.ast, &settings, parsed.root) > 0);
        assert_eq!(run(&mut parsed.ast, &settings, parsed.root), 0);
    }

    #[test]
    fn test_branch_merged_before_if_converted() {
        let settings = CodeSettings::default();
        let mut parsed = parse("function f() { if (a) { b(); c(); } return 1; }", &settings);
        assert_eq!(run(&mut parsed.ast, &settings, parsed.root), 2);
        let and = parsed
            .ast
            .descendants(parsed.root)
            .into_iter()
            .find(|id| matches!(parsed.ast.kind(*id), NodeKind::Binary { op: BinaryOp::And, .. }));
        assert!(and.is_some());
        assert_eq!(run(&mut parsed.ast, &settings, parsed.root), 0);
    }
}
