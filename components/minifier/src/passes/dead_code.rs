//! Dead code removal
//!
//! Everything removed here is provably unreachable or unreferenced from the
//! syntax alone: constant `if` branches, statements after an unconditional
//! jump, empty statements and `finally` blocks, a trailing `break` in the
//! last switch case, unreferenced local function declarations and
//! unreferenced function expression names. Hoisted declarations are kept
//! wherever dropping them could change name resolution.

use parser::ast::{DeclarationKind, FunctionKind};
use parser::{Ast, CodeSettings, FieldKind, NodeId, NodeKind, ScopeTree, TreeModifications};
use tracing::trace;

use super::{contains_hoisted, editable_lists, is_declaration, is_jump, is_live, truthiness};

/// Removes dead code below `root`.
pub fn run(ast: &mut Ast, scopes: &ScopeTree, settings: &CodeSettings, root: NodeId) -> usize {
    let allowed = |m: TreeModifications| settings.is_modification_allowed(m);
    let mut changes = constant_branches(ast, root);

    for list in editable_lists(ast, root) {
        if is_live(ast, list, root) {
            changes += prune_list(ast, list);
        }
    }

    for id in ast.descendants(root) {
        if !is_live(ast, id, root) {
            continue;
        }
        changes += match ast.kind(id).clone() {
            NodeKind::Try {
                body,
                catch_binding,
                catch_body: Some(catch_body),
                catch_scope,
                finally: Some(finally),
            } if allowed(TreeModifications::REMOVE_EMPTY_FINALLY) && ast.statements(finally).is_empty() => {
                ast.set_kind(id, NodeKind::Try {
                    body,
                    catch_binding,
                    catch_body: Some(catch_body),
                    catch_scope,
                    finally: None,
                });
                1
            }
            NodeKind::Switch { .. } => switch_tail(ast, id, &allowed),
            NodeKind::FunctionObject {
                kind: FunctionKind::Declaration,
                binding: Some(binding),
                ..
            } if is_unreferenced_local(ast, scopes, binding) => {
                trace!(node = id.0, "removing unreferenced function");
                usize::from(ast.remove_statement(id))
            }
            NodeKind::FunctionObject {
                kind: FunctionKind::Expression,
                binding: Some(binding),
                ..
            } if settings.remove_function_expression_names
                && !settings.preserve_function_names
                && allowed(TreeModifications::REMOVE_FUNCTION_EXPRESSION_NAMES)
                && is_unreferenced_name(ast, scopes, binding) =>
            {
                let mut kind = ast.kind(id).clone();
                if let NodeKind::FunctionObject { binding, .. } = &mut kind {
                    *binding = None;
                }
                ast.set_kind(id, kind);
                1
            }
            _ => 0,
        };
    }
    changes
}

/// Replaces `if` statements whose condition is a constant with the branch
/// that runs, when the other branch hoists nothing.
fn constant_branches(ast: &mut Ast, root: NodeId) -> usize {
    let mut changes = 0;
    for id in ast.descendants(root) {
        if !is_live(ast, id, root) {
            continue;
        }
        let NodeKind::If {
            condition,
            consequent,
            alternate,
        } = ast.kind(id).clone()
        else {
            continue;
        };
        let Some(taken) = truthiness(ast, condition) else {
            continue;
        };
        let (kept, dropped) = if taken {
            (Some(consequent), alternate)
        } else {
            (alternate, Some(consequent))
        };
        if dropped.is_some_and(|d| contains_hoisted(ast, d)) {
            continue;
        }
        let replacement = match kept {
            Some(statement) => statement,
            None => ast.alloc(NodeKind::Empty, ast.context(id)),
        };
        trace!(node = id.0, taken, "selected constant branch");
        ast.replace(id, replacement);
        changes += 1;
    }
    changes
}

/// Drops empty statements and statements after an unconditional jump.
fn prune_list(ast: &mut Ast, list: NodeId) -> usize {
    let statements = ast.statements(list).to_vec();
    let mut kept = Vec::with_capacity(statements.len());
    let mut unreachable = false;
    for statement in &statements {
        let kind = ast.kind(*statement);
        if matches!(kind, NodeKind::Empty) {
            continue;
        }
        if unreachable && !is_declaration(kind) && !matches!(kind, NodeKind::ImportantComment { .. }) {
            continue;
        }
        if unreachable {
            strip_var_initializers(ast, *statement);
        }
        kept.push(*statement);
        unreachable = unreachable || is_jump(ast.kind(*statement));
    }
    let removed = statements.len() - kept.len();
    if removed > 0 {
        ast.set_statements(list, kept);
    }
    removed
}

/// Unreachable `var x = value` only needs to keep declaring `x`.
fn strip_var_initializers(ast: &mut Ast, statement: NodeId) {
    let NodeKind::Var {
        kind: DeclarationKind::Var,
        declarators,
    } = ast.kind(statement).clone()
    else {
        return;
    };
    for declarator in declarators {
        if let NodeKind::VariableDeclarator { target, init: Some(_) } = ast.kind(declarator).clone() {
            if matches!(ast.kind(target), NodeKind::BindingIdentifier { .. }) {
                ast.set_kind(declarator, NodeKind::VariableDeclarator { target, init: None });
            }
        }
    }
}

/// Trims the end of a switch until neither an empty `default:` nor a
/// trailing `break` is left.
fn switch_tail(ast: &mut Ast, switch: NodeId, allowed: &impl Fn(TreeModifications) -> bool) -> usize {
    let mut changes = 0;
    loop {
        let NodeKind::Switch {
            discriminant,
            mut cases,
            scope,
        } = ast.kind(switch).clone()
        else {
            return changes;
        };
        let mut step = 0;
        if allowed(TreeModifications::REMOVE_BREAK_FROM_LAST_CASE_BLOCK) {
            step += trailing_break(ast, &cases);
        }
        let empty_default = cases.last().is_some_and(|last| {
            matches!(ast.kind(*last), NodeKind::SwitchCase { test: None, statements } if statements.is_empty())
        });
        if empty_default && allowed(TreeModifications::REMOVE_EMPTY_DEFAULT_CASE) {
            cases.pop();
            ast.set_kind(switch, NodeKind::Switch {
                discriminant,
                cases,
                scope,
            });
            step += 1;
        }
        if step == 0 {
            return changes;
        }
        changes += step;
    }
}

fn trailing_break(ast: &mut Ast, cases: &[NodeId]) -> usize {
    let Some(last) = cases.last() else {
        return 0;
    };
    match ast.statements(*last).last() {
        Some(statement) if matches!(ast.kind(*statement), NodeKind::Break { label: None }) => {
            let statement = *statement;
            usize::from(ast.remove_statement(statement))
        }
        _ => 0,
    }
}

fn binding_field(ast: &Ast, binding: NodeId) -> Option<parser::FieldId> {
    match ast.kind(binding) {
        NodeKind::BindingIdentifier { field, .. } => *field,
        _ => None,
    }
}

fn is_unreferenced_local(ast: &Ast, scopes: &ScopeTree, binding: NodeId) -> bool {
    let Some(id) = binding_field(ast, binding) else {
        return false;
    };
    let field = scopes.field(id);
    field.kind == FieldKind::Local
        && field.ref_count == 0
        && !field.is_exported
        && field.declarations.len() == 1
        && scopes.is_known_at_compile_time(field.scope)
}

fn is_unreferenced_name(ast: &Ast, scopes: &ScopeTree, binding: NodeId) -> bool {
    let Some(id) = binding_field(ast, binding) else {
        return false;
    };
    let field = scopes.field(id);
    field.ref_count == 0 && !field.is_ambiguous && scopes.is_known_at_compile_time(field.scope)
}
