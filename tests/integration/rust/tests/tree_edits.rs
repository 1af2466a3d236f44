//! Host Tree Edit Tests
//!
//! Edits the tree of a minified compilation before emission and checks
//! how concise arrow bodies react to statement-list operations.

use core_types::ReferenceType;
use minifier::Compilation;
use parser::{CodeSettings, NodeId, NodeKind};

const ARROW: &str = "var arrow = (a, b, c) => a * ( b + c);";

/// Minifies `ARROW` and returns the compilation with its concise body.
fn minified_arrow() -> (Compilation, NodeId) {
    let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
    let root = compilation.add_source("arrow.js", ARROW);
    compilation.minify();
    let ast = compilation.ast();
    let body = ast
        .descendants(root)
        .into_iter()
        .find(|id| ast.is_concise(*id))
        .expect("arrow body is concise");
    (compilation, body)
}

fn debugger(compilation: &mut Compilation, body: NodeId) -> NodeId {
    let context = compilation.ast().context(body);
    compilation.ast_mut().alloc(NodeKind::Debugger, context)
}

fn lookup(compilation: &mut Compilation, body: NodeId, name: &str) -> NodeId {
    let context = compilation.ast().context(body);
    compilation.ast_mut().alloc(
        NodeKind::Lookup {
            name: name.to_string(),
            field: None,
            ref_type: ReferenceType::Variable,
        },
        context,
    )
}

// =============================================================================
// Concise Body Edits
// =============================================================================

#[test]
fn test_unedited_body_stays_concise() {
    let (compilation, _) = minified_arrow();
    assert_eq!(compilation.emit().code, "var arrow=(n,t,i)=>n*(t+i)");
}

#[test]
fn test_append_expands_body() {
    let (mut compilation, body) = minified_arrow();
    let statement = debugger(&mut compilation, body);
    compilation.ast_mut().append(body, statement);
    assert!(!compilation.ast().is_concise(body));
    assert_eq!(
        compilation.emit().code,
        "var arrow=(n,t,i)=>{return n*(t+i);debugger}"
    );
}

#[test]
fn test_insert_first_expands_body() {
    let (mut compilation, body) = minified_arrow();
    let statement = debugger(&mut compilation, body);
    compilation.ast_mut().insert(body, 0, statement);
    assert_eq!(
        compilation.emit().code,
        "var arrow=(n,t,i)=>{debugger;return n*(t+i)}"
    );
}

#[test]
fn test_insert_several_before_return() {
    let (mut compilation, body) = minified_arrow();
    let name = lookup(&mut compilation, body, "n");
    let statement = debugger(&mut compilation, body);
    let ast = compilation.ast_mut();
    ast.insert(body, 0, name);
    ast.insert(body, 1, statement);
    assert_eq!(
        compilation.emit().code,
        "var arrow=(n,t,i)=>{n;debugger;return n*(t+i)}"
    );
}

#[test]
fn test_clear_leaves_empty_block() {
    let (mut compilation, body) = minified_arrow();
    compilation.ast_mut().clear(body);
    assert!(!compilation.ast().is_concise(body));
    assert_eq!(compilation.emit().code, "var arrow=(n,t,i)=>{}");
}

#[test]
fn test_replace_with_statement() {
    let (mut compilation, body) = minified_arrow();
    let statement = debugger(&mut compilation, body);
    compilation.ast_mut().set_statements(body, vec![statement]);
    assert_eq!(compilation.emit().code, "var arrow=(n,t,i)=>{debugger}");
}

#[test]
fn test_replace_with_expression_stays_concise() {
    let (mut compilation, body) = minified_arrow();
    let name = lookup(&mut compilation, body, "n");
    compilation.ast_mut().set_statements(body, vec![name]);
    assert!(compilation.ast().is_concise(body));
    assert_eq!(compilation.emit().code, "var arrow=(n,t,i)=>n");
}

// =============================================================================
// Program Edits
// =============================================================================

#[test]
fn test_statement_moved_between_lists() {
    let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
    let root = compilation.add_source("input.js", "function f() { return 1; } g();");
    compilation.minify();
    let ast = compilation.ast_mut();
    let call = ast.statements(root)[1];
    let function = ast.statements(root)[0];
    let NodeKind::FunctionObject { body, .. } = ast.kind(function).clone() else {
        panic!("expected function declaration");
    };
    ast.insert(body, 0, call);
    assert_eq!(ast.statements(root).len(), 1);
    assert!(ast.check_parent_links(root));
    assert_eq!(compilation.emit().code, "function f(){g();return 1}");
}
