//! End-to-End Minification Tests
//!
//! Tests the complete stack: Lexer -> Parser -> Analyzer -> Passes ->
//! Renamer -> Emitter. Covers:
//! - Renaming of parameters and locals
//! - Ambiguous references inside `with`
//! - Recovery from malformed input
//! - Stability of minified output
//! - Name uniqueness across nested scopes
//! - Hoisting and block scoping

use std::collections::HashMap;

use core_types::{DiagnosticCategory, ErrorCode};
use integration_tests::{reprint, run};
use minifier::{minify, Compilation};
use parser::settings::EvalTreatment;
use parser::{CodeSettings, FieldId, NodeKind, ScopeTree};

fn minified(source: &str) -> String {
    run(&CodeSettings::default(), source).code
}

// =============================================================================
// 1. Renaming
// =============================================================================

#[test]
fn test_arrow_parameters_renamed() {
    assert_eq!(
        minified("var arrow = (a, b, c) => a * (b + c);"),
        "var arrow=(n,t,i)=>n*(t+i)"
    );
}

#[test]
fn test_locals_renamed_globals_kept() {
    let output = run(
        &CodeSettings::default(),
        "var counter = 0;\nfunction bump(amount) {\n    counter += amount;\n    return counter;\n}\n",
    );
    assert_eq!(output.code, "var counter=0;function bump(n){counter+=n;return counter}");
}

#[test]
fn test_outer_local_not_captured_by_pinned_inner_name() {
    let output = run(
        &CodeSettings::default(),
        "function f(a, o) { function g() { var n; with (o) { n; } return a; } return g; }",
    );
    assert!(output.code.contains("var n;with("), "{}", output.code);
    assert!(!output.code.contains("return n}return"), "{}", output.code);

    let mut settings = CodeSettings::default();
    settings.eval_treatment = EvalTreatment::MakeImmediateSafe;
    let output = run(
        &settings,
        "function f(a) { function g() { var n = 1; eval('n'); return a; } return g; }",
    );
    assert!(output.code.contains("var n=1;eval(\"n\")"), "{}", output.code);
    assert!(!output.code.contains("return n}return"), "{}", output.code);
}

// =============================================================================
// 2. Ambiguous References
// =============================================================================

#[test]
fn test_with_reference_blocks_renaming() {
    let output = run(
        &CodeSettings::default(),
        "function f() { var value = 1; with (obj) { value = 2; } return value; }",
    );
    assert!(output.code.contains("var value=1"), "{}", output.code);
    assert!(output.code.contains("with(obj)"), "{}", output.code);

    let ambiguous: Vec<_> = output
        .diagnostics
        .iter()
        .filter(|d| d.code == ErrorCode::AmbiguousWithReference)
        .collect();
    assert_eq!(ambiguous.len(), 1);
    assert_eq!(ambiguous[0].category, DiagnosticCategory::AmbiguousBinding);
    assert!(!ambiguous[0].is_error());
}

// =============================================================================
// 3. Malformed Input
// =============================================================================

#[test]
fn test_missing_brace_recovers_at_end_of_input() {
    let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
    let root = compilation.add_source("broken.js", "function f() {\n  if (a) {\n    b();\n  }\n");
    compilation.minify();

    assert!(!compilation.chunks()[0].aborted);
    assert!(matches!(compilation.ast().kind(root), NodeKind::Program { .. }));
    assert_eq!(compilation.ast().statements(root).len(), 1);

    let output = compilation.emit();
    assert!(output.has_errors());
    assert!(output.diagnostics.iter().any(|d| d.code == ErrorCode::NoRightCurly
        && d.category == DiagnosticCategory::Parse
        && d.file.as_deref() == Some("broken.js")));
    assert_eq!(output.code, "function f(){a&&b()}");
}

#[test]
fn test_end_of_input_mid_expression_keeps_partial_tree() {
    let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
    let root = compilation.add_source("broken.js", "keep();\nvar b = (");
    compilation.minify();

    assert!(compilation.chunks()[0].aborted);
    assert!(!compilation.ast().statements(root).is_empty());
    let output = compilation.emit();
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::UnexpectedEndOfInput && d.file.as_deref() == Some("broken.js")));
    assert!(output.code.starts_with("keep()"), "{}", output.code);
}

#[test]
fn test_errors_do_not_stop_later_chunks() {
    let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
    compilation.add_source("bad.js", "var = ;");
    compilation.add_source("good.js", "function ok(value) { return value; }");
    compilation.minify();
    let output = compilation.emit();
    assert!(output.has_errors());
    assert!(output.code.ends_with("function ok(n){return n}"), "{}", output.code);
}

// =============================================================================
// 4. Output Properties
// =============================================================================

#[test]
fn test_minified_output_is_stable() {
    let settings = CodeSettings::default();
    let first = minify(
        "function outer(alpha, beta) { return alpha * beta + helper(alpha); }",
        &settings,
    )
    .unwrap()
    .code;
    assert_eq!(first, "function outer(n,t){return n*t+helper(n)}");
    let second = minify(&first, &settings).unwrap().code;
    assert_eq!(second, first);
}

#[test]
fn test_emitted_text_reparses_to_same_output() {
    let settings = CodeSettings::default();
    let sources = [
        "x = a * (b + c) - -d;",
        "for (var i = 0; i < n; i++) { if (i in o) continue; }",
        "class A extends B { static m() { return `t${1}`; } }",
        "var f = function () { return /re/g.test(s); }, g = (p = {}) => ({ ...p });",
        "label: do { x ?? y; } while (!z);",
    ];
    for source in sources {
        let printed = reprint(&settings, source);
        let reparsed = parser::parse(&printed, &settings);
        assert!(
            reparsed.diagnostics.iter().all(|d| !d.is_error()),
            "{} did not reparse",
            printed
        );
        assert_eq!(reprint(&settings, &printed), printed);
    }
}

/// Maps each output name used by `fields` to the declaring fields behind
/// it.
fn names_in_scope(scopes: &ScopeTree, fields: &[FieldId]) -> HashMap<String, Vec<FieldId>> {
    let mut names: HashMap<String, Vec<FieldId>> = HashMap::new();
    for id in fields {
        let declaring = scopes.outermost(*id);
        let entry = names.entry(scopes.output_name(*id).to_string()).or_default();
        if !entry.contains(&declaring) {
            entry.push(declaring);
        }
    }
    names
}

#[test]
fn test_renamed_fields_never_collide() {
    let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
    compilation.add_source(
        "input.js",
        "function f(first, second) {\n\
         var third = first + second;\n\
         return function (inner, other) {\n\
         var local = inner * other;\n\
         return first + second + third + inner + local + n + t;\n\
         };\n\
         }",
    );
    compilation.minify();
    let scopes = compilation.scopes();
    for scope in scopes.scopes_top_down() {
        let fields: Vec<FieldId> = scopes.scope(scope).fields.clone();
        for (name, declaring) in names_in_scope(scopes, &fields) {
            assert_eq!(declaring.len(), 1, "name '{}' reused in one scope", name);
        }
    }
}

// =============================================================================
// 5. Scoping
// =============================================================================

#[test]
fn test_var_hoists_to_function_scope() {
    let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
    compilation.add_source(
        "input.js",
        "function f() { x = 1; if (a) { var x; } { function g() {} } return g() + x; }",
    );
    compilation.analyze();
    let scopes = compilation.scopes();
    let function = scopes.scope(scopes.global()).children[0];
    assert!(scopes.find_local(function, "x").is_some());
    assert!(scopes.find_local(function, "g").is_some());
    let undefined: Vec<String> = compilation
        .undefined_references()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(undefined, vec!["a".to_string()]);
}

#[test]
fn test_block_bindings_stay_in_block() {
    let output = run(
        &CodeSettings::default(),
        "function f() { { let hidden = 1; use(hidden); } return hidden; }",
    );
    let undefined: Vec<&str> = output.undefined.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(undefined, vec!["hidden", "use"]);
}
