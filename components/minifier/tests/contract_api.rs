//! Contract tests for minifier API
//!
//! These tests verify the minifier component implements its contract correctly.

use minifier::renamer::generated_name;
use minifier::text::{format_number, quote_string};
use minifier::{emit, minify, Compilation};
use parser::settings::LocalRenaming;
use parser::{parse, CodeSettings, TreeModifications};

fn code(source: &str) -> String {
    minify(source, &CodeSettings::default()).unwrap().code
}

// =============================================================================
// Pipeline Contract Tests
// =============================================================================

#[test]
fn test_minify_single_source() {
    let output = minify(
        "function add(first, second) {\n    return first + second;\n}\n",
        &CodeSettings::default(),
    )
    .unwrap();
    assert_eq!(output.code, "function add(n,t){return n+t}");
    assert!(output.diagnostics.is_empty());
    assert!(!output.has_errors());
}

#[test]
fn test_minify_reports_undefined_names() {
    let output = minify("foo(bar);", &CodeSettings::default()).unwrap();
    let names: Vec<&str> = output.undefined.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["bar", "foo"]);
}

#[test]
fn test_compilation_joins_chunks() {
    let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
    compilation.add_source("first.js", "var shared = 1;");
    compilation.add_source("second.js", "shared++;");
    compilation.minify();
    let output = compilation.emit();
    assert_eq!(output.code, "var shared=1;shared++");
    assert!(output.undefined.is_empty());
}

#[test]
fn test_output_serializes() {
    let output = minify("x = 1;", &CodeSettings::default()).unwrap();
    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["code"], "x=1");
    assert_eq!(json["undefined"][0]["name"], "x");
}

// =============================================================================
// Transform Contract Tests
// =============================================================================

#[test]
fn test_debug_statements_stripped() {
    assert_eq!(code("debugger; Debug.assert(x); keep();"), "keep()");
}

#[test]
fn test_statements_combined() {
    assert_eq!(code("a(); b(); c();"), "a(),b(),c()");
    assert_eq!(code("if (a) { b(); }"), "a&&b()");
}

#[test]
fn test_literals_folded() {
    assert_eq!(code("x = (1 + 2) * 3;"), "x=9");
}

#[test]
fn test_second_minify_changes_nothing() {
    let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
    compilation.add_source("input.js", "function f() { if (a) { b(); c(); } return 1; }");
    assert!(compilation.minify() > 0);
    let first = compilation.emit().code;
    assert_eq!(first, "function f(){a&&(b(),c());return 1}");
    assert_eq!(compilation.minify(), 0);
    assert_eq!(compilation.emit().code, first);
}

#[test]
fn test_overflow_not_spelled_as_shadowable_global() {
    assert_eq!(
        code("function f(Infinity) { return [Infinity, 1e400]; }"),
        "function f(n){return[n,1/0]}"
    );
}

#[test]
fn test_kill_switch_disables_transform() {
    let mut settings = CodeSettings::default();
    settings.kill_switch = TreeModifications::COMBINE_ADJACENT_EXPRESSION_STATEMENTS;
    assert_eq!(minify("a(); b();", &settings).unwrap().code, "a();b()");
}

// =============================================================================
// Renaming Contract Tests
// =============================================================================

#[test]
fn test_generated_names() {
    assert_eq!(generated_name(0), "n");
    assert_eq!(generated_name(1), "t");
    assert_eq!(generated_name(53), "$");
}

#[test]
fn test_keep_all_leaves_names() {
    let mut settings = CodeSettings::default();
    settings.local_renaming = LocalRenaming::KeepAll;
    let output = minify("function f(value) { return value; }", &settings).unwrap();
    assert_eq!(output.code, "function f(value){return value}");
}

#[test]
fn test_manual_rename_pair() {
    let mut settings = CodeSettings::default();
    settings.set_rename_pairs("longName=x").unwrap();
    let output = minify("function f(longName) { return longName; }", &settings).unwrap();
    assert_eq!(output.code, "function f(x){return x}");
}

// =============================================================================
// Emitter Contract Tests
// =============================================================================

#[test]
fn test_emit_without_transforms() {
    let settings = CodeSettings::default();
    let parsed = parse("var  a = 1 ;\n\n", &settings);
    let result = emit(&parsed.ast, &parsed.scopes, &settings, &[parsed.root]);
    assert_eq!(result.code, "var a=1");
    assert!(result.mappings.is_empty());
}

#[test]
fn test_term_semicolons() {
    let mut settings = CodeSettings::default();
    settings.term_semicolons = true;
    assert_eq!(minify("a()", &settings).unwrap().code, "a();");
}

#[test]
fn test_source_mappings_point_at_source() {
    let mut settings = CodeSettings::default();
    settings.generate_source_map = true;
    let output = minify("var alpha = 1;\nalpha++;", &settings).unwrap();
    assert!(!output.mappings.is_empty());
    assert!(output
        .mappings
        .iter()
        .any(|m| m.name.as_deref() == Some("alpha") && m.source_line == 2));
    assert!(output
        .mappings
        .iter()
        .all(|m| m.source.as_deref() == Some("input")));
}

#[test]
fn test_literal_text_forms() {
    assert_eq!(format_number(1000.0), "1e3");
    assert_eq!(format_number(0.5), ".5");
    assert_eq!(quote_string("it's", false), "\"it's\"");
}
