//! Parser and Minifier Integration Tests
//!
//! Covers behavior that crosses the component boundary: scanner directives
//! seen in the output, shared scopes across chunks, JSON output and comments
//! preserved from the source.

use core_types::ErrorCode;
use integration_tests::run;
use minifier::Compilation;
use parser::settings::OutputFormat;
use parser::{CodeSettings, TreeModifications};

// =============================================================================
// Preprocessor Directives
// =============================================================================

#[test]
fn test_ifdef_selects_branch() {
    let mut settings = CodeSettings::default();
    settings.set_preprocessor_defines("FEATURE").unwrap();
    let source = "///#IFDEF feature\nyes();\n///#ELSE\nno();\n///#ENDIF\n";
    assert_eq!(run(&settings, source).code, "yes()");
    assert_eq!(run(&CodeSettings::default(), source).code, "no()");
}

#[test]
fn test_debug_block_stripped() {
    let output = run(
        &CodeSettings::default(),
        "a();\n///#DEBUG\nlog();\n///#ENDDEBUG\nb();",
    );
    assert_eq!(output.code, "a(),b()");
    assert!(output.undefined.iter().all(|r| r.name != "log"));
}

#[test]
fn test_source_directive_remaps_reports() {
    let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
    compilation.add_source("bundle.js", "///#SOURCE 10 3 original.js\nmissing();");
    compilation.minify();
    let undefined = compilation.undefined_references();
    assert_eq!(undefined.len(), 1);
    assert_eq!(undefined[0].span.start.line, 10);
    assert_eq!(undefined[0].span.start.column, 3);
    assert_eq!(
        compilation.ast().file_name(undefined[0].span.file),
        Some("original.js")
    );
}

// =============================================================================
// Multiple Chunks
// =============================================================================

#[test]
fn test_forward_reference_across_chunks() {
    let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
    compilation.add_source("main.js", "helper();");
    compilation.add_source("lib.js", "function helper() { return 1; }");
    compilation.minify();
    let output = compilation.emit();
    assert!(output.undefined.is_empty());
    assert_eq!(output.code, "helper();function helper(){return 1}");
}

#[test]
fn test_undefined_name_reported_once() {
    let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
    compilation.add_source("one.js", "missing();");
    compilation.add_source("two.js", "missing();");
    compilation.minify();
    let output = compilation.emit();
    let reported = output
        .diagnostics
        .iter()
        .filter(|d| d.code == ErrorCode::UndeclaredFunction)
        .count();
    assert_eq!(reported, 1);
    assert_eq!(output.undefined.len(), 2);
}

// =============================================================================
// JSON Output
// =============================================================================

#[test]
fn test_json_output() {
    let mut settings = CodeSettings::default();
    settings.output_mode = OutputFormat::Json;
    let output = run(&settings, "[1, 2.50, \"a\\u0041\", { \"k\": false }]");
    assert_eq!(output.code, "[1,2.5,\"aA\",{\"k\":false}]");
    assert!(output.diagnostics.is_empty());
}

#[test]
fn test_json_output_rejects_code() {
    let mut settings = CodeSettings::default();
    settings.output_mode = OutputFormat::Json;
    let output = run(&settings, "function f() {}");
    assert!(output.code.is_empty());
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.code == ErrorCode::InvalidJsonOutput));
}

// =============================================================================
// Comments
// =============================================================================

#[test]
fn test_important_comment_preserved() {
    let output = run(&CodeSettings::default(), "/*! keep me */\nvar a = 1;");
    assert!(output.code.starts_with("/*! keep me */\n"), "{}", output.code);
    assert!(output.code.ends_with("var a=1"), "{}", output.code);

    let mut settings = CodeSettings::default();
    settings.preserve_important_comments = false;
    assert_eq!(run(&settings, "/*! keep me */\nvar a = 1;").code, "var a=1");
}

#[test]
fn test_conditional_comment_kept() {
    let output = run(&CodeSettings::default(), "/*@cc_on @*/\nx = 1;");
    assert!(output.code.starts_with("/*@cc_on"), "{}", output.code);
    assert!(output.code.contains("@*/"), "{}", output.code);
    assert!(output.code.ends_with("x=1"), "{}", output.code);
    assert!(output.undefined.iter().all(|r| r.name != "cc_on"));
}

#[test]
fn test_conditional_if_keeps_markers() {
    let output = run(&CodeSettings::default(), "/*@if (@_jscript) a = 1; @end @*/");
    assert!(output.code.starts_with("/*@if(@_jscript)"), "{}", output.code);
    assert!(output.code.contains("@end"), "{}", output.code);
}

#[test]
fn test_kill_switch_reaches_every_pass() {
    let mut settings = CodeSettings::default();
    settings.kill_switch = TreeModifications::BRACKET_MEMBER_TO_DOT_MEMBER
        | TreeModifications::COMBINE_ADJACENT_EXPRESSION_STATEMENTS;
    let output = run(&settings, "a['b'](); c();");
    assert_eq!(output.code, "a[\"b\"]();c()");
}
