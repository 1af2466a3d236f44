//! Replacement Token Tests
//!
//! `%name%` and `%name:fallback%` markers inside string literals and in
//! expression position, with and without configured values.

use integration_tests::{reprint, run};
use parser::CodeSettings;

fn configured() -> CodeSettings {
    let mut settings = CodeSettings::default();
    settings.add_replacement_token("mytoken", "\"Now he's done it!\"");
    settings.add_replacement_token("numtoken", "123");
    settings.add_replacement_token("myjson", "{\"a\": 1, \"b\": 2, \"c\": [ 1, 2, 3 ] }");
    settings.add_replacement_fallback("zero", "0");
    settings
}

// =============================================================================
// Markers Inside Strings
// =============================================================================

#[test]
fn test_string_markers_left_without_values() {
    let settings = CodeSettings::default();
    assert_eq!(
        reprint(&settings, "var a = 'He said, %MyToken:foo%'"),
        "var a=\"He said, %MyToken:foo%\""
    );
}

#[test]
fn test_string_markers_substituted() {
    let settings = configured();
    assert_eq!(
        reprint(&settings, "var a = 'He said, %MyToken:foo%'"),
        "var a='He said, \"Now he\\'s done it!\"'"
    );
    assert_eq!(reprint(&settings, "var b = '%NumToken%';"), "var b=\"123\"");
    assert_eq!(
        reprint(&settings, "var c = '%MyJSON%';"),
        "var c='{\"a\": 1, \"b\": 2, \"c\": [ 1, 2, 3 ] }'"
    );
}

#[test]
fn test_string_marker_fallbacks() {
    let settings = configured();
    assert_eq!(reprint(&settings, "var d = '*%MissingToken:zero%*';"), "var d=\"*0*\"");
    assert_eq!(reprint(&settings, "var e = '*%MissingToken:ack%*';"), "var e=\"**\"");
    assert_eq!(reprint(&settings, "var f = '*%MissingToken:%*';"), "var f=\"**\"");
}

// =============================================================================
// Markers As Expressions
// =============================================================================

#[test]
fn test_expression_markers_left_without_values() {
    let settings = CodeSettings::default();
    assert_eq!(reprint(&settings, "var a = %MyToken:foo%;"), "var a=%MyToken:foo%");
}

#[test]
fn test_expression_markers_become_literals() {
    let settings = configured();
    assert_eq!(
        reprint(&settings, "var a = %MyToken:foo%;"),
        "var a=\"Now he's done it!\""
    );
    assert_eq!(reprint(&settings, "var b = %NumToken%;"), "var b=123");
    assert_eq!(
        reprint(&settings, "var c = %MyJSON%;"),
        "var c={\"a\":1,\"b\":2,\"c\":[1,2,3]}"
    );
}

#[test]
fn test_expression_marker_fallbacks() {
    let settings = configured();
    assert_eq!(reprint(&settings, "var a = %MissingToken:zero%;"), "var a=0");
    assert_eq!(reprint(&settings, "var b = %MissingToken:ack% + 0;"), "var b=+0");
    assert_eq!(reprint(&settings, "var c = %MissingToken:% + 0;"), "var c=+0");
}

#[test]
fn test_empty_marker_kept_through_minification() {
    let settings = configured();
    let output = run(&settings, "var d = %MissingToken:%;debugger;throw 'why?';");
    assert_eq!(output.code, "var d=;throw\"why?\";");
}

#[test]
fn test_values_from_json_settings() {
    let mut settings = CodeSettings::default();
    settings
        .set_replacement_tokens_json(r#"{"Greeting": "hi", "Limit": "10"}"#)
        .unwrap();
    assert_eq!(reprint(&settings, "x = [%greeting%, %LIMIT%];"), "x=[\"hi\",10]");
}
