//! Contract tests for parser API
//!
//! These tests verify the parser component implements its contract correctly.

use core_types::{ErrorCode, ReferenceType};
use parser::ast::{BinaryOp, FunctionKind, Literal};
use parser::lexer::SpannedToken;
use parser::settings::{EvalTreatment, LocalRenaming, OutputFormat, SourceMode};
use parser::{
    parse, Analyzer, Ast, CodeSettings, FieldKind, Keyword, Lexer, NodeKind, Parser, Punctuator,
    ScopeKind, ScopeReport, ScopeTree, Token, TreeModifications,
};

fn tokens(source: &str) -> Vec<SpannedToken> {
    let settings = CodeSettings::default();
    let mut lexer = Lexer::new(source, &settings);
    let mut out = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.token == Token::EOF {
            break;
        }
        out.push(token);
    }
    out
}

// =============================================================================
// Lexer Contract Tests
// =============================================================================

#[test]
fn test_lexer_produces_typed_tokens() {
    let kinds: Vec<Token> = tokens("let x = 42.5;").into_iter().map(|t| t.token).collect();
    assert_eq!(
        kinds,
        vec![
            Token::Keyword(Keyword::Let),
            Token::Identifier("x".to_string(), false),
            Token::Punctuator(Punctuator::Assign),
            Token::Number(42.5),
            Token::Punctuator(Punctuator::Semicolon),
        ]
    );
}

#[test]
fn test_lexer_tracks_positions() {
    let toks = tokens("a\n  b");
    assert_eq!(toks[1].span.start.line, 2);
    assert_eq!(toks[1].span.start.column, 3);
    assert!(toks[1].newline_before);
}

#[test]
fn test_lexer_disambiguates_slash() {
    let toks = tokens("a / b; x = /re/g;");
    assert_eq!(toks[1].token, Token::Punctuator(Punctuator::Slash));
    assert!(toks
        .iter()
        .any(|t| t.token == Token::RegExp("re".to_string(), "g".to_string())));
}

#[test]
fn test_lexer_recovers_from_unterminated_string() {
    let settings = CodeSettings::default();
    let mut lexer = Lexer::new("var a = 'oops\nvar b = 1;", &settings);
    let mut count = 0;
    while lexer.next_token().token != Token::EOF {
        count += 1;
    }
    assert!(count > 5);
    let diagnostics = lexer.take_diagnostics();
    assert_eq!(diagnostics[0].code, ErrorCode::UnterminatedString);
}

#[test]
fn test_lexer_conditional_compilation_tokens() {
    let toks = tokens("/*@cc_on @*/");
    assert!(matches!(toks[0].token, Token::ConditionalComment(_)));
}

// =============================================================================
// Parser Contract Tests
// =============================================================================

#[test]
fn test_parser_builds_program() {
    let mut ast = Ast::new();
    let mut scopes = ScopeTree::new();
    let settings = CodeSettings::default();
    let output = Parser::new("var a = 1 + 2 * 3;", "a.js", &settings, &mut ast, &mut scopes).parse();
    assert!(output.diagnostics.is_empty());
    assert!(output.aborted.is_none());
    assert_eq!(ast.statements(output.root).len(), 1);
    assert_eq!(ast.file_name(ast.context(output.root).file), Some("a.js"));
    assert!(ast.check_parent_links(output.root));
}

#[test]
fn test_parser_collects_multiple_errors() {
    let parsed = parse("var = 1;\nfoo(;\nvar ok = 2;", &CodeSettings::default());
    let errors = parsed.diagnostics.iter().filter(|d| d.is_error()).count();
    assert!(errors >= 2);
    let global = parsed.scopes.global();
    assert!(parsed.scopes.find_local(global, "ok").is_some());
}

#[test]
fn test_parser_abort_keeps_partial_tree() {
    let parsed = parse("var a = 1;\nvar b = [1, 2", &CodeSettings::default());
    assert!(parsed.aborted.is_some());
    assert!(!parsed.ast.statements(parsed.root).is_empty());
}

#[test]
fn test_parser_modern_syntax() {
    let source = r#"
        const { a, ...rest } = obj;
        let [x = 1, , y] = arr;
        async function* gen() { yield* other(); await x; }
        class C extends B { #p = 1; static s() { return super.s?.() ?? 0; } }
        for (const k of list) { label: for (k2 in o) { continue label; } }
        const t = tag`a${b}c${`nested${d}`}`;
        const big = 10n ** 2n;
        function f() { return new.target; }
    "#;
    let parsed = parse(source, &CodeSettings::default());
    let errors: Vec<_> = parsed.diagnostics.iter().filter(|d| d.is_error()).collect();
    assert!(errors.is_empty(), "{:?}", errors);
}

#[test]
fn test_parser_module_mode() {
    let mut settings = CodeSettings::default();
    settings.source_mode = SourceMode::Module;
    let parsed = parse(
        "import def, { named as local } from './m.js'; export default function () {} export { local };",
        &settings,
    );
    assert!(parsed.diagnostics.iter().all(|d| !d.is_error()));
    let module = parsed.scopes.scope(parsed.scopes.global()).children[0];
    assert_eq!(parsed.scopes.scope(module).kind, ScopeKind::Module);
    assert!(parsed.scopes.scope(module).use_strict);
}

#[test]
fn test_parser_arrow_parameters_scope() {
    let parsed = parse("var f = ({ a, b = () => a }) => a + b();", &CodeSettings::default());
    assert!(parsed.diagnostics.is_empty());
    let arrows: Vec<_> = parsed
        .ast
        .descendants(parsed.root)
        .into_iter()
        .filter(|id| {
            matches!(
                parsed.ast.kind(*id),
                NodeKind::FunctionObject {
                    kind: FunctionKind::Arrow,
                    ..
                }
            )
        })
        .collect();
    assert_eq!(arrows.len(), 2);
    if let NodeKind::FunctionObject { scope, .. } = parsed.ast.kind(arrows[0]) {
        let outer = *scope;
        let inner = parsed.scopes.scope(outer).children[0];
        assert_eq!(parsed.scopes.scope(inner).parent, Some(outer));
    }
}

#[test]
fn test_parser_binary_tree_shape() {
    let parsed = parse("a = b || c && d", &CodeSettings::default());
    let statement = parsed.ast.statements(parsed.root)[0];
    match parsed.ast.kind(statement) {
        NodeKind::Binary {
            op: BinaryOp::Assign,
            right,
            ..
        } => assert!(matches!(
            parsed.ast.kind(*right),
            NodeKind::Binary {
                op: BinaryOp::Or,
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

// =============================================================================
// AST Editing Contract Tests
// =============================================================================

#[test]
fn test_ast_concise_body_expands_on_insert() {
    let mut parsed = parse("var f = (a) => a * 2;", &CodeSettings::default());
    let body = parsed
        .ast
        .descendants(parsed.root)
        .into_iter()
        .find(|id| parsed.ast.is_concise(*id))
        .unwrap();
    let debugger = parsed.ast.alloc(NodeKind::Debugger, Default::default());
    parsed.ast.append(body, debugger);
    assert!(!parsed.ast.is_concise(body));
    let statements = parsed.ast.statements(body).to_vec();
    assert!(matches!(parsed.ast.kind(statements[0]), NodeKind::Return { .. }));
    assert_eq!(statements[1], debugger);
    assert!(parsed.ast.check_parent_links(parsed.root));
}

#[test]
fn test_ast_structural_equivalence() {
    let parsed = parse("x.y(1, 'a'); x.y(1, 'a'); x.y(2, 'a');", &CodeSettings::default());
    let s = parsed.ast.statements(parsed.root).to_vec();
    assert!(parsed.ast.is_equivalent(s[0], s[1]));
    assert!(!parsed.ast.is_equivalent(s[0], s[2]));
    assert_ne!(s[0], s[1]);
}

#[test]
fn test_ast_replace_reparents() {
    let mut parsed = parse("f(a);", &CodeSettings::default());
    let call = parsed.ast.statements(parsed.root)[0];
    let argument = parsed.ast.children(call)[1];
    let constant = parsed
        .ast
        .alloc(NodeKind::Constant(Literal::Number(1.0)), Default::default());
    assert!(parsed.ast.replace(argument, constant));
    assert_eq!(parsed.ast.parent(constant), Some(call));
    assert_eq!(parsed.ast.parent(argument), None);
}

// =============================================================================
// Scope and Analysis Contract Tests
// =============================================================================

#[test]
fn test_analysis_resolves_forward_references() {
    let parsed = parse("function f() { return g(); } function g() { return 1; }", &CodeSettings::default());
    assert!(parsed.scopes.undefined_references().is_empty());
}

#[test]
fn test_analysis_runs_per_chunk_over_shared_scopes() {
    let settings = CodeSettings::default();
    let mut ast = Ast::new();
    let mut scopes = ScopeTree::new();
    let first = Parser::new("var shared = 1;", "a.js", &settings, &mut ast, &mut scopes).parse();
    Analyzer::new(&mut ast, &mut scopes, &settings).analyze(first.root);
    let second = Parser::new("shared++;", "b.js", &settings, &mut ast, &mut scopes).parse();
    let diagnostics = Analyzer::new(&mut ast, &mut scopes, &settings).analyze(second.root);
    assert!(diagnostics.is_empty());
    let global = scopes.global();
    let field = scopes.find_local(global, "shared").unwrap();
    assert_eq!(scopes.field(field).ref_count, 1);
    assert_eq!(scopes.field(field).kind, FieldKind::Global);
}

#[test]
fn test_undefined_reference_channel_sorted_in_report() {
    let parsed = parse("beta(); Alpha; alpha();", &CodeSettings::default());
    let report = ScopeReport::new(&parsed.scopes);
    let names: Vec<&str> = report.undefined.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "alpha", "beta"]);
    assert_eq!(report.undefined[2].reference_type, ReferenceType::Function);
}

// =============================================================================
// Settings Contract Tests
// =============================================================================

#[test]
fn test_settings_defaults() {
    let settings = CodeSettings::default();
    assert_eq!(settings.local_renaming, LocalRenaming::CrunchAll);
    assert_eq!(settings.eval_treatment, EvalTreatment::Ignore);
    assert_eq!(settings.output_mode, OutputFormat::SingleLine);
    assert!(settings.minify_code);
    assert!(settings.is_modification_allowed(TreeModifications::EVALUATE_NUMERIC_EXPRESSIONS));
}

#[test]
fn test_settings_reject_invalid_names() {
    let mut settings = CodeSettings::default();
    assert!(settings.set_rename_pairs("good=g").is_ok());
    assert!(settings.set_rename_pairs("bad name=x").is_err());
    assert!(settings.set_no_auto_rename("class").is_err());
}

#[test]
fn test_settings_from_json() {
    let settings = CodeSettings::from_json(r#"{ "strict_mode": true, "indent_size": 2 }"#).unwrap();
    assert!(settings.strict_mode);
    assert_eq!(settings.indent_size, 2);
    assert!(CodeSettings::from_json("{ not json").is_err());
}
