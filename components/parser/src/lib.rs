//! JavaScript Parser Component
//!
//! Turns JavaScript source into an arena syntax tree with a fully analyzed
//! scope tree. This is the front half of the minifier: the `minifier` crate
//! transforms what this crate produces and writes it back out.
//!
//! # Overview
//!
//! - [`CodeSettings`] - Options and the [`TreeModifications`] kill-switch bits
//! - [`Lexer`] - Tokenizes source, including preprocessor directives
//! - [`Parser`] - Recursive descent parser building the [`Ast`]
//! - [`Ast`] - Arena of nodes with parent links and list editing
//! - [`ScopeTree`] - Scopes, fields and the undefined-reference channel
//! - [`Analyzer`] - Resolves every lookup against the scope chain
//! - [`ScopeReport`] - Read-only snapshot for scope reports
//!
//! # Example
//!
//! ```
//! use parser::{parse, CodeSettings, NodeKind};
//!
//! let parsed = parse("var answer = 42; log(answer);", &CodeSettings::default());
//! assert_eq!(parsed.ast.statements(parsed.root).len(), 2);
//!
//! // `log` is undeclared and lands in the undefined-reference channel
//! assert_eq!(parsed.scopes.undefined_references()[0].name, "log");
//! assert!(matches!(parsed.ast.kind(parsed.root), NodeKind::Program { .. }));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyzer;
pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod precedence;
pub mod replacement;
pub mod report;
pub mod scope;
pub mod settings;

pub use analyzer::Analyzer;
pub use ast::{Ast, Literal, Node, NodeId, NodeKind};
pub use error::ParseAbort;
pub use lexer::{Keyword, Lexer, Punctuator, Token};
pub use parser::{ParseOutput, Parser};
pub use report::ScopeReport;
pub use scope::{FieldId, FieldKind, ScopeId, ScopeKind, ScopeTree};
pub use settings::{CodeSettings, TreeModifications};

use core_types::Diagnostic;

/// A single chunk parsed and analyzed in a fresh tree.
#[derive(Debug, Clone)]
pub struct Parsed {
    /// Syntax tree
    pub ast: Ast,
    /// Scope tree
    pub scopes: ScopeTree,
    /// Program node
    pub root: NodeId,
    /// Parse and analysis diagnostics
    pub diagnostics: Vec<Diagnostic>,
    /// Set when the input ended inside a construct
    pub aborted: Option<ParseAbort>,
}

/// Parse and analyze one source text on its own.
pub fn parse(source: &str, settings: &CodeSettings) -> Parsed {
    let mut ast = Ast::new();
    let mut scopes = ScopeTree::new();
    let output = Parser::new(source, "input", settings, &mut ast, &mut scopes).parse();
    let mut diagnostics = output.diagnostics;
    diagnostics.extend(Analyzer::new(&mut ast, &mut scopes, settings).analyze(output.root));
    Parsed {
        ast,
        scopes,
        root: output.root,
        diagnostics,
        aborted: output.aborted,
    }
}
