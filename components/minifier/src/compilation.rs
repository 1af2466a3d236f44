//! Chunked compilation pipeline
//!
//! A [`Compilation`] owns one syntax tree and one scope tree. Every chunk
//! added to it parses into the shared tree, so later chunks see the global
//! declarations of earlier ones. Chunks are processed strictly in order:
//!
//! 1. [`Compilation::add_source`] scans and parses a chunk
//! 2. [`Compilation::analyze`] resolves references of chunks not yet analyzed
//! 3. [`Compilation::minify`] runs the transform passes and the renamer
//! 4. [`Compilation::emit`] writes all chunks as one output
//!
//! The tree stays reachable between steps through [`Compilation::ast_mut`],
//! so a host can edit it after minification and before emission.

use core_types::{ConfigurationError, Diagnostic, UndefinedReference};
use parser::settings::OutputFormat;
use parser::{Analyzer, Ast, CodeSettings, NodeId, Parser, ScopeReport, ScopeTree};
use serde::Serialize;
use tracing::{debug, debug_span};

use crate::emitter;
use crate::passes;
use crate::renamer;
use crate::source_map::Mapping;

/// One parsed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Program node of the chunk
    pub root: NodeId,
    /// Whether the input ended inside a construct
    pub aborted: bool,
    analyzed: bool,
}

/// Everything a compilation produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Output {
    /// Generated code
    pub code: String,
    /// Scanner, parser, analysis and output diagnostics, in that order
    pub diagnostics: Vec<Diagnostic>,
    /// Undefined references sorted for reporting
    pub undefined: Vec<UndefinedReference>,
    /// Source mappings, empty unless requested
    pub mappings: Vec<Mapping>,
}

impl Output {
    /// Whether any diagnostic is a hard error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Shared state of one logical compilation unit.
///
/// # Examples
///
/// ```
/// use minifier::Compilation;
/// use parser::CodeSettings;
///
/// let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
/// compilation.add_source("lib.js", "var shared = 1;");
/// compilation.add_source("app.js", "function f(value) { return value + shared; }");
/// compilation.minify();
///
/// let output = compilation.emit();
/// assert_eq!(output.code, "var shared=1;function f(n){return n+shared}");
/// assert!(output.undefined.is_empty());
/// ```
#[derive(Debug)]
pub struct Compilation {
    settings: CodeSettings,
    ast: Ast,
    scopes: ScopeTree,
    chunks: Vec<Chunk>,
    diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    /// Starts a compilation after validating the settings.
    pub fn new(settings: CodeSettings) -> Result<Self, ConfigurationError> {
        settings.validate()?;
        Ok(Self {
            settings,
            ast: Ast::new(),
            scopes: ScopeTree::new(),
            chunks: Vec::new(),
            diagnostics: Vec::new(),
        })
    }

    /// Parses one chunk into the shared trees and returns its Program node.
    pub fn add_source(&mut self, name: &str, source: &str) -> NodeId {
        let _span = debug_span!("parse", file = name).entered();
        let output = Parser::new(source, name, &self.settings, &mut self.ast, &mut self.scopes).parse();
        self.diagnostics.extend(output.diagnostics);
        self.chunks.push(Chunk {
            root: output.root,
            aborted: output.aborted.is_some(),
            analyzed: false,
        });
        output.root
    }

    /// Resolves references in every chunk not analyzed yet.
    pub fn analyze(&mut self) {
        for chunk in self.chunks.iter_mut().filter(|c| !c.analyzed) {
            let found = Analyzer::new(&mut self.ast, &mut self.scopes, &self.settings).analyze(chunk.root);
            self.diagnostics.extend(found);
            chunk.analyzed = true;
        }
    }

    /// Analyzes, transforms and renames. Returns the number of changes.
    ///
    /// Transform passes are skipped when `minify_code` is off and in JSON
    /// output mode; manual rename pairs always apply.
    pub fn minify(&mut self) -> usize {
        self.analyze();
        let _span = debug_span!("minify", chunks = self.chunks.len()).entered();
        let roots = self.roots();
        let mut changes = 0;
        if self.settings.minify_code && self.settings.output_mode != OutputFormat::Json {
            changes += passes::run_all(&mut self.ast, &self.scopes, &self.settings, &roots);
        }
        changes += renamer::rename(&mut self.ast, &mut self.scopes, &self.settings, &roots);
        debug!(changes, "minified");
        changes
    }

    /// Writes every chunk and collects the result channels.
    pub fn emit(&self) -> Output {
        let result = emitter::emit(&self.ast, &self.scopes, &self.settings, &self.roots());
        let mut diagnostics = self.diagnostics();
        diagnostics.extend(result.diagnostics.into_iter().map(|d| self.attach_file(d)));
        Output {
            code: result.code,
            diagnostics,
            undefined: self.undefined_references(),
            mappings: result.mappings,
        }
    }

    fn attach_file(&self, diagnostic: Diagnostic) -> Diagnostic {
        if diagnostic.file.is_some() {
            return diagnostic;
        }
        match self.ast.file_name(diagnostic.span.file) {
            Some(name) => {
                let name = name.to_string();
                diagnostic.with_file(name)
            }
            None => diagnostic,
        }
    }

    /// Diagnostics so far, each tagged with its file name.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .iter()
            .cloned()
            .map(|d| self.attach_file(d))
            .collect()
    }

    /// Every undefined reference, sorted by name, line and column.
    pub fn undefined_references(&self) -> Vec<UndefinedReference> {
        let mut references = self.scopes.undefined_references().to_vec();
        UndefinedReference::sort_for_report(&mut references);
        references
    }

    /// Snapshot of the scope tree for reporting.
    pub fn report(&self) -> ScopeReport {
        ScopeReport::new(&self.scopes)
    }

    /// Program nodes in chunk order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.chunks.iter().map(|c| c.root).collect()
    }

    /// Parsed chunks in order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The settings this compilation runs with.
    pub fn settings(&self) -> &CodeSettings {
        &self.settings
    }

    /// The shared syntax tree.
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Mutable access to the syntax tree, for edits between phases.
    pub fn ast_mut(&mut self) -> &mut Ast {
        &mut self.ast
    }

    /// The shared scope tree.
    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }
}

/// Minifies a single source text.
///
/// # Examples
///
/// ```
/// use minifier::minify;
/// use parser::CodeSettings;
///
/// let output = minify("var arrow = (a, b, c) => a * ( b + c);", &CodeSettings::default()).unwrap();
/// assert_eq!(output.code, "var arrow=(n,t,i)=>n*(t+i)");
/// ```
pub fn minify(source: &str, settings: &CodeSettings) -> Result<Output, ConfigurationError> {
    let mut compilation = Compilation::new(settings.clone())?;
    compilation.add_source("input", source);
    compilation.minify();
    Ok(compilation.emit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::ErrorCode;
    use parser::NodeKind;

    #[test]
    fn test_settings_carried() {
        let mut settings = CodeSettings::default();
        settings.output_mode = OutputFormat::SingleLine;
        assert!(Compilation::new(settings).is_ok());
        let settings = CodeSettings::from_json(r#"{"minify_code": false}"#).unwrap();
        assert!(!Compilation::new(settings).unwrap().settings().minify_code);
    }

    #[test]
    fn test_chunks_share_globals() {
        let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
        compilation.add_source("a.js", "function helper() {}");
        compilation.add_source("b.js", "helper();");
        compilation.minify();
        assert!(compilation.undefined_references().is_empty());
        assert_eq!(compilation.chunks().len(), 2);
        assert_eq!(compilation.emit().code, "function helper(){}helper()");
    }

    #[test]
    fn test_statement_open_at_chunk_end_is_terminated() {
        let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
        compilation.add_source("a.js", "var a = 1");
        compilation.add_source("b.js", "(a)");
        compilation.minify();
        assert_eq!(compilation.emit().code, "var a=1;a");
    }

    #[test]
    fn test_diagnostics_carry_file_names() {
        let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
        compilation.add_source("broken.js", "function f() { return 1;");
        compilation.minify();
        let output = compilation.emit();
        assert!(output.has_errors());
        assert!(output
            .diagnostics
            .iter()
            .all(|d| d.file.as_deref() == Some("broken.js")));
    }

    #[test]
    fn test_undefined_references_sorted() {
        let output = minify("zeta(); Alpha; beta();", &CodeSettings::default()).unwrap();
        let names: Vec<&str> = output.undefined.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_tree_edits_between_minify_and_emit() {
        let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
        let root = compilation.add_source("input", "var x = 1;");
        compilation.minify();
        let context = compilation.ast().context(root);
        let ast = compilation.ast_mut();
        let debugger = ast.alloc(NodeKind::Debugger, context);
        ast.append(root, debugger);
        assert_eq!(compilation.emit().code, "var x=1;debugger");
    }

    #[test]
    fn test_json_mode_skips_passes() {
        let mut settings = CodeSettings::default();
        settings.output_mode = OutputFormat::Json;
        let output = minify(r#"{"b": true, "a": [1, 2]}"#, &settings).unwrap();
        assert_eq!(output.code, r#"{"b":true,"a":[1,2]}"#);

        let output = minify("a = 1", &settings).unwrap();
        assert!(output.code.is_empty());
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.code == ErrorCode::InvalidJsonOutput));
    }

    #[test]
    fn test_report_covers_every_scope() {
        let mut compilation = Compilation::new(CodeSettings::default()).unwrap();
        compilation.add_source("input", "function f(a) { return function g() { return a; }; }");
        compilation.analyze();
        let report = compilation.report();
        assert!(report.scopes.len() >= 3);
    }
}
