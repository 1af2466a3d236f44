//! Semantic analysis
//!
//! A single depth-first walk over a parsed chunk. Declarations were already
//! registered by the parser, so every lookup can be resolved here against
//! the complete scope chain, forward references included.
//!
//! For each lookup the analyzer:
//! - resolves the name through the scope chain, creating shims in the
//!   scopes it crosses (see [`ScopeTree::reference`])
//! - classifies the reference as variable, function or constructor use
//! - records unresolved names in the undefined-reference channel
//! - flags bindings whose runtime resolution may differ (`with`, named
//!   function expressions)

use std::collections::HashSet;
use std::sync::OnceLock;

use core_types::{Diagnostic, ErrorCode, ReferenceType, SourceSpan};
use tracing::{debug, debug_span, trace};

use crate::ast::{Ast, NodeId, NodeKind, UnaryOp};
use crate::scope::{FieldId, FieldKind, ScopeId, ScopeKind, ScopeTree};
use crate::settings::{CodeSettings, EvalTreatment};

/// Browser and ECMAScript globals that never produce undeclared-name
/// diagnostics.
const PREDEFINED_GLOBALS: &[&str] = &[
    "Array", "ArrayBuffer", "BigInt", "Boolean", "DataView", "Date", "Error", "EvalError",
    "Float32Array", "Float64Array", "Function", "Infinity", "Int16Array", "Int32Array",
    "Int8Array", "Intl", "JSON", "Map", "Math", "NaN", "Number", "Object", "Promise", "Proxy",
    "RangeError", "ReferenceError", "Reflect", "RegExp", "Set", "String", "Symbol",
    "SyntaxError", "TypeError", "URIError", "Uint16Array", "Uint32Array", "Uint8Array",
    "Uint8ClampedArray", "WeakMap", "WeakSet", "ActiveXObject", "XMLHttpRequest", "alert",
    "clearInterval", "clearTimeout", "confirm", "console", "decodeURI",
    "decodeURIComponent", "document", "encodeURI", "encodeURIComponent", "escape", "eval",
    "event", "frames", "globalThis", "history", "isFinite", "isNaN", "localStorage",
    "location", "navigator", "parent", "parseFloat", "parseInt", "prompt", "screen", "self",
    "sessionStorage", "setInterval", "setTimeout", "top", "undefined", "unescape", "window",
];

fn predefined_globals() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| PREDEFINED_GLOBALS.iter().copied().collect())
}

/// Whether `name` is a well-known browser or ECMAScript global.
pub fn is_predefined_global(name: &str) -> bool {
    predefined_globals().contains(name)
}

/// Whether an expression is rooted at one of the configured debug lookups,
/// such as `Debug.assert(...)` or `$Debug.trace`.
///
/// # Examples
///
/// ```
/// use parser::{parse, analyzer::is_debug_reference};
/// use parser::settings::CodeSettings;
///
/// let settings = CodeSettings::default();
/// let parsed = parse("Debug.write('x'); console.log(1);", &settings);
/// let statements = parsed.ast.statements(parsed.root).to_vec();
/// assert!(is_debug_reference(&parsed.ast, statements[0], &settings));
/// assert!(!is_debug_reference(&parsed.ast, statements[1], &settings));
/// ```
pub fn is_debug_reference(ast: &Ast, expression: NodeId, settings: &CodeSettings) -> bool {
    let mut root = ast.unwrap_grouping(expression);
    loop {
        root = match ast.kind(root) {
            NodeKind::Call { callee, .. } => *callee,
            NodeKind::Binary { op, left, .. } if op.is_assignment() => *left,
            _ => break,
        };
    }
    let Some(chain) = ast.member_chain(root) else {
        return false;
    };
    settings.debug_lookups().iter().any(|lookup| {
        chain == *lookup
            || (chain.len() > lookup.len()
                && chain.starts_with(lookup.as_str())
                && chain.as_bytes()[lookup.len()] == b'.')
    })
}

/// Resolves every lookup of one chunk.
pub struct Analyzer<'a> {
    ast: &'a mut Ast,
    scopes: &'a mut ScopeTree,
    settings: &'a CodeSettings,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Analyzer<'a> {
    /// Create an analyzer over a parsed tree and its scopes.
    pub fn new(ast: &'a mut Ast, scopes: &'a mut ScopeTree, settings: &'a CodeSettings) -> Self {
        Self {
            ast,
            scopes,
            settings,
            diagnostics: Vec::new(),
        }
    }

    /// Walk the chunk rooted at `root` and return the diagnostics found.
    pub fn analyze(mut self, root: NodeId) -> Vec<Diagnostic> {
        let span = debug_span!("analyze", root = root.0);
        let _enter = span.enter();
        let scope = match self.ast.kind(root) {
            NodeKind::Program { scope, .. } => *scope,
            _ => self.scopes.global(),
        };
        self.visit(root, scope);
        debug!(
            diagnostics = self.diagnostics.len(),
            undefined = self.scopes.undefined_references().len(),
            "analysis complete"
        );
        self.diagnostics
    }

    fn visit(&mut self, node: NodeId, scope: ScopeId) {
        let inner = match self.ast.kind(node) {
            NodeKind::Lookup { .. } => {
                self.resolve_lookup(node, scope);
                return;
            }
            NodeKind::Program { scope, .. }
            | NodeKind::FunctionObject { scope, .. }
            | NodeKind::Class { scope, .. } => *scope,
            NodeKind::Block { scope: Some(s), .. }
            | NodeKind::For { scope: Some(s), .. }
            | NodeKind::ForIn { scope: Some(s), .. }
            | NodeKind::Switch { scope: Some(s), .. } => *s,
            NodeKind::With {
                object,
                body,
                scope: with_scope,
            } => {
                let (object, body, with_scope) = (*object, *body, *with_scope);
                self.visit(object, scope);
                self.visit(body, with_scope);
                return;
            }
            NodeKind::Try {
                body,
                catch_binding,
                catch_body,
                catch_scope,
                finally,
            } => {
                let (body, catch_binding, catch_body, catch_scope, finally) =
                    (*body, *catch_binding, *catch_body, *catch_scope, *finally);
                self.visit(body, scope);
                let catch_scope = catch_scope.unwrap_or(scope);
                for id in catch_binding.into_iter().chain(catch_body) {
                    self.visit(id, catch_scope);
                }
                if let Some(finally) = finally {
                    self.visit(finally, scope);
                }
                return;
            }
            NodeKind::Call { callee, .. } => {
                let callee = *callee;
                if self.is_eval(callee) {
                    self.apply_eval_policy(scope);
                }
                scope
            }
            _ => scope,
        };
        for child in self.ast.children(node) {
            self.visit(child, inner);
        }
    }

    fn is_eval(&self, callee: NodeId) -> bool {
        matches!(self.ast.kind(callee), NodeKind::Lookup { name, .. } if name == "eval")
    }

    fn apply_eval_policy(&mut self, scope: ScopeId) {
        let affected: Vec<ScopeId> = match self.settings.eval_treatment {
            EvalTreatment::Ignore => return,
            EvalTreatment::MakeImmediateSafe => {
                let variable_scope = self.scopes.variable_scope(scope);
                let mut chain: Vec<ScopeId> = self
                    .scopes
                    .ancestors(scope)
                    .take_while(|s| *s != variable_scope)
                    .collect();
                chain.push(variable_scope);
                chain
            }
            EvalTreatment::MakeAllSafe => self.scopes.ancestors(scope).collect(),
        };
        for s in affected {
            self.scopes.make_unknown(s);
        }
        trace!(scope = scope.0, "eval makes scope unknown at compile time");
    }

    fn reference_type(&self, node: NodeId) -> ReferenceType {
        match self.ast.parent(node).map(|p| self.ast.kind(p)) {
            Some(NodeKind::Call { callee, is_new, .. }) if *callee == node => {
                if *is_new {
                    ReferenceType::Constructor
                } else {
                    ReferenceType::Function
                }
            }
            _ => ReferenceType::Variable,
        }
    }

    fn is_typeof_operand(&self, node: NodeId) -> bool {
        matches!(
            self.ast.parent(node).map(|p| self.ast.kind(p)),
            Some(NodeKind::Unary {
                op: UnaryOp::Typeof,
                ..
            })
        )
    }

    fn resolve_lookup(&mut self, node: NodeId, scope: ScopeId) {
        let name = match self.ast.kind(node) {
            NodeKind::Lookup { name, .. } => name.clone(),
            _ => return,
        };
        let span = self.ast.context(node);
        let ref_type = self.reference_type(node);

        let chain: Vec<ScopeId> = self.scopes.ancestors(scope).collect();
        let mut found = chain
            .iter()
            .position(|s| self.scopes.find_local(*s, &name).is_some());

        if name == "arguments" {
            if let Some(owner) = self.scopes.arguments_scope(scope) {
                let owner_index = chain.iter().position(|s| *s == owner);
                if found.map_or(true, |f| Some(f) > owner_index) {
                    self.scopes.create_field(owner, &name, FieldKind::Arguments);
                    found = owner_index;
                }
            }
        }

        let limit = found.unwrap_or(chain.len());
        let with_scope = chain[..limit]
            .iter()
            .copied()
            .find(|s| self.scopes.scope(*s).kind == ScopeKind::With);
        let found_field = found.and_then(|i| self.scopes.find_local(chain[i], &name));

        let target = match (with_scope, found_field) {
            (Some(with_scope), outer) => self.with_field(with_scope, &name, outer, span),
            (None, Some(field)) => {
                self.check_resolved(field, &name, span, ref_type, node);
                field
            }
            (None, None) => self.unresolved(&name, span, ref_type, node),
        };

        let local = self.scopes.reference(scope, target);
        if let NodeKind::Lookup {
            field,
            ref_type: slot,
            ..
        } = self.ast.kind_mut(node)
        {
            *field = Some(local);
            *slot = ref_type;
        }
    }

    /// Creates the field a lookup inside a with statement binds to. The
    /// object may or may not have the property, so the outer binding keeps
    /// its name.
    fn with_field(
        &mut self,
        with_scope: ScopeId,
        name: &str,
        outer: Option<FieldId>,
        span: SourceSpan,
    ) -> FieldId {
        let field = self.scopes.create_field(with_scope, name, FieldKind::WithField);
        self.scopes.field_mut(field).outer_field = outer;
        if let Some(outer) = outer {
            let root = self.scopes.outermost(outer);
            let root_field = self.scopes.field_mut(root);
            if matches!(
                root_field.kind,
                FieldKind::Local | FieldKind::Argument | FieldKind::CatchError
            ) {
                root_field.can_crunch = false;
                trace!(name, "with statement makes local non-crunchable");
                self.diagnostics.push(Diagnostic::new(
                    ErrorCode::AmbiguousWithReference,
                    span,
                    format!("reference to '{}' inside with statement is ambiguous", name),
                ));
            }
        }
        field
    }

    fn check_resolved(
        &mut self,
        field: FieldId,
        name: &str,
        span: SourceSpan,
        ref_type: ReferenceType,
        node: NodeId,
    ) {
        let global = self.scopes.global();
        let f = self.scopes.field(field);
        match f.kind {
            FieldKind::Ghost => {
                if f.is_ambiguous {
                    return;
                }
                let func = f.value;
                self.scopes.field_mut(field).is_ambiguous = true;
                if let Some(func) = func {
                    self.mark_function_name_ambiguous(func, name);
                }
                self.diagnostics.push(Diagnostic::new(
                    ErrorCode::AmbiguousNamedFunctionExpression,
                    span,
                    format!(
                        "'{}' refers to a named function expression outside of its body",
                        name
                    ),
                ));
            }
            FieldKind::Global if f.scope == global && !f.is_declared() => {
                self.record_undefined(name, span, ref_type, node);
            }
            _ => {}
        }
    }

    fn mark_function_name_ambiguous(&mut self, func: NodeId, name: &str) {
        if let NodeKind::FunctionObject {
            name_scope: Some(name_scope),
            ..
        } = self.ast.kind(func)
        {
            if let Some(inner) = self.scopes.find_local(*name_scope, name) {
                let preserve = self.settings.preserve_function_names;
                let inner = self.scopes.field_mut(inner);
                inner.is_ambiguous = true;
                if preserve {
                    inner.can_crunch = false;
                }
            }
        }
    }

    fn unresolved(&mut self, name: &str, span: SourceSpan, ref_type: ReferenceType, node: NodeId) -> FieldId {
        let global = self.scopes.global();
        if self.settings.is_known_global(name) || is_predefined_global(name) {
            return self.scopes.create_field(global, name, FieldKind::Predefined);
        }
        let field = self.scopes.create_field(global, name, FieldKind::Global);
        self.record_undefined(name, span, ref_type, node);
        field
    }

    fn record_undefined(&mut self, name: &str, span: SourceSpan, ref_type: ReferenceType, node: NodeId) {
        let report = !self.is_typeof_operand(node);
        if !self.scopes.record_undefined(name, span, ref_type, report) {
            return;
        }
        let (code, what) = match ref_type {
            ReferenceType::Variable => (ErrorCode::UndeclaredVariable, "variable"),
            ReferenceType::Function | ReferenceType::Constructor => {
                (ErrorCode::UndeclaredFunction, "function")
            }
        };
        self.diagnostics.push(Diagnostic::new(
            code,
            span,
            format!("undeclared {} '{}'", what, name),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn lookup_field(parsed: &crate::Parsed, name: &str) -> Vec<FieldId> {
        parsed
            .ast
            .descendants(parsed.root)
            .into_iter()
            .filter_map(|id| match parsed.ast.kind(id) {
                NodeKind::Lookup { name: n, field, .. } if n == name => *field,
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_hoisted_reference_resolves() {
        let parsed = parse("function f() { x = 1; var x; }", &CodeSettings::default());
        assert!(parsed.diagnostics.is_empty());
        assert!(parsed.scopes.undefined_references().is_empty());
    }

    #[test]
    fn test_undeclared_reported_once() {
        let parsed = parse("foo(); foo(); bar = 1;", &CodeSettings::default());
        let codes: Vec<_> = parsed.diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![ErrorCode::UndeclaredFunction, ErrorCode::UndeclaredVariable]
        );
        assert_eq!(parsed.scopes.undefined_references().len(), 3);
        assert_eq!(
            parsed.scopes.undefined_references()[0].reference_type,
            ReferenceType::Function
        );
    }

    #[test]
    fn test_typeof_operand_has_no_diagnostic() {
        let parsed = parse("if (typeof jQuery == 'undefined') {}", &CodeSettings::default());
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.scopes.undefined_references().len(), 1);
    }

    #[test]
    fn test_constructor_reference_type() {
        let parsed = parse("new Widget();", &CodeSettings::default());
        assert_eq!(
            parsed.scopes.undefined_references()[0].reference_type,
            ReferenceType::Constructor
        );
    }

    #[test]
    fn test_known_globals_are_silent() {
        let mut settings = CodeSettings::default();
        settings.set_known_global_names("jQuery").unwrap();
        let parsed = parse("jQuery(window); Math.max(1, 2);", &settings);
        assert!(parsed.diagnostics.is_empty());
        assert!(parsed.scopes.undefined_references().is_empty());
    }

    #[test]
    fn test_inner_field_shims() {
        let parsed = parse(
            "function outer() { var a = 1; function inner() { return a + a; } }",
            &CodeSettings::default(),
        );
        let fields = lookup_field(&parsed, "a");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], fields[1]);
        let shim = parsed.scopes.field(fields[0]);
        assert!(shim.is_shim());
        let declared = parsed.scopes.outermost(fields[0]);
        assert_eq!(parsed.scopes.field(declared).ref_count, 2);
        assert!(parsed.scopes.field(declared).can_crunch);
    }

    #[test]
    fn test_arguments_field_created_lazily() {
        let parsed = parse("function f() { return () => arguments[0]; }", &CodeSettings::default());
        assert!(parsed.diagnostics.is_empty());
        let field = lookup_field(&parsed, "arguments")[0];
        let root = parsed.scopes.outermost(field);
        assert_eq!(parsed.scopes.field(root).kind, FieldKind::Arguments);
        assert!(!parsed.scopes.field(root).can_crunch);
    }

    #[test]
    fn test_with_marks_locals_non_crunchable() {
        let parsed = parse(
            "function f(o) { var x = 1; with (o) { x = 2; } }",
            &CodeSettings::default(),
        );
        assert!(parsed
            .diagnostics
            .iter()
            .any(|d| d.code == ErrorCode::AmbiguousWithReference));
        let field = lookup_field(&parsed, "x")[0];
        let root = parsed.scopes.outermost(field);
        assert_eq!(parsed.scopes.field(root).name, "x");
        assert!(!parsed.scopes.field(root).can_crunch);
    }

    #[test]
    fn test_with_unresolved_name_is_not_undefined() {
        let parsed = parse("function f(o) { with (o) { y(); } }", &CodeSettings::default());
        assert!(parsed.scopes.undefined_references().is_empty());
    }

    #[test]
    fn test_eval_policy() {
        let source = "function f() { var a; function g() { eval('a'); } }";
        let parsed = parse(source, &CodeSettings::default());
        assert!(parsed
            .scopes
            .scopes_top_down()
            .iter()
            .all(|s| parsed.scopes.is_known_at_compile_time(*s)));

        let mut settings = CodeSettings::default();
        settings.eval_treatment = EvalTreatment::MakeImmediateSafe;
        let parsed = parse(source, &settings);
        let unknown = parsed
            .scopes
            .scopes_top_down()
            .into_iter()
            .filter(|s| !parsed.scopes.is_known_at_compile_time(*s))
            .count();
        assert_eq!(unknown, 1);

        settings.eval_treatment = EvalTreatment::MakeAllSafe;
        let parsed = parse(source, &settings);
        assert!(parsed
            .scopes
            .scopes_top_down()
            .iter()
            .all(|s| !parsed.scopes.is_known_at_compile_time(*s)));
    }

    #[test]
    fn test_named_function_expression_outside_reference() {
        let parsed = parse(
            "var f = function foo() { return foo; }; foo();",
            &CodeSettings::default(),
        );
        assert!(parsed
            .diagnostics
            .iter()
            .any(|d| d.code == ErrorCode::AmbiguousNamedFunctionExpression));
    }

    #[test]
    fn test_debug_reference_detection() {
        let mut settings = CodeSettings::default();
        settings.set_debug_lookups("My.Debug").unwrap();
        let parsed = parse("My.Debug.log(1); My.Debugger(1);", &settings);
        let statements = parsed.ast.statements(parsed.root).to_vec();
        assert!(is_debug_reference(&parsed.ast, statements[0], &settings));
        assert!(!is_debug_reference(&parsed.ast, statements[1], &settings));
    }
}
