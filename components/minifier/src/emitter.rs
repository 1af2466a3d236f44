//! Output emitter
//!
//! Walks the tree and writes JavaScript text. The writer only inserts a
//! space where two tokens would otherwise fuse (`a in b`, `a+ +b`), and
//! parentheses come from operator precedence rather than from the grouping
//! nodes the parser kept, so redundant parentheses in the source disappear.
//!
//! # Statement terminators
//!
//! Every statement writer reports whether the statement still needs a `;`
//! if something follows it. Lists write the separator lazily, so the last
//! statement of a block never gets one, and the end of a chunk only gets one
//! when `term_semicolons` is set or another chunk follows.
//!
//! # Output modes
//!
//! - `SingleLine`: minified text
//! - `MultipleLines`: one statement per line, indented by `indent_size`
//! - `Json`: exactly one JSON value; anything else is reported as
//!   [`ErrorCode::InvalidJsonOutput`] and produces no code

use core_types::{Diagnostic, ErrorCode, SourceSpan};
use parser::ast::{BinaryOp, ClassMemberKind, DeclarationKind, ExportKind, FunctionKind, ImportKind, Literal, PropertyKind, UnaryOp};
use parser::precedence::{node_precedence, Precedence};
use parser::settings::OutputFormat;
use parser::{Ast, CodeSettings, FieldId, NodeId, NodeKind, ScopeTree, TreeModifications};
use tracing::debug_span;

use crate::source_map::{Mapping, MappingBuilder};
use crate::text::{format_number, json_string, quote_string};

/// Text produced by one emission.
#[derive(Debug, Clone, Default)]
pub struct EmitResult {
    /// Generated code
    pub code: String,
    /// Position records, empty unless `generate_source_map` is set
    pub mappings: Vec<Mapping>,
    /// Output diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

/// Emits every chunk in order as one text.
pub fn emit(ast: &Ast, scopes: &ScopeTree, settings: &CodeSettings, roots: &[NodeId]) -> EmitResult {
    let _span = debug_span!("emit", chunks = roots.len()).entered();
    let mut emitter = Emitter::new(ast, scopes, settings);
    if settings.output_mode == OutputFormat::Json {
        emitter.json(roots);
    } else {
        for root in roots {
            emitter.chunk(*root);
        }
        emitter.finish_chunks();
    }
    emitter.finish()
}

/// Precedence levels, loosest first.
const LEVELS: [Precedence; 20] = [
    Precedence::Comma,
    Precedence::Assignment,
    Precedence::Conditional,
    Precedence::Coalesce,
    Precedence::LogicalOr,
    Precedence::LogicalAnd,
    Precedence::BitwiseOr,
    Precedence::BitwiseXor,
    Precedence::BitwiseAnd,
    Precedence::Equality,
    Precedence::Relational,
    Precedence::Shift,
    Precedence::Additive,
    Precedence::Multiplicative,
    Precedence::Exponent,
    Precedence::Unary,
    Precedence::Postfix,
    Precedence::New,
    Precedence::LeftHandSide,
    Precedence::Primary,
];

/// The level just above `precedence`.
fn tighter(precedence: Precedence) -> Precedence {
    LEVELS
        .iter()
        .copied()
        .find(|p| *p > precedence)
        .unwrap_or(Precedence::Primary)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\\' || !c.is_ascii()
}

/// Whether writing `next` right after `prev` would fuse two tokens.
fn needs_space(prev: char, next: char) -> bool {
    (is_word_char(prev) && (is_word_char(next) || next == '@'))
        || (prev == '+' && next == '+')
        || (prev == '-' && next == '-')
        || (prev == '/' && next == '/')
        || (prev == '<' && next == '!')
}

/// Tree-walking writer for one compilation's output.
pub struct Emitter<'a> {
    ast: &'a Ast,
    scopes: &'a ScopeTree,
    settings: &'a CodeSettings,
    pretty: bool,
    out: String,
    line: u32,
    column: u32,
    indent: usize,
    no_in: bool,
    cc_on_written: bool,
    pending_semicolon: bool,
    mappings: Option<MappingBuilder>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Emitter<'a> {
    /// Creates an emitter over a finished tree.
    pub fn new(ast: &'a Ast, scopes: &'a ScopeTree, settings: &'a CodeSettings) -> Self {
        Self {
            ast,
            scopes,
            settings,
            pretty: settings.output_mode == OutputFormat::MultipleLines,
            out: String::new(),
            line: 1,
            column: 1,
            indent: 0,
            no_in: false,
            cc_on_written: false,
            pending_semicolon: false,
            mappings: settings.generate_source_map.then(MappingBuilder::new),
            diagnostics: Vec::new(),
        }
    }

    /// Appends one chunk. A statement left open by the previous chunk is
    /// terminated first.
    pub fn chunk(&mut self, root: NodeId) {
        let items = self.visible(self.ast.statements(root));
        if items.is_empty() {
            return;
        }
        if self.pending_semicolon {
            self.write(";");
            self.pending_semicolon = false;
        }
        if self.pretty && !self.out.is_empty() {
            self.push("\n");
        }
        self.pending_semicolon = self.statement_list(&items, false);
    }

    /// Terminates the last chunk when the settings ask for it.
    pub fn finish_chunks(&mut self) {
        if self.pending_semicolon && (self.settings.term_semicolons || self.pretty) {
            self.write(";");
        }
        self.pending_semicolon = false;
    }

    /// Consumes the emitter.
    pub fn finish(self) -> EmitResult {
        EmitResult {
            code: self.out,
            mappings: self.mappings.map(MappingBuilder::finish).unwrap_or_default(),
            diagnostics: self.diagnostics,
        }
    }

    // ------------------------------------------------------------------
    // Writer
    // ------------------------------------------------------------------

    fn push(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.out.push_str(text);
    }

    fn separate(&mut self, text: &str) {
        if let (Some(prev), Some(next)) = (self.out.chars().next_back(), text.chars().next()) {
            if needs_space(prev, next) {
                self.push(" ");
            }
        }
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.separate(text);
        self.push(text);
    }

    /// Writes a token and records where it came from.
    fn write_mapped(&mut self, text: &str, node: NodeId, name: Option<&str>) {
        self.separate(text);
        if let Some(builder) = &mut self.mappings {
            let span = self.ast.context(node);
            builder.add(Mapping {
                generated_line: self.line,
                generated_column: self.column,
                source: self.ast.file_name(span.file).map(str::to_string),
                source_line: span.start.line,
                source_column: span.start.column,
                name: name.map(str::to_string),
            });
        }
        self.push(text);
    }

    fn space(&mut self) {
        if self.pretty {
            self.push(" ");
        }
    }

    fn newline(&mut self) {
        if self.pretty && !self.out.is_empty() {
            let pad = " ".repeat(self.indent * self.settings.indent_size);
            self.push("\n");
            self.push(&pad);
        }
    }

    /// Runs `f` with the `in` restriction of a for-loop head lifted.
    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        let saved = std::mem::replace(&mut self.no_in, false);
        f(self);
        self.no_in = saved;
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Statements that produce output.
    fn visible(&self, statements: &[NodeId]) -> Vec<NodeId> {
        statements
            .iter()
            .copied()
            .filter(|id| !matches!(self.ast.kind(*id), NodeKind::Empty))
            .collect()
    }

    /// Writes a statement list; returns whether the last statement still
    /// needs a terminator.
    fn statement_list(&mut self, items: &[NodeId], leading_newline: bool) -> bool {
        let mut pending = false;
        for (index, id) in items.iter().enumerate() {
            if pending {
                self.write(";");
            }
            if leading_newline || index > 0 {
                self.newline();
            }
            pending = self.statement(*id);
            if pending && self.pretty {
                self.write(";");
                pending = false;
            }
        }
        pending
    }

    fn block(&mut self, statements: &[NodeId]) {
        let items = self.visible(statements);
        self.write("{");
        self.indent += 1;
        self.nested(|this| {
            this.statement_list(&items, true);
        });
        self.indent -= 1;
        if !items.is_empty() {
            self.newline();
        }
        self.write("}");
    }

    fn is_lexical(&self, id: NodeId) -> bool {
        match self.ast.kind(id) {
            NodeKind::Var { kind, .. } => *kind != DeclarationKind::Var,
            NodeKind::Class { is_expression, .. } => !is_expression,
            NodeKind::FunctionObject { kind, .. } => *kind == FunctionKind::Declaration,
            NodeKind::ImportantComment { .. } | NodeKind::CcComment { .. } => true,
            _ => false,
        }
    }

    /// The only statement of a braces-optional block.
    fn unwrappable(&self, id: NodeId) -> Option<Option<NodeId>> {
        match self.ast.kind(id) {
            NodeKind::Block {
                statements,
                scope: None,
                concise: false,
            } => match self.visible(statements).as_slice() {
                [] => Some(None),
                [only] if !self.is_lexical(*only) => Some(Some(*only)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Body of an `if`, loop or `with`.
    fn body(&mut self, id: NodeId) -> bool {
        let ast = self.ast;
        if !self.pretty {
            match self.unwrappable(id) {
                Some(None) => {
                    self.write(";");
                    return false;
                }
                Some(Some(only)) => return self.statement(only),
                None => {}
            }
        }
        if let NodeKind::Block { statements, .. } = ast.kind(id) {
            self.space();
            self.block(statements);
            return false;
        }
        self.indent += 1;
        self.newline();
        let pending = self.statement(id);
        self.indent -= 1;
        pending
    }

    /// Whether a body ends in an `if` without `else`, which would capture a
    /// following `else`.
    fn ends_with_open_if(&self, id: NodeId) -> bool {
        match self.ast.kind(id) {
            NodeKind::If { alternate: None, .. } => true,
            NodeKind::If {
                alternate: Some(alternate),
                ..
            } => self.ends_with_open_if(*alternate),
            NodeKind::While { body, .. }
            | NodeKind::For { body, .. }
            | NodeKind::ForIn { body, .. }
            | NodeKind::With { body, .. }
            | NodeKind::Labeled { body, .. } => self.ends_with_open_if(*body),
            NodeKind::Block { .. } => match self.unwrappable(id) {
                Some(Some(only)) => self.ends_with_open_if(only),
                _ => false,
            },
            _ => false,
        }
    }

    /// Writes one statement; returns whether it needs a terminator when
    /// something follows.
    fn statement(&mut self, id: NodeId) -> bool {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Block { statements, .. } => {
                self.block(statements);
                false
            }
            NodeKind::Var { .. } => {
                self.var(id);
                true
            }
            NodeKind::FunctionObject {
                kind: FunctionKind::Declaration,
                ..
            } => {
                self.function(id);
                false
            }
            NodeKind::Class {
                is_expression: false, ..
            } => {
                self.class(id);
                false
            }
            NodeKind::Return { value } => {
                self.write("return");
                if let Some(value) = value {
                    self.space();
                    self.expression(*value, Precedence::Comma);
                }
                true
            }
            NodeKind::If {
                condition,
                consequent,
                alternate,
            } => self.if_statement(*condition, *consequent, *alternate),
            NodeKind::While { condition, body } => {
                self.write("while");
                self.space();
                self.parenthesized(*condition);
                self.body(*body)
            }
            NodeKind::DoWhile { body, condition } => {
                self.write("do");
                if self.body(*body) {
                    self.write(";");
                }
                self.space();
                self.write("while");
                self.space();
                self.parenthesized(*condition);
                true
            }
            NodeKind::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                self.write("for");
                self.space();
                self.write("(");
                if let Some(init) = init {
                    let saved = std::mem::replace(&mut self.no_in, true);
                    self.head(*init);
                    self.no_in = saved;
                }
                self.write(";");
                if let Some(condition) = condition {
                    self.space();
                    self.nested(|this| this.expression(*condition, Precedence::Comma));
                }
                self.write(";");
                if let Some(update) = update {
                    self.space();
                    self.nested(|this| this.expression(*update, Precedence::Comma));
                }
                self.write(")");
                self.body(*body)
            }
            NodeKind::ForIn {
                left,
                right,
                body,
                is_of,
                is_await,
                ..
            } => {
                self.write("for");
                if *is_await {
                    self.write("await");
                }
                self.space();
                self.write("(");
                let saved = std::mem::replace(&mut self.no_in, true);
                self.head(*left);
                self.no_in = saved;
                self.write(if *is_of { "of" } else { "in" });
                let min = if *is_of {
                    Precedence::Assignment
                } else {
                    Precedence::Comma
                };
                self.nested(|this| this.expression(*right, min));
                self.write(")");
                self.body(*body)
            }
            NodeKind::Break { label } | NodeKind::Continue { label } => {
                let keyword = if matches!(ast.kind(id), NodeKind::Break { .. }) {
                    "break"
                } else {
                    "continue"
                };
                self.write(keyword);
                if let Some(label) = label {
                    self.write(label);
                }
                true
            }
            NodeKind::Throw { value } => {
                self.write("throw");
                self.space();
                self.expression(*value, Precedence::Comma);
                if self.settings.mac_safari_quirks {
                    self.write(";");
                    false
                } else {
                    true
                }
            }
            NodeKind::Try {
                body,
                catch_binding,
                catch_body,
                finally,
                ..
            } => {
                self.write("try");
                self.space();
                self.block(ast.statements(*body));
                if let Some(catch_body) = catch_body {
                    self.space();
                    self.write("catch");
                    if let Some(binding) = catch_binding {
                        self.space();
                        self.write("(");
                        self.expression(*binding, Precedence::Assignment);
                        self.write(")");
                    }
                    self.space();
                    self.block(ast.statements(*catch_body));
                }
                if let Some(finally) = finally {
                    self.space();
                    self.write("finally");
                    self.space();
                    self.block(ast.statements(*finally));
                }
                false
            }
            NodeKind::Switch {
                discriminant, cases, ..
            } => {
                self.write("switch");
                self.space();
                self.parenthesized(*discriminant);
                self.space();
                self.write("{");
                let mut pending = false;
                for case in cases {
                    if pending {
                        self.write(";");
                    }
                    self.newline();
                    pending = self.switch_case(*case);
                }
                if !cases.is_empty() {
                    self.newline();
                }
                self.write("}");
                false
            }
            NodeKind::With { object, body, .. } => {
                self.write("with");
                self.space();
                self.parenthesized(*object);
                self.body(*body)
            }
            NodeKind::Labeled { label, body } => {
                self.write(label);
                self.write(":");
                self.space();
                self.statement(*body)
            }
            NodeKind::Debugger => {
                self.write("debugger");
                true
            }
            NodeKind::Empty => {
                self.write(";");
                false
            }
            NodeKind::ImportantComment { text } => {
                if self.settings.preserve_important_comments {
                    if !self.out.is_empty() && !self.out.ends_with('\n') {
                        self.push("\n");
                    }
                    self.push(text);
                    self.push("\n");
                }
                false
            }
            NodeKind::CcComment { statements } => self.conditional_comment(statements),
            NodeKind::Import { specifiers, source } => {
                self.import(specifiers, source);
                true
            }
            NodeKind::Export { .. } => self.export(id),
            _ => self.expression_statement(id),
        }
    }

    fn parenthesized(&mut self, expression: NodeId) {
        self.write("(");
        self.nested(|this| this.expression(expression, Precedence::Comma));
        self.write(")");
    }

    /// Initializer of a `for` head or left side of `for-in`/`for-of`.
    fn head(&mut self, id: NodeId) {
        if matches!(self.ast.kind(id), NodeKind::Var { .. }) {
            self.var(id);
        } else {
            self.expression(id, Precedence::Comma);
        }
    }

    fn if_statement(&mut self, condition: NodeId, consequent: NodeId, alternate: Option<NodeId>) -> bool {
        let ast = self.ast;
        self.write("if");
        self.space();
        self.parenthesized(condition);
        let Some(alternate) = alternate else {
            return self.body(consequent);
        };

        let pending = if self.ends_with_open_if(consequent) {
            self.space();
            match ast.kind(consequent) {
                NodeKind::Block { statements, .. } => self.block(statements),
                _ => {
                    self.write("{");
                    self.statement(consequent);
                    self.write("}");
                }
            }
            false
        } else {
            self.body(consequent)
        };
        if pending {
            self.write(";");
        }
        self.space();
        self.write("else");
        if matches!(ast.kind(alternate), NodeKind::If { .. }) {
            self.space();
            self.statement(alternate)
        } else {
            self.body(alternate)
        }
    }

    fn switch_case(&mut self, case: NodeId) -> bool {
        let ast = self.ast;
        let NodeKind::SwitchCase { test, statements } = ast.kind(case) else {
            return false;
        };
        match test {
            Some(test) => {
                self.write("case");
                self.space();
                self.expression(*test, Precedence::Comma);
            }
            None => self.write("default"),
        }
        self.write(":");
        let items = self.visible(statements);
        self.indent += 1;
        let pending = self.statement_list(&items, true);
        self.indent -= 1;
        pending
    }

    fn var(&mut self, id: NodeId) {
        let ast = self.ast;
        let NodeKind::Var { kind, declarators } = ast.kind(id) else {
            return;
        };
        self.write(kind.as_str());
        for (index, declarator) in declarators.iter().enumerate() {
            if index > 0 {
                self.write(",");
            }
            let NodeKind::VariableDeclarator { target, init } = ast.kind(*declarator) else {
                continue;
            };
            self.space();
            self.expression(*target, Precedence::Assignment);
            if let Some(init) = init {
                self.operator("=");
                self.expression(*init, Precedence::Assignment);
            }
        }
    }

    fn expression_statement(&mut self, id: NodeId) -> bool {
        if self.starts_with_brace_or_function(id, false) {
            self.write("(");
            self.expression(id, Precedence::Comma);
            self.write(")");
        } else {
            self.expression(id, Precedence::Comma);
        }
        true
    }

    /// Whether the leftmost token of an expression would start a block, a
    /// function declaration or a class declaration at statement level.
    /// With `object_only`, only an object literal counts.
    fn starts_with_brace_or_function(&self, id: NodeId, object_only: bool) -> bool {
        let mut current = id;
        loop {
            current = match self.ast.kind(current) {
                NodeKind::Grouping { expression } => *expression,
                NodeKind::Binary { left, .. } => *left,
                NodeKind::Conditional { condition, .. } => *condition,
                NodeKind::Call {
                    callee, is_new: false, ..
                } => *callee,
                NodeKind::Member { object, .. } | NodeKind::Index { object, .. } => *object,
                NodeKind::Update {
                    prefix: false, operand, ..
                } => *operand,
                NodeKind::Template { tag: Some(tag), .. } => *tag,
                NodeKind::ObjectLiteral { .. } | NodeKind::ObjectPattern { .. } => return true,
                NodeKind::FunctionObject { kind, .. } => return !object_only && *kind != FunctionKind::Arrow,
                NodeKind::Class { .. } => return !object_only,
                _ => return false,
            };
        }
    }

    fn conditional_comment(&mut self, statements: &[NodeId]) -> bool {
        let ast = self.ast;
        let skip_cc_on = self.cc_on_written
            && self
                .settings
                .is_modification_allowed(TreeModifications::REMOVE_UNNECESSARY_CC_ON_STATEMENTS);
        let items: Vec<NodeId> = self
            .visible(statements)
            .into_iter()
            .filter(|id| !(skip_cc_on && matches!(ast.kind(*id), NodeKind::CcOn)))
            .collect();
        if items.is_empty() {
            return false;
        }
        self.write("/*");
        let mut pending = false;
        for id in items {
            if pending {
                self.write(";");
            }
            pending = false;
            match ast.kind(id) {
                NodeKind::CcOn => {
                    self.write("@cc_on");
                    self.cc_on_written = true;
                }
                NodeKind::CcSet { name, value } => {
                    self.write("@set");
                    self.write(&format!("@{}", name));
                    self.write("=");
                    self.expression(*value, Precedence::Assignment);
                }
                NodeKind::CcIf { condition } => {
                    self.write("@if");
                    self.parenthesized(*condition);
                }
                NodeKind::CcElseIf { condition } => {
                    self.write("@elif");
                    self.parenthesized(*condition);
                }
                NodeKind::CcElse => self.write("@else"),
                NodeKind::CcEnd => self.write("@end"),
                _ => pending = self.statement(id),
            }
        }
        self.write("@*/");
        false
    }

    // ------------------------------------------------------------------
    // Modules
    // ------------------------------------------------------------------

    fn module_source(&mut self, source: &str) {
        self.write(&quote_string(source, self.settings.inline_safe_strings));
    }

    fn import(&mut self, specifiers: &[NodeId], source: &str) {
        let ast = self.ast;
        self.write("import");
        if specifiers.is_empty() {
            self.module_source(source);
            return;
        }
        let mut named = Vec::new();
        let mut wrote = false;
        for specifier in specifiers {
            let NodeKind::ImportSpecifier { kind, imported, local } = ast.kind(*specifier) else {
                continue;
            };
            match kind {
                ImportKind::Default | ImportKind::Namespace => {
                    if wrote {
                        self.write(",");
                    }
                    if *kind == ImportKind::Namespace {
                        self.write("*");
                        self.write("as");
                    }
                    self.expression(*local, Precedence::Primary);
                    wrote = true;
                }
                ImportKind::Named => named.push((imported.as_deref(), *local)),
            }
        }
        if !named.is_empty() {
            if wrote {
                self.write(",");
            }
            self.write("{");
            for (index, (imported, local)) in named.into_iter().enumerate() {
                if index > 0 {
                    self.write(",");
                }
                let (original, output) = self.binding_names(local);
                let imported = imported.unwrap_or(original);
                if imported != output {
                    self.write(imported);
                    self.write("as");
                }
                self.expression(local, Precedence::Primary);
            }
            self.write("}");
        }
        self.write("from");
        self.module_source(source);
    }

    /// Source and output names of an identifier node.
    fn binding_names(&self, id: NodeId) -> (&'a str, &'a str) {
        let ast: &'a Ast = self.ast;
        match ast.kind(id) {
            NodeKind::Lookup { name, field, .. } | NodeKind::BindingIdentifier { name, field } => {
                (name.as_str(), self.output_name(name, *field))
            }
            NodeKind::PropertyName { name } => (name.as_str(), name.as_str()),
            _ => ("", ""),
        }
    }

    fn output_name(&self, name: &'a str, field: Option<FieldId>) -> &'a str {
        let scopes: &'a ScopeTree = self.scopes;
        match field {
            Some(field) => scopes.output_name(field),
            None => name,
        }
    }

    fn export(&mut self, id: NodeId) -> bool {
        let ast = self.ast;
        let NodeKind::Export {
            kind,
            declaration,
            specifiers,
            source,
            namespace,
        } = ast.kind(id)
        else {
            return false;
        };
        self.write("export");
        match kind {
            ExportKind::Declaration => match declaration {
                Some(declaration) => self.statement(*declaration),
                None => false,
            },
            ExportKind::Default => {
                self.write("default");
                let Some(declaration) = declaration else {
                    return true;
                };
                match ast.kind(*declaration) {
                    NodeKind::FunctionObject {
                        kind: FunctionKind::Declaration,
                        ..
                    }
                    | NodeKind::Class {
                        is_expression: false, ..
                    } => self.statement(*declaration),
                    _ => self.expression_statement(*declaration),
                }
            }
            ExportKind::Named => {
                self.write("{");
                for (index, specifier) in specifiers.iter().enumerate() {
                    if index > 0 {
                        self.write(",");
                    }
                    let NodeKind::ExportSpecifier { local, exported } = ast.kind(*specifier) else {
                        continue;
                    };
                    let (original, output) = self.binding_names(*local);
                    let exported = exported.as_deref().unwrap_or(original);
                    self.expression(*local, Precedence::Primary);
                    if exported != output {
                        self.write("as");
                        self.write(exported);
                    }
                }
                self.write("}");
                if let Some(source) = source {
                    self.write("from");
                    self.module_source(source);
                }
                true
            }
            ExportKind::All => {
                self.write("*");
                if let Some(namespace) = namespace {
                    self.write("as");
                    self.write(namespace);
                }
                self.write("from");
                if let Some(source) = source {
                    self.module_source(source);
                }
                true
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn precedence(&self, id: NodeId) -> Precedence {
        match self.ast.kind(id) {
            NodeKind::Constant(Literal::Number(n)) if n.is_infinite() => Precedence::Multiplicative,
            NodeKind::Constant(Literal::Number(n)) if n.is_sign_negative() && !n.is_nan() => Precedence::Unary,
            NodeKind::Constant(Literal::Number(_)) => Precedence::Primary,
            kind => node_precedence(kind),
        }
    }

    /// Writes an expression, parenthesized when it binds looser than `min`.
    fn expression(&mut self, id: NodeId, min: Precedence) {
        let id = self.ast.unwrap_grouping(id);
        let precedence = self.precedence(id);
        let in_operation = matches!(self.ast.kind(id), NodeKind::Binary { op: BinaryOp::In, .. });
        if precedence < min || (self.no_in && in_operation) {
            self.write("(");
            self.nested(|this| this.expression_inner(id));
            self.write(")");
        } else {
            self.expression_inner(id);
        }
    }

    fn operator(&mut self, op: &str) {
        self.space();
        self.write(op);
        self.space();
    }

    fn expression_inner(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Binary { op, left, right } => self.binary(*op, *left, *right),
            NodeKind::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                self.expression(*condition, Precedence::Coalesce);
                self.operator("?");
                self.expression(*consequent, Precedence::Assignment);
                self.operator(":");
                self.expression(*alternate, Precedence::Assignment);
            }
            NodeKind::Unary { op, operand } => {
                self.write(op.as_str());
                if matches!(op, UnaryOp::Typeof | UnaryOp::Void | UnaryOp::Delete) {
                    self.space();
                }
                self.expression(*operand, Precedence::Unary);
            }
            NodeKind::Update { op, prefix, operand } => {
                if *prefix {
                    self.write(op.as_str());
                    self.expression(*operand, Precedence::Unary);
                } else {
                    self.expression(*operand, Precedence::LeftHandSide);
                    self.write(op.as_str());
                }
            }
            NodeKind::Await { argument } => {
                self.write("await");
                self.space();
                self.expression(*argument, Precedence::Unary);
            }
            NodeKind::Yield { argument, delegate } => {
                self.write("yield");
                if *delegate {
                    self.write("*");
                }
                if let Some(argument) = argument {
                    self.space();
                    self.expression(*argument, Precedence::Assignment);
                }
            }
            NodeKind::Call {
                callee,
                arguments,
                is_new,
                optional,
            } => {
                if *is_new {
                    self.write("new");
                    if self.contains_call(*callee) {
                        self.write("(");
                        self.nested(|this| this.expression(*callee, Precedence::Comma));
                        self.write(")");
                    } else {
                        self.expression(*callee, Precedence::New);
                    }
                    if !arguments.is_empty() {
                        self.arguments(arguments);
                    }
                } else {
                    self.expression(*callee, Precedence::LeftHandSide);
                    if *optional {
                        self.write("?.");
                    }
                    self.arguments(arguments);
                }
            }
            NodeKind::Member { object, name, optional } => {
                self.member_object(*object);
                self.write(if *optional { "?." } else { "." });
                self.write(name);
            }
            NodeKind::Index {
                object,
                index,
                optional,
            } => {
                self.expression(*object, Precedence::LeftHandSide);
                self.write(if *optional { "?.[" } else { "[" });
                self.nested(|this| this.expression(*index, Precedence::Comma));
                self.write("]");
            }
            NodeKind::Template {
                tag,
                quasis,
                expressions,
            } => {
                if let Some(tag) = tag {
                    self.expression(*tag, Precedence::LeftHandSide);
                }
                self.write("`");
                for (index, quasi) in quasis.iter().enumerate() {
                    self.push(quasi);
                    if let Some(expression) = expressions.get(index) {
                        self.push("${");
                        self.nested(|this| this.expression(*expression, Precedence::Comma));
                        self.push("}");
                    }
                }
                self.push("`");
            }
            NodeKind::Constant(literal) => self.literal(literal),
            NodeKind::BigInt { digits } => self.write(&format!("{}n", digits)),
            NodeKind::RegExp { pattern, flags } => self.write(&format!("/{}/{}", pattern, flags)),
            NodeKind::This => self.write("this"),
            NodeKind::Super => self.write("super"),
            NodeKind::NewTarget => self.write("new.target"),
            NodeKind::Spread { argument } | NodeKind::RestElement { argument } => {
                self.write("...");
                self.expression(*argument, Precedence::Assignment);
            }
            NodeKind::ArrayLiteral { elements } | NodeKind::ArrayPattern { elements } => {
                self.write("[");
                self.nested(|this| {
                    for (index, element) in elements.iter().enumerate() {
                        if index > 0 {
                            this.write(",");
                            this.space();
                        }
                        if let Some(element) = element {
                            this.expression(*element, Precedence::Assignment);
                        }
                    }
                    if matches!(elements.last(), Some(None)) {
                        this.write(",");
                    }
                });
                self.write("]");
            }
            NodeKind::ObjectLiteral { properties, .. } | NodeKind::ObjectPattern { properties } => {
                self.write("{");
                self.nested(|this| {
                    for (index, property) in properties.iter().enumerate() {
                        if index > 0 {
                            this.write(",");
                            this.space();
                        }
                        this.expression(*property, Precedence::Assignment);
                    }
                });
                self.write("}");
            }
            NodeKind::ObjectProperty { .. } => self.property(id),
            NodeKind::AssignmentPattern { target, default } => {
                self.expression(*target, Precedence::Assignment);
                self.operator("=");
                self.expression(*default, Precedence::Assignment);
            }
            NodeKind::FunctionObject { .. } => self.function(id),
            NodeKind::Class { .. } => self.class(id),
            NodeKind::Lookup { name, field, .. } | NodeKind::BindingIdentifier { name, field } => {
                let output = self.output_name(name, *field);
                self.write_mapped(output, id, Some(name.as_str()));
            }
            NodeKind::PropertyName { name } => self.write(name),
            NodeKind::ReplacementToken { name, fallback } => match fallback {
                Some(fallback) => self.write(&format!("%{}:{}%", name, fallback)),
                None => self.write(&format!("%{}%", name)),
            },
            NodeKind::CcVariable { name } => self.write(&format!("@{}", name)),
            NodeKind::Grouping { expression } => self.expression(*expression, Precedence::Comma),
            _ => {}
        }
    }

    fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) {
        let precedence = op.precedence();
        let (left_min, mut right_min) = if op.is_assignment() {
            (Precedence::LeftHandSide, Precedence::Assignment)
        } else if op == BinaryOp::Exp {
            (Precedence::Postfix, Precedence::Exponent)
        } else {
            (precedence, tighter(precedence))
        };
        let right_inner = self.ast.unwrap_grouping(right);
        if op.is_associative()
            && matches!(self.ast.kind(right_inner), NodeKind::Binary { op: r, .. } if *r == op)
        {
            right_min = precedence;
        }

        self.operand(op, left, left_min);
        if op == BinaryOp::Comma {
            self.write(",");
            self.space();
        } else {
            self.operator(op.as_str());
        }
        self.operand(op, right, right_min);
    }

    /// `??` cannot share an operand with `&&` or `||` without parentheses.
    fn operand(&mut self, op: BinaryOp, operand: NodeId, min: Precedence) {
        let inner = self.ast.unwrap_grouping(operand);
        let mixes = op == BinaryOp::NullishCoalescing
            && matches!(
                self.ast.kind(inner),
                NodeKind::Binary {
                    op: BinaryOp::And | BinaryOp::Or,
                    ..
                }
            );
        if mixes {
            self.write("(");
            self.nested(|this| this.expression(inner, Precedence::Comma));
            self.write(")");
        } else {
            self.expression(operand, min);
        }
    }

    fn contains_call(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            current = match self.ast.kind(current) {
                NodeKind::Call { .. } => return true,
                NodeKind::Member { object, .. } | NodeKind::Index { object, .. } => *object,
                NodeKind::Template { tag: Some(tag), .. } => *tag,
                NodeKind::Grouping { expression } => *expression,
                _ => return false,
            };
        }
    }

    /// A member object; integer literals need a second dot.
    fn member_object(&mut self, object: NodeId) {
        let ast = self.ast;
        let object = ast.unwrap_grouping(object);
        if let NodeKind::Constant(Literal::Number(n)) = ast.kind(object) {
            if n.is_finite() && !n.is_sign_negative() {
                let text = format_number(*n);
                self.write(&text);
                if text.bytes().all(|b| b.is_ascii_digit()) {
                    self.write(".");
                }
                return;
            }
        }
        self.expression(object, Precedence::LeftHandSide);
    }

    fn arguments(&mut self, arguments: &[NodeId]) {
        self.write("(");
        self.nested(|this| {
            for (index, argument) in arguments.iter().enumerate() {
                if index > 0 {
                    this.write(",");
                    this.space();
                }
                this.expression(*argument, Precedence::Assignment);
            }
        });
        self.write(")");
    }

    fn literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Number(n) => self.write(&format_number(*n)),
            Literal::String(s) => self.write(&quote_string(s, self.settings.inline_safe_strings)),
            Literal::Boolean(b) => self.write(if *b { "true" } else { "false" }),
            Literal::Null => self.write("null"),
            Literal::Empty => {}
        }
    }

    fn property_key(&mut self, key: NodeId, computed: bool) {
        if computed {
            self.write("[");
            self.nested(|this| this.expression(key, Precedence::Assignment));
            self.write("]");
        } else {
            self.expression(key, Precedence::Primary);
        }
    }

    fn property(&mut self, id: NodeId) {
        let ast = self.ast;
        let NodeKind::ObjectProperty {
            key,
            value,
            kind,
            computed,
        } = ast.kind(id)
        else {
            return;
        };
        match kind {
            PropertyKind::Init => {
                self.property_key(*key, *computed);
                self.write(":");
                self.space();
                self.expression(*value, Precedence::Assignment);
            }
            PropertyKind::Shorthand => {
                let key_name = match ast.kind(*key) {
                    NodeKind::PropertyName { name } => Some(name.as_str()),
                    _ => None,
                };
                let target = match ast.kind(*value) {
                    NodeKind::AssignmentPattern { target, .. } => *target,
                    _ => *value,
                };
                let (_, output) = self.binding_names(target);
                if key_name != Some(output) {
                    self.property_key(*key, *computed);
                    self.write(":");
                }
                self.expression(*value, Precedence::Assignment);
            }
            PropertyKind::Method | PropertyKind::Getter | PropertyKind::Setter => {
                match kind {
                    PropertyKind::Getter => self.write("get"),
                    PropertyKind::Setter => self.write("set"),
                    _ => {}
                }
                self.method(*key, *computed, *value);
            }
        }
    }

    /// `[async] [*] key(params) { body }` of a method-like function.
    fn method(&mut self, key: NodeId, computed: bool, function: NodeId) {
        let ast = self.ast;
        let NodeKind::FunctionObject {
            params,
            body,
            is_async,
            is_generator,
            ..
        } = ast.kind(function)
        else {
            return;
        };
        if *is_async {
            self.write_mapped("async", function, None);
        }
        if *is_generator {
            self.write("*");
        }
        self.property_key(key, computed);
        self.parameters(params);
        self.space();
        self.block(ast.statements(*body));
    }

    fn parameters(&mut self, params: &[NodeId]) {
        self.write("(");
        self.nested(|this| {
            for (index, param) in params.iter().enumerate() {
                if index > 0 {
                    this.write(",");
                    this.space();
                }
                this.expression(*param, Precedence::Assignment);
            }
        });
        self.write(")");
    }

    fn function(&mut self, id: NodeId) {
        let ast = self.ast;
        let NodeKind::FunctionObject {
            kind,
            binding,
            params,
            body,
            is_async,
            is_generator,
            ..
        } = ast.kind(id)
        else {
            return;
        };
        if *kind == FunctionKind::Arrow {
            if *is_async {
                self.write_mapped("async", id, None);
            }
            match params.as_slice() {
                [single] if matches!(ast.kind(*single), NodeKind::BindingIdentifier { .. }) => {
                    self.expression(*single, Precedence::Primary)
                }
                _ => self.parameters(params),
            }
            self.operator("=>");
            self.arrow_body(*body);
            return;
        }

        if *is_async {
            self.write_mapped("async", id, None);
            self.write("function");
        } else {
            self.write_mapped("function", id, None);
        }
        if *is_generator {
            self.write("*");
        }
        if let Some(binding) = binding {
            self.space();
            self.expression(*binding, Precedence::Primary);
        }
        self.parameters(params);
        self.space();
        self.block(ast.statements(*body));
    }

    fn arrow_body(&mut self, body: NodeId) {
        let ast = self.ast;
        match ast.kind(body) {
            NodeKind::Block {
                statements,
                concise: true,
                ..
            } if statements.len() == 1 => {
                let value = statements[0];
                if self.starts_with_brace_or_function(value, true) {
                    self.write("(");
                    self.nested(|this| this.expression(value, Precedence::Comma));
                    self.write(")");
                } else {
                    self.expression(value, Precedence::Assignment);
                }
            }
            NodeKind::Block { statements, .. } => self.block(statements),
            _ => self.expression(body, Precedence::Assignment),
        }
    }

    fn class(&mut self, id: NodeId) {
        let ast = self.ast;
        let NodeKind::Class {
            binding,
            heritage,
            members,
            ..
        } = ast.kind(id)
        else {
            return;
        };
        self.write_mapped("class", id, None);
        if let Some(binding) = binding {
            self.expression(*binding, Precedence::Primary);
        }
        if let Some(heritage) = heritage {
            self.write("extends");
            self.expression(*heritage, Precedence::LeftHandSide);
        }
        self.space();
        self.write("{");
        self.indent += 1;
        for (index, member) in members.iter().enumerate() {
            self.newline();
            let last = index + 1 == members.len();
            self.class_member(*member, last);
        }
        self.indent -= 1;
        if !members.is_empty() {
            self.newline();
        }
        self.write("}");
    }

    fn class_member(&mut self, id: NodeId, last: bool) {
        let ast = self.ast;
        let NodeKind::ClassMember {
            key,
            value,
            kind,
            is_static,
            computed,
        } = ast.kind(id)
        else {
            return;
        };
        if *is_static {
            self.write("static");
        }
        match kind {
            ClassMemberKind::Field => {
                self.property_key(*key, *computed);
                if let Some(value) = value {
                    self.operator("=");
                    self.nested(|this| this.expression(*value, Precedence::Assignment));
                }
                if !last || self.pretty {
                    self.write(";");
                }
            }
            ClassMemberKind::Method | ClassMemberKind::Getter | ClassMemberKind::Setter => {
                match kind {
                    ClassMemberKind::Getter => self.write("get"),
                    ClassMemberKind::Setter => self.write("set"),
                    _ => {}
                }
                if let Some(value) = value {
                    self.method(*key, *computed, *value);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // JSON
    // ------------------------------------------------------------------

    /// Writes the single JSON value of all chunks, or reports why there is
    /// none.
    pub fn json(&mut self, roots: &[NodeId]) {
        let statements: Vec<NodeId> = roots
            .iter()
            .flat_map(|root| self.visible(self.ast.statements(*root)))
            .collect();
        match statements.as_slice() {
            [only] if self.is_json_value(*only) => self.json_value(*only),
            _ => {
                let span = statements
                    .first()
                    .map(|s| self.ast.context(*s))
                    .unwrap_or_else(SourceSpan::default);
                self.diagnostics.push(Diagnostic::new(
                    ErrorCode::InvalidJsonOutput,
                    span,
                    "output is not a single JSON value",
                ));
                self.out.clear();
            }
        }
    }

    fn is_json_value(&self, id: NodeId) -> bool {
        match self.ast.kind(self.ast.unwrap_grouping(id)) {
            NodeKind::Constant(Literal::Number(n)) => n.is_finite(),
            NodeKind::Constant(Literal::String(_) | Literal::Boolean(_) | Literal::Null) => true,
            NodeKind::Unary {
                op: UnaryOp::Minus,
                operand,
            } => matches!(self.ast.kind(*operand), NodeKind::Constant(Literal::Number(n)) if n.is_finite()),
            NodeKind::ArrayLiteral { elements } => elements
                .iter()
                .all(|e| e.is_some_and(|e| self.is_json_value(e))),
            NodeKind::ObjectLiteral { properties, .. } => properties.iter().all(|p| match self.ast.kind(*p) {
                NodeKind::ObjectProperty {
                    key,
                    value,
                    kind: PropertyKind::Init,
                    computed: false,
                } => self.json_key(*key).is_some() && self.is_json_value(*value),
                _ => false,
            }),
            _ => false,
        }
    }

    fn json_key(&self, key: NodeId) -> Option<String> {
        match self.ast.kind(key) {
            NodeKind::PropertyName { name } | NodeKind::Constant(Literal::String(name)) => Some(name.clone()),
            NodeKind::Constant(Literal::Number(n)) if n.is_finite() => Some(format_number(*n)),
            _ => None,
        }
    }

    fn json_value(&mut self, id: NodeId) {
        let ast = self.ast;
        let id = ast.unwrap_grouping(id);
        match ast.kind(id) {
            NodeKind::Constant(Literal::Number(n)) => self.push(&json_number(*n)),
            NodeKind::Constant(Literal::String(s)) => self.push(&json_string(s)),
            NodeKind::Constant(Literal::Boolean(b)) => self.push(if *b { "true" } else { "false" }),
            NodeKind::Constant(_) => self.push("null"),
            NodeKind::Unary { operand, .. } => {
                self.push("-");
                self.json_value(*operand);
            }
            NodeKind::ArrayLiteral { elements } => {
                self.push("[");
                for (index, element) in elements.iter().flatten().enumerate() {
                    if index > 0 {
                        self.push(",");
                    }
                    self.json_value(*element);
                }
                self.push("]");
            }
            NodeKind::ObjectLiteral { properties, .. } => {
                self.push("{");
                for (index, property) in properties.iter().enumerate() {
                    let NodeKind::ObjectProperty { key, value, .. } = ast.kind(*property) else {
                        continue;
                    };
                    if index > 0 {
                        self.push(",");
                    }
                    let key = self.json_key(*key).unwrap_or_default();
                    self.push(&json_string(&key));
                    self.push(":");
                    self.json_value(*value);
                }
                self.push("}");
            }
            _ => {}
        }
    }
}

/// JSON spelling of a finite number: no bare leading dot.
fn json_number(value: f64) -> String {
    let text = format_number(value);
    if let Some(rest) = text.strip_prefix("-.") {
        format!("-0.{}", rest)
    } else if text.starts_with('.') {
        format!("0{}", text)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::settings::{LocalRenaming, SourceMode};

    fn plain_settings() -> CodeSettings {
        let mut settings = CodeSettings::default();
        settings.minify_code = false;
        settings.local_renaming = LocalRenaming::KeepAll;
        settings
    }

    fn emit_with(source: &str, settings: &CodeSettings) -> String {
        let parsed = parser::parse(source, settings);
        assert!(
            parsed.diagnostics.iter().all(|d| !d.is_error()),
            "{:?}",
            parsed.diagnostics
        );
        emit(&parsed.ast, &parsed.scopes, settings, &[parsed.root]).code
    }

    fn emit_plain(source: &str) -> String {
        emit_with(source, &plain_settings())
    }

    #[test]
    fn test_tighter_levels() {
        assert_eq!(tighter(Precedence::Comma), Precedence::Assignment);
        assert_eq!(tighter(Precedence::Additive), Precedence::Multiplicative);
        assert_eq!(tighter(Precedence::Primary), Precedence::Primary);
    }

    #[test]
    fn test_parentheses_follow_precedence() {
        assert_eq!(emit_plain("x = a * (b + c);"), "x=a*(b+c)");
        assert_eq!(emit_plain("x = (a * b) + c;"), "x=a*b+c");
        assert_eq!(emit_plain("x = a - (b - c);"), "x=a-(b-c)");
        assert_eq!(emit_plain("x = a && (b && c);"), "x=a&&b&&c");
        assert_eq!(emit_plain("x = (a ** b) ** c;"), "x=(a**b)**c");
        assert_eq!(emit_plain("x = (-a) ** b;"), "x=(-a)**b");
        assert_eq!(emit_plain("x = a ?? (b || c);"), "x=a??(b||c)");
        assert_eq!(emit_plain("x = (a, b);"), "x=(a,b)");
    }

    #[test]
    fn test_spaces_only_where_tokens_fuse() {
        assert_eq!(emit_plain("x = a + +b;"), "x=a+ +b");
        assert_eq!(emit_plain("x = a - -1;"), "x=a- -1");
        assert_eq!(emit_plain("x = typeof y;"), "x=typeof y");
        assert_eq!(emit_plain("function f() { return 'x'; }"), "function f(){return\"x\"}");
        assert_eq!(emit_plain("x = a in b;"), "x=a in b");
    }

    #[test]
    fn test_statement_level_function_and_object_wrapped() {
        assert_eq!(emit_plain("(function () {})();"), "(function(){}())");
        assert_eq!(emit_plain("({ a: 1 }).a;"), "({a:1}.a)");
        assert_eq!(emit_plain("x = () => ({ a: 1 });"), "x=()=>({a:1})");
    }

    #[test]
    fn test_new_expressions() {
        assert_eq!(emit_plain("x = new Foo;"), "x=new Foo");
        assert_eq!(emit_plain("x = new Foo().bar;"), "x=(new Foo).bar");
        assert_eq!(emit_plain("x = new Foo(1).bar;"), "x=new Foo(1).bar");
        assert_eq!(emit_plain("x = (new Foo).bar;"), "x=(new Foo).bar");
        assert_eq!(emit_plain("x = new (foo().Bar)(1);"), "x=new(foo().Bar)(1)");
    }

    #[test]
    fn test_number_member_access() {
        assert_eq!(emit_plain("x = (1).toString();"), "x=1..toString()");
        assert_eq!(emit_plain("x = (1.5).toFixed();"), "x=1.5.toFixed()");
    }

    #[test]
    fn test_overflowing_numbers_written_as_division() {
        assert_eq!(emit_plain("x = 1e400;"), "x=1/0");
        assert_eq!(emit_plain("x = a / 1e400;"), "x=a/(1/0)");
        assert_eq!(emit_plain("x = 1e400 * a;"), "x=1/0*a");
        assert_eq!(emit_plain("x = (1e400).toString();"), "x=(1/0).toString()");
    }

    #[test]
    fn test_block_bodies_and_semicolons() {
        assert_eq!(emit_plain("if (a) { b(); } else { c(); }"), "if(a)b();else c()");
        assert_eq!(emit_plain("if (a) { if (b) c(); } else d();"), "if(a){if(b)c()}else d()");
        assert_eq!(emit_plain("while (a) { b(); }"), "while(a)b()");
        assert_eq!(emit_plain("if (a) {}"), "if(a);");
        assert_eq!(emit_plain("do { a(); } while (b); c();"), "do a();while(b);c()");
        assert_eq!(emit_plain("if (a) { let x = 1; }"), "if(a){let x=1}");
    }

    #[test]
    fn test_switch_and_try() {
        assert_eq!(
            emit_plain("switch (a) { case 1: b(); case 2: c(); break; default: d(); }"),
            "switch(a){case 1:b();case 2:c();break;default:d()}"
        );
        assert_eq!(
            emit_plain("try { a(); } catch (e) { b(e); } finally { c(); }"),
            "try{a()}catch(e){b(e)}finally{c()}"
        );
        assert_eq!(emit_plain("try { a(); } catch { b(); }"), "try{a()}catch{b()}");
    }

    #[test]
    fn test_for_loops() {
        assert_eq!(emit_plain("for (var i = 0; i < n; i++) {}"), "for(var i=0;i<n;i++);");
        assert_eq!(emit_plain("for (var k in o) f(k);"), "for(var k in o)f(k)");
        assert_eq!(emit_plain("for (const v of list) f(v);"), "for(const v of list)f(v)");
        assert_eq!(emit_plain("for (var x = (a in b); ;) ;"), "for(var x=(a in b);;);");
    }

    #[test]
    fn test_object_and_class_members() {
        assert_eq!(
            emit_plain("x = { a, b: 1, get c() { return 1; }, m() {} };"),
            "x={a,b:1,get c(){return 1},m(){}}"
        );
        assert_eq!(
            emit_plain("class A extends B { static m() {} x = 1; y; get z() { return 1; } }"),
            "class A extends B{static m(){}x=1;y;get z(){return 1}}"
        );
    }

    #[test]
    fn test_templates_regex_and_bigint() {
        assert_eq!(emit_plain("x = tag`a${b}c`;"), "x=tag`a${b}c`");
        assert_eq!(emit_plain("x = a / /re/g.exec(s).length;"), "x=a/ /re/g.exec(s).length");
        assert_eq!(emit_plain("x = 10n;"), "x=10n");
    }

    #[test]
    fn test_array_holes() {
        assert_eq!(emit_plain("x = [a, , b];"), "x=[a,,b]");
        assert_eq!(emit_plain("x = [a, ,];"), "x=[a,,]");
    }

    #[test]
    fn test_modules() {
        let mut settings = plain_settings();
        settings.source_mode = SourceMode::Module;
        assert_eq!(
            emit_with("import a, { b as c } from 'm'; export { c as d }; export default 1;", &settings),
            "import a,{b as c}from\"m\";export{c as d};export default 1"
        );
        assert_eq!(emit_with("export * from 'm';", &settings), "export*from\"m\"");
    }

    #[test]
    fn test_throw_semicolon_quirk() {
        assert_eq!(emit_plain("throw x"), "throw x;");
        let mut settings = plain_settings();
        settings.mac_safari_quirks = false;
        assert_eq!(emit_with("throw x", &settings), "throw x");
    }

    #[test]
    fn test_term_semicolons() {
        let mut settings = plain_settings();
        settings.term_semicolons = true;
        assert_eq!(emit_with("a(); b()", &settings), "a();b();");
    }

    #[test]
    fn test_multiple_lines() {
        let mut settings = plain_settings();
        settings.output_mode = OutputFormat::MultipleLines;
        settings.indent_size = 2;
        assert_eq!(
            emit_with("function f(a) { if (a) { return a + 1; } }", &settings),
            "function f(a) {\n  if (a) {\n    return a + 1;\n  }\n}"
        );
    }

    #[test]
    fn test_json_output() {
        let mut settings = plain_settings();
        settings.output_mode = OutputFormat::Json;
        assert_eq!(
            emit_with(r#"{"a": [1, -2, "x", .5], "b": null}"#, &settings),
            r#"{"a":[1,-2,"x",0.5],"b":null}"#
        );

        let parsed = parser::parse("var a = 1;", &settings);
        let result = emit(&parsed.ast, &parsed.scopes, &settings, &[parsed.root]);
        assert!(result.code.is_empty());
        assert_eq!(result.diagnostics[0].code, ErrorCode::InvalidJsonOutput);
    }

    #[test]
    fn test_chunks_are_separated() {
        let settings = plain_settings();
        let mut ast = Ast::new();
        let mut scopes = ScopeTree::new();
        let first = parser::Parser::new("a()", "one.js", &settings, &mut ast, &mut scopes)
            .parse()
            .root;
        let second = parser::Parser::new("(b)()", "two.js", &settings, &mut ast, &mut scopes)
            .parse()
            .root;
        let result = emit(&ast, &scopes, &settings, &[first, second]);
        assert_eq!(result.code, "a();b()");
    }

    #[test]
    fn test_source_mappings_recorded() {
        let mut settings = plain_settings();
        settings.generate_source_map = true;
        let parsed = parser::parse("var alpha = 1;\nalpha++;", &settings);
        let result = emit(&parsed.ast, &parsed.scopes, &settings, &[parsed.root]);
        assert_eq!(result.code, "var alpha=1;alpha++");
        let names: Vec<(u32, Option<&str>)> = result
            .mappings
            .iter()
            .map(|m| (m.source_line, m.name.as_deref()))
            .collect();
        assert_eq!(names, vec![(1, Some("alpha")), (2, Some("alpha"))]);
        assert_eq!(result.mappings[1].generated_column, 13);
    }
}
