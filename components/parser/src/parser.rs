//! Recursive descent parser for JavaScript
//!
//! Statements are parsed by recursive descent; binary operators by
//! precedence climbing over [`crate::precedence`]. Scopes are pushed and
//! declarations registered while parsing, so the tree handed to the
//! analyzer already knows every binding.
//!
//! Grammar errors are reported as diagnostics. The parser then skips to the
//! next statement boundary and carries on; only running out of input in the
//! middle of a construct stops the chunk, and even then the statements
//! parsed so far are kept.

use core_types::{Diagnostic, ErrorCode, FileId, ReferenceType, SourceSpan};
use tracing::{debug, trace};

use crate::ast::*;
use crate::error::*;
use crate::lexer::{CcMarker, Keyword, Lexer, Punctuator, SpannedToken, Token};
use crate::precedence::{assignment_operator, binary_operator, Associativity, Precedence};
use crate::replacement::{ReplacementValue, Replacements};
use crate::scope::{FieldId, FieldKind, ScopeId, ScopeKind, ScopeTree};
use crate::settings::{CodeSettings, OutputFormat, SourceMode};

/// Result of parsing one chunk
#[derive(Debug, Clone)]
pub struct ParseOutput {
    /// Program node of the chunk
    pub root: NodeId,
    /// Lexical and grammar diagnostics in discovery order
    pub diagnostics: Vec<Diagnostic>,
    /// Set when the input ended inside a construct
    pub aborted: Option<ParseAbort>,
}

#[derive(Debug, Clone, Copy)]
struct Context {
    scope: ScopeId,
    in_function: bool,
    in_generator: bool,
    in_async: bool,
    loop_depth: u32,
    switch_depth: u32,
    no_in: bool,
}

/// JavaScript parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    settings: &'a CodeSettings,
    replacements: Replacements<'a>,
    ast: &'a mut Ast,
    scopes: &'a mut ScopeTree,
    current: SpannedToken,
    previous_span: SourceSpan,
    pending_comments: Vec<(String, SourceSpan)>,
    diagnostics: Vec<Diagnostic>,
    ctx: Context,
    labels: Vec<(String, bool)>,
    last_was_default: bool,
    file: FileId,
}

impl<'a> Parser<'a> {
    /// Create a parser for one chunk of source.
    ///
    /// The chunk's file name is registered with `ast`; declarations land in
    /// `scopes`, whose global scope is shared with earlier chunks.
    pub fn new(
        source: &str,
        file_name: &str,
        settings: &'a CodeSettings,
        ast: &'a mut Ast,
        scopes: &'a mut ScopeTree,
    ) -> Self {
        let file = ast.add_file(file_name);
        let mut lexer = Lexer::new(source, settings);
        lexer.set_file(file, ast.file_count());
        let global = scopes.global();
        let placeholder = SpannedToken {
            token: Token::EOF,
            span: SourceSpan::default(),
            raw: String::new(),
            newline_before: false,
        };
        let mut parser = Self {
            lexer,
            settings,
            replacements: Replacements::new(settings),
            ast,
            scopes,
            current: placeholder,
            previous_span: SourceSpan::default(),
            pending_comments: Vec::new(),
            diagnostics: Vec::new(),
            ctx: Context {
                scope: global,
                in_function: false,
                in_generator: false,
                in_async: false,
                loop_depth: 0,
                switch_depth: 0,
                no_in: false,
            },
            labels: Vec::new(),
            last_was_default: false,
            file,
        };
        parser.current = parser.next_significant();
        parser
    }

    /// Parse the chunk into a Program node.
    pub fn parse(mut self) -> ParseOutput {
        let global = self.scopes.global();
        if self.settings.strict_mode {
            self.scopes.scope_mut(global).use_strict = true;
        }
        let program_scope = match self.settings.source_mode {
            SourceMode::Script => global,
            SourceMode::Module => {
                let module = self.scopes.push_scope(ScopeKind::Module, global, None);
                self.scopes.scope_mut(module).use_strict = true;
                module
            }
        };
        self.ctx.scope = program_scope;

        let start = self.current.span;
        let mut statements = Vec::new();
        let parsed = if self.settings.output_mode == OutputFormat::Json {
            self.parse_json_chunk(&mut statements)
        } else {
            self.parse_statement_list(None, true, &mut statements)
        };
        let aborted = match parsed {
            Ok(()) => None,
            Err(ParseFailure::Abort(abort)) => Some(abort),
            Err(ParseFailure::Recover) => None,
        };
        self.flush_comments(&mut statements);

        let span = self.span_from(start);
        let root = self.ast.alloc(
            NodeKind::Program {
                statements,
                scope: program_scope,
            },
            span,
        );
        let scope = self.scopes.scope_mut(program_scope);
        if program_scope != global || scope.owner.is_none() {
            scope.owner = Some(root);
            scope.context = span;
        }

        let new_files: Vec<String> = self.lexer.new_files().to_vec();
        for name in new_files {
            self.ast.add_file(name);
        }
        self.diagnostics.extend(self.lexer.take_diagnostics());
        debug!(
            file = self.file.0,
            diagnostics = self.diagnostics.len(),
            aborted = aborted.is_some(),
            "parsed chunk"
        );
        ParseOutput {
            root,
            diagnostics: self.diagnostics,
            aborted,
        }
    }

    /// JSON output reads the chunk as one expression first, so a leading
    /// `{` is an object literal rather than a block. Anything after it is
    /// parsed as ordinary statements and rejected by the emitter.
    fn parse_json_chunk(&mut self, statements: &mut Vec<NodeId>) -> PResult<()> {
        if self.at_eof() {
            return Ok(());
        }
        let value = self.parse_expression()?;
        statements.push(value);
        self.consume_semicolon();
        self.parse_statement_list(None, false, statements)
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn next_significant(&mut self) -> SpannedToken {
        let mut newline = false;
        loop {
            let token = self.lexer.next_token();
            self.diagnostics.extend(self.lexer.take_diagnostics());
            if let Token::ImportantComment(text) = &token.token {
                newline |= token.newline_before || text.contains('\n');
                self.pending_comments.push((text.clone(), token.span));
                continue;
            }
            let mut token = token;
            token.newline_before |= newline;
            return token;
        }
    }

    fn bump(&mut self) -> SpannedToken {
        let next = self.next_significant();
        let previous = std::mem::replace(&mut self.current, next);
        self.previous_span = previous.span;
        previous
    }

    fn peek(&mut self) -> &Token {
        &self.lexer.peek_token().token
    }

    fn at(&self, p: Punctuator) -> bool {
        self.current.token == Token::Punctuator(p)
    }

    fn at_keyword(&self, k: Keyword) -> bool {
        self.current.token == Token::Keyword(k)
    }

    fn at_identifier(&self, name: &str) -> bool {
        matches!(&self.current.token, Token::Identifier(n, false) if n == name)
    }

    fn at_eof(&self) -> bool {
        self.current.token == Token::EOF
    }

    fn eat(&mut self, p: Punctuator) -> bool {
        if self.at(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, p: Punctuator) -> PResult<SpannedToken> {
        if self.at(p) {
            return Ok(self.bump());
        }
        let code = match p {
            Punctuator::RParen => ErrorCode::NoRightParenthesis,
            Punctuator::RBracket => ErrorCode::NoRightBracket,
            Punctuator::RBrace => ErrorCode::NoRightCurly,
            Punctuator::Colon => ErrorCode::NoColon,
            _ => ErrorCode::UnexpectedToken,
        };
        Err(self.fail(code, format!("expected '{}'", p.as_str())))
    }

    /// Reports a problem at the current token. Running out of input turns
    /// the failure into an abort.
    fn fail(&mut self, code: ErrorCode, message: impl Into<String>) -> ParseFailure {
        let span = self.current.span;
        if self.at_eof() {
            self.diagnostics.push(unexpected_eof(span));
            return ParseFailure::Abort(ParseAbort::EndOfInput {
                line: span.start.line,
                column: span.start.column,
            });
        }
        let message = format!("{}, found {}", message.into(), self.current.token.describe());
        self.diagnostics.push(syntax_error(code, span, message));
        ParseFailure::Recover
    }

    fn report(&mut self, code: ErrorCode, span: SourceSpan, message: impl Into<String>) {
        self.diagnostics.push(syntax_error(code, span, message));
    }

    fn span_from(&self, start: SourceSpan) -> SourceSpan {
        if self.previous_span.file != start.file || self.previous_span.end < start.start {
            return start;
        }
        SourceSpan {
            file: start.file,
            start: start.start,
            end: self.previous_span.end,
        }
    }

    fn alloc(&mut self, kind: NodeKind, span: SourceSpan) -> NodeId {
        self.ast.alloc(kind, span)
    }

    fn consume_semicolon(&mut self) {
        if self.eat(Punctuator::Semicolon) {
            return;
        }
        if self.at(Punctuator::RBrace)
            || self.at_eof()
            || self.current.newline_before
            || matches!(self.current.token, Token::ConditionalComment(_))
        {
            return;
        }
        let span = self.current.span;
        let found = self.current.token.describe();
        self.report(
            ErrorCode::NoSemicolon,
            span,
            format!("expected ';', found {}", found),
        );
    }

    /// Skips to the next statement boundary after a reported error.
    fn synchronize(&mut self, start_offset: usize) {
        loop {
            if self.at_eof() || self.at(Punctuator::RBrace) {
                break;
            }
            if self.eat(Punctuator::Semicolon) {
                break;
            }
            let progressed = self.current.span.start.offset > start_offset;
            if progressed && self.current.newline_before && starts_statement(&self.current.token) {
                break;
            }
            self.bump();
        }
        trace!(line = self.current.span.start.line, "resynchronized");
    }

    fn flush_comments(&mut self, statements: &mut Vec<NodeId>) {
        for (text, span) in std::mem::take(&mut self.pending_comments) {
            let id = self.alloc(NodeKind::ImportantComment { text }, span);
            statements.push(id);
        }
    }

    /// Name usable as a binding or reference, including contextual keywords.
    fn identifier_text(&self) -> Option<String> {
        match &self.current.token {
            Token::Identifier(name, _) => Some(name.clone()),
            Token::Keyword(k) if k.is_contextual() => {
                let reserved = match k {
                    Keyword::Await => self.ctx.in_async,
                    Keyword::Yield => self.ctx.in_generator,
                    _ => false,
                };
                if reserved {
                    None
                } else {
                    Some(k.as_str().to_string())
                }
            }
            _ => None,
        }
    }

    fn expect_identifier(&mut self) -> PResult<(String, SourceSpan)> {
        match self.identifier_text() {
            Some(name) => {
                let token = self.bump();
                Ok((name, token.span))
            }
            None => Err(self.fail(ErrorCode::ExpectedIdentifier, "expected identifier")),
        }
    }

    /// Any identifier name, keywords included (property names).
    fn expect_identifier_name(&mut self) -> PResult<(String, SourceSpan)> {
        let name = match &self.current.token {
            Token::Identifier(name, _) => name.clone(),
            Token::Keyword(k) => k.as_str().to_string(),
            Token::PrivateIdentifier(name) => format!("#{}", name),
            _ => return Err(self.fail(ErrorCode::ExpectedIdentifier, "expected property name")),
        };
        let token = self.bump();
        Ok((name, token.span))
    }

    // ------------------------------------------------------------------
    // Declarations and scopes
    // ------------------------------------------------------------------

    fn declare(&mut self, scope: ScopeId, name: &str, kind: FieldKind, span: SourceSpan) -> FieldId {
        let ghost = self
            .scopes
            .find_local(scope, name)
            .filter(|f| self.scopes.field(*f).kind == FieldKind::Ghost);
        let func = ghost.and_then(|g| self.scopes.field(g).value);
        let field = self.scopes.declare(scope, name, kind, span);
        if let Some(func) = func {
            self.scopes.field_mut(field).value = None;
            self.flag_ambiguous_function_name(func, name, span);
        }
        field
    }

    /// Marks a named function expression whose name collides with a
    /// binding of the enclosing variable scope as ambiguous.
    fn flag_ambiguous_function_name(&mut self, func: NodeId, name: &str, span: SourceSpan) {
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
        self.report(
            ErrorCode::AmbiguousNamedFunctionExpression,
            span,
            format!("named function expression '{}' is ambiguous", name),
        );
    }

    /// Registers every name bound by a pattern.
    fn declare_pattern(&mut self, pattern: NodeId, scope: ScopeId, kind: FieldKind, is_const: bool) {
        match self.ast.kind(pattern).clone() {
            NodeKind::BindingIdentifier { name, field: None } => {
                let span = self.ast.context(pattern);
                let field = self.declare(scope, &name, kind, span);
                if is_const {
                    self.scopes.field_mut(field).is_literal = true;
                }
                if let NodeKind::BindingIdentifier { field: slot, .. } = self.ast.kind_mut(pattern) {
                    *slot = Some(field);
                }
            }
            NodeKind::ArrayPattern { elements } => {
                for element in elements.into_iter().flatten() {
                    self.declare_pattern(element, scope, kind, is_const);
                }
            }
            NodeKind::ObjectPattern { properties } => {
                for property in properties {
                    self.declare_pattern(property, scope, kind, is_const);
                }
            }
            NodeKind::ObjectProperty { value, .. } => {
                self.declare_pattern(value, scope, kind, is_const)
            }
            NodeKind::AssignmentPattern { target, .. } => {
                self.declare_pattern(target, scope, kind, is_const)
            }
            NodeKind::RestElement { argument } => {
                self.declare_pattern(argument, scope, kind, is_const)
            }
            _ => {}
        }
    }

    /// Fields bound directly by a declaration statement.
    fn bound_fields(&self, node: NodeId) -> Vec<FieldId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            match self.ast.kind(id) {
                NodeKind::BindingIdentifier { field: Some(f), .. } => out.push(*f),
                NodeKind::FunctionObject { binding, .. } | NodeKind::Class { binding, .. } => {
                    stack.extend(binding.iter().copied())
                }
                NodeKind::VariableDeclarator { target, .. } => stack.push(*target),
                NodeKind::AssignmentPattern { target, .. } => stack.push(*target),
                NodeKind::Var { .. }
                | NodeKind::ArrayPattern { .. }
                | NodeKind::ObjectPattern { .. }
                | NodeKind::ObjectProperty { .. }
                | NodeKind::RestElement { .. } => stack.extend(self.ast.children(id)),
                _ => {}
            }
        }
        out
    }

    fn push_block_scope(&mut self) -> ScopeId {
        let scope = self.scopes.push_scope(ScopeKind::Block, self.ctx.scope, None);
        self.ctx.scope = scope;
        scope
    }

    /// Pops a block scope, dropping it from the tree when it declared
    /// nothing. Returns the scope to store on the owning node.
    fn pop_block_scope(&mut self, scope: ScopeId, parent: ScopeId) -> Option<ScopeId> {
        self.ctx.scope = parent;
        if self.scopes.collapse_if_empty(scope) {
            None
        } else {
            Some(scope)
        }
    }

    fn own_scope(&mut self, scope: Option<ScopeId>, owner: NodeId) {
        if let Some(scope) = scope {
            let context = self.ast.context(owner);
            let s = self.scopes.scope_mut(scope);
            s.owner = Some(owner);
            s.context = context;
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Parses statements until `end` (or end of input), recovering from
    /// errors statement by statement.
    fn parse_statement_list(
        &mut self,
        end: Option<Punctuator>,
        directives: bool,
        statements: &mut Vec<NodeId>,
    ) -> PResult<()> {
        let mut in_prologue = directives;
        loop {
            self.flush_comments(statements);
            if self.at_eof() {
                return Ok(());
            }
            if let Some(end) = end {
                if self.at(end) {
                    return Ok(());
                }
            } else if self.at(Punctuator::RBrace) {
                let span = self.current.span;
                self.report(ErrorCode::UnexpectedToken, span, "unexpected '}'");
                self.bump();
                continue;
            }

            let saved = self.ctx;
            let saved_labels = self.labels.len();
            let start_offset = self.current.span.start.offset;
            match self.parse_statement_list_item() {
                Ok(statement) => {
                    if in_prologue {
                        in_prologue = self.check_directive(statement);
                    }
                    statements.push(statement);
                }
                Err(ParseFailure::Recover) => {
                    self.ctx = saved;
                    self.labels.truncate(saved_labels);
                    in_prologue = false;
                    self.synchronize(start_offset);
                }
                Err(abort) => return Err(abort),
            }
        }
    }

    /// Applies a directive prologue entry. Returns whether the prologue
    /// continues.
    fn check_directive(&mut self, statement: NodeId) -> bool {
        match self.ast.kind(statement) {
            NodeKind::Constant(Literal::String(value)) => {
                if value == "use strict" {
                    let scope = self.scopes.variable_scope(self.ctx.scope);
                    self.scopes.scope_mut(scope).use_strict = true;
                    trace!(scope = scope.0, "use strict");
                }
                true
            }
            _ => false,
        }
    }

    fn parse_statement_list_item(&mut self) -> PResult<NodeId> {
        match self.current.token.clone() {
            Token::Keyword(Keyword::Function) => self.parse_function_declaration(false),
            Token::Keyword(Keyword::Async)
                if !self.lexer.peek_token().newline_before
                    && *self.peek() == Token::Keyword(Keyword::Function) =>
            {
                self.parse_function_declaration(true)
            }
            Token::Keyword(Keyword::Class) => self.parse_class(false),
            Token::Keyword(Keyword::Const) => self.parse_variable_statement(DeclarationKind::Const),
            Token::Keyword(Keyword::Let) if self.is_let_declaration() => {
                self.parse_variable_statement(DeclarationKind::Let)
            }
            Token::Keyword(Keyword::Import)
                if !matches!(
                    self.peek(),
                    Token::Punctuator(Punctuator::LParen) | Token::Punctuator(Punctuator::Dot)
                ) =>
            {
                self.parse_import()
            }
            Token::Keyword(Keyword::Export) => self.parse_export(),
            _ => self.parse_statement(),
        }
    }

    fn is_let_declaration(&mut self) -> bool {
        matches!(
            self.peek(),
            Token::Identifier(..)
                | Token::Punctuator(Punctuator::LBracket)
                | Token::Punctuator(Punctuator::LBrace)
                | Token::Keyword(Keyword::Yield)
                | Token::Keyword(Keyword::Await)
                | Token::Keyword(Keyword::Async)
                | Token::Keyword(Keyword::Static)
                | Token::Keyword(Keyword::Let)
        )
    }

    fn parse_statement(&mut self) -> PResult<NodeId> {
        let start = self.current.span;
        match self.current.token.clone() {
            Token::Punctuator(Punctuator::LBrace) => self.parse_block(),
            Token::Punctuator(Punctuator::Semicolon) => {
                self.bump();
                Ok(self.alloc(NodeKind::Empty, start))
            }
            Token::Keyword(Keyword::Var) => self.parse_variable_statement(DeclarationKind::Var),
            Token::Keyword(Keyword::If) => self.parse_if_statement(),
            Token::Keyword(Keyword::For) => self.parse_for_statement(),
            Token::Keyword(Keyword::While) => self.parse_while_statement(),
            Token::Keyword(Keyword::Do) => self.parse_do_while_statement(),
            Token::Keyword(Keyword::Continue) => self.parse_continue_statement(),
            Token::Keyword(Keyword::Break) => self.parse_break_statement(),
            Token::Keyword(Keyword::Return) => self.parse_return_statement(),
            Token::Keyword(Keyword::With) => self.parse_with_statement(),
            Token::Keyword(Keyword::Switch) => self.parse_switch_statement(),
            Token::Keyword(Keyword::Throw) => self.parse_throw_statement(),
            Token::Keyword(Keyword::Try) => self.parse_try_statement(),
            Token::Keyword(Keyword::Debugger) => {
                self.bump();
                self.consume_semicolon();
                Ok(self.alloc(NodeKind::Debugger, start))
            }
            Token::Keyword(Keyword::Function) => {
                self.report(
                    ErrorCode::MisplacedDeclaration,
                    start,
                    "function declaration in statement position",
                );
                self.parse_function_declaration(false)
            }
            Token::Keyword(Keyword::Class) | Token::Keyword(Keyword::Const) => {
                self.report(
                    ErrorCode::MisplacedDeclaration,
                    start,
                    "lexical declaration in statement position",
                );
                self.parse_statement_list_item()
            }
            Token::ConditionalComment(CcMarker::Start) => self.parse_conditional_comment(),
            Token::ConditionalComment(CcMarker::End) => {
                self.bump();
                Ok(self.alloc(NodeKind::Empty, start))
            }
            Token::Identifier(label, _)
                if *self.peek() == Token::Punctuator(Punctuator::Colon) =>
            {
                self.parse_labeled_statement(label)
            }
            _ => {
                let expression = self.parse_expression()?;
                self.consume_semicolon();
                Ok(expression)
            }
        }
    }

    fn parse_block(&mut self) -> PResult<NodeId> {
        let start = self.expect(Punctuator::LBrace)?.span;
        let parent = self.ctx.scope;
        let scope = self.push_block_scope();
        let mut statements = Vec::new();
        let result = self.parse_statement_list(Some(Punctuator::RBrace), false, &mut statements);
        let scope = self.pop_block_scope(scope, parent);
        result?;
        self.close_brace(start);
        let block = self.alloc(
            NodeKind::Block {
                statements,
                scope,
                concise: false,
            },
            self.span_from(start),
        );
        self.own_scope(scope, block);
        Ok(block)
    }

    /// Consumes the `}` closing a block, or reports it missing at end of
    /// input and closes the block there.
    fn close_brace(&mut self, open: SourceSpan) {
        if self.eat(Punctuator::RBrace) {
            return;
        }
        let span = self.current.span;
        self.report(
            ErrorCode::NoRightCurly,
            span,
            format!(
                "expected '}}' to close the block opened at {}:{}",
                open.start.line, open.start.column
            ),
        );
    }

    fn parse_variable_statement(&mut self, kind: DeclarationKind) -> PResult<NodeId> {
        let node = self.parse_variable_declaration(kind)?;
        self.consume_semicolon();
        Ok(node)
    }

    /// Parses `var|let|const` declarators; the `in` operator is excluded
    /// when called from a for-loop head.
    fn parse_variable_declaration(&mut self, kind: DeclarationKind) -> PResult<NodeId> {
        let start = self.bump().span;
        let scope = match kind {
            DeclarationKind::Var => self.scopes.variable_scope(self.ctx.scope),
            _ => self.ctx.scope,
        };
        let mut declarators = Vec::new();
        loop {
            let declarator_start = self.current.span;
            let target = self.parse_binding_target()?;
            self.declare_pattern(target, scope, FieldKind::Local, kind == DeclarationKind::Const);
            let init = if self.eat(Punctuator::Assign) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            let span = self.span_from(declarator_start);
            declarators.push(self.alloc(NodeKind::VariableDeclarator { target, init }, span));
            if !self.eat(Punctuator::Comma) {
                break;
            }
        }
        Ok(self.alloc(NodeKind::Var { kind, declarators }, self.span_from(start)))
    }

    fn parse_if_statement(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        self.expect(Punctuator::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(Punctuator::RParen)?;
        let consequent = self.parse_statement()?;
        let alternate = if self.at_keyword(Keyword::Else) {
            self.bump();
            Some(self.parse_statement()?)
        } else {
            None
        };
        Ok(self.alloc(
            NodeKind::If {
                condition,
                consequent,
                alternate,
            },
            self.span_from(start),
        ))
    }

    fn parse_loop_body(&mut self) -> PResult<NodeId> {
        self.ctx.loop_depth += 1;
        let body = self.parse_statement();
        self.ctx.loop_depth -= 1;
        body
    }

    fn parse_while_statement(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        self.expect(Punctuator::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(Punctuator::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(self.alloc(NodeKind::While { condition, body }, self.span_from(start)))
    }

    fn parse_do_while_statement(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        let body = self.parse_loop_body()?;
        if !self.at_keyword(Keyword::While) {
            return Err(self.fail(ErrorCode::UnexpectedToken, "expected 'while'"));
        }
        self.bump();
        self.expect(Punctuator::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(Punctuator::RParen)?;
        self.eat(Punctuator::Semicolon);
        Ok(self.alloc(NodeKind::DoWhile { body, condition }, self.span_from(start)))
    }

    fn parse_for_statement(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        let is_await = if self.at_keyword(Keyword::Await) {
            self.bump();
            true
        } else {
            false
        };
        self.expect(Punctuator::LParen)?;

        let parent = self.ctx.scope;
        let scope = self.push_block_scope();
        let result = self.parse_for_rest(start, is_await);
        let scope = self.pop_block_scope(scope, parent);
        let node = result?;
        match self.ast.kind_mut(node) {
            NodeKind::For { scope: slot, .. } | NodeKind::ForIn { scope: slot, .. } => *slot = scope,
            _ => {}
        }
        self.own_scope(scope, node);
        Ok(node)
    }

    fn parse_for_rest(&mut self, start: SourceSpan, is_await: bool) -> PResult<NodeId> {
        let saved_no_in = self.ctx.no_in;
        self.ctx.no_in = true;
        let init = if self.at(Punctuator::Semicolon) {
            None
        } else if self.at_keyword(Keyword::Var) {
            Some(self.parse_variable_declaration(DeclarationKind::Var))
        } else if self.at_keyword(Keyword::Const) {
            Some(self.parse_variable_declaration(DeclarationKind::Const))
        } else if self.at_keyword(Keyword::Let) && self.is_let_declaration() {
            Some(self.parse_variable_declaration(DeclarationKind::Let))
        } else {
            Some(self.parse_expression())
        };
        self.ctx.no_in = saved_no_in;
        let init = init.transpose()?;

        let is_of = self.at_identifier("of");
        if let Some(left) = init {
            if is_of || self.at_keyword(Keyword::In) {
                self.bump();
                let right = if is_of {
                    self.parse_assignment()?
                } else {
                    self.parse_expression()?
                };
                self.expect(Punctuator::RParen)?;
                let body = self.parse_loop_body()?;
                return Ok(self.alloc(
                    NodeKind::ForIn {
                        left,
                        right,
                        body,
                        is_of,
                        is_await,
                        scope: None,
                    },
                    self.span_from(start),
                ));
            }
        }

        self.expect(Punctuator::Semicolon)?;
        let condition = if self.at(Punctuator::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(Punctuator::Semicolon)?;
        let update = if self.at(Punctuator::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(Punctuator::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(self.alloc(
            NodeKind::For {
                init,
                condition,
                update,
                body,
                scope: None,
            },
            self.span_from(start),
        ))
    }

    fn parse_jump_label(&mut self) -> Option<(String, SourceSpan)> {
        if self.current.newline_before {
            return None;
        }
        match &self.current.token {
            Token::Identifier(name, _) => {
                let name = name.clone();
                let span = self.bump().span;
                Some((name, span))
            }
            _ => None,
        }
    }

    fn parse_continue_statement(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        let label = self.parse_jump_label();
        match &label {
            Some((name, span)) => {
                if !self.labels.iter().any(|(l, is_loop)| l == name && *is_loop) {
                    self.report(ErrorCode::BadLabel, *span, format!("label '{}' not found", name));
                }
            }
            None if self.ctx.loop_depth == 0 => {
                self.report(ErrorCode::BadBreak, start, "'continue' outside of a loop")
            }
            None => {}
        }
        self.consume_semicolon();
        Ok(self.alloc(
            NodeKind::Continue {
                label: label.map(|(name, _)| name),
            },
            self.span_from(start),
        ))
    }

    fn parse_break_statement(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        let label = self.parse_jump_label();
        match &label {
            Some((name, span)) => {
                if !self.labels.iter().any(|(l, _)| l == name) {
                    self.report(ErrorCode::BadLabel, *span, format!("label '{}' not found", name));
                }
            }
            None if self.ctx.loop_depth == 0 && self.ctx.switch_depth == 0 => {
                self.report(ErrorCode::BadBreak, start, "'break' outside of a loop or switch")
            }
            None => {}
        }
        self.consume_semicolon();
        Ok(self.alloc(
            NodeKind::Break {
                label: label.map(|(name, _)| name),
            },
            self.span_from(start),
        ))
    }

    fn parse_return_statement(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        if !self.ctx.in_function {
            self.report(ErrorCode::UnexpectedToken, start, "'return' outside of a function");
        }
        let value = if self.at(Punctuator::Semicolon)
            || self.at(Punctuator::RBrace)
            || self.at_eof()
            || self.current.newline_before
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon();
        Ok(self.alloc(NodeKind::Return { value }, self.span_from(start)))
    }

    fn parse_with_statement(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        if self.scopes.scope(self.ctx.scope).use_strict {
            self.report(ErrorCode::StrictModeWith, start, "'with' is not allowed in strict mode");
        }
        self.expect(Punctuator::LParen)?;
        let object = self.parse_expression()?;
        self.expect(Punctuator::RParen)?;

        let parent = self.ctx.scope;
        let scope = self.scopes.push_scope(ScopeKind::With, parent, None);
        self.scopes.make_unknown(scope);
        self.ctx.scope = scope;
        let body = self.parse_statement();
        self.ctx.scope = parent;
        let body = body?;
        let node = self.alloc(NodeKind::With { object, body, scope }, self.span_from(start));
        self.own_scope(Some(scope), node);
        Ok(node)
    }

    fn parse_switch_statement(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        self.expect(Punctuator::LParen)?;
        let discriminant = self.parse_expression()?;
        self.expect(Punctuator::RParen)?;
        let open = self.expect(Punctuator::LBrace)?.span;

        let parent = self.ctx.scope;
        let scope = self.push_block_scope();
        self.ctx.switch_depth += 1;
        let result = self.parse_switch_cases();
        self.ctx.switch_depth -= 1;
        let scope = self.pop_block_scope(scope, parent);
        let cases = result?;
        self.close_brace(open);
        let node = self.alloc(
            NodeKind::Switch {
                discriminant,
                cases,
                scope,
            },
            self.span_from(start),
        );
        self.own_scope(scope, node);
        Ok(node)
    }

    fn parse_switch_cases(&mut self) -> PResult<Vec<NodeId>> {
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.at(Punctuator::RBrace) && !self.at_eof() {
            let start = self.current.span;
            let test = if self.at_keyword(Keyword::Case) {
                self.bump();
                Some(self.parse_expression()?)
            } else if self.at_keyword(Keyword::Default) {
                self.bump();
                if seen_default {
                    self.report(ErrorCode::DuplicateDefault, start, "duplicate 'default' clause");
                }
                seen_default = true;
                None
            } else {
                return Err(self.fail(ErrorCode::UnexpectedToken, "expected 'case' or 'default'"));
            };
            self.expect(Punctuator::Colon)?;
            let mut statements = Vec::new();
            loop {
                self.flush_comments(&mut statements);
                if self.at_keyword(Keyword::Case)
                    || self.at_keyword(Keyword::Default)
                    || self.at(Punctuator::RBrace)
                    || self.at_eof()
                {
                    break;
                }
                let saved = self.ctx;
                let start_offset = self.current.span.start.offset;
                match self.parse_statement_list_item() {
                    Ok(statement) => statements.push(statement),
                    Err(ParseFailure::Recover) => {
                        self.ctx = saved;
                        self.synchronize(start_offset);
                    }
                    Err(abort) => return Err(abort),
                }
            }
            cases.push(self.alloc(NodeKind::SwitchCase { test, statements }, self.span_from(start)));
        }
        Ok(cases)
    }

    fn parse_throw_statement(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        let value = self.parse_expression()?;
        self.consume_semicolon();
        Ok(self.alloc(NodeKind::Throw { value }, self.span_from(start)))
    }

    fn parse_try_statement(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        let body = self.parse_block()?;
        let mut catch_binding = None;
        let mut catch_body = None;
        let mut catch_scope = None;
        if self.at_keyword(Keyword::Catch) {
            let catch_start = self.bump().span;
            let parent = self.ctx.scope;
            let scope = self.scopes.push_scope(ScopeKind::Catch, parent, None);
            self.ctx.scope = scope;
            let result = (|| -> PResult<NodeId> {
                if self.eat(Punctuator::LParen) {
                    let binding = self.parse_binding_target()?;
                    self.declare_pattern(binding, scope, FieldKind::CatchError, false);
                    catch_binding = Some(binding);
                    self.expect(Punctuator::RParen)?;
                }
                self.parse_block()
            })();
            self.ctx.scope = parent;
            let block = result?;
            catch_body = Some(block);
            catch_scope = Some(scope);
            let span = self.span_from(catch_start);
            let s = self.scopes.scope_mut(scope);
            s.context = span;
        }
        let finally = if self.at_keyword(Keyword::Finally) {
            self.bump();
            Some(self.parse_block()?)
        } else {
            None
        };
        if catch_body.is_none() && finally.is_none() {
            let span = self.current.span;
            self.report(ErrorCode::NoCatchOrFinally, span, "expected 'catch' or 'finally'");
        }
        let node = self.alloc(
            NodeKind::Try {
                body,
                catch_binding,
                catch_body,
                catch_scope,
                finally,
            },
            self.span_from(start),
        );
        if let Some(scope) = catch_scope {
            self.scopes.scope_mut(scope).owner = Some(node);
        }
        Ok(node)
    }

    fn parse_labeled_statement(&mut self, label: String) -> PResult<NodeId> {
        let start = self.bump().span;
        self.bump(); // ':'
        let is_loop = matches!(
            self.current.token,
            Token::Keyword(Keyword::For) | Token::Keyword(Keyword::While) | Token::Keyword(Keyword::Do)
        );
        self.labels.push((label.clone(), is_loop));
        let body = self.parse_statement();
        self.labels.pop();
        let body = body?;
        Ok(self.alloc(NodeKind::Labeled { label, body }, self.span_from(start)))
    }

    fn parse_conditional_comment(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        let mut statements = Vec::new();
        loop {
            self.flush_comments(&mut statements);
            let marker_start = self.current.span;
            match self.current.token.clone() {
                Token::ConditionalComment(CcMarker::End) => {
                    self.bump();
                    break;
                }
                Token::EOF => {
                    self.report(ErrorCode::UnterminatedComment, start, "unterminated conditional comment");
                    break;
                }
                Token::ConditionalComment(CcMarker::On) => {
                    self.bump();
                    statements.push(self.alloc(NodeKind::CcOn, marker_start));
                }
                Token::ConditionalComment(CcMarker::Set) => {
                    self.bump();
                    let name = match self.current.token.clone() {
                        Token::ConditionalComment(CcMarker::Variable(name)) => {
                            self.bump();
                            name
                        }
                        _ => {
                            return Err(self.fail(
                                ErrorCode::ExpectedIdentifier,
                                "expected '@name' after '@set'",
                            ))
                        }
                    };
                    self.expect(Punctuator::Assign)?;
                    let value = self.parse_assignment()?;
                    let span = self.span_from(marker_start);
                    statements.push(self.alloc(NodeKind::CcSet { name, value }, span));
                }
                Token::ConditionalComment(marker @ (CcMarker::If | CcMarker::ElseIf)) => {
                    self.bump();
                    self.expect(Punctuator::LParen)?;
                    let condition = self.parse_expression()?;
                    self.expect(Punctuator::RParen)?;
                    let kind = if marker == CcMarker::If {
                        NodeKind::CcIf { condition }
                    } else {
                        NodeKind::CcElseIf { condition }
                    };
                    let span = self.span_from(marker_start);
                    statements.push(self.alloc(kind, span));
                }
                Token::ConditionalComment(CcMarker::Else) => {
                    self.bump();
                    statements.push(self.alloc(NodeKind::CcElse, marker_start));
                }
                Token::ConditionalComment(CcMarker::EndIf) => {
                    self.bump();
                    statements.push(self.alloc(NodeKind::CcEnd, marker_start));
                }
                _ => {
                    let saved = self.ctx;
                    let start_offset = self.current.span.start.offset;
                    match self.parse_statement_list_item() {
                        Ok(statement) => statements.push(statement),
                        Err(ParseFailure::Recover) => {
                            self.ctx = saved;
                            self.synchronize(start_offset);
                        }
                        Err(abort) => return Err(abort),
                    }
                }
            }
        }
        Ok(self.alloc(NodeKind::CcComment { statements }, self.span_from(start)))
    }

    // ------------------------------------------------------------------
    // Modules
    // ------------------------------------------------------------------

    fn parse_module_specifier(&mut self) -> PResult<String> {
        if !self.at_identifier("from") {
            return Err(self.fail(ErrorCode::UnexpectedToken, "expected 'from'"));
        }
        self.bump();
        match self.current.token.clone() {
            Token::String(source) => {
                self.bump();
                Ok(source)
            }
            _ => Err(self.fail(ErrorCode::UnexpectedToken, "expected module specifier")),
        }
    }

    fn import_binding(&mut self, name: String, span: SourceSpan) -> NodeId {
        let binding = self.alloc(NodeKind::BindingIdentifier { name, field: None }, span);
        let scope = self.ctx.scope;
        self.declare_pattern(binding, scope, FieldKind::Local, true);
        binding
    }

    fn parse_import(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        if let Token::String(source) = self.current.token.clone() {
            self.bump();
            self.consume_semicolon();
            return Ok(self.alloc(
                NodeKind::Import {
                    specifiers: Vec::new(),
                    source,
                },
                self.span_from(start),
            ));
        }

        let mut specifiers = Vec::new();
        if let Some(name) = self.identifier_text() {
            let span = self.bump().span;
            let local = self.import_binding(name, span);
            specifiers.push(self.alloc(
                NodeKind::ImportSpecifier {
                    kind: ImportKind::Default,
                    imported: None,
                    local,
                },
                span,
            ));
            if !self.eat(Punctuator::Comma) {
                let source = self.parse_module_specifier()?;
                self.consume_semicolon();
                return Ok(self.alloc(NodeKind::Import { specifiers, source }, self.span_from(start)));
            }
        }

        if self.at(Punctuator::Star) {
            let star = self.bump().span;
            if !self.at_identifier("as") {
                return Err(self.fail(ErrorCode::UnexpectedToken, "expected 'as'"));
            }
            self.bump();
            let (name, span) = self.expect_identifier()?;
            let local = self.import_binding(name, span);
            specifiers.push(self.alloc(
                NodeKind::ImportSpecifier {
                    kind: ImportKind::Namespace,
                    imported: None,
                    local,
                },
                self.span_from(star),
            ));
        } else if self.eat(Punctuator::LBrace) {
            while !self.at(Punctuator::RBrace) {
                let spec_start = self.current.span;
                let (imported, imported_span) = self.expect_identifier_name()?;
                let (local_name, local_span) = if self.at_identifier("as") {
                    self.bump();
                    self.expect_identifier()?
                } else {
                    (imported.clone(), imported_span)
                };
                let local = self.import_binding(local_name, local_span);
                specifiers.push(self.alloc(
                    NodeKind::ImportSpecifier {
                        kind: ImportKind::Named,
                        imported: Some(imported),
                        local,
                    },
                    self.span_from(spec_start),
                ));
                if !self.eat(Punctuator::Comma) {
                    break;
                }
            }
            self.expect(Punctuator::RBrace)?;
        }
        let source = self.parse_module_specifier()?;
        self.consume_semicolon();
        Ok(self.alloc(NodeKind::Import { specifiers, source }, self.span_from(start)))
    }

    fn parse_export(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        let empty = |kind| NodeKind::Export {
            kind,
            declaration: None,
            specifiers: Vec::new(),
            source: None,
            namespace: None,
        };

        if self.at_keyword(Keyword::Default) {
            self.bump();
            self.last_was_default = true;
            let declaration = match self.current.token.clone() {
                Token::Keyword(Keyword::Function) => self.parse_function_declaration(false),
                Token::Keyword(Keyword::Async)
                    if *self.peek() == Token::Keyword(Keyword::Function) =>
                {
                    self.parse_function_declaration(true)
                }
                Token::Keyword(Keyword::Class) => self.parse_class(false),
                _ => {
                    self.last_was_default = false;
                    let value = self.parse_assignment();
                    self.consume_semicolon();
                    value
                }
            };
            self.last_was_default = false;
            let declaration = declaration?;
            let mut kind = empty(ExportKind::Default);
            if let NodeKind::Export { declaration: slot, .. } = &mut kind {
                *slot = Some(declaration);
            }
            return Ok(self.alloc(kind, self.span_from(start)));
        }

        if self.at(Punctuator::Star) {
            self.bump();
            let namespace = if self.at_identifier("as") {
                self.bump();
                Some(self.expect_identifier_name()?.0)
            } else {
                None
            };
            let source = self.parse_module_specifier()?;
            self.consume_semicolon();
            let mut kind = empty(ExportKind::All);
            if let NodeKind::Export {
                source: s,
                namespace: n,
                ..
            } = &mut kind
            {
                *s = Some(source);
                *n = namespace;
            }
            return Ok(self.alloc(kind, self.span_from(start)));
        }

        if self.eat(Punctuator::LBrace) {
            let mut names = Vec::new();
            while !self.at(Punctuator::RBrace) {
                let spec_start = self.current.span;
                let (local, local_span) = self.expect_identifier_name()?;
                let exported = if self.at_identifier("as") {
                    self.bump();
                    Some(self.expect_identifier_name()?.0)
                } else {
                    None
                };
                names.push((local, local_span, exported, spec_start));
                if !self.eat(Punctuator::Comma) {
                    break;
                }
            }
            self.expect(Punctuator::RBrace)?;
            let source = if self.at_identifier("from") {
                Some(self.parse_module_specifier()?)
            } else {
                None
            };
            self.consume_semicolon();
            let mut specifiers = Vec::new();
            for (local, local_span, exported, spec_start) in names {
                let local = if source.is_some() {
                    self.alloc(NodeKind::PropertyName { name: local }, local_span)
                } else {
                    self.alloc(
                        NodeKind::Lookup {
                            name: local,
                            field: None,
                            ref_type: ReferenceType::Variable,
                        },
                        local_span,
                    )
                };
                let span = self.span_from(spec_start);
                specifiers.push(self.alloc(NodeKind::ExportSpecifier { local, exported }, span));
            }
            let mut kind = empty(ExportKind::Named);
            if let NodeKind::Export {
                specifiers: slot,
                source: s,
                ..
            } = &mut kind
            {
                *slot = specifiers;
                *s = source;
            }
            return Ok(self.alloc(kind, self.span_from(start)));
        }

        let declaration = self.parse_statement_list_item()?;
        if !matches!(
            self.ast.kind(declaration),
            NodeKind::Var { .. }
                | NodeKind::FunctionObject {
                    kind: FunctionKind::Declaration,
                    ..
                }
                | NodeKind::Class {
                    is_expression: false,
                    ..
                }
        ) {
            let span = self.ast.context(declaration);
            self.report(ErrorCode::UnexpectedToken, span, "expected declaration after 'export'");
        }
        for field in self.bound_fields(declaration) {
            let field = self.scopes.field_mut(field);
            field.is_exported = true;
            field.can_crunch = false;
        }
        let mut kind = empty(ExportKind::Declaration);
        if let NodeKind::Export { declaration: slot, .. } = &mut kind {
            *slot = Some(declaration);
        }
        Ok(self.alloc(kind, self.span_from(start)))
    }

    // ------------------------------------------------------------------
    // Functions and classes
    // ------------------------------------------------------------------

    fn parse_function_declaration(&mut self, is_async: bool) -> PResult<NodeId> {
        let start = self.current.span;
        if is_async {
            self.bump();
        }
        self.bump(); // function
        self.parse_function_rest(FunctionKind::Declaration, is_async, start)
    }

    /// Parses `[*] [name] (params) { body }` after the `function` keyword.
    fn parse_function_rest(
        &mut self,
        kind: FunctionKind,
        is_async: bool,
        start: SourceSpan,
    ) -> PResult<NodeId> {
        let is_generator = self.eat(Punctuator::Star);
        let name = match self.identifier_text() {
            Some(name) => {
                let span = self.bump().span;
                Some((name, span))
            }
            None if kind == FunctionKind::Declaration && !self.last_was_default =>
            {
                return Err(self.fail(ErrorCode::ExpectedIdentifier, "expected function name"));
            }
            None => None,
        };
        self.last_was_default = false;

        let enclosing = self.ctx.scope;
        let mut name_scope = None;
        let mut name_field = None;
        let binding = match &name {
            Some((name, span)) => {
                let binding = self.alloc(
                    NodeKind::BindingIdentifier {
                        name: name.clone(),
                        field: None,
                    },
                    *span,
                );
                let field = if kind == FunctionKind::Declaration {
                    let scope = self.scopes.variable_scope(enclosing);
                    let field = self.declare(scope, name, FieldKind::Local, *span);
                    self.scopes.field_mut(field).is_function = true;
                    field
                } else {
                    let scope = self.scopes.push_scope(ScopeKind::Block, enclosing, None);
                    self.scopes.scope_mut(scope).is_name_scope = true;
                    name_scope = Some(scope);
                    self.scopes.declare(scope, name, FieldKind::Local, *span)
                };
                if let NodeKind::BindingIdentifier { field: slot, .. } = self.ast.kind_mut(binding) {
                    *slot = Some(field);
                }
                name_field = Some(field);
                Some(binding)
            }
            None => None,
        };

        let function_parent = name_scope.unwrap_or(enclosing);
        let scope = self.scopes.push_scope(ScopeKind::Function, function_parent, None);
        let (params, body) = self.parse_function_signature_and_body(scope, is_async, is_generator)?;
        let node = self.alloc(
            NodeKind::FunctionObject {
                kind,
                binding,
                params,
                body,
                is_async,
                is_generator,
                scope,
                name_scope,
            },
            self.span_from(start),
        );
        self.own_scope(Some(scope), node);
        self.own_scope(name_scope, node);
        if let Some(field) = name_field {
            self.scopes.field_mut(field).value = Some(node);
        }
        if let (Some(_), Some((name, span))) = (name_scope, &name) {
            self.place_ghost(enclosing, name, *span, node);
        }
        Ok(node)
    }

    /// Reserves a named function expression's name in the enclosing
    /// variable scope.
    fn place_ghost(&mut self, enclosing: ScopeId, name: &str, span: SourceSpan, func: NodeId) {
        let scope = self.scopes.variable_scope(enclosing);
        match self.scopes.find_local(scope, name) {
            None => {
                let ghost = self.scopes.create_field(scope, name, FieldKind::Ghost);
                let ghost = self.scopes.field_mut(ghost);
                ghost.value = Some(func);
                ghost.is_placeholder = true;
            }
            Some(existing) => {
                let field = self.scopes.field(existing);
                if field.kind != FieldKind::Ghost && field.is_declared() {
                    self.flag_ambiguous_function_name(func, name, span);
                }
            }
        }
    }

    /// Parses `(params) { body }` into the given function scope.
    fn parse_function_signature_and_body(
        &mut self,
        scope: ScopeId,
        is_async: bool,
        is_generator: bool,
    ) -> PResult<(Vec<NodeId>, NodeId)> {
        let saved = self.ctx;
        self.ctx.scope = scope;
        self.ctx.in_async = is_async;
        self.ctx.in_generator = is_generator;
        let params = self.parse_formal_parameters(scope);
        let result = match params {
            Ok(params) => self.parse_function_body(scope, is_async, is_generator).map(|b| (params, b)),
            Err(e) => Err(e),
        };
        self.ctx = saved;
        result
    }

    fn parse_formal_parameters(&mut self, scope: ScopeId) -> PResult<Vec<NodeId>> {
        self.expect(Punctuator::LParen)?;
        let mut params = Vec::new();
        while !self.at(Punctuator::RParen) {
            let start = self.current.span;
            let param = if self.eat(Punctuator::Spread) {
                let argument = self.parse_binding_target()?;
                self.alloc(NodeKind::RestElement { argument }, self.span_from(start))
            } else {
                self.parse_binding_element()?
            };
            self.declare_pattern(param, scope, FieldKind::Argument, false);
            params.push(param);
            if !self.eat(Punctuator::Comma) {
                break;
            }
        }
        self.expect(Punctuator::RParen)?;
        Ok(params)
    }

    fn parse_function_body(&mut self, scope: ScopeId, is_async: bool, is_generator: bool) -> PResult<NodeId> {
        let open = self.expect(Punctuator::LBrace)?.span;
        let saved = self.ctx;
        let saved_labels = std::mem::take(&mut self.labels);
        self.ctx = Context {
            scope,
            in_function: true,
            in_generator: is_generator,
            in_async: is_async,
            loop_depth: 0,
            switch_depth: 0,
            no_in: false,
        };
        let mut statements = Vec::new();
        let result = self.parse_statement_list(Some(Punctuator::RBrace), true, &mut statements);
        self.ctx = saved;
        self.labels = saved_labels;
        result?;
        self.close_brace(open);
        Ok(self.alloc(
            NodeKind::Block {
                statements,
                scope: None,
                concise: false,
            },
            self.span_from(open),
        ))
    }

    /// Builds an arrow function from already-converted parameter patterns.
    fn finish_arrow(
        &mut self,
        params: Vec<NodeId>,
        is_async: bool,
        start: SourceSpan,
        scope_marker: usize,
    ) -> PResult<NodeId> {
        if !self.at(Punctuator::Arrow) {
            return Err(self.fail(ErrorCode::UnexpectedToken, "expected '=>'"));
        }
        self.bump();
        let enclosing = self.ctx.scope;
        let scope = self.scopes.push_scope(ScopeKind::Function, enclosing, None);
        self.scopes.scope_mut(scope).is_arrow = true;
        self.scopes.adopt_scopes(scope_marker, enclosing, scope);
        for param in &params {
            self.declare_pattern(*param, scope, FieldKind::Argument, false);
        }

        let body = if self.at(Punctuator::LBrace) {
            self.parse_function_body(scope, is_async, false)?
        } else {
            let saved = self.ctx;
            self.ctx.scope = scope;
            self.ctx.in_function = true;
            self.ctx.in_async = is_async;
            self.ctx.in_generator = false;
            let body_start = self.current.span;
            let expression = self.parse_assignment();
            self.ctx = saved;
            let expression = expression?;
            self.alloc(
                NodeKind::Block {
                    statements: vec![expression],
                    scope: None,
                    concise: true,
                },
                self.span_from(body_start),
            )
        };
        let node = self.alloc(
            NodeKind::FunctionObject {
                kind: FunctionKind::Arrow,
                binding: None,
                params,
                body,
                is_async,
                is_generator: false,
                scope,
                name_scope: None,
            },
            self.span_from(start),
        );
        self.own_scope(Some(scope), node);
        Ok(node)
    }

    /// Converts an expression parsed under the cover grammar into a binding
    /// pattern, in place.
    fn to_binding(&mut self, expression: NodeId) -> PResult<NodeId> {
        let span = self.ast.context(expression);
        match self.ast.kind(expression).clone() {
            NodeKind::Lookup { name, .. } => {
                self.ast
                    .set_kind(expression, NodeKind::BindingIdentifier { name, field: None });
            }
            NodeKind::ArrayLiteral { elements } => {
                let mut converted = Vec::with_capacity(elements.len());
                for element in elements {
                    converted.push(match element {
                        Some(e) => Some(self.to_binding(e)?),
                        None => None,
                    });
                }
                self.ast
                    .set_kind(expression, NodeKind::ArrayPattern { elements: converted });
            }
            NodeKind::ObjectLiteral { properties, .. } => {
                for property in &properties {
                    match self.ast.kind(*property).clone() {
                        NodeKind::ObjectProperty {
                            value,
                            kind: PropertyKind::Init | PropertyKind::Shorthand,
                            ..
                        } => {
                            self.to_binding(value)?;
                        }
                        NodeKind::Spread { .. } => {
                            self.to_binding(*property)?;
                        }
                        _ => return Err(self.invalid_target(span)),
                    }
                }
                self.ast
                    .set_kind(expression, NodeKind::ObjectPattern { properties });
            }
            NodeKind::Binary {
                op: BinaryOp::Assign,
                left,
                right,
            } => {
                let target = self.to_binding(left)?;
                self.ast.set_kind(
                    expression,
                    NodeKind::AssignmentPattern {
                        target,
                        default: right,
                    },
                );
            }
            NodeKind::Spread { argument } => {
                let argument = self.to_binding(argument)?;
                self.ast
                    .set_kind(expression, NodeKind::RestElement { argument });
            }
            NodeKind::BindingIdentifier { .. }
            | NodeKind::ArrayPattern { .. }
            | NodeKind::ObjectPattern { .. }
            | NodeKind::AssignmentPattern { .. }
            | NodeKind::RestElement { .. } => {}
            _ => return Err(self.invalid_target(span)),
        }
        Ok(expression)
    }

    fn invalid_target(&mut self, span: SourceSpan) -> ParseFailure {
        self.report(ErrorCode::InvalidAssignmentTarget, span, "invalid binding pattern");
        ParseFailure::Recover
    }

    fn parse_class(&mut self, is_expression: bool) -> PResult<NodeId> {
        let start = self.bump().span;
        let enclosing = self.ctx.scope;
        let name = match self.identifier_text() {
            Some(name) if !self.at_keyword(Keyword::Extends) => {
                let span = self.bump().span;
                Some((name, span))
            }
            _ => None,
        };
        let scope = self.scopes.push_scope(ScopeKind::Class, enclosing, None);
        self.scopes.scope_mut(scope).use_strict = true;
        let binding = match &name {
            Some((name, span)) => {
                let binding = self.alloc(
                    NodeKind::BindingIdentifier {
                        name: name.clone(),
                        field: None,
                    },
                    *span,
                );
                let target = if is_expression { scope } else { enclosing };
                self.declare_pattern(binding, target, FieldKind::Local, false);
                Some(binding)
            }
            None if !is_expression && !self.last_was_default => {
                return Err(self.fail(ErrorCode::ExpectedIdentifier, "expected class name"));
            }
            None => None,
        };
        self.last_was_default = false;
        let heritage = if self.at_keyword(Keyword::Extends) {
            self.bump();
            Some(self.parse_left_hand_side()?)
        } else {
            None
        };

        let open = self.expect(Punctuator::LBrace)?.span;
        let saved = self.ctx;
        self.ctx.scope = scope;
        let members = self.parse_class_members();
        self.ctx = saved;
        let members = members?;
        self.close_brace(open);

        let node = self.alloc(
            NodeKind::Class {
                binding,
                heritage,
                members,
                is_expression,
                scope,
            },
            self.span_from(start),
        );
        self.own_scope(Some(scope), node);
        if let Some(binding) = binding {
            if let NodeKind::BindingIdentifier { field: Some(f), .. } = self.ast.kind(binding) {
                let f = *f;
                self.scopes.field_mut(f).value = Some(node);
            }
        }
        Ok(node)
    }

    fn parse_class_members(&mut self) -> PResult<Vec<NodeId>> {
        let mut members = Vec::new();
        while !self.at(Punctuator::RBrace) && !self.at_eof() {
            if self.eat(Punctuator::Semicolon) {
                continue;
            }
            let start = self.current.span;
            let is_static = self.at_keyword(Keyword::Static)
                && !matches!(
                    self.peek(),
                    Token::Punctuator(Punctuator::LParen) | Token::Punctuator(Punctuator::Assign)
                );
            if is_static {
                self.bump();
            }
            let (kind, is_async, is_generator) = self.parse_method_prefix();
            let (key, computed) = self.parse_property_key()?;
            if self.at(Punctuator::LParen) {
                let function_kind = match kind {
                    ClassMemberKind::Getter => FunctionKind::Getter,
                    ClassMemberKind::Setter => FunctionKind::Setter,
                    _ => FunctionKind::Method,
                };
                let value = self.parse_method(function_kind, is_async, is_generator, start)?;
                let member_kind = if kind == ClassMemberKind::Field {
                    ClassMemberKind::Method
                } else {
                    kind
                };
                members.push(self.alloc(
                    NodeKind::ClassMember {
                        key,
                        value: Some(value),
                        kind: member_kind,
                        is_static,
                        computed,
                    },
                    self.span_from(start),
                ));
            } else {
                let value = if self.eat(Punctuator::Assign) {
                    let saved = self.ctx;
                    self.ctx.in_function = true;
                    let value = self.parse_assignment();
                    self.ctx = saved;
                    Some(value?)
                } else {
                    None
                };
                self.consume_semicolon();
                members.push(self.alloc(
                    NodeKind::ClassMember {
                        key,
                        value,
                        kind: ClassMemberKind::Field,
                        is_static,
                        computed,
                    },
                    self.span_from(start),
                ));
            }
        }
        Ok(members)
    }

    /// Reads `get`, `set`, `async` and `*` in front of a method key.
    /// Field means no accessor prefix was present.
    fn parse_method_prefix(&mut self) -> (ClassMemberKind, bool, bool) {
        let followed_by_key = |token: &Token| {
            !matches!(
                token,
                Token::Punctuator(Punctuator::LParen)
                    | Token::Punctuator(Punctuator::Colon)
                    | Token::Punctuator(Punctuator::Comma)
                    | Token::Punctuator(Punctuator::RBrace)
                    | Token::Punctuator(Punctuator::Assign)
                    | Token::Punctuator(Punctuator::Semicolon)
                    | Token::EOF
            )
        };
        let mut kind = ClassMemberKind::Field;
        let mut is_async = false;
        if self.at_identifier("get") || self.at_identifier("set") {
            let next = self.peek().clone();
            if followed_by_key(&next) {
                kind = if self.at_identifier("get") {
                    ClassMemberKind::Getter
                } else {
                    ClassMemberKind::Setter
                };
                self.bump();
            }
        } else if self.at_keyword(Keyword::Async) {
            let newline = self.lexer.peek_token().newline_before;
            let next = self.peek().clone();
            if !newline && followed_by_key(&next) {
                is_async = true;
                self.bump();
            }
        }
        let is_generator = self.eat(Punctuator::Star);
        (kind, is_async, is_generator)
    }

    /// Parses a property key. Returns the key node and whether it is
    /// computed.
    fn parse_property_key(&mut self) -> PResult<(NodeId, bool)> {
        let start = self.current.span;
        match self.current.token.clone() {
            Token::String(value) => {
                self.bump();
                Ok((self.alloc(NodeKind::Constant(Literal::String(value)), start), false))
            }
            Token::Number(value) => {
                self.bump();
                Ok((self.alloc(NodeKind::Constant(Literal::Number(value)), start), false))
            }
            Token::BigIntLiteral(digits) => {
                self.bump();
                Ok((self.alloc(NodeKind::BigInt { digits }, start), false))
            }
            Token::Punctuator(Punctuator::LBracket) => {
                self.bump();
                let saved_no_in = self.ctx.no_in;
                self.ctx.no_in = false;
                let key = self.parse_assignment();
                self.ctx.no_in = saved_no_in;
                let key = key?;
                self.expect(Punctuator::RBracket)?;
                Ok((key, true))
            }
            _ => {
                let (name, span) = self.expect_identifier_name()?;
                Ok((self.alloc(NodeKind::PropertyName { name }, span), false))
            }
        }
    }

    fn parse_method(
        &mut self,
        kind: FunctionKind,
        is_async: bool,
        is_generator: bool,
        start: SourceSpan,
    ) -> PResult<NodeId> {
        let scope = self.scopes.push_scope(ScopeKind::Function, self.ctx.scope, None);
        let (params, body) = self.parse_function_signature_and_body(scope, is_async, is_generator)?;
        let node = self.alloc(
            NodeKind::FunctionObject {
                kind,
                binding: None,
                params,
                body,
                is_async,
                is_generator,
                scope,
                name_scope: None,
            },
            self.span_from(start),
        );
        self.own_scope(Some(scope), node);
        Ok(node)
    }

    // ------------------------------------------------------------------
    // Binding patterns
    // ------------------------------------------------------------------

    fn parse_binding_element(&mut self) -> PResult<NodeId> {
        let start = self.current.span;
        let target = self.parse_binding_target()?;
        if self.eat(Punctuator::Assign) {
            let default = self.parse_assignment()?;
            return Ok(self.alloc(
                NodeKind::AssignmentPattern { target, default },
                self.span_from(start),
            ));
        }
        Ok(target)
    }

    fn parse_binding_target(&mut self) -> PResult<NodeId> {
        let start = self.current.span;
        if self.eat(Punctuator::LBracket) {
            let mut elements = Vec::new();
            while !self.at(Punctuator::RBracket) {
                if self.eat(Punctuator::Comma) {
                    elements.push(None);
                    continue;
                }
                let element_start = self.current.span;
                let element = if self.eat(Punctuator::Spread) {
                    let argument = self.parse_binding_target()?;
                    self.alloc(NodeKind::RestElement { argument }, self.span_from(element_start))
                } else {
                    self.parse_binding_element()?
                };
                elements.push(Some(element));
                if !self.eat(Punctuator::Comma) {
                    break;
                }
            }
            self.expect(Punctuator::RBracket)?;
            return Ok(self.alloc(NodeKind::ArrayPattern { elements }, self.span_from(start)));
        }

        if self.eat(Punctuator::LBrace) {
            let mut properties = Vec::new();
            while !self.at(Punctuator::RBrace) {
                let property_start = self.current.span;
                if self.eat(Punctuator::Spread) {
                    let argument = self.parse_binding_target()?;
                    properties.push(
                        self.alloc(NodeKind::RestElement { argument }, self.span_from(property_start)),
                    );
                } else {
                    let shorthand = self.identifier_text();
                    let (key, computed) = self.parse_property_key()?;
                    let (value, kind) = if self.eat(Punctuator::Colon) {
                        (self.parse_binding_element()?, PropertyKind::Init)
                    } else {
                        let Some(name) = shorthand.filter(|_| !computed) else {
                            return Err(self.fail(ErrorCode::NoColon, "expected ':'"));
                        };
                        let span = self.ast.context(key);
                        let binding =
                            self.alloc(NodeKind::BindingIdentifier { name, field: None }, span);
                        let value = if self.eat(Punctuator::Assign) {
                            let default = self.parse_assignment()?;
                            self.alloc(
                                NodeKind::AssignmentPattern {
                                    target: binding,
                                    default,
                                },
                                self.span_from(property_start),
                            )
                        } else {
                            binding
                        };
                        (value, PropertyKind::Shorthand)
                    };
                    properties.push(self.alloc(
                        NodeKind::ObjectProperty {
                            key,
                            value,
                            kind,
                            computed,
                        },
                        self.span_from(property_start),
                    ));
                }
                if !self.eat(Punctuator::Comma) {
                    break;
                }
            }
            self.expect(Punctuator::RBrace)?;
            return Ok(self.alloc(NodeKind::ObjectPattern { properties }, self.span_from(start)));
        }

        let (name, span) = self.expect_identifier()?;
        Ok(self.alloc(NodeKind::BindingIdentifier { name, field: None }, span))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expression(&mut self) -> PResult<NodeId> {
        let start = self.current.span;
        let mut expression = self.parse_assignment()?;
        while self.eat(Punctuator::Comma) {
            let right = self.parse_assignment()?;
            expression = self.alloc(
                NodeKind::Binary {
                    op: BinaryOp::Comma,
                    left: expression,
                    right,
                },
                self.span_from(start),
            );
        }
        Ok(expression)
    }

    fn parse_assignment(&mut self) -> PResult<NodeId> {
        let start = self.current.span;
        if self.at_keyword(Keyword::Yield) && self.ctx.in_generator {
            return self.parse_yield();
        }
        let left = self.parse_conditional()?;
        if let Some(op) = assignment_operator(&self.current.token) {
            self.check_assignment_target(left, op == BinaryOp::Assign);
            self.bump();
            let right = self.parse_assignment()?;
            return Ok(self.alloc(NodeKind::Binary { op, left, right }, self.span_from(start)));
        }
        Ok(left)
    }

    fn check_assignment_target(&mut self, target: NodeId, allow_pattern: bool) {
        let inner = self.ast.unwrap_grouping(target);
        let valid = match self.ast.kind(inner) {
            NodeKind::Lookup { .. } | NodeKind::Member { .. } | NodeKind::Index { .. } => true,
            NodeKind::ArrayLiteral { .. } | NodeKind::ObjectLiteral { .. } => {
                allow_pattern && inner == target
            }
            _ => false,
        };
        if !valid {
            let span = self.ast.context(target);
            self.report(ErrorCode::InvalidAssignmentTarget, span, "invalid assignment target");
        }
    }

    fn parse_yield(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        let delegate = !self.current.newline_before && self.eat(Punctuator::Star);
        let ends_expression = self.current.newline_before
            || self.at_eof()
            || matches!(
                self.current.token,
                Token::Punctuator(
                    Punctuator::RParen
                        | Punctuator::RBracket
                        | Punctuator::RBrace
                        | Punctuator::Comma
                        | Punctuator::Semicolon
                        | Punctuator::Colon
                ) | Token::TemplateMiddle(_)
                    | Token::TemplateTail(_)
            );
        let argument = if delegate || !ends_expression {
            Some(self.parse_assignment()?)
        } else {
            None
        };
        Ok(self.alloc(NodeKind::Yield { argument, delegate }, self.span_from(start)))
    }

    fn parse_conditional(&mut self) -> PResult<NodeId> {
        let start = self.current.span;
        let condition = self.parse_binary(Precedence::Coalesce as u8)?;
        if !self.eat(Punctuator::Question) {
            return Ok(condition);
        }
        let saved_no_in = self.ctx.no_in;
        self.ctx.no_in = false;
        let consequent = self.parse_assignment();
        self.ctx.no_in = saved_no_in;
        let consequent = consequent?;
        self.expect(Punctuator::Colon)?;
        let alternate = self.parse_assignment()?;
        Ok(self.alloc(
            NodeKind::Conditional {
                condition,
                consequent,
                alternate,
            },
            self.span_from(start),
        ))
    }

    /// Precedence climbing over the binary operator table.
    fn parse_binary(&mut self, min_precedence: u8) -> PResult<NodeId> {
        let start = self.current.span;
        let mut left = self.parse_unary()?;
        loop {
            let Some(op) = binary_operator(&self.current.token) else {
                break;
            };
            if op == BinaryOp::In && self.ctx.no_in {
                break;
            }
            let precedence = op.precedence() as u8;
            if precedence < min_precedence {
                break;
            }
            self.bump();
            let next_min = match op.associativity() {
                Associativity::Left => precedence + 1,
                Associativity::Right => precedence,
            };
            let right = self.parse_binary(next_min)?;
            left = self.alloc(NodeKind::Binary { op, left, right }, self.span_from(start));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<NodeId> {
        let start = self.current.span;
        let op = match &self.current.token {
            Token::Punctuator(Punctuator::Not) => Some(UnaryOp::Not),
            Token::Punctuator(Punctuator::Tilde) => Some(UnaryOp::BitwiseNot),
            Token::Punctuator(Punctuator::Plus) => Some(UnaryOp::Plus),
            Token::Punctuator(Punctuator::Minus) => Some(UnaryOp::Minus),
            Token::Keyword(Keyword::Typeof) => Some(UnaryOp::Typeof),
            Token::Keyword(Keyword::Void) => Some(UnaryOp::Void),
            Token::Keyword(Keyword::Delete) => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.parse_unary()?;
            return Ok(self.alloc(NodeKind::Unary { op, operand }, self.span_from(start)));
        }

        let update = match &self.current.token {
            Token::Punctuator(Punctuator::PlusPlus) => Some(UpdateOp::Increment),
            Token::Punctuator(Punctuator::MinusMinus) => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.bump();
            let operand = self.parse_unary()?;
            self.check_assignment_target(operand, false);
            return Ok(self.alloc(
                NodeKind::Update {
                    op,
                    prefix: true,
                    operand,
                },
                self.span_from(start),
            ));
        }

        if self.at_keyword(Keyword::Await) && self.ctx.in_async {
            self.bump();
            let argument = self.parse_unary()?;
            return Ok(self.alloc(NodeKind::Await { argument }, self.span_from(start)));
        }

        let expression = self.parse_left_hand_side()?;
        if !self.current.newline_before {
            let op = match &self.current.token {
                Token::Punctuator(Punctuator::PlusPlus) => Some(UpdateOp::Increment),
                Token::Punctuator(Punctuator::MinusMinus) => Some(UpdateOp::Decrement),
                _ => None,
            };
            if let Some(op) = op {
                self.check_assignment_target(expression, false);
                self.bump();
                return Ok(self.alloc(
                    NodeKind::Update {
                        op,
                        prefix: false,
                        operand: expression,
                    },
                    self.span_from(start),
                ));
            }
        }
        Ok(expression)
    }

    fn parse_left_hand_side(&mut self) -> PResult<NodeId> {
        let start = self.current.span;
        let mut expression = if self.at_keyword(Keyword::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            expression = match &self.current.token {
                Token::Punctuator(Punctuator::Dot) => {
                    self.bump();
                    let (name, _) = self.expect_identifier_name()?;
                    self.alloc(
                        NodeKind::Member {
                            object: expression,
                            name,
                            optional: false,
                        },
                        self.span_from(start),
                    )
                }
                Token::Punctuator(Punctuator::OptionalChain) => {
                    self.bump();
                    if self.at(Punctuator::LParen) {
                        let arguments = self.parse_arguments()?;
                        self.alloc(
                            NodeKind::Call {
                                callee: expression,
                                arguments,
                                is_new: false,
                                optional: true,
                            },
                            self.span_from(start),
                        )
                    } else if self.eat(Punctuator::LBracket) {
                        let index = self.parse_expression_allowing_in()?;
                        self.expect(Punctuator::RBracket)?;
                        self.alloc(
                            NodeKind::Index {
                                object: expression,
                                index,
                                optional: true,
                            },
                            self.span_from(start),
                        )
                    } else {
                        let (name, _) = self.expect_identifier_name()?;
                        self.alloc(
                            NodeKind::Member {
                                object: expression,
                                name,
                                optional: true,
                            },
                            self.span_from(start),
                        )
                    }
                }
                Token::Punctuator(Punctuator::LBracket) => {
                    self.bump();
                    let index = self.parse_expression_allowing_in()?;
                    self.expect(Punctuator::RBracket)?;
                    self.alloc(
                        NodeKind::Index {
                            object: expression,
                            index,
                            optional: false,
                        },
                        self.span_from(start),
                    )
                }
                Token::Punctuator(Punctuator::LParen) => {
                    let arguments = self.parse_arguments()?;
                    self.alloc(
                        NodeKind::Call {
                            callee: expression,
                            arguments,
                            is_new: false,
                            optional: false,
                        },
                        self.span_from(start),
                    )
                }
                Token::TemplateLiteral(_) | Token::TemplateHead(_) => {
                    self.parse_template(Some(expression), start)?
                }
                _ => break,
            };
        }
        Ok(expression)
    }

    fn parse_expression_allowing_in(&mut self) -> PResult<NodeId> {
        let saved = self.ctx.no_in;
        self.ctx.no_in = false;
        let result = self.parse_expression();
        self.ctx.no_in = saved;
        result
    }

    fn parse_new(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        if self.eat(Punctuator::Dot) {
            if self.at_identifier("target") {
                self.bump();
                return Ok(self.alloc(NodeKind::NewTarget, self.span_from(start)));
            }
            return Err(self.fail(ErrorCode::UnexpectedToken, "expected 'target'"));
        }
        let mut callee = if self.at_keyword(Keyword::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            callee = match &self.current.token {
                Token::Punctuator(Punctuator::Dot) => {
                    self.bump();
                    let (name, _) = self.expect_identifier_name()?;
                    self.alloc(
                        NodeKind::Member {
                            object: callee,
                            name,
                            optional: false,
                        },
                        self.span_from(start),
                    )
                }
                Token::Punctuator(Punctuator::LBracket) => {
                    self.bump();
                    let index = self.parse_expression_allowing_in()?;
                    self.expect(Punctuator::RBracket)?;
                    self.alloc(
                        NodeKind::Index {
                            object: callee,
                            index,
                            optional: false,
                        },
                        self.span_from(start),
                    )
                }
                Token::TemplateLiteral(_) | Token::TemplateHead(_) => {
                    self.parse_template(Some(callee), start)?
                }
                _ => break,
            };
        }
        let arguments = if self.at(Punctuator::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(self.alloc(
            NodeKind::Call {
                callee,
                arguments,
                is_new: true,
                optional: false,
            },
            self.span_from(start),
        ))
    }

    fn parse_arguments(&mut self) -> PResult<Vec<NodeId>> {
        self.expect(Punctuator::LParen)?;
        let saved = self.ctx.no_in;
        self.ctx.no_in = false;
        let mut arguments = Vec::new();
        let result = (|| -> PResult<()> {
            while !self.at(Punctuator::RParen) {
                let start = self.current.span;
                let argument = if self.eat(Punctuator::Spread) {
                    let argument = self.parse_assignment()?;
                    self.alloc(NodeKind::Spread { argument }, self.span_from(start))
                } else {
                    self.parse_assignment()?
                };
                arguments.push(argument);
                if !self.eat(Punctuator::Comma) {
                    break;
                }
            }
            Ok(())
        })();
        self.ctx.no_in = saved;
        result?;
        self.expect(Punctuator::RParen)?;
        Ok(arguments)
    }

    fn parse_template(&mut self, tag: Option<NodeId>, start: SourceSpan) -> PResult<NodeId> {
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        match self.bump().token {
            Token::TemplateLiteral(raw) => quasis.push(raw),
            Token::TemplateHead(raw) => {
                quasis.push(raw);
                loop {
                    expressions.push(self.parse_expression_allowing_in()?);
                    match self.current.token.clone() {
                        Token::TemplateMiddle(raw) => {
                            self.bump();
                            quasis.push(raw);
                        }
                        Token::TemplateTail(raw) => {
                            self.bump();
                            quasis.push(raw);
                            break;
                        }
                        _ => {
                            return Err(self.fail(
                                ErrorCode::UnterminatedTemplate,
                                "expected '}' in template literal",
                            ))
                        }
                    }
                }
            }
            _ => return Err(self.fail(ErrorCode::UnexpectedToken, "expected template literal")),
        }
        Ok(self.alloc(
            NodeKind::Template {
                tag,
                quasis,
                expressions,
            },
            self.span_from(start),
        ))
    }

    fn lookup(&mut self, name: String, span: SourceSpan) -> NodeId {
        self.alloc(
            NodeKind::Lookup {
                name,
                field: None,
                ref_type: ReferenceType::Variable,
            },
            span,
        )
    }

    fn parse_primary(&mut self) -> PResult<NodeId> {
        let start = self.current.span;
        if matches!(
            self.current.token,
            Token::Punctuator(Punctuator::Slash) | Token::Punctuator(Punctuator::SlashEq)
        ) {
            let slash = self.current.clone();
            self.current = self.lexer.rescan_as_regexp(&slash);
            self.diagnostics.extend(self.lexer.take_diagnostics());
        }

        match self.current.token.clone() {
            Token::Number(value) => {
                self.bump();
                Ok(self.alloc(NodeKind::Constant(Literal::Number(value)), start))
            }
            Token::String(value) => {
                self.bump();
                Ok(self.alloc(NodeKind::Constant(Literal::String(value)), start))
            }
            Token::BigIntLiteral(digits) => {
                self.bump();
                Ok(self.alloc(NodeKind::BigInt { digits }, start))
            }
            Token::RegExp(pattern, flags) => {
                self.bump();
                Ok(self.alloc(NodeKind::RegExp { pattern, flags }, start))
            }
            Token::TemplateLiteral(_) | Token::TemplateHead(_) => self.parse_template(None, start),
            Token::Keyword(Keyword::True) => {
                self.bump();
                Ok(self.alloc(NodeKind::Constant(Literal::Boolean(true)), start))
            }
            Token::Keyword(Keyword::False) => {
                self.bump();
                Ok(self.alloc(NodeKind::Constant(Literal::Boolean(false)), start))
            }
            Token::Keyword(Keyword::Null) => {
                self.bump();
                Ok(self.alloc(NodeKind::Constant(Literal::Null), start))
            }
            Token::Keyword(Keyword::This) => {
                self.bump();
                Ok(self.alloc(NodeKind::This, start))
            }
            Token::Keyword(Keyword::Super) => {
                self.bump();
                Ok(self.alloc(NodeKind::Super, start))
            }
            Token::Keyword(Keyword::Function) => {
                self.bump();
                self.parse_function_rest(FunctionKind::Expression, false, start)
            }
            Token::Keyword(Keyword::Class) => self.parse_class(true),
            Token::Keyword(Keyword::Async)
                if !self.lexer.peek_token().newline_before
                    && *self.peek() == Token::Keyword(Keyword::Function) =>
            {
                self.bump();
                self.bump();
                self.parse_function_rest(FunctionKind::Expression, true, start)
            }
            Token::Keyword(Keyword::Async)
                if !self.lexer.peek_token().newline_before
                    && matches!(self.peek(), Token::Identifier(..)) =>
            {
                let marker = self.scopes.scope_count();
                self.bump();
                let (name, span) = self.expect_identifier()?;
                let param = self.alloc(NodeKind::BindingIdentifier { name, field: None }, span);
                self.finish_arrow(vec![param], true, start, marker)
            }
            Token::Keyword(Keyword::Async)
                if !self.lexer.peek_token().newline_before
                    && *self.peek() == Token::Punctuator(Punctuator::LParen) =>
            {
                self.bump();
                self.parse_parenthesized(start, true)
            }
            Token::Punctuator(Punctuator::LParen) => self.parse_parenthesized(start, false),
            Token::Punctuator(Punctuator::LBracket) => self.parse_array_literal(),
            Token::Punctuator(Punctuator::LBrace) => self.parse_object_literal(),
            Token::ReplacementToken { name, fallback } => {
                self.bump();
                match self.replacements.resolve(&name, fallback.as_deref()) {
                    None => Ok(self.alloc(NodeKind::ReplacementToken { name, fallback }, start)),
                    Some(text) => Ok(self.replacement_literal(ReplacementValue::classify(&text), start)),
                }
            }
            Token::ConditionalComment(CcMarker::Variable(name)) => {
                self.bump();
                Ok(self.alloc(NodeKind::CcVariable { name }, start))
            }
            _ => {
                if let Some(name) = self.identifier_text() {
                    let marker = self.scopes.scope_count();
                    self.bump();
                    if self.at(Punctuator::Arrow) && !self.current.newline_before {
                        let param = self.alloc(NodeKind::BindingIdentifier { name, field: None }, start);
                        return self.finish_arrow(vec![param], false, start, marker);
                    }
                    return Ok(self.lookup(name, start));
                }
                Err(self.fail(ErrorCode::ExpectedExpression, "expected expression"))
            }
        }
    }

    /// Parses `( ... )` as a grouping, or as an arrow parameter list when
    /// `=>` follows. With `is_async` the `async` keyword was consumed and
    /// the non-arrow form is a call to a function named `async`.
    fn parse_parenthesized(&mut self, start: SourceSpan, is_async: bool) -> PResult<NodeId> {
        let marker = self.scopes.scope_count();
        self.expect(Punctuator::LParen)?;
        let saved_no_in = self.ctx.no_in;
        self.ctx.no_in = false;
        let mut items = Vec::new();
        let mut trailing_comma = false;
        let result = (|| -> PResult<()> {
            while !self.at(Punctuator::RParen) {
                trailing_comma = false;
                let item_start = self.current.span;
                let item = if self.eat(Punctuator::Spread) {
                    let argument = self.parse_assignment()?;
                    self.alloc(NodeKind::Spread { argument }, self.span_from(item_start))
                } else {
                    self.parse_assignment()?
                };
                items.push(item);
                if !self.eat(Punctuator::Comma) {
                    break;
                }
                trailing_comma = true;
            }
            Ok(())
        })();
        self.ctx.no_in = saved_no_in;
        result?;
        self.expect(Punctuator::RParen)?;

        if self.at(Punctuator::Arrow) && !self.current.newline_before {
            let mut params = Vec::with_capacity(items.len());
            for item in items {
                params.push(self.to_binding(item)?);
            }
            return self.finish_arrow(params, is_async, start, marker);
        }

        if is_async {
            let callee = self.lookup("async".to_string(), start);
            return Ok(self.alloc(
                NodeKind::Call {
                    callee,
                    arguments: items,
                    is_new: false,
                    optional: false,
                },
                self.span_from(start),
            ));
        }

        if items.is_empty() || trailing_comma {
            return Err(self.fail(ErrorCode::ExpectedExpression, "expected expression"));
        }
        if let Some(spread) = items
            .iter()
            .copied()
            .find(|id| matches!(self.ast.kind(*id), NodeKind::Spread { .. }))
        {
            let span = self.ast.context(spread);
            self.report(ErrorCode::UnexpectedToken, span, "unexpected '...'");
            return Err(ParseFailure::Recover);
        }
        let mut expression = items[0];
        for right in items.into_iter().skip(1) {
            let span = self.ast.context(expression).merge(&self.ast.context(right));
            expression = self.alloc(
                NodeKind::Binary {
                    op: BinaryOp::Comma,
                    left: expression,
                    right,
                },
                span,
            );
        }
        Ok(self.alloc(NodeKind::Grouping { expression }, self.span_from(start)))
    }

    fn parse_array_literal(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        let saved_no_in = self.ctx.no_in;
        self.ctx.no_in = false;
        let mut elements = Vec::new();
        let result = (|| -> PResult<()> {
            while !self.at(Punctuator::RBracket) {
                if self.eat(Punctuator::Comma) {
                    elements.push(None);
                    continue;
                }
                let element_start = self.current.span;
                let element = if self.eat(Punctuator::Spread) {
                    let argument = self.parse_assignment()?;
                    self.alloc(NodeKind::Spread { argument }, self.span_from(element_start))
                } else {
                    self.parse_assignment()?
                };
                elements.push(Some(element));
                if !self.eat(Punctuator::Comma) {
                    break;
                }
            }
            Ok(())
        })();
        self.ctx.no_in = saved_no_in;
        result?;
        self.expect(Punctuator::RBracket)?;
        Ok(self.alloc(NodeKind::ArrayLiteral { elements }, self.span_from(start)))
    }

    fn parse_object_literal(&mut self) -> PResult<NodeId> {
        let start = self.bump().span;
        let saved_no_in = self.ctx.no_in;
        self.ctx.no_in = false;
        let mut properties = Vec::new();
        let result = (|| -> PResult<()> {
            while !self.at(Punctuator::RBrace) {
                properties.push(self.parse_object_property()?);
                if !self.eat(Punctuator::Comma) {
                    break;
                }
            }
            Ok(())
        })();
        self.ctx.no_in = saved_no_in;
        result?;
        self.expect(Punctuator::RBrace)?;
        Ok(self.alloc(
            NodeKind::ObjectLiteral {
                properties,
                preserve_quotes: false,
            },
            self.span_from(start),
        ))
    }

    fn parse_object_property(&mut self) -> PResult<NodeId> {
        let start = self.current.span;
        if self.eat(Punctuator::Spread) {
            let argument = self.parse_assignment()?;
            return Ok(self.alloc(NodeKind::Spread { argument }, self.span_from(start)));
        }
        let (prefix, is_async, is_generator) = self.parse_method_prefix();
        let shorthand = self.identifier_text();
        let (key, computed) = self.parse_property_key()?;

        if self.at(Punctuator::LParen) {
            let (function_kind, kind) = match prefix {
                ClassMemberKind::Getter => (FunctionKind::Getter, PropertyKind::Getter),
                ClassMemberKind::Setter => (FunctionKind::Setter, PropertyKind::Setter),
                _ => (FunctionKind::Method, PropertyKind::Method),
            };
            let value = self.parse_method(function_kind, is_async, is_generator, start)?;
            return Ok(self.alloc(
                NodeKind::ObjectProperty {
                    key,
                    value,
                    kind,
                    computed,
                },
                self.span_from(start),
            ));
        }

        if self.eat(Punctuator::Colon) {
            let value = self.parse_assignment()?;
            return Ok(self.alloc(
                NodeKind::ObjectProperty {
                    key,
                    value,
                    kind: PropertyKind::Init,
                    computed,
                },
                self.span_from(start),
            ));
        }

        let Some(name) = shorthand.filter(|_| !computed) else {
            return Err(self.fail(ErrorCode::NoColon, "expected ':'"));
        };
        let key_span = self.ast.context(key);
        let mut value = self.lookup(name, key_span);
        if self.at(Punctuator::Assign) {
            // cover grammar: only valid once converted to a pattern
            self.bump();
            let default = self.parse_assignment()?;
            value = self.alloc(
                NodeKind::Binary {
                    op: BinaryOp::Assign,
                    left: value,
                    right: default,
                },
                self.span_from(start),
            );
        }
        Ok(self.alloc(
            NodeKind::ObjectProperty {
                key,
                value,
                kind: PropertyKind::Shorthand,
                computed: false,
            },
            self.span_from(start),
        ))
    }

    // ------------------------------------------------------------------
    // Replacement tokens
    // ------------------------------------------------------------------

    fn replacement_literal(&mut self, value: ReplacementValue, span: SourceSpan) -> NodeId {
        match value {
            ReplacementValue::Empty => self.alloc(NodeKind::Constant(Literal::Empty), span),
            ReplacementValue::Number(n) => self.alloc(NodeKind::Constant(Literal::Number(n)), span),
            ReplacementValue::String(s) => self.alloc(NodeKind::Constant(Literal::String(s)), span),
            ReplacementValue::Boolean(b) => {
                self.alloc(NodeKind::Constant(Literal::Boolean(b)), span)
            }
            ReplacementValue::Null => self.alloc(NodeKind::Constant(Literal::Null), span),
            ReplacementValue::Json(json) => self.json_literal(&json, span),
        }
    }

    fn json_literal(&mut self, json: &serde_json::Value, span: SourceSpan) -> NodeId {
        use serde_json::Value;
        match json {
            Value::Null => self.alloc(NodeKind::Constant(Literal::Null), span),
            Value::Bool(b) => self.alloc(NodeKind::Constant(Literal::Boolean(*b)), span),
            Value::Number(n) => {
                let value = n.as_f64().unwrap_or(0.0);
                self.alloc(NodeKind::Constant(Literal::Number(value)), span)
            }
            Value::String(s) => self.alloc(NodeKind::Constant(Literal::String(s.clone())), span),
            Value::Array(items) => {
                let elements = items
                    .iter()
                    .map(|item| Some(self.json_literal(item, span)))
                    .collect();
                self.alloc(NodeKind::ArrayLiteral { elements }, span)
            }
            Value::Object(map) => {
                let mut properties = Vec::with_capacity(map.len());
                for (key, item) in map {
                    let key = self.alloc(NodeKind::Constant(Literal::String(key.clone())), span);
                    let value = self.json_literal(item, span);
                    properties.push(self.alloc(
                        NodeKind::ObjectProperty {
                            key,
                            value,
                            kind: PropertyKind::Init,
                            computed: false,
                        },
                        span,
                    ));
                }
                self.alloc(
                    NodeKind::ObjectLiteral {
                        properties,
                        preserve_quotes: true,
                    },
                    span,
                )
            }
        }
    }
}

fn starts_statement(token: &Token) -> bool {
    matches!(
        token,
        Token::Keyword(
            Keyword::Var
                | Keyword::Let
                | Keyword::Const
                | Keyword::Function
                | Keyword::Class
                | Keyword::If
                | Keyword::For
                | Keyword::While
                | Keyword::Do
                | Keyword::Return
                | Keyword::Try
                | Keyword::Switch
                | Keyword::Throw
                | Keyword::Break
                | Keyword::Continue
                | Keyword::With
                | Keyword::Debugger
                | Keyword::Import
                | Keyword::Export
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Parsed {
        ast: Ast,
        scopes: ScopeTree,
        output: ParseOutput,
    }

    fn parse_with(source: &str, settings: &CodeSettings) -> Parsed {
        let mut ast = Ast::new();
        let mut scopes = ScopeTree::new();
        let output = Parser::new(source, "test.js", settings, &mut ast, &mut scopes).parse();
        Parsed { ast, scopes, output }
    }

    fn parse(source: &str) -> Parsed {
        parse_with(source, &CodeSettings::default())
    }

    fn top(parsed: &Parsed) -> Vec<NodeId> {
        parsed.ast.statements(parsed.output.root).to_vec()
    }

    #[test]
    fn test_parse_variable_declaration() {
        let parsed = parse("var x = 1, y;");
        assert!(parsed.output.diagnostics.is_empty());
        let statements = top(&parsed);
        assert_eq!(statements.len(), 1);
        match parsed.ast.kind(statements[0]) {
            NodeKind::Var { kind, declarators } => {
                assert_eq!(*kind, DeclarationKind::Var);
                assert_eq!(declarators.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        let global = parsed.scopes.global();
        assert!(parsed.scopes.find_local(global, "x").is_some());
        assert!(parsed.ast.check_parent_links(parsed.output.root));
    }

    #[test]
    fn test_precedence_climbing() {
        let parsed = parse("a + b * c - d");
        let statements = top(&parsed);
        match parsed.ast.kind(statements[0]) {
            NodeKind::Binary { op, left, .. } => {
                assert_eq!(*op, BinaryOp::Sub);
                assert!(matches!(
                    parsed.ast.kind(*left),
                    NodeKind::Binary { op: BinaryOp::Add, .. }
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let parsed = parse("a ** b ** c");
        match parsed.ast.kind(top(&parsed)[0]) {
            NodeKind::Binary { op, right, .. } => {
                assert_eq!(*op, BinaryOp::Exp);
                assert!(matches!(
                    parsed.ast.kind(*right),
                    NodeKind::Binary { op: BinaryOp::Exp, .. }
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_arrow_function_concise_body() {
        let parsed = parse("var arrow = (a, b, c) => a * (b + c);");
        assert!(parsed.output.diagnostics.is_empty());
        let func = parsed
            .ast
            .descendants(parsed.output.root)
            .into_iter()
            .find(|id| matches!(parsed.ast.kind(*id), NodeKind::FunctionObject { .. }))
            .expect("arrow function");
        match parsed.ast.kind(func) {
            NodeKind::FunctionObject {
                kind, params, body, scope, ..
            } => {
                assert_eq!(*kind, FunctionKind::Arrow);
                assert_eq!(params.len(), 3);
                assert!(parsed.ast.is_concise(*body));
                assert!(parsed.scopes.scope(*scope).is_arrow);
                assert!(parsed.scopes.find_local(*scope, "a").is_some());
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_var_hoists_to_function_scope() {
        let parsed = parse("function f() { if (x) { var a = 1; let b = 2; } }");
        let function_scope = parsed
            .scopes
            .scopes_top_down()
            .into_iter()
            .find(|s| parsed.scopes.scope(*s).kind == ScopeKind::Function)
            .unwrap();
        assert!(parsed.scopes.find_local(function_scope, "a").is_some());
        assert!(parsed.scopes.find_local(function_scope, "b").is_none());
        let block = parsed.scopes.scope(function_scope).children[0];
        assert_eq!(parsed.scopes.scope(block).kind, ScopeKind::Block);
        assert!(parsed.scopes.find_local(block, "b").is_some());
    }

    #[test]
    fn test_empty_blocks_have_no_scope() {
        let parsed = parse("if (a) { b(); }");
        assert_eq!(parsed.scopes.scopes_top_down().len(), 1);
    }

    #[test]
    fn test_named_function_expression_scope() {
        let parsed = parse("var x = function foo() { return foo; };");
        let global = parsed.scopes.global();
        let ghost = parsed.scopes.find_local(global, "foo").unwrap();
        assert_eq!(parsed.scopes.field(ghost).kind, FieldKind::Ghost);
        let name_scope = parsed
            .scopes
            .scopes_top_down()
            .into_iter()
            .find(|s| parsed.scopes.scope(*s).is_name_scope)
            .unwrap();
        assert!(parsed.scopes.find_local(name_scope, "foo").is_some());
    }

    #[test]
    fn test_ghost_collision_is_ambiguous() {
        let parsed = parse("var f = function g() {}; var g = 1;");
        assert!(parsed
            .output
            .diagnostics
            .iter()
            .any(|d| d.code == ErrorCode::AmbiguousNamedFunctionExpression));
    }

    #[test]
    fn test_missing_closing_brace_returns_partial_tree() {
        let parsed = parse("function f() { var x = 1;");
        assert!(parsed
            .output
            .diagnostics
            .iter()
            .any(|d| d.code == ErrorCode::NoRightCurly));
        assert_eq!(top(&parsed).len(), 1);
        assert!(parsed.output.aborted.is_none());
    }

    #[test]
    fn test_end_of_input_mid_expression_aborts() {
        let parsed = parse("var a = 1; var b = (");
        assert!(parsed.output.aborted.is_some());
        assert_eq!(top(&parsed).len(), 1);
        assert!(parsed
            .output
            .diagnostics
            .iter()
            .any(|d| d.code == ErrorCode::UnexpectedEndOfInput));
    }

    #[test]
    fn test_recovers_at_statement_boundary() {
        let parsed = parse("var a = ;\nvar b = 2;");
        assert!(!parsed.output.diagnostics.is_empty());
        let global = parsed.scopes.global();
        assert!(parsed.scopes.find_local(global, "b").is_some());
    }

    #[test]
    fn test_use_strict_directive() {
        let parsed = parse("function f() { 'use strict'; with (o) {} }");
        assert!(parsed
            .output
            .diagnostics
            .iter()
            .any(|d| d.code == ErrorCode::StrictModeWith));
    }

    #[test]
    fn test_regexp_after_paren_is_rescanned() {
        let parsed = parse("if (x) /ab+c/.test(y);");
        assert!(parsed.output.diagnostics.is_empty());
        assert!(parsed
            .ast
            .descendants(parsed.output.root)
            .into_iter()
            .any(|id| matches!(parsed.ast.kind(id), NodeKind::RegExp { .. })));
    }

    #[test]
    fn test_destructuring_declarations() {
        let parsed = parse("const { a, b: [c, ...d], e = 1 } = obj;");
        assert!(parsed.output.diagnostics.is_empty());
        let global = parsed.scopes.global();
        for name in ["a", "c", "d", "e"] {
            let field = parsed.scopes.find_local(global, name).unwrap();
            assert!(parsed.scopes.field(field).is_literal);
        }
        assert!(parsed.scopes.find_local(global, "b").is_none());
    }

    #[test]
    fn test_class_and_template() {
        let parsed = parse("class A extends B { static x = 1; get y() { return `v${this.x}`; } }");
        assert!(parsed.output.diagnostics.is_empty());
    }

    #[test]
    fn test_module_exports_mark_fields() {
        let mut settings = CodeSettings::default();
        settings.source_mode = SourceMode::Module;
        let parsed = parse_with("export const answer = 42; import { a as b } from 'm';", &settings);
        assert!(parsed.output.diagnostics.is_empty());
        let module = parsed.scopes.scope(parsed.scopes.global()).children[0];
        let answer = parsed.scopes.find_local(module, "answer").unwrap();
        assert!(parsed.scopes.field(answer).is_exported);
        assert!(parsed.scopes.find_local(module, "b").is_some());
    }

    #[test]
    fn test_important_comment_becomes_statement() {
        let parsed = parse("/*! keep me */\nvar a;");
        let statements = top(&parsed);
        assert!(matches!(
            parsed.ast.kind(statements[0]),
            NodeKind::ImportantComment { .. }
        ));
    }

    #[test]
    fn test_conditional_comment_statements() {
        let parsed = parse("/*@cc_on @if (@_jscript) alert(1); @end @*/");
        assert!(parsed.output.diagnostics.is_empty());
        match parsed.ast.kind(top(&parsed)[0]) {
            NodeKind::CcComment { statements } => {
                assert!(matches!(parsed.ast.kind(statements[0]), NodeKind::CcOn));
                assert!(matches!(parsed.ast.kind(statements[1]), NodeKind::CcIf { .. }));
                assert!(matches!(parsed.ast.kind(*statements.last().unwrap()), NodeKind::CcEnd));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_replacement_token_json_literal() {
        let mut settings = CodeSettings::default();
        settings.add_replacement_token("myjson", r#"{"a": 1, "c": [1, 2]}"#);
        let parsed = parse_with("var c = %MyJSON%;", &settings);
        let object = parsed
            .ast
            .descendants(parsed.output.root)
            .into_iter()
            .find(|id| matches!(parsed.ast.kind(*id), NodeKind::ObjectLiteral { .. }))
            .unwrap();
        assert!(matches!(
            parsed.ast.kind(object),
            NodeKind::ObjectLiteral {
                preserve_quotes: true,
                ..
            }
        ));
    }

    #[test]
    fn test_unresolved_replacement_token_is_kept() {
        let parsed = parse("var a = %MyToken:foo%;");
        assert!(parsed
            .ast
            .descendants(parsed.output.root)
            .into_iter()
            .any(|id| matches!(parsed.ast.kind(id), NodeKind::ReplacementToken { .. })));
    }

    #[test]
    fn test_break_outside_loop() {
        let parsed = parse("break;");
        assert_eq!(parsed.output.diagnostics[0].code, ErrorCode::BadBreak);
        let parsed = parse("outer: for (;;) { for (;;) { continue outer; } }");
        assert!(parsed.output.diagnostics.is_empty());
    }

    #[test]
    fn test_json_output_reads_object_value() {
        let mut settings = CodeSettings::default();
        settings.output_mode = OutputFormat::Json;
        let parsed = parse_with(r#"{"a": [1, 2], "b": null}"#, &settings);
        assert!(parsed.output.diagnostics.is_empty());
        let statements = top(&parsed);
        assert_eq!(statements.len(), 1);
        assert!(matches!(parsed.ast.kind(statements[0]), NodeKind::ObjectLiteral { .. }));
    }
}
