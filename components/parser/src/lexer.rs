//! JavaScript Lexer - tokenizes source code into spanned tokens
//!
//! The lexer is a lazy token source: every call to [`Lexer::next_token`]
//! scans one token. It decides whether `/` starts a regular expression from
//! the previous significant token, tracks template-literal nesting through a
//! brace stack, and recognizes the conditional-compilation and preprocessor
//! comment syntax. Malformed input never stops the scan: the problem is
//! recorded as a diagnostic and scanning resumes at the next plausible token.

use std::collections::HashSet;

use core_types::{Diagnostic, ErrorCode, FileId, SourcePosition, SourceSpan};

use crate::replacement::{is_marker_char, Replacements};
use crate::settings::{CodeSettings, TreeModifications};

/// JavaScript keyword types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// let keyword (contextual)
    Let,
    /// const keyword
    Const,
    /// var keyword
    Var,
    /// function keyword
    Function,
    /// return keyword
    Return,
    /// if keyword
    If,
    /// else keyword
    Else,
    /// while keyword
    While,
    /// for keyword
    For,
    /// break keyword
    Break,
    /// continue keyword
    Continue,
    /// class keyword
    Class,
    /// extends keyword
    Extends,
    /// new keyword
    New,
    /// this keyword
    This,
    /// super keyword
    Super,
    /// async keyword (contextual)
    Async,
    /// await keyword (contextual)
    Await,
    /// true keyword
    True,
    /// false keyword
    False,
    /// null keyword
    Null,
    /// typeof keyword
    Typeof,
    /// void keyword
    Void,
    /// instanceof keyword
    Instanceof,
    /// in keyword
    In,
    /// try keyword
    Try,
    /// catch keyword
    Catch,
    /// finally keyword
    Finally,
    /// throw keyword
    Throw,
    /// yield keyword (contextual)
    Yield,
    /// import keyword
    Import,
    /// export keyword
    Export,
    /// default keyword
    Default,
    /// delete keyword
    Delete,
    /// with keyword
    With,
    /// switch keyword
    Switch,
    /// case keyword
    Case,
    /// do keyword
    Do,
    /// debugger keyword
    Debugger,
    /// static keyword (contextual)
    Static,
}

impl Keyword {
    /// Looks up a keyword by its source spelling.
    pub fn from_str(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "let" => Keyword::Let,
            "const" => Keyword::Const,
            "var" => Keyword::Var,
            "function" => Keyword::Function,
            "return" => Keyword::Return,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "for" => Keyword::For,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "class" => Keyword::Class,
            "extends" => Keyword::Extends,
            "new" => Keyword::New,
            "this" => Keyword::This,
            "super" => Keyword::Super,
            "async" => Keyword::Async,
            "await" => Keyword::Await,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "typeof" => Keyword::Typeof,
            "void" => Keyword::Void,
            "instanceof" => Keyword::Instanceof,
            "in" => Keyword::In,
            "try" => Keyword::Try,
            "catch" => Keyword::Catch,
            "finally" => Keyword::Finally,
            "throw" => Keyword::Throw,
            "yield" => Keyword::Yield,
            "import" => Keyword::Import,
            "export" => Keyword::Export,
            "default" => Keyword::Default,
            "delete" => Keyword::Delete,
            "with" => Keyword::With,
            "switch" => Keyword::Switch,
            "case" => Keyword::Case,
            "do" => Keyword::Do,
            "debugger" => Keyword::Debugger,
            "static" => Keyword::Static,
            _ => return None,
        };
        Some(keyword)
    }

    /// Source spelling of the keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Let => "let",
            Keyword::Const => "const",
            Keyword::Var => "var",
            Keyword::Function => "function",
            Keyword::Return => "return",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::For => "for",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::Class => "class",
            Keyword::Extends => "extends",
            Keyword::New => "new",
            Keyword::This => "this",
            Keyword::Super => "super",
            Keyword::Async => "async",
            Keyword::Await => "await",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::Typeof => "typeof",
            Keyword::Void => "void",
            Keyword::Instanceof => "instanceof",
            Keyword::In => "in",
            Keyword::Try => "try",
            Keyword::Catch => "catch",
            Keyword::Finally => "finally",
            Keyword::Throw => "throw",
            Keyword::Yield => "yield",
            Keyword::Import => "import",
            Keyword::Export => "export",
            Keyword::Default => "default",
            Keyword::Delete => "delete",
            Keyword::With => "with",
            Keyword::Switch => "switch",
            Keyword::Case => "case",
            Keyword::Do => "do",
            Keyword::Debugger => "debugger",
            Keyword::Static => "static",
        }
    }

    /// Keywords that are ordinary identifiers outside their special context.
    pub fn is_contextual(&self) -> bool {
        matches!(
            self,
            Keyword::Let | Keyword::Async | Keyword::Await | Keyword::Yield | Keyword::Static
        )
    }
}

/// JavaScript punctuators (operators and delimiters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punctuator {
    /// Opening parenthesis
    LParen,
    /// Closing parenthesis
    RParen,
    /// Opening brace
    LBrace,
    /// Closing brace
    RBrace,
    /// Opening bracket
    LBracket,
    /// Closing bracket
    RBracket,
    /// Semicolon
    Semicolon,
    /// Comma
    Comma,
    /// Dot
    Dot,
    /// Spread operator
    Spread,
    /// Optional chaining
    OptionalChain,
    /// Colon
    Colon,
    /// Question mark
    Question,
    /// Assignment
    Assign,
    /// Arrow function
    Arrow,
    /// Plus
    Plus,
    /// Minus
    Minus,
    /// Multiply
    Star,
    /// Divide
    Slash,
    /// Modulo
    Percent,
    /// Exponentiation
    StarStar,
    /// Equality
    EqEq,
    /// Strict equality
    EqEqEq,
    /// Inequality
    NotEq,
    /// Strict inequality
    NotEqEq,
    /// Less than
    Lt,
    /// Less than or equal
    LtEq,
    /// Greater than
    Gt,
    /// Greater than or equal
    GtEq,
    /// Logical AND
    AndAnd,
    /// Logical OR
    OrOr,
    /// Nullish coalescing
    NullishCoalesce,
    /// Logical NOT
    Not,
    /// Bitwise AND
    And,
    /// Bitwise OR
    Or,
    /// Bitwise XOR
    Xor,
    /// Bitwise NOT
    Tilde,
    /// Left shift
    LtLt,
    /// Right shift
    GtGt,
    /// Unsigned right shift
    GtGtGt,
    /// Plus equals
    PlusEq,
    /// Minus equals
    MinusEq,
    /// Multiply equals
    StarEq,
    /// Divide equals
    SlashEq,
    /// Modulo equals
    PercentEq,
    /// Exponentiation equals
    StarStarEq,
    /// Bitwise AND equals
    AndEq,
    /// Bitwise OR equals
    OrEq,
    /// Bitwise XOR equals
    XorEq,
    /// Left shift equals
    LtLtEq,
    /// Right shift equals
    GtGtEq,
    /// Unsigned right shift equals
    GtGtGtEq,
    /// Logical AND equals
    AndAndEq,
    /// Logical OR equals
    OrOrEq,
    /// Nullish coalescing equals
    NullishCoalesceEq,
    /// Increment
    PlusPlus,
    /// Decrement
    MinusMinus,
}

impl Punctuator {
    /// Source spelling of the punctuator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Punctuator::LParen => "(",
            Punctuator::RParen => ")",
            Punctuator::LBrace => "{",
            Punctuator::RBrace => "}",
            Punctuator::LBracket => "[",
            Punctuator::RBracket => "]",
            Punctuator::Semicolon => ";",
            Punctuator::Comma => ",",
            Punctuator::Dot => ".",
            Punctuator::Spread => "...",
            Punctuator::OptionalChain => "?.",
            Punctuator::Colon => ":",
            Punctuator::Question => "?",
            Punctuator::Assign => "=",
            Punctuator::Arrow => "=>",
            Punctuator::Plus => "+",
            Punctuator::Minus => "-",
            Punctuator::Star => "*",
            Punctuator::Slash => "/",
            Punctuator::Percent => "%",
            Punctuator::StarStar => "**",
            Punctuator::EqEq => "==",
            Punctuator::EqEqEq => "===",
            Punctuator::NotEq => "!=",
            Punctuator::NotEqEq => "!==",
            Punctuator::Lt => "<",
            Punctuator::LtEq => "<=",
            Punctuator::Gt => ">",
            Punctuator::GtEq => ">=",
            Punctuator::AndAnd => "&&",
            Punctuator::OrOr => "||",
            Punctuator::NullishCoalesce => "??",
            Punctuator::Not => "!",
            Punctuator::And => "&",
            Punctuator::Or => "|",
            Punctuator::Xor => "^",
            Punctuator::Tilde => "~",
            Punctuator::LtLt => "<<",
            Punctuator::GtGt => ">>",
            Punctuator::GtGtGt => ">>>",
            Punctuator::PlusEq => "+=",
            Punctuator::MinusEq => "-=",
            Punctuator::StarEq => "*=",
            Punctuator::SlashEq => "/=",
            Punctuator::PercentEq => "%=",
            Punctuator::StarStarEq => "**=",
            Punctuator::AndEq => "&=",
            Punctuator::OrEq => "|=",
            Punctuator::XorEq => "^=",
            Punctuator::LtLtEq => "<<=",
            Punctuator::GtGtEq => ">>=",
            Punctuator::GtGtGtEq => ">>>=",
            Punctuator::AndAndEq => "&&=",
            Punctuator::OrOrEq => "||=",
            Punctuator::NullishCoalesceEq => "??=",
            Punctuator::PlusPlus => "++",
            Punctuator::MinusMinus => "--",
        }
    }
}

/// Conditional-compilation markers found inside `/*@ ... @*/` comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CcMarker {
    /// `/*@` opening a conditional comment
    Start,
    /// `@*/` closing a conditional comment
    End,
    /// `@cc_on`
    On,
    /// `@set`
    Set,
    /// `@if`
    If,
    /// `@elif`
    ElseIf,
    /// `@else`
    Else,
    /// `@end`
    EndIf,
    /// `@name` compilation variable, stored without the `@`
    Variable(String),
}

/// Token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier. Second field is true if the identifier contained Unicode
    /// escape sequences (an escaped keyword is still an identifier)
    Identifier(String, bool),
    /// Private identifier (#name) for class private members
    PrivateIdentifier(String),
    /// Number literal
    Number(f64),
    /// BigInt literal digits without the `n` suffix
    BigIntLiteral(String),
    /// String literal, cooked value
    String(String),
    /// Template literal with no substitutions, raw text
    TemplateLiteral(String),
    /// Template head: from ` to first ${, raw text
    TemplateHead(String),
    /// Template middle: from } to next ${, raw text
    TemplateMiddle(String),
    /// Template tail: from } to closing `, raw text
    TemplateTail(String),
    /// Regular expression literal (pattern, flags)
    RegExp(String, String),
    /// Keyword
    Keyword(Keyword),
    /// Punctuator/operator
    Punctuator(Punctuator),
    /// `/*! ... */` comment kept in the output, full text
    ImportantComment(String),
    /// Conditional-compilation marker
    ConditionalComment(CcMarker),
    /// `%name%` or `%name:fallback%` in expression position
    ReplacementToken {
        /// Token name
        name: String,
        /// Fallback name after the colon, possibly empty
        fallback: Option<String>,
    },
    /// End of file
    EOF,
}

impl Token {
    /// Whether a `/` right after this token starts a regular expression.
    fn allows_regexp_after(&self) -> bool {
        match self {
            Token::Identifier(..)
            | Token::PrivateIdentifier(_)
            | Token::Number(_)
            | Token::BigIntLiteral(_)
            | Token::String(_)
            | Token::TemplateLiteral(_)
            | Token::TemplateTail(_)
            | Token::RegExp(..)
            | Token::ReplacementToken { .. } => false,
            Token::Keyword(k) => !matches!(
                k,
                Keyword::This
                    | Keyword::Super
                    | Keyword::True
                    | Keyword::False
                    | Keyword::Null
                    | Keyword::Let
                    | Keyword::Async
                    | Keyword::Static
            ),
            Token::Punctuator(p) => !matches!(
                p,
                Punctuator::RParen
                    | Punctuator::RBracket
                    | Punctuator::PlusPlus
                    | Punctuator::MinusMinus
            ),
            _ => true,
        }
    }

    /// Whether the token is trivia that does not affect regex detection.
    fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::ImportantComment(_) | Token::ConditionalComment(_)
        )
    }

    /// Short description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(name, _) => format!("identifier '{}'", name),
            Token::PrivateIdentifier(name) => format!("'#{}'", name),
            Token::Number(n) => format!("number {}", n),
            Token::BigIntLiteral(digits) => format!("bigint {}n", digits),
            Token::String(_) => "string literal".to_string(),
            Token::TemplateLiteral(_)
            | Token::TemplateHead(_)
            | Token::TemplateMiddle(_)
            | Token::TemplateTail(_) => "template literal".to_string(),
            Token::RegExp(..) => "regular expression".to_string(),
            Token::Keyword(k) => format!("'{}'", k.as_str()),
            Token::Punctuator(p) => format!("'{}'", p.as_str()),
            Token::ImportantComment(_) => "comment".to_string(),
            Token::ConditionalComment(_) => "conditional compilation marker".to_string(),
            Token::ReplacementToken { name, .. } => format!("replacement token '{}'", name),
            Token::EOF => "end of input".to_string(),
        }
    }
}

/// A token together with its location and source text.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    /// The token
    pub token: Token,
    /// Where it was scanned
    pub span: SourceSpan,
    /// Exact source text
    pub raw: String,
    /// Whether a line terminator precedes the token (for ASI)
    pub newline_before: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    Block,
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectiveFrame {
    Conditional,
    Debug,
}

/// Snapshot used to restart scanning from an earlier point.
#[derive(Debug, Clone)]
pub struct LexerState {
    position: usize,
    line: u32,
    column: u32,
    file: FileId,
    regexp_allowed: bool,
    braces: Vec<Brace>,
    directives: Vec<DirectiveFrame>,
    in_conditional_comment: bool,
    diagnostics_len: usize,
    lookahead: Option<SpannedToken>,
}

/// Lexer for JavaScript source code
pub struct Lexer<'a> {
    settings: &'a CodeSettings,
    replacements: Replacements<'a>,
    chars: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
    file: FileId,
    next_file_id: u32,
    new_files: Vec<String>,
    regexp_allowed: bool,
    braces: Vec<Brace>,
    directives: Vec<DirectiveFrame>,
    defines: HashSet<String>,
    in_conditional_comment: bool,
    line_terminator_before_token: bool,
    lookahead: Option<SpannedToken>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &str, settings: &'a CodeSettings) -> Self {
        let mut lexer = Self {
            settings,
            replacements: Replacements::new(settings),
            chars: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            file: FileId(0),
            next_file_id: 1,
            new_files: Vec::new(),
            regexp_allowed: true,
            braces: Vec::new(),
            directives: Vec::new(),
            defines: settings.preprocessor_defines().map(str::to_string).collect(),
            in_conditional_comment: false,
            line_terminator_before_token: false,
            lookahead: None,
            diagnostics: Vec::new(),
        };
        lexer.skip_hashbang();
        lexer
    }

    /// Sets the file id stamped on spans and the first id free for files
    /// named by `///#SOURCE` directives.
    pub fn set_file(&mut self, file: FileId, next_free: u32) {
        self.file = file;
        self.next_file_id = next_free;
    }

    /// File names introduced by `///#SOURCE` directives, in id order
    /// starting at the `next_free` id given to [`Lexer::set_file`].
    pub fn new_files(&self) -> &[String] {
        &self.new_files
    }

    /// Diagnostics collected so far, leaving the lexer's list empty.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> SpannedToken {
        if let Some(token) = self.lookahead.take() {
            return token;
        }
        self.scan_token()
    }

    /// Peek at the next token without consuming it
    pub fn peek_token(&mut self) -> &SpannedToken {
        if self.lookahead.is_none() {
            let token = self.scan_token();
            self.lookahead = Some(token);
        }
        match &self.lookahead {
            Some(token) => token,
            None => unreachable!("lookahead was just filled"),
        }
    }

    /// Captures the scanning state.
    pub fn checkpoint(&self) -> LexerState {
        LexerState {
            position: self.position,
            line: self.line,
            column: self.column,
            file: self.file,
            regexp_allowed: self.regexp_allowed,
            braces: self.braces.clone(),
            directives: self.directives.clone(),
            in_conditional_comment: self.in_conditional_comment,
            diagnostics_len: self.diagnostics.len(),
            lookahead: self.lookahead.clone(),
        }
    }

    /// Restarts scanning from a captured state, dropping diagnostics
    /// reported after it.
    pub fn restore(&mut self, state: LexerState) {
        self.position = state.position;
        self.line = state.line;
        self.column = state.column;
        self.file = state.file;
        self.regexp_allowed = state.regexp_allowed;
        self.braces = state.braces;
        self.directives = state.directives;
        self.in_conditional_comment = state.in_conditional_comment;
        self.diagnostics.truncate(state.diagnostics_len);
        self.lookahead = state.lookahead;
    }

    /// Re-scans a `/` or `/=` token as the start of a regular expression.
    ///
    /// Used by the parser when it expects an operand where the lexer guessed
    /// division.
    pub fn rescan_as_regexp(&mut self, slash: &SpannedToken) -> SpannedToken {
        self.lookahead = None;
        self.position = slash.span.start.offset;
        self.line = slash.span.start.line;
        self.column = slash.span.start.column;
        self.file = slash.span.file;
        let start = self.current_position();
        self.advance();
        let token = self.scan_regexp(start);
        self.finish_token(token, start, slash.newline_before)
    }

    fn skip_hashbang(&mut self) {
        if self.peek() == '#' && self.peek_next() == Some('!') {
            while !self.is_at_end() && !is_line_terminator(self.peek()) {
                self.advance();
            }
        }
    }

    fn report(&mut self, code: ErrorCode, start: SourcePosition, message: impl Into<String>) {
        let span = SourceSpan {
            file: self.file,
            start,
            end: self.current_position(),
        };
        self.diagnostics.push(Diagnostic::new(code, span, message));
    }

    fn finish_token(
        &mut self,
        token: Token,
        start: SourcePosition,
        newline_before: bool,
    ) -> SpannedToken {
        if !token.is_trivia() {
            self.regexp_allowed = token.allows_regexp_after();
        }
        let end = self.current_position();
        let raw = self.chars[start.offset.min(end.offset)..end.offset]
            .iter()
            .collect();
        SpannedToken {
            token,
            span: SourceSpan {
                file: self.file,
                start,
                end,
            },
            raw,
            newline_before,
        }
    }

    fn scan_token(&mut self) -> SpannedToken {
        let line_before = self.line;
        self.line_terminator_before_token = false;

        loop {
            self.skip_whitespace_and_comments();
            let newline_before = self.line_terminator_before_token || self.line > line_before;

            if self.is_at_end() {
                let start = self.current_position();
                if let Some(frame) = self.directives.pop() {
                    let name = match frame {
                        DirectiveFrame::Conditional => "///#ENDIF",
                        DirectiveFrame::Debug => "///#ENDDEBUG",
                    };
                    self.report(
                        ErrorCode::UnbalancedDirective,
                        start,
                        format!("missing {}", name),
                    );
                }
                return self.finish_token(Token::EOF, start, newline_before);
            }

            let start = self.current_position();
            if let Some(token) = self.scan_significant(start) {
                return self.finish_token(token, start, newline_before);
            }
        }
    }

    /// Scans one token starting at the current character. Returns `None`
    /// after skipping an illegal character.
    fn scan_significant(&mut self, start: SourcePosition) -> Option<Token> {
        let ch = self.advance();
        let token = match ch {
            '(' => Token::Punctuator(Punctuator::LParen),
            ')' => Token::Punctuator(Punctuator::RParen),
            '{' => {
                self.braces.push(Brace::Block);
                Token::Punctuator(Punctuator::LBrace)
            }
            '}' => {
                if self.braces.pop() == Some(Brace::Template) {
                    self.scan_template_continuation(start)
                } else {
                    Token::Punctuator(Punctuator::RBrace)
                }
            }
            '[' => Token::Punctuator(Punctuator::LBracket),
            ']' => Token::Punctuator(Punctuator::RBracket),
            ';' => Token::Punctuator(Punctuator::Semicolon),
            ',' => Token::Punctuator(Punctuator::Comma),
            ':' => Token::Punctuator(Punctuator::Colon),
            '~' => Token::Punctuator(Punctuator::Tilde),

            '.' => {
                if self.peek() == '.' && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    Token::Punctuator(Punctuator::Spread)
                } else if self.peek().is_ascii_digit() {
                    self.scan_number(ch, start)
                } else {
                    Token::Punctuator(Punctuator::Dot)
                }
            }

            '?' => {
                if self.match_char('?') {
                    if self.match_char('=') {
                        Token::Punctuator(Punctuator::NullishCoalesceEq)
                    } else {
                        Token::Punctuator(Punctuator::NullishCoalesce)
                    }
                } else if self.peek() == '.'
                    && !self.peek_next().map_or(false, |c| c.is_ascii_digit())
                {
                    self.advance();
                    Token::Punctuator(Punctuator::OptionalChain)
                } else {
                    Token::Punctuator(Punctuator::Question)
                }
            }

            '=' => {
                if self.match_char('>') {
                    Token::Punctuator(Punctuator::Arrow)
                } else if self.match_char('=') {
                    if self.match_char('=') {
                        Token::Punctuator(Punctuator::EqEqEq)
                    } else {
                        Token::Punctuator(Punctuator::EqEq)
                    }
                } else {
                    Token::Punctuator(Punctuator::Assign)
                }
            }

            '+' => {
                if self.match_char('+') {
                    Token::Punctuator(Punctuator::PlusPlus)
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::PlusEq)
                } else {
                    Token::Punctuator(Punctuator::Plus)
                }
            }

            '-' => {
                if self.match_char('-') {
                    Token::Punctuator(Punctuator::MinusMinus)
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::MinusEq)
                } else {
                    Token::Punctuator(Punctuator::Minus)
                }
            }

            '*' => {
                if self.match_char('*') {
                    if self.match_char('=') {
                        Token::Punctuator(Punctuator::StarStarEq)
                    } else {
                        Token::Punctuator(Punctuator::StarStar)
                    }
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::StarEq)
                } else {
                    Token::Punctuator(Punctuator::Star)
                }
            }

            '/' => {
                if self.peek() == '*' {
                    // skip_whitespace_and_comments only leaves comments it
                    // wants turned into tokens
                    self.advance();
                    // `/*@cc_on` shares its `@` with the first marker
                    if self.peek() == '@' {
                        self.in_conditional_comment = true;
                        Token::ConditionalComment(CcMarker::Start)
                    } else {
                        self.scan_important_comment(start)
                    }
                } else if self.regexp_allowed {
                    self.scan_regexp(start)
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::SlashEq)
                } else {
                    Token::Punctuator(Punctuator::Slash)
                }
            }

            '%' => {
                if self.regexp_allowed {
                    if let Some(token) = self.scan_replacement_token() {
                        return Some(token);
                    }
                }
                if self.match_char('=') {
                    Token::Punctuator(Punctuator::PercentEq)
                } else {
                    Token::Punctuator(Punctuator::Percent)
                }
            }

            '!' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        Token::Punctuator(Punctuator::NotEqEq)
                    } else {
                        Token::Punctuator(Punctuator::NotEq)
                    }
                } else {
                    Token::Punctuator(Punctuator::Not)
                }
            }

            '<' => {
                if self.match_char('<') {
                    if self.match_char('=') {
                        Token::Punctuator(Punctuator::LtLtEq)
                    } else {
                        Token::Punctuator(Punctuator::LtLt)
                    }
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::LtEq)
                } else {
                    Token::Punctuator(Punctuator::Lt)
                }
            }

            '>' => {
                if self.match_char('>') {
                    if self.match_char('>') {
                        if self.match_char('=') {
                            Token::Punctuator(Punctuator::GtGtGtEq)
                        } else {
                            Token::Punctuator(Punctuator::GtGtGt)
                        }
                    } else if self.match_char('=') {
                        Token::Punctuator(Punctuator::GtGtEq)
                    } else {
                        Token::Punctuator(Punctuator::GtGt)
                    }
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::GtEq)
                } else {
                    Token::Punctuator(Punctuator::Gt)
                }
            }

            '&' => {
                if self.match_char('&') {
                    if self.match_char('=') {
                        Token::Punctuator(Punctuator::AndAndEq)
                    } else {
                        Token::Punctuator(Punctuator::AndAnd)
                    }
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::AndEq)
                } else {
                    Token::Punctuator(Punctuator::And)
                }
            }

            '|' => {
                if self.match_char('|') {
                    if self.match_char('=') {
                        Token::Punctuator(Punctuator::OrOrEq)
                    } else {
                        Token::Punctuator(Punctuator::OrOr)
                    }
                } else if self.match_char('=') {
                    Token::Punctuator(Punctuator::OrEq)
                } else {
                    Token::Punctuator(Punctuator::Or)
                }
            }

            '^' => {
                if self.match_char('=') {
                    Token::Punctuator(Punctuator::XorEq)
                } else {
                    Token::Punctuator(Punctuator::Xor)
                }
            }

            '@' if self.in_conditional_comment => self.scan_conditional_marker(),

            '`' => self.scan_template(start, true),

            '"' | '\'' => self.scan_string(ch, start),

            _ if ch.is_ascii_digit() => self.scan_number(ch, start),

            _ if is_id_start(ch) => self.scan_identifier(ch.to_string(), false, start),

            '\\' if self.peek() == 'u' => match self.scan_unicode_escape(start) {
                Some(c) => self.scan_identifier(c.to_string(), true, start),
                None => return None,
            },

            '#' => {
                let mut name = String::new();
                while is_id_continue(self.peek()) && !self.is_at_end() {
                    name.push(self.advance());
                }
                if name.is_empty() {
                    self.report(ErrorCode::IllegalCharacter, start, "unexpected character '#'");
                    return None;
                }
                Token::PrivateIdentifier(name)
            }

            _ => {
                self.report(
                    ErrorCode::IllegalCharacter,
                    start,
                    format!("unexpected character '{}'", ch),
                );
                return None;
            }
        };
        Some(token)
    }

    fn scan_string(&mut self, quote: char, start: SourcePosition) -> Token {
        let mut value = String::new();

        loop {
            if self.is_at_end() || is_line_terminator(self.peek()) {
                self.report(ErrorCode::UnterminatedString, start, "unterminated string literal");
                break;
            }
            let ch = self.advance();
            if ch == quote {
                break;
            }
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            if self.is_at_end() {
                continue;
            }
            let escape_start = self.current_position();
            let escaped = self.advance();
            match escaped {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                'b' => value.push('\u{0008}'),
                'f' => value.push('\u{000C}'),
                'v' => value.push('\u{000B}'),
                '0' if !self.peek().is_ascii_digit() => value.push('\0'),
                '0'..='7' => {
                    let mut code = escaped.to_digit(8).unwrap_or(0);
                    while code < 32 && self.peek().is_digit(8) {
                        code = code * 8 + self.advance().to_digit(8).unwrap_or(0);
                    }
                    value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                }
                'x' => match self.scan_hex_digits(2) {
                    Some(c) => value.push(c),
                    None => {
                        self.report(ErrorCode::InvalidEscape, escape_start, "invalid \\x escape");
                        value.push('x');
                    }
                },
                'u' => {
                    self.position -= 1;
                    self.column -= 1;
                    match self.scan_unicode_escape(escape_start) {
                        Some(c) => value.push(c),
                        None => value.push('u'),
                    }
                }
                '\r' => {
                    self.match_char('\n');
                    self.new_line();
                }
                '\n' | '\u{2028}' | '\u{2029}' => self.new_line(),
                _ => value.push(escaped),
            }
        }

        Token::String(self.replacements.substitute(&value).into_owned())
    }

    /// Scans template text after the opening backtick (`head` true) or after
    /// the `}` closing a substitution.
    fn scan_template(&mut self, start: SourcePosition, head: bool) -> Token {
        let mut raw = String::new();
        loop {
            if self.is_at_end() {
                self.report(ErrorCode::UnterminatedTemplate, start, "unterminated template literal");
                return if head {
                    Token::TemplateLiteral(raw)
                } else {
                    Token::TemplateTail(raw)
                };
            }
            let ch = self.advance();
            match ch {
                '`' => {
                    return if head {
                        Token::TemplateLiteral(raw)
                    } else {
                        Token::TemplateTail(raw)
                    };
                }
                '$' if self.peek() == '{' => {
                    self.advance();
                    self.braces.push(Brace::Template);
                    return if head {
                        Token::TemplateHead(raw)
                    } else {
                        Token::TemplateMiddle(raw)
                    };
                }
                '\\' => {
                    raw.push(ch);
                    if !self.is_at_end() {
                        let escaped = self.advance();
                        if is_line_terminator(escaped) {
                            self.new_line();
                        }
                        raw.push(escaped);
                    }
                }
                '\r' => {
                    raw.push(ch);
                    if self.match_char('\n') {
                        raw.push('\n');
                    }
                    self.new_line();
                }
                '\n' | '\u{2028}' | '\u{2029}' => {
                    raw.push(ch);
                    self.new_line();
                }
                _ => raw.push(ch),
            }
        }
    }

    fn scan_template_continuation(&mut self, start: SourcePosition) -> Token {
        self.scan_template(start, false)
    }

    fn scan_regexp(&mut self, start: SourcePosition) -> Token {
        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            if self.is_at_end() || is_line_terminator(self.peek()) {
                self.report(
                    ErrorCode::UnterminatedRegExp,
                    start,
                    "unterminated regular expression literal",
                );
                return Token::RegExp(pattern, String::new());
            }
            let ch = self.advance();
            match ch {
                '/' if !in_class => break,
                '[' => in_class = true,
                ']' => in_class = false,
                '\\' => {
                    pattern.push(ch);
                    if !self.is_at_end() && !is_line_terminator(self.peek()) {
                        pattern.push(self.advance());
                    }
                    continue;
                }
                _ => {}
            }
            pattern.push(ch);
        }
        let mut flags = String::new();
        while !self.is_at_end() && is_id_continue(self.peek()) {
            flags.push(self.advance());
        }
        Token::RegExp(pattern, flags)
    }

    fn scan_number(&mut self, first: char, start: SourcePosition) -> Token {
        if first == '0' {
            let radix = match self.peek() {
                'x' | 'X' => Some(16),
                'o' | 'O' => Some(8),
                'b' | 'B' => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                let mut digits = String::new();
                while self.peek().is_digit(radix) || self.peek() == '_' {
                    let c = self.advance();
                    if c != '_' {
                        digits.push(c);
                    }
                }
                if self.match_char('n') {
                    return Token::BigIntLiteral(self.raw_text_from(start));
                }
                if digits.is_empty() {
                    self.report(ErrorCode::InvalidNumber, start, "missing digits after radix prefix");
                    return Token::Number(0.0);
                }
                let value = digits
                    .chars()
                    .fold(0f64, |acc, c| acc * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64);
                return Token::Number(value);
            }
            if self.peek().is_ascii_digit() {
                // legacy octal, or decimal when an 8 or 9 shows up
                let mut digits = String::new();
                while self.peek().is_ascii_digit() {
                    digits.push(self.advance());
                }
                if digits.chars().all(|c| c.is_digit(8)) {
                    let value = digits
                        .chars()
                        .fold(0f64, |acc, c| acc * 8.0 + c.to_digit(8).unwrap_or(0) as f64);
                    return Token::Number(value);
                }
                return Token::Number(digits.parse().unwrap_or(0.0));
            }
        }

        let mut text = String::new();
        text.push(first);
        let mut is_integer = first != '.';
        self.scan_decimal_digits(&mut text);
        if is_integer && self.peek() == '.' {
            is_integer = false;
            text.push(self.advance());
            self.scan_decimal_digits(&mut text);
        } else if !is_integer {
            self.scan_decimal_digits(&mut text);
        }
        if matches!(self.peek(), 'e' | 'E') {
            let sign = self.peek_next();
            let digit_at = if matches!(sign, Some('+') | Some('-')) { 2 } else { 1 };
            if self
                .chars
                .get(self.position + digit_at)
                .map_or(false, |c| c.is_ascii_digit())
            {
                is_integer = false;
                for _ in 0..digit_at {
                    text.push(self.advance());
                }
                self.scan_decimal_digits(&mut text);
            }
        }
        if is_integer && self.match_char('n') {
            return Token::BigIntLiteral(text);
        }
        if is_id_start(self.peek()) {
            self.report(
                ErrorCode::InvalidNumber,
                start,
                "identifier starts immediately after numeric literal",
            );
        }
        match text.parse::<f64>() {
            Ok(value) => Token::Number(value),
            Err(_) => {
                self.report(ErrorCode::InvalidNumber, start, format!("invalid number '{}'", text));
                Token::Number(0.0)
            }
        }
    }

    fn scan_decimal_digits(&mut self, text: &mut String) {
        while self.peek().is_ascii_digit() || (self.peek() == '_' && self.peek_next().map_or(false, |c| c.is_ascii_digit())) {
            let c = self.advance();
            if c != '_' {
                text.push(c);
            }
        }
    }

    fn scan_identifier(&mut self, mut name: String, mut escaped: bool, start: SourcePosition) -> Token {
        loop {
            let ch = self.peek();
            if is_id_continue(ch) && !self.is_at_end() {
                name.push(self.advance());
            } else if ch == '\\' && self.peek_next() == Some('u') {
                let escape_start = self.current_position();
                self.advance();
                match self.scan_unicode_escape(escape_start) {
                    Some(c) => name.push(c),
                    None => break,
                }
                escaped = true;
            } else {
                break;
            }
        }
        let _ = start;
        if !escaped {
            if let Some(keyword) = Keyword::from_str(&name) {
                return Token::Keyword(keyword);
            }
        }
        Token::Identifier(name, escaped)
    }

    /// Scans `u` followed by four hex digits or a braced code point; the
    /// backslash has already been consumed.
    fn scan_unicode_escape(&mut self, start: SourcePosition) -> Option<char> {
        self.advance(); // u
        let decoded = if self.match_char('{') {
            let mut code: u32 = 0;
            let mut digits = 0;
            while self.peek().is_ascii_hexdigit() {
                code = code.saturating_mul(16) + self.advance().to_digit(16).unwrap_or(0);
                digits += 1;
            }
            if digits > 0 && self.match_char('}') {
                char::from_u32(code)
            } else {
                None
            }
        } else {
            self.scan_hex_digits(4)
        };
        if decoded.is_none() {
            self.report(ErrorCode::InvalidEscape, start, "invalid unicode escape sequence");
        }
        decoded
    }

    fn scan_hex_digits(&mut self, count: usize) -> Option<char> {
        let all_hex = (0..count).all(|i| {
            self.chars
                .get(self.position + i)
                .map_or(false, |c| c.is_ascii_hexdigit())
        });
        if !all_hex {
            return None;
        }
        let mut code = 0;
        for _ in 0..count {
            code = code * 16 + self.advance().to_digit(16).unwrap_or(0);
        }
        char::from_u32(code)
    }

    fn scan_important_comment(&mut self, start: SourcePosition) -> Token {
        while !self.is_at_end() {
            if self.peek() == '*' && self.peek_next() == Some('/') {
                self.advance();
                self.advance();
                return Token::ImportantComment(self.raw_text_from(start));
            }
            let ch = self.advance();
            if ch == '\r' {
                self.match_char('\n');
                self.new_line();
            } else if is_line_terminator(ch) {
                self.new_line();
            }
        }
        self.report(ErrorCode::UnterminatedComment, start, "unterminated comment");
        Token::ImportantComment(format!("{}*/", self.raw_text_from(start)))
    }

    fn scan_conditional_marker(&mut self) -> Token {
        if self.peek() == '*' && self.peek_next() == Some('/') {
            self.advance();
            self.advance();
            self.in_conditional_comment = false;
            return Token::ConditionalComment(CcMarker::End);
        }
        let mut name = String::new();
        while is_id_continue(self.peek()) && !self.is_at_end() {
            name.push(self.advance());
        }
        let marker = match name.as_str() {
            "cc_on" => CcMarker::On,
            "set" => CcMarker::Set,
            "if" => CcMarker::If,
            "elif" => CcMarker::ElseIf,
            "else" => CcMarker::Else,
            "end" => CcMarker::EndIf,
            _ => CcMarker::Variable(name),
        };
        Token::ConditionalComment(marker)
    }

    /// Scans `name%` or `name:fallback%` after a `%`, or restores the
    /// position and returns `None` when the text is not a marker.
    fn scan_replacement_token(&mut self) -> Option<Token> {
        let saved = (self.position, self.column);
        let mut name = String::new();
        while is_marker_char(self.peek()) && !self.is_at_end() {
            name.push(self.advance());
        }
        let mut fallback = None;
        if !name.is_empty() && self.match_char(':') {
            let mut text = String::new();
            while is_marker_char(self.peek()) && !self.is_at_end() {
                text.push(self.advance());
            }
            fallback = Some(text);
        }
        let starts_like_name = name
            .chars()
            .next()
            .map_or(false, |c| c.is_alphabetic() || c == '_' || c == '$');
        if starts_like_name && self.match_char('%') {
            return Some(Token::ReplacementToken { name, fallback });
        }
        self.position = saved.0;
        self.column = saved.1;
        None
    }

    fn skip_whitespace_and_comments(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                ' ' | '\t' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | '\u{FEFF}' | '\u{1680}'
                | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}' => {
                    self.advance();
                }
                '\n' | '\u{2028}' | '\u{2029}' => {
                    self.advance();
                    self.new_line();
                }
                '\r' => {
                    self.advance();
                    self.match_char('\n');
                    self.new_line();
                }
                '/' if self.peek_next() == Some('/') => {
                    if self.peek_at(2) == Some('/') && self.peek_at(3) == Some('#') {
                        self.process_directive();
                    } else {
                        self.skip_to_line_end();
                    }
                }
                '/' if self.peek_next() == Some('*') => {
                    let third = self.peek_at(2);
                    if third == Some('@') && !self.settings.ignore_conditional_compilation {
                        return;
                    }
                    if third == Some('!') && self.preserves_important_comments() {
                        return;
                    }
                    self.skip_block_comment();
                }
                _ => break,
            }
        }
    }

    fn preserves_important_comments(&self) -> bool {
        self.settings.preserve_important_comments
            && self
                .settings
                .is_modification_allowed(TreeModifications::PRESERVE_IMPORTANT_COMMENTS)
    }

    fn skip_block_comment(&mut self) {
        let start = self.current_position();
        self.advance();
        self.advance();
        while !self.is_at_end() {
            if self.peek() == '*' && self.peek_next() == Some('/') {
                self.advance();
                self.advance();
                return;
            }
            let ch = self.advance();
            if ch == '\r' {
                self.match_char('\n');
                self.new_line();
            } else if is_line_terminator(ch) {
                self.new_line();
            }
        }
        self.report(ErrorCode::UnterminatedComment, start, "unterminated comment");
    }

    fn skip_to_line_end(&mut self) {
        while !self.is_at_end() && !is_line_terminator(self.peek()) {
            self.advance();
        }
    }

    /// Reads the rest of the current line.
    fn read_line(&mut self) -> String {
        let mut text = String::new();
        while !self.is_at_end() && !is_line_terminator(self.peek()) {
            text.push(self.advance());
        }
        text
    }

    fn consume_line_terminator(&mut self) {
        match self.peek() {
            '\r' => {
                self.advance();
                self.match_char('\n');
                self.new_line();
            }
            '\n' | '\u{2028}' | '\u{2029}' => {
                self.advance();
                self.new_line();
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Preprocessor directives
    // ------------------------------------------------------------------

    fn process_directive(&mut self) {
        let start = self.current_position();
        let line = self.read_line();
        let body = line.trim_start_matches('/').trim_start_matches('#');
        let mut words = body.split_whitespace();
        let directive = words.next().unwrap_or("").to_uppercase();
        let argument = words.next().unwrap_or("");

        let strip_debug = self.settings.strip_debug_statements
            && self
                .settings
                .is_modification_allowed(TreeModifications::STRIP_DEBUG_STATEMENTS);
        let honor_defines = self
            .settings
            .is_modification_allowed(TreeModifications::PREPROCESSOR_DEFINES);

        match directive.as_str() {
            "DEBUG" => {
                if strip_debug {
                    self.skip_lines_until(&["ENDDEBUG"], start);
                } else {
                    self.directives.push(DirectiveFrame::Debug);
                }
            }
            "ENDDEBUG" => {
                if self.directives.last() == Some(&DirectiveFrame::Debug) {
                    self.directives.pop();
                }
            }
            "IFDEF" | "IFNDEF" if honor_defines => {
                let defined = self.defines.contains(&argument.to_uppercase());
                let take = if directive == "IFDEF" { defined } else { !defined };
                if take {
                    self.directives.push(DirectiveFrame::Conditional);
                } else if self.skip_lines_until(&["ELSE", "ENDIF"], start).as_deref()
                    == Some("ELSE")
                {
                    self.directives.push(DirectiveFrame::Conditional);
                }
            }
            "ELSE" if honor_defines => {
                if self.directives.last() == Some(&DirectiveFrame::Conditional) {
                    self.directives.pop();
                    self.skip_lines_until(&["ENDIF"], start);
                } else {
                    self.report(ErrorCode::UnbalancedDirective, start, "///#ELSE without ///#IFDEF");
                }
            }
            "ENDIF" if honor_defines => {
                if self.directives.last() == Some(&DirectiveFrame::Conditional) {
                    self.directives.pop();
                } else {
                    self.report(ErrorCode::UnbalancedDirective, start, "///#ENDIF without ///#IFDEF");
                }
            }
            "DEFINE" if honor_defines && is_valid_identifier(argument) => {
                self.defines.insert(argument.to_uppercase());
            }
            "UNDEF" if honor_defines => {
                self.defines.remove(&argument.to_uppercase());
            }
            "SOURCE" => {
                let mut parts = body.split_whitespace().skip(1);
                let line_number = parts.next().and_then(|s| s.parse::<u32>().ok());
                let column_number = parts.next().and_then(|s| s.parse::<u32>().ok());
                let path: Vec<&str> = parts.collect();
                if let (Some(line_number), Some(column_number), false) =
                    (line_number, column_number, path.is_empty())
                {
                    self.consume_line_terminator();
                    self.line = line_number.max(1);
                    self.column = column_number.max(1);
                    self.file = FileId(self.next_file_id);
                    self.next_file_id += 1;
                    self.new_files.push(path.join(" "));
                }
            }
            _ => {}
        }
    }

    /// Skips whole lines until one holds a directive in `stop` at the same
    /// nesting depth. Returns the directive found, consuming its line.
    fn skip_lines_until(&mut self, stop: &[&str], start: SourcePosition) -> Option<String> {
        let mut depth = 0usize;
        self.consume_line_terminator();
        while !self.is_at_end() {
            while matches!(self.peek(), ' ' | '\t') {
                self.advance();
            }
            let line = self.read_line();
            self.consume_line_terminator();
            let Some(body) = line.strip_prefix("///#") else {
                continue;
            };
            let directive = body
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_uppercase();
            match directive.as_str() {
                "IFDEF" | "IFNDEF" | "DEBUG" => depth += 1,
                "ENDIF" | "ENDDEBUG" if depth > 0 => depth -= 1,
                _ if depth == 0 && stop.contains(&directive.as_str()) => return Some(directive),
                _ => {}
            }
        }
        self.report(
            ErrorCode::UnbalancedDirective,
            start,
            format!("missing ///#{}", stop.last().copied().unwrap_or("ENDIF")),
        );
        None
    }

    // ------------------------------------------------------------------
    // Character helpers
    // ------------------------------------------------------------------

    fn raw_text_from(&self, start: SourcePosition) -> String {
        self.chars[start.offset..self.position].iter().collect()
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.column = 1;
        self.line_terminator_before_token = true;
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.chars.get(self.position).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> Option<char> {
        self.peek_at(1)
    }

    fn peek_at(&self, distance: usize) -> Option<char> {
        self.chars.get(self.position + distance).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.peek();
        self.position += 1;
        self.column += 1;
        ch
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn current_position(&self) -> SourcePosition {
        SourcePosition {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = SpannedToken;

    fn next(&mut self) -> Option<SpannedToken> {
        let token = self.next_token();
        if token.token == Token::EOF {
            None
        } else {
            Some(token)
        }
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Check if a character may start an identifier.
pub fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphabetic()
}

/// Check if a character may continue an identifier.
pub fn is_id_continue(ch: char) -> bool {
    is_id_start(ch) || ch.is_alphanumeric() || ch == '\u{200C}' || ch == '\u{200D}'
}

/// Words that can never be used as binding names.
pub fn is_reserved_word(name: &str) -> bool {
    match Keyword::from_str(name) {
        Some(keyword) => !matches!(keyword, Keyword::Async | Keyword::Static),
        None => matches!(
            name,
            "enum"
                | "implements"
                | "interface"
                | "package"
                | "private"
                | "protected"
                | "public"
        ),
    }
}

/// Whether `name` is a usable identifier: well-formed and not reserved.
///
/// # Examples
///
/// ```
/// use parser::lexer::is_valid_identifier;
///
/// assert!(is_valid_identifier("$super"));
/// assert!(is_valid_identifier("_x1"));
/// assert!(!is_valid_identifier("1x"));
/// assert!(!is_valid_identifier("if"));
/// ```
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_id_start(first) => {}
        _ => return false,
    }
    chars.all(is_id_continue) && !is_reserved_word(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let settings = CodeSettings::default();
        let lexer = Lexer::new(source, &settings);
        lexer.map(|t| t.token).collect()
    }

    fn tokens_with(source: &str, settings: &CodeSettings) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut lexer = Lexer::new(source, settings);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.token == Token::EOF {
                break;
            }
            out.push(token.token);
        }
        (out, lexer.take_diagnostics())
    }

    #[test]
    fn test_lexer_empty_source() {
        assert!(tokens("").is_empty());
        assert!(tokens("   // nothing\n /* here */").is_empty());
    }

    #[test]
    fn test_lexer_identifier_and_keywords() {
        assert_eq!(
            tokens("var x"),
            vec![
                Token::Keyword(Keyword::Var),
                Token::Identifier("x".to_string(), false)
            ]
        );
        assert_eq!(
            tokens("\\u0076ar"),
            vec![Token::Identifier("var".to_string(), true)]
        );
    }

    #[test]
    fn test_lexer_numbers() {
        assert_eq!(
            tokens("42 0x1F .5 1e3 017 0b101 1_000 10n"),
            vec![
                Token::Number(42.0),
                Token::Number(31.0),
                Token::Number(0.5),
                Token::Number(1000.0),
                Token::Number(15.0),
                Token::Number(5.0),
                Token::Number(1000.0),
                Token::BigIntLiteral("10".to_string()),
            ]
        );
    }

    #[test]
    fn test_lexer_string_escapes() {
        assert_eq!(
            tokens(r#"'a\nb' "\x41B\u{43}""#),
            vec![
                Token::String("a\nb".to_string()),
                Token::String("ABC".to_string())
            ]
        );
    }

    #[test]
    fn test_lexer_regexp_vs_division() {
        assert_eq!(
            tokens("a / b"),
            vec![
                Token::Identifier("a".to_string(), false),
                Token::Punctuator(Punctuator::Slash),
                Token::Identifier("b".to_string(), false),
            ]
        );
        assert_eq!(
            tokens("x = /a[/]b/gi"),
            vec![
                Token::Identifier("x".to_string(), false),
                Token::Punctuator(Punctuator::Assign),
                Token::RegExp("a[/]b".to_string(), "gi".to_string()),
            ]
        );
        assert_eq!(
            tokens("return /x/"),
            vec![
                Token::Keyword(Keyword::Return),
                Token::RegExp("x".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_lexer_template_nesting() {
        assert_eq!(
            tokens("`a${ {b:1}.b }c${d}e`"),
            vec![
                Token::TemplateHead("a".to_string()),
                Token::Punctuator(Punctuator::LBrace),
                Token::Identifier("b".to_string(), false),
                Token::Punctuator(Punctuator::Colon),
                Token::Number(1.0),
                Token::Punctuator(Punctuator::RBrace),
                Token::Punctuator(Punctuator::Dot),
                Token::Identifier("b".to_string(), false),
                Token::TemplateMiddle("c".to_string()),
                Token::Identifier("d".to_string(), false),
                Token::TemplateTail("e".to_string()),
            ]
        );
    }

    #[test]
    fn test_lexer_unterminated_string_recovers() {
        let settings = CodeSettings::default();
        let (toks, diagnostics) = tokens_with("var s = 'abc\nvar t;", &settings);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, ErrorCode::UnterminatedString);
        assert!(toks.contains(&Token::Identifier("t".to_string(), false)));
    }

    #[test]
    fn test_lexer_illegal_character_is_skipped() {
        let settings = CodeSettings::default();
        let (toks, diagnostics) = tokens_with("a \u{0001} b", &settings);
        assert_eq!(toks.len(), 2);
        assert_eq!(diagnostics[0].code, ErrorCode::IllegalCharacter);
    }

    #[test]
    fn test_lexer_newline_before() {
        let settings = CodeSettings::default();
        let mut lexer = Lexer::new("a\nb", &settings);
        assert!(!lexer.next_token().newline_before);
        assert!(lexer.next_token().newline_before);
    }

    #[test]
    fn test_lexer_conditional_comment_markers() {
        assert_eq!(
            tokens("/*@cc_on @if(@_jscript) a @end @*/"),
            vec![
                Token::ConditionalComment(CcMarker::Start),
                Token::ConditionalComment(CcMarker::On),
                Token::ConditionalComment(CcMarker::If),
                Token::Punctuator(Punctuator::LParen),
                Token::ConditionalComment(CcMarker::Variable("_jscript".to_string())),
                Token::Punctuator(Punctuator::RParen),
                Token::Identifier("a".to_string(), false),
                Token::ConditionalComment(CcMarker::EndIf),
                Token::ConditionalComment(CcMarker::End),
            ]
        );
    }

    #[test]
    fn test_lexer_important_comment() {
        assert_eq!(
            tokens("/*! keep */ a /* drop */"),
            vec![
                Token::ImportantComment("/*! keep */".to_string()),
                Token::Identifier("a".to_string(), false),
            ]
        );
        let mut settings = CodeSettings::default();
        settings.preserve_important_comments = false;
        let (toks, _) = tokens_with("/*! keep */ a", &settings);
        assert_eq!(toks.len(), 1);
    }

    #[test]
    fn test_lexer_replacement_token_in_expression_position() {
        assert_eq!(
            tokens("a = %MyToken:foo%; b % c"),
            vec![
                Token::Identifier("a".to_string(), false),
                Token::Punctuator(Punctuator::Assign),
                Token::ReplacementToken {
                    name: "MyToken".to_string(),
                    fallback: Some("foo".to_string())
                },
                Token::Punctuator(Punctuator::Semicolon),
                Token::Identifier("b".to_string(), false),
                Token::Punctuator(Punctuator::Percent),
                Token::Identifier("c".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_lexer_debug_directive_stripped() {
        let settings = CodeSettings::default();
        let (toks, diagnostics) = tokens_with("a;\n///#DEBUG\nlog();\n///#ENDDEBUG\nb;", &settings);
        assert!(diagnostics.is_empty());
        assert!(!toks.contains(&Token::Identifier("log".to_string(), false)));
        assert!(toks.contains(&Token::Identifier("b".to_string(), false)));
    }

    #[test]
    fn test_lexer_ifdef_directives() {
        let mut settings = CodeSettings::default();
        settings.set_preprocessor_defines("FEATURE").unwrap();
        let source = "///#IFDEF feature\nyes;\n///#ELSE\nno;\n///#ENDIF\n///#IFNDEF feature\nnope;\n///#ENDIF\n";
        let (toks, diagnostics) = tokens_with(source, &settings);
        assert!(diagnostics.is_empty());
        assert!(toks.contains(&Token::Identifier("yes".to_string(), false)));
        assert!(!toks.contains(&Token::Identifier("no".to_string(), false)));
        assert!(!toks.contains(&Token::Identifier("nope".to_string(), false)));
    }

    #[test]
    fn test_lexer_source_directive_remaps_positions() {
        let settings = CodeSettings::default();
        let mut lexer = Lexer::new("///#SOURCE 40 5 other.js\nfoo", &settings);
        let token = lexer.next_token();
        assert_eq!(token.span.start.line, 40);
        assert_eq!(token.span.start.column, 5);
        assert_eq!(token.span.file, FileId(1));
        assert_eq!(lexer.new_files(), &["other.js".to_string()]);
    }

    #[test]
    fn test_lexer_checkpoint_restore() {
        let settings = CodeSettings::default();
        let mut lexer = Lexer::new("a b c", &settings);
        lexer.next_token();
        let state = lexer.checkpoint();
        let b = lexer.next_token();
        lexer.next_token();
        lexer.restore(state);
        assert_eq!(lexer.next_token(), b);
    }

    #[test]
    fn test_rescan_as_regexp() {
        let settings = CodeSettings::default();
        let mut lexer = Lexer::new(") /a/g", &settings);
        lexer.next_token();
        let slash = lexer.next_token();
        assert_eq!(slash.token, Token::Punctuator(Punctuator::Slash));
        let regexp = lexer.rescan_as_regexp(&slash);
        assert_eq!(regexp.token, Token::RegExp("a".to_string(), "g".to_string()));
        assert_eq!(regexp.raw, "/a/g");
    }
}
