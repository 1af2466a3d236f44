//! Parser error types and helpers

use core_types::{Diagnostic, ErrorCode, SourceSpan};
use thiserror::Error;

/// Condition that ends the parse of a chunk early.
///
/// Everything else the parser finds wrong is reported as a [`Diagnostic`]
/// and parsing continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAbort {
    /// Input ran out inside a construct that cannot be closed implicitly
    #[error("unexpected end of input at {line}:{column}")]
    EndOfInput {
        /// Line of the end of input
        line: u32,
        /// Column of the end of input
        column: u32,
    },
}

/// Why a parse function gave up on the construct it was reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// A diagnostic was reported; resume at the next statement boundary
    Recover,
    /// Input ended; stop parsing the chunk
    Abort(ParseAbort),
}

impl From<ParseAbort> for ParseFailure {
    fn from(abort: ParseAbort) -> Self {
        ParseFailure::Abort(abort)
    }
}

/// Result type used inside the parser
pub type PResult<T> = Result<T, ParseFailure>;

/// Create a syntax error diagnostic at a given span
pub fn syntax_error(code: ErrorCode, span: SourceSpan, message: impl Into<String>) -> Diagnostic {
    Diagnostic::new(code, span, message)
}

/// Create an unexpected token diagnostic
pub fn unexpected_token(expected: &str, got: &str, span: SourceSpan) -> Diagnostic {
    syntax_error(
        ErrorCode::UnexpectedToken,
        span,
        format!("expected {}, found {}", expected, got),
    )
}

/// Create an unexpected end of input diagnostic
pub fn unexpected_eof(span: SourceSpan) -> Diagnostic {
    syntax_error(ErrorCode::UnexpectedEndOfInput, span, "unexpected end of input")
}
