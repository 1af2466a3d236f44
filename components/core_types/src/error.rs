//! Diagnostic codes and boundary errors.
//!
//! Codes are grouped in ranges by the pipeline tier that reports them. The
//! numeric value is stable and shown to users as `JSnnnn`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DiagnosticCategory;

/// The closed set of diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    // ============================================================
    // Scanner errors (JS1000-JS1099)
    // ============================================================
    /// String literal reaches a line break or the end of input.
    UnterminatedString = 1000,
    /// Block comment is never closed.
    UnterminatedComment = 1001,
    /// Regular expression literal is never closed.
    UnterminatedRegExp = 1002,
    /// Template literal is never closed.
    UnterminatedTemplate = 1003,
    /// Malformed escape sequence in a string or template.
    InvalidEscape = 1004,
    /// Character that cannot start any token.
    IllegalCharacter = 1005,
    /// Malformed numeric literal.
    InvalidNumber = 1006,
    /// Preprocessor directive without its opening or closing partner.
    UnbalancedDirective = 1007,

    // ============================================================
    // Parser errors (JS1100-JS1199)
    // ============================================================
    /// Token that does not fit the grammar at this point.
    UnexpectedToken = 1100,
    /// Identifier expected.
    ExpectedIdentifier = 1101,
    /// Expression expected.
    ExpectedExpression = 1102,
    /// Missing `)`.
    NoRightParenthesis = 1103,
    /// Missing `]`.
    NoRightBracket = 1104,
    /// Missing `}`.
    NoRightCurly = 1105,
    /// Missing `:`.
    NoColon = 1106,
    /// Missing `;` where automatic insertion does not apply.
    NoSemicolon = 1107,
    /// `try` without `catch` or `finally`.
    NoCatchOrFinally = 1108,
    /// `break`/`continue` naming an unknown label.
    BadLabel = 1109,
    /// `break`/`continue` outside of a loop or switch.
    BadBreak = 1110,
    /// Assignment to something that is not a reference.
    InvalidAssignmentTarget = 1111,
    /// More than one `default` clause in a switch.
    DuplicateDefault = 1112,
    /// `with` inside strict-mode code.
    StrictModeWith = 1113,
    /// Input ends inside a construct that requires more tokens.
    UnexpectedEndOfInput = 1114,
    /// Function body statement where a declaration is not allowed.
    MisplacedDeclaration = 1115,

    // ============================================================
    // Undefined references (JS1200-JS1299)
    // ============================================================
    /// Variable reference with no declaration in any scope.
    UndeclaredVariable = 1200,
    /// Call to a function with no declaration in any scope.
    UndeclaredFunction = 1201,

    // ============================================================
    // Ambiguous bindings (JS1300-JS1399)
    // ============================================================
    /// Named function expression whose name may leak into the enclosing scope.
    AmbiguousNamedFunctionExpression = 1300,
    /// Name referenced inside a `with` block that also exists as an outer local.
    AmbiguousWithReference = 1301,

    // ============================================================
    // Configuration errors (JS1400-JS1499)
    // ============================================================
    /// Rename pair that is not of the form `old=new`.
    InvalidRenamePair = 1400,
    /// Name in an option list that is not a valid identifier.
    InvalidIdentifier = 1401,

    // ============================================================
    // Output errors (JS1500-JS1599)
    // ============================================================
    /// JSON output requested for code that is not a single JSON value.
    InvalidJsonOutput = 1500,
}

impl ErrorCode {
    /// Formatted code string, e.g. `JS1200`.
    pub fn as_str(&self) -> String {
        format!("JS{:04}", *self as u16)
    }

    /// Severity used when a diagnostic is created with this code.
    ///
    /// 0 is a hard error; larger numbers are progressively less important.
    pub fn default_severity(&self) -> u8 {
        match self {
            ErrorCode::InvalidEscape | ErrorCode::UnbalancedDirective => 1,
            ErrorCode::AmbiguousNamedFunctionExpression | ErrorCode::AmbiguousWithReference => 2,
            ErrorCode::UndeclaredVariable | ErrorCode::UndeclaredFunction => 3,
            ErrorCode::MisplacedDeclaration => 4,
            _ => 0,
        }
    }

    /// The taxonomy bucket for this code.
    pub fn category(&self) -> DiagnosticCategory {
        match *self as u16 {
            1000..=1099 => DiagnosticCategory::Lex,
            1100..=1199 => DiagnosticCategory::Parse,
            1200..=1299 => DiagnosticCategory::UndefinedReference,
            1300..=1399 => DiagnosticCategory::AmbiguousBinding,
            1400..=1499 => DiagnosticCategory::Configuration,
            _ => DiagnosticCategory::Output,
        }
    }

    /// A short human-readable description of the code.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::UnterminatedString => "unterminated string literal",
            ErrorCode::UnterminatedComment => "unterminated comment",
            ErrorCode::UnterminatedRegExp => "unterminated regular expression literal",
            ErrorCode::UnterminatedTemplate => "unterminated template literal",
            ErrorCode::InvalidEscape => "invalid escape sequence",
            ErrorCode::IllegalCharacter => "illegal character",
            ErrorCode::InvalidNumber => "invalid numeric literal",
            ErrorCode::UnbalancedDirective => "unbalanced preprocessor directive",
            ErrorCode::UnexpectedToken => "unexpected token",
            ErrorCode::ExpectedIdentifier => "expected identifier",
            ErrorCode::ExpectedExpression => "expected expression",
            ErrorCode::NoRightParenthesis => "expected ')'",
            ErrorCode::NoRightBracket => "expected ']'",
            ErrorCode::NoRightCurly => "expected '}'",
            ErrorCode::NoColon => "expected ':'",
            ErrorCode::NoSemicolon => "expected ';'",
            ErrorCode::NoCatchOrFinally => "expected 'catch' or 'finally'",
            ErrorCode::BadLabel => "label not found",
            ErrorCode::BadBreak => "break or continue outside of a loop",
            ErrorCode::InvalidAssignmentTarget => "invalid assignment target",
            ErrorCode::DuplicateDefault => "duplicate default clause",
            ErrorCode::StrictModeWith => "with statement not allowed in strict mode",
            ErrorCode::UnexpectedEndOfInput => "unexpected end of input",
            ErrorCode::MisplacedDeclaration => "declaration not allowed here",
            ErrorCode::UndeclaredVariable => "undeclared variable",
            ErrorCode::UndeclaredFunction => "undeclared function",
            ErrorCode::AmbiguousNamedFunctionExpression => {
                "ambiguous named function expression"
            }
            ErrorCode::AmbiguousWithReference => "ambiguous reference inside with",
            ErrorCode::InvalidRenamePair => "invalid rename pair",
            ErrorCode::InvalidIdentifier => "invalid identifier",
            ErrorCode::InvalidJsonOutput => "code is not a JSON value",
        }
    }
}

/// Invalid externally supplied option.
///
/// Returned by the configuration setters; a rejected option never reaches
/// the settings object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A name that must be an identifier is not one.
    #[error("`{0}` is not a valid identifier")]
    InvalidIdentifier(String),

    /// A rename pair without exactly one `=`.
    #[error("malformed rename pair `{0}`, expected `old=new`")]
    MalformedRenamePair(String),

    /// The same source name renamed twice.
    #[error("`{0}` already has a rename target")]
    DuplicateRename(String),

    /// A preprocessor define that is not `NAME` or `NAME=value`.
    #[error("invalid preprocessor define `{0}`")]
    InvalidDefine(String),

    /// Replacement-token values that are not a flat JSON object.
    #[error("invalid replacement token set: {0}")]
    InvalidReplacementTokens(String),

    /// Serialized settings that do not deserialize.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl ConfigurationError {
    /// Diagnostic code a host should use when surfacing this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigurationError::MalformedRenamePair(_) | ConfigurationError::DuplicateRename(_) => {
                ErrorCode::InvalidRenamePair
            }
            _ => ErrorCode::InvalidIdentifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_formatting() {
        assert_eq!(ErrorCode::UnterminatedString.as_str(), "JS1000");
        assert_eq!(ErrorCode::UndeclaredFunction.as_str(), "JS1201");
    }

    #[test]
    fn test_categories_follow_ranges() {
        assert_eq!(ErrorCode::InvalidEscape.category(), DiagnosticCategory::Lex);
        assert_eq!(ErrorCode::NoRightCurly.category(), DiagnosticCategory::Parse);
        assert_eq!(
            ErrorCode::AmbiguousWithReference.category(),
            DiagnosticCategory::AmbiguousBinding
        );
        assert_eq!(ErrorCode::InvalidJsonOutput.category(), DiagnosticCategory::Output);
    }

    #[test]
    fn test_configuration_error_message() {
        let err = ConfigurationError::MalformedRenamePair("a=b=c".to_string());
        assert_eq!(err.to_string(), "malformed rename pair `a=b=c`, expected `old=new`");
        assert_eq!(err.code(), ErrorCode::InvalidRenamePair);
    }
}
