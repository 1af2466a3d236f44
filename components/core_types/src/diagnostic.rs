//! Diagnostics and the undefined-reference channel.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::{ErrorCode, SourceSpan};

/// Taxonomy bucket of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCategory {
    /// Malformed token
    Lex,
    /// Grammar violation
    Parse,
    /// Name with no declaration anywhere in scope
    UndefinedReference,
    /// Resolution that may differ at run time
    AmbiguousBinding,
    /// Invalid externally supplied option
    Configuration,
    /// Output could not be produced in the requested form
    Output,
}

/// A reported problem.
///
/// # Examples
///
/// ```
/// use core_types::{Diagnostic, ErrorCode, SourcePosition, SourceSpan};
///
/// let span = SourceSpan::new(SourcePosition::new(3, 7, 40), SourcePosition::new(3, 10, 43));
/// let diagnostic = Diagnostic::new(ErrorCode::NoRightCurly, span, "expected '}'")
///     .with_file("app.js");
/// assert!(diagnostic.is_error());
/// assert_eq!(
///     diagnostic.to_string(),
///     "app.js(3,7-3,10): error JS1105: expected '}'"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Diagnostic code
    pub code: ErrorCode,
    /// Severity, 0 is most severe
    pub severity: u8,
    /// Taxonomy bucket
    pub category: DiagnosticCategory,
    /// Source file name, if known
    pub file: Option<String>,
    /// Location of the offending text
    pub span: SourceSpan,
    /// Formatted message
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic with the code's default severity.
    pub fn new(code: ErrorCode, span: SourceSpan, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            category: code.category(),
            file: None,
            span,
            message: message.into(),
        }
    }

    /// Attaches a file name.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Overrides the severity.
    pub fn with_severity(mut self, severity: u8) -> Self {
        self.severity = severity;
        self
    }

    /// Whether this is a hard error rather than a warning.
    pub fn is_error(&self) -> bool {
        self.severity == 0
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{}-{},{}): {} {}: {}",
            self.file.as_deref().unwrap_or(""),
            self.span.start.line,
            self.span.start.column,
            self.span.end.line,
            self.span.end.column,
            if self.is_error() { "error" } else { "warning" },
            self.code.as_str(),
            self.message
        )
    }
}

/// How an unresolved name was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReferenceType {
    /// Read or written as a value
    Variable,
    /// Callee of a call expression
    Function,
    /// Callee of a `new` expression
    Constructor,
}

/// A name that resolved to no declaration anywhere in scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndefinedReference {
    /// The referenced name
    pub name: String,
    /// Where the reference occurs
    pub span: SourceSpan,
    /// How the name was used
    pub reference_type: ReferenceType,
}

impl UndefinedReference {
    /// Sorts references for reporting: name (case-insensitive), then line,
    /// then column.
    pub fn sort_for_report(references: &mut [UndefinedReference]) {
        references.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.span.start.line.cmp(&b.span.start.line))
                .then(a.span.start.column.cmp(&b.span.start.column))
        });
    }
}

/// Severity filter applied by a host over the diagnostic stream.
///
/// Errors (severity 0) are always visible. Warnings are visible when their
/// severity is within `warning_level` and their code is not ignored.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticFilter {
    /// Highest warning severity to show
    pub warning_level: u8,
    /// Codes never shown as warnings
    pub ignored: HashSet<ErrorCode>,
}

impl DiagnosticFilter {
    /// Creates a filter with the given threshold and no ignored codes.
    pub fn new(warning_level: u8) -> Self {
        Self {
            warning_level,
            ignored: HashSet::new(),
        }
    }

    /// Adds a code to the ignore list.
    pub fn ignore(mut self, code: ErrorCode) -> Self {
        self.ignored.insert(code);
        self
    }

    /// Whether the diagnostic passes the filter.
    pub fn is_visible(&self, diagnostic: &Diagnostic) -> bool {
        diagnostic.is_error()
            || (diagnostic.severity <= self.warning_level
                && !self.ignored.contains(&diagnostic.code))
    }

    /// The visible subset of `diagnostics`, in order.
    pub fn apply<'a>(&'a self, diagnostics: &'a [Diagnostic]) -> impl Iterator<Item = &'a Diagnostic> {
        diagnostics.iter().filter(move |d| self.is_visible(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourcePosition;

    fn reference(name: &str, line: u32, column: u32) -> UndefinedReference {
        UndefinedReference {
            name: name.to_string(),
            span: SourceSpan::new(
                SourcePosition::new(line, column, 0),
                SourcePosition::new(line, column + 1, 1),
            ),
            reference_type: ReferenceType::Variable,
        }
    }

    #[test]
    fn test_undefined_reference_sort_order() {
        let mut refs = vec![
            reference("beta", 1, 1),
            reference("Alpha", 4, 2),
            reference("alpha", 2, 9),
            reference("alpha", 2, 3),
        ];
        UndefinedReference::sort_for_report(&mut refs);
        let order: Vec<(u32, u32)> = refs
            .iter()
            .map(|r| (r.span.start.line, r.span.start.column))
            .collect();
        assert_eq!(order, vec![(2, 3), (2, 9), (4, 2), (1, 1)]);
    }

    #[test]
    fn test_filter_keeps_errors_and_drops_ignored_warnings() {
        let filter = DiagnosticFilter::new(3).ignore(ErrorCode::UndeclaredFunction);
        let error = Diagnostic::new(ErrorCode::UnexpectedToken, SourceSpan::default(), "x");
        let undeclared_fn = Diagnostic::new(ErrorCode::UndeclaredFunction, SourceSpan::default(), "f");
        let undeclared_var = Diagnostic::new(ErrorCode::UndeclaredVariable, SourceSpan::default(), "v");
        assert!(filter.is_visible(&error));
        assert!(!filter.is_visible(&undeclared_fn));
        assert!(filter.is_visible(&undeclared_var));
    }

    #[test]
    fn test_filter_threshold() {
        let filter = DiagnosticFilter::new(1);
        let ambiguous = Diagnostic::new(
            ErrorCode::AmbiguousWithReference,
            SourceSpan::default(),
            "x",
        );
        assert!(!filter.is_visible(&ambiguous));
        assert!(filter.is_visible(&ambiguous.clone().with_severity(1)));
    }

    #[test]
    fn test_display_without_file() {
        let d = Diagnostic::new(ErrorCode::UndeclaredVariable, SourceSpan::default(), "'x' is not declared");
        assert_eq!(d.to_string(), "(1,1-1,1): warning JS1200: 'x' is not declared");
    }
}
