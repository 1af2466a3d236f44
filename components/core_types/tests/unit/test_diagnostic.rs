//! Unit tests for ErrorCode, Diagnostic and ConfigurationError

use core_types::{
    ConfigurationError, Diagnostic, DiagnosticCategory, DiagnosticFilter, ErrorCode, SourceSpan,
};

#[cfg(test)]
mod error_code_tests {
    use super::*;

    #[test]
    fn test_code_strings() {
        assert_eq!(ErrorCode::UnterminatedString.as_str(), "JS1000");
        assert_eq!(ErrorCode::UndeclaredVariable.as_str(), "JS1200");
    }

    #[test]
    fn test_categories_follow_code_ranges() {
        assert_eq!(ErrorCode::IllegalCharacter.category(), DiagnosticCategory::Lex);
        assert_eq!(ErrorCode::NoRightCurly.category(), DiagnosticCategory::Parse);
        assert_eq!(
            ErrorCode::UndeclaredFunction.category(),
            DiagnosticCategory::UndefinedReference
        );
        assert_eq!(ErrorCode::InvalidJsonOutput.category(), DiagnosticCategory::Output);
    }

    #[test]
    fn test_default_severities() {
        assert_eq!(ErrorCode::UnexpectedToken.default_severity(), 0);
        assert_eq!(ErrorCode::AmbiguousWithReference.default_severity(), 2);
        assert_eq!(ErrorCode::UndeclaredVariable.default_severity(), 3);
    }
}

#[cfg(test)]
mod diagnostic_tests {
    use super::*;

    #[test]
    fn test_new_takes_code_defaults() {
        let d = Diagnostic::new(ErrorCode::NoSemicolon, SourceSpan::default(), "expected ';'");
        assert!(d.is_error());
        assert_eq!(d.category, DiagnosticCategory::Parse);
        assert!(d.file.is_none());
    }

    #[test]
    fn test_display_includes_file_and_code() {
        let d = Diagnostic::new(ErrorCode::UndeclaredVariable, SourceSpan::default(), "undeclared variable 'x'")
            .with_file("app.js");
        let text = d.to_string();
        assert!(text.starts_with("app.js(1,1-1,1): warning JS1200"), "{}", text);
        assert!(text.ends_with("undeclared variable 'x'"));
    }

    #[test]
    fn test_filter_ignores_only_warnings() {
        let warning = Diagnostic::new(ErrorCode::UndeclaredVariable, SourceSpan::default(), "w");
        let error = Diagnostic::new(ErrorCode::UnexpectedToken, SourceSpan::default(), "e")
            .with_severity(0);
        let filter = DiagnosticFilter::new(4)
            .ignore(ErrorCode::UndeclaredVariable)
            .ignore(ErrorCode::UnexpectedToken);
        let all = [warning, error];
        let visible: Vec<&Diagnostic> = filter.apply(&all).collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].code, ErrorCode::UnexpectedToken);
    }
}

#[cfg(test)]
mod configuration_error_tests {
    use super::*;

    #[test]
    fn test_messages_and_codes() {
        let err = ConfigurationError::MalformedRenamePair("a=b=c".to_string());
        assert_eq!(err.to_string(), "malformed rename pair `a=b=c`, expected `old=new`");
        assert_eq!(err.code(), ErrorCode::InvalidRenamePair);
        let err = ConfigurationError::InvalidIdentifier("1x".to_string());
        assert_eq!(err.code(), ErrorCode::InvalidIdentifier);
    }
}
