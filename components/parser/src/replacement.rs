//! `%name%` and `%name:fallback%` replacement tokens.
//!
//! Markers inside string literals are substituted textually while the
//! literal is scanned. A marker in expression position becomes a
//! [`Token::ReplacementToken`](crate::lexer::Token::ReplacementToken) that the
//! parser turns into a literal node from the [`ReplacementValue`] of its
//! resolved text.
//!
//! With no replacement values or fallbacks configured, markers are left
//! exactly as written.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::settings::CodeSettings;

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"%(?P<name>[\w.$-]+)(?::(?P<fallback>[\w.$-]*))?%")
            .expect("replacement marker pattern is valid")
    })
}

/// Whether `c` may appear in a marker name or fallback name.
pub fn is_marker_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '$' | '-')
}

/// Resolves replacement markers against the configured values.
#[derive(Debug, Clone, Copy)]
pub struct Replacements<'a> {
    settings: &'a CodeSettings,
}

impl<'a> Replacements<'a> {
    /// Creates a resolver over `settings`.
    pub fn new(settings: &'a CodeSettings) -> Self {
        Self { settings }
    }

    /// Whether markers are substituted at all.
    pub fn is_active(&self) -> bool {
        self.settings.has_replacements()
    }

    /// Text a marker stands for.
    ///
    /// The token's own value wins; otherwise the fallback's value; otherwise
    /// the empty string. Returns `None` when replacement is inactive and the
    /// marker must stay verbatim.
    pub fn resolve(&self, name: &str, fallback: Option<&str>) -> Option<String> {
        if !self.is_active() {
            return None;
        }
        if let Some(value) = self.settings.replacement_token(name) {
            return Some(value.to_string());
        }
        Some(
            fallback
                .and_then(|f| self.settings.replacement_fallback(f))
                .unwrap_or_default()
                .to_string(),
        )
    }

    /// Substitutes every marker in the contents of a string literal.
    pub fn substitute<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if !self.is_active() || !text.contains('%') {
            return Cow::Borrowed(text);
        }
        marker_pattern().replace_all(text, |caps: &Captures<'_>| {
            let name = &caps["name"];
            let fallback = caps.name("fallback").map(|m| m.as_str());
            self.resolve(name, fallback).unwrap_or_default()
        })
    }
}

/// Literal a resolved replacement text turns into in expression position.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplacementValue {
    /// Nothing at all; emits no text
    Empty,
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// `true` or `false`
    Boolean(bool),
    /// `null`
    Null,
    /// Object or array literal
    Json(serde_json::Value),
}

impl ReplacementValue {
    /// Classifies resolved replacement text.
    ///
    /// JSON-shaped text becomes the matching literal; anything else becomes a
    /// string literal holding the text.
    ///
    /// # Examples
    ///
    /// ```
    /// use parser::replacement::ReplacementValue;
    ///
    /// assert_eq!(ReplacementValue::classify("123"), ReplacementValue::Number(123.0));
    /// assert_eq!(
    ///     ReplacementValue::classify("\"hi\""),
    ///     ReplacementValue::String("hi".to_string())
    /// );
    /// assert_eq!(ReplacementValue::classify(""), ReplacementValue::Empty);
    /// ```
    pub fn classify(text: &str) -> ReplacementValue {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return ReplacementValue::Empty;
        }
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Number(n)) => n
                .as_f64()
                .map(ReplacementValue::Number)
                .unwrap_or_else(|| ReplacementValue::String(text.to_string())),
            Ok(serde_json::Value::String(s)) => ReplacementValue::String(s),
            Ok(serde_json::Value::Bool(b)) => ReplacementValue::Boolean(b),
            Ok(serde_json::Value::Null) => ReplacementValue::Null,
            Ok(json) => ReplacementValue::Json(json),
            Err(_) => ReplacementValue::String(text.to_string()),
        }
    }
}
