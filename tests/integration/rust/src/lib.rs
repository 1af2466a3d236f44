//! Integration test suite for the Corten JavaScript minifier
//!
//! This crate provides integration tests that verify the parser and the
//! minifier work together correctly across component boundaries.

/// Re-export components for test convenience
pub mod components {
    pub use core_types;
    pub use minifier;
    pub use parser;
}

use minifier::{Compilation, Output};
use parser::CodeSettings;

/// Runs the whole pipeline over one source with the given settings.
pub fn run(settings: &CodeSettings, source: &str) -> Output {
    let mut compilation = Compilation::new(settings.clone()).expect("test settings are valid");
    compilation.add_source("input.js", source);
    compilation.minify();
    compilation.emit()
}

/// Parses and writes a source without transforms or renaming.
pub fn reprint(settings: &CodeSettings, source: &str) -> String {
    let parsed = parser::parse(source, settings);
    minifier::emit(&parsed.ast, &parsed.scopes, settings, &[parsed.root]).code
}
