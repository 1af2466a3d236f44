//! JavaScript Minifier Component
//!
//! The back half of the pipeline: takes the syntax and scope trees built by
//! the `parser` crate, shrinks them with tree transforms and local renaming,
//! and writes the smallest equivalent source text.
//!
//! # Overview
//!
//! - [`Compilation`] - Shared trees for one or more chunks, driven phase by phase
//! - [`minify`] - One-call helper for a single source text
//! - [`passes`] - Transform passes gated by `TreeModifications` bits
//! - [`renamer`] - Short names for locals, manual rename pairs, labels
//! - [`Emitter`] - Minimal or pretty output, JSON output, source mappings
//!
//! # Example
//!
//! ```
//! use minifier::minify;
//! use parser::CodeSettings;
//!
//! let output = minify("function add(first, second) { return first + second; }", &CodeSettings::default()).unwrap();
//! assert_eq!(output.code, "function add(n,t){return n+t}");
//! assert!(!output.has_errors());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compilation;
pub mod emitter;
pub mod passes;
pub mod renamer;
pub mod source_map;
pub mod text;

pub use compilation::{minify, Chunk, Compilation, Output};
pub use emitter::{emit, EmitResult, Emitter};
pub use source_map::Mapping;
