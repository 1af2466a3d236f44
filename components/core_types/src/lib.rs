//! Shared source-location and diagnostic types for the minifier pipeline.
//!
//! Every tier of the pipeline (scanner, parser, analyzer, transforms and the
//! emitter) reports problems through the plain-data types in this crate. They
//! carry enough structure (code, severity, location) for a host to filter and
//! render them without looking at the syntax tree again.
//!
//! # Overview
//!
//! - [`SourcePosition`] - A line/column/offset point in a source chunk
//! - [`SourceSpan`] - A start/end range inside one source file
//! - [`Diagnostic`] - A reported problem with code, severity and location
//! - [`ErrorCode`] - The closed set of diagnostic codes
//! - [`UndefinedReference`] - A name that resolved to no declaration
//! - [`DiagnosticFilter`] - Severity threshold and ignore-list policy
//! - [`ConfigurationError`] - Invalid options rejected at the boundary
//!
//! # Examples
//!
//! ```
//! use core_types::{Diagnostic, ErrorCode, SourceSpan};
//!
//! let diagnostic = Diagnostic::new(
//!     ErrorCode::UndeclaredVariable,
//!     SourceSpan::default(),
//!     "'foo' is not declared",
//! );
//! assert_eq!(diagnostic.severity, ErrorCode::UndeclaredVariable.default_severity());
//! assert!(!diagnostic.is_error());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod diagnostic;
mod error;
mod source;

pub use diagnostic::{
    Diagnostic, DiagnosticCategory, DiagnosticFilter, ReferenceType, UndefinedReference,
};
pub use error::{ConfigurationError, ErrorCode};
pub use source::{FileId, SourcePosition, SourceSpan};
