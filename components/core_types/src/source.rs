//! Source position and span types.
//!
//! Positions are 1-based for lines and columns so they can be shown to users
//! verbatim; offsets are 0-based character offsets into the chunk.

use serde::Serialize;

/// Index of a source file name registered with the syntax tree.
///
/// Spans refer to files by index so they stay `Copy`; the names themselves
/// live in the tree that owns the spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize)]
pub struct FileId(pub u32);

/// Represents a position in source code.
///
/// # Examples
///
/// ```
/// use core_types::SourcePosition;
///
/// let pos = SourcePosition::new(10, 5, 150);
/// assert_eq!(pos.line, 10);
/// assert!(pos < SourcePosition::new(10, 6, 151));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourcePosition {
    /// Line number, 1-indexed
    pub line: u32,
    /// Column number, 1-indexed
    pub column: u32,
    /// Character offset from the start of the chunk
    pub offset: usize,
}

impl SourcePosition {
    /// Creates a position from its parts.
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

/// A range of source text, the `Context` of a token or syntax node.
///
/// # Examples
///
/// ```
/// use core_types::{SourcePosition, SourceSpan};
///
/// let a = SourceSpan::new(SourcePosition::new(1, 1, 0), SourcePosition::new(1, 4, 3));
/// let b = SourceSpan::new(SourcePosition::new(2, 1, 10), SourcePosition::new(2, 8, 17));
/// let merged = a.merge(&b);
/// assert_eq!(merged.start.line, 1);
/// assert_eq!(merged.end.line, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SourceSpan {
    /// File the span belongs to
    pub file: FileId,
    /// First character of the range
    pub start: SourcePosition,
    /// Position just past the last character of the range
    pub end: SourcePosition,
}

impl SourceSpan {
    /// Creates a span in the default file.
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self {
            file: FileId::default(),
            start,
            end,
        }
    }

    /// Returns the smallest span covering both `self` and `other`.
    ///
    /// Spans from different files keep `self`'s file and start.
    pub fn merge(&self, other: &SourceSpan) -> SourceSpan {
        if self.file != other.file {
            return *self;
        }
        SourceSpan {
            file: self.file,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Collapses the span to its starting point.
    pub fn flatten_to_start(&self) -> SourceSpan {
        SourceSpan {
            file: self.file,
            start: self.start,
            end: self.start,
        }
    }

    /// Collapses the span to its ending point.
    pub fn flatten_to_end(&self) -> SourceSpan {
        SourceSpan {
            file: self.file,
            start: self.end,
            end: self.end,
        }
    }

    /// Number of characters covered by the span.
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    /// Whether the span covers no characters.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_position_creation() {
        let pos = SourcePosition::new(10, 5, 150);
        assert_eq!(pos.line, 10);
        assert_eq!(pos.column, 5);
        assert_eq!(pos.offset, 150);
    }

    #[test]
    fn test_position_ordering_is_line_then_column() {
        assert!(SourcePosition::new(1, 80, 79) < SourcePosition::new(2, 1, 81));
        assert!(SourcePosition::new(3, 2, 40) < SourcePosition::new(3, 9, 47));
    }

    #[test]
    fn test_merge_ignores_other_files() {
        let a = SourceSpan::new(SourcePosition::new(1, 1, 0), SourcePosition::new(1, 2, 1));
        let mut b = SourceSpan::new(SourcePosition::new(5, 1, 40), SourcePosition::new(5, 9, 48));
        b.file = FileId(1);
        assert_eq!(a.merge(&b), a);
    }

    #[test]
    fn test_flatten() {
        let span = SourceSpan::new(SourcePosition::new(2, 3, 12), SourcePosition::new(2, 9, 18));
        assert!(span.flatten_to_start().is_empty());
        assert_eq!(span.flatten_to_end().start.column, 9);
        assert_eq!(span.len(), 6);
    }
}
