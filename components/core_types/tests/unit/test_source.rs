//! Unit tests for SourcePosition and SourceSpan

use core_types::{FileId, SourcePosition, SourceSpan};

fn span(start: usize, end: usize) -> SourceSpan {
    SourceSpan::new(
        SourcePosition::new(1, start as u32 + 1, start),
        SourcePosition::new(1, end as u32 + 1, end),
    )
}

#[cfg(test)]
mod position_tests {
    use super::*;

    #[test]
    fn test_default_position_is_first_character() {
        let pos = SourcePosition::default();
        assert_eq!((pos.line, pos.column, pos.offset), (1, 1, 0));
    }

    #[test]
    fn test_positions_order_by_line_then_column() {
        assert!(SourcePosition::new(1, 9, 8) < SourcePosition::new(2, 1, 10));
        assert!(SourcePosition::new(3, 2, 20) < SourcePosition::new(3, 5, 23));
    }
}

#[cfg(test)]
mod span_tests {
    use super::*;

    #[test]
    fn test_span_length() {
        assert_eq!(span(2, 7).len(), 5);
        assert!(span(4, 4).is_empty());
    }

    #[test]
    fn test_merge_covers_both() {
        let merged = span(5, 8).merge(&span(1, 3));
        assert_eq!(merged.start.offset, 1);
        assert_eq!(merged.end.offset, 8);
    }

    #[test]
    fn test_merge_across_files_keeps_self() {
        let mut other = span(0, 20);
        other.file = FileId(1);
        assert_eq!(span(5, 8).merge(&other), span(5, 8));
    }

    #[test]
    fn test_flatten() {
        let s = span(3, 9);
        assert_eq!(s.flatten_to_start().end, s.start);
        assert_eq!(s.flatten_to_end().start, s.end);
        assert!(s.flatten_to_end().is_empty());
    }
}
