//! # Position Algebra — Source Lines and Ranges
//!
//! Every field of a parsed document and every diagnostic produced by the
//! validator is anchored to a [`Range`] in the source text. A
//! range is a pair of [`Line`]s: the first line the span touches and the
//! last one, each with the column interval occupied on that line.
//!
//! ## Invariants
//!
//! - `start.line <= end.line`.
//! - When a range sits on a single line, `start` and `end` carry the same
//!   widened column interval.
//! - [`Range::merge`] is commutative, associative and idempotent, so
//!   folding children in any order yields the smallest enclosing range.
//!
//! Lines and columns are 1-based. `column_end` is exclusive: it points one
//! past the last character of the span.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::RangeError;
use crate::node::{Node, ScalarStyle};

/// The column interval a span occupies on one source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    /// 1-based line number.
    pub line: usize,
    /// 1-based first column.
    pub column_start: usize,
    /// Exclusive end column.
    pub column_end: usize,
}

impl Line {
    /// Create a line span.
    pub fn new(line: usize, column_start: usize, column_end: usize) -> Self {
        Self {
            line,
            column_start,
            column_end,
        }
    }

    /// Compute the span a single-line node occupies.
    ///
    /// The span starts at the node's column and covers its text. Quoted
    /// scalars get two extra columns for the surrounding quotes.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::MultiLine`] if the node text contains a line
    /// break. Multi-line scalars must be described by a [`Range`] spanning
    /// several lines instead.
    pub fn from_node(node: &Node) -> Result<Self, RangeError> {
        if node.text.contains('\n') {
            return Err(RangeError::MultiLine {
                line: node.line,
                column: node.column,
            });
        }

        let mut width = node.text.chars().count();
        if matches!(
            node.style,
            ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted
        ) {
            width += 2;
        }

        Ok(Self::new(node.line, node.column, node.column + width))
    }

    /// Widen two spans of the same line into one.
    fn widen(&self, other: &Line) -> Line {
        Line::new(
            self.line,
            self.column_start.min(other.column_start),
            self.column_end.max(other.column_end),
        )
    }
}

/// A span of source text bounded by a start and an end [`Line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// First line touched by the span.
    pub start: Line,
    /// Last line touched by the span.
    pub end: Line,
}

/// Flat editor-style view of a [`Range`].
///
/// Maps directly onto the diagnostic ranges of editor and linter protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Range {
    /// Build a range from two lines in any order.
    ///
    /// The line with the smaller line number becomes the start. Two lines
    /// with the same number collapse into one widened line used as both
    /// start and end.
    pub fn new(l1: Line, l2: Line) -> Self {
        match l1.line.cmp(&l2.line) {
            Ordering::Less => Self { start: l1, end: l2 },
            Ordering::Greater => Self { start: l2, end: l1 },
            Ordering::Equal => {
                let line = l1.widen(&l2);
                Self {
                    start: line,
                    end: line,
                }
            }
        }
    }

    /// A range covering a single line.
    pub fn single(line: Line) -> Self {
        Self::new(line, line)
    }

    /// Return the smallest range enclosing both `self` and `other`.
    ///
    /// Endpoints are compared by line number; endpoints on the same line
    /// are widened to the union of their column intervals.
    pub fn merge(&self, other: &Range) -> Range {
        let start = match self.start.line.cmp(&other.start.line) {
            Ordering::Less => self.start,
            Ordering::Greater => other.start,
            Ordering::Equal => self.start.widen(&other.start),
        };
        let end = match self.end.line.cmp(&other.end.line) {
            Ordering::Less => other.end,
            Ordering::Greater => self.end,
            Ordering::Equal => self.end.widen(&other.end),
        };
        Range { start, end }
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Range) -> bool {
        self.merge(other) == *self
    }

    /// Whether the range sits on one line.
    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    /// Flatten into start/end line and column coordinates.
    pub fn span(&self) -> Span {
        Span {
            start_line: self.start.line,
            start_column: self.start.column_start,
            end_line: self.end.line,
            end_column: self.end.column_end,
        }
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let span = self.span();
        write!(
            f,
            "{}:{}-{}:{}",
            span.start_line, span.start_column, span.end_line, span.end_column
        )
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn line() -> impl Strategy<Value = Line> {
        (1usize..20, 1usize..40, 0usize..20)
            .prop_map(|(line, start, width)| Line::new(line, start, start + width))
    }

    /// Normalized ranges, as produced by `Range::new`.
    fn range() -> impl Strategy<Value = Range> {
        (line(), line()).prop_map(|(a, b)| Range::new(a, b))
    }

    proptest! {
        #[test]
        fn merge_is_idempotent(r in range()) {
            prop_assert_eq!(r.merge(&r), r);
        }

        #[test]
        fn merge_is_commutative(a in range(), b in range()) {
            prop_assert_eq!(a.merge(&b), b.merge(&a));
        }

        #[test]
        fn merge_is_associative(a in range(), b in range(), c in range()) {
            prop_assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
        }

        #[test]
        fn merge_encloses_both_operands(a in range(), b in range()) {
            let m = a.merge(&b);
            prop_assert!(m.contains(&a));
            prop_assert!(m.contains(&b));
            prop_assert!(m.start.line <= m.end.line);
        }
    }
}
