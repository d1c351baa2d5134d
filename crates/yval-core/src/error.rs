//! # Error Types — Document Loading
//!
//! Errors raised while turning YAML bytes into a positioned field tree.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Document errors are fatal and carry no source location. They mean the
//!   input could not be read as a document at all, not that a document
//!   violates a schema.
//! - Validation diagnostics are not errors and never appear here.

use thiserror::Error;

/// Error loading a YAML document into a [`Field`](crate::Field) tree.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The input bytes are not valid UTF-8.
    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The YAML parser rejected the input.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The input contains no document.
    #[error("document must have at least one field")]
    Empty,

    /// The root of the document is not a mapping.
    #[error("document root must be a mapping, found {found}")]
    NotMapping {
        /// Structural kind found at the root.
        found: String,
    },

    /// A node position could not be turned into a range.
    #[error("range error: {0}")]
    Range(#[from] RangeError),
}

/// Malformed YAML.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The scanner or parser rejected the input.
    #[error("invalid YAML: {0}")]
    Syntax(#[from] yaml_rust2::scanner::ScanError),

    /// An alias refers to an anchor that was never defined.
    #[error("unknown alias at line {line}, column {column}")]
    UnknownAlias {
        /// 1-based line of the alias.
        line: usize,
        /// 1-based column of the alias.
        column: usize,
    },

    /// Aliases copy far more nodes than the source writes out.
    #[error("excessive aliasing at line {line}, column {column}")]
    ExcessiveAliasing {
        /// 1-based line of the alias that crossed the limit.
        line: usize,
        /// 1-based column of that alias.
        column: usize,
    },
}

/// Error in the position algebra.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// A single [`Line`](crate::Line) cannot describe text with line breaks.
    #[error("text starting at line {line}, column {column} must not contain a line break")]
    MultiLine {
        /// 1-based line of the offending node.
        line: usize,
        /// 1-based column of the offending node.
        column: usize,
    },
}
