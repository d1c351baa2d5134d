//! # yval-core — Positioned YAML Documents
//!
//! Turns YAML text into a tree of [`Field`]s where every node knows its
//! semantic [`ValueType`], its raw tag and the [`Range`] of source text it
//! covers. The schema crate validates these trees and anchors its
//! diagnostics on the ranges.
//!
//! ## Layers
//!
//! 1. [`node`] adapts the `yaml-rust2` event parser into a generic
//!    [`Node`] tree with 1-based positions and resolved tags.
//! 2. [`tag`] holds the fixed tag table and the implicit resolvers.
//! 3. [`range`] is the position algebra: [`Line`], [`Range`], merging.
//! 4. [`field`] builds the [`Field`] tree and folds ranges bottom-up.
//!
//! [`parse_document`] runs all four on a byte buffer.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `yval-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Field trees are immutable once built.

pub mod error;
pub mod field;
pub mod node;
pub mod range;
pub mod tag;

pub use error::{DocumentError, ParseError, RangeError};
pub use field::{Field, FieldBuilder};
pub use node::{Node, NodeKind, ScalarStyle};
pub use range::{Line, Range, Span};
pub use tag::ValueType;

/// Parse a YAML document into a positioned field tree.
///
/// Only the first document of a multi-document stream is read.
///
/// # Errors
///
/// - [`DocumentError::Utf8`] if `bytes` is not UTF-8.
/// - [`DocumentError::Parse`] for malformed YAML.
/// - [`DocumentError::Empty`] if the stream holds no document, or only a
///   null root.
/// - [`DocumentError::NotMapping`] if the root is a sequence or a scalar.
pub fn parse_document(bytes: &[u8]) -> Result<Field, DocumentError> {
    let source = std::str::from_utf8(bytes)?;
    let (root, last_line) = Node::parse_with_extent(source)?.ok_or(DocumentError::Empty)?;

    if root.is_scalar() && root.tag == tag::TAG_NULL {
        return Err(DocumentError::Empty);
    }
    if !root.is_mapping() {
        return Err(DocumentError::NotMapping {
            found: root.kind.to_string(),
        });
    }

    let field = FieldBuilder::new(source)
        .with_last_line(last_line)
        .build(&root)?;
    tracing::debug!(fields = field.len(), range = %field.range(), "document built");
    Ok(field)
}
