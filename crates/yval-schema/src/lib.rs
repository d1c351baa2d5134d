//! # yval-schema — Schema Compiler & Validation Engine
//!
//! Compiles schemas written in a `$`-prefixed YAML constraint DSL into a
//! typed rule tree and validates positioned documents from `yval-core`
//! against it.
//!
//! ## Compilation (`compile`)
//!
//! [`compile_schema`] parses the schema bytes and compiles the root mapping
//! into an [`ObjRule`]. Errors are fail-fast and name the dotted path of
//! the offending rule; they describe a broken schema, not a document defect.
//!
//! ## Validation (`validate`)
//!
//! [`validate`] walks the rule tree and the document together and returns
//! every [`Violation`] it finds, each anchored on a source range. Missing
//! required keys stop the walk.
//!
//! ## Crate Policy
//!
//! - Depends only on `yval-core` internally.
//! - Compiled rules are immutable and may be shared across threads.
//! - Validation never fails: diagnostics are data, schema problems are
//!   [`SchemaError`]s raised before any document is seen.

pub mod compile;
pub mod error;
pub mod rule;
pub mod validate;
pub mod violation;

pub use compile::compile;
pub use error::SchemaError;
pub use rule::{ArrRule, ElementConstraint, ObjRule, Outline, Rule, ScalarRule, StrRule};
pub use validate::validate;
pub use violation::{Severity, Violation, ViolationKind};

use yval_core::{DocumentError, Node};

/// Compile a schema document.
///
/// # Errors
///
/// [`SchemaError::Document`] when the bytes are not a YAML mapping, or the
/// first compilation error found.
pub fn compile_schema(bytes: &[u8]) -> Result<ObjRule, SchemaError> {
    let source = std::str::from_utf8(bytes).map_err(DocumentError::from)?;
    let root = Node::parse(source)
        .map_err(DocumentError::from)?
        .ok_or(DocumentError::Empty)?;

    if !root.is_mapping() {
        return Err(DocumentError::NotMapping {
            found: root.kind.to_string(),
        }
        .into());
    }

    let rule = compile::compile_root(&root)?;
    tracing::debug!(rules = rule.len(), "schema compiled");
    Ok(rule)
}
