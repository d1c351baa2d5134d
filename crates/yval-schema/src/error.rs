//! # Error Types — Schema Compilation
//!
//! Every variant names the dotted rule path where compilation stopped.
//! Compilation is fail-fast: the first error aborts it and no partial rule
//! tree is returned.

use thiserror::Error;
use yval_core::DocumentError;

/// Error compiling a schema document into a rule tree.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema bytes could not be read as a YAML mapping.
    #[error("schema document error: {0}")]
    Document(#[from] DocumentError),

    /// A rule node is not a mapping.
    #[error("value node must be map : [{path}]")]
    NotMapping {
        /// Dotted path of the rule.
        path: String,
    },

    /// A rule node does not declare `$type`.
    #[error("type not found : [{path}]")]
    TypeNotFound {
        /// Dotted path of the rule.
        path: String,
    },

    /// `$type` names no known rule type.
    #[error("unknown type [{found}] for [{path}]")]
    UnknownType {
        /// Dotted path of the rule.
        path: String,
        /// The declared type.
        found: String,
    },

    /// `$type` names a reserved, unimplemented rule type.
    #[error("type [{found}] for [{path}] is reserved and not supported")]
    ReservedType {
        /// Dotted path of the rule.
        path: String,
        /// The declared type.
        found: String,
    },

    /// A constraint value has the wrong YAML node type.
    #[error("the type of [{path}] must be [{expected}]")]
    ConstraintType {
        /// Dotted path of the constraint.
        path: String,
        /// Tag the constraint value must carry.
        expected: String,
    },

    /// An enumeration literal does not carry the rule's own tag.
    #[error("the type of [{path}] must be [{expected}], the type of the rule")]
    OfType {
        /// Dotted path of the literal (`rule.index`).
        path: String,
        /// Type name of the rule.
        expected: String,
    },

    /// An `$arr` rule declares no `$constraint`.
    #[error("constraint not found : [{path}]")]
    MissingConstraint {
        /// Dotted path of the array rule.
        path: String,
    },

    /// A constraint is present but its value is not acceptable.
    #[error("invalid constraint [{path}]: {reason}")]
    InvalidConstraint {
        /// Dotted path of the constraint.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `$reg` or `$key-reg` pattern does not compile.
    #[error("regexp compile error : [{path}]: {source}")]
    InvalidRegex {
        /// Dotted path of the pattern.
        path: String,
        /// Underlying regex error.
        source: regex::Error,
    },
}

impl SchemaError {
    /// Dotted rule path the error refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Document(_) => None,
            Self::NotMapping { path }
            | Self::TypeNotFound { path }
            | Self::UnknownType { path, .. }
            | Self::ReservedType { path, .. }
            | Self::ConstraintType { path, .. }
            | Self::OfType { path, .. }
            | Self::MissingConstraint { path }
            | Self::InvalidConstraint { path, .. }
            | Self::InvalidRegex { path, .. } => Some(path),
        }
    }
}
