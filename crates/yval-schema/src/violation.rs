//! # Validation Diagnostics
//!
//! A [`Violation`] is one place where a document does not satisfy its
//! schema. Violations are data, not errors: validation always completes and
//! returns every violation it collected, in traversal order.

use std::fmt;

use serde::Serialize;
use yval_core::{Range, Span};

/// What kind of rule a document broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViolationKind {
    /// A required key is absent.
    KeyMissing,
    /// A value has the wrong type.
    TypeMismatch,
    /// A string is shorter or longer than allowed.
    StrLengthMismatch,
    /// A string does not match its pattern.
    RegexMismatch,
    /// A scalar is not one of the allowed literals.
    EnumMismatch,
}

impl ViolationKind {
    /// Structural violations are errors; value constraints are warnings.
    pub fn severity(&self) -> Severity {
        match self {
            Self::KeyMissing | Self::TypeMismatch => Severity::Error,
            Self::StrLengthMismatch | Self::RegexMismatch | Self::EnumMismatch => Severity::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyMissing => "keyMissing",
            Self::TypeMismatch => "typeMismatch",
            Self::StrLengthMismatch => "strLengthMismatch",
            Self::RegexMismatch => "regexMismatch",
            Self::EnumMismatch => "enumMismatch",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious a violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// One reported violation of a rule by a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    /// Dotted path of the field the rule applies to. Sequence elements
    /// appear as their index.
    pub path: String,
    /// Human-readable description.
    pub message: String,
    /// Source range to underline.
    pub range: Range,
}

impl Violation {
    pub(crate) fn new(kind: ViolationKind, path: String, message: String, range: Range) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            path,
            message,
            range,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Editor-style coordinates of [`Violation::range`].
    pub fn span(&self) -> Span {
        self.range.span()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}[{}] {}",
            self.range, self.severity, self.kind, self.message
        )
    }
}
