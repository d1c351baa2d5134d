//! # Rule Tree
//!
//! A compiled schema is a tree of [`Rule`]s rooted at an [`ObjRule`]. The
//! variant set is closed: every consumer matches exhaustively, so adding a
//! rule type forces the compiler, the validator and the outline renderer
//! to handle it.
//!
//! ## Invariants
//!
//! - `required` is `true` unless the schema says `$optional: true`.
//! - Object rules carry no enumeration; scalar rules carry no children.
//! - An array rule has exactly one element constraint.
//! - Rules are immutable after compilation and `Send + Sync`.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use yval_core::{Field, ValueType};

use crate::violation::Violation;

/// A compiled schema rule.
#[derive(Debug, Clone)]
pub enum Rule {
    Obj(ObjRule),
    Arr(ArrRule),
    Str(StrRule),
    Int(ScalarRule),
    Float(ScalarRule),
    Bool(ScalarRule),
    Nil(ScalarRule),
}

impl Rule {
    /// Name of the field this rule applies to.
    pub fn key(&self) -> &str {
        match self {
            Self::Obj(rule) => &rule.key,
            Self::Arr(rule) => &rule.key,
            Self::Str(rule) => &rule.scalar.key,
            Self::Int(rule) | Self::Float(rule) | Self::Bool(rule) | Self::Nil(rule) => &rule.key,
        }
    }

    /// Whether the field must be present.
    pub fn required(&self) -> bool {
        match self {
            Self::Obj(rule) => rule.required,
            Self::Arr(rule) => rule.required,
            Self::Str(rule) => rule.scalar.required,
            Self::Int(rule) | Self::Float(rule) | Self::Bool(rule) | Self::Nil(rule) => {
                rule.required
            }
        }
    }

    /// The value type this rule expects.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Obj(_) => ValueType::Obj,
            Self::Arr(_) => ValueType::Arr,
            Self::Str(_) => ValueType::Str,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Bool(_) => ValueType::Bool,
            Self::Nil(_) => ValueType::Nil,
        }
    }

    /// Enumeration and scalar part of a scalar rule.
    pub fn scalar(&self) -> Option<&ScalarRule> {
        match self {
            Self::Obj(_) | Self::Arr(_) => None,
            Self::Str(rule) => Some(&rule.scalar),
            Self::Int(rule) | Self::Float(rule) | Self::Bool(rule) | Self::Nil(rule) => Some(rule),
        }
    }

    fn write_outline(&self, out: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        write!(out, "{pad}{}: {}", self.key(), self.value_type())?;
        if !self.required() {
            out.write_str(" (optional)")?;
        }
        match self {
            Self::Obj(rule) => {
                if let Some(pattern) = &rule.key_pattern {
                    write!(out, " keys /{}/", pattern.as_str())?;
                }
                writeln!(out)?;
                for child in rule.rules.values() {
                    child.write_outline(out, depth + 1)?;
                }
            }
            Self::Arr(rule) => match &rule.constraint {
                ElementConstraint::Scalar(ty) => writeln!(out, " of {ty}")?,
                ElementConstraint::Nested(nested) => {
                    out.write_str(" of\n")?;
                    nested.write_outline(out, depth + 1)?;
                }
            },
            Self::Str(rule) => {
                match (rule.min_length, rule.max_length) {
                    (None, None) => {}
                    (min, max) => write!(
                        out,
                        " length {}..{}",
                        min.map(|n| n.to_string()).unwrap_or_default(),
                        max.map(|n| n.to_string()).unwrap_or_default()
                    )?,
                }
                if let Some(pattern) = &rule.pattern {
                    write!(out, " matching /{}/", pattern.as_str())?;
                }
                rule.scalar.write_of(out)?;
                writeln!(out)?;
            }
            Self::Int(rule) | Self::Float(rule) | Self::Bool(rule) | Self::Nil(rule) => {
                rule.write_of(out)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

/// Rule for a mapping: child rules in declaration order.
#[derive(Debug, Clone)]
pub struct ObjRule {
    pub(crate) key: String,
    pub(crate) required: bool,
    pub(crate) key_pattern: Option<Regex>,
    pub(crate) rules: IndexMap<String, Rule>,
}

impl ObjRule {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn required(&self) -> bool {
        self.required
    }

    /// The `$key-reg` pattern, if declared.
    ///
    /// Exposed for callers; it does not restrict which keys are validated.
    pub fn key_pattern(&self) -> Option<&Regex> {
        self.key_pattern.as_ref()
    }

    /// Child rule declared under `name`.
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Child rules in declaration order.
    pub fn rules(&self) -> impl ExactSizeIterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validate a document against this rule.
    pub fn validate(&self, field: &Field) -> Vec<Violation> {
        crate::validate::validate(self, field)
    }

    /// Indented, one-line-per-rule rendering of the rule tree.
    pub fn outline(&self) -> Outline<'_> {
        Outline(self)
    }
}

/// Display adapter returned by [`ObjRule::outline`].
#[derive(Debug, Clone, Copy)]
pub struct Outline<'a>(&'a ObjRule);

impl fmt::Display for Outline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "(root): $obj")?;
        for child in self.0.rules.values() {
            child.write_outline(f, 1)?;
        }
        Ok(())
    }
}

/// What the elements of an array must be.
#[derive(Debug, Clone)]
pub enum ElementConstraint {
    /// Every element has this scalar value type.
    Scalar(ValueType),
    /// Every element satisfies this rule.
    Nested(Box<Rule>),
}

/// Rule for a sequence.
#[derive(Debug, Clone)]
pub struct ArrRule {
    pub(crate) key: String,
    pub(crate) required: bool,
    pub(crate) constraint: ElementConstraint,
}

impl ArrRule {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn constraint(&self) -> &ElementConstraint {
        &self.constraint
    }
}

/// Shared part of the leaf rules: key, presence and enumeration.
#[derive(Debug, Clone)]
pub struct ScalarRule {
    pub(crate) key: String,
    pub(crate) required: bool,
    pub(crate) of: IndexSet<String>,
}

impl ScalarRule {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn required(&self) -> bool {
        self.required
    }

    /// Allowed literal texts, in declaration order. Empty means any.
    pub fn of(&self) -> &IndexSet<String> {
        &self.of
    }

    fn write_of(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.of.is_empty() {
            let values: Vec<&str> = self.of.iter().map(String::as_str).collect();
            write!(out, " one of [{}]", values.join(", "))?;
        }
        Ok(())
    }
}

/// Rule for a string: the scalar part plus length bounds and a pattern.
#[derive(Debug, Clone)]
pub struct StrRule {
    pub(crate) scalar: ScalarRule,
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) pattern: Option<Regex>,
}

impl StrRule {
    pub fn scalar(&self) -> &ScalarRule {
        &self.scalar
    }

    /// Minimum character count. `None` and `Some(0)` both mean no bound.
    pub fn min_length(&self) -> Option<usize> {
        self.min_length
    }

    /// Maximum character count. `None` and `Some(0)` both mean no bound.
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }
}
