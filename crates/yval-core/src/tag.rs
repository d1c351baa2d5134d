//! # Tags and Value Types
//!
//! YAML nodes carry a tag (`!!str`, `!!int`, ...) either written explicitly
//! or resolved implicitly from the shape of a plain scalar. The field tree
//! classifies every node into one [`ValueType`] through a single tag table.
//!
//! The table is built once on first use and is read-only afterwards.
//!
//! Implicit resolution follows the YAML 1.2 core schema, with leading-zero
//! octal integers (`014`) accepted as integers. `yes`, `no`, `y` and `n`
//! are plain strings.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::node::NodeKind;

pub const TAG_STR: &str = "!!str";
pub const TAG_SEQ: &str = "!!seq";
pub const TAG_BOOL: &str = "!!bool";
pub const TAG_FLOAT: &str = "!!float";
pub const TAG_INT: &str = "!!int";
pub const TAG_MAP: &str = "!!map";
pub const TAG_NULL: &str = "!!null";

/// Semantic category of a field's value.
///
/// Independent of the structural [`NodeKind`]: `Nil`, `Bool`, `Int`,
/// `Float` and `Str` are all scalar nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Nil,
    Bool,
    Int,
    Float,
    Str,
    /// A mapping.
    Obj,
    /// A sequence.
    Arr,
}

/// Tag → value type. Populated on first access, never mutated.
static TAG_TABLE: Lazy<HashMap<&'static str, ValueType>> = Lazy::new(|| {
    HashMap::from([
        (TAG_SEQ, ValueType::Arr),
        (TAG_NULL, ValueType::Nil),
        (TAG_FLOAT, ValueType::Float),
        (TAG_INT, ValueType::Int),
        (TAG_STR, ValueType::Str),
        (TAG_MAP, ValueType::Obj),
        (TAG_BOOL, ValueType::Bool),
    ])
});

/// Implicit resolvers for plain scalars, tried in order.
static PLAIN_RESOLVERS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"^(?:~|null|Null|NULL|)$", TAG_NULL),
        (r"^(?:true|True|TRUE|false|False|FALSE)$", TAG_BOOL),
        (
            r"^[-+]?(?:0|[1-9][0-9_]*|0[0-7_]+|0o[0-7_]+|0x[0-9a-fA-F_]+|0b[01_]+)$",
            TAG_INT,
        ),
        (
            r"^(?:[-+]?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?)(?:[eE][-+]?[0-9]+)?|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$",
            TAG_FLOAT,
        ),
    ]
    .into_iter()
    .filter_map(|(pattern, tag)| Regex::new(pattern).ok().map(|regex| (regex, tag)))
    .collect()
});

impl ValueType {
    /// All value types.
    pub const ALL: [ValueType; 7] = [
        Self::Nil,
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::Str,
        Self::Obj,
        Self::Arr,
    ];

    /// Look up the value type for a tag, if the tag is a core tag.
    pub fn from_tag(tag: &str) -> Option<ValueType> {
        TAG_TABLE.get(tag).copied()
    }

    /// Classify a node: core tags through the table, anything else by the
    /// node's structural kind.
    pub fn classify(tag: &str, kind: NodeKind) -> ValueType {
        Self::from_tag(tag).unwrap_or(match kind {
            NodeKind::Mapping => ValueType::Obj,
            NodeKind::Sequence => ValueType::Arr,
            NodeKind::Scalar => ValueType::Str,
        })
    }

    /// The core tag carried by nodes of this type.
    pub fn tag(&self) -> &'static str {
        TAG_TABLE
            .iter()
            .find(|(_, ty)| *ty == self)
            .map(|(tag, _)| *tag)
            .unwrap_or(TAG_STR)
    }

    /// The schema DSL name of this type (`$int`, `$obj`, ...).
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "$nil",
            Self::Bool => "$bool",
            Self::Int => "$int",
            Self::Float => "$float",
            Self::Str => "$str",
            Self::Obj => "$obj",
            Self::Arr => "$arr",
        }
    }

    /// Parse a schema DSL type name.
    pub fn from_type_name(name: &str) -> Option<ValueType> {
        Self::ALL.into_iter().find(|ty| ty.type_name() == name)
    }

    /// Whether this is one of the leaf categories.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Obj | Self::Arr)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Resolve the tag of an untagged plain scalar from its text.
pub fn resolve_plain(text: &str) -> &'static str {
    PLAIN_RESOLVERS
        .iter()
        .find(|(regex, _)| regex.is_match(text))
        .map(|(_, tag)| *tag)
        .unwrap_or(TAG_STR)
}

/// Normalise an explicit tag to its short form.
///
/// `tag:yaml.org,2002:int` and `!!int` both become `!!int`; local and
/// custom tags are returned unchanged.
pub fn normalize_tag(handle: &str, suffix: &str) -> String {
    match handle {
        "!!" | "tag:yaml.org,2002:" => format!("!!{suffix}"),
        "" if suffix.starts_with("tag:yaml.org,2002:") => {
            format!("!!{}", &suffix["tag:yaml.org,2002:".len()..])
        }
        _ => format!("{handle}{suffix}"),
    }
}
