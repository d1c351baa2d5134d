//! # Schema Compiler
//!
//! Turns the parse tree of a schema document into a [`Rule`] tree.
//!
//! ## Schema DSL
//!
//! Every rule node is a mapping. Keys starting with `$` are constraints;
//! inside an object rule every other key declares a child rule.
//!
//! | Key           | Applies to | Value                                         |
//! |---------------|------------|-----------------------------------------------|
//! | `$type`       | all        | `$obj $arr $str $int $float $bool $nil`        |
//! | `$optional`   | all        | `true`                                        |
//! | `$required`   | all        | `true` (the default, accepted for clarity)    |
//! | `$key-reg`    | `$obj`     | regex string                                  |
//! | `$constraint` | `$arr`     | `$bool $int $float $str` or a rule mapping     |
//! | `$of`         | scalars    | sequence of literals tagged like the rule     |
//! | `$length`     | `$str`     | mapping with `$min` and/or `$max` integers    |
//! | `$reg`        | `$str`     | regex string                                  |
//!
//! The document root is always an object rule and needs no `$type`.
//!
//! Compilation stops at the first error. Error paths are the dotted keys
//! leading from the root to the offending rule.

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use yval_core::tag::{TAG_BOOL, TAG_INT, TAG_MAP, TAG_SEQ, TAG_STR};
use yval_core::{Node, ValueType};

use crate::error::SchemaError;
use crate::rule::{ArrRule, ElementConstraint, ObjRule, Rule, ScalarRule, StrRule};

pub const KEY_TYPE: &str = "$type";
pub const KEY_REQUIRED: &str = "$required";
pub const KEY_OPTIONAL: &str = "$optional";
pub const KEY_KEY_REG: &str = "$key-reg";
pub const KEY_CONSTRAINT: &str = "$constraint";
pub const KEY_OF: &str = "$of";
pub const KEY_LENGTH: &str = "$length";
pub const KEY_MIN: &str = "$min";
pub const KEY_MAX: &str = "$max";
pub const KEY_REG: &str = "$reg";

/// Keys of an object rule that are constraints rather than child rules.
const OBJECT_CONSTRAINT_KEYS: [&str; 4] = [KEY_TYPE, KEY_REQUIRED, KEY_OPTIONAL, KEY_KEY_REG];

/// Declared types with no rule behind them yet.
const RESERVED_TYPES: [&str; 2] = ["$any", "$seq"];

/// Compile one schema node.
///
/// With `as_document_root` the node is compiled as the root object rule
/// and `$type` is not consulted.
///
/// # Errors
///
/// Returns the first [`SchemaError`] found, depth first in declaration
/// order.
pub fn compile(node: &Node, as_document_root: bool) -> Result<Rule, SchemaError> {
    if as_document_root {
        return compile_root(node).map(Rule::Obj);
    }
    compile_rule(node, "", "")
}

/// Compile the root node of a schema document.
pub(crate) fn compile_root(node: &Node) -> Result<ObjRule, SchemaError> {
    if !node.is_mapping() {
        return Err(SchemaError::NotMapping {
            path: label("").to_string(),
        });
    }
    let required = resolve_required(node, "")?;
    compile_object(node, "", "", required)
}

fn compile_rule(node: &Node, key: &str, path: &str) -> Result<Rule, SchemaError> {
    if !node.is_mapping() {
        return Err(SchemaError::NotMapping {
            path: label(path).to_string(),
        });
    }

    let (_, type_node) = node.get(KEY_TYPE).ok_or_else(|| SchemaError::TypeNotFound {
        path: label(path).to_string(),
    })?;
    let declared = declared_type(type_node, path)?;
    let required = resolve_required(node, path)?;

    let rule = match declared {
        ValueType::Obj => Rule::Obj(compile_object(node, key, path, required)?),
        ValueType::Arr => Rule::Arr(compile_array(node, key, path, required)?),
        ValueType::Str => Rule::Str(compile_string(node, key, path, required)?),
        ValueType::Int => Rule::Int(compile_scalar(node, key, path, required, ValueType::Int)?),
        ValueType::Float => {
            Rule::Float(compile_scalar(node, key, path, required, ValueType::Float)?)
        }
        ValueType::Bool => Rule::Bool(compile_scalar(node, key, path, required, ValueType::Bool)?),
        ValueType::Nil => Rule::Nil(compile_scalar(node, key, path, required, ValueType::Nil)?),
    };
    Ok(rule)
}

fn declared_type(type_node: &Node, path: &str) -> Result<ValueType, SchemaError> {
    let found = if type_node.is_scalar() {
        type_node.text.as_str()
    } else {
        return Err(SchemaError::UnknownType {
            path: label(path).to_string(),
            found: type_node.kind.to_string(),
        });
    };

    if RESERVED_TYPES.contains(&found) {
        return Err(SchemaError::ReservedType {
            path: label(path).to_string(),
            found: found.to_string(),
        });
    }
    ValueType::from_type_name(found).ok_or_else(|| SchemaError::UnknownType {
        path: label(path).to_string(),
        found: found.to_string(),
    })
}

/// `$optional: true` makes a rule optional. `$required: true` restates the
/// default. Any other value of either key is an error.
fn resolve_required(node: &Node, path: &str) -> Result<bool, SchemaError> {
    let optional = node.get(KEY_OPTIONAL);
    let required = node.get(KEY_REQUIRED);

    if let Some((_, value)) = required {
        expect_true(value, &join(path, KEY_REQUIRED))?;
    }
    match optional {
        Some((_, value)) => {
            let constraint_path = join(path, KEY_OPTIONAL);
            expect_true(value, &constraint_path)?;
            if required.is_some() {
                return Err(SchemaError::InvalidConstraint {
                    path: constraint_path,
                    reason: format!("{KEY_OPTIONAL} and {KEY_REQUIRED} cannot both be set"),
                });
            }
            Ok(false)
        }
        None => Ok(true),
    }
}

fn expect_true(value: &Node, path: &str) -> Result<(), SchemaError> {
    if !(value.is_scalar() && value.tag == TAG_BOOL) {
        return Err(SchemaError::ConstraintType {
            path: path.to_string(),
            expected: TAG_BOOL.to_string(),
        });
    }
    if !value.text.eq_ignore_ascii_case("true") {
        return Err(SchemaError::InvalidConstraint {
            path: path.to_string(),
            reason: "value must be true".to_string(),
        });
    }
    Ok(())
}

fn compile_object(
    node: &Node,
    key: &str,
    path: &str,
    required: bool,
) -> Result<ObjRule, SchemaError> {
    let mut rules = IndexMap::new();
    for (child_key, child_node) in node.pairs() {
        if OBJECT_CONSTRAINT_KEYS.contains(&child_key.text.as_str()) {
            continue;
        }
        let child_path = join(path, &child_key.text);
        let rule = compile_rule(child_node, &child_key.text, &child_path)?;
        rules.insert(child_key.text.clone(), rule);
    }

    let key_pattern = match node.get(KEY_KEY_REG) {
        Some((_, value)) => Some(compile_regex(value, &join(path, KEY_KEY_REG))?),
        None => None,
    };

    Ok(ObjRule {
        key: key.to_string(),
        required,
        key_pattern,
        rules,
    })
}

fn compile_array(
    node: &Node,
    key: &str,
    path: &str,
    required: bool,
) -> Result<ArrRule, SchemaError> {
    let (_, value) = node
        .get(KEY_CONSTRAINT)
        .ok_or_else(|| SchemaError::MissingConstraint {
            path: label(path).to_string(),
        })?;
    let constraint_path = join(path, KEY_CONSTRAINT);

    let constraint = if value.is_mapping() {
        let nested = if value.get(KEY_TYPE).is_some() {
            compile_rule(value, key, &constraint_path)?
        } else {
            let required = resolve_required(value, &constraint_path)?;
            Rule::Obj(compile_object(value, key, &constraint_path, required)?)
        };
        ElementConstraint::Nested(Box::new(nested))
    } else if value.is_scalar() && value.tag == TAG_STR {
        match ValueType::from_type_name(&value.text) {
            Some(ty @ (ValueType::Bool | ValueType::Int | ValueType::Float | ValueType::Str)) => {
                ElementConstraint::Scalar(ty)
            }
            _ => {
                return Err(SchemaError::InvalidConstraint {
                    path: constraint_path,
                    reason: format!(
                        "constraint should be one of [$bool $int $float $str], found [{}]",
                        value.text
                    ),
                })
            }
        }
    } else {
        return Err(SchemaError::InvalidConstraint {
            path: constraint_path,
            reason: "constraint must be a scalar type name or a rule mapping".to_string(),
        });
    };

    Ok(ArrRule {
        key: key.to_string(),
        required,
        constraint,
    })
}

fn compile_scalar(
    node: &Node,
    key: &str,
    path: &str,
    required: bool,
    ty: ValueType,
) -> Result<ScalarRule, SchemaError> {
    let mut of = IndexSet::new();
    if let Some((_, value)) = node.get(KEY_OF) {
        if !value.is_sequence() {
            return Err(SchemaError::ConstraintType {
                path: join(path, KEY_OF),
                expected: TAG_SEQ.to_string(),
            });
        }
        for (index, literal) in value.children.iter().enumerate() {
            if !literal.is_scalar() || literal.tag != ty.tag() {
                return Err(SchemaError::OfType {
                    path: join(path, &index.to_string()),
                    expected: ty.type_name().to_string(),
                });
            }
            of.insert(literal.text.clone());
        }
    }

    Ok(ScalarRule {
        key: key.to_string(),
        required,
        of,
    })
}

fn compile_string(
    node: &Node,
    key: &str,
    path: &str,
    required: bool,
) -> Result<StrRule, SchemaError> {
    let scalar = compile_scalar(node, key, path, required, ValueType::Str)?;

    let (mut min_length, mut max_length) = (None, None);
    if let Some((_, length)) = node.get(KEY_LENGTH) {
        let length_path = join(path, KEY_LENGTH);
        if !length.is_mapping() {
            return Err(SchemaError::ConstraintType {
                path: length_path,
                expected: TAG_MAP.to_string(),
            });
        }
        min_length = length_bound(length, KEY_MIN, &length_path)?;
        max_length = length_bound(length, KEY_MAX, &length_path)?;
    }

    let pattern = match node.get(KEY_REG) {
        Some((_, value)) => Some(compile_regex(value, &join(path, KEY_REG))?),
        None => None,
    };

    Ok(StrRule {
        scalar,
        min_length,
        max_length,
        pattern,
    })
}

fn length_bound(length: &Node, name: &str, path: &str) -> Result<Option<usize>, SchemaError> {
    let Some((_, value)) = length.get(name) else {
        return Ok(None);
    };
    let bound_path = join(path, name);
    if !(value.is_scalar() && value.tag == TAG_INT) {
        return Err(SchemaError::ConstraintType {
            path: bound_path,
            expected: TAG_INT.to_string(),
        });
    }
    parse_length(&value.text)
        .map(Some)
        .ok_or_else(|| SchemaError::InvalidConstraint {
            path: bound_path,
            reason: format!("[{}] is not a non-negative integer", value.text),
        })
}

/// Parse the text of an `!!int` scalar as a length.
fn parse_length(text: &str) -> Option<usize> {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let digits = digits.strip_prefix('+').unwrap_or(&digits);
    if digits.starts_with('-') {
        return None;
    }
    let (radix, body) = if let Some(hex) = digits.strip_prefix("0x") {
        (16, hex)
    } else if let Some(oct) = digits.strip_prefix("0o") {
        (8, oct)
    } else if let Some(bin) = digits.strip_prefix("0b") {
        (2, bin)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };
    usize::from_str_radix(body, radix).ok()
}

fn compile_regex(value: &Node, path: &str) -> Result<Regex, SchemaError> {
    if !(value.is_scalar() && value.tag == TAG_STR) {
        return Err(SchemaError::ConstraintType {
            path: path.to_string(),
            expected: TAG_STR.to_string(),
        });
    }
    Regex::new(&value.text).map_err(|source| SchemaError::InvalidRegex {
        path: path.to_string(),
        source,
    })
}

/// Dotted path of `key` under `parent`.
pub(crate) fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Display form of a path; the root has an empty path.
pub(crate) fn label(path: &str) -> &str {
    if path.is_empty() {
        "(root)"
    } else {
        path
    }
}
