//! # Validation Engine
//!
//! Walks a compiled [`ObjRule`] and a document [`Field`] tree in lockstep
//! and collects [`Violation`]s.
//!
//! ## Traversal
//!
//! - Child rules are visited in declaration order, depth first.
//! - A missing required key is reported once and halts the whole walk.
//!   Violations collected before the halt are kept.
//! - An object or array rule applied to a field of another kind reports a
//!   type mismatch and does not descend.
//! - Value constraints of a scalar rule (length, pattern, enumeration) are
//!   checked even after a type mismatch on the same scalar field. A
//!   mapping or sequence under a scalar rule only reports the mismatch.

use yval_core::{Field, NodeKind, ValueType};

use crate::compile::join;
use crate::rule::{ArrRule, ElementConstraint, ObjRule, Rule, ScalarRule, StrRule};
use crate::violation::{Violation, ViolationKind};

/// Validate `field` against `rule`.
///
/// Never fails; an empty result means the document conforms.
pub fn validate(rule: &ObjRule, field: &Field) -> Vec<Violation> {
    let mut walker = Walker::default();
    walker.walk_object(rule, field, "");
    tracing::debug!(
        violations = walker.violations.len(),
        halted = walker.halted,
        "validation finished"
    );
    walker.violations
}

#[derive(Debug, Default)]
struct Walker {
    violations: Vec<Violation>,
    halted: bool,
}

impl Walker {
    fn report(&mut self, kind: ViolationKind, path: &str, message: String, field: &Field) {
        self.violations
            .push(Violation::new(kind, path.to_string(), message, *field.range()));
    }

    fn walk_object(&mut self, rule: &ObjRule, field: &Field, path: &str) {
        for (index, child_rule) in rule.rules().enumerate() {
            if self.halted {
                return;
            }
            let key = child_rule.key();
            let child_path = join(path, key);

            match field.get(key) {
                Some(child) => self.check(child_rule, child, &child_path),
                None if child_rule.required() => {
                    let anchor = field
                        .nth(index)
                        .or_else(|| field.fields().last())
                        .unwrap_or(field);
                    self.report(
                        ViolationKind::KeyMissing,
                        &child_path,
                        format!("key [{key}] is expected here"),
                        anchor,
                    );
                    self.halted = true;
                    tracing::trace!(path = %child_path, "traversal halted on missing key");
                    return;
                }
                None => {}
            }
        }
    }

    fn check(&mut self, rule: &Rule, field: &Field, path: &str) {
        match rule {
            Rule::Obj(obj) => {
                if field.kind() == NodeKind::Mapping {
                    self.walk_object(obj, field, path);
                } else {
                    self.mismatch(ValueType::Obj, field, path);
                }
            }
            Rule::Arr(arr) => {
                if field.kind() == NodeKind::Sequence {
                    self.walk_array(arr, field, path);
                } else {
                    self.mismatch(ValueType::Arr, field, path);
                }
            }
            Rule::Str(str_rule) => {
                self.check_tag(ValueType::Str, field, path);
                if field.kind() == NodeKind::Scalar {
                    self.check_string(str_rule, field, path);
                    self.check_of(&str_rule.scalar, field, path);
                }
            }
            Rule::Int(scalar) => self.check_scalar(scalar, ValueType::Int, field, path),
            Rule::Float(scalar) => self.check_scalar(scalar, ValueType::Float, field, path),
            Rule::Bool(scalar) => self.check_scalar(scalar, ValueType::Bool, field, path),
            Rule::Nil(scalar) => self.check_scalar(scalar, ValueType::Nil, field, path),
        }
    }

    fn walk_array(&mut self, rule: &ArrRule, field: &Field, path: &str) {
        for element in field.fields() {
            if self.halted {
                return;
            }
            let element_path = join(path, element.key());
            match &rule.constraint {
                ElementConstraint::Scalar(ty) => {
                    if element.value_type() != *ty {
                        self.mismatch(*ty, element, &element_path);
                    }
                }
                ElementConstraint::Nested(nested) => self.check(nested, element, &element_path),
            }
        }
    }

    fn check_scalar(&mut self, rule: &ScalarRule, ty: ValueType, field: &Field, path: &str) {
        self.check_tag(ty, field, path);
        if field.kind() == NodeKind::Scalar {
            self.check_of(rule, field, path);
        }
    }

    /// Scalar rules compare the raw tag, so a custom-tagged scalar never
    /// satisfies a core type.
    fn check_tag(&mut self, ty: ValueType, field: &Field, path: &str) {
        if field.tag() != Some(ty.tag()) {
            self.mismatch(ty, field, path);
        }
    }

    fn mismatch(&mut self, ty: ValueType, field: &Field, path: &str) {
        self.report(
            ViolationKind::TypeMismatch,
            path,
            format!("type for [{path}] must be [{ty}]"),
            field,
        );
    }

    fn check_string(&mut self, rule: &StrRule, field: &Field, path: &str) {
        let length = field.text().chars().count();
        let min = rule.min_length.filter(|min| *min > 0);
        let max = rule.max_length.filter(|max| *max > 0);

        if let Some(min) = min.filter(|min| length < *min) {
            self.report(
                ViolationKind::StrLengthMismatch,
                path,
                format!("length of value in [{path}] must be at least {min}, found {length}"),
                field,
            );
        } else if let Some(max) = max.filter(|max| length > *max) {
            self.report(
                ViolationKind::StrLengthMismatch,
                path,
                format!("length of value in [{path}] must be at most {max}, found {length}"),
                field,
            );
        }

        if let Some(pattern) = &rule.pattern {
            if !pattern.is_match(field.text()) {
                self.report(
                    ViolationKind::RegexMismatch,
                    path,
                    format!(
                        "value for [{path}] must match regexp : {}",
                        pattern.as_str()
                    ),
                    field,
                );
            }
        }
    }

    fn check_of(&mut self, rule: &ScalarRule, field: &Field, path: &str) {
        if rule.of.is_empty() || rule.of.contains(field.text()) {
            return;
        }
        let allowed: Vec<&str> = rule.of.iter().map(String::as_str).collect();
        self.report(
            ViolationKind::EnumMismatch,
            path,
            format!(
                "value of [{path}] must be one of [{}]",
                allowed.join(", ")
            ),
            field,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile_schema;
    use yval_core::{parse_document, Line, Range};

    fn run(schema: &str, document: &str) -> Vec<Violation> {
        let rule = compile_schema(schema.as_bytes()).unwrap();
        let field = parse_document(document.as_bytes()).unwrap();
        validate(&rule, &field)
    }

    fn kinds(violations: &[Violation]) -> Vec<ViolationKind> {
        violations.iter().map(|v| v.kind).collect()
    }

    #[test]
    fn test_conforming_document_is_clean() {
        let violations = run(
            "name:\n  $type: $str\nage:\n  $type: $int\n",
            "name: Ada\nage: 36\n",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn test_missing_key_on_empty_document() {
        let violations = run("$type: $obj\nname:\n  $type: $str\n", "{}\n");
        assert_eq!(kinds(&violations), vec![ViolationKind::KeyMissing]);
        assert_eq!(violations[0].path, "name");
        assert_eq!(violations[0].message, "key [name] is expected here");
        assert_eq!(violations[0].range, Range::single(Line::new(1, 1, 1)));
    }

    #[test]
    fn test_missing_key_halts_traversal() {
        let violations = run(
            "a:\n  $type: $int\nb:\n  $type: $str\nc:\n  $type: $int\n",
            "a: x\nc: y\n",
        );
        assert_eq!(
            kinds(&violations),
            vec![ViolationKind::TypeMismatch, ViolationKind::KeyMissing]
        );
        assert_eq!(violations[1].path, "b");
    }

    #[test]
    fn test_missing_key_anchor_uses_sibling_at_same_position() {
        let violations = run(
            "a:\n  $type: $int\nb:\n  $type: $int\n",
            "a: 1\nz: 2\n",
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].range.start.line, 2);

        let violations = run(
            "a:\n  $type: $int\nb:\n  $type: $int\nc:\n  $type: $int\n",
            "a: 1\nb: 2\n",
        );
        assert_eq!(violations[0].path, "c");
        assert_eq!(violations[0].range.start.line, 2);
    }

    #[test]
    fn test_missing_optional_key_is_skipped() {
        let violations = run(
            "a:\n  $type: $int\n  $optional: true\nb:\n  $type: $int\n",
            "b: 1\n",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn test_type_mismatch_on_scalar() {
        let violations = run("age:\n  $type: $int\n", "age: \"not-a-number\"\n");
        assert_eq!(kinds(&violations), vec![ViolationKind::TypeMismatch]);
        assert_eq!(violations[0].path, "age");
        assert_eq!(violations[0].message, "type for [age] must be [$int]");
        assert_eq!(violations[0].range, Range::single(Line::new(1, 6, 20)));
    }

    #[test]
    fn test_each_scalar_type() {
        let schema = "s:\n  $type: $str\ni:\n  $type: $int\nf:\n  $type: $float\n\
                      b:\n  $type: $bool\nn:\n  $type: $nil\n";
        assert!(run(schema, "s: x\ni: 1\nf: 1.5\nb: false\nn: ~\n").is_empty());
        let violations = run(schema, "s: 1\ni: x\nf: 1\nb: yes\nn: 0\n");
        assert_eq!(violations.len(), 5);
        assert!(violations.iter().all(|v| v.kind == ViolationKind::TypeMismatch));
    }

    #[test]
    fn test_object_rule_on_scalar_does_not_descend() {
        let violations = run(
            "spec:\n  $type: $obj\n  name:\n    $type: $str\n",
            "spec: 3\n",
        );
        assert_eq!(kinds(&violations), vec![ViolationKind::TypeMismatch]);
        assert_eq!(violations[0].message, "type for [spec] must be [$obj]");
    }

    #[test]
    fn test_scalar_rule_on_collection_reports_only_the_type() {
        let schema = "name:\n  $type: $str\n  $length:\n    $min: 3\n  $reg: ^[a-z]+$\n  $of: [abc]\n";
        let violations = run(schema, "name:\n  first: a\n");
        assert_eq!(kinds(&violations), vec![ViolationKind::TypeMismatch]);
        assert_eq!(violations[0].message, "type for [name] must be [$str]");

        let violations = run(schema, "name: [a, b]\n");
        assert_eq!(kinds(&violations), vec![ViolationKind::TypeMismatch]);

        let violations = run("level:\n  $type: $int\n  $of: [1, 2]\n", "level: [1]\n");
        assert_eq!(kinds(&violations), vec![ViolationKind::TypeMismatch]);
    }

    #[test]
    fn test_empty_value_mismatch_points_at_its_key() {
        let violations = run("a:\n  $type: $int\nb:\n  $type: $int\n", "a:\nb: 1\n");
        assert_eq!(kinds(&violations), vec![ViolationKind::TypeMismatch]);
        assert_eq!(violations[0].path, "a");
        assert_eq!(violations[0].range, Range::single(Line::new(1, 3, 3)));
    }

    #[test]
    fn test_nested_object_paths() {
        let violations = run(
            "spec:\n  $type: $obj\n  replicas:\n    $type: $int\n",
            "spec:\n  replicas: many\n",
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "spec.replicas");
        assert_eq!(violations[0].range.start.line, 2);
    }

    #[test]
    fn test_string_length() {
        let schema = "id:\n  $type: $str\n  $length:\n    $min: 10\n    $max: 20\n";
        let short = run(schema, "id: abcde\n");
        assert_eq!(kinds(&short), vec![ViolationKind::StrLengthMismatch]);
        assert!(short[0].message.contains("at least 10"));

        let long = run(schema, &format!("id: {}\n", "a".repeat(25)));
        assert_eq!(kinds(&long), vec![ViolationKind::StrLengthMismatch]);
        assert!(long[0].message.contains("at most 20"));

        assert!(run(schema, &format!("id: {}\n", "a".repeat(15))).is_empty());
    }

    #[test]
    fn test_string_length_counts_characters() {
        let schema = "id:\n  $type: $str\n  $length:\n    $max: 3\n";
        assert!(run(schema, "id: héé\n").is_empty());
    }

    #[test]
    fn test_zero_bounds_are_disabled() {
        let schema = "id:\n  $type: $str\n  $length:\n    $min: 0\n    $max: 0\n";
        assert!(run(schema, "id: ''\n").is_empty());
        assert!(run(schema, "id: anything at all\n").is_empty());
    }

    #[test]
    fn test_regex_is_unanchored() {
        let schema = "id:\n  $type: $str\n  $reg: '[0-9]+'\n";
        assert!(run(schema, "id: abc123def\n").is_empty());
        let violations = run(schema, "id: abc\n");
        assert_eq!(kinds(&violations), vec![ViolationKind::RegexMismatch]);
        assert_eq!(violations[0].message, "value for [id] must match regexp : [0-9]+");
    }

    #[test]
    fn test_enumeration() {
        let schema = "level:\n  $type: $int\n  $of: [1, 2, 3]\n";
        assert!(run(schema, "level: 2\n").is_empty());
        let violations = run(schema, "level: 4\n");
        assert_eq!(kinds(&violations), vec![ViolationKind::EnumMismatch]);
        assert_eq!(violations[0].message, "value of [level] must be one of [1, 2, 3]");
    }

    #[test]
    fn test_enumeration_compares_text() {
        let schema = "mode:\n  $type: $str\n  $of: [fast, slow]\n";
        assert!(run(schema, "mode: fast\n").is_empty());
        assert_eq!(
            kinds(&run(schema, "mode: FAST\n")),
            vec![ViolationKind::EnumMismatch]
        );
    }

    #[test]
    fn test_string_checks_order() {
        let schema = "id:\n  $type: $str\n  $length:\n    $min: 5\n  $reg: '^x'\n  $of: [xxxxx]\n";
        let violations = run(schema, "id: 12\n");
        assert_eq!(
            kinds(&violations),
            vec![
                ViolationKind::TypeMismatch,
                ViolationKind::StrLengthMismatch,
                ViolationKind::RegexMismatch,
                ViolationKind::EnumMismatch,
            ]
        );
    }

    #[test]
    fn test_array_scalar_constraint() {
        let violations = run(
            "values:\n  $type: $arr\n  $constraint: $int\n",
            "values: [1, 2, \"x\"]\n",
        );
        assert_eq!(kinds(&violations), vec![ViolationKind::TypeMismatch]);
        assert_eq!(violations[0].path, "values.2");
        assert_eq!(violations[0].range, Range::single(Line::new(1, 16, 19)));
    }

    #[test]
    fn test_array_rule_on_mapping() {
        let violations = run(
            "values:\n  $type: $arr\n  $constraint: $int\n",
            "values:\n  a: 1\n",
        );
        assert_eq!(kinds(&violations), vec![ViolationKind::TypeMismatch]);
        assert_eq!(violations[0].message, "type for [values] must be [$arr]");
    }

    #[test]
    fn test_array_nested_object_constraint() {
        let schema = "items:\n  $type: $arr\n  $constraint:\n    name:\n      $type: $str\n    \
                      qty:\n      $type: $int\n";
        let document = "items:\n  - name: a\n    qty: 1\n  - name: b\n    qty: two\n  - 7\n";
        let violations = run(schema, document);
        assert_eq!(
            kinds(&violations),
            vec![ViolationKind::TypeMismatch, ViolationKind::TypeMismatch]
        );
        assert_eq!(violations[0].path, "items.1.qty");
        assert_eq!(violations[1].path, "items.2");
    }

    #[test]
    fn test_array_nested_scalar_rule() {
        let schema = "codes:\n  $type: $arr\n  $constraint:\n    $type: $str\n    $reg: '^[A-Z]+$'\n";
        let violations = run(schema, "codes: [AB, cd, EF]\n");
        assert_eq!(kinds(&violations), vec![ViolationKind::RegexMismatch]);
        assert_eq!(violations[0].path, "codes.1");
    }

    #[test]
    fn test_missing_key_inside_array_element_halts_remaining_elements() {
        let schema = "items:\n  $type: $arr\n  $constraint:\n    name:\n      $type: $str\n\
                      after:\n  $type: $int\n";
        let document = "items:\n  - other: 1\n  - name: 3\nafter: x\n";
        let violations = run(schema, document);
        assert_eq!(kinds(&violations), vec![ViolationKind::KeyMissing]);
        assert_eq!(violations[0].path, "items.0.name");
    }

    #[test]
    fn test_custom_tag_fails_core_type() {
        let violations = run("when:\n  $type: $str\n", "when: !date 2024-01-01\n");
        assert_eq!(kinds(&violations), vec![ViolationKind::TypeMismatch]);
    }

    #[test]
    fn test_object_rule_method_matches_function() {
        let rule = compile_schema(b"a:\n  $type: $int\n").unwrap();
        let field = parse_document(b"a: nope\n").unwrap();
        assert_eq!(rule.validate(&field), validate(&rule, &field));
    }
}
