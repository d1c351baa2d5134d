//! # Field Tree
//!
//! A [`Field`] is one node of a parsed YAML document: its key, its literal
//! text, its structural kind, its semantic [`ValueType`], its raw tag and
//! the [`Range`] it covers in the source.
//!
//! ## Invariants
//!
//! - Every field has exactly one value type.
//! - Mapping fields never carry a tag.
//! - A field's range encloses the ranges of all its descendants.
//! - Mapping children keep source order. Sequence elements are keyed by
//!   their zero-based index (`"0"`, `"1"`, ...).
//!
//! ## Multi-line scalars
//!
//! Block scalars (`|`, `>`) and flow scalars broken over several lines
//! cannot be measured from their text alone. Their range starts at the
//! scalar's own position and ends on the last non-blank, non-comment line
//! before the next node of the document: the next sibling, else the next
//! sibling of the nearest ancestor, else the end of the document. The end
//! column is one past the last character of that line.
//!
//! ## Empty values
//!
//! A `key:` or a bare `-` with nothing after it is a null field with empty
//! text and a zero-width range just past its `:` or `-`.

use indexmap::IndexMap;

use crate::error::DocumentError;
use crate::node::{Node, NodeKind, ScalarStyle};
use crate::range::{Line, Range};
use crate::tag::ValueType;

/// A node of the parsed document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: String,
    key_range: Option<Range>,
    text: String,
    kind: NodeKind,
    value_type: ValueType,
    tag: Option<String>,
    style: ScalarStyle,
    range: Range,
    children: IndexMap<String, Field>,
}

impl Field {
    /// The key this field is stored under in its parent.
    ///
    /// Empty for the document root.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Range of the key scalar, for fields that sit under a mapping key.
    pub fn key_range(&self) -> Option<&Range> {
        self.key_range.as_ref()
    }

    /// Literal scalar text. Empty for collections.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Raw tag of the value. `None` for mappings.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn style(&self) -> ScalarStyle {
        self.style
    }

    /// Span of the value, enclosing all descendants.
    pub fn range(&self) -> &Range {
        &self.range
    }

    /// Child stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.children.get(key)
    }

    /// Child at position `index` in source order.
    pub fn nth(&self, index: usize) -> Option<&Field> {
        self.children.get_index(index).map(|(_, field)| field)
    }

    /// Children in source order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = &Field> {
        self.children.values()
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Builds [`Field`] trees from parse nodes of one source text.
///
/// Holds the source lines so multi-line scalars can be measured.
#[derive(Debug)]
pub struct FieldBuilder<'a> {
    lines: Vec<&'a str>,
}

impl<'a> FieldBuilder<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().collect(),
        }
    }

    /// Ignore source lines after `last_line`, which belong to later
    /// documents of the stream.
    pub fn with_last_line(mut self, last_line: usize) -> Self {
        self.lines.truncate(last_line);
        self
    }

    /// Build the field tree rooted at `root`.
    ///
    /// # Errors
    ///
    /// Propagates range errors from the position algebra.
    pub fn build(&self, root: &Node) -> Result<Field, DocumentError> {
        self.build_field(root, String::new(), None, None)
    }

    fn build_field(
        &self,
        node: &Node,
        key: String,
        key_range: Option<Range>,
        next: Option<&Node>,
    ) -> Result<Field, DocumentError> {
        let mut range = self.node_range(node, next)?;
        let mut children = IndexMap::new();

        match node.kind {
            NodeKind::Mapping => {
                for (index, pair) in node.children.chunks_exact(2).enumerate() {
                    let (key_node, value_node) = (&pair[0], &pair[1]);
                    let sibling = node.children.get(index * 2 + 2).or(next);
                    let key_range = self.node_range(key_node, Some(value_node))?;
                    let child = self.build_field(
                        value_node,
                        key_node.text.clone(),
                        Some(key_range),
                        sibling,
                    )?;
                    range = range.merge(&key_range).merge(child.range());
                    children.insert(key_node.text.clone(), child);
                }
            }
            NodeKind::Sequence => {
                for (index, element) in node.children.iter().enumerate() {
                    let sibling = node.children.get(index + 1).or(next);
                    let child = self.build_field(element, index.to_string(), None, sibling)?;
                    range = range.merge(child.range());
                    children.insert(index.to_string(), child);
                }
            }
            NodeKind::Scalar => {}
        }

        let tag = match node.kind {
            NodeKind::Mapping => None,
            _ => Some(node.tag.clone()),
        };

        Ok(Field {
            key,
            key_range,
            text: node.text.clone(),
            kind: node.kind,
            value_type: ValueType::classify(&node.tag, node.kind),
            tag,
            style: node.style,
            range,
            children,
        })
    }

    /// Range of the node's own text, children excluded.
    fn node_range(&self, node: &Node, next: Option<&Node>) -> Result<Range, DocumentError> {
        if node.style.is_block() || node.text.contains('\n') || self.spills_over(node) {
            return Ok(self.multi_line_range(node, next));
        }
        Ok(Range::single(Line::from_node(node)?))
    }

    /// A folded flow scalar has no line break in its text but does not fit
    /// on its first source line.
    fn spills_over(&self, node: &Node) -> bool {
        let mut width = node.text.chars().count();
        if matches!(node.style, ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted) {
            width += 2;
        }
        node.column + width > self.line_end(node.line)
    }

    fn multi_line_range(&self, node: &Node, next: Option<&Node>) -> Range {
        let limit = match next {
            Some(next) if next.line > node.line => next.line - 1,
            Some(_) => node.line,
            None => self.lines.len().max(node.line),
        };

        let last = (node.line + 1..=limit)
            .rev()
            .find(|&line| self.is_content_line(line))
            .unwrap_or(node.line);

        let start = Line::new(node.line, node.column, self.line_end(node.line).max(node.column));
        let end = Line::new(last, self.line_indent(last), self.line_end(last));
        Range::new(start, end)
    }

    fn source_line(&self, line: usize) -> &str {
        line.checked_sub(1)
            .and_then(|index| self.lines.get(index))
            .copied()
            .unwrap_or("")
    }

    fn is_content_line(&self, line: usize) -> bool {
        let text = self.source_line(line).trim();
        !text.is_empty() && !text.starts_with('#')
    }

    /// First column after leading whitespace.
    fn line_indent(&self, line: usize) -> usize {
        let text = self.source_line(line);
        text.chars().take_while(|c| c.is_whitespace()).count() + 1
    }

    /// Column one past the last non-whitespace character.
    fn line_end(&self, line: usize) -> usize {
        self.source_line(line).trim_end().chars().count() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(source: &str) -> Field {
        let (root, last_line) = Node::parse_with_extent(source).unwrap().unwrap();
        FieldBuilder::new(source)
            .with_last_line(last_line)
            .build(&root)
            .unwrap()
    }

    #[test]
    fn test_scalar_fields() {
        let root = build("apiVersion: v1\nport: 8080\nratio: 0.5\nenabled: true\nnothing: ~\n");
        assert_eq!(root.len(), 5);
        assert_eq!(root.kind(), NodeKind::Mapping);
        assert_eq!(root.value_type(), ValueType::Obj);
        assert!(root.tag().is_none());

        let api = root.get("apiVersion").unwrap();
        assert_eq!(api.key(), "apiVersion");
        assert_eq!(api.text(), "v1");
        assert_eq!(api.kind(), NodeKind::Scalar);
        assert_eq!(api.value_type(), ValueType::Str);
        assert_eq!(api.tag(), Some("!!str"));

        assert_eq!(root.get("port").unwrap().value_type(), ValueType::Int);
        assert_eq!(root.get("ratio").unwrap().value_type(), ValueType::Float);
        assert_eq!(root.get("enabled").unwrap().value_type(), ValueType::Bool);

        let nothing = root.get("nothing").unwrap();
        assert_eq!(nothing.kind(), NodeKind::Scalar);
        assert_eq!(nothing.value_type(), ValueType::Nil);
    }

    #[test]
    fn test_absent_key_is_none() {
        let root = build("a: 1\n");
        assert!(root.get("b").is_none());
    }

    #[test]
    fn test_mapping_children_keep_source_order() {
        let root = build("zeta: 1\nalpha: 2\nmid: 3\n");
        let keys: Vec<&str> = root.fields().map(|f| f.key()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(root.nth(1).unwrap().key(), "alpha");
    }

    #[test]
    fn test_sequence_children_are_indexed() {
        let root = build("list:\n  - a\n  - b\n  - c\n");
        let list = root.get("list").unwrap();
        assert_eq!(list.value_type(), ValueType::Arr);
        assert_eq!(list.tag(), Some("!!seq"));
        let keys: Vec<&str> = list.fields().map(|f| f.key()).collect();
        assert_eq!(keys, vec!["0", "1", "2"]);
        assert_eq!(list.get("2").unwrap().text(), "c");
        assert!(list.get("2").unwrap().key_range().is_none());
    }

    #[test]
    fn test_empty_mapping_has_no_children() {
        let root = build("{}\n");
        assert!(root.is_empty());
        assert_eq!(root.kind(), NodeKind::Mapping);
    }

    #[test]
    fn test_scalar_range_and_key_range() {
        let root = build("name: 'quoted'\n");
        let name = root.get("name").unwrap();
        assert_eq!(name.range(), &Range::single(Line::new(1, 7, 15)));
        assert_eq!(name.key_range(), Some(&Range::single(Line::new(1, 1, 5))));
        assert_eq!(root.range(), &Range::single(Line::new(1, 1, 15)));
    }

    #[test]
    fn test_nested_range_folds_children() {
        let source = "outer:\n  inner: value\n  list:\n    - 1\n    - 22\n";
        let root = build(source);
        let outer = root.get("outer").unwrap();
        assert_eq!(outer.range().start, Line::new(2, 3, 15));
        assert_eq!(outer.range().end, Line::new(5, 7, 9));
        assert!(root.range().contains(outer.range()));
        let list = outer.get("list").unwrap();
        assert!(outer.range().contains(list.range()));
    }

    #[test]
    fn test_literal_block_ends_before_next_sibling() {
        let source = "script: |\n  echo one\n  echo two\n\n# trailing comment\nnext: 1\n";
        let root = build(source);
        let script = root.get("script").unwrap();
        assert_eq!(script.style(), ScalarStyle::Literal);
        assert_eq!(script.range().start, Line::new(1, 9, 10));
        assert_eq!(script.range().end, Line::new(3, 3, 11));
    }

    #[test]
    fn test_folded_block_at_end_of_document() {
        let source = "outer:\n  text: >\n    folded\n    lines here\n";
        let root = build(source);
        let text = root.get("outer").unwrap().get("text").unwrap();
        assert_eq!(text.style(), ScalarStyle::Folded);
        assert_eq!(text.range().end, Line::new(4, 5, 15));
        assert!(root.range().contains(text.range()));
    }

    #[test]
    fn test_multi_line_plain_scalar() {
        let source = "a: first\n  second\nb: x\n";
        let root = build(source);
        let a = root.get("a").unwrap();
        assert_eq!(a.text(), "first second");
        assert_eq!(a.range().start.line, 1);
        assert_eq!(a.range().end, Line::new(2, 3, 9));
    }

    #[test]
    fn test_empty_value_is_anchored_at_its_key() {
        let root = build("a:\nb: 1\n");
        let a = root.get("a").unwrap();
        assert_eq!(a.text(), "");
        assert_eq!(a.value_type(), ValueType::Nil);
        assert_eq!(a.range(), &Range::single(Line::new(1, 3, 3)));
        assert_eq!(a.key_range(), Some(&Range::single(Line::new(1, 1, 2))));
        assert_eq!(root.get("b").unwrap().range(), &Range::single(Line::new(2, 4, 5)));
    }

    #[test]
    fn test_empty_sequence_item_is_anchored_at_its_entry() {
        let root = build("list:\n  - \n  - 2\n");
        let list = root.get("list").unwrap();
        let empty = list.get("0").unwrap();
        assert_eq!(empty.value_type(), ValueType::Nil);
        assert_eq!(empty.range(), &Range::single(Line::new(2, 4, 4)));
        assert_eq!(list.get("1").unwrap().range(), &Range::single(Line::new(3, 5, 6)));
        assert!(list.range().contains(empty.range()));
    }

    #[test]
    fn test_empty_value_at_end_of_input() {
        let root = build("a: 1\nb:\n");
        let b = root.get("b").unwrap();
        assert_eq!(b.range(), &Range::single(Line::new(2, 3, 3)));
        assert_eq!(root.range().end.line, 2);
    }

    #[test]
    fn test_block_scalar_ends_with_its_document() {
        let root = build("a: |\n  x\n---\nb: 2\nc: 3\n");
        let a = root.get("a").unwrap();
        assert_eq!(a.range().end, Line::new(2, 3, 4));
        assert_eq!(root.range().end.line, 2);
        assert!(root.get("b").is_none());
    }

    #[test]
    fn test_block_scalar_before_document_end_marker() {
        let root = build("a: >\n  folded\n\n...\n# trailing\n");
        let a = root.get("a").unwrap();
        assert_eq!(a.range().end, Line::new(2, 3, 9));
        assert_eq!(root.range().end.line, 2);
    }
}
