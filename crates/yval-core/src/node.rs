//! # Generic Parse Node
//!
//! The document builder and the schema compiler both consume YAML through
//! one small interface: a tree of [`Node`]s, each with a structural kind,
//! a tag, its literal text, its scalar style, a 1-based position and its
//! ordered children.
//!
//! Mapping children are stored flattened as key/value pairs
//! (`[k0, v0, k1, v1, ...]`). Sequence children are the elements.
//!
//! [`Node::parse`] produces this tree from the `yaml-rust2` event stream of
//! the first document in the input:
//!
//! - explicit core tags are normalised to their `!!x` short form;
//! - quoted and block scalars without a tag are strings;
//! - untagged plain scalars are resolved by [`tag::resolve_plain`];
//! - aliases are replaced by a copy of the anchored node, positions
//!   included. Copies are capped relative to the size of the source, so a
//!   small document cannot expand into an unbounded tree;
//! - an empty value (`key:` or a bare `-`) has empty text and sits just
//!   past its `:` or `-`, not at the token that follows it.

use std::collections::HashMap;

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::error::ParseError;
use crate::tag::{self, TAG_MAP, TAG_SEQ, TAG_STR};

/// Nodes copied through aliases may always reach this count.
const ALIAS_COPY_FLOOR: usize = 10_000;

/// Beyond the floor, alias copies may not exceed this many times the
/// nodes written in the source.
const ALIAS_COPY_FACTOR: usize = 100;

/// Structural kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Scalar => "scalar",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        })
    }
}

/// How a scalar was written in the source. Collections are `Plain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    /// Block scalar introduced by `|`.
    Literal,
    /// Block scalar introduced by `>`.
    Folded,
}

impl ScalarStyle {
    /// Block scalars span several lines and end where their indentation
    /// block ends rather than where their text ends.
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Literal | Self::Folded)
    }
}

/// A node of the generic parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Resolved tag, e.g. `!!str`, `!!map`, or a custom tag.
    pub tag: String,
    /// Literal text for scalars, empty for collections.
    pub text: String,
    pub style: ScalarStyle,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    pub children: Vec<Node>,
}

impl Node {
    /// Parse the first document of `source`.
    ///
    /// Returns `Ok(None)` when the input holds no document at all.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Syntax`] for malformed YAML,
    /// [`ParseError::UnknownAlias`] for an alias with no matching anchor and
    /// [`ParseError::ExcessiveAliasing`] when aliases expand too far.
    pub fn parse(source: &str) -> Result<Option<Node>, ParseError> {
        Ok(Self::parse_with_extent(source)?.map(|(root, _)| root))
    }

    /// Parse the first document of `source`, also returning the last source
    /// line that document occupies.
    ///
    /// Lines after it belong to later documents of the stream.
    ///
    /// # Errors
    ///
    /// Same as [`Node::parse`].
    pub fn parse_with_extent(source: &str) -> Result<Option<(Node, usize)>, ParseError> {
        let mut receiver = NodeReceiver::new(source);
        let mut parser = Parser::new(source.chars());
        parser.load(&mut receiver, false)?;

        if let Some(err) = receiver.error {
            return Err(err);
        }
        let last_line = receiver
            .last_line
            .unwrap_or_else(|| source.lines().count());
        Ok(receiver.root.map(|root| (root, last_line)))
    }

    pub fn is_mapping(&self) -> bool {
        self.kind == NodeKind::Mapping
    }

    pub fn is_sequence(&self) -> bool {
        self.kind == NodeKind::Sequence
    }

    pub fn is_scalar(&self) -> bool {
        self.kind == NodeKind::Scalar
    }

    /// Key/value pairs of a mapping node, in source order.
    ///
    /// Empty for non-mapping nodes.
    pub fn pairs(&self) -> impl Iterator<Item = (&Node, &Node)> {
        let children: &[Node] = if self.is_mapping() {
            &self.children
        } else {
            &[]
        };
        children.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }

    /// Look up the value stored under a scalar key of a mapping node.
    ///
    /// Returns the key node together with the value node.
    pub fn get(&self, key: &str) -> Option<(&Node, &Node)> {
        self.pairs().find(|(k, _)| k.is_scalar() && k.text == key)
    }

    fn scalar(text: String, style: TScalarStyle, tag: Option<Tag>, mark: Marker) -> Node {
        let style = match style {
            TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
            TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
            TScalarStyle::Literal => ScalarStyle::Literal,
            TScalarStyle::Folded => ScalarStyle::Folded,
            _ => ScalarStyle::Plain,
        };
        let tag = match tag {
            Some(tag) => tag::normalize_tag(&tag.handle, &tag.suffix),
            None if style == ScalarStyle::Plain => tag::resolve_plain(&text).to_string(),
            None => TAG_STR.to_string(),
        };
        Node {
            kind: NodeKind::Scalar,
            tag,
            text,
            style,
            line: mark.line(),
            column: mark.col() + 1,
            children: Vec::new(),
        }
    }

    fn collection(kind: NodeKind, tag: Option<Tag>, mark: Marker) -> Node {
        let tag = match (tag, kind) {
            (Some(tag), _) => tag::normalize_tag(&tag.handle, &tag.suffix),
            (None, NodeKind::Sequence) => TAG_SEQ.to_string(),
            (None, _) => TAG_MAP.to_string(),
        };
        Node {
            kind,
            tag,
            text: String::new(),
            style: ScalarStyle::Plain,
            line: mark.line(),
            column: mark.col() + 1,
            children: Vec::new(),
        }
    }
}

/// A collection whose end event has not arrived yet.
#[derive(Debug)]
struct Open {
    node: Node,
    anchor: usize,
    /// Nodes in the subtree so far, alias copies included.
    size: usize,
}

/// Assembles nodes from parser events.
#[derive(Debug)]
struct NodeReceiver<'a> {
    lines: Vec<&'a str>,
    stack: Vec<Open>,
    /// Anchored nodes with their subtree sizes.
    anchors: HashMap<usize, (Node, usize)>,
    root: Option<Node>,
    /// Set once the first document has ended; later events are ignored.
    last_line: Option<usize>,
    written: usize,
    copied: usize,
    error: Option<ParseError>,
}

impl<'a> NodeReceiver<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().collect(),
            stack: Vec::new(),
            anchors: HashMap::new(),
            root: None,
            last_line: None,
            written: 0,
            copied: 0,
            error: None,
        }
    }

    fn complete(&mut self, node: Node, size: usize, anchor: usize) {
        if anchor > 0 {
            self.anchors.insert(anchor, (node.clone(), size));
        }
        match self.stack.last_mut() {
            Some(parent) => {
                parent.size += size;
                parent.node.children.push(node);
            }
            None => {
                if self.root.is_none() {
                    self.root = Some(node);
                }
            }
        }
    }

    fn alias(&mut self, id: usize, mark: Marker) -> Result<(), ParseError> {
        let (line, column) = (mark.line(), mark.col() + 1);
        let size = match self.anchors.get(&id) {
            Some((_, size)) => *size,
            None => return Err(ParseError::UnknownAlias { line, column }),
        };
        self.copied += size;
        let limit = ALIAS_COPY_FLOOR.max(self.written.saturating_mul(ALIAS_COPY_FACTOR));
        if self.copied > limit {
            return Err(ParseError::ExcessiveAliasing { line, column });
        }
        if let Some((node, _)) = self.anchors.get(&id) {
            let node = node.clone();
            self.complete(node, size, 0);
        }
        Ok(())
    }

    fn source_line(&self, line: usize) -> &str {
        line.checked_sub(1)
            .and_then(|index| self.lines.get(index))
            .copied()
            .unwrap_or("")
    }

    /// The parser reports an empty value as a plain `~` located at the
    /// token that follows it. A written `~` is located at itself.
    fn is_empty_value(&self, node: &Node, mark: Marker) -> bool {
        if node.style != ScalarStyle::Plain {
            return false;
        }
        let written = self.source_line(mark.line()).chars().nth(mark.col());
        node.text.is_empty() || (node.text == "~" && written != Some('~'))
    }

    /// Position just past the `:` of the pending key, or the `-` of the
    /// pending sequence entry, when it lies before `line:column`.
    fn empty_value_position(&self, line: usize, column: usize) -> Option<(usize, usize)> {
        let parent = &self.stack.last()?.node;
        let position = match parent.kind {
            NodeKind::Mapping if parent.children.len() % 2 == 1 => {
                let key = parent.children.last().filter(|key| key.is_scalar())?;
                let mut width = key.text.chars().count();
                if matches!(key.style, ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted) {
                    width += 2;
                }
                let after_key = key.column + width;
                let colon = self
                    .source_line(key.line)
                    .chars()
                    .skip(after_key - 1)
                    .position(|c| c == ':')?;
                (key.line, after_key + colon + 1)
            }
            NodeKind::Sequence => {
                let first = parent.children.last().map_or(parent.line, |last| last.line);
                let entry = (first..=line).rev().find(|&candidate| {
                    let mut chars = self.source_line(candidate).chars().skip(parent.column - 1);
                    let is_entry = chars.next() == Some('-')
                        && chars.next().map_or(true, char::is_whitespace);
                    is_entry && (candidate, parent.column) < (line, column)
                })?;
                (entry, parent.column + 1)
            }
            _ => return None,
        };
        (position < (line, column)).then_some(position)
    }
}

impl MarkedEventReceiver for NodeReceiver<'_> {
    fn on_event(&mut self, event: Event, mark: Marker) {
        if self.error.is_some() || self.last_line.is_some() {
            return;
        }
        match event {
            Event::Scalar(text, style, anchor, tag) => {
                self.written += 1;
                let mut node = Node::scalar(text, style, tag, mark);
                if self.is_empty_value(&node, mark) {
                    node.text.clear();
                    if let Some((line, column)) = self.empty_value_position(node.line, node.column)
                    {
                        node.line = line;
                        node.column = column;
                    }
                }
                self.complete(node, 1, anchor);
            }
            Event::SequenceStart(anchor, tag) => {
                self.written += 1;
                self.stack.push(Open {
                    node: Node::collection(NodeKind::Sequence, tag, mark),
                    anchor,
                    size: 1,
                });
            }
            Event::MappingStart(anchor, tag) => {
                self.written += 1;
                self.stack.push(Open {
                    node: Node::collection(NodeKind::Mapping, tag, mark),
                    anchor,
                    size: 1,
                });
            }
            Event::SequenceEnd | Event::MappingEnd => {
                if let Some(open) = self.stack.pop() {
                    self.complete(open.node, open.size, open.anchor);
                }
            }
            Event::Alias(id) => {
                if let Err(err) = self.alias(id, mark) {
                    self.error = Some(err);
                }
            }
            // The end marker sits on the token after the document: `...`,
            // the next `---`, or the end of input.
            Event::DocumentEnd => {
                let line = mark.line();
                self.last_line = Some(if mark.col() == 0 {
                    line.saturating_sub(1)
                } else {
                    line
                });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Node {
        Node::parse(source).unwrap().unwrap()
    }

    #[test]
    fn test_empty_stream_has_no_root() {
        assert!(Node::parse("").unwrap().is_none());
        assert!(Node::parse("# only a comment\n").unwrap().is_none());
    }

    #[test]
    fn test_mapping_children_are_flattened_pairs() {
        let root = parse("a: 1\nb: two\n");
        assert_eq!(root.kind, NodeKind::Mapping);
        assert_eq!(root.tag, "!!map");
        assert_eq!(root.children.len(), 4);

        let pairs: Vec<_> = root.pairs().map(|(k, v)| (k.text.as_str(), v.text.as_str())).collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "two")]);
    }

    #[test]
    fn test_positions_are_one_based() {
        let root = parse("name: value\nlist:\n  - x\n");
        let (key, value) = root.get("name").unwrap();
        assert_eq!((key.line, key.column), (1, 1));
        assert_eq!((value.line, value.column), (1, 7));

        let (_, list) = root.get("list").unwrap();
        assert_eq!(list.kind, NodeKind::Sequence);
        assert_eq!((list.children[0].line, list.children[0].column), (3, 5));
    }

    #[test]
    fn test_scalar_tags_and_styles() {
        let root = parse("a: 1\nb: '1'\nc: \"x\"\nd: 1.5\ne: true\nf: ~\ng: yes\nh: |\n  block\n");
        let tag_of = |key: &str| root.get(key).unwrap().1.tag.clone();
        assert_eq!(tag_of("a"), "!!int");
        assert_eq!(tag_of("b"), "!!str");
        assert_eq!(tag_of("c"), "!!str");
        assert_eq!(tag_of("d"), "!!float");
        assert_eq!(tag_of("e"), "!!bool");
        assert_eq!(tag_of("f"), "!!null");
        assert_eq!(tag_of("g"), "!!str");
        assert_eq!(tag_of("h"), "!!str");

        assert_eq!(root.get("b").unwrap().1.style, ScalarStyle::SingleQuoted);
        assert_eq!(root.get("c").unwrap().1.style, ScalarStyle::DoubleQuoted);
        assert_eq!(root.get("h").unwrap().1.style, ScalarStyle::Literal);
    }

    #[test]
    fn test_explicit_tags_are_normalised() {
        let root = parse("a: !!str 12\nb: !!null ''\nc: !custom x\n");
        assert_eq!(root.get("a").unwrap().1.tag, "!!str");
        assert_eq!(root.get("b").unwrap().1.tag, "!!null");
        assert_eq!(root.get("c").unwrap().1.tag, "!custom");
    }

    #[test]
    fn test_alias_copies_anchored_node() {
        let root = parse("base: &b\n  x: 1\ncopy: *b\n");
        let (_, base) = root.get("base").unwrap();
        let (_, copy) = root.get("copy").unwrap();
        assert_eq!(base, copy);
    }

    /// Six levels of ten aliases each would copy over a million nodes.
    fn nested_aliases(levels: usize) -> String {
        let mut source = String::from("a0: &a0 [x, x, x, x, x, x, x, x, x, x]\n");
        for level in 1..=levels {
            let refs = vec![format!("*a{}", level - 1); 10].join(", ");
            source.push_str(&format!("a{level}: &a{level} [{refs}]\n"));
        }
        source
    }

    #[test]
    fn test_excessive_aliasing_is_rejected() {
        let source = nested_aliases(6);
        assert!(source.len() < 512);
        let err = Node::parse(&source).unwrap_err();
        assert!(matches!(err, ParseError::ExcessiveAliasing { .. }));
    }

    #[test]
    fn test_moderate_aliasing_is_accepted() {
        let root = parse(&nested_aliases(2));
        let (_, top) = root.get("a2").unwrap();
        assert_eq!(top.children.len(), 10);
        assert_eq!(top.children[9].children.len(), 10);

        let mut source = String::from("base: &b {x: 1, y: [1, 2, 3]}\n");
        for i in 0..200 {
            source.push_str(&format!("copy{i}: *b\n"));
        }
        assert_eq!(parse(&source).pairs().count(), 201);
    }

    #[test]
    fn test_empty_values_sit_after_their_indicator() {
        let root = parse("a:\nb: 1\n");
        let (_, a) = root.get("a").unwrap();
        assert_eq!(a.text, "");
        assert_eq!(a.tag, "!!null");
        assert_eq!((a.line, a.column), (1, 3));

        let root = parse("\"q\" :\nb: 1\n");
        let (_, q) = root.get("q").unwrap();
        assert_eq!((q.line, q.column), (1, 6));

        let root = parse("list:\n  - \n  - 2\n  -\n");
        let (_, list) = root.get("list").unwrap();
        assert_eq!((list.children[0].line, list.children[0].column), (2, 4));
        assert_eq!(list.children[0].text, "");
        assert_eq!((list.children[2].line, list.children[2].column), (4, 4));
    }

    #[test]
    fn test_written_tilde_keeps_its_position() {
        let root = parse("a: ~\nb: 1\n");
        let (_, a) = root.get("a").unwrap();
        assert_eq!(a.text, "~");
        assert_eq!((a.line, a.column), (1, 4));
    }

    #[test]
    fn test_extent_stops_at_first_document() {
        let (_, last) = Node::parse_with_extent("a: |\n  x\n---\nb: 2\nc: 3\n")
            .unwrap()
            .unwrap();
        assert_eq!(last, 2);

        let (_, last) = Node::parse_with_extent("a: 1\nb: 2\n").unwrap().unwrap();
        assert_eq!(last, 2);

        let (_, last) = Node::parse_with_extent("a: 1\n...\n# after\n").unwrap().unwrap();
        assert_eq!(last, 1);
    }

    #[test]
    fn test_malformed_yaml_is_rejected() {
        let err = Node::parse("a: [1, 2\n").unwrap_err();
        assert!(matches!(err, ParseError::Syntax(_)));
    }

    #[test]
    fn test_get_ignores_non_mappings() {
        let root = parse("- a\n- b\n");
        assert!(root.get("a").is_none());
        assert_eq!(root.pairs().count(), 0);
    }
}
