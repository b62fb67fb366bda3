//! Conversion from Tree-sitter trees into owned [`SyntaxNode`] trees.
//!
//! Tree-sitter records byte ranges rather than trivia, so the lowering pass
//! walks tokens in order and assigns every gap between two tokens to the
//! prefix of the later one. Extras (comments) are skipped as nodes, so their
//! text also lands in the following prefix.
//!
//! Source parsed with prepended context declarations is lowered with a
//! `floor` offset: no prefix reaches back across the floor, and the number
//! of top-level children that belong to the context is reported so callers
//! can drop them after type attribution.

use crate::tree::{SyntaxNode, is_separator_kind};

/// A lowered tree together with the count of leading context children.
#[derive(Debug)]
pub(crate) struct Lowered {
    pub(crate) root: SyntaxNode,
    pub(crate) context_children: usize,
}

/// Lowers a Tree-sitter tree.
pub(crate) fn lower(tree: &tree_sitter::Tree, source: &str, floor: usize) -> Lowered {
    let mut lowering = Lowering {
        source,
        last_end: 0,
        floor,
    };
    let root_node = tree.root_node();
    let context_children = count_context_children(root_node, floor);
    let lowered = lowering.node(root_node, None);
    let tail_start = lowering.gap_start(source.len());
    let trailing = source.get(tail_start..).unwrap_or_default();
    Lowered {
        root: lowered.with_trailing(trailing),
        context_children,
    }
}

fn count_context_children(root: tree_sitter::Node<'_>, floor: usize) -> usize {
    let mut cursor = root.walk();
    root.children(&mut cursor)
        .filter(|child| !child.is_extra() && child.start_byte() < floor)
        .count()
}

struct Lowering<'s> {
    source: &'s str,
    last_end: usize,
    floor: usize,
}

impl Lowering<'_> {
    fn node(&mut self, node: tree_sitter::Node<'_>, field: Option<&'static str>) -> SyntaxNode {
        if node.child_count() == 0 {
            return self.token(node, field);
        }

        let mut children = Vec::new();
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                let child = cursor.node();
                if !child.is_extra() {
                    let child_field = cursor.field_name();
                    children.push(self.node(child, child_field));
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }

        SyntaxNode::branch(node.kind(), children)
            .with_field(field)
            .with_named(node.is_named())
    }

    fn token(&mut self, node: tree_sitter::Node<'_>, field: Option<&'static str>) -> SyntaxNode {
        let start = node.start_byte();
        let prefix_start = self.gap_start(start);
        let prefix = self.source.get(prefix_start..start).unwrap_or_default();
        let text = self.source.get(node.byte_range()).unwrap_or_default();
        self.last_end = self.last_end.max(node.end_byte());

        let kind = node.kind();
        SyntaxNode::leaf(kind, prefix, text)
            .with_field(field)
            .with_named(node.is_named())
            .with_separator(!node.is_named() && is_separator_kind(kind))
    }

    /// Start of the trivia gap ending at `position`.
    const fn gap_start(&self, position: usize) -> usize {
        if position >= self.floor && self.last_end < self.floor {
            self.floor
        } else if self.last_end <= position {
            self.last_end
        } else {
            position
        }
    }
}
