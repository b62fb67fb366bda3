//! Parent-linked views of a node's position in a tree.
//!
//! A [`Cursor`] borrows a node together with the chain of cursors above it.
//! Visitors build cursors on the stack as they descend, so no tree needs
//! parent pointers.

use crate::tree::SyntaxNode;

/// A node together with its ancestry.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    node: &'a SyntaxNode,
    parent: Option<&'a Cursor<'a>>,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the root of a tree.
    #[must_use]
    pub const fn root(node: &'a SyntaxNode) -> Self {
        Self { node, parent: None }
    }

    /// Creates a cursor for `node` beneath `parent`.
    #[must_use]
    pub const fn new(node: &'a SyntaxNode, parent: Option<&'a Cursor<'a>>) -> Self {
        Self { node, parent }
    }

    /// Descends to a child of the current node.
    #[must_use]
    pub const fn child<'b>(&'b self, node: &'b SyntaxNode) -> Cursor<'b>
    where
        'a: 'b,
    {
        Cursor {
            node,
            parent: Some(self),
        }
    }

    /// Returns a cursor at the same position pointing at a different node.
    ///
    /// Used when a replacement takes the place of the current node.
    #[must_use]
    pub const fn with_node<'b>(&self, node: &'b SyntaxNode) -> Cursor<'b>
    where
        'a: 'b,
    {
        Cursor {
            node,
            parent: self.parent,
        }
    }

    /// Returns the node under the cursor.
    #[must_use]
    pub const fn node(&self) -> &'a SyntaxNode {
        self.node
    }

    /// Returns the parent cursor.
    #[must_use]
    pub const fn parent(&self) -> Option<&'a Cursor<'a>> {
        self.parent
    }

    /// Returns the parent node.
    #[must_use]
    pub fn parent_node(&self) -> Option<&'a SyntaxNode> {
        self.parent.map(Cursor::node)
    }

    /// Returns the ancestor nodes, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &'a SyntaxNode> + use<'a> {
        std::iter::successors(self.parent, |cursor| cursor.parent).map(Cursor::node)
    }

    /// Returns the number of ancestors.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestors_walk_towards_the_root() {
        let leaf = SyntaxNode::leaf("identifier", "", "x");
        let stmt = SyntaxNode::branch("expression_statement", vec![leaf.clone()]);
        let program = SyntaxNode::branch("program", vec![stmt.clone()]);

        let root = Cursor::root(&program);
        let middle = root.child(&stmt);
        let bottom = middle.child(&leaf);

        let kinds: Vec<_> = bottom.ancestors().map(SyntaxNode::kind).collect();
        assert_eq!(kinds, vec!["expression_statement", "program"]);
        assert_eq!(bottom.depth(), 2);
        assert_eq!(bottom.parent_node().map(SyntaxNode::kind), Some("expression_statement"));
    }

    #[test]
    fn with_node_keeps_the_parent() {
        let original = SyntaxNode::leaf("identifier", "", "x");
        let replacement = SyntaxNode::leaf("identifier", "", "y");
        let program = SyntaxNode::branch("program", vec![original.clone()]);

        let root = Cursor::root(&program);
        let site = root.child(&original);
        let moved = site.with_node(&replacement);

        assert_eq!(moved.node().text(), "y");
        assert_eq!(moved.parent_node().map(SyntaxNode::kind), Some("program"));
    }
}
