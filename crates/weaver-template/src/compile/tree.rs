//! The compiled form of a fragment: a syntax tree with slots.

use std::collections::BTreeSet;

use weaver_syntax::{LiteralValue, SyntaxNode, Token};

use crate::placeholders::slot_index;

/// A parameter position in a compiled fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) index: usize,
    pub(crate) prefix: String,
    pub(crate) field: Option<&'static str>,
    /// Wrapper repeated around every element of a variadic run, such as
    /// `...` in `f(...args)`. Its single slot is the element.
    pub(crate) spread: Option<Box<Shape>>,
}

/// A non-slot node: the node without its children, plus compiled children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Shape {
    pub(crate) node: SyntaxNode,
    pub(crate) children: Vec<SlotTree>,
    /// Set only for slot-free subtrees that denote a literal.
    pub(crate) literal: Option<LiteralValue>,
}

impl Shape {
    pub(crate) fn significant_children(&self) -> impl Iterator<Item = &SlotTree> {
        self.children.iter().filter(|child| !child.is_separator())
    }

    /// Finds the element inside `target` when it has this spread shape.
    ///
    /// Marker tokens must agree by text; the slot accepts any node.
    pub(crate) fn unwrap_element<'t>(&self, target: &'t SyntaxNode) -> Option<&'t SyntaxNode> {
        if self.node.kind() != target.kind() {
            return None;
        }
        let mut targets = target.significant_children();
        let mut element = None;
        for child in self.significant_children() {
            let found = targets.next()?;
            match child {
                SlotTree::Slot(_) => element = Some(found),
                SlotTree::Node(marker) if marker.children.is_empty() => {
                    let expected = marker.node.token().map(Token::text);
                    if expected != found.token().map(Token::text) {
                        return None;
                    }
                }
                SlotTree::Node(inner) => element = Some(inner.unwrap_element(found)?),
            }
        }
        if targets.next().is_some() {
            return None;
        }
        element
    }

    /// Builds this spread shape around `element`.
    ///
    /// The result starts with the element's prefix.
    pub(crate) fn wrap_element(&self, element: &SyntaxNode) -> SyntaxNode {
        let prefix = element.prefix().to_owned();
        self.fill(element).with_prefix(&prefix)
    }

    fn fill(&self, element: &SyntaxNode) -> SyntaxNode {
        let children = self
            .children
            .iter()
            .map(|child| match child {
                SlotTree::Slot(hole) => element
                    .clone()
                    .with_prefix(&hole.prefix)
                    .with_field(hole.field),
                SlotTree::Node(inner) => inner.fill(element),
            })
            .collect();
        self.node.clone().with_children(children)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SlotTree {
    Slot(Slot),
    Node(Shape),
}

impl SlotTree {
    /// Converts a parsed fragment, turning placeholder leaves into slots.
    ///
    /// Every slot index met is added to `found`.
    pub(crate) fn relabel(node: &SyntaxNode, found: &mut BTreeSet<usize>) -> Self {
        Self::convert(node, Some(found)).0
    }

    /// Converts a subtree without looking for placeholders.
    pub(crate) fn literal(node: &SyntaxNode) -> Self {
        Self::convert(node, None).0
    }

    fn convert(node: &SyntaxNode, mut found: Option<&mut BTreeSet<usize>>) -> (Self, bool) {
        if let Some(seen) = found.as_deref_mut()
            && let Some(token) = node.token()
            && let Some(index) = slot_index(token.text())
        {
            seen.insert(index);
            let slot = Slot {
                index,
                prefix: token.prefix().to_owned(),
                field: node.field(),
                spread: None,
            };
            return (Self::Slot(slot), true);
        }

        let mut has_slot = false;
        let mut children = Vec::with_capacity(node.children().len());
        for child in node.children() {
            let (converted, child_has_slot) = Self::convert(child, found.as_deref_mut());
            has_slot |= child_has_slot;
            children.push(converted);
        }
        let literal = if has_slot {
            None
        } else {
            LiteralValue::of(node)
        };
        let shape = Shape {
            node: node.without_children(),
            children,
            literal,
        };
        (Self::Node(shape), has_slot)
    }

    pub(crate) const fn is_separator(&self) -> bool {
        match self {
            Self::Slot(_) => false,
            Self::Node(shape) => shape.node.is_separator(),
        }
    }

    pub(crate) const fn as_slot(&self) -> Option<&Slot> {
        match self {
            Self::Slot(slot) => Some(slot),
            Self::Node(_) => None,
        }
    }

    /// Returns the kind of a node, or `None` for a slot.
    pub(crate) const fn kind(&self) -> Option<&'static str> {
        match self {
            Self::Slot(_) => None,
            Self::Node(shape) => Some(shape.node.kind()),
        }
    }

    pub(crate) const fn field(&self) -> Option<&'static str> {
        match self {
            Self::Slot(slot) => slot.field,
            Self::Node(shape) => shape.node.field(),
        }
    }

    /// Visits every slot in document order.
    #[cfg(test)]
    pub(crate) fn slots(&self) -> Vec<&Slot> {
        let mut out = Vec::new();
        self.collect_slots(&mut out);
        out
    }

    #[cfg(test)]
    fn collect_slots<'a>(&'a self, out: &mut Vec<&'a Slot>) {
        match self {
            Self::Slot(slot) => out.push(slot),
            Self::Node(shape) => {
                for child in &shape.children {
                    child.collect_slots(out);
                }
            }
        }
    }

    /// Prints the tree with slots spelled as their placeholders.
    #[cfg(test)]
    pub(crate) fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    #[cfg(test)]
    fn write_source(&self, out: &mut String) {
        match self {
            Self::Slot(Slot {
                spread: Some(wrapper),
                ..
            }) => Self::Node((**wrapper).clone()).write_source(out),
            Self::Slot(slot) => {
                out.push_str(&slot.prefix);
                out.push_str(&crate::placeholders::placeholder(slot.index));
            }
            Self::Node(shape) => {
                if let Some(token) = shape.node.token() {
                    out.push_str(token.prefix());
                    out.push_str(token.text());
                }
                for child in &shape.children {
                    child.write_source(out);
                }
            }
        }
    }
}

/// Replaces the slots of literal subtree parameters with the subtrees.
///
/// `lookup` returns the subtree bound to a slot index, if any. Inlined
/// subtrees take over the slot's prefix and field.
pub(crate) fn inline(tree: SlotTree, lookup: &dyn Fn(usize) -> Option<SyntaxNode>) -> SlotTree {
    match tree {
        SlotTree::Slot(slot) => match lookup(slot.index) {
            Some(node) => SlotTree::literal(&node.with_prefix(&slot.prefix).with_field(slot.field)),
            None => SlotTree::Slot(slot),
        },
        SlotTree::Node(shape) => {
            let children = shape
                .children
                .into_iter()
                .map(|child| inline(child, lookup))
                .collect();
            SlotTree::Node(Shape { children, ..shape })
        }
    }
}
