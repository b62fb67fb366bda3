//! Promotion of slots into the wrapper nodes that hold nothing else.
//!
//! A placeholder parses as an identifier, but the parameter usually stands
//! for the whole construct around it: `${body}` on its own line is an
//! expression statement holding one identifier, and the capture should bind
//! whatever statement sits there. Promotion moves the slot up to the
//! outermost wrapper that holds nothing but it.
//!
//! A variadic slot under a spread marker (`...${args}`, `*${args}`) is
//! promoted too, keeping the wrapper as the shape every element of the run
//! is matched against and rebuilt in.

use weaver_syntax::SyntaxCategory;

use super::tree::{Shape, Slot, SlotTree};

/// Wrapper kinds that mark a spread or rest element.
const SPREAD_KINDS: &[&str] = &[
    "spread_element",
    "rest_pattern",
    "list_splat",
    "list_splat_pattern",
    "dictionary_splat",
    "dictionary_splat_pattern",
];

/// Promotes slots bottom-up. The input is left untouched.
///
/// `variadic` tells whether the slot with a given index binds runs.
pub(crate) fn propagate(tree: &SlotTree, variadic: &dyn Fn(usize) -> bool) -> SlotTree {
    match tree {
        SlotTree::Slot(slot) => SlotTree::Slot(slot.clone()),
        SlotTree::Node(shape) => {
            let children: Vec<SlotTree> = shape
                .children
                .iter()
                .map(|child| propagate(child, variadic))
                .collect();
            let rebuilt = Shape {
                node: shape.node.clone(),
                children,
                literal: shape.literal.clone(),
            };
            if let Some(promoted) = spread_slot(&rebuilt, variadic) {
                return SlotTree::Slot(promoted);
            }
            let Some(slot) = promotable(&rebuilt) else {
                return SlotTree::Node(rebuilt);
            };
            // A spread keeps every wrapper it passes through.
            let wrapper = slot.spread.as_deref().map(|inner| {
                Box::new(Shape {
                    node: rebuilt.node.clone(),
                    children: vec![SlotTree::Node(inner.clone())],
                    literal: None,
                })
            });
            SlotTree::Slot(Slot {
                index: slot.index,
                prefix: slot.prefix.clone(),
                field: rebuilt.node.field(),
                spread: wrapper,
            })
        }
    }
}

/// Turns a spread wrapper around a bare variadic slot into a spread slot.
fn spread_slot(shape: &Shape, variadic: &dyn Fn(usize) -> bool) -> Option<Slot> {
    if !SPREAD_KINDS.contains(&shape.node.kind()) {
        return None;
    }
    let mut significant = shape.significant_children();
    let (Some(SlotTree::Node(marker)), Some(SlotTree::Slot(element)), None) =
        (significant.next(), significant.next(), significant.next())
    else {
        return None;
    };
    let bare = marker.node.token().is_some() && !marker.node.is_named();
    if !bare || element.spread.is_some() || !variadic(element.index) {
        return None;
    }
    Some(Slot {
        index: element.index,
        prefix: marker.node.prefix().to_owned(),
        field: shape.node.field(),
        spread: Some(Box::new(shape.clone())),
    })
}

fn promotable(shape: &Shape) -> Option<&Slot> {
    let kind = shape.node.kind();
    if !shape.node.is_named() || SyntaxCategory::is_statement_container(kind) {
        return None;
    }
    if kind == "expression_statement" {
        let mut significant = shape.significant_children();
        let only = significant.next()?;
        if significant.next().is_some() {
            return None;
        }
        return only.as_slot().filter(|slot| slot.spread.is_none());
    }
    match shape.children.as_slice() {
        [only] => only.as_slot(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use weaver_syntax::SyntaxNode;

    use super::*;
    use crate::placeholders::placeholder;

    fn statement_block(statement: SyntaxNode) -> SyntaxNode {
        SyntaxNode::branch(
            "statement_block",
            vec![
                SyntaxNode::anonymous("{", ""),
                statement,
                SyntaxNode::anonymous("}", " "),
            ],
        )
        .with_field(Some("body"))
    }

    fn relabel(node: &SyntaxNode) -> SlotTree {
        SlotTree::relabel(node, &mut std::collections::BTreeSet::new())
    }

    #[test]
    fn expression_statements_are_promoted_past_their_semicolon() {
        let statement = SyntaxNode::branch(
            "expression_statement",
            vec![
                SyntaxNode::leaf("identifier", " ", placeholder(0)),
                SyntaxNode::anonymous(";", ""),
            ],
        );
        let compiled = relabel(&statement_block(statement));
        let promoted = propagate(&compiled, &|_| false);

        let SlotTree::Node(block) = &promoted else {
            panic!("block should stay a node");
        };
        let slot = block.children.get(1).and_then(SlotTree::as_slot);
        assert_eq!(slot.map(|found| found.index), Some(0));
        assert_eq!(slot.map(|found| found.prefix.as_str()), Some(" "));
    }

    #[test]
    fn single_child_wrappers_take_the_slot_and_keep_their_field() {
        let parameter = SyntaxNode::branch(
            "required_parameter",
            vec![SyntaxNode::leaf("identifier", "", placeholder(3)).with_field(Some("pattern"))],
        )
        .with_field(Some("parameter"));
        let promoted = propagate(&relabel(&parameter), &|_| false);
        assert_eq!(promoted.as_slot().map(|slot| slot.index), Some(3));
        assert_eq!(promoted.field(), Some("parameter"));
    }

    #[test]
    fn containers_and_multi_child_nodes_are_left_alone() {
        let arguments = SyntaxNode::branch(
            "arguments",
            vec![
                SyntaxNode::anonymous("(", ""),
                SyntaxNode::leaf("identifier", "", placeholder(0)),
                SyntaxNode::anonymous(")", ""),
            ],
        );
        let compiled = relabel(&arguments);
        assert_eq!(propagate(&compiled, &|_| false), compiled);
    }

    #[test]
    fn propagation_does_not_modify_its_input() {
        let statement = SyntaxNode::branch(
            "expression_statement",
            vec![SyntaxNode::leaf("identifier", "", placeholder(0))],
        );
        let compiled = relabel(&statement);
        let snapshot = compiled.clone();
        let promoted = propagate(&compiled, &|_| false);
        assert_eq!(compiled, snapshot);
        assert_ne!(promoted, compiled);
    }

    fn spread_argument(index: usize) -> SyntaxNode {
        SyntaxNode::branch(
            "spread_element",
            vec![
                SyntaxNode::anonymous("...", " "),
                SyntaxNode::leaf("identifier", "", placeholder(index)),
            ],
        )
    }

    #[test]
    fn variadic_slots_under_a_spread_take_the_wrapper() {
        let promoted = propagate(&relabel(&spread_argument(0)), &|index| index == 0);

        let slot = promoted.as_slot().unwrap_or_else(|| panic!("spread should be promoted"));
        assert_eq!(slot.prefix, " ");
        let wrapper = slot.spread.as_deref().map(|shape| shape.node.kind());
        assert_eq!(wrapper, Some("spread_element"));
    }

    #[test]
    fn scalar_slots_under_a_spread_stay_inside_it() {
        let compiled = relabel(&spread_argument(0));
        assert_eq!(propagate(&compiled, &|_| false), compiled);
    }

    #[test]
    fn spreads_keep_the_wrappers_they_pass_through() {
        let parameter = SyntaxNode::branch(
            "required_parameter",
            vec![
                SyntaxNode::branch(
                    "rest_pattern",
                    vec![
                        SyntaxNode::anonymous("...", ""),
                        SyntaxNode::leaf("identifier", "", placeholder(0)),
                    ],
                )
                .with_field(Some("pattern")),
            ],
        );
        let promoted = propagate(&relabel(&parameter), &|_| true);

        let wrapper = promoted
            .as_slot()
            .and_then(|slot| slot.spread.as_deref())
            .unwrap_or_else(|| panic!("spread should be promoted"));
        assert_eq!(wrapper.node.kind(), "required_parameter");
        let inner = wrapper.children.first().and_then(SlotTree::kind);
        assert_eq!(inner, Some("rest_pattern"));
    }
}
