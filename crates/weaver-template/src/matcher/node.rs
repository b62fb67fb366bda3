//! Node-level comparison and slot binding.

use tracing::debug;
use weaver_syntax::{LiteralValue, SyntaxNode, TypeInfo};

use super::{Engine, MATCHER_TARGET, State, Tentative, describe_nodes, equivalent};
use crate::capture::Capture;
use crate::compile::{Shape, Slot, SlotTree};
use crate::constraint::{Candidate, ConstraintContext};
use crate::explain::{FailureReason, MatchFailure};

fn describe_type(ty: Option<&TypeInfo>) -> String {
    ty.map_or_else(|| "no type".to_owned(), ToString::to_string)
}

impl<'a> Engine<'a> {
    pub(super) fn match_node(
        &self,
        pattern: &'a SlotTree,
        target: &'a SyntaxNode,
        state: &mut State<'a>,
    ) -> Result<(), MatchFailure> {
        match pattern {
            SlotTree::Slot(slot) => self.match_slot(slot, target, state),
            SlotTree::Node(shape) => self.match_shape(shape, target, state),
        }
    }

    fn match_shape(
        &self,
        shape: &'a Shape,
        target: &'a SyntaxNode,
        state: &mut State<'a>,
    ) -> Result<(), MatchFailure> {
        let pattern = &shape.node;
        if pattern.kind() != target.kind() {
            return Err(MatchFailure::new(
                FailureReason::KindMismatch,
                pattern.kind(),
                target.kind(),
            ));
        }
        self.check_types(pattern, target)?;

        if let Some(expected) = &shape.literal
            && let Some(actual) = LiteralValue::of(target)
        {
            if *expected == actual {
                return Ok(());
            }
            return Err(MatchFailure::new(
                FailureReason::ValueMismatch,
                pattern.text(),
                target.text(),
            ));
        }

        if let Some(token) = pattern.token() {
            return match target.token() {
                Some(found) if found.text() == token.text() => Ok(()),
                _ => Err(MatchFailure::new(
                    FailureReason::ValueMismatch,
                    format!("`{}`", token.text()),
                    format!("`{}`", target.text()),
                )),
            };
        }

        self.match_children(shape, target, state)
    }

    /// Applies the type compatibility rule to two nodes of the same kind.
    fn check_types(&self, pattern: &SyntaxNode, target: &SyntaxNode) -> Result<(), MatchFailure> {
        let strict = !self.lenient;
        let compatible = match (pattern.ty(), target.ty()) {
            (Some(expected), Some(actual)) => {
                (!strict && expected.is_trivial()) || expected.is_equivalent(actual)
            }
            (None, Some(_)) => !strict,
            (Some(expected), None) => !strict && expected.is_trivial(),
            (None, None) => true,
        };
        if compatible {
            return Ok(());
        }
        Err(MatchFailure::new(
            FailureReason::TypeMismatch,
            describe_type(pattern.ty()),
            describe_type(target.ty()),
        ))
    }

    fn match_slot(
        &self,
        slot: &'a Slot,
        target: &'a SyntaxNode,
        state: &mut State<'a>,
    ) -> Result<(), MatchFailure> {
        let Some(capture) = self.compiled.capture(slot.index) else {
            return Err(MatchFailure::new(
                FailureReason::ValueMismatch,
                "a bound parameter",
                target.describe(),
            ));
        };
        if capture.is_variadic() {
            let elements = self.spread_elements(slot, vec![target])?;
            return self.bind_run(capture, elements, Vec::new(), state);
        }

        self.check_hint(capture, target)?;
        self.check_constraint(capture, Candidate::Node(target), &|| target.describe())?;
        self.record(capture, Tentative::Node(target), state)
    }

    /// Strips the slot's spread wrapper off every node of a run.
    pub(super) fn spread_elements(
        &self,
        slot: &'a Slot,
        run: Vec<&'a SyntaxNode>,
    ) -> Result<Vec<&'a SyntaxNode>, MatchFailure> {
        let Some(wrapper) = slot.spread.as_deref() else {
            return Ok(run);
        };
        run.into_iter()
            .map(|node| {
                wrapper.unwrap_element(node).ok_or_else(|| {
                    self.note(|| format!("{} is not a {}", node.describe(), wrapper.node.kind()));
                    MatchFailure::new(FailureReason::KindMismatch, wrapper.node.kind(), node.kind())
                })
            })
            .collect()
    }

    /// Binds a run of siblings to a variadic capture.
    pub(super) fn bind_run(
        &self,
        capture: &'a Capture,
        nodes: Vec<&'a SyntaxNode>,
        separators: Vec<&'a SyntaxNode>,
        state: &mut State<'a>,
    ) -> Result<(), MatchFailure> {
        let arity = capture.arity();
        if !arity.admits(nodes.len()) {
            return Err(MatchFailure::new(
                FailureReason::ArrayLengthMismatch,
                format!("{} for {}", arity.describe(), capture.display_name()),
                format!("{} elements", nodes.len()),
            ));
        }
        for node in &nodes {
            self.check_hint(capture, node)?;
        }
        self.check_constraint(capture, Candidate::Nodes(&nodes), &|| describe_nodes(&nodes))?;
        self.record(capture, Tentative::Nodes { nodes, separators }, state)
    }

    fn check_hint(&self, capture: &Capture, target: &SyntaxNode) -> Result<(), MatchFailure> {
        let Some(hint) = capture.type_hint() else {
            return Ok(());
        };
        if target.ty().is_some_and(|actual| hint.is_equivalent(actual)) {
            return Ok(());
        }
        self.note(|| {
            format!(
                "{} rejected {}: type {} is not {hint}",
                capture.display_name(),
                target.describe(),
                describe_type(target.ty())
            )
        });
        Err(MatchFailure::new(
            FailureReason::TypeMismatch,
            hint.to_string(),
            describe_type(target.ty()),
        ))
    }

    fn check_constraint(
        &self,
        capture: &Capture,
        candidate: Candidate<'_>,
        describe: &dyn Fn() -> String,
    ) -> Result<(), MatchFailure> {
        let Some(constraint) = capture.constraint() else {
            return Ok(());
        };
        let context = ConstraintContext::new(capture, self.cursor);
        match constraint.evaluate(candidate, &context) {
            Ok(true) => Ok(()),
            Ok(false) => {
                self.note(|| format!("constraint on {} rejected {}", capture.display_name(), describe()));
                Err(MatchFailure::new(
                    FailureReason::ConstraintFailed,
                    format!("{} to satisfy its constraint", capture.display_name()),
                    describe(),
                ))
            }
            Err(err) => {
                debug!(
                    target: MATCHER_TARGET,
                    capture = %capture.display_name(),
                    error = %err,
                    "constraint raised an error"
                );
                self.note(|| format!("constraint on {} raised: {err}", capture.display_name()));
                Err(MatchFailure::new(
                    FailureReason::ConstraintError,
                    format!("{} to satisfy its constraint", capture.display_name()),
                    err.message(),
                ))
            }
        }
    }

    /// Records a binding, or checks it against an earlier one.
    fn record(
        &self,
        capture: &'a Capture,
        value: Tentative<'a>,
        state: &mut State<'a>,
    ) -> Result<(), MatchFailure> {
        if let Some(existing) = state.get(capture) {
            let before = existing.nodes();
            let now = value.nodes();
            let same = before.len() == now.len()
                && before
                    .iter()
                    .zip(&now)
                    .all(|(first, second)| equivalent(first, second));
            if same {
                return Ok(());
            }
            return Err(MatchFailure::new(
                FailureReason::ValueMismatch,
                format!("{} bound to {}", capture.display_name(), existing.describe()),
                value.describe(),
            ));
        }
        if capture.is_capturing() {
            self.note(|| format!("bound {} to {}", capture.display_name(), value.describe()));
            state.bindings.push((capture, value));
        }
        Ok(())
    }
}
