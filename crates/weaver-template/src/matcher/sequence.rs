//! Matching of child sequences, with variadic slots.
//!
//! Fixed elements match one target child each. The last variadic slot in a
//! sequence takes whatever the fixed elements after it leave over; earlier
//! variadic slots try every admissible length, shortest first, so the first
//! variadic binds the smallest span that lets the rest of the sequence
//! match. A variadic slot under a spread marker requires every node of its
//! run to carry the marker and binds the elements inside.

use std::collections::HashMap;

use weaver_syntax::SyntaxNode;

use super::{Engine, State};
use crate::capture::Capture;
use crate::compile::{Shape, Slot, SlotTree};
use crate::explain::{FailureReason, MatchFailure, PathStep};

struct Sequence<'a> {
    kind: &'static str,
    patterns: Vec<&'a SlotTree>,
    /// Significant target children with their position among all children.
    targets: Vec<(usize, &'a SyntaxNode)>,
    all: &'a [SyntaxNode],
    /// Failures by (pattern position, target position).
    failed: HashMap<(usize, usize), MatchFailure>,
}

impl<'a> Sequence<'a> {
    fn length_mismatch(&self) -> MatchFailure {
        MatchFailure::new(
            FailureReason::ArrayLengthMismatch,
            format!("{} children", self.patterns.len()),
            format!("{} children", self.targets.len()),
        )
        .within(PathStep::new(self.kind, None, None))
    }

    fn step(&self, position: usize) -> PathStep {
        let field = self.patterns.get(position).and_then(|pattern| pattern.field());
        PathStep::new(self.kind, field, Some(position))
    }

    /// Returns the separators lying between the first and last node of a run.
    fn separators_between(&self, start: usize, len: usize) -> Vec<&'a SyntaxNode> {
        let first = self.targets.get(start).map(|(position, _)| *position);
        let last = start
            .checked_add(len)
            .and_then(|end| end.checked_sub(1))
            .and_then(|end| self.targets.get(end))
            .map(|(position, _)| *position);
        match (first, last) {
            (Some(from), Some(to)) if len > 0 => self
                .all
                .get(from..=to)
                .unwrap_or_default()
                .iter()
                .filter(|child| child.is_separator())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Keeps the failure that got further into the pattern.
fn deeper(best: Option<MatchFailure>, candidate: MatchFailure) -> MatchFailure {
    match best {
        Some(existing) if existing.path().len() >= candidate.path().len() => existing,
        _ => candidate,
    }
}

impl<'a> Engine<'a> {
    fn variadic_slot(&self, pattern: &'a SlotTree) -> Option<(&'a Slot, &'a Capture)> {
        let slot = pattern.as_slot()?;
        let capture = self.compiled.capture(slot.index)?;
        capture.is_variadic().then_some((slot, capture))
    }

    pub(super) fn match_children(
        &self,
        shape: &'a Shape,
        target: &'a SyntaxNode,
        state: &mut State<'a>,
    ) -> Result<(), MatchFailure> {
        let mut sequence = Sequence {
            kind: shape.node.kind(),
            patterns: shape.significant_children().collect(),
            targets: target
                .children()
                .iter()
                .enumerate()
                .filter(|(_, child)| !child.is_separator())
                .collect(),
            all: target.children(),
            failed: HashMap::new(),
        };

        let has_variadic = sequence
            .patterns
            .iter()
            .copied()
            .any(|pattern| self.variadic_slot(pattern).is_some());
        if !has_variadic && sequence.patterns.len() != sequence.targets.len() {
            return Err(sequence.length_mismatch());
        }
        self.match_from(&mut sequence, 0, 0, state)
    }

    fn match_from(
        &self,
        sequence: &mut Sequence<'a>,
        pattern_at: usize,
        target_at: usize,
        state: &mut State<'a>,
    ) -> Result<(), MatchFailure> {
        let memoise = !self.compiled.repeated_captures;
        if memoise && let Some(failure) = sequence.failed.get(&(pattern_at, target_at)) {
            return Err(failure.clone());
        }
        let result = self.match_uncached(sequence, pattern_at, target_at, state);
        if memoise && let Err(failure) = &result {
            sequence
                .failed
                .insert((pattern_at, target_at), failure.clone());
        }
        result
    }

    fn match_uncached(
        &self,
        sequence: &mut Sequence<'a>,
        pattern_at: usize,
        target_at: usize,
        state: &mut State<'a>,
    ) -> Result<(), MatchFailure> {
        let Some(pattern) = sequence.patterns.get(pattern_at).copied() else {
            if target_at == sequence.targets.len() {
                return Ok(());
            }
            return Err(sequence.length_mismatch());
        };

        if let Some((slot, capture)) = self.variadic_slot(pattern) {
            return self.match_variadic(sequence, pattern_at, target_at, (slot, capture), state);
        }

        let Some(&(_, target)) = sequence.targets.get(target_at) else {
            return Err(sequence.length_mismatch());
        };
        self.match_node(pattern, target, state)
            .map_err(|failure| failure.within(sequence.step(pattern_at)))?;
        self.match_from(sequence, pattern_at + 1, target_at + 1, state)
    }

    fn match_variadic(
        &self,
        sequence: &mut Sequence<'a>,
        pattern_at: usize,
        target_at: usize,
        (slot, capture): (&'a Slot, &'a Capture),
        state: &mut State<'a>,
    ) -> Result<(), MatchFailure> {
        let later = sequence
            .patterns
            .get(pattern_at + 1..)
            .unwrap_or_default();
        let later_variadic = later
            .iter()
            .copied()
            .any(|pattern| self.variadic_slot(pattern).is_some());
        let needed_after: usize = later
            .iter()
            .copied()
            .map(|pattern| {
                self.variadic_slot(pattern)
                    .map_or(1, |(_, found)| found.arity().min_len())
            })
            .sum();
        let Some(available) = sequence
            .targets
            .len()
            .checked_sub(target_at)
            .and_then(|remaining| remaining.checked_sub(needed_after))
        else {
            return Err(sequence.length_mismatch());
        };

        let lengths: Vec<usize> = if later_variadic {
            let arity = capture.arity();
            let upper = arity.max_len().map_or(available, |max| max.min(available));
            (arity.min_len()..=upper).collect()
        } else {
            vec![available]
        };

        let mut best = None;
        for len in lengths {
            let mut trial = state.clone();
            let run: Vec<&'a SyntaxNode> = sequence
                .targets
                .get(target_at..target_at + len)
                .unwrap_or_default()
                .iter()
                .map(|(_, node)| *node)
                .collect();
            let separators = sequence.separators_between(target_at, len);
            let bound = self
                .spread_elements(slot, run)
                .and_then(|nodes| self.bind_run(capture, nodes, separators, &mut trial));
            let attempt = match bound {
                Ok(()) => self.match_from(sequence, pattern_at + 1, target_at + len, &mut trial),
                Err(failure) => Err(failure.within(PathStep::new(
                    sequence.kind,
                    slot.field,
                    Some(pattern_at),
                ))),
            };
            match attempt {
                Ok(()) => {
                    *state = trial;
                    return Ok(());
                }
                Err(failure) => best = Some(deeper(best, failure)),
            }
        }
        Err(best.unwrap_or_else(|| sequence.length_mismatch()))
    }
}
