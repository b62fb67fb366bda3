//! Structural matching of compiled patterns against syntax trees.
//!
//! The matcher walks the pattern and the target together. Slots bind the
//! target nodes they meet; every other pattern node must agree with its
//! target in kind, type, value and children. Variadic slots bind runs of
//! siblings, chosen by bounded backtracking in [`sequence`].
//!
//! A failed match yields a [`MatchFailure`] describing the deepest point of
//! divergence found.

mod node;
mod sequence;

use std::cell::{OnceCell, RefCell};

use tracing::trace;
use weaver_syntax::{Cursor, LiteralValue, SyntaxNode};

use crate::bindings::{Bound, MatchResult, NodeRun};
use crate::capture::Capture;
use crate::compile::Compiled;
use crate::explain::{DebugLog, MatchFailure, MatchOptions, MatchOutcome};
use crate::pattern::Pattern;

pub(crate) const MATCHER_TARGET: &str = "weaver_template::matcher";

/// A binding made during matching, borrowing from the target.
#[derive(Debug, Clone)]
enum Tentative<'a> {
    Node(&'a SyntaxNode),
    Nodes {
        nodes: Vec<&'a SyntaxNode>,
        separators: Vec<&'a SyntaxNode>,
    },
}

impl Tentative<'_> {
    fn nodes(&self) -> Vec<&SyntaxNode> {
        match self {
            Self::Node(node) => vec![*node],
            Self::Nodes { nodes, .. } => nodes.clone(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Node(node) => node.describe(),
            Self::Nodes { nodes, .. } => describe_nodes(nodes),
        }
    }

    fn to_bound(&self) -> Bound {
        match self {
            Self::Node(node) => Bound::Node((*node).clone()),
            Self::Nodes { nodes, separators } => Bound::Nodes(NodeRun::new(
                nodes.iter().map(|node| (*node).clone()).collect(),
                separators.iter().map(|node| (*node).clone()).collect(),
            )),
        }
    }
}

fn describe_nodes(nodes: &[&SyntaxNode]) -> String {
    let described: Vec<String> = nodes.iter().map(|node| node.describe()).collect();
    format!("[{}]", described.join(", "))
}

/// Bindings made so far. Cloned before each backtracking trial.
#[derive(Debug, Clone, Default)]
struct State<'a> {
    bindings: Vec<(&'a Capture, Tentative<'a>)>,
}

impl<'a> State<'a> {
    fn get(&self, capture: &Capture) -> Option<&Tentative<'a>> {
        self.bindings
            .iter()
            .find(|(bound, _)| *bound == capture)
            .map(|(_, value)| value)
    }

    fn into_result(self) -> MatchResult {
        MatchResult::from_bindings(
            self.bindings
                .iter()
                .map(|(capture, value)| ((*capture).clone(), value.to_bound()))
                .collect(),
        )
    }
}

/// Per-call matching context.
struct Engine<'a> {
    compiled: &'a Compiled,
    lenient: bool,
    cursor: Option<&'a Cursor<'a>>,
    log: Option<RefCell<DebugLog>>,
}

impl<'a> Engine<'a> {
    fn new(
        compiled: &'a Compiled,
        lenient: bool,
        cursor: Option<&'a Cursor<'a>>,
        debug: bool,
    ) -> Self {
        Self {
            compiled,
            lenient,
            cursor,
            log: debug.then(RefCell::default),
        }
    }

    /// Records a decision in the debug log when debugging is enabled.
    fn note(&self, entry: impl FnOnce() -> String) {
        if let Some(log) = &self.log {
            let text = entry();
            trace!(target: MATCHER_TARGET, entry = %text, "match decision");
            log.borrow_mut().push(text);
        }
    }

    fn into_log(self) -> Option<DebugLog> {
        self.log.map(RefCell::into_inner)
    }
}

/// Returns whether two subtrees are the same code, ignoring trivia.
///
/// Nodes that both carry a type must also agree on it.
pub(crate) fn equivalent(left: &SyntaxNode, right: &SyntaxNode) -> bool {
    if left.kind() != right.kind() {
        return false;
    }
    if let (Some(first), Some(second)) = (left.ty(), right.ty())
        && !first.is_equivalent(second)
    {
        return false;
    }
    if let (Some(first), Some(second)) = (LiteralValue::of(left), LiteralValue::of(right)) {
        return first == second;
    }
    match (left.token(), right.token()) {
        (Some(first), Some(second)) => first.text() == second.text(),
        (None, None) => {
            let mut lhs = left.significant_children();
            let mut rhs = right.significant_children();
            loop {
                match (lhs.next(), rhs.next()) {
                    (None, None) => return true,
                    (Some(first), Some(second)) if equivalent(first, second) => {}
                    _ => return false,
                }
            }
        }
        _ => false,
    }
}

/// Matches a compiled pattern against one node.
pub(crate) fn run(
    compiled: &Compiled,
    lenient: bool,
    target: &SyntaxNode,
    cursor: Option<&Cursor<'_>>,
    debug: bool,
) -> MatchOutcome {
    let engine = Engine::new(compiled, lenient, cursor, debug);
    let mut state = State::default();
    let result = engine
        .match_node(&compiled.root, target, &mut state)
        .map(|()| state.into_result());
    match &result {
        Ok(bindings) => {
            trace!(
                target: MATCHER_TARGET,
                target_kind = target.kind(),
                bindings = bindings.len(),
                "pattern matched"
            );
            engine.note(|| format!("matched {} with {} binding(s)", target.describe(), bindings.len()));
        }
        Err(failure) => {
            trace!(target: MATCHER_TARGET, failure = %failure, "pattern did not match");
            engine.note(|| format!("no match: {failure}"));
        }
    }
    MatchOutcome {
        result,
        debug_log: engine.into_log(),
    }
}

/// Resolves the debug setting for one call.
pub(crate) fn debug_enabled(pattern: &Pattern, options: &MatchOptions) -> bool {
    options
        .debug_override()
        .or_else(|| pattern.config().debug_override())
        .unwrap_or_else(|| pattern.compiler().debug_default().enabled())
}

/// A single match of a pattern against a node, evaluated on first use.
pub struct Matcher<'a> {
    pattern: &'a Pattern,
    target: &'a SyntaxNode,
    cursor: Option<&'a Cursor<'a>>,
    outcome: OnceCell<MatchOutcome>,
}

impl<'a> Matcher<'a> {
    /// Prepares to match `pattern` against `target`.
    #[must_use]
    pub const fn new(
        pattern: &'a Pattern,
        target: &'a SyntaxNode,
        cursor: Option<&'a Cursor<'a>>,
    ) -> Self {
        Self {
            pattern,
            target,
            cursor,
            outcome: OnceCell::new(),
        }
    }

    fn outcome(&self) -> &MatchOutcome {
        self.outcome.get_or_init(|| {
            self.pattern
                .match_with_explanation(self.target, self.cursor, &MatchOptions::default())
        })
    }

    /// Returns whether the pattern matches.
    #[must_use]
    pub fn matches(&self) -> bool {
        self.outcome().matched()
    }

    /// Returns the value bound to `capture`.
    #[must_use]
    pub fn get(&self, capture: &Capture) -> Option<&Bound> {
        self.result().and_then(|result| result.get(capture))
    }

    /// Returns all bindings of a successful match.
    #[must_use]
    pub fn result(&self) -> Option<&MatchResult> {
        self.outcome().result()
    }

    /// Returns why the match failed.
    #[must_use]
    pub fn explanation(&self) -> Option<&MatchFailure> {
        self.outcome().explanation()
    }
}

impl std::fmt::Debug for Matcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("target", &self.target.kind())
            .field("outcome", &self.outcome.get())
            .finish_non_exhaustive()
    }
}
