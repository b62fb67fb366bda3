//! Capture constraints and their boolean combinators.
//!
//! A [`Constraint`] is a predicate over the node (or run of nodes) a capture
//! is about to bind. Constraints are ordinary shared closures, so they can be
//! composed with [`and`], [`or`], and [`not`]. Combinators evaluate their
//! operands left to right and stop as soon as the outcome is known.
//!
//! # Example
//!
//! ```
//! use weaver_template::{Candidate, Constraint, and, not};
//!
//! let short = Constraint::new(|candidate: Candidate<'_>, _| {
//!     candidate.as_node().is_some_and(|node| node.text().len() < 8)
//! });
//! let numeric = Constraint::new(|candidate: Candidate<'_>, _| {
//!     candidate.as_node().is_some_and(|node| node.kind() == "number")
//! });
//! let short_name = and([short, not(numeric)]);
//! # drop(short_name);
//! ```

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use weaver_syntax::{Cursor, SyntaxNode};

use crate::capture::Capture;

/// The value a constraint is asked about.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    /// The node a scalar capture would bind.
    Node(&'a SyntaxNode),
    /// The full run a variadic capture would bind.
    Nodes(&'a [&'a SyntaxNode]),
}

impl<'a> Candidate<'a> {
    /// Returns the node for scalar candidates.
    #[must_use]
    pub const fn as_node(self) -> Option<&'a SyntaxNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Nodes(_) => None,
        }
    }

    /// Returns the run for variadic candidates.
    #[must_use]
    pub const fn as_nodes(self) -> Option<&'a [&'a SyntaxNode]> {
        match self {
            Self::Node(_) => None,
            Self::Nodes(nodes) => Some(nodes),
        }
    }

    /// Returns the number of nodes in the candidate.
    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            Self::Node(_) => 1,
            Self::Nodes(nodes) => nodes.len(),
        }
    }

    /// Returns whether the candidate is an empty run.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// Information available to a constraint besides the candidate itself.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintContext<'a> {
    capture: &'a Capture,
    cursor: Option<&'a Cursor<'a>>,
}

impl<'a> ConstraintContext<'a> {
    /// Creates a context for `capture` at an optional match site.
    #[must_use]
    pub const fn new(capture: &'a Capture, cursor: Option<&'a Cursor<'a>>) -> Self {
        Self { capture, cursor }
    }

    /// Returns the capture being bound.
    #[must_use]
    pub const fn capture(&self) -> &'a Capture {
        self.capture
    }

    /// Returns the cursor at the node the whole pattern is matched against.
    #[must_use]
    pub const fn cursor(&self) -> Option<&'a Cursor<'a>> {
        self.cursor
    }
}

/// Error raised by a fallible constraint.
///
/// Matching reports it as a failure with reason `constraint-error` rather
/// than propagating it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConstraintError {
    message: String,
}

impl ConstraintError {
    /// Creates a constraint error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

type Predicate =
    dyn Fn(Candidate<'_>, &ConstraintContext<'_>) -> Result<bool, ConstraintError> + Send + Sync;

/// A shared predicate over capture candidates.
#[derive(Clone)]
pub struct Constraint(Arc<Predicate>);

impl Constraint {
    /// Wraps an infallible predicate.
    #[must_use]
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(Candidate<'_>, &ConstraintContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(
            move |candidate: Candidate<'_>, context: &ConstraintContext<'_>| {
                Ok(predicate(candidate, context))
            },
        ))
    }

    /// Wraps a predicate that may fail.
    #[must_use]
    pub fn fallible<F>(predicate: F) -> Self
    where
        F: Fn(Candidate<'_>, &ConstraintContext<'_>) -> Result<bool, ConstraintError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Evaluates the predicate.
    ///
    /// # Errors
    ///
    /// Returns the predicate's own error when it fails.
    pub fn evaluate(
        &self,
        candidate: Candidate<'_>,
        context: &ConstraintContext<'_>,
    ) -> Result<bool, ConstraintError> {
        (self.0)(candidate, context)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Constraint(..)")
    }
}

/// Holds when every constraint holds. An empty list holds.
#[must_use]
pub fn and(constraints: impl IntoIterator<Item = Constraint>) -> Constraint {
    let all: Vec<Constraint> = constraints.into_iter().collect();
    Constraint::fallible(move |candidate, context| {
        for constraint in &all {
            if !constraint.evaluate(candidate, context)? {
                return Ok(false);
            }
        }
        Ok(true)
    })
}

/// Holds when any constraint holds. An empty list does not hold.
#[must_use]
pub fn or(constraints: impl IntoIterator<Item = Constraint>) -> Constraint {
    let any: Vec<Constraint> = constraints.into_iter().collect();
    Constraint::fallible(move |candidate, context| {
        for constraint in &any {
            if constraint.evaluate(candidate, context)? {
                return Ok(true);
            }
        }
        Ok(false)
    })
}

/// Holds when the constraint does not.
#[must_use]
pub fn not(constraint: Constraint) -> Constraint {
    Constraint::fallible(move |candidate, context| {
        constraint.evaluate(candidate, context).map(|held| !held)
    })
}
