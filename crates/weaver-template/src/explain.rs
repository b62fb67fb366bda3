//! Match failure explanations and debug logs.
//!
//! When a match fails, [`MatchFailure`] says why and where: the reason, the
//! path of `kind#field[index]` steps from the pattern root to the point of
//! divergence, and what was expected against what was found. These types
//! serialise with serde so tooling can render them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bindings::MatchResult;

/// Why a match failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    /// Node kinds differ.
    KindMismatch,
    /// Leaf text, literal value, or a repeated binding differs.
    ValueMismatch,
    /// Sequence lengths differ or violate variadic bounds.
    ArrayLengthMismatch,
    /// A constraint returned `false`.
    ConstraintFailed,
    /// A constraint returned an error.
    ConstraintError,
    /// Attached types are incompatible.
    TypeMismatch,
}

impl FailureReason {
    /// Returns the kebab-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KindMismatch => "kind-mismatch",
            Self::ValueMismatch => "value-mismatch",
            Self::ArrayLengthMismatch => "array-length-mismatch",
            Self::ConstraintFailed => "constraint-failed",
            Self::ConstraintError => "constraint-error",
            Self::TypeMismatch => "type-mismatch",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step from a pattern node into one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    kind: String,
    field: Option<String>,
    index: Option<usize>,
}

impl PathStep {
    /// Creates a step.
    #[must_use]
    pub fn new(kind: impl Into<String>, field: Option<&str>, index: Option<usize>) -> Self {
        Self {
            kind: kind.into(),
            field: field.map(ToOwned::to_owned),
            index,
        }
    }

    /// Returns the kind of the node stepped out of.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the field stepped into.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the index among significant children.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.index
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.field.as_deref().unwrap_or("children"))?;
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

/// A structured explanation of a failed match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFailure {
    reason: FailureReason,
    path: Vec<PathStep>,
    expected: String,
    actual: String,
}

impl MatchFailure {
    pub(crate) fn new(
        reason: FailureReason,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            reason,
            path: Vec::new(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Prepends the step leading to the point of failure.
    #[must_use]
    pub(crate) fn within(mut self, step: PathStep) -> Self {
        self.path.insert(0, step);
        self
    }

    /// Returns the reason.
    #[must_use]
    pub const fn reason(&self) -> FailureReason {
        self.reason
    }

    /// Returns the steps from the pattern root, outermost first.
    #[must_use]
    pub fn path(&self) -> &[PathStep] {
        &self.path
    }

    /// Returns what the pattern expected.
    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Returns what the target held.
    #[must_use]
    pub fn actual(&self) -> &str {
        &self.actual
    }
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)?;
        if !self.path.is_empty() {
            f.write_str(" at ")?;
            for (position, step) in self.path.iter().enumerate() {
                if position > 0 {
                    f.write_str(" > ")?;
                }
                write!(f, "{step}")?;
            }
        }
        write!(f, ": expected {}, found {}", self.expected, self.actual)
    }
}

/// Append-only log of decisions made during one match call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugLog {
    entries: Vec<String>,
}

impl DebugLog {
    pub(crate) fn push(&mut self, entry: String) {
        self.entries.push(entry);
    }

    /// Returns the entries in order.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Returns whether nothing was logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-call matching options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    debug: Option<bool>,
}

impl MatchOptions {
    /// Overrides the debug setting of the pattern and the process default.
    #[must_use]
    pub const fn debug(self, enabled: bool) -> Self {
        Self {
            debug: Some(enabled),
        }
    }

    /// Returns the debug override.
    #[must_use]
    pub const fn debug_override(&self) -> Option<bool> {
        self.debug
    }
}

/// The full result of [`crate::Pattern::match_with_explanation`].
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub(crate) result: Result<MatchResult, MatchFailure>,
    pub(crate) debug_log: Option<DebugLog>,
}

impl MatchOutcome {
    /// Returns whether the pattern matched.
    #[must_use]
    pub const fn matched(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the bindings of a successful match.
    #[must_use]
    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref().ok()
    }

    /// Returns the explanation of a failed match.
    #[must_use]
    pub fn explanation(&self) -> Option<&MatchFailure> {
        self.result.as_ref().err()
    }

    /// Returns the debug log when debugging was enabled.
    #[must_use]
    pub const fn debug_log(&self) -> Option<&DebugLog> {
        self.debug_log.as_ref()
    }

    /// Consumes the outcome and returns the bindings of a successful match.
    #[must_use]
    pub fn into_result(self) -> Option<MatchResult> {
        self.result.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_renders_path_outermost_first() {
        let failure = MatchFailure::new(FailureReason::ArrayLengthMismatch, "3 children", "4 children")
            .within(PathStep::new("object_pattern", None, None))
            .within(PathStep::new("variable_declarator", Some("name"), Some(0)));

        assert_eq!(
            failure.to_string(),
            "array-length-mismatch at variable_declarator#name[0] > object_pattern#children: \
             expected 3 children, found 4 children"
        );
    }

    #[test]
    fn failure_serialises_with_kebab_case_reason() {
        let failure = MatchFailure::new(FailureReason::TypeMismatch, "number", "string");
        let json = serde_json::to_value(&failure).unwrap_or_else(|err| panic!("json: {err}"));
        assert_eq!(json["reason"], "type-mismatch");
        assert_eq!(json["path"], serde_json::json!([]));
    }
}
