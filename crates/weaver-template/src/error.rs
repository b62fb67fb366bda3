//! Error types for pattern and template construction and application.
//!
//! Configuration mistakes surface here at construction time. A pattern that
//! does not match is not an error; matching reports non-matches as values.

use thiserror::Error;
use weaver_syntax::{SupportedLanguage, SyntaxError};

use crate::workspace::WorkspaceError;

/// Errors from the template engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TemplateError {
    /// The front end failed to parse a fragment.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// A variadic capture was declared with `min` above `max`.
    #[error("invalid variadic bounds for {name}: min {min} exceeds max {max}")]
    InvalidBounds {
        /// Display name of the capture.
        name: String,
        /// Declared minimum.
        min: usize,
        /// Declared maximum.
        max: usize,
    },

    /// Literal fragment text contains the reserved placeholder prefix.
    #[error("fragment text must not contain the reserved prefix `{prefix}`")]
    PlaceholderCollision {
        /// The reserved prefix.
        prefix: &'static str,
    },

    /// A placeholder did not survive parsing as a leaf of its own.
    #[error("placeholder for {name} was not found in the parsed fragment")]
    MissingPlaceholder {
        /// Display name of the parameter.
        name: String,
    },

    /// The fragment parsed but does not form a usable pattern or template.
    #[error("invalid fragment for {language}: {message}")]
    FragmentCompile {
        /// Language the fragment was compiled for.
        language: SupportedLanguage,
        /// Description of the problem.
        message: String,
    },

    /// A metavariable spelling in fragment text is malformed.
    #[error("invalid metavariable syntax: {message}")]
    InvalidMetavariable {
        /// Description of the problem.
        message: String,
    },

    /// A rewrite rule was built without required parts.
    #[error("incomplete rewrite rule: {message}")]
    IncompleteRule {
        /// Description of what is missing.
        message: String,
    },

    /// A template slot had no bound value when applied.
    #[error("template parameter {name} has no bound value")]
    UnboundParameter {
        /// Display name of the parameter.
        name: String,
    },

    /// A template produced other than exactly one root node.
    #[error("template produced {count} root nodes; expected exactly one")]
    RootArity {
        /// Number of nodes produced.
        count: usize,
    },

    /// Dependencies were requested without a workspace cache.
    #[error("dependencies {manifest} require a workspace provider, but none is configured")]
    MissingWorkspaceProvider {
        /// Rendering of the requested manifest.
        manifest: String,
    },

    /// Provisioning a workspace failed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

impl TemplateError {
    /// Creates an invalid bounds error.
    #[must_use]
    pub fn invalid_bounds(name: impl Into<String>, min: usize, max: usize) -> Self {
        Self::InvalidBounds {
            name: name.into(),
            min,
            max,
        }
    }

    /// Creates a missing placeholder error.
    #[must_use]
    pub fn missing_placeholder(name: impl Into<String>) -> Self {
        Self::MissingPlaceholder { name: name.into() }
    }

    /// Creates a fragment compilation error.
    #[must_use]
    pub fn fragment_compile(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::FragmentCompile {
            language,
            message: message.into(),
        }
    }

    /// Creates an invalid metavariable error.
    #[must_use]
    pub fn invalid_metavariable(message: impl Into<String>) -> Self {
        Self::InvalidMetavariable {
            message: message.into(),
        }
    }

    /// Creates an incomplete rule error.
    #[must_use]
    pub fn incomplete_rule(message: impl Into<String>) -> Self {
        Self::IncompleteRule {
            message: message.into(),
        }
    }

    /// Creates an unbound parameter error.
    #[must_use]
    pub fn unbound_parameter(name: impl Into<String>) -> Self {
        Self::UnboundParameter { name: name.into() }
    }
}
