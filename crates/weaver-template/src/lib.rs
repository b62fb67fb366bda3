//! Structural pattern matching and template substitution over lossless
//! syntax trees.
//!
//! Patterns and templates are code fragments interleaved with parameters.
//! A fragment is compiled once, by re-parsing it with numbered placeholders
//! standing in for its parameters, into a tree with slots. Matching walks a
//! pattern's tree against a target node and binds captures; materialising a
//! template fills its slots from those bindings and fits the result to the
//! site it replaces.
//!
//! The building blocks are:
//!
//! - [`Capture`] and [`Constraint`] describe what a parameter may bind,
//! - [`Pattern`] matches and explains failures through [`MatchOutcome`],
//! - [`Template`] materialises replacements from [`MatchResult`] or
//!   explicit [`Bindings`],
//! - [`RewriteRule`] pairs the two behind the [`Rewrite`] trait, which
//!   composes with [`Rewrite::and_then`] and [`Rewrite::or_else`],
//! - [`Compiler`] owns the [`FrontEnd`] and the shared [`WorkspaceCache`].
//!
//! The engine never walks whole trees on its own: a host visitor offers
//! nodes, with a [`weaver_syntax::Cursor`] locating each, and applies the
//! replacements it gets back.
//!
//! # Example
//!
//! ```
//! use weaver_syntax::{Parser, SupportedLanguage};
//! use weaver_template::{Capture, Compiler, Rewrite, RewriteRule, pattern, template};
//!
//! let compiler = Compiler::for_language(SupportedLanguage::TypeScript);
//! let args = Capture::builder().name("args").variadic().build()?;
//! let rule = RewriteRule::builder()
//!     .before(pattern!(compiler; "foo(", &args, ")")?)
//!     .after(template!(compiler; "bar(", &args, ")")?)
//!     .build()?;
//!
//! let tree = Parser::new(SupportedLanguage::TypeScript)?.parse_tree("foo(1, 2);")?;
//! let call = tree
//!     .root()
//!     .descendants()
//!     .find(|node| node.kind() == "call_expression");
//! let replaced = match call {
//!     Some(node) => rule.try_on(node, None)?,
//!     None => None,
//! };
//! assert_eq!(replaced.map(|node| node.text()).as_deref(), Some("bar(1, 2)"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod bindings;
mod capture;
mod compile;
mod compiler;
mod constraint;
mod error;
mod explain;
mod front_end;
mod matcher;
mod pattern;
mod placeholders;
mod rule;
mod template;
mod workspace;

pub use bindings::{BindingSource, Bindings, Bound, MatchResult, NodeRun};
pub use capture::{Arity, Capture, CaptureBuilder, Param, Part, Raw, any, capture, param, raw};
pub use compiler::{CompileConfig, Compiler, DEBUG_ENV_VAR, DebugDefault};
pub use constraint::{Candidate, Constraint, ConstraintContext, ConstraintError, and, not, or};
pub use error::TemplateError;
pub use explain::{DebugLog, FailureReason, MatchFailure, MatchOptions, MatchOutcome, PathStep};
pub use front_end::{FrontEnd, TreeSitterFrontEnd};
pub use matcher::Matcher;
pub use pattern::{Found, Pattern, PatternBuilder};
pub use placeholders::Metavariables;
pub use rule::{
    AndThen, FromRecipe, OrElse, Recipe, Rewrite, RewriteRule, RewriteRuleBuilder, from_recipe,
};
pub use template::{Template, TemplateBuilder, flatten_block};
pub use workspace::{DependencyManifest, WorkspaceCache, WorkspaceError, WorkspaceProvider};

#[cfg(test)]
mod tests;
