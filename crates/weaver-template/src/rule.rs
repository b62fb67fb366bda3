//! Rewrite rules and their composition.
//!
//! A [`Rewrite`] is offered one node at a time by an external visitor and
//! either declines it (`Ok(None)`) or returns its replacement. Rules compose
//! with [`Rewrite::and_then`] and [`Rewrite::or_else`]; visitors written as
//! a [`Recipe`] join the same algebra through [`from_recipe`].

use std::fmt;
use std::sync::Arc;

use tracing::trace;
use weaver_syntax::{Cursor, SyntaxNode};

use crate::bindings::MatchResult;
use crate::error::TemplateError;
use crate::pattern::Pattern;
use crate::template::Template;

const RULE_TARGET: &str = "weaver_template::rule";

/// A node-level rewrite.
pub trait Rewrite: Send + Sync {
    /// Offers `node` to the rewrite.
    ///
    /// # Errors
    ///
    /// Returns an error when a replacement cannot be materialised. Declining
    /// a node is not an error.
    fn try_on(
        &self,
        node: &SyntaxNode,
        cursor: Option<&Cursor<'_>>,
    ) -> Result<Option<SyntaxNode>, TemplateError>;

    /// Runs `next` on the replacement produced by this rewrite.
    ///
    /// When `next` declines, this rewrite's replacement stands. When this
    /// rewrite declines, `next` is not attempted.
    #[must_use]
    fn and_then<N: Rewrite>(self, next: N) -> AndThen<Self, N>
    where
        Self: Sized,
    {
        AndThen { first: self, next }
    }

    /// Runs `alternative` on the original node when this rewrite declines.
    #[must_use]
    fn or_else<A: Rewrite>(self, alternative: A) -> OrElse<Self, A>
    where
        Self: Sized,
    {
        OrElse {
            first: self,
            alternative,
        }
    }

    /// Erases the rewrite's type.
    #[must_use]
    fn boxed(self) -> Box<dyn Rewrite>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

impl<T: Rewrite + ?Sized> Rewrite for Box<T> {
    fn try_on(
        &self,
        node: &SyntaxNode,
        cursor: Option<&Cursor<'_>>,
    ) -> Result<Option<SyntaxNode>, TemplateError> {
        (**self).try_on(node, cursor)
    }
}

impl<T: Rewrite + ?Sized> Rewrite for Arc<T> {
    fn try_on(
        &self,
        node: &SyntaxNode,
        cursor: Option<&Cursor<'_>>,
    ) -> Result<Option<SyntaxNode>, TemplateError> {
        (**self).try_on(node, cursor)
    }
}

impl<T: Rewrite + ?Sized> Rewrite for &T {
    fn try_on(
        &self,
        node: &SyntaxNode,
        cursor: Option<&Cursor<'_>>,
    ) -> Result<Option<SyntaxNode>, TemplateError> {
        (**self).try_on(node, cursor)
    }
}

type PreMatch = Arc<dyn Fn(&SyntaxNode, Option<&Cursor<'_>>) -> bool + Send + Sync>;
type PostMatch = Arc<dyn Fn(&SyntaxNode, &MatchResult, Option<&Cursor<'_>>) -> bool + Send + Sync>;

/// Replaces nodes matching any of its patterns with its template.
#[derive(Clone)]
pub struct RewriteRule {
    before: Vec<Pattern>,
    after: Template,
    pre_match: Option<PreMatch>,
    post_match: Option<PostMatch>,
}

impl RewriteRule {
    /// Starts building a rule.
    #[must_use]
    pub fn builder() -> RewriteRuleBuilder {
        RewriteRuleBuilder::default()
    }

    /// Returns the patterns, in the order they are tried.
    #[must_use]
    pub fn before(&self) -> &[Pattern] {
        &self.before
    }

    /// Returns the replacement template.
    #[must_use]
    pub const fn after(&self) -> &Template {
        &self.after
    }
}

impl Rewrite for RewriteRule {
    fn try_on(
        &self,
        node: &SyntaxNode,
        cursor: Option<&Cursor<'_>>,
    ) -> Result<Option<SyntaxNode>, TemplateError> {
        if let Some(pre_match) = &self.pre_match
            && !pre_match(node, cursor)
        {
            trace!(target: RULE_TARGET, kind = node.kind(), "pre-match declined node");
            return Ok(None);
        }

        for (position, pattern) in self.before.iter().enumerate() {
            let Some(result) = pattern.matches(node, cursor) else {
                continue;
            };
            if let Some(post_match) = &self.post_match
                && !post_match(node, &result, cursor)
            {
                trace!(
                    target: RULE_TARGET,
                    pattern = position,
                    kind = node.kind(),
                    "post-match discarded match"
                );
                continue;
            }
            trace!(target: RULE_TARGET, pattern = position, kind = node.kind(), "rule matched");
            return self.after.apply(node, cursor, &result).map(Some);
        }
        Ok(None)
    }
}

impl fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteRule")
            .field("before", &self.before)
            .field("after", &self.after)
            .field("pre_match", &self.pre_match.is_some())
            .field("post_match", &self.post_match.is_some())
            .finish()
    }
}

/// Builder for [`RewriteRule`].
#[derive(Default)]
pub struct RewriteRuleBuilder {
    before: Vec<Pattern>,
    after: Option<Template>,
    pre_match: Option<PreMatch>,
    post_match: Option<PostMatch>,
}

impl RewriteRuleBuilder {
    /// Adds a pattern. Patterns are tried in the order added.
    #[must_use]
    pub fn before(mut self, pattern: Pattern) -> Self {
        self.before.push(pattern);
        self
    }

    /// Adds several patterns.
    #[must_use]
    pub fn before_any(mut self, patterns: impl IntoIterator<Item = Pattern>) -> Self {
        self.before.extend(patterns);
        self
    }

    /// Sets the replacement template.
    #[must_use]
    pub fn after(mut self, template: Template) -> Self {
        self.after = Some(template);
        self
    }

    /// Sets a predicate checked before any pattern is tried.
    #[must_use]
    pub fn pre_match(
        mut self,
        predicate: impl Fn(&SyntaxNode, Option<&Cursor<'_>>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.pre_match = Some(Arc::new(predicate));
        self
    }

    /// Sets a predicate that can discard a successful match.
    #[must_use]
    pub fn post_match(
        mut self,
        predicate: impl Fn(&SyntaxNode, &MatchResult, Option<&Cursor<'_>>) -> bool
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.post_match = Some(Arc::new(predicate));
        self
    }

    /// Builds the rule.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::IncompleteRule`] when no pattern or no
    /// template was given.
    pub fn build(self) -> Result<RewriteRule, TemplateError> {
        if self.before.is_empty() {
            return Err(TemplateError::incomplete_rule("at least one pattern is required"));
        }
        let Some(after) = self.after else {
            return Err(TemplateError::incomplete_rule("a replacement template is required"));
        };
        Ok(RewriteRule {
            before: self.before,
            after,
            pre_match: self.pre_match,
            post_match: self.post_match,
        })
    }
}

impl fmt::Debug for RewriteRuleBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteRuleBuilder")
            .field("before", &self.before.len())
            .field("after", &self.after.is_some())
            .finish_non_exhaustive()
    }
}

/// Sequential composition, built by [`Rewrite::and_then`].
#[derive(Debug, Clone)]
pub struct AndThen<F, N> {
    first: F,
    next: N,
}

impl<F: Rewrite, N: Rewrite> Rewrite for AndThen<F, N> {
    fn try_on(
        &self,
        node: &SyntaxNode,
        cursor: Option<&Cursor<'_>>,
    ) -> Result<Option<SyntaxNode>, TemplateError> {
        let Some(first) = self.first.try_on(node, cursor)? else {
            return Ok(None);
        };
        let rooted = Cursor::root(&first);
        let moved = cursor.map_or(rooted, |at| at.with_node(&first));
        let second = self.next.try_on(&first, Some(&moved))?;
        Ok(Some(second.unwrap_or(first)))
    }
}

/// Alternative composition, built by [`Rewrite::or_else`].
#[derive(Debug, Clone)]
pub struct OrElse<F, A> {
    first: F,
    alternative: A,
}

impl<F: Rewrite, A: Rewrite> Rewrite for OrElse<F, A> {
    fn try_on(
        &self,
        node: &SyntaxNode,
        cursor: Option<&Cursor<'_>>,
    ) -> Result<Option<SyntaxNode>, TemplateError> {
        if let Some(replacement) = self.first.try_on(node, cursor)? {
            return Ok(Some(replacement));
        }
        self.alternative.try_on(node, cursor)
    }
}

/// A tree visitor that returns the node it was given, possibly rewritten.
pub trait Recipe: Send + Sync {
    /// Visits `node`.
    ///
    /// # Errors
    ///
    /// Returns an error when the visit fails.
    fn visit(
        &self,
        node: &SyntaxNode,
        cursor: Option<&Cursor<'_>>,
    ) -> Result<SyntaxNode, TemplateError>;
}

impl<F> Recipe for F
where
    F: Fn(&SyntaxNode, Option<&Cursor<'_>>) -> Result<SyntaxNode, TemplateError> + Send + Sync,
{
    fn visit(
        &self,
        node: &SyntaxNode,
        cursor: Option<&Cursor<'_>>,
    ) -> Result<SyntaxNode, TemplateError> {
        self(node, cursor)
    }
}

/// A [`Recipe`] adapted to [`Rewrite`]; see [`from_recipe`].
#[derive(Debug, Clone)]
pub struct FromRecipe<R> {
    recipe: R,
}

impl<R: Recipe> Rewrite for FromRecipe<R> {
    fn try_on(
        &self,
        node: &SyntaxNode,
        cursor: Option<&Cursor<'_>>,
    ) -> Result<Option<SyntaxNode>, TemplateError> {
        let visited = self.recipe.visit(node, cursor)?;
        Ok((visited != *node).then_some(visited))
    }
}

/// Adapts a recipe to the rewrite contract.
///
/// A visit that returns the node unchanged counts as declining it.
#[must_use]
pub const fn from_recipe<R: Recipe>(recipe: R) -> FromRecipe<R> {
    FromRecipe { recipe }
}
