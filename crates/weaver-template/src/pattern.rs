//! Compiled patterns.

use std::fmt;
use std::sync::Arc;

use weaver_syntax::{Cursor, SupportedLanguage, SyntaxNode};

use crate::bindings::MatchResult;
use crate::capture::{Capture, Part};
use crate::compile::{Compiled, Usage, compile};
use crate::compiler::{CompileConfig, Compiler};
use crate::error::TemplateError;
use crate::explain::{MatchOptions, MatchOutcome};
use crate::matcher;

/// A code fragment with captures, compiled for structural matching.
///
/// Patterns are immutable and cheap to clone; [`Self::configure`] returns
/// a recompiled copy.
#[derive(Clone)]
pub struct Pattern {
    compiled: Arc<Compiled>,
    parts: Arc<[Part]>,
    config: CompileConfig,
    compiler: Compiler,
}

impl Pattern {
    /// Starts assembling a pattern piece by piece.
    #[must_use]
    pub fn builder() -> PatternBuilder {
        PatternBuilder::default()
    }

    /// Compiles `parts` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the fragment does not compile.
    pub fn compile(
        compiler: &Compiler,
        parts: impl IntoIterator<Item = Part>,
    ) -> Result<Self, TemplateError> {
        Self::compile_with(compiler, parts, CompileConfig::default())
    }

    /// Compiles `parts` with `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the fragment does not compile.
    pub fn compile_with(
        compiler: &Compiler,
        parts: impl IntoIterator<Item = Part>,
        config: CompileConfig,
    ) -> Result<Self, TemplateError> {
        let shared: Arc<[Part]> = parts.into_iter().collect();
        let compiled = compile(compiler, &shared, &config, Usage::Pattern)?;
        Ok(Self {
            compiled: Arc::new(compiled),
            parts: shared,
            config,
            compiler: compiler.clone(),
        })
    }

    /// Returns a copy recompiled with `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the fragment does not compile under `config`.
    pub fn configure(&self, config: CompileConfig) -> Result<Self, TemplateError> {
        let compiled = compile(&self.compiler, &self.parts, &config, Usage::Pattern)?;
        Ok(Self {
            compiled: Arc::new(compiled),
            parts: Arc::clone(&self.parts),
            config,
            compiler: self.compiler.clone(),
        })
    }

    /// Returns the distinct captures in order of first appearance.
    #[must_use]
    pub fn captures(&self) -> &[Capture] {
        &self.compiled.captures
    }

    /// Returns the assembled source with placeholders.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.compiled.source
    }

    /// Returns the language the pattern was compiled for.
    #[must_use]
    pub fn language(&self) -> SupportedLanguage {
        self.compiled.language
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Returns the compiler the pattern was built with.
    #[must_use]
    pub const fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Matches the pattern against `target`.
    ///
    /// `cursor` locates `target` in its tree; constraints receive it.
    #[must_use]
    pub fn matches(&self, target: &SyntaxNode, cursor: Option<&Cursor<'_>>) -> Option<MatchResult> {
        self.match_with_explanation(target, cursor, &MatchOptions::default())
            .into_result()
    }

    /// Matches the pattern against `target` and explains a failure.
    #[must_use]
    pub fn match_with_explanation(
        &self,
        target: &SyntaxNode,
        cursor: Option<&Cursor<'_>>,
        options: &MatchOptions,
    ) -> MatchOutcome {
        let debug = matcher::debug_enabled(self, options);
        matcher::run(
            &self.compiled,
            self.config.is_lenient(),
            target,
            cursor,
            debug,
        )
    }

    /// Returns the first node under `root`, in pre-order, that matches.
    #[must_use]
    pub fn find_first(&self, root: &SyntaxNode) -> Option<Found> {
        let mut found = Vec::new();
        self.search(root, &Cursor::root(root), &mut found, true);
        found.into_iter().next()
    }

    /// Returns every node under `root`, in pre-order, that matches.
    #[must_use]
    pub fn find_all(&self, root: &SyntaxNode) -> Vec<Found> {
        let mut found = Vec::new();
        self.search(root, &Cursor::root(root), &mut found, false);
        found
    }

    fn search(
        &self,
        node: &SyntaxNode,
        cursor: &Cursor<'_>,
        found: &mut Vec<Found>,
        first_only: bool,
    ) -> bool {
        if let Some(result) = self.matches(node, Some(cursor)) {
            found.push(Found {
                node: node.clone(),
                result,
            });
            if first_only {
                return true;
            }
        }
        node.children().iter().any(|child| {
            let child_cursor = cursor.child(child);
            self.search(child, &child_cursor, found, first_only)
        })
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("language", &self.compiled.language)
            .field("source", &self.compiled.source)
            .field("captures", &self.compiled.captures)
            .finish_non_exhaustive()
    }
}

/// A node found by [`Pattern::find_first`] or [`Pattern::find_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    node: SyntaxNode,
    result: MatchResult,
}

impl Found {
    /// Returns the matching node.
    #[must_use]
    pub const fn node(&self) -> &SyntaxNode {
        &self.node
    }

    /// Returns the bindings.
    #[must_use]
    pub const fn result(&self) -> &MatchResult {
        &self.result
    }
}

/// Assembles a [`Pattern`] from code and parameters.
#[derive(Debug, Default)]
pub struct PatternBuilder {
    parts: Vec<Part>,
    config: CompileConfig,
}

impl PatternBuilder {
    /// Appends literal code.
    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.parts.push(Part::Code(code.into()));
        self
    }

    /// Appends a parameter: a capture, a raw splice or a subtree.
    #[must_use]
    pub fn param(mut self, param: impl Into<Part>) -> Self {
        self.parts.push(param.into());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn configure(mut self, config: CompileConfig) -> Self {
        self.config = config;
        self
    }

    /// Compiles the pattern.
    ///
    /// # Errors
    ///
    /// Returns an error when the fragment does not compile.
    pub fn build(self, compiler: &Compiler) -> Result<Pattern, TemplateError> {
        Pattern::compile_with(compiler, self.parts, self.config)
    }
}

/// Compiles a [`Pattern`] from alternating code and parameters.
///
/// ```
/// use weaver_syntax::SupportedLanguage;
/// use weaver_template::{Compiler, capture, pattern};
///
/// let compiler = Compiler::for_language(SupportedLanguage::TypeScript);
/// let args = capture("args");
/// let found = pattern!(compiler; "foo(", &args, ")")?;
/// assert_eq!(found.captures(), [args]);
/// # Ok::<(), weaver_template::TemplateError>(())
/// ```
#[macro_export]
macro_rules! pattern {
    ($compiler:expr; $($part:expr),* $(,)?) => {
        $crate::Pattern::compile(&$compiler, [$($crate::Part::from($part)),*])
    };
}
