//! Template materialisation.
//!
//! A template is a compiled fragment whose slots are filled from bindings.
//! Scalar slots take the bound node; variadic slots splice the bound run
//! into the surrounding sequence, reusing the original separators where
//! the run carries them. A run under a spread marker gets the marker on
//! every element. The materialised root replaces the original node:
//! it takes the original's prefix and field and is coerced to the
//! statement or expression category of its site.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use weaver_syntax::{Cursor, SupportedLanguage, SyntaxCategory, SyntaxNode};

use crate::bindings::{BindingSource, Bound};
use crate::capture::{Capture, Part};
use crate::compile::{Compiled, Shape, Slot, SlotTree, Usage, compile};
use crate::compiler::{CompileConfig, Compiler};
use crate::error::TemplateError;

const TEMPLATE_TARGET: &str = "weaver_template::template";

/// Parent kinds whose elements are separated by commas.
const COMMA_LISTS: &[&str] = &[
    "arguments",
    "argument_list",
    "array",
    "array_expression",
    "array_pattern",
    "dictionary",
    "expression_list",
    "formal_parameters",
    "list",
    "named_imports",
    "object",
    "object_pattern",
    "parameters",
    "set",
    "tuple",
    "tuple_expression",
    "type_arguments",
    "type_parameters",
];

/// A code fragment with parameters, compiled for materialisation.
#[derive(Clone)]
pub struct Template {
    compiled: Arc<Compiled>,
    parts: Arc<[Part]>,
    config: CompileConfig,
    compiler: Compiler,
}

impl Template {
    /// Starts assembling a template piece by piece.
    #[must_use]
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
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
        let compiled = compile(compiler, &shared, &config, Usage::Template)?;
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
        let compiled = compile(&self.compiler, &self.parts, &config, Usage::Template)?;
        Ok(Self {
            compiled: Arc::new(compiled),
            parts: Arc::clone(&self.parts),
            config,
            compiler: self.compiler.clone(),
        })
    }

    /// Returns the distinct parameters in order of first appearance.
    #[must_use]
    pub fn captures(&self) -> &[Capture] {
        &self.compiled.captures
    }

    /// Returns the assembled source with placeholders.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.compiled.source
    }

    /// Returns the language the template was compiled for.
    #[must_use]
    pub fn language(&self) -> SupportedLanguage {
        self.compiled.language
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Materialises the template as a replacement for `original`.
    ///
    /// `cursor` locates `original` in its tree and decides whether the
    /// replacement sits in statement or expression position. Without a
    /// cursor the original's own category is used.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnboundParameter`] when a parameter has no
    /// value in `bindings`, and [`TemplateError::RootArity`] when the
    /// template does not produce exactly one node.
    pub fn apply<B>(
        &self,
        original: &SyntaxNode,
        cursor: Option<&Cursor<'_>>,
        bindings: &B,
    ) -> Result<SyntaxNode, TemplateError>
    where
        B: BindingSource + ?Sized,
    {
        let materialiser = Materialiser {
            compiled: &self.compiled,
            bindings,
        };
        let mut produced = materialiser.root()?;
        let root = match (produced.pop(), produced.is_empty()) {
            (Some(root), true) => root,
            (None, _) => return Err(TemplateError::RootArity { count: 0 }),
            (Some(_), false) => {
                return Err(TemplateError::RootArity {
                    count: produced.len() + 1,
                });
            }
        };

        let placed = root
            .with_prefix(original.prefix())
            .with_field(original.field());
        let coerced = coerce(placed, original, cursor);
        debug!(
            target: TEMPLATE_TARGET,
            original = original.kind(),
            replacement = coerced.kind(),
            "template applied"
        );
        Ok(coerced)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("language", &self.compiled.language)
            .field("source", &self.compiled.source)
            .field("captures", &self.compiled.captures)
            .finish_non_exhaustive()
    }
}

/// Walks a compiled tree, replacing slots with bound values.
struct Materialiser<'a, B: ?Sized> {
    compiled: &'a Compiled,
    bindings: &'a B,
}

impl<B: BindingSource + ?Sized> Materialiser<'_, B> {
    fn root(&self) -> Result<Vec<SyntaxNode>, TemplateError> {
        match &self.compiled.root {
            SlotTree::Slot(slot) => Ok(match self.resolve(slot)? {
                Bound::Node(node) => vec![place(node.clone(), slot)],
                Bound::Nodes(run) => run
                    .nodes()
                    .iter()
                    .map(|node| place(node.clone(), slot))
                    .collect(),
            }),
            SlotTree::Node(shape) => Ok(vec![self.build(shape)?]),
        }
    }

    fn resolve(&self, slot: &Slot) -> Result<&Bound, TemplateError> {
        let Some(capture) = self.compiled.capture(slot.index) else {
            return Err(TemplateError::unbound_parameter(format!("#{}", slot.index)));
        };
        self.bindings
            .lookup(capture)
            .ok_or_else(|| TemplateError::unbound_parameter(capture.display_name()))
    }

    fn build(&self, shape: &Shape) -> Result<SyntaxNode, TemplateError> {
        let comma_list = COMMA_LISTS.contains(&shape.node.kind())
            || shape
                .children
                .iter()
                .any(|child| child.kind() == Some(","));

        let mut children = Vec::with_capacity(shape.children.len());
        // Prefix of an empty splice that still owes its following separator.
        let mut pending: Option<&str> = None;
        // Prefix to move onto the node after a dropped separator.
        let mut carried: Option<&str> = None;
        for child in &shape.children {
            if let Some(prefix) = pending.take()
                && child.is_separator()
            {
                carried = Some(prefix);
                continue;
            }
            let next = match child {
                SlotTree::Node(inner) => vec![self.build(inner)?],
                SlotTree::Slot(slot) => match self.resolve(slot)? {
                    Bound::Node(node) => vec![place(node.clone(), slot)],
                    Bound::Nodes(run) if run.is_empty() => {
                        if children.last().is_some_and(SyntaxNode::is_separator) {
                            children.pop();
                        } else {
                            pending = Some(&slot.prefix);
                        }
                        continue;
                    }
                    Bound::Nodes(run) => splice(run.nodes(), run.separators(), slot, comma_list),
                },
            };
            for node in next {
                match carried.take() {
                    Some(prefix) if !node.is_separator() => children.push(node.with_prefix(prefix)),
                    _ => children.push(node),
                }
            }
        }
        Ok(shape.node.clone().with_children(children))
    }
}

fn place(node: SyntaxNode, slot: &Slot) -> SyntaxNode {
    dress(node, slot)
        .with_prefix(&slot.prefix)
        .with_field(slot.field)
}

/// Rebuilds the slot's spread wrapper, if any, around a bound node.
fn dress(node: SyntaxNode, slot: &Slot) -> SyntaxNode {
    if let Some(wrapper) = slot.spread.as_deref() {
        return wrapper.wrap_element(&node);
    }
    node
}

/// Lays out a run with separators between its nodes.
fn splice(
    nodes: &[SyntaxNode],
    separators: &[SyntaxNode],
    slot: &Slot,
    comma_list: bool,
) -> Vec<SyntaxNode> {
    let mut out = Vec::with_capacity(nodes.len() * 2);
    for (position, node) in nodes.iter().enumerate() {
        let Some(before) = position.checked_sub(1) else {
            out.push(place(node.clone(), slot));
            continue;
        };
        let element = dress(node.clone(), slot).with_field(slot.field);
        match separators.get(before) {
            Some(separator) => {
                out.push(separator.clone());
                out.push(element);
            }
            None if comma_list => {
                out.push(SyntaxNode::anonymous(",", ""));
                if element.prefix().is_empty() {
                    out.push(element.with_prefix(" "));
                } else {
                    out.push(element);
                }
            }
            None => out.push(element),
        }
    }
    out
}

/// Wraps the replacement so it fits the category of its site.
fn coerce(replacement: SyntaxNode, original: &SyntaxNode, cursor: Option<&Cursor<'_>>) -> SyntaxNode {
    let in_statement_list = cursor
        .and_then(Cursor::parent_node)
        .is_some_and(|parent| SyntaxCategory::is_statement_container(parent.kind()));
    let site = if in_statement_list {
        SyntaxCategory::Statement
    } else {
        SyntaxCategory::of(original.kind())
    };

    let field = replacement.field();
    match (site, SyntaxCategory::of(replacement.kind())) {
        (SyntaxCategory::Statement, SyntaxCategory::Expression) => {
            let mut children = vec![replacement.with_field(None)];
            if original.children().last().is_some_and(|last| last.kind() == ";") {
                children.push(SyntaxNode::anonymous(";", ""));
            }
            SyntaxNode::branch("expression_statement", children).with_field(field)
        }
        (SyntaxCategory::Expression, SyntaxCategory::Statement) => {
            SyntaxNode::branch("statement_expression", vec![replacement.with_field(None)])
                .with_field(field)
        }
        _ => replacement,
    }
}

/// Splices blocks nested directly inside `block` into it.
///
/// A nested block is a direct child block or an expression statement whose
/// only significant child is a block. Its braces are dropped and its first
/// statement takes the nested block's prefix. Nesting is flattened
/// recursively; other statements are left untouched.
#[must_use]
pub fn flatten_block(block: &SyntaxNode) -> SyntaxNode {
    let mut children = Vec::with_capacity(block.children().len());
    for child in block.children() {
        splice_nested(child.clone(), &mut children);
    }
    block.clone().with_children(children)
}

fn nested_block(node: &SyntaxNode) -> Option<&SyntaxNode> {
    if SyntaxCategory::is_block(node.kind()) {
        return Some(node);
    }
    if node.kind() != "expression_statement" {
        return None;
    }
    let mut significant = node.significant_children();
    match (significant.next(), significant.next()) {
        (Some(only), None) if SyntaxCategory::is_block(only.kind()) => Some(only),
        _ => None,
    }
}

fn splice_nested(node: SyntaxNode, out: &mut Vec<SyntaxNode>) {
    let Some(inner) = nested_block(&node) else {
        out.push(node);
        return;
    };
    let prefix = node.prefix().to_owned();
    let statements: Vec<SyntaxNode> = inner
        .children()
        .iter()
        .filter(|child| child.is_named() || !matches!(child.kind(), "{" | "}"))
        .cloned()
        .collect();
    for (position, statement) in statements.into_iter().enumerate() {
        let placed = if position == 0 {
            statement.with_prefix(&prefix)
        } else {
            statement
        };
        splice_nested(placed, out);
    }
}

/// Assembles a [`Template`] from code and parameters.
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    parts: Vec<Part>,
    config: CompileConfig,
}

impl TemplateBuilder {
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

    /// Compiles the template.
    ///
    /// # Errors
    ///
    /// Returns an error when the fragment does not compile.
    pub fn build(self, compiler: &Compiler) -> Result<Template, TemplateError> {
        Template::compile_with(compiler, self.parts, self.config)
    }
}

/// Compiles a [`Template`] from alternating code and parameters.
///
/// ```
/// use weaver_syntax::SupportedLanguage;
/// use weaver_template::{Compiler, param, template};
///
/// let compiler = Compiler::for_language(SupportedLanguage::TypeScript);
/// let args = param("args");
/// let replacement = template!(compiler; "bar(", &args, ")")?;
/// assert_eq!(replacement.captures(), [args]);
/// # Ok::<(), weaver_template::TemplateError>(())
/// ```
#[macro_export]
macro_rules! template {
    ($compiler:expr; $($part:expr),* $(,)?) => {
        $crate::Template::compile(&$compiler, [$($crate::Part::from($part)),*])
    };
}
