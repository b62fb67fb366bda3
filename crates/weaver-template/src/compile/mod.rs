//! Fragment compilation shared by patterns and templates.
//!
//! A fragment is assembled into source text with every parameter replaced by
//! a numbered placeholder, parsed by the front end, reduced to its single
//! root statement or expression, and relabelled so that placeholder leaves
//! become slots. Slots are then promoted into wrappers that hold nothing
//! else, and literal subtree parameters are inlined.

mod propagate;
mod tree;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tracing::debug;
use weaver_syntax::{FRAGMENT_WRAPPER, SupportedLanguage, SyntaxNode};

use crate::capture::{Capture, Param, Part};
use crate::compiler::{CompileConfig, Compiler};
use crate::error::TemplateError;
use crate::front_end::FrontEnd;
use crate::placeholders::{check_collision, placeholder};

pub(crate) use propagate::propagate;
pub(crate) use tree::{Shape, Slot, SlotTree};

const COMPILE_TARGET: &str = "weaver_template::compile";

/// What a fragment is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Usage {
    /// Matched against targets: only variadic slots take spread wrappers.
    Pattern,
    /// Materialised: any slot may receive a run, so every spread is kept.
    Template,
}

/// A compiled fragment.
#[derive(Debug)]
pub(crate) struct Compiled {
    pub(crate) language: SupportedLanguage,
    pub(crate) source: String,
    pub(crate) root: SlotTree,
    /// Capture behind each slot index; `None` for inlined subtrees.
    slots: Vec<Option<Capture>>,
    /// Distinct captures in order of first appearance.
    pub(crate) captures: Vec<Capture>,
    /// Whether some capture occupies more than one slot.
    pub(crate) repeated_captures: bool,
}

impl Compiled {
    pub(crate) fn capture(&self, index: usize) -> Option<&Capture> {
        self.slots.get(index).and_then(Option::as_ref)
    }
}

/// Compiles `parts` with the front end chosen for `config`.
pub(crate) fn compile(
    compiler: &Compiler,
    parts: &[Part],
    config: &CompileConfig,
    usage: Usage,
) -> Result<Compiled, TemplateError> {
    let front_end = compiler.front_end_for(config)?;
    let language = front_end.language();
    let assembled = assemble(parts)?;
    debug!(
        target: COMPILE_TARGET,
        language = %language,
        source = %assembled.source,
        "compiling fragment"
    );

    let root = parse_root(front_end.as_ref(), &assembled.source, config.context())?;
    let mut found = BTreeSet::new();
    let relabelled = SlotTree::relabel(&root, &mut found);
    for (index, param) in assembled.params.iter().enumerate() {
        if !found.contains(&index) {
            return Err(TemplateError::missing_placeholder(param_name(param)));
        }
    }

    let spreads = |index: usize| {
        matches!(
            assembled.params.get(index),
            Some(Param::Capture(found_capture))
                if usage == Usage::Template || found_capture.is_variadic()
        )
    };
    let promoted = propagate(&relabelled, &spreads);
    let inlined = tree::inline(promoted, &|index| match assembled.params.get(index) {
        Some(Param::Node(node)) => Some(node.clone()),
        _ => None,
    });

    let slots: Vec<Option<Capture>> = assembled
        .params
        .into_iter()
        .map(|param| match param {
            Param::Capture(found_capture) => Some(found_capture),
            Param::Raw(_) | Param::Node(_) => None,
        })
        .collect();
    let mut uses: HashMap<&Capture, usize> = HashMap::new();
    let mut captures = Vec::new();
    for capture in slots.iter().flatten() {
        let count = uses.entry(capture).or_insert(0);
        if *count == 0 {
            captures.push(capture.clone());
        }
        *count += 1;
    }
    let repeated_captures = uses.values().any(|count| *count > 1);

    Ok(Compiled {
        language,
        source: assembled.source,
        root: inlined,
        slots,
        captures,
        repeated_captures,
    })
}

struct Assembled {
    source: String,
    params: Vec<Param>,
}

fn assemble(parts: &[Part]) -> Result<Assembled, TemplateError> {
    let mut source = String::new();
    let mut params = Vec::new();
    for part in parts {
        match part {
            Part::Code(code) => {
                check_collision(code)?;
                source.push_str(code);
            }
            Part::Param(Param::Raw(raw)) => {
                check_collision(raw.text())?;
                source.push_str(raw.text());
            }
            Part::Param(param) => {
                source.push_str(&placeholder(params.len()));
                params.push(param.clone());
            }
        }
    }
    Ok(Assembled { source, params })
}

fn param_name(param: &Param) -> String {
    match param {
        Param::Capture(capture) => capture.display_name(),
        Param::Raw(raw) => format!("raw `{}`", raw.text()),
        Param::Node(node) => node.describe(),
    }
}

/// Parses a fragment and returns its single root statement or expression.
fn parse_root(
    front_end: &dyn FrontEnd,
    source: &str,
    context: &[String],
) -> Result<SyntaxNode, TemplateError> {
    let language = front_end.language();
    let path = Path::new(language.fragment_path());

    let direct = front_end.parse(source, path, context)?;
    if !direct.has_errors()
        && let Some(root) = single_statement(direct.root())
    {
        return Ok(unwrap_expression(root, false));
    }

    let wrapped = language.wrap_fragment(source);
    let parsed = front_end.parse(wrapped.source(), path, context)?;
    if let Some(error) = parsed.errors().first() {
        return Err(TemplateError::fragment_compile(
            language,
            format!(
                "`{}` does not parse: {} near `{}`",
                source.trim(),
                error.message,
                error.context
            ),
        ));
    }
    let root = wrapper_body(parsed.root())
        .and_then(single_statement)
        .ok_or_else(|| {
            TemplateError::fragment_compile(
                language,
                format!(
                    "`{}` must contain exactly one statement or expression",
                    source.trim()
                ),
            )
        })?;
    Ok(unwrap_expression(root, wrapped.added_terminator()))
}

fn single_statement(container: &SyntaxNode) -> Option<&SyntaxNode> {
    let mut named = container
        .significant_children()
        .filter(|child| child.is_named());
    let only = named.next()?;
    named.next().is_none().then_some(only)
}

fn wrapper_body(root: &SyntaxNode) -> Option<&SyntaxNode> {
    root.named_children()
        .find(|child| {
            child
                .child_by_field("name")
                .is_some_and(|name| name.text() == FRAGMENT_WRAPPER)
        })
        .and_then(|function| function.child_by_field("body"))
}

/// Reduces an expression statement to its expression when the fragment did
/// not spell the terminator itself.
fn unwrap_expression(root: &SyntaxNode, added_terminator: bool) -> SyntaxNode {
    if root.kind() == "expression_statement" {
        let explicit_semicolon = root.children().iter().any(|child| child.kind() == ";");
        if (!explicit_semicolon || added_terminator)
            && let Some(expression) = single_statement(root)
        {
            return expression.clone().with_field(None);
        }
    }
    root.clone().with_field(None)
}
