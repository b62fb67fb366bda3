//! Values bound to captures.

use weaver_syntax::SyntaxNode;

use crate::capture::Capture;

/// A run of sibling nodes bound to a variadic capture.
///
/// `separators` holds the original separator tokens between consecutive
/// nodes, so splicing the run reproduces its punctuation and spacing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeRun {
    nodes: Vec<SyntaxNode>,
    separators: Vec<SyntaxNode>,
}

impl NodeRun {
    /// Creates a run from nodes and the separators between them.
    #[must_use]
    pub const fn new(nodes: Vec<SyntaxNode>, separators: Vec<SyntaxNode>) -> Self {
        Self { nodes, separators }
    }

    /// Returns the nodes.
    #[must_use]
    pub fn nodes(&self) -> &[SyntaxNode] {
        &self.nodes
    }

    /// Returns the separators found between the nodes.
    #[must_use]
    pub fn separators(&self) -> &[SyntaxNode] {
        &self.separators
    }

    /// Returns the number of nodes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the run is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl From<Vec<SyntaxNode>> for NodeRun {
    fn from(nodes: Vec<SyntaxNode>) -> Self {
        Self::new(nodes, Vec::new())
    }
}

/// The value bound to a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    /// A scalar binding.
    Node(SyntaxNode),
    /// A variadic binding.
    Nodes(NodeRun),
}

impl Bound {
    /// Returns the node of a scalar binding.
    #[must_use]
    pub const fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Nodes(_) => None,
        }
    }

    /// Returns the run of a variadic binding.
    #[must_use]
    pub const fn as_run(&self) -> Option<&NodeRun> {
        match self {
            Self::Node(_) => None,
            Self::Nodes(run) => Some(run),
        }
    }
}

impl From<SyntaxNode> for Bound {
    fn from(node: SyntaxNode) -> Self {
        Self::Node(node)
    }
}

impl From<Vec<SyntaxNode>> for Bound {
    fn from(nodes: Vec<SyntaxNode>) -> Self {
        Self::Nodes(NodeRun::from(nodes))
    }
}

/// Anything templates can look bindings up in.
pub trait BindingSource {
    /// Returns the value bound to `capture`.
    ///
    /// Implementations look the capture up by identity first and fall back
    /// to its name.
    fn lookup(&self, capture: &Capture) -> Option<&Bound>;
}

fn lookup_in<'a>(entries: &'a [(Capture, Bound)], capture: &Capture) -> Option<&'a Bound> {
    entries
        .iter()
        .find(|(bound, _)| bound == capture)
        .or_else(|| {
            let name = capture.name()?;
            entries.iter().find(|(bound, _)| bound.name() == Some(name))
        })
        .map(|(_, value)| value)
}

/// Bindings recorded by a successful match, in order of binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    bindings: Vec<(Capture, Bound)>,
}

impl MatchResult {
    pub(crate) const fn from_bindings(bindings: Vec<(Capture, Bound)>) -> Self {
        Self { bindings }
    }

    /// Returns the value bound to `capture`, by identity.
    #[must_use]
    pub fn get(&self, capture: &Capture) -> Option<&Bound> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == capture)
            .map(|(_, value)| value)
    }

    /// Returns the value bound to the capture named `name`.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Bound> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound.name() == Some(name))
            .map(|(_, value)| value)
    }

    /// Returns the node bound to a scalar capture.
    #[must_use]
    pub fn node(&self, capture: &Capture) -> Option<&SyntaxNode> {
        self.get(capture).and_then(Bound::as_node)
    }

    /// Returns the nodes bound to a variadic capture.
    #[must_use]
    pub fn nodes(&self, capture: &Capture) -> Option<&[SyntaxNode]> {
        self.get(capture)
            .and_then(Bound::as_run)
            .map(NodeRun::nodes)
    }

    /// Iterates over the bindings in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Capture, &Bound)> {
        self.bindings.iter().map(|(capture, bound)| (capture, bound))
    }

    /// Returns the number of bindings.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns whether nothing was bound.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl BindingSource for MatchResult {
    fn lookup(&self, capture: &Capture) -> Option<&Bound> {
        lookup_in(&self.bindings, capture)
    }
}

#[derive(Debug, Clone)]
enum Key {
    Capture(Capture),
    Name(String),
}

/// Explicit bindings for applying a template without a match.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<(Key, Bound)>,
}

impl Bindings {
    /// Creates an empty set of bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a capture.
    #[must_use]
    pub fn bind(mut self, capture: &Capture, value: impl Into<Bound>) -> Self {
        self.entries.push((Key::Capture(capture.clone()), value.into()));
        self
    }

    /// Binds whatever capture carries `name`.
    #[must_use]
    pub fn bind_name(mut self, name: impl Into<String>, value: impl Into<Bound>) -> Self {
        self.entries.push((Key::Name(name.into()), value.into()));
        self
    }
}

impl BindingSource for Bindings {
    fn lookup(&self, capture: &Capture) -> Option<&Bound> {
        let by_identity = self.entries.iter().find_map(|(key, value)| match key {
            Key::Capture(bound) if bound == capture => Some(value),
            Key::Capture(_) | Key::Name(_) => None,
        });
        by_identity.or_else(|| {
            let name = capture.name()?;
            self.entries.iter().find_map(|(key, value)| match key {
                Key::Name(bound) if bound == name => Some(value),
                Key::Capture(bound) if bound.name() == Some(name) => Some(value),
                Key::Capture(_) | Key::Name(_) => None,
            })
        })
    }
}

impl From<MatchResult> for Bindings {
    fn from(result: MatchResult) -> Self {
        Self {
            entries: result
                .bindings
                .into_iter()
                .map(|(capture, bound)| (Key::Capture(capture), bound))
                .collect(),
        }
    }
}
