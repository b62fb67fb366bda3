//! Captures, raw splices, and the parts fragments are assembled from.
//!
//! A [`Capture`] is a named hole in a pattern. Its identity is the shared
//! allocation behind it: clones are the same capture, and two captures
//! built with the same name are different captures. Names only serve lookup
//! and diagnostics.
//!
//! Patterns and templates are assembled from [`Part`]s: literal code,
//! captures, raw text spliced in verbatim, or whole syntax nodes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use weaver_syntax::{SyntaxNode, TypeInfo};

use crate::constraint::Constraint;
use crate::error::TemplateError;

/// How many nodes a capture binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly one node.
    Scalar,
    /// A contiguous run of sibling nodes; bounds are inclusive and an absent
    /// bound is unbounded.
    Variadic {
        /// Minimum run length.
        min: Option<usize>,
        /// Maximum run length.
        max: Option<usize>,
    },
}

impl Arity {
    /// Returns whether a run of `len` nodes satisfies the bounds.
    #[must_use]
    pub fn admits(self, len: usize) -> bool {
        match self {
            Self::Scalar => len == 1,
            Self::Variadic { min, max } => {
                min.is_none_or(|lower| len >= lower) && max.is_none_or(|upper| len <= upper)
            }
        }
    }

    /// Returns the smallest admissible run length.
    #[must_use]
    pub fn min_len(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Variadic { min, .. } => min.unwrap_or(0),
        }
    }

    /// Returns the largest admissible run length, if bounded.
    #[must_use]
    pub const fn max_len(self) -> Option<usize> {
        match self {
            Self::Scalar => Some(1),
            Self::Variadic { max, .. } => max,
        }
    }

    pub(crate) fn describe(self) -> String {
        match self {
            Self::Scalar => "exactly 1 element".to_owned(),
            Self::Variadic {
                min: None,
                max: None,
            } => "any number of elements".to_owned(),
            Self::Variadic {
                min: Some(lower),
                max: None,
            } => format!("at least {lower} elements"),
            Self::Variadic {
                min: None,
                max: Some(upper),
            } => format!("at most {upper} elements"),
            Self::Variadic {
                min: Some(lower),
                max: Some(upper),
            } => format!("between {lower} and {upper} elements"),
        }
    }
}

#[derive(Debug)]
struct CaptureSpec {
    name: Option<String>,
    arity: Arity,
    type_hint: Option<TypeInfo>,
    constraint: Option<Constraint>,
    capturing: bool,
}

/// A placeholder that binds matched nodes.
#[derive(Clone)]
pub struct Capture {
    spec: Arc<CaptureSpec>,
}

impl Capture {
    /// Starts building a capture.
    #[must_use]
    pub fn builder() -> CaptureBuilder {
        CaptureBuilder::default()
    }

    /// Starts building a wildcard: it matches like a capture but is never
    /// recorded in match results.
    #[must_use]
    pub fn any_builder() -> CaptureBuilder {
        CaptureBuilder {
            capturing: false,
            ..CaptureBuilder::default()
        }
    }

    /// Returns the capture name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.spec.name.as_deref()
    }

    /// Returns the name for diagnostics.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.spec.name, self.spec.capturing) {
            (Some(name), _) => format!("`{name}`"),
            (None, true) => "an anonymous capture".to_owned(),
            (None, false) => "a wildcard".to_owned(),
        }
    }

    /// Returns the arity.
    #[must_use]
    pub fn arity(&self) -> Arity {
        self.spec.arity
    }

    /// Returns whether the capture binds a run of nodes.
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        matches!(self.spec.arity, Arity::Variadic { .. })
    }

    /// Returns the required type of bound nodes.
    #[must_use]
    pub fn type_hint(&self) -> Option<&TypeInfo> {
        self.spec.type_hint.as_ref()
    }

    /// Returns the constraint on candidates.
    #[must_use]
    pub fn constraint(&self) -> Option<&Constraint> {
        self.spec.constraint.as_ref()
    }

    /// Returns whether matches record a binding for this capture.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.spec.capturing
    }
}

impl PartialEq for Capture {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.spec, &other.spec)
    }
}

impl Eq for Capture {}

impl Hash for Capture {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.spec), state);
    }
}

impl fmt::Debug for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capture")
            .field("name", &self.spec.name)
            .field("arity", &self.spec.arity)
            .field("capturing", &self.spec.capturing)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Capture`].
#[derive(Debug)]
pub struct CaptureBuilder {
    name: Option<String>,
    arity: Arity,
    type_hint: Option<TypeInfo>,
    constraint: Option<Constraint>,
    capturing: bool,
}

impl Default for CaptureBuilder {
    fn default() -> Self {
        Self {
            name: None,
            arity: Arity::Scalar,
            type_hint: None,
            constraint: None,
            capturing: true,
        }
    }
}

impl CaptureBuilder {
    /// Names the capture.
    #[must_use]
    pub fn name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Makes the capture variadic with no bounds.
    #[must_use]
    pub fn variadic(self) -> Self {
        Self {
            arity: Arity::Variadic {
                min: None,
                max: None,
            },
            ..self
        }
    }

    /// Makes the capture variadic with inclusive bounds.
    #[must_use]
    pub fn bounds(self, min: Option<usize>, max: Option<usize>) -> Self {
        Self {
            arity: Arity::Variadic { min, max },
            ..self
        }
    }

    /// Requires bound nodes to carry a type equal to `ty`.
    #[must_use]
    pub fn type_hint(self, ty: TypeInfo) -> Self {
        Self {
            type_hint: Some(ty),
            ..self
        }
    }

    /// Attaches a constraint.
    #[must_use]
    pub fn constraint(self, constraint: Constraint) -> Self {
        Self {
            constraint: Some(constraint),
            ..self
        }
    }

    /// Finishes the capture.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidBounds`] when `min` exceeds `max`.
    pub fn build(self) -> Result<Capture, TemplateError> {
        if let Arity::Variadic {
            min: Some(lower),
            max: Some(upper),
        } = self.arity
            && lower > upper
        {
            let name = self.name.unwrap_or_else(|| "<anonymous>".to_owned());
            return Err(TemplateError::invalid_bounds(name, lower, upper));
        }
        Ok(Capture {
            spec: Arc::new(CaptureSpec {
                name: self.name,
                arity: self.arity,
                type_hint: self.type_hint,
                constraint: self.constraint,
                capturing: self.capturing,
            }),
        })
    }
}

/// Creates a named scalar capture.
#[must_use]
pub fn capture(name: impl Into<String>) -> Capture {
    Capture {
        spec: Arc::new(CaptureSpec {
            name: Some(name.into()),
            arity: Arity::Scalar,
            type_hint: None,
            constraint: None,
            capturing: true,
        }),
    }
}

/// Creates a scalar wildcard.
#[must_use]
pub fn any() -> Capture {
    Capture {
        spec: Arc::new(CaptureSpec {
            name: None,
            arity: Arity::Scalar,
            type_hint: None,
            constraint: None,
            capturing: false,
        }),
    }
}

/// Creates a named template parameter.
///
/// Parameters are captures; the alias reads better on the template side.
#[must_use]
pub fn param(name: impl Into<String>) -> Capture {
    capture(name)
}

/// Text spliced verbatim into the assembled source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw(String);

impl Raw {
    /// Returns the text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.0
    }
}

/// Creates a raw splice.
#[must_use]
pub fn raw(text: impl Into<String>) -> Raw {
    Raw(text.into())
}

/// A parameter interleaved with code in a fragment.
#[derive(Debug, Clone)]
pub enum Param {
    /// A capture slot.
    Capture(Capture),
    /// Text resolved at construction time.
    Raw(Raw),
    /// A literal subtree inlined into the compiled tree.
    Node(SyntaxNode),
}

/// One element of a fragment.
#[derive(Debug, Clone)]
pub enum Part {
    /// Literal source code.
    Code(String),
    /// A parameter.
    Param(Param),
}

impl From<&str> for Part {
    fn from(code: &str) -> Self {
        Self::Code(code.to_owned())
    }
}

impl From<String> for Part {
    fn from(code: String) -> Self {
        Self::Code(code)
    }
}

impl From<Param> for Part {
    fn from(param: Param) -> Self {
        Self::Param(param)
    }
}

impl From<Capture> for Part {
    fn from(capture: Capture) -> Self {
        Self::Param(Param::Capture(capture))
    }
}

impl From<&Capture> for Part {
    fn from(capture: &Capture) -> Self {
        Self::Param(Param::from(capture))
    }
}

impl From<Raw> for Part {
    fn from(raw: Raw) -> Self {
        Self::Param(Param::Raw(raw))
    }
}

impl From<&Raw> for Part {
    fn from(raw: &Raw) -> Self {
        Self::Param(Param::from(raw))
    }
}

impl From<SyntaxNode> for Part {
    fn from(node: SyntaxNode) -> Self {
        Self::Param(Param::Node(node))
    }
}

impl From<&SyntaxNode> for Part {
    fn from(node: &SyntaxNode) -> Self {
        Self::Param(Param::from(node))
    }
}

impl From<Capture> for Param {
    fn from(capture: Capture) -> Self {
        Self::Capture(capture)
    }
}

impl From<&Capture> for Param {
    fn from(capture: &Capture) -> Self {
        Self::Capture(capture.clone())
    }
}

impl From<Raw> for Param {
    fn from(raw: Raw) -> Self {
        Self::Raw(raw)
    }
}

impl From<&Raw> for Param {
    fn from(raw: &Raw) -> Self {
        Self::Raw(raw.clone())
    }
}

impl From<SyntaxNode> for Param {
    fn from(node: SyntaxNode) -> Self {
        Self::Node(node)
    }
}

impl From<&SyntaxNode> for Param {
    fn from(node: &SyntaxNode) -> Self {
        Self::Node(node.clone())
    }
}
