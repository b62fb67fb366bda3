//! Owned, lossless syntax trees.
//!
//! A [`SyntaxNode`] keeps everything needed to print the original source back
//! byte-for-byte: every leaf carries the trivia (whitespace and comments)
//! that preceded it as a prefix, and the root keeps whatever trails the last
//! token. Trees are immutable by convention; every transform returns a new
//! value.
//!
//! Separator tokens (`,` and `;`) stay in the tree for printing but are
//! flagged so structural comparisons can skip them.

use std::fmt;

use crate::types::TypeInfo;

/// A leaf token with its leading trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    prefix: String,
    text: String,
}

impl Token {
    /// Creates a token from its prefix trivia and text.
    #[must_use]
    pub fn new(prefix: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            text: text.into(),
        }
    }

    /// Returns the whitespace and comments preceding the token.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the token text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A node in a lossless syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: &'static str,
    field: Option<&'static str>,
    named: bool,
    separator: bool,
    token: Option<Token>,
    children: Vec<Self>,
    ty: Option<TypeInfo>,
    trailing: String,
}

impl SyntaxNode {
    /// Creates a leaf node.
    ///
    /// Leaves produced this way are named; use [`Self::anonymous`] for
    /// punctuation and keywords.
    #[must_use]
    pub fn leaf(kind: &'static str, prefix: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            named: true,
            separator: false,
            token: Some(Token::new(prefix, text)),
            children: Vec::new(),
            ty: None,
            trailing: String::new(),
        }
    }

    /// Creates an anonymous token such as `(` or `+`.
    ///
    /// `,` and `;` are flagged as separators.
    #[must_use]
    pub fn anonymous(kind: &'static str, prefix: impl Into<String>) -> Self {
        Self {
            separator: is_separator_kind(kind),
            named: false,
            ..Self::leaf(kind, prefix, kind)
        }
    }

    /// Creates an interior node from its children.
    #[must_use]
    pub const fn branch(kind: &'static str, children: Vec<Self>) -> Self {
        Self {
            kind,
            field: None,
            named: true,
            separator: false,
            token: None,
            children,
            ty: None,
            trailing: String::new(),
        }
    }

    /// Returns the grammar kind of the node.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    /// Returns the field name this node occupies within its parent.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        self.field
    }

    /// Returns whether the grammar names this node (as opposed to a bare
    /// punctuation or keyword token).
    #[must_use]
    pub const fn is_named(&self) -> bool {
        self.named
    }

    /// Returns whether this node is a `,` or `;` separator token.
    #[must_use]
    pub const fn is_separator(&self) -> bool {
        self.separator
    }

    /// Returns the token when the node is a leaf.
    #[must_use]
    pub const fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Returns whether the node is a leaf.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.token.is_some()
    }

    /// Returns all children, separators included.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Returns the children that take part in structural comparison.
    pub fn significant_children(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter(|child| !child.separator)
    }

    /// Returns the first child occupying the named field.
    #[must_use]
    pub fn child_by_field(&self, field: &str) -> Option<&Self> {
        self.children
            .iter()
            .find(|child| child.field == Some(field))
    }

    /// Returns the named children, skipping punctuation and keywords.
    pub fn named_children(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter(|child| child.named)
    }

    /// Returns the type attached to the node, if any.
    #[must_use]
    pub const fn ty(&self) -> Option<&TypeInfo> {
        self.ty.as_ref()
    }

    /// Returns the trivia after the last token (only set on roots).
    #[must_use]
    pub fn trailing(&self) -> &str {
        &self.trailing
    }

    /// Returns the prefix trivia of the first token in this subtree.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.first_token().map_or("", Token::prefix)
    }

    /// Returns the first token in this subtree.
    #[must_use]
    pub fn first_token(&self) -> Option<&Token> {
        match &self.token {
            Some(token) => Some(token),
            None => self.children.iter().find_map(Self::first_token),
        }
    }

    /// Returns the source text of the subtree without its own prefix or the
    /// root trailing trivia.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.write_tokens(&mut out);
        let prefix_len = self.prefix().len();
        out.split_off(prefix_len)
    }

    /// Prints the subtree, prefix and trailing trivia included.
    #[must_use]
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_tokens(&mut out);
        out.push_str(&self.trailing);
        out
    }

    fn write_tokens(&self, out: &mut String) {
        if let Some(token) = &self.token {
            out.push_str(&token.prefix);
            out.push_str(&token.text);
        }
        for child in &self.children {
            child.write_tokens(out);
        }
    }

    /// Returns an iterator over this node and its descendants in pre-order.
    #[must_use]
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Returns a copy whose first token carries `prefix`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.set_first_prefix(prefix);
        self
    }

    fn set_first_prefix(&mut self, prefix: &str) -> bool {
        if let Some(token) = &mut self.token {
            prefix.clone_into(&mut token.prefix);
            return true;
        }
        self.children
            .iter_mut()
            .any(|child| child.set_first_prefix(prefix))
    }

    /// Returns a copy with the given children.
    #[must_use]
    pub fn with_children(self, children: Vec<Self>) -> Self {
        Self { children, ..self }
    }

    /// Returns a copy with its children removed, keeping the token if any.
    #[must_use]
    pub fn without_children(&self) -> Self {
        Self {
            kind: self.kind,
            field: self.field,
            named: self.named,
            separator: self.separator,
            token: self.token.clone(),
            children: Vec::new(),
            ty: self.ty.clone(),
            trailing: String::new(),
        }
    }

    /// Returns a copy occupying the given parent field.
    #[must_use]
    pub fn with_field(self, field: Option<&'static str>) -> Self {
        Self { field, ..self }
    }

    /// Returns a copy with the named flag set.
    #[must_use]
    pub fn with_named(self, named: bool) -> Self {
        Self { named, ..self }
    }

    #[must_use]
    pub(crate) fn with_separator(self, separator: bool) -> Self {
        Self { separator, ..self }
    }

    /// Returns a copy carrying the given type.
    #[must_use]
    pub fn with_type(self, ty: TypeInfo) -> Self {
        Self {
            ty: Some(ty),
            ..self
        }
    }

    /// Returns a copy with the given trailing trivia.
    #[must_use]
    pub fn with_trailing(self, trailing: impl Into<String>) -> Self {
        Self {
            trailing: trailing.into(),
            ..self
        }
    }

    /// Returns a copy without its first `count` children.
    #[must_use]
    pub fn without_leading_children(mut self, count: usize) -> Self {
        let kept = self.children.split_off(count.min(self.children.len()));
        Self {
            children: kept,
            ..self
        }
    }

    /// Returns a copy whose children are replaced by `f` applied to each.
    #[must_use]
    pub fn map_children(self, f: impl FnMut(Self) -> Self) -> Self {
        let children = self.children.into_iter().map(f).collect();
        Self { children, ..self }
    }

    /// Returns a short single-line rendering for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        let text = self.text();
        let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.chars().count() > 40 {
            let truncated: String = flat.chars().take(37).collect();
            format!("{} `{truncated}...`", self.kind)
        } else {
            format!("{} `{flat}`", self.kind)
        }
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Returns whether a token kind is a sequence separator.
#[must_use]
pub fn is_separator_kind(kind: &str) -> bool {
    matches!(kind, "," | ";")
}

/// Pre-order iterator over a subtree.
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
