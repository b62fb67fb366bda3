//! Statement and expression classification of node kinds.
//!
//! Grammar kinds follow naming conventions shared by the supported grammars:
//! statements end in `_statement`, `_declaration`, `_definition` or `_item`,
//! and statement lists live in block-like containers.

/// Syntactic category of a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxCategory {
    /// Statements and declarations.
    Statement,
    /// Expressions and other named constructs usable in expression position.
    Expression,
    /// Roots, anonymous tokens, and containers.
    Other,
}

const STATEMENT_SUFFIXES: &[&str] = &["_statement", "_declaration", "_definition", "_item"];

const STATEMENT_CONTAINERS: &[&str] = &[
    "program",
    "source_file",
    "module",
    "statement_block",
    "block",
    "class_body",
    "declaration_list",
    "switch_case",
    "switch_default",
];

impl SyntaxCategory {
    /// Classifies a node kind.
    #[must_use]
    pub fn of(kind: &str) -> Self {
        if Self::is_statement_container(kind) || !kind.starts_with(char::is_alphabetic) {
            Self::Other
        } else if STATEMENT_SUFFIXES.iter().any(|suffix| kind.ends_with(suffix)) {
            Self::Statement
        } else {
            Self::Expression
        }
    }

    /// Returns whether children of this kind sit in statement position.
    #[must_use]
    pub fn is_statement_container(kind: &str) -> bool {
        STATEMENT_CONTAINERS.contains(&kind)
    }

    /// Returns whether this kind is a nestable block (not a file root).
    #[must_use]
    pub fn is_block(kind: &str) -> bool {
        matches!(kind, "statement_block" | "block")
    }
}
