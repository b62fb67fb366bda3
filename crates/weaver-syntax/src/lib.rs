//! Lossless syntax trees for the Weaver template engine.
//!
//! This crate is the front end the structural template engine consumes. It
//! parses source with Tree-sitter and lowers the result into owned
//! [`SyntaxNode`] trees that print back byte-for-byte, keeping whitespace and
//! comments as token prefixes. On top of the tree it offers:
//!
//! - [`Cursor`] for walking a node's ancestry without parent pointers,
//! - [`SyntaxCategory`] for statement and expression classification,
//! - [`LiteralValue`] for comparing literals by value,
//! - [`TypeInfo`] with the type equality relation used by matching,
//! - [`attribute_types`] for reading stated types off TypeScript sources.
//!
//! # Supported Languages
//!
//! - Rust (`.rs`)
//! - Python (`.py`, `.pyi`)
//! - TypeScript (`.ts`, `.tsx`, `.mts`, `.cts`)
//!
//! # Example
//!
//! ```
//! use weaver_syntax::{Parser, SupportedLanguage};
//!
//! let mut parser = Parser::new(SupportedLanguage::TypeScript)?;
//! let tree = parser.parse_tree("const total = add(1, 2); // sum\n")?;
//!
//! assert_eq!(tree.root().to_source(), "const total = add(1, 2); // sum\n");
//! let call = tree
//!     .root()
//!     .descendants()
//!     .find(|node| node.kind() == "call_expression");
//! assert_eq!(call.map(|node| node.text()).as_deref(), Some("add(1, 2)"));
//! # Ok::<(), weaver_syntax::SyntaxError>(())
//! ```

mod attribution;
mod category;
mod cursor;
mod error;
mod language;
mod literal;
mod lower;
mod parser;
mod position;
mod tree;
mod types;

pub use attribution::attribute_types;
pub use category::SyntaxCategory;
pub use cursor::Cursor;
pub use error::SyntaxError;
pub use language::{FRAGMENT_WRAPPER, LanguageParseError, SupportedLanguage, WrappedFragment};
pub use literal::LiteralValue;
pub use parser::{ParseResult, Parser, SyntaxErrorInfo, SyntaxTree};
pub use tree::{Descendants, SyntaxNode, Token, is_separator_kind};
pub use types::{Primitive, TypeInfo};

#[cfg(test)]
mod tests;
