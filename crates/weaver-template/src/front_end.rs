//! Front ends that parse fragment source into lossless trees.

use std::fmt;
use std::path::Path;

use weaver_syntax::{Parser, SupportedLanguage, SyntaxError, SyntaxTree};

/// Parses and prints source for one language.
///
/// Implementations must attach whatever type information they have to the
/// nodes they produce; matching only consumes it.
pub trait FrontEnd: Send + Sync + fmt::Debug {
    /// Returns the language this front end parses.
    fn language(&self) -> SupportedLanguage;

    /// Parses `source`, preceded by `context` declarations, as if it were the
    /// file at `path`. Context nodes are not part of the returned tree.
    ///
    /// # Errors
    ///
    /// Returns an error when the parser cannot produce a tree at all; syntax
    /// errors in the source are reported on the tree instead.
    fn parse(
        &self,
        source: &str,
        path: &Path,
        context: &[String],
    ) -> Result<SyntaxTree, SyntaxError>;
}

/// A front end backed by the Tree-sitter grammars of `weaver-syntax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSitterFrontEnd {
    language: SupportedLanguage,
}

impl TreeSitterFrontEnd {
    /// Creates a front end for `language`.
    #[must_use]
    pub const fn new(language: SupportedLanguage) -> Self {
        Self { language }
    }
}

impl FrontEnd for TreeSitterFrontEnd {
    fn language(&self) -> SupportedLanguage {
        self.language
    }

    fn parse(
        &self,
        source: &str,
        path: &Path,
        context: &[String],
    ) -> Result<SyntaxTree, SyntaxError> {
        if let Some(detected) = SupportedLanguage::from_path(path)
            && detected != self.language
        {
            return Err(SyntaxError::language_mismatch(self.language, detected));
        }
        let mut parser = Parser::new(self.language)?;
        parser.parse_with_context(source, context)
    }
}
