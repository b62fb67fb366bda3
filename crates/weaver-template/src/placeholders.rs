//! Placeholder spelling and metavariable shorthand.
//!
//! Compilation replaces every parameter with a placeholder identifier before
//! handing the fragment to the front end. Placeholders are numbered per
//! compilation, so the same fragment always produces the same source.
//!
//! [`Metavariables`] turns ast-grep style text (`$NAME`, `$$$ARGS`, `$_`)
//! into fragment parts, reusing one capture per name so that a pattern and
//! its template can share them.

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::capture::{Capture, Param, Part, any, capture};
use crate::error::TemplateError;

pub(crate) const SLOT_PREFIX: &str = "__weaver_slot_";
pub(crate) const SLOT_SUFFIX: &str = "__";

/// Returns the placeholder identifier for slot `index`.
#[must_use]
pub(crate) fn placeholder(index: usize) -> String {
    format!("{SLOT_PREFIX}{index}{SLOT_SUFFIX}")
}

/// Returns the slot index spelled by a placeholder identifier.
#[must_use]
pub(crate) fn slot_index(text: &str) -> Option<usize> {
    text.strip_prefix(SLOT_PREFIX)
        .and_then(|rest| rest.strip_suffix(SLOT_SUFFIX))
        .and_then(|digits| digits.parse().ok())
}

/// Rejects literal text that could be mistaken for a placeholder.
pub(crate) fn check_collision(text: &str) -> Result<(), TemplateError> {
    if text.contains(SLOT_PREFIX) {
        return Err(TemplateError::PlaceholderCollision {
            prefix: SLOT_PREFIX,
        });
    }
    Ok(())
}

const fn is_valid_metavar_start_char(c: char) -> bool {
    c.is_ascii_uppercase() || c == '_'
}

const fn is_valid_metavar_continuation_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'
}

fn extract_metavar_name(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut name = String::new();
    let Some((_, first_char)) = chars.peek().copied() else {
        return name;
    };
    if !is_valid_metavar_start_char(first_char) {
        return name;
    }
    name.push(first_char);
    chars.next();

    while let Some((_, c)) = chars.peek().copied() {
        if !is_valid_metavar_continuation_char(c) {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

/// A registry of captures named by metavariables.
///
/// `$NAME` is a scalar capture, `$$$NAME` a variadic one, and `$_` or
/// `$$$_` a wildcard. Every use of a name through one registry yields the
/// same capture; wildcards are fresh each time.
#[derive(Debug, Default, Clone)]
pub struct Metavariables {
    captures: HashMap<String, Capture>,
}

impl Metavariables {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the capture registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Capture> {
        self.captures.get(name)
    }

    /// Splits metavariable text into fragment parts.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidMetavariable`] for `$$` prefixes,
    /// prefixes longer than three, names that do not start with an uppercase
    /// letter or `_`, and names reused with a different arity.
    pub fn parts(&mut self, text: &str) -> Result<Vec<Part>, TemplateError> {
        let mut parts = Vec::new();
        let mut code = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((offset, ch)) = chars.next() {
            if ch != '$' {
                code.push(ch);
                continue;
            }

            let mut dollar_count = 1;
            while chars.peek().is_some_and(|(_, c)| *c == '$') {
                chars.next();
                dollar_count += 1;
            }
            if dollar_count == 2 || dollar_count > 3 {
                return Err(TemplateError::invalid_metavariable(format!(
                    "metavariable at offset {offset} has invalid '$' prefix length ({dollar_count})"
                )));
            }

            let name = extract_metavar_name(&mut chars);
            if name.is_empty() {
                return Err(TemplateError::invalid_metavariable(format!(
                    "metavariable at offset {offset} has no valid name"
                )));
            }

            if !code.is_empty() {
                parts.push(Part::Code(std::mem::take(&mut code)));
            }
            let variadic = dollar_count == 3;
            let resolved = self.resolve(&name, variadic)?;
            parts.push(Part::Param(Param::Capture(resolved)));
        }

        if !code.is_empty() {
            parts.push(Part::Code(code));
        }
        Ok(parts)
    }

    fn resolve(&mut self, name: &str, variadic: bool) -> Result<Capture, TemplateError> {
        if name == "_" {
            return if variadic {
                Capture::any_builder().variadic().build()
            } else {
                Ok(any())
            };
        }
        if let Some(existing) = self.captures.get(name) {
            if existing.is_variadic() != variadic {
                return Err(TemplateError::invalid_metavariable(format!(
                    "metavariable {name} is used both as single and multiple"
                )));
            }
            return Ok(existing.clone());
        }
        let created = if variadic {
            Capture::builder().name(name).variadic().build()?
        } else {
            capture(name)
        };
        self.captures.insert(name.to_owned(), created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn placeholders_round_trip_their_index() {
        assert_eq!(slot_index(&placeholder(12)), Some(12));
        assert_eq!(slot_index("__weaver_slot_x__"), None);
        assert_eq!(slot_index("value"), None);
    }

    #[test]
    fn collisions_are_rejected() {
        assert!(matches!(
            check_collision("let __weaver_slot_0__ = 1;"),
            Err(TemplateError::PlaceholderCollision { .. })
        ));
        assert!(check_collision("let slot = 1;").is_ok());
    }

    #[test]
    fn names_are_shared_within_a_registry() {
        let mut metavariables = Metavariables::new();
        let first = metavariables
            .parts("$A + $B")
            .unwrap_or_else(|err| panic!("parts: {err}"));
        let second = metavariables
            .parts("$B + $A")
            .unwrap_or_else(|err| panic!("parts: {err}"));

        let captures = |parts: &[Part]| -> Vec<Capture> {
            parts
                .iter()
                .filter_map(|part| match part {
                    Part::Param(Param::Capture(found)) => Some(found.clone()),
                    Part::Code(_) | Part::Param(_) => None,
                })
                .collect()
        };
        let left = captures(&first);
        let right = captures(&second);
        assert_eq!(left.len(), 2);
        assert_eq!(left.first(), right.get(1));
        assert_eq!(left.get(1), right.first());
    }

    #[test]
    fn triple_dollar_is_variadic_and_underscore_is_a_wildcard() {
        let mut metavariables = Metavariables::new();
        let parts = metavariables
            .parts("foo($$$ARGS, $_)")
            .unwrap_or_else(|err| panic!("parts: {err}"));
        let params: Vec<_> = parts
            .iter()
            .filter_map(|part| match part {
                Part::Param(Param::Capture(found)) => Some(found),
                Part::Code(_) | Part::Param(_) => None,
            })
            .collect();
        assert!(params.first().is_some_and(|args| args.is_variadic()));
        assert!(params.get(1).is_some_and(|wildcard| !wildcard.is_capturing()));
    }

    #[rstest]
    #[case("$$A")]
    #[case("$$$$A")]
    #[case("$lower")]
    #[case("trailing $")]
    fn malformed_metavariables_are_rejected(#[case] text: &str) {
        let result = Metavariables::new().parts(text);
        assert!(matches!(
            result,
            Err(TemplateError::InvalidMetavariable { .. })
        ));
    }

    #[test]
    fn arity_conflicts_are_rejected() {
        let result = Metavariables::new().parts("f($A, $$$A)");
        assert!(matches!(
            result,
            Err(TemplateError::InvalidMetavariable { .. })
        ));
    }
}
