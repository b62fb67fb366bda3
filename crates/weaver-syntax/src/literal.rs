//! Normalised literal values.
//!
//! Two literals that denote the same value compare equal even when their
//! spelling differs: `0x10`, `16` and `1_6` are the same number, `'a'` and
//! `"a"` the same string.

use crate::tree::SyntaxNode;

/// A literal reduced to its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    /// A number, held as the canonical rendering of its `f64` value, or as
    /// its decimal digits when it is an integer too large for an exact
    /// `f64`.
    Number(String),
    /// A string, held as its decoded content.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// `null` or `None`.
    Null,
}

const NUMBER_KINDS: &[&str] = &["number", "integer_literal", "float_literal", "integer", "float"];
const STRING_KINDS: &[&str] = &["string", "string_literal", "raw_string_literal"];
const INTEGER_SUFFIXES: &[&str] = &[
    "i128", "i16", "i32", "i64", "i8", "isize", "u128", "u16", "u32", "u64", "u8", "usize", "n",
];
const FLOAT_SUFFIXES: &[&str] = &["f32", "f64"];
/// Integers up to this bound have an exact `f64`.
const EXACT_FLOAT_INTEGERS: u128 = 1 << 53;

impl LiteralValue {
    /// Reads the literal value of a node, if it is a literal.
    ///
    /// Strings containing interpolations are not literals.
    #[must_use]
    pub fn of(node: &SyntaxNode) -> Option<Self> {
        let kind = node.kind();
        if NUMBER_KINDS.contains(&kind) {
            return normalise_number(&node.text()).map(Self::Number);
        }
        if STRING_KINDS.contains(&kind) {
            let interpolated = node
                .descendants()
                .any(|child| matches!(child.kind(), "interpolation" | "template_substitution"));
            if interpolated {
                return None;
            }
            return decode_string(&node.text()).map(Self::String);
        }
        match kind {
            "true" | "false" | "boolean_literal" => match node.text().as_str() {
                "true" | "True" => Some(Self::Boolean(true)),
                "false" | "False" => Some(Self::Boolean(false)),
                _ => None,
            },
            "null" | "none" => Some(Self::Null),
            _ => None,
        }
    }
}

fn normalise_number(text: &str) -> Option<String> {
    let cleaned: String = text
        .chars()
        .filter(|ch| *ch != '_')
        .collect::<String>()
        .to_ascii_lowercase();
    let (radix, digits) = if let Some(rest) = cleaned.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = cleaned.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = cleaned.strip_prefix("0b") {
        (2, rest)
    } else {
        (10, cleaned.as_str())
    };
    let body = strip_type_suffix(digits, radix);
    if let Ok(integer) = u128::from_str_radix(body, radix) {
        if integer > EXACT_FLOAT_INTEGERS {
            return Some(integer.to_string());
        }
        let value: f64 = integer.to_string().parse().ok()?;
        return Some(format!("{value:?}"));
    }
    if radix != 10 {
        return None;
    }
    let value: f64 = body.parse().ok()?;
    Some(format!("{value:?}"))
}

fn strip_type_suffix(digits: &str, radix: u32) -> &str {
    let float_suffixes = if radix == 10 { FLOAT_SUFFIXES } else { &[] };
    INTEGER_SUFFIXES
        .iter()
        .chain(float_suffixes)
        .find_map(|suffix| digits.strip_suffix(suffix))
        .unwrap_or(digits)
}

fn decode_string(text: &str) -> Option<String> {
    let prefix_len = text
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .count();
    let (prefix, quoted) = text.split_at_checked(prefix_len)?;
    let raw = prefix.contains(['r', 'R']);
    let unhashed = if raw { quoted.trim_matches('#') } else { quoted };
    let inner = ["\"\"\"", "'''", "\"", "'", "`"].iter().find_map(|quote| {
        unhashed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })?;
    Some(if raw {
        inner.to_owned()
    } else {
        unescape(inner)
    })
}

fn unescape(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(escaped @ ('\\' | '\'' | '"' | '`')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
