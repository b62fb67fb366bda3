//! Type information attached to syntax nodes.
//!
//! The front end attaches a [`TypeInfo`] to nodes whose type it can read off
//! the source (annotations, literals, declared signatures). Consumers compare
//! types with [`TypeInfo::is_equivalent`], which is the relation used by
//! structural matching:
//!
//! - primitive aliases equal their boxed library names (`number` and
//!   `Number`, `boolean` and `Boolean`, `string` and `String`, `bigint` and
//!   `BigInt`);
//! - named types compare by canonical name, the defining module plus the last
//!   segment of the name, so `ns.Name` through a namespace import equals
//!   `Name` through a named import of the same module;
//! - unions compare as sets;
//! - everything else compares structurally.

use std::fmt;

/// Built-in primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `number`
    Number,
    /// `string`
    String,
    /// `boolean`
    Boolean,
    /// `bigint`
    BigInt,
    /// `symbol`
    Symbol,
    /// `void`
    Void,
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `never`
    Never,
    /// `any`
    Any,
}

impl Primitive {
    /// Parses a primitive keyword such as `number`.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let primitive = match keyword {
            "number" => Self::Number,
            "string" => Self::String,
            "boolean" => Self::Boolean,
            "bigint" => Self::BigInt,
            "symbol" => Self::Symbol,
            "void" => Self::Void,
            "null" => Self::Null,
            "undefined" => Self::Undefined,
            "never" => Self::Never,
            "any" => Self::Any,
            _ => return None,
        };
        Some(primitive)
    }

    /// Maps a boxed library type name to its primitive.
    fn from_boxed_name(name: &str) -> Option<Self> {
        match name {
            "Number" => Some(Self::Number),
            "String" => Some(Self::String),
            "Boolean" => Some(Self::Boolean),
            "BigInt" => Some(Self::BigInt),
            "Symbol" => Some(Self::Symbol),
            _ => None,
        }
    }

    /// Returns the keyword spelling.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::BigInt => "bigint",
            Self::Symbol => "symbol",
            Self::Void => "void",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Never => "never",
            Self::Any => "any",
        }
    }
}

/// Type attached to a syntax node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeInfo {
    /// A primitive type.
    Primitive(Primitive),
    /// A named (class, interface, alias) type.
    Named {
        /// Module the name was imported from, if any.
        module: Option<String>,
        /// The type name, possibly namespace-qualified.
        name: String,
        /// Generic arguments.
        arguments: Vec<Self>,
    },
    /// An array of an element type.
    Array(Box<Self>),
    /// A function signature.
    Function {
        /// Parameter types in order.
        params: Vec<Self>,
        /// Return type.
        returns: Box<Self>,
    },
    /// A union of alternatives.
    Union(Vec<Self>),
    /// A type the front end could not determine.
    Unknown,
}

impl TypeInfo {
    /// Creates an unqualified named type.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            module: None,
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    /// Creates a named type defined in `module`.
    #[must_use]
    pub fn in_module(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Named {
            module: Some(module.into()),
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    /// Returns whether the type carries no information (`Unknown` or `any`).
    #[must_use]
    pub const fn is_trivial(&self) -> bool {
        matches!(self, Self::Unknown | Self::Primitive(Primitive::Any))
    }

    /// Returns the canonical name of a named type: the module, a dot, and
    /// the last segment of the name.
    #[must_use]
    pub fn canonical_name(&self) -> Option<String> {
        let Self::Named { module, name, .. } = self else {
            return None;
        };
        let last = name.rsplit('.').next().unwrap_or(name);
        Some(module.as_ref().map_or_else(
            || last.to_owned(),
            |module_name| format!("{module_name}.{last}"),
        ))
    }

    /// Returns whether two types are equal under the matching relation.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        match (self.boxed_primitive(), other.boxed_primitive()) {
            (Some(left), Some(right)) => return left == right,
            (Some(_), None) | (None, Some(_)) => return false,
            (None, None) => {}
        }
        match (self, other) {
            (
                Self::Named {
                    arguments: left_args,
                    ..
                },
                Self::Named {
                    arguments: right_args,
                    ..
                },
            ) => {
                self.canonical_name() == other.canonical_name()
                    && all_equivalent(left_args, right_args)
            }
            (Self::Array(left), Self::Array(right)) => left.is_equivalent(right),
            (
                Self::Function {
                    params: left_params,
                    returns: left_returns,
                },
                Self::Function {
                    params: right_params,
                    returns: right_returns,
                },
            ) => {
                all_equivalent(left_params, right_params) && left_returns.is_equivalent(right_returns)
            }
            (Self::Union(left), Self::Union(right)) => {
                covers(left, right) && covers(right, left)
            }
            (Self::Unknown, Self::Unknown) => true,
            _ => false,
        }
    }

    /// Returns the primitive a type denotes, treating unqualified boxed
    /// library names as their primitives.
    fn boxed_primitive(&self) -> Option<Primitive> {
        match self {
            Self::Primitive(primitive) => Some(*primitive),
            Self::Named {
                module: None,
                name,
                arguments,
            } if arguments.is_empty() => Primitive::from_boxed_name(name),
            _ => None,
        }
    }
}

fn all_equivalent(left: &[TypeInfo], right: &[TypeInfo]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(lhs, rhs)| lhs.is_equivalent(rhs))
}

fn covers(members: &[TypeInfo], candidates: &[TypeInfo]) -> bool {
    candidates
        .iter()
        .all(|candidate| members.iter().any(|member| member.is_equivalent(candidate)))
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(primitive) => f.write_str(primitive.keyword()),
            Self::Named { arguments, .. } => {
                f.write_str(&self.canonical_name().unwrap_or_default())?;
                if !arguments.is_empty() {
                    f.write_str("<")?;
                    write_joined(f, arguments, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Array(element) => write!(f, "{element}[]"),
            Self::Function { params, returns } => {
                f.write_str("(")?;
                write_joined(f, params, ", ")?;
                write!(f, ") => {returns}")
            }
            Self::Union(members) => write_joined(f, members, " | "),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[TypeInfo], separator: &str) -> fmt::Result {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
