//! Typed bindings between parsed values and configuration structs
//!
//! The derive macro generates a two-phase [`CommandLine`] implementation:
//! `declare_with` registers flags and commands, `assign_with` extracts the
//! parsed values into the struct's fields. [`DeclContext`] threads the
//! dotted field prefix and the current command path through nested structs.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ParseError, Result};
use crate::parser::Parser;

/// Recognized boolean literals. Standalone flags and env fallback use the
/// same set.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" => Some(true),
        "false" | "0" | "no" | "off" | "f" => Some(false),
        _ => None,
    }
}

/// True for values `parse_bool` reads as true.
pub fn truthy(value: &str) -> bool {
    parse_bool(value) == Some(true)
}

/// Conversion from an acquired string value into a field type.
pub trait FromArgValue: Sized {
    fn from_arg_value(value: &str) -> Result<Self>;
}

impl FromArgValue for String {
    fn from_arg_value(value: &str) -> Result<Self> {
        Ok(value.to_string())
    }
}

impl FromArgValue for bool {
    fn from_arg_value(value: &str) -> Result<Self> {
        parse_bool(value).ok_or_else(|| ParseError::InvalidBoolean {
            flag: String::new(),
            value: value.to_string(),
        })
    }
}

macro_rules! impl_from_arg_value_int {
    ($($ty:ty),*) => {
        $(impl FromArgValue for $ty {
            fn from_arg_value(value: &str) -> Result<Self> {
                value.trim().parse::<$ty>().map_err(|_| ParseError::InvalidInteger {
                    value: value.to_string(),
                })
            }
        })*
    };
}

impl_from_arg_value_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! impl_from_arg_value_float {
    ($($ty:ty),*) => {
        $(impl FromArgValue for $ty {
            fn from_arg_value(value: &str) -> Result<Self> {
                value.trim().parse::<$ty>().map_err(|_| ParseError::InvalidFloat {
                    value: value.to_string(),
                })
            }
        })*
    };
}

impl_from_arg_value_float!(f32, f64);

impl FromArgValue for PathBuf {
    fn from_arg_value(value: &str) -> Result<Self> {
        Ok(PathBuf::from(value))
    }
}

impl FromArgValue for Duration {
    fn from_arg_value(value: &str) -> Result<Self> {
        humantime::parse_duration(value.trim())
            .map_err(|_| ParseError::InvalidInteger { value: value.to_string() })
    }
}

impl FromArgValue for std::net::IpAddr {
    fn from_arg_value(value: &str) -> Result<Self> {
        value.trim().parse().map_err(|_| ParseError::PatternMatch {
            value: value.to_string(),
            description: "a valid IP address".to_string(),
        })
    }
}

impl<T: FromArgValue> FromArgValue for Option<T> {
    fn from_arg_value(value: &str) -> Result<Self> {
        T::from_arg_value(value).map(Some)
    }
}

/// Declaration context for nested struct visits: the dotted flag-name
/// prefix and the command path the flags are scoped to.
#[derive(Debug, Clone, Default)]
pub struct DeclContext {
    prefix: String,
    path: String,
}

impl DeclContext {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn command_path(&self) -> &str {
        &self.path
    }

    /// The dotted flag-name prefix accumulated so far (empty at the root).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Enter a nested struct field: `addr` then `city` yields `addr.city`.
    pub fn child_field(&self, field: &str) -> Self {
        let prefix = if self.prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{field}", self.prefix)
        };
        Self { prefix, path: self.path.clone() }
    }

    /// Enter a slice element: `addresses` index 1 yields `addresses.1`.
    pub fn child_index(&self, index: usize) -> Self {
        Self { prefix: format!("{}.{index}", self.prefix), path: self.path.clone() }
    }

    /// Enter a command-kind field: the prefix resets, the path extends.
    pub fn child_command(&self, name: &str) -> Self {
        let path =
            if self.path.is_empty() { name.to_string() } else { format!("{} {name}", self.path) };
        Self { prefix: String::new(), path }
    }

    /// The full dotted canonical name for a leaf field.
    pub fn flag_name(&self, leaf: &str) -> String {
        if self.prefix.is_empty() {
            leaf.to_string()
        } else {
            format!("{}.{leaf}", self.prefix)
        }
    }

    /// Scopes a leaf declaration applies to: the explicit `path` attribute
    /// values when present, the context's command path otherwise.
    pub fn paths_for(&self, explicit: &[String]) -> Vec<String> {
        if !explicit.is_empty() {
            explicit.to_vec()
        } else if self.path.is_empty() {
            Vec::new()
        } else {
            vec![self.path.clone()]
        }
    }
}

/// A configuration struct that declares and receives command-line values.
///
/// Implemented by `#[derive(CommandLine)]`; the two phases replace the
/// original write-through bindings: `declare` registers everything, and
/// `assign` runs after parsing so fields end up equal to the acquired
/// values.
pub trait CommandLine {
    fn declare_with(parser: &mut Parser, ctx: &DeclContext) -> Result<()>;

    fn assign_with(&mut self, parser: &Parser, ctx: &DeclContext) -> Result<()>;

    fn declare(parser: &mut Parser) -> Result<()> {
        Self::declare_with(parser, &DeclContext::root())
    }

    fn assign(&mut self, parser: &Parser) -> Result<()> {
        self.assign_with(parser, &DeclContext::root())
    }
}
