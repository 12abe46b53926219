//! Composable value validators
//!
//! Validators are first-class values: leaf checks, the `all`/`any`/`not`
//! combinators, and a parser for the spec-string form used in
//! `#[cli(validators = "...")]` attributes (see [`parse_validators`]).
//!
//! # Example
//!
//! ```rust
//! use declargs::validate::{all, min_length, regex};
//!
//! let v = all(vec![min_length(8), regex("^[a-z]+$")]);
//! assert!(v.check("passwordish").is_ok());
//! assert!(v.check("short").is_err());
//! ```

mod spec;

pub use spec::parse_validators;

use std::fmt;
use std::rc::Rc;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{ParseError, Result};

/// A single validation step over an acquired string value.
#[derive(Clone)]
pub struct Validator {
    name: &'static str,
    check: Rc<dyn Fn(&str) -> Result<()>>,
}

impl Validator {
    fn new(name: &'static str, check: impl Fn(&str) -> Result<()> + 'static) -> Self {
        Self { name, check: Rc::new(check) }
    }

    /// Run this validator against a value.
    pub fn check(&self, value: &str) -> Result<()> {
        self.check.as_ref()(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").field("name", &self.name).finish()
    }
}

fn grapheme_len(value: &str) -> usize {
    value.graphemes(true).count()
}

// RFC 5322, simplified. Shared with the default accepted-pattern helpers.
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";
const HOSTNAME_PATTERN: &str =
    r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";
const IDENTIFIER_PATTERN: &str = r"^[a-zA-Z_][a-zA-Z0-9_]*$";

fn pattern_error(value: &str, description: &str) -> ParseError {
    ParseError::PatternMatch { value: value.to_string(), description: description.to_string() }
}

/// Validate email address format.
pub fn email() -> Validator {
    let re = Regex::new(EMAIL_PATTERN);
    Validator::new("email", move |value| match &re {
        Ok(re) if re.is_match(value) => Ok(()),
        _ => Err(ParseError::InvalidEmailFormat { value: value.to_string() }),
    })
}

/// Validate that the value parses as an absolute URL.
pub fn url() -> Validator {
    Validator::new("url", |value| {
        url::Url::parse(value)
            .map(|_| ())
            .map_err(|_| ParseError::InvalidUrl { value: value.to_string() })
    })
}

/// Validate that the value parses as an integer.
pub fn integer() -> Validator {
    Validator::new("integer", |value| {
        value
            .parse::<i64>()
            .map(|_| ())
            .map_err(|_| ParseError::InvalidInteger { value: value.to_string() })
    })
}

/// Validate that the value parses as a float.
pub fn float() -> Validator {
    Validator::new("float", |value| {
        value
            .parse::<f64>()
            .map(|_| ())
            .map_err(|_| ParseError::InvalidFloat { value: value.to_string() })
    })
}

/// Validate that the value is a recognized boolean literal.
pub fn boolean() -> Validator {
    Validator::new("boolean", |value| {
        crate::binding::parse_bool(value)
            .map(|_| ())
            .ok_or_else(|| pattern_error(value, "a boolean value"))
    })
}

/// Validate a numeric value within `[lo, hi]`.
pub fn range(lo: f64, hi: f64) -> Validator {
    Validator::new("range", move |value| {
        let n = value
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidFloat { value: value.to_string() })?;
        if n < lo || n > hi {
            return Err(ParseError::ValueBetween {
                value: value.to_string(),
                min: format_number(lo),
                max: format_number(hi),
            });
        }
        Ok(())
    })
}

/// Validate a numeric lower bound.
pub fn min(lo: f64) -> Validator {
    Validator::new("min", move |value| {
        let n = value
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidFloat { value: value.to_string() })?;
        if n < lo {
            return Err(ParseError::ValueAtLeast {
                value: value.to_string(),
                min: format_number(lo),
            });
        }
        Ok(())
    })
}

/// Validate a numeric upper bound.
pub fn max(hi: f64) -> Validator {
    Validator::new("max", move |value| {
        let n = value
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidFloat { value: value.to_string() })?;
        if n > hi {
            return Err(ParseError::ValueAtMost { value: value.to_string(), max: format_number(hi) });
        }
        Ok(())
    })
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Minimum length in grapheme clusters.
pub fn min_length(n: usize) -> Validator {
    Validator::new("minlength", move |value| {
        let len = grapheme_len(value);
        if len < n {
            return Err(ParseError::MinLength { length: len, min: n });
        }
        Ok(())
    })
}

/// Maximum length in grapheme clusters.
pub fn max_length(n: usize) -> Validator {
    Validator::new("maxlength", move |value| {
        let len = grapheme_len(value);
        if len > n {
            return Err(ParseError::MaxLength { length: len, max: n });
        }
        Ok(())
    })
}

/// Exact length in grapheme clusters.
pub fn length(n: usize) -> Validator {
    Validator::new("length", move |value| {
        let len = grapheme_len(value);
        if len < n {
            Err(ParseError::MinLength { length: len, min: n })
        } else if len > n {
            Err(ParseError::MaxLength { length: len, max: n })
        } else {
            Ok(())
        }
    })
}

/// Validate against a regex pattern. The failure message shows the pattern
/// itself.
pub fn regex(pattern: &str) -> Validator {
    regex_with_description(pattern, pattern)
}

/// Validate against a regex pattern with an explicit description (or
/// translation key) for failures.
pub fn regex_with_description(pattern: &str, description: &str) -> Validator {
    let compiled = Regex::new(pattern);
    let description = description.to_string();
    Validator::new("regex", move |value| match &compiled {
        Ok(re) if re.is_match(value) => Ok(()),
        _ => Err(pattern_error(value, &description)),
    })
}

/// Validate membership in a fixed set.
pub fn is_one_of<S: AsRef<str>>(items: &[S]) -> Validator {
    let items: Vec<String> = items.iter().map(|s| s.as_ref().to_string()).collect();
    Validator::new("isoneof", move |value| {
        if items.iter().any(|item| item == value) {
            Ok(())
        } else {
            Err(ParseError::ValueMustBeOneOf {
                value: value.to_string(),
                allowed: items.join(", "),
            })
        }
    })
}

/// Validate absence from a fixed set.
pub fn is_not_one_of<S: AsRef<str>>(items: &[S]) -> Validator {
    let items: Vec<String> = items.iter().map(|s| s.as_ref().to_string()).collect();
    Validator::new("isnotoneof", move |value| {
        if items.iter().any(|item| item == value) {
            Err(pattern_error(value, &format!("anything except: {}", items.join(", "))))
        } else {
            Ok(())
        }
    })
}

/// Validate hostname format.
pub fn hostname() -> Validator {
    let re = Regex::new(HOSTNAME_PATTERN);
    Validator::new("hostname", move |value| match &re {
        Ok(re) if value.len() <= 253 && re.is_match(value) => Ok(()),
        _ => Err(pattern_error(value, "a valid hostname")),
    })
}

/// Validate IPv4 or IPv6 address format.
pub fn ip() -> Validator {
    Validator::new("ip", |value| {
        value
            .parse::<std::net::IpAddr>()
            .map(|_| ())
            .map_err(|_| pattern_error(value, "a valid IP address"))
    })
}

/// Validate a TCP/UDP port (1-65535).
pub fn port() -> Validator {
    Validator::new("port", |value| match value.parse::<u32>() {
        Ok(n) if (1..=65535).contains(&n) => Ok(()),
        _ => Err(ParseError::ValueBetween {
            value: value.to_string(),
            min: "1".to_string(),
            max: "65535".to_string(),
        }),
    })
}

/// Validate the value's file extension against an allowed set.
pub fn file_ext<S: AsRef<str>>(extensions: &[S]) -> Validator {
    let extensions: Vec<String> =
        extensions.iter().map(|s| s.as_ref().trim_start_matches('.').to_lowercase()).collect();
    Validator::new("fileext", move |value| {
        let ext = std::path::Path::new(value)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match ext {
            Some(ext) if extensions.contains(&ext) => Ok(()),
            _ => Err(ParseError::ValueMustBeOneOf {
                value: value.to_string(),
                allowed: extensions.iter().map(|e| format!(".{e}")).collect::<Vec<_>>().join(", "),
            }),
        }
    })
}

/// Validate identifier format (letters, digits, underscores; no leading
/// digit).
pub fn identifier() -> Validator {
    let re = Regex::new(IDENTIFIER_PATTERN);
    Validator::new("identifier", move |value| match &re {
        Ok(re) if re.is_match(value) => Ok(()),
        _ => Err(pattern_error(value, "a valid identifier")),
    })
}

/// Validate that the value is letters and digits only.
pub fn alphanumeric() -> Validator {
    Validator::new("alphanumeric", |value| {
        if !value.is_empty() && value.chars().all(char::is_alphanumeric) {
            Ok(())
        } else {
            Err(pattern_error(value, "letters and digits only"))
        }
    })
}

/// Validate that the value contains no whitespace.
pub fn no_whitespace() -> Validator {
    Validator::new("nowhitespace", |value| {
        if value.chars().any(char::is_whitespace) {
            Err(pattern_error(value, "a value without whitespace"))
        } else {
            Ok(())
        }
    })
}

/// Wrap a user-supplied check as a validator.
pub fn custom(f: impl Fn(&str) -> Result<()> + 'static) -> Validator {
    Validator::new("custom", f)
}

/// Every validator must accept. Fails with the first rejection.
pub fn all(validators: Vec<Validator>) -> Validator {
    Validator::new("all", move |value| {
        for v in &validators {
            v.check(value)?;
        }
        Ok(())
    })
}

/// At least one validator must accept. Fails with the collected rejections.
pub fn any(validators: Vec<Validator>) -> Validator {
    Validator::new("any", move |value| {
        let mut failures = Vec::new();
        for v in &validators {
            match v.check(value) {
                Ok(()) => return Ok(()),
                Err(e) => failures.push(e.to_string()),
            }
        }
        Err(ParseError::ValidationCombinedFailed {
            value: value.to_string(),
            failures: failures.join("; "),
        })
    })
}

/// Invert a validator. `description` names what the value must NOT be.
pub fn not(inner: Validator, description: impl Into<String>) -> Validator {
    let description = description.into();
    Validator::new("not", move |value| match inner.check(value) {
        Ok(()) => Err(pattern_error(value, &description)),
        Err(_) => Ok(()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::keys;

    #[test]
    fn test_email() {
        assert!(email().check("user@example.com").is_ok());
        assert!(email().check("invalid").is_err());
    }

    #[test]
    fn test_port_bounds() {
        assert!(port().check("1").is_ok());
        assert!(port().check("65535").is_ok());
        assert!(port().check("0").is_err());
        assert!(port().check("65536").is_err());
        assert!(port().check("abc").is_err());
    }

    #[test]
    fn test_range_reports_bounds() {
        let err = range(1.0, 65535.0).check("70000").unwrap_err();
        assert!(err.has_key(keys::VALUE_BETWEEN));
    }

    #[test]
    fn test_length_counts_graphemes() {
        // one family emoji is many bytes but one grapheme
        assert!(length(1).check("\u{1F469}\u{200D}\u{1F469}\u{200D}\u{1F466}").is_ok());
        assert!(min_length(3).check("ab").is_err());
    }

    #[test]
    fn test_combinators() {
        let v = any(vec![email(), integer()]);
        assert!(v.check("42").is_ok());
        assert!(v.check("user@example.com").is_ok());
        let err = v.check("neither").unwrap_err();
        assert!(err.has_key(keys::VALIDATION_COMBINED_FAILED));

        let v = all(vec![min_length(2), alphanumeric()]);
        assert!(v.check("ok").is_ok());
        assert!(v.check("x").is_err());

        let v = not(integer(), "anything but a number");
        assert!(v.check("word").is_ok());
        assert!(v.check("7").is_err());
    }

    #[test]
    fn test_is_one_of() {
        let v = is_one_of(&["dev", "prod"]);
        assert!(v.check("dev").is_ok());
        let err = v.check("staging").unwrap_err();
        assert!(err.has_key(keys::VALUE_MUST_BE_ONE_OF));
    }

    #[test]
    fn test_file_ext_case_insensitive() {
        let v = file_ext(&["jpg", ".png"]);
        assert!(v.check("photo.JPG").is_ok());
        assert!(v.check("photo.png").is_ok());
        assert!(v.check("photo.gif").is_err());
    }
}
