//! Name conversion between field names, flag names, and environment keys
//!
//! Canonical flag names are derived from struct field names through a
//! configurable converter; environment lookups run the canonical name
//! through a second converter. Dotted names (`addr.0.city`) are converted
//! per segment.

use std::rc::Rc;

/// A pluggable name converter.
pub type NameConverter = Rc<dyn Fn(&str) -> String>;

/// Convert an identifier to kebab-case: `max_retries` -> `max-retries`.
pub fn to_kebab_case(name: &str) -> String {
    per_segment(name, |seg| {
        let mut out = String::with_capacity(seg.len());
        for (i, ch) in seg.chars().enumerate() {
            if ch == '_' || ch == '-' || ch == ' ' {
                if !out.ends_with('-') {
                    out.push('-');
                }
            } else if ch.is_uppercase() {
                if i > 0 && !out.ends_with('-') {
                    out.push('-');
                }
                out.extend(ch.to_lowercase());
            } else {
                out.push(ch);
            }
        }
        out
    })
}

/// Convert an identifier to snake_case: `maxRetries` -> `max_retries`.
pub fn to_snake_case(name: &str) -> String {
    per_segment(name, |seg| {
        let mut out = String::with_capacity(seg.len());
        for (i, ch) in seg.chars().enumerate() {
            if ch == '-' || ch == '_' || ch == ' ' {
                if !out.ends_with('_') {
                    out.push('_');
                }
            } else if ch.is_uppercase() {
                if i > 0 && !out.ends_with('_') {
                    out.push('_');
                }
                out.extend(ch.to_lowercase());
            } else {
                out.push(ch);
            }
        }
        out
    })
}

/// Convert an identifier to SCREAMING_SNAKE_CASE for environment keys.
///
/// Dots become underscores so `db.host` reads as `DB_HOST`.
pub fn to_screaming_snake_case(name: &str) -> String {
    to_snake_case(name).replace('.', "_").to_uppercase()
}

/// Convert an identifier to lowerCamelCase: `max_retries` -> `maxRetries`.
pub fn to_lower_camel_case(name: &str) -> String {
    per_segment(name, |seg| {
        let mut out = String::with_capacity(seg.len());
        let mut upper_next = false;
        for (i, ch) in seg.chars().enumerate() {
            if ch == '_' || ch == '-' || ch == ' ' {
                upper_next = true;
            } else if upper_next {
                out.extend(ch.to_uppercase());
                upper_next = false;
            } else if i == 0 {
                out.extend(ch.to_lowercase());
            } else {
                out.push(ch);
            }
        }
        out
    })
}

/// The default converter for canonical flag names.
pub fn default_flag_converter() -> NameConverter {
    Rc::new(|name| to_kebab_case(name))
}

/// The default converter for environment variable keys.
pub fn default_env_converter() -> NameConverter {
    Rc::new(|name| to_screaming_snake_case(name))
}

// Dotted segments (nested field paths, slice indices) convert independently.
fn per_segment(name: &str, f: impl Fn(&str) -> String) -> String {
    name.split('.').map(|seg| f(seg)).collect::<Vec<_>>().join(".")
}
