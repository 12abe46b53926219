//! Environment access seam and language discovery
//!
//! The parser never reads the process environment directly; everything goes
//! through [`EnvResolver`] so tests can inject deterministic values.

use std::collections::HashMap;

use crate::i18n::Lang;

/// Resolves environment variables for fallback values and language
/// selection.
pub trait EnvResolver {
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvResolver for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed map, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    values: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl EnvResolver for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Platform locale variables consulted when system-locale checking is
/// enabled, in priority order.
const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LANG", "LANGUAGE"];

/// Discover the UI language: the distinguished variable first, then the
/// platform locale variables when enabled.
pub fn detect_language(
    resolver: &dyn EnvResolver,
    language_var: &str,
    check_system_locale: bool,
) -> Option<Lang> {
    if let Some(value) = resolver.get(language_var) {
        let value = value.trim();
        if !value.is_empty() {
            return Some(Lang::new(value));
        }
    }
    if check_system_locale {
        for var in LOCALE_VARS {
            if let Some(value) = resolver.get(var) {
                if let Some(tag) = locale_to_tag(&value) {
                    return Some(tag);
                }
            }
        }
    }
    None
}

// "de_DE.UTF-8" -> de-de; "C"/"POSIX" carry no language
fn locale_to_tag(value: &str) -> Option<Lang> {
    let base = value.split(['.', '@']).next()?.trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(Lang::new(base))
}
