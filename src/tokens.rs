//! Token classification
//!
//! Decides, per raw token, whether it is a flag payload (prefix stripped,
//! `=`-form split) or a bare token the parser resolves as a command or
//! positional. POSIX compact groups are decomposed into grapheme clusters
//! here; which of those clusters are real flags is the parser's call, since
//! it needs the registry.

use unicode_segmentation::UnicodeSegmentation;

/// A flag token after prefix stripping and `=` splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagToken {
    pub name: String,
    pub value: Option<String>,
}

/// Stateless per-token classifier configured with the active prefix set.
#[derive(Debug, Clone)]
pub struct TokenClassifier {
    // longest first, so `--` wins over `-`
    prefixes: Vec<String>,
}

impl TokenClassifier {
    pub fn new(mut prefixes: Vec<String>) -> Self {
        prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));
        Self { prefixes }
    }

    /// Strip the longest matching prefix. A bare prefix (`--` alone) is not
    /// a flag.
    pub fn strip_prefix<'t>(&self, token: &'t str) -> Option<&'t str> {
        for prefix in &self.prefixes {
            if let Some(rest) = token.strip_prefix(prefix.as_str()) {
                if !rest.is_empty() {
                    return Some(rest);
                }
            }
        }
        None
    }

    /// Classify a token as a flag payload, splitting `name=value` at the
    /// first `=`.
    pub fn flag_payload(&self, token: &str) -> Option<FlagToken> {
        let stripped = self.strip_prefix(token)?;
        match stripped.split_once('=') {
            Some((name, value)) if !name.is_empty() => {
                Some(FlagToken { name: name.to_string(), value: Some(value.to_string()) })
            }
            Some(_) => None,
            None => Some(FlagToken { name: stripped.to_string(), value: None }),
        }
    }

    pub fn is_flag_like(&self, token: &str) -> bool {
        self.strip_prefix(token).is_some()
    }
}

/// Split a stripped compact group into grapheme clusters for POSIX
/// expansion.
pub fn graphemes(name: &str) -> Vec<&str> {
    name.graphemes(true).collect()
}

/// True when `short` is a single grapheme cluster (the POSIX short-form
/// requirement).
pub fn is_single_grapheme(short: &str) -> bool {
    let mut iter = short.graphemes(true);
    iter.next().is_some() && iter.next().is_none()
}
