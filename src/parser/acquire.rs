//! Value acquisition
//!
//! Every accepted value, whatever its source, runs the same pipeline:
//! file-content substitution (File flags), pre-filter, accepted-pattern
//! check, validators, post-filter, storage. Chained flags additionally
//! split into fragments and accumulate.

use std::path::Path;

use crate::arg::{ArgType, Argument};
use crate::error::{ParseError, Result};
use crate::input::expand_exec_dir;
use crate::registry::split_key;

use super::Parser;

/// Where a value came from, for precedence bookkeeping and tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueSource {
    Cli,
    External,
    Env,
    Declared,
}

/// Store a standalone flag's boolean state.
pub(crate) fn store_bool(parser: &mut Parser, key: &str, value: bool) {
    tracing::debug!(key, value, "standalone flag set");
    parser.state.options.insert(key.to_string(), value.to_string());
}

/// Run the pipeline and store the result. Errors are recorded on the
/// parser (the parse continues) and `false` is returned.
pub(crate) fn process_and_store(
    parser: &mut Parser,
    key: &str,
    arg: &Argument,
    raw: &str,
    source: ValueSource,
) -> bool {
    match process_value(parser, key, arg, raw) {
        Ok(value) => {
            if arg.effective_type() == ArgType::Chained {
                accumulate_chained(parser, key, arg, &value);
            }
            tracing::debug!(key, ?source, "value acquired");
            parser.state.options.insert(key.to_string(), value);
            true
        }
        Err(error) => {
            parser.push_error(error);
            false
        }
    }
}

/// pre-filter -> accepted patterns -> validators -> post-filter
fn process_value(parser: &mut Parser, key: &str, arg: &Argument, raw: &str) -> Result<String> {
    let (name, _) = split_key(key);
    let mut value = raw.to_string();

    if arg.effective_type() == ArgType::File {
        let path = expand_exec_dir(value.trim());
        value = parser.files.read_to_string(Path::new(&path)).map_err(|_| {
            ParseError::processing_field(
                name,
                ParseError::PatternMatch { value: path.clone(), description: "a readable file".to_string() },
            )
        })?;
    }

    if let Some(filter) = arg.pre_filter_ref() {
        value = filter.as_ref()(&value);
    }

    let patterns = arg.accepted_patterns();
    if !patterns.is_empty() && !patterns.iter().any(|p| p.matches(&value)) {
        let description = patterns
            .iter()
            .map(|p| parser.bundle.describe(p.description(), &parser.language))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ParseError::PatternMatch { value, description });
    }

    for validator in arg.validator_list() {
        validator.check(&value)?;
    }

    if let Some(filter) = arg.post_filter_ref() {
        value = filter.as_ref()(&value);
    }
    Ok(value)
}

/// Split one chained occurrence into fragments and append them, honoring
/// the declared capacity.
fn accumulate_chained(parser: &mut Parser, key: &str, arg: &Argument, value: &str) {
    let fragments = split_chained(parser, value);
    let list = parser.state.lists.entry(key.to_string()).or_default();
    list.extend(fragments);
    if let Some(capacity) = arg.capacity_limit() {
        if list.len() > capacity {
            let (name, _) = split_key(key);
            let error = ParseError::IndexOutOfBounds {
                index: capacity,
                capacity,
                field: name.to_string(),
            };
            list.truncate(capacity);
            parser.push_error(error);
        }
    }
}

/// Split by the configured delimiter predicate; consecutive delimiters
/// collapse and empty fragments drop out.
pub(crate) fn split_chained(parser: &Parser, value: &str) -> Vec<String> {
    let predicate = parser.settings.chained_delimiter.clone();
    value
        .split(|c: char| predicate.as_ref()(c))
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect()
}
