//! Error types for declargs
//!
//! Every variant of [`ParseError`] carries a stable message key so callers
//! can match errors without string comparison and render them in any
//! configured language. Wrapping variants (`ProcessingCommand`,
//! `ProcessingField`, `CommandCallbackError`) preserve the wrapped error's
//! key through [`ParseError::has_key`].

use thiserror::Error;

use crate::i18n::{Lang, LayeredBundle};

/// Boxed source for wrapping variants. Callback and hook failures cross the
/// seam as `anyhow::Error` and are boxed here.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for declargs operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Stable message keys, one per error variant.
pub mod keys {
    pub const UNKNOWN_FLAG: &str = "declargs.error.unknown_flag";
    pub const UNKNOWN_FLAG_WITH_SUGGESTIONS: &str = "declargs.error.unknown_flag_with_suggestions";
    pub const UNKNOWN_COMMAND: &str = "declargs.error.unknown_command";
    pub const COMMAND_NOT_FOUND: &str = "declargs.error.command_not_found";
    pub const AMBIGUOUS_COMMAND: &str = "declargs.error.ambiguous_command";
    pub const DUPLICATE_FLAG: &str = "declargs.error.duplicate_flag";
    pub const POSIX_SHORT_FORM: &str = "declargs.error.posix_short_form";
    pub const SHORT_FLAG_CONFLICT_CONTEXT: &str = "declargs.error.short_flag_conflict_context";
    pub const MISSING_VALUE: &str = "declargs.error.missing_value";
    pub const INVALID_BOOLEAN: &str = "declargs.error.invalid_boolean";
    pub const INVALID_INTEGER: &str = "declargs.error.invalid_integer";
    pub const INVALID_FLOAT: &str = "declargs.error.invalid_float";
    pub const VALUE_BETWEEN: &str = "declargs.error.value_between";
    pub const VALUE_AT_MOST: &str = "declargs.error.value_at_most";
    pub const VALUE_AT_LEAST: &str = "declargs.error.value_at_least";
    pub const MIN_LENGTH: &str = "declargs.error.min_length";
    pub const MAX_LENGTH: &str = "declargs.error.max_length";
    pub const PATTERN_MATCH: &str = "declargs.error.pattern_match";
    pub const VALUE_MUST_BE_ONE_OF: &str = "declargs.error.value_must_be_one_of";
    pub const INVALID_EMAIL_FORMAT: &str = "declargs.error.invalid_email_format";
    pub const INVALID_URL: &str = "declargs.error.invalid_url";
    pub const REQUIRED_FLAG: &str = "declargs.error.required_flag";
    pub const REQUIRED_POSITIONAL_FLAG: &str = "declargs.error.required_positional_flag";
    pub const CIRCULAR_DEPENDENCY: &str = "declargs.error.circular_dependency";
    pub const RECURSION_DEPTH_EXCEEDED: &str = "declargs.error.recursion_depth_exceeded";
    pub const DEPENDENCY_NOT_FOUND: &str = "declargs.error.dependency_not_found";
    pub const INDEX_OUT_OF_BOUNDS: &str = "declargs.error.index_out_of_bounds";
    pub const NEGATIVE_CAPACITY: &str = "declargs.error.negative_capacity";
    pub const PROCESSING_COMMAND: &str = "declargs.error.processing_command";
    pub const PROCESSING_FIELD: &str = "declargs.error.processing_field";
    pub const UNKNOWN_VALIDATOR: &str = "declargs.error.unknown_validator";
    pub const VALIDATOR_MUST_USE_PARENTHESES: &str =
        "declargs.error.validator_must_use_parentheses";
    pub const VALIDATION_COMBINED_FAILED: &str = "declargs.error.validation_combined_failed";
    pub const COMMAND_CALLBACK_ERROR: &str = "declargs.error.command_callback_error";
    pub const DEPENDENCY_VALUE_MISMATCH: &str = "declargs.warning.dependency_value_mismatch";
    pub const DEPENDENCY_NOT_SET: &str = "declargs.warning.dependency_not_set";
    pub const NAMING_CONVENTION: &str = "declargs.warning.naming_convention";
}

/// Errors produced by declaration, parsing, validation, and execution.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A flag token that matches no declaration in scope
    #[error("unknown flag: {name}")]
    UnknownFlag { name: String },

    /// Unknown flag, with a rendered "did you mean" list
    #[error("unknown flag: {name}. {suggestions}")]
    UnknownFlagWithSuggestions { name: String, suggestions: String },

    /// A bare token that matches no command in scope
    #[error("unknown command '{name}' at '{path}'{}", format_suffix(.suggestions))]
    UnknownCommand { name: String, path: String, suggestions: String },

    /// A scheduled or requested path has no executable command
    #[error("no executable command found at path: {path}")]
    CommandNotFound { path: String },

    /// A token resolves to more than one command
    #[error("ambiguous command '{name}': matches {candidates}")]
    AmbiguousCommand { name: String, candidates: String },

    /// Redeclaration of (name, path)
    #[error("flag already declared: {name}")]
    DuplicateFlag { name: String },

    /// POSIX mode requires single-grapheme short forms
    #[error("POSIX short form for flag '{flag}' must be a single character, got '{short}'")]
    PosixShortForm { flag: String, short: String },

    /// Two flags claim the same short form in one scope
    #[error("short flag '{short}' for '{flag}' conflicts with '{existing}' in context '{context}'")]
    ShortFlagConflictContext { short: String, flag: String, existing: String, context: String },

    /// A non-standalone flag reached end of input or another flag without a value
    #[error("flag requires a value: {flag}")]
    MissingValue { flag: String },

    #[error("invalid boolean value '{value}' for flag '{flag}'")]
    InvalidBoolean { flag: String, value: String },

    #[error("invalid integer value: {value}")]
    InvalidInteger { value: String },

    #[error("invalid float value: {value}")]
    InvalidFloat { value: String },

    #[error("value {value} must be between {min} and {max}")]
    ValueBetween { value: String, min: String, max: String },

    #[error("value {value} must be at most {max}")]
    ValueAtMost { value: String, max: String },

    #[error("value {value} must be at least {min}")]
    ValueAtLeast { value: String, min: String },

    #[error("value must be at least {min} characters long, got {length}")]
    MinLength { length: usize, min: usize },

    #[error("value must be at most {max} characters long, got {length}")]
    MaxLength { length: usize, max: usize },

    /// Accepted-pattern or pattern-shaped validator failure; `description`
    /// is resolved as a translation key first, literal otherwise.
    #[error("value '{value}' does not match: {description}")]
    PatternMatch { value: String, description: String },

    #[error("value '{value}' must be one of: {allowed}")]
    ValueMustBeOneOf { value: String, allowed: String },

    #[error("invalid email address: {value}")]
    InvalidEmailFormat { value: String },

    #[error("invalid URL: {value}")]
    InvalidUrl { value: String },

    #[error("required flag missing: {name}")]
    RequiredFlag { name: String },

    #[error("required positional argument missing: {name} (position {position})")]
    RequiredPositionalFlag { name: String, position: usize },

    #[error("circular dependency detected: {chain}")]
    CircularDependency { chain: String },

    #[error("maximum recursion depth exceeded at: {context}")]
    RecursionDepthExceeded { context: String },

    #[error("flag '{flag}' depends on unknown flag '{dependency}'")]
    DependencyNotFound { flag: String, dependency: String },

    #[error("index {index} out of bounds for '{field}' (capacity {capacity})")]
    IndexOutOfBounds { index: usize, capacity: usize, field: String },

    #[error("negative capacity {capacity} for '{field}'")]
    NegativeCapacity { capacity: i64, field: String },

    /// Wraps a callback failure surfaced during exec-on-parse
    #[error("error processing command '{path}': {source}")]
    ProcessingCommand {
        path: String,
        #[source]
        source: BoxedError,
    },

    /// Wraps a conversion or assignment failure for a bound struct field
    #[error("error processing field '{field}': {source}")]
    ProcessingField {
        field: String,
        #[source]
        source: Box<ParseError>,
    },

    #[error("unknown validator: {name}")]
    UnknownValidator { name: String },

    #[error("validator '{name}' must use parentheses: {name}(...)")]
    ValidatorMustUseParentheses { name: String },

    /// A combinator (`all`/`any`) rejected the value
    #[error("value '{value}' failed validation: {failures}")]
    ValidationCombinedFailed { value: String, failures: String },

    /// Wraps a callback failure surfaced from `execute`
    #[error("command '{path}' failed: {source}")]
    CommandCallbackError {
        path: String,
        #[source]
        source: BoxedError,
    },
}

fn format_suffix(suggestions: &str) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(". {suggestions}")
    }
}

impl ParseError {
    /// The stable message key for this error.
    pub fn key(&self) -> &'static str {
        match self {
            Self::UnknownFlag { .. } => keys::UNKNOWN_FLAG,
            Self::UnknownFlagWithSuggestions { .. } => keys::UNKNOWN_FLAG_WITH_SUGGESTIONS,
            Self::UnknownCommand { .. } => keys::UNKNOWN_COMMAND,
            Self::CommandNotFound { .. } => keys::COMMAND_NOT_FOUND,
            Self::AmbiguousCommand { .. } => keys::AMBIGUOUS_COMMAND,
            Self::DuplicateFlag { .. } => keys::DUPLICATE_FLAG,
            Self::PosixShortForm { .. } => keys::POSIX_SHORT_FORM,
            Self::ShortFlagConflictContext { .. } => keys::SHORT_FLAG_CONFLICT_CONTEXT,
            Self::MissingValue { .. } => keys::MISSING_VALUE,
            Self::InvalidBoolean { .. } => keys::INVALID_BOOLEAN,
            Self::InvalidInteger { .. } => keys::INVALID_INTEGER,
            Self::InvalidFloat { .. } => keys::INVALID_FLOAT,
            Self::ValueBetween { .. } => keys::VALUE_BETWEEN,
            Self::ValueAtMost { .. } => keys::VALUE_AT_MOST,
            Self::ValueAtLeast { .. } => keys::VALUE_AT_LEAST,
            Self::MinLength { .. } => keys::MIN_LENGTH,
            Self::MaxLength { .. } => keys::MAX_LENGTH,
            Self::PatternMatch { .. } => keys::PATTERN_MATCH,
            Self::ValueMustBeOneOf { .. } => keys::VALUE_MUST_BE_ONE_OF,
            Self::InvalidEmailFormat { .. } => keys::INVALID_EMAIL_FORMAT,
            Self::InvalidUrl { .. } => keys::INVALID_URL,
            Self::RequiredFlag { .. } => keys::REQUIRED_FLAG,
            Self::RequiredPositionalFlag { .. } => keys::REQUIRED_POSITIONAL_FLAG,
            Self::CircularDependency { .. } => keys::CIRCULAR_DEPENDENCY,
            Self::RecursionDepthExceeded { .. } => keys::RECURSION_DEPTH_EXCEEDED,
            Self::DependencyNotFound { .. } => keys::DEPENDENCY_NOT_FOUND,
            Self::IndexOutOfBounds { .. } => keys::INDEX_OUT_OF_BOUNDS,
            Self::NegativeCapacity { .. } => keys::NEGATIVE_CAPACITY,
            Self::ProcessingCommand { .. } => keys::PROCESSING_COMMAND,
            Self::ProcessingField { .. } => keys::PROCESSING_FIELD,
            Self::UnknownValidator { .. } => keys::UNKNOWN_VALIDATOR,
            Self::ValidatorMustUseParentheses { .. } => keys::VALIDATOR_MUST_USE_PARENTHESES,
            Self::ValidationCombinedFailed { .. } => keys::VALIDATION_COMBINED_FAILED,
            Self::CommandCallbackError { .. } => keys::COMMAND_CALLBACK_ERROR,
        }
    }

    /// Positional arguments for the key's message template, in `{0}` order.
    pub fn message_args(&self) -> Vec<String> {
        match self {
            Self::UnknownFlag { name } => vec![name.clone()],
            Self::UnknownFlagWithSuggestions { name, suggestions } => {
                vec![name.clone(), suggestions.clone()]
            }
            Self::UnknownCommand { name, path, suggestions } => {
                vec![name.clone(), path.clone(), suggestions.clone()]
            }
            Self::CommandNotFound { path } => vec![path.clone()],
            Self::AmbiguousCommand { name, candidates } => vec![name.clone(), candidates.clone()],
            Self::DuplicateFlag { name } => vec![name.clone()],
            Self::PosixShortForm { flag, short } => vec![flag.clone(), short.clone()],
            Self::ShortFlagConflictContext { short, flag, existing, context } => {
                vec![short.clone(), flag.clone(), existing.clone(), context.clone()]
            }
            Self::MissingValue { flag } => vec![flag.clone()],
            Self::InvalidBoolean { flag, value } => vec![value.clone(), flag.clone()],
            Self::InvalidInteger { value } => vec![value.clone()],
            Self::InvalidFloat { value } => vec![value.clone()],
            Self::ValueBetween { value, min, max } => {
                vec![value.clone(), min.clone(), max.clone()]
            }
            Self::ValueAtMost { value, max } => vec![value.clone(), max.clone()],
            Self::ValueAtLeast { value, min } => vec![value.clone(), min.clone()],
            Self::MinLength { length, min } => vec![min.to_string(), length.to_string()],
            Self::MaxLength { length, max } => vec![max.to_string(), length.to_string()],
            Self::PatternMatch { value, description } => {
                vec![value.clone(), description.clone()]
            }
            Self::ValueMustBeOneOf { value, allowed } => vec![value.clone(), allowed.clone()],
            Self::InvalidEmailFormat { value } => vec![value.clone()],
            Self::InvalidUrl { value } => vec![value.clone()],
            Self::RequiredFlag { name } => vec![name.clone()],
            Self::RequiredPositionalFlag { name, position } => {
                vec![name.clone(), position.to_string()]
            }
            Self::CircularDependency { chain } => vec![chain.clone()],
            Self::RecursionDepthExceeded { context } => vec![context.clone()],
            Self::DependencyNotFound { flag, dependency } => {
                vec![flag.clone(), dependency.clone()]
            }
            Self::IndexOutOfBounds { index, capacity, field } => {
                vec![index.to_string(), field.clone(), capacity.to_string()]
            }
            Self::NegativeCapacity { capacity, field } => {
                vec![capacity.to_string(), field.clone()]
            }
            Self::ProcessingCommand { path, source } => vec![path.clone(), source.to_string()],
            Self::ProcessingField { field, source } => vec![field.clone(), source.to_string()],
            Self::UnknownValidator { name } => vec![name.clone()],
            Self::ValidatorMustUseParentheses { name } => vec![name.clone()],
            Self::ValidationCombinedFailed { value, failures } => {
                vec![value.clone(), failures.clone()]
            }
            Self::CommandCallbackError { path, source } => vec![path.clone(), source.to_string()],
        }
    }

    /// True when this error, or any error it wraps, carries `key`.
    ///
    /// This is the `errors.Is`-style match surface: wrapping preserves the
    /// wrapped error's key.
    pub fn has_key(&self, key: &str) -> bool {
        if self.key() == key {
            return true;
        }
        match self {
            Self::ProcessingField { source, .. } => source.has_key(key),
            Self::ProcessingCommand { source, .. } | Self::CommandCallbackError { source, .. } => {
                source_has_key(source.as_ref(), key)
            }
            _ => false,
        }
    }

    /// Render this error in `lang` through the layered bundle, falling back
    /// to the English `Display` text when the key has no template.
    pub fn localized(&self, bundle: &LayeredBundle, lang: &Lang) -> String {
        bundle
            .format_message(self.key(), lang, &self.message_args())
            .unwrap_or_else(|| self.to_string())
    }

    /// Wrap a callback failure observed during exec-on-parse.
    pub fn processing_command(path: impl Into<String>, source: anyhow::Error) -> Self {
        Self::ProcessingCommand { path: path.into(), source: unwrap_parse_error(source) }
    }

    /// Wrap a callback failure observed during `execute`.
    pub fn callback_error(path: impl Into<String>, source: anyhow::Error) -> Self {
        Self::CommandCallbackError { path: path.into(), source: unwrap_parse_error(source) }
    }

    /// Wrap a field conversion failure with the field's dotted name.
    pub fn processing_field(field: impl Into<String>, source: ParseError) -> Self {
        Self::ProcessingField { field: field.into(), source: Box::new(source) }
    }
}

// A callback that failed with a ParseError keeps it directly downcastable
// through the wrapping variant.
fn unwrap_parse_error(source: anyhow::Error) -> BoxedError {
    match source.downcast::<ParseError>() {
        Ok(inner) => Box::new(inner),
        Err(other) => other.into(),
    }
}

fn source_has_key(source: &(dyn std::error::Error + 'static), key: &str) -> bool {
    if let Some(parse_err) = source.downcast_ref::<ParseError>() {
        return parse_err.has_key(key);
    }
    source.source().map(|inner| source_has_key(inner, key)).unwrap_or(false)
}
