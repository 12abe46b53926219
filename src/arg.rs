//! The flag data model
//!
//! An [`Argument`] is everything the parser knows about one flag: its type,
//! short form, default, requirements, dependencies, accepted patterns,
//! validators, filters, secure-prompt configuration, positional index, and
//! slice capacity. Instances are built with chainable methods and handed to
//! the registry; after the first parse they only change through the
//! parser's explicit mutators.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use regex::Regex;
use uuid::Uuid;

use crate::parser::Parser;
use crate::validate::Validator;

/// How a flag consumes and stores values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgType {
    /// Declared without a type; treated as `Single` at parse time
    #[default]
    Empty,
    /// One scalar value
    Single,
    /// A sequence of scalars, accumulated across repeats and delimiter
    /// splits
    Chained,
    /// Boolean; presence means true
    Standalone,
    /// The value is a path whose file contents become the value
    File,
}

/// A string-to-string filter applied before or after validation.
pub type ValueFilter = Rc<dyn Fn(&str) -> String>;

/// A conditional-required predicate evaluated against the parse results.
pub type RequiredIf = Rc<dyn Fn(&Parser) -> bool>;

/// A regex constraint with a human-readable (or translatable) description.
#[derive(Clone)]
pub struct AcceptedPattern {
    pattern: String,
    description: String,
    compiled: Rc<OnceCell<Option<Regex>>>,
}

impl AcceptedPattern {
    pub fn new(pattern: impl Into<String>, description: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), description: description.into(), compiled: Rc::new(OnceCell::new()) }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The description, resolved as a translation key by the caller first.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether `value` matches. An uncompilable pattern never matches.
    pub fn matches(&self, value: &str) -> bool {
        self.compiled
            .get_or_init(|| Regex::new(&self.pattern).ok())
            .as_ref()
            .map(|re| re.is_match(value))
            .unwrap_or(false)
    }
}

impl fmt::Debug for AcceptedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcceptedPattern")
            .field("pattern", &self.pattern)
            .field("description", &self.description)
            .finish()
    }
}

/// Secure-prompt configuration: the value is read from the terminal seam
/// instead of argv.
#[derive(Debug, Clone, Default)]
pub struct SecurePrompt {
    pub prompt: Option<String>,
}

/// A flag declaration.
#[derive(Clone, Default)]
pub struct Argument {
    pub(crate) id: Uuid,
    arg_type: ArgType,
    short: Option<String>,
    description: String,
    name_key: Option<String>,
    desc_key: Option<String>,
    default_value: Option<String>,
    required: bool,
    required_if: Option<RequiredIf>,
    depends_on: IndexMap<String, Vec<String>>,
    accepted: Vec<AcceptedPattern>,
    validators: Vec<Validator>,
    pre_filter: Option<ValueFilter>,
    post_filter: Option<ValueFilter>,
    secure: Option<SecurePrompt>,
    position: Option<usize>,
    capacity: Option<usize>,
}

impl Argument {
    fn with_type(arg_type: ArgType) -> Self {
        Self { id: Uuid::new_v4(), arg_type, ..<Self as Default>::default() }
    }

    /// A flag taking one scalar value.
    pub fn single() -> Self {
        Self::with_type(ArgType::Single)
    }

    /// A flag whose value is a sequence.
    pub fn chained() -> Self {
        Self::with_type(ArgType::Chained)
    }

    /// A boolean flag; presence means true.
    pub fn standalone() -> Self {
        Self::with_type(ArgType::Standalone)
    }

    /// A flag whose value names a file whose contents become the value.
    pub fn file() -> Self {
        Self::with_type(ArgType::File)
    }

    pub fn arg_type(&self) -> ArgType {
        self.arg_type
    }

    /// Effective type: `Empty` declarations parse as `Single`.
    pub fn effective_type(&self) -> ArgType {
        match self.arg_type {
            ArgType::Empty => ArgType::Single,
            other => other,
        }
    }

    pub fn short(mut self, short: impl Into<String>) -> Self {
        self.short = Some(short.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name_key(mut self, key: impl Into<String>) -> Self {
        self.name_key = Some(key.into());
        self
    }

    pub fn desc_key(mut self, key: impl Into<String>) -> Self {
        self.desc_key = Some(key.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Require this flag only when the predicate holds after parsing.
    pub fn required_if(mut self, predicate: impl Fn(&Parser) -> bool + 'static) -> Self {
        self.required_if = Some(Rc::new(predicate));
        self
    }

    /// Declare a dependency on another flag. An empty `values` list means
    /// "any value".
    pub fn depends_on<S: Into<String>>(mut self, flag: impl Into<String>, values: Vec<S>) -> Self {
        self.depends_on.insert(flag.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Constrain the value to a regex pattern, with a description shown on
    /// mismatch (resolved as a translation key first).
    pub fn accepted(mut self, pattern: impl Into<String>, description: impl Into<String>) -> Self {
        self.accepted.push(AcceptedPattern::new(pattern, description));
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn validators(mut self, validators: Vec<Validator>) -> Self {
        self.validators.extend(validators);
        self
    }

    /// Transform the raw value before accepted-pattern checks and
    /// validators run.
    pub fn pre_filter(mut self, filter: impl Fn(&str) -> String + 'static) -> Self {
        self.pre_filter = Some(Rc::new(filter));
        self
    }

    /// Transform the value after validation, just before storage.
    pub fn post_filter(mut self, filter: impl Fn(&str) -> String + 'static) -> Self {
        self.post_filter = Some(Rc::new(filter));
        self
    }

    /// Read the value from the terminal seam instead of argv.
    pub fn secure(mut self, prompt: Option<String>) -> Self {
        self.secure = Some(SecurePrompt { prompt });
        self
    }

    /// Bind this flag to the k-th unconsumed non-flag token.
    pub fn position(mut self, index: usize) -> Self {
        self.position = Some(index);
        self
    }

    /// Cap the number of accumulated values for a chained flag.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    // Read accessors used by the parser, help, and completion.

    pub fn short_form(&self) -> Option<&str> {
        self.short.as_deref()
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn name_key_ref(&self) -> Option<&str> {
        self.name_key.as_deref()
    }

    pub fn desc_key_ref(&self) -> Option<&str> {
        self.desc_key.as_deref()
    }

    pub fn default(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn required_if_ref(&self) -> Option<&RequiredIf> {
        self.required_if.as_ref()
    }

    pub fn dependencies(&self) -> &IndexMap<String, Vec<String>> {
        &self.depends_on
    }

    pub fn accepted_patterns(&self) -> &[AcceptedPattern] {
        &self.accepted
    }

    pub fn validator_list(&self) -> &[Validator] {
        &self.validators
    }

    pub fn pre_filter_ref(&self) -> Option<&ValueFilter> {
        self.pre_filter.as_ref()
    }

    pub fn post_filter_ref(&self) -> Option<&ValueFilter> {
        self.post_filter.as_ref()
    }

    pub fn secure_ref(&self) -> Option<&SecurePrompt> {
        self.secure.as_ref()
    }

    pub fn position_index(&self) -> Option<usize> {
        self.position
    }

    pub fn capacity_limit(&self) -> Option<usize> {
        self.capacity
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("type", &self.arg_type)
            .field("short", &self.short)
            .field("required", &self.required)
            .field("default", &self.default_value)
            .field("position", &self.position)
            .field("accepted", &self.accepted)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let arg = Argument::single()
            .short("p")
            .description("listen port")
            .default_value("8080")
            .required(true);
        assert_eq!(arg.arg_type(), ArgType::Single);
        assert_eq!(arg.short_form(), Some("p"));
        assert_eq!(arg.default(), Some("8080"));
        assert!(arg.is_required());
    }

    #[test]
    fn test_empty_type_is_single_at_parse() {
        let arg = <Argument as Default>::default();
        assert_eq!(arg.arg_type(), ArgType::Empty);
        assert_eq!(arg.effective_type(), ArgType::Single);
    }

    #[test]
    fn test_accepted_pattern_matching() {
        let pat = AcceptedPattern::new("^[0-9]+$", "digits");
        assert!(pat.matches("123"));
        assert!(!pat.matches("12a"));
    }

    #[test]
    fn test_uncompilable_pattern_never_matches() {
        let pat = AcceptedPattern::new("([", "broken");
        assert!(!pat.matches("anything"));
    }

    #[test]
    fn test_depends_on_preserves_order() {
        let arg = Argument::single()
            .depends_on("format", vec!["json", "yaml"])
            .depends_on::<String>("output", vec![]);
        let keys: Vec<_> = arg.dependencies().keys().collect();
        assert_eq!(keys, ["format", "output"]);
    }
}
