//! Parser configuration
//!
//! Everything tunable about a [`crate::Parser`] lives here: flag prefixes,
//! POSIX mode, name converters, the chained-value delimiter predicate, help
//! and language flags, suggestion thresholds, and the end-function invoked
//! after auto-rendered help.

use std::fmt;
use std::rc::Rc;

use crate::convert::{default_flag_converter, NameConverter};
use crate::help::HelpStyle;
use crate::i18n::NameKind;

/// Formats a suggestion list into the sentence shown to the user.
pub type SuggestionFormatter = Rc<dyn Fn(&[String], NameKind) -> String>;

/// Invoked after auto-rendered help or version output. The default
/// terminates the process; tests override it.
pub type EndFn = Rc<dyn Fn()>;

/// Splits a chained value into fragments.
pub type DelimiterPredicate = Rc<dyn Fn(char) -> bool>;

#[derive(Clone)]
pub struct ParserSettings {
    /// Recognized flag prefixes, longest tried first.
    pub prefixes: Vec<String>,
    /// POSIX mode: single-grapheme short forms, compact `-abc` groups.
    pub posix: bool,
    /// Converter from field/declared names to canonical flag names; also
    /// drives naming-convention warnings. `None` disables the warnings.
    pub flag_name_converter: Option<NameConverter>,
    /// Converter from canonical names to environment keys. `None` disables
    /// environment fallback entirely.
    pub env_name_converter: Option<NameConverter>,
    /// Chained-value delimiter predicate. Defaults to `,`, `|`, whitespace.
    pub chained_delimiter: DelimiterPredicate,
    /// Help flag names (canonical), tolerated anywhere on the line.
    pub help_flags: Vec<String>,
    /// Render help and invoke the end-function when a help flag is seen.
    pub auto_help: bool,
    /// Version string; setting it enables the version flags.
    pub version: Option<String>,
    pub version_flags: Vec<String>,
    /// The language-selection flag, filtered out before re-parsing.
    pub language_flag: String,
    /// The distinguished language environment variable.
    pub language_env_var: String,
    /// Also consult `LC_ALL`/`LANG`/`LANGUAGE` for the UI language.
    pub check_system_locale: bool,
    /// Run every callback at its terminal transition during parse.
    pub exec_on_parse: bool,
    pub flag_suggestion_threshold: usize,
    pub command_suggestion_threshold: usize,
    /// Overrides the default "Did you mean ...?" rendering.
    pub suggestion_formatter: Option<SuggestionFormatter>,
    pub help_style: HelpStyle,
    /// Invoked after auto help/version output; `None` means process exit.
    pub end_fn: Option<EndFn>,
    /// Depth guard for command paths and nested declarations.
    pub max_depth: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            prefixes: vec!["--".to_string(), "-".to_string()],
            posix: false,
            flag_name_converter: Some(default_flag_converter()),
            env_name_converter: None,
            chained_delimiter: Rc::new(|c: char| c == ',' || c == '|' || c.is_whitespace()),
            help_flags: vec!["help".to_string(), "h".to_string()],
            auto_help: true,
            version: None,
            version_flags: vec!["version".to_string()],
            language_flag: "lang".to_string(),
            language_env_var: "DECLARGS_LANG".to_string(),
            check_system_locale: false,
            exec_on_parse: false,
            flag_suggestion_threshold: 2,
            command_suggestion_threshold: 2,
            suggestion_formatter: None,
            help_style: HelpStyle::Flat,
            end_fn: None,
            max_depth: 64,
        }
    }
}

impl fmt::Debug for ParserSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserSettings")
            .field("prefixes", &self.prefixes)
            .field("posix", &self.posix)
            .field("help_flags", &self.help_flags)
            .field("language_flag", &self.language_flag)
            .field("language_env_var", &self.language_env_var)
            .field("exec_on_parse", &self.exec_on_parse)
            .field("flag_suggestion_threshold", &self.flag_suggestion_threshold)
            .field("command_suggestion_threshold", &self.command_suggestion_threshold)
            .field("help_style", &self.help_style)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delimiters() {
        let settings = ParserSettings::default();
        for c in [',', '|', ' ', '\t'] {
            assert!(settings.chained_delimiter.as_ref()(c));
        }
        assert!(!settings.chained_delimiter.as_ref()(';'));
    }

    #[test]
    fn test_default_flags() {
        let settings = ParserSettings::default();
        assert_eq!(settings.prefixes, vec!["--", "-"]);
        assert_eq!(settings.help_flags, vec!["help", "h"]);
        assert_eq!(settings.flag_suggestion_threshold, 2);
        assert_eq!(settings.command_suggestion_threshold, 2);
    }
}
