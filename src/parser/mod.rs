//! The parser and dispatcher
//!
//! [`Parser`] owns the registries, bundles, seams, and per-parse result
//! state. Parsing walks the token stream ([`machine`]), acquires and
//! validates values ([`acquire`]), runs the end-of-input post-pass
//! ([`postpass`]), and schedules terminal-command callbacks for execution
//! ([`execute`]).

mod acquire;
mod execute;
mod machine;
mod postpass;

use std::collections::HashMap;
use std::io::Write;

use indexmap::IndexMap;

use crate::arg::Argument;
use crate::binding::{truthy, CommandLine, FromArgValue};
use crate::command::Command;
use crate::completion::Shell;
use crate::convert::NameConverter;
use crate::env::{EnvResolver, ProcessEnv};
use crate::error::{keys, ParseError, Result};
use crate::help;
use crate::hooks::{HookOrder, Hooks};
use crate::i18n::{Lang, LayeredBundle, NameKind, TranslationRegistry};
use crate::input::{FileReader, StdFileReader, StdTerminal, TerminalReader};
use crate::registry::{flag_key, scope_cascade, split_key, Registry};
use crate::settings::ParserSettings;
use crate::tokens::TokenClassifier;
use crate::validate::Validator;

/// One entry of the positional-argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalArg {
    pub value: String,
    /// Declared position for bound entries, sequential index otherwise.
    pub position: usize,
    /// Canonical name of the positional flag this token was assigned to.
    pub flag: Option<String>,
}

/// Per-parse mutable state.
#[derive(Debug, Default)]
pub(crate) struct ParseState {
    /// storage key -> accepted value (single, file, standalone, last
    /// chained occurrence)
    pub options: IndexMap<String, String>,
    /// storage key -> accumulated fragments for chained flags
    pub lists: IndexMap<String, Vec<String>>,
    /// raw positional tokens in stream order, resolved in the post-pass
    pub positionals: Vec<PositionalArg>,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<String>,
    /// FIFO queue of terminal command paths awaiting execution
    pub scheduled: Vec<String>,
    /// every terminal path observed this parse (including exec-on-parse)
    pub visited: Vec<String>,
    pub exec_errors: IndexMap<String, ParseError>,
    /// set when an exec-on-parse callback failed and the walk stopped
    pub halted: bool,
}

/// The declarative command-line parser and dispatcher.
pub struct Parser {
    pub(crate) settings: ParserSettings,
    pub(crate) registry: Registry,
    pub(crate) bundle: LayeredBundle,
    pub(crate) translations: TranslationRegistry,
    pub(crate) language: Lang,
    pub(crate) env: Box<dyn EnvResolver>,
    pub(crate) terminal: Box<dyn TerminalReader>,
    pub(crate) files: Box<dyn FileReader>,
    pub(crate) hooks: Hooks,
    pub(crate) output: Box<dyn Write>,
    pub(crate) state: ParseState,
    /// Declaration-time warnings (naming convention); copied into each
    /// parse's warning list.
    pub(crate) decl_warnings: Vec<String>,
    declared_structs: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::with_settings(ParserSettings::default())
    }

    pub fn with_settings(settings: ParserSettings) -> Self {
        Self {
            settings,
            registry: Registry::new(),
            bundle: LayeredBundle::new(),
            translations: TranslationRegistry::new(),
            language: Lang::default(),
            env: Box::new(ProcessEnv),
            terminal: Box::new(StdTerminal),
            files: Box::new(StdFileReader),
            hooks: Hooks::new(),
            output: Box::new(std::io::stdout()),
            state: ParseState::default(),
            decl_warnings: Vec::new(),
            declared_structs: false,
        }
    }

    // ------------------------------------------------------------------
    // configuration

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ParserSettings {
        &mut self.settings
    }

    /// Enable POSIX mode: single-grapheme short forms and `-abc` compact
    /// groups.
    pub fn set_posix(&mut self, enabled: bool) -> &mut Self {
        self.settings.posix = enabled;
        self
    }

    /// Configure environment fallback. `None` disables it.
    pub fn set_env_name_converter(&mut self, converter: Option<NameConverter>) -> &mut Self {
        self.settings.env_name_converter = converter;
        self
    }

    pub fn set_env_resolver(&mut self, resolver: impl EnvResolver + 'static) -> &mut Self {
        self.env = Box::new(resolver);
        self
    }

    pub fn set_terminal_reader(&mut self, reader: impl TerminalReader + 'static) -> &mut Self {
        self.terminal = Box::new(reader);
        self
    }

    pub fn set_file_reader(&mut self, reader: impl FileReader + 'static) -> &mut Self {
        self.files = Box::new(reader);
        self
    }

    pub fn set_output(&mut self, output: impl Write + 'static) -> &mut Self {
        self.output = Box::new(output);
        self
    }

    pub fn set_hook_order(&mut self, order: HookOrder) -> &mut Self {
        self.hooks.order = order;
        self
    }

    /// Run every callback at its terminal transition during parse.
    pub fn set_exec_on_parse(&mut self, enabled: bool) -> &mut Self {
        self.settings.exec_on_parse = enabled;
        self
    }

    pub fn set_language(&mut self, lang: impl Into<Lang>) -> &mut Self {
        self.language = lang.into();
        self
    }

    pub fn language(&self) -> &Lang {
        &self.language
    }

    pub fn bundle(&self) -> &LayeredBundle {
        &self.bundle
    }

    /// Replace the user message catalog layer and rebuild the translated
    /// name registry.
    pub fn set_user_bundle(&mut self, bundle: crate::i18n::MessageBundle) -> &mut Self {
        self.bundle.set_user(bundle);
        self.rebuild_translations();
        self
    }

    /// Replace the system message catalog layer.
    pub fn set_system_bundle(&mut self, bundle: crate::i18n::MessageBundle) -> &mut Self {
        self.bundle.set_system(bundle);
        self.rebuild_translations();
        self
    }

    // ------------------------------------------------------------------
    // declaration

    /// Register a flag in the global scope.
    pub fn add_flag(&mut self, name: &str, arg: Argument) -> Result<()> {
        self.add_flag_to(name, arg, &[])
    }

    /// Register a flag scoped to one or more command paths.
    pub fn add_flag_to(&mut self, name: &str, arg: Argument, paths: &[&str]) -> Result<()> {
        if self.settings.posix {
            if let Some(short) = arg.short_form() {
                if !crate::tokens::is_single_grapheme(short) {
                    return Err(ParseError::PosixShortForm {
                        flag: name.to_string(),
                        short: short.to_string(),
                    });
                }
            }
        }
        if let Some(converter) = &self.settings.flag_name_converter {
            let expected = converter.as_ref()(name);
            if expected != name {
                let text = self
                    .bundle
                    .format_message(
                        keys::NAMING_CONVENTION,
                        &self.language,
                        &[name.to_string(), expected.clone()],
                    )
                    .unwrap_or_else(|| {
                        format!("flag name '{name}' does not match the configured naming convention (expected '{expected}')")
                    });
                self.decl_warnings.push(text);
            }
        }
        let paths: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        self.registry.add_flag(name, arg, &paths)?;
        self.rebuild_translations();
        Ok(())
    }

    /// Register a command tree (merging with any existing nodes on the same
    /// paths).
    pub fn add_command(&mut self, cmd: Command) -> Result<()> {
        let depth = 1 + cmd_depth(&cmd);
        if depth > self.settings.max_depth {
            return Err(ParseError::RecursionDepthExceeded { context: cmd.name_ref().to_string() });
        }
        self.registry.add_command(cmd)?;
        self.rebuild_translations();
        Ok(())
    }

    /// Mutate an existing declaration in place (the only sanctioned way to
    /// change a flag after declaration).
    pub fn set_argument(
        &mut self,
        name: &str,
        path: &str,
        configure: impl FnOnce(&mut Argument),
    ) -> Result<()> {
        match self.registry.flag_at_mut(name, path) {
            Some(arg) => {
                configure(arg);
                self.rebuild_translations();
                Ok(())
            }
            None => Err(ParseError::UnknownFlag { name: flag_key(name, path) }),
        }
    }

    /// Append validators to an existing declaration.
    pub fn add_flag_validators(
        &mut self,
        name: &str,
        path: &str,
        validators: Vec<Validator>,
    ) -> Result<()> {
        self.set_argument(name, path, |arg| {
            let updated = std::mem::take(arg).validators(validators);
            *arg = updated;
        })
    }

    /// Append accepted patterns to an existing declaration.
    pub fn accept_patterns(
        &mut self,
        name: &str,
        path: &str,
        patterns: Vec<(String, String)>,
    ) -> Result<()> {
        self.set_argument(name, path, |arg| {
            let mut updated = std::mem::take(arg);
            for (pattern, description) in patterns {
                updated = updated.accepted(pattern, description);
            }
            *arg = updated;
        })
    }

    /// Rename a flag in every scope it is declared in; translations follow
    /// the flag's internal ID.
    pub fn rename_flag(&mut self, name: &str, path: &str, new_name: &str) -> Result<()> {
        self.registry.rename_flag(name, path, new_name)?;
        self.rebuild_translations();
        Ok(())
    }

    /// Apply the configured flag-name converter to a raw (field) name.
    pub fn convert_flag_name(&self, raw: &str) -> String {
        match &self.settings.flag_name_converter {
            Some(converter) => converter.as_ref()(raw),
            None => raw.to_string(),
        }
    }

    /// Register a command under an existing (or creatable) parent path.
    pub fn add_subcommand(&mut self, parent_path: &str, cmd: Command) -> Result<()> {
        if parent_path.is_empty() {
            return self.add_command(cmd);
        }
        let mut node = cmd;
        for name in parent_path.split(' ').rev() {
            node = Command::new(name).subcommand(node);
        }
        self.add_command(node)
    }

    /// Attach (or replace) the callback of an already-registered command.
    pub fn set_command_callback(
        &mut self,
        path: &str,
        callback: impl Fn(&Parser, &Command) -> anyhow::Result<()> + 'static,
    ) -> Result<()> {
        match self.registry.command_mut(path) {
            Some(cmd) => {
                cmd.set_callback(callback);
                Ok(())
            }
            None => Err(ParseError::CommandNotFound { path: path.to_string() }),
        }
    }

    /// Declare a configuration struct's flags and commands.
    pub fn declare_struct<T: CommandLine>(&mut self) -> Result<()> {
        T::declare(self)?;
        self.declared_structs = true;
        Ok(())
    }

    /// Materialize `field.0 .. field.capacity-1` sub-paths for a slice
    /// field. Called from derive-generated code, where the capacity is an
    /// attribute literal.
    pub fn check_capacity(&self, field: &str, capacity: i64) -> Result<usize> {
        if capacity < 0 {
            return Err(ParseError::NegativeCapacity { capacity, field: field.to_string() });
        }
        Ok(capacity as usize)
    }

    pub(crate) fn registry_view(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn translations_ref(&self) -> &TranslationRegistry {
        &self.translations
    }

    // ------------------------------------------------------------------
    // parsing

    /// Parse an argument vector (`argv[1..]`). Returns true when no errors
    /// were recorded.
    pub fn parse<I>(&mut self, args: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let argv: Vec<String> = args.into_iter().map(Into::into).collect();
        machine::run(self, &argv, None)
    }

    /// Parse with an external-defaults map ranked between CLI values and
    /// environment fallback.
    pub fn parse_with_defaults<I>(&mut self, defaults: &HashMap<String, String>, args: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let argv: Vec<String> = args.into_iter().map(Into::into).collect();
        machine::run(self, &argv, Some(defaults))
    }

    /// Declare (once), parse, and assign into a configuration struct.
    pub fn parse_into<T: CommandLine, I>(&mut self, config: &mut T, args: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        if !self.declared_structs {
            if let Err(e) = self.declare_struct::<T>() {
                self.state.errors.push(e);
                return false;
            }
        }
        let ok = self.parse(args);
        if let Err(e) = config.assign(self) {
            self.state.errors.push(e);
            return false;
        }
        ok && self.state.errors.is_empty()
    }

    // ------------------------------------------------------------------
    // results

    /// The accepted value for a global-scope flag.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_at(name, "")
    }

    /// The accepted value for a flag, resolved through the scope cascade
    /// from `path`.
    pub fn get_at(&self, name: &str, path: &str) -> Option<&str> {
        for scope in scope_cascade(path) {
            if let Some(v) = self.state.options.get(&flag_key(name, &scope)) {
                return Some(v.as_str());
            }
        }
        None
    }

    /// Typed extraction of a global-scope value.
    pub fn get_as<T: FromArgValue>(&self, name: &str) -> Result<Option<T>> {
        self.get_as_at(name, "")
    }

    /// Typed extraction through the scope cascade.
    pub fn get_as_at<T: FromArgValue>(&self, name: &str, path: &str) -> Result<Option<T>> {
        match self.get_at(name, path) {
            Some(v) => T::from_arg_value(v)
                .map(Some)
                .map_err(|e| ParseError::processing_field(name, e)),
            None => Ok(None),
        }
    }

    /// Boolean view of a standalone flag.
    pub fn get_bool(&self, name: &str) -> bool {
        self.get_bool_at(name, "")
    }

    pub fn get_bool_at(&self, name: &str, path: &str) -> bool {
        self.get_at(name, path).map(truthy).unwrap_or(false)
    }

    /// The accumulated fragments of a chained flag.
    pub fn get_list(&self, name: &str) -> Vec<String> {
        self.get_list_at(name, "")
    }

    pub fn get_list_at(&self, name: &str, path: &str) -> Vec<String> {
        for scope in scope_cascade(path) {
            if let Some(v) = self.state.lists.get(&flag_key(name, &scope)) {
                return v.clone();
            }
        }
        Vec::new()
    }

    /// Resolve a value across the scopes a derive-declared flag was
    /// registered in (global when `paths` is empty).
    pub fn get_scoped(&self, name: &str, paths: &[String]) -> Option<&str> {
        if paths.is_empty() {
            return self.get_at(name, "");
        }
        paths.iter().find_map(|p| self.get_at(name, p))
    }

    /// Chained-fragment view of [`Parser::get_scoped`].
    pub fn get_list_scoped(&self, name: &str, paths: &[String]) -> Vec<String> {
        if paths.is_empty() {
            return self.get_list_at(name, "");
        }
        for path in paths {
            let list = self.get_list_at(name, path);
            if !list.is_empty() {
                return list;
            }
        }
        Vec::new()
    }

    /// Typed extraction of a chained flag's fragments.
    pub fn get_list_as_at<T: FromArgValue>(&self, name: &str, path: &str) -> Result<Vec<T>> {
        self.get_list_at(name, path)
            .iter()
            .map(|v| T::from_arg_value(v).map_err(|e| ParseError::processing_field(name, e)))
            .collect()
    }

    /// True when any flag named `prefix` or nested under `prefix.` received
    /// a value. Used for `Option`-wrapped nested structs.
    pub fn any_set_under(&self, prefix: &str, path: &str) -> bool {
        let dotted = format!("{prefix}.");
        let cascade = scope_cascade(path);
        self.state
            .options
            .keys()
            .chain(self.state.lists.keys())
            .any(|key| {
                let (name, scope) = split_key(key);
                (name == prefix || name.starts_with(&dotted))
                    && cascade.iter().any(|s| s == scope)
            })
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.state.errors
    }

    /// Errors rendered in the current language, in occurrence order.
    pub fn localized_errors(&self) -> Vec<String> {
        self.state.errors.iter().map(|e| e.localized(&self.bundle, &self.language)).collect()
    }

    pub fn warnings(&self) -> &[String] {
        &self.state.warnings
    }

    /// The positional list after slot assignment: bound entries carry their
    /// declared position and flag name.
    pub fn positional_args(&self) -> &[PositionalArg] {
        &self.state.positionals
    }

    /// Terminal-command paths still awaiting execution, in FIFO order.
    pub fn scheduled_commands(&self) -> Vec<String> {
        self.state.scheduled.clone()
    }

    // ------------------------------------------------------------------
    // execution

    /// Execute the next scheduled command. Returns its execution error, if
    /// any; `None` when the queue was empty or the command succeeded.
    pub fn execute_command(&mut self) -> Option<&ParseError> {
        if self.state.scheduled.is_empty() {
            return None;
        }
        let path = self.state.scheduled.remove(0);
        execute::run_invocation(self, &path);
        self.state.exec_errors.get(&path)
    }

    /// Execute every scheduled command in FIFO order. Returns the number of
    /// failures.
    pub fn execute_commands(&mut self) -> usize {
        execute::run_all(self)
    }

    pub fn command_execution_error(&self, path: &str) -> Option<&ParseError> {
        self.state.exec_errors.get(path)
    }

    pub fn command_execution_errors(&self) -> Vec<(&str, &ParseError)> {
        self.state.exec_errors.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }

    // ------------------------------------------------------------------
    // hooks

    pub fn add_global_pre_hook(
        &mut self,
        hook: impl Fn(&Parser, &Command) -> anyhow::Result<()> + 'static,
    ) -> &mut Self {
        self.hooks.add_global_pre(hook);
        self
    }

    pub fn add_global_post_hook(
        &mut self,
        hook: impl Fn(&Parser, &Command, Option<&anyhow::Error>) -> anyhow::Result<()> + 'static,
    ) -> &mut Self {
        self.hooks.add_global_post(hook);
        self
    }

    pub fn add_command_pre_hook(
        &mut self,
        path: &str,
        hook: impl Fn(&Parser, &Command) -> anyhow::Result<()> + 'static,
    ) -> &mut Self {
        self.hooks.add_command_pre(path, hook);
        self
    }

    pub fn add_command_post_hook(
        &mut self,
        path: &str,
        hook: impl Fn(&Parser, &Command, Option<&anyhow::Error>) -> anyhow::Result<()> + 'static,
    ) -> &mut Self {
        self.hooks.add_command_post(path, hook);
        self
    }

    // ------------------------------------------------------------------
    // help, completion, suggestions

    /// Render help in the configured style and language.
    pub fn help(&self) -> String {
        help::render(self)
    }

    /// Render help and write it to the configured output.
    pub fn print_help(&mut self) -> std::io::Result<()> {
        let text = help::render(self);
        self.output.write_all(text.as_bytes())?;
        self.output.flush()
    }

    /// Emit a completion script for `shell`.
    pub fn completion_script(&self, shell: Shell, app_name: &str) -> String {
        crate::completion::generate(self, shell, app_name)
    }

    // ------------------------------------------------------------------
    // internals shared by the parser submodules

    pub(crate) fn classifier(&self) -> TokenClassifier {
        TokenClassifier::new(self.settings.prefixes.clone())
    }

    pub(crate) fn push_error(&mut self, error: ParseError) {
        tracing::debug!(key = error.key(), "parse error: {error}");
        self.state.errors.push(error);
    }

    pub(crate) fn push_warning_message(&mut self, key: &'static str, args: Vec<String>) {
        let text = self
            .bundle
            .format_message(key, &self.language, &args)
            .unwrap_or_else(|| format!("{key}: {}", args.join(", ")));
        tracing::debug!(key, "parse warning: {text}");
        self.state.warnings.push(text);
    }

    /// Rebuild the translated-name registry from declarations carrying name
    /// keys, across every language the layered bundle knows.
    pub(crate) fn rebuild_translations(&mut self) {
        self.translations.clear();
        let languages = self.bundle.languages();
        let mut flag_entries: Vec<(String, String, String)> = Vec::new();
        for (key, arg) in self.registry.flags() {
            if let Some(name_key) = arg.name_key_ref() {
                let (name, _) = split_key(key);
                for lang in &languages {
                    if let Some(translated) = self.bundle.message(name_key, lang) {
                        flag_entries.push((
                            name.to_string(),
                            lang.as_str().to_string(),
                            translated.to_string(),
                        ));
                    }
                }
            }
        }
        let mut command_entries: Vec<(String, String, String)> = Vec::new();
        fn visit(
            node: &Command,
            bundle: &LayeredBundle,
            languages: &[Lang],
            out: &mut Vec<(String, String, String)>,
        ) {
            if let Some(name_key) = node.name_key_ref() {
                for lang in languages {
                    if let Some(translated) = bundle.message(name_key, lang) {
                        out.push((
                            node.path().to_string(),
                            lang.as_str().to_string(),
                            translated.to_string(),
                        ));
                    }
                }
            }
            for sub in node.children() {
                visit(sub, bundle, languages, out);
            }
        }
        for root in self.registry.roots() {
            visit(root, &self.bundle, &languages, &mut command_entries);
        }
        for (name, lang, translated) in flag_entries {
            self.translations.add(NameKind::Flag, name, &Lang::new(&lang), translated);
        }
        for (path, lang, translated) in command_entries {
            self.translations.add(NameKind::Command, path, &Lang::new(&lang), translated);
        }
    }

    /// The display name for a flag: its translation in the current
    /// language when one exists.
    pub(crate) fn display_flag_name(&self, name: &str) -> String {
        self.translations
            .translation_of(NameKind::Flag, name, &self.language)
            .unwrap_or(name)
            .to_string()
    }
}

fn cmd_depth(cmd: &Command) -> usize {
    cmd.children().iter().map(|c| 1 + cmd_depth(c)).max().unwrap_or(0)
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("settings", &self.settings)
            .field("language", &self.language)
            .field("errors", &self.state.errors.len())
            .field("scheduled", &self.state.scheduled)
            .finish_non_exhaustive()
    }
}
