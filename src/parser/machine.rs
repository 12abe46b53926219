//! The token-walk state machine
//!
//! Walks the argument vector, maintaining the current command path. Flag
//! tokens go through value acquisition; bare tokens resolve as child
//! commands, root-command restarts, positionals, or unknown-command errors.
//! Terminal command occurrences are scheduled (or executed, in exec-on-parse
//! mode) in the order their terminal transition fires.

use std::collections::HashMap;

use crate::arg::{ArgType, Argument};
use crate::binding::parse_bool;
use crate::env;
use crate::error::ParseError;
use crate::i18n::{Lang, NameKind};
use crate::registry::split_key;
use crate::suggest::{self, Candidate};
use crate::tokens::{graphemes, FlagToken, TokenClassifier};

use super::acquire::{self, ValueSource};
use super::{execute, postpass, Parser, PositionalArg};

/// Top-level parse driver: language pre-pass, help/version interception,
/// the walk, and the post-pass.
pub(crate) fn run(
    parser: &mut Parser,
    argv: &[String],
    external: Option<&HashMap<String, String>>,
) -> bool {
    parser.state = super::ParseState::default();
    parser.state.warnings = parser.decl_warnings.clone();
    let args = language_prepass(parser, argv);
    parser.rebuild_translations();

    if parser.settings.auto_help && wants_flag(parser, &args, &parser.settings.help_flags.clone()) {
        let text = crate::help::render(parser);
        let _ = parser.output.write_all(text.as_bytes());
        let _ = parser.output.flush();
        finish(parser);
        return true;
    }
    if let Some(version) = parser.settings.version.clone() {
        if wants_flag(parser, &args, &parser.settings.version_flags.clone()) {
            let _ = parser.output.write_all(format!("{version}\n").as_bytes());
            let _ = parser.output.flush();
            finish(parser);
            return true;
        }
    }

    walk(parser, &args);
    if !parser.state.halted {
        postpass::run(parser, external);
    }
    parser.state.errors.is_empty()
}

// After auto-rendered help or version output. The default end-function
// terminates the process; tests install their own.
fn finish(parser: &Parser) {
    match parser.settings.end_fn.clone() {
        Some(end) => end.as_ref()(),
        None => std::process::exit(0),
    }
}

/// Extract a language selection from the line (the language flag is removed
/// from the stream), falling back to the environment.
fn language_prepass(parser: &mut Parser, argv: &[String]) -> Vec<String> {
    let classifier = parser.classifier();
    let lang_flag = parser.settings.language_flag.clone();
    let mut out = Vec::new();
    let mut selected: Option<Lang> = None;
    let mut i = 0;
    while i < argv.len() {
        if let Some(payload) = classifier.flag_payload(&argv[i]) {
            if payload.name == lang_flag {
                if let Some(value) = payload.value {
                    selected = Some(Lang::new(value));
                } else if i + 1 < argv.len() && !classifier.is_flag_like(&argv[i + 1]) {
                    selected = Some(Lang::new(&argv[i + 1]));
                    i += 1;
                }
                i += 1;
                continue;
            }
        }
        out.push(argv[i].clone());
        i += 1;
    }
    if let Some(lang) = selected {
        tracing::debug!(lang = %lang, "language selected on the line");
        parser.language = lang;
    } else if let Some(lang) = env::detect_language(
        parser.env.as_ref(),
        &parser.settings.language_env_var,
        parser.settings.check_system_locale,
    ) {
        tracing::debug!(lang = %lang, "language from environment");
        parser.language = lang;
    }
    out
}

/// True when any token is one of the named flags (tolerated anywhere on the
/// line, even after unknown tokens).
fn wants_flag(parser: &Parser, args: &[String], names: &[String]) -> bool {
    let classifier = parser.classifier();
    args.iter()
        .filter_map(|t| classifier.flag_payload(t))
        .any(|p| names.iter().any(|n| n == &p.name))
}

fn walk(parser: &mut Parser, args: &[String]) {
    let classifier = parser.classifier();
    let mut path = String::new();
    let mut i = 0;
    while i < args.len() {
        let token = args[i].clone();
        if let Some(payload) = classifier.flag_payload(&token) {
            i += handle_flag(parser, &classifier, payload, &path, args, i);
            if parser.state.halted {
                return;
            }
            continue;
        }
        handle_bare(parser, &mut path, &token);
        if parser.state.halted {
            return;
        }
        i += 1;
    }
    if !path.is_empty() {
        schedule_terminal(parser, &path);
    }
}

enum ChildResolution {
    Child(String),
    Ambiguous(Vec<String>),
    None,
}

fn handle_bare(parser: &mut Parser, path: &mut String, token: &str) {
    match resolve_child(parser, path, token) {
        ChildResolution::Child(name) => {
            *path = if path.is_empty() { name } else { format!("{path} {name}") };
            tracing::debug!(path = %path, "entered command");
        }
        ChildResolution::Ambiguous(candidates) => {
            parser.push_error(ParseError::AmbiguousCommand {
                name: token.to_string(),
                candidates: candidates.join(", "),
            });
        }
        ChildResolution::None => {
            // a root command restarts the line; the previous command's
            // occurrence just became terminal
            if !path.is_empty() {
                if let ChildResolution::Child(root) = resolve_child(parser, "", token) {
                    let previous = path.clone();
                    schedule_terminal(parser, &previous);
                    if parser.state.halted {
                        return;
                    }
                    *path = root;
                    return;
                }
            }
            if unfilled_positional_slots(parser) {
                push_positional(parser, token.to_string());
            } else if scope_has_children(parser, path) {
                let suggestions = command_suggestions(parser, path, token);
                let full = if path.is_empty() {
                    token.to_string()
                } else {
                    format!("{path} {token}")
                };
                parser.push_error(ParseError::UnknownCommand {
                    name: token.to_string(),
                    path: full,
                    suggestions,
                });
            } else {
                push_positional(parser, token.to_string());
            }
        }
    }
}

fn push_positional(parser: &mut Parser, value: String) {
    let position = parser.state.positionals.len();
    parser.state.positionals.push(PositionalArg { value, position, flag: None });
}

/// More declared positional slots than tokens collected so far?
fn unfilled_positional_slots(parser: &Parser) -> bool {
    let declared = parser.registry.flags().filter(|(_, a)| a.position_index().is_some()).count();
    parser.state.positionals.len() < declared
}

fn scope_has_children(parser: &Parser, path: &str) -> bool {
    if path.is_empty() {
        parser.registry.has_commands()
    } else {
        parser.registry.command(path).map(|c| !c.children().is_empty()).unwrap_or(false)
    }
}

/// Resolve `token` among the children of `path` (roots when empty), by
/// canonical name or the current language's translation.
fn resolve_child(parser: &Parser, path: &str, token: &str) -> ChildResolution {
    let children: Vec<(String, String)> = if path.is_empty() {
        parser
            .registry
            .roots()
            .map(|c| (c.name_ref().to_string(), c.path().to_string()))
            .collect()
    } else {
        match parser.registry.command(path) {
            Some(node) => node
                .children()
                .iter()
                .map(|c| (c.name_ref().to_string(), c.path().to_string()))
                .collect(),
            None => Vec::new(),
        }
    };
    let mut matches: Vec<String> = Vec::new();
    for (name, child_path) in &children {
        let translated =
            parser.translations.translation_of(NameKind::Command, child_path, &parser.language);
        if token == name || translated == Some(token) {
            if !matches.contains(name) {
                matches.push(name.clone());
            }
        }
    }
    match matches.len() {
        0 => ChildResolution::None,
        1 => ChildResolution::Child(matches.remove(0)),
        _ => ChildResolution::Ambiguous(matches),
    }
}

/// A command occurrence with no further subcommand after it: queue it, or
/// run it now in exec-on-parse mode.
fn schedule_terminal(parser: &mut Parser, path: &str) {
    parser.state.visited.push(path.to_string());
    let exec_now = parser.settings.exec_on_parse
        || parser.registry.command(path).map(|c| c.is_exec_on_parse()).unwrap_or(false);
    tracing::debug!(path, exec_now, "terminal command");
    if exec_now {
        if let Some(failure) = execute::run_invocation(parser, path) {
            parser.push_error(ParseError::processing_command(path, failure));
            parser.state.halted = true;
        }
    } else {
        parser.state.scheduled.push(path.to_string());
    }
}

/// Resolve a flag payload name: canonical lookup, translated lookup, then
/// the short-form index, each through the scope cascade.
fn resolve_flag(parser: &Parser, name: &str, path: &str) -> Option<(String, Argument)> {
    if let Some((key, arg)) = parser.registry.flag(name, path) {
        return Some((key.to_string(), arg.clone()));
    }
    if let Some(canonical) =
        parser.translations.canonical_of(NameKind::Flag, &parser.language, name)
    {
        let canonical = canonical.to_string();
        if let Some((key, arg)) = parser.registry.flag(&canonical, path) {
            return Some((key.to_string(), arg.clone()));
        }
    }
    if let Some((key, arg)) = parser.registry.flag_by_short(name, path) {
        return Some((key.to_string(), arg.clone()));
    }
    None
}

/// Returns the number of tokens consumed (at least 1).
fn handle_flag(
    parser: &mut Parser,
    classifier: &TokenClassifier,
    payload: FlagToken,
    path: &str,
    args: &[String],
    i: usize,
) -> usize {
    if let Some((key, arg)) = resolve_flag(parser, &payload.name, path) {
        return consume_flag(parser, classifier, &key, &arg, payload, args, i);
    }
    if parser.settings.posix && payload.value.is_none() && graphemes(&payload.name).len() > 1 {
        if let Some(consumed) = try_compact(parser, classifier, &payload.name, path, args, i) {
            return consumed;
        }
    }
    unknown_flag_error(parser, &payload.name, path);
    1
}

fn consume_flag(
    parser: &mut Parser,
    classifier: &TokenClassifier,
    key: &str,
    arg: &Argument,
    payload: FlagToken,
    args: &[String],
    i: usize,
) -> usize {
    let name = split_key(key).0.to_string();

    // secure flags never take their value from argv
    if let Some(secure) = arg.secure_ref() {
        let prompt = secure.prompt.clone().unwrap_or_else(|| format!("{name}: "));
        match parser.terminal.read_secret(&prompt) {
            Ok(value) => {
                acquire::process_and_store(parser, key, arg, &value, ValueSource::Cli);
            }
            Err(e) => {
                parser.push_error(ParseError::processing_field(
                    name.clone(),
                    ParseError::MissingValue { flag: e.to_string() },
                ));
            }
        }
        if payload.value.is_some() {
            parser
                .state
                .warnings
                .push(format!("flag '{name}' is secure; the inline value was ignored"));
        }
        return 1;
    }

    match arg.effective_type() {
        ArgType::Standalone => match payload.value {
            Some(value) => {
                match parse_bool(&value) {
                    Some(b) => acquire::store_bool(parser, key, b),
                    // an invalid explicit boolean demotes the value to the
                    // positional queue; the flag stays unset
                    None => push_positional(parser, value),
                }
                1
            }
            None => {
                if i + 1 < args.len() && !classifier.is_flag_like(&args[i + 1]) {
                    if let Some(b) = parse_bool(&args[i + 1]) {
                        acquire::store_bool(parser, key, b);
                        return 2;
                    }
                }
                acquire::store_bool(parser, key, true);
                1
            }
        },
        _ => {
            if let Some(value) = payload.value {
                acquire::process_and_store(parser, key, arg, &value, ValueSource::Cli);
                1
            } else if i + 1 < args.len() && !classifier.is_flag_like(&args[i + 1]) {
                let value = args[i + 1].clone();
                acquire::process_and_store(parser, key, arg, &value, ValueSource::Cli);
                2
            } else if let Some(default) = arg.default() {
                let default = default.to_string();
                acquire::process_and_store(parser, key, arg, &default, ValueSource::Declared);
                1
            } else {
                let display = parser.display_flag_name(&name);
                parser.push_error(ParseError::MissingValue { flag: display });
                1
            }
        }
    }
}

/// POSIX compact group: every grapheme before the last must be a standalone
/// flag; the tail is the last flag's inline value or further flags.
fn try_compact(
    parser: &mut Parser,
    classifier: &TokenClassifier,
    group: &str,
    path: &str,
    args: &[String],
    i: usize,
) -> Option<usize> {
    let clusters: Vec<String> = graphemes(group).into_iter().map(str::to_string).collect();
    // not a compact group at all unless the first grapheme is a known short
    parser.registry.flag_by_short(&clusters[0], path)?;

    let mut consumed = 1;
    let mut j = 0;
    while j < clusters.len() {
        let cluster = &clusters[j];
        let hit = parser
            .registry
            .flag_by_short(cluster, path)
            .map(|(key, arg)| (key.to_string(), arg.clone()));
        match hit {
            Some((key, arg)) => {
                if arg.effective_type() == ArgType::Standalone {
                    acquire::store_bool(parser, &key, true);
                    j += 1;
                } else {
                    let tail: String = clusters[j + 1..].concat();
                    if !tail.is_empty() {
                        acquire::process_and_store(parser, &key, &arg, &tail, ValueSource::Cli);
                    } else if i + 1 < args.len() && !classifier.is_flag_like(&args[i + 1]) {
                        let value = args[i + 1].clone();
                        acquire::process_and_store(parser, &key, &arg, &value, ValueSource::Cli);
                        consumed = 2;
                    } else if let Some(default) = arg.default() {
                        let default = default.to_string();
                        acquire::process_and_store(
                            parser,
                            &key,
                            &arg,
                            &default,
                            ValueSource::Declared,
                        );
                    } else {
                        let name = split_key(&key).0.to_string();
                        parser.push_error(ParseError::MissingValue { flag: name });
                    }
                    break;
                }
            }
            None => {
                parser.push_error(ParseError::UnknownFlag { name: cluster.clone() });
                break;
            }
        }
    }
    Some(consumed)
}

fn unknown_flag_error(parser: &mut Parser, name: &str, path: &str) {
    let candidates = flag_candidates(parser, path);
    let hits =
        suggest::suggestions(name, &candidates, parser.settings.flag_suggestion_threshold);
    if hits.is_empty() {
        parser.push_error(ParseError::UnknownFlag { name: name.to_string() });
    } else {
        let suggestions = render_suggestions(parser, &hits, NameKind::Flag);
        parser.push_error(ParseError::UnknownFlagWithSuggestions {
            name: name.to_string(),
            suggestions,
        });
    }
}

/// Union of canonical flag names visible from `path` and their active
/// translations.
fn flag_candidates(parser: &Parser, path: &str) -> Vec<Candidate> {
    let visible: Vec<String> =
        parser.registry.visible_flags(path).into_iter().map(|(n, _)| n.to_string()).collect();
    let mut out: Vec<Candidate> =
        visible.iter().map(|n| Candidate::canonical_name(n.clone())).collect();
    for (translated, canonical) in
        parser.translations.translated_names(NameKind::Flag, &parser.language)
    {
        if visible.contains(&canonical) {
            out.push(Candidate::translated(translated, canonical));
        }
    }
    out
}

/// Suggestions for an unknown command token among the children of `path`,
/// rendered for display (empty string when nothing is close enough).
pub(crate) fn command_suggestions(parser: &Parser, path: &str, token: &str) -> String {
    let children: Vec<(String, String)> = if path.is_empty() {
        parser
            .registry
            .roots()
            .map(|c| (c.name_ref().to_string(), c.path().to_string()))
            .collect()
    } else {
        match parser.registry.command(path) {
            Some(node) => node
                .children()
                .iter()
                .map(|c| (c.name_ref().to_string(), c.path().to_string()))
                .collect(),
            None => Vec::new(),
        }
    };
    let mut candidates: Vec<Candidate> = Vec::new();
    for (name, child_path) in &children {
        candidates.push(Candidate {
            display: name.clone(),
            canonical: child_path.clone(),
        });
        if let Some(translated) =
            parser.translations.translation_of(NameKind::Command, child_path, &parser.language)
        {
            candidates.push(Candidate::translated(translated, child_path.clone()));
        }
    }
    let hits =
        suggest::suggestions(token, &candidates, parser.settings.command_suggestion_threshold);
    if hits.is_empty() {
        String::new()
    } else {
        render_suggestions(parser, &hits, NameKind::Command)
    }
}

/// Render a suggestion list through the configured formatter, or the
/// localized default sentence.
pub(crate) fn render_suggestions(parser: &Parser, names: &[String], kind: NameKind) -> String {
    if let Some(formatter) = &parser.settings.suggestion_formatter {
        return formatter.as_ref()(names, kind);
    }
    let decorated: Vec<String> = names
        .iter()
        .map(|n| match kind {
            NameKind::Flag => match n.split_once(" / ") {
                Some((canonical, translated)) => format!("'--{canonical} / --{translated}'"),
                None => format!("'--{n}'"),
            },
            NameKind::Command => format!("'{n}'"),
        })
        .collect();
    let or_word = parser
        .bundle
        .message(crate::i18n::msg_keys::OR, &parser.language)
        .unwrap_or("or")
        .to_string();
    let joined = match decorated.len() {
        1 => decorated[0].clone(),
        _ => {
            let head = decorated[..decorated.len() - 1].join(", ");
            format!("{head} {or_word} {}", decorated[decorated.len() - 1])
        }
    };
    parser
        .bundle
        .format_message(crate::i18n::msg_keys::DID_YOU_MEAN, &parser.language, &[joined.clone()])
        .unwrap_or_else(|| format!("Did you mean {joined}?"))
}
