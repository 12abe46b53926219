//! Help rendering
//!
//! Three styles share the same building blocks: a flag line (long form,
//! short form, localized description, required/default markers) and a
//! command entry (translated display name plus the node's own localized
//! description). Declaration order is preserved throughout.

use std::fmt::Write;

use crate::arg::Argument;
use crate::command::Command;
use crate::i18n::{msg_keys, NameKind};
use crate::parser::Parser;
use crate::registry::split_key;

/// How help output is organized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HelpStyle {
    /// One flat list of flags
    #[default]
    Flat,
    /// Global flags first, then one block per command scope
    Grouped,
    /// The command tree, each node with its own flag block
    Hierarchical,
}

pub(crate) fn render(parser: &Parser) -> String {
    match parser.settings().help_style {
        HelpStyle::Flat => render_flat(parser),
        HelpStyle::Grouped => render_grouped(parser),
        HelpStyle::Hierarchical => render_hierarchical(parser),
    }
}

fn header(parser: &Parser, key: &str) -> String {
    parser.bundle().message(key, parser.language()).unwrap_or(key).to_string()
}

/// The description shown for a flag: the translated string when the
/// declaration carries a resolvable description key, the literal text
/// otherwise.
fn flag_description(parser: &Parser, arg: &Argument) -> String {
    if let Some(key) = arg.desc_key_ref() {
        if let Some(translated) = parser.bundle().message(key, parser.language()) {
            return translated.to_string();
        }
    }
    arg.description_text().to_string()
}

/// A command always shows its OWN description, never a child's.
fn command_description(parser: &Parser, cmd: &Command) -> String {
    if let Some(key) = cmd.desc_key_ref() {
        if let Some(translated) = parser.bundle().message(key, parser.language()) {
            return translated.to_string();
        }
    }
    cmd.description_text().to_string()
}

fn command_display_name(parser: &Parser, cmd: &Command) -> String {
    parser
        .translations_ref()
        .translation_of(NameKind::Command, cmd.path(), parser.language())
        .unwrap_or(cmd.name_ref())
        .to_string()
}

fn flag_line(parser: &Parser, name: &str, arg: &Argument, scope: &str) -> String {
    let display = parser.display_flag_name(name);
    let mut left = format!("--{display}");
    if let Some(short) = arg.short_form() {
        left.push_str(&format!(", -{short}"));
    }
    if !scope.is_empty() {
        left.push_str(&format!(" @{scope}"));
    }
    let mut right = flag_description(parser, arg);
    if arg.is_required() {
        let marker = header(parser, msg_keys::HELP_REQUIRED);
        right.push_str(&format!(" ({marker})"));
    }
    if let Some(default) = arg.default() {
        let marker = header(parser, msg_keys::HELP_DEFAULT);
        right.push_str(&format!(" ({marker}: {default})"));
    }
    format!("  {left:<30} {}", right.trim())
}

fn render_flat(parser: &Parser) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}:", header(parser, msg_keys::HELP_USAGE));

    let positionals: Vec<(&str, &Argument)> = {
        let mut list: Vec<(&str, &Argument, usize)> = parser
            .registry_view()
            .flags()
            .filter_map(|(k, a)| a.position_index().map(|p| (split_key(k).0, a, p)))
            .collect();
        list.sort_by_key(|(_, _, p)| *p);
        list.into_iter().map(|(n, a, _)| (n, a)).collect()
    };
    if !positionals.is_empty() {
        let _ = writeln!(out, "\n{}:", header(parser, msg_keys::HELP_POSITIONAL));
        for (name, arg) in positionals {
            let _ = writeln!(out, "{}", flag_line(parser, name, arg, ""));
        }
    }

    let _ = writeln!(out, "\n{}:", header(parser, msg_keys::HELP_FLAGS));
    for (key, arg) in parser.registry_view().flags() {
        if arg.position_index().is_some() {
            continue;
        }
        let (name, scope) = split_key(key);
        let _ = writeln!(out, "{}", flag_line(parser, name, arg, scope));
    }

    if parser.registry_view().has_commands() {
        let _ = writeln!(out, "\n{}:", header(parser, msg_keys::HELP_COMMANDS));
        for root in parser.registry_view().roots() {
            write_command_flat(parser, root, &mut out);
        }
    }
    out
}

fn write_command_flat(parser: &Parser, cmd: &Command, out: &mut String) {
    let _ = writeln!(
        out,
        "  {:<30} {}",
        command_display_name(parser, cmd),
        command_description(parser, cmd)
    );
    for sub in cmd.children() {
        let _ = writeln!(
            out,
            "  {:<30} {}",
            format!("{} {}", cmd.path(), command_display_name(parser, sub)),
            command_description(parser, sub)
        );
        for deeper in sub.children() {
            write_command_flat_nested(parser, deeper, sub.path(), out);
        }
    }
}

fn write_command_flat_nested(parser: &Parser, cmd: &Command, parent: &str, out: &mut String) {
    let _ = writeln!(
        out,
        "  {:<30} {}",
        format!("{parent} {}", command_display_name(parser, cmd)),
        command_description(parser, cmd)
    );
    for sub in cmd.children() {
        write_command_flat_nested(parser, sub, cmd.path(), out);
    }
}

fn render_grouped(parser: &Parser) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}:", header(parser, msg_keys::HELP_GLOBAL_FLAGS));
    for (key, arg) in parser.registry_view().flags() {
        let (name, scope) = split_key(key);
        if scope.is_empty() {
            let _ = writeln!(out, "{}", flag_line(parser, name, arg, ""));
        }
    }
    for root in parser.registry_view().roots() {
        write_group(parser, root, &mut out);
    }
    out
}

fn write_group(parser: &Parser, cmd: &Command, out: &mut String) {
    let _ = writeln!(
        out,
        "\n{}: {}",
        cmd.path(),
        command_description(parser, cmd)
    );
    for (key, arg) in parser.registry_view().flags() {
        let (name, scope) = split_key(key);
        if scope == cmd.path() {
            let _ = writeln!(out, "{}", flag_line(parser, name, arg, ""));
        }
    }
    for sub in cmd.children() {
        write_group(parser, sub, out);
    }
}

fn render_hierarchical(parser: &Parser) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}:", header(parser, msg_keys::HELP_GLOBAL_FLAGS));
    for (key, arg) in parser.registry_view().flags() {
        let (name, scope) = split_key(key);
        if scope.is_empty() {
            let _ = writeln!(out, "{}", flag_line(parser, name, arg, ""));
        }
    }
    if parser.registry_view().has_commands() {
        let _ = writeln!(out, "\n{}:", header(parser, msg_keys::HELP_COMMANDS));
        for root in parser.registry_view().roots() {
            write_tree(parser, root, 1, &mut out);
        }
    }
    out
}

fn write_tree(parser: &Parser, cmd: &Command, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(
        out,
        "{indent}{}: {}",
        command_display_name(parser, cmd),
        command_description(parser, cmd)
    );
    for (key, arg) in parser.registry_view().flags() {
        let (name, scope) = split_key(key);
        if scope == cmd.path() {
            let _ = writeln!(out, "{indent}{}", flag_line(parser, name, arg, ""));
        }
    }
    for sub in cmd.children() {
        write_tree(parser, sub, depth + 1, out);
    }
}
