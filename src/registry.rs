//! Declaration registry
//!
//! Flags are stored flat, keyed `name` (global scope) or `name@path`
//! (command scope), with a parallel short-form index per scope and a
//! reverse map from internal flag IDs to storage keys. Commands live in an
//! insertion-ordered tree. Lookups cascade from the most specific scope to
//! the global one.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::arg::Argument;
use crate::command::Command;
use crate::error::{ParseError, Result};

/// Central store for flag and command declarations.
#[derive(Debug, Default)]
pub struct Registry {
    // "name" or "name@path" -> declaration, in declaration order
    flags: IndexMap<String, Argument>,
    // "short" or "short@path" -> the flag's storage key
    shorts: IndexMap<String, String>,
    // root command name -> tree
    roots: IndexMap<String, Command>,
    // flag id -> storage keys (one per scope the flag was declared in)
    ids: IndexMap<Uuid, Vec<String>>,
}

/// Build the storage key for a flag in a scope.
pub fn flag_key(name: &str, path: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{name}@{path}")
    }
}

/// Split a storage key back into `(name, path)`.
pub fn split_key(key: &str) -> (&str, &str) {
    match key.split_once('@') {
        Some((name, path)) => (name, path),
        None => (key, ""),
    }
}

/// The scope cascade for a path: the path itself, each ancestor, then the
/// global scope.
pub fn scope_cascade(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    if !path.is_empty() {
        let segments: Vec<&str> = path.split(' ').collect();
        for end in (1..=segments.len()).rev() {
            out.push(segments[..end].join(" "));
        }
    }
    out.push(String::new());
    out
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flag under the given scopes (empty slice = global).
    ///
    /// Command paths named in `paths` are created from their ancestors when
    /// missing, preserving anything already registered along the way.
    pub fn add_flag(&mut self, name: &str, mut arg: Argument, paths: &[String]) -> Result<()> {
        if arg.id.is_nil() {
            arg.id = Uuid::new_v4();
        }
        let scopes: Vec<String> =
            if paths.is_empty() { vec![String::new()] } else { paths.to_vec() };

        // check every scope before inserting any, so a failure leaves the
        // registry unchanged
        for scope in &scopes {
            let key = flag_key(name, scope);
            if self.flags.contains_key(&key) {
                return Err(ParseError::DuplicateFlag { name: key });
            }
            if let Some(short) = arg.short_form() {
                let short_key = flag_key(short, scope);
                if let Some(existing) = self.shorts.get(&short_key) {
                    return Err(ParseError::ShortFlagConflictContext {
                        short: short.to_string(),
                        flag: name.to_string(),
                        existing: split_key(existing).0.to_string(),
                        context: if scope.is_empty() { "global".to_string() } else { scope.clone() },
                    });
                }
            }
        }

        for scope in &scopes {
            if !scope.is_empty() && self.command(scope).is_none() {
                self.add_command(command_chain(scope))?;
            }
            let key = flag_key(name, scope);
            if let Some(short) = arg.short_form() {
                self.shorts.insert(flag_key(short, scope), key.clone());
            }
            self.ids.entry(arg.id).or_default().push(key.clone());
            self.flags.insert(key, arg.clone());
        }
        Ok(())
    }

    /// Register a command tree, merging into any existing nodes.
    ///
    /// Every node must have a non-empty name. Existing metadata (callback,
    /// keys, description) survives a partial redeclaration.
    pub fn add_command(&mut self, mut cmd: Command) -> Result<()> {
        validate_names(&cmd)?;
        cmd.set_paths("");
        let root_name = cmd.name_ref().to_string();
        match self.roots.get_mut(&root_name) {
            Some(existing) => existing.merge_from(cmd),
            None => {
                self.roots.insert(root_name, cmd);
            }
        }
        Ok(())
    }

    /// Resolve a flag by walking the scope cascade. Returns the storage key
    /// and the declaration nearest to `path`.
    pub fn flag(&self, name: &str, path: &str) -> Option<(&str, &Argument)> {
        for scope in scope_cascade(path) {
            let key = flag_key(name, &scope);
            if let Some((key, arg)) = self.flags.get_key_value(&key) {
                return Some((key.as_str(), arg));
            }
        }
        None
    }

    /// Mutable flag lookup at an exact scope (no cascade).
    pub fn flag_at_mut(&mut self, name: &str, path: &str) -> Option<&mut Argument> {
        self.flags.get_mut(&flag_key(name, path))
    }

    /// Resolve a short form through the scope cascade.
    pub fn flag_by_short(&self, short: &str, path: &str) -> Option<(&str, &Argument)> {
        for scope in scope_cascade(path) {
            if let Some(target) = self.shorts.get(&flag_key(short, &scope)) {
                if let Some((key, arg)) = self.flags.get_key_value(target) {
                    return Some((key.as_str(), arg));
                }
            }
        }
        None
    }

    /// Look up a command node by its space-joined path.
    pub fn command(&self, path: &str) -> Option<&Command> {
        let mut segments = path.split(' ');
        let mut node = self.roots.get(segments.next()?)?;
        for segment in segments {
            node = node.child(segment)?;
        }
        Some(node)
    }

    pub(crate) fn command_mut(&mut self, path: &str) -> Option<&mut Command> {
        let mut segments = path.split(' ');
        let mut node = self.roots.get_mut(segments.next()?)?;
        for segment in segments {
            node = node.child_mut(segment)?;
        }
        Some(node)
    }

    /// All flag declarations in declaration order, as `(key, argument)`.
    pub fn flags(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.flags.iter().map(|(k, a)| (k.as_str(), a))
    }

    /// Root commands in declaration order.
    pub fn roots(&self) -> impl Iterator<Item = &Command> {
        self.roots.values()
    }

    pub fn has_commands(&self) -> bool {
        !self.roots.is_empty()
    }

    /// Flag names (with their declarations) visible from `path`: its own
    /// scope, each ancestor scope, and the global scope.
    pub fn visible_flags(&self, path: &str) -> Vec<(&str, &Argument)> {
        let cascade = scope_cascade(path);
        let mut out = Vec::new();
        for (key, arg) in &self.flags {
            let (name, scope) = split_key(key);
            if cascade.iter().any(|s| s == scope) {
                out.push((name, arg));
            }
        }
        out
    }

    /// Rename a flag in every scope it was declared in, keeping its
    /// internal ID (and therefore its translations) attached.
    pub fn rename_flag(&mut self, name: &str, path: &str, new_name: &str) -> Result<()> {
        let Some((_, arg)) = self.flag(name, path) else {
            return Err(ParseError::UnknownFlag { name: name.to_string() });
        };
        let id = arg.id;
        let keys = self.ids.get(&id).cloned().unwrap_or_default();
        for old_key in keys {
            let (_, scope) = split_key(&old_key);
            let scope = scope.to_string();
            let new_key = flag_key(new_name, &scope);
            if self.flags.contains_key(&new_key) {
                return Err(ParseError::DuplicateFlag { name: new_key });
            }
            if let Some(arg) = self.flags.shift_remove(&old_key) {
                if let Some(short) = arg.short_form() {
                    self.shorts.insert(flag_key(short, &scope), new_key.clone());
                }
                self.flags.insert(new_key.clone(), arg);
            }
            if let Some(entry) = self.ids.get_mut(&id) {
                entry.retain(|k| k != &old_key);
                entry.push(new_key);
            }
        }
        Ok(())
    }
}

/// A bare command chain (`server start` -> server > start) used when a
/// scoped flag references a path that does not exist yet.
fn command_chain(path: &str) -> Command {
    let mut segments = path.split(' ').rev();
    let mut node = Command::new(segments.next().unwrap_or_default());
    for name in segments {
        node = Command::new(name).subcommand(node);
    }
    node
}

fn validate_names(cmd: &Command) -> Result<()> {
    if cmd.name_ref().trim().is_empty() {
        return Err(ParseError::CommandNotFound { path: "<unnamed>".to_string() });
    }
    for sub in cmd.children() {
        validate_names(sub)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_cascade() {
        assert_eq!(scope_cascade("server start"), vec![
            "server start".to_string(),
            "server".to_string(),
            String::new()
        ]);
        assert_eq!(scope_cascade(""), vec![String::new()]);
    }

    #[test]
    fn test_duplicate_flag_rejected() {
        let mut reg = Registry::new();
        reg.add_flag("verbose", Argument::standalone(), &[]).unwrap();
        let err = reg.add_flag("verbose", Argument::standalone(), &[]).unwrap_err();
        assert!(err.has_key(crate::error::keys::DUPLICATE_FLAG));
    }

    #[test]
    fn test_same_name_different_scopes() {
        let mut reg = Registry::new();
        reg.add_flag("port", Argument::single(), &[]).unwrap();
        reg.add_flag("port", Argument::single(), &["server start".to_string()]).unwrap();
        assert!(reg.command("server start").is_some());
        let (key, _) = reg.flag("port", "server start").unwrap();
        assert_eq!(key, "port@server start");
        let (key, _) = reg.flag("port", "client").unwrap();
        assert_eq!(key, "port");
    }

    #[test]
    fn test_cascade_prefers_nearest_scope() {
        let mut reg = Registry::new();
        reg.add_flag("output", Argument::single().default_value("global"), &[]).unwrap();
        reg.add_flag(
            "output",
            Argument::single().default_value("scoped"),
            &["server".to_string()],
        )
        .unwrap();
        let (_, arg) = reg.flag("output", "server start").unwrap();
        assert_eq!(arg.default(), Some("scoped"));
    }

    #[test]
    fn test_short_conflict_same_scope() {
        let mut reg = Registry::new();
        reg.add_flag("verbose", Argument::standalone().short("v"), &[]).unwrap();
        let err = reg.add_flag("version", Argument::standalone().short("v"), &[]).unwrap_err();
        assert!(err.has_key(crate::error::keys::SHORT_FLAG_CONFLICT_CONTEXT));
    }

    #[test]
    fn test_short_forms_scoped_per_command() {
        let mut reg = Registry::new();
        reg.add_flag("verbose", Argument::standalone().short("v"), &["server".to_string()])
            .unwrap();
        reg.add_flag("version", Argument::standalone().short("v"), &["client".to_string()])
            .unwrap();
        let (key, _) = reg.flag_by_short("v", "server").unwrap();
        assert_eq!(key, "verbose@server");
        let (key, _) = reg.flag_by_short("v", "client start").unwrap();
        assert_eq!(key, "version@client");
    }

    #[test]
    fn test_scoped_flag_creates_command_chain() {
        let mut reg = Registry::new();
        reg.add_flag("port", Argument::single(), &["server start".to_string()]).unwrap();
        assert_eq!(reg.command("server").unwrap().path(), "server");
        assert_eq!(reg.command("server start").unwrap().path(), "server start");
    }

    #[test]
    fn test_command_merge_keeps_metadata() {
        let mut reg = Registry::new();
        reg.add_command(Command::new("server").description("run things").callback(|_, _| Ok(())))
            .unwrap();
        // attaching a scoped flag rebuilds the chain; metadata must survive
        reg.add_flag("port", Argument::single(), &["server start".to_string()]).unwrap();
        let server = reg.command("server").unwrap();
        assert_eq!(server.description_text(), "run things");
        assert!(server.callback_ref().is_some());
        assert!(server.child("start").is_some());
    }

    #[test]
    fn test_unnamed_command_rejected() {
        let mut reg = Registry::new();
        let err = reg.add_command(Command::new("server").subcommand(Command::new(""))).unwrap_err();
        assert!(err.has_key(crate::error::keys::COMMAND_NOT_FOUND));
    }

    #[test]
    fn test_rename_keeps_declaration() {
        let mut reg = Registry::new();
        reg.add_flag("color", Argument::single().short("c").default_value("auto"), &[]).unwrap();
        reg.rename_flag("color", "", "colour").unwrap();
        assert!(reg.flag("color", "").is_none());
        let (_, arg) = reg.flag("colour", "").unwrap();
        assert_eq!(arg.default(), Some("auto"));
        let (key, _) = reg.flag_by_short("c", "").unwrap();
        assert_eq!(key, "colour");
    }
}
