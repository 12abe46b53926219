//! The command data model
//!
//! Commands form a tree; each node carries an optional callback, optional
//! translation keys, and ordered subcommands. A node's path is the
//! space-joined chain of ancestor names and is computed when the tree is
//! registered.

use std::fmt;
use std::rc::Rc;

use crate::parser::Parser;

/// Callback invoked for a terminal command occurrence.
pub type CommandCallback = Rc<dyn Fn(&Parser, &Command) -> anyhow::Result<()>>;

/// One node in the command tree.
#[derive(Clone, Default)]
pub struct Command {
    name: String,
    description: String,
    name_key: Option<String>,
    desc_key: Option<String>,
    callback: Option<CommandCallback>,
    subcommands: Vec<Command>,
    exec_on_parse: bool,
    path: String,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self { path: name.clone(), name, ..Self::default() }
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

    /// Attach the callback run when this command is a terminal occurrence.
    pub fn callback(mut self, f: impl Fn(&Parser, &Command) -> anyhow::Result<()> + 'static) -> Self {
        self.callback = Some(Rc::new(f));
        self
    }

    pub fn subcommand(mut self, sub: Command) -> Self {
        self.subcommands.push(sub);
        self
    }

    pub fn subcommands(mut self, subs: Vec<Command>) -> Self {
        self.subcommands.extend(subs);
        self
    }

    /// Run this command's callback as soon as its terminal transition fires
    /// during parsing.
    pub fn exec_on_parse(mut self, enabled: bool) -> Self {
        self.exec_on_parse = enabled;
        self
    }

    pub fn name_ref(&self) -> &str {
        &self.name
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

    pub fn callback_ref(&self) -> Option<&CommandCallback> {
        self.callback.as_ref()
    }

    pub(crate) fn set_callback(
        &mut self,
        f: impl Fn(&Parser, &Command) -> anyhow::Result<()> + 'static,
    ) {
        self.callback = Some(Rc::new(f));
    }

    pub fn children(&self) -> &[Command] {
        &self.subcommands
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Command> {
        &mut self.subcommands
    }

    pub fn is_exec_on_parse(&self) -> bool {
        self.exec_on_parse
    }

    /// Space-joined path from the root to this node.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn child(&self, name: &str) -> Option<&Command> {
        self.subcommands.iter().find(|c| c.name == name)
    }

    pub(crate) fn child_mut(&mut self, name: &str) -> Option<&mut Command> {
        self.subcommands.iter_mut().find(|c| c.name == name)
    }

    /// Recompute `path` for this node and all descendants.
    pub(crate) fn set_paths(&mut self, parent: &str) {
        self.path = if parent.is_empty() {
            self.name.clone()
        } else {
            format!("{parent} {}", self.name)
        };
        let path = self.path.clone();
        for sub in &mut self.subcommands {
            sub.set_paths(&path);
        }
    }

    /// Merge `other` into this node: fields already set here win; empty
    /// slots take the incoming values. Subcommands merge by name, new ones
    /// append in order.
    pub(crate) fn merge_from(&mut self, other: Command) {
        if self.description.is_empty() && !other.description.is_empty() {
            self.description = other.description;
        }
        if self.name_key.is_none() {
            self.name_key = other.name_key;
        }
        if self.desc_key.is_none() {
            self.desc_key = other.desc_key;
        }
        if self.callback.is_none() {
            self.callback = other.callback;
        }
        self.exec_on_parse |= other.exec_on_parse;
        for sub in other.subcommands {
            let sub_name = sub.name_ref().to_string();
            match self.child_mut(&sub_name) {
                Some(existing) => existing.merge_from(sub),
                None => self.subcommands.push(sub),
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("has_callback", &self.callback.is_some())
            .field("exec_on_parse", &self.exec_on_parse)
            .field("subcommands", &self.subcommands)
            .finish()
    }
}
