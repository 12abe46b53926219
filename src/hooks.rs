//! Execution hooks
//!
//! Global and per-command hook vectors run around every terminal command
//! invocation. Pre-hooks run in the configured direction; post-hooks run in
//! the reverse direction and always run, even when a pre-hook or the
//! callback failed.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::command::Command;
use crate::parser::Parser;

/// Runs before a command callback. An error skips the callback (post-hooks
/// still run).
pub type PreHook = Rc<dyn Fn(&Parser, &Command) -> anyhow::Result<()>>;

/// Runs after a command callback, receiving the failure (if any) from the
/// pre-hooks or the callback.
pub type PostHook = Rc<dyn Fn(&Parser, &Command, Option<&anyhow::Error>) -> anyhow::Result<()>>;

/// Relative order of global and per-command pre-hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookOrder {
    /// Global pre-hooks first; per-command post-hooks first
    #[default]
    GlobalFirst,
    /// Per-command pre-hooks first; global post-hooks first
    CommandFirst,
}

#[derive(Clone, Default)]
pub struct Hooks {
    global_pre: Vec<PreHook>,
    global_post: Vec<PostHook>,
    command_pre: IndexMap<String, Vec<PreHook>>,
    command_post: IndexMap<String, Vec<PostHook>>,
    pub order: HookOrder,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_global_pre(&mut self, hook: impl Fn(&Parser, &Command) -> anyhow::Result<()> + 'static) {
        self.global_pre.push(Rc::new(hook));
    }

    pub fn add_global_post(
        &mut self,
        hook: impl Fn(&Parser, &Command, Option<&anyhow::Error>) -> anyhow::Result<()> + 'static,
    ) {
        self.global_post.push(Rc::new(hook));
    }

    pub fn add_command_pre(
        &mut self,
        path: impl Into<String>,
        hook: impl Fn(&Parser, &Command) -> anyhow::Result<()> + 'static,
    ) {
        self.command_pre.entry(path.into()).or_default().push(Rc::new(hook));
    }

    pub fn add_command_post(
        &mut self,
        path: impl Into<String>,
        hook: impl Fn(&Parser, &Command, Option<&anyhow::Error>) -> anyhow::Result<()> + 'static,
    ) {
        self.command_post.entry(path.into()).or_default().push(Rc::new(hook));
    }

    /// Pre-hooks for `path` in execution order.
    pub fn pre_sequence(&self, path: &str) -> Vec<PreHook> {
        let command = self.command_pre.get(path).cloned().unwrap_or_default();
        match self.order {
            HookOrder::GlobalFirst => {
                self.global_pre.iter().cloned().chain(command).collect()
            }
            HookOrder::CommandFirst => {
                command.into_iter().chain(self.global_pre.iter().cloned()).collect()
            }
        }
    }

    /// Post-hooks for `path`, in the reverse of the chosen pre-order.
    pub fn post_sequence(&self, path: &str) -> Vec<PostHook> {
        let command = self.command_post.get(path).cloned().unwrap_or_default();
        match self.order {
            HookOrder::GlobalFirst => {
                command.into_iter().chain(self.global_post.iter().cloned()).collect()
            }
            HookOrder::CommandFirst => {
                self.global_post.iter().cloned().chain(command).collect()
            }
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("order", &self.order)
            .field("global_pre", &self.global_pre.len())
            .field("global_post", &self.global_post.len())
            .field("command_pre", &self.command_pre.keys().collect::<Vec<_>>())
            .field("command_post", &self.command_post.keys().collect::<Vec<_>>())
            .finish()
    }
}
