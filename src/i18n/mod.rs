//! Internationalization: language tags, layered message catalogs, and the
//! canonical/translated name registry
//!
//! Message resolution is layered (user catalog, then system, then the
//! embedded defaults) and language-matched (exact tag, then base language,
//! then the fallback language). Flag and command names translate through
//! [`TranslationRegistry`], which the token classifier and the suggestion
//! engine both consult.

mod bundle;
mod translation;

pub use bundle::{LayeredBundle, MessageBundle};
pub use translation::TranslationRegistry;

/// Message keys that are not error keys.
pub mod msg_keys {
    pub const DID_YOU_MEAN: &str = "declargs.msg.did_you_mean";
    pub const OR: &str = "declargs.msg.or";
    pub const HELP_USAGE: &str = "declargs.help.usage";
    pub const HELP_COMMANDS: &str = "declargs.help.commands";
    pub const HELP_FLAGS: &str = "declargs.help.flags";
    pub const HELP_GLOBAL_FLAGS: &str = "declargs.help.global_flags";
    pub const HELP_POSITIONAL: &str = "declargs.help.positional";
    pub const HELP_REQUIRED: &str = "declargs.help.required";
    pub const HELP_DEFAULT: &str = "declargs.help.default";
}

/// Which namespace a translated name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    Flag,
    Command,
}

/// A normalized BCP-47-style language tag, e.g. `en`, `de`, `pt-br`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lang(String);

impl Lang {
    /// Normalize a tag: lowercase, `_` separators become `-`.
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().replace('_', "-").to_lowercase())
    }

    /// The base language of this tag (`de-at` -> `de`).
    pub fn base(&self) -> Lang {
        match self.0.split_once('-') {
            Some((base, _)) => Lang(base.to_string()),
            None => self.clone(),
        }
    }

    /// True when the tag has no region or script subtags.
    pub fn is_base(&self) -> bool {
        !self.0.contains('-')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Lang {
    fn default() -> Self {
        Lang("en".to_string())
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Lang {
    fn from(tag: &str) -> Self {
        Lang::new(tag)
    }
}

/// Substitute `{0}`, `{1}`, ... placeholders in a message template.
///
/// Unknown placeholders are left in place so a malformed catalog entry stays
/// visible instead of silently losing information.
pub fn format_template(template: &str, args: &[String]) -> String {
    let mut out = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{i}}}"), arg);
    }
    out.trim_end().to_string()
}
