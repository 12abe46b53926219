//! Message catalogs and the layered lookup over them

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use super::{format_template, Lang};
use crate::error::{ParseError, Result};

/// A set of message catalogs, one per language.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(transparent)]
pub struct MessageBundle {
    catalogs: IndexMap<String, IndexMap<String, String>>,
}

impl MessageBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a whole bundle from one JSON document of the form
    /// `{ "en": { key: template, ... }, "de": { ... } }`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            ParseError::processing_field(
                "bundle",
                ParseError::PatternMatch {
                    value: e.to_string(),
                    description: "a JSON object of language catalogs".to_string(),
                },
            )
        })
    }

    /// Add or replace a single message.
    pub fn add_message(
        &mut self,
        lang: impl Into<Lang>,
        key: impl Into<String>,
        template: impl Into<String>,
    ) -> &mut Self {
        let lang = lang.into();
        self.catalogs.entry(lang.as_str().to_string()).or_default().insert(key.into(), template.into());
        self
    }

    /// Merge a JSON object of `key -> template` pairs into one language's
    /// catalog.
    pub fn add_json(&mut self, lang: impl Into<Lang>, json: &str) -> Result<&mut Self> {
        let lang = lang.into();
        let parsed: IndexMap<String, String> = serde_json::from_str(json).map_err(|e| {
            ParseError::processing_field(
                format!("catalog:{lang}"),
                ParseError::PatternMatch { value: e.to_string(), description: "a JSON object of message strings".to_string() },
            )
        })?;
        self.catalogs.entry(lang.as_str().to_string()).or_default().extend(parsed);
        Ok(self)
    }

    /// Look up a message for `lang`: exact tag first, then base language.
    pub fn message(&self, key: &str, lang: &Lang) -> Option<&str> {
        if let Some(msg) = self.catalogs.get(lang.as_str()).and_then(|c| c.get(key)) {
            return Some(msg.as_str());
        }
        if !lang.is_base() {
            let base = lang.base();
            return self.catalogs.get(base.as_str()).and_then(|c| c.get(key)).map(String::as_str);
        }
        None
    }

    /// All languages this bundle carries catalogs for.
    pub fn languages(&self) -> impl Iterator<Item = Lang> + '_ {
        self.catalogs.keys().map(Lang::new)
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}

static DEFAULT_CATALOG: Lazy<MessageBundle> = Lazy::new(|| {
    let mut bundle = MessageBundle::new();
    for (lang, json) in [
        ("en", include_str!("locales/en.json")),
        ("de", include_str!("locales/de.json")),
        ("es", include_str!("locales/es.json")),
        ("fr", include_str!("locales/fr.json")),
        ("ja", include_str!("locales/ja.json")),
        ("pt", include_str!("locales/pt.json")),
    ] {
        // The embedded catalogs are covered by tests; a parse failure here
        // would mean a broken build artifact.
        let _ = bundle.add_json(lang, json);
    }
    bundle
});

/// Ordered lookup over user, system, and default catalogs.
///
/// Resolution walks layers in that order with exact-then-base language
/// matching inside each layer; if no layer resolves, the whole walk repeats
/// with the fallback language.
#[derive(Debug, Clone)]
pub struct LayeredBundle {
    user: MessageBundle,
    system: MessageBundle,
    default_catalog: MessageBundle,
    fallback: Lang,
}

impl Default for LayeredBundle {
    fn default() -> Self {
        Self {
            user: MessageBundle::new(),
            system: MessageBundle::new(),
            default_catalog: DEFAULT_CATALOG.clone(),
            fallback: Lang::default(),
        }
    }
}

impl LayeredBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the user layer. Returns the old layer so callers can restore
    /// it.
    pub fn set_user(&mut self, bundle: MessageBundle) -> MessageBundle {
        std::mem::replace(&mut self.user, bundle)
    }

    /// Replace the system layer.
    pub fn set_system(&mut self, bundle: MessageBundle) -> MessageBundle {
        std::mem::replace(&mut self.system, bundle)
    }

    pub fn user_mut(&mut self) -> &mut MessageBundle {
        &mut self.user
    }

    pub fn system_mut(&mut self) -> &mut MessageBundle {
        &mut self.system
    }

    /// Resolve `key` in `lang` across the layers.
    pub fn message(&self, key: &str, lang: &Lang) -> Option<&str> {
        for layer in [&self.user, &self.system, &self.default_catalog] {
            if let Some(msg) = layer.message(key, lang) {
                return Some(msg);
            }
        }
        if lang != &self.fallback {
            for layer in [&self.user, &self.system, &self.default_catalog] {
                if let Some(msg) = layer.message(key, &self.fallback) {
                    return Some(msg);
                }
            }
        }
        None
    }

    /// Resolve and format `key` with `{0}`-indexed args.
    pub fn format_message(&self, key: &str, lang: &Lang, args: &[String]) -> Option<String> {
        self.message(key, lang).map(|template| format_template(template, args))
    }

    /// Resolve a description: `key` through the layers first, the literal
    /// text otherwise. Used for flag/command descriptions and accepted
    /// pattern descriptions.
    pub fn describe(&self, key: &str, lang: &Lang) -> String {
        self.message(key, lang).map(str::to_string).unwrap_or_else(|| key.to_string())
    }

    /// Union of languages across all three layers.
    pub fn languages(&self) -> Vec<Lang> {
        let mut seen = Vec::new();
        for layer in [&self.user, &self.system, &self.default_catalog] {
            for lang in layer.languages() {
                if !seen.contains(&lang) {
                    seen.push(lang);
                }
            }
        }
        seen
    }
}
