//! Canonical/translated name registry
//!
//! Declarations carrying a name key get one entry per language the layered
//! bundle can resolve that key in. The registry is rebuilt whenever the user
//! bundle changes, so lookups always reflect the active catalogs.

use indexmap::IndexMap;

use super::{Lang, NameKind};

#[derive(Debug, Clone, Default)]
struct KindMaps {
    // canonical -> lang -> translated
    forward: IndexMap<String, IndexMap<String, String>>,
    // lang -> translated -> canonical
    reverse: IndexMap<String, IndexMap<String, String>>,
}

/// Bidirectional map between canonical names and per-language translations,
/// with flags and commands in separate namespaces.
#[derive(Debug, Clone, Default)]
pub struct TranslationRegistry {
    flags: KindMaps,
    commands: KindMaps,
}

impl TranslationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.flags = KindMaps::default();
        self.commands = KindMaps::default();
    }

    fn maps(&self, kind: NameKind) -> &KindMaps {
        match kind {
            NameKind::Flag => &self.flags,
            NameKind::Command => &self.commands,
        }
    }

    fn maps_mut(&mut self, kind: NameKind) -> &mut KindMaps {
        match kind {
            NameKind::Flag => &mut self.flags,
            NameKind::Command => &mut self.commands,
        }
    }

    /// Register a translation for a canonical name.
    pub fn add(
        &mut self,
        kind: NameKind,
        canonical: impl Into<String>,
        lang: &Lang,
        translated: impl Into<String>,
    ) {
        let canonical = canonical.into();
        let translated = translated.into();
        let maps = self.maps_mut(kind);
        maps.forward
            .entry(canonical.clone())
            .or_default()
            .insert(lang.as_str().to_string(), translated.clone());
        maps.reverse.entry(lang.as_str().to_string()).or_default().insert(translated, canonical);
    }

    /// Map a possibly-translated token back to its canonical name.
    ///
    /// Matching is case-sensitive; the exact tag is tried before the base
    /// language.
    pub fn canonical_of(&self, kind: NameKind, lang: &Lang, token: &str) -> Option<&str> {
        let maps = self.maps(kind);
        if let Some(hit) = maps.reverse.get(lang.as_str()).and_then(|m| m.get(token)) {
            return Some(hit.as_str());
        }
        if !lang.is_base() {
            let base = lang.base();
            return maps
                .reverse
                .get(base.as_str())
                .and_then(|m| m.get(token))
                .map(String::as_str);
        }
        None
    }

    /// The translated form of a canonical name in `lang`, if any.
    pub fn translation_of(&self, kind: NameKind, canonical: &str, lang: &Lang) -> Option<&str> {
        let maps = self.maps(kind);
        let per_lang = maps.forward.get(canonical)?;
        if let Some(hit) = per_lang.get(lang.as_str()) {
            return Some(hit.as_str());
        }
        if !lang.is_base() {
            return per_lang.get(lang.base().as_str()).map(String::as_str);
        }
        None
    }

    /// All `(translated, canonical)` pairs active for `lang`, used by the
    /// suggestion engine.
    pub fn translated_names(&self, kind: NameKind, lang: &Lang) -> Vec<(String, String)> {
        let maps = self.maps(kind);
        let mut out = Vec::new();
        let mut push_from = |tag: &str| {
            if let Some(per_lang) = maps.reverse.get(tag) {
                for (translated, canonical) in per_lang {
                    out.push((translated.clone(), canonical.clone()));
                }
            }
        };
        push_from(lang.as_str());
        if !lang.is_base() {
            push_from(lang.base().as_str());
        }
        out
    }
}
