//! # Message Catalog
//!
//! Resolves a msgid, a language and a set of parameters into display text.
//!
//! ## Catalog Files
//!
//! A translation file is a flat YAML map from msgid to translated text,
//! named after its language (`fr.yaml`, `pt_BR.yaml`):
//!
//! ```yaml
//! "Field is missing.": "Champ manquant."
//! "The maximum is {max}.": "Le maximum est {max}."
//! ```
//!
//! Empty translations are ignored, as untranslated entries are in gettext
//! catalogs.
//!
//! ## Lookup Order
//!
//! 1. The exact language tag (`fr_ca`, after normalization).
//! 2. Its primary subtag (`fr`).
//! 3. The catalog's default language.
//! 4. The msgid itself, which is the English source text.
//!
//! A missing translation is never an error.
//!
//! ## Thread Safety
//!
//! `MessageCatalog` is immutable once built and `Send + Sync`. The
//! [`MessageCatalog::builtin()`] instance is initialized once and shared
//! read-only for the life of the process.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use thiserror::Error;

use crate::message::{substitute, Params};

/// Bundled French translation of every built-in message.
const BUNDLED_FR: &str = include_str!("../locales/fr.yaml");

static BUILTIN: OnceLock<MessageCatalog> = OnceLock::new();

/// Error while loading translations.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A catalog file or directory could not be read.
    #[error("catalog io error for '{path}': {source}")]
    Io {
        /// File or directory being read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A translation file is not a flat string-to-string YAML map.
    #[error("invalid translations for language '{lang}': {reason}")]
    Parse {
        /// Language the file was loaded for.
        lang: String,
        /// Parser message.
        reason: String,
    },

    /// A catalog file name does not name a language.
    #[error("cannot derive a language from catalog file '{0}'")]
    InvalidPath(String),
}

/// Translations keyed by language, then msgid.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    default_lang: String,
    translations: HashMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    /// Language of the msgids themselves.
    pub const SOURCE_LANG: &'static str = "en";

    /// An empty catalog. Only the msgids (English) are available until
    /// translations are added.
    pub fn new(default_lang: impl AsRef<str>) -> Self {
        Self {
            default_lang: normalize(default_lang.as_ref()),
            translations: HashMap::new(),
        }
    }

    /// The process-wide default catalog: English source text plus the
    /// bundled translations, default language English.
    pub fn builtin() -> &'static MessageCatalog {
        BUILTIN.get_or_init(|| {
            let mut catalog = Self::new(Self::SOURCE_LANG);
            if let Err(err) = catalog.merge_yaml("fr", BUNDLED_FR) {
                tracing::warn!(error = %err, "bundled French catalog rejected");
            }
            catalog
        })
    }

    /// An owned copy of [`MessageCatalog::builtin()`], to extend.
    pub fn bundled() -> Self {
        Self::builtin().clone()
    }

    /// Change the language used when `validate` is called without one.
    pub fn with_default_lang(mut self, lang: impl AsRef<str>) -> Self {
        self.default_lang = normalize(lang.as_ref());
        self
    }

    /// The language used when none is requested.
    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    /// Languages with at least one translation, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.translations.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }

    /// Add or replace one translation.
    pub fn insert(
        &mut self,
        lang: impl AsRef<str>,
        msgid: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.translations
            .entry(normalize(lang.as_ref()))
            .or_default()
            .insert(msgid.into(), text.into());
    }

    /// Merge a YAML translation map for `lang`. Later entries win over
    /// earlier ones. Returns the number of entries merged.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] if `source` is not a flat map of
    /// strings.
    pub fn merge_yaml(&mut self, lang: &str, source: &str) -> Result<usize, CatalogError> {
        let entries: BTreeMap<String, String> =
            serde_yaml::from_str(source).map_err(|e| CatalogError::Parse {
                lang: lang.to_string(),
                reason: e.to_string(),
            })?;
        let table = self.translations.entry(normalize(lang)).or_default();
        let mut merged = 0;
        for (msgid, text) in entries {
            if text.is_empty() {
                continue;
            }
            table.insert(msgid, text);
            merged += 1;
        }
        Ok(merged)
    }

    /// Builder form of [`MessageCatalog::merge_yaml`].
    pub fn with_yaml(mut self, lang: &str, source: &str) -> Result<Self, CatalogError> {
        self.merge_yaml(lang, source)?;
        Ok(self)
    }

    /// Merge every `<lang>.yaml` / `<lang>.yml` file of `dir`. Other files
    /// are skipped. Returns the number of files merged.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the directory or a file cannot be
    /// read, and [`CatalogError::Parse`] for a malformed file.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, CatalogError> {
        let dir = dir.as_ref();
        let io_err = |path: &Path, source: std::io::Error| CatalogError::Io {
            path: path.display().to_string(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
            let path = entry.map_err(|e| io_err(dir, e))?.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if is_yaml && path.is_file() {
                paths.push(path);
            } else {
                tracing::warn!(path = %path.display(), "skipping non-catalog entry");
            }
        }
        // Deterministic merge order when `fr.yaml` and `fr.yml` coexist.
        paths.sort();

        for path in &paths {
            let lang = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .filter(|stem| !stem.is_empty())
                .ok_or_else(|| CatalogError::InvalidPath(path.display().to_string()))?;
            let source = std::fs::read_to_string(path).map_err(|e| io_err(path.as_path(), e))?;
            let merged = self.merge_yaml(lang, &source)?;
            tracing::debug!(lang, entries = merged, path = %path.display(), "loaded catalog file");
        }
        Ok(paths.len())
    }

    /// Translate `msgid` without substituting parameters.
    pub fn translate<'a>(&'a self, msgid: &'a str, lang: Option<&str>) -> &'a str {
        let requested = lang.map(normalize);
        let requested = requested.as_deref().unwrap_or(&self.default_lang);
        self.lookup(requested, msgid)
            .or_else(|| {
                if requested == self.default_lang {
                    None
                } else {
                    self.lookup(&self.default_lang, msgid)
                }
            })
            .unwrap_or(msgid)
    }

    /// Translate `msgid` and substitute `params` into the result.
    pub fn resolve(&self, msgid: &str, lang: Option<&str>, params: &Params) -> String {
        substitute(self.translate(msgid, lang), params)
    }

    /// Convenience for call sites holding `(&str, String)` pairs.
    pub fn resolve_with<'p>(
        &self,
        msgid: &str,
        lang: Option<&str>,
        params: impl IntoIterator<Item = (&'p str, String)>,
    ) -> String {
        let params: Vec<(Cow<'static, str>, String)> = params
            .into_iter()
            .map(|(k, v)| (Cow::Owned(k.to_string()), v))
            .collect();
        self.resolve(msgid, lang, &params)
    }

    fn lookup(&self, lang: &str, msgid: &str) -> Option<&str> {
        let exact = self.translations.get(lang);
        let primary = || {
            let (primary, _) = lang.split_once('_')?;
            self.translations.get(primary)
        };
        exact
            .and_then(|table| table.get(msgid))
            .or_else(|| primary().and_then(|table| table.get(msgid)))
            .map(String::as_str)
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::bundled()
    }
}

/// `pt-BR`, `PT_br` and ` pt_BR ` all become `pt_br`.
fn normalize(lang: &str) -> String {
    lang.trim().replace('-', "_").to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ABOVE_MAXIMUM, FIELD_MISSING};

    #[test]
    fn test_builtin_has_french() {
        let catalog = MessageCatalog::builtin();
        assert_eq!(catalog.default_lang(), "en");
        assert!(catalog.languages().contains(&"fr"));
        assert_eq!(catalog.translate(FIELD_MISSING, Some("fr")), "Champ manquant.");
    }

    #[test]
    fn test_english_is_the_msgid() {
        let catalog = MessageCatalog::builtin();
        assert_eq!(catalog.translate(FIELD_MISSING, None), FIELD_MISSING);
        assert_eq!(catalog.translate(FIELD_MISSING, Some("en")), FIELD_MISSING);
    }

    #[test]
    fn test_region_falls_back_to_primary_subtag() {
        let catalog = MessageCatalog::builtin();
        assert_eq!(catalog.translate(FIELD_MISSING, Some("fr-CA")), "Champ manquant.");
        assert_eq!(catalog.translate(FIELD_MISSING, Some("FR_be")), "Champ manquant.");
    }

    #[test]
    fn test_unknown_language_falls_back_to_default() {
        let catalog = MessageCatalog::bundled().with_default_lang("fr");
        assert_eq!(catalog.translate(FIELD_MISSING, Some("xx")), "Champ manquant.");
        assert_eq!(catalog.translate(FIELD_MISSING, None), "Champ manquant.");
    }

    #[test]
    fn test_unknown_msgid_is_returned_verbatim() {
        let catalog = MessageCatalog::builtin();
        assert_eq!(catalog.translate("Passwords don't match", Some("fr")), "Passwords don't match");
    }

    #[test]
    fn test_resolve_substitutes_after_translation() {
        let catalog = MessageCatalog::builtin();
        let text = catalog.resolve_with(ABOVE_MAXIMUM, Some("fr"), [("max", "10".to_string())]);
        assert_eq!(text, "Le maximum est 10.");
    }

    #[test]
    fn test_merge_yaml_skips_empty_entries() {
        let mut catalog = MessageCatalog::new("en");
        let merged = catalog
            .merge_yaml("de", "\"Field is missing.\": \"Feld fehlt.\"\n\"Unexpected key.\": \"\"\n")
            .unwrap();
        assert_eq!(merged, 1);
        assert_eq!(catalog.translate(FIELD_MISSING, Some("de")), "Feld fehlt.");
        assert_eq!(catalog.translate("Unexpected key.", Some("de")), "Unexpected key.");
    }

    #[test]
    fn test_merge_yaml_rejects_nested_maps() {
        let mut catalog = MessageCatalog::new("en");
        let err = catalog.merge_yaml("de", "a:\n  b: c\n").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { ref lang, .. } if lang == "de"));
    }

    #[test]
    fn test_load_dir_reads_yaml_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("es.yaml"), "\"Field is missing.\": \"Falta el campo.\"\n")
            .unwrap();
        std::fs::write(dir.path().join("README.txt"), "not a catalog").unwrap();

        let mut catalog = MessageCatalog::bundled();
        let loaded = catalog.load_dir(dir.path()).unwrap();
        assert_eq!(loaded, 1);
        assert_eq!(catalog.translate(FIELD_MISSING, Some("es")), "Falta el campo.");
        assert_eq!(catalog.translate(FIELD_MISSING, Some("fr")), "Champ manquant.");
    }

    #[test]
    fn test_load_dir_overrides_bundled_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fr.yml"), "\"Field is missing.\": \"Champ absent.\"\n")
            .unwrap();
        let mut catalog = MessageCatalog::bundled();
        catalog.load_dir(dir.path()).unwrap();
        assert_eq!(catalog.translate(FIELD_MISSING, Some("fr")), "Champ absent.");
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let mut catalog = MessageCatalog::new("en");
        let err = catalog.load_dir("/nonexistent/keel/locales").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn unknown_msgid_resolves_to_itself(
            msgid in "[A-Za-z ,.']{1,40}",
            lang in "[a-z]{2}([-_][A-Z]{2})?",
        ) {
            let catalog = MessageCatalog::new("en");
            prop_assert_eq!(catalog.translate(&msgid, Some(&lang)), msgid.as_str());
        }

        #[test]
        fn text_without_placeholders_is_unchanged(text in "[^{}]{0,60}", value in "\\PC{0,10}") {
            let catalog = MessageCatalog::new("en");
            let rendered = catalog.resolve_with(&text, None, [("name", value)]);
            prop_assert_eq!(rendered, text);
        }
    }
}
