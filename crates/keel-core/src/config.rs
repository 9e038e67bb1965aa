//! # Validator Configuration
//!
//! Where error messages come from and which language they default to.
//! Loaded from YAML, optionally overridden from the environment, and turned
//! into an immutable [`MessageCatalog`] once at startup:
//!
//! ```yaml
//! default_lang: fr
//! locale_dir: /etc/myapp/locales
//! ```
//!
//! | Variable          | Overrides      |
//! |-------------------|----------------|
//! | `KEEL_LANG`       | `default_lang` |
//! | `KEEL_LOCALE_DIR` | `locale_dir`   |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogError, MessageCatalog};

/// Environment variable overriding [`ValidatorConfig::default_lang`].
pub const LANG_ENV: &str = "KEEL_LANG";
/// Environment variable overriding [`ValidatorConfig::locale_dir`].
pub const LOCALE_DIR_ENV: &str = "KEEL_LOCALE_DIR";

/// Error loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("config io error for '{path}': {source}")]
    Io {
        /// Config file path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config is not valid YAML or has unknown fields.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The configured translations could not be loaded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Localization settings for validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Language used when `validate` is called without one.
    #[serde(default = "default_lang")]
    pub default_lang: String,

    /// Directory of `<lang>.yaml` files layered over the bundled catalog.
    #[serde(default)]
    pub locale_dir: Option<PathBuf>,
}

fn default_lang() -> String {
    MessageCatalog::SOURCE_LANG.to_string()
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            default_lang: default_lang(),
            locale_dir: None,
        }
    }
}

impl ValidatorConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Read and parse a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&source)
    }

    /// Defaults overridden from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `KEEL_LANG` / `KEEL_LOCALE_DIR` if set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name| lookup(name).filter(|v: &String| !v.trim().is_empty());
        if let Some(lang) = non_empty(LANG_ENV) {
            self.default_lang = lang;
        }
        if let Some(dir) = non_empty(LOCALE_DIR_ENV) {
            self.locale_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// Build the catalog: bundled translations, then `locale_dir` on top,
    /// with `default_lang` as the fallback language.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Catalog`] if `locale_dir` cannot be read or
    /// contains a malformed file.
    pub fn build_catalog(&self) -> Result<MessageCatalog, ConfigError> {
        let mut catalog = MessageCatalog::bundled().with_default_lang(&self.default_lang);
        if let Some(dir) = &self.locale_dir {
            let files = catalog.load_dir(dir)?;
            if files == 0 {
                tracing::warn!(dir = %dir.display(), "locale directory holds no catalog files");
            }
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::FIELD_MISSING;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ValidatorConfig::default();
        assert_eq!(config.default_lang, "en");
        assert!(config.locale_dir.is_none());
        assert_eq!(ValidatorConfig::from_yaml_str("{}").unwrap(), config);
    }

    #[test]
    fn test_parse_yaml() {
        let config =
            ValidatorConfig::from_yaml_str("default_lang: fr\nlocale_dir: /srv/locales\n").unwrap();
        assert_eq!(config.default_lang, "fr");
        assert_eq!(config.locale_dir, Some(PathBuf::from("/srv/locales")));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = ValidatorConfig::from_yaml_str("default_language: fr\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ValidatorConfig::load("/nonexistent/keel.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keel.yaml");
        std::fs::write(&path, "default_lang: fr\n").unwrap();
        let config = ValidatorConfig::load(&path).unwrap();
        assert_eq!(config.default_lang, "fr");
    }

    #[test]
    fn test_overrides_ignore_empty_values() {
        let vars: HashMap<&str, &str> = [(LANG_ENV, "fr"), (LOCALE_DIR_ENV, "  ")].into();
        let config = ValidatorConfig::default()
            .with_overrides_from(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.default_lang, "fr");
        assert!(config.locale_dir.is_none());
    }

    #[test]
    fn test_build_catalog_uses_default_lang() {
        let config = ValidatorConfig {
            default_lang: "fr".into(),
            locale_dir: None,
        };
        let catalog = config.build_catalog().unwrap();
        assert_eq!(catalog.translate(FIELD_MISSING, None), "Champ manquant.");
    }

    #[test]
    fn test_build_catalog_layers_locale_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("it.yaml"), "\"Field is missing.\": \"Campo mancante.\"\n")
            .unwrap();
        let config = ValidatorConfig {
            default_lang: "it".into(),
            locale_dir: Some(dir.path().to_path_buf()),
        };
        let catalog = config.build_catalog().unwrap();
        assert_eq!(catalog.translate(FIELD_MISSING, None), "Campo mancante.");
        assert_eq!(catalog.translate(FIELD_MISSING, Some("fr")), "Champ manquant.");
    }
}
