//! Engine configuration.
//!
//! Loaded from a TOML file, then overridden by environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `FIELD_PARSER_TZDB` | `tzdb_path` |
//! | `FIELD_PARSER_LOCALE` | `default_locale` |
//!
//! ```toml
//! tzdb_path = "/etc/field-parser/tzdb.json"
//! default_locale = "en_US.UTF-8"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::locale::{resolve_locale, DEFAULT_LOCALE};

pub const ENV_TZDB: &str = "FIELD_PARSER_TZDB";
pub const ENV_LOCALE: &str = "FIELD_PARSER_LOCALE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Timezone database file. The compiled-in IANA rules are used when unset.
    pub tzdb_path: Option<PathBuf>,
    /// Locale for helpers that do not name one.
    pub default_locale: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tzdb_path: None,
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl EngineConfig {
    /// Load a config file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Toml`] when it is malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Defaults plus environment overrides, for runs without a config file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_TZDB).filter(|p| !p.is_empty()) {
            self.tzdb_path = Some(PathBuf::from(path));
        }
        if let Some(locale) = lookup(ENV_LOCALE).filter(|l| !l.is_empty()) {
            self.default_locale = locale;
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLocale`] when the default locale is not
    /// supported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        resolve_locale(&self.default_locale)
            .map(|_| ())
            .map_err(|e| ConfigError::InvalidLocale(e.to_string()))
    }
}
