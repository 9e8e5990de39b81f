//! Error types for field-parser operations.
//!
//! Build-time errors ([`BuildError`]) surface while an asset is loaded and
//! block the offending helper from installing. Run-time errors
//! ([`ParseError`], [`HelperError`]) are per event and never fatal to the
//! process.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Invalid definition shape: {0}")]
    DefinitionShape(String),

    #[error("Invalid parameter count: {0}")]
    ParameterArity(String),

    #[error("Invalid parameter type: {0}")]
    ParameterType(String),

    #[error("Invalid field path: {0}")]
    PathFormat(String),

    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Unknown helper: {0}")]
    UnknownHelper(String),
}

/// A failed parse of one field value.
///
/// Every variant records the byte offset reached before the failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Parse mismatch at byte {offset}: {reason}")]
    Mismatch { offset: usize, reason: String },

    #[error("Unknown or ambiguous time zone '{name}' at byte {offset}")]
    AmbiguousOrUnknownZone { offset: usize, name: String },
}

impl ParseError {
    pub(crate) fn mismatch(offset: usize, reason: impl Into<String>) -> Self {
        ParseError::Mismatch {
            offset,
            reason: reason.into(),
        }
    }

    /// Bytes of input consumed before the failure.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::Mismatch { offset, .. } => *offset,
            ParseError::AmbiguousOrUnknownZone { offset, .. } => *offset,
        }
    }
}

/// A helper that failed on one event. The target field is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HelperError {
    #[error("Field '{0}' not found in event")]
    MissingField(String),

    #[error("Field '{0}' is not a string")]
    NotAString(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Cannot set target field '{0}'")]
    Target(String),
}

#[derive(Error, Debug)]
pub enum TzdbError {
    #[error("Cannot read timezone database '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed timezone database: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid UTC offset for '{name}': '{offset}'")]
    InvalidOffset { name: String, offset: String },

    #[error("Link '{link}' points at unknown zone '{target}'")]
    UnknownZone { link: String, target: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid default locale: {0}")]
    InvalidLocale(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tzdb(#[from] TzdbError),
}
