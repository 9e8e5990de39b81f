//! Reusable date parsers built from a format, an alias or a sample.

use std::sync::Arc;

use crate::clock::Clock;
use crate::datetime::{self, ParseContext, ParsedTimestamp};
use crate::error::{BuildError, ParseError};
use crate::format::{self, alias, FormatToken};
use crate::locale::{resolve_locale, LocaleNames, DEFAULT_LOCALE};
use crate::tzdb::TimezoneDatabase;

/// Shared state handed to every parser built for one asset load.
#[derive(Clone)]
pub struct BuildContext {
    pub tzdb: Arc<TimezoneDatabase>,
    pub clock: Arc<dyn Clock>,
    /// Locale used when a definition does not name one.
    pub default_locale: String,
}

impl BuildContext {
    pub fn new(tzdb: Arc<TimezoneDatabase>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tzdb,
            clock,
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

/// A compiled date format bound to a locale, a timezone database and a
/// clock. Cheap to share across threads.
#[derive(Clone)]
pub struct DateParser {
    tokens: Vec<FormatToken>,
    names: &'static LocaleNames,
    tzdb: Arc<TimezoneDatabase>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for DateParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DateParser")
            .field("tokens", &self.tokens)
            .field("locale", &self.names.language)
            .field("tzdb", &self.tzdb.version())
            .finish()
    }
}

impl DateParser {
    /// Build a parser.
    ///
    /// `format` is tried, in order, as an alias name, as a specifier string
    /// (anything containing `%`) and finally as a sample timestamp: the
    /// first alias that parses the whole sample is used.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidFormat`] for an empty format or a sample
    /// no alias matches, and [`BuildError::InvalidLocale`] for an unknown
    /// locale.
    pub fn new(format: &str, locale: Option<&str>, ctx: &BuildContext) -> Result<Self, BuildError> {
        if format.is_empty() {
            return Err(BuildError::InvalidFormat("format is empty".to_string()));
        }
        let names = resolve_locale(locale.unwrap_or(&ctx.default_locale))?;

        let mut parser = Self {
            tokens: Vec::new(),
            names,
            tzdb: Arc::clone(&ctx.tzdb),
            clock: Arc::clone(&ctx.clock),
        };

        parser.tokens = if let Some(tokens) = alias::lookup(format) {
            tokens.to_vec()
        } else if format.contains('%') {
            format::compile_specifiers(format)
        } else {
            let detected = parser.detect(format).ok_or_else(|| {
                BuildError::InvalidFormat(format!("'{format}' does not match any known format"))
            })?;
            tracing::debug!(sample = format, alias = detected.name, "detected date format from sample");
            detected.tokens.clone()
        };
        Ok(parser)
    }

    fn detect(&self, sample: &str) -> Option<&'static alias::CompiledAlias> {
        alias::all().iter().find(|candidate| {
            datetime::parse(&candidate.tokens, sample, &self.context())
                .is_ok_and(|parsed| parsed.consumed == sample.len())
        })
    }

    fn context(&self) -> ParseContext<'_> {
        ParseContext {
            tzdb: &self.tzdb,
            names: self.names,
            clock: self.clock.as_ref(),
        }
    }

    pub fn tokens(&self) -> &[FormatToken] {
        &self.tokens
    }

    pub fn locale(&self) -> &'static str {
        self.names.language
    }

    /// Parse one field value.
    ///
    /// # Errors
    ///
    /// See [`datetime::parse`].
    pub fn parse(&self, input: &str) -> Result<ParsedTimestamp, ParseError> {
        datetime::parse(&self.tokens, input, &self.context())
    }
}
