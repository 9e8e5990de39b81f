//! Engine facade: configuration, timezone database and helper registry
//! wired together.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::date::{BuildContext, DateParser};
use crate::definition::Definition;
use crate::error::{BuildError, EngineError};
use crate::helper::{Helper, HelperRegistry};
use crate::tzdb::{TimezoneDatabase, TzdbLoader};

pub struct Engine {
    config: EngineConfig,
    loader: Option<TzdbLoader>,
    registry: HelperRegistry,
    ctx: BuildContext,
}

impl Engine {
    /// Validate the config and load the timezone database it names.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for an invalid config and
    /// [`EngineError::Tzdb`] when the database cannot be loaded.
    pub fn from_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let (loader, tzdb) = match &config.tzdb_path {
            Some(path) => {
                let mut loader = TzdbLoader::new(path);
                let tzdb = loader.load(false)?;
                (Some(loader), tzdb)
            }
            None => {
                tracing::debug!("no timezone database configured, using builtin rules");
                (None, Arc::new(TimezoneDatabase::builtin()))
            }
        };

        let ctx = BuildContext {
            tzdb,
            clock: Arc::new(SystemClock),
            default_locale: config.default_locale.clone(),
        };
        Ok(Self {
            config,
            loader,
            registry: HelperRegistry::with_builtins(),
            ctx,
        })
    }

    /// Replace the processing-time source used by parsers built afterwards.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.ctx.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &HelperRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HelperRegistry {
        &mut self.registry
    }

    pub fn tzdb(&self) -> &TimezoneDatabase {
        &self.ctx.tzdb
    }

    pub fn build_context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn build_helper(&self, definition: &Definition) -> Result<Helper, BuildError> {
        self.registry.build(definition, &self.ctx)
    }

    pub fn date_parser(&self, format: &str, locale: Option<&str>) -> Result<DateParser, BuildError> {
        DateParser::new(format, locale, &self.ctx)
    }

    /// Re-read the timezone database file. Parsers built before the reload
    /// keep the database they were built with.
    ///
    /// Returns `false` when the engine runs on the builtin rules.
    pub fn reload_timezones(&mut self) -> Result<bool, EngineError> {
        let Some(loader) = self.loader.as_mut() else {
            return Ok(false);
        };
        self.ctx.tzdb = loader.load(true)?;
        Ok(true)
    }
}
