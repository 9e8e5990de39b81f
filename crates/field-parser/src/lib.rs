//! # field-parser
//!
//! Field-level parsing for log normalization.
//!
//! Asset authors declare helpers such as
//! `event.created: parse_date($raw.time, SYSLOG)`. The engine validates each
//! declaration once, at load time, and turns it into an executable
//! [`Helper`] that rewrites one field of a JSON event. The centerpiece is the
//! date parser: `strptime`-style formats, named aliases, locale-aware names,
//! zone abbreviations through a timezone database, and millisecond output
//! in `YYYY-MM-DDTHH:MM:SS.mmmZ` form.
//!
//! ## Modules
//!
//! - [`definition`] — Helper definitions: shapes, name/target/argument extraction
//! - [`parameter`] — Argument classification and validators
//! - [`path`] — Field paths and event access
//! - [`format`] — Format-string compilation and the alias table
//! - [`datetime`] — Token execution against one field value
//! - [`date`] — Reusable date parsers (format, alias or sample)
//! - [`locale`] — Weekday/month/meridiem name tables
//! - [`tzdb`] — Timezone database and loader
//! - [`clock`] — Current-processing-time source
//! - [`helper`] — Helper registry and the `parse_date` helper
//! - [`engine`] — Facade wiring config, database and registry
//! - [`config`] — TOML configuration with environment overrides
//! - [`error`] — Error types
//!
//! ## Example
//!
//! ```
//! use field_parser::{Definition, Engine, EngineConfig};
//! use serde_json::json;
//!
//! let engine = Engine::from_config(EngineConfig::default()).unwrap();
//! let helper = engine
//!     .build_helper(&Definition::expression("ts", "parse_date($raw, HTTPDATE)"))
//!     .unwrap();
//!
//! let mut event = json!({"raw": "26/Dec/2016:16:22:14 +0100"});
//! helper.apply(&mut event).unwrap();
//! assert_eq!(event["ts"], "2016-12-26T15:22:14.000Z");
//! ```

pub mod clock;
pub mod config;
pub mod date;
pub mod datetime;
pub mod definition;
pub mod engine;
pub mod error;
pub mod format;
pub mod helper;
pub mod locale;
pub mod parameter;
pub mod path;
pub mod tzdb;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use date::{BuildContext, DateParser};
pub use datetime::{parse, ParseContext, ParsedTimestamp, OUTPUT_FORMAT};
pub use definition::{extract_definition, Definition, HelperDefinition};
pub use engine::Engine;
pub use error::{BuildError, ConfigError, EngineError, HelperError, ParseError, TzdbError};
pub use format::{compile, FormatToken};
pub use helper::{Event, Helper, HelperBuilder, HelperRegistry};
pub use locale::{resolve_locale, LocaleNames, DEFAULT_LOCALE};
pub use parameter::{
    assert_exact_arity, assert_kind, assert_max_arity, assert_min_arity, classify,
    format_helper_name, Parameter, ParameterKind,
};
pub use tzdb::{TimezoneDatabase, TzdbLoader, ZoneRule};
