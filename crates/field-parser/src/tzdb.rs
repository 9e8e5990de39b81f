//! Timezone database used to resolve textual zone names (`%Z`).
//!
//! The on-disk database is a JSON document:
//!
//! ```json
//! {
//!   "version": "2024b",
//!   "abbreviations": { "PST": "-08:00", "CEST": "+02:00" },
//!   "links": { "US/Pacific": "America/Los_Angeles" },
//!   "iana": true
//! }
//! ```
//!
//! Abbreviations map to fixed offsets, links map names onto IANA zones, and
//! when `iana` is set every identifier known to `chrono-tz` resolves to its
//! time-dependent rules. A loaded database is immutable and shared between
//! parsers by `Arc`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::TzdbError;

/// How a zone name maps onto a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneRule {
    /// A constant offset (abbreviations such as `PST`).
    Fixed(FixedOffset),
    /// An IANA zone whose offset depends on the date.
    Region(Tz),
}

impl ZoneRule {
    /// The offset in effect at a local wall-clock time.
    ///
    /// Ambiguous local times (a DST fall-back) take the earliest offset.
    /// Returns `None` for local times skipped by a DST gap.
    pub fn offset_for_local(&self, local: &NaiveDateTime) -> Option<FixedOffset> {
        match self {
            ZoneRule::Fixed(offset) => Some(*offset),
            ZoneRule::Region(tz) => tz
                .offset_from_local_datetime(local)
                .earliest()
                .map(|offset| offset.fix()),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TzdbFile {
    version: String,
    #[serde(default)]
    abbreviations: HashMap<String, String>,
    #[serde(default)]
    links: HashMap<String, String>,
    #[serde(default = "default_iana")]
    iana: bool,
}

fn default_iana() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct TimezoneDatabase {
    version: String,
    abbreviations: HashMap<String, FixedOffset>,
    links: HashMap<String, Tz>,
    iana: bool,
}

impl TimezoneDatabase {
    /// The compiled-in IANA rules with no abbreviations or links.
    pub fn builtin() -> Self {
        Self {
            version: "builtin".to_string(),
            abbreviations: HashMap::new(),
            links: HashMap::new(),
            iana: true,
        }
    }

    /// Read a database file.
    ///
    /// # Errors
    ///
    /// Returns [`TzdbError::Io`] when the file cannot be read, and the
    /// errors of [`TimezoneDatabase::from_json_str`] for bad contents.
    pub fn load(path: &Path) -> Result<Self, TzdbError> {
        let contents = std::fs::read_to_string(path).map_err(|source| TzdbError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse a database document.
    ///
    /// # Errors
    ///
    /// Returns [`TzdbError::Json`] for malformed documents,
    /// [`TzdbError::InvalidOffset`] for unparsable abbreviation offsets and
    /// [`TzdbError::UnknownZone`] for links to zones `chrono-tz` does not know.
    pub fn from_json_str(contents: &str) -> Result<Self, TzdbError> {
        let file: TzdbFile = serde_json::from_str(contents)?;

        let abbreviations = file
            .abbreviations
            .into_iter()
            .map(|(name, offset)| match parse_utc_offset(&offset) {
                Some(fixed) => Ok((name, fixed)),
                None => Err(TzdbError::InvalidOffset { name, offset }),
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        let links = file
            .links
            .into_iter()
            .map(|(link, target)| match target.parse::<Tz>() {
                Ok(tz) => Ok((link, tz)),
                Err(_) => Err(TzdbError::UnknownZone { link, target }),
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self {
            version: file.version,
            abbreviations,
            links,
            iana: file.iana,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn abbreviation_count(&self) -> usize {
        self.abbreviations.len()
    }

    /// Resolve a zone name: abbreviations first (exact, then upper-cased),
    /// then links, then IANA identifiers.
    pub fn lookup(&self, name: &str) -> Option<ZoneRule> {
        if let Some(offset) = self.abbreviations.get(name) {
            return Some(ZoneRule::Fixed(*offset));
        }
        if let Some(tz) = self.links.get(name) {
            return Some(ZoneRule::Region(*tz));
        }
        if self.iana {
            if let Ok(tz) = name.parse::<Tz>() {
                return Some(ZoneRule::Region(tz));
            }
        }
        let upper = name.to_ascii_uppercase();
        if upper != name {
            if let Some(offset) = self.abbreviations.get(&upper) {
                return Some(ZoneRule::Fixed(*offset));
            }
            if self.iana {
                if let Ok(tz) = upper.parse::<Tz>() {
                    return Some(ZoneRule::Region(tz));
                }
            }
        }
        None
    }
}

/// Parse `+HH:MM`, `+HHMM` or `+HH` into a fixed offset.
fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Loads the database once and hands out shared references.
///
/// Repeat calls to [`TzdbLoader::load`] reuse the loaded database unless a
/// reload is forced. Loading takes `&mut self`: a single loader initializes
/// the database at startup, before any parser runs.
#[derive(Debug)]
pub struct TzdbLoader {
    path: PathBuf,
    loaded: Option<Arc<TimezoneDatabase>>,
}

impl TzdbLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn database(&self) -> Option<Arc<TimezoneDatabase>> {
        self.loaded.clone()
    }

    /// Load the database, or return the already loaded one when `force` is
    /// false. A failed forced reload keeps the previous database.
    pub fn load(&mut self, force: bool) -> Result<Arc<TimezoneDatabase>, TzdbError> {
        if let Some(db) = &self.loaded {
            if !force {
                tracing::debug!(path = %self.path.display(), "timezone database already loaded");
                return Ok(Arc::clone(db));
            }
        }

        let db = Arc::new(TimezoneDatabase::load(&self.path)?);
        tracing::info!(
            path = %self.path.display(),
            version = db.version(),
            abbreviations = db.abbreviation_count(),
            "loaded timezone database"
        );
        self.loaded = Some(Arc::clone(&db));
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "version": "test-1",
        "abbreviations": {"PST": "-08:00", "IST": "+0530", "CET": "+01"},
        "links": {"US/Pacific": "America/Los_Angeles"}
    }"#;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_abbreviations_are_fixed() {
        let db = TimezoneDatabase::from_json_str(SAMPLE).unwrap();
        assert_eq!(db.version(), "test-1");
        let rule = db.lookup("PST").unwrap();
        assert_eq!(
            rule.offset_for_local(&local(2024, 7, 1, 12, 0)),
            FixedOffset::west_opt(8 * 3600)
        );
        assert_eq!(
            db.lookup("IST").unwrap(),
            ZoneRule::Fixed(FixedOffset::east_opt(5 * 3600 + 1800).unwrap())
        );
        assert_eq!(
            db.lookup("cet").unwrap(),
            ZoneRule::Fixed(FixedOffset::east_opt(3600).unwrap())
        );
    }

    #[test]
    fn test_links_and_iana_are_time_dependent() {
        let db = TimezoneDatabase::from_json_str(SAMPLE).unwrap();
        let rule = db.lookup("US/Pacific").unwrap();
        assert_eq!(
            rule.offset_for_local(&local(2024, 1, 15, 12, 0)),
            FixedOffset::west_opt(8 * 3600)
        );
        assert_eq!(
            rule.offset_for_local(&local(2024, 7, 15, 12, 0)),
            FixedOffset::west_opt(7 * 3600)
        );
        assert!(matches!(db.lookup("Europe/Madrid"), Some(ZoneRule::Region(_))));
        assert!(matches!(db.lookup("UTC"), Some(ZoneRule::Region(_))));
    }

    #[test]
    fn test_dst_gap_and_overlap() {
        let rule = TimezoneDatabase::builtin().lookup("America/New_York").unwrap();
        // 2026-03-08 02:30 does not exist in New York
        assert_eq!(rule.offset_for_local(&local(2026, 3, 8, 2, 30)), None);
        // 2026-11-01 01:30 happens twice; the earliest is EDT
        assert_eq!(
            rule.offset_for_local(&local(2026, 11, 1, 1, 30)),
            FixedOffset::west_opt(4 * 3600)
        );
    }

    #[test]
    fn test_unknown_names() {
        let db = TimezoneDatabase::builtin();
        assert_eq!(db.lookup("NOPE"), None);
        assert_eq!(db.lookup("PST"), None);
    }

    #[test]
    fn test_iana_disabled() {
        let db = TimezoneDatabase::from_json_str(r#"{"version": "v", "iana": false}"#).unwrap();
        assert_eq!(db.lookup("UTC"), None);
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            TimezoneDatabase::from_json_str("not json"),
            Err(TzdbError::Json(_))
        ));
        assert!(matches!(
            TimezoneDatabase::from_json_str(r#"{"version": "v", "abbreviations": {"X": "8"}}"#),
            Err(TzdbError::InvalidOffset { .. })
        ));
        assert!(matches!(
            TimezoneDatabase::from_json_str(r#"{"version": "v", "links": {"X": "Mars/Base"}}"#),
            Err(TzdbError::UnknownZone { .. })
        ));
        assert!(matches!(
            TimezoneDatabase::from_json_str(r#"{"version": "v", "extra": 1}"#),
            Err(TzdbError::Json(_))
        ));
    }

    #[test]
    fn test_loader_reuses_until_forced() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"version": "first"}}"#).unwrap();

        let mut loader = TzdbLoader::new(file.path());
        assert!(!loader.is_loaded());
        let first = loader.load(false).unwrap();
        assert!(loader.is_loaded());
        assert_eq!(first.version(), "first");

        std::fs::write(file.path(), r#"{"version": "second"}"#).unwrap();
        let again = loader.load(false).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(again.version(), "first");

        let reloaded = loader.load(true).unwrap();
        assert_eq!(reloaded.version(), "second");
        assert!(!Arc::ptr_eq(&first, &reloaded));
    }

    #[test]
    fn test_loader_missing_file() {
        let mut loader = TzdbLoader::new("/nonexistent/tzdb.json");
        let err = loader.load(false).unwrap_err();
        assert!(matches!(err, TzdbError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/tzdb.json"), "got: {err}");
        assert!(!loader.is_loaded());
    }
}
