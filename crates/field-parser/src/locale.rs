//! Locale name tables for weekday, month and meridiem matching.
//!
//! Locales are named POSIX style (`en_US.UTF-8`, `fr_FR`, `C`). Only the
//! language part selects a table; the territory and codeset are validated
//! for shape and otherwise ignored.

use crate::error::BuildError;

/// Names used when matching `%a %A %b %B %p`. Weekdays start on Sunday.
#[derive(Debug, PartialEq, Eq)]
pub struct LocaleNames {
    pub language: &'static str,
    pub weekdays_full: [&'static str; 7],
    pub weekdays_abbr: [&'static str; 7],
    pub months_full: [&'static str; 12],
    pub months_abbr: [&'static str; 12],
    pub am_pm: [&'static str; 2],
}

pub const DEFAULT_LOCALE: &str = "C";

static ENGLISH: LocaleNames = LocaleNames {
    language: "en",
    weekdays_full: [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ],
    weekdays_abbr: ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
    months_full: [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ],
    months_abbr: [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ],
    am_pm: ["AM", "PM"],
};

static SPANISH: LocaleNames = LocaleNames {
    language: "es",
    weekdays_full: [
        "domingo",
        "lunes",
        "martes",
        "miércoles",
        "jueves",
        "viernes",
        "sábado",
    ],
    weekdays_abbr: ["dom", "lun", "mar", "mié", "jue", "vie", "sáb"],
    months_full: [
        "enero",
        "febrero",
        "marzo",
        "abril",
        "mayo",
        "junio",
        "julio",
        "agosto",
        "septiembre",
        "octubre",
        "noviembre",
        "diciembre",
    ],
    months_abbr: [
        "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
    ],
    am_pm: ["a. m.", "p. m."],
};

static FRENCH: LocaleNames = LocaleNames {
    language: "fr",
    weekdays_full: [
        "dimanche", "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi",
    ],
    weekdays_abbr: ["dim.", "lun.", "mar.", "mer.", "jeu.", "ven.", "sam."],
    months_full: [
        "janvier",
        "février",
        "mars",
        "avril",
        "mai",
        "juin",
        "juillet",
        "août",
        "septembre",
        "octobre",
        "novembre",
        "décembre",
    ],
    months_abbr: [
        "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.",
        "nov.", "déc.",
    ],
    am_pm: ["AM", "PM"],
};

static GERMAN: LocaleNames = LocaleNames {
    language: "de",
    weekdays_full: [
        "Sonntag",
        "Montag",
        "Dienstag",
        "Mittwoch",
        "Donnerstag",
        "Freitag",
        "Samstag",
    ],
    weekdays_abbr: ["So", "Mo", "Di", "Mi", "Do", "Fr", "Sa"],
    months_full: [
        "Januar",
        "Februar",
        "März",
        "April",
        "Mai",
        "Juni",
        "Juli",
        "August",
        "September",
        "Oktober",
        "November",
        "Dezember",
    ],
    months_abbr: [
        "Jan", "Feb", "Mär", "Apr", "Mai", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov", "Dez",
    ],
    am_pm: ["AM", "PM"],
};

/// Resolve a locale name to its name tables.
///
/// # Errors
///
/// Returns [`BuildError::InvalidLocale`] for malformed names and languages
/// without tables.
///
/// # Examples
///
/// ```
/// use field_parser::locale::resolve_locale;
///
/// assert_eq!(resolve_locale("en_US.UTF-8").unwrap().language, "en");
/// assert!(resolve_locale("wrong_locale").is_err());
/// ```
pub fn resolve_locale(name: &str) -> Result<&'static LocaleNames, BuildError> {
    let invalid = || BuildError::InvalidLocale(format!("'{name}'"));

    let without_modifier = name.split('@').next().unwrap_or_default();
    let (base, codeset) = match without_modifier.split_once('.') {
        Some((base, codeset)) => (base, Some(codeset)),
        None => (without_modifier, None),
    };
    let valid_codeset = |c: &str| {
        !c.is_empty()
            && c.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    };
    if codeset.is_some_and(|c| !valid_codeset(c)) {
        return Err(invalid());
    }

    if base == "C" || base == "POSIX" {
        return Ok(&ENGLISH);
    }

    let (language, territory) = match base.split_once('_') {
        Some((language, territory)) => (language, Some(territory)),
        None => (base, None),
    };
    if territory.is_some_and(|t| t.len() != 2 || !t.chars().all(|c| c.is_ascii_uppercase())) {
        return Err(invalid());
    }

    match language {
        "en" => Ok(&ENGLISH),
        "es" => Ok(&SPANISH),
        "fr" => Ok(&FRENCH),
        "de" => Ok(&GERMAN),
        _ => Err(invalid()),
    }
}

/// Match the longest name at the start of `input`, ignoring case.
///
/// Returns the index of the matched name and the number of bytes consumed.
pub(crate) fn match_name(input: &str, tables: &[&[&'static str]]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for table in tables {
        for (index, name) in table.iter().enumerate() {
            if let Some(len) = prefix_len_ignore_case(input, name) {
                if best.is_none_or(|(_, best_len)| len > best_len) {
                    best = Some((index, len));
                }
            }
        }
    }
    best
}

fn prefix_len_ignore_case(input: &str, name: &str) -> Option<usize> {
    if name.is_empty() {
        return None;
    }
    let mut input_chars = input.char_indices();
    for expected in name.chars() {
        let (_, actual) = input_chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    Some(input_chars.next().map_or(input.len(), |(i, _)| i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_locales() {
        assert_eq!(resolve_locale("en_US.UTF-8").unwrap().language, "en");
        assert_eq!(resolve_locale("C").unwrap().language, "en");
        assert_eq!(resolve_locale("C.UTF-8").unwrap().language, "en");
        assert_eq!(resolve_locale("POSIX").unwrap().language, "en");
        assert_eq!(resolve_locale("es_ES").unwrap().language, "es");
        assert_eq!(resolve_locale("fr_FR.UTF-8@euro").unwrap().language, "fr");
        assert_eq!(resolve_locale("de").unwrap().language, "de");
    }

    #[test]
    fn test_resolve_invalid_locales() {
        for name in ["wrong_locale", "", "xx_XX", "en_us", "en_US.", "klingon"] {
            let err = resolve_locale(name).unwrap_err();
            assert!(matches!(err, BuildError::InvalidLocale(_)), "{name}: {err}");
        }
    }

    #[test]
    fn test_match_name_prefers_longest() {
        let tables: [&[&str]; 2] = [&ENGLISH.weekdays_full, &ENGLISH.weekdays_abbr];
        assert_eq!(match_name("Monday, 02", &tables), Some((1, 6)));
        assert_eq!(match_name("Mon, 02", &tables), Some((1, 3)));
        assert_eq!(match_name("MONDAY", &tables), Some((1, 6)));
        assert_eq!(match_name("Mo", &tables), None);
    }

    #[test]
    fn test_match_name_non_ascii() {
        let tables: [&[&str]; 2] = [&FRENCH.months_full, &FRENCH.months_abbr];
        assert_eq!(match_name("FÉVR. 2024", &tables), Some((1, "FÉVR.".len())));
        assert_eq!(match_name("août", &tables), Some((7, "août".len())));
    }
}
