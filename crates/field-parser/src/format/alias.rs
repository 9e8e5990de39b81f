//! Named timestamp layouts.
//!
//! Table order matters: sample detection in [`crate::date::DateParser`]
//! picks the first alias that consumes a whole sample.

use std::sync::LazyLock;

use super::{compile_specifiers, FormatToken};

/// Alias name and the specifier string it stands for.
pub const NAMED_FORMATS: &[(&str, &str)] = &[
    ("ANSIC", "%a %b %d %T %Y"),
    ("UnixDate", "%a %b %d %T %Z %Y"),
    ("RubyDate", "%a %b %d %T %z %Y"),
    ("RFC822", "%d %b %y %R %Z"),
    ("RFC822Z", "%d %b %y %R %z"),
    ("RFC850", "%A, %d-%b-%y %T %Z"),
    ("RFC1123", "%a, %d %b %Y %T %Z"),
    ("RFC1123Z", "%a, %d %b %Y %T %z"),
    ("RFC3339", "%FT%TZ%Ez"),
    ("RFC3164", "%b %d %R:%6S %Z"),
    ("SYSLOG", "%b %d %T"),
    ("ISO8601", "%FT%T%Ez"),
    ("ISO8601Z", "%FT%TZ"),
    ("HTTPDATE", "%d/%b/%Y:%T %z"),
    ("NGINX_ERROR", "%Y/%m/%d %T"),
    ("POSTGRES", "%F %H:%M:%6S %Z"),
];

pub struct CompiledAlias {
    pub name: &'static str,
    pub format: &'static str,
    pub tokens: Vec<FormatToken>,
}

static COMPILED: LazyLock<Vec<CompiledAlias>> = LazyLock::new(|| {
    NAMED_FORMATS
        .iter()
        .map(|&(name, format)| CompiledAlias {
            name,
            format,
            tokens: compile_specifiers(format),
        })
        .collect()
});

/// All aliases, compiled, in table order.
pub fn all() -> &'static [CompiledAlias] {
    &COMPILED
}

/// Tokens for an alias name. Names are case-sensitive.
pub fn lookup(name: &str) -> Option<&'static [FormatToken]> {
    COMPILED
        .iter()
        .find(|alias| alias.name == name)
        .map(|alias| alias.tokens.as_slice())
}
