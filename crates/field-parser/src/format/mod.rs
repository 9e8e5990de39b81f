//! Format-string compilation.
//!
//! A format is either a named alias (see [`alias`]) or a specifier string
//! in the `strptime` family: `%` introduces a specifier, everything else is
//! literal text. Compilation never fails. An escape that is not a known
//! specifier stays in the token stream as literal text, so ad hoc device
//! formats still load.
//!
//! # Specifiers
//!
//! | Spec | Meaning |
//! |---|---|
//! | `%a` `%A` | weekday name (abbreviated or full accepted) |
//! | `%b` `%h` `%B` | month name (abbreviated or full accepted) |
//! | `%m` | month number |
//! | `%d` | day of month |
//! | `%e` | day of month, optionally padded with one leading space |
//! | `%H` / `%I` `%p` | 24-hour / 12-hour clock and meridiem |
//! | `%M` | minute |
//! | `%S` `%NS` | seconds with optional fraction (at most N digits) |
//! | `%Y` `%y` | 4-digit / 2-digit year |
//! | `%s` | seconds since the Unix epoch |
//! | `%Z` | zone name resolved through the timezone database |
//! | `%z` | numeric offset `±hh[mm]` |
//! | `%Ez` `%Oz` `%:z` | numeric offset `±hh[:mm]` or `Z` |
//! | `%F` `%D` `%T` `%R` `%r` `%+` | composite date/time |
//! | `%%` `%n` `%t` | literal `%`, whitespace |

pub mod alias;

use std::sync::LazyLock;

/// One unit of a compiled format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatToken {
    Literal(String),
    Specifier(Specifier),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Specifier {
    pub kind: SpecKind,
    /// Maximum digits for numeric fields; maximum fractional digits for
    /// seconds.
    pub width: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    Abbreviated,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetStyle {
    /// `±hh[mm]`
    Basic,
    /// `±hh[:mm]`, or `Z` for UTC
    Extended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// `%F` = `%Y-%m-%d`
    IsoDate,
    /// `%D` = `%m/%d/%y`
    UsDate,
    /// `%T` = `%H:%M:%S`
    Time,
    /// `%R` = `%H:%M`
    HourMinute,
    /// `%r` = `%I:%M:%S %p`
    Clock12,
    /// `%+` = `%Y-%m-%dT%H:%M:%S%Ez`
    IsoDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    WeekdayName(NameStyle),
    MonthName(NameStyle),
    Month,
    Day,
    /// `%e`: a day that may carry one leading pad space.
    SpacePaddedDay,
    Hour24,
    Hour12,
    Meridiem,
    Minute,
    Second,
    Year4,
    Year2,
    EpochSeconds,
    ZoneName,
    Offset(OffsetStyle),
    Composite(Composite),
}

impl SpecKind {
    fn from_letter(letter: char) -> Option<Self> {
        let kind = match letter {
            'a' => SpecKind::WeekdayName(NameStyle::Abbreviated),
            'A' => SpecKind::WeekdayName(NameStyle::Full),
            'b' | 'h' => SpecKind::MonthName(NameStyle::Abbreviated),
            'B' => SpecKind::MonthName(NameStyle::Full),
            'm' => SpecKind::Month,
            'd' => SpecKind::Day,
            'e' => SpecKind::SpacePaddedDay,
            'H' => SpecKind::Hour24,
            'I' => SpecKind::Hour12,
            'p' => SpecKind::Meridiem,
            'M' => SpecKind::Minute,
            'S' => SpecKind::Second,
            'Y' => SpecKind::Year4,
            'y' => SpecKind::Year2,
            's' => SpecKind::EpochSeconds,
            'Z' => SpecKind::ZoneName,
            'z' => SpecKind::Offset(OffsetStyle::Basic),
            'F' => SpecKind::Composite(Composite::IsoDate),
            'D' => SpecKind::Composite(Composite::UsDate),
            'T' => SpecKind::Composite(Composite::Time),
            'R' => SpecKind::Composite(Composite::HourMinute),
            'r' => SpecKind::Composite(Composite::Clock12),
            '+' => SpecKind::Composite(Composite::IsoDateTime),
            _ => return None,
        };
        Some(kind)
    }

    /// Default maximum digit count for numeric fields.
    pub(crate) fn max_digits(&self) -> usize {
        match self {
            SpecKind::Year4 => 4,
            _ => 2,
        }
    }
}

impl Composite {
    /// The fixed token sequence a composite stands for.
    pub fn expansion(self) -> &'static [FormatToken] {
        static EXPANSIONS: LazyLock<[Vec<FormatToken>; 6]> = LazyLock::new(|| {
            [
                compile_specifiers("%Y-%m-%d"),
                compile_specifiers("%m/%d/%y"),
                compile_specifiers("%H:%M:%S"),
                compile_specifiers("%H:%M"),
                compile_specifiers("%I:%M:%S %p"),
                compile_specifiers("%Y-%m-%dT%H:%M:%S%Ez"),
            ]
        });
        let index = match self {
            Composite::IsoDate => 0,
            Composite::UsDate => 1,
            Composite::Time => 2,
            Composite::HourMinute => 3,
            Composite::Clock12 => 4,
            Composite::IsoDateTime => 5,
        };
        &EXPANSIONS[index]
    }
}

/// Compile a format string or named alias into tokens.
///
/// # Examples
///
/// ```
/// use field_parser::format::{compile, FormatToken};
///
/// assert_eq!(compile("SYSLOG"), compile("%b %d %T"));
/// assert_eq!(compile("at %q"), vec![FormatToken::Literal("at %q".into())]);
/// ```
pub fn compile(format: &str) -> Vec<FormatToken> {
    match alias::lookup(format) {
        Some(tokens) => tokens.to_vec(),
        None => compile_specifiers(format),
    }
}

/// Scan a specifier string, ignoring the alias table.
pub fn compile_specifiers(format: &str) -> Vec<FormatToken> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = format;

    while let Some(percent) = rest.find('%') {
        literal.push_str(&rest[..percent]);
        let escape = &rest[percent..];
        match scan_escape(escape) {
            Some((Escape::Text(text), len)) => {
                literal.push_str(text);
                rest = &escape[len..];
            }
            Some((Escape::Spec(spec), len)) => {
                if !literal.is_empty() {
                    tokens.push(FormatToken::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(FormatToken::Specifier(spec));
                rest = &escape[len..];
            }
            None => {
                let shown: String = escape.chars().take(2).collect();
                tracing::warn!(format, escape = %shown, "unrecognized format escape matched as literal text");
                literal.push('%');
                rest = &escape[1..];
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        tokens.push(FormatToken::Literal(literal));
    }
    tokens
}

enum Escape {
    Text(&'static str),
    Spec(Specifier),
}

/// Recognize the escape at the start of `s` (which begins with `%`).
/// Returns the escape and its length in bytes.
fn scan_escape(s: &str) -> Option<(Escape, usize)> {
    let bytes = s.as_bytes();
    let mut pos = 1;

    match bytes.get(pos)? {
        b'%' => return Some((Escape::Text("%"), 2)),
        b'n' | b't' => return Some((Escape::Text(" "), 2)),
        _ => {}
    }

    let digits_start = pos;
    while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        pos += 1;
    }
    let width = if pos > digits_start {
        Some(s[digits_start..pos].parse::<usize>().ok()?)
    } else {
        None
    };

    if matches!(bytes.get(pos), Some(b'E' | b'O' | b':')) {
        return match bytes.get(pos + 1) {
            Some(b'z') => Some((
                Escape::Spec(Specifier {
                    kind: SpecKind::Offset(OffsetStyle::Extended),
                    width: None,
                }),
                pos + 2,
            )),
            // Locale-alternative forms of other specifiers parse like the plain ones.
            Some(&letter) if bytes[pos] != b':' => {
                let kind = SpecKind::from_letter(letter as char)?;
                Some((Escape::Spec(Specifier { kind, width }), pos + 2))
            }
            _ => None,
        };
    }

    let letter = *bytes.get(pos)?;
    let kind = SpecKind::from_letter(letter as char)?;
    Some((Escape::Spec(Specifier { kind, width }), pos + 1))
}
