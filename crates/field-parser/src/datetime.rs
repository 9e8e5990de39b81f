//! Execution of compiled format tokens against one field value.
//!
//! [`parse`] walks the token sequence with a byte cursor over the input,
//! accumulating date/time fields, then resolves them to a UTC instant at
//! millisecond resolution. Matching stops at the last token; input left
//! over after it is not an error and is reported through
//! [`ParsedTimestamp::consumed`].

use std::fmt;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

use crate::clock::Clock;
use crate::error::ParseError;
use crate::format::{FormatToken, NameStyle, OffsetStyle, SpecKind, Specifier};
use crate::locale::{match_name, LocaleNames};
use crate::tzdb::{TimezoneDatabase, ZoneRule};

/// Rendering used when a parsed timestamp is written back to an event.
pub const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Read-only collaborators of a parse.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub tzdb: &'a TimezoneDatabase,
    pub names: &'static LocaleNames,
    pub clock: &'a dyn Clock,
}

/// A successfully parsed timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTimestamp {
    /// The instant, truncated to milliseconds.
    pub instant: DateTime<Utc>,
    /// Bytes of input matched by the format.
    pub consumed: usize,
}

impl ParsedTimestamp {
    /// `YYYY-MM-DDTHH:MM:SS.mmmZ`
    pub fn to_field_string(&self) -> String {
        self.instant.format(OUTPUT_FORMAT).to_string()
    }
}

impl fmt::Display for ParsedTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instant.format(OUTPUT_FORMAT))
    }
}

/// Parse `input` against a compiled format.
///
/// # Errors
///
/// Returns [`ParseError::Mismatch`] when a token does not match, the
/// token sequence is empty, or the fields do not form a valid date, and
/// [`ParseError::AmbiguousOrUnknownZone`] when a `%Z` name is not in the
/// database or names a local time skipped by a DST transition.
pub fn parse(
    tokens: &[FormatToken],
    input: &str,
    ctx: &ParseContext<'_>,
) -> Result<ParsedTimestamp, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::mismatch(0, "empty format"));
    }

    let mut cursor = Cursor::new(input);
    let mut fields = Fields::default();
    run(tokens, &mut cursor, &mut fields, ctx)?;

    let instant = fields.resolve(cursor.pos, ctx)?;
    Ok(ParsedTimestamp {
        instant,
        consumed: cursor.pos,
    })
}

// ── Token execution ─────────────────────────────────────────────────────────

fn run(
    tokens: &[FormatToken],
    cursor: &mut Cursor<'_>,
    fields: &mut Fields,
    ctx: &ParseContext<'_>,
) -> Result<(), ParseError> {
    for token in tokens {
        match token {
            FormatToken::Literal(text) => cursor.literal(text)?,
            FormatToken::Specifier(spec) => specifier(spec, cursor, fields, ctx)?,
        }
    }
    Ok(())
}

fn specifier(
    spec: &Specifier,
    cursor: &mut Cursor<'_>,
    fields: &mut Fields,
    ctx: &ParseContext<'_>,
) -> Result<(), ParseError> {
    let max_digits = spec.width.unwrap_or_else(|| spec.kind.max_digits());
    match spec.kind {
        SpecKind::WeekdayName(style) => {
            let names = ctx.names;
            let tables = [&names.weekdays_full[..], &names.weekdays_abbr[..]];
            let index = cursor.name(&tables, style)?;
            fields.weekday = Some(index as u32);
        }
        SpecKind::MonthName(style) => {
            let names = ctx.names;
            let tables = [&names.months_full[..], &names.months_abbr[..]];
            let index = cursor.name(&tables, style)?;
            fields.month = Some(index as u32 + 1);
        }
        SpecKind::Month => fields.month = Some(cursor.number_in(max_digits, 1..=12, "month")?),
        SpecKind::Day => fields.day = Some(cursor.number_in(max_digits, 1..=31, "day")?),
        SpecKind::SpacePaddedDay => {
            let start = cursor.pos;
            if cursor.peek() == Some(b' ') {
                cursor.advance(1);
            }
            match cursor.number_in(max_digits, 1..=31, "day") {
                Ok(day) => fields.day = Some(day),
                Err(ParseError::Mismatch { reason, .. }) => {
                    cursor.pos = start;
                    return Err(ParseError::mismatch(start, reason));
                }
                Err(e) => return Err(e),
            }
        }
        SpecKind::Hour24 => fields.hour = Some(cursor.number_in(max_digits, 0..=23, "hour")?),
        SpecKind::Hour12 => fields.hour12 = Some(cursor.number_in(max_digits, 1..=12, "hour")?),
        SpecKind::Meridiem => {
            let (index, len) = match_name(cursor.rest(), &[&ctx.names.am_pm[..]])
                .ok_or_else(|| ParseError::mismatch(cursor.pos, "expected AM/PM marker"))?;
            cursor.advance(len);
            fields.pm = Some(index == 1);
        }
        SpecKind::Minute => fields.minute = Some(cursor.number_in(2, 0..=59, "minute")?),
        SpecKind::Second => {
            fields.second = Some(cursor.number_in(2, 0..=59, "second")?);
            fields.millis = cursor.fraction(spec.width)?;
        }
        SpecKind::Year4 => {
            let year = cursor.number(max_digits, "year")?;
            fields.year = Some(year as i32);
        }
        SpecKind::Year2 => {
            let year = cursor.number(max_digits.min(2), "year")? as i32;
            fields.year = Some(if year >= 69 { 1900 + year } else { 2000 + year });
        }
        SpecKind::EpochSeconds => fields.epoch = Some(cursor.epoch()?),
        SpecKind::ZoneName => {
            let start = cursor.pos;
            let (rule, name) = cursor.zone(ctx.tzdb)?;
            fields.zone = Some(Zone {
                rule,
                name: name.to_string(),
                offset: start,
            });
        }
        SpecKind::Offset(style) => fields.offset = Some(cursor.utc_offset(style)?),
        SpecKind::Composite(composite) => run(composite.expansion(), cursor, fields, ctx)?,
    }
    Ok(())
}

// ── Field accumulation ──────────────────────────────────────────────────────

struct Zone {
    rule: ZoneRule,
    name: String,
    offset: usize,
}

#[derive(Default)]
struct Fields {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    hour12: Option<u32>,
    pm: Option<bool>,
    minute: Option<u32>,
    second: Option<u32>,
    millis: u32,
    /// Days from Sunday.
    weekday: Option<u32>,
    offset: Option<FixedOffset>,
    zone: Option<Zone>,
    epoch: Option<i64>,
}

impl Fields {
    /// Resolve to a UTC instant whose year fits the four-digit output form.
    fn resolve(self, consumed: usize, ctx: &ParseContext<'_>) -> Result<DateTime<Utc>, ParseError> {
        let instant = self.instant(consumed, ctx)?;
        if !(0..=9999).contains(&instant.year()) {
            return Err(ParseError::mismatch(
                consumed,
                format!("year {} outside 0000-9999", instant.year()),
            ));
        }
        Ok(instant)
    }

    fn instant(self, consumed: usize, ctx: &ParseContext<'_>) -> Result<DateTime<Utc>, ParseError> {
        if let Some(seconds) = self.epoch {
            return DateTime::from_timestamp(seconds, 0)
                .ok_or_else(|| ParseError::mismatch(consumed, "epoch seconds out of range"));
        }

        let year = match self.year {
            Some(year) => year,
            None => ctx.clock.now().year(),
        };
        let month = self.month.unwrap_or(1);
        let day = self.day.unwrap_or(1);
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            ParseError::mismatch(consumed, format!("invalid date {year:04}-{month:02}-{day:02}"))
        })?;

        if let (Some(weekday), Some(_)) = (self.weekday, self.year) {
            if date.weekday().num_days_from_sunday() != weekday {
                return Err(ParseError::mismatch(
                    consumed,
                    format!("weekday does not match {date}"),
                ));
            }
        }

        let hour = match (self.hour, self.hour12, self.pm) {
            (Some(hour), _, _) => hour,
            (None, Some(hour), Some(pm)) => hour % 12 + if pm { 12 } else { 0 },
            (None, Some(hour), None) => hour,
            (None, None, _) => 0,
        };
        let time = NaiveTime::from_hms_milli_opt(
            hour,
            self.minute.unwrap_or(0),
            self.second.unwrap_or(0),
            self.millis,
        )
        .ok_or_else(|| ParseError::mismatch(consumed, "invalid time of day"))?;
        let local = NaiveDateTime::new(date, time);

        let offset = match (self.offset, &self.zone) {
            (Some(offset), _) => offset,
            (None, Some(zone)) => zone.rule.offset_for_local(&local).ok_or_else(|| {
                ParseError::AmbiguousOrUnknownZone {
                    offset: zone.offset,
                    name: zone.name.clone(),
                }
            })?,
            (None, None) => return Ok(local.and_utc()),
        };
        offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| ParseError::mismatch(consumed, "timestamp out of range"))
    }
}

// ── Cursor ──────────────────────────────────────────────────────────────────

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn advance(&mut self, len: usize) {
        self.pos += len;
    }

    /// Match literal text. A whitespace run in the literal matches one or
    /// more whitespace characters of any kind in the input.
    fn literal(&mut self, text: &str) -> Result<(), ParseError> {
        let mut expected = text.chars().peekable();
        while let Some(want) = expected.next() {
            if want.is_whitespace() {
                while expected.next_if(|c| c.is_whitespace()).is_some() {}
                let run = self.rest().len() - self.rest().trim_start().len();
                if run == 0 {
                    return Err(ParseError::mismatch(self.pos, "expected whitespace"));
                }
                self.advance(run);
                continue;
            }
            match self.rest().chars().next() {
                Some(got) if got == want => self.advance(got.len_utf8()),
                _ => {
                    return Err(ParseError::mismatch(
                        self.pos,
                        format!("expected literal '{want}'"),
                    ))
                }
            }
        }
        Ok(())
    }

    /// Read 1 to `max_digits` ASCII digits.
    fn number(&mut self, max_digits: usize, what: &str) -> Result<u32, ParseError> {
        let digits = self
            .rest()
            .bytes()
            .take(max_digits.max(1))
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return Err(ParseError::mismatch(self.pos, format!("expected {what}")));
        }
        let value = self.rest()[..digits]
            .parse::<u32>()
            .map_err(|_| ParseError::mismatch(self.pos, format!("invalid {what}")))?;
        self.advance(digits);
        Ok(value)
    }

    fn number_in(
        &mut self,
        max_digits: usize,
        range: std::ops::RangeInclusive<u32>,
        what: &str,
    ) -> Result<u32, ParseError> {
        let start = self.pos;
        let value = self.number(max_digits, what)?;
        if !range.contains(&value) {
            self.pos = start;
            return Err(ParseError::mismatch(start, format!("{what} {value} out of range")));
        }
        Ok(value)
    }

    /// Optional `.` or `,` followed by fractional digits, at most
    /// `max_digits` when bounded. Returns milliseconds, truncated.
    fn fraction(&mut self, max_digits: Option<usize>) -> Result<u32, ParseError> {
        let rest = self.rest().as_bytes();
        let has_fraction = matches!(rest.first(), Some(b'.' | b','))
            && rest.get(1).is_some_and(u8::is_ascii_digit);
        if !has_fraction || max_digits == Some(0) {
            return Ok(0);
        }

        let digits = rest[1..]
            .iter()
            .take(max_digits.unwrap_or(usize::MAX))
            .take_while(|b| b.is_ascii_digit())
            .count();
        let millis = rest[1..=digits]
            .iter()
            .chain(std::iter::repeat(&b'0'))
            .take(3)
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
        self.advance(1 + digits);
        Ok(millis)
    }

    /// Optional sign followed by decimal seconds.
    fn epoch(&mut self) -> Result<i64, ParseError> {
        let start = self.pos;
        let sign_len = usize::from(matches!(self.peek(), Some(b'+' | b'-')));
        let digits = self.rest().as_bytes()[sign_len..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits == 0 {
            return Err(ParseError::mismatch(start, "expected epoch seconds"));
        }
        let text = &self.rest()[..sign_len + digits];
        let seconds = text
            .parse::<i64>()
            .map_err(|_| ParseError::mismatch(start, "epoch seconds out of range"))?;
        self.advance(text.len());
        Ok(seconds)
    }

    /// Match a weekday or month name, full or abbreviated.
    fn name(&mut self, tables: &[&[&'static str]], style: NameStyle) -> Result<usize, ParseError> {
        let what = match style {
            NameStyle::Abbreviated => "abbreviated name",
            NameStyle::Full => "full name",
        };
        let (index, len) = match_name(self.rest(), tables)
            .ok_or_else(|| ParseError::mismatch(self.pos, format!("expected {what}")))?;
        self.advance(len);
        Ok(index)
    }

    /// A zone name: a letter followed by letters, digits, `/`, `_`, `-` or
    /// `+`. The longest run is looked up first, then shorter prefixes that
    /// end at a separator. A prefix followed by a signed number is never
    /// taken, so `Etc/GMT+5` cannot resolve as `Etc/GMT`.
    fn zone(&mut self, tzdb: &TimezoneDatabase) -> Result<(ZoneRule, &'a str), ParseError> {
        let rest = self.rest();
        if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(ParseError::mismatch(self.pos, "expected time zone name"));
        }
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '+')))
            .unwrap_or(rest.len());
        let bytes = rest.as_bytes();

        let prefixes = (1..len)
            .rev()
            .filter(|&end| matches!(bytes[end], b'/' | b'_' | b'-' | b'+'));
        for end in std::iter::once(len).chain(prefixes) {
            let signed_number = matches!(bytes.get(end), Some(b'+' | b'-'))
                && bytes.get(end + 1).is_some_and(u8::is_ascii_digit);
            if signed_number {
                continue;
            }
            let name = &rest[..end];
            if let Some(rule) = tzdb.lookup(name) {
                self.advance(end);
                return Ok((rule, name));
            }
        }
        Err(ParseError::AmbiguousOrUnknownZone {
            offset: self.pos,
            name: rest[..len].to_string(),
        })
    }

    fn two_digits(&self, at: usize) -> Option<i32> {
        let bytes = self.input.as_bytes().get(at..at + 2)?;
        if bytes.iter().all(u8::is_ascii_digit) {
            Some(i32::from(bytes[0] - b'0') * 10 + i32::from(bytes[1] - b'0'))
        } else {
            None
        }
    }

    /// `±hh[mm]`, or for the extended style `±hh[:mm]` and `Z`.
    fn utc_offset(&mut self, style: OffsetStyle) -> Result<FixedOffset, ParseError> {
        let start = self.pos;
        if style == OffsetStyle::Extended && self.peek() == Some(b'Z') {
            self.advance(1);
            return FixedOffset::east_opt(0)
                .ok_or_else(|| ParseError::mismatch(start, "invalid UTC offset"));
        }

        let (sign, mut at) = match self.peek() {
            Some(b'+') => (1, start + 1),
            Some(b'-') => (-1, start + 1),
            _ => (1, start),
        };
        let hours = self
            .two_digits(at)
            .ok_or_else(|| ParseError::mismatch(start, "expected UTC offset"))?;
        at += 2;

        let mut minutes = 0;
        let colon = style == OffsetStyle::Extended
            && self.input.as_bytes().get(at) == Some(&b':')
            && self.two_digits(at + 1).is_some();
        if colon {
            at += 1;
        }
        if let Some(mm) = self.two_digits(at) {
            minutes = mm;
            at += 2;
        }

        if hours > 23 || minutes > 59 {
            return Err(ParseError::mismatch(start, "UTC offset out of range"));
        }
        let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .ok_or_else(|| ParseError::mismatch(start, "invalid UTC offset"))?;
        self.pos = at;
        Ok(offset)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
