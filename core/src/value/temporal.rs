//! Parsing and formatting of DICOM dates (DA), times (TM) and date-times (DT).
//!
//! All temporal values are represented as `chrono::DateTime<FixedOffset>`.
//! Dates take midnight as their time of day,
//! and times take the first of January 1970 as their date.
//! Values which omit trailing components can be resolved
//! either to the earliest (floor) or the latest (ceil) instant they denote,
//! which is what range matching needs.

use crate::header::VR;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use snafu::{ensure, Backtrace, OptionExt, Snafu};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Unexpected end of value"))]
    UnexpectedEndOfValue { backtrace: Backtrace },
    #[snafu(display("Invalid number token: got '{}', but must be a digit in '0'..='9'", *value as char))]
    InvalidNumberToken { value: u8, backtrace: Backtrace },
    #[snafu(display("Unexpected trailing text `{}`", text))]
    TrailingText { text: String, backtrace: Backtrace },
    #[snafu(display("Invalid date"))]
    InvalidDate { backtrace: Backtrace },
    #[snafu(display("Invalid time"))]
    InvalidTime { backtrace: Backtrace },
    #[snafu(display("Invalid time zone offset"))]
    InvalidTimeZone { backtrace: Backtrace },
    #[snafu(display("Value representation {} is not temporal", vr))]
    NotTemporal { vr: VR, backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The last significant field of a temporal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateField {
    #[allow(missing_docs)]
    Year,
    #[allow(missing_docs)]
    Month,
    #[allow(missing_docs)]
    Day,
    #[allow(missing_docs)]
    Hour,
    #[allow(missing_docs)]
    Minute,
    #[allow(missing_docs)]
    Second,
    /// Fraction of a second, up to microseconds.
    Fraction,
}

/// The precision of a temporal value:
/// its last significant field, and whether it carries an explicit
/// time zone offset.
///
/// Parsing reports the precision found in the text,
/// and formatting emits fields up to the requested precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatePrecision {
    /// The last significant field.
    pub last_field: DateField,
    /// Whether a time zone offset is present (DT only).
    pub timezone: bool,
}

impl Default for DatePrecision {
    fn default() -> Self {
        DatePrecision {
            last_field: DateField::Fraction,
            timezone: false,
        }
    }
}

impl DatePrecision {
    /// Create a precision up to the given field, without time zone.
    pub fn new(last_field: DateField) -> Self {
        DatePrecision {
            last_field,
            timezone: false,
        }
    }
}

#[derive(Debug, Default)]
struct Fields {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
    micro: Option<u32>,
    offset: Option<FixedOffset>,
}

impl Fields {
    fn precision(&self) -> DatePrecision {
        let last_field = if self.micro.is_some() {
            DateField::Fraction
        } else if self.second.is_some() {
            DateField::Second
        } else if self.minute.is_some() {
            DateField::Minute
        } else if self.hour.is_some() {
            DateField::Hour
        } else if self.day.is_some() {
            DateField::Day
        } else if self.month.is_some() {
            DateField::Month
        } else {
            DateField::Year
        };
        DatePrecision {
            last_field,
            timezone: self.offset.is_some(),
        }
    }

    fn resolve(&self, tz: FixedOffset, ceil: bool) -> Result<DateTime<FixedOffset>> {
        let year = self.year.unwrap_or(1970);
        let month = self.month.unwrap_or(if ceil { 12 } else { 1 });
        let day = match self.day {
            Some(day) => day,
            None if ceil => last_day_of_month(year, month).context(InvalidDateSnafu)?,
            None => 1,
        };
        let date = NaiveDate::from_ymd_opt(year, month, day).context(InvalidDateSnafu)?;
        let max = |v: Option<u32>, m: u32| v.unwrap_or(if ceil { m } else { 0 });
        let time = NaiveTime::from_hms_micro_opt(
            max(self.hour, 23),
            max(self.minute, 59),
            max(self.second, 59),
            max(self.micro, 999_999),
        )
        .context(InvalidTimeSnafu)?;
        let offset = self.offset.unwrap_or(tz);
        offset
            .from_local_datetime(&NaiveDateTime::new(date, time))
            .single()
            .context(InvalidDateSnafu)
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }?;
    next.pred_opt().map(|d| d.day())
}

fn read_number(text: &[u8]) -> Result<u32> {
    ensure!(!text.is_empty(), UnexpectedEndOfValueSnafu);
    text.iter().try_fold(0u32, |acc, c| {
        ensure!(c.is_ascii_digit(), InvalidNumberTokenSnafu { value: *c });
        Ok(acc * 10 + u32::from(c - b'0'))
    })
}

/// Take a fixed-width numeric component if enough digits remain.
fn take_component<'a>(buf: &mut &'a [u8], width: usize) -> Result<Option<u32>> {
    if buf.len() < width || !buf[0].is_ascii_digit() {
        return Ok(None);
    }
    let value = read_number(&buf[..width])?;
    *buf = &buf[width..];
    Ok(Some(value))
}

fn take_fraction(buf: &mut &[u8]) -> Result<Option<u32>> {
    if buf.first() != Some(&b'.') {
        return Ok(None);
    }
    let digits = buf[1..].iter().take_while(|c| c.is_ascii_digit()).count();
    ensure!(digits > 0, UnexpectedEndOfValueSnafu);
    let used = digits.min(6);
    let mut micro = read_number(&buf[1..1 + used])?;
    for _ in used..6 {
        micro *= 10;
    }
    *buf = &buf[1 + digits..];
    Ok(Some(micro))
}

fn ensure_consumed(buf: &[u8]) -> Result<()> {
    ensure!(
        buf.is_empty(),
        TrailingTextSnafu {
            text: String::from_utf8_lossy(buf).into_owned()
        }
    );
    Ok(())
}

fn parse_date_fields(text: &str) -> Result<Fields> {
    let text = text.trim();
    // legacy form YYYY.MM.DD
    let compact;
    let mut buf = if text.len() == 10 && text.as_bytes()[4] == b'.' && text.as_bytes()[7] == b'.' {
        compact = text.replace('.', "");
        compact.as_bytes()
    } else {
        text.as_bytes()
    };
    let mut fields = Fields {
        year: Some(read_number(buf.get(..4).context(UnexpectedEndOfValueSnafu)?)? as i32),
        ..Default::default()
    };
    buf = &buf[4..];
    fields.month = take_component(&mut buf, 2)?;
    if fields.month.is_some() {
        fields.day = take_component(&mut buf, 2)?;
    }
    ensure_consumed(buf)?;
    Ok(fields)
}

fn parse_time_fields(text: &str) -> Result<Fields> {
    let text = text.trim();
    // legacy form HH:MM:SS.FFFFFF
    let compact;
    let mut buf = if text.contains(':') {
        compact = text.replace(':', "");
        compact.as_bytes()
    } else {
        text.as_bytes()
    };
    let mut fields = Fields::default();
    fields.hour = take_component(&mut buf, 2)?;
    ensure!(fields.hour.is_some(), UnexpectedEndOfValueSnafu);
    fields.minute = take_component(&mut buf, 2)?;
    if fields.minute.is_some() {
        fields.second = take_component(&mut buf, 2)?;
        if fields.second.is_some() {
            fields.micro = take_fraction(&mut buf)?;
        }
    }
    ensure_consumed(buf)?;
    Ok(fields)
}

fn parse_date_time_fields(text: &str) -> Result<Fields> {
    let text = text.trim();
    let mut buf = text.as_bytes();
    let mut fields = Fields {
        year: Some(read_number(buf.get(..4).context(UnexpectedEndOfValueSnafu)?)? as i32),
        ..Default::default()
    };
    buf = &buf[4..];
    fields.month = take_component(&mut buf, 2)?;
    if fields.month.is_some() {
        fields.day = take_component(&mut buf, 2)?;
    }
    if fields.day.is_some() {
        fields.hour = take_component(&mut buf, 2)?;
    }
    if fields.hour.is_some() {
        fields.minute = take_component(&mut buf, 2)?;
    }
    if fields.minute.is_some() {
        fields.second = take_component(&mut buf, 2)?;
    }
    if fields.second.is_some() {
        fields.micro = take_fraction(&mut buf)?;
    }
    if !buf.is_empty() {
        let offset = std::str::from_utf8(buf).ok().and_then(parse_timezone_offset);
        fields.offset = Some(offset.context(InvalidTimeZoneSnafu)?);
    }
    Ok(fields)
}

/// Parse a date (DA) in the given time zone.
///
/// The legacy form `YYYY.MM.DD` is also accepted.
pub fn parse_da(text: &str, tz: FixedOffset, ceil: bool) -> Result<(DateTime<FixedOffset>, DatePrecision)> {
    let fields = parse_date_fields(text)?;
    Ok((fields.resolve(tz, ceil)?, fields.precision()))
}

/// Parse a time (TM) in the given time zone.
///
/// The legacy form `HH:MM:SS.FFFFFF` is also accepted.
pub fn parse_tm(text: &str, tz: FixedOffset, ceil: bool) -> Result<(DateTime<FixedOffset>, DatePrecision)> {
    let fields = parse_time_fields(text)?;
    Ok((fields.resolve(tz, ceil)?, fields.precision()))
}

/// Parse a date-time (DT).
///
/// An explicit UTC offset suffix takes precedence over the given time zone.
pub fn parse_dt(text: &str, tz: FixedOffset, ceil: bool) -> Result<(DateTime<FixedOffset>, DatePrecision)> {
    let fields = parse_date_time_fields(text)?;
    Ok((fields.resolve(tz, ceil)?, fields.precision()))
}

/// Parse a temporal value according to its value representation.
pub fn parse_temporal(
    vr: VR,
    text: &str,
    tz: FixedOffset,
    ceil: bool,
) -> Result<(DateTime<FixedOffset>, DatePrecision)> {
    match vr {
        VR::DA => parse_da(text, tz, ceil),
        VR::TM => parse_tm(text, tz, ceil),
        VR::DT => parse_dt(text, tz, ceil),
        _ => NotTemporalSnafu { vr }.fail(),
    }
}

/// Format a date (DA) as `YYYYMMDD`.
pub fn format_da(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%Y%m%d").to_string()
}

/// Format a time (TM) up to the given precision.
pub fn format_tm(dt: &DateTime<FixedOffset>, precision: DatePrecision) -> String {
    let mut out = format!("{:02}", dt.hour());
    if precision.last_field >= DateField::Minute {
        out.push_str(&format!("{:02}", dt.minute()));
    }
    if precision.last_field >= DateField::Second {
        out.push_str(&format!("{:02}", dt.second()));
    }
    if precision.last_field >= DateField::Fraction {
        out.push_str(&format!(".{:06}", dt.nanosecond() / 1_000 % 1_000_000));
    }
    out
}

/// Format a date-time (DT) up to the given precision,
/// with a UTC offset suffix if the precision asks for one.
pub fn format_dt(dt: &DateTime<FixedOffset>, precision: DatePrecision) -> String {
    let mut out = format!("{:04}", dt.year());
    if precision.last_field >= DateField::Month {
        out.push_str(&format!("{:02}", dt.month()));
    }
    if precision.last_field >= DateField::Day {
        out.push_str(&format!("{:02}", dt.day()));
    }
    if precision.last_field >= DateField::Hour {
        out.push_str(&format_tm(dt, precision));
    }
    if precision.timezone {
        out.push_str(&format_timezone_offset(*dt.offset()));
    }
    out
}

/// Format a temporal value according to its value representation.
pub fn format_temporal(vr: VR, dt: &DateTime<FixedOffset>, precision: DatePrecision) -> Option<String> {
    match vr {
        VR::DA => Some(format_da(dt)),
        VR::TM => Some(format_tm(dt, precision)),
        VR::DT => Some(format_dt(dt, precision)),
        _ => None,
    }
}

/// Parse a UTC offset of the form `+HHMM` or `-HHMM`.
pub fn parse_timezone_offset(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    let bytes = text.as_bytes();
    if bytes.len() != 5 {
        return None;
    }
    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours = read_number(&bytes[1..3]).ok()?;
    let minutes = read_number(&bytes[3..5]).ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60) as i32)
}

/// Format a UTC offset as `+HHMM` or `-HHMM`.
pub fn format_timezone_offset(offset: FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let secs = secs.abs();
    format!("{}{:02}{:02}", sign, secs / 3600, secs / 60 % 60)
}

/// Combine the date of one value with the time of day of another,
/// keeping the offset of the date.
pub fn combine_date_time(
    date: &DateTime<FixedOffset>,
    time: &DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    let ndt = NaiveDateTime::new(date.date_naive(), time.time());
    date.offset().from_local_datetime(&ndt).single()
}
