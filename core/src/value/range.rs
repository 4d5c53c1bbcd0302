//! Handling of date, time and date-time ranges, as used in range matching
//! and in range-valued query keys (`<start>-<end>`).

use crate::header::VR;
use crate::value::temporal::{self, format_temporal, parse_temporal, DatePrecision};
use chrono::{DateTime, FixedOffset};
use snafu::{ensure, Backtrace, ResultExt, Snafu};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Failed to parse range bound"))]
    Parse {
        #[snafu(backtrace)]
        source: temporal::Error,
    },
    #[snafu(display("End {} is before start {}", end, start))]
    RangeInversion {
        start: String,
        end: String,
        backtrace: Backtrace,
    },
    #[snafu(display("No valid range separator in `{}`", text))]
    NoRangeSeparator { text: String, backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A range of instants with optional bounds.
/// `None` means no lower or upper bound.
///
/// Bounds are inclusive. A single temporal value denotes
/// the range from the earliest to the latest instant it covers,
/// so that `20200131` spans the whole day.
///
/// ```
/// # use chrono::FixedOffset;
/// # use dicom_attrs_core::{VR, value::DateRange};
/// let utc = FixedOffset::east_opt(0).unwrap();
/// let range = DateRange::parse(VR::DA, "-20200131", utc).unwrap();
/// assert!(range.start().is_none());
/// assert_eq!(range.end().unwrap().to_rfc3339(), "2020-01-31T23:59:59.999999+00:00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    start: Option<DateTime<FixedOffset>>,
    end: Option<DateTime<FixedOffset>>,
}

impl DateRange {
    /// Create a range from two optional bounds.
    /// Fails if both bounds are present and the end precedes the start.
    pub fn new(
        start: Option<DateTime<FixedOffset>>,
        end: Option<DateTime<FixedOffset>>,
    ) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            ensure!(
                s <= e,
                RangeInversionSnafu {
                    start: s.to_rfc3339(),
                    end: e.to_rfc3339()
                }
            );
        }
        Ok(DateRange { start, end })
    }

    /// Create a range with a lower bound only.
    pub fn from_start(start: DateTime<FixedOffset>) -> Self {
        DateRange {
            start: Some(start),
            end: None,
        }
    }

    /// Create a range with an upper bound only.
    pub fn from_end(end: DateTime<FixedOffset>) -> Self {
        DateRange {
            start: None,
            end: Some(end),
        }
    }

    /// The lower bound, if any.
    pub fn start(&self) -> Option<&DateTime<FixedOffset>> {
        self.start.as_ref()
    }

    /// The upper bound, if any.
    pub fn end(&self) -> Option<&DateTime<FixedOffset>> {
        self.end.as_ref()
    }

    /// Whether the range has neither bound.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether the given instant falls within this range.
    pub fn contains(&self, dt: &DateTime<FixedOffset>) -> bool {
        self.start.map_or(true, |s| s <= *dt) && self.end.map_or(true, |e| *dt <= e)
    }

    /// Whether this range shares at least one instant with another.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        let starts_before_other_ends = match (self.start, other.end) {
            (Some(s), Some(e)) => s <= e,
            _ => true,
        };
        let ends_after_other_starts = match (self.end, other.start) {
            (Some(e), Some(s)) => s <= e,
            _ => true,
        };
        starts_before_other_ends && ends_after_other_starts
    }

    /// Parse a range or a single value of the given temporal VR.
    ///
    /// Date-times may carry negative UTC offsets,
    /// so the separator is the first `-` which splits the text
    /// into two parsable bounds.
    pub fn parse(vr: VR, text: &str, tz: FixedOffset) -> Result<Self> {
        let text = text.trim();
        if !text.contains('-') || (vr == VR::DT && parse_temporal(vr, text, tz, false).is_ok()) {
            let (start, _) = parse_temporal(vr, text, tz, false).context(ParseSnafu)?;
            let (end, _) = parse_temporal(vr, text, tz, true).context(ParseSnafu)?;
            return DateRange::new(Some(start), Some(end));
        }
        let mut last_error = None;
        for (pos, _) in text.match_indices('-') {
            let (left, right) = (&text[..pos], &text[pos + 1..]);
            let start = if left.is_empty() {
                Ok(None)
            } else {
                parse_temporal(vr, left, tz, false).map(|(dt, _)| Some(dt))
            };
            let end = if right.is_empty() {
                Ok(None)
            } else {
                parse_temporal(vr, right, tz, true).map(|(dt, _)| Some(dt))
            };
            match (start, end) {
                (Ok(start), Ok(end)) => return DateRange::new(start, end),
                (Err(e), _) | (_, Err(e)) => last_error = Some(e),
            }
        }
        match last_error {
            Some(e) => Err(e).context(ParseSnafu),
            None => NoRangeSeparatorSnafu { text }.fail(),
        }
    }

    /// Format this range as a DICOM range string for the given VR.
    pub fn to_dicom_string(&self, vr: VR, precision: DatePrecision) -> String {
        let fmt = |dt: &Option<DateTime<FixedOffset>>| {
            dt.as_ref()
                .and_then(|dt| format_temporal(vr, dt, precision))
                .unwrap_or_default()
        };
        let (start, end) = (fmt(&self.start), fmt(&self.end));
        if start == end {
            start
        } else {
            format!("{}-{}", start, end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::temporal::DateField;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn date_range_day_boundaries() {
        let range = DateRange::parse(VR::DA, "20200101-20200131", utc()).unwrap();
        assert_eq!(range.start().unwrap().to_rfc3339(), "2020-01-01T00:00:00+00:00");
        assert_eq!(
            range.end().unwrap().to_rfc3339(),
            "2020-01-31T23:59:59.999999+00:00"
        );
    }

    #[test]
    fn open_ended_ranges() {
        let range = DateRange::parse(VR::DA, "-20200131", utc()).unwrap();
        assert!(range.start().is_none());
        assert!(range.end().is_some());
        let range = DateRange::parse(VR::TM, "1200-", utc()).unwrap();
        assert!(range.start().is_some());
        assert!(range.end().is_none());
    }

    #[test]
    fn single_value_spans_its_precision() {
        let range = DateRange::parse(VR::DA, "20200115", utc()).unwrap();
        let noon = parse_temporal(VR::DT, "20200115120000", utc(), false).unwrap().0;
        assert!(range.contains(&noon));
    }

    #[test]
    fn date_time_range_with_negative_offsets() {
        let range = DateRange::parse(VR::DT, "20200101-0500-20200102-0500", utc()).unwrap();
        assert_eq!(range.start().unwrap().offset().local_minus_utc(), -5 * 3600);
        assert_eq!(range.end().unwrap().to_rfc3339(), "2020-01-02T23:59:59.999999-05:00");
    }

    #[test]
    fn inverted_range_fails() {
        assert!(matches!(
            DateRange::parse(VR::DA, "20200201-20200101", utc()),
            Err(Error::RangeInversion { .. })
        ));
    }

    #[test]
    fn format_range() {
        let range = DateRange::parse(VR::DA, "20200101-20200131", utc()).unwrap();
        let precision = DatePrecision::new(DateField::Day);
        assert_eq!(range.to_dicom_string(VR::DA, precision), "20200101-20200131");
        let open = DateRange::parse(VR::DA, "-20200131", utc()).unwrap();
        assert_eq!(open.to_dicom_string(VR::DA, precision), "-20200131");
    }

    #[test]
    fn overlapping_ranges() {
        let a = DateRange::parse(VR::DA, "20200101-20200131", utc()).unwrap();
        let b = DateRange::parse(VR::DA, "20200131-", utc()).unwrap();
        let c = DateRange::parse(VR::DA, "-20191231", utc()).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
