//! core::timefmt
//!
//! Time expressions, zones, durations and date ranges.
//!
//! # Instants
//!
//! Flags that take an instant accept, interpreted in the configured zone:
//!
//! - `now`
//! - `HH:MM` or `HH:MM:SS` (today)
//! - `yesterday HH:MM` / `today HH:MM`
//! - `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` (a `T` separator also works)
//! - RFC 3339 (`2024-03-01T09:00:00Z`)
//! - offsets from now: `+15m`, `-1h30m`, `-45s`
//!
//! # Wire Formats
//!
//! Instants are sent as `YYYY-MM-DDTHH:MM:SSZ` in UTC and durations as
//! ISO 8601 (`PT1H30M`).
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use clockify_cli::core::timefmt::{parse_instant, Zone};
//!
//! let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
//! let start = parse_instant("09:30", now, &Zone::Utc).unwrap();
//! assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap());
//!
//! let earlier = parse_instant("-1h30m", now, &Zone::Utc).unwrap();
//! assert_eq!(earlier, Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap());
//! ```

use std::sync::OnceLock;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc, Weekday,
};
use regex::Regex;
use thiserror::Error;

/// Errors from parsing time expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("could not parse \"{0}\" as a date or time")]
    InvalidInstant(String),

    #[error("could not parse \"{0}\" as a duration")]
    InvalidDuration(String),

    #[error("unknown time zone \"{0}\" (use Local, UTC or an offset like +02:00)")]
    InvalidZone(String),

    #[error("unknown range \"{0}\"")]
    InvalidRange(String),

    #[error("\"{0}\" does not exist in the configured time zone")]
    NonexistentLocalTime(String),
}

/// The zone used to interpret wall-clock input and to split days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// The system's local zone.
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl Zone {
    /// Parse `Local`, `UTC`/`Z`, or a fixed offset (`+02:00`, `-0530`).
    pub fn parse(value: &str) -> Result<Self, TimeError> {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "local" => return Ok(Zone::Local),
            "utc" | "z" | "etc/utc" | "gmt" => return Ok(Zone::Utc),
            _ => {}
        }

        let re = offset_regex();
        let caps = re
            .captures(trimmed)
            .ok_or_else(|| TimeError::InvalidZone(value.to_string()))?;
        let sign = if &caps[1] == "-" { -1 } else { 1 };
        let hours: i32 = caps[2].parse().map_err(|_| TimeError::InvalidZone(value.into()))?;
        let minutes: i32 = caps
            .get(3)
            .map(|m| m.as_str().parse().unwrap_or(0))
            .unwrap_or(0);
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Zone::Fixed)
            .ok_or_else(|| TimeError::InvalidZone(value.to_string()))
    }

    /// Convert a wall-clock time in this zone to UTC.
    ///
    /// Ambiguous local times (DST fall-back) resolve to the earlier instant.
    pub fn to_utc(&self, naive: NaiveDateTime) -> Result<DateTime<Utc>, TimeError> {
        let resolved = match self {
            Zone::Utc => Some(Utc.from_utc_datetime(&naive)),
            Zone::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            Zone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        };
        resolved.ok_or_else(|| TimeError::NonexistentLocalTime(naive.to_string()))
    }

    /// Wall-clock time in this zone for a UTC instant.
    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Zone::Utc => instant.naive_utc(),
            Zone::Fixed(offset) => instant.with_timezone(offset).naive_local(),
            Zone::Local => instant.with_timezone(&Local).naive_local(),
        }
    }

    /// The calendar date of `instant` in this zone.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_local(instant).date()
    }

    /// `[start, end)` in UTC covering the whole calendar `date` in this zone.
    pub fn day_bounds(&self, date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), TimeError> {
        let start = self.to_utc(date.and_time(NaiveTime::MIN))?;
        let next = date
            .succ_opt()
            .ok_or_else(|| TimeError::InvalidInstant(date.to_string()))?;
        let end = self.to_utc(next.and_time(NaiveTime::MIN))?;
        Ok((start, end))
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Zone::Local => write!(f, "Local"),
            Zone::Utc => write!(f, "UTC"),
            Zone::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

fn offset_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:UTC|GMT)?([+-])(\d{1,2})(?::?(\d{2}))?$").unwrap_or_else(|_| unreachable!())
    })
}

fn relative_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([+-])\s*(?:(\d+)h)?\s*(?:(\d+)m)?\s*(?:(\d+)s)?$")
            .unwrap_or_else(|_| unreachable!())
    })
}

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];
const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

fn parse_time_of_day(input: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(input, fmt).ok())
}

/// Parse an instant expression relative to `now`.
///
/// # Errors
///
/// Returns [`TimeError::InvalidInstant`] when no accepted form matches.
pub fn parse_instant(input: &str, now: DateTime<Utc>, zone: &Zone) -> Result<DateTime<Utc>, TimeError> {
    let value = input.trim();
    if value.eq_ignore_ascii_case("now") {
        return Ok(now);
    }

    if let Some(offset) = parse_relative(value) {
        return Ok(now + offset);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let today = zone.date_of(now);
    let lower = value.to_ascii_lowercase();
    for (prefix, date) in [
        ("yesterday", today.pred_opt()),
        ("today", Some(today)),
    ] {
        if let Some(rest) = lower.strip_prefix(prefix) {
            let date = date.ok_or_else(|| TimeError::InvalidInstant(input.to_string()))?;
            let rest = rest.trim();
            let time = if rest.is_empty() {
                Some(NaiveTime::MIN)
            } else {
                parse_time_of_day(rest)
            };
            return match time {
                Some(t) => zone.to_utc(date.and_time(t)),
                None => Err(TimeError::InvalidInstant(input.to_string())),
            };
        }
    }

    if let Some(time) = parse_time_of_day(value) {
        return zone.to_utc(today.and_time(time));
    }

    if let Some(naive) = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return zone.to_utc(naive);
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return zone.to_utc(date.and_time(NaiveTime::MIN));
    }

    Err(TimeError::InvalidInstant(input.to_string()))
}

/// Parse `+1h30m` / `-15m` style offsets. Returns `None` when not relative.
fn parse_relative(value: &str) -> Option<Duration> {
    let caps = relative_regex().captures(value)?;
    if caps.get(2).is_none() && caps.get(3).is_none() && caps.get(4).is_none() {
        return None;
    }
    let part = |i: usize| -> i64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0)
    };
    let total = Duration::hours(part(2)) + Duration::minutes(part(3)) + Duration::seconds(part(4));
    Some(if &caps[1] == "-" { -total } else { total })
}

/// Parse a calendar date (`YYYY-MM-DD`, `today`, `yesterday`).
pub fn parse_date(input: &str, now: DateTime<Utc>, zone: &Zone) -> Result<NaiveDate, TimeError> {
    let value = input.trim();
    let today = zone.date_of(now);
    match value.to_ascii_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => today
            .pred_opt()
            .ok_or_else(|| TimeError::InvalidInstant(input.to_string())),
        _ => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| TimeError::InvalidInstant(input.to_string())),
    }
}

/// Format an instant the way the service expects it.
pub fn api_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Render a duration as `H:MM:SS`. Negative durations render with a `-`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    format!(
        "{sign}{}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Render a duration as ISO 8601 (`PT1H30M`).
pub fn to_iso_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if total == 0 {
        return "PT0S".to_string();
    }
    let mut out = String::from("PT");
    if h > 0 {
        out.push_str(&format!("{h}H"));
    }
    if m > 0 {
        out.push_str(&format!("{m}M"));
    }
    if s > 0 {
        out.push_str(&format!("{s}S"));
    }
    out
}

/// Parse an ISO 8601 time duration (`PT2H`, `PT1H30M15S`).
pub fn parse_iso_duration(input: &str) -> Result<Duration, TimeError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
            .unwrap_or_else(|_| unreachable!())
    });
    let value = input.trim().to_ascii_uppercase();
    let caps = re
        .captures(&value)
        .filter(|c| (1..=4).any(|i| c.get(i).is_some()))
        .ok_or_else(|| TimeError::InvalidDuration(input.to_string()))?;
    let part = |i: usize| -> i64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0)
    };
    Ok(Duration::days(part(1))
        + Duration::hours(part(2))
        + Duration::minutes(part(3))
        + Duration::seconds(part(4)))
}

/// Parse a user-entered duration: `1h30m`, `90m`, `1:30`, or ISO 8601.
pub fn parse_duration(input: &str) -> Result<Duration, TimeError> {
    let value = input.trim();
    if value.to_ascii_uppercase().starts_with('P') {
        return parse_iso_duration(value);
    }
    if let Some((h, m)) = value.split_once(':') {
        let hours: i64 = h.parse().map_err(|_| TimeError::InvalidDuration(input.into()))?;
        let minutes: i64 = m.parse().map_err(|_| TimeError::InvalidDuration(input.into()))?;
        return Ok(Duration::hours(hours) + Duration::minutes(minutes));
    }
    parse_relative(&format!("+{value}")).ok_or_else(|| TimeError::InvalidDuration(input.to_string()))
}

// --------------------------------------------------------------------------
// Date ranges
// --------------------------------------------------------------------------

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateRange {
    pub fn single(day: NaiveDate) -> Self {
        Self { first: day, last: day }
    }

    /// Every day in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last;
        self.first.iter_days().take_while(move |d| *d <= last)
    }

    /// `[start, end)` instants in UTC for the range in `zone`.
    pub fn bounds(&self, zone: &Zone) -> Result<(DateTime<Utc>, DateTime<Utc>), TimeError> {
        let (start, _) = zone.day_bounds(self.first)?;
        let (_, end) = zone.day_bounds(self.last)?;
        Ok((start, end))
    }
}

/// Names accepted by [`named_range`], in help order.
pub const RANGE_NAMES: [&str; 7] = [
    "today",
    "yesterday",
    "this-week",
    "last-week",
    "this-month",
    "last-month",
    "last-week-day",
];

fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Resolve a named range relative to `today`.
///
/// Weeks start on Monday. `last-week-day` is the most recent day before
/// `today` that falls on one of `workweek` (any weekday when empty).
pub fn named_range(name: &str, today: NaiveDate, workweek: &[Weekday]) -> Result<DateRange, TimeError> {
    let range = match name {
        "today" => DateRange::single(today),
        "yesterday" => DateRange::single(today - Duration::days(1)),
        "this-week" => DateRange {
            first: week_start(today),
            last: week_start(today) + Duration::days(6),
        },
        "last-week" => {
            let first = week_start(today) - Duration::days(7);
            DateRange {
                first,
                last: first + Duration::days(6),
            }
        }
        "this-month" => {
            let first = month_start(today);
            let next = first
                .checked_add_months(chrono::Months::new(1))
                .ok_or_else(|| TimeError::InvalidRange(name.to_string()))?;
            DateRange {
                first,
                last: next - Duration::days(1),
            }
        }
        "last-month" => {
            let this_first = month_start(today);
            let first = this_first
                .checked_sub_months(chrono::Months::new(1))
                .ok_or_else(|| TimeError::InvalidRange(name.to_string()))?;
            DateRange {
                first,
                last: this_first - Duration::days(1),
            }
        }
        "last-week-day" => {
            let mut day = today - Duration::days(1);
            if !workweek.is_empty() {
                while !workweek.contains(&day.weekday()) {
                    day -= Duration::days(1);
                }
            }
            DateRange::single(day)
        }
        _ => return Err(TimeError::InvalidRange(name.to_string())),
    };
    Ok(range)
}

/// Parse a weekday name (`monday`, `mon`).
pub fn parse_weekday(value: &str) -> Result<Weekday, TimeError> {
    value
        .trim()
        .parse::<Weekday>()
        .map_err(|_| TimeError::InvalidRange(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod instants {
        use super::*;

        #[test]
        fn now_and_relative() {
            assert_eq!(parse_instant("now", noon(), &Zone::Utc).unwrap(), noon());
            assert_eq!(
                parse_instant("+15m", noon(), &Zone::Utc).unwrap(),
                noon() + Duration::minutes(15)
            );
            assert_eq!(
                parse_instant("-1h30m", noon(), &Zone::Utc).unwrap(),
                noon() - Duration::minutes(90)
            );
        }

        #[test]
        fn time_of_day_uses_zone() {
            let zone = Zone::parse("+02:00").unwrap();
            let got = parse_instant("09:00", noon(), &zone).unwrap();
            assert_eq!(got, Utc.with_ymd_and_hms(2024, 3, 6, 7, 0, 0).unwrap());
        }

        #[test]
        fn yesterday_with_time() {
            let got = parse_instant("yesterday 17:45", noon(), &Zone::Utc).unwrap();
            assert_eq!(got, Utc.with_ymd_and_hms(2024, 3, 5, 17, 45, 0).unwrap());
        }

        #[test]
        fn full_date_time_and_rfc3339() {
            let got = parse_instant("2024-01-02 08:15", noon(), &Zone::Utc).unwrap();
            assert_eq!(got, Utc.with_ymd_and_hms(2024, 1, 2, 8, 15, 0).unwrap());
            let got = parse_instant("2024-01-02T08:15:00+01:00", noon(), &Zone::Utc).unwrap();
            assert_eq!(got, Utc.with_ymd_and_hms(2024, 1, 2, 7, 15, 0).unwrap());
        }

        #[test]
        fn garbage_is_rejected() {
            assert!(matches!(
                parse_instant("soonish", noon(), &Zone::Utc),
                Err(TimeError::InvalidInstant(_))
            ));
            assert!(parse_instant("+", noon(), &Zone::Utc).is_err());
        }

        #[test]
        fn api_timestamp_has_no_fraction() {
            let t = Utc.with_ymd_and_hms(2024, 3, 6, 7, 5, 9).unwrap();
            assert_eq!(api_timestamp(t), "2024-03-06T07:05:09Z");
        }
    }

    mod zones {
        use super::*;

        #[test]
        fn parses_names_and_offsets() {
            assert_eq!(Zone::parse("Local").unwrap(), Zone::Local);
            assert_eq!(Zone::parse("utc").unwrap(), Zone::Utc);
            assert_eq!(
                Zone::parse("-0530").unwrap(),
                Zone::Fixed(FixedOffset::west_opt(5 * 3600 + 1800).unwrap())
            );
            assert!(Zone::parse("Mars/Olympus").is_err());
        }

        #[test]
        fn day_bounds_follow_offset() {
            let zone = Zone::parse("+03:00").unwrap();
            let (start, end) = zone.day_bounds(date(2024, 3, 6)).unwrap();
            assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 5, 21, 0, 0).unwrap());
            assert_eq!(end - start, Duration::hours(24));
        }
    }

    mod durations {
        use super::*;

        #[test]
        fn formats_hms() {
            assert_eq!(format_duration(Duration::seconds(3725)), "1:02:05");
            assert_eq!(format_duration(Duration::seconds(-60)), "-0:01:00");
        }

        #[test]
        fn iso_round_trip_values() {
            assert_eq!(to_iso_duration(Duration::minutes(90)), "PT1H30M");
            assert_eq!(to_iso_duration(Duration::zero()), "PT0S");
            assert_eq!(parse_iso_duration("PT2H").unwrap(), Duration::hours(2));
            assert!(parse_iso_duration("PT").is_err());
        }

        #[test]
        fn user_durations() {
            assert_eq!(parse_duration("1:30").unwrap(), Duration::minutes(90));
            assert_eq!(parse_duration("2h").unwrap(), Duration::hours(2));
            assert_eq!(parse_duration("PT45M").unwrap(), Duration::minutes(45));
            assert!(parse_duration("lots").is_err());
        }
    }

    mod ranges {
        use super::*;

        #[test]
        fn weeks_start_monday() {
            // 2024-03-06 is a Wednesday
            let r = named_range("this-week", date(2024, 3, 6), &[]).unwrap();
            assert_eq!(r.first, date(2024, 3, 4));
            assert_eq!(r.last, date(2024, 3, 10));
            let r = named_range("last-week", date(2024, 3, 6), &[]).unwrap();
            assert_eq!(r.first, date(2024, 2, 26));
        }

        #[test]
        fn months() {
            let r = named_range("last-month", date(2024, 3, 6), &[]).unwrap();
            assert_eq!(r.first, date(2024, 2, 1));
            assert_eq!(r.last, date(2024, 2, 29));
            let r = named_range("this-month", date(2024, 2, 10), &[]).unwrap();
            assert_eq!(r.last, date(2024, 2, 29));
        }

        #[test]
        fn last_week_day_skips_weekend() {
            let workweek = [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ];
            // Monday 2024-03-04 -> previous Friday
            let r = named_range("last-week-day", date(2024, 3, 4), &workweek).unwrap();
            assert_eq!(r.first, date(2024, 3, 1));
        }

        #[test]
        fn range_days_inclusive() {
            let r = DateRange {
                first: date(2024, 3, 1),
                last: date(2024, 3, 3),
            };
            assert_eq!(r.days().count(), 3);
        }

        #[test]
        fn unknown_range() {
            assert!(named_range("fortnight", date(2024, 3, 6), &[]).is_err());
        }
    }
}
