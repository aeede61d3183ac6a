//! Field parsers for calendar rows: day-first dates, quarter labels and attendee domains.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Email-like tokens inside free-text attendee lists. Tolerates the separators
/// Outlook uses (`;`, `,`, spaces, angle brackets) because they fall outside the class.
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.-]+@[\w.-]+").expect("email pattern is valid"));

/// Numeric dates with `/`, `-` or `.` separators and an optional time of day
static NUMERIC_DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{1,2})[/.-](\d{1,2})[/.-](\d{4}|\d{2})(?:[ T]+(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\.\d+)?\s*([AaPp][Mm])?)?$",
    )
    .expect("numeric date pattern is valid")
});

const ISO_DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const ISO_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

const NAMED_MONTH_DATETIME_FORMATS: [&str; 4] = [
    "%d %b %Y %H:%M",
    "%d %B %Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
];

const NAMED_MONTH_DATE_FORMATS: [&str; 8] = [
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%d-%B-%Y",
    "%a %d %b %Y",
    "%A %d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Parse a calendar date, reading ambiguous numeric dates day-first.
///
/// Returns `None` for blank or unrecognised input instead of failing, so a bad
/// cell never drops its row. When the day-first reading is impossible
/// (`12/25/2024`) the month-first reading is used.
pub fn parse_day_first(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(parsed) = parse_iso(value) {
        return Some(parsed);
    }

    if let Some(parsed) = parse_numeric(value) {
        return Some(parsed);
    }

    parse_named_month(value)
}

fn parse_iso(value: &str) -> Option<NaiveDateTime> {
    // Year-first only; otherwise "01/02/24" would read as year 1
    if !value.get(..4).is_some_and(|y| y.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    ISO_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            ISO_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(midnight)
        })
}

fn parse_numeric(value: &str) -> Option<NaiveDateTime> {
    let caps = NUMERIC_DATE_PATTERN.captures(value)?;
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let year = expand_year(&caps[3])?;

    let date = NaiveDate::from_ymd_opt(year, second, first)
        .or_else(|| NaiveDate::from_ymd_opt(year, first, second))?;

    let time = match caps.get(4) {
        Some(hour) => {
            let mut hour: u32 = hour.as_str().parse().ok()?;
            let minute: u32 = caps[5].parse().ok()?;
            let second: u32 = caps.get(6).map_or(Some(0), |s| s.as_str().parse().ok())?;
            if let Some(meridiem) = caps.get(7) {
                let pm = meridiem.as_str().eq_ignore_ascii_case("pm");
                hour = match (hour, pm) {
                    (12, false) => 0,
                    (h, true) if h < 12 => h + 12,
                    (h, _) => h,
                };
            }
            NaiveTime::from_hms_opt(hour, minute, second)?
        }
        None => NaiveTime::MIN,
    };

    Some(date.and_time(time))
}

/// Two-digit years follow the POSIX `%y` pivot: 69-99 → 19xx, 00-68 → 20xx
fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    if raw.len() == 2 {
        Some(if year >= 69 { 1900 + year } else { 2000 + year })
    } else {
        Some(year)
    }
}

fn parse_named_month(value: &str) -> Option<NaiveDateTime> {
    let normalized = value.replace(',', " ");
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

    NAMED_MONTH_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
        .or_else(|| {
            NAMED_MONTH_DATE_FORMATS
                .iter()
                .find_map(|fmt| {
                    NaiveDate::parse_from_str(&normalized, fmt)
                        .or_else(|_| NaiveDate::parse_from_str(value, fmt))
                        .ok()
                })
                .map(midnight)
        })
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Calendar quarter of a date, displayed as `2024Q1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quarter {
    pub year: i32,
    pub quarter: u32,
}

impl Quarter {
    pub fn from_date<D: Datelike>(date: &D) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

/// Extract lowercase email domains from a free-text attendee list, in order of appearance.
/// Missing or empty text yields an empty list.
pub fn extract_domains(attendees: Option<&str>) -> Vec<String> {
    let Some(text) = attendees else {
        return Vec::new();
    };

    EMAIL_PATTERN
        .find_iter(text)
        .filter_map(|m| m.as_str().split('@').nth(1))
        .map(str::to_lowercase)
        .collect()
}
