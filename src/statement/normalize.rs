//! Locale-aware amount and date normalization
//!
//! Nothing in here returns an error. A malformed value in one row of a
//! statement must not stop the rest from being ingested, so absence of a
//! usable value is always reported through a sentinel: `0` for amounts and
//! `None` for dates.

use bigdecimal::BigDecimal;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Offset between the Thai Buddhist era and the Gregorian calendar
pub const BUDDHIST_ERA_OFFSET: i32 = 543;

/// Years above this are taken to be Buddhist-era years
const BUDDHIST_YEAR_THRESHOLD: i32 = 2400;

/// Currency markers stripped before parsing an amount
const CURRENCY_GLYPHS: [&str; 4] = ["฿", "THB", "thb", "บาท"];

/// Order of the day, month and year components in a date string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateFormat {
    /// `31/12/2024`, `31-12-67`, `31.12.2567`
    #[default]
    #[serde(rename = "DD/MM/YYYY", alias = "DMY", alias = "DD-MM-YYYY", alias = "DD.MM.YYYY")]
    DayMonthYear,
    /// `12/31/2024`
    #[serde(rename = "MM/DD/YYYY", alias = "MDY", alias = "MM-DD-YYYY", alias = "MM.DD.YYYY")]
    MonthDayYear,
    /// `2024-12-31`
    #[serde(rename = "YYYY-MM-DD", alias = "YMD", alias = "YYYY/MM/DD", alias = "YYYY.MM.DD")]
    YearMonthDay,
}

impl FromStr for DateFormat {
    type Err = String;

    /// Accepts patterns such as `DD/MM/YYYY`, `mm-dd-yy` or `YYYY.MM.DD`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let letters: String = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match letters.as_str() {
            "DDMMYYYY" | "DDMMYY" | "DMY" => Ok(DateFormat::DayMonthYear),
            "MMDDYYYY" | "MMDDYY" | "MDY" => Ok(DateFormat::MonthDayYear),
            "YYYYMMDD" | "YYMMDD" | "YMD" => Ok(DateFormat::YearMonthDay),
            _ => Err(format!("unsupported date format '{s}'")),
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pattern = match self {
            DateFormat::DayMonthYear => "DD/MM/YYYY",
            DateFormat::MonthDayYear => "MM/DD/YYYY",
            DateFormat::YearMonthDay => "YYYY-MM-DD",
        };
        f.write_str(pattern)
    }
}

/// Parse a Thai- or western-formatted amount string
///
/// Thousands separators, whitespace and currency markers are removed.
/// A leading `-`, a trailing `-` or accounting parentheses mark a negative
/// value. Empty or unparseable input yields zero, which callers must read as
/// "no amount" rather than a legitimate zero.
pub fn parse_amount(raw: &str) -> BigDecimal {
    let mut cleaned = raw.to_string();
    for glyph in CURRENCY_GLYPHS {
        cleaned = cleaned.replace(glyph, "");
    }
    cleaned.retain(|c| !c.is_whitespace() && !matches!(c, ',' | '"' | '\''));

    let (negative, body) = if let Some(inner) = cleaned
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
    {
        (true, inner)
    } else if let Some(inner) = cleaned.strip_suffix('-') {
        (true, inner)
    } else {
        (false, cleaned.as_str())
    };

    match BigDecimal::from_str(body) {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) => BigDecimal::from(0),
    }
}

/// [`parse_amount`] for cells that may be missing entirely
pub fn parse_amount_opt(raw: Option<&str>) -> BigDecimal {
    raw.map(parse_amount).unwrap_or_else(|| BigDecimal::from(0))
}

/// Parse a date string in the given component order
///
/// `/`, `-` and `.` are all accepted as separators and any trailing time
/// component is ignored. Two-digit years are expanded into the era selected by
/// `use_buddhist_year`. With `use_buddhist_year`, years above 2400 are
/// converted from the Buddhist era. Returns `None` on any unparseable
/// component.
pub fn parse_date(raw: &str, format: DateFormat, use_buddhist_year: bool) -> Option<NaiveDate> {
    let token = raw
        .trim()
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()?;
    let parts: Vec<&str> = token
        .split(|c: char| matches!(c, '/' | '-' | '.'))
        .collect();
    if parts.len() != 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }

    let (year, month, day) = match format {
        DateFormat::DayMonthYear => (parts[2], parts[1], parts[0]),
        DateFormat::MonthDayYear => (parts[2], parts[0], parts[1]),
        DateFormat::YearMonthDay => (parts[0], parts[1], parts[2]),
    };
    if month.len() > 2 || day.len() > 2 {
        return None;
    }

    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    let mut year = expand_year(year, use_buddhist_year)?;
    if use_buddhist_year && year > BUDDHIST_YEAR_THRESHOLD {
        year -= BUDDHIST_ERA_OFFSET;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

fn expand_year(raw: &str, use_buddhist_year: bool) -> Option<i32> {
    let value: i32 = raw.parse().ok()?;
    match raw.len() {
        4 => Some(value),
        2 if use_buddhist_year => Some(2500 + value),
        2 => Some(2000 + value),
        _ => None,
    }
}

/// Convert a spreadsheet date serial into a calendar date
///
/// Uses the 1899-12-30 epoch, which absorbs the 1900 leap-year bug. The
/// fractional part (time of day) is dropped.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}
