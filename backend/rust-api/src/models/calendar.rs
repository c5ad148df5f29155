use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const CANONICAL_FORMAT: &str = "%Y-%m-%d";

/// A year-month-day value whose canonical form is always `YYYY-MM-DD`.
///
/// Years are restricted to `0..=9999` so every date has exactly eight
/// decimal digits, which the puzzle seeds rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarDateError {
    #[error("date must be formatted as YYYY-MM-DD, got {0:?}")]
    Format(String),
    #[error("year {0} is outside 0000-9999")]
    YearOutOfRange(i32),
}

impl CalendarDate {
    pub fn new(date: NaiveDate) -> Result<Self, CalendarDateError> {
        if !(0..=9999).contains(&date.year()) {
            return Err(CalendarDateError::YearOutOfRange(date.year()));
        }
        Ok(Self(date))
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, CalendarDateError> {
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| CalendarDateError::Format(format!("{year:04}-{month:02}-{day:02}")))?;
        Self::new(date)
    }

    /// Parses the canonical `YYYY-MM-DD` form. Anything else is rejected,
    /// including single-digit months or days.
    pub fn parse(value: &str) -> Result<Self, CalendarDateError> {
        let bytes = value.as_bytes();
        let well_formed = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !well_formed {
            return Err(CalendarDateError::Format(value.to_string()));
        }

        let date = NaiveDate::parse_from_str(value, CANONICAL_FORMAT)
            .map_err(|_| CalendarDateError::Format(value.to_string()))?;
        Self::new(date)
    }

    /// Today's date in UTC.
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// The eight decimal digits of the canonical form, in order
    /// (`Y Y Y Y M M D D`).
    pub fn digits(&self) -> [u32; 8] {
        let year = self.0.year() as u32;
        let month = self.0.month();
        let day = self.0.day();
        [
            year / 1000 % 10,
            year / 100 % 10,
            year / 10 % 10,
            year % 10,
            month / 10,
            month % 10,
            day / 10,
            day % 10,
        ]
    }

    pub fn previous(&self) -> Option<Self> {
        self.0.pred_opt().and_then(|date| Self::new(date).ok())
    }

    pub fn next(&self) -> Option<Self> {
        self.0.succ_opt().and_then(|date| Self::new(date).ok())
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for CalendarDate {
    type Err = CalendarDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
