//! Inclusive date ranges used to scope backend queries.
//!
//! Every collection buffer belongs to exactly one [`DateRange`]. Changing the range
//! is the only criteria change that forces a backend refetch.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::NewsrankError;

/// Closed interval `[from, to]` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Named shortcuts offered by the date picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Today,
    Last7,
    Last30,
    ThisMonth,
    LastMonth,
}

impl FromStr for Preset {
    type Err = NewsrankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "last7" => Ok(Self::Last7),
            "last30" => Ok(Self::Last30),
            "thisMonth" | "this-month" => Ok(Self::ThisMonth),
            "lastMonth" | "last-month" => Ok(Self::LastMonth),
            other => Err(NewsrankError::Config(format!("unknown date preset: {other}"))),
        }
    }
}

impl DateRange {
    #[must_use]
    pub const fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Builds a range covering whole days, from the start of `first` to the end of `last`.
    #[must_use]
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            from: start_of_day(first),
            to: end_of_day(last),
        }
    }

    /// The range covering the current UTC day.
    #[must_use]
    pub fn today() -> Self {
        Self::preset(Preset::Today, Utc::now())
    }

    /// Resolves a preset relative to `now`.
    ///
    /// `Last7` and `Last30` include today, so they span 7 and 30 calendar days.
    #[must_use]
    pub fn preset(preset: Preset, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        match preset {
            Preset::Today => Self::days(today, today),
            Preset::Last7 => Self::days(today - Duration::days(6), today),
            Preset::Last30 => Self::days(today - Duration::days(29), today),
            Preset::ThisMonth => {
                let first = first_of_month(today);
                Self::days(first, last_of_month(first))
            }
            Preset::LastMonth => {
                let previous = first_of_month(first_of_month(today) - Duration::days(1));
                Self::days(previous, last_of_month(previous))
            }
        }
    }

    /// Returns `true` if `instant` lies inside the closed interval.
    #[must_use]
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.from <= *instant && *instant <= self.to
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::today()
    }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    start_of_day(day) + Duration::days(1) - Duration::milliseconds(1)
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn last_of_month(first: NaiveDate) -> NaiveDate {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.map_or(first, |n| n - Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single().expect("valid timestamp")
    }

    #[test]
    fn last7_includes_today_and_six_prior_days() {
        let range = DateRange::preset(Preset::Last7, at(2024, 3, 10, 15));
        assert_eq!(range.from, at(2024, 3, 4, 0));
        assert!(range.contains(&at(2024, 3, 10, 23)));
        assert!(!range.contains(&at(2024, 3, 11, 0)));
    }

    #[test]
    fn last_month_wraps_year_boundary() {
        let range = DateRange::preset(Preset::LastMonth, at(2024, 1, 15, 9));
        assert_eq!(range.from, at(2023, 12, 1, 0));
        assert!(range.contains(&at(2023, 12, 31, 23)));
        assert!(!range.contains(&at(2024, 1, 1, 0)));
    }

    #[test]
    fn this_month_handles_leap_february() {
        let range = DateRange::preset(Preset::ThisMonth, at(2024, 2, 10, 0));
        assert!(range.contains(&at(2024, 2, 29, 12)));
        assert!(!range.contains(&at(2024, 3, 1, 0)));
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!("last30".parse::<Preset>().ok(), Some(Preset::Last30));
        assert!("yesterday".parse::<Preset>().is_err());
    }
}
