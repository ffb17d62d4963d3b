use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::MonthError;

/// Capacity of every habit's day vector, independent of the tracked month.
pub const DAY_SLOTS: usize = 31;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Minutes since local midnight, `0..=1439`.
    fn minutes_of_day(&self) -> u32 {
        let now = self.now();
        now.hour() * 60 + now.minute()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Manually driven clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}

/// Number of days in `month` (0-based) of `year`, proleptic Gregorian.
///
/// Months past 11 roll into the following years, so `(2023, 13)` is
/// February 2024.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let year = year + (month / 12) as i32;
    let month = month % 12;
    let (next_year, next_month) = if month == 11 {
        (year + 1, 1)
    } else {
        (year, month + 2)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(DAY_SLOTS as u32, |last| last.day())
}

/// The `(month, year)` pair the habit store currently represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMonth")]
pub struct TrackedMonth {
    month: u32,
    year: i32,
}

#[derive(Deserialize)]
struct RawMonth {
    month: u32,
    year: i32,
}

impl TryFrom<RawMonth> for TrackedMonth {
    type Error = MonthError;

    fn try_from(raw: RawMonth) -> Result<Self, Self::Error> {
        Self::new(raw.year, raw.month).ok_or(MonthError(raw.month))
    }
}

impl TrackedMonth {
    /// Returns `None` when `month` is not in `0..=11`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (month < 12).then_some(Self { month, year })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            month: date.month0(),
            year: date.year(),
        }
    }

    /// Zero-based month index.
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn name(&self) -> &'static str {
        MONTH_NAMES.get(self.month as usize).copied().unwrap_or("Unknown")
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.month0() == self.month && date.year() == self.year
    }

    /// Day of month of `now` when it falls inside this month, else `None`.
    pub fn today_index(&self, now: NaiveDate) -> Option<u32> {
        self.contains(now).then(|| now.day())
    }
}

impl fmt::Display for TrackedMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn february_follows_leap_rules() {
        assert_eq!(days_in_month(2024, 1), 29);
        assert_eq!(days_in_month(2023, 1), 28);
        assert_eq!(days_in_month(1900, 1), 28);
        assert_eq!(days_in_month(2000, 1), 29);
    }

    #[test]
    fn matches_chrono_for_every_month_of_a_decade() {
        for year in 2020..2030 {
            for month in 0..12u32 {
                let first = date(year, month + 1, 1);
                let next = if month == 11 {
                    date(year + 1, 1, 1)
                } else {
                    date(year, month + 2, 1)
                };
                let expected = (next - first).num_days() as u32;
                assert_eq!(days_in_month(year, month), expected, "{year}-{month}");
            }
        }
    }

    #[test]
    fn overflowing_month_rolls_into_next_year() {
        assert_eq!(days_in_month(2023, 13), 29);
        assert_eq!(days_in_month(2023, 12), 31);
    }

    #[test]
    fn today_index_only_inside_tracked_month() {
        let tracked = TrackedMonth::new(2025, 9).unwrap();
        assert_eq!(tracked.today_index(date(2025, 10, 16)), Some(16));
        assert_eq!(tracked.today_index(date(2025, 11, 1)), None);
        assert_eq!(tracked.today_index(date(2024, 10, 16)), None);
    }

    #[test]
    fn rejects_out_of_range_month() {
        assert!(TrackedMonth::new(2025, 12).is_none());
        assert_eq!(TrackedMonth::new(2025, 0).unwrap().name(), "January");
    }

    #[test]
    fn deserializing_checks_the_month_index() {
        let err = serde_json::from_str::<TrackedMonth>(r#"{"month":12,"year":2025}"#).unwrap_err();
        assert!(err.to_string().contains("month index 12"));

        let october = TrackedMonth::new(2025, 9).unwrap();
        let json = serde_json::to_string(&october).unwrap();
        assert_eq!(serde_json::from_str::<TrackedMonth>(&json).unwrap(), october);
    }

    #[test]
    fn fixed_clock_reports_minutes_and_can_advance() {
        let clock = FixedClock::new(date(2025, 3, 4).and_time(NaiveTime::from_hms_opt(10, 30, 0).unwrap()));
        assert_eq!(clock.minutes_of_day(), 630);
        let shared = clock.clone();
        shared.set(date(2025, 4, 1).and_hms_opt(0, 5, 0).unwrap());
        assert_eq!(clock.today(), date(2025, 4, 1));
        assert_eq!(clock.minutes_of_day(), 5);
    }
}
