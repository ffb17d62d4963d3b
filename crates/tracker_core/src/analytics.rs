//! Derived monthly metrics and chart series.
//!
//! Every function is pure over `(habits, days_in_month, today)` and returns
//! its zero or empty value for an empty habit set or an empty day window.
//! Only days `1..=days_in_month` of each day vector are read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::habit::Habit;
use crate::week::{self, WeekHeader, WeekSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderStatus {
    OnTrack,
    NeedsFocus,
    Hidden,
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::OnTrack => "on-track",
            Self::NeedsFocus => "needs-focus",
            Self::Hidden => "hidden",
        };
        f.write_str(label)
    }
}

/// How the day-by-day progress series is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// Share of habits done on exactly that day.
    #[default]
    Daily,
    /// Share of all habit-days done from day 1 through that day.
    Cumulative,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown progress mode `{0}`, expected daily|cumulative")]
pub struct ProgressModeError(String);

impl FromStr for ProgressMode {
    type Err = ProgressModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "cumulative" => Ok(Self::Cumulative),
            other => Err(ProgressModeError(other.to_string())),
        }
    }
}

impl fmt::Display for ProgressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => f.write_str("daily"),
            Self::Cumulative => f.write_str("cumulative"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: u32,
}

/// Row totals shown next to each habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitTotal {
    pub name: String,
    pub completed: u32,
    pub percent: u32,
}

/// Rounds half away from zero, like the dashboard's percentage display.
fn round_percent(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

fn ratio_percent(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(denominator) * 100.0
    }
}

/// Mean over habits of each habit's share of the full month, unrounded.
fn mean_month_share(habits: &[Habit], days_in_month: u32) -> f64 {
    if habits.is_empty() {
        return 0.0;
    }
    let total: f64 = habits
        .iter()
        .map(|habit| ratio_percent(habit.completed(days_in_month), days_in_month))
        .sum();
    total / habits.len() as f64
}

pub fn monthly_completion(habits: &[Habit], days_in_month: u32) -> u32 {
    round_percent(mean_month_share(habits, days_in_month))
}

pub fn total_named_habits(habits: &[Habit]) -> usize {
    habits.iter().filter(|habit| habit.is_named()).count()
}

/// Longest run of consecutive done days in any single habit.
pub fn best_streak(habits: &[Habit], days_in_month: u32) -> u32 {
    habits
        .iter()
        .map(|habit| {
            let mut current = 0;
            let mut best = 0;
            for done in habit.days.within(days_in_month) {
                if *done {
                    current += 1;
                    best = best.max(current);
                } else {
                    current = 0;
                }
            }
            best
        })
        .max()
        .unwrap_or(0)
}

/// Completion ratio measured only through `today`, or the whole month when
/// the tracked month is not the current one.
pub fn consistency_score(habits: &[Habit], today: Option<u32>, days_in_month: u32) -> u32 {
    let horizon = today.unwrap_or(days_in_month);
    let possible = habits.len() as u32 * horizon;
    let completed: u32 = habits.iter().map(|habit| habit.completed(horizon)).sum();
    round_percent(ratio_percent(completed, possible))
}

/// Compares month-to-date expectation against actual completion.
///
/// The actual side divides by the full month length, so early in the month
/// a habit must be ahead of the calendar to count as on track.
pub fn smart_reminder_status(
    habits: &[Habit],
    today: Option<u32>,
    days_in_month: u32,
) -> ReminderStatus {
    let Some(today) = today else {
        return ReminderStatus::Hidden;
    };
    if habits.is_empty() || days_in_month == 0 {
        return ReminderStatus::Hidden;
    }
    let expected = ratio_percent(today, days_in_month);
    let actual = mean_month_share(habits, days_in_month);
    if actual >= expected {
        ReminderStatus::OnTrack
    } else {
        ReminderStatus::NeedsFocus
    }
}

pub fn has_any_checked(habits: &[Habit], days_in_month: u32) -> bool {
    habits.iter().any(|habit| habit.days.any_within(days_in_month))
}

/// Completed-day counts per named habit, in insertion order.
pub fn habit_chart_series(habits: &[Habit], days_in_month: u32) -> Vec<ChartPoint> {
    habits
        .iter()
        .filter(|habit| habit.is_named())
        .map(|habit| ChartPoint {
            label: habit.name.clone(),
            value: habit.completed(days_in_month),
        })
        .collect()
}

/// One percentage per day of the month. Empty when there are no habits.
pub fn progress_chart_series(habits: &[Habit], days_in_month: u32, mode: ProgressMode) -> Vec<f64> {
    if habits.is_empty() {
        return Vec::new();
    }
    let count = habits.len() as u32;
    match mode {
        ProgressMode::Daily => (1..=days_in_month)
            .map(|day| {
                let done = habits.iter().filter(|habit| habit.days.is_done(day)).count() as u32;
                ratio_percent(done, count)
            })
            .collect(),
        ProgressMode::Cumulative => {
            let mut done = 0;
            (1..=days_in_month)
                .map(|day| {
                    done += habits.iter().filter(|habit| habit.days.is_done(day)).count() as u32;
                    ratio_percent(done, count * day)
                })
                .collect()
        }
    }
}

pub fn habit_totals(habits: &[Habit], days_in_month: u32) -> Vec<HabitTotal> {
    habits
        .iter()
        .map(|habit| {
            let completed = habit.completed(days_in_month);
            HabitTotal {
                name: habit.name.clone(),
                completed,
                percent: round_percent(ratio_percent(completed, days_in_month)),
            }
        })
        .collect()
}

/// Every dashboard metric, recomputed together after each mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub monthly_completion: u32,
    pub total_habits: usize,
    pub best_streak: u32,
    pub consistency_score: u32,
    pub reminder: ReminderStatus,
    pub has_any_checked: bool,
    pub weeks: Vec<WeekSummary>,
    pub week_headers: Vec<WeekHeader>,
    pub habit_totals: Vec<HabitTotal>,
    pub habit_chart: Vec<ChartPoint>,
    pub progress_mode: ProgressMode,
    pub progress_chart: Vec<f64>,
}

impl AnalyticsSnapshot {
    pub fn compute(
        habits: &[Habit],
        days_in_month: u32,
        today: Option<u32>,
        mode: ProgressMode,
    ) -> Self {
        Self {
            monthly_completion: monthly_completion(habits, days_in_month),
            total_habits: total_named_habits(habits),
            best_streak: best_streak(habits, days_in_month),
            consistency_score: consistency_score(habits, today, days_in_month),
            reminder: smart_reminder_status(habits, today, days_in_month),
            has_any_checked: has_any_checked(habits, days_in_month),
            weeks: week::weekly_breakdown(habits, days_in_month),
            week_headers: week::week_headers(days_in_month, today),
            habit_totals: habit_totals(habits, days_in_month),
            habit_chart: habit_chart_series(habits, days_in_month),
            progress_mode: mode,
            progress_chart: progress_chart_series(habits, days_in_month, mode),
        }
    }
}
