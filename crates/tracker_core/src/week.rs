use serde::{Deserialize, Serialize};

use crate::habit::Habit;

/// Fixed calendar-independent week partition of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekRange {
    pub name: &'static str,
    pub start: u32,
    pub end: u32,
}

impl WeekRange {
    /// Last day of this week inside a `days_in_month` month, if any.
    pub fn clamp_end(&self, days_in_month: u32) -> Option<u32> {
        (self.start <= days_in_month).then(|| self.end.min(days_in_month))
    }
}

// Week 5 nominally runs to day 35; every consumer caps it at the month length.
pub const WEEK_RANGES: [WeekRange; 5] = [
    WeekRange { name: "Week 1", start: 1, end: 7 },
    WeekRange { name: "Week 2", start: 8, end: 14 },
    WeekRange { name: "Week 3", start: 15, end: 21 },
    WeekRange { name: "Week 4", start: 22, end: 28 },
    WeekRange { name: "Week 5", start: 29, end: 35 },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub name: String,
    pub start: u32,
    pub end: Option<u32>,
    /// `"start–end"`, or a placeholder dash for a week past the month's end.
    pub label: String,
    pub progress: u32,
    pub has_days: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekHeader {
    pub name: String,
    pub start: u32,
    pub end: u32,
    pub span: u32,
    pub current: bool,
}

/// Completion percentage over days `week_start..=min(week_end, days_in_month)`.
pub fn week_progress(habits: &[Habit], week_start: u32, week_end: u32, days_in_month: u32) -> u32 {
    let actual_end = week_end.min(days_in_month);
    let days_in_week = (actual_end + 1).saturating_sub(week_start);
    let possible = habits.len() as u32 * days_in_week;
    if possible == 0 {
        return 0;
    }
    let completed: usize = habits
        .iter()
        .map(|habit| {
            (week_start..=actual_end)
                .filter(|day| habit.days.is_done(*day))
                .count()
        })
        .sum();
    (completed as f64 / f64::from(possible) * 100.0).round() as u32
}

pub fn weekly_breakdown(habits: &[Habit], days_in_month: u32) -> Vec<WeekSummary> {
    WEEK_RANGES
        .iter()
        .map(|week| {
            let end = week.clamp_end(days_in_month);
            let (label, progress) = match end {
                Some(end) => (
                    format!("{}–{}", week.start, end),
                    week_progress(habits, week.start, end, days_in_month),
                ),
                None => ("—".to_string(), 0),
            };
            WeekSummary {
                name: week.name.to_string(),
                start: week.start,
                end,
                label,
                progress,
                has_days: end.is_some(),
            }
        })
        .collect()
}

/// Column groups for the tracker table header; weeks past the month end are
/// omitted and the week holding `today` is flagged.
pub fn week_headers(days_in_month: u32, today: Option<u32>) -> Vec<WeekHeader> {
    WEEK_RANGES
        .iter()
        .filter_map(|week| {
            let end = week.clamp_end(days_in_month)?;
            Some(WeekHeader {
                name: week.name.to_uppercase(),
                start: week.start,
                end,
                span: end - week.start + 1,
                current: today.is_some_and(|day| (week.start..=end).contains(&day)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::{DayVector, HabitId};

    fn habit(done_days: &[u32]) -> Habit {
        let mut flags = [false; 31];
        for day in done_days {
            flags[(*day - 1) as usize] = true;
        }
        Habit {
            id: HabitId::generate(),
            name: "h".into(),
            days: DayVector::from_flags(&flags),
        }
    }

    #[test]
    fn week_outside_month_is_zero() {
        let habits = vec![habit(&[1, 2, 3])];
        assert_eq!(week_progress(&habits, 29, 35, 28), 0);
        assert_eq!(week_progress(&[], 1, 7, 30), 0);
    }

    #[test]
    fn week_progress_counts_only_days_in_range() {
        let habits = vec![habit(&[1, 2, 3, 8]), habit(&[7])];
        assert_eq!(week_progress(&habits, 1, 7, 30), 29);
    }

    #[test]
    fn short_final_week_uses_actual_length() {
        let habits = vec![habit(&[29, 30])];
        assert_eq!(week_progress(&habits, 29, 35, 30), 100);
        assert_eq!(week_progress(&habits, 29, 35, 31), 67);
    }

    #[test]
    fn breakdown_marks_empty_fifth_week_in_february() {
        let weeks = weekly_breakdown(&[habit(&[1])], 28);
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[0].label, "1–7");
        assert_eq!(weeks[0].progress, 14);
        assert!(!weeks[4].has_days);
        assert_eq!(weeks[4].label, "—");
        assert_eq!(weeks[4].end, None);
    }

    #[test]
    fn headers_span_month_and_flag_current_week() {
        let headers = week_headers(30, Some(16));
        assert_eq!(headers.len(), 5);
        assert_eq!(headers[4].span, 2);
        assert_eq!(headers[4].name, "WEEK 5");
        assert!(headers[2].current);
        assert_eq!(headers.iter().filter(|h| h.current).count(), 1);

        let february = week_headers(28, None);
        assert_eq!(february.len(), 4);
        assert!(february.iter().all(|h| !h.current));
    }
}
