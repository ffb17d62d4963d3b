use std::fmt;

use tracker_core::{
    routine::{ActiveSchedule, RoutineBadge, RoutineItem},
    DashboardSnapshot, ReminderStatus,
};

const NAME_WIDTH: usize = 18;

/// Plain-text month dashboard: metrics, week strip and the habit grid.
pub struct DashboardView<'a>(pub &'a DashboardSnapshot);

impl fmt::Display for DashboardView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;
        let analytics = &snapshot.analytics;

        write!(f, "{}", snapshot.month)?;
        match snapshot.today {
            Some(today) => writeln!(
                f,
                "  (today: day {today}, editable from day {})",
                snapshot.first_editable_day
            )?,
            None => writeln!(f, "  (not the current month, all days editable)")?,
        }
        writeln!(
            f,
            "Completion {}%  Habits {}  Best streak {}  Consistency {}%",
            analytics.monthly_completion,
            analytics.total_habits,
            analytics.best_streak,
            analytics.consistency_score
        )?;
        if let Some(message) = reminder_line(snapshot) {
            writeln!(f, "{message}")?;
        }

        let weeks: Vec<String> = analytics
            .weeks
            .iter()
            .map(|week| format!("{} {} {}%", week.name, week.label, week.progress))
            .collect();
        writeln!(f, "{}", weeks.join(" | "))?;

        if snapshot.habits.is_empty() {
            return writeln!(f, "No habits yet. Add one with `habit_tracker add <name>`.");
        }

        write!(f, "{:<8} {:<NAME_WIDTH$} ", "id", "habit")?;
        for header in &analytics.week_headers {
            let width = header.span as usize;
            let marker = if header.current { "*" } else { "" };
            let label = format!("{}{marker}", header.name);
            write!(f, "{:<width$} ", truncate(&label, width))?;
        }
        writeln!(f, "done")?;

        for (habit, total) in snapshot.habits.iter().zip(&analytics.habit_totals) {
            let name = if habit.is_named() { habit.name.as_str() } else { "(untitled)" };
            let id: String = habit.id.as_str().chars().take(8).collect();
            write!(f, "{id:<8} {:<NAME_WIDTH$} ", truncate(name, NAME_WIDTH))?;
            for header in &analytics.week_headers {
                let cells: String = (header.start..=header.end)
                    .map(|day| if habit.days.is_done(day) { 'x' } else { '.' })
                    .collect();
                write!(f, "{cells} ")?;
            }
            writeln!(f, "{}/{} {}%", total.completed, snapshot.days_in_month, total.percent)?;
        }
        Ok(())
    }
}

pub fn dashboard(snapshot: &DashboardSnapshot) -> String {
    DashboardView(snapshot).to_string()
}

fn reminder_line(snapshot: &DashboardSnapshot) -> Option<String> {
    let completion = snapshot.analytics.monthly_completion;
    match snapshot.analytics.reminder {
        ReminderStatus::OnTrack => Some(format!("On track: {completion}% of the month done. Keep it up!")),
        ReminderStatus::NeedsFocus => Some(format!("Needs focus: {completion}% done so far, focus on today.")),
        ReminderStatus::Hidden => None,
    }
}

/// Routine list for one weekday, marking the task in effect.
pub struct RoutineView<'a> {
    pub badge: &'a RoutineBadge,
    pub schedule: &'a ActiveSchedule<'a>,
    pub current: Option<&'a RoutineItem>,
}

impl fmt::Display for RoutineView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let weekend = if self.badge.weekend { " (weekend)" } else { "" };
        writeln!(f, "{}{weekend} - {}", self.badge.text, self.schedule.group.label)?;
        if self.schedule.items.is_empty() {
            writeln!(f, "No routine items.")?;
        }
        for item in self.schedule.items {
            let marker = if self.current == Some(item) { ">" } else { " " };
            writeln!(
                f,
                "{marker} {:<22} {} {} [{}]",
                item.time_range, item.icon, item.task, item.category
            )?;
        }
        Ok(())
    }
}

pub fn routine(badge: &RoutineBadge, schedule: &ActiveSchedule<'_>, current: Option<&RoutineItem>) -> String {
    RoutineView { badge, schedule, current }.to_string()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        text.chars().take(width.saturating_sub(1)).chain(['~']).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Weekday};
    use std::sync::Arc;
    use tracker_core::{routine::RoutinePlanner, FixedClock, TrackerService};

    fn service_on(year: i32, month: u32, day: u32) -> TrackerService {
        let now = NaiveDate::from_ymd_opt(year, month, day)
            .expect("date")
            .and_hms_opt(9, 0, 0)
            .expect("time");
        TrackerService::builder()
            .with_clock(Arc::new(FixedClock::new(now)))
            .build()
            .expect("build tracker service")
    }

    #[test]
    fn empty_dashboard_invites_adding() {
        let text = dashboard(&service_on(2025, 10, 16).snapshot());
        assert!(text.starts_with("October 2025"));
        assert!(text.contains("editable from day 16"));
        assert!(text.contains("No habits yet"));
    }

    #[test]
    fn habit_rows_show_marks_and_totals() {
        let service = service_on(2025, 10, 1);
        let habit = service.add_habit().expect("add");
        service.rename_habit(&habit.id, "Drink water").expect("rename");
        service.toggle_day(&habit.id, 2).expect("toggle");
        service.toggle_day(&habit.id, 3).expect("toggle");

        let text = dashboard(&service.snapshot());
        let row = text
            .lines()
            .find(|line| line.contains("Drink water"))
            .expect("habit row");
        assert!(row.contains(".xx...."));
        assert!(row.ends_with("2/31 6%"));
        assert!(text.contains("WEEK 1*"));
    }

    #[test]
    fn dashboard_view_writes_into_any_formatter() {
        let snapshot = service_on(2025, 10, 16).snapshot();
        let mut buffer = String::new();
        std::fmt::Write::write_fmt(&mut buffer, format_args!("{}", DashboardView(&snapshot)))
            .expect("write dashboard");
        assert_eq!(buffer, dashboard(&snapshot));
    }

    #[test]
    fn routine_marks_current_item() {
        let planner = RoutinePlanner::default();
        let schedule = planner.active_schedule_for(Weekday::Sat).expect("schedule");
        let current = schedule.items.first();
        let text = routine(&RoutineBadge::for_day(Weekday::Sat), &schedule, current);
        assert!(text.starts_with("Saturday (weekend)"));
        assert_eq!(text.lines().filter(|line| line.starts_with('>')).count(), 1);
    }
}
