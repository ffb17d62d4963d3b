use std::fs;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use tempfile::tempdir;
use tracker_core::{
    analytics::{self, ProgressMode, ReminderStatus},
    calendar::days_in_month,
    notifications::{ReminderNotice, ReminderSink},
    routine::{current_task, RoutineCategory, RoutineItem},
    week::week_progress,
    FixedClock, HabitStore, JsonFileRepository, MemoryRepository, StoredState, TrackedMonth,
    TrackerService,
};

fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid date")
        .and_hms_opt(8, 0, 0)
        .expect("valid time")
}

#[derive(Clone, Default)]
struct RecordingSink(Arc<Mutex<Vec<ReminderNotice>>>);

impl ReminderSink for RecordingSink {
    fn reminder_changed(&self, notice: &ReminderNotice) {
        self.0.lock().push(notice.clone());
    }
}

#[test]
fn state_survives_a_restart() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("data").join("habits.json");
    let clock = FixedClock::new(at(2025, 10, 5));

    let service = TrackerService::builder()
        .with_repository(JsonFileRepository::new(&path))
        .with_clock(Arc::new(clock.clone()))
        .build()
        .expect("build tracker service");
    let habit = service.add_habit().expect("add habit");
    assert!(service.rename_habit(&habit.id, "Read 20 pages").expect("rename"));
    assert!(service.toggle_day(&habit.id, 5).expect("toggle today"));
    assert!(service.toggle_day(&habit.id, 12).expect("toggle future day"));
    drop(service);

    let raw = fs::read_to_string(&path).expect("read stored state");
    assert!(raw.contains("\"currentMonth\": 9"));
    assert!(raw.contains("\"currentYear\": 2025"));

    let reopened = TrackerService::builder()
        .with_repository(JsonFileRepository::new(&path))
        .with_clock(Arc::new(clock))
        .build()
        .expect("rebuild tracker service");
    let habits = reopened.habits();
    assert_eq!(habits.len(), 1);
    assert_eq!(habits[0].id, habit.id);
    assert_eq!(habits[0].name, "Read 20 pages");
    assert!(habits[0].days.is_done(5));
    assert!(habits[0].days.is_done(12));
    assert_eq!(habits[0].completed(31), 2);
}

#[test]
fn month_change_clears_days_on_load_and_while_running() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("habits.json");
    fs::write(
        &path,
        r#"{"habits":[{"id":"h1","name":"Stretch","days":[true,true,true]}],"currentMonth":8,"currentYear":2025}"#,
    )
    .expect("write fixture");

    let clock = FixedClock::new(at(2025, 10, 1));
    let service = TrackerService::builder()
        .with_repository(JsonFileRepository::new(&path))
        .with_clock(Arc::new(clock.clone()))
        .build()
        .expect("build tracker service");
    assert_eq!(service.month(), TrackedMonth::new(2025, 9).expect("month"));
    let habits = service.habits();
    assert_eq!(habits[0].name, "Stretch");
    assert_eq!(habits[0].completed(31), 0);

    assert!(!service.check_rollover().expect("same month"));

    clock.set(at(2025, 11, 1));
    assert!(service.check_rollover().expect("next month"));
    assert_eq!(service.month().month(), 10);
    assert_eq!(service.snapshot().days_in_month, 30);

    let stored: StoredState =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
    assert_eq!(stored.current_month, 10);
    assert_eq!(stored.habits[0].id.as_str(), "h1");
}

#[test]
fn locked_days_and_unknown_habits_are_silent_no_ops() {
    let service = TrackerService::builder()
        .with_repository(MemoryRepository::new())
        .with_clock(Arc::new(FixedClock::new(at(2025, 10, 16))))
        .build()
        .expect("build tracker service");
    let habit = service.add_habit().expect("add habit");

    assert!(!service.toggle_day(&habit.id, 3).expect("locked day"));
    assert!(!service.toggle_day(&"missing".into(), 20).expect("unknown id"));
    assert!(!service.delete_habit(&"missing".into()).expect("unknown id"));
    assert!(!service.rename_habit(&"missing".into(), "x").expect("unknown id"));
    assert_eq!(service.habits()[0].completed(31), 0);
}

#[test]
fn reset_keeps_habits_and_skips_empty_months() {
    let repo = MemoryRepository::new();
    let service = TrackerService::builder()
        .with_repository(repo)
        .with_clock(Arc::new(FixedClock::new(at(2025, 10, 1))))
        .build()
        .expect("build tracker service");
    assert!(!service.reset_month().expect("nothing to reset"));

    let first = service.add_habit().expect("add");
    let second = service.add_habit().expect("add");
    service.rename_habit(&first.id, "Walk").expect("rename");
    service.toggle_day(&first.id, 4).expect("toggle");
    service.toggle_day(&second.id, 9).expect("toggle");

    assert!(service.reset_month().expect("reset"));
    let habits = service.habits();
    assert_eq!(habits.len(), 2);
    assert_eq!(habits[0].id, first.id);
    assert_eq!(habits[0].name, "Walk");
    assert!(habits.iter().all(|habit| habit.completed(31) == 0));
}

#[test]
fn reminder_sink_hears_status_changes() {
    let sink = RecordingSink::default();
    let service = TrackerService::builder()
        .with_clock(Arc::new(FixedClock::new(at(2025, 10, 1))))
        .with_reminder_sink(Box::new(sink.clone()))
        .build()
        .expect("build tracker service");

    let habit = service.add_habit().expect("add");
    service.toggle_day(&habit.id, 1).expect("toggle");
    service.rename_habit(&habit.id, "Journal").expect("rename");

    let notices = sink.0.lock().clone();
    let statuses: Vec<_> = notices.iter().map(|notice| notice.status).collect();
    assert_eq!(statuses, vec![ReminderStatus::NeedsFocus, ReminderStatus::OnTrack]);
    assert_eq!(notices[0].previous, ReminderStatus::Hidden);
    assert_eq!(notices[1].today, Some(1));
}

#[test]
fn snapshot_uses_selected_progress_mode() {
    let service = TrackerService::builder()
        .with_clock(Arc::new(FixedClock::new(at(2025, 10, 1))))
        .with_progress_mode(ProgressMode::Cumulative)
        .build()
        .expect("build tracker service");
    let habit = service.add_habit().expect("add");
    service.toggle_day(&habit.id, 1).expect("toggle");
    service.toggle_day(&habit.id, 3).expect("toggle");

    let cumulative = service.snapshot().analytics.progress_chart;
    assert_eq!(cumulative.len(), 31);
    assert_eq!(cumulative[0], 100.0);
    assert_eq!(cumulative[1], 50.0);
    assert!(cumulative[2] > cumulative[1]);
    assert_eq!(cumulative[3], 50.0);

    service.set_progress_mode(ProgressMode::Daily);
    let daily = service.analytics().progress_chart;
    assert_eq!(daily[0], 100.0);
    assert_eq!(daily[1], 0.0);
}

#[test]
fn calendar_lengths_follow_leap_years() {
    assert_eq!(days_in_month(2024, 1), 29);
    assert_eq!(days_in_month(2023, 1), 28);
    assert_eq!(days_in_month(2025, 0), 31);
    assert_eq!(days_in_month(2025, 3), 30);
}

#[test]
fn today_index_only_inside_the_real_month() {
    let month = TrackedMonth::new(2025, 9).expect("month");
    let inside = NaiveDate::from_ymd_opt(2025, 10, 7).expect("date");
    let outside = NaiveDate::from_ymd_opt(2025, 11, 7).expect("date");
    assert_eq!(month.today_index(inside), Some(7));
    assert_eq!(month.today_index(outside), None);
}

#[test]
fn toggling_twice_restores_the_vector() {
    let mut store = HabitStore::new(TrackedMonth::new(2025, 9).expect("month"));
    let habit = store.add_habit();
    let before = store.habit(&habit.id).expect("habit").days;
    store.toggle_day(&habit.id, 20, Some(10)).expect("toggle");
    store.toggle_day(&habit.id, 20, Some(10)).expect("toggle");
    assert_eq!(store.habit(&habit.id).expect("habit").days, before);
}

#[test]
fn worked_analytics_scenarios() {
    let mut store = HabitStore::new(TrackedMonth::new(2025, 8).expect("month"));
    let a = store.add_habit().id;
    let b = store.add_habit().id;
    for day in 1..=30 {
        if day % 2 == 0 {
            store.toggle_day(&a, day, None).expect("toggle");
        }
        store.toggle_day(&b, day, None).expect("toggle");
    }
    assert_eq!(analytics::monthly_completion(store.habits(), 30), 75);
    assert_eq!(analytics::monthly_completion(&[], 30), 0);
    assert_eq!(analytics::consistency_score(&[], Some(4), 30), 0);
    assert_eq!(week_progress(store.habits(), 29, 35, 28), 0);

    let mut store = HabitStore::new(TrackedMonth::new(2025, 8).expect("month"));
    let c = store.add_habit().id;
    let d = store.add_habit().id;
    for day in [1, 3, 5, 7, 9] {
        store.toggle_day(&c, day, None).expect("toggle");
        store.toggle_day(&d, day + 1, None).expect("toggle");
    }
    assert_eq!(analytics::consistency_score(store.habits(), Some(10), 30), 50);

    let mut store = HabitStore::new(TrackedMonth::new(2025, 8).expect("month"));
    let e = store.add_habit().id;
    for day in [1, 2, 4, 5, 6] {
        store.toggle_day(&e, day, None).expect("toggle");
    }
    assert_eq!(analytics::best_streak(store.habits(), 6), 3);
}

#[test]
fn current_task_picks_the_covering_item() {
    let items = vec![
        RoutineItem::new("9:00 AM – 10:00 AM", "Deep work", "💻", RoutineCategory::Work),
        RoutineItem::new("10:00 AM onwards", "Errands", "🛒", RoutineCategory::Break),
    ];
    let task = current_task(&items, 10 * 60 + 30).expect("task at 10:30");
    assert_eq!(task.task, "Errands");
    assert!(current_task(&items, 8 * 60).is_none());
}
