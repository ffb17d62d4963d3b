use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    analytics::{self, AnalyticsSnapshot, ProgressMode, ReminderStatus},
    calendar::{Clock, SystemClock, TrackedMonth},
    habit::{Habit, HabitId, HabitStore},
    notifications::{ReminderNotice, ReminderSink},
    policy,
    repository::{HabitRepository, MemoryRepository, StoredState},
};

/// Everything a dashboard needs to render one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub month: TrackedMonth,
    pub days_in_month: u32,
    pub today: Option<u32>,
    pub first_editable_day: u32,
    pub habits: Vec<Habit>,
    pub analytics: AnalyticsSnapshot,
}

pub struct TrackerService {
    store: RwLock<HabitStore>,
    repository: Box<dyn HabitRepository>,
    clock: Arc<dyn Clock>,
    progress_mode: RwLock<ProgressMode>,
    reminder_sink: Option<Box<dyn ReminderSink>>,
    last_reminder: Mutex<ReminderStatus>,
}

pub struct TrackerServiceBuilder {
    repository: Option<Box<dyn HabitRepository>>,
    clock: Option<Arc<dyn Clock>>,
    progress_mode: ProgressMode,
    reminder_sink: Option<Box<dyn ReminderSink>>,
}

impl TrackerServiceBuilder {
    pub fn new() -> Self {
        Self {
            repository: None,
            clock: None,
            progress_mode: ProgressMode::default(),
            reminder_sink: None,
        }
    }

    pub fn with_repository(mut self, repository: impl HabitRepository + 'static) -> Self {
        self.repository = Some(Box::new(repository));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_progress_mode(mut self, mode: ProgressMode) -> Self {
        self.progress_mode = mode;
        self
    }

    pub fn with_reminder_sink(mut self, sink: Box<dyn ReminderSink>) -> Self {
        self.reminder_sink = Some(sink);
        self
    }

    /// Loads the persisted state and rolls it into the current month.
    pub fn build(self) -> Result<TrackerService> {
        let start = Instant::now();
        let repository = self
            .repository
            .unwrap_or_else(|| Box::new(MemoryRepository::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let today = clock.today();

        let mut store = match repository.load()? {
            Some(state) => {
                let (month, year) = (state.current_month, state.current_year);
                state.into_store().unwrap_or_else(|| {
                    warn!(month, year, "stored month is invalid, starting fresh");
                    HabitStore::new(TrackedMonth::containing(today))
                })
            }
            None => HabitStore::new(TrackedMonth::containing(today)),
        };
        let stored_month = store.month();
        if store.roll_over(today) {
            repository.save(&StoredState::from_store(&store))?;
            info!(from = %stored_month, to = %store.month(), "month rolled over on load");
        }

        let reminder = analytics::smart_reminder_status(
            store.habits(),
            store.month().today_index(today),
            store.days_in_month(),
        );
        info!(
            month = %store.month(),
            habit_count = store.habits().len(),
            elapsed_ms = %start.elapsed().as_millis(),
            "tracker state loaded"
        );
        Ok(TrackerService {
            store: RwLock::new(store),
            repository,
            clock,
            progress_mode: RwLock::new(self.progress_mode),
            reminder_sink: self.reminder_sink,
            last_reminder: Mutex::new(reminder),
        })
    }
}

impl Default for TrackerServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerService {
    pub fn builder() -> TrackerServiceBuilder {
        TrackerServiceBuilder::new()
    }

    pub fn month(&self) -> TrackedMonth {
        self.store.read().month()
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.store.read().habits().to_vec()
    }

    pub fn progress_mode(&self) -> ProgressMode {
        *self.progress_mode.read()
    }

    pub fn set_progress_mode(&self, mode: ProgressMode) {
        *self.progress_mode.write() = mode;
    }

    /// 1-based index of the clock's date within the tracked month.
    pub fn today_index(&self) -> Option<u32> {
        self.store.read().month().today_index(self.clock.today())
    }

    pub fn can_toggle(&self, day: u32) -> bool {
        policy::can_toggle(day, self.today_index())
    }

    pub fn analytics(&self) -> AnalyticsSnapshot {
        let store = self.store.read();
        let today = store.month().today_index(self.clock.today());
        AnalyticsSnapshot::compute(
            store.habits(),
            store.days_in_month(),
            today,
            self.progress_mode(),
        )
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let store = self.store.read();
        let days_in_month = store.days_in_month();
        let today = store.month().today_index(self.clock.today());
        DashboardSnapshot {
            month: store.month(),
            days_in_month,
            today,
            first_editable_day: *policy::editable_days(days_in_month, today).start(),
            habits: store.habits().to_vec(),
            analytics: AnalyticsSnapshot::compute(
                store.habits(),
                days_in_month,
                today,
                self.progress_mode(),
            ),
        }
    }

    #[instrument(skip(self))]
    pub fn add_habit(&self) -> Result<Habit> {
        let habit = self.mutate(|store| Ok((store.add_habit(), true)))?;
        info!(id = %habit.id, "habit added");
        Ok(habit)
    }

    /// Returns whether the habit existed.
    #[instrument(skip(self))]
    pub fn delete_habit(&self, id: &HabitId) -> Result<bool> {
        let removed = self.mutate(|store| {
            let removed = store.delete_habit(id);
            Ok((removed, removed))
        })?;
        if removed {
            info!(%id, "habit deleted");
        } else {
            debug!(%id, "delete ignored, unknown habit");
        }
        Ok(removed)
    }

    #[instrument(skip(self, name))]
    pub fn rename_habit(&self, id: &HabitId, name: &str) -> Result<bool> {
        let renamed = self.mutate(|store| {
            let renamed = store.rename_habit(id, name);
            Ok((renamed, renamed))
        })?;
        if renamed {
            info!(%id, "habit renamed");
        }
        Ok(renamed)
    }

    /// Flips one day. `Ok(false)` when the day is locked or the habit is
    /// unknown; an out-of-month day is an error.
    #[instrument(skip(self))]
    pub fn toggle_day(&self, id: &HabitId, day: u32) -> Result<bool> {
        let today = self.clock.today();
        let toggled = self.mutate(|store| {
            let today = store.month().today_index(today);
            let toggled = store.toggle_day(id, day, today)?;
            Ok((toggled, toggled))
        })?;
        if toggled {
            info!(%id, day, "day toggled");
        } else {
            debug!(%id, day, "toggle ignored");
        }
        Ok(toggled)
    }

    /// Clears every check mark of the tracked month. Returns whether any mark
    /// was set; nothing is written otherwise.
    #[instrument(skip(self))]
    pub fn reset_month(&self) -> Result<bool> {
        let cleared = self.mutate(|store| {
            let cleared = store.reset_month();
            Ok((cleared, cleared))
        })?;
        if cleared {
            info!("month reset");
        }
        Ok(cleared)
    }

    /// Adopts the clock's month if it moved on. Meant to be polled.
    pub fn check_rollover(&self) -> Result<bool> {
        let today = self.clock.today();
        let before = self.month();
        let rolled = self.mutate(|store| {
            let rolled = store.roll_over(today);
            Ok((rolled, rolled))
        })?;
        if rolled {
            info!(from = %before, to = %self.month(), "month rolled over");
        }
        Ok(rolled)
    }

    /// Runs `op` on a copy of the store. When it reports a change the copy is
    /// persisted first and only then swapped in, so a failed save leaves the
    /// in-memory state untouched.
    fn mutate<T>(&self, op: impl FnOnce(&mut HabitStore) -> Result<(T, bool)>) -> Result<T> {
        let (value, notice) = {
            let mut store = self.store.write();
            let mut next = store.clone();
            let (value, changed) = op(&mut next)?;
            if !changed {
                return Ok(value);
            }
            self.repository.save(&StoredState::from_store(&next))?;
            *store = next;
            (value, self.reminder_notice(&store))
        };
        if let (Some(notice), Some(sink)) = (notice, &self.reminder_sink) {
            debug!(status = %notice.status, "reminder status changed");
            sink.reminder_changed(&notice);
        }
        Ok(value)
    }

    fn reminder_notice(&self, store: &HabitStore) -> Option<ReminderNotice> {
        let today = store.month().today_index(self.clock.today());
        let days_in_month = store.days_in_month();
        let status = analytics::smart_reminder_status(store.habits(), today, days_in_month);
        let mut last = self.last_reminder.lock();
        if *last == status {
            return None;
        }
        let previous = std::mem::replace(&mut *last, status);
        Some(ReminderNotice {
            month: store.month(),
            today,
            previous,
            status,
            monthly_completion: analytics::monthly_completion(store.habits(), days_in_month),
        })
    }
}
