pub mod analytics;
pub mod calendar;
pub mod day_group;
pub mod error;
pub mod habit;
pub mod motivation;
pub mod notifications;
pub mod policy;
pub mod repository;
pub mod routine;
pub mod routine_store;
pub mod service;
pub mod ticker;
pub mod week;

pub use crate::analytics::{AnalyticsSnapshot, ProgressMode, ReminderStatus};
pub use crate::calendar::{Clock, FixedClock, SystemClock, TrackedMonth};
pub use crate::error::{DayError, MonthError, RoutineError};
pub use crate::habit::{Habit, HabitId, HabitStore};
pub use crate::repository::{HabitRepository, JsonFileRepository, MemoryRepository, StoredState};
pub use crate::routine_store::RoutineStore;
pub use crate::service::{DashboardSnapshot, TrackerService, TrackerServiceBuilder};
