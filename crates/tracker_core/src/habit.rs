use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::analytics;
use crate::calendar::{TrackedMonth, DAY_SLOTS};
use crate::error::DayError;
use crate::policy;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HabitId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for HabitId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-day completion flags for one month, always `DAY_SLOTS` long.
///
/// Only positions below the month's day count carry meaning; every counting
/// method takes that bound explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayVector([bool; DAY_SLOTS]);

impl DayVector {
    pub fn empty() -> Self {
        Self([false; DAY_SLOTS])
    }

    /// Builds a vector from leading flags; missing slots are `false` and
    /// anything past `DAY_SLOTS` is dropped.
    pub fn from_flags(flags: &[bool]) -> Self {
        let mut slots = [false; DAY_SLOTS];
        for (slot, flag) in slots.iter_mut().zip(flags) {
            *slot = *flag;
        }
        Self(slots)
    }

    /// Flag for 1-based `day`; out-of-range days read as `false`.
    pub fn is_done(&self, day: u32) -> bool {
        day.checked_sub(1)
            .and_then(|idx| self.0.get(idx as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Flags for days `1..=days`, clamped to the slot capacity.
    pub fn within(&self, days: u32) -> &[bool] {
        &self.0[..(days as usize).min(DAY_SLOTS)]
    }

    pub fn completed_within(&self, days: u32) -> u32 {
        self.within(days).iter().filter(|done| **done).count() as u32
    }

    pub fn any_within(&self, days: u32) -> bool {
        self.within(days).iter().any(|done| *done)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    fn flip(&mut self, day: u32) {
        let slot = &mut self.0[(day - 1) as usize];
        *slot = !*slot;
    }

    fn clear(&mut self) {
        self.0 = [false; DAY_SLOTS];
    }
}

impl Default for DayVector {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for DayVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DayVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flags = Vec::<bool>::deserialize(deserializer)?;
        Ok(Self::from_flags(&flags))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub days: DayVector,
}

impl Habit {
    pub fn new(id: HabitId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            days: DayVector::empty(),
        }
    }

    pub fn is_named(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn completed(&self, days_in_month: u32) -> u32 {
        self.days.completed_within(days_in_month)
    }
}

/// Owns every habit of one tracked month. All mutations go through here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitStore {
    month: TrackedMonth,
    habits: Vec<Habit>,
}

impl HabitStore {
    pub fn new(month: TrackedMonth) -> Self {
        Self {
            month,
            habits: Vec::new(),
        }
    }

    pub fn with_habits(month: TrackedMonth, habits: Vec<Habit>) -> Self {
        Self { month, habits }
    }

    pub fn month(&self) -> TrackedMonth {
        self.month
    }

    pub fn days_in_month(&self) -> u32 {
        self.month.days_in_month()
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn into_habits(self) -> Vec<Habit> {
        self.habits
    }

    pub fn habit(&self, id: &HabitId) -> Option<&Habit> {
        self.habits.iter().find(|habit| &habit.id == id)
    }

    /// Appends an untitled habit with an empty day vector.
    pub fn add_habit(&mut self) -> Habit {
        let habit = Habit::new(HabitId::generate(), "");
        self.habits.push(habit.clone());
        habit
    }

    /// Returns whether a habit was removed.
    pub fn delete_habit(&mut self, id: &HabitId) -> bool {
        let before = self.habits.len();
        self.habits.retain(|habit| &habit.id != id);
        self.habits.len() != before
    }

    /// Stores `name` verbatim. Returns whether the habit exists.
    pub fn rename_habit(&mut self, id: &HabitId, name: impl Into<String>) -> bool {
        match self.habits.iter_mut().find(|habit| &habit.id == id) {
            Some(habit) => {
                habit.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Flips `day` for habit `id`.
    ///
    /// Returns `Ok(false)` without touching anything when the day is locked
    /// for `today` or the habit does not exist. A day outside the tracked
    /// month is a caller bug and reported as `DayError`.
    pub fn toggle_day(
        &mut self,
        id: &HabitId,
        day: u32,
        today: Option<u32>,
    ) -> Result<bool, DayError> {
        self.check_day(day)?;
        if !policy::can_toggle(day, today) {
            return Ok(false);
        }
        match self.habits.iter_mut().find(|habit| &habit.id == id) {
            Some(habit) => {
                habit.days.flip(day);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn check_day(&self, day: u32) -> Result<(), DayError> {
        let days_in_month = self.days_in_month();
        if (1..=days_in_month).contains(&day) {
            Ok(())
        } else {
            Err(DayError { day, days_in_month })
        }
    }

    /// Clears every day vector, keeping ids and names. Returns whether any
    /// flag was set beforehand.
    pub fn reset_month(&mut self) -> bool {
        let had_checked = self.has_any_checked();
        for habit in &mut self.habits {
            habit.days.clear();
        }
        had_checked
    }

    pub fn has_any_checked(&self) -> bool {
        analytics::has_any_checked(&self.habits, self.days_in_month())
    }

    /// Adopts the month of `today` when it differs from the tracked month,
    /// clearing all day vectors. Returns whether a rollover happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.month.contains(today) {
            return false;
        }
        self.month = TrackedMonth::containing(today);
        for habit in &mut self.habits {
            habit.days.clear();
        }
        true
    }
}
