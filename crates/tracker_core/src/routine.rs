use std::fmt;

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::day_group::{DayGroup, DayGroupConfig};
use crate::error::RoutineError;

/// Last minute of the day; the end of an "onwards" slot.
pub const END_OF_DAY: u32 = 23 * 60 + 59;
const DEFAULT_SLOT_MINUTES: u32 = 60;

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

pub fn parse_weekday(name: &str) -> Result<Weekday, RoutineError> {
    let lowered = name.trim().to_ascii_lowercase();
    WEEKDAYS
        .into_iter()
        .find(|day| weekday_name(*day) == lowered)
        .ok_or_else(|| RoutineError::UnknownWeekday(name.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutineCategory {
    Morning,
    Study,
    Work,
    Project,
    Break,
    Evening,
    Night,
}

impl fmt::Display for RoutineCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Morning => "morning",
            Self::Study => "study",
            Self::Work => "work",
            Self::Project => "project",
            Self::Break => "break",
            Self::Evening => "evening",
            Self::Night => "night",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineItem {
    /// `"6:30 AM – 7:00 AM"`, `"10:30 PM"` or `"8:30 PM onwards"`.
    #[serde(rename = "time")]
    pub time_range: String,
    pub task: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub category: RoutineCategory,
}

impl RoutineItem {
    pub fn new(
        time_range: impl Into<String>,
        task: impl Into<String>,
        icon: impl Into<String>,
        category: RoutineCategory,
    ) -> Self {
        Self {
            time_range: time_range.into(),
            task: task.into(),
            icon: icon.into(),
            category,
        }
    }

    pub fn time(&self) -> TimeRange {
        parse_time_range(&self.time_range)
    }
}

/// Half-open minute interval `[start, end)`. A missing start never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl TimeRange {
    pub fn contains(&self, minutes: u32) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= minutes && minutes < end,
            _ => false,
        }
    }
}

/// Minutes since midnight of the first clock time found in `input`.
///
/// Twelve-hour times (`"6:30 AM"`, `"10:30pm"`) take precedence; a bare
/// `"HH:MM"` is read as 24-hour. Text around the time is ignored.
pub fn parse_clock_time(input: &str) -> Option<u32> {
    let text = input.trim();
    text.char_indices()
        .filter(|(idx, ch)| {
            ch.is_ascii_digit() && !text[..*idx].ends_with(|prev: char| prev.is_ascii_digit())
        })
        .find_map(|(idx, _)| clock_time_at(&text[idx..]))
}

fn clock_time_at(text: &str) -> Option<u32> {
    if let Ok((time, _)) = NaiveTime::parse_and_remainder(text, "%I:%M %p") {
        return Some(time.hour() * 60 + time.minute());
    }
    let (time, rest) = NaiveTime::parse_and_remainder(text, "%H:%M").ok()?;
    // "13:00 PM" is neither a 12-hour nor a 24-hour time.
    let period = rest.trim_start().get(..2).map(str::to_ascii_uppercase);
    if matches!(period.as_deref(), Some("AM" | "PM")) {
        return None;
    }
    Some(time.hour() * 60 + time.minute())
}

/// Splits on an en dash (or ASCII hyphen). Without an end the slot lasts an
/// hour; "onwards" runs to the end of the day.
pub fn parse_time_range(input: &str) -> TimeRange {
    let mut parts = input.splitn(2, &['–', '-'][..]).map(str::trim);
    let start = parts.next().and_then(parse_clock_time);
    let end = if input.contains("onwards") {
        Some(END_OF_DAY)
    } else {
        match parts.next() {
            Some(end) => parse_clock_time(end),
            None => start.map(|start| start + DEFAULT_SLOT_MINUTES),
        }
    };
    TimeRange { start, end }
}

/// First item, in declared order, whose range contains `now_minutes`.
pub fn current_task(schedule: &[RoutineItem], now_minutes: u32) -> Option<&RoutineItem> {
    schedule.iter().find(|item| item.time().contains(now_minutes))
}

/// One routine list per weekday, in the import file's shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyRoutines {
    pub monday: Vec<RoutineItem>,
    pub tuesday: Vec<RoutineItem>,
    pub wednesday: Vec<RoutineItem>,
    pub thursday: Vec<RoutineItem>,
    pub friday: Vec<RoutineItem>,
    pub saturday: Vec<RoutineItem>,
    pub sunday: Vec<RoutineItem>,
}

impl WeeklyRoutines {
    /// Parses and validates an imported routine file.
    pub fn from_json(raw: &str) -> Result<Self, RoutineError> {
        let routines: Self =
            serde_json::from_str(raw).map_err(|err| RoutineError::Malformed(err.to_string()))?;
        routines.validate()?;
        Ok(routines)
    }

    pub fn validate(&self) -> Result<(), RoutineError> {
        for day in WEEKDAYS {
            for (index, item) in self.for_day(day).iter().enumerate() {
                let fields = [
                    ("time", &item.time_range),
                    ("task", &item.task),
                    ("icon", &item.icon),
                ];
                if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
                    return Err(RoutineError::EmptyField {
                        day: weekday_name(day).to_string(),
                        index,
                        field: *field,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn for_day(&self, day: Weekday) -> &[RoutineItem] {
        match day {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn set_day(&mut self, day: Weekday, items: Vec<RoutineItem>) {
        let slot = match day {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        };
        *slot = items;
    }

    /// Items whose time string has no parseable start.
    pub fn unparseable_times(&self) -> Vec<(Weekday, &RoutineItem)> {
        WEEKDAYS
            .into_iter()
            .flat_map(|day| self.for_day(day).iter().map(move |item| (day, item)))
            .filter(|(_, item)| item.time().start.is_none())
            .collect()
    }
}

impl Default for WeeklyRoutines {
    fn default() -> Self {
        let weekday = default_weekday_routine();
        Self {
            monday: weekday.clone(),
            tuesday: weekday.clone(),
            wednesday: weekday.clone(),
            thursday: weekday.clone(),
            friday: weekday,
            saturday: default_saturday_routine(),
            sunday: default_sunday_routine(),
        }
    }
}

fn default_weekday_routine() -> Vec<RoutineItem> {
    use RoutineCategory::*;
    vec![
        RoutineItem::new("6:30 AM – 7:00 AM", "Wake up, freshen up", "🌅", Morning),
        RoutineItem::new("7:00 AM – 7:40 AM", "DSA Practice", "💻", Study),
        RoutineItem::new("7:40 AM – 8:00 AM", "English Practice", "📖", Study),
        RoutineItem::new("8:00 AM – 8:30 AM", "Breakfast & Get Ready", "🍳", Break),
        RoutineItem::new("8:30 AM – 7:30 PM", "Office Hours", "🏢", Work),
        RoutineItem::new("7:30 PM – 8:30 PM", "Travel + Dinner + Rest", "🚗", Break),
        RoutineItem::new("8:30 PM – 9:30 PM", "DevOps Learning & Practice", "⚙️", Study),
        RoutineItem::new("9:30 PM – 10:00 PM", "SQL Practice", "🗃️", Study),
        RoutineItem::new("10:00 PM – 10:20 PM", "Wind Down", "🧘", Evening),
        RoutineItem::new("10:30 PM", "Sleep", "😴", Night),
    ]
}

fn default_saturday_routine() -> Vec<RoutineItem> {
    use RoutineCategory::*;
    vec![
        RoutineItem::new("7:30 AM – 8:00 AM", "Wake up + Fresh", "🌅", Morning),
        RoutineItem::new("8:00 AM – 10:00 AM", "Side Project", "🛡️", Project),
        RoutineItem::new("10:00 AM – 10:30 AM", "Long Break", "☕", Break),
        RoutineItem::new("10:30 AM – 12:00 PM", "Side Project", "🛡️", Project),
        RoutineItem::new("12:00 PM – 1:00 PM", "Lunch + Rest", "🍽️", Break),
        RoutineItem::new("1:00 PM – 2:30 PM", "SQL Deep Practice", "🗃️", Study),
        RoutineItem::new("2:30 PM – 4:00 PM", "Long Rest / Personal Time", "🛋️", Break),
        RoutineItem::new("4:30 PM – 5:30 PM", "DSA Revision", "💻", Study),
        RoutineItem::new("5:30 PM – 6:30 PM", "Walk / Outing", "🚶", Break),
        RoutineItem::new("7:30 PM – 8:30 PM", "English Practice", "📖", Evening),
        RoutineItem::new("8:30 PM onwards", "Free Time", "🎮", Night),
    ]
}

fn default_sunday_routine() -> Vec<RoutineItem> {
    use RoutineCategory::*;
    vec![
        RoutineItem::new("8:00 AM – 8:30 AM", "Wake up slowly", "🌅", Morning),
        RoutineItem::new("8:30 AM – 10:00 AM", "Side Project", "🛡️", Project),
        RoutineItem::new("10:00 AM – 10:30 AM", "Long Break", "☕", Break),
        RoutineItem::new("10:30 AM – 11:30 AM", "Side Project", "🛡️", Project),
        RoutineItem::new("12:00 PM – 1:00 PM", "Lunch", "🍽️", Break),
        RoutineItem::new("1:00 PM – 3:00 PM", "Full Rest / Personal Time", "🛋️", Break),
        RoutineItem::new("3:00 PM – 4:00 PM", "English Practice", "📖", Study),
        RoutineItem::new("5:00 PM – 6:00 PM", "Next Week Planning", "📋", Study),
        RoutineItem::new("6:00 PM onwards", "Relax, Family, Entertainment", "👨‍👩‍👧", Night),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineBadge {
    pub text: String,
    pub weekend: bool,
}

impl RoutineBadge {
    pub fn for_day(day: Weekday) -> Self {
        let name = weekday_name(day);
        let mut text = name[..1].to_ascii_uppercase();
        text.push_str(&name[1..]);
        Self {
            text,
            weekend: matches!(day, Weekday::Sat | Weekday::Sun),
        }
    }
}

/// The group owning a weekday together with the routine it displays.
#[derive(Debug, Clone, Copy)]
pub struct ActiveSchedule<'a> {
    pub group: &'a DayGroup,
    pub items: &'a [RoutineItem],
}

/// Resolves weekday and time of day to the routine item in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutinePlanner {
    routines: WeeklyRoutines,
    groups: DayGroupConfig,
}

impl RoutinePlanner {
    pub fn new(routines: WeeklyRoutines, groups: DayGroupConfig) -> Self {
        Self { routines, groups }
    }

    pub fn routines(&self) -> &WeeklyRoutines {
        &self.routines
    }

    pub fn groups(&self) -> &DayGroupConfig {
        &self.groups
    }

    /// A group shows the routine of its first listed weekday.
    pub fn active_schedule_for(&self, day: Weekday) -> Option<ActiveSchedule<'_>> {
        let group = self.groups.active_group(day)?;
        let display_day = group.days.first().copied().unwrap_or(day);
        Some(ActiveSchedule {
            group,
            items: self.routines.for_day(display_day),
        })
    }

    pub fn current_task_at(&self, now: NaiveDateTime) -> Option<&RoutineItem> {
        let schedule = self.active_schedule_for(now.weekday())?;
        current_task(schedule.items, now.hour() * 60 + now.minute())
    }
}

impl Default for RoutinePlanner {
    fn default() -> Self {
        Self::new(WeeklyRoutines::default(), DayGroupConfig::default())
    }
}
