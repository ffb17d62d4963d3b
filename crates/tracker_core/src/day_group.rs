use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RoutineError;
use crate::routine::{parse_weekday, weekday_name, WEEKDAYS};

/// Weekdays sharing one routine schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayGroup {
    pub id: String,
    pub label: String,
    #[serde(with = "weekday_names")]
    pub days: Vec<Weekday>,
}

impl DayGroup {
    pub fn new(id: impl Into<String>, label: impl Into<String>, days: &[Weekday]) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            days: days.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayGroupPreset {
    Individual,
    WeekdayWeekend,
    Simplified,
}

impl FromStr for DayGroupPreset {
    type Err = RoutineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "individual" => Ok(Self::Individual),
            "weekday-weekend" | "weekdayweekend" => Ok(Self::WeekdayWeekend),
            "simplified" => Ok(Self::Simplified),
            _ => Err(RoutineError::UnknownPreset(s.to_string())),
        }
    }
}

/// Partition of the week into groups. Only `validate` enforces that the
/// partition is complete and non-overlapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayGroupConfig {
    pub groups: Vec<DayGroup>,
}

impl DayGroupConfig {
    pub fn preset(preset: DayGroupPreset) -> Self {
        use Weekday::*;
        let groups = match preset {
            DayGroupPreset::Individual => WEEKDAYS
                .into_iter()
                .map(|day| {
                    let id = weekday_name(day);
                    let mut label = id[..1].to_ascii_uppercase();
                    label.push_str(&id[1..]);
                    DayGroup::new(id, label, &[day])
                })
                .collect(),
            DayGroupPreset::WeekdayWeekend => vec![
                DayGroup::new("weekdays", "Mon-Fri", &[Mon, Tue, Wed, Thu, Fri]),
                DayGroup::new("saturday", "Saturday", &[Sat]),
                DayGroup::new("sunday", "Sunday", &[Sun]),
            ],
            DayGroupPreset::Simplified => vec![
                DayGroup::new("weekdays", "Weekdays", &[Mon, Tue, Wed, Thu, Fri]),
                DayGroup::new("weekend", "Weekend", &[Sat, Sun]),
            ],
        };
        Self { groups }
    }

    /// First group listing `day`.
    pub fn active_group(&self, day: Weekday) -> Option<&DayGroup> {
        self.groups.iter().find(|group| group.days.contains(&day))
    }

    /// Save-time check: every weekday in exactly one group. Empty groups are
    /// dropped from the returned config.
    pub fn validate(self) -> Result<Self, RoutineError> {
        let mut owner: [Option<&str>; 7] = [None; 7];
        for group in &self.groups {
            for day in &group.days {
                let slot = &mut owner[day.num_days_from_monday() as usize];
                match *slot {
                    Some(first) if first != group.id => {
                        return Err(RoutineError::OverlappingDay {
                            day: weekday_name(*day).to_string(),
                            first: first.to_string(),
                            second: group.id.clone(),
                        });
                    }
                    _ => *slot = Some(group.id.as_str()),
                }
            }
        }
        let missing: Vec<String> = WEEKDAYS
            .into_iter()
            .filter(|day| owner[day.num_days_from_monday() as usize].is_none())
            .map(|day| weekday_name(day).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RoutineError::UnassignedDays(missing));
        }

        let groups: Vec<DayGroup> = self
            .groups
            .into_iter()
            .filter(|group| !group.days.is_empty())
            .collect();
        if groups.is_empty() {
            return Err(RoutineError::NoGroups);
        }
        Ok(Self { groups })
    }
}

impl Default for DayGroupConfig {
    fn default() -> Self {
        Self::preset(DayGroupPreset::Individual)
    }
}

mod weekday_names {
    use super::*;

    pub fn serialize<S: Serializer>(days: &[Weekday], serializer: S) -> Result<S::Ok, S::Error> {
        let names: Vec<&str> = days.iter().map(|day| weekday_name(*day)).collect();
        names.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Weekday>, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        names
            .iter()
            .map(|name| parse_weekday(name).map_err(serde::de::Error::custom))
            .collect()
    }
}
