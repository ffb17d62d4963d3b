use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Weekday;
use tracing::{debug, info, warn};

use crate::day_group::{DayGroupConfig, DayGroupPreset};
use crate::repository::{read_json, write_json};
use crate::routine::{weekday_name, RoutineItem, RoutinePlanner, WeeklyRoutines};

/// On-disk home of the user's routine customisations: one file with the
/// custom weekly routines, one with the day-group partition.
///
/// A missing routines file means the built-in routines are in effect; a
/// missing groups file means the fallback preset is.
#[derive(Debug, Clone)]
pub struct RoutineStore {
    routines_path: PathBuf,
    groups_path: PathBuf,
}

impl RoutineStore {
    pub fn new(routines_path: impl AsRef<Path>, groups_path: impl AsRef<Path>) -> Self {
        Self {
            routines_path: routines_path.as_ref().to_path_buf(),
            groups_path: groups_path.as_ref().to_path_buf(),
        }
    }

    pub fn routines_path(&self) -> &Path {
        &self.routines_path
    }

    pub fn groups_path(&self) -> &Path {
        &self.groups_path
    }

    /// Stored partition, validated; `fallback` when nothing is stored.
    pub fn load_day_groups(&self, fallback: DayGroupPreset) -> Result<DayGroupConfig> {
        match read_json::<DayGroupConfig>(&self.groups_path)? {
            Some(config) => config
                .validate()
                .with_context(|| format!("invalid day groups in {}", self.groups_path.display())),
            None => Ok(DayGroupConfig::preset(fallback)),
        }
    }

    /// Validates and stores `config`, returning the normalised partition.
    pub fn save_day_groups(&self, config: DayGroupConfig) -> Result<DayGroupConfig> {
        let config = config.validate()?;
        write_json(&self.groups_path, &config)?;
        info!(groups = config.groups.len(), path = %self.groups_path.display(), "day groups saved");
        Ok(config)
    }

    pub fn use_preset(&self, preset: DayGroupPreset) -> Result<DayGroupConfig> {
        self.save_day_groups(DayGroupConfig::preset(preset))
    }

    pub fn has_custom_routines(&self) -> bool {
        self.routines_path.exists()
    }

    /// Custom routines, if any were saved.
    pub fn custom_routines(&self) -> Result<Option<WeeklyRoutines>> {
        let Some(routines) = read_json::<WeeklyRoutines>(&self.routines_path)? else {
            return Ok(None);
        };
        routines
            .validate()
            .with_context(|| format!("invalid routines in {}", self.routines_path.display()))?;
        Ok(Some(routines))
    }

    /// Custom routines, or the built-in ones.
    pub fn routines(&self) -> Result<WeeklyRoutines> {
        Ok(self.custom_routines()?.unwrap_or_default())
    }

    pub fn save_routines(&self, routines: &WeeklyRoutines) -> Result<()> {
        routines.validate()?;
        write_json(&self.routines_path, routines)?;
        info!(path = %self.routines_path.display(), "custom routines saved");
        Ok(())
    }

    /// Replaces one weekday's list, starting from the built-in routines when
    /// nothing custom exists yet.
    pub fn update_day(&self, day: Weekday, items: Vec<RoutineItem>) -> Result<WeeklyRoutines> {
        let mut routines = self.routines()?;
        routines.set_day(day, items);
        self.save_routines(&routines)?;
        debug!(day = weekday_name(day), "routine day replaced");
        Ok(routines)
    }

    /// Drops the custom routines. Returns whether a file was removed.
    pub fn reset_routines(&self) -> Result<bool> {
        match fs::remove_file(&self.routines_path) {
            Ok(()) => {
                info!(path = %self.routines_path.display(), "custom routines removed");
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err)
                .with_context(|| format!("failed to remove {}", self.routines_path.display())),
        }
    }

    pub fn planner(&self, fallback: DayGroupPreset) -> Result<RoutinePlanner> {
        let routines = self.routines()?;
        for (day, item) in routines.unparseable_times() {
            warn!(day = weekday_name(day), time = %item.time_range, task = %item.task, "routine time cannot be parsed");
        }
        let groups = self.load_day_groups(fallback)?;
        Ok(RoutinePlanner::new(routines, groups))
    }
}
