use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Weekday};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracker_core::{
    analytics::ProgressMode,
    calendar::{Clock, SystemClock},
    day_group::{DayGroupConfig, DayGroupPreset},
    motivation::pick_quote,
    notifications::{ReminderNotice, ReminderSink},
    routine::{parse_weekday, weekday_name, RoutineBadge, RoutineItem, RoutinePlanner, WeeklyRoutines},
    ticker::{RoutineTicker, DEFAULT_TICK},
    HabitId, JsonFileRepository, RoutineStore, TrackerService,
};

use crate::render;

pub struct AppConfig {
    pub(crate) data_path: PathBuf,
    pub(crate) routines_path: PathBuf,
    pub(crate) groups_path: PathBuf,
    pub(crate) day_groups: DayGroupPreset,
    pub(crate) progress_mode: ProgressMode,
    pub(crate) routine_tick: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Builds a config from `lookup`; absent or unparseable values keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("HABIT_DATA_PATH") {
            if !path.trim().is_empty() {
                config.data_path = PathBuf::from(path);
            }
        }
        if let Some(path) = lookup("HABIT_ROUTINES_PATH") {
            if !path.trim().is_empty() {
                config.routines_path = PathBuf::from(path);
            }
        }
        if let Some(path) = lookup("HABIT_DAY_GROUPS_PATH") {
            if !path.trim().is_empty() {
                config.groups_path = PathBuf::from(path);
            }
        }
        if let Some(preset) = lookup("HABIT_DAY_GROUPS") {
            match preset.parse::<DayGroupPreset>() {
                Ok(value) => config.day_groups = value,
                Err(err) => warn!(%err, "ignoring HABIT_DAY_GROUPS"),
            }
        }
        if let Some(mode) = lookup("HABIT_PROGRESS_MODE") {
            match mode.parse::<ProgressMode>() {
                Ok(value) => config.progress_mode = value,
                Err(err) => warn!(%err, "ignoring HABIT_PROGRESS_MODE"),
            }
        }
        if let Some(secs) = lookup("HABIT_ROUTINE_TICK_SECS") {
            if let Ok(value) = secs.trim().parse::<u64>() {
                if value > 0 {
                    config.routine_tick = Duration::from_secs(value);
                }
            }
        }
        config
    }

    pub(crate) fn apply_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.data {
            self.data_path = path.clone();
        }
        if let Some(mode) = cli.progress_mode {
            self.progress_mode = mode;
        }
    }

    pub(crate) fn routine_store(&self) -> RoutineStore {
        RoutineStore::new(&self.routines_path, &self.groups_path)
    }

    /// Custom or built-in routines with the stored day groups; the
    /// `HABIT_DAY_GROUPS` preset applies until groups are saved.
    pub(crate) fn load_planner(&self) -> Result<RoutinePlanner> {
        self.routine_store().planner(self.day_groups)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("habit_tracker.json"),
            routines_path: PathBuf::from("habit_routines.json"),
            groups_path: PathBuf::from("habit_day_groups.json"),
            day_groups: DayGroupPreset::Individual,
            progress_mode: ProgressMode::Daily,
            routine_tick: DEFAULT_TICK,
        }
    }
}

#[derive(Parser)]
#[command(name = "habit_tracker")]
#[command(version)]
#[command(about = "Monthly habit tracker with a daily routine planner", long_about = None)]
pub struct Cli {
    /// Data file (overrides HABIT_DATA_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Progress chart mode: daily or cumulative
    #[arg(long, global = true, value_name = "MODE")]
    pub progress_mode: Option<ProgressMode>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the month dashboard (default)
    Summary,

    /// Add a habit
    Add {
        /// Optional name; the habit starts untitled otherwise
        name: Option<String>,
    },

    /// Rename a habit
    Rename {
        /// Habit id, id prefix or current name
        habit: String,
        name: String,
    },

    /// Delete a habit
    Delete {
        /// Habit id, id prefix or current name
        habit: String,
    },

    /// Flip one day of a habit
    Toggle {
        /// Habit id, id prefix or current name
        habit: String,
        /// Day of the month, 1-based
        day: u32,
    },

    /// Clear every check mark of the month
    Reset,

    /// Show the routine for a weekday
    Routine {
        /// Weekday name; defaults to today
        #[arg(long)]
        day: Option<String>,
    },

    /// Show or change how weekdays share routines
    Groups {
        #[command(subcommand)]
        action: Option<GroupsAction>,
    },

    /// Replace all custom routines with a weekly routine file
    ImportRoutines {
        /// JSON object keyed by weekday
        file: PathBuf,
    },

    /// Replace one weekday's routine
    SetRoutine {
        /// Weekday name
        day: String,
        /// JSON array of routine items
        file: PathBuf,
    },

    /// Drop custom routines and go back to the built-in ones
    ResetRoutines,

    /// Follow the current routine task
    WatchRoutine {
        /// Exit after this many task changes
        #[arg(long, value_name = "N")]
        changes: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum GroupsAction {
    /// Print the active day groups (default)
    Show,

    /// Switch to a preset: individual, weekday-weekend or simplified
    Preset { name: DayGroupPreset },

    /// Save a custom partition from a JSON file
    Import { file: PathBuf },
}

struct LogReminderSink;

impl ReminderSink for LogReminderSink {
    fn reminder_changed(&self, notice: &ReminderNotice) {
        info!(
            month = %notice.month,
            previous = %notice.previous,
            status = %notice.status,
            completion = notice.monthly_completion,
            "{}",
            notice.message()
        );
    }
}

pub fn run(cli: Cli, mut config: AppConfig) -> Result<()> {
    config.apply_cli(&cli);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    debug!(path = %config.data_path.display(), "opening tracker data");
    let service = TrackerService::builder()
        .with_repository(JsonFileRepository::new(&config.data_path))
        .with_clock(Arc::clone(&clock))
        .with_progress_mode(config.progress_mode)
        .with_reminder_sink(Box::new(LogReminderSink))
        .build()?;

    match cli.command.unwrap_or(Command::Summary) {
        Command::Summary => {
            if !cli.json {
                println!("Today: {}", pick_quote(&mut rand::thread_rng()));
            }
            print_summary(&service, cli.json)?
        }
        Command::Add { name } => {
            let habit = service.add_habit()?;
            if let Some(name) = name {
                service.rename_habit(&habit.id, &name)?;
            }
            println!("Added habit {}", habit.id);
        }
        Command::Rename { habit, name } => {
            let id = resolve_habit(&service, &habit)?;
            service.rename_habit(&id, &name)?;
            println!("Renamed habit {id}");
        }
        Command::Delete { habit } => {
            let id = resolve_habit(&service, &habit)?;
            service.delete_habit(&id)?;
            println!("Deleted habit {id}");
        }
        Command::Toggle { habit, day } => {
            let id = resolve_habit(&service, &habit)?;
            if service.toggle_day(&id, day)? {
                print_summary(&service, cli.json)?;
            } else {
                println!("Day {day} is locked for editing");
            }
        }
        Command::Reset => {
            if service.reset_month()? {
                println!("Cleared all check marks for {}", service.month());
            } else {
                println!("Nothing to reset");
            }
        }
        Command::Routine { day } => {
            let planner = config.load_planner()?;
            let now = clock.now();
            let weekday = match day {
                Some(name) => parse_weekday(&name)?,
                None => now.weekday(),
            };
            print_routine(&planner, weekday, now, cli.json)?;
        }
        Command::Groups { action } => {
            let store = config.routine_store();
            let groups = match action.unwrap_or(GroupsAction::Show) {
                GroupsAction::Show => store.load_day_groups(config.day_groups)?,
                GroupsAction::Preset { name } => store.use_preset(name)?,
                GroupsAction::Import { file } => {
                    let groups: DayGroupConfig = read_json_file(&file)?;
                    store.save_day_groups(groups)?
                }
            };
            print_groups(&groups, cli.json)?;
        }
        Command::ImportRoutines { file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let routines = WeeklyRoutines::from_json(&raw)
                .with_context(|| format!("invalid routines in {}", file.display()))?;
            config.routine_store().save_routines(&routines)?;
            println!("Imported routines from {}", file.display());
        }
        Command::SetRoutine { day, file } => {
            let weekday = parse_weekday(&day)?;
            let items: Vec<RoutineItem> = read_json_file(&file)?;
            let count = items.len();
            config.routine_store().update_day(weekday, items)?;
            println!("Saved {count} items for {}", weekday_name(weekday));
        }
        Command::ResetRoutines => {
            if config.routine_store().reset_routines()? {
                println!("Restored the built-in routines");
            } else {
                println!("Already using the built-in routines");
            }
        }
        Command::WatchRoutine { changes } => {
            let planner = Arc::new(config.load_planner()?);
            watch_routine(service, planner, clock, config.routine_tick, changes)?;
        }
    }
    Ok(())
}

fn print_summary(service: &TrackerService, json: bool) -> Result<()> {
    let snapshot = service.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render::dashboard(&snapshot));
    }
    Ok(())
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_groups(config: &DayGroupConfig, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }
    for group in &config.groups {
        let days: Vec<&str> = group.days.iter().map(|day| weekday_name(*day)).collect();
        println!("{:<12} {}", group.label, days.join(", "));
    }
    Ok(())
}

fn print_routine(
    planner: &RoutinePlanner,
    weekday: Weekday,
    now: chrono::NaiveDateTime,
    json: bool,
) -> Result<()> {
    let schedule = planner
        .active_schedule_for(weekday)
        .ok_or_else(|| anyhow!("no day group covers {}", weekday_name(weekday)))?;
    let current = if weekday == now.weekday() {
        planner.current_task_at(now)
    } else {
        None
    };
    let badge = RoutineBadge::for_day(weekday);
    if json {
        let value = serde_json::json!({
            "badge": badge,
            "group": schedule.group,
            "items": schedule.items,
            "current": current,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", render::routine(&badge, &schedule, current));
    }
    Ok(())
}

fn watch_routine(
    service: TrackerService,
    planner: Arc<RoutinePlanner>,
    clock: Arc<dyn Clock>,
    period: Duration,
    changes: Option<usize>,
) -> Result<()> {
    let service = Arc::new(service);
    let rollover = RoutineTicker::spawn(period, move || {
        if let Err(err) = service.check_rollover() {
            warn!(%err, "month rollover failed");
        }
    });

    let (tx, rx) = mpsc::channel();
    let watcher = RoutineTicker::watch_current_task(planner, clock, period, move |task| {
        let _ = tx.send(task.cloned());
    });
    info!(period_secs = period.as_secs(), "watching routine");

    let mut seen = 0;
    for task in rx.iter() {
        match task {
            Some(item) => println!("{} {}  {}", item.icon, item.time_range, item.task),
            None => println!("No scheduled task right now"),
        }
        seen += 1;
        if changes.is_some_and(|limit| seen >= limit) {
            break;
        }
    }
    watcher.stop();
    rollover.stop();
    Ok(())
}

/// Finds a habit by exact id, unique id prefix or case-insensitive name.
pub(crate) fn resolve_habit(service: &TrackerService, query: &str) -> Result<HabitId> {
    let query = query.trim();
    if query.is_empty() {
        bail!("empty habit reference");
    }
    let habits = service.habits();
    if let Some(habit) = habits.iter().find(|habit| habit.id.as_str() == query) {
        return Ok(habit.id.clone());
    }
    let by_name: Vec<_> = habits
        .iter()
        .filter(|habit| habit.name.trim().eq_ignore_ascii_case(query))
        .collect();
    let matches = if by_name.is_empty() {
        habits
            .iter()
            .filter(|habit| habit.id.as_str().starts_with(query))
            .collect()
    } else {
        by_name
    };
    match matches.as_slice() {
        [habit] => Ok(habit.id.clone()),
        [] => bail!("no habit matches `{query}`"),
        _ => bail!("`{query}` matches {} habits", matches.len()),
    }
}
