use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::calendar::TrackedMonth;
use crate::habit::{Habit, HabitStore};

/// Persisted shape of the tracker: habits plus the tracked month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredState {
    #[serde(default)]
    pub habits: Vec<Habit>,
    pub current_month: u32,
    pub current_year: i32,
}

impl StoredState {
    pub fn from_store(store: &HabitStore) -> Self {
        let month = store.month();
        Self {
            habits: store.habits().to_vec(),
            current_month: month.month(),
            current_year: month.year(),
        }
    }

    /// Rebuilds the store; `None` when the stored month index is invalid.
    pub fn into_store(self) -> Option<HabitStore> {
        let month = TrackedMonth::new(self.current_year, self.current_month)?;
        Some(HabitStore::with_habits(month, self.habits))
    }
}

/// Read/write contract between the tracker and its storage backend.
pub trait HabitRepository: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<StoredState>>;
    fn save(&self, state: &StoredState) -> Result<()>;
}

/// Stores the state as a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HabitRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<StoredState>> {
        read_json(&self.path)
    }

    fn save(&self, state: &StoredState) -> Result<()> {
        write_json(&self.path, state)
    }
}

/// Reads a JSON document; `Ok(None)` when the file is missing or blank.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(value))
}

/// Writes `value` next to `path` and renames it into place.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let payload = serde_json::to_vec_pretty(value)?;
    let staging = staging_path(path);
    {
        let mut file = fs::File::create(&staging)
            .with_context(|| format!("failed to create {}", staging.display()))?;
        file.write_all(&payload)?;
        file.sync_all()?;
    }
    fs::rename(&staging, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Keeps the state in memory; used by tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<Option<StoredState>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoredState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    pub fn snapshot(&self) -> Option<StoredState> {
        self.state.lock().clone()
    }
}

impl HabitRepository for MemoryRepository {
    fn load(&self) -> Result<Option<StoredState>> {
        Ok(self.state.lock().clone())
    }

    fn save(&self, state: &StoredState) -> Result<()> {
        *self.state.lock() = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DAY_SLOTS;

    #[test]
    fn parses_local_storage_shape() {
        let raw = r#"{
            "habits": [{"id": "a1", "name": "Read", "days": [true, false, true]}],
            "currentMonth": 9,
            "currentYear": 2025
        }"#;
        let state: StoredState = serde_json::from_str(raw).unwrap();
        assert_eq!(state.current_month, 9);
        let store = state.into_store().unwrap();
        let habit = &store.habits()[0];
        assert_eq!(habit.id.as_str(), "a1");
        assert_eq!(habit.days.as_slice().len(), DAY_SLOTS);
        assert_eq!(habit.completed(31), 2);
    }

    #[test]
    fn invalid_month_yields_no_store() {
        let state = StoredState {
            habits: Vec::new(),
            current_month: 12,
            current_year: 2025,
        };
        assert!(state.into_store().is_none());
    }

    #[test]
    fn memory_repository_keeps_last_save() {
        let repo = MemoryRepository::new();
        assert!(repo.load().unwrap().is_none());
        let state = StoredState {
            habits: Vec::new(),
            current_month: 0,
            current_year: 2026,
        };
        repo.save(&state).unwrap();
        assert_eq!(repo.load().unwrap(), Some(state));
    }
}
