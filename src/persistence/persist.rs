use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::board_utils::bubble::{TaskId, TaskRecord};
use crate::board_utils::color::{Color, ColorError};

pub const TASKS_KEY: &str = "tasks";
pub const THEME_KEY: &str = "dark-theme";
const CORRUPT_PREFIX: &str = "tasks-corrupt-";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("task {identifier} has an invalid color")]
    InvalidColor {
        identifier: TaskId,
        #[source]
        source: ColorError,
    },
    #[error("task identifier {identifier} leaves no room for new tasks")]
    IdentifierOverflow { identifier: TaskId },
}

/// String key-value storage the board persists into.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let mut f = File::open(path)?;
        let mut buf = String::new();
        f.read_to_string(&mut buf)?;
        Ok(Some(buf))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;
        atomic_write(&self.path_for(key), value.as_bytes())?;
        Ok(())
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut f = File::create(&tmp_path)?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

/// Wire shape of one entry of the `tasks` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTask {
    pub title: String,
    #[serde(default)]
    pub date: String,
    pub color: String,
    #[serde(default = "StoredTask::default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub identifier: TaskId,
}

impl StoredTask {
    fn default_scale() -> f32 {
        1.0
    }
}

impl From<&TaskRecord> for StoredTask {
    fn from(r: &TaskRecord) -> Self {
        Self {
            title: r.title.clone(),
            date: r.date.clone(),
            color: r.color.to_hex(),
            scale: r.scale,
            completed: r.completed,
            identifier: r.identifier,
        }
    }
}

impl TryFrom<StoredTask> for TaskRecord {
    type Error = PersistError;

    fn try_from(s: StoredTask) -> Result<Self, Self::Error> {
        let color = Color::from_hex(&s.color)
            .map_err(|source| PersistError::InvalidColor { identifier: s.identifier, source })?;
        Ok(Self {
            identifier: s.identifier,
            title: s.title,
            date: s.date,
            color,
            scale: if s.scale.is_finite() && s.scale > 0.0 { s.scale } else { 1.0 },
            completed: s.completed,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoadedTasks {
    pub active: Vec<TaskRecord>,
    pub completed: Vec<TaskRecord>,
    pub next_id: TaskId,
}

impl LoadedTasks {
    pub fn empty() -> Self {
        Self { active: Vec::new(), completed: Vec::new(), next_id: 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.completed.is_empty()
    }

    /// Split by completion; the next identifier is one past the largest stored.
    /// A largest identifier that cannot be advanced makes the list unusable.
    pub fn partition(records: Vec<TaskRecord>) -> Result<Self, PersistError> {
        let next_id = match records.iter().map(|r| r.identifier).max() {
            Some(max) => max.checked_add(1).ok_or(PersistError::IdentifierOverflow { identifier: max })?,
            None => 1,
        };
        let (completed, active) = records.into_iter().partition(|r| r.completed);
        Ok(Self { active, completed, next_id })
    }
}

pub fn encode_tasks(records: &[TaskRecord]) -> Result<String, PersistError> {
    let stored: Vec<StoredTask> = records.iter().map(StoredTask::from).collect();
    Ok(serde_json::to_string(&stored)?)
}

pub fn decode_tasks(raw: &str) -> Result<Vec<TaskRecord>, PersistError> {
    // a stored `null` behaves like nothing stored
    let stored: Option<Vec<StoredTask>> = serde_json::from_str(raw)?;
    stored.unwrap_or_default().into_iter().map(TaskRecord::try_from).collect()
}

pub fn save_tasks(store: &mut dyn KeyValueStore, records: &[TaskRecord]) -> Result<(), PersistError> {
    let encoded = encode_tasks(records)?;
    store.set(TASKS_KEY, &encoded)
}

pub fn load_tasks(store: &dyn KeyValueStore) -> Result<LoadedTasks, PersistError> {
    match store.get(TASKS_KEY)? {
        Some(raw) => LoadedTasks::partition(decode_tasks(&raw)?),
        None => Ok(LoadedTasks::empty()),
    }
}

/// Load tasks, falling back to an empty board when the stored value cannot be
/// used. The unusable value is copied under a time-stamped key first so the
/// next save cannot destroy it.
pub fn load_tasks_or_recover(store: &mut dyn KeyValueStore) -> (LoadedTasks, Option<PersistError>) {
    match load_tasks(store) {
        Ok(loaded) => (loaded, None),
        Err(err) => {
            log::error!("stored tasks rejected: {err}");
            match store.get(TASKS_KEY) {
                Ok(Some(raw)) => {
                    let key = format!("{CORRUPT_PREFIX}{}", timestamp_now());
                    match store.set(&key, &raw) {
                        Ok(()) => log::warn!("kept unreadable tasks under `{key}`"),
                        Err(e) => log::error!("could not back up unreadable tasks: {e}"),
                    }
                }
                Ok(None) => {}
                Err(e) => log::error!("could not re-read tasks for backup: {e}"),
            }
            (LoadedTasks::empty(), Some(err))
        }
    }
}

pub fn save_theme(store: &mut dyn KeyValueStore, dark: bool) -> Result<(), PersistError> {
    store.set(THEME_KEY, &serde_json::to_string(&dark)?)
}

pub fn load_theme(store: &dyn KeyValueStore) -> bool {
    match store.get(THEME_KEY) {
        Ok(Some(raw)) => serde_json::from_str::<Option<bool>>(&raw).ok().flatten().unwrap_or(false),
        Ok(None) => false,
        Err(e) => {
            log::warn!("theme unreadable, using light: {e}");
            false
        }
    }
}

fn timestamp_now() -> String {
    let now = OffsetDateTime::now_utc();
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    now.format(fmt).unwrap_or_else(|_| "unknown".to_string())
}

/// Full board export written as pretty RON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub tasks: Vec<StoredTask>,
    pub dark_theme: bool,
}

impl BoardSnapshot {
    pub fn from_records(records: &[TaskRecord], dark_theme: bool) -> Self {
        Self { tasks: records.iter().map(StoredTask::from).collect(), dark_theme }
    }
}

pub fn save_snapshot(dir: &Path, snapshot: &BoardSnapshot) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let pretty = PrettyConfig::new()
        .separate_tuple_members(true)
        .enumerate_arrays(true);
    let s = ron::ser::to_string_pretty(snapshot, pretty)?;
    let path = dir.join(format!("board_{}.ron", timestamp_now()));
    atomic_write(&path, s.as_bytes())?;
    Ok(path)
}

pub fn load_snapshot(path: &Path) -> anyhow::Result<BoardSnapshot> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let snapshot: BoardSnapshot = ron::from_str(&buf)?;
    Ok(snapshot)
}

pub fn list_snapshots(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = Vec::new();
    if dir.exists() {
        for e in fs::read_dir(dir)? {
            let p = e?.path();
            if let Some(name) = p.file_name().and_then(|s| s.to_str())
                && name.starts_with("board_") && name.ends_with(".ron")
            {
                entries.push(p);
            }
        }
    }
    // newest first, names carry the timestamp
    entries.sort();
    entries.reverse();
    Ok(entries)
}
