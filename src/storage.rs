// storage.rs
//
// Key-value blob stores. The todo store writes each collection as one JSON
// string under its own key and always overwrites the whole value.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use directories::ProjectDirs;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};

pub const TASKS_KEY: &str = "tasks";
pub const REMINDERS_KEY: &str = "reminders";

pub trait KvStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "daily-todo")
}

/// Platform data directory, falling back to the working directory.
pub fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// One `<key>.json` file per key inside a directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(StoreError::Load)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            let backup_path = path.with_extension("json.bak");
            if let Err(e) = fs::copy(&path, &backup_path) {
                warn!("Failed to create backup of {}: {}", path.display(), e);
            }
        }

        // Whole-file replace: a crash leaves either the old or the new value.
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        debug!(key, bytes = value.len(), "wrote {}", path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    writes: usize,
    fail_writes: bool,
}

/// In-memory store. Clones share contents, so a caller can keep a handle to
/// inspect what the todo store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.values.insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Number of successful `set` calls so far.
    pub fn writes(&self) -> usize {
        self.inner.lock().map(|i| i.writes).unwrap_or(0)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.lock().ok().and_then(|i| i.values.get(key).cloned())
    }

    /// Make every following `set` fail, to exercise the unsaved-data path.
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_writes = fail;
        }
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| std::io::Error::other("memory store lock poisoned"))?;
        if inner.fail_writes {
            return Err(std::io::Error::other("write refused").into());
        }
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }
}
