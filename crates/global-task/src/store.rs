//! Persistence for the user task list.

use crate::{TaskError, TaskResult};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;

const TASKS_KEY: &str = "tasks";
const VERSION_KEY: &str = "version";
const DEFAULT_VERSION: &str = "2.0.0";

/// Read and replace the raw task records. Records are kept as JSON values so
/// tasks this crate does not know about survive a round trip untouched.
pub trait TaskStore: Send + Sync {
    fn load(&self) -> TaskResult<Vec<Value>>;
    fn save(&self, tasks: &[Value]) -> TaskResult<()>;
}

/// A `tasks.json` document on disk: `{ "version": "2.0.0", "tasks": [...] }`.
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> TaskResult<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(TaskError::InvalidFormat(
                "top level is not an object".to_string(),
            )),
        }
    }
}

impl TaskStore for JsonTaskStore {
    fn load(&self) -> TaskResult<Vec<Value>> {
        let mut document = self.read_document()?;
        match document.remove(TASKS_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(tasks)) => Ok(tasks),
            Some(_) => Err(TaskError::InvalidFormat(format!(
                "`{}` is not an array",
                TASKS_KEY
            ))),
        }
    }

    fn save(&self, tasks: &[Value]) -> TaskResult<()> {
        let mut document = self.read_document()?;
        document
            .entry(VERSION_KEY)
            .or_insert_with(|| Value::String(DEFAULT_VERSION.to_string()));
        document.insert(TASKS_KEY.to_string(), Value::Array(tasks.to_vec()));

        let content = serde_json::to_string_pretty(&Value::Object(document))?;
        atomic_write(&self.path, &content)?;
        debug!(path = %self.path.display(), count = tasks.len(), "Task list saved");
        Ok(())
    }
}

/// Write through a sibling temp file and rename over the target, keeping the
/// target's permissions.
fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "task file has no name"))?;
    fs::create_dir_all(dir)?;

    let tmp_path = dir.join(format!(
        ".{}.tasks.tmp.{}",
        file_name,
        std::time::SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ));

    #[cfg(unix)]
    let existing_mode = match fs::metadata(path) {
        Ok(metadata) => {
            use std::os::unix::fs::PermissionsExt;
            Some(metadata.permissions().mode())
        }
        Err(_) => None,
    };

    let result = (|| -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;

        #[cfg(unix)]
        if let Some(mode) = existing_mode {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(mode))?;
        }

        fs::rename(&tmp_path, path)?;

        if let Ok(parent) = fs::File::open(dir) {
            let _ = parent.sync_all();
        }
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// In-memory store for tests and hosts without a task file.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<Vec<Value>>,
    saves: Mutex<usize>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Value>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            saves: Mutex::new(0),
        }
    }

    pub fn tasks(&self) -> Vec<Value> {
        self.tasks.lock().clone()
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl TaskStore for MemoryTaskStore {
    fn load(&self) -> TaskResult<Vec<Value>> {
        Ok(self.tasks.lock().clone())
    }

    fn save(&self, tasks: &[Value]) -> TaskResult<()> {
        *self.tasks.lock() = tasks.to_vec();
        *self.saves.lock() += 1;
        Ok(())
    }
}
