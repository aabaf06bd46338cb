//! Event Store: the pending-task map shared across hook processes.
//!
//! The only state that survives between a task's start and stop events.
//! Backed by a single JSON object file whose keys are correlation keys.
//! Every mutation is a read-entire-file, modify-map, write-entire-file
//! round trip so sibling keys written by other processes survive; there is
//! no lock, so two writers whose round trips overlap can still lose one
//! update.

use crate::error::{Result, SubtraceError};
use crate::io;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Correlation key linking a task's start event to its stop event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskKey {
    /// Id of the tool invocation that delegated the work
    ToolUse(String),
    /// Id the host assigned to the subagent
    Agent(String),
}

impl TaskKey {
    pub fn as_str(&self) -> &str {
        match self {
            TaskKey::ToolUse(id) | TaskKey::Agent(id) => id,
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start-time metadata for one unit of delegated work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTaskRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub agent_type: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub cwd: String,
    pub timestamp: DateTime<Utc>,
    /// Known at start time only for some hosts; usually filled at stop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,
}

impl PendingTaskRecord {
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.timestamp)
    }
}

// ---------------------------------------------------------------------------
// TaskStore
// ---------------------------------------------------------------------------

/// Key-value contract the coordinator relies on. Backings other than the
/// flat JSON file (embedded database, external cache) plug in here.
pub trait TaskStore {
    fn put(&self, key: &str, record: &PendingTaskRecord) -> Result<()>;

    /// `None` when the key is absent or its entry is unreadable.
    fn get(&self, key: &str) -> Result<Option<PendingTaskRecord>>;

    /// Returns whether the key was present. Removing an absent key is not an
    /// error.
    fn remove(&self, key: &str) -> Result<bool>;

    /// All readable records, ordered by key.
    fn list(&self) -> Result<Vec<(String, PendingTaskRecord)>>;
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

pub struct JsonFileStore {
    path: PathBuf,
}

/// Result of reading the backing file.
struct Loaded {
    map: Map<String, Value>,
    /// The file existed but was not a JSON object.
    corrupt: bool,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Loaded> {
        let Some(data) = io::read_bytes_if_exists(&self.path)? else {
            return Ok(Loaded {
                map: Map::new(),
                corrupt: false,
            });
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Loaded {
                map: Map::new(),
                corrupt: false,
            });
        }
        // invalid UTF-8 is a parse error here, same as malformed JSON
        match serde_json::from_slice::<Value>(&data) {
            Ok(Value::Object(map)) => Ok(Loaded {
                map,
                corrupt: false,
            }),
            Ok(_) | Err(_) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "pending-task store is not a JSON object; treating as empty"
                );
                Ok(Loaded {
                    map: Map::new(),
                    corrupt: true,
                })
            }
        }
    }

    fn save(&self, map: &Map<String, Value>) -> Result<()> {
        let data = serde_json::to_string_pretty(map)?;
        io::atomic_write(&self.path, data.as_bytes())
    }

    /// Remove records older than `cutoff` in a single read-modify-write.
    /// Entries that do not parse as records are left alone. Returns the
    /// removed keys; with `dry_run` nothing is written.
    pub fn prune_older_than(&self, cutoff: DateTime<Utc>, dry_run: bool) -> Result<Vec<String>> {
        let Loaded { mut map, .. } = self.load()?;
        let stale: Vec<String> = map
            .iter()
            .filter_map(|(key, value)| {
                let record: PendingTaskRecord = serde_json::from_value(value.clone()).ok()?;
                (record.timestamp < cutoff).then(|| key.clone())
            })
            .collect();
        if stale.is_empty() || dry_run {
            return Ok(stale);
        }
        for key in &stale {
            map.remove(key);
        }
        self.save(&map)?;
        tracing::info!(removed = stale.len(), "pruned orphaned pending tasks");
        Ok(stale)
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(SubtraceError::EmptyKey);
    }
    Ok(())
}

impl TaskStore for JsonFileStore {
    fn put(&self, key: &str, record: &PendingTaskRecord) -> Result<()> {
        check_key(key)?;
        let Loaded { mut map, .. } = self.load()?;
        map.insert(key.to_string(), serde_json::to_value(record)?);
        self.save(&map)
    }

    fn get(&self, key: &str) -> Result<Option<PendingTaskRecord>> {
        let Loaded { mut map, .. } = self.load()?;
        let Some(value) = map.remove(key) else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(key, "unreadable pending-task entry: {e}");
                Ok(None)
            }
        }
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let Loaded { mut map, corrupt } = self.load()?;
        let present = map.remove(key).is_some();
        if present || corrupt {
            self.save(&map)?;
        }
        Ok(present)
    }

    fn list(&self) -> Result<Vec<(String, PendingTaskRecord)>> {
        let Loaded { map, .. } = self.load()?;
        let mut records: Vec<(String, PendingTaskRecord)> = map
            .into_iter()
            .filter_map(|(key, value)| {
                let record = serde_json::from_value(value).ok()?;
                Some((key, record))
            })
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
