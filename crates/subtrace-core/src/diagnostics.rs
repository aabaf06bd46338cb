//! Optional JSON-Lines side log of every coordinator invocation.
//!
//! Each line is `{timestamp, event, type, data}` where `type` is one of
//! `input`, `output` or `error`. Recording never fails the caller: a write
//! error is logged through `tracing` and dropped.

use crate::io;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Input,
    Output,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub data: Value,
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    path: Option<PathBuf>,
}

impl Diagnostics {
    pub fn disabled() -> Self {
        Diagnostics { path: None }
    }

    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Diagnostics {
            path: Some(path.into()),
        }
    }

    pub fn from_path(path: Option<PathBuf>) -> Self {
        Diagnostics { path }
    }

    pub fn record<T: Serialize + ?Sized>(&self, event: &str, kind: EntryKind, data: &T) {
        let Some(path) = &self.path else {
            return;
        };
        let data = match serde_json::to_value(data) {
            Ok(v) => v,
            Err(e) => Value::String(format!("<unserialisable: {e}>")),
        };
        let entry = DiagnosticEntry {
            timestamp: Utc::now(),
            event: event.to_string(),
            kind,
            data,
        };
        let written = serde_json::to_string(&entry)
            .map_err(crate::error::SubtraceError::from)
            .and_then(|line| io::append_line(path, &line));
        if let Err(e) = written {
            tracing::warn!(path = %path.display(), "diagnostics write failed: {e}");
        }
    }

    pub fn error(&self, event: &str, message: impl std::fmt::Display) {
        self.record(event, EntryKind::Error, &message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn entries(path: &Path) -> Vec<DiagnosticEntry> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn disabled_writes_nothing() {
        let d = Diagnostics::disabled();
        d.record("onTaskStart", EntryKind::Input, &json!({"k": 1}));
    }

    #[test]
    fn appends_one_line_per_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state/diag.jsonl");
        let d = Diagnostics::to_file(&path);
        d.record("onTaskStart", EntryKind::Input, &json!({"key": "t1"}));
        d.error("onTaskStart", "store unwritable");

        let got = entries(&path);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].event, "onTaskStart");
        assert_eq!(got[0].kind, EntryKind::Input);
        assert_eq!(got[0].data["key"], "t1");
        assert_eq!(got[1].kind, EntryKind::Error);
        assert_eq!(got[1].data, json!("store unwritable"));
    }

    #[test]
    fn type_field_is_lowercase() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("diag.jsonl");
        Diagnostics::to_file(&path).record("onTaskStop", EntryKind::Output, &json!(null));
        let raw = std::fs::read_to_string(&path).unwrap();
        let v: Value = serde_json::from_str(raw.trim()).unwrap();
        assert_eq!(v["type"], "output");
        assert!(v["timestamp"].is_string());
    }

    #[test]
    fn unwritable_path_does_not_panic() {
        let dir = TempDir::new().unwrap();
        // a directory where the file should be
        let d = Diagnostics::to_file(dir.path());
        d.record("onTaskStop", EntryKind::Output, &json!({}));
    }
}
