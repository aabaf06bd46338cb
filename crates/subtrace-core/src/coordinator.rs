//! Correlation Coordinator: the two lifecycle edges of a delegated task.
//!
//! ```text
//! start ── put(key, record) ──► store
//! stop  ── get(key) ──► record ─┐
//!          read(transcript) ─► classify ─► merge ─► report
//!          remove(key)   (always, even when classification failed)
//! ```
//!
//! `on_task_start` / `on_task_stop` never fail the caller. The `try_*`
//! variants surface the first internal error for strict mode, after doing
//! the same work (including cleanup).

use crate::classifier::EditClassifier;
use crate::config::ToolNames;
use crate::definition;
use crate::diagnostics::{Diagnostics, EntryKind};
use crate::error::{Result, SubtraceError};
use crate::report::FileOperationReport;
use crate::store::{PendingTaskRecord, TaskKey, TaskStore};
use chrono::Utc;
use claude_transcript::{TranscriptError, TranscriptReader};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

const START_EVENT: &str = "onTaskStart";
const STOP_EVENT: &str = "onTaskStop";

/// Start-time metadata supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetadata {
    pub agent_type: String,
    pub session_id: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub cwd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,
}

impl TaskMetadata {
    fn into_record(self, key: &TaskKey) -> PendingTaskRecord {
        let (tool_use_id, agent_id) = match key {
            TaskKey::ToolUse(id) => (Some(id.clone()), None),
            TaskKey::Agent(id) => (None, Some(id.clone())),
        };
        PendingTaskRecord {
            tool_use_id,
            agent_id,
            agent_type: self.agent_type,
            session_id: self.session_id,
            prompt: self.prompt,
            description: self.description.filter(|d| !d.is_empty()),
            cwd: self.cwd,
            timestamp: Utc::now(),
            transcript_path: self.transcript_path.filter(|p| !p.is_empty()),
        }
    }
}

/// A stop-time report plus every error recovered while producing it.
struct StopOutcome {
    report: FileOperationReport,
    errors: Vec<SubtraceError>,
}

pub struct Coordinator<S: TaskStore> {
    store: S,
    tools: ToolNames,
    diagnostics: Diagnostics,
    home: Option<PathBuf>,
}

impl<S: TaskStore> Coordinator<S> {
    pub fn new(store: S) -> Self {
        Coordinator {
            store,
            tools: ToolNames::default(),
            diagnostics: Diagnostics::disabled(),
            home: definition::home_dir(),
        }
    }

    pub fn with_tools(mut self, tools: ToolNames) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Override the home directory searched for global agents and skills.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tools(&self) -> &ToolNames {
        &self.tools
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    // -----------------------------------------------------------------------
    // Start
    // -----------------------------------------------------------------------

    /// Record `metadata` under `key`. Errors are logged and swallowed.
    pub fn on_task_start(&self, key: &TaskKey, metadata: TaskMetadata) {
        if let Err(e) = self.try_task_start(key, metadata) {
            tracing::warn!(%key, "task start not recorded: {e}");
        }
    }

    pub fn try_task_start(&self, key: &TaskKey, metadata: TaskMetadata) -> Result<()> {
        self.diagnostics.record(
            START_EVENT,
            EntryKind::Input,
            &json!({ "key": key.as_str(), "metadata": &metadata }),
        );
        let record = metadata.into_record(key);
        match self.store.put(key.as_str(), &record) {
            Ok(()) => {
                tracing::debug!(%key, agent_type = %record.agent_type, "task start recorded");
                self.diagnostics.record(START_EVENT, EntryKind::Output, &record);
                Ok(())
            }
            Err(e) => {
                self.diagnostics.error(START_EVENT, &e);
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Build the report for `key` and forget its pending record. Always
    /// returns a report; a stop without a matching start yields empty
    /// metadata.
    pub fn on_task_stop(&self, key: &TaskKey, transcript: Option<&Path>) -> FileOperationReport {
        let outcome = self.stop(key, transcript);
        for e in &outcome.errors {
            tracing::warn!(%key, "task stop degraded: {e}");
        }
        outcome.report
    }

    /// Like [`Coordinator::on_task_stop`] but returns the first recovered
    /// error instead of the report. The pending record is removed either way.
    pub fn try_task_stop(&self, key: &TaskKey, transcript: Option<&Path>) -> Result<FileOperationReport> {
        let outcome = self.stop(key, transcript);
        match outcome.errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(outcome.report),
        }
    }

    fn stop(&self, key: &TaskKey, transcript: Option<&Path>) -> StopOutcome {
        self.diagnostics.record(
            STOP_EVENT,
            EntryKind::Input,
            &json!({
                "key": key.as_str(),
                "transcriptPath": transcript.map(|p| p.display().to_string()),
            }),
        );
        let mut errors = Vec::new();

        let record = self.store.get(key.as_str()).unwrap_or_else(|e| {
            errors.push(e);
            None
        });
        if record.is_none() {
            tracing::debug!(%key, "no pending record; reporting without metadata");
        }

        let transcript = transcript
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or_else(|| {
                record
                    .as_ref()
                    .and_then(|r| r.transcript_path.as_ref())
                    .map(PathBuf::from)
            });
        let cwd = record
            .as_ref()
            .map(|r| r.cwd.as_str())
            .filter(|c| !c.is_empty())
            .map(PathBuf::from);

        let mut classifier = EditClassifier::new(self.tools.clone()).with_home(self.home.clone());
        if let Some(dir) = &cwd {
            classifier = classifier.with_base_dir(dir);
        }
        let mut report = match &transcript {
            Some(path) => match open_transcript(path) {
                Ok(reader) => classifier.classify(reader),
                Err(e) => {
                    errors.push(e);
                    classifier.classify(TranscriptReader::empty())
                }
            },
            None => classifier.classify(TranscriptReader::empty()),
        };

        report.key = key.as_str().to_string();
        report.transcript_path = transcript.map(|p| p.to_string_lossy().into_owned());
        report.completed_at = Some(Utc::now());
        if let Some(record) = record {
            merge_record(&mut report, record);
        }
        if let Err(e) = self.apply_definition(&mut report, cwd.as_deref()) {
            errors.push(e);
        }

        if let Err(e) = self.store.remove(key.as_str()) {
            errors.push(e);
        }

        for e in &errors {
            self.diagnostics.error(STOP_EVENT, e);
        }
        self.diagnostics.record(STOP_EVENT, EntryKind::Output, &report);
        tracing::debug!(%key, summary = %report.summary(), "task stop classified");
        StopOutcome { report, errors }
    }

    /// Fill in the agent definition and its declared skills when the
    /// transcript did not reveal a definition file itself.
    fn apply_definition(&self, report: &mut FileOperationReport, cwd: Option<&Path>) -> Result<()> {
        if report.definition_file.is_some() || report.subagent_type.is_empty() {
            return Ok(());
        }
        let Some(def) = definition::load(&report.subagent_type, cwd, self.home.as_deref())? else {
            return Ok(());
        };
        report.definition_file = Some(def.path.to_string_lossy().into_owned());

        let loaded = std::mem::take(&mut report.preloaded_skill_files);
        for skill in &def.skills {
            match definition::resolve_skill_file(skill, cwd, self.home.as_deref()) {
                Some(path) => report.push_skill(path.to_string_lossy().into_owned()),
                None => report.push_skill(skill.as_str()),
            }
        }
        for skill in loaded {
            report.push_skill(skill);
        }
        Ok(())
    }
}

/// Open a transcript for reading. A file that does not exist (yet, or any
/// more) is not an error; anything else is.
fn open_transcript(path: &Path) -> Result<TranscriptReader> {
    match TranscriptReader::open(path) {
        Ok(reader) => Ok(reader),
        Err(TranscriptError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "transcript missing; classifying nothing");
            Ok(TranscriptReader::empty())
        }
        Err(e) => Err(e.into()),
    }
}

fn merge_record(report: &mut FileOperationReport, record: PendingTaskRecord) {
    report.session_id = record.session_id;
    report.subagent_type = record.agent_type;
    report.prompt = record.prompt;
    report.description = record.description;
    report.cwd = record.cwd;
    report.started_at = Some(record.timestamp);
    if report.transcript_path.is_none() {
        report.transcript_path = record.transcript_path;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
