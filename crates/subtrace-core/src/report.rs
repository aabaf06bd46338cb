use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What one unit of delegated work did to the filesystem, merged with the
/// metadata recorded when it started. The single document downstream
/// handlers (commit enrichment, issue sync, test triggers) consume.
///
/// `created`, `edited` and `deleted` are pairwise disjoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOperationReport {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub created: BTreeSet<String>,
    #[serde(default)]
    pub edited: BTreeSet<String>,
    #[serde(default)]
    pub deleted: BTreeSet<String>,
    #[serde(default)]
    pub subagent_type: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub definition_file: Option<String>,
    /// Skills loaded by the task, in first-seen order, without repeats.
    #[serde(default)]
    pub preloaded_skill_files: Vec<String>,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tool_invocations: usize,
    #[serde(default)]
    pub unparsed_lines: usize,
}

impl FileOperationReport {
    /// True when a start-time record was merged in.
    pub fn has_metadata(&self) -> bool {
        self.started_at.is_some()
    }

    /// True when the task touched no files.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.edited.is_empty() && self.deleted.is_empty()
    }

    /// One-line human summary, e.g. `Explore: 1 created, 2 edited, 0 deleted`.
    pub fn summary(&self) -> String {
        let who = if self.subagent_type.is_empty() {
            "task"
        } else {
            self.subagent_type.as_str()
        };
        format!(
            "{who}: {} created, {} edited, {} deleted",
            self.created.len(),
            self.edited.len(),
            self.deleted.len()
        )
    }

    /// Append `skill` unless already listed.
    pub fn push_skill(&mut self, skill: impl Into<String>) {
        let skill = skill.into();
        if !self.preloaded_skill_files.contains(&skill) {
            self.preloaded_skill_files.push(skill);
        }
    }
}
