//! Edit Classifier: one pass over a task's transcript events, deciding for
//! every touched path whether the task created, edited or deleted it.
//!
//! The decision is a heuristic over what the transcript says, not a
//! filesystem diff. The first whole-file write to an unseen path counts as a
//! creation even if the file existed before the task began.

use crate::config::ToolNames;
use crate::definition;
use crate::paths;
use crate::report::FileOperationReport;
use crate::shell;
use claude_transcript::TranscriptEvent;
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileStatus {
    Created,
    Edited,
    Deleted,
}

static SKILL_FILE_RE: OnceLock<Regex> = OnceLock::new();
static AGENT_FILE_RE: OnceLock<Regex> = OnceLock::new();

fn skill_file_re() -> &'static Regex {
    SKILL_FILE_RE
        .get_or_init(|| Regex::new(r"(?:^|/)skills/[^/]+/SKILL\.md$").expect("valid skill regex"))
}

fn agent_file_re() -> &'static Regex {
    AGENT_FILE_RE
        .get_or_init(|| Regex::new(r"(?:^|/)agents/[^/]+\.md$").expect("valid agent regex"))
}

pub struct EditClassifier {
    tools: ToolNames,
    base_dir: Option<PathBuf>,
    home: Option<PathBuf>,
}

impl EditClassifier {
    pub fn new(tools: ToolNames) -> Self {
        EditClassifier {
            tools,
            base_dir: None,
            home: None,
        }
    }

    /// Directory relative paths are resolved against (the task's cwd).
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Home directory consulted when resolving skills loaded by name.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    pub fn classify<I>(&self, events: I) -> FileOperationReport
    where
        I: IntoIterator<Item = TranscriptEvent>,
    {
        let mut pass = Pass::default();
        for event in events {
            match &event {
                TranscriptEvent::ToolInvocation { tool_name, .. } => {
                    pass.report.tool_invocations += 1;
                    self.apply(&mut pass, tool_name, &event);
                }
                TranscriptEvent::Unparsed { .. } => pass.report.unparsed_lines += 1,
                TranscriptEvent::ToolResult { .. } | TranscriptEvent::AssistantMessage { .. } => {}
            }
        }
        pass.finish()
    }

    fn apply(&self, pass: &mut Pass, tool: &str, event: &TranscriptEvent) {
        if self.tools.is_write(tool) {
            if let Some(path) = first_argument(event, &["file_path", "path"]) {
                pass.write(self.resolve(path));
            }
        } else if self.tools.is_edit(tool) {
            if let Some(path) = first_argument(event, &["file_path", "notebook_path", "path"]) {
                pass.edit(self.resolve(path));
            }
        } else if self.tools.is_command(tool) {
            if let Some(command) = event.argument("command") {
                for target in shell::deletion_targets(command) {
                    pass.delete(self.resolve(&target.path), target.recursive);
                }
            }
        } else if self.tools.is_read(tool) {
            if let Some(path) = first_argument(event, &["file_path", "path"]) {
                self.note_read(pass, path);
            }
        } else if self.tools.is_skill(tool) {
            if let Some(name) = first_argument(event, &["skill", "name"]) {
                self.note_skill(pass, name);
            }
        }
    }

    fn note_read(&self, pass: &mut Pass, path: &str) {
        let resolved = self.resolve(path);
        if skill_file_re().is_match(&resolved) {
            pass.report.push_skill(resolved);
        } else if agent_file_re().is_match(&resolved) && pass.report.definition_file.is_none() {
            pass.report.definition_file = Some(resolved);
        }
    }

    fn note_skill(&self, pass: &mut Pass, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        match definition::resolve_skill_file(name, self.base_dir.as_deref(), self.home.as_deref()) {
            Some(path) => pass.report.push_skill(path.to_string_lossy().into_owned()),
            None => pass.report.push_skill(name),
        }
    }

    fn resolve(&self, path: &str) -> String {
        paths::resolve_against(self.base_dir.as_deref(), path)
            .to_string_lossy()
            .into_owned()
    }
}

fn first_argument<'a>(event: &'a TranscriptEvent, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| event.argument(k))
        .filter(|v| !v.trim().is_empty())
}

/// Working state for one classification pass. Paths that resolve to
/// nothing (`.` with no base dir) are never tracked.
#[derive(Default)]
struct Pass {
    status: HashMap<String, FileStatus>,
    report: FileOperationReport,
}

impl Pass {
    fn write(&mut self, path: String) {
        if !path.is_empty() {
            self.status.entry(path).or_insert(FileStatus::Created);
        }
    }

    fn edit(&mut self, path: String) {
        if !path.is_empty() {
            self.status.entry(path).or_insert(FileStatus::Edited);
        }
    }

    fn delete(&mut self, path: String, recursive: bool) {
        if path.is_empty() {
            return;
        }
        if recursive {
            let prefix = format!("{}/", path.trim_end_matches('/'));
            for (p, status) in self.status.iter_mut() {
                if p.starts_with(&prefix) {
                    *status = FileStatus::Deleted;
                }
            }
        }
        self.status.insert(path, FileStatus::Deleted);
    }

    fn finish(mut self) -> FileOperationReport {
        for (path, status) in self.status {
            let set = match status {
                FileStatus::Created => &mut self.report.created,
                FileStatus::Edited => &mut self.report.edited,
                FileStatus::Deleted => &mut self.report.deleted,
            };
            set.insert(path);
        }
        self.report
    }
}
