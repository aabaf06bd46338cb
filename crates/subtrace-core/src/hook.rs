//! Host hook payloads and the dispatcher that maps lifecycle events onto
//! the coordinator.
//!
//! | event           | condition                 | action                 |
//! |-----------------|---------------------------|------------------------|
//! | `PreToolUse`    | delegation tool           | start, keyed by tool use id |
//! | `SubagentStart` | `agent_id` present        | start, keyed by agent id    |
//! | `PostToolUse`   | delegation tool           | stop, keyed by tool use id  |
//! | `SubagentStop`  | `agent_id` present        | stop, keyed by agent id     |
//!
//! Everything else passes through untouched.

use crate::config::ToolNames;
use crate::coordinator::{Coordinator, TaskMetadata};
use crate::error::Result;
use crate::paths;
use crate::report::FileOperationReport;
use crate::store::{TaskKey, TaskStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One hook invocation as sent by the host on stdin.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HookInput {
    pub hook_event_name: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<Value>,
    #[serde(default)]
    pub tool_use_id: Option<String>,
    #[serde(default)]
    pub tool_response: Option<Value>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub agent_type: Option<String>,
    #[serde(default)]
    pub agent_transcript_path: Option<String>,
    #[serde(default)]
    pub stop_hook_active: bool,
}

/// Lifecycle events the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    SubagentStart,
    SubagentStop,
    Other,
}

impl HookEvent {
    pub fn parse(name: &str) -> Self {
        match name {
            "PreToolUse" => HookEvent::PreToolUse,
            "PostToolUse" => HookEvent::PostToolUse,
            "SubagentStart" => HookEvent::SubagentStart,
            "SubagentStop" => HookEvent::SubagentStop,
            _ => HookEvent::Other,
        }
    }
}

impl HookInput {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn event(&self) -> HookEvent {
        HookEvent::parse(&self.hook_event_name)
    }

    fn tool_arg(&self, key: &str) -> Option<String> {
        self.tool_input
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn delegated_tool_use(&self, tools: &ToolNames) -> Option<TaskKey> {
        let tool = self.tool_name.as_deref()?;
        if !tools.is_delegate(tool) {
            return None;
        }
        non_empty(self.tool_use_id.as_deref()).map(TaskKey::ToolUse)
    }

    fn agent_key(&self) -> Option<TaskKey> {
        non_empty(self.agent_id.as_deref()).map(TaskKey::Agent)
    }

    /// Subagent id the host reports in a delegation tool's response.
    fn response_agent_id(&self) -> Option<String> {
        self.tool_response
            .as_ref()
            .and_then(|v| v.get("agentId"))
            .and_then(Value::as_str)
            .and_then(|s| non_empty(Some(s)))
    }

    /// Log of the delegated work. `transcript_path` is the parent session's
    /// log and is never classified itself; it only locates the subagent's
    /// log when the host does not name it.
    fn stop_transcript(&self, agent_id: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = non_empty(self.agent_transcript_path.as_deref()) {
            return Some(PathBuf::from(path));
        }
        let agent_id = non_empty(agent_id)?;
        if paths::validate_name(&agent_id).is_err() {
            tracing::debug!(agent_id = %agent_id, "not deriving a transcript path for unsafe agent id");
            return None;
        }
        let session = PathBuf::from(non_empty(self.transcript_path.as_deref())?);
        Some(subagent_transcript(&session, &agent_id))
    }
}

/// `agent-<id>.jsonl` next to the session log, or under
/// `<session>/subagents/` where the host nests them. The first that exists
/// wins; otherwise the sibling path, which reads as empty.
fn subagent_transcript(session: &Path, agent_id: &str) -> PathBuf {
    let file = format!("agent-{agent_id}.jsonl");
    let dir = session.parent().unwrap_or_else(|| Path::new(""));
    let sibling = dir.join(&file);
    let nested = session
        .file_stem()
        .map(|stem| dir.join(stem).join("subagents").join(&file));
    [Some(sibling.clone()), nested]
        .into_iter()
        .flatten()
        .find(|p| p.is_file())
        .unwrap_or(sibling)
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The single JSON document written to stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResponse {
    /// Always true: this hook never stops the session.
    #[serde(rename = "continue")]
    pub continue_: bool,
    pub suppress_output: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<FileOperationReport>,
}

impl HookResponse {
    pub fn pass() -> Self {
        HookResponse {
            continue_: true,
            suppress_output: true,
            decision: None,
            reason: None,
            system_message: None,
            report: None,
        }
    }

    pub fn with_report(report: FileOperationReport) -> Self {
        HookResponse {
            report: Some(report),
            ..HookResponse::pass()
        }
    }

    /// Strict-mode failure: surfaced to the developer as a blocking decision.
    pub fn block(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        HookResponse {
            suppress_output: false,
            decision: Some("block".to_string()),
            system_message: Some(format!("subtrace: {reason}")),
            reason: Some(reason),
            ..HookResponse::pass()
        }
    }

    pub fn is_block(&self) -> bool {
        self.decision.as_deref() == Some("block")
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// What a hook invocation asks the coordinator to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Start { key: TaskKey, metadata: TaskMetadata },
    Stop { key: TaskKey, transcript: Option<PathBuf> },
    Ignore,
}

pub fn plan(input: &HookInput, tools: &ToolNames) -> Action {
    let session_id = input.session_id.clone().unwrap_or_default();
    let cwd = input.cwd.clone().unwrap_or_default();

    match input.event() {
        HookEvent::PreToolUse => match input.delegated_tool_use(tools) {
            Some(key) => Action::Start {
                key,
                metadata: TaskMetadata {
                    agent_type: input.tool_arg("subagent_type").unwrap_or_default(),
                    session_id,
                    prompt: input.tool_arg("prompt").unwrap_or_default(),
                    description: input.tool_arg("description"),
                    cwd,
                    transcript_path: None,
                },
            },
            None => Action::Ignore,
        },
        HookEvent::SubagentStart => match input.agent_key() {
            Some(key) => Action::Start {
                key,
                metadata: TaskMetadata {
                    agent_type: input.agent_type.clone().unwrap_or_default(),
                    session_id,
                    prompt: String::new(),
                    description: None,
                    cwd,
                    transcript_path: non_empty(input.agent_transcript_path.as_deref()),
                },
            },
            None => Action::Ignore,
        },
        HookEvent::PostToolUse => match input.delegated_tool_use(tools) {
            Some(key) => Action::Stop {
                key,
                transcript: input.stop_transcript(input.response_agent_id().as_deref()),
            },
            None => Action::Ignore,
        },
        HookEvent::SubagentStop => match input.agent_key() {
            Some(key) => Action::Stop {
                key,
                transcript: input.stop_transcript(input.agent_id.as_deref()),
            },
            None => Action::Ignore,
        },
        HookEvent::Other => Action::Ignore,
    }
}

/// Run one hook invocation. Never fails: in the default mode every internal
/// error degrades to a pass-through; with `strict` it becomes a block.
pub fn dispatch<S: TaskStore>(input: &HookInput, coordinator: &Coordinator<S>, strict: bool) -> HookResponse {
    let action = plan(input, coordinator.tools());
    tracing::debug!(event = %input.hook_event_name, ?action, "hook dispatch");

    match action {
        Action::Ignore => HookResponse::pass(),
        Action::Start { key, metadata } if strict => match coordinator.try_task_start(&key, metadata) {
            Ok(()) => HookResponse::pass(),
            Err(e) => strict_failure(input, format!("task start for {key} failed: {e}")),
        },
        Action::Start { key, metadata } => {
            coordinator.on_task_start(&key, metadata);
            HookResponse::pass()
        }
        Action::Stop { key, transcript } if strict => {
            match coordinator.try_task_stop(&key, transcript.as_deref()) {
                Ok(report) => HookResponse::with_report(report),
                Err(e) => strict_failure(input, format!("task stop for {key} failed: {e}")),
            }
        }
        Action::Stop { key, transcript } => {
            HookResponse::with_report(coordinator.on_task_stop(&key, transcript.as_deref()))
        }
    }
}

/// Parse raw stdin and dispatch it.
pub fn handle<S: TaskStore>(raw: &str, coordinator: &Coordinator<S>, strict: bool) -> HookResponse {
    match HookInput::parse(raw) {
        Ok(input) => dispatch(&input, coordinator, strict),
        Err(e) => {
            coordinator.diagnostics().error("hook", format!("unparsable hook input: {e}"));
            if strict {
                HookResponse::block(format!("unparsable hook input: {e}"))
            } else {
                tracing::warn!("ignoring unparsable hook input: {e}");
                HookResponse::pass()
            }
        }
    }
}

/// A stop hook that is already continuing because of an earlier block must
/// not block again, or the host loops.
fn strict_failure(input: &HookInput, reason: String) -> HookResponse {
    if input.stop_hook_active {
        tracing::warn!("{reason} (not blocking: stop hook already active)");
        return HookResponse {
            system_message: Some(format!("subtrace: {reason}")),
            ..HookResponse::pass()
        };
    }
    HookResponse::block(reason)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
