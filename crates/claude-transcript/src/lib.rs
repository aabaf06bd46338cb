//! `claude-transcript`: typed, lazy reader for Claude session transcripts.
//!
//! A transcript is the append-only JSON-Lines log the host writes for every
//! session and subagent: one record per line, with tool invocations carried
//! as `tool_use` blocks inside `assistant` records and their results as
//! `tool_result` blocks inside `user` records.
//!
//! # Architecture
//!
//! ```text
//! transcript.jsonl
//!     │
//!     ▼
//! TranscriptReader   ← reads one line at a time, never aborts on a bad line
//!     │
//!     ▼
//! TranscriptRecord   ← assistant | user, tagged by "type"
//!     │
//!     ▼
//! TranscriptEvent    ← ToolInvocation | ToolResult | AssistantMessage | Unparsed
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use claude_transcript::{read, TranscriptEvent};
//!
//! for event in read(Path::new("/tmp/agent-1234.jsonl")) {
//!     if let TranscriptEvent::ToolInvocation { tool_name, .. } = &event {
//!         println!("{tool_name}");
//!     }
//! }
//! ```

pub mod error;
pub mod reader;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::TranscriptError;
pub use reader::{read, TranscriptReader};
pub use types::{ContentBlock, MessageContent, TranscriptEvent, TranscriptRecord};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, TranscriptError>;
