use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, TranscriptError};

// ─── Raw transcript records ───────────────────────────────────────────────

/// One line of a Claude session transcript, as written by the host.
/// Discriminated by the JSON `"type"` field.
///
/// Only the two record kinds that carry tool traffic are modelled. Every
/// other kind (`summary`, `system`, `file-history-snapshot`, …) fails to
/// deserialize here and surfaces as [`TranscriptEvent::Unparsed`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptRecord {
    Assistant(AssistantRecord),
    User(UserRecord),
}

/// `type = "assistant"`: model output: text and tool invocations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantRecord {
    pub message: MessageBody,
}

/// `type = "user"`: prompts and tool results fed back to the model.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserRecord {
    pub message: MessageBody,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub content: MessageContent,
}

/// Message content is either a bare string or a list of typed blocks.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Blocks(Vec::new())
    }
}

/// Content blocks within a message body.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        /// Tool inputs are schema-polymorphic (varies per tool), so Value is correct here.
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    Thinking {
        thinking: String,
    },
    /// Images, documents, and any future block type
    #[serde(other)]
    Unknown,
}

impl TranscriptRecord {
    /// Parse a single non-empty transcript line.
    ///
    /// Distinguishes text that is not JSON at all ([`TranscriptError::Parse`])
    /// from valid JSON of a shape this crate does not model
    /// ([`TranscriptError::UnknownRecord`]).
    pub fn parse(line: &str) -> Result<Self> {
        match serde_json::from_str::<TranscriptRecord>(line) {
            Ok(record) => Ok(record),
            Err(source) => match serde_json::from_str::<Value>(line) {
                Ok(v) => {
                    let kind = v
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or("<untyped>")
                        .to_string();
                    Err(TranscriptError::UnknownRecord(kind))
                }
                Err(_) => Err(TranscriptError::Parse {
                    line: line.to_owned(),
                    source,
                }),
            },
        }
    }

    /// Flatten this record into events, one per meaningful content block,
    /// preserving block order.
    pub fn into_events(self) -> Vec<TranscriptEvent> {
        match self {
            TranscriptRecord::Assistant(r) => match r.message.content {
                MessageContent::Text(text) => vec![TranscriptEvent::AssistantMessage { text }],
                MessageContent::Blocks(blocks) => blocks
                    .into_iter()
                    .filter_map(|block| match block {
                        ContentBlock::Text { text } => {
                            Some(TranscriptEvent::AssistantMessage { text })
                        }
                        ContentBlock::ToolUse { id, name, input } => {
                            Some(TranscriptEvent::ToolInvocation {
                                tool_name: name,
                                tool_use_id: id,
                                arguments: input,
                            })
                        }
                        _ => None,
                    })
                    .collect(),
            },
            // User text is the prompt side of the conversation; only tool
            // results are events.
            TranscriptRecord::User(r) => match r.message.content {
                MessageContent::Text(_) => Vec::new(),
                MessageContent::Blocks(blocks) => blocks
                    .into_iter()
                    .filter_map(|block| match block {
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            is_error,
                        } => Some(TranscriptEvent::ToolResult {
                            tool_use_id,
                            payload: content,
                            is_error: is_error.unwrap_or(false),
                        }),
                        _ => None,
                    })
                    .collect(),
            },
        }
    }
}

// ─── TranscriptEvent ──────────────────────────────────────────────────────

/// A typed transcript event. The variant is decided once during parsing so
/// downstream code pattern-matches over a closed set of shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptEvent {
    ToolInvocation {
        tool_name: String,
        tool_use_id: String,
        arguments: Value,
    },
    ToolResult {
        tool_use_id: String,
        payload: Value,
        is_error: bool,
    },
    AssistantMessage {
        text: String,
    },
    /// A line that was not JSON, or JSON of an unrecognised shape. Kept so a
    /// corrupt line is visible without hiding the lines after it.
    Unparsed {
        raw: String,
    },
}

impl TranscriptEvent {
    /// Parse one transcript line into zero or more events. Never fails:
    /// anything unrecognised becomes a single [`TranscriptEvent::Unparsed`].
    pub fn from_line(line: &str) -> Vec<TranscriptEvent> {
        match TranscriptRecord::parse(line) {
            Ok(record) => record.into_events(),
            Err(e) => {
                tracing::debug!("keeping unparsed transcript line: {e}");
                vec![TranscriptEvent::Unparsed {
                    raw: line.to_owned(),
                }]
            }
        }
    }

    /// String argument `key` of a tool invocation, if present.
    pub fn argument(&self, key: &str) -> Option<&str> {
        match self {
            TranscriptEvent::ToolInvocation { arguments, .. } => {
                arguments.get(key).and_then(Value::as_str)
            }
            _ => None,
        }
    }

    pub fn tool_name(&self) -> Option<&str> {
        match self {
            TranscriptEvent::ToolInvocation { tool_name, .. } => Some(tool_name),
            _ => None,
        }
    }

    pub fn is_unparsed(&self) -> bool {
        matches!(self, TranscriptEvent::Unparsed { .. })
    }
}
