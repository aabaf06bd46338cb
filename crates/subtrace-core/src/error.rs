use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubtraceError {
    #[error("invalid correlation key: must be non-empty")]
    EmptyKey,

    #[error("invalid agent or skill name '{0}': must be a plain name without path separators")]
    InvalidName(String),

    #[error("transcript unreadable: {0}")]
    Transcript(#[from] claude_transcript::TranscriptError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SubtraceError>;
