//! `subtrace-core`: correlates delegated Claude tasks with the file changes
//! they made.
//!
//! A task's start and stop arrive in separate hook processes. The start
//! handler records metadata in a shared [`store::JsonFileStore`]; the stop
//! handler reads it back, classifies the task's transcript and returns one
//! [`report::FileOperationReport`].
//!
//! ```text
//! hook stdin ─► hook::dispatch ─► Coordinator ─┬─► TaskStore (pending-tasks.json)
//!                                              ├─► claude_transcript::TranscriptReader
//!                                              ├─► EditClassifier
//!                                              └─► definition (agents / skills)
//! ```

pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod definition;
pub mod diagnostics;
pub mod error;
pub mod hook;
pub mod io;
pub mod paths;
pub mod report;
pub mod shell;
pub mod store;

pub use classifier::EditClassifier;
pub use config::{Config, ToolNames};
pub use coordinator::{Coordinator, TaskMetadata};
pub use diagnostics::Diagnostics;
pub use error::{Result, SubtraceError};
pub use hook::{HookInput, HookResponse};
pub use report::FileOperationReport;
pub use store::{JsonFileStore, PendingTaskRecord, TaskKey, TaskStore};
