//! Error types for team execution and evaluation.

use thiserror::Error;

use crate::config::TeamRole;
use crate::llm::PromptError;

/// Errors surfaced by the pipeline and evaluators.
///
/// Only pipeline-fatal failures (creator or leader stage, or a storage
/// failure) reach callers as `Err`. Checker failures, single benchmark-task
/// failures, and one-sided A/B failures are absorbed into result structures
/// instead.
#[derive(Debug, Error)]
pub enum TeamError {
    /// A prompt call for a pipeline stage failed.
    #[error("{role} stage failed: {source}")]
    Stage {
        role: TeamRole,
        #[source]
        source: PromptError,
    },

    /// An opaque team-runner callback failed.
    #[error("team runner failed: {0}")]
    Runner(String),

    /// The evaluation store failed.
    #[error("evaluation store error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A persisted record could not be decoded.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),
}
