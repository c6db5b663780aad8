//! Error types for analyst-core

use crate::task::TaskStatus;
use thiserror::Error;

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for orchestration operations
///
/// The first group of variants is the orchestration taxonomy proper;
/// the remainder are supporting failures (lookup, validation, I/O).
/// Partial failures are not errors - they travel as data alongside the
/// opinions a strategy run did produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Illegal state-machine move on a task
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    /// Actor lacks permission for the requested mutation
    #[error("'{actor}' is not allowed to modify task {task_id}")]
    Unauthorized { actor: String, task_id: String },

    /// Selection found no eligible candidate
    #[error("no available agent among {candidates} candidate(s)")]
    NoAvailableAgent { candidates: usize },

    /// Every agent in a strategy run failed
    #[error("all {attempted} participant(s) failed")]
    AllParticipantsFailed { attempted: usize },

    /// A single agent call exceeded its time budget
    #[error("agent '{agent_id}' timed out after {timeout_ms}ms")]
    AgentTimeout { agent_id: String, timeout_ms: u64 },

    /// A whole task/session exceeded its wall-clock budget
    #[error("task '{task_id}' timed out after {timeout_ms}ms")]
    SessionTimeout { task_id: String, timeout_ms: u64 },

    /// Persistence collaborator I/O failure
    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// Retry requested after the retry budget was spent
    #[error("task '{task_id}' exhausted its retry limit of {retry_limit}")]
    RetryExhausted { task_id: String, retry_limit: u32 },

    /// Unknown task id
    #[error("task '{0}' not found")]
    TaskNotFound(String),

    /// Unknown agent id
    #[error("agent '{0}' not found")]
    AgentNotFound(String),

    /// Task specification failed validation
    #[error("invalid task spec: {0}")]
    InvalidSpec(String),

    /// Analysis producer failure
    #[error("producer for agent '{agent_id}' failed: {reason}")]
    Producer { agent_id: String, reason: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}
