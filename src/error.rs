//! Error types for Research Assist.

use std::time::Duration;

use uuid::Uuid;

use crate::task::TaskState;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Request-boundary validation errors. Rejected before any task or
/// memory item is created.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field {field} out of range: {message}")]
    OutOfRange { field: String, message: String },
}

/// Task registry and lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Task {id} not found")]
    NotFound { id: Uuid },

    #[error("Task {id} already claimed (state {state})")]
    AlreadyClaimed { id: Uuid, state: TaskState },

    #[error("Task {id} in state {state}, cannot transition to {target}")]
    InvalidTransition {
        id: Uuid,
        state: TaskState,
        target: TaskState,
    },

    #[error("Maximum active tasks ({max}) exceeded")]
    MaxTasksExceeded { max: usize },

    /// Surfaced by non-memory registry backends when storage is unreachable.
    #[error("Task store unavailable: {0}")]
    Unavailable(String),
}

/// Memory store errors.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Thread {thread_id} not found")]
    ThreadNotFound { thread_id: String },

    /// Surfaced by non-memory store backends when storage is unreachable.
    #[error("Memory store unavailable: {0}")]
    Unavailable(String),
}

/// Agent (external collaborator) errors. Never crash a worker; the
/// executor converts them into the owning task's error payload.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Agent request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Agent returned an invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Agent call timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
