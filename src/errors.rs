//! Error types for the overseer engine
//!
//! Tool and planner faults are absorbed into memory entries and decided upon
//! by policies; only configuration-time and isolation faults propagate as
//! hard failures to the caller.

use thiserror::Error;

/// Main error type for agent and manager runs
#[derive(Error, Debug)]
pub enum AgentError {
    /// Planner named a tool that is not in the agent's registry
    #[error("Unknown tool '{tool}' requested by planner for agent '{agent_key}'")]
    ToolNotFound { tool: String, agent_key: String },

    /// Tool execution failure surfaced as a hard error (rare; normally
    /// recovered as an `error` memory entry)
    #[error("Tool '{tool}' failed: {reason}")]
    ToolExecution { tool: String, reason: String },

    /// Planner returned output that could not be interpreted
    #[error("Invalid planner output: {0}")]
    PlannerOutputInvalid(String),

    /// Iteration budget exhausted with `on_max_iterations = error`
    #[error("Maximum iterations ({max}) exceeded for agent '{agent_key}'")]
    MaxIterationsExceeded { agent_key: String, max: u32 },

    /// Repeated action signatures exceeded the configured threshold with
    /// `on_stagnation = error`
    #[error("Loop detected for agent '{agent_key}': '{signature}' repeated {count} times")]
    LoopDetected {
        agent_key: String,
        signature: String,
        count: usize,
    },

    /// A required policy was absent at construction time
    #[error("Missing required policy: {0}")]
    MissingPolicy(&'static str),

    /// State machine transition errors
    #[error("Invalid state transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    /// A subordinate key was used outside its manager's configured set
    #[error("Namespace isolation violation: agent '{agent_key}' is not a configured subordinate of '{manager_key}'")]
    NamespaceIsolationViolation {
        manager_key: String,
        agent_key: String,
    },

    /// Human reviewer denied a pending action (terminal, non-retryable)
    #[error("Approval denied for pending action '{resume_token}'")]
    ApprovalDenied { resume_token: String },

    /// Run cancelled via the caller's cancellation token
    #[error("Run cancelled for agent '{agent_key}'")]
    Cancelled { agent_key: String },

    /// A delegated subordinate run failed
    #[error("Delegation to '{worker}' failed: {reason}")]
    DelegationFailed { worker: String, reason: String },

    /// Job store errors
    #[error("Job store error: {0}")]
    JobStore(#[from] crate::jobs::JobStoreError),

    /// Configuration errors (fatal at construction, never mid-run)
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, AgentError>;

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Config(err.to_string())
    }
}
