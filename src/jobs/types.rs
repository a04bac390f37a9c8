//! Durable job records
//!
//! A job is the persistent record of one run: its plans, pending approval
//! state, and the executed-action ledger that makes resumption idempotent.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Running normally
    Active,

    /// Finished with a final response (terminal)
    Completed,

    /// Awaiting human approval of a pending action
    Paused,

    /// Pending action approved; run resuming
    Approved,

    /// Pending action denied (terminal)
    Denied,
}

impl JobStatus {
    /// Whether the job can no longer progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Denied)
    }
}

/// Persisted record of an action paused for approval.
///
/// Exists only while its job is paused; cleared on approve/deny.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    /// Worker the action was bound for
    pub worker: String,

    /// Tool name
    pub tool: String,

    /// Tool arguments
    pub args: Value,

    /// Manager that paused the run
    pub manager: Option<String>,

    /// Opaque token the caller presents to resume
    pub resume_token: String,

    /// When the pause was recorded
    pub created_at: DateTime<Utc>,

    /// Phase the pending assignment belongs to
    pub phase_index: usize,

    /// Assignment index within its phase
    pub assignment_index: usize,

    /// When the pause was raised by a nested subordinate, the subordinate's
    /// own job id; the approval decision is forwarded there on resume
    #[serde(default)]
    pub subordinate_job_id: Option<String>,
}

/// One checkpoint marker written by the checkpoint policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub agent_key: String,
    pub iteration: u32,
    pub at: DateTime<Utc>,
}

/// Durable record of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,

    /// Top-level orchestrator plan, when one exists
    pub orchestrator_plan: Option<Value>,

    /// Delegation plan per manager key
    pub manager_plans: HashMap<String, Value>,

    /// At most one pending action at any time
    pub pending_action: Option<PendingAction>,

    /// Append-only ledger: action signature -> recorded result.
    /// Sole source of truth for de-duplicating resumed actions.
    pub executed_actions: HashMap<String, Value>,

    /// Approval decisions by resume token
    pub approvals: HashMap<String, bool>,

    /// Checkpoint markers
    pub checkpoints: Vec<CheckpointRecord>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Fresh active job
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: JobStatus::Active,
            orchestrator_plan: None,
            manager_plans: HashMap::new(),
            pending_action: None,
            executed_actions: HashMap::new(),
            approvals: HashMap::new(),
            checkpoints: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Touch the update timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
