//! Memory entry types and role partitioning
//!
//! Entries are immutable once appended. Each entry kind maps to exactly one
//! role partition; partitions drive both visibility (plain vs hierarchical
//! views) and the default grouped projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a memory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    UserMessage,
    AssistantMessage,
    Task,
    Action,
    Observation,
    Error,
    Final,
    Delegation,
    Synthesis,
    StrategicPlan,
    GlobalObservation,
}

/// Role partition an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolePartition {
    /// User/assistant conversation turns
    Conversation,

    /// Per-agent execution traces
    ExecutionTrace,

    /// Entries visible to every hierarchical reader in the namespace
    Global,
}

impl EntryKind {
    /// Partition this kind belongs to
    pub fn partition(&self) -> RolePartition {
        match self {
            EntryKind::UserMessage | EntryKind::AssistantMessage => RolePartition::Conversation,
            EntryKind::Task
            | EntryKind::Action
            | EntryKind::Observation
            | EntryKind::Error
            | EntryKind::Final
            | EntryKind::Delegation
            | EntryKind::StrategicPlan => RolePartition::ExecutionTrace,
            EntryKind::GlobalObservation | EntryKind::Synthesis => RolePartition::Global,
        }
    }
}

/// One immutable record in a namespace's log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Entry kind
    pub kind: EntryKind,

    /// Entry body (free-form JSON; usually a string or result map)
    pub content: Value,

    /// Append timestamp
    pub timestamp: DateTime<Utc>,

    /// Per-namespace append sequence, assigned by the store.
    /// Ties on `timestamp` resolve by `seq` in chronological projections.
    pub seq: u64,

    /// Turn the entry belongs to (incremented per `task` entry)
    pub turn_id: u64,

    /// Agent that produced the entry
    pub agent_key: String,

    /// Tool name, for action/observation/error entries
    pub tool: Option<String>,

    /// Tool arguments, for action entries
    pub args: Option<Value>,

    /// Worker a delegation result came from
    pub from_worker: Option<String>,

    /// Manager a delegation was issued by
    pub from_manager: Option<String>,

    /// Short human-readable summary
    pub summary: Option<String>,
}

impl Entry {
    /// Create a bare entry; `seq` and `turn_id` are assigned on append
    pub fn new(kind: EntryKind, agent_key: impl Into<String>, content: Value) -> Self {
        Self {
            kind,
            content,
            timestamp: Utc::now(),
            seq: 0,
            turn_id: 0,
            agent_key: agent_key.into(),
            tool: None,
            args: None,
            from_worker: None,
            from_manager: None,
            summary: None,
        }
    }

    /// New task entry (starts a new turn for the agent)
    pub fn task(agent_key: impl Into<String>, task: &str) -> Self {
        Self::new(EntryKind::Task, agent_key, Value::String(task.to_string()))
    }

    /// New action entry for a planned tool call
    pub fn action(agent_key: impl Into<String>, tool: &str, args: &Value) -> Self {
        let mut entry = Self::new(
            EntryKind::Action,
            agent_key,
            serde_json::json!({ "tool": tool, "args": args }),
        );
        entry.tool = Some(tool.to_string());
        entry.args = Some(args.clone());
        entry
    }

    /// New observation entry for a tool result
    pub fn observation(
        agent_key: impl Into<String>,
        tool: &str,
        result: Value,
        summary: impl Into<String>,
    ) -> Self {
        let mut entry = Self::new(EntryKind::Observation, agent_key, result);
        entry.tool = Some(tool.to_string());
        entry.summary = Some(summary.into());
        entry
    }

    /// New error entry for a recovered fault
    pub fn error(agent_key: impl Into<String>, message: &str) -> Self {
        Self::new(
            EntryKind::Error,
            agent_key,
            Value::String(message.to_string()),
        )
    }

    /// New delegation entry recording a dispatch to a subordinate
    pub fn delegation(
        manager_key: &str,
        worker_key: &str,
        goal: &str,
    ) -> Self {
        let mut entry = Self::new(
            EntryKind::Delegation,
            manager_key,
            Value::String(goal.to_string()),
        );
        entry.from_manager = Some(manager_key.to_string());
        entry.from_worker = Some(worker_key.to_string());
        entry
    }

    /// Set the summary field
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Set the tool field
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    /// Set the from_worker field
    pub fn with_from_worker(mut self, worker: impl Into<String>) -> Self {
        self.from_worker = Some(worker.into());
        self
    }

    /// Partition this entry belongs to
    pub fn partition(&self) -> RolePartition {
        self.kind.partition()
    }

    /// Content rendered as text (string content verbatim, JSON otherwise)
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
