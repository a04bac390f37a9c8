//! Planner contracts and delegation plan types
//!
//! A planner decides the next step(s) for a worker given the task and the
//! current turn's history; a strategic planner decomposes a manager's task
//! into ordered phases over named subordinates. Concrete implementations
//! (LLM-backed or otherwise) are supplied by the host; `parse_planner_text`
//! is the shared helper for turning raw model output into a typed result.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::memory::Entry;
use crate::types::{Action, FinalResponse};

/// What a planner proposes next
#[derive(Debug, Clone)]
pub enum PlannerOutput {
    /// Execute one action
    Single(Action),

    /// Execute these actions concurrently; results are recorded in the
    /// declared order
    Parallel(Vec<Action>),

    /// Terminate the run with this response
    Final(FinalResponse),
}

/// Planner-side failures. Malformed output is recovered by the loop (it
/// becomes an `error` entry bounded by loop prevention and termination).
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Planner output malformed: {0}")]
    Malformed(String),

    #[error("Inference provider error: {0}")]
    Provider(String),
}

/// Text-completion seam for LLM-backed planners.
///
/// The control loops never call this directly; a planner implementation
/// builds a prompt from the task and history, invokes the provider, and
/// feeds the raw text through [`parse_planner_text`]. Provider failures
/// surface as [`PlannerError::Provider`].
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, PlannerError>;
}

/// Decides the next step(s) for a worker
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, task: &str, history: &[Entry]) -> Result<PlannerOutput, PlannerError>;
}

/// One unit of delegated work within a phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Subordinate key the work goes to
    pub worker: String,

    /// Goal text the subordinate receives as its task
    pub goal: String,

    /// Optional pre-bound tool call. Only pre-bound calls can be gated by
    /// the approval policy and signed into the executed-action ledger.
    pub tool_call: Option<Action>,
}

impl Assignment {
    /// Assignment with a free-form goal
    pub fn new(worker: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            worker: worker.into(),
            goal: goal.into(),
            tool_call: None,
        }
    }

    /// Attach a pre-bound tool call
    pub fn with_tool_call(mut self, action: Action) -> Self {
        self.tool_call = Some(action);
        self
    }
}

/// One phase of a delegation plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    /// Human-readable phase label
    pub name: String,

    /// Work items in this phase
    pub assignments: Vec<Assignment>,

    /// Run this phase's assignments concurrently
    pub parallel: bool,
}

impl Phase {
    /// Sequential phase
    pub fn sequential(name: impl Into<String>, assignments: Vec<Assignment>) -> Self {
        Self {
            name: name.into(),
            assignments,
            parallel: false,
        }
    }

    /// Parallel phase
    pub fn parallel(name: impl Into<String>, assignments: Vec<Assignment>) -> Self {
        Self {
            name: name.into(),
            assignments,
            parallel: true,
        }
    }
}

/// Ordered phases a manager executes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationPlan {
    pub phases: Vec<Phase>,
}

impl DelegationPlan {
    /// Plan with the given phases
    pub fn new(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    /// Every worker key named anywhere in the plan
    pub fn worker_keys(&self) -> Vec<&str> {
        self.phases
            .iter()
            .flat_map(|phase| phase.assignments.iter().map(|a| a.worker.as_str()))
            .collect()
    }
}

/// Decomposes a manager's task into a delegation plan
#[async_trait]
pub trait StrategicPlanner: Send + Sync {
    async fn plan_delegation(
        &self,
        task: &str,
        history: &[Entry],
    ) -> Result<DelegationPlan, PlannerError>;
}

/// Combines subordinate results into one final response
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(
        &self,
        task: &str,
        results: &[(String, FinalResponse)],
    ) -> Result<FinalResponse, PlannerError>;
}

/// Parse raw model text into a planner output.
///
/// Accepts a fenced ```json block or a bare JSON object/array; an object
/// with `tool_name` is a single action, an array of such objects is a
/// parallel batch, an object with `operation` is a final response. Text
/// without any JSON becomes a plain final response. JSON that is present
/// but unintelligible is a malformed-output error.
pub fn parse_planner_text(text: &str) -> Result<PlannerOutput, PlannerError> {
    let trimmed = text.trim();

    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        match rest.find("```") {
            Some(end) => rest[..end].trim(),
            None => rest.trim(),
        }
    } else if let Some(start) = trimmed.find(|c| c == '{' || c == '[') {
        let close = if trimmed[start..].starts_with('[') {
            trimmed.rfind(']')
        } else {
            trimmed.rfind('}')
        };
        match close {
            Some(end) if end > start => &trimmed[start..=end],
            _ => {
                return Err(PlannerError::Malformed(
                    "unterminated JSON block".to_string(),
                ))
            }
        }
    } else {
        return Ok(PlannerOutput::Final(FinalResponse::new(
            "respond",
            Value::Null,
            trimmed,
        )));
    };

    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| PlannerError::Malformed(format!("{}: {}", e, json_str)))?;

    match &value {
        Value::Array(items) => {
            let actions: Result<Vec<Action>, _> = items
                .iter()
                .map(|item| serde_json::from_value::<Action>(item.clone()))
                .collect();
            let actions =
                actions.map_err(|e| PlannerError::Malformed(format!("bad action list: {}", e)))?;
            if actions.is_empty() {
                return Err(PlannerError::Malformed("empty action list".to_string()));
            }
            if actions.len() == 1 {
                let mut actions = actions;
                return Ok(PlannerOutput::Single(actions.remove(0)));
            }
            Ok(PlannerOutput::Parallel(actions))
        }
        Value::Object(map) => {
            if map.contains_key("tool_name") {
                let action: Action = serde_json::from_value(value.clone())
                    .map_err(|e| PlannerError::Malformed(format!("bad action: {}", e)))?;
                Ok(PlannerOutput::Single(action))
            } else if map.contains_key("operation") {
                let resp: FinalResponse = serde_json::from_value(value.clone())
                    .map_err(|e| PlannerError::Malformed(format!("bad final response: {}", e)))?;
                Ok(PlannerOutput::Final(resp))
            } else {
                Err(PlannerError::Malformed(format!(
                    "object is neither action nor final response: {}",
                    json_str
                )))
            }
        }
        _ => Err(PlannerError::Malformed(format!(
            "unexpected JSON shape: {}",
            json_str
        ))),
    }
}
