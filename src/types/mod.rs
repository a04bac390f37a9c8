//! Core value types shared across the engine
//!
//! Actions and final responses are constructed by planners and consumed by
//! the control loops; action signatures are the canonical de-duplication key
//! used by loop prevention and the executed-action ledger.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single tool invocation proposed by a planner.
///
/// Immutable once constructed; consumed exactly once by the control loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Action {
    /// Tool name, resolved against the agent's registry
    pub tool_name: String,

    /// Structured arguments passed to the tool
    pub tool_args: Value,
}

impl Action {
    /// Create a new action
    pub fn new(tool_name: impl Into<String>, tool_args: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            tool_args,
        }
    }

    /// Canonical signature of this action (see [`ActionSignature`])
    pub fn signature(&self) -> ActionSignature {
        ActionSignature::of(&self.tool_name, &self.tool_args)
    }
}

/// Terminal value of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalResponse {
    /// Operation the run concluded with (e.g. "task_complete")
    pub operation: String,

    /// Structured result payload
    pub payload: Value,

    /// Short human-readable summary of the outcome
    pub human_readable_summary: String,
}

impl FinalResponse {
    /// Create a new final response
    pub fn new(
        operation: impl Into<String>,
        payload: Value,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            payload,
            human_readable_summary: summary.into(),
        }
    }

    /// Final response for a run that hit its iteration budget with the
    /// warn outcome; payload flags `incomplete = true`
    pub fn incomplete(summary: impl Into<String>) -> Self {
        Self {
            operation: "max_iterations_reached".to_string(),
            payload: serde_json::json!({ "incomplete": true }),
            human_readable_summary: summary.into(),
        }
    }
}

/// Deterministic `(tool_name, canonicalized_args)` key.
///
/// Object keys are sorted recursively before serialization so the signature
/// is stable regardless of argument insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionSignature(String);

impl ActionSignature {
    /// Build the signature for a tool call
    pub fn of(tool_name: &str, args: &Value) -> Self {
        Self(format!("{}:{}", tool_name, canonical_json(args)))
    }

    /// The signature as a string key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActionSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialize a JSON value with all object keys sorted recursively
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(k).unwrap_or_default(),
                        canonical_json(&map[k])
                    )
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let fields: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", fields.join(","))
        }
        other => other.to_string(),
    }
}

/// Result surface a host process sees from a manager run
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Run finished with a final response
    Completed(FinalResponse),

    /// Run paused awaiting human approval; resume with the token.
    /// `job_id` names the job holding the pending action.
    PendingApproval { resume_token: String, job_id: String },
}

impl RunOutcome {
    /// Final response if the run completed
    pub fn final_response(&self) -> Option<&FinalResponse> {
        match self {
            RunOutcome::Completed(resp) => Some(resp),
            RunOutcome::PendingApproval { .. } => None,
        }
    }

    /// Resume token if the run is awaiting approval
    pub fn resume_token(&self) -> Option<&str> {
        match self {
            RunOutcome::Completed(_) => None,
            RunOutcome::PendingApproval { resume_token, .. } => Some(resume_token),
        }
    }

    /// Job holding the pending action, if the run is awaiting approval
    pub fn pending_job_id(&self) -> Option<&str> {
        match self {
            RunOutcome::Completed(_) => None,
            RunOutcome::PendingApproval { job_id, .. } => Some(job_id),
        }
    }
}

/// Counters accumulated over one run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Planning iterations executed
    pub iterations: u32,

    /// Tool calls dispatched
    pub tool_calls: u64,

    /// Tool calls that reported failure
    pub tool_failures: u64,

    /// Loop-prevention warnings emitted
    pub loop_warnings: u64,
}

impl RunStats {
    /// Record a tool call outcome
    pub fn record_tool_call(&mut self, success: bool) {
        self.tool_calls += 1;
        if !success {
            self.tool_failures += 1;
        }
    }

    /// Fraction of tool calls that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.tool_calls == 0 {
            0.0
        } else {
            (self.tool_calls - self.tool_failures) as f64 / self.tool_calls as f64
        }
    }
}
