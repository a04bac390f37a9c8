//! Termination policy: iteration budget and completion handoff

use serde::{Deserialize, Serialize};

use crate::policy::PolicyAction;

/// Outcome of a termination check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationVerdict {
    /// Keep looping
    Continue,

    /// Completion was flagged and `check_completion` is on; finish
    /// successfully
    Complete,

    /// Budget exhausted with `on_max_iterations = warn`; return a
    /// best-effort final response flagged incomplete
    ExhaustedWarn,

    /// Budget exhausted with `on_max_iterations = error`; fail the run
    ExhaustedError,
}

/// Iteration budget policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminationPolicy {
    /// Maximum planning iterations before the run is forced to stop.
    /// For managers the unit is phases, not tool calls.
    pub max_iterations: u32,

    /// Outcome when the budget runs out
    pub on_max_iterations: PolicyAction,

    /// Whether a completion flag from the detector ends the run
    pub check_completion: bool,
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            on_max_iterations: PolicyAction::Warn,
            check_completion: true,
        }
    }
}

impl TerminationPolicy {
    /// Decide whether the loop continues. `iterations` is the count after
    /// the current iteration has been counted.
    pub fn evaluate(&self, iterations: u32, completion_flagged: bool) -> TerminationVerdict {
        if completion_flagged && self.check_completion {
            return TerminationVerdict::Complete;
        }
        if iterations >= self.max_iterations {
            return match self.on_max_iterations {
                PolicyAction::Warn => TerminationVerdict::ExhaustedWarn,
                PolicyAction::Error => TerminationVerdict::ExhaustedError,
            };
        }
        TerminationVerdict::Continue
    }
}
