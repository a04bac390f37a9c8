//! Pluggable policy engine
//!
//! Five independent decision units evaluated in a fixed order by the control
//! loops: loop prevention, completion detection, termination, approval,
//! checkpointing. Each policy is a pure function of `(history window,
//! config)`; counters (iteration counts, sliding windows) live with the
//! agent instance. All five are required at construction — an absent policy
//! is a configuration error, never a silent default.

pub mod approval;
pub mod checkpoint;
pub mod completion;
pub mod loop_prevention;
pub mod presets;
pub mod termination;

use serde::{Deserialize, Serialize};

pub use approval::ApprovalPolicy;
pub use checkpoint::CheckpointPolicy;
pub use completion::CompletionDetector;
pub use loop_prevention::{LoopPreventionPolicy, LoopVerdict, SlidingWindows};
pub use termination::{TerminationPolicy, TerminationVerdict};

use crate::errors::{AgentError, Result};

/// Severity knob shared by loop prevention and termination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    /// Log and continue (degraded result where applicable)
    Warn,

    /// Terminate the run with a hard failure
    Error,
}

/// The full set of policies an agent or manager runs with.
/// Immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct PolicySet {
    pub loop_prevention: LoopPreventionPolicy,
    pub completion: CompletionDetector,
    pub termination: TerminationPolicy,
    pub approval: ApprovalPolicy,
    pub checkpoint: CheckpointPolicy,
}

impl PolicySet {
    /// Start building a policy set
    pub fn builder() -> PolicySetBuilder {
        PolicySetBuilder::default()
    }
}

/// Builder enforcing that every policy is supplied.
///
/// `build()` fails with [`AgentError::MissingPolicy`] naming the first
/// absent policy.
#[derive(Debug, Default)]
pub struct PolicySetBuilder {
    loop_prevention: Option<LoopPreventionPolicy>,
    completion: Option<CompletionDetector>,
    termination: Option<TerminationPolicy>,
    approval: Option<ApprovalPolicy>,
    checkpoint: Option<CheckpointPolicy>,
}

impl PolicySetBuilder {
    pub fn loop_prevention(mut self, policy: LoopPreventionPolicy) -> Self {
        self.loop_prevention = Some(policy);
        self
    }

    pub fn completion(mut self, policy: CompletionDetector) -> Self {
        self.completion = Some(policy);
        self
    }

    pub fn termination(mut self, policy: TerminationPolicy) -> Self {
        self.termination = Some(policy);
        self
    }

    pub fn approval(mut self, policy: ApprovalPolicy) -> Self {
        self.approval = Some(policy);
        self
    }

    pub fn checkpoint(mut self, policy: CheckpointPolicy) -> Self {
        self.checkpoint = Some(policy);
        self
    }

    /// Assemble the set; missing policies are a fatal configuration error
    pub fn build(self) -> Result<PolicySet> {
        Ok(PolicySet {
            loop_prevention: self
                .loop_prevention
                .ok_or(AgentError::MissingPolicy("loop_prevention"))?,
            completion: self
                .completion
                .ok_or(AgentError::MissingPolicy("completion"))?,
            termination: self
                .termination
                .ok_or(AgentError::MissingPolicy("termination"))?,
            approval: self.approval.ok_or(AgentError::MissingPolicy("approval"))?,
            checkpoint: self
                .checkpoint
                .ok_or(AgentError::MissingPolicy("checkpoint"))?,
        })
    }
}
