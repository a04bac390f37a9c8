//! Loop prevention over sliding windows of recent activity
//!
//! The policy itself is a pure function of the window contents and its
//! config; the windows are counters owned by the agent instance that runs
//! the loop.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::policy::PolicyAction;
use crate::types::ActionSignature;

/// Bounded windows of recent action signatures and observation digests,
/// owned by the running agent
#[derive(Debug, Clone)]
pub struct SlidingWindows {
    actions: VecDeque<ActionSignature>,
    observations: VecDeque<String>,
    action_capacity: usize,
    observation_capacity: usize,
}

impl SlidingWindows {
    /// Create windows sized to the policy config
    pub fn new(action_capacity: usize, observation_capacity: usize) -> Self {
        Self {
            actions: VecDeque::with_capacity(action_capacity),
            observations: VecDeque::with_capacity(observation_capacity),
            action_capacity,
            observation_capacity,
        }
    }

    /// Record an executed action signature, evicting the oldest at capacity
    pub fn record_action(&mut self, signature: ActionSignature) {
        if self.actions.len() >= self.action_capacity {
            self.actions.pop_front();
        }
        self.actions.push_back(signature);
    }

    /// Record an observation digest, evicting the oldest at capacity
    pub fn record_observation(&mut self, digest: impl Into<String>) {
        if self.observations.len() >= self.observation_capacity {
            self.observations.pop_front();
        }
        self.observations.push_back(digest.into());
    }

    /// Recent action signatures, oldest first
    pub fn actions(&self) -> impl Iterator<Item = &ActionSignature> {
        self.actions.iter()
    }

    /// Recent observation digests, oldest first
    pub fn observations(&self) -> impl Iterator<Item = &str> {
        self.observations.iter().map(String::as_str)
    }
}

/// Outcome of a loop-prevention check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopVerdict {
    /// No stagnation detected
    Pass,

    /// Threshold reached with `on_stagnation = warn`: log, mark, continue
    Warn { signature: String, count: usize },

    /// Threshold reached with `on_stagnation = error`: terminate the run
    Halt { signature: String, count: usize },
}

/// Sliding-window repetition detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopPreventionPolicy {
    /// Width of the action-signature window
    pub action_window: usize,

    /// Width of the observation-digest window
    pub observation_window: usize,

    /// Repetitions within the window that count as stagnation
    pub repetition_threshold: usize,

    /// What to do when the policy fires
    pub on_stagnation: PolicyAction,
}

impl Default for LoopPreventionPolicy {
    fn default() -> Self {
        Self {
            action_window: 10,
            observation_window: 10,
            repetition_threshold: 3,
            on_stagnation: PolicyAction::Warn,
        }
    }
}

impl LoopPreventionPolicy {
    /// Windows sized to this policy's configuration
    pub fn windows(&self) -> SlidingWindows {
        SlidingWindows::new(self.action_window, self.observation_window)
    }

    /// Check the windows for a signature repeated past the threshold
    pub fn evaluate(&self, windows: &SlidingWindows) -> LoopVerdict {
        let mut counts: std::collections::HashMap<&ActionSignature, usize> =
            std::collections::HashMap::new();
        for signature in windows.actions() {
            *counts.entry(signature).or_insert(0) += 1;
        }

        let repeated = counts
            .into_iter()
            .filter(|(_, count)| *count >= self.repetition_threshold)
            .max_by_key(|(_, count)| *count);

        match repeated {
            None => LoopVerdict::Pass,
            Some((signature, count)) => match self.on_stagnation {
                PolicyAction::Warn => LoopVerdict::Warn {
                    signature: signature.to_string(),
                    count,
                },
                PolicyAction::Error => LoopVerdict::Halt {
                    signature: signature.to_string(),
                    count,
                },
            },
        }
    }
}
