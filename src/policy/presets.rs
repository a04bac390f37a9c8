//! Named policy bundles
//!
//! Presets are convenience aggregations of the five policies with default
//! values; they carry no runtime behavior of their own.

use crate::policy::{
    ApprovalPolicy, CheckpointPolicy, CompletionDetector, LoopPreventionPolicy, PolicyAction,
    PolicySet, TerminationPolicy,
};

/// Low budget, hard failures; for runs that should fail fast and loudly
pub fn fast_fail() -> PolicySet {
    PolicySet {
        loop_prevention: LoopPreventionPolicy {
            action_window: 5,
            observation_window: 5,
            repetition_threshold: 2,
            on_stagnation: PolicyAction::Error,
        },
        completion: CompletionDetector::default(),
        termination: TerminationPolicy {
            max_iterations: 5,
            on_max_iterations: PolicyAction::Error,
            check_completion: true,
        },
        approval: ApprovalPolicy::permissive(),
        checkpoint: CheckpointPolicy::disabled(),
    }
}

/// Moderate budget, degraded results over hard failures
pub fn conservative() -> PolicySet {
    PolicySet {
        loop_prevention: LoopPreventionPolicy {
            action_window: 10,
            observation_window: 10,
            repetition_threshold: 3,
            on_stagnation: PolicyAction::Error,
        },
        completion: CompletionDetector::default(),
        termination: TerminationPolicy {
            max_iterations: 20,
            on_max_iterations: PolicyAction::Warn,
            check_completion: true,
        },
        approval: ApprovalPolicy::permissive(),
        checkpoint: CheckpointPolicy {
            checkpoint_after_iterations: 5,
        },
    }
}

/// Generous budget, warnings only; for long-running exploratory tasks
pub fn persistent() -> PolicySet {
    PolicySet {
        loop_prevention: LoopPreventionPolicy {
            action_window: 20,
            observation_window: 20,
            repetition_threshold: 5,
            on_stagnation: PolicyAction::Warn,
        },
        completion: CompletionDetector::default(),
        termination: TerminationPolicy {
            max_iterations: 100,
            on_max_iterations: PolicyAction::Warn,
            check_completion: true,
        },
        approval: ApprovalPolicy::permissive(),
        checkpoint: CheckpointPolicy {
            checkpoint_after_iterations: 10,
        },
    }
}

/// Resolve a preset by name
pub fn by_name(name: &str) -> Option<PolicySet> {
    match name {
        "fast_fail" => Some(fast_fail()),
        "conservative" => Some(conservative()),
        "persistent" => Some(persistent()),
        _ => None,
    }
}
