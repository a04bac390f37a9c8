//! Checkpoint cadence policy

use serde::{Deserialize, Serialize};

/// Persists a snapshot signal via the job store every N iterations.
/// A cadence of zero disables checkpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointPolicy {
    /// Checkpoint every this many iterations (0 = never)
    pub checkpoint_after_iterations: u32,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self {
            checkpoint_after_iterations: 5,
        }
    }
}

impl CheckpointPolicy {
    /// Policy that never checkpoints
    pub fn disabled() -> Self {
        Self {
            checkpoint_after_iterations: 0,
        }
    }

    /// Whether a checkpoint is due after the given iteration
    pub fn should_checkpoint(&self, iteration: u32) -> bool {
        self.checkpoint_after_iterations != 0
            && iteration != 0
            && iteration % self.checkpoint_after_iterations == 0
    }
}
