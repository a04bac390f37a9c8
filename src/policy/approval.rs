//! Human-in-the-loop approval gating

use serde::{Deserialize, Serialize};

use crate::types::Action;

/// Flags delegated tool calls that must pause for human approval
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    /// Tool names that require approval before execution
    pub gated_tools: Vec<String>,

    /// Gate every tool call regardless of name
    pub gate_all: bool,
}

impl ApprovalPolicy {
    /// Policy that never gates anything
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Policy gating the named tools
    pub fn gating<I, S>(tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            gated_tools: tools.into_iter().map(Into::into).collect(),
            gate_all: false,
        }
    }

    /// Whether this action must pause for approval before executing
    pub fn requires_approval(&self, action: &Action) -> bool {
        self.gate_all || self.gated_tools.iter().any(|t| *t == action.tool_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_permissive_gates_nothing() {
        let policy = ApprovalPolicy::permissive();
        assert!(!policy.requires_approval(&Action::new("delete_everything", json!({}))));
    }

    #[test]
    fn test_gated_tool_requires_approval() {
        let policy = ApprovalPolicy::gating(["send_email"]);
        assert!(policy.requires_approval(&Action::new("send_email", json!({}))));
        assert!(!policy.requires_approval(&Action::new("read_file", json!({}))));
    }

    #[test]
    fn test_gate_all() {
        let policy = ApprovalPolicy {
            gated_tools: vec![],
            gate_all: true,
        };
        assert!(policy.requires_approval(&Action::new("read_file", json!({}))));
    }
}
