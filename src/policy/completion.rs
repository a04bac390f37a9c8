//! Completion detection over the current turn's history
//!
//! The detector flags completion; it never stops the loop itself. The
//! termination policy consumes the flag. Scanning is restricted to the
//! current turn so a prior turn's `final` entry cannot re-trigger.

use serde::{Deserialize, Serialize};

use crate::memory::{Entry, EntryKind};

/// Substring/terminal-tool completion detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionDetector {
    /// Case-insensitive indicator substrings searched in observation and
    /// assistant-message content
    pub indicators: Vec<String>,

    /// Tools whose successful use marks the task complete
    pub terminal_tools: Vec<String>,
}

impl Default for CompletionDetector {
    fn default() -> Self {
        Self {
            indicators: vec![
                "task complete".to_string(),
                "task is complete".to_string(),
                "all steps finished".to_string(),
            ],
            terminal_tools: Vec::new(),
        }
    }
}

impl CompletionDetector {
    /// Scan the current turn's entries for a completion signal
    pub fn detect(&self, current_turn: &[Entry]) -> bool {
        for entry in current_turn {
            match entry.kind {
                EntryKind::Observation | EntryKind::AssistantMessage => {
                    let text = entry.content_text().to_lowercase();
                    if self
                        .indicators
                        .iter()
                        .any(|needle| text.contains(&needle.to_lowercase()))
                    {
                        return true;
                    }
                    if let Some(tool) = &entry.tool {
                        if entry.kind == EntryKind::Observation
                            && self.terminal_tools.iter().any(|t| t == tool)
                        {
                            return true;
                        }
                    }
                }
                EntryKind::Final => return true,
                _ => {}
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_indicator_match_is_case_insensitive() {
        let detector = CompletionDetector {
            indicators: vec!["Task Complete".to_string()],
            terminal_tools: vec![],
        };
        let turn = vec![Entry::observation(
            "w1",
            "report",
            json!("The TASK COMPLETE marker was emitted"),
            "done",
        )];
        assert!(detector.detect(&turn));
    }

    #[test]
    fn test_terminal_tool_flags_completion() {
        let detector = CompletionDetector {
            indicators: vec![],
            terminal_tools: vec!["submit_report".to_string()],
        };
        let turn = vec![Entry::observation(
            "w1",
            "submit_report",
            json!({"ok": true}),
            "submitted",
        )];
        assert!(detector.detect(&turn));
    }

    #[test]
    fn test_no_signal_no_flag() {
        let detector = CompletionDetector::default();
        let turn = vec![Entry::observation(
            "w1",
            "search",
            json!("still digging"),
            "partial",
        )];
        assert!(!detector.detect(&turn));
    }

    #[test]
    fn test_action_entries_are_not_scanned() {
        // A planned action that merely mentions an indicator must not flag.
        let detector = CompletionDetector {
            indicators: vec!["task complete".to_string()],
            terminal_tools: vec![],
        };
        let turn = vec![Entry::action(
            "w1",
            "echo",
            &json!({"text": "say task complete"}),
        )];
        assert!(!detector.detect(&turn));
    }
}
