//! Tool contract and registry
//!
//! Tools are externally supplied units of capability invoked by name with
//! structured arguments. Errors are returned, never thrown across this
//! boundary; the control loop records them as `error` memory entries.
//!
//! The registry is a closed set resolved once at agent construction — the
//! only name-based dispatch at call time is an explicit typed lookup here.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Result of a successful tool execution
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Structured result payload
    pub payload: Value,

    /// Short human-readable summary of the result
    pub human_readable_summary: String,
}

impl ToolOutput {
    /// Create a tool output
    pub fn new(payload: Value, summary: impl Into<String>) -> Self {
        Self {
            payload,
            human_readable_summary: summary.into(),
        }
    }
}

/// Failure reported by a tool implementation
#[derive(Error, Debug, Clone)]
pub enum ToolError {
    /// Arguments did not match the tool's expectations
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// The tool ran but the operation failed
    #[error("Execution failed: {0}")]
    Failed(String),

    /// The tool gave up after its internal timeout
    #[error("Timed out after {0}ms")]
    Timeout(u64),
}

/// A pluggable unit of capability
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the planner uses to invoke this tool
    fn name(&self) -> &str;

    /// Short description for planner prompting
    fn description(&self) -> &str;

    /// Execute with structured arguments
    async fn execute(&self, args: &Value) -> Result<ToolOutput, ToolError>;
}

/// Shared tool handle
pub type SharedTool = Arc<dyn Tool>;

/// Errors raised while assembling a registry (construction time only)
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool with name '{0}' already registered")]
    DuplicateTool(String),

    #[error("tool name cannot be empty")]
    EmptyName,
}

/// Instance-owned, frozen-after-construction tool set
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, SharedTool>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, rejecting duplicates and empty names
    pub fn register<T>(&mut self, tool: T) -> Result<(), RegistryError>
    where
        T: Tool + 'static,
    {
        self.register_shared(Arc::new(tool))
    }

    /// Register an already-shared tool
    pub fn register_shared(&mut self, tool: SharedTool) -> Result<(), RegistryError> {
        let name = tool.name().trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<SharedTool> {
        self.tools.get(name).cloned()
    }

    /// Whether a tool with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Sorted tool names
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
