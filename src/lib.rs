//! Overseer: a hierarchical execution engine for autonomous tool-using agents
//!
//! Worker agents drive a plan/act/observe loop over a pluggable planner and
//! a frozen tool registry; managers decompose tasks into phases, delegate to
//! named subordinates, and synthesize the results. All activity lands in a
//! namespaced, role-partitioned memory store, every run is governed by five
//! required policies, and runs persist through a job store so a human can
//! pause, approve, or deny gated actions and resume later.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use overseer::agent::Agent;
//! use overseer::events::EventBus;
//! use overseer::memory::MemoryStore;
//! use overseer::planner::Planner;
//! use overseer::policy::presets;
//! use overseer::tools::ToolRegistry;
//!
//! # async fn example(planner: Arc<dyn Planner>, tools: ToolRegistry) -> overseer::Result<()> {
//! let agent = Agent::new(
//!     "researcher",
//!     "job-1",
//!     planner,
//!     tools,
//!     presets::conservative(),
//!     MemoryStore::shared(),
//!     EventBus::shared(),
//! )?;
//! let response = agent.run("summarize the quarterly numbers").await?;
//! println!("{}", response.human_readable_summary);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod errors;
pub mod events;
pub mod jobs;
pub mod memory;
pub mod planner;
pub mod policy;
pub mod tools;
pub mod types;

pub use agent::{Agent, Manager, Runnable, SynthesisFailurePolicy};
pub use config::EngineConfig;
pub use errors::{AgentError, Result};
pub use events::{EventBus, EventName};
pub use jobs::{FileJobStore, InMemoryJobStore, JobStore};
pub use memory::{MemoryStore, MemoryView, MessageStore, Projection};
pub use planner::{InferenceProvider, Planner, StrategicPlanner, Synthesizer};
pub use policy::PolicySet;
pub use tools::{Tool, ToolRegistry};
pub use types::{Action, FinalResponse, RunOutcome};
