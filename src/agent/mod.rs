//! Agents: worker control loop, manager delegation, and their state machines

pub mod manager;
pub mod state;
pub mod worker;

pub use manager::{Manager, Runnable, SynthesisFailurePolicy};
pub use state::{ManagerEvent, ManagerState, WorkerEvent, WorkerState};
pub use worker::{Agent, DEFAULT_MAX_PARALLEL_TOOLS};
