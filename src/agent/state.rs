//! Worker and manager state machines
//!
//! Deterministic finite state machines with validated transitions: no
//! invalid state is reachable, every run progresses to Done or Failed, and
//! each (state, event) pair has a unique next state.

use serde::{Deserialize, Serialize};

use crate::errors::{AgentError, Result};

/// Worker loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerState {
    /// Constructed, no task yet
    Ready,

    /// Planner deciding the next step
    Planning,

    /// Tool(s) executing
    Executing,

    /// Policy set being evaluated
    Evaluating,

    /// Run finished with a final response (terminal)
    Done,

    /// Run failed (terminal)
    Failed,
}

/// Events driving worker transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    /// Task received, turn begun
    StartTurn,

    /// Planner proposed action(s)
    ActionsPlanned,

    /// Planner proposed a final response
    FinalPlanned,

    /// Tool results recorded to memory
    ActionsRecorded,

    /// Policies allow another iteration
    ContinueLoop,

    /// Policies ended the run successfully
    Complete,

    /// Unrecoverable fault
    Fault,
}

impl WorkerState {
    /// Whether this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Done | WorkerState::Failed)
    }

    /// Events accepted from this state (Fault is accepted everywhere)
    pub fn valid_events(&self) -> Vec<WorkerEvent> {
        use WorkerEvent::*;
        match self {
            WorkerState::Ready => vec![StartTurn, Fault],
            WorkerState::Planning => vec![ActionsPlanned, FinalPlanned, ActionsRecorded, Fault],
            WorkerState::Executing => vec![ActionsRecorded, Fault],
            WorkerState::Evaluating => vec![ContinueLoop, Complete, Fault],
            WorkerState::Done | WorkerState::Failed => vec![],
        }
    }

    /// Attempt a validated transition
    pub fn transition(&self, event: WorkerEvent) -> Result<WorkerState> {
        use WorkerEvent::*;
        use WorkerState::*;

        if event == Fault {
            return Ok(Failed);
        }

        let next = match (self, event) {
            (Ready, StartTurn) => Planning,

            (Planning, ActionsPlanned) => Executing,
            (Planning, FinalPlanned) => Done,
            // A planner fault recovered as an error entry still costs an
            // evaluation pass.
            (Planning, ActionsRecorded) => Evaluating,

            (Executing, ActionsRecorded) => Evaluating,

            (Evaluating, ContinueLoop) => Planning,
            (Evaluating, Complete) => Done,

            (Done, _) => Done,
            (Failed, _) => Failed,

            (from, event) => {
                return Err(AgentError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next)
    }
}

/// Manager loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManagerState {
    /// Constructed, no task yet
    Ready,

    /// Delegation planner producing the phase plan
    StrategicPlanning,

    /// Phases executing
    Delegating,

    /// Awaiting human approval; run returned to the caller
    Paused,

    /// Combining subordinate results
    Synthesizing,

    /// Run finished (terminal)
    Done,

    /// Run failed or was denied (terminal)
    Failed,
}

/// Events driving manager transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerEvent {
    StartRun,
    PlanReady,
    PhaseComplete,
    ApprovalRequired,
    Resumed,
    AllPhasesComplete,
    Synthesized,
    Fault,
}

impl ManagerState {
    /// Whether this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ManagerState::Done | ManagerState::Failed)
    }

    /// Events accepted from this state (Fault is accepted everywhere)
    pub fn valid_events(&self) -> Vec<ManagerEvent> {
        use ManagerEvent::*;
        match self {
            ManagerState::Ready => vec![StartRun, Fault],
            ManagerState::StrategicPlanning => vec![PlanReady, Fault],
            ManagerState::Delegating => {
                vec![PhaseComplete, ApprovalRequired, AllPhasesComplete, Fault]
            }
            ManagerState::Paused => vec![Resumed, Fault],
            ManagerState::Synthesizing => vec![Synthesized, Fault],
            ManagerState::Done | ManagerState::Failed => vec![],
        }
    }

    /// Attempt a validated transition
    pub fn transition(&self, event: ManagerEvent) -> Result<ManagerState> {
        use ManagerEvent::*;
        use ManagerState::*;

        if event == Fault {
            return Ok(Failed);
        }

        let next = match (self, event) {
            (Ready, StartRun) => StrategicPlanning,

            (StrategicPlanning, PlanReady) => Delegating,

            (Delegating, PhaseComplete) => Delegating,
            (Delegating, ApprovalRequired) => Paused,
            (Delegating, AllPhasesComplete) => Synthesizing,

            (Paused, Resumed) => Delegating,

            (Synthesizing, Synthesized) => Done,

            (Done, _) => Done,
            (Failed, _) => Failed,

            (from, event) => {
                return Err(AgentError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next)
    }
}
