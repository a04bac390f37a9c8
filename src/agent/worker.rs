//! Worker agent: the plan/act/observe control loop
//!
//! One agent instance owns one key, one namespace, one frozen tool registry
//! and one policy set. `run` drives the loop through the validated state
//! machine: plan, execute, record, evaluate policies, repeat. Tool and
//! planner faults become `error` memory entries bounded by loop prevention
//! and termination; only unknown tools, cancellation, and policy halts
//! escape as hard errors.

use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::state::{WorkerEvent, WorkerState};
use crate::errors::{AgentError, Result};
use crate::events::{EventBus, EventName};
use crate::jobs::JobStore;
use crate::memory::{Entry, EntryKind, MemoryStore};
use crate::planner::{Planner, PlannerOutput};
use crate::policy::{LoopVerdict, PolicySet, SlidingWindows, TerminationVerdict};
use crate::tools::ToolRegistry;
use crate::types::{Action, FinalResponse, RunStats};

/// Default cap on concurrently executing tools within one parallel batch
pub const DEFAULT_MAX_PARALLEL_TOOLS: usize = 4;

/// A worker agent bound to a namespace
pub struct Agent {
    key: String,
    namespace: String,
    planner: Arc<dyn Planner>,
    tools: ToolRegistry,
    policies: PolicySet,
    memory: Arc<MemoryStore>,
    events: Arc<EventBus>,
    job: Option<(Arc<dyn JobStore>, String)>,
    cancel: CancellationToken,
    max_parallel: usize,
    progress: Option<mpsc::UnboundedSender<String>>,
}

impl Agent {
    /// Create a worker. Fails on an empty key or an empty tool registry.
    pub fn new(
        key: impl Into<String>,
        namespace: impl Into<String>,
        planner: Arc<dyn Planner>,
        tools: ToolRegistry,
        policies: PolicySet,
        memory: Arc<MemoryStore>,
        events: Arc<EventBus>,
    ) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(AgentError::Config("agent key cannot be empty".to_string()));
        }
        if tools.is_empty() {
            return Err(AgentError::Config(format!(
                "agent '{}' has no registered tools",
                key
            )));
        }
        Ok(Self {
            key,
            namespace: namespace.into(),
            planner,
            tools,
            policies,
            memory,
            events,
            job: None,
            cancel: CancellationToken::new(),
            max_parallel: DEFAULT_MAX_PARALLEL_TOOLS,
            progress: None,
        })
    }

    /// Attach a job store so checkpoint markers are persisted
    pub fn with_job_store(mut self, store: Arc<dyn JobStore>, job_id: impl Into<String>) -> Self {
        self.job = Some((store, job_id.into()));
        self
    }

    /// Attach a cancellation token checked at every suspension point
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Cap concurrent tool executions within a parallel batch
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Attach a best-effort progress sink
    pub fn with_progress(mut self, sink: mpsc::UnboundedSender<String>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// This agent's key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// This agent's namespace
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn report(&self, message: String) {
        if let Some(sink) = &self.progress {
            let _ = sink.send(message);
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(AgentError::Cancelled {
                agent_key: self.key.clone(),
            })
        } else {
            Ok(())
        }
    }

    /// Run the control loop to a final response.
    ///
    /// Takes `&self` so managers can fan the same instance out across
    /// parallel phases; all per-run counters are local to this call.
    pub async fn run(&self, task: &str) -> Result<FinalResponse> {
        let mut state = WorkerState::Ready;
        let mut windows = self.policies.loop_prevention.windows();
        let mut stats = RunStats::default();

        self.memory
            .append(&self.namespace, Entry::task(&self.key, task))
            .await;
        self.events.publish(
            EventName::AgentStart,
            json!({ "agent": self.key, "task": task }),
        );
        info!(agent = %self.key, "agent run started");

        state = state.transition(WorkerEvent::StartTurn)?;

        loop {
            self.check_cancelled()?;
            stats.iterations += 1;
            self.report(format!("{}: iteration {}", self.key, stats.iterations));

            let history = self.memory.current_turn(&self.namespace, &self.key).await;

            match self.planner.plan(task, &history).await {
                Ok(PlannerOutput::Final(response)) => {
                    state = state.transition(WorkerEvent::FinalPlanned)?;
                    return self.finish(response, &stats, state).await;
                }
                Ok(PlannerOutput::Single(action)) => {
                    state = state.transition(WorkerEvent::ActionsPlanned)?;
                    self.execute_batch(vec![action], &mut windows, &mut stats)
                        .await?;
                    state = state.transition(WorkerEvent::ActionsRecorded)?;
                }
                Ok(PlannerOutput::Parallel(actions)) => {
                    state = state.transition(WorkerEvent::ActionsPlanned)?;
                    self.execute_batch(actions, &mut windows, &mut stats).await?;
                    state = state.transition(WorkerEvent::ActionsRecorded)?;
                }
                Err(err) => {
                    // Recovered: the planner fault lands in memory and the
                    // policies decide whether the loop goes on.
                    warn!(agent = %self.key, error = %err, "planner fault recovered");
                    self.memory
                        .append(
                            &self.namespace,
                            Entry::error(&self.key, &format!("planner fault: {}", err)),
                        )
                        .await;
                    self.events.publish(
                        EventName::Error,
                        json!({ "agent": self.key, "error": err.to_string() }),
                    );
                    state = state.transition(WorkerEvent::ActionsRecorded)?;
                }
            }

            let turn = self.memory.current_turn(&self.namespace, &self.key).await;

            match self.policies.loop_prevention.evaluate(&windows) {
                LoopVerdict::Pass => {}
                LoopVerdict::Warn { signature, count } => {
                    stats.loop_warnings += 1;
                    warn!(agent = %self.key, %signature, count, "repeated action detected");
                    self.memory
                        .append(
                            &self.namespace,
                            Entry::error(
                                &self.key,
                                &format!("action '{}' repeated {} times", signature, count),
                            )
                            .with_summary("loop_warning"),
                        )
                        .await;
                }
                LoopVerdict::Halt { signature, count } => {
                    self.events.publish(
                        EventName::Error,
                        json!({ "agent": self.key, "signature": signature, "count": count }),
                    );
                    return Err(AgentError::LoopDetected {
                        agent_key: self.key.clone(),
                        signature,
                        count,
                    });
                }
            }

            let completion_flagged = self.policies.completion.detect(&turn);
            match self
                .policies
                .termination
                .evaluate(stats.iterations, completion_flagged)
            {
                TerminationVerdict::Continue => {}
                TerminationVerdict::Complete => {
                    state = state.transition(WorkerEvent::Complete)?;
                    let response = self.best_effort_response(&turn);
                    return self.finish(response, &stats, state).await;
                }
                TerminationVerdict::ExhaustedWarn => {
                    state = state.transition(WorkerEvent::Complete)?;
                    let response = FinalResponse::incomplete(format!(
                        "stopped after {} iterations without a completion signal",
                        stats.iterations
                    ));
                    return self.finish(response, &stats, state).await;
                }
                TerminationVerdict::ExhaustedError => {
                    self.events.publish(
                        EventName::Error,
                        json!({ "agent": self.key, "iterations": stats.iterations }),
                    );
                    return Err(AgentError::MaxIterationsExceeded {
                        agent_key: self.key.clone(),
                        max: self.policies.termination.max_iterations,
                    });
                }
            }

            if self.policies.checkpoint.should_checkpoint(stats.iterations) {
                if let Some((store, job_id)) = &self.job {
                    store
                        .record_checkpoint(job_id, &self.key, stats.iterations)
                        .await?;
                    debug!(agent = %self.key, iteration = stats.iterations, "checkpoint recorded");
                }
            }

            state = state.transition(WorkerEvent::ContinueLoop)?;
        }
    }

    /// Execute a batch of planned actions, bounded by the parallelism cap,
    /// and record observations in the declared order.
    ///
    /// Every tool name is resolved before anything runs; an unknown tool
    /// fails the whole batch without side effects.
    async fn execute_batch(
        &self,
        actions: Vec<Action>,
        windows: &mut SlidingWindows,
        stats: &mut RunStats,
    ) -> Result<()> {
        self.check_cancelled()?;

        let mut resolved = Vec::with_capacity(actions.len());
        for action in &actions {
            let tool = self
                .tools
                .get(&action.tool_name)
                .ok_or_else(|| AgentError::ToolNotFound {
                    tool: action.tool_name.clone(),
                    agent_key: self.key.clone(),
                })?;
            resolved.push(tool);
        }

        for action in &actions {
            self.events.publish(
                EventName::ActionPlanned,
                json!({ "agent": self.key, "tool": action.tool_name, "args": action.tool_args }),
            );
            self.memory
                .append(
                    &self.namespace,
                    Entry::action(&self.key, &action.tool_name, &action.tool_args),
                )
                .await;
        }

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let futures = actions.iter().zip(resolved).map(|(action, tool)| {
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore.acquire().await.ok();
                tool.execute(&action.tool_args).await
            }
        });
        let results = join_all(futures).await;

        for (action, result) in actions.iter().zip(results) {
            windows.record_action(action.signature());
            match result {
                Ok(output) => {
                    stats.record_tool_call(true);
                    windows.record_observation(output.human_readable_summary.clone());
                    self.memory
                        .append(
                            &self.namespace,
                            Entry::observation(
                                &self.key,
                                &action.tool_name,
                                output.payload.clone(),
                                output.human_readable_summary.clone(),
                            ),
                        )
                        .await;
                    self.events.publish(
                        EventName::ActionExecuted,
                        json!({
                            "agent": self.key,
                            "tool": action.tool_name,
                            "success": true,
                            "summary": output.human_readable_summary,
                        }),
                    );
                }
                Err(err) => {
                    stats.record_tool_call(false);
                    windows.record_observation(err.to_string());
                    self.memory
                        .append(
                            &self.namespace,
                            Entry::error(
                                &self.key,
                                &format!("tool '{}' failed: {}", action.tool_name, err),
                            )
                            .with_tool(action.tool_name.clone()),
                        )
                        .await;
                    self.events.publish(
                        EventName::ActionExecuted,
                        json!({
                            "agent": self.key,
                            "tool": action.tool_name,
                            "success": false,
                            "error": err.to_string(),
                        }),
                    );
                }
            }
        }

        Ok(())
    }

    /// Final response derived from the last observation of the turn, used
    /// when the completion detector (not the planner) ends the run.
    fn best_effort_response(&self, turn: &[Entry]) -> FinalResponse {
        let last_observation = turn
            .iter()
            .rev()
            .find(|entry| entry.kind == EntryKind::Observation);

        match last_observation {
            Some(entry) => FinalResponse::new(
                "task_complete",
                entry.content.clone(),
                entry
                    .summary
                    .clone()
                    .unwrap_or_else(|| entry.content_text()),
            ),
            None => FinalResponse::new(
                "task_complete",
                Value::Null,
                "completion detected with no recorded observation",
            ),
        }
    }

    async fn finish(
        &self,
        response: FinalResponse,
        stats: &RunStats,
        state: WorkerState,
    ) -> Result<FinalResponse> {
        debug_assert!(state.is_terminal());

        self.memory
            .append(
                &self.namespace,
                Entry::new(
                    EntryKind::Final,
                    &self.key,
                    serde_json::to_value(&response)?,
                )
                .with_summary(response.human_readable_summary.clone()),
            )
            .await;
        self.events.publish(
            EventName::AgentEnd,
            json!({
                "agent": self.key,
                "operation": response.operation,
                "iterations": stats.iterations,
                "tool_calls": stats.tool_calls,
            }),
        );
        info!(
            agent = %self.key,
            iterations = stats.iterations,
            tool_calls = stats.tool_calls,
            "agent run finished"
        );
        Ok(response)
    }
}
