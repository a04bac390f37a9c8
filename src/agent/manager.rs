//! Manager agent: strategic planning, delegation, and synthesis
//!
//! A manager owns a fixed set of named subordinates (workers or nested
//! managers), decomposes its task into ordered phases via a strategic
//! planner, executes the phases sequentially or in parallel, and combines
//! the subordinate results into one final response.
//!
//! Gated pre-bound tool calls pause the run: the pending action is persisted
//! to the job store and the caller gets a resume token. A nested
//! subordinate's pause is forwarded the same way, with the subordinate's job
//! id recorded alongside. Every completed assignment lands in the
//! executed-action ledger, so `resume` replays the plan from the first phase
//! without re-running anything that already finished.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::agent::state::{ManagerEvent, ManagerState};
use crate::agent::worker::Agent;
use crate::errors::{AgentError, Result};
use crate::events::{EventBus, EventName};
use crate::jobs::{JobStore, JobStoreError, JobStatus, PendingAction};
use crate::memory::{Entry, EntryKind, MemoryStore, MemoryView, Projection};
use crate::planner::{Assignment, DelegationPlan, StrategicPlanner, Synthesizer};
use crate::policy::{LoopVerdict, PolicySet, TerminationVerdict};
use crate::types::{ActionSignature, FinalResponse, RunOutcome};

/// What to do when a phase fails or the synthesizer itself fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynthesisFailurePolicy {
    /// Summarize whatever completed; the payload is flagged incomplete
    BestEffort,

    /// Fail the run
    #[default]
    Propagate,
}

/// Anything a manager can delegate to: a worker agent or a nested manager
#[async_trait]
pub trait Runnable: Send + Sync {
    /// The runnable's key
    fn key(&self) -> &str;

    /// Run to an outcome
    async fn run(&self, task: &str) -> Result<RunOutcome>;

    /// Resume a previously paused run. Runnables that never pause keep the
    /// default rejection.
    async fn resume(
        &self,
        job_id: &str,
        _resume_token: &str,
        _approved: bool,
    ) -> Result<RunOutcome> {
        Err(JobStoreError::NoPendingAction(job_id.to_string()).into())
    }
}

#[async_trait]
impl Runnable for Agent {
    fn key(&self) -> &str {
        Agent::key(self)
    }

    async fn run(&self, task: &str) -> Result<RunOutcome> {
        Agent::run(self, task).await.map(RunOutcome::Completed)
    }
}

enum DispatchOutcome {
    Completed {
        response: FinalResponse,
        replayed: bool,
    },
    Paused {
        resume_token: String,
        job_id: String,
    },
}

/// Delegation and synthesis layer over a fixed set of subordinates
pub struct Manager {
    key: String,
    namespace: String,
    planner: Arc<dyn StrategicPlanner>,
    subordinates: HashMap<String, Arc<dyn Runnable>>,
    policies: PolicySet,
    memory: Arc<MemoryStore>,
    events: Arc<EventBus>,
    jobs: Arc<dyn JobStore>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    on_synthesis_failure: SynthesisFailurePolicy,
    cancel: CancellationToken,
}

impl Manager {
    /// Create a manager with no subordinates yet
    pub fn new(
        key: impl Into<String>,
        namespace: impl Into<String>,
        planner: Arc<dyn StrategicPlanner>,
        policies: PolicySet,
        memory: Arc<MemoryStore>,
        events: Arc<EventBus>,
        jobs: Arc<dyn JobStore>,
    ) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(AgentError::Config(
                "manager key cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            key,
            namespace: namespace.into(),
            planner,
            subordinates: HashMap::new(),
            policies,
            memory,
            events,
            jobs,
            synthesizer: None,
            on_synthesis_failure: SynthesisFailurePolicy::default(),
            cancel: CancellationToken::new(),
        })
    }

    /// Register a subordinate under its key
    pub fn with_subordinate(mut self, subordinate: Arc<dyn Runnable>) -> Self {
        self.subordinates
            .insert(subordinate.key().to_string(), subordinate);
        self
    }

    /// Attach a synthesizer for combining subordinate results
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Set the failure behavior for phases and synthesis
    pub fn with_synthesis_failure_policy(mut self, policy: SynthesisFailurePolicy) -> Self {
        self.on_synthesis_failure = policy;
        self
    }

    /// Attach a cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// This manager's key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Keys of the configured subordinates, sorted
    pub fn subordinate_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.subordinates.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn team_view(&self) -> MemoryView {
        MemoryView::Team {
            manager_key: self.key.clone(),
            subordinates: self.subordinates.keys().cloned().collect(),
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

    /// Ledger key for an assignment: the pre-bound call's signature when one
    /// exists, otherwise a signature over the worker and goal.
    fn assignment_signature(assignment: &Assignment) -> ActionSignature {
        match &assignment.tool_call {
            Some(action) => action.signature(),
            None => ActionSignature::of(
                "delegate",
                &json!({ "worker": assignment.worker, "goal": assignment.goal }),
            ),
        }
    }

    /// Run the full delegation cycle: plan, execute phases, synthesize.
    /// Returns the job id alongside the outcome so a paused run can be
    /// resumed later.
    pub async fn run(&self, task: &str) -> Result<(String, RunOutcome)> {
        let mut state = ManagerState::Ready;

        let job = self.jobs.create_job().await?;
        self.memory
            .append(&self.namespace, Entry::task(&self.key, task))
            .await;
        self.events.publish(
            EventName::ManagerStart,
            json!({ "manager": self.key, "task": task, "job_id": job.id }),
        );
        info!(manager = %self.key, job_id = %job.id, "manager run started");

        state = state.transition(ManagerEvent::StartRun)?;

        let history = self
            .memory
            .read(&self.namespace, &self.team_view(), Projection::Grouped)
            .await;
        let plan = self
            .planner
            .plan_delegation(task, &history)
            .await
            .map_err(|e| AgentError::PlannerOutputInvalid(e.to_string()))?;

        self.validate_plan(&plan)?;

        let plan_value = serde_json::to_value(&plan)?;
        self.jobs
            .update_manager_plan(&job.id, &self.key, json!({ "task": task, "plan": plan_value }))
            .await?;
        self.memory
            .append(
                &self.namespace,
                Entry::new(EntryKind::StrategicPlan, &self.key, plan_value.clone()),
            )
            .await;
        self.events.publish(
            EventName::DelegationPlanned,
            json!({ "manager": self.key, "job_id": job.id, "plan": plan_value }),
        );

        state = state.transition(ManagerEvent::PlanReady)?;

        let outcome = self.execute_phases(&job.id, task, &plan, state).await?;
        Ok((job.id, outcome))
    }

    /// Resume a paused run with a human decision.
    ///
    /// The token must match the stored pending action; the clear is atomic,
    /// so only one of two concurrent resume attempts proceeds. A denial is
    /// terminal for the job. When the pause came from a nested subordinate,
    /// the decision is forwarded to the subordinate's own job first.
    pub async fn resume(
        &self,
        job_id: &str,
        resume_token: &str,
        approved: bool,
    ) -> Result<RunOutcome> {
        let job = self.jobs.get_job(job_id).await?;
        let pending = job
            .pending_action
            .as_ref()
            .ok_or_else(|| JobStoreError::NoPendingAction(job_id.to_string()))?;
        if pending.resume_token != resume_token {
            return Err(JobStoreError::TokenMismatch(job_id.to_string()).into());
        }

        if !approved {
            let cleared = self
                .jobs
                .clear_pending_action(job_id, JobStatus::Denied)
                .await?;
            if let Some(sub_job) = &cleared.subordinate_job_id {
                if let Some(subordinate) = self.subordinates.get(&cleared.worker) {
                    match subordinate.resume(sub_job, resume_token, false).await {
                        Ok(_) | Err(AgentError::ApprovalDenied { .. }) => {}
                        Err(err) => return Err(err),
                    }
                }
            }
            self.events.publish(
                EventName::PolicyDenied,
                json!({
                    "manager": self.key,
                    "job_id": job_id,
                    "tool": cleared.tool,
                    "worker": cleared.worker,
                }),
            );
            self.memory
                .append(
                    &self.namespace,
                    Entry::error(
                        &self.key,
                        &format!(
                            "approval denied for tool '{}' bound to '{}'",
                            cleared.tool, cleared.worker
                        ),
                    ),
                )
                .await;
            return Err(AgentError::ApprovalDenied {
                resume_token: resume_token.to_string(),
            });
        }

        let cleared = self
            .jobs
            .clear_pending_action(job_id, JobStatus::Approved)
            .await?;
        self.jobs.set_status(job_id, JobStatus::Active).await?;
        info!(
            manager = %self.key,
            job_id,
            tool = %cleared.tool,
            "pending action approved, resuming"
        );

        let (task, plan) = self.stored_plan(job_id).await?;

        if let Some(sub_job) = cleared.subordinate_job_id.clone() {
            let subordinate = self.subordinates.get(&cleared.worker).ok_or_else(|| {
                AgentError::NamespaceIsolationViolation {
                    manager_key: self.key.clone(),
                    agent_key: cleared.worker.clone(),
                }
            })?;
            match subordinate.resume(&sub_job, resume_token, true).await? {
                RunOutcome::PendingApproval {
                    resume_token: next_token,
                    job_id: next_job,
                } => {
                    // Paused again on a later gate; stay paused on the new
                    // token.
                    self.jobs
                        .save_pending_action(
                            job_id,
                            PendingAction {
                                resume_token: next_token.clone(),
                                subordinate_job_id: Some(next_job),
                                created_at: chrono::Utc::now(),
                                ..cleared
                            },
                        )
                        .await?;
                    return Ok(RunOutcome::PendingApproval {
                        resume_token: next_token,
                        job_id: job_id.to_string(),
                    });
                }
                RunOutcome::Completed(response) => {
                    let assignment = plan
                        .phases
                        .get(cleared.phase_index)
                        .and_then(|phase| phase.assignments.get(cleared.assignment_index))
                        .ok_or_else(|| {
                            AgentError::Config(
                                "stored plan no longer matches the pending action".to_string(),
                            )
                        })?;
                    self.record_result(job_id, assignment, &response).await?;
                }
            }
        }

        // Replay from the first phase so synthesis sees every completed
        // assignment; the ledger prevents re-execution.
        let state = ManagerState::Paused.transition(ManagerEvent::Resumed)?;
        self.execute_phases(job_id, &task, &plan, state).await
    }

    async fn stored_plan(&self, job_id: &str) -> Result<(String, DelegationPlan)> {
        let stored = self
            .jobs
            .get_job(job_id)
            .await?
            .manager_plans
            .get(&self.key)
            .cloned()
            .ok_or_else(|| {
                AgentError::Config(format!("job '{}' has no stored plan for '{}'", job_id, self.key))
            })?;
        let task = stored["task"]
            .as_str()
            .ok_or_else(|| AgentError::Config("stored plan is missing its task".to_string()))?
            .to_string();
        let plan: DelegationPlan = serde_json::from_value(stored["plan"].clone())?;
        Ok((task, plan))
    }

    fn validate_plan(&self, plan: &DelegationPlan) -> Result<()> {
        for worker in plan.worker_keys() {
            if !self.subordinates.contains_key(worker) {
                return Err(AgentError::NamespaceIsolationViolation {
                    manager_key: self.key.clone(),
                    agent_key: worker.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn execute_phases(
        &self,
        job_id: &str,
        task: &str,
        plan: &DelegationPlan,
        mut state: ManagerState,
    ) -> Result<RunOutcome> {
        let mut windows = self.policies.loop_prevention.windows();
        let mut results: Vec<(String, FinalResponse)> = Vec::new();
        let mut phases_done: u32 = 0;
        let mut incomplete = false;

        for (phase_index, phase) in plan.phases.iter().enumerate() {
            self.check_cancelled()?;

            // Gating scan before anything in the phase runs, so a pause
            // leaves the phase untouched.
            for (assignment_index, assignment) in phase.assignments.iter().enumerate() {
                if let Some(action) = &assignment.tool_call {
                    if !self.policies.approval.requires_approval(action) {
                        continue;
                    }
                    let signature = action.signature();
                    let job = self.jobs.get_job(job_id).await?;
                    let decided = job.approvals.get(signature.as_str()).copied();
                    let executed = self.jobs.has_executed_action(job_id, &signature).await?;
                    if decided == Some(true) || executed {
                        continue;
                    }
                    state = state.transition(ManagerEvent::ApprovalRequired)?;
                    debug_assert_eq!(state, ManagerState::Paused);
                    return self
                        .pause(job_id, assignment, phase_index, assignment_index)
                        .await;
                }
            }

            let phase_results = if phase.parallel {
                let dispatches = phase
                    .assignments
                    .iter()
                    .map(|assignment| self.dispatch(job_id, assignment));
                join_all(dispatches).await
            } else {
                let mut sequential = Vec::with_capacity(phase.assignments.len());
                for assignment in &phase.assignments {
                    sequential.push(self.dispatch(job_id, assignment).await);
                }
                sequential
            };

            // Record in declared order regardless of completion order, so a
            // pause or a failure never loses a completed sibling's result.
            let mut paused: Option<(usize, String, String)> = None;
            let mut failed: Option<AgentError> = None;
            for (assignment_index, (assignment, dispatch)) in
                phase.assignments.iter().zip(phase_results).enumerate()
            {
                match dispatch {
                    Ok(DispatchOutcome::Paused {
                        resume_token,
                        job_id: sub_job,
                    }) => {
                        if paused.is_none() {
                            paused = Some((assignment_index, resume_token, sub_job));
                        }
                    }
                    Ok(DispatchOutcome::Completed { response, replayed }) => {
                        if !replayed {
                            self.record_result(job_id, assignment, &response).await?;
                            windows.record_action(Self::assignment_signature(assignment));
                        }
                        results.push((assignment.worker.clone(), response));
                    }
                    Err(err) => {
                        if failed.is_none() {
                            failed = Some(err);
                        }
                    }
                }
            }

            // A nested subordinate paused its own job; persist a forwarding
            // pending action so this run is resumable through this manager.
            if let Some((assignment_index, resume_token, sub_job)) = paused {
                state = state.transition(ManagerEvent::ApprovalRequired)?;
                debug_assert_eq!(state, ManagerState::Paused);
                let assignment = &phase.assignments[assignment_index];
                let pending = PendingAction {
                    worker: assignment.worker.clone(),
                    tool: assignment
                        .tool_call
                        .as_ref()
                        .map(|a| a.tool_name.clone())
                        .unwrap_or_else(|| "delegate".to_string()),
                    args: assignment
                        .tool_call
                        .as_ref()
                        .map(|a| a.tool_args.clone())
                        .unwrap_or_else(|| json!({ "goal": assignment.goal })),
                    manager: Some(self.key.clone()),
                    resume_token: resume_token.clone(),
                    created_at: chrono::Utc::now(),
                    phase_index,
                    assignment_index,
                    subordinate_job_id: Some(sub_job),
                };
                self.jobs.save_pending_action(job_id, pending).await?;
                info!(
                    manager = %self.key,
                    job_id,
                    worker = %assignment.worker,
                    "subordinate paused, awaiting approval"
                );
                return Ok(RunOutcome::PendingApproval {
                    resume_token,
                    job_id: job_id.to_string(),
                });
            }

            if let Some(err) = failed {
                match self.on_synthesis_failure {
                    SynthesisFailurePolicy::Propagate => return Err(err),
                    SynthesisFailurePolicy::BestEffort => {
                        warn!(manager = %self.key, error = %err, "phase failed, summarizing completed work");
                        incomplete = true;
                        // Later phases build on this one; stop here.
                        break;
                    }
                }
            }

            phases_done += 1;
            state = state.transition(ManagerEvent::PhaseComplete)?;

            match self.policies.loop_prevention.evaluate(&windows) {
                LoopVerdict::Pass => {}
                LoopVerdict::Warn { signature, count } => {
                    warn!(manager = %self.key, %signature, count, "repeated delegation detected");
                }
                LoopVerdict::Halt { signature, count } => {
                    return Err(AgentError::LoopDetected {
                        agent_key: self.key.clone(),
                        signature,
                        count,
                    });
                }
            }

            let turn = self.memory.current_turn(&self.namespace, &self.key).await;
            let completion_flagged = self.policies.completion.detect(&turn);
            match self.policies.termination.evaluate(phases_done, completion_flagged) {
                TerminationVerdict::Continue => {}
                TerminationVerdict::Complete => {
                    info!(manager = %self.key, phases_done, "completion flagged, skipping remaining phases");
                    break;
                }
                TerminationVerdict::ExhaustedWarn => {
                    if phase_index + 1 < plan.phases.len() {
                        warn!(manager = %self.key, phases_done, "phase budget exhausted");
                        incomplete = true;
                    }
                }
                TerminationVerdict::ExhaustedError => {
                    if phase_index + 1 < plan.phases.len() {
                        return Err(AgentError::MaxIterationsExceeded {
                            agent_key: self.key.clone(),
                            max: self.policies.termination.max_iterations,
                        });
                    }
                }
            }

            if self.policies.checkpoint.should_checkpoint(phases_done) {
                self.jobs
                    .record_checkpoint(job_id, &self.key, phases_done)
                    .await?;
            }

            if incomplete {
                break;
            }
        }

        state = state.transition(ManagerEvent::AllPhasesComplete)?;
        let response = self.synthesize(job_id, task, &results, incomplete).await?;
        state = state.transition(ManagerEvent::Synthesized)?;
        debug_assert!(state.is_terminal());

        Ok(RunOutcome::Completed(response))
    }

    async fn pause(
        &self,
        job_id: &str,
        assignment: &Assignment,
        phase_index: usize,
        assignment_index: usize,
    ) -> Result<RunOutcome> {
        let action = assignment.tool_call.as_ref().ok_or_else(|| {
            AgentError::Config("cannot pause an assignment without a tool call".to_string())
        })?;
        let resume_token = uuid::Uuid::new_v4().to_string();
        let pending = PendingAction {
            worker: assignment.worker.clone(),
            tool: action.tool_name.clone(),
            args: action.tool_args.clone(),
            manager: Some(self.key.clone()),
            resume_token: resume_token.clone(),
            created_at: chrono::Utc::now(),
            phase_index,
            assignment_index,
            subordinate_job_id: None,
        };
        self.jobs.save_pending_action(job_id, pending).await?;
        self.events.publish(
            EventName::DelegationChosen,
            json!({
                "manager": self.key,
                "job_id": job_id,
                "worker": assignment.worker,
                "tool": action.tool_name,
                "pending_approval": true,
            }),
        );
        info!(
            manager = %self.key,
            job_id,
            tool = %action.tool_name,
            "run paused awaiting approval"
        );
        Ok(RunOutcome::PendingApproval {
            resume_token,
            job_id: job_id.to_string(),
        })
    }

    async fn dispatch(&self, job_id: &str, assignment: &Assignment) -> Result<DispatchOutcome> {
        let subordinate = self.subordinates.get(&assignment.worker).ok_or_else(|| {
            AgentError::NamespaceIsolationViolation {
                manager_key: self.key.clone(),
                agent_key: assignment.worker.clone(),
            }
        })?;

        // Resume-time safety: an already-executed assignment is replayed
        // from the ledger, never re-executed.
        let signature = Self::assignment_signature(assignment);
        if let Some(recorded) = self.jobs.recorded_result(job_id, &signature).await? {
            let response: FinalResponse = serde_json::from_value(recorded)?;
            info!(
                manager = %self.key,
                worker = %assignment.worker,
                %signature,
                "replaying recorded result"
            );
            return Ok(DispatchOutcome::Completed {
                response,
                replayed: true,
            });
        }

        self.events.publish(
            EventName::DelegationChosen,
            json!({
                "manager": self.key,
                "worker": assignment.worker,
                "goal": assignment.goal,
            }),
        );
        self.memory
            .append(
                &self.namespace,
                Entry::delegation(&self.key, &assignment.worker, &assignment.goal),
            )
            .await;

        match subordinate.run(&assignment.goal).await {
            Ok(RunOutcome::Completed(response)) => Ok(DispatchOutcome::Completed {
                response,
                replayed: false,
            }),
            Ok(RunOutcome::PendingApproval {
                resume_token,
                job_id,
            }) => Ok(DispatchOutcome::Paused {
                resume_token,
                job_id,
            }),
            Err(err) => {
                self.memory
                    .append(
                        &self.namespace,
                        Entry::error(
                            &self.key,
                            &format!("delegation to '{}' failed: {}", assignment.worker, err),
                        )
                        .with_from_worker(assignment.worker.clone()),
                    )
                    .await;
                self.events.publish(
                    EventName::Error,
                    json!({
                        "manager": self.key,
                        "worker": assignment.worker,
                        "error": err.to_string(),
                    }),
                );
                Err(AgentError::DelegationFailed {
                    worker: assignment.worker.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }

    async fn record_result(
        &self,
        job_id: &str,
        assignment: &Assignment,
        response: &FinalResponse,
    ) -> Result<()> {
        self.jobs
            .add_executed_action(
                job_id,
                &Self::assignment_signature(assignment),
                serde_json::to_value(response)?,
            )
            .await?;
        self.memory
            .append(
                &self.namespace,
                Entry::observation(
                    &self.key,
                    "delegation",
                    serde_json::to_value(response)?,
                    response.human_readable_summary.clone(),
                )
                .with_from_worker(assignment.worker.clone()),
            )
            .await;
        self.events.publish(
            EventName::DelegationExecuted,
            json!({
                "manager": self.key,
                "worker": assignment.worker,
                "operation": response.operation,
            }),
        );
        Ok(())
    }

    async fn synthesize(
        &self,
        job_id: &str,
        task: &str,
        results: &[(String, FinalResponse)],
        incomplete: bool,
    ) -> Result<FinalResponse> {
        let mut response = match &self.synthesizer {
            Some(synthesizer) => match synthesizer.synthesize(task, results).await {
                Ok(response) => response,
                Err(err) => match self.on_synthesis_failure {
                    SynthesisFailurePolicy::Propagate => {
                        return Err(AgentError::PlannerOutputInvalid(format!(
                            "synthesis failed: {}",
                            err
                        )));
                    }
                    SynthesisFailurePolicy::BestEffort => {
                        warn!(manager = %self.key, error = %err, "synthesis failed, falling back");
                        Self::mechanical_synthesis(results)
                    }
                },
            },
            None => Self::mechanical_synthesis(results),
        };

        if incomplete {
            match &mut response.payload {
                Value::Object(map) => {
                    map.insert("incomplete".to_string(), json!(true));
                }
                other => {
                    *other = json!({ "result": other.clone(), "incomplete": true });
                }
            }
        }

        self.memory
            .append(
                &self.namespace,
                Entry::new(
                    EntryKind::Synthesis,
                    &self.key,
                    serde_json::to_value(&response)?,
                )
                .with_summary(response.human_readable_summary.clone()),
            )
            .await;
        self.jobs.set_status(job_id, JobStatus::Completed).await?;
        self.events.publish(
            EventName::ManagerEnd,
            json!({
                "manager": self.key,
                "job_id": job_id,
                "operation": response.operation,
                "results": results.len(),
            }),
        );
        info!(manager = %self.key, job_id, "manager run finished");

        Ok(response)
    }

    /// Fallback synthesis: subordinate payloads keyed by worker, summaries
    /// joined in delegation order
    fn mechanical_synthesis(results: &[(String, FinalResponse)]) -> FinalResponse {
        let mut payload = serde_json::Map::new();
        for (worker, response) in results {
            payload.insert(worker.clone(), response.payload.clone());
        }
        let summary = results
            .iter()
            .map(|(worker, response)| {
                format!("{}: {}", worker, response.human_readable_summary)
            })
            .collect::<Vec<_>>()
            .join("; ");
        FinalResponse::new("synthesis", Value::Object(payload), summary)
    }
}

#[async_trait]
impl Runnable for Manager {
    fn key(&self) -> &str {
        Manager::key(self)
    }

    async fn run(&self, task: &str) -> Result<RunOutcome> {
        let (_job_id, outcome) = Manager::run(self, task).await?;
        Ok(outcome)
    }

    async fn resume(
        &self,
        job_id: &str,
        resume_token: &str,
        approved: bool,
    ) -> Result<RunOutcome> {
        Manager::resume(self, job_id, resume_token, approved).await
    }
}
