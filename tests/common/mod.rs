//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use overseer::events::{EventName, EventSubscriber};
use overseer::memory::Entry;
use overseer::planner::{
    DelegationPlan, Planner, PlannerError, PlannerOutput, StrategicPlanner, Synthesizer,
};
use overseer::policy::{
    ApprovalPolicy, CheckpointPolicy, CompletionDetector, LoopPreventionPolicy, PolicyAction,
    PolicySet, TerminationPolicy,
};
use overseer::tools::{Tool, ToolError, ToolOutput, ToolRegistry};
use overseer::types::FinalResponse;

/// Route engine tracing through the test harness; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Echoes its arguments back as the payload
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "echoes arguments back"
    }

    async fn execute(&self, args: &Value) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::new(args.clone(), "echoed"))
    }
}

/// Always fails with an execution error
pub struct FailTool;

#[async_trait]
impl Tool for FailTool {
    fn name(&self) -> &str {
        "fail"
    }

    fn description(&self) -> &str {
        "always fails"
    }

    async fn execute(&self, _args: &Value) -> Result<ToolOutput, ToolError> {
        Err(ToolError::Failed("simulated failure".to_string()))
    }
}

/// Reports the task done with a completion indicator in the payload
pub struct FinishTool;

#[async_trait]
impl Tool for FinishTool {
    fn name(&self) -> &str {
        "finish"
    }

    fn description(&self) -> &str {
        "marks the task complete"
    }

    async fn execute(&self, _args: &Value) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::new(
            json!({"status": "task complete"}),
            "task complete",
        ))
    }
}

/// Registry with the three standard test tools
pub fn test_registry() -> ToolRegistry {
    init_tracing();
    let mut registry = ToolRegistry::new();
    registry.register(EchoTool).unwrap();
    registry.register(FailTool).unwrap();
    registry.register(FinishTool).unwrap();
    registry
}

/// Planner that replays a scripted sequence; extra calls report exhaustion
pub struct ScriptedPlanner {
    script: Mutex<Vec<Result<PlannerOutput, PlannerError>>>,
    pub calls: AtomicUsize,
}

impl ScriptedPlanner {
    pub fn new(mut script: Vec<Result<PlannerOutput, PlannerError>>) -> Arc<Self> {
        script.reverse();
        Arc::new(Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn plan(
        &self,
        _task: &str,
        _history: &[Entry],
    ) -> Result<PlannerOutput, PlannerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(PlannerError::Provider("script exhausted".to_string())))
    }
}

/// Strategic planner returning one fixed delegation plan
pub struct FixedStrategicPlanner {
    pub plan: DelegationPlan,
}

impl FixedStrategicPlanner {
    pub fn new(plan: DelegationPlan) -> Arc<Self> {
        Arc::new(Self { plan })
    }
}

#[async_trait]
impl StrategicPlanner for FixedStrategicPlanner {
    async fn plan_delegation(
        &self,
        _task: &str,
        _history: &[Entry],
    ) -> Result<DelegationPlan, PlannerError> {
        Ok(self.plan.clone())
    }
}

/// Synthesizer that joins subordinate summaries
pub struct JoiningSynthesizer;

#[async_trait]
impl Synthesizer for JoiningSynthesizer {
    async fn synthesize(
        &self,
        task: &str,
        results: &[(String, FinalResponse)],
    ) -> Result<FinalResponse, PlannerError> {
        let summaries: Vec<String> = results
            .iter()
            .map(|(worker, response)| {
                format!("{}={}", worker, response.human_readable_summary)
            })
            .collect();
        Ok(FinalResponse::new(
            "synthesized",
            json!({ "task": task, "workers": results.len() }),
            summaries.join(" | "),
        ))
    }
}

/// Synthesizer that always fails
pub struct BrokenSynthesizer;

#[async_trait]
impl Synthesizer for BrokenSynthesizer {
    async fn synthesize(
        &self,
        _task: &str,
        _results: &[(String, FinalResponse)],
    ) -> Result<FinalResponse, PlannerError> {
        Err(PlannerError::Provider("synthesis model offline".to_string()))
    }
}

/// Inline subscriber that records every published event
#[derive(Default)]
pub struct RecordingSubscriber {
    pub events: Mutex<Vec<(EventName, Value)>>,
}

impl RecordingSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn names(&self) -> Vec<EventName> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| *name)
            .collect()
    }
}

impl EventSubscriber for RecordingSubscriber {
    fn handle(&self, event: EventName, data: &Value) {
        self.events.lock().unwrap().push((event, data.clone()));
    }
}

/// Policy set with a generous budget and warn-only outcomes
pub fn lenient_policies(max_iterations: u32) -> PolicySet {
    PolicySet::builder()
        .loop_prevention(LoopPreventionPolicy::default())
        .completion(CompletionDetector::default())
        .termination(TerminationPolicy {
            max_iterations,
            on_max_iterations: PolicyAction::Warn,
            check_completion: true,
        })
        .approval(ApprovalPolicy::permissive())
        .checkpoint(CheckpointPolicy::disabled())
        .build()
        .unwrap()
}

/// Policy set gating the named tools for approval
pub fn gating_policies(max_iterations: u32, gated: &[&str]) -> PolicySet {
    PolicySet::builder()
        .loop_prevention(LoopPreventionPolicy::default())
        .completion(CompletionDetector::default())
        .termination(TerminationPolicy {
            max_iterations,
            on_max_iterations: PolicyAction::Warn,
            check_completion: true,
        })
        .approval(ApprovalPolicy::gating(gated.iter().copied()))
        .checkpoint(CheckpointPolicy::disabled())
        .build()
        .unwrap()
}
