//! Manager delegation, synthesis, and hierarchy coverage

mod common;

use std::sync::Arc;

use serde_json::json;

use common::{
    lenient_policies, test_registry, BrokenSynthesizer, FixedStrategicPlanner,
    JoiningSynthesizer, RecordingSubscriber, ScriptedPlanner,
};
use overseer::agent::{Agent, Manager, Runnable, SynthesisFailurePolicy};
use overseer::errors::AgentError;
use overseer::events::{EventBus, EventName};
use overseer::jobs::{InMemoryJobStore, JobStore, JobStatus};
use overseer::memory::{EntryKind, MemoryStore, MemoryView, Projection};
use overseer::planner::{Assignment, DelegationPlan, Phase, PlannerOutput};
use overseer::types::{Action, FinalResponse, RunOutcome};

fn worker(
    key: &str,
    namespace: &str,
    memory: Arc<MemoryStore>,
    events: Arc<EventBus>,
) -> Arc<Agent> {
    let planner = ScriptedPlanner::new(vec![
        Ok(PlannerOutput::Single(Action::new(
            "echo",
            json!({"worker": key}),
        ))),
        Ok(PlannerOutput::Final(FinalResponse::new(
            "worker_done",
            json!({"worker": key}),
            format!("{} finished", key),
        ))),
    ]);
    Arc::new(
        Agent::new(
            key,
            namespace,
            planner,
            test_registry(),
            lenient_policies(10),
            memory,
            events,
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn sequential_phases_run_in_order_and_synthesize() {
    let memory = MemoryStore::shared();
    let events = EventBus::shared();
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    let plan = DelegationPlan::new(vec![
        Phase::sequential("research", vec![Assignment::new("w1", "dig up facts")]),
        Phase::sequential("write", vec![Assignment::new("w2", "draft the report")]),
    ]);
    let manager = Manager::new(
        "boss",
        "job-ns",
        FixedStrategicPlanner::new(plan),
        lenient_policies(10),
        memory.clone(),
        events.clone(),
        jobs.clone(),
    )
    .unwrap()
    .with_subordinate(worker("w1", "job-ns", memory.clone(), events.clone()))
    .with_subordinate(worker("w2", "job-ns", memory.clone(), events.clone()))
    .with_synthesizer(Arc::new(JoiningSynthesizer));

    let (job_id, outcome) = manager.run("produce the report").await.unwrap();

    let response = outcome.final_response().unwrap();
    assert_eq!(response.operation, "synthesized");
    assert!(response.human_readable_summary.contains("w1=w1 finished"));
    assert!(response.human_readable_summary.contains("w2=w2 finished"));

    let job = jobs.get_job(&job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.manager_plans.contains_key("boss"));
}

#[tokio::test]
async fn parallel_phase_collects_all_results() {
    let memory = MemoryStore::shared();
    let events = EventBus::shared();
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    let plan = DelegationPlan::new(vec![Phase::parallel(
        "fanout",
        vec![
            Assignment::new("w1", "left half"),
            Assignment::new("w2", "right half"),
        ],
    )]);
    let manager = Manager::new(
        "boss",
        "job-ns",
        FixedStrategicPlanner::new(plan),
        lenient_policies(10),
        memory.clone(),
        events.clone(),
        jobs,
    )
    .unwrap()
    .with_subordinate(worker("w1", "job-ns", memory.clone(), events.clone()))
    .with_subordinate(worker("w2", "job-ns", memory.clone(), events.clone()));

    let (_, outcome) = manager.run("split the work").await.unwrap();

    // Fallback synthesis keys payloads by worker.
    let response = outcome.final_response().unwrap();
    assert_eq!(response.operation, "synthesis");
    assert_eq!(response.payload["w1"]["worker"], json!("w1"));
    assert_eq!(response.payload["w2"]["worker"], json!("w2"));
}

#[tokio::test]
async fn team_view_sees_subordinate_traces_plain_view_does_not() {
    let memory = MemoryStore::shared();
    let events = EventBus::shared();
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    let plan = DelegationPlan::new(vec![Phase::sequential(
        "only",
        vec![Assignment::new("w1", "work")],
    )]);
    let manager = Manager::new(
        "boss",
        "job-ns",
        FixedStrategicPlanner::new(plan),
        lenient_policies(10),
        memory.clone(),
        events.clone(),
        jobs,
    )
    .unwrap()
    .with_subordinate(worker("w1", "job-ns", memory.clone(), events.clone()));

    manager.run("delegate").await.unwrap();

    let team = memory
        .read(
            "job-ns",
            &MemoryView::Team {
                manager_key: "boss".to_string(),
                subordinates: vec!["w1".to_string()],
            },
            Projection::Chronological,
        )
        .await;
    assert!(team.iter().any(|e| e.agent_key == "w1"));
    assert!(team.iter().any(|e| e.kind == EntryKind::Synthesis));

    // The worker's plain view never includes the manager's trace or the
    // global synthesis entry.
    let plain = memory
        .read(
            "job-ns",
            &MemoryView::Agent {
                agent_key: "w1".to_string(),
            },
            Projection::Chronological,
        )
        .await;
    assert!(plain.iter().all(|e| e.agent_key == "w1"));
    assert!(!plain.iter().any(|e| e.kind == EntryKind::Synthesis));
}

#[tokio::test]
async fn plan_naming_unconfigured_worker_is_rejected() {
    let memory = MemoryStore::shared();
    let events = EventBus::shared();
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    let plan = DelegationPlan::new(vec![Phase::sequential(
        "sneaky",
        vec![Assignment::new("intruder", "exfiltrate")],
    )]);
    let manager = Manager::new(
        "boss",
        "job-ns",
        FixedStrategicPlanner::new(plan),
        lenient_policies(10),
        memory.clone(),
        events.clone(),
        jobs,
    )
    .unwrap()
    .with_subordinate(worker("w1", "job-ns", memory, events));

    let result = manager.run("bad plan").await;
    assert!(matches!(
        result,
        Err(AgentError::NamespaceIsolationViolation { agent_key, .. }) if agent_key == "intruder"
    ));
}

#[tokio::test]
async fn failed_subordinate_fails_the_phase() {
    let memory = MemoryStore::shared();
    let events = EventBus::shared();
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    // Worker whose planner immediately exhausts into provider errors and
    // whose termination policy is strict.
    let failing_planner = ScriptedPlanner::new(vec![Ok(PlannerOutput::Single(Action::new(
        "nonexistent_tool",
        json!({}),
    )))]);
    let failing = Arc::new(
        Agent::new(
            "w1",
            "job-ns",
            failing_planner,
            test_registry(),
            lenient_policies(10),
            memory.clone(),
            events.clone(),
        )
        .unwrap(),
    );

    let plan = DelegationPlan::new(vec![Phase::sequential(
        "doomed",
        vec![Assignment::new("w1", "try anyway")],
    )]);
    let manager = Manager::new(
        "boss",
        "job-ns",
        FixedStrategicPlanner::new(plan),
        lenient_policies(10),
        memory.clone(),
        events.clone(),
        jobs,
    )
    .unwrap()
    .with_subordinate(failing);

    let result = manager.run("doomed run").await;
    assert!(matches!(
        result,
        Err(AgentError::DelegationFailed { worker, .. }) if worker == "w1"
    ));

    // The failure was tagged with the worker it came from.
    let team = memory
        .read(
            "job-ns",
            &MemoryView::Team {
                manager_key: "boss".to_string(),
                subordinates: vec!["w1".to_string()],
            },
            Projection::Chronological,
        )
        .await;
    assert!(team.iter().any(|e| {
        e.kind == EntryKind::Error
            && e.agent_key == "boss"
            && e.from_worker.as_deref() == Some("w1")
    }));
}

#[tokio::test]
async fn broken_synthesizer_propagates_by_default() {
    let memory = MemoryStore::shared();
    let events = EventBus::shared();
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    let plan = DelegationPlan::new(vec![Phase::sequential(
        "only",
        vec![Assignment::new("w1", "work")],
    )]);
    let manager = Manager::new(
        "boss",
        "job-ns",
        FixedStrategicPlanner::new(plan),
        lenient_policies(10),
        memory.clone(),
        events.clone(),
        jobs,
    )
    .unwrap()
    .with_subordinate(worker("w1", "job-ns", memory, events))
    .with_synthesizer(Arc::new(BrokenSynthesizer));

    let result = manager.run("synthesize me").await;
    assert!(matches!(result, Err(AgentError::PlannerOutputInvalid(_))));
}

#[tokio::test]
async fn broken_synthesizer_falls_back_when_configured() {
    let memory = MemoryStore::shared();
    let events = EventBus::shared();
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    let plan = DelegationPlan::new(vec![Phase::sequential(
        "only",
        vec![Assignment::new("w1", "work")],
    )]);
    let manager = Manager::new(
        "boss",
        "job-ns",
        FixedStrategicPlanner::new(plan),
        lenient_policies(10),
        memory.clone(),
        events.clone(),
        jobs,
    )
    .unwrap()
    .with_subordinate(worker("w1", "job-ns", memory, events))
    .with_synthesizer(Arc::new(BrokenSynthesizer))
    .with_synthesis_failure_policy(SynthesisFailurePolicy::BestEffort);

    let (_, outcome) = manager.run("synthesize me").await.unwrap();
    let response = outcome.final_response().unwrap();
    assert_eq!(response.operation, "synthesis");
    assert_eq!(response.payload["w1"]["worker"], json!("w1"));
}

#[tokio::test]
async fn nested_manager_runs_as_subordinate() {
    let memory = MemoryStore::shared();
    let events = EventBus::shared();
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    let inner_plan = DelegationPlan::new(vec![Phase::sequential(
        "inner",
        vec![Assignment::new("w1", "leaf work")],
    )]);
    let inner = Arc::new(
        Manager::new(
            "team-lead",
            "job-ns",
            FixedStrategicPlanner::new(inner_plan),
            lenient_policies(10),
            memory.clone(),
            events.clone(),
            jobs.clone(),
        )
        .unwrap()
        .with_subordinate(worker("w1", "job-ns", memory.clone(), events.clone())),
    );

    let outer_plan = DelegationPlan::new(vec![Phase::sequential(
        "outer",
        vec![Assignment::new("team-lead", "delegate downward")],
    )]);
    let outer = Manager::new(
        "director",
        "job-ns",
        FixedStrategicPlanner::new(outer_plan),
        lenient_policies(10),
        memory.clone(),
        events.clone(),
        jobs,
    )
    .unwrap()
    .with_subordinate(inner as Arc<dyn Runnable>);

    let (_, outcome) = outer.run("cascade").await.unwrap();
    assert!(matches!(outcome, RunOutcome::Completed(_)));
}

#[tokio::test]
async fn delegation_events_fire() {
    let memory = MemoryStore::shared();
    let events = EventBus::shared();
    let recorder = RecordingSubscriber::new();
    events.subscribe(recorder.clone());
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    let plan = DelegationPlan::new(vec![Phase::sequential(
        "only",
        vec![Assignment::new("w1", "work")],
    )]);
    let manager = Manager::new(
        "boss",
        "job-ns",
        FixedStrategicPlanner::new(plan),
        lenient_policies(10),
        memory.clone(),
        events.clone(),
        jobs,
    )
    .unwrap()
    .with_subordinate(worker("w1", "job-ns", memory, events));

    manager.run("delegate").await.unwrap();

    let names = recorder.names();
    let position = |name: EventName| names.iter().position(|n| *n == name).unwrap();
    assert!(position(EventName::ManagerStart) < position(EventName::DelegationPlanned));
    assert!(position(EventName::DelegationPlanned) < position(EventName::DelegationChosen));
    assert!(position(EventName::DelegationChosen) < position(EventName::DelegationExecuted));
    assert!(position(EventName::DelegationExecuted) < position(EventName::ManagerEnd));
}

#[tokio::test]
async fn failed_phase_still_synthesizes_under_best_effort() {
    let memory = MemoryStore::shared();
    let events = EventBus::shared();
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    let failing_planner = ScriptedPlanner::new(vec![Ok(PlannerOutput::Single(Action::new(
        "nonexistent_tool",
        json!({}),
    )))]);
    let failing = Arc::new(
        Agent::new(
            "w1",
            "job-ns",
            failing_planner,
            test_registry(),
            lenient_policies(10),
            memory.clone(),
            events.clone(),
        )
        .unwrap(),
    );

    let plan = DelegationPlan::new(vec![
        Phase::parallel(
            "mixed",
            vec![
                Assignment::new("w1", "doomed half"),
                Assignment::new("w2", "healthy half"),
            ],
        ),
        Phase::sequential("followup", vec![Assignment::new("w3", "never reached")]),
    ]);
    let manager = Manager::new(
        "boss",
        "job-ns",
        FixedStrategicPlanner::new(plan),
        lenient_policies(10),
        memory.clone(),
        events.clone(),
        jobs,
    )
    .unwrap()
    .with_subordinate(failing)
    .with_subordinate(worker("w2", "job-ns", memory.clone(), events.clone()))
    .with_subordinate(worker("w3", "job-ns", memory.clone(), events.clone()))
    .with_synthesis_failure_policy(SynthesisFailurePolicy::BestEffort);

    let (_, outcome) = manager.run("degrade gracefully").await.unwrap();
    let response = outcome.final_response().unwrap();

    // The surviving sibling's result is summarized; the later phase never
    // ran and the payload is flagged incomplete.
    assert_eq!(response.payload["w2"]["worker"], json!("w2"));
    assert!(response.payload.get("w1").is_none());
    assert!(response.payload.get("w3").is_none());
    assert_eq!(response.payload["incomplete"], json!(true));

    let team = memory
        .read(
            "job-ns",
            &MemoryView::Team {
                manager_key: "boss".to_string(),
                subordinates: vec!["w1".to_string(), "w2".to_string(), "w3".to_string()],
            },
            Projection::Chronological,
        )
        .await;
    assert!(team.iter().any(|e| {
        e.kind == EntryKind::Error
            && e.agent_key == "boss"
            && e.from_worker.as_deref() == Some("w1")
    }));
}

#[tokio::test]
async fn completion_signal_skips_remaining_phases() {
    let memory = MemoryStore::shared();
    let events = EventBus::shared();
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    // First worker reports the whole task done; the second phase must
    // never be dispatched.
    let done_planner = ScriptedPlanner::new(vec![Ok(PlannerOutput::Final(FinalResponse::new(
        "worker_done",
        json!({"worker": "w1"}),
        "everything covered, task complete",
    )))]);
    let done_worker = Arc::new(
        Agent::new(
            "w1",
            "job-ns",
            done_planner,
            test_registry(),
            lenient_policies(10),
            memory.clone(),
            events.clone(),
        )
        .unwrap(),
    );

    let second_planner = ScriptedPlanner::new(vec![Ok(PlannerOutput::Final(FinalResponse::new(
        "worker_done",
        json!({"worker": "w2"}),
        "w2 finished",
    )))]);
    let second_worker = Arc::new(
        Agent::new(
            "w2",
            "job-ns",
            second_planner.clone(),
            test_registry(),
            lenient_policies(10),
            memory.clone(),
            events.clone(),
        )
        .unwrap(),
    );

    let plan = DelegationPlan::new(vec![
        Phase::sequential("first", vec![Assignment::new("w1", "do it all")]),
        Phase::sequential("second", vec![Assignment::new("w2", "redundant")]),
    ]);
    let manager = Manager::new(
        "boss",
        "job-ns",
        FixedStrategicPlanner::new(plan),
        lenient_policies(10),
        memory.clone(),
        events.clone(),
        jobs,
    )
    .unwrap()
    .with_subordinate(done_worker)
    .with_subordinate(second_worker);

    let (_, outcome) = manager.run("stop early").await.unwrap();
    let response = outcome.final_response().unwrap();

    assert!(response.payload.get("w1").is_some());
    assert!(response.payload.get("w2").is_none());
    assert_eq!(second_planner.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn custom_synthesizer_output_is_flagged_when_budget_runs_out() {
    use overseer::policy::{PolicyAction, TerminationPolicy};

    let memory = MemoryStore::shared();
    let events = EventBus::shared();
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    let plan = DelegationPlan::new(vec![
        Phase::sequential("one", vec![Assignment::new("w1", "first")]),
        Phase::sequential("two", vec![Assignment::new("w2", "second")]),
        Phase::sequential("three", vec![Assignment::new("w3", "third")]),
    ]);
    let mut policies = lenient_policies(10);
    policies.termination = TerminationPolicy {
        max_iterations: 1,
        on_max_iterations: PolicyAction::Warn,
        check_completion: true,
    };
    let manager = Manager::new(
        "boss",
        "job-ns",
        FixedStrategicPlanner::new(plan),
        policies,
        memory.clone(),
        events.clone(),
        jobs,
    )
    .unwrap()
    .with_subordinate(worker("w1", "job-ns", memory.clone(), events.clone()))
    .with_subordinate(worker("w2", "job-ns", memory.clone(), events.clone()))
    .with_subordinate(worker("w3", "job-ns", memory.clone(), events.clone()))
    .with_synthesizer(Arc::new(JoiningSynthesizer));

    let (_, outcome) = manager.run("truncated run").await.unwrap();
    let response = outcome.final_response().unwrap();

    // Truncation is stamped onto whatever the synthesizer produced.
    assert_eq!(response.operation, "synthesized");
    assert_eq!(response.payload["workers"], json!(1));
    assert_eq!(response.payload["incomplete"], json!(true));
}

#[tokio::test]
async fn manager_phase_budget_warn_stops_with_partial_results() {
    use overseer::policy::{PolicyAction, TerminationPolicy};

    let memory = MemoryStore::shared();
    let events = EventBus::shared();
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    let plan = DelegationPlan::new(vec![
        Phase::sequential("one", vec![Assignment::new("w1", "first")]),
        Phase::sequential("two", vec![Assignment::new("w2", "second")]),
        Phase::sequential("three", vec![Assignment::new("w3", "third")]),
    ]);
    let mut policies = lenient_policies(10);
    policies.termination = TerminationPolicy {
        max_iterations: 1,
        on_max_iterations: PolicyAction::Warn,
        check_completion: true,
    };
    let manager = Manager::new(
        "boss",
        "job-ns",
        FixedStrategicPlanner::new(plan),
        policies,
        memory.clone(),
        events.clone(),
        jobs,
    )
    .unwrap()
    .with_subordinate(worker("w1", "job-ns", memory.clone(), events.clone()))
    .with_subordinate(worker("w2", "job-ns", memory.clone(), events.clone()))
    .with_subordinate(worker("w3", "job-ns", memory.clone(), events.clone()));

    let (_, outcome) = manager.run("too many phases").await.unwrap();
    let response = outcome.final_response().unwrap();

    // Only the first phase ran; the synthesis is flagged incomplete.
    assert!(response.payload.get("w1").is_some());
    assert!(response.payload.get("w2").is_none());
    assert_eq!(response.payload["incomplete"], json!(true));
}
