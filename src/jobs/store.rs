//! Job store trait and backends
//!
//! Invariants enforced here, not by callers:
//! - at most one pending action per job; `save_pending_action` fails if one
//!   exists, and `clear_pending_action` is the only removal path
//! - `clear_pending_action` returns the cleared action atomically, so two
//!   concurrent resume attempts cannot both proceed
//! - the executed-action ledger only grows for the life of the job

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::jobs::types::{CheckpointRecord, Job, JobStatus, PendingAction};
use crate::types::ActionSignature;

/// Job store failures
#[derive(Error, Debug)]
pub enum JobStoreError {
    #[error("Job '{0}' not found")]
    JobNotFound(String),

    #[error("Job '{0}' already has a pending action")]
    PendingActionExists(String),

    #[error("Job '{0}' has no pending action")]
    NoPendingAction(String),

    #[error("Resume token mismatch for job '{0}'")]
    TokenMismatch(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Pluggable durable record of runs
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a fresh active job and return it
    async fn create_job(&self) -> Result<Job, JobStoreError>;

    /// Fetch a job by id
    async fn get_job(&self, id: &str) -> Result<Job, JobStoreError>;

    /// Record the top-level orchestrator plan
    async fn update_orchestrator_plan(&self, id: &str, plan: Value) -> Result<(), JobStoreError>;

    /// Record a manager's delegation plan
    async fn update_manager_plan(
        &self,
        id: &str,
        agent_key: &str,
        plan: Value,
    ) -> Result<(), JobStoreError>;

    /// Persist a pending action and mark the job paused.
    /// Fails if a pending action already exists.
    async fn save_pending_action(
        &self,
        id: &str,
        action: PendingAction,
    ) -> Result<(), JobStoreError>;

    /// Atomically remove the pending action, set the new status, record the
    /// approval decision, and return the cleared action. The only removal
    /// path for pending actions.
    async fn clear_pending_action(
        &self,
        id: &str,
        new_status: JobStatus,
    ) -> Result<PendingAction, JobStoreError>;

    /// Whether an action signature is already in the executed ledger
    async fn has_executed_action(
        &self,
        id: &str,
        signature: &ActionSignature,
    ) -> Result<bool, JobStoreError>;

    /// Append to the executed ledger with the recorded result
    async fn add_executed_action(
        &self,
        id: &str,
        signature: &ActionSignature,
        recorded_result: Value,
    ) -> Result<(), JobStoreError>;

    /// Previously recorded result for a signature, if any
    async fn recorded_result(
        &self,
        id: &str,
        signature: &ActionSignature,
    ) -> Result<Option<Value>, JobStoreError>;

    /// Set the job status
    async fn set_status(&self, id: &str, status: JobStatus) -> Result<(), JobStoreError>;

    /// Persist a checkpoint marker
    async fn record_checkpoint(
        &self,
        id: &str,
        agent_key: &str,
        iteration: u32,
    ) -> Result<(), JobStoreError>;
}

fn apply_pending(job: &mut Job, action: PendingAction) -> Result<(), JobStoreError> {
    if job.pending_action.is_some() {
        return Err(JobStoreError::PendingActionExists(job.id.clone()));
    }
    job.pending_action = Some(action);
    job.status = JobStatus::Paused;
    job.touch();
    Ok(())
}

fn take_pending(job: &mut Job, new_status: JobStatus) -> Result<PendingAction, JobStoreError> {
    let action = job
        .pending_action
        .take()
        .ok_or_else(|| JobStoreError::NoPendingAction(job.id.clone()))?;
    let approved = new_status == JobStatus::Approved;
    job.approvals.insert(action.resume_token.clone(), approved);
    // Also keyed by signature so a resumed run can see the decision for
    // the concrete action, not just the token.
    job.approvals.insert(
        ActionSignature::of(&action.tool, &action.args)
            .as_str()
            .to_string(),
        approved,
    );
    job.status = new_status;
    job.touch();
    Ok(action)
}

/// In-memory backend. The single mutex over the job map serializes all
/// mutations per job id.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<String, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create_job(&self) -> Result<Job, JobStoreError> {
        let job = Job::new(Uuid::new_v4().to_string());
        let mut jobs = self.jobs.lock().await;
        jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: &str) -> Result<Job, JobStoreError> {
        let jobs = self.jobs.lock().await;
        jobs.get(id)
            .cloned()
            .ok_or_else(|| JobStoreError::JobNotFound(id.to_string()))
    }

    async fn update_orchestrator_plan(&self, id: &str, plan: Value) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobStoreError::JobNotFound(id.to_string()))?;
        job.orchestrator_plan = Some(plan);
        job.touch();
        Ok(())
    }

    async fn update_manager_plan(
        &self,
        id: &str,
        agent_key: &str,
        plan: Value,
    ) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobStoreError::JobNotFound(id.to_string()))?;
        job.manager_plans.insert(agent_key.to_string(), plan);
        job.touch();
        Ok(())
    }

    async fn save_pending_action(
        &self,
        id: &str,
        action: PendingAction,
    ) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobStoreError::JobNotFound(id.to_string()))?;
        apply_pending(job, action)
    }

    async fn clear_pending_action(
        &self,
        id: &str,
        new_status: JobStatus,
    ) -> Result<PendingAction, JobStoreError> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobStoreError::JobNotFound(id.to_string()))?;
        take_pending(job, new_status)
    }

    async fn has_executed_action(
        &self,
        id: &str,
        signature: &ActionSignature,
    ) -> Result<bool, JobStoreError> {
        let jobs = self.jobs.lock().await;
        let job = jobs
            .get(id)
            .ok_or_else(|| JobStoreError::JobNotFound(id.to_string()))?;
        Ok(job.executed_actions.contains_key(signature.as_str()))
    }

    async fn add_executed_action(
        &self,
        id: &str,
        signature: &ActionSignature,
        recorded_result: Value,
    ) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobStoreError::JobNotFound(id.to_string()))?;
        job.executed_actions
            .insert(signature.as_str().to_string(), recorded_result);
        job.touch();
        Ok(())
    }

    async fn recorded_result(
        &self,
        id: &str,
        signature: &ActionSignature,
    ) -> Result<Option<Value>, JobStoreError> {
        let jobs = self.jobs.lock().await;
        let job = jobs
            .get(id)
            .ok_or_else(|| JobStoreError::JobNotFound(id.to_string()))?;
        Ok(job.executed_actions.get(signature.as_str()).cloned())
    }

    async fn set_status(&self, id: &str, status: JobStatus) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobStoreError::JobNotFound(id.to_string()))?;
        job.status = status;
        job.touch();
        Ok(())
    }

    async fn record_checkpoint(
        &self,
        id: &str,
        agent_key: &str,
        iteration: u32,
    ) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobStoreError::JobNotFound(id.to_string()))?;
        job.checkpoints.push(CheckpointRecord {
            agent_key: agent_key.to_string(),
            iteration,
            at: Utc::now(),
        });
        job.touch();
        Ok(())
    }
}

/// File backend: one JSON document per job under a storage directory.
/// An internal mutex serializes read-modify-write cycles.
pub struct FileJobStore {
    storage_dir: PathBuf,
    lock: Mutex<()>,
}

impl FileJobStore {
    /// Create the store, bootstrapping the directory if needed
    pub fn new(storage_dir: impl Into<PathBuf>) -> Result<Self, JobStoreError> {
        let storage_dir = storage_dir.into();
        if !storage_dir.exists() {
            std::fs::create_dir_all(&storage_dir)
                .context("Failed to create job storage directory")
                .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        }
        Ok(Self {
            storage_dir,
            lock: Mutex::new(()),
        })
    }

    fn job_path(&self, id: &str) -> PathBuf {
        self.storage_dir.join(format!("job_{}.json", id))
    }

    fn load(&self, id: &str) -> Result<Job, JobStoreError> {
        let path = self.job_path(id);
        if !path.exists() {
            return Err(JobStoreError::JobNotFound(id.to_string()));
        }
        let json = std::fs::read_to_string(&path)
            .context("Failed to read job file")
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        serde_json::from_str(&json)
            .context("Failed to deserialize job")
            .map_err(|e| JobStoreError::Storage(e.to_string()))
    }

    fn save(&self, job: &Job) -> Result<(), JobStoreError> {
        let json = serde_json::to_string_pretty(job)
            .context("Failed to serialize job")
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        std::fs::write(self.job_path(&job.id), json)
            .context("Failed to write job file")
            .map_err(|e| JobStoreError::Storage(e.to_string()))
    }

    /// List all stored job ids
    pub fn list_jobs(&self) -> Result<Vec<String>, JobStoreError> {
        let mut ids = Vec::new();
        let entries = std::fs::read_dir(&self.storage_dir)
            .context("Failed to read job storage directory")
            .map_err(|e| JobStoreError::Storage(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| JobStoreError::Storage(e.to_string()))?;
            if let Some(name) = entry.path().file_name().and_then(|n| n.to_str()) {
                if name.starts_with("job_") && name.ends_with(".json") {
                    ids.push(
                        name.trim_start_matches("job_")
                            .trim_end_matches(".json")
                            .to_string(),
                    );
                }
            }
        }
        Ok(ids)
    }

    fn mutate<F>(&self, id: &str, f: F) -> Result<(), JobStoreError>
    where
        F: FnOnce(&mut Job) -> Result<(), JobStoreError>,
    {
        let mut job = self.load(id)?;
        f(&mut job)?;
        self.save(&job)
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn create_job(&self) -> Result<Job, JobStoreError> {
        let _guard = self.lock.lock().await;
        let job = Job::new(Uuid::new_v4().to_string());
        self.save(&job)?;
        Ok(job)
    }

    async fn get_job(&self, id: &str) -> Result<Job, JobStoreError> {
        let _guard = self.lock.lock().await;
        self.load(id)
    }

    async fn update_orchestrator_plan(&self, id: &str, plan: Value) -> Result<(), JobStoreError> {
        let _guard = self.lock.lock().await;
        self.mutate(id, |job| {
            job.orchestrator_plan = Some(plan);
            job.touch();
            Ok(())
        })
    }

    async fn update_manager_plan(
        &self,
        id: &str,
        agent_key: &str,
        plan: Value,
    ) -> Result<(), JobStoreError> {
        let _guard = self.lock.lock().await;
        self.mutate(id, |job| {
            job.manager_plans.insert(agent_key.to_string(), plan);
            job.touch();
            Ok(())
        })
    }

    async fn save_pending_action(
        &self,
        id: &str,
        action: PendingAction,
    ) -> Result<(), JobStoreError> {
        let _guard = self.lock.lock().await;
        self.mutate(id, |job| apply_pending(job, action))
    }

    async fn clear_pending_action(
        &self,
        id: &str,
        new_status: JobStatus,
    ) -> Result<PendingAction, JobStoreError> {
        let _guard = self.lock.lock().await;
        let mut job = self.load(id)?;
        let action = take_pending(&mut job, new_status)?;
        self.save(&job)?;
        Ok(action)
    }

    async fn has_executed_action(
        &self,
        id: &str,
        signature: &ActionSignature,
    ) -> Result<bool, JobStoreError> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load(id)?
            .executed_actions
            .contains_key(signature.as_str()))
    }

    async fn add_executed_action(
        &self,
        id: &str,
        signature: &ActionSignature,
        recorded_result: Value,
    ) -> Result<(), JobStoreError> {
        let _guard = self.lock.lock().await;
        self.mutate(id, |job| {
            job.executed_actions
                .insert(signature.as_str().to_string(), recorded_result);
            job.touch();
            Ok(())
        })
    }

    async fn recorded_result(
        &self,
        id: &str,
        signature: &ActionSignature,
    ) -> Result<Option<Value>, JobStoreError> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load(id)?
            .executed_actions
            .get(signature.as_str())
            .cloned())
    }

    async fn set_status(&self, id: &str, status: JobStatus) -> Result<(), JobStoreError> {
        let _guard = self.lock.lock().await;
        self.mutate(id, |job| {
            job.status = status;
            job.touch();
            Ok(())
        })
    }

    async fn record_checkpoint(
        &self,
        id: &str,
        agent_key: &str,
        iteration: u32,
    ) -> Result<(), JobStoreError> {
        let _guard = self.lock.lock().await;
        self.mutate(id, |job| {
            job.checkpoints.push(CheckpointRecord {
                agent_key: agent_key.to_string(),
                iteration,
                at: Utc::now(),
            });
            job.touch();
            Ok(())
        })
    }
}
