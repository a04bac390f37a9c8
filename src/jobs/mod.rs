//! Persistent job-state layer
//!
//! Enables pause, human approval, and resumption across process boundaries.
//! See [`store::JobStore`] for the contract and its invariants.

pub mod store;
pub mod types;

pub use store::{FileJobStore, InMemoryJobStore, JobStore, JobStoreError};
pub use types::{CheckpointRecord, Job, JobStatus, PendingAction};
