//! Namespaced, role-partitioned append-only memory store
//!
//! One log per namespace (one namespace per job/run). Namespaces never see
//! each other's entries. Visibility within a namespace is governed by views:
//! a plain agent sees its own execution trace plus the full conversation; a
//! hierarchical reader additionally sees its configured subordinates' traces
//! and every global entry.
//!
//! Appends are serialized per namespace under a cooperative-scheduler-aware
//! lock (`tokio::sync::RwLock`); the lock is never held across an await, so
//! an append is atomic and reads never observe a partial append.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::memory::entry::{Entry, EntryKind, RolePartition};

/// Ordering applied to a read.
///
/// The grouped projection concatenates partitions in a fixed order
/// (conversation, traces, global) and is the default; callers that need
/// causal ordering must ask for the chronological projection explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Grouped,
    Chronological,
}

/// Visibility scope for a read
#[derive(Debug, Clone)]
pub enum MemoryView {
    /// Plain agent view: own execution trace + full conversation
    Agent { agent_key: String },

    /// Hierarchical view: own + configured subordinates' traces,
    /// conversation, and all global entries
    Team {
        manager_key: String,
        subordinates: Vec<String>,
    },
}

#[derive(Debug, Default)]
struct NamespaceLog {
    entries: Vec<Entry>,
    next_seq: u64,
    /// Current turn per agent key; bumped by each `task` entry
    turns: HashMap<String, u64>,
}

/// Shared memory store, passed by reference to every agent and manager at
/// construction. Lifetime is tied to the run/job, never ambient.
#[derive(Debug, Default)]
pub struct MemoryStore {
    namespaces: RwLock<HashMap<String, NamespaceLog>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared handle to an empty store
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Append an entry to a namespace, assigning its sequence number and
    /// turn id. Returns the entry as stored.
    pub async fn append(&self, namespace: &str, mut entry: Entry) -> Entry {
        let mut namespaces = self.namespaces.write().await;
        let log = namespaces.entry(namespace.to_string()).or_default();

        if entry.kind == EntryKind::Task {
            let turn = log.turns.entry(entry.agent_key.clone()).or_insert(0);
            *turn += 1;
        }

        entry.seq = log.next_seq;
        entry.turn_id = log.turns.get(&entry.agent_key).copied().unwrap_or(0);
        log.next_seq += 1;
        log.entries.push(entry.clone());
        entry
    }

    /// Read the entries visible to a view, in the requested projection
    pub async fn read(
        &self,
        namespace: &str,
        view: &MemoryView,
        projection: Projection,
    ) -> Vec<Entry> {
        let namespaces = self.namespaces.read().await;
        let Some(log) = namespaces.get(namespace) else {
            return Vec::new();
        };

        let mut visible: Vec<Entry> = log
            .entries
            .iter()
            .filter(|entry| Self::is_visible(entry, view))
            .cloned()
            .collect();

        match projection {
            Projection::Chronological => {
                visible.sort_by(|a, b| {
                    a.timestamp
                        .cmp(&b.timestamp)
                        .then_with(|| a.seq.cmp(&b.seq))
                });
            }
            Projection::Grouped => {
                // Stable sort: partition blocks, insertion order preserved
                // within each block.
                visible.sort_by_key(|entry| match entry.partition() {
                    RolePartition::Conversation => 0u8,
                    RolePartition::ExecutionTrace => 1,
                    RolePartition::Global => 2,
                });
            }
        }

        visible
    }

    /// Entries of the agent's current turn: everything visible to the agent
    /// from its most recent `task` entry onward, chronologically ordered.
    /// Returns an empty slice when the agent has no task entry yet.
    pub async fn current_turn(&self, namespace: &str, agent_key: &str) -> Vec<Entry> {
        let view = MemoryView::Agent {
            agent_key: agent_key.to_string(),
        };
        let history = self.read(namespace, &view, Projection::Chronological).await;

        let task_seq = history
            .iter()
            .rev()
            .find(|e| e.kind == EntryKind::Task && e.agent_key == agent_key)
            .map(|e| e.seq);

        match task_seq {
            Some(seq) => history.into_iter().filter(|e| e.seq >= seq).collect(),
            None => Vec::new(),
        }
    }

    /// Number of entries in a namespace (all partitions)
    pub async fn len(&self, namespace: &str) -> usize {
        let namespaces = self.namespaces.read().await;
        namespaces.get(namespace).map_or(0, |log| log.entries.len())
    }

    /// Whether a namespace holds no entries
    pub async fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace).await == 0
    }

    /// Tear down a namespace explicitly at end of run/job
    pub async fn drop_namespace(&self, namespace: &str) {
        let mut namespaces = self.namespaces.write().await;
        namespaces.remove(namespace);
    }

    fn is_visible(entry: &Entry, view: &MemoryView) -> bool {
        match entry.partition() {
            RolePartition::Conversation => true,
            RolePartition::ExecutionTrace => match view {
                MemoryView::Agent { agent_key } => entry.agent_key == *agent_key,
                MemoryView::Team {
                    manager_key,
                    subordinates,
                } => {
                    entry.agent_key == *manager_key
                        || subordinates.iter().any(|key| entry.agent_key == *key)
                }
            },
            RolePartition::Global => matches!(view, MemoryView::Team { .. }),
        }
    }
}
