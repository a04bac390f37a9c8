//! Read-only message access for hosts and observability collaborators
//!
//! [`MessageStore`] is the external query surface over a namespace's log:
//! conversation turns, one agent's trace, global entries, or a team's
//! combined view. Results are always chronologically ascending; `limit`
//! keeps the most recent entries. The trait never mutates the log.

use async_trait::async_trait;

use crate::errors::Result;
use crate::memory::entry::{Entry, RolePartition};
use crate::memory::store::{MemoryStore, MemoryView, Projection};

/// Read-only, chronologically ordered queries over a namespace's entries
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Conversation entries (user/assistant turns), oldest first
    async fn get_conversation_messages(
        &self,
        namespace: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Entry>>;

    /// One agent's visible entries (own trace + conversation), oldest first
    async fn get_agent_messages(
        &self,
        namespace: &str,
        agent_key: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Entry>>;

    /// Global entries (syntheses, global observations), oldest first
    async fn get_global_messages(
        &self,
        namespace: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Entry>>;

    /// Combined view over a set of agents' traces plus conversation and
    /// global entries, oldest first. The first key is treated as the
    /// hierarchical reader.
    async fn get_team_messages(
        &self,
        namespace: &str,
        agent_keys: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<Entry>>;
}

/// Keep the most recent `limit` entries without disturbing ascending order
fn tail(mut entries: Vec<Entry>, limit: Option<usize>) -> Vec<Entry> {
    if let Some(limit) = limit {
        if entries.len() > limit {
            entries.drain(..entries.len() - limit);
        }
    }
    entries
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn get_conversation_messages(
        &self,
        namespace: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Entry>> {
        let view = MemoryView::Team {
            manager_key: String::new(),
            subordinates: Vec::new(),
        };
        let entries = self
            .read(namespace, &view, Projection::Chronological)
            .await
            .into_iter()
            .filter(|entry| entry.partition() == RolePartition::Conversation)
            .collect();
        Ok(tail(entries, limit))
    }

    async fn get_agent_messages(
        &self,
        namespace: &str,
        agent_key: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Entry>> {
        let view = MemoryView::Agent {
            agent_key: agent_key.to_string(),
        };
        let entries = self.read(namespace, &view, Projection::Chronological).await;
        Ok(tail(entries, limit))
    }

    async fn get_global_messages(
        &self,
        namespace: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Entry>> {
        let view = MemoryView::Team {
            manager_key: String::new(),
            subordinates: Vec::new(),
        };
        let entries = self
            .read(namespace, &view, Projection::Chronological)
            .await
            .into_iter()
            .filter(|entry| entry.partition() == RolePartition::Global)
            .collect();
        Ok(tail(entries, limit))
    }

    async fn get_team_messages(
        &self,
        namespace: &str,
        agent_keys: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<Entry>> {
        let (reader, rest) = match agent_keys.split_first() {
            Some((reader, rest)) => (reader.clone(), rest.to_vec()),
            None => (String::new(), Vec::new()),
        };
        let view = MemoryView::Team {
            manager_key: reader,
            subordinates: rest,
        };
        let entries = self.read(namespace, &view, Projection::Chronological).await;
        Ok(tail(entries, limit))
    }
}
