//! In-process lifecycle event bus
//!
//! Publish is fire-and-forget: a panicking inline subscriber or a dropped
//! channel receiver is isolated per subscriber and never fails or blocks
//! the run. Observability collaborators (exporters, UIs) subscribe here;
//! the core only publishes.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

/// Closed taxonomy of lifecycle events the core emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    AgentStart,
    ActionPlanned,
    ActionExecuted,
    AgentEnd,
    ManagerStart,
    DelegationPlanned,
    DelegationChosen,
    DelegationExecuted,
    ManagerEnd,
    PolicyDenied,
    Error,
}

impl EventName {
    /// Wire name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::AgentStart => "agent_start",
            EventName::ActionPlanned => "action_planned",
            EventName::ActionExecuted => "action_executed",
            EventName::AgentEnd => "agent_end",
            EventName::ManagerStart => "manager_start",
            EventName::DelegationPlanned => "delegation_planned",
            EventName::DelegationChosen => "delegation_chosen",
            EventName::DelegationExecuted => "delegation_executed",
            EventName::ManagerEnd => "manager_end",
            EventName::PolicyDenied => "policy_denied",
            EventName::Error => "error",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One published event, as delivered to channel subscribers
#[derive(Debug, Clone)]
pub struct BusEvent {
    pub name: EventName,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

/// Synchronous subscriber called inline on publish
pub trait EventSubscriber: Send + Sync {
    fn handle(&self, event: EventName, data: &Value);
}

/// Publish/subscribe hub for engine lifecycle events
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber>>>,
    channels: RwLock<Vec<mpsc::UnboundedSender<BusEvent>>>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared handle to an empty bus
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register an inline subscriber
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        if let Ok(mut subs) = self.subscribers.write() {
            subs.push(subscriber);
        }
    }

    /// Register a channel subscriber; events are sent best-effort and a
    /// closed receiver is silently skipped
    pub fn subscribe_channel(&self) -> mpsc::UnboundedReceiver<BusEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut channels) = self.channels.write() {
            channels.push(tx);
        }
        rx
    }

    /// Publish an event to every subscriber, isolating failures
    pub fn publish(&self, name: EventName, data: Value) {
        let event = BusEvent {
            name,
            data: data.clone(),
            timestamp: Utc::now(),
        };

        if let Ok(subs) = self.subscribers.read() {
            for subscriber in subs.iter() {
                // A panicking subscriber must not take the run down with it.
                let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    subscriber.handle(name, &data)
                }));
                if result.is_err() {
                    warn!(event = name.as_str(), "event subscriber panicked");
                }
            }
        }

        if let Ok(channels) = self.channels.read() {
            for tx in channels.iter() {
                let _ = tx.send(event.clone());
            }
        }
    }
}
