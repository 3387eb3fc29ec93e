use super::trace::LogEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

pub type RunId = Uuid;

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
    Stopped,
}

impl RunState {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed | RunState::Stopped)
    }
}

/// Events emitted during workflow execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    RunStarted {
        run_id: RunId,
        node_count: usize,
        timestamp: DateTime<Utc>,
    },
    Log {
        run_id: RunId,
        entry: LogEntry,
    },
    RunFinished {
        run_id: RunId,
        state: RunState,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast bus that fans execution events out to subscribers.
pub struct EventBus {
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: ExecutionEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    pub fn sender(&self) -> broadcast::Sender<ExecutionEvent> {
        self.sender.clone()
    }
}
