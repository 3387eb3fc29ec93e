//! Execution trace log: the ordered record of node status transitions for
//! one run.

use super::base::{ExecutionEvent, RunId};
use crate::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Default bound on retained entries.
pub const DEFAULT_MAX_LOG_ENTRIES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Running,
    Completed,
    Error,
    /// Node visit skipped because it would re-enter a cycle.
    Skipped,
}

/// One immutable trace record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub node_id: NodeId,
    pub label: String,
    pub status: LogStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

struct TraceInner {
    entries: VecDeque<LogEntry>,
    dropped: usize,
}

/// Append-only, bounded trace shared by all branches of a run.
///
/// When the bound is reached the oldest entry is evicted and counted in
/// [`TraceLog::dropped`]. Every append is also broadcast as
/// [`ExecutionEvent::Log`] when a sender is attached.
pub struct TraceLog {
    run_id: RunId,
    capacity: usize,
    inner: Mutex<TraceInner>,
    sender: Option<broadcast::Sender<ExecutionEvent>>,
}

impl TraceLog {
    pub fn new(run_id: RunId, capacity: usize) -> Self {
        Self {
            run_id,
            capacity: capacity.max(1),
            inner: Mutex::new(TraceInner {
                entries: VecDeque::new(),
                dropped: 0,
            }),
            sender: None,
        }
    }

    pub fn with_sender(mut self, sender: broadcast::Sender<ExecutionEvent>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    fn lock(&self) -> MutexGuard<'_, TraceInner> {
        // A poisoned trace still holds valid entries.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add(
        &self,
        node_id: &NodeId,
        label: &str,
        status: LogStatus,
        message: impl Into<String>,
    ) {
        self.push(LogEntry {
            node_id: node_id.clone(),
            label: label.to_string(),
            status,
            message: message.into(),
            timestamp: Utc::now(),
            data: None,
        });
    }

    pub fn add_with_data(
        &self,
        node_id: &NodeId,
        label: &str,
        status: LogStatus,
        message: impl Into<String>,
        data: serde_json::Value,
    ) {
        self.push(LogEntry {
            node_id: node_id.clone(),
            label: label.to_string(),
            status,
            message: message.into(),
            timestamp: Utc::now(),
            data: Some(data),
        });
    }

    fn push(&self, entry: LogEntry) {
        {
            let mut inner = self.lock();
            if inner.entries.len() >= self.capacity {
                inner.entries.pop_front();
                inner.dropped += 1;
            }
            inner.entries.push_back(entry.clone());
        }

        if let Some(sender) = &self.sender {
            let _ = sender.send(ExecutionEvent::Log {
                run_id: self.run_id,
                entry,
            });
        }
    }

    /// Snapshot of the retained entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Entries evicted because of the capacity bound.
    pub fn dropped(&self) -> usize {
        self.lock().dropped
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.dropped = 0;
    }
}

/// Trace handle given to a node handler, bound to that node.
///
/// Appends are discarded once the run has been stopped, so results that
/// arrive from in-flight calls after a stop never reach the trace.
#[derive(Clone)]
pub struct NodeTrace {
    node_id: NodeId,
    label: String,
    log: Arc<TraceLog>,
    cancellation: CancellationToken,
}

impl NodeTrace {
    pub fn new(
        node_id: NodeId,
        label: impl Into<String>,
        log: Arc<TraceLog>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            node_id,
            label: label.into(),
            log,
            cancellation,
        }
    }

    /// Standalone trace with its own log, for driving a handler outside a run.
    pub fn detached(node_id: NodeId, label: impl Into<String>) -> Self {
        Self::new(
            node_id,
            label,
            Arc::new(TraceLog::new(RunId::new_v4(), DEFAULT_MAX_LOG_ENTRIES)),
            CancellationToken::new(),
        )
    }

    pub fn log(&self) -> &Arc<TraceLog> {
        &self.log
    }

    pub fn record(&self, status: LogStatus, message: impl Into<String>) {
        if self.cancellation.is_cancelled() {
            return;
        }
        self.log.add(&self.node_id, &self.label, status, message);
    }

    /// Record a per-item failure that does not fail the node.
    pub fn error(&self, message: impl Into<String>) {
        self.record(LogStatus::Error, message);
    }
}
