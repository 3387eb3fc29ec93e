//! Per-run workflow traversal.
//!
//! A [`WorkflowRunner`] is built from a snapshot of the graph and drives one
//! run: every trigger is an entry point, each completed node hands a copy of
//! its output to every target in its `connected` list, and sibling branches
//! are driven concurrently on the calling task.

use crate::registry::NodeRegistry;
use crate::runtime::RuntimeConfig;
use chrono::Utc;
use futures::future::{join_all, BoxFuture, FutureExt};
use presscore::{
    EventBus, ExecutionEvent, FlowError, LogEntry, LogStatus, Node, NodeContext, NodeError,
    NodeId, NodeTrace, Payload, RunError, RunId, RunState, TraceLog, WorkflowError,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Cloneable control handle for a run.
#[derive(Clone)]
pub struct RunHandle {
    state: Arc<Mutex<RunState>>,
    cancellation: CancellationToken,
}

impl RunHandle {
    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    /// Ask the run to stop. No new node visits start after this; results of
    /// calls already in flight are discarded when they arrive.
    pub fn stop(&self) {
        tracing::info!("Stop requested");
        self.cancellation.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub state: RunState,
    /// Summary of the first failure, for `Failed` and `Stopped` runs.
    pub error: Option<RunError>,
    /// Node visits that completed.
    pub executed: usize,
    /// Output of every completed node without outgoing edges, in completion order.
    pub outputs: Vec<(NodeId, Payload)>,
    pub trace: Vec<LogEntry>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn into_result(self) -> Result<RunReport, RunError> {
        match self.error.clone() {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }

    /// Final payload of the first terminal node that completed.
    pub fn final_payload(&self) -> Option<&Payload> {
        self.outputs.first().map(|(_, payload)| payload)
    }
}

/// Executes one run over a graph snapshot.
pub struct WorkflowRunner {
    run_id: RunId,
    nodes: HashMap<NodeId, Node>,
    triggers: Vec<NodeId>,
    registry: Arc<NodeRegistry>,
    trace: Arc<TraceLog>,
    handle: RunHandle,
    node_timeout: Option<Duration>,
    max_log_entries: usize,
    events: Option<broadcast::Sender<ExecutionEvent>>,
    started: AtomicBool,
    executed: AtomicUsize,
    outputs: Mutex<Vec<(NodeId, Payload)>>,
}

impl WorkflowRunner {
    pub fn new(snapshot: Vec<Node>, registry: Arc<NodeRegistry>, config: &RuntimeConfig) -> Self {
        let run_id = RunId::new_v4();
        let triggers = snapshot
            .iter()
            .filter(|n| n.kind.is_trigger())
            .map(|n| n.id.clone())
            .collect();
        let nodes = snapshot.into_iter().map(|n| (n.id.clone(), n)).collect();

        Self {
            run_id,
            nodes,
            triggers,
            registry,
            trace: Arc::new(TraceLog::new(run_id, config.max_log_entries)),
            handle: RunHandle {
                state: Arc::new(Mutex::new(RunState::Idle)),
                cancellation: CancellationToken::new(),
            },
            node_timeout: config.node_timeout,
            max_log_entries: config.max_log_entries,
            events: None,
            started: AtomicBool::new(false),
            executed: AtomicUsize::new(0),
            outputs: Mutex::new(Vec::new()),
        }
    }

    /// Broadcast run events and trace entries on `bus`.
    pub fn with_events(mut self, bus: &EventBus) -> Self {
        let sender = bus.sender();
        self.trace = Arc::new(
            TraceLog::new(self.run_id, self.max_log_entries).with_sender(sender.clone()),
        );
        self.events = Some(sender);
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn handle(&self) -> RunHandle {
        self.handle.clone()
    }

    pub fn trace(&self) -> Arc<TraceLog> {
        self.trace.clone()
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event);
        }
    }

    /// Check that the graph can be run at all.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.nodes.is_empty() {
            return Err(WorkflowError::EmptyGraph);
        }
        if self.triggers.is_empty() {
            return Err(WorkflowError::NoTrigger);
        }
        Ok(())
    }

    /// Run the workflow to completion, failure or stop.
    ///
    /// Graph validity problems are returned as errors before any node runs.
    /// Node failures end the run as `Failed` and are reported in the
    /// [`RunReport`], with the per-node reason in the trace.
    ///
    /// A runner executes a single run; calling this again returns
    /// `WorkflowError::AlreadyRun`.
    pub async fn run(&self) -> Result<RunReport, FlowError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(WorkflowError::AlreadyRun.into());
        }
        if let Err(e) = self.validate() {
            tracing::warn!("Workflow rejected: {}", e);
            return Err(e.into());
        }

        self.trace.clear();
        self.handle.set_state(RunState::Running);
        let start = Instant::now();

        tracing::info!(
            "Starting run {} with {} nodes and {} triggers",
            self.run_id,
            self.nodes.len(),
            self.triggers.len()
        );
        self.emit(ExecutionEvent::RunStarted {
            run_id: self.run_id,
            node_count: self.nodes.len(),
            timestamp: Utc::now(),
        });

        let branches = self
            .triggers
            .iter()
            .map(|id| self.visit(id.clone(), Payload::new(), Vec::new()));
        let results = join_all(branches).await;

        let error = if self.handle.is_stopped() {
            Some(RunError::Stopped)
        } else {
            first_failure(results).err()
        };
        let state = match &error {
            None => RunState::Completed,
            Some(RunError::Stopped) => RunState::Stopped,
            Some(RunError::NodeFailed { .. }) => RunState::Failed,
        };
        self.handle.set_state(state);

        let duration_ms = start.elapsed().as_millis() as u64;
        match &error {
            None => tracing::info!("Run {} completed in {}ms", self.run_id, duration_ms),
            Some(e) => tracing::warn!("Run {} ended after {}ms: {}", self.run_id, duration_ms, e),
        }
        self.emit(ExecutionEvent::RunFinished {
            run_id: self.run_id,
            state,
            duration_ms,
            timestamp: Utc::now(),
        });

        let outputs = std::mem::take(
            &mut *self.outputs.lock().unwrap_or_else(|poisoned| poisoned.into_inner()),
        );

        Ok(RunReport {
            run_id: self.run_id,
            state,
            error,
            executed: self.executed.load(Ordering::SeqCst),
            outputs,
            trace: self.trace.entries(),
            duration_ms,
        })
    }

    /// Visit `node_id` with `input`, then every node it connects to.
    ///
    /// `path` holds the ancestors on this branch; re-entering one of them is
    /// a skipped visit rather than an endless loop.
    fn visit(
        &self,
        node_id: NodeId,
        input: Payload,
        path: Vec<NodeId>,
    ) -> BoxFuture<'_, Result<(), RunError>> {
        async move {
            if self.handle.is_stopped() {
                return Err(RunError::Stopped);
            }

            let Some(node) = self.nodes.get(&node_id) else {
                tracing::warn!("Skipping edge to missing node {}", node_id);
                return Ok(());
            };
            let label = node.display_label();

            if path.contains(&node_id) {
                tracing::warn!("Cycle detected at node {} ({}), not re-entering", node_id, label);
                self.trace.add(
                    &node_id,
                    &label,
                    LogStatus::Skipped,
                    "Already visited on this branch; cycle not followed",
                );
                return Ok(());
            }

            self.trace.add(
                &node_id,
                &label,
                LogStatus::Running,
                format!("Executing {}", node.kind),
            );

            let result = self.execute_node(node, &label, input.clone()).await;

            // Whatever arrives after a stop is dropped.
            if self.handle.is_stopped() {
                tracing::debug!("Discarding result of node {} after stop", node_id);
                return Err(RunError::Stopped);
            }

            let output = match result {
                Ok(output) => output,
                Err(e) => {
                    tracing::error!("Node {} ({}) failed: {}", node_id, label, e);
                    self.trace.add(&node_id, &label, LogStatus::Error, e.to_string());
                    return Err(RunError::NodeFailed {
                        node_id: node_id.to_string(),
                        label,
                        message: e.to_string(),
                    });
                }
            };

            let message = self.completion_message(node, &input, &output);
            tracing::info!("Node {} ({}) completed", node_id, label);
            self.trace.add_with_data(
                &node_id,
                &label,
                LogStatus::Completed,
                message,
                output.clone().into(),
            );
            self.executed.fetch_add(1, Ordering::SeqCst);

            if node.connected.is_empty() {
                self.outputs
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push((node_id.clone(), output));
                return Ok(());
            }

            let mut child_path = path;
            child_path.push(node_id.clone());

            let branches = node.connected.iter().map(|target| {
                tracing::debug!("Following edge {} -> {}", node_id, target);
                self.visit(target.clone(), output.clone(), child_path.clone())
            });
            first_failure(join_all(branches).await)
        }
        .boxed()
    }

    async fn execute_node(
        &self,
        node: &Node,
        label: &str,
        input: Payload,
    ) -> Result<Payload, NodeError> {
        let handler = self.registry.handler(&node.kind);
        let trace = NodeTrace::new(
            node.id.clone(),
            label,
            self.trace.clone(),
            self.handle.cancellation.clone(),
        );
        let ctx = NodeContext::new(node, input)
            .with_trace(trace)
            .with_cancellation(self.handle.cancellation.clone());

        match self.node_timeout {
            Some(limit) => tokio::time::timeout(limit, handler.execute(ctx))
                .await
                .unwrap_or(Err(NodeError::Timeout {
                    millis: limit.as_millis() as u64,
                })),
            None => handler.execute(ctx).await,
        }
    }

    fn completion_message(&self, node: &Node, input: &Payload, output: &Payload) -> String {
        if !self.registry.is_registered(&node.kind) {
            return format!("Executed, no specific behavior for '{}'", node.kind);
        }

        let added: Vec<&str> = output
            .keys()
            .filter(|key| input.get(key) != output.get(key))
            .map(String::as_str)
            .collect();
        if added.is_empty() {
            "Completed".to_string()
        } else {
            format!("Completed (wrote: {})", added.join(", "))
        }
    }
}

/// First `NodeFailed` among branch results, else `Stopped` if any branch was
/// stopped, else success.
fn first_failure(results: Vec<Result<(), RunError>>) -> Result<(), RunError> {
    let mut stopped = false;
    for result in results {
        match result {
            Ok(()) => {}
            Err(RunError::Stopped) => stopped = true,
            Err(failure) => return Err(failure),
        }
    }
    if stopped {
        Err(RunError::Stopped)
    } else {
        Ok(())
    }
}
