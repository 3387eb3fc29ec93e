use crate::{Node, NodeError, NodeId, NodeKind, NodeTrace, Payload, ServiceError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::future::Future;

/// Executes one node kind.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// The kind this handler executes
    fn kind(&self) -> NodeKind;

    /// Run the node and return the payload for downstream nodes
    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError>;
}

/// Execution context passed to each handler
#[derive(Clone)]
pub struct NodeContext {
    pub node_id: NodeId,
    pub label: String,
    pub kind: NodeKind,

    /// Raw node configuration as stored in the graph
    pub config: Map<String, Value>,

    /// Imported config that was not an object
    pub rejected_config: Option<Value>,

    /// Payload produced by the upstream node
    pub input: Payload,

    /// Per-node view of the run's trace log
    pub trace: NodeTrace,

    /// Cancelled when the run is stopped
    pub cancellation: tokio_util::sync::CancellationToken,
}

impl NodeContext {
    /// Context for driving a node outside a run, with a detached trace.
    pub fn new(node: &Node, input: Payload) -> Self {
        let label = node.display_label();
        Self {
            node_id: node.id.clone(),
            kind: node.kind.clone(),
            config: node.config.clone(),
            rejected_config: node.rejected_config.clone(),
            input,
            trace: NodeTrace::detached(node.id.clone(), label.clone()),
            label,
            cancellation: tokio_util::sync::CancellationToken::new(),
        }
    }

    pub fn with_trace(mut self, trace: NodeTrace) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_cancellation(mut self, token: tokio_util::sync::CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Parse the raw config into the handler's typed config.
    pub fn parse_config<T: DeserializeOwned>(&self) -> Result<T, NodeError> {
        if let Some(rejected) = &self.rejected_config {
            return Err(NodeError::Configuration(format!(
                "{} config must be an object, got {}",
                self.kind, rejected
            )));
        }
        serde_json::from_value(Value::Object(self.config.clone()))
            .map_err(|e| NodeError::Configuration(format!("{} config: {}", self.kind, e)))
    }

    /// `Cancelled` once the run has been stopped.
    pub fn ensure_active(&self) -> Result<(), NodeError> {
        if self.cancellation.is_cancelled() {
            Err(NodeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Await a collaborator call, giving up as soon as the run is stopped.
    /// No call is started after a stop.
    pub async fn call<T, F>(&self, call: F) -> Result<T, NodeError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        self.ensure_active()?;
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(NodeError::Cancelled),
            result = call => result.map_err(NodeError::from),
        }
    }

    /// Fresh copy of the input to add outputs to.
    pub fn output(&self) -> Payload {
        self.input.clone()
    }
}
