use crate::{registry::NodeRegistry, GraphStore, RunReport, WorkflowRunner};
use presscore::{EventBus, ExecutionEvent, FlowError, WorkflowDocument, DEFAULT_MAX_LOG_ENTRIES};
use std::sync::Arc;
use std::time::Duration;

/// Main entry point for running workflows
pub struct FlowRuntime {
    registry: Arc<NodeRegistry>,
    event_bus: Arc<EventBus>,
    config: RuntimeConfig,
}

impl FlowRuntime {
    /// Create a runtime with an empty registry; every kind passes through
    pub fn new() -> Self {
        Self::with_registry(Arc::new(NodeRegistry::new()), RuntimeConfig::default())
    }

    /// Create a new runtime with a pre-configured registry
    pub fn with_registry(registry: Arc<NodeRegistry>, config: RuntimeConfig) -> Self {
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));

        Self {
            registry,
            event_bus,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Fresh runner over a snapshot of `store`. Later edits to the store do
    /// not affect it.
    pub fn runner(&self, store: &GraphStore) -> WorkflowRunner {
        WorkflowRunner::new(store.snapshot(), self.registry.clone(), &self.config)
            .with_events(&self.event_bus)
    }

    /// Run the current graph of `store` to the end
    pub async fn execute(&self, store: &GraphStore) -> Result<RunReport, FlowError> {
        self.runner(store).run().await
    }

    /// Run an imported document without keeping it in a store
    pub async fn execute_document(
        &self,
        document: WorkflowDocument,
    ) -> Result<RunReport, FlowError> {
        WorkflowRunner::new(document.nodes, self.registry.clone(), &self.config)
            .with_events(&self.event_bus)
            .run()
            .await
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}

impl Default for FlowRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub event_buffer_size: usize,
    /// Trace entries kept per run before the oldest are evicted
    pub max_log_entries: usize,
    /// Upper bound on a single handler call
    pub node_timeout: Option<Duration>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 1000,
            max_log_entries: DEFAULT_MAX_LOG_ENTRIES,
            node_timeout: None,
        }
    }
}
