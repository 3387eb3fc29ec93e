use async_trait::async_trait;
use presscore::{KindSpec, NodeContext, NodeError, NodeHandler, NodeKind, Payload};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory trait for creating handler instances
pub trait NodeFactory: Send + Sync {
    /// Create a handler for one node visit
    fn create(&self) -> Arc<dyn NodeHandler>;

    /// Kind handled by the created handlers
    fn kind(&self) -> NodeKind;

    /// Catalog entry (label, category, default config)
    fn metadata(&self) -> KindSpec {
        self.kind().spec()
    }
}

/// Registry of node kinds and the factories that execute them
pub struct NodeRegistry {
    factories: HashMap<NodeKind, Arc<dyn NodeFactory>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a node factory, replacing any factory for the same kind
    pub fn register(&mut self, factory: Arc<dyn NodeFactory>) {
        let kind = factory.kind();
        tracing::debug!("Registering node kind: {}", kind);
        self.factories.insert(kind, factory);
    }

    pub fn is_registered(&self, kind: &NodeKind) -> bool {
        self.factories.contains_key(kind)
    }

    /// Handler for `kind`. Kinds without a factory get a pass-through handler.
    pub fn handler(&self, kind: &NodeKind) -> Arc<dyn NodeHandler> {
        match self.factories.get(kind) {
            Some(factory) => factory.create(),
            None => Arc::new(PassThroughHandler { kind: kind.clone() }),
        }
    }

    /// Registered kinds, in catalog order with custom kinds last
    pub fn list_kinds(&self) -> Vec<NodeKind> {
        let mut kinds: Vec<NodeKind> = self.factories.keys().cloned().collect();
        kinds.sort_by_key(|kind| {
            NodeKind::ALL
                .iter()
                .position(|k| k == kind)
                .unwrap_or(NodeKind::ALL.len())
        });
        kinds
    }

    /// Get metadata for a node kind
    pub fn get_metadata(&self, kind: &NodeKind) -> Option<KindSpec> {
        self.factories.get(kind).map(|f| f.metadata())
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Used for kinds the registry has no factory for. Returns the input as-is.
pub struct PassThroughHandler {
    kind: NodeKind,
}

#[async_trait]
impl NodeHandler for PassThroughHandler {
    fn kind(&self) -> NodeKind {
        self.kind.clone()
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        Ok(ctx.input)
    }
}
