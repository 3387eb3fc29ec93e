//! In-memory graph store behind the workflow editor.

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use presscore::{DocumentError, Node, NodeId, NodeKind, Position, WorkflowDocument};
use rand::Rng;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Result of a connect request. Connecting never fails hard; the caller
/// decides how to surface the non-`Connected` outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    AlreadyConnected,
    SelfLoop,
    UnknownNode,
}

/// Holds the current nodes and their outgoing edges.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    selected: Option<NodeId>,
    connecting_from: Option<NodeId>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node of `kind` with catalog defaults at a random position.
    /// The new node becomes the selected node.
    pub fn add_node(&mut self, kind: NodeKind) -> Node {
        let mut rng = rand::thread_rng();
        let node = Node::new(kind).with_position(
            rng.gen_range(100.0..600.0),
            rng.gen_range(100.0..400.0),
        );

        tracing::debug!("Added node {} ({})", node.id, node.kind);
        self.selected = Some(node.id.clone());
        self.nodes.push(node.clone());
        node
    }

    /// Insert a fully built node as-is. Replaces a node with the same id.
    pub fn insert(&mut self, node: Node) {
        match self.position_of(&node.id) {
            Some(index) => self.nodes[index] = node,
            None => self.nodes.push(node),
        }
    }

    fn position_of(&self, id: &NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| &n.id == id)
    }

    fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Shallow-merge `partial` into the node's config. Unknown ids are ignored.
    pub fn update_node_config(&mut self, id: &NodeId, partial: Map<String, Value>) {
        if let Some(node) = self.get_mut(id) {
            for (key, value) in partial {
                node.config.insert(key, value);
            }
        }
    }

    pub fn update_node_label(&mut self, id: &NodeId, label: impl Into<String>) {
        if let Some(node) = self.get_mut(id) {
            node.label = label.into();
        }
    }

    pub fn move_node(&mut self, id: &NodeId, position: Position) {
        if let Some(node) = self.get_mut(id) {
            node.position = position;
        }
    }

    /// Remove the node and every edge pointing at it.
    pub fn delete_node(&mut self, id: &NodeId) -> Option<Node> {
        let index = self.position_of(id)?;
        let removed = self.nodes.remove(index);

        for node in &mut self.nodes {
            node.connected.retain(|target| target != id);
        }
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        if self.connecting_from.as_ref() == Some(id) {
            self.connecting_from = None;
        }

        tracing::debug!("Deleted node {}", id);
        Some(removed)
    }

    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> ConnectOutcome {
        if source == target {
            tracing::warn!("Refusing to connect node {} to itself", source);
            return ConnectOutcome::SelfLoop;
        }
        if self.get(target).is_none() {
            return ConnectOutcome::UnknownNode;
        }
        let Some(node) = self.get_mut(source) else {
            return ConnectOutcome::UnknownNode;
        };
        if node.connected.contains(target) {
            return ConnectOutcome::AlreadyConnected;
        }

        node.connected.push(target.clone());
        ConnectOutcome::Connected
    }

    /// Start the two-step connect gesture from `source`.
    pub fn begin_connect(&mut self, source: &NodeId) -> bool {
        if self.get(source).is_none() {
            return false;
        }
        self.connecting_from = Some(source.clone());
        true
    }

    /// Finish the connect gesture on `target`. Without a gesture in progress
    /// this reports `UnknownNode`.
    pub fn finish_connect(&mut self, target: &NodeId) -> ConnectOutcome {
        match self.connecting_from.take() {
            Some(source) => self.connect(&source, target),
            None => ConnectOutcome::UnknownNode,
        }
    }

    pub fn cancel_connect(&mut self) {
        self.connecting_from = None;
    }

    pub fn connecting_from(&self) -> Option<&NodeId> {
        self.connecting_from.as_ref()
    }

    /// Clear the node's outgoing edges only.
    pub fn disconnect_all(&mut self, id: &NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.connected.clear();
        }
    }

    pub fn select(&mut self, id: Option<&NodeId>) {
        self.selected = id.filter(|id| self.get(id).is_some()).cloned();
    }

    pub fn selected(&self) -> Option<&Node> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.selected = None;
        self.connecting_from = None;
    }

    /// Copy of the current nodes for a run.
    pub fn snapshot(&self) -> Vec<Node> {
        self.nodes.clone()
    }

    pub fn has_trigger(&self) -> bool {
        self.nodes.iter().any(|n| n.kind.is_trigger())
    }

    /// Groups of nodes that sit on a cycle, including single-node self loops
    /// from imported documents. Edges to missing nodes are ignored.
    pub fn find_cycles(&self) -> Vec<Vec<NodeId>> {
        let mut graph = DiGraph::<NodeId, ()>::new();
        let mut index = HashMap::new();

        for node in &self.nodes {
            index.insert(node.id.clone(), graph.add_node(node.id.clone()));
        }
        for node in &self.nodes {
            for target in &node.connected {
                if let (Some(from), Some(to)) = (index.get(&node.id), index.get(target)) {
                    graph.add_edge(*from, *to, ());
                }
            }
        }

        tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&idx| graph.contains_edge(idx, idx))
            })
            .map(|component| {
                let mut ids: Vec<NodeId> =
                    component.into_iter().map(|idx| graph[idx].clone()).collect();
                ids.sort();
                ids
            })
            .collect()
    }

    pub fn serialize(&self) -> WorkflowDocument {
        WorkflowDocument::new(self.nodes.clone())
    }

    /// Replace the entire graph with the document's nodes.
    pub fn deserialize(&mut self, document: WorkflowDocument) {
        self.clear();
        self.nodes = document.nodes;
        tracing::info!("Loaded workflow with {} nodes", self.nodes.len());
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        self.serialize().to_json()
    }

    pub fn from_json(&mut self, json: &str) -> Result<(), DocumentError> {
        let document = WorkflowDocument::from_json(json)?;
        self.deserialize(document);
        Ok(())
    }
}
