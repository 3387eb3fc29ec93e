use crate::{DocumentError, NodeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Version written into exported documents.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Stable node identifier. Fresh ids are UUID v4 strings; ids from imported
/// documents are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Node position in the visual editor. Not used by execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A vertex in the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: NodeId,
    #[serde(rename = "type", default = "unknown_kind")]
    pub kind: NodeKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub config: Map<String, Value>,
    /// Outgoing edges, in visiting order.
    #[serde(default)]
    pub connected: Vec<NodeId>,
    /// Imported `config` that was not an object. Reported when the node runs.
    #[serde(skip)]
    pub rejected_config: Option<Value>,
}

fn unknown_kind() -> NodeKind {
    NodeKind::Custom("unknown".to_string())
}

impl Node {
    /// New node with the catalog label and default config for `kind`.
    pub fn new(kind: NodeKind) -> Self {
        let spec = kind.spec();
        Self {
            id: NodeId::new(),
            kind,
            label: spec.label,
            position: Position::default(),
            config: spec.default_config,
            connected: Vec::new(),
            rejected_config: None,
        }
    }

    /// Decode one node of an imported document.
    ///
    /// Never fails: missing, null or mistyped fields fall back to defaults.
    /// A non-object `config` is kept in `rejected_config`. Edges are
    /// deduplicated and self-loops dropped.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            tracing::warn!("Imported node is not an object: {}", value);
            return Self {
                id: NodeId::new(),
                kind: unknown_kind(),
                label: String::new(),
                position: Position::default(),
                config: Map::new(),
                connected: Vec::new(),
                rejected_config: None,
            };
        };

        let id = match object.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => NodeId::from(id.as_str()),
            Some(Value::Number(n)) => NodeId::from(n.to_string()),
            _ => NodeId::new(),
        };
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .map(NodeKind::from)
            .unwrap_or_else(unknown_kind);
        let label = object
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let position = object
            .get("position")
            .map(|p| Position {
                x: p.get("x").and_then(Value::as_f64).unwrap_or_default(),
                y: p.get("y").and_then(Value::as_f64).unwrap_or_default(),
            })
            .unwrap_or_default();

        let (config, rejected_config) = match object.get("config") {
            None | Some(Value::Null) => (Map::new(), None),
            Some(Value::Object(config)) => (config.clone(), None),
            Some(other) => {
                tracing::warn!("Node {} has a non-object config", id);
                (Map::new(), Some(other.clone()))
            }
        };

        let mut connected: Vec<NodeId> = Vec::new();
        for target in object
            .get("connected")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
        {
            let target = NodeId::from(target);
            if target != id && !connected.contains(&target) {
                connected.push(target);
            }
        }

        Self {
            id,
            kind,
            label,
            position,
            config,
            connected,
            rejected_config,
        }
    }

    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Position { x, y };
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Label shown in the trace: the user label, or the kind when blank.
    pub fn display_label(&self) -> String {
        if self.label.trim().is_empty() {
            self.kind.label()
        } else {
            self.label.clone()
        }
    }
}

/// Portable export/import format of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    pub nodes: Vec<Node>,
    pub created_at: DateTime<Utc>,
    pub version: String,
}

impl WorkflowDocument {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            created_at: Utc::now(),
            version: DOCUMENT_VERSION.to_string(),
        }
    }

    /// Import from an arbitrary JSON value.
    ///
    /// Only the presence and array-ness of `nodes` is checked here. Node
    /// shape problems fall back to defaults; bad config surfaces at execution.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let mut object = match value {
            Value::Object(object) => object,
            _ => return Err(DocumentError::MissingNodes),
        };

        let nodes = match object.remove("nodes") {
            None => return Err(DocumentError::MissingNodes),
            Some(Value::Array(nodes)) => nodes,
            Some(_) => return Err(DocumentError::NodesNotArray),
        };

        let nodes: Vec<Node> = nodes.iter().map(Node::from_value).collect();
        tracing::debug!("Imported document with {} nodes", nodes.len());

        let created_at = object
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let version = object
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or(DOCUMENT_VERSION)
            .to_string();

        Ok(Self {
            nodes,
            created_at,
            version,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn import_requires_nodes_array() {
        assert!(matches!(
            WorkflowDocument::from_value(json!({ "version": "1.0" })),
            Err(DocumentError::MissingNodes)
        ));
        assert!(matches!(
            WorkflowDocument::from_value(json!({ "nodes": {} })),
            Err(DocumentError::NodesNotArray)
        ));
    }

    #[test]
    fn import_tolerates_sparse_nodes() {
        let doc = WorkflowDocument::from_value(json!({
            "nodes": [
                { "id": "n1", "type": "trigger" },
                { "id": "n2", "type": "mystery-box", "connected": ["n1"] }
            ]
        }))
        .unwrap();

        assert_eq!(doc.version, DOCUMENT_VERSION);
        assert_eq!(doc.nodes[0].kind, NodeKind::Trigger);
        assert_eq!(doc.nodes[1].kind, NodeKind::Custom("mystery-box".to_string()));
        assert_eq!(doc.nodes[1].connected, vec![NodeId::from("n1")]);
        assert!(doc.nodes[0].config.is_empty());
    }

    #[test]
    fn import_defers_node_shape_problems() {
        let doc = WorkflowDocument::from_value(json!({
            "nodes": [
                { "id": "t", "type": "trigger", "config": "oops", "connected": ["a", "a", "t"] },
                { "id": "a", "label": null, "position": { "x": "10", "y": 4.5 }, "connected": null },
                42
            ]
        }))
        .unwrap();

        let trigger = &doc.nodes[0];
        assert!(trigger.config.is_empty());
        assert_eq!(trigger.rejected_config, Some(json!("oops")));
        assert_eq!(trigger.connected, vec![NodeId::from("a")]);

        let second = &doc.nodes[1];
        assert_eq!(second.kind, NodeKind::Custom("unknown".to_string()));
        assert_eq!(second.label, "");
        assert_eq!(second.position, Position { x: 0.0, y: 4.5 });
        assert!(second.connected.is_empty());

        assert_eq!(doc.nodes.len(), 3);
        assert!(!doc.nodes[2].id.as_str().is_empty());
    }

    #[test]
    fn export_uses_wire_field_names() {
        let node = Node::new(NodeKind::Translator).with_id("t1");
        let value = serde_json::to_value(WorkflowDocument::new(vec![node])).unwrap();

        assert_eq!(value["version"], "1.0");
        assert!(value["createdAt"].is_string());
        assert_eq!(value["nodes"][0]["type"], "translator");
        assert_eq!(value["nodes"][0]["label"], "Translator");
        assert_eq!(value["nodes"][0]["position"]["x"], 0.0);
    }
}
