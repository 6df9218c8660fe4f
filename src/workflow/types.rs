/// Core workflow type definitions
///
/// Defines the wire structures a canvas client posts for execution: nodes, edges
/// and global inputs. Every field is defaulted so that partially drawn graphs
/// still deserialize; the engine treats the result as a best-effort graph.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::Span;
use uuid::Uuid;

/// Attribute bag handed to node handlers (insertion ordered)
pub type Attributes = Map<String, Value>;

/// Global workflow inputs, keyed by input name
pub type GlobalInputs = IndexMap<String, Value>;

/// Label used when a node carries none
pub const DEFAULT_LABEL: &str = "Unknown Task";

/// Framework assumed when a node declares none
pub const DEFAULT_FRAMEWORK: &str = "crew";

/// A complete workflow invocation: the graph plus its global inputs
///
/// Owned by exactly one execution and never mutated once the run starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowRequest {
    /// Nodes in canvas order (ids expected unique)
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges in canvas order
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Flat key-value map of global workflow inputs
    #[serde(default)]
    pub inputs: GlobalInputs,
}

/// Construction-time failures, raised before any execution starts
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Body is not valid JSON or does not have the workflow shape
    #[error("invalid workflow payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl WorkflowRequest {
    /// Parse an invocation body
    pub fn from_json(body: &str) -> Result<Self, WorkflowError> {
        Ok(serde_json::from_str(body)?)
    }

    /// First node carrying the given id
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

/// A single unit of work on the canvas (agent, task or tool)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier within the workflow
    pub id: String,
    /// Free-form canvas tag such as "agent", "task" or "tool"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Attribute bag: label, nodeType, framework and handler fields
    #[serde(default)]
    pub data: NodeData,
}

/// Node attributes as authored in the editor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Overrides the top-level `type` tag when present
    #[serde(rename = "nodeType", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    /// Handler-specific fields (model, prompt, role, goal, ...)
    #[serde(flatten)]
    pub fields: Attributes,
}

impl Node {
    pub fn label(&self) -> &str {
        self.data.label.as_deref().unwrap_or(DEFAULT_LABEL)
    }

    /// Effective node type: `data.nodeType`, then `type`, then "unknown"
    pub fn node_type(&self) -> &str {
        self.data
            .node_type
            .as_deref()
            .or(self.kind.as_deref())
            .unwrap_or("unknown")
    }

    pub fn framework(&self) -> &str {
        self.data.framework.as_deref().unwrap_or(DEFAULT_FRAMEWORK)
    }

    /// The node's declared attributes as a flat map, as handlers expect them
    pub fn attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        if let Some(label) = &self.data.label {
            attributes.insert("label".to_string(), Value::String(label.clone()));
        }
        if let Some(node_type) = &self.data.node_type {
            attributes.insert("nodeType".to_string(), Value::String(node_type.clone()));
        }
        if let Some(framework) = &self.data.framework {
            attributes.insert("framework".to_string(), Value::String(framework.clone()));
        }
        for (key, value) in &self.data.fields {
            attributes.insert(key.clone(), value.clone());
        }
        attributes
    }
}

/// Directed data/control link between two nodes
///
/// Source and target are optional on the wire; edges missing either end are
/// dropped by the graph builder rather than rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EdgeData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeData {
    /// Named-input key under which the source result reaches the target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    /// Source id, treating an empty string as absent
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref().filter(|id| !id.is_empty())
    }

    /// Target id, treating an empty string as absent
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref().filter(|id| !id.is_empty())
    }

    pub fn label(&self) -> Option<&str> {
        self.data.as_ref().and_then(|data| data.label.as_deref())
    }
}

/// Per-invocation logging context
///
/// Each run gets its own span (tagged with a fresh run id) that the engine
/// instruments its loop with, instead of reaching for process-wide state.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub run_id: Uuid,
    pub span: Span,
}

impl ExecutionContext {
    /// Create a context for one invocation of `workflow`
    pub fn for_workflow(workflow: &WorkflowRequest) -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "workflow",
            run_id = %run_id,
            nodes = workflow.nodes.len(),
            edges = workflow.edges.len(),
        );
        Self { run_id, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_sections_default_to_empty() {
        let workflow = WorkflowRequest::from_json("{}").unwrap();
        assert!(workflow.nodes.is_empty());
        assert!(workflow.edges.is_empty());
        assert!(workflow.inputs.is_empty());
    }

    #[test]
    fn invalid_payload_is_rejected() {
        let err = WorkflowRequest::from_json("not json").unwrap_err();
        assert!(err.to_string().starts_with("invalid workflow payload"));
    }

    #[test]
    fn node_attribute_fallbacks() {
        let node: Node = serde_json::from_value(json!({ "id": "n1" })).unwrap();
        assert_eq!(node.label(), "Unknown Task");
        assert_eq!(node.node_type(), "unknown");
        assert_eq!(node.framework(), "crew");

        let node: Node = serde_json::from_value(json!({
            "id": "n2",
            "type": "agent",
            "data": { "label": "Writer", "nodeType": "task", "framework": "autogen" }
        }))
        .unwrap();
        assert_eq!(node.label(), "Writer");
        assert_eq!(node.node_type(), "task");
        assert_eq!(node.framework(), "autogen");
    }

    #[test]
    fn attributes_keep_handler_fields_in_order() {
        let node: Node = serde_json::from_value(json!({
            "id": "n1",
            "data": { "label": "HF", "model": "gpt2", "prompt": "hi", "max_length": 10 }
        }))
        .unwrap();
        let attributes = node.attributes();
        let keys: Vec<&str> = attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["label", "model", "prompt", "max_length"]);
    }

    #[test]
    fn edge_ends_and_label() {
        let edge: Edge = serde_json::from_value(json!({
            "source": "",
            "target": "b",
            "data": { "label": "draft" }
        }))
        .unwrap();
        assert_eq!(edge.source(), None);
        assert_eq!(edge.target(), Some("b"));
        assert_eq!(edge.label(), Some("draft"));

        let edge: Edge = serde_json::from_value(json!({ "source": "a", "target": "b" })).unwrap();
        assert_eq!(edge.label(), None);
    }

    #[test]
    fn global_inputs_preserve_order() {
        let workflow = WorkflowRequest::from_json(r#"{"inputs": {"z": 1, "a": 2}}"#).unwrap();
        let keys: Vec<&str> = workflow.inputs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
