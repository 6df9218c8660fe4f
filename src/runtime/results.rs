/// Per-node outcomes accumulated during one execution

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Recorded outcome of one node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeResult {
    /// Handler output (text in practice, structured values are allowed)
    Success(Value),
    /// Failure description, without the "ERROR: " tag
    Failure(String),
}

impl NodeResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Success(Value::String(text.into()))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Value handed to downstream nodes and written to the summary
    ///
    /// Failures travel as their tagged text so dependents still see them.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Success(value) => value.clone(),
            Self::Failure(error) => Value::String(format!("ERROR: {error}")),
        }
    }
}

impl fmt::Display for NodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(Value::String(text)) => f.write_str(text),
            Self::Success(value) => write!(f, "{value}"),
            Self::Failure(error) => write!(f, "ERROR: {error}"),
        }
    }
}

impl Serialize for NodeResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Results keyed by node id, in completion order
///
/// Each node id is written at most once; later writes are refused.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NodeResults(IndexMap<String, NodeResult>);

impl NodeResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for `node_id`. Returns false (and keeps the first
    /// outcome) when the node already has one.
    pub fn record(&mut self, node_id: &str, result: NodeResult) -> bool {
        if self.0.contains_key(node_id) {
            tracing::warn!("⚠️ Result for node '{}' already recorded, keeping the first", node_id);
            return false;
        }
        self.0.insert(node_id.to_string(), result);
        true
    }

    pub fn get(&self, node_id: &str) -> Option<&NodeResult> {
        self.0.get(node_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeResult)> {
        self.0.iter().map(|(id, result)| (id.as_str(), result))
    }

    /// Pretty JSON object mapping node id to result-or-error text
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
