/// Per-node input resolution
///
/// Merges the workflow's global inputs with the recorded results of a node's
/// direct upstream nodes. Edge-derived entries are applied after the globals,
/// so they win on key collisions, and later edges overwrite earlier ones.

use crate::runtime::results::NodeResults;
use crate::workflow::types::{Edge, GlobalInputs};
use indexmap::IndexMap;
use serde_json::Value;

/// Inputs handed to one node, built fresh for every dispatch
pub type ResolvedInputs = IndexMap<String, Value>;

/// Key used for an edge without a label
pub fn synthesized_input_key(source_id: &str) -> String {
    format!("input_from_{source_id}")
}

/// Resolve the inputs of `node_id` from global inputs and upstream results
pub fn resolve_inputs(
    node_id: &str,
    edges: &[Edge],
    results: &NodeResults,
    global_inputs: &GlobalInputs,
) -> ResolvedInputs {
    let mut inputs: ResolvedInputs = global_inputs.clone();

    for edge in edges.iter().filter(|edge| edge.target() == Some(node_id)) {
        let Some(source_id) = edge.source() else {
            continue;
        };
        let Some(result) = results.get(source_id) else {
            tracing::debug!("⏳ No result yet from '{}' for '{}'", source_id, node_id);
            continue;
        };
        let key = edge
            .label()
            .map(str::to_string)
            .unwrap_or_else(|| synthesized_input_key(source_id));
        inputs.insert(key, result.to_value());
    }

    inputs
}
