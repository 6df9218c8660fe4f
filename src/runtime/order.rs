/// Execution order resolution
///
/// Depth-first topological sort over the dependency graph using an explicit
/// stack, so arbitrarily deep chains cannot exhaust the call stack. Cycles are
/// tolerated: a node reached again while still on the current path is treated
/// as already satisfied and the traversal carries on.

use crate::workflow::graph::DependencyGraph;
use petgraph::graph::NodeIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

/// One pending visit: a vertex and how far through its dependencies we are
struct Frame {
    node: NodeIndex,
    dependencies: Vec<NodeIndex>,
    next: usize,
}

impl Frame {
    fn new(graph: &DependencyGraph, node: NodeIndex) -> Self {
        Self {
            node,
            dependencies: graph.dependency_indices(node),
            next: 0,
        }
    }
}

/// Linear execution order: every dependency precedes its dependents unless a
/// cycle makes that impossible. Contains each known node id exactly once.
pub fn resolve_execution_order(graph: &DependencyGraph) -> Vec<String> {
    let mut state = vec![VisitState::Unvisited; graph.vertex_count()];
    let mut order = Vec::with_capacity(graph.len());
    let mut stack: Vec<Frame> = Vec::new();

    for root in graph.keys() {
        if state[root.index()] != VisitState::Unvisited {
            continue;
        }
        state[root.index()] = VisitState::InProgress;
        stack.push(Frame::new(graph, root));

        while let Some(frame) = stack.last_mut() {
            if let Some(&dependency) = frame.dependencies.get(frame.next) {
                frame.next += 1;
                match state[dependency.index()] {
                    VisitState::InProgress => {
                        tracing::debug!(
                            "🔁 Cycle reached '{}' again from '{}', treating it as satisfied",
                            graph.node_id(dependency),
                            graph.node_id(frame.node)
                        );
                    }
                    VisitState::Done => {}
                    VisitState::Unvisited => {
                        state[dependency.index()] = VisitState::InProgress;
                        stack.push(Frame::new(graph, dependency));
                    }
                }
                continue;
            }

            // All dependencies handled: the frame on top is finished
            if let Some(finished) = stack.pop() {
                state[finished.node.index()] = VisitState::Done;
                if graph.is_key(finished.node) {
                    order.push(graph.node_id(finished.node).to_string());
                }
            }
        }
    }

    order
}
