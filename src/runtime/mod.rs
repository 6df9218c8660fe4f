/// Runtime Execution Engine
/// 
/// This module drives a workflow invocation from graph to transcript.
/// It handles:
/// - Topological ordering with best-effort cycle tolerance
/// - Input resolution from global inputs and upstream results
/// - Dispatch of each node to its framework handler
/// - Streaming progress events to the caller

// Depth-first ordering over the dependency graph
pub mod order;

// Upstream results and global inputs merged per node
pub mod inputs;

// Per-node outcomes and the summary map
pub mod results;

// Framework handler capabilities and their lookup table
pub mod handlers;

// Routing of nodes to handlers
pub mod dispatch;

// Sequential streaming execution loop
pub mod engine;

// Re-export main types
pub use dispatch::{NodeDispatcher, Route};
pub use engine::{ExecutionEngine, ProgressEvent};
pub use handlers::{HandlerError, HandlerRegistry, ModelFramework};
pub use results::{NodeResult, NodeResults};
