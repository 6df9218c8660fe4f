/// Opsyde: streaming execution engine for agent/task/tool workflows
/// 
/// This library orders a user-authored workflow graph, runs each node through
/// its framework handler and streams a live progress transcript to the caller.

// Core configuration and setup
pub mod config;

// Workflow definition layer - wire types and dependency graph
pub mod workflow;

// Runtime execution engine - ordering, input resolution, dispatch, streaming
pub mod runtime;

// Transcript delivery to external channels
pub mod delivery;

// HTTP API layer - execution and delivery endpoints
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use runtime::{ExecutionEngine, HandlerRegistry, NodeResult, NodeResults, ProgressEvent};
pub use server::{create_app, start_server};
pub use workflow::{Edge, ExecutionContext, Node, WorkflowRequest};
