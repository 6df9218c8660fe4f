/// Workflow Definition Layer
/// 
/// This module handles the workflow wire format and its dependency structure:
/// - Type definitions (WorkflowRequest, Node, Edge)
/// - Dependency graph construction on a petgraph arena

// Core workflow type definitions
pub mod types;

// "Node depends on" graph built per invocation
pub mod graph;

// Re-export commonly used types
pub use graph::DependencyGraph;
pub use types::{Edge, ExecutionContext, Node, WorkflowError, WorkflowRequest};
