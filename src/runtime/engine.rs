/// Streaming workflow execution engine
///
/// Builds the dependency graph, resolves the execution order and runs every
/// node one at a time, emitting progress events as it goes. Failures stay
/// local to the node that raised them; the loop always runs to completion
/// unless the consumer of the event stream goes away.

use crate::runtime::dispatch::{NodeDispatcher, Route};
use crate::runtime::handlers::{HandlerError, ModelFramework};
use crate::runtime::inputs::resolve_inputs;
use crate::runtime::order::resolve_execution_order;
use crate::runtime::results::{NodeResult, NodeResults};
use crate::workflow::graph::DependencyGraph;
use crate::workflow::types::{ExecutionContext, WorkflowRequest};
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

/// Default number of events that may wait for the consumer
pub const DEFAULT_STREAM_BUFFER: usize = 1;

/// One entry of the live progress transcript
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started,
    NodeStarted {
        node_id: String,
        label: String,
        node_type: String,
        framework: String,
    },
    /// Raw output of a model-backed handler, ahead of the completion line
    Step {
        framework: ModelFramework,
        label: String,
        output: String,
    },
    NodeCompleted {
        node_id: String,
        label: String,
        result: NodeResult,
    },
    NodeFailed {
        node_id: String,
        label: String,
        error: String,
    },
    Finished,
    Summary(NodeResults),
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => f.write_str("Starting crew execution...\n\n"),
            Self::NodeStarted {
                label,
                node_type,
                framework,
                ..
            } => writeln!(f, "Executing {label} ({node_type} using {framework})..."),
            Self::Step {
                framework,
                label,
                output,
            } => write!(
                f,
                "Step: {} result for {label}: {output}\n\n",
                framework.display_name()
            ),
            Self::NodeCompleted { label, result, .. } => write!(f, "Completed {label}: {result}\n\n"),
            Self::NodeFailed { label, error, .. } => {
                write!(f, "ERROR: Error executing {label}: {error}\n\n")
            }
            Self::Finished => f.write_str("Execution complete.\n\n"),
            Self::Summary(results) => {
                write!(f, "Results summary:\n{}\n\n", results.to_pretty_json())
            }
        }
    }
}

/// The consumer dropped the event stream
#[derive(Debug, Error)]
#[error("progress stream closed by the consumer")]
pub struct StreamClosed;

/// Sending half of a progress stream
///
/// `emit` waits for channel capacity, so the loop never runs further ahead of
/// the consumer than the channel buffer allows.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::Sender<ProgressEvent>,
}

impl EventSink {
    pub fn new(sender: mpsc::Sender<ProgressEvent>) -> Self {
        Self { sender }
    }

    pub async fn emit(&self, event: ProgressEvent) -> Result<(), StreamClosed> {
        self.sender.send(event).await.map_err(|_| StreamClosed)
    }
}

/// Workflow execution engine
///
/// Stateless between invocations: every run owns its graph, order and result
/// map, so independent runs may proceed concurrently on separate tasks.
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    /// Node dispatcher shared by all runs
    dispatcher: Arc<NodeDispatcher>,
    /// Capacity of each run's progress channel
    buffer: usize,
}

impl ExecutionEngine {
    pub fn new(dispatcher: NodeDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    /// Set the progress channel capacity (at least 1)
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    /// Start executing `workflow` on its own task and return the live event stream
    pub fn stream(&self, workflow: WorkflowRequest, context: ExecutionContext) -> ReceiverStream<ProgressEvent> {
        let (sender, receiver) = mpsc::channel(self.buffer);
        let engine = self.clone();
        let run_id = context.run_id;

        tokio::spawn(
            async move {
                let sink = EventSink::new(sender);
                if let Err(e) = engine.execute(&workflow, &sink).await {
                    tracing::warn!("🔌 Stopping workflow run {}: {}", run_id, e);
                }
            }
            .instrument(context.span),
        );

        ReceiverStream::new(receiver)
    }

    /// Execute `workflow` to completion, emitting every event into `events`
    ///
    /// Returns the per-node results, or `StreamClosed` if the consumer went
    /// away before the run finished.
    pub async fn execute(
        &self,
        workflow: &WorkflowRequest,
        events: &EventSink,
    ) -> Result<NodeResults, StreamClosed> {
        let workflow_start_time = Instant::now();
        tracing::info!(
            "🚀 Starting workflow execution with {} nodes and {} edges",
            workflow.nodes.len(),
            workflow.edges.len()
        );
        events.emit(ProgressEvent::Started).await?;

        let graph = DependencyGraph::build(&workflow.nodes, &workflow.edges);
        if graph.has_cycle() {
            tracing::warn!("🔁 Workflow contains a dependency cycle, continuing with best-effort order");
        }
        let order = resolve_execution_order(&graph);
        tracing::debug!("📋 Execution order: {:?}", order);

        let mut results = NodeResults::new();

        for (step_num, node_id) in order.iter().enumerate() {
            let Some(node) = workflow.node(node_id) else {
                tracing::debug!("⏭️ No node object for '{}', skipping", node_id);
                continue;
            };

            let inputs = resolve_inputs(node_id, &workflow.edges, &results, &workflow.inputs);
            let label = node.label().to_string();

            tracing::info!(
                "📍 Step {}/{}: Executing node '{}' ({} using {})",
                step_num + 1,
                order.len(),
                node_id,
                node.node_type(),
                node.framework()
            );
            events
                .emit(ProgressEvent::NodeStarted {
                    node_id: node_id.clone(),
                    label: label.clone(),
                    node_type: node.node_type().to_string(),
                    framework: node.framework().to_string(),
                })
                .await?;

            let node_start_time = Instant::now();
            let dispatched = AssertUnwindSafe(self.dispatcher.dispatch(node, &inputs, workflow))
                .catch_unwind()
                .await;
            let (route, result) = match dispatched {
                Ok(outcome) => (Some(outcome.route), outcome.result),
                Err(panic) => (None, Err(HandlerError::Failed(panic_message(panic.as_ref())))),
            };

            match result {
                Ok(output) => {
                    if let Some(Route::Model(framework)) = route {
                        events
                            .emit(ProgressEvent::Step {
                                framework,
                                label: label.clone(),
                                output: output.clone(),
                            })
                            .await?;
                    }
                    let result = NodeResult::text(output);
                    results.record(node_id, result.clone());
                    tracing::info!("✅ Node '{}' completed in {:?}", node_id, node_start_time.elapsed());
                    events
                        .emit(ProgressEvent::NodeCompleted {
                            node_id: node_id.clone(),
                            label,
                            result,
                        })
                        .await?;
                }
                Err(error) => {
                    tracing::error!("❌ Error executing {} ('{}'): {}", label, node_id, error);
                    results.record(node_id, NodeResult::Failure(error.to_string()));
                    events
                        .emit(ProgressEvent::NodeFailed {
                            node_id: node_id.clone(),
                            label,
                            error: error.to_string(),
                        })
                        .await?;
                }
            }
        }

        events.emit(ProgressEvent::Finished).await?;
        tracing::info!(
            "🎉 Workflow execution completed: {} results in {:?}",
            results.len(),
            workflow_start_time.elapsed()
        );
        events.emit(ProgressEvent::Summary(results.clone())).await?;

        Ok(results)
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(NodeDispatcher::default())
    }
}

/// Best-effort text of a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::handlers::{HandlerRegistry, NodeHandler};
    use crate::workflow::types::Attributes;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio_stream::StreamExt;

    fn workflow(value: serde_json::Value) -> WorkflowRequest {
        serde_json::from_value(value).unwrap()
    }

    async fn run(engine: &ExecutionEngine, wf: WorkflowRequest) -> Vec<ProgressEvent> {
        let context = ExecutionContext::for_workflow(&wf);
        engine.stream(wf, context).collect().await
    }

    fn transcript(events: &[ProgressEvent]) -> String {
        events.iter().map(ProgressEvent::to_string).collect()
    }

    #[tokio::test]
    async fn empty_workflow_still_reports_start_and_summary() {
        let events = run(&ExecutionEngine::default(), WorkflowRequest::default()).await;
        assert_eq!(
            transcript(&events),
            "Starting crew execution...\n\nExecution complete.\n\nResults summary:\n{}\n\n"
        );
    }

    #[tokio::test]
    async fn model_nodes_emit_a_step_line_before_completion() {
        let wf = workflow(json!({
            "nodes": [ { "id": "q", "data": { "label": "Lookup", "framework": "llamaindex", "query": "why" } } ]
        }));
        let events = run(&ExecutionEngine::default(), wf).await;
        let text = transcript(&events);
        assert!(text.contains("Executing Lookup (unknown using llamaindex)...\n"));
        assert!(text.contains("Step: LlamaIndex result for Lookup: [Simulated] LlamaIndex queried: 'why'\n\n"));
        assert!(text.contains("Completed Lookup: [Simulated] LlamaIndex queried: 'why'\n\n"));
        let step = text.find("Step:").unwrap();
        let completed = text.find("Completed").unwrap();
        assert!(step < completed);
    }

    struct Panicking;

    #[async_trait]
    impl NodeHandler for Panicking {
        async fn run(&self, _attributes: &Attributes) -> Result<String, HandlerError> {
            panic!("model exploded");
        }
    }

    #[tokio::test]
    async fn panicking_handler_is_contained() {
        let wf = workflow(json!({
            "nodes": [
                { "id": "boom", "data": { "label": "Boom", "framework": "autogen" } },
                { "id": "after", "type": "tool", "data": { "label": "After" } }
            ],
            "edges": [ { "source": "boom", "target": "after" } ]
        }));
        let registry = HandlerRegistry::builtin().with_handler(ModelFramework::Autogen, Arc::new(Panicking));
        let engine = ExecutionEngine::new(NodeDispatcher::new(registry));
        let events = run(&engine, wf).await;

        let Some(ProgressEvent::Summary(results)) = events.last() else {
            panic!("summary must be the last event");
        };
        assert_eq!(
            results.get("boom"),
            Some(&NodeResult::Failure("handler panicked: model exploded".into()))
        );
        assert_eq!(results.get("after"), Some(&NodeResult::text("Tool After is available")));
    }

    #[tokio::test]
    async fn execute_returns_results_and_closes_on_dropped_consumer() {
        let wf = workflow(json!({
            "nodes": [ { "id": "a", "type": "agent" }, { "id": "b", "type": "tool" } ]
        }));
        let engine = ExecutionEngine::default().with_buffer(64);

        let (sender, mut receiver) = mpsc::channel(64);
        let results = engine.execute(&wf, &EventSink::new(sender)).await.unwrap();
        assert_eq!(results.len(), 2);
        let mut count = 0;
        while receiver.try_recv().is_ok() {
            count += 1;
        }
        // start, 2 x (executing, completed), finished, summary
        assert_eq!(count, 7);

        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        assert!(engine.execute(&wf, &EventSink::new(sender)).await.is_err());
    }

    #[tokio::test]
    async fn consumer_sees_events_before_the_run_finishes() {
        let wf = workflow(json!({
            "nodes": [ { "id": "a", "type": "agent" }, { "id": "b", "type": "agent" } ]
        }));
        let mut stream = ExecutionEngine::default().stream(wf.clone(), ExecutionContext::for_workflow(&wf));
        assert_eq!(stream.next().await, Some(ProgressEvent::Started));
        assert!(matches!(stream.next().await, Some(ProgressEvent::NodeStarted { ref node_id, .. }) if node_id == "a"));
        let rest: Vec<ProgressEvent> = stream.collect().await;
        assert!(matches!(rest.last(), Some(ProgressEvent::Summary(_))));
    }
}
