/// Node dispatch
///
/// Routes a node to the handler capability matching its declared framework
/// and, for crew nodes, its node type. Routing is a closed set of variants
/// with an explicit fallback for unrecognized framework tags.

use crate::runtime::handlers::{HandlerError, HandlerRegistry, ModelFramework};
use crate::runtime::inputs::ResolvedInputs;
use crate::workflow::types::{Node, WorkflowRequest};
use serde_json::Value;

/// Framework tag that routes through crew node-type branching
pub const CREW_FRAMEWORK: &str = "crew";

/// Role of a node inside a crew
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrewRole {
    /// Acknowledged only; agents act through their tasks
    Agent,
    /// Executed by the upstream agent assigned to it
    Task,
    /// Acknowledged only; tools are made available to agents
    Tool,
    Other(String),
}

impl CrewRole {
    pub fn from_node_type(node_type: &str) -> Self {
        match node_type {
            "agent" => Self::Agent,
            "task" => Self::Task,
            "tool" => Self::Tool,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Where a node is sent for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Model(ModelFramework),
    Crew(CrewRole),
    /// Framework tag with no capability behind it
    Unrecognized(String),
}

impl Route {
    pub fn for_node(node: &Node) -> Self {
        let framework = node.framework();
        if framework == CREW_FRAMEWORK {
            return Self::Crew(CrewRole::from_node_type(node.node_type()));
        }
        match ModelFramework::from_tag(framework) {
            Some(model) => Self::Model(model),
            None => Self::Unrecognized(framework.to_string()),
        }
    }
}

/// Result of dispatching one node
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub route: Route,
    pub result: Result<String, HandlerError>,
}

/// Dispatches nodes to handler capabilities
///
/// Holds the capability table; carries no per-run state, so one dispatcher
/// can serve any number of concurrent invocations.
#[derive(Debug, Clone, Default)]
pub struct NodeDispatcher {
    handlers: HandlerRegistry,
}

impl NodeDispatcher {
    pub fn new(handlers: HandlerRegistry) -> Self {
        Self { handlers }
    }

    /// Run `node` with its resolved inputs
    ///
    /// `workflow` is consulted only to find the agent behind a crew task.
    /// Handler failures come back in the outcome; they are never raised.
    pub async fn dispatch(
        &self,
        node: &Node,
        inputs: &ResolvedInputs,
        workflow: &WorkflowRequest,
    ) -> DispatchOutcome {
        let route = Route::for_node(node);
        let label = node.label();
        tracing::debug!("🧭 Routing node '{}' via {:?}", node.id, route);

        let result = match &route {
            Route::Model(framework) => self.run_model(*framework, node, inputs).await,
            Route::Crew(CrewRole::Agent) => Ok(format!("Agent {label} ready for tasks")),
            Route::Crew(CrewRole::Task) => self.run_crew_task(node, inputs, workflow).await,
            Route::Crew(CrewRole::Tool) => Ok(format!("Tool {label} is available")),
            Route::Crew(CrewRole::Other(_)) => Ok(format!("Executed {label} (unknown node type)")),
            Route::Unrecognized(tag) => {
                tracing::debug!("❔ Unrecognized framework '{}' on node '{}'", tag, node.id);
                Ok(format!("Executed {label} (unknown framework)"))
            }
        };

        DispatchOutcome { route, result }
    }

    async fn run_model(
        &self,
        framework: ModelFramework,
        node: &Node,
        inputs: &ResolvedInputs,
    ) -> Result<String, HandlerError> {
        let handler = self.handlers.handler(framework).ok_or_else(|| {
            HandlerError::Failed(format!("no handler registered for framework '{}'", framework.tag()))
        })?;

        let mut attributes = node.attributes();
        let inputs_object = inputs
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        attributes.insert("inputs".to_string(), Value::Object(inputs_object));

        handler.run(&attributes).await
    }

    async fn run_crew_task(
        &self,
        task: &Node,
        inputs: &ResolvedInputs,
        workflow: &WorkflowRequest,
    ) -> Result<String, HandlerError> {
        let Some(agent) = find_agent_for_task(&task.id, workflow) else {
            tracing::warn!("⚠️ Task '{}' has no agent assigned", task.id);
            return Ok(format!("No agent assigned to task {}", task.label()));
        };

        tracing::debug!("🔗 Task '{}' assigned to agent '{}'", task.id, agent.id);
        self.handlers
            .crew()
            .run_task(&agent.attributes(), &task.attributes(), inputs)
            .await
    }
}

/// First upstream node of type "agent" with an edge into `task_id`, by edge order
pub fn find_agent_for_task<'a>(task_id: &str, workflow: &'a WorkflowRequest) -> Option<&'a Node> {
    workflow
        .edges
        .iter()
        .filter(|edge| edge.target() == Some(task_id))
        .filter_map(|edge| edge.source())
        .filter_map(|source_id| workflow.node(source_id))
        .find(|node| node.node_type() == "agent")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::handlers::{AgentTaskHandler, NodeHandler};
    use crate::workflow::types::Attributes;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn workflow(value: Value) -> WorkflowRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn routes_follow_framework_then_node_type() {
        let wf = workflow(json!({
            "nodes": [
                { "id": "a", "type": "agent" },
                { "id": "b", "type": "tool", "data": { "nodeType": "task" } },
                { "id": "c", "data": { "framework": "openrouter" } },
                { "id": "d", "data": { "framework": "langflow" } },
                { "id": "e", "type": "memo" }
            ]
        }));
        let routes: Vec<Route> = wf.nodes.iter().map(Route::for_node).collect();
        assert_eq!(
            routes,
            vec![
                Route::Crew(CrewRole::Agent),
                Route::Crew(CrewRole::Task),
                Route::Model(ModelFramework::OpenRouter),
                Route::Unrecognized("langflow".into()),
                Route::Crew(CrewRole::Other("memo".into())),
            ]
        );
    }

    #[tokio::test]
    async fn crew_acknowledgements_do_not_call_handlers() {
        let wf = workflow(json!({
            "nodes": [
                { "id": "a", "type": "agent", "data": { "label": "Writer" } },
                { "id": "t", "type": "tool", "data": { "label": "Search" } },
                { "id": "x", "type": "note", "data": { "label": "Memo" } },
                { "id": "u", "data": { "label": "Mystery", "framework": "langflow" } }
            ]
        }));
        let dispatcher = NodeDispatcher::default();
        let inputs = ResolvedInputs::new();
        let texts: Vec<String> = dispatch_all(&dispatcher, &wf, &inputs).await;
        assert_eq!(
            texts,
            vec![
                "Agent Writer ready for tasks",
                "Tool Search is available",
                "Executed Memo (unknown node type)",
                "Executed Mystery (unknown framework)",
            ]
        );
    }

    async fn dispatch_all(
        dispatcher: &NodeDispatcher,
        wf: &WorkflowRequest,
        inputs: &ResolvedInputs,
    ) -> Vec<String> {
        let mut texts = Vec::new();
        for node in &wf.nodes {
            texts.push(dispatcher.dispatch(node, inputs, wf).await.result.unwrap());
        }
        texts
    }

    #[tokio::test]
    async fn task_without_agent_reports_it() {
        let wf = workflow(json!({
            "nodes": [
                { "id": "tool", "type": "tool" },
                { "id": "t1", "type": "task", "data": { "label": "Summarize" } }
            ],
            "edges": [ { "source": "tool", "target": "t1" } ]
        }));
        let outcome = NodeDispatcher::default()
            .dispatch(&wf.nodes[1], &ResolvedInputs::new(), &wf)
            .await;
        assert_eq!(outcome.result.unwrap(), "No agent assigned to task Summarize");
    }

    #[derive(Default)]
    struct RecordingCrew {
        agents: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AgentTaskHandler for RecordingCrew {
        async fn run_task(
            &self,
            agent: &Attributes,
            task: &Attributes,
            inputs: &ResolvedInputs,
        ) -> Result<String, HandlerError> {
            let agent_label = agent["label"].as_str().unwrap_or_default().to_string();
            self.agents.lock().unwrap().push(agent_label.clone());
            assert!(task.get("inputs").is_none());
            Ok(format!("{agent_label}:{}:{}", task["label"].as_str().unwrap_or_default(), inputs.len()))
        }
    }

    #[tokio::test]
    async fn task_runs_with_first_agent_by_edge_order() {
        let wf = workflow(json!({
            "nodes": [
                { "id": "t1", "type": "task", "data": { "label": "Draft" } },
                { "id": "tool", "type": "tool" },
                { "id": "a2", "type": "agent", "data": { "label": "Second" } },
                { "id": "a1", "type": "agent", "data": { "label": "First" } }
            ],
            "edges": [
                { "source": "tool", "target": "t1" },
                { "source": "ghost", "target": "t1" },
                { "source": "a1", "target": "t1" },
                { "source": "a2", "target": "t1" }
            ]
        }));
        let crew = Arc::new(RecordingCrew::default());
        let dispatcher = NodeDispatcher::new(HandlerRegistry::builtin().with_crew_handler(crew.clone()));
        let mut inputs = ResolvedInputs::new();
        inputs.insert("topic".into(), json!("rust"));

        let outcome = dispatcher.dispatch(&wf.nodes[0], &inputs, &wf).await;
        assert_eq!(outcome.result.unwrap(), "First:Draft:1");
        assert_eq!(*crew.agents.lock().unwrap(), vec!["First".to_string()]);
    }

    struct EchoInputs;

    #[async_trait]
    impl NodeHandler for EchoInputs {
        async fn run(&self, attributes: &Attributes) -> Result<String, HandlerError> {
            Ok(attributes["inputs"].to_string())
        }
    }

    #[tokio::test]
    async fn model_handlers_receive_inputs_in_attributes() {
        let wf = workflow(json!({
            "nodes": [ { "id": "n", "data": { "framework": "autogen" } } ]
        }));
        let dispatcher = NodeDispatcher::new(
            HandlerRegistry::builtin().with_handler(ModelFramework::Autogen, Arc::new(EchoInputs)),
        );
        let mut inputs = ResolvedInputs::new();
        inputs.insert("b".into(), json!(1));
        inputs.insert("a".into(), json!("two"));

        let outcome = dispatcher.dispatch(&wf.nodes[0], &inputs, &wf).await;
        assert_eq!(outcome.route, Route::Model(ModelFramework::Autogen));
        assert_eq!(outcome.result.unwrap(), r#"{"b":1,"a":"two"}"#);
    }

    #[tokio::test]
    async fn handler_errors_are_returned_not_raised() {
        let wf = workflow(json!({
            "nodes": [ { "id": "hf", "data": { "framework": "huggingface", "max_length": "many" } } ]
        }));
        let outcome = NodeDispatcher::default()
            .dispatch(&wf.nodes[0], &ResolvedInputs::new(), &wf)
            .await;
        assert!(matches!(outcome.result, Err(HandlerError::InvalidField { .. })));
    }

    #[tokio::test]
    async fn unregistered_framework_fails_the_node() {
        let wf = workflow(json!({
            "nodes": [ { "id": "q", "data": { "framework": "llamaindex", "query": "docs?" } } ]
        }));
        let dispatcher =
            NodeDispatcher::new(HandlerRegistry::builtin().without_handler(ModelFramework::LlamaIndex));
        let outcome = dispatcher.dispatch(&wf.nodes[0], &ResolvedInputs::new(), &wf).await;
        assert_eq!(outcome.route, Route::Model(ModelFramework::LlamaIndex));
        assert_eq!(
            outcome.result,
            Err(HandlerError::Failed(
                "no handler registered for framework 'llamaindex'".to_string()
            ))
        );
    }
}
