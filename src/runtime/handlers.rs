/// Node handler capabilities
///
/// One handler per model-backed framework plus the crew agent-task handler.
/// The built-in handlers simulate their framework: they read the node's
/// attributes, validate them and compose a textual response, without calling
/// any third-party service.

use crate::runtime::inputs::ResolvedInputs;
use crate::workflow::types::Attributes;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a handler; contained to the node that raised it
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HandlerError {
    #[error("invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },
    #[error("{0}")]
    Failed(String),
}

/// Model-backed frameworks that own a handler capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFramework {
    HuggingFace,
    LlamaIndex,
    Autogen,
    OpenRouter,
}

impl ModelFramework {
    pub const ALL: [ModelFramework; 4] = [
        ModelFramework::HuggingFace,
        ModelFramework::LlamaIndex,
        ModelFramework::Autogen,
        ModelFramework::OpenRouter,
    ];

    /// Framework tag as written in node data
    pub fn tag(self) -> &'static str {
        match self {
            Self::HuggingFace => "huggingface",
            Self::LlamaIndex => "llamaindex",
            Self::Autogen => "autogen",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Name used in progress transcripts
    pub fn display_name(self) -> &'static str {
        match self {
            Self::HuggingFace => "HuggingFace",
            Self::LlamaIndex => "LlamaIndex",
            Self::Autogen => "Autogen",
            Self::OpenRouter => "OpenRouter",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|framework| framework.tag() == tag)
    }
}

/// Handler for a single node; receives the node's attributes merged with its
/// resolved inputs under the `inputs` key
#[async_trait]
pub trait NodeHandler: Send + Sync {
    async fn run(&self, attributes: &Attributes) -> Result<String, HandlerError>;
}

/// Handler for a crew task executed by its assigned agent
#[async_trait]
pub trait AgentTaskHandler: Send + Sync {
    async fn run_task(
        &self,
        agent: &Attributes,
        task: &Attributes,
        inputs: &ResolvedInputs,
    ) -> Result<String, HandlerError>;
}

/// Capability lookup table: framework variant -> handler
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<ModelFramework, Arc<dyn NodeHandler>>,
    crew: Arc<dyn AgentTaskHandler>,
}

impl HandlerRegistry {
    /// Registry wired with the built-in simulated handlers
    pub fn builtin() -> Self {
        let mut handlers: HashMap<ModelFramework, Arc<dyn NodeHandler>> = HashMap::new();
        handlers.insert(ModelFramework::HuggingFace, Arc::new(HuggingFaceHandler));
        handlers.insert(ModelFramework::LlamaIndex, Arc::new(LlamaIndexHandler));
        handlers.insert(ModelFramework::Autogen, Arc::new(AutogenHandler));
        handlers.insert(ModelFramework::OpenRouter, Arc::new(OpenRouterHandler));
        Self {
            handlers,
            crew: Arc::new(CrewTaskHandler),
        }
    }

    /// Replace the handler for one framework
    pub fn with_handler(mut self, framework: ModelFramework, handler: Arc<dyn NodeHandler>) -> Self {
        self.handlers.insert(framework, handler);
        self
    }

    /// Replace the crew agent-task handler
    pub fn with_crew_handler(mut self, handler: Arc<dyn AgentTaskHandler>) -> Self {
        self.crew = handler;
        self
    }

    /// Drop the handler for one framework; its nodes then fail at dispatch
    /// with a "no handler registered" error
    pub fn without_handler(mut self, framework: ModelFramework) -> Self {
        self.handlers.remove(&framework);
        self
    }

    pub fn handler(&self, framework: ModelFramework) -> Option<&Arc<dyn NodeHandler>> {
        self.handlers.get(&framework)
    }

    pub fn crew(&self) -> &Arc<dyn AgentTaskHandler> {
        &self.crew
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut frameworks: Vec<&str> = self.handlers.keys().map(|framework| framework.tag()).collect();
        frameworks.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("frameworks", &frameworks)
            .finish_non_exhaustive()
    }
}

/// String attribute, or `default` when absent
fn text_field(attributes: &Attributes, field: &str, default: &str) -> String {
    match attributes.get(field) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Integer attribute given as a number or numeric string
fn integer_field(attributes: &Attributes, field: &str, default: i64) -> Result<i64, HandlerError> {
    let invalid = |reason: String| HandlerError::InvalidField {
        field: field.to_string(),
        reason,
    };
    match attributes.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64))
            .ok_or_else(|| invalid(format!("{number} is not an integer"))),
        Some(Value::String(text)) => text
            .trim()
            .parse::<i64>()
            .map_err(|e| invalid(format!("'{text}': {e}"))),
        Some(other) => Err(invalid(format!("expected an integer, got {other}"))),
    }
}

/// Float attribute given as a number or numeric string
fn float_field(attributes: &Attributes, field: &str, default: f64) -> Result<f64, HandlerError> {
    let invalid = |reason: String| HandlerError::InvalidField {
        field: field.to_string(),
        reason,
    };
    match attributes.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| invalid(format!("{number} is not a number"))),
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(format!("'{text}': {e}"))),
        Some(other) => Err(invalid(format!("expected a number, got {other}"))),
    }
}

/// Render an input value the way transcripts show it
fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn resolved_inputs(attributes: &Attributes) -> Option<&serde_json::Map<String, Value>> {
    attributes.get("inputs").and_then(Value::as_object)
}

/// Simulated HuggingFace text generation
#[derive(Debug, Default)]
pub struct HuggingFaceHandler;

#[async_trait]
impl NodeHandler for HuggingFaceHandler {
    async fn run(&self, attributes: &Attributes) -> Result<String, HandlerError> {
        let model = text_field(attributes, "model", "gpt2");
        let prompt = text_field(attributes, "prompt", "Hello world");
        let max_length = integer_field(attributes, "max_length", 50)?;

        tracing::debug!("🤗 HuggingFace model={} max_length={}", model, max_length);
        Ok(format!(
            "[Simulated] HuggingFace model {model} response to: '{prompt}' (max length: {max_length})"
        ))
    }
}

/// Simulated LlamaIndex query
#[derive(Debug, Default)]
pub struct LlamaIndexHandler;

#[async_trait]
impl NodeHandler for LlamaIndexHandler {
    async fn run(&self, attributes: &Attributes) -> Result<String, HandlerError> {
        let query = text_field(attributes, "query", "What is Opsyde?");
        Ok(format!("[Simulated] LlamaIndex queried: '{query}'"))
    }
}

/// Simulated Autogen agent reply
#[derive(Debug, Default)]
pub struct AutogenHandler;

#[async_trait]
impl NodeHandler for AutogenHandler {
    async fn run(&self, attributes: &Attributes) -> Result<String, HandlerError> {
        let input = text_field(attributes, "input", "Default message");
        Ok(format!("[Simulated] Autogen agent responded to: '{input}'"))
    }
}

/// OpenRouter chat completion, composed but not sent
///
/// Builds the exact prompt and sampling parameters a completion request would
/// carry and returns them as the simulated response.
#[derive(Debug, Default)]
pub struct OpenRouterHandler;

impl OpenRouterHandler {
    /// Prompt text: explicit `prompt`, else derived from label and description,
    /// followed by the resolved inputs
    pub fn compose_prompt(attributes: &Attributes) -> String {
        let mut prompt = text_field(attributes, "prompt", "");
        if prompt.is_empty() {
            let label = text_field(attributes, "label", "Tool");
            let description = text_field(attributes, "description", "");
            prompt = format!("Execute the tool '{label}': {description}");
        }

        if let Some(inputs) = resolved_inputs(attributes).filter(|inputs| !inputs.is_empty()) {
            prompt.push_str("\n\nInputs:\n");
            for (key, value) in inputs {
                let _ = writeln!(prompt, "- {key}: {}", render_value(value));
            }
        }
        prompt
    }
}

#[async_trait]
impl NodeHandler for OpenRouterHandler {
    async fn run(&self, attributes: &Attributes) -> Result<String, HandlerError> {
        let model = text_field(attributes, "model", "mistralai/mistral-7b-instruct");
        let temperature = float_field(attributes, "temperature", 0.7)?;
        let max_tokens = integer_field(attributes, "max_tokens", 1000)?;
        let prompt = Self::compose_prompt(attributes);

        tracing::info!(
            "🛰️ OpenRouter request: model={}, temperature={}, max_tokens={}",
            model,
            temperature,
            max_tokens
        );
        Ok(format!(
            "[Simulated] OpenRouter model {model} (temperature {temperature}, max tokens {max_tokens}) received:\n{prompt}"
        ))
    }
}

/// Simulated crew agent working through a task
#[derive(Debug, Default)]
pub struct CrewTaskHandler;

#[async_trait]
impl AgentTaskHandler for CrewTaskHandler {
    async fn run_task(
        &self,
        agent: &Attributes,
        task: &Attributes,
        inputs: &ResolvedInputs,
    ) -> Result<String, HandlerError> {
        let agent_name = text_field(agent, "label", "Unknown Agent");
        let agent_role = text_field(agent, "role", "Assistant");
        let agent_goal = text_field(agent, "goal", "Help with tasks");

        let task_name = text_field(task, "label", "Unknown Task");
        let task_description = text_field(task, "description", "Perform a task");
        let expected_output = text_field(task, "expectedOutput", "Task result");

        tracing::info!("🧑‍💼 Agent '{}' ({}) executing task '{}'", agent_name, agent_role, task_name);
        tracing::debug!("📝 Task description: {}", task_description);
        tracing::debug!("📥 Task inputs: {:?}", inputs);

        let mut result = format!(
            "Agent '{agent_name}' ({agent_role}) completed task '{task_name}' with the following result:\n"
        );
        let _ = writeln!(
            result,
            "Based on the goal '{agent_goal}', I've analyzed the task '{task_description}'."
        );
        if !inputs.is_empty() {
            result.push_str("Using the provided inputs:\n");
            for (key, value) in inputs {
                let _ = writeln!(result, "- {key}: {}", render_value(value));
            }
        }
        let _ = writeln!(result, "\nTask result: {expected_output}");
        Ok(result)
    }
}
