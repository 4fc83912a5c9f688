//! Tool trait definitions and the registry.
//!
//! A registry is a fixed, named collection of callable operations built once
//! at startup; construction fails if two tools share a name, and nothing can
//! be registered afterwards.

pub mod calendar;
pub mod gmail;
pub mod tasks;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::types::{ToolDefinition, ToolFailure, ToolResult};
use crate::{Error, Result};

pub use calendar::calendar_tools;
pub use gmail::gmail_tools;
pub use tasks::tasks_tools;

/// Core tool trait for all tool implementations.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> serde_json::Value;
    async fn execute(&self, input: serde_json::Value) -> ToolResult;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Schema-based tool trait with automatic JSON schema generation.
///
/// Provides a higher-level abstraction over `Tool` with typed inputs and
/// schema derivation via schemars; an input that fails to decode becomes an
/// `InvalidInput` failure rather than a panic or an aborted batch.
#[async_trait]
pub trait TypedTool: Send + Sync {
    type Input: JsonSchema + DeserializeOwned + Send;
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    async fn handle(&self, input: Self::Input) -> ToolResult;

    fn input_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(Self::Input);
        let mut value =
            serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}));

        if let Some(obj) = value.as_object_mut()
            && !obj.contains_key("properties")
        {
            obj.insert(
                "properties".to_string(),
                serde_json::Value::Object(serde_json::Map::new()),
            );
        }

        value
    }
}

#[async_trait]
impl<T: TypedTool + 'static> Tool for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn description(&self) -> &str {
        T::DESCRIPTION
    }

    fn input_schema(&self) -> serde_json::Value {
        T::input_schema()
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        match serde_json::from_value::<T::Input>(input) {
            Ok(typed) => TypedTool::handle(self, typed).await,
            Err(e) => ToolResult::failure(ToolFailure::invalid_input(format!(
                "Invalid input for {}: {}",
                T::NAME,
                e
            ))),
        }
    }
}

/// Registry of available tools. Immutable after construction.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Definitions in registration order, so the model sees a stable listing.
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Build a registry from a fixed list, failing on duplicate names.
    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Result<Self> {
        let mut builder = ToolRegistryBuilder::default();
        for tool in tools {
            builder = builder.register(tool);
        }
        builder.build()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Builder for [`ToolRegistry`]; duplicate names surface at [`build`](Self::build).
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn register_all(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn build(self) -> Result<ToolRegistry> {
        let mut map: HashMap<String, Arc<dyn Tool>> = HashMap::with_capacity(self.tools.len());
        let mut definitions = Vec::with_capacity(self.tools.len());

        for tool in self.tools {
            let name = tool.name().to_string();
            if map.contains_key(&name) {
                return Err(Error::Config(format!(
                    "duplicate tool name in registry: {name}"
                )));
            }
            definitions.push(tool.definition());
            map.insert(name, tool);
        }

        Ok(ToolRegistry {
            tools: map,
            definitions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FailureKind;
    use schemars::JsonSchema;
    use serde::Deserialize;

    struct EchoTool;

    #[derive(Deserialize, JsonSchema)]
    struct EchoInput {
        text: String,
    }

    #[async_trait]
    impl TypedTool for EchoTool {
        type Input = EchoInput;
        const NAME: &'static str = "echo";
        const DESCRIPTION: &'static str = "Echo the given text back.";

        async fn handle(&self, input: EchoInput) -> ToolResult {
            ToolResult::success(input.text)
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = ToolRegistry::builder()
            .register(Arc::new(EchoTool))
            .register(Arc::new(EchoTool))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_definitions_preserve_registration_order() {
        let registry = ToolRegistry::builder()
            .register(Arc::new(EchoTool))
            .build()
            .unwrap();
        assert_eq!(registry.names(), vec!["echo"]);
        assert!(registry.contains("echo"));
        assert!(!registry.contains("list_tasks"));
    }

    #[tokio::test]
    async fn test_typed_tool_rejects_bad_input() {
        let tool = EchoTool;
        let result = Tool::execute(&tool, serde_json::json!({"text": 5})).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::InvalidInput));
    }

    #[tokio::test]
    async fn test_typed_tool_happy_path() {
        let tool = EchoTool;
        let result = Tool::execute(&tool, serde_json::json!({"text": "xin chào"})).await;
        assert_eq!(result.text(), "xin chào");
    }

    #[test]
    fn test_schema_has_properties() {
        let schema = <EchoTool as TypedTool>::input_schema();
        assert!(schema["properties"]["text"].is_object());
    }
}
