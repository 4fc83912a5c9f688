//! Test helper types for agent tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::agent::{Agent, Decision, Reasoner};
use crate::tools::{Tool, ToolRegistry};
use crate::types::{Conversation, ToolDefinition, ToolFailure, ToolResult, Usage};

/// Replays a fixed sequence of decisions (or failures), one per `decide`.
pub struct ScriptedReasoner {
    script: std::sync::Mutex<VecDeque<crate::Result<Decision>>>,
    pub calls: AtomicUsize,
}

impl ScriptedReasoner {
    pub fn new(script: Vec<crate::Result<Decision>>) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn final_text(text: &str) -> Self {
        Self::new(vec![Ok(Decision::Final {
            text: text.to_string(),
            usage: Usage::default(),
        })])
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn decide(
        &self,
        _conversation: &Conversation,
        _tools: &[ToolDefinition],
    ) -> crate::Result<Decision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(crate::Error::MalformedResponse(
                    "scripted reasoner exhausted".into(),
                ))
            })
    }
}

/// A pathological reasoner that requests the same tool call forever.
pub struct AlwaysActReasoner {
    tool: String,
    pub calls: Arc<AtomicUsize>,
}

impl AlwaysActReasoner {
    pub fn new(tool: &str) -> Self {
        Self {
            tool: tool.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Reasoner for AlwaysActReasoner {
    async fn decide(
        &self,
        _conversation: &Conversation,
        _tools: &[ToolDefinition],
    ) -> crate::Result<Decision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Decision::Act {
            text: String::new(),
            calls: vec![crate::types::ToolCall::new(
                self.tool.clone(),
                serde_json::json!({}),
            )],
            usage: Usage::default(),
        })
    }
}

/// A tool with a fixed result, an invocation counter, and an optional delay
/// for exercising completion-order independence.
pub struct StaticTool {
    name: String,
    result: ToolResult,
    delay: Option<Duration>,
    pub invocations: Arc<AtomicUsize>,
}

impl StaticTool {
    pub fn ok(name: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            result: ToolResult::success(content),
            delay: None,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(name: &str, failure: ToolFailure) -> Self {
        Self {
            name: name.to_string(),
            result: ToolResult::failure(failure),
            delay: None,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Static tool for testing"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _input: serde_json::Value) -> ToolResult {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

pub fn registry_of(tools: Vec<Arc<dyn Tool>>) -> Arc<ToolRegistry> {
    Arc::new(ToolRegistry::from_tools(tools).expect("test registry"))
}

pub fn agent_with(reasoner: Arc<dyn Reasoner>, registry: Arc<ToolRegistry>) -> Agent {
    Agent::builder()
        .reasoner(reasoner)
        .registry(registry)
        .build()
        .expect("test agent")
}
