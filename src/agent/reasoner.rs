//! The Reasoner seam: one model call in, one decision out.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::client::GeminiClient;
use crate::types::{Conversation, ToolCall, ToolDefinition, Usage};

/// The model's per-step output.
///
/// The rule is strict: a decision is `Act` if and only if the response
/// explicitly requests at least one tool call. Anything else — including
/// empty or garbled text — is `Final` with whatever text came back.
#[derive(Debug, Clone)]
pub enum Decision {
    /// The agent is done; `text` is shown to the user.
    Final { text: String, usage: Usage },
    /// Execute these calls in order, append their results, then decide again.
    Act {
        /// Any text the model emitted alongside the calls (often empty).
        text: String,
        calls: Vec<ToolCall>,
        usage: Usage,
    },
}

/// Asks the external model what to do next.
///
/// Exactly one model call per `decide`; no retries. The entire conversation
/// (including earlier tool results) and the registry's schemas go out
/// verbatim. A failed call is a turn-level error, not a tool failure.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn decide(
        &self,
        conversation: &Conversation,
        tools: &[ToolDefinition],
    ) -> Result<Decision>;
}

/// Production reasoner backed by the Gemini API.
pub struct GeminiReasoner {
    client: Arc<GeminiClient>,
}

impl GeminiReasoner {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<GeminiClient> {
        &self.client
    }
}

#[async_trait]
impl Reasoner for GeminiReasoner {
    async fn decide(
        &self,
        conversation: &Conversation,
        tools: &[ToolDefinition],
    ) -> Result<Decision> {
        let response = self.client.generate(conversation, tools).await?;
        if response.wants_tool_calls() {
            Ok(Decision::Act {
                text: response.text,
                calls: response.tool_calls,
                usage: response.usage,
            })
        } else {
            Ok(Decision::Final {
                text: response.text,
                usage: response.usage,
            })
        }
    }
}
