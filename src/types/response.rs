//! Model response types.

use serde::{Deserialize, Serialize};

use super::tool::ToolCall;

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    #[serde(other)]
    Other,
}

/// Token usage reported by the model API.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }

    pub fn add(&mut self, other: &Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }
}

/// Parsed model response: text, requested tool calls, or both.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// Concatenated text parts (may be empty when the model only acts).
    pub text: String,
    /// Requested tool calls, in wire order, each with a minted id.
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

impl ModelResponse {
    /// The decision rule: the response is an action if and only if it
    /// explicitly requests at least one tool call.
    pub fn wants_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
