//! Conversation message types.

use serde::{Deserialize, Serialize};

use super::tool::{ToolCall, ToolResult};

/// Role of a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    ToolResult,
}

/// A single turn in a conversation.
///
/// Assistant messages may carry requested tool calls; a `ToolResult` message
/// answers exactly one earlier call by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    ToolResult {
        /// Id of the invocation this message answers.
        call_id: String,
        /// Name of the tool that produced the result (needed to render a
        /// `functionResponse` on the Gemini wire).
        tool_name: String,
        result: ToolResult,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Assistant message that decided to act.
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        result: ToolResult,
    ) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            result,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::ToolResult { .. } => Role::ToolResult,
        }
    }

    /// Text content of the message; for tool results, the rendered payload.
    pub fn text(&self) -> &str {
        match self {
            Self::System { content } | Self::User { content } | Self::Assistant { content, .. } => {
                content
            }
            Self::ToolResult { result, .. } => result.text(),
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }
}

/// An append-only, ordered sequence of messages.
///
/// Owned by the caller (a CLI session, a request handler, a session store);
/// the agent loop only appends to the instance it is given and never retains
/// a reference after returning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation with a system prompt.
    pub fn with_system(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Text of the last assistant message, if any.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }

    /// Tool calls that have no matching tool-result message yet, in order.
    ///
    /// Empty at every loop-state boundary of a well-behaved turn; non-empty
    /// only mid-execution or after an aborted turn.
    pub fn unanswered_calls(&self) -> Vec<&ToolCall> {
        let answered: std::collections::HashSet<&str> = self
            .messages
            .iter()
            .filter_map(|m| match m {
                Message::ToolResult { call_id, .. } => Some(call_id.as_str()),
                _ => None,
            })
            .collect();

        self.messages
            .iter()
            .flat_map(|m| m.tool_calls())
            .filter(|call| !answered.contains(call.id.as_str()))
            .collect()
    }
}
