//! Tool-related types: definitions, requested calls, and execution results.

use serde::{Deserialize, Serialize};

/// Definition of a tool as the model sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (unique within a registry).
    pub name: String,
    /// Tool description, written for the model.
    pub description: String,
    /// JSON Schema for the input parameters.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// One requested tool invocation.
///
/// The Gemini wire format carries no call identifiers, so the client mints a
/// UUID per parsed `functionCall`; the id ties the eventual tool-result
/// message back to this call inside the [`Conversation`](super::Conversation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this invocation.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Argument object for the tool.
    pub args: serde_json::Value,
}

impl ToolCall {
    /// Create a call with a freshly minted id.
    pub fn new(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            args,
        }
    }

    /// Create a call with an explicit id (tests, replay).
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        args: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

/// Outcome of executing one tool call.
///
/// The loop branches on this discriminant; the text inside is what the model
/// gets to read. Tool failures are data, never crate-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    /// Successful result with preformatted, human-readable content.
    Success { content: String },
    /// The call failed; the descriptor says how.
    Failure(ToolFailure),
}

/// Classification of a tool failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The requested tool name is not in the registry.
    UnknownTool,
    /// The remote resource does not exist (HTTP 404).
    NotFound,
    /// The arguments did not decode or validate.
    InvalidInput,
    /// The underlying API call failed.
    Api,
    /// The call exceeded its timeout.
    Timeout,
}

/// A failed tool invocation: kind plus a message specific enough for the
/// model to decide whether to retry with corrected arguments or report back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ToolFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(FailureKind::UnknownTool, format!("Unknown tool: {name}"))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidInput, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Api, message)
    }

    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("Tool call timed out after {:.1}s", duration.as_secs_f64()),
        )
    }
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self::Success {
            content: content.into(),
        }
    }

    pub fn failure(failure: ToolFailure) -> Self {
        Self::Failure(failure)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// The text rendered into the conversation for the model.
    pub fn text(&self) -> &str {
        match self {
            Self::Success { content } => content,
            Self::Failure(failure) => &failure.message,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(failure) => Some(failure.kind),
        }
    }
}

impl<E: std::fmt::Display> From<std::result::Result<String, E>> for ToolResult {
    fn from(result: std::result::Result<String, E>) -> Self {
        match result {
            Ok(content) => Self::success(content),
            Err(e) => Self::failure(ToolFailure::api(e.to_string())),
        }
    }
}
