//! Core data types shared across the client, the tools, and the agent loop.

mod message;
mod response;
mod tool;

pub use message::{Conversation, Message, Role};
pub use response::{FinishReason, ModelResponse, Usage};
pub use tool::{FailureKind, ToolCall, ToolDefinition, ToolFailure, ToolResult};
