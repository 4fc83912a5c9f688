//! # workspace-agent
//!
//! Rust SDK for building conversational Google Workspace agents.
//!
//! This crate wraps Google Calendar, Google Tasks, and Gmail behind a
//! tool-calling Gemini loop: the model reads the conversation, decides whether
//! to invoke a tool or answer, tool results are appended back into the
//! conversation, and the model is asked again until it produces a final
//! natural-language reply.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use workspace_agent::{Agent, AgentKind, Conversation};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), workspace_agent::Error> {
//!     let agent = Agent::builder()
//!         .kind(AgentKind::Tasks)
//!         .build()?;
//!
//!     let mut conversation = Conversation::with_system(agent.system_prompt());
//!     let turn = agent.ask(&mut conversation, "tạo task 'mua sữa' hạn 2025-08-20").await?;
//!     println!("{}", turn.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Custom tools
//!
//! Any type implementing [`tools::Tool`] (or the typed, schema-derived
//! [`tools::TypedTool`]) can be registered; the built-in Calendar, Tasks, and
//! Gmail tool sets are thin wrappers over the Google REST APIs sharing one
//! authenticated [`google::GoogleClient`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod agent;
pub mod client;
pub mod google;
pub mod prompts;
pub mod session;
pub mod tools;
pub mod types;

// Re-exports for convenience
pub use agent::{
    Agent, AgentBuilder, AgentConfig, AgentEvent, AgentKind, Decision, Executor, Reasoner,
    TurnOutcome, TurnResult,
};
pub use client::{GeminiClient, GeminiClientBuilder};
pub use google::{AccessTokenProvider, GoogleClient, OAuthTokenCache, StaticTokenProvider};
pub use session::SessionStore;
pub use tools::{Tool, ToolRegistry, ToolRegistryBuilder, TypedTool};
pub use types::{
    Conversation, FailureKind, FinishReason, Message, ModelResponse, Role, ToolCall,
    ToolDefinition, ToolFailure, ToolResult, Usage,
};

/// Error type for workspace-agent operations.
///
/// Only loop-level failures live here. A failing *tool* is not an error — it
/// is folded into the conversation as a failed tool result so the model gets
/// a chance to recover (see [`types::ToolFailure`]).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Model API returned an error response.
    #[error("API error (HTTP {status}): {message}", status = status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".into()))]
    Api {
        message: String,
        status: Option<u16>,
    },

    /// Authentication or token refresh failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Network connectivity or request failed.
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The model returned something that is neither a clean answer nor a
    /// well-formed set of tool calls.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system operation failed (token cache).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation exceeded timeout.
    #[error("Operation timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(std::time::Duration),

    /// The turn was cancelled by the caller.
    #[error("Turn cancelled")]
    Cancelled,
}

impl Error {
    /// Reasoner-level failures abort the turn; everything else in this enum
    /// does too, but callers sometimes want to distinguish transient ones.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Timeout(_) | Error::Api { status: Some(500..=599), .. }
        )
    }
}

/// Result type alias for workspace-agent operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::Timeout(std::time::Duration::from_secs(5)).is_transient());
        assert!(
            Error::Api {
                message: "overloaded".into(),
                status: Some(503),
            }
            .is_transient()
        );
        assert!(!Error::Config("bad".into()).is_transient());
        assert!(!Error::Cancelled.is_transient());
    }
}
