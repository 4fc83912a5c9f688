//! Agent configuration and the built-in agent kinds.

use std::sync::Arc;
use std::time::Duration;

use crate::google::GoogleClient;
use crate::tools::{Tool, calendar_tools, gmail_tools, tasks_tools};

/// Default bound on Reasoner↔Executor round-trips per user turn.
pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// Execution settings for one agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model name passed to the Gemini API.
    pub model: String,
    pub temperature: f32,
    /// Maximum Reasoner↔Executor round-trips per turn. The turn ends with
    /// [`TurnOutcome::StepLimit`](super::TurnOutcome::StepLimit) when hit.
    pub max_rounds: usize,
    /// Timeout for one model call; hitting it aborts the turn.
    pub reasoner_timeout: Duration,
    /// Timeout for one tool call; hitting it fails that invocation only.
    pub tool_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: crate::client::DEFAULT_MODEL.to_string(),
            temperature: crate::client::DEFAULT_TEMPERATURE,
            max_rounds: DEFAULT_MAX_ROUNDS,
            reasoner_timeout: Duration::from_secs(60),
            tool_timeout: Duration::from_secs(30),
        }
    }
}

/// The specialized agents this crate ships, one per Google service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Calendar,
    Tasks,
    Gmail,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Tasks => "tasks",
            Self::Gmail => "gmail",
        }
    }

    /// The tool set for this kind, sharing the given client handle.
    pub fn tools(&self, google: &Arc<GoogleClient>) -> Vec<Arc<dyn Tool>> {
        match self {
            Self::Calendar => calendar_tools(google),
            Self::Tasks => tasks_tools(google),
            Self::Gmail => gmail_tools(google),
        }
    }

    /// Default system prompt for this kind, stamped with the current time.
    pub fn system_prompt(&self) -> String {
        crate::prompts::system_prompt(*self, crate::prompts::now_vietnam())
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
