//! Agent events and turn result types.

use crate::types::Usage;

/// Events emitted during a turn when the caller asked for them.
///
/// A convenience surface for UIs; the loop semantics do not depend on anyone
/// listening.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    RoundStarted {
        round: usize,
        max_rounds: usize,
    },
    ToolStarted {
        id: String,
        name: String,
    },
    ToolFinished {
        id: String,
        name: String,
        is_error: bool,
    },
    Final {
        text: String,
    },
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model produced a final answer.
    Completed,
    /// The round bound was hit; the final text is a synthesized report and
    /// the conversation keeps every partial message for diagnosability.
    StepLimit,
}

/// Result of one user-message-to-final-answer cycle.
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// The final assistant text, also appended to the conversation.
    pub text: String,
    pub outcome: TurnOutcome,
    /// Reasoner rounds used (1 for a direct answer).
    pub rounds: usize,
    /// Tool invocations executed across all rounds.
    pub tool_calls: usize,
    pub usage: Usage,
}

impl TurnResult {
    pub fn completed(&self) -> bool {
        self.outcome == TurnOutcome::Completed
    }
}
