//! The agent core: reasoner, executor, and the turn loop that ties them
//! together over a caller-owned conversation.

mod builder;
mod config;
mod events;
mod execution;
mod executor;
mod reasoner;

#[cfg(test)]
mod tests;

pub use builder::AgentBuilder;
pub use config::{AgentConfig, AgentKind, DEFAULT_MAX_ROUNDS};
pub use events::{AgentEvent, TurnOutcome, TurnResult};
pub use execution::Agent;
pub use executor::Executor;
pub use reasoner::{Decision, GeminiReasoner, Reasoner};
