//! The agent turn loop.
//!
//! A strictly sequential alternation: ask the Reasoner, and either return its
//! final answer or execute the requested batch, append the results, and ask
//! again. A round bound guarantees termination when the model keeps acting.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::types::{Conversation, Message, Role, Usage};
use crate::{Error, Result};

use super::config::AgentConfig;
use super::events::{AgentEvent, TurnOutcome, TurnResult};
use super::executor::Executor;
use super::reasoner::{Decision, Reasoner};

/// A configured conversational agent.
///
/// Holds no conversation state of its own: the caller owns the
/// [`Conversation`] and hands it in per turn; concurrent sessions each bring
/// their own instance while sharing one agent.
pub struct Agent {
    pub(crate) reasoner: std::sync::Arc<dyn Reasoner>,
    pub(crate) executor: Executor,
    pub(crate) config: AgentConfig,
    pub(crate) system_prompt: String,
}

impl Agent {
    pub fn builder() -> super::builder::AgentBuilder {
        super::builder::AgentBuilder::new()
    }

    /// Builder preset for the Calendar agent.
    pub fn calendar() -> super::builder::AgentBuilder {
        Self::builder().kind(super::config::AgentKind::Calendar)
    }

    /// Builder preset for the Tasks agent.
    pub fn tasks() -> super::builder::AgentBuilder {
        Self::builder().kind(super::config::AgentKind::Tasks)
    }

    /// Builder preset for the Gmail agent.
    pub fn gmail() -> super::builder::AgentBuilder {
        Self::builder().kind(super::config::AgentKind::Gmail)
    }

    /// The system prompt this agent was built with; seed conversations with
    /// [`Conversation::with_system`].
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &std::sync::Arc<crate::tools::ToolRegistry> {
        self.executor.registry()
    }

    /// Append a user message and run the turn.
    pub async fn ask(
        &self,
        conversation: &mut Conversation,
        text: impl Into<String>,
    ) -> Result<TurnResult> {
        conversation.push_user(text.into());
        self.run_turn(conversation).await
    }

    /// Run one turn over a conversation that already ends in a non-assistant
    /// message. On success the final assistant message has been appended; on
    /// error the conversation is exactly as it was before the failing model
    /// call.
    pub async fn run_turn(&self, conversation: &mut Conversation) -> Result<TurnResult> {
        self.run_turn_inner(conversation, CancellationToken::new(), None)
            .await
    }

    /// Like [`run_turn`](Self::run_turn), checking the token at loop-state
    /// boundaries: cancellation takes effect before the next model call.
    pub async fn run_turn_cancellable(
        &self,
        conversation: &mut Conversation,
        cancel: CancellationToken,
    ) -> Result<TurnResult> {
        self.run_turn_inner(conversation, cancel, None).await
    }

    /// Like [`run_turn`](Self::run_turn), pushing per-step [`AgentEvent`]s to
    /// the given channel. A closed receiver does not fail the turn.
    pub async fn run_turn_with_events(
        &self,
        conversation: &mut Conversation,
        events: mpsc::UnboundedSender<AgentEvent>,
    ) -> Result<TurnResult> {
        self.run_turn_inner(conversation, CancellationToken::new(), Some(&events))
            .await
    }

    #[instrument(skip_all, fields(messages = conversation.len(), max_rounds = self.config.max_rounds))]
    async fn run_turn_inner(
        &self,
        conversation: &mut Conversation,
        cancel: CancellationToken,
        events: Option<&mpsc::UnboundedSender<AgentEvent>>,
    ) -> Result<TurnResult> {
        match conversation.last() {
            None => {
                return Err(Error::Config(
                    "conversation has no message to answer".into(),
                ));
            }
            Some(last) if last.role() == Role::Assistant => {
                return Err(Error::Config(
                    "conversation already ends with an assistant message".into(),
                ));
            }
            Some(_) => {}
        }

        let definitions = self.executor.registry().definitions();
        let mut usage = Usage::default();
        let mut tool_calls_made = 0usize;

        for round in 1..=self.config.max_rounds {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            send_event(
                events,
                AgentEvent::RoundStarted {
                    round,
                    max_rounds: self.config.max_rounds,
                },
            );

            let decision = match tokio::time::timeout(
                self.config.reasoner_timeout,
                self.reasoner.decide(conversation, definitions),
            )
            .await
            {
                Ok(decision) => decision?,
                Err(_) => return Err(Error::Timeout(self.config.reasoner_timeout)),
            };

            match decision {
                Decision::Final {
                    text,
                    usage: round_usage,
                } => {
                    usage.add(&round_usage);
                    conversation.push(Message::assistant(text.clone()));
                    send_event(events, AgentEvent::Final { text: text.clone() });
                    info!(
                        rounds = round,
                        tool_calls = tool_calls_made,
                        tokens = usage.total(),
                        "Turn completed"
                    );
                    return Ok(TurnResult {
                        text,
                        outcome: TurnOutcome::Completed,
                        rounds: round,
                        tool_calls: tool_calls_made,
                        usage,
                    });
                }
                Decision::Act {
                    text,
                    calls,
                    usage: round_usage,
                } => {
                    usage.add(&round_usage);
                    debug!(round, calls = calls.len(), "Executing tool batch");
                    for call in &calls {
                        send_event(
                            events,
                            AgentEvent::ToolStarted {
                                id: call.id.clone(),
                                name: call.name.clone(),
                            },
                        );
                    }
                    conversation.push(Message::assistant_with_calls(text, calls.clone()));

                    let results = self.executor.run(&calls).await;
                    tool_calls_made += results.len();
                    for result in results {
                        if let Message::ToolResult {
                            call_id,
                            tool_name,
                            result: outcome,
                        } = &result
                        {
                            send_event(
                                events,
                                AgentEvent::ToolFinished {
                                    id: call_id.clone(),
                                    name: tool_name.clone(),
                                    is_error: outcome.is_error(),
                                },
                            );
                        }
                        conversation.push(result);
                    }
                }
            }
        }

        warn!(
            max_rounds = self.config.max_rounds,
            "Round bound exceeded, ending turn"
        );
        let text = format!(
            "Could not complete the request: the agent hit the limit of {} tool rounds. \
             Try again with a more specific request.",
            self.config.max_rounds
        );
        conversation.push(Message::assistant(text.clone()));
        send_event(events, AgentEvent::Final { text: text.clone() });
        Ok(TurnResult {
            text,
            outcome: TurnOutcome::StepLimit,
            rounds: self.config.max_rounds,
            tool_calls: tool_calls_made,
            usage,
        })
    }
}

fn send_event(events: Option<&mpsc::UnboundedSender<AgentEvent>>, event: AgentEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
