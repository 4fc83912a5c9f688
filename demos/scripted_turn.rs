//! Offline walkthrough of the turn loop: a scripted reasoner and a canned
//! tool, no network or credentials needed.
//!
//! Run with: `cargo run --example scripted_turn`

use std::sync::Arc;

use async_trait::async_trait;

use workspace_agent::tools::{Tool, ToolRegistry};
use workspace_agent::types::{
    Conversation, ToolCall, ToolDefinition, ToolResult as ToolOutcome, Usage,
};
use workspace_agent::{Agent, AgentEvent, Decision, Reasoner};

/// First asks for the task list, then answers.
struct TwoStepReasoner;

#[async_trait]
impl Reasoner for TwoStepReasoner {
    async fn decide(
        &self,
        conversation: &Conversation,
        _tools: &[ToolDefinition],
    ) -> workspace_agent::Result<Decision> {
        let seen_tool_result = conversation
            .messages()
            .iter()
            .any(|m| m.role() == workspace_agent::Role::ToolResult);
        if seen_tool_result {
            Ok(Decision::Final {
                text: "Bạn có 1 công việc: 'mua sữa' (hạn 2025-08-20).".into(),
                usage: Usage::default(),
            })
        } else {
            Ok(Decision::Act {
                text: String::new(),
                calls: vec![ToolCall::new("list_tasks", serde_json::json!({}))],
                usage: Usage::default(),
            })
        }
    }
}

struct CannedListTasks;

#[async_trait]
impl Tool for CannedListTasks {
    fn name(&self) -> &str {
        "list_tasks"
    }

    fn description(&self) -> &str {
        "Liệt kê các công việc trong danh sách mặc định."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _input: serde_json::Value) -> ToolOutcome {
        ToolOutcome::success(
            "Đây là danh sách các công việc của bạn:\n-  ID: t1\n  Tiêu đề: mua sữa\n  Hạn chót: 2025-08-20\n  Trạng thái: needsAction",
        )
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let registry = Arc::new(ToolRegistry::from_tools(vec![Arc::new(CannedListTasks)])?);
    let agent = Agent::builder()
        .reasoner(Arc::new(TwoStepReasoner))
        .registry(registry)
        .build()?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut conversation = Conversation::with_system("Bạn là trợ lý Google Tasks.");
    conversation.push_user("tôi có việc gì cần làm?");

    let turn = agent.run_turn_with_events(&mut conversation, tx).await?;

    while let Ok(event) = rx.try_recv() {
        match event {
            AgentEvent::RoundStarted { round, max_rounds } => {
                println!("[round {round}/{max_rounds}]")
            }
            AgentEvent::ToolStarted { name, .. } => println!("[tool start] {name}"),
            AgentEvent::ToolFinished { name, is_error, .. } => {
                println!("[tool done ] {name} (error: {is_error})")
            }
            AgentEvent::Final { .. } => println!("[final]"),
        }
    }

    println!("\n>> Agent: {}", turn.text);
    println!(
        "(rounds: {}, tool calls: {}, messages: {})",
        turn.rounds,
        turn.tool_calls,
        conversation.len()
    );
    Ok(())
}
