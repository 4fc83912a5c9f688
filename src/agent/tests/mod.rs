//! Agent loop contract tests: termination, ordering, failure isolation, and
//! conversation bookkeeping.

mod helpers;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::agent::{Agent, AgentEvent, Decision, TurnOutcome};
use crate::types::{Conversation, FailureKind, Message, Role, ToolCall, ToolFailure, Usage};
use crate::{Error, Result};

use helpers::{AlwaysActReasoner, ScriptedReasoner, StaticTool, agent_with, registry_of};

fn act(calls: Vec<ToolCall>) -> Result<Decision> {
    Ok(Decision::Act {
        text: String::new(),
        calls,
        usage: Usage::default(),
    })
}

fn done(text: &str) -> Result<Decision> {
    Ok(Decision::Final {
        text: text.to_string(),
        usage: Usage::default(),
    })
}

#[tokio::test]
async fn test_immediate_final_appends_one_message_and_runs_no_tools() {
    let tool = StaticTool::ok("list_tasks", "Bạn không có công việc nào.");
    let invocations = tool.invocations.clone();
    let agent = agent_with(
        Arc::new(ScriptedReasoner::final_text("Xin chào!")),
        registry_of(vec![Arc::new(tool)]),
    );

    let mut conv = Conversation::with_system("prompt");
    conv.push_user("chào bạn");
    let before = conv.len();

    let turn = agent.run_turn(&mut conv).await.unwrap();
    assert_eq!(turn.outcome, TurnOutcome::Completed);
    assert_eq!(turn.text, "Xin chào!");
    assert_eq!(turn.rounds, 1);
    assert_eq!(turn.tool_calls, 0);
    assert_eq!(conv.len(), before + 1);
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

/// Scenario A: one create_task round-trip, five messages at the end.
#[tokio::test]
async fn test_single_step_task_creation() {
    let create = StaticTool::ok("create_task", "Đã tạo thành công công việc: 'buy milk'.");
    let reasoner = ScriptedReasoner::new(vec![
        act(vec![ToolCall::with_id(
            "c1",
            "create_task",
            json!({"title": "buy milk", "due_date": "2025-08-20"}),
        )]),
        done("Mình đã tạo công việc 'buy milk' với hạn 2025-08-20."),
    ]);
    let agent = agent_with(Arc::new(reasoner), registry_of(vec![Arc::new(create)]));

    let mut conv = Conversation::with_system("prompt");
    conv.push_user("create task 'buy milk' due 2025-08-20");

    let turn = agent.run_turn(&mut conv).await.unwrap();
    assert_eq!(turn.outcome, TurnOutcome::Completed);
    assert_eq!(turn.rounds, 2);
    assert_eq!(turn.tool_calls, 1);

    let messages = conv.messages();
    assert_eq!(messages.len(), 5);
    assert_eq!(messages[2].tool_calls()[0].id, "c1");
    match &messages[3] {
        Message::ToolResult {
            call_id, result, ..
        } => {
            assert_eq!(call_id, "c1");
            assert_eq!(result.text(), "Đã tạo thành công công việc: 'buy milk'.");
        }
        other => panic!("expected tool result, got {other:?}"),
    }
    assert_eq!(
        messages[4].text(),
        "Mình đã tạo công việc 'buy milk' với hạn 2025-08-20."
    );
    assert!(conv.unanswered_calls().is_empty());
}

/// Results come back in request order even when completion order differs,
/// and one failing call does not disturb the others.
#[tokio::test]
async fn test_batch_order_preserved_with_partial_failure() {
    let slow = StaticTool::ok("tool_a", "A xong").with_delay(Duration::from_millis(80));
    let fast = StaticTool::ok("tool_b", "B xong");
    let broken = StaticTool::failing("tool_c", ToolFailure::api("HTTP 500: hỏng"));
    let reasoner = ScriptedReasoner::new(vec![
        act(vec![
            ToolCall::with_id("a", "tool_a", json!({})),
            ToolCall::with_id("b", "tool_b", json!({})),
            ToolCall::with_id("c", "tool_c", json!({})),
        ]),
        done("xong cả ba"),
    ]);
    let agent = agent_with(
        Arc::new(reasoner),
        registry_of(vec![Arc::new(slow), Arc::new(fast), Arc::new(broken)]),
    );

    let mut conv = Conversation::new();
    conv.push_user("chạy cả ba tool");
    let turn = agent.run_turn(&mut conv).await.unwrap();
    assert_eq!(turn.tool_calls, 3);

    let results: Vec<_> = conv
        .messages()
        .iter()
        .filter_map(|m| match m {
            Message::ToolResult {
                call_id, result, ..
            } => Some((call_id.as_str(), result.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0, "a");
    assert_eq!(results[1].0, "b");
    assert_eq!(results[2].0, "c");
    assert!(!results[0].1.is_error());
    assert!(!results[1].1.is_error());
    assert_eq!(results[2].1.failure_kind(), Some(FailureKind::Api));
}

/// An unknown tool name becomes a failed result, never an aborted turn.
#[tokio::test]
async fn test_unknown_tool_is_folded_into_results() {
    let reasoner = ScriptedReasoner::new(vec![
        act(vec![ToolCall::with_id("x", "send_rocket", json!({}))]),
        done("tool đó không tồn tại"),
    ]);
    let agent = agent_with(Arc::new(reasoner), registry_of(vec![]));

    let mut conv = Conversation::new();
    conv.push_user("phóng tên lửa");
    let turn = agent.run_turn(&mut conv).await.unwrap();
    assert_eq!(turn.outcome, TurnOutcome::Completed);

    let failure = conv
        .messages()
        .iter()
        .find_map(|m| match m {
            Message::ToolResult { result, .. } => result.failure_kind(),
            _ => None,
        })
        .unwrap();
    assert_eq!(failure, FailureKind::UnknownTool);
}

/// Scenario D: a reasoner that always acts terminates at exactly the bound.
#[tokio::test]
async fn test_step_limit_terminates_pathological_reasoner() {
    let tool = StaticTool::ok("list_tasks", "vẫn vậy");
    let invocations = tool.invocations.clone();
    let reasoner = AlwaysActReasoner::new("list_tasks");
    let decide_count = reasoner.calls.clone();

    let agent = Agent::builder()
        .reasoner(Arc::new(reasoner))
        .registry(registry_of(vec![Arc::new(tool)]))
        .max_rounds(10)
        .build()
        .unwrap();

    let mut conv = Conversation::new();
    conv.push_user("lặp đi");
    let turn = agent.run_turn(&mut conv).await.unwrap();

    assert_eq!(turn.outcome, TurnOutcome::StepLimit);
    assert_eq!(turn.rounds, 10);
    assert_eq!(decide_count.load(Ordering::SeqCst), 10);
    assert_eq!(invocations.load(Ordering::SeqCst), 10);
    // Every batch was answered before the synthesized final message.
    assert!(conv.unanswered_calls().is_empty());
    assert_eq!(conv.last().unwrap().role(), Role::Assistant);
    assert!(turn.text.contains("limit of 10"));
}

/// Reasoner failure aborts the turn and leaves the conversation exactly as
/// it was before the failing call.
#[tokio::test]
async fn test_reasoner_failure_aborts_without_partial_append() {
    let agent = agent_with(
        Arc::new(ScriptedReasoner::new(vec![Err(Error::Api {
            message: "rate limited".into(),
            status: Some(429),
        })])),
        registry_of(vec![]),
    );

    let mut conv = Conversation::with_system("prompt");
    conv.push_user("chào");
    let before = conv.len();

    match agent.run_turn(&mut conv).await {
        Err(Error::Api { status, .. }) => assert_eq!(status, Some(429)),
        other => panic!("expected Api error, got {other:?}"),
    }
    assert_eq!(conv.len(), before);
}

/// Mid-turn failure keeps the earlier rounds' messages for diagnosability.
#[tokio::test]
async fn test_mid_turn_reasoner_failure_keeps_tool_results() {
    let tool = StaticTool::ok("list_tasks", "1 công việc");
    let reasoner = ScriptedReasoner::new(vec![
        act(vec![ToolCall::with_id("c1", "list_tasks", json!({}))]),
        Err(Error::Timeout(Duration::from_secs(60))),
    ]);
    let agent = agent_with(Arc::new(reasoner), registry_of(vec![Arc::new(tool)]));

    let mut conv = Conversation::with_system("prompt");
    conv.push_user("xem task");

    assert!(matches!(
        agent.run_turn(&mut conv).await,
        Err(Error::Timeout(_))
    ));
    // system, user, assistant(act), tool_result — nothing after the failure.
    assert_eq!(conv.len(), 4);
    assert_eq!(conv.last().unwrap().role(), Role::ToolResult);
}

/// Scenario C: a failed delete surfaces to the model, which reports it.
#[tokio::test]
async fn test_tool_failure_recovery_into_final_answer() {
    let broken = StaticTool::failing(
        "delete_task",
        ToolFailure::not_found("Lỗi: Không tìm thấy công việc với ID 't9'."),
    );
    let reasoner = ScriptedReasoner::new(vec![
        act(vec![ToolCall::with_id(
            "c1",
            "delete_task",
            json!({"task_id": "t9"}),
        )]),
        done("Không tìm thấy công việc đó; có thể nó đã bị xóa."),
    ]);
    let agent = agent_with(Arc::new(reasoner), registry_of(vec![Arc::new(broken)]));

    let mut conv = Conversation::new();
    conv.push_user("xóa task t9");
    let turn = agent.run_turn(&mut conv).await.unwrap();
    assert_eq!(turn.outcome, TurnOutcome::Completed);

    let roles: Vec<Role> = conv.messages().iter().map(Message::role).collect();
    // The failure result sits before the final answer.
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::ToolResult, Role::Assistant]
    );
    match &conv.messages()[2] {
        Message::ToolResult { result, .. } => {
            assert_eq!(result.failure_kind(), Some(FailureKind::NotFound));
        }
        other => panic!("expected tool result, got {other:?}"),
    }
}

/// Scenario B: after an ambiguous multi-match listing, a Final that asks for
/// clarification must not trigger the update tool.
#[tokio::test]
async fn test_ambiguous_update_asks_instead_of_acting() {
    let list = StaticTool::ok(
        "list_events",
        "Đây là các sự kiện được tìm thấy:\n- ID: ev1\n  Tóm tắt: Họp nhóm\n\n- ID: ev2\n  Tóm tắt: Họp nhóm",
    );
    let update = StaticTool::ok("update_event", "Đã cập nhật thành công sự kiện 'Họp nhóm'.");
    let update_count = update.invocations.clone();

    let reasoner = ScriptedReasoner::new(vec![
        act(vec![ToolCall::with_id("c1", "list_events", json!({}))]),
        done("Mình thấy 2 sự kiện 'Họp nhóm' vào ngày mai. Bạn muốn đổi sự kiện nào, ev1 hay ev2?"),
    ]);
    let agent = agent_with(
        Arc::new(reasoner),
        registry_of(vec![Arc::new(list), Arc::new(update)]),
    );

    let mut conv = Conversation::with_system("prompt");
    conv.push_user("dời cuộc họp ngày mai sang 4 giờ chiều");
    let turn = agent.run_turn(&mut conv).await.unwrap();

    assert_eq!(turn.outcome, TurnOutcome::Completed);
    assert!(turn.text.contains("ev1 hay ev2"));
    assert_eq!(update_count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancellation_before_first_round() {
    let agent = agent_with(
        Arc::new(ScriptedReasoner::final_text("không nên thấy")),
        registry_of(vec![]),
    );
    let token = CancellationToken::new();
    token.cancel();

    let mut conv = Conversation::new();
    conv.push_user("chào");
    let before = conv.len();

    assert!(matches!(
        agent.run_turn_cancellable(&mut conv, token).await,
        Err(Error::Cancelled)
    ));
    assert_eq!(conv.len(), before);
}

/// Two turns on distinct conversations sharing one registry never interleave
/// writes into each other's history.
#[tokio::test]
async fn test_concurrent_sessions_are_isolated() {
    let shared_tool = Arc::new(StaticTool::ok("list_tasks", "ok"));
    let invocations = shared_tool.invocations.clone();
    let registry = registry_of(vec![shared_tool]);

    let agent_a = agent_with(
        Arc::new(ScriptedReasoner::new(vec![
            act(vec![ToolCall::with_id("a1", "list_tasks", json!({}))]),
            done("trả lời A"),
        ])),
        registry.clone(),
    );
    let agent_b = agent_with(
        Arc::new(ScriptedReasoner::new(vec![
            act(vec![ToolCall::with_id("b1", "list_tasks", json!({}))]),
            done("trả lời B"),
        ])),
        registry,
    );

    let mut conv_a = Conversation::new();
    conv_a.push_user("A hỏi");
    let mut conv_b = Conversation::new();
    conv_b.push_user("B hỏi");

    let (ra, rb) = tokio::join!(agent_a.run_turn(&mut conv_a), agent_b.run_turn(&mut conv_b));
    assert_eq!(ra.unwrap().text, "trả lời A");
    assert_eq!(rb.unwrap().text, "trả lời B");
    assert_eq!(invocations.load(Ordering::SeqCst), 2);

    let ids_in = |conv: &Conversation| -> Vec<String> {
        conv.messages()
            .iter()
            .flat_map(|m| m.tool_calls())
            .map(|c| c.id.clone())
            .collect()
    };
    assert_eq!(ids_in(&conv_a), vec!["a1"]);
    assert_eq!(ids_in(&conv_b), vec!["b1"]);
}

#[tokio::test]
async fn test_events_are_emitted_in_order() {
    let tool = StaticTool::ok("list_tasks", "ok");
    let reasoner = ScriptedReasoner::new(vec![
        act(vec![ToolCall::with_id("c1", "list_tasks", json!({}))]),
        done("xong"),
    ]);
    let agent = agent_with(Arc::new(reasoner), registry_of(vec![Arc::new(tool)]));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut conv = Conversation::new();
    conv.push_user("xem task");
    agent.run_turn_with_events(&mut conv, tx).await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(
        events[0],
        AgentEvent::RoundStarted { round: 1, .. }
    ));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, AgentEvent::ToolStarted { name, .. } if name == "list_tasks"))
    );
    assert!(events.iter().any(
        |e| matches!(e, AgentEvent::ToolFinished { id, is_error, .. } if id == "c1" && !is_error)
    ));
    assert!(matches!(
        events.last().unwrap(),
        AgentEvent::Final { text } if text.as_str() == "xong"
    ));
}

#[tokio::test]
async fn test_turn_requires_pending_non_assistant_message() {
    let agent = agent_with(
        Arc::new(ScriptedReasoner::final_text("?")),
        registry_of(vec![]),
    );

    let mut empty = Conversation::new();
    assert!(matches!(
        agent.run_turn(&mut empty).await,
        Err(Error::Config(_))
    ));

    let mut answered = Conversation::new();
    answered.push_user("chào");
    answered.push(Message::assistant("đã trả lời"));
    assert!(matches!(
        agent.run_turn(&mut answered).await,
        Err(Error::Config(_))
    ));
}

/// A tool that exceeds its budget fails alone; the turn keeps going.
#[tokio::test]
async fn test_slow_tool_times_out_as_per_call_failure() {
    let slow = StaticTool::ok("slow_tool", "quá muộn").with_delay(Duration::from_millis(200));
    let reasoner = ScriptedReasoner::new(vec![
        act(vec![ToolCall::with_id("c1", "slow_tool", json!({}))]),
        done("tool đó chạy quá lâu"),
    ]);
    let agent = Agent::builder()
        .reasoner(Arc::new(reasoner))
        .registry(registry_of(vec![Arc::new(slow)]))
        .tool_timeout(Duration::from_millis(20))
        .build()
        .unwrap();

    let mut conv = Conversation::new();
    conv.push_user("chạy tool chậm");
    let turn = agent.run_turn(&mut conv).await.unwrap();
    assert_eq!(turn.outcome, TurnOutcome::Completed);

    let failure = conv
        .messages()
        .iter()
        .find_map(|m| match m {
            Message::ToolResult { result, .. } => result.failure_kind(),
            _ => None,
        })
        .unwrap();
    assert_eq!(failure, FailureKind::Timeout);
}

/// ToolResult messages always answer exactly one previously unanswered call.
#[tokio::test]
async fn test_no_orphaned_or_duplicate_results() {
    let tool = StaticTool::ok("list_tasks", "ok");
    let reasoner = ScriptedReasoner::new(vec![
        act(vec![
            ToolCall::with_id("c1", "list_tasks", json!({})),
            ToolCall::with_id("c2", "list_tasks", json!({})),
        ]),
        act(vec![ToolCall::with_id("c3", "list_tasks", json!({}))]),
        done("xong"),
    ]);
    let agent = agent_with(Arc::new(reasoner), registry_of(vec![Arc::new(tool)]));

    let mut conv = Conversation::new();
    conv.push_user("kiểm tra hai lần");
    agent.run_turn(&mut conv).await.unwrap();

    let call_ids: Vec<&str> = conv
        .messages()
        .iter()
        .flat_map(|m| m.tool_calls())
        .map(|c| c.id.as_str())
        .collect();
    let result_ids: Vec<&str> = conv
        .messages()
        .iter()
        .filter_map(|m| match m {
            Message::ToolResult { call_id, .. } => Some(call_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(call_ids, result_ids);
    assert!(conv.unanswered_calls().is_empty());
}
