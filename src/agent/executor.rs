//! Batch tool execution.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::tools::ToolRegistry;
use crate::types::{Message, ToolCall, ToolFailure, ToolResult};

/// Executes one batch of requested invocations against the registry.
///
/// Calls run concurrently, but the returned messages are in request order —
/// `join_all` preserves input order regardless of completion order, so the
/// model always sees a deterministic mapping back to its call ids. Every
/// failure mode (unknown tool, tool error, timeout) is folded into the
/// corresponding tool-result message; nothing escapes the batch.
pub struct Executor {
    registry: Arc<ToolRegistry>,
    tool_timeout: Duration,
}

impl Executor {
    pub fn new(registry: Arc<ToolRegistry>, tool_timeout: Duration) -> Self {
        Self {
            registry,
            tool_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// One tool-result message per call, in the order the calls were given.
    pub async fn run(&self, calls: &[ToolCall]) -> Vec<Message> {
        let futures = calls.iter().map(|call| async move {
            let start = Instant::now();
            let result = self.execute_one(call).await;
            debug!(
                tool = %call.name,
                call_id = %call.id,
                duration_ms = start.elapsed().as_millis() as u64,
                is_error = result.is_error(),
                "Tool execution completed"
            );
            Message::tool_result(call.id.clone(), call.name.clone(), result)
        });
        futures::future::join_all(futures).await
    }

    async fn execute_one(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.registry.get(&call.name) else {
            return ToolResult::failure(ToolFailure::unknown_tool(&call.name));
        };
        match tokio::time::timeout(self.tool_timeout, tool.execute(call.args.clone())).await {
            Ok(result) => result,
            Err(_) => ToolResult::failure(ToolFailure::timeout(self.tool_timeout)),
        }
    }
}
