//! Google Tasks tools over the user's default task list.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::google::GoogleClient;
use crate::types::{FailureKind, ToolFailure, ToolResult};

use super::{Tool, TypedTool};

const TASK_LIST_ID: &str = "@default";

/// Convert a `YYYY-MM-DD` date to the RFC3339 midnight-UTC form the Tasks API
/// requires for `due`.
fn format_due_date(date: &str) -> Option<String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(format!("{date}T00:00:00.000Z"))
}

fn api_failure(action: &str, failure: ToolFailure) -> ToolResult {
    ToolResult::failure(ToolFailure::new(
        failure.kind,
        format!("Lỗi khi {action}: {}", failure.message),
    ))
}

pub struct ListTasksTool {
    google: Arc<GoogleClient>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTasksInput {}

impl ListTasksTool {
    pub fn new(google: Arc<GoogleClient>) -> Self {
        Self { google }
    }
}

#[async_trait]
impl TypedTool for ListTasksTool {
    type Input = ListTasksInput;
    const NAME: &'static str = "list_tasks";
    const DESCRIPTION: &'static str = "Liệt kê các công việc trong danh sách mặc định, \
        bao gồm cả công việc đã hoàn thành. Trả về ID, tiêu đề, hạn chót và trạng thái.";

    async fn handle(&self, _input: ListTasksInput) -> ToolResult {
        let url = self
            .google
            .tasks_url(&format!("/lists/{TASK_LIST_ID}/tasks"));
        let query = [
            ("showCompleted", "true".to_string()),
            ("showHidden", "true".to_string()),
        ];

        match self.google.get(url, &query).await {
            Ok(body) => {
                let items = body["items"].as_array().cloned().unwrap_or_default();
                if items.is_empty() {
                    return ToolResult::success("Bạn không có công việc nào.");
                }
                let lines: Vec<String> = items
                    .iter()
                    .map(|item| {
                        let id = item["id"].as_str().unwrap_or("Không có ID");
                        let title = item["title"].as_str().unwrap_or("Không có tiêu đề");
                        let status = item["status"].as_str().unwrap_or("needsAction");
                        // Only the date part of the due timestamp matters.
                        let due = item["due"]
                            .as_str()
                            .map(|d| d.split('T').next().unwrap_or(d))
                            .unwrap_or("Không có hạn");
                        format!(
                            "-  ID: {id}\n  Tiêu đề: {title}\n  Hạn chót: {due}\n  Trạng thái: {status}"
                        )
                    })
                    .collect();
                ToolResult::success(format!(
                    "Đây là danh sách các công việc của bạn:\n{}",
                    lines.join("\n\n")
                ))
            }
            Err(failure) => api_failure("liệt kê công việc", failure),
        }
    }
}

pub struct CreateTaskTool {
    google: Arc<GoogleClient>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTaskInput {
    /// Tiêu đề của công việc (bắt buộc).
    pub title: String,
    /// Mô tả chi tiết cho công việc (tùy chọn).
    #[serde(default)]
    pub notes: Option<String>,
    /// Hạn chót, định dạng 'YYYY-MM-DD' (tùy chọn).
    #[serde(default)]
    pub due_date: Option<String>,
}

impl CreateTaskTool {
    pub fn new(google: Arc<GoogleClient>) -> Self {
        Self { google }
    }
}

#[async_trait]
impl TypedTool for CreateTaskTool {
    type Input = CreateTaskInput;
    const NAME: &'static str = "create_task";
    const DESCRIPTION: &'static str = "Tạo một công việc mới. 'title' là bắt buộc, \
        'notes' là mô tả chi tiết, 'due_date' phải có định dạng 'YYYY-MM-DD'.";

    async fn handle(&self, input: CreateTaskInput) -> ToolResult {
        if input.title.trim().is_empty() {
            return ToolResult::failure(ToolFailure::invalid_input(
                "Lỗi: Không thể tạo task mà không có tiêu đề.",
            ));
        }

        let mut body = json!({ "title": input.title });
        if let Some(notes) = input.notes {
            body["notes"] = Value::String(notes);
        }
        if let Some(due_date) = input.due_date {
            match format_due_date(&due_date) {
                Some(due) => body["due"] = Value::String(due),
                None => {
                    return ToolResult::failure(ToolFailure::invalid_input(format!(
                        "Lỗi: Định dạng ngày '{due_date}' không hợp lệ. Vui lòng dùng YYYY-MM-DD."
                    )));
                }
            }
        }

        let url = self
            .google
            .tasks_url(&format!("/lists/{TASK_LIST_ID}/tasks"));
        match self.google.post(url, &body).await {
            Ok(created) => ToolResult::success(format!(
                "Đã tạo thành công công việc: '{}'.",
                created["title"].as_str().unwrap_or("")
            )),
            Err(failure) => api_failure("tạo công việc", failure),
        }
    }
}

pub struct UpdateTaskTool {
    google: Arc<GoogleClient>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateTaskInput {
    /// ID của công việc cần cập nhật.
    pub task_id: String,
    /// Tiêu đề mới (tùy chọn).
    #[serde(default)]
    pub new_title: Option<String>,
    /// Mô tả mới (tùy chọn).
    #[serde(default)]
    pub new_notes: Option<String>,
    /// Trạng thái mới: 'completed' hoặc 'needsAction' (tùy chọn).
    #[serde(default)]
    pub new_status: Option<String>,
}

impl UpdateTaskTool {
    pub fn new(google: Arc<GoogleClient>) -> Self {
        Self { google }
    }
}

#[async_trait]
impl TypedTool for UpdateTaskTool {
    type Input = UpdateTaskInput;
    const NAME: &'static str = "update_task";
    const DESCRIPTION: &'static str = "Cập nhật một công việc đã có bằng ID của nó. \
        Cung cấp 'new_title' để đổi tiêu đề, 'new_notes' để đổi mô tả, 'new_status' là \
        'completed' để đánh dấu hoàn thành hoặc 'needsAction' để đánh dấu chưa hoàn thành.";

    async fn handle(&self, input: UpdateTaskInput) -> ToolResult {
        if input.task_id.trim().is_empty() {
            return ToolResult::failure(ToolFailure::invalid_input(
                "Lỗi: Cần phải có ID của công việc để cập nhật.",
            ));
        }

        let mut body = json!({});
        if let Some(title) = input.new_title {
            body["title"] = Value::String(title);
        }
        if let Some(notes) = input.new_notes {
            body["notes"] = Value::String(notes);
        }
        if let Some(status) = input.new_status {
            if status != "completed" && status != "needsAction" {
                return ToolResult::failure(ToolFailure::invalid_input(
                    "Lỗi: Trạng thái mới phải là 'completed' hoặc 'needsAction'.",
                ));
            }
            body["status"] = Value::String(status);
        }
        if body.as_object().is_some_and(|o| o.is_empty()) {
            return ToolResult::failure(ToolFailure::invalid_input(
                "Lỗi: Không có thông tin gì để cập nhật.",
            ));
        }

        let url = self
            .google
            .tasks_url(&format!("/lists/{TASK_LIST_ID}/tasks/{}", input.task_id));
        match self.google.patch(url, &body).await {
            Ok(updated) => ToolResult::success(format!(
                "Đã cập nhật thành công công việc ID {}. Tiêu đề mới: '{}'.",
                input.task_id,
                updated["title"].as_str().unwrap_or("")
            )),
            Err(failure) if failure.kind == FailureKind::NotFound => {
                ToolResult::failure(ToolFailure::not_found(format!(
                    "Lỗi: Không tìm thấy công việc với ID '{}'.",
                    input.task_id
                )))
            }
            Err(failure) => api_failure("cập nhật công việc", failure),
        }
    }
}

pub struct DeleteTaskTool {
    google: Arc<GoogleClient>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteTaskInput {
    /// ID của công việc cần xóa.
    pub task_id: String,
}

impl DeleteTaskTool {
    pub fn new(google: Arc<GoogleClient>) -> Self {
        Self { google }
    }
}

#[async_trait]
impl TypedTool for DeleteTaskTool {
    type Input = DeleteTaskInput;
    const NAME: &'static str = "delete_task";
    const DESCRIPTION: &'static str =
        "Xóa một công việc bằng ID của nó. Hành động này không thể hoàn tác.";

    async fn handle(&self, input: DeleteTaskInput) -> ToolResult {
        if input.task_id.trim().is_empty() {
            return ToolResult::failure(ToolFailure::invalid_input(
                "Lỗi: Cần phải có ID của công việc để xóa.",
            ));
        }
        let url = self
            .google
            .tasks_url(&format!("/lists/{TASK_LIST_ID}/tasks/{}", input.task_id));
        match self.google.delete(url).await {
            Ok(()) => ToolResult::success(format!(
                "Đã xóa thành công công việc với ID: {}.",
                input.task_id
            )),
            Err(failure) if failure.kind == FailureKind::NotFound => {
                ToolResult::failure(ToolFailure::not_found(format!(
                    "Lỗi: Không tìm thấy công việc với ID '{}' để xóa.",
                    input.task_id
                )))
            }
            Err(failure) => api_failure("xóa công việc", failure),
        }
    }
}

/// The full Tasks tool set sharing one client handle.
pub fn tasks_tools(google: &Arc<GoogleClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListTasksTool::new(google.clone())),
        Arc::new(CreateTaskTool::new(google.clone())),
        Arc::new(UpdateTaskTool::new(google.clone())),
        Arc::new(DeleteTaskTool::new(google.clone())),
    ]
}
