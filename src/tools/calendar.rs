//! Google Calendar tools: list, create, update, and delete events on the
//! user's primary calendar.
//!
//! Times travel as ISO-8601 strings; an argument without a timezone is
//! interpreted in UTC+7 (Asia/Ho_Chi_Minh), matching the product's audience.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::google::GoogleClient;
use crate::types::{FailureKind, ToolFailure, ToolResult};

use super::{Tool, TypedTool};

const CALENDAR_ID: &str = "primary";
const EVENT_TIME_ZONE: &str = "Asia/Ho_Chi_Minh";

fn vietnam_offset() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).expect("UTC+7 is a valid offset")
}

/// Parse an ISO-8601 time argument; naive values get the UTC+7 offset.
fn parse_event_time(value: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t);
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .ok()?;
    naive.and_local_timezone(vietnam_offset()).single()
}

fn event_line(event: &Value) -> String {
    let id = event["id"].as_str().unwrap_or("Không có ID");
    let summary = event["summary"].as_str().unwrap_or("Không có tiêu đề");
    let start = event["start"]["dateTime"]
        .as_str()
        .or_else(|| event["start"]["date"].as_str())
        .unwrap_or("Không rõ thời gian");
    let notes = event["description"].as_str().unwrap_or("Không có mô tả");
    format!("- ID: {id}\n  Tóm tắt: {summary}\n  Thời gian: {start}\n  Ghi chú: {notes}")
}

fn api_failure(action: &str, failure: ToolFailure) -> ToolResult {
    ToolResult::failure(ToolFailure::new(
        failure.kind,
        format!(
            "Lỗi khi {action}: {}. Hãy chắc chắn access token còn hiệu lực.",
            failure.message
        ),
    ))
}

/// List events in a time window on the primary calendar.
pub struct ListEventsTool {
    google: Arc<GoogleClient>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListEventsInput {
    /// Thời gian bắt đầu, định dạng ISO 8601.
    #[serde(default)]
    pub start_time: Option<String>,
    /// Thời gian kết thúc, định dạng ISO 8601.
    #[serde(default)]
    pub end_time: Option<String>,
}

impl ListEventsTool {
    pub fn new(google: Arc<GoogleClient>) -> Self {
        Self { google }
    }
}

#[async_trait]
impl TypedTool for ListEventsTool {
    type Input = ListEventsInput;
    const NAME: &'static str = "list_events";
    const DESCRIPTION: &'static str = "Liệt kê các sự kiện trong một khoảng thời gian cụ thể. \
        'start_time' và 'end_time' phải ở định dạng ISO 8601; bỏ trống để lấy 7 ngày tới. \
        Trả về ID, tóm tắt, thời gian và ghi chú của mỗi sự kiện.";

    async fn handle(&self, input: ListEventsInput) -> ToolResult {
        // Without an explicit window, look from the start of today (UTC+7)
        // seven days ahead.
        let start = match input.start_time.as_deref() {
            Some(raw) => match parse_event_time(raw) {
                Some(t) => t,
                None => {
                    return ToolResult::failure(ToolFailure::invalid_input(format!(
                        "Lỗi: Thời gian bắt đầu '{raw}' không đúng định dạng ISO 8601."
                    )));
                }
            },
            None => {
                let now = Utc::now().with_timezone(&vietnam_offset());
                now.date_naive()
                    .and_hms_opt(0, 0, 1)
                    .and_then(|n| n.and_local_timezone(vietnam_offset()).single())
                    .unwrap_or(now)
            }
        };
        let end = match input.end_time.as_deref() {
            Some(raw) => match parse_event_time(raw) {
                Some(t) => t,
                None => {
                    return ToolResult::failure(ToolFailure::invalid_input(format!(
                        "Lỗi: Thời gian kết thúc '{raw}' không đúng định dạng ISO 8601."
                    )));
                }
            },
            None => start + Duration::days(7),
        };

        let url = self
            .google
            .calendar_url(&format!("/calendars/{CALENDAR_ID}/events"));
        let query = [
            ("timeMin", start.to_rfc3339()),
            ("timeMax", end.to_rfc3339()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];

        match self.google.get(url, &query).await {
            Ok(body) => {
                let events = body["items"].as_array().cloned().unwrap_or_default();
                if events.is_empty() {
                    return ToolResult::success(
                        "Không có sự kiện nào được tìm thấy trong khoảng thời gian này.",
                    );
                }
                let lines: Vec<String> = events.iter().map(event_line).collect();
                ToolResult::success(format!(
                    "Đây là các sự kiện được tìm thấy:\n{}",
                    lines.join("\n\n")
                ))
            }
            Err(failure) => api_failure("liệt kê sự kiện", failure),
        }
    }
}

/// Create a new event on the primary calendar.
pub struct CreateEventTool {
    google: Arc<GoogleClient>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateEventInput {
    /// Tiêu đề của sự kiện.
    pub summary: String,
    /// Thời gian bắt đầu, định dạng ISO 8601.
    pub start_time: String,
    /// Thời gian kết thúc, định dạng ISO 8601.
    pub end_time: String,
    /// Mô tả chi tiết (tùy chọn).
    #[serde(default)]
    pub description: Option<String>,
    /// Danh sách email của người tham dự (tùy chọn).
    #[serde(default)]
    pub attendees: Option<Vec<String>>,
}

impl CreateEventTool {
    pub fn new(google: Arc<GoogleClient>) -> Self {
        Self { google }
    }
}

#[async_trait]
impl TypedTool for CreateEventTool {
    type Input = CreateEventInput;
    const NAME: &'static str = "create_event";
    const DESCRIPTION: &'static str = "Tạo một sự kiện mới trong lịch chính. 'summary' là tiêu đề, \
        'start_time' và 'end_time' phải có định dạng ISO 8601 \
        (ví dụ: '2025-08-06T15:00:00+07:00').";

    async fn handle(&self, input: CreateEventInput) -> ToolResult {
        let attendees: Vec<Value> = input
            .attendees
            .unwrap_or_default()
            .into_iter()
            .map(|email| json!({ "email": email }))
            .collect();
        let body = json!({
            "summary": input.summary,
            "description": input.description,
            "start": { "dateTime": input.start_time, "timeZone": EVENT_TIME_ZONE },
            "end": { "dateTime": input.end_time, "timeZone": EVENT_TIME_ZONE },
            "reminders": { "useDefault": true },
            "attendees": attendees,
        });

        let url = self
            .google
            .calendar_url(&format!("/calendars/{CALENDAR_ID}/events"));
        match self.google.post(url, &body).await {
            Ok(created) => ToolResult::success(format!(
                "Đã tạo thành công sự kiện '{}' vào lúc {}.",
                created["summary"].as_str().unwrap_or(""),
                created["start"]["dateTime"].as_str().unwrap_or("")
            )),
            Err(failure) => api_failure("tạo sự kiện", failure),
        }
    }
}

/// Update an existing event by id (read-modify-write).
pub struct UpdateEventTool {
    google: Arc<GoogleClient>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateEventInput {
    /// ID của sự kiện cần cập nhật.
    pub event_id: String,
    /// Tiêu đề mới (tùy chọn).
    #[serde(default)]
    pub new_summary: Option<String>,
    /// Thời gian bắt đầu mới, định dạng ISO 8601 (tùy chọn).
    #[serde(default)]
    pub new_start_time: Option<String>,
    /// Thời gian kết thúc mới, định dạng ISO 8601 (tùy chọn).
    #[serde(default)]
    pub new_end_time: Option<String>,
    /// Mô tả mới (tùy chọn).
    #[serde(default)]
    pub new_description: Option<String>,
    /// Danh sách người tham dự mới (tùy chọn).
    #[serde(default)]
    pub new_attendees: Option<Vec<String>>,
}

impl UpdateEventTool {
    pub fn new(google: Arc<GoogleClient>) -> Self {
        Self { google }
    }
}

#[async_trait]
impl TypedTool for UpdateEventTool {
    type Input = UpdateEventInput;
    const NAME: &'static str = "update_event";
    const DESCRIPTION: &'static str = "Cập nhật một sự kiện đã có bằng ID của nó. Dùng \
        list_events để tìm 'event_id' trước khi cập nhật.";

    async fn handle(&self, input: UpdateEventInput) -> ToolResult {
        let url = self
            .google
            .calendar_url(&format!("/calendars/{CALENDAR_ID}/events/{}", input.event_id));

        // Fetch first so untouched fields survive the write.
        let mut event = match self.google.get(url.clone(), &[]).await {
            Ok(event) => event,
            Err(failure) if failure.kind == FailureKind::NotFound => {
                return ToolResult::failure(ToolFailure::not_found(format!(
                    "Lỗi: Không tìm thấy sự kiện với ID '{}'.",
                    input.event_id
                )));
            }
            Err(failure) => return api_failure("cập nhật sự kiện", failure),
        };

        if let Some(summary) = input.new_summary {
            event["summary"] = Value::String(summary);
        }
        if let Some(start) = input.new_start_time {
            event["start"]["dateTime"] = Value::String(start);
        }
        if let Some(end) = input.new_end_time {
            event["end"]["dateTime"] = Value::String(end);
        }
        if let Some(description) = input.new_description {
            event["description"] = Value::String(description);
        }
        if let Some(attendees) = input.new_attendees {
            event["attendees"] = Value::Array(
                attendees
                    .into_iter()
                    .map(|email| json!({ "email": email }))
                    .collect(),
            );
        }

        match self.google.put(url, &event).await {
            Ok(updated) => ToolResult::success(format!(
                "Đã cập nhật thành công sự kiện '{}'.",
                updated["summary"].as_str().unwrap_or("")
            )),
            Err(failure) if failure.kind == FailureKind::NotFound => {
                ToolResult::failure(ToolFailure::not_found(format!(
                    "Lỗi: Không tìm thấy sự kiện với ID '{}'.",
                    input.event_id
                )))
            }
            Err(failure) => api_failure("cập nhật sự kiện", failure),
        }
    }
}

/// Delete an event by id.
pub struct DeleteEventTool {
    google: Arc<GoogleClient>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteEventInput {
    /// ID của sự kiện cần xóa.
    pub event_id: String,
}

impl DeleteEventTool {
    pub fn new(google: Arc<GoogleClient>) -> Self {
        Self { google }
    }
}

#[async_trait]
impl TypedTool for DeleteEventTool {
    type Input = DeleteEventInput;
    const NAME: &'static str = "delete_event";
    const DESCRIPTION: &'static str =
        "Xóa một sự kiện bằng ID của nó. Hành động này không thể hoàn tác.";

    async fn handle(&self, input: DeleteEventInput) -> ToolResult {
        let url = self
            .google
            .calendar_url(&format!("/calendars/{CALENDAR_ID}/events/{}", input.event_id));
        match self.google.delete(url).await {
            Ok(()) => ToolResult::success(format!(
                "Đã xóa thành công sự kiện với ID: {}.",
                input.event_id
            )),
            Err(failure) if failure.kind == FailureKind::NotFound => {
                ToolResult::failure(ToolFailure::not_found(format!(
                    "Lỗi: Không tìm thấy sự kiện với ID '{}' để xóa.",
                    input.event_id
                )))
            }
            Err(failure) => api_failure("xóa sự kiện", failure),
        }
    }
}

/// The full Calendar tool set sharing one client handle.
pub fn calendar_tools(google: &Arc<GoogleClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListEventsTool::new(google.clone())),
        Arc::new(CreateEventTool::new(google.clone())),
        Arc::new(UpdateEventTool::new(google.clone())),
        Arc::new(DeleteEventTool::new(google.clone())),
    ]
}
