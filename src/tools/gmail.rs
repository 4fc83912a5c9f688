//! Gmail tools: label listing, email search, and reading message or draft
//! content. All read-only against the `me` mailbox.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::google::GoogleClient;
use crate::types::{FailureKind, ToolFailure, ToolResult};

use super::{Tool, TypedTool};

const DEFAULT_MAX_RESULTS: u32 = 5;
/// Bound on rendered body length so one email cannot flood the context.
const BODY_PREVIEW_CHARS: usize = 2000;

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
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

/// Case-insensitive header lookup in a message payload.
fn header_value<'a>(payload: &'a Value, name: &str) -> Option<&'a str> {
    payload["headers"].as_array()?.iter().find_map(|h| {
        if h["name"].as_str()?.eq_ignore_ascii_case(name) {
            h["value"].as_str()
        } else {
            None
        }
    })
}

/// Extract and decode the text/plain body of a message payload. Gmail encodes
/// bodies as base64url, padded or not depending on the producer.
fn extract_plain_body(payload: &Value) -> Option<String> {
    let data = match payload["parts"].as_array() {
        Some(parts) => parts
            .iter()
            .find(|p| p["mimeType"].as_str() == Some("text/plain"))
            .and_then(|p| p["body"]["data"].as_str()),
        None => payload["body"]["data"].as_str(),
    }?;

    let bytes = URL_SAFE
        .decode(data)
        .or_else(|_| URL_SAFE_NO_PAD.decode(data))
        .ok()?;
    String::from_utf8(bytes).ok()
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(BODY_PREVIEW_CHARS).collect();
    if text.chars().count() > BODY_PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

pub struct ListLabelsTool {
    google: Arc<GoogleClient>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListLabelsInput {}

impl ListLabelsTool {
    pub fn new(google: Arc<GoogleClient>) -> Self {
        Self { google }
    }
}

#[async_trait]
impl TypedTool for ListLabelsTool {
    type Input = ListLabelsInput;
    const NAME: &'static str = "list_labels";
    const DESCRIPTION: &'static str =
        "Liệt kê tất cả các nhãn (labels) có trong hộp thư của người dùng.";

    async fn handle(&self, _input: ListLabelsInput) -> ToolResult {
        let url = self.google.gmail_url("/users/me/labels");
        match self.google.get(url, &[]).await {
            Ok(body) => {
                let names: Vec<&str> = body["labels"]
                    .as_array()
                    .map(|labels| {
                        labels
                            .iter()
                            .filter_map(|l| l["name"].as_str())
                            .collect()
                    })
                    .unwrap_or_default();
                if names.is_empty() {
                    return ToolResult::success("Không tìm thấy nhãn nào.");
                }
                ToolResult::success(format!(
                    "Đây là danh sách các nhãn của bạn:\n- {}",
                    names.join("\n- ")
                ))
            }
            Err(failure) => api_failure("liệt kê nhãn", failure),
        }
    }
}

pub struct ListEmailsTool {
    google: Arc<GoogleClient>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListEmailsInput {
    /// Các từ khóa chung để tìm trong nội dung email (tùy chọn).
    #[serde(default)]
    pub query: Option<String>,
    /// Lọc email từ một người gửi cụ thể, ví dụ 'boss@example.com' (tùy chọn).
    #[serde(default)]
    pub from_sender: Option<String>,
    /// Lọc theo nhãn, hệ thống hoặc người dùng, ví dụ 'INBOX' hay 'Việc Quan Trọng' (tùy chọn).
    #[serde(default)]
    pub label: Option<String>,
    /// Đặt là true để chỉ tìm các email chưa đọc.
    #[serde(default)]
    pub is_unread: bool,
    /// Số lượng email tối đa trả về.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl ListEmailsTool {
    pub fn new(google: Arc<GoogleClient>) -> Self {
        Self { google }
    }
}

#[async_trait]
impl TypedTool for ListEmailsTool {
    type Input = ListEmailsInput;
    const NAME: &'static str = "list_emails";
    const DESCRIPTION: &'static str = "Tìm kiếm và liệt kê các email với các bộ lọc chi tiết \
        (từ khóa, người gửi, nhãn, chưa đọc). Trả về Tiêu đề, Người gửi, và ID của mỗi email.";

    async fn handle(&self, input: ListEmailsInput) -> ToolResult {
        let mut search_parts: Vec<String> = Vec::new();
        if let Some(query) = &input.query {
            search_parts.push(query.clone());
        }
        if let Some(sender) = &input.from_sender {
            search_parts.push(format!("from:{sender}"));
        }
        if let Some(label) = &input.label {
            // Quotes keep labels with spaces intact.
            search_parts.push(format!("label:\"{label}\""));
        }
        if input.is_unread {
            search_parts.push("is:unread".to_string());
        }
        let search_query = if search_parts.is_empty() {
            "in:inbox".to_string()
        } else {
            search_parts.join(" ")
        };

        let url = self.google.gmail_url("/users/me/messages");
        let query = [
            ("q", search_query),
            ("maxResults", input.max_results.to_string()),
        ];
        let listing = match self.google.get(url, &query).await {
            Ok(body) => body,
            Err(failure) => return api_failure("tìm kiếm email", failure),
        };

        let ids: Vec<String> = listing["messages"]
            .as_array()
            .map(|messages| {
                messages
                    .iter()
                    .filter_map(|m| m["id"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        if ids.is_empty() {
            return ToolResult::success("Không tìm thấy email nào khớp với tiêu chí của bạn.");
        }

        let mut previews = Vec::with_capacity(ids.len());
        for id in ids {
            let url = self.google.gmail_url(&format!("/users/me/messages/{id}"));
            let message = match self
                .google
                .get(url, &[("format", "metadata".to_string())])
                .await
            {
                Ok(message) => message,
                Err(failure) => return api_failure("tìm kiếm email", failure),
            };
            let payload = &message["payload"];
            let subject = header_value(payload, "subject").unwrap_or("Không có tiêu đề");
            let sender = header_value(payload, "from").unwrap_or("Không rõ người gửi");
            previews.push(format!(
                "- ID: {id}\n  Tiêu đề: {subject}\n  Người gửi: {sender}"
            ));
        }

        ToolResult::success(format!(
            "Đây là các email được tìm thấy:\n\n{}",
            previews.join("\n\n")
        ))
    }
}

pub struct ReadEmailContentTool {
    google: Arc<GoogleClient>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadEmailContentInput {
    /// ID của email cần đọc.
    pub email_id: String,
}

impl ReadEmailContentTool {
    pub fn new(google: Arc<GoogleClient>) -> Self {
        Self { google }
    }
}

#[async_trait]
impl TypedTool for ReadEmailContentTool {
    type Input = ReadEmailContentInput;
    const NAME: &'static str = "read_email_content";
    const DESCRIPTION: &'static str = "Đọc nội dung chi tiết của một email cụ thể bằng ID \
        của nó. Trích xuất phần nội dung dạng text/plain của email.";

    async fn handle(&self, input: ReadEmailContentInput) -> ToolResult {
        let url = self
            .google
            .gmail_url(&format!("/users/me/messages/{}", input.email_id));
        let message = match self.google.get(url, &[("format", "full".to_string())]).await {
            Ok(message) => message,
            Err(failure) if failure.kind == FailureKind::NotFound => {
                return ToolResult::failure(ToolFailure::not_found(format!(
                    "Lỗi: Không tìm thấy email với ID '{}'.",
                    input.email_id
                )));
            }
            Err(failure) => return api_failure("đọc email", failure),
        };

        let Some(body) = extract_plain_body(&message["payload"]) else {
            return ToolResult::success("Không thể trích xuất nội dung văn bản từ email này.");
        };
        let snippet = message["snippet"].as_str().unwrap_or("Không có tóm tắt.");
        ToolResult::success(format!(
            "Tóm tắt ngắn: {snippet}\n\nNội dung đầy đủ:\n---\n{}",
            preview(&body)
        ))
    }
}

pub struct ListDraftsTool {
    google: Arc<GoogleClient>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDraftsInput {
    /// Số lượng thư nháp tối đa trả về.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl ListDraftsTool {
    pub fn new(google: Arc<GoogleClient>) -> Self {
        Self { google }
    }
}

#[async_trait]
impl TypedTool for ListDraftsTool {
    type Input = ListDraftsInput;
    const NAME: &'static str = "list_drafts";
    const DESCRIPTION: &'static str =
        "Liệt kê các thư nháp chưa gửi trong hộp thư của người dùng.";

    async fn handle(&self, input: ListDraftsInput) -> ToolResult {
        let url = self.google.gmail_url("/users/me/drafts");
        let listing = match self
            .google
            .get(url, &[("maxResults", input.max_results.to_string())])
            .await
        {
            Ok(body) => body,
            Err(failure) => return api_failure("liệt kê thư nháp", failure),
        };

        let ids: Vec<String> = listing["drafts"]
            .as_array()
            .map(|drafts| {
                drafts
                    .iter()
                    .filter_map(|d| d["id"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        if ids.is_empty() {
            return ToolResult::success("Bạn không có thư nháp nào.");
        }

        let mut previews = Vec::with_capacity(ids.len());
        for id in ids {
            let url = self.google.gmail_url(&format!("/users/me/drafts/{id}"));
            let draft = match self.google.get(url, &[]).await {
                Ok(draft) => draft,
                Err(failure) => return api_failure("liệt kê thư nháp", failure),
            };
            let subject = header_value(&draft["message"]["payload"], "subject")
                .unwrap_or("Không có tiêu đề");
            previews.push(format!("- ID Nháp: {id}\n  Tiêu đề: {subject}"));
        }

        ToolResult::success(format!(
            "Đây là danh sách các thư nháp của bạn:\n\n{}",
            previews.join("\n\n")
        ))
    }
}

pub struct ReadDraftContentTool {
    google: Arc<GoogleClient>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadDraftContentInput {
    /// ID của thư nháp cần đọc.
    pub draft_id: String,
}

impl ReadDraftContentTool {
    pub fn new(google: Arc<GoogleClient>) -> Self {
        Self { google }
    }
}

#[async_trait]
impl TypedTool for ReadDraftContentTool {
    type Input = ReadDraftContentInput;
    const NAME: &'static str = "read_draft_content";
    const DESCRIPTION: &'static str = "Đọc nội dung chi tiết của một thư nháp cụ thể bằng ID \
        của nó. Trả về người nhận, tiêu đề, và nội dung của thư nháp.";

    async fn handle(&self, input: ReadDraftContentInput) -> ToolResult {
        let url = self
            .google
            .gmail_url(&format!("/users/me/drafts/{}", input.draft_id));
        let draft = match self.google.get(url, &[("format", "full".to_string())]).await {
            Ok(draft) => draft,
            Err(failure) if failure.kind == FailureKind::NotFound => {
                return ToolResult::failure(ToolFailure::not_found(format!(
                    "Lỗi: Không tìm thấy thư nháp với ID '{}'.",
                    input.draft_id
                )));
            }
            Err(failure) => return api_failure("đọc thư nháp", failure),
        };

        let payload = &draft["message"]["payload"];
        let recipient = header_value(payload, "to").unwrap_or("Chưa có người nhận");
        let subject = header_value(payload, "subject").unwrap_or("Không có tiêu đề");
        let content = extract_plain_body(payload)
            .map(|body| preview(&body))
            .unwrap_or_else(|| "Nội dung trống.".to_string());

        ToolResult::success(format!(
            "Người nhận: {recipient}\nTiêu đề: {subject}\n--- Nội dung ---\n{content}"
        ))
    }
}

/// The full Gmail tool set sharing one client handle.
pub fn gmail_tools(google: &Arc<GoogleClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListLabelsTool::new(google.clone())),
        Arc::new(ListEmailsTool::new(google.clone())),
        Arc::new(ReadEmailContentTool::new(google.clone())),
        Arc::new(ListDraftsTool::new(google.clone())),
        Arc::new(ReadDraftContentTool::new(google.clone())),
    ]
}
