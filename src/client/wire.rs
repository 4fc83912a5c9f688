//! Wire types for the Gemini `generateContent` REST endpoint, plus the
//! conversion between the crate's [`Conversation`] and the request body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{
    Conversation, FinishReason, Message, ModelResponse, ToolCall, ToolDefinition, Usage,
};
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDeclarations>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One part of a content entry. Exactly one of the fields is set; unknown
/// part kinds in responses (e.g. thought summaries) deserialize to all-None
/// and are skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    fn function_call(name: &str, args: Value) -> Self {
        Self {
            function_call: Some(FunctionCall {
                name: name.to_string(),
                args,
            }),
            ..Self::default()
        }
    }

    fn function_response(name: &str, response: Value) -> Self {
        Self {
            function_response: Some(FunctionResponse {
                name: name.to_string(),
                response,
            }),
            ..Self::default()
        }
    }

    fn is_function_response(&self) -> bool {
        self.function_response.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FunctionCall {
    pub name: String,
    #[serde(default = "empty_object")]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ToolDeclarations {
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}

impl GenerateContentRequest {
    /// Build a request body from a conversation and the registered tool
    /// definitions. System messages are hoisted into `systemInstruction`;
    /// consecutive tool results collapse into one `user` entry so parallel
    /// calls are answered in a single turn, as the API expects.
    pub fn from_conversation(
        conversation: &Conversation,
        tools: &[ToolDefinition],
        temperature: Option<f32>,
    ) -> Self {
        let mut system_text: Vec<&str> = Vec::new();
        let mut contents: Vec<Content> = Vec::new();

        for message in conversation.messages() {
            match message {
                Message::System { content } => system_text.push(content),
                Message::User { content } => contents.push(Content {
                    role: Some("user".into()),
                    parts: vec![Part::text(content)],
                }),
                Message::Assistant {
                    content,
                    tool_calls,
                } => {
                    let mut parts = Vec::new();
                    if !content.is_empty() {
                        parts.push(Part::text(content));
                    }
                    for call in tool_calls {
                        parts.push(Part::function_call(&call.name, call.args.clone()));
                    }
                    if parts.is_empty() {
                        parts.push(Part::text(""));
                    }
                    contents.push(Content {
                        role: Some("model".into()),
                        parts,
                    });
                }
                Message::ToolResult {
                    tool_name, result, ..
                } => {
                    let response = match result {
                        crate::types::ToolResult::Success { content } => {
                            serde_json::json!({ "content": content })
                        }
                        crate::types::ToolResult::Failure(failure) => {
                            serde_json::json!({ "error": failure.message })
                        }
                    };
                    let part = Part::function_response(tool_name, response);
                    match contents.last_mut() {
                        Some(last)
                            if last.role.as_deref() == Some("user")
                                && last.parts.iter().all(Part::is_function_response) =>
                        {
                            last.parts.push(part);
                        }
                        _ => contents.push(Content {
                            role: Some("user".into()),
                            parts: vec![part],
                        }),
                    }
                }
            }
        }

        let system_instruction = if system_text.is_empty() {
            None
        } else {
            Some(Content {
                role: None,
                parts: vec![Part::text(system_text.join("\n\n"))],
            })
        };

        let tools = if tools.is_empty() {
            None
        } else {
            Some(vec![ToolDeclarations {
                function_declarations: tools
                    .iter()
                    .map(|t| FunctionDeclaration {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: sanitize_schema(t.parameters.clone()),
                    })
                    .collect(),
            }])
        };

        Self {
            system_instruction,
            contents,
            tools,
            generation_config: temperature.map(|t| GenerationConfig {
                temperature: Some(t),
            }),
        }
    }
}

impl GenerateContentResponse {
    /// Flatten the first candidate into a [`ModelResponse`], minting an
    /// invocation id for each function call.
    pub fn into_model_response(self) -> Result<ModelResponse> {
        let usage = self
            .usage_metadata
            .map(|u| Usage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedResponse("response contains no candidates".into()))?;

        let finish_reason = candidate.finish_reason.unwrap_or(FinishReason::Stop);
        let content = candidate
            .content
            .ok_or_else(|| Error::MalformedResponse("candidate has no content".into()))?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for part in content.parts {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(call) = part.function_call {
                if call.name.trim().is_empty() {
                    return Err(Error::MalformedResponse(
                        "function call with empty name".into(),
                    ));
                }
                tool_calls.push(ToolCall::new(call.name, call.args));
            }
        }

        Ok(ModelResponse {
            text,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

/// Reduce a schemars-generated schema to the subset Gemini function
/// declarations accept: strip metadata keys and rewrite `"type": [T, "null"]`
/// unions into `nullable` fields.
pub(crate) fn sanitize_schema(mut schema: Value) -> Value {
    sanitize_in_place(&mut schema);
    schema
}

fn sanitize_in_place(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("$schema");
            map.remove("title");
            map.remove("additionalProperties");

            if let Some(Value::Array(types)) = map.get("type") {
                let non_null: Vec<Value> = types
                    .iter()
                    .filter(|t| t.as_str() != Some("null"))
                    .cloned()
                    .collect();
                let was_nullable = non_null.len() < types.len();
                if let [single] = non_null.as_slice() {
                    map.insert("type".into(), single.clone());
                    if was_nullable {
                        map.insert("nullable".into(), Value::Bool(true));
                    }
                }
            }

            for child in map.values_mut() {
                sanitize_in_place(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                sanitize_in_place(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, ToolFailure, ToolResult};
    use serde_json::json;

    fn definitions() -> Vec<ToolDefinition> {
        vec![ToolDefinition::new(
            "list_tasks",
            "Liệt kê các công việc trong danh sách mặc định.",
            json!({"type": "object", "properties": {}}),
        )]
    }

    #[test]
    fn test_system_messages_hoisted() {
        let mut conv = Conversation::with_system("Bạn là trợ lý Google Tasks.");
        conv.push_user("liệt kê task của tôi");

        let request = GenerateContentRequest::from_conversation(&conv, &definitions(), Some(0.2));
        let system = request.system_instruction.unwrap();
        assert_eq!(
            system.parts[0].text.as_deref(),
            Some("Bạn là trợ lý Google Tasks.")
        );
        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].role.as_deref(), Some("user"));
    }

    #[test]
    fn test_consecutive_tool_results_grouped() {
        let mut conv = Conversation::new();
        conv.push_user("dọn lịch");
        conv.push(Message::assistant_with_calls(
            String::new(),
            vec![
                ToolCall::with_id("c1", "list_events", json!({})),
                ToolCall::with_id("c2", "list_tasks", json!({})),
            ],
        ));
        conv.push(Message::tool_result(
            "c1",
            "list_events",
            ToolResult::success("2 sự kiện"),
        ));
        conv.push(Message::tool_result(
            "c2",
            "list_tasks",
            ToolResult::failure(ToolFailure::api("HTTP 500")),
        ));

        let request = GenerateContentRequest::from_conversation(&conv, &[], None);
        // user, model (two calls), one grouped user entry with both responses
        assert_eq!(request.contents.len(), 3);
        let grouped = &request.contents[2];
        assert_eq!(grouped.role.as_deref(), Some("user"));
        assert_eq!(grouped.parts.len(), 2);
        assert_eq!(
            grouped.parts[1].function_response.as_ref().unwrap().response["error"],
            "HTTP 500"
        );
    }

    #[test]
    fn test_response_with_function_call() {
        let body = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"functionCall": {"name": "create_task", "args": {"title": "mua sữa"}}}
                    ]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 42, "candidatesTokenCount": 7}
        });
        let parsed: GenerateContentResponse = serde_json::from_value(body).unwrap();
        let response = parsed.into_model_response().unwrap();
        assert!(response.wants_tool_calls());
        assert_eq!(response.tool_calls[0].name, "create_task");
        assert_eq!(response.tool_calls[0].args["title"], "mua sữa");
        assert_eq!(response.usage.total(), 49);
    }

    #[test]
    fn test_empty_candidates_is_malformed() {
        let parsed: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(matches!(
            parsed.into_model_response(),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_sanitize_schema_strips_metadata_and_null_unions() {
        let schema = json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "title": "CreateTaskInput",
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "due_date": {"type": ["string", "null"]}
            },
            "required": ["title"]
        });
        let cleaned = sanitize_schema(schema);
        assert!(cleaned.get("$schema").is_none());
        assert!(cleaned.get("title").is_none());
        assert_eq!(cleaned["properties"]["due_date"]["type"], "string");
        assert_eq!(cleaned["properties"]["due_date"]["nullable"], true);
    }
}
