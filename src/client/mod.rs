//! Direct client for the Gemini `generateContent` REST API.
//!
//! One synchronous (non-streaming) call per invocation; the agent loop treats
//! the model as an oracle that either answers or requests tool calls.

mod wire;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use crate::types::{Conversation, ModelResponse, ToolDefinition};
use crate::{Error, Result};

use wire::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

pub(crate) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub(crate) const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub(crate) const DEFAULT_TEMPERATURE: f32 = 0.2;
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini API client. Cheap to clone is not a goal; share it behind an `Arc`
/// across agents and sessions — it holds no per-conversation state.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    temperature: Option<f32>,
    timeout: Duration,
}

impl GeminiClient {
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::default()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One model call: full conversation plus tool schemas in, parsed
    /// decision material out. No retries here.
    #[instrument(skip_all, fields(model = %self.model, messages = conversation.len()))]
    pub async fn generate(
        &self,
        conversation: &Conversation,
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse> {
        let request =
            GenerateContentRequest::from_conversation(conversation, tools, self.temperature);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout)
                } else {
                    Error::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| truncate(&body, 400));
            return Err(Error::Api {
                message,
                status: Some(status.as_u16()),
            });
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.timeout)
            } else {
                Error::Network(e)
            }
        })?;
        let model_response = parsed.into_model_response()?;
        debug!(
            tool_calls = model_response.tool_calls.len(),
            finish_reason = ?model_response.finish_reason,
            tokens = model_response.usage.total(),
            "Model call completed"
        );
        Ok(model_response)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    }
}

/// Builder for [`GeminiClient`].
#[derive(Default)]
pub struct GeminiClientBuilder {
    api_key: Option<SecretString>,
    model: Option<String>,
    temperature: Option<f32>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiClientBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Override the API origin. Intended for tests against a local mock.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<GeminiClient> {
        let api_key = match self.api_key {
            Some(key) => key,
            None => std::env::var("GEMINI_API_KEY")
                .map(SecretString::from)
                .map_err(|_| {
                    Error::Config("GEMINI_API_KEY is not set and no api_key was given".into())
                })?,
        };

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Network)?;

        Ok(GeminiClient {
            http,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: Some(self.temperature.unwrap_or(DEFAULT_TEMPERATURE)),
            timeout,
        })
    }
}
