//! Shared plumbing for the Google Workspace REST APIs.
//!
//! One authenticated handle serves every tool in a registry; it is built
//! explicitly at startup and passed by reference, never read from ambient
//! global state, so concurrent sessions can share it safely (it holds no
//! mutable per-conversation state).

pub mod auth;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::debug;

use crate::types::ToolFailure;
use crate::{Error, Result};

pub use auth::{AccessTokenProvider, OAuthTokenCache, StaticTokenProvider};

const CALENDAR_BASE: &str = "https://www.googleapis.com/calendar/v3";
const TASKS_BASE: &str = "https://tasks.googleapis.com/tasks/v1";
const GMAIL_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated handle for the Calendar, Tasks, and Gmail REST APIs.
pub struct GoogleClient {
    http: reqwest::Client,
    auth: Arc<dyn AccessTokenProvider>,
    calendar_base: String,
    tasks_base: String,
    gmail_base: String,
}

impl GoogleClient {
    pub fn new(auth: Arc<dyn AccessTokenProvider>) -> Result<Self> {
        Self::builder(auth).build()
    }

    pub fn builder(auth: Arc<dyn AccessTokenProvider>) -> GoogleClientBuilder {
        GoogleClientBuilder {
            auth,
            base_url: None,
            timeout: None,
        }
    }

    pub(crate) fn calendar_url(&self, path: &str) -> String {
        format!("{}{}", self.calendar_base, path)
    }

    pub(crate) fn tasks_url(&self, path: &str) -> String {
        format!("{}{}", self.tasks_base, path)
    }

    pub(crate) fn gmail_url(&self, path: &str) -> String {
        format!("{}{}", self.gmail_base, path)
    }

    pub(crate) async fn get(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> std::result::Result<Value, ToolFailure> {
        self.request(Method::GET, url, query, None)
            .await
            .map(unwrap_body)
    }

    pub(crate) async fn post(
        &self,
        url: String,
        body: &Value,
    ) -> std::result::Result<Value, ToolFailure> {
        self.request(Method::POST, url, &[], Some(body))
            .await
            .map(unwrap_body)
    }

    pub(crate) async fn put(
        &self,
        url: String,
        body: &Value,
    ) -> std::result::Result<Value, ToolFailure> {
        self.request(Method::PUT, url, &[], Some(body))
            .await
            .map(unwrap_body)
    }

    pub(crate) async fn patch(
        &self,
        url: String,
        body: &Value,
    ) -> std::result::Result<Value, ToolFailure> {
        self.request(Method::PATCH, url, &[], Some(body))
            .await
            .map(unwrap_body)
    }

    pub(crate) async fn delete(&self, url: String) -> std::result::Result<(), ToolFailure> {
        self.request(Method::DELETE, url, &[], None).await.map(|_| ())
    }

    async fn request(
        &self,
        method: Method,
        url: String,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> std::result::Result<Option<Value>, ToolFailure> {
        let token = self
            .auth
            .access_token()
            .await
            .map_err(|e| ToolFailure::api(format!("không lấy được access token: {e}")))?;

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(token.expose_secret());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, %url, "Google API request");
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ToolFailure::timeout(DEFAULT_TIMEOUT)
            } else {
                ToolFailure::api(format!("HTTP request failed: {e}"))
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ToolFailure::not_found(format!("HTTP 404 for {url}")));
        }
        if !status.is_success() {
            let excerpt = excerpt(&response.text().await.unwrap_or_default());
            return Err(ToolFailure::api(format!(
                "HTTP {}: {}",
                status.as_u16(),
                excerpt
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ToolFailure::api(format!("failed to read response body: {e}")))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ToolFailure::api(format!("invalid JSON from Google API: {e}")))
    }
}

fn unwrap_body(body: Option<Value>) -> Value {
    body.unwrap_or(Value::Null)
}

fn excerpt(body: &str) -> String {
    const MAX: usize = 300;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX).collect();
        format!("{head}...")
    }
}

/// Builder for [`GoogleClient`].
pub struct GoogleClientBuilder {
    auth: Arc<dyn AccessTokenProvider>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GoogleClientBuilder {
    /// Point every service at one origin. Intended for tests against a mock
    /// server; production keeps the per-service Google hosts.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<GoogleClient> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(Error::Network)?;

        let (calendar_base, tasks_base, gmail_base) = match self.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/').to_string();
                (
                    format!("{base}/calendar/v3"),
                    format!("{base}/tasks/v1"),
                    format!("{base}/gmail/v1"),
                )
            }
            None => (
                CALENDAR_BASE.to_string(),
                TASKS_BASE.to_string(),
                GMAIL_BASE.to_string(),
            ),
        };

        Ok(GoogleClient {
            http,
            auth: self.auth,
            calendar_base,
            tasks_base,
            gmail_base,
        })
    }
}
