//! Access-token acquisition for the Google APIs.
//!
//! The agent core only needs "give me a valid bearer token"; everything else
//! (consent flows, token issuance) happens outside this crate. Two providers
//! are built in: a fixed token (per-request tokens handed in by a fronting
//! service) and a file-backed cache in Google's authorized-user format that
//! refreshes itself when the stored token is stale.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{Error, Result};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Tokens within this margin of expiry are treated as stale.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Source of bearer tokens for the Google REST calls.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<SecretString>;
}

/// A fixed access token, e.g. one passed per request by a fronting API.
pub struct StaticTokenProvider {
    token: SecretString,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }

    /// Read the token from `GOOGLE_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self> {
        std::env::var("GOOGLE_ACCESS_TOKEN")
            .map(Self::new)
            .map_err(|_| Error::Config("GOOGLE_ACCESS_TOKEN is not set".into()))
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<SecretString> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: SecretString,
    expiry: Option<DateTime<Utc>>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        match self.expiry {
            Some(expiry) => expiry - Utc::now() > ChronoDuration::seconds(EXPIRY_MARGIN_SECS),
            // No expiry recorded: assume valid, the API will say otherwise.
            None => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// File-backed token cache over a `token.json` in Google's authorized-user
/// format (`token`, `refresh_token`, `client_id`, `client_secret`, `expiry`).
///
/// The whole read-check-refresh-write sequence runs under one async mutex so
/// concurrent sessions sharing the credential never race on the refresh or on
/// the file.
pub struct OAuthTokenCache {
    http: reqwest::Client,
    path: PathBuf,
    token_uri_override: Option<String>,
    state: Mutex<Option<CachedToken>>,
}

impl OAuthTokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            http: reqwest::Client::new(),
            path: path.into(),
            token_uri_override: None,
            state: Mutex::new(None),
        }
    }

    /// Override the token endpoint. Intended for tests against a local mock.
    pub fn with_token_uri(mut self, uri: impl Into<String>) -> Self {
        self.token_uri_override = Some(uri.into());
        self
    }

    async fn refresh(&self, file: &mut Value) -> Result<CachedToken> {
        let refresh_token = required_field(file, "refresh_token")?;
        let client_id = required_field(file, "client_id")?;
        let client_secret = required_field(file, "client_secret")?;
        let token_uri = self
            .token_uri_override
            .clone()
            .or_else(|| file["token_uri"].as_str().map(String::from))
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        debug!(path = %self.path.display(), "Refreshing Google access token");
        let response = self
            .http
            .post(&token_uri)
            .form(&[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(Error::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "token refresh failed (HTTP {}): {}",
                status.as_u16(),
                body
            )));
        }

        let refreshed: RefreshResponse = response.json().await.map_err(Error::Network)?;
        let expiry = refreshed
            .expires_in
            .map(|secs| Utc::now() + ChronoDuration::seconds(secs));

        // Write the rotated token back so other processes pick it up.
        file["token"] = Value::String(refreshed.access_token.clone());
        if let Some(expiry) = expiry {
            file["expiry"] = Value::String(expiry.to_rfc3339());
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(file)?).await?;
        info!("Google access token refreshed");

        Ok(CachedToken {
            token: SecretString::from(refreshed.access_token),
            expiry,
        })
    }
}

fn required_field(file: &Value, key: &str) -> Result<String> {
    file[key]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| Error::Auth(format!("token file is missing '{key}'")))
}

#[async_trait]
impl AccessTokenProvider for OAuthTokenCache {
    async fn access_token(&self) -> Result<SecretString> {
        let mut guard = self.state.lock().await;

        if let Some(cached) = guard.as_ref()
            && cached.is_fresh()
        {
            return Ok(cached.token.clone());
        }

        let raw = tokio::fs::read_to_string(&self.path).await?;
        let mut file: Value = serde_json::from_str(&raw)?;

        let stored = file["token"].as_str().filter(|s| !s.is_empty()).map(|t| CachedToken {
            token: SecretString::from(t.to_string()),
            expiry: file["expiry"]
                .as_str()
                .and_then(|e| DateTime::parse_from_rfc3339(e).ok())
                .map(|e| e.with_timezone(&Utc)),
        });

        let cached = match stored {
            Some(token) if token.is_fresh() && token.expiry.is_some() => token,
            _ => self.refresh(&mut file).await?,
        };

        let token = cached.token.clone();
        *guard = Some(cached);
        Ok(token)
    }
}
