//! Agent construction.

use std::sync::Arc;
use std::time::Duration;

use crate::client::GeminiClient;
use crate::google::{AccessTokenProvider, GoogleClient, StaticTokenProvider};
use crate::tools::ToolRegistry;
use crate::{Error, Result};

use super::config::{AgentConfig, AgentKind};
use super::execution::Agent;
use super::executor::Executor;
use super::reasoner::{GeminiReasoner, Reasoner};

/// Builder for [`Agent`].
///
/// The usual path is a [`kind`](Self::kind) plus credentials from the
/// environment; every part can also be supplied explicitly (a custom tool
/// registry, a scripted reasoner in tests, a shared Google client).
pub struct AgentBuilder {
    kind: Option<AgentKind>,
    config: AgentConfig,
    system_prompt: Option<String>,
    reasoner: Option<Arc<dyn Reasoner>>,
    registry: Option<Arc<ToolRegistry>>,
    api_key: Option<String>,
    google: Option<Arc<GoogleClient>>,
    token_provider: Option<Arc<dyn AccessTokenProvider>>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            kind: None,
            config: AgentConfig::default(),
            system_prompt: None,
            reasoner: None,
            registry: None,
            api_key: None,
            google: None,
            token_provider: None,
        }
    }

    /// Select a built-in agent kind: tool set plus default system prompt.
    pub fn kind(mut self, kind: AgentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.config.max_rounds = max_rounds;
        self
    }

    pub fn reasoner_timeout(mut self, timeout: Duration) -> Self {
        self.config.reasoner_timeout = timeout;
        self
    }

    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.config.tool_timeout = timeout;
        self
    }

    /// Override the default system prompt for the chosen kind.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Gemini API key; falls back to `GEMINI_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Use an explicit tool registry instead of a kind's default set. An
    /// `Arc` so several agents can share one registry.
    pub fn registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Share an already-built Google client across agents.
    pub fn google_client(mut self, google: Arc<GoogleClient>) -> Self {
        self.google = Some(google);
        self
    }

    /// Token source for the Google APIs; falls back to `GOOGLE_ACCESS_TOKEN`.
    pub fn token_provider(mut self, provider: Arc<dyn AccessTokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Replace the model-backed reasoner entirely (tests, other backends).
    pub fn reasoner(mut self, reasoner: Arc<dyn Reasoner>) -> Self {
        self.reasoner = Some(reasoner);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let config = self.config;

        let registry = match (self.registry, self.kind) {
            (Some(registry), _) => registry,
            (None, Some(kind)) => {
                let google = match self.google {
                    Some(google) => google,
                    None => {
                        let auth: Arc<dyn AccessTokenProvider> = match self.token_provider {
                            Some(provider) => provider,
                            None => Arc::new(StaticTokenProvider::from_env()?),
                        };
                        Arc::new(GoogleClient::new(auth)?)
                    }
                };
                Arc::new(ToolRegistry::from_tools(kind.tools(&google))?)
            }
            (None, None) => {
                return Err(Error::Config(
                    "an agent needs a kind() or an explicit registry()".into(),
                ));
            }
        };

        let system_prompt = self
            .system_prompt
            .or_else(|| self.kind.map(|kind| kind.system_prompt()))
            .unwrap_or_default();

        let reasoner: Arc<dyn Reasoner> = match self.reasoner {
            Some(reasoner) => reasoner,
            None => {
                let mut builder = GeminiClient::builder()
                    .model(config.model.clone())
                    .temperature(config.temperature)
                    .timeout(config.reasoner_timeout);
                if let Some(key) = self.api_key {
                    builder = builder.api_key(key);
                }
                Arc::new(GeminiReasoner::new(Arc::new(builder.build()?)))
            }
        };

        Ok(Agent {
            reasoner,
            executor: Executor::new(registry, config.tool_timeout),
            config,
            system_prompt,
        })
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
