//! Gateway configuration with sensible defaults.
//!
//! [`GatewayConfig`] holds everything needed to stand up the assistance
//! side of the backend and turns it into a [`ModelGateway`] via
//! [`build_gateway`](GatewayConfig::build_gateway), or into a full
//! [`Assistant`] (gateway plus tool router) via
//! [`build_assistant`](GatewayConfig::build_assistant).

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::api::{ChatProvider, DisabledProvider, ModelProvider, RetryConfig};
use crate::assist::ModelGateway;
use crate::assist::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL, ResponseCache};
use crate::domain::TodoService;
use crate::tools::{RegistryError, ToolRouter, standard_registry};
use crate::{ChatClient, DEFAULT_MODEL, OPENAI_CHAT_URL};

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable overriding the model name.
pub const MODEL_ENV: &str = "TODO_ASSIST_MODEL";
/// Environment variable overriding the completions endpoint.
pub const ENDPOINT_ENV: &str = "TODO_ASSIST_ENDPOINT";

/// Configuration for the assistance gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Model identifier. Default: `"gpt-4"`.
    pub model: String,
    /// Chat completions URL. Default: the OpenAI endpoint.
    pub endpoint: String,
    /// Provider API key. Without one, every request is served from the
    /// fallback catalog.
    pub api_key: Option<String>,
    /// Cache entry lifetime. Default: 10 minutes.
    pub cache_ttl: Duration,
    /// Maximum cached responses. Default: `512`.
    pub cache_capacity: usize,
    /// Backoff and per-attempt timeout.
    pub retry: RetryConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: OPENAI_CHAT_URL.to_string(),
            api_key: None,
            cache_ttl: DEFAULT_TTL,
            cache_capacity: DEFAULT_MAX_ENTRIES,
            retry: RetryConfig::default(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl GatewayConfig {
    /// Defaults overridden by `OPENAI_API_KEY`, `TODO_ASSIST_MODEL`, and
    /// `TODO_ASSIST_ENDPOINT` where set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.api_key = non_empty(std::env::var(API_KEY_ENV).ok());
        if let Some(model) = non_empty(std::env::var(MODEL_ENV).ok()) {
            config.model = model;
        }
        if let Some(endpoint) = non_empty(std::env::var(ENDPOINT_ENV).ok()) {
            config.endpoint = endpoint;
        }
        config
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the API key. Blank keys count as no key.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = non_empty(api_key);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The configured provider, or a [`DisabledProvider`] when there is no
    /// key or the HTTP client cannot be built.
    pub fn build_provider(&self) -> Arc<dyn ModelProvider> {
        let Some(api_key) = &self.api_key else {
            info!("No API key configured, assistance will use fallback content");
            return Arc::new(DisabledProvider::default());
        };
        match ChatClient::new(api_key.clone(), self.endpoint.clone()) {
            Ok(client) => {
                info!("Assistance provider: {} via {}", self.model, self.endpoint);
                Arc::new(ChatProvider::new(client, self.model.clone()))
            }
            Err(e) => {
                warn!("Provider disabled: {e}");
                Arc::new(DisabledProvider::new(e.to_string()))
            }
        }
    }

    pub fn build_cache(&self) -> Arc<ResponseCache> {
        Arc::new(ResponseCache::new(self.cache_ttl, self.cache_capacity))
    }

    pub fn build_gateway(&self) -> ModelGateway {
        self.build_gateway_with(self.build_provider())
    }

    /// Build a gateway around an explicit provider.
    pub fn build_gateway_with(&self, provider: Arc<dyn ModelProvider>) -> ModelGateway {
        ModelGateway::new(provider, self.build_cache(), self.retry.clone())
    }

    /// Gateway plus a router carrying the standard tool set.
    pub fn build_assistant(&self, todos: Arc<dyn TodoService>) -> Result<Assistant, RegistryError> {
        Assistant::new(self.build_gateway(), todos)
    }
}

/// The assistance gateway and tool router over one todo store.
#[derive(Clone)]
pub struct Assistant {
    pub gateway: ModelGateway,
    pub router: Arc<ToolRouter>,
    pub todos: Arc<dyn TodoService>,
}

impl Assistant {
    pub fn new(gateway: ModelGateway, todos: Arc<dyn TodoService>) -> Result<Self, RegistryError> {
        let registry = standard_registry(todos.clone(), gateway.clone())?;
        Ok(Self {
            gateway,
            router: Arc::new(ToolRouter::new(registry)),
            todos,
        })
    }
}
