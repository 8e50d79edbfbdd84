//! AI assistance and tool routing for a todo backend.
//!
//! `todo-assist` sits between a todo store and two kinds of caller. Users of
//! the backend ask the [`ModelGateway`](assist::ModelGateway) for help:
//! suggestions from a free-text description, a ranking of existing todos,
//! or a breakdown of one task into ordered subtasks. External agents call
//! the todo operations themselves through the
//! [`ToolRouter`](tools::ToolRouter), which checks every call against the
//! tool's JSON Schema before a handler runs.
//!
//! The gateway never fails because the model did. Every request is answered
//! either from the model (after retry, timeout, and reply validation) or
//! from a deterministic fallback catalog, and the answer says which. Only
//! bad caller input is reported as an error.
//!
//! # Getting started
//!
//! ```no_run
//! use std::sync::Arc;
//! use todo_assist::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let todos: Arc<dyn TodoService> = Arc::new(InMemoryTodoStore::new());
//! let assistant = GatewayConfig::from_env().build_assistant(todos)?;
//!
//! let help = assistant.gateway.suggest("organize my files").await?;
//! println!("{}", serde_json::to_string_pretty(&help)?);
//!
//! let created = assistant
//!     .router
//!     .call_tool("create_todo", serde_json::json!({"title": "Sort photos"}))
//!     .await;
//! assert!(created.is_ok());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`assist`] | Request/result types, [`ModelGateway`](assist::ModelGateway), response cache, fallback catalog, prompt rendering, reply parsing |
//! | [`api`] | [`ModelProvider`](api::ModelProvider) implementations and retry with backoff |
//! | [`tools`] | Tool definitions, registry, argument validation, [`ToolRouter`](tools::ToolRouter), built-in todo and assistance tools |
//! | [`domain`] | Todo records, [`TodoService`](domain::TodoService), in-memory store |
//! | [`config`] | Gateway configuration and wiring |
//! | [`logging`] | `tracing` subscriber setup |

pub mod api;
pub mod assist;
pub mod config;
pub mod domain;
pub mod logging;
pub mod prelude;
pub mod tools;

use std::time::{Duration, Instant};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::api::ProviderError;

// Re-export schemars for downstream crates.
pub use schemars;

// ── Constants ──────────────────────────────────────────────────────

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model for assistance calls.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Sampling temperature for assistance calls.
pub const ASSIST_TEMPERATURE: f32 = 0.3;

/// Completion budget for assistance calls.
pub const ASSIST_MAX_TOKENS: u32 = 500;

/// Whole-request ceiling for the HTTP client. Per-attempt deadlines are
/// enforced by the gateway and are normally much shorter.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest error body kept in a [`ProviderError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 500;

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`. Tool input schemas are built this way.
///
/// # Example
///
/// ```
/// use todo_assist::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct DeleteArgs {
///     id: i64,
///     #[serde(default)]
///     reason: Option<String>,
/// }
///
/// let schema = json_schema_for::<DeleteArgs>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"id".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body (OpenAI-compatible).
#[derive(Serialize, Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    /// A request that asks for a single JSON object as the reply.
    pub fn json_reply(
        model: impl Into<String>,
        messages: Vec<Message>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens,
            temperature,
            response_format: Some(ResponseFormat {
                fmt_type: ResponseFormatType::JsonObject,
            }),
        }
    }
}

/// JSON output format type.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ResponseFormatType {
    #[serde(rename = "json_object")]
    JsonObject,
}

/// JSON output mode.
#[derive(Serialize, Debug, Clone)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub fmt_type: ResponseFormatType,
}

/// Role of a message sender.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from [`ChatClient::chat`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// Decode a successful HTTP body into a [`ChatCompletion`].
fn parse_completion(text: &str) -> Result<ChatCompletion, ProviderError> {
    let parsed: RawChatResponse = serde_json::from_str(text)
        .map_err(|e| ProviderError::Transport(format!("failed to parse response: {e}")))?;

    if let Some(err) = parsed.error {
        return Err(ProviderError::Transport(format!("API error: {}", err.message)));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    let choice = parsed.choices.and_then(|c| c.into_iter().next());
    match choice {
        Some(c) => {
            debug!(
                "LLM output: {} chars",
                c.message.content.as_ref().map_or(0, |s| s.len())
            );
            Ok(ChatCompletion {
                content: c.message.content,
                usage: parsed.usage,
                finish_reason: c.finish_reason,
            })
        }
        None => {
            debug!("LLM output: empty (no choices)");
            Ok(ChatCompletion {
                content: None,
                usage: parsed.usage,
                finish_reason: None,
            })
        }
    }
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("todo-assist/", env!("CARGO_PKG_VERSION")))
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, ProviderError> {
        debug!(
            "LLM request: model={}, messages={}, max_tokens={}, temp={}",
            body.model,
            body.messages.len(),
            body.max_tokens,
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(HTTP_TIMEOUT)
                } else {
                    ProviderError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ProviderError::Transport(format!("failed to read response: {e}")))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        parse_completion(&text)
    }
}
