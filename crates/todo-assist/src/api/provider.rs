//! Model providers.
//!
//! The [`ModelProvider`] trait is the gateway's only view of a language
//! model: a rendered prompt goes in, reply text (or a [`ProviderError`])
//! comes out. Implementations:
//!
//! - [`ChatProvider`]: OpenAI-compatible chat completions over HTTP.
//! - [`DisabledProvider`]: always unavailable; the gateway then serves
//!   everything from the fallback catalog.
//! - [`ScriptedProvider`]: canned replies, failure injection, and latency
//!   for tests and demos.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::trace;

use crate::assist::prompt::RenderedPrompt;
use crate::{ASSIST_MAX_TOKENS, ASSIST_TEMPERATURE, ChatClient, ChatRequest, Message};

/// Provider-side failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider returned an empty reply")]
    EmptyResponse,
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Whether another attempt could succeed. Rate limits, server errors,
    /// timeouts, and network failures are transient; other HTTP statuses
    /// and an unavailable provider are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) | Self::EmptyResponse => true,
            Self::Status { status, .. } => matches!(*status, 408 | 429 | 500..=599),
            Self::Unavailable(_) => false,
        }
    }
}

/// Boxed future returned by [`ModelProvider::complete`].
pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send + 'a>>;

/// A language model the gateway can ask for a completion.
///
/// Uses a boxed future so the trait stays dyn-compatible.
pub trait ModelProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Send one prompt and return the raw reply text.
    fn complete(&self, prompt: &RenderedPrompt) -> CompletionFuture<'_>;
}

// ── ChatProvider ───────────────────────────────────────────────────

/// Chat-completions provider with fixed generation parameters.
pub struct ChatProvider {
    client: ChatClient,
    model: String,
}

impl ChatProvider {
    pub fn new(client: ChatClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ModelProvider for ChatProvider {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &RenderedPrompt) -> CompletionFuture<'_> {
        let body = ChatRequest::json_reply(
            self.model.clone(),
            vec![
                Message::system(prompt.system.clone()),
                Message::user(prompt.user.clone()),
            ],
            ASSIST_MAX_TOKENS,
            ASSIST_TEMPERATURE,
        );
        Box::pin(async move {
            let completion = self.client.chat(&body).await?;
            trace!("{} finish_reason={:?}", self.model, completion.finish_reason);
            completion
                .content
                .filter(|c| !c.trim().is_empty())
                .ok_or(ProviderError::EmptyResponse)
        })
    }
}

// ── DisabledProvider ───────────────────────────────────────────────

/// A provider that is never available.
#[derive(Debug, Clone)]
pub struct DisabledProvider {
    reason: String,
}

impl DisabledProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for DisabledProvider {
    fn default() -> Self {
        Self::new("no API key configured")
    }
}

impl ModelProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    fn complete(&self, _prompt: &RenderedPrompt) -> CompletionFuture<'_> {
        let err = ProviderError::Unavailable(self.reason.clone());
        Box::pin(async move { Err(err) })
    }
}

// ── ScriptedProvider ───────────────────────────────────────────────

/// A provider that plays back a script.
///
/// Each call pops the next scripted outcome; once the script is empty the
/// `otherwise` outcome repeats forever. An optional delay is applied before
/// every reply.
///
/// ```
/// use todo_assist::api::provider::{ProviderError, ScriptedProvider};
///
/// let provider = ScriptedProvider::failing(ProviderError::EmptyResponse)
///     .then_fail(ProviderError::Transport("reset".into()))
///     .then_reply(r#"{"suggestions": []}"#);
/// assert_eq!(provider.calls(), 0);
/// ```
#[derive(Debug)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    otherwise: Result<String, ProviderError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<RenderedPrompt>>,
}

impl ScriptedProvider {
    fn with_otherwise(otherwise: Result<String, ProviderError>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            otherwise,
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with `reply` once the script runs out.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::with_otherwise(Ok(reply.into()))
    }

    /// Always fail with `error` once the script runs out.
    pub fn failing(error: ProviderError) -> Self {
        Self::with_otherwise(Err(error))
    }

    /// Queue a successful reply.
    pub fn then_reply(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()))
    }

    /// Queue a failure.
    pub fn then_fail(self, error: ProviderError) -> Self {
        self.push(Err(error))
    }

    /// Sleep this long before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, outcome: Result<String, ProviderError>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
        self
    }

    /// Number of `complete` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<RenderedPrompt> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(&self, prompt: &RenderedPrompt) -> CompletionFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.clone());
        let outcome = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.otherwise.clone());
        let delay = self.delay;
        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            outcome
        })
    }
}
