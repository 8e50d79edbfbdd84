//! The model gateway.
//!
//! [`ModelGateway::invoke`] turns an [`AssistanceRequest`] into an
//! [`Assistance`] and only fails when the request itself is invalid.
//!
//! ```text
//! validate ─▶ fingerprint ─▶ cache hit? ──yes──▶ return
//!                               │ no
//!                               ▼
//!                 in-flight call for this fingerprint? ──yes──▶ await it
//!                               │ no
//!                               ▼
//!            spawn: prompt ─▶ provider (timeout, retry) ─▶ parse
//!                               │ exhausted / permanent error
//!                               ▼
//!                          fallback catalog
//!                               │
//!                          cache.put ─▶ return
//! ```
//!
//! Resolution runs on its own Tokio task, so a caller that stops waiting
//! does not cancel the provider call; the result still lands in the cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, info, warn};

use super::cache::ResponseCache;
use super::fallback::fallback_for;
use super::fingerprint::Fingerprint;
use super::parse::parse_reply;
use super::prompt::RenderedPrompt;
use super::types::{Assistance, AssistanceRequest, AssistanceResult, PreconditionError, TaskSummary};
use crate::api::provider::{ModelProvider, ProviderError};
use crate::api::retry::{AttemptError, RetryConfig, RetryOutcome, run_with_retry};

type InflightCall = Shared<BoxFuture<'static, Assistance>>;

struct GatewayInner {
    provider: Arc<dyn ModelProvider>,
    cache: Arc<ResponseCache>,
    retry: RetryConfig,
    inflight: Mutex<HashMap<Fingerprint, InflightCall>>,
}

/// Removes the in-flight entry when the resolving task ends.
struct InflightGuard {
    inner: Arc<GatewayInner>,
    key: Fingerprint,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.inner
            .inflight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

/// Cloneable handle to the gateway. Clones share the provider, cache, and
/// in-flight table.
#[derive(Clone)]
pub struct ModelGateway {
    inner: Arc<GatewayInner>,
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("provider", &self.inner.provider.name())
            .field("retry", &self.inner.retry)
            .finish()
    }
}

impl ModelGateway {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        cache: Arc<ResponseCache>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                provider,
                cache,
                retry,
                inflight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    pub fn provider_name(&self) -> &str {
        self.inner.provider.name()
    }

    /// Number of provider resolutions currently running.
    pub fn in_flight(&self) -> usize {
        self.inner
            .inflight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub async fn suggest(
        &self,
        description: impl Into<String>,
    ) -> Result<Assistance, PreconditionError> {
        self.invoke(AssistanceRequest::suggest(description)).await
    }

    pub async fn prioritize(
        &self,
        tasks: Vec<TaskSummary>,
    ) -> Result<Assistance, PreconditionError> {
        self.invoke(AssistanceRequest::prioritize(tasks)).await
    }

    pub async fn breakdown(&self, task: impl Into<String>) -> Result<Assistance, PreconditionError> {
        self.invoke(AssistanceRequest::breakdown(task)).await
    }

    /// Resolve a request. Identical concurrent requests share one
    /// provider resolution.
    pub async fn invoke(&self, request: AssistanceRequest) -> Result<Assistance, PreconditionError> {
        request.validate()?;
        let key = Fingerprint::of(&request);

        if let Some(hit) = self.inner.cache.get(&key) {
            debug!("{} {}: cache hit", request.kind(), key.short());
            return Ok(hit);
        }

        let call = {
            let mut inflight = self.inner.inflight.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(existing) = inflight.get(&key) {
                debug!("{} {}: joining in-flight call", request.kind(), key.short());
                existing.clone()
            } else if let Some(hit) = self.inner.cache.peek(&key) {
                // Finished between the cache miss and taking the lock.
                return Ok(hit);
            } else {
                let call = self.spawn_resolution(request, key.clone());
                inflight.insert(key, call.clone());
                call
            }
        };

        Ok(call.await)
    }

    fn spawn_resolution(&self, request: AssistanceRequest, key: Fingerprint) -> InflightCall {
        let inner = self.inner.clone();
        let task_request = request.clone();
        let handle = tokio::spawn(async move {
            let guard = InflightGuard {
                inner: inner.clone(),
                key: key.clone(),
            };
            let assistance = resolve(&inner, &task_request, &key).await;
            drop(guard);
            assistance
        });

        async move {
            match handle.await {
                Ok(assistance) => assistance,
                Err(e) => {
                    warn!("{}: resolution task failed ({e}), serving fallback", request.kind());
                    Assistance::fallback(fallback_for(&request))
                }
            }
        }
        .boxed()
        .shared()
    }
}

async fn attempt_once(
    provider: &dyn ModelProvider,
    prompt: &RenderedPrompt,
    request: &AssistanceRequest,
    timeout: Duration,
) -> Result<AssistanceResult, AttemptError> {
    let reply = tokio::time::timeout(timeout, provider.complete(prompt))
        .await
        .map_err(|_| ProviderError::Timeout(timeout))??;
    Ok(parse_reply(request, &reply)?)
}

async fn resolve(inner: &GatewayInner, request: &AssistanceRequest, key: &Fingerprint) -> Assistance {
    let label = format!("{} {}", request.kind(), key.short());
    let prompt = RenderedPrompt::render(request);
    let provider = inner.provider.as_ref();
    let timeout = inner.retry.attempt_timeout;

    let outcome = run_with_retry(
        &inner.retry,
        &label,
        |_| attempt_once(provider, &prompt, request, timeout),
        || fallback_for(request),
    )
    .await;

    let assistance = match outcome {
        RetryOutcome::Success(result) => {
            info!("{label}: model result from {}", provider.name());
            Assistance::model(result)
        }
        RetryOutcome::ExhaustedFallback(result) => {
            warn!("{label}: all attempts failed, serving fallback");
            Assistance::fallback(result)
        }
        RetryOutcome::HardFailure(e) => {
            warn!("{label}: provider failed permanently ({e}), serving fallback");
            Assistance::fallback(fallback_for(request))
        }
    };

    inner.cache.put(key.clone(), assistance.clone());
    assistance
}
