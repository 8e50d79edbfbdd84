//! Bounded retry with exponential backoff.
//!
//! Every provider call gets at most [`MAX_ATTEMPTS`] attempts. Transient
//! provider errors and unparseable replies are retried after
//! `initial_delay * multiplier^attempt` (capped at `max_delay`); a permanent
//! provider error stops immediately. [`run_with_retry`] drives the state
//! machine and ends in exactly one [`RetryOutcome`].

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use super::provider::ProviderError;
use crate::assist::parse::ParseError;

/// Attempts per call, including the first one.
pub const MAX_ATTEMPTS: u32 = 3;

/// Time limit for a single provider attempt.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for backoff and per-attempt timeouts.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Maximum delay between attempts.
    pub max_delay: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
    /// Time limit for a single provider attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            attempt_timeout: ATTEMPT_TIMEOUT,
        }
    }
}

impl RetryConfig {
    /// No backoff delay. Useful in tests.
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Delay after the failed attempt `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        Duration::from_secs_f64(base.min(self.max_delay.as_secs_f64()))
    }
}

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("unusable reply: {0}")]
    Parse(#[from] ParseError),
}

impl AttemptError {
    /// Unparseable replies are always worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_transient(),
            Self::Parse(_) => true,
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryStep {
    /// Sleep, then try again.
    Retry(Duration),
    /// The attempt budget is spent.
    Exhausted(AttemptError),
    /// The error is permanent.
    Abort(AttemptError),
}

/// Per-call retry bookkeeping. Lives on the caller's stack.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempt: u32,
    next_delay: Duration,
}

impl RetryState {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 0,
            next_delay: config.delay_for_attempt(0),
        }
    }

    /// The current attempt (0-indexed).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn next_delay(&self) -> Duration {
        self.next_delay
    }

    /// Record a failure of the current attempt and decide the next step.
    pub fn record_failure(&mut self, config: &RetryConfig, error: AttemptError) -> RetryStep {
        if !error.is_retryable() {
            return RetryStep::Abort(error);
        }
        if self.attempt + 1 >= MAX_ATTEMPTS {
            return RetryStep::Exhausted(error);
        }
        let delay = self.next_delay;
        self.attempt += 1;
        self.next_delay = config.delay_for_attempt(self.attempt);
        RetryStep::Retry(delay)
    }
}

/// Terminal state of a retried call.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T> {
    Success(T),
    /// Every attempt failed; carries the fallback value.
    ExhaustedFallback(T),
    /// A permanent error ended the call early.
    HardFailure(AttemptError),
}

/// Run `attempt` until it succeeds, fails permanently, or runs out of
/// attempts. `fallback` is only evaluated on exhaustion.
pub async fn run_with_retry<T, F, Fut>(
    config: &RetryConfig,
    label: &str,
    mut attempt: F,
    fallback: impl FnOnce() -> T,
) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let mut state = RetryState::new(config);
    loop {
        let n = state.attempt();
        let err = match attempt(n).await {
            Ok(value) => return RetryOutcome::Success(value),
            Err(e) => e,
        };
        warn!(
            "{label}: attempt {}/{MAX_ATTEMPTS} failed: {err}",
            n + 1
        );
        match state.record_failure(config, err) {
            RetryStep::Retry(delay) => {
                if !delay.is_zero() {
                    info!("{label}: retrying in {:.1}s", delay.as_secs_f64());
                    tokio::time::sleep(delay).await;
                }
            }
            RetryStep::Exhausted(_) => return RetryOutcome::ExhaustedFallback(fallback()),
            RetryStep::Abort(e) => return RetryOutcome::HardFailure(e),
        }
    }
}
