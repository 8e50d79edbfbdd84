//! Provider plumbing between the gateway and the model API.
//!
//! - [`provider`]: the [`ModelProvider`] trait and its implementations.
//! - [`retry`]: bounded retry state machine with exponential backoff.

pub mod provider;
pub mod retry;

pub use provider::{
    ChatProvider, DisabledProvider, ModelProvider, ProviderError, ScriptedProvider,
};
pub use retry::{ATTEMPT_TIMEOUT, MAX_ATTEMPTS, RetryConfig, RetryOutcome};
