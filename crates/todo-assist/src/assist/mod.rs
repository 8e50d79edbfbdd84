//! AI assistance: request/result types, the response cache, the fallback
//! catalog, prompt rendering, reply parsing, and the [`ModelGateway`] that
//! ties them together.

pub mod cache;
pub mod fallback;
pub mod fingerprint;
pub mod gateway;
pub mod parse;
pub mod prompt;
pub mod ranking;
pub mod types;

pub use cache::{CacheStats, ResponseCache};
pub use fallback::fallback_for;
pub use fingerprint::Fingerprint;
pub use gateway::ModelGateway;
pub use parse::ParseError;
pub use types::{
    Assistance, AssistanceRequest, AssistanceResult, PreconditionError, Provenance, RankedTask,
    Subtask, Suggestion, TaskSummary,
};
