//! Stable content hashes for assistance requests.
//!
//! Two requests that differ only in whitespace, letter case, or tag order
//! share a fingerprint. Task titles keep their case because rankings echo
//! them back. Task order in a prioritize request is kept since it decides
//! ties.

use std::fmt;

use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use super::types::{AssistanceRequest, TaskSummary};

/// SHA-256 hex digest of a request's normalized form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(request: &AssistanceRequest) -> Self {
        let canonical = normalized(request).to_string();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_text(s: &str) -> String {
    collapse_whitespace(s).to_lowercase()
}

fn normalize_task(task: &TaskSummary) -> Value {
    let mut tags: Vec<String> = task.tags.iter().map(|t| normalize_text(t)).collect();
    tags.sort();
    tags.dedup();
    json!({
        "id": task.id,
        "title": collapse_whitespace(&task.title),
        "due_date": task.due_date.map(|d| d.to_rfc3339()),
        "priority": task.priority.as_str(),
        "tags": tags,
    })
}

fn normalized(request: &AssistanceRequest) -> Value {
    let body = match request {
        AssistanceRequest::Suggest { description } => json!(normalize_text(description)),
        AssistanceRequest::Breakdown { task } => json!(normalize_text(task)),
        AssistanceRequest::Prioritize { tasks } => {
            Value::Array(tasks.iter().map(normalize_task).collect())
        }
    };
    json!({ "kind": request.kind(), "body": body })
}
