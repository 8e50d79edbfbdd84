//! Request and result shapes for the assistance gateway.
//!
//! Requests and results are tagged enums (`"kind"` discriminator on the
//! wire). A result never says where it came from; that lives on the
//! [`Assistance`] envelope as [`Provenance`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{Priority, Todo};

/// Maximum characters accepted for a free-text request field.
pub const MAX_TEXT_CHARS: usize = 2000;

/// Maximum tasks in a single prioritize request.
pub const MAX_TASKS: usize = 50;

// ── Requests ───────────────────────────────────────────────────────

/// Read-only projection of a todo handed to the prioritizer.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct TaskSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<&Todo> for TaskSummary {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title.clone(),
            due_date: todo.due_date,
            priority: todo.priority,
            tags: todo.tags.clone(),
        }
    }
}

/// A request for model assistance.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssistanceRequest {
    /// Turn a free-text description into candidate todos.
    Suggest { description: String },
    /// Rank existing tasks.
    Prioritize { tasks: Vec<TaskSummary> },
    /// Split one task into ordered subtasks.
    Breakdown { task: String },
}

impl AssistanceRequest {
    pub fn suggest(description: impl Into<String>) -> Self {
        Self::Suggest {
            description: description.into(),
        }
    }

    pub fn prioritize(tasks: Vec<TaskSummary>) -> Self {
        Self::Prioritize { tasks }
    }

    pub fn breakdown(task: impl Into<String>) -> Self {
        Self::Breakdown { task: task.into() }
    }

    /// Variant tag, as used in fingerprints and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Suggest { .. } => "suggest",
            Self::Prioritize { .. } => "prioritize",
            Self::Breakdown { .. } => "breakdown",
        }
    }

    /// Check caller-supplied input. The only error the gateway surfaces.
    pub fn validate(&self) -> Result<(), PreconditionError> {
        match self {
            Self::Suggest { description } => check_text("description", description),
            Self::Breakdown { task } => check_text("task", task),
            Self::Prioritize { tasks } => {
                if tasks.is_empty() {
                    return Err(PreconditionError::NoTasks);
                }
                if tasks.len() > MAX_TASKS {
                    return Err(PreconditionError::TooManyTasks { max: MAX_TASKS });
                }
                let mut seen = HashSet::new();
                for task in tasks {
                    if !seen.insert(task.id) {
                        return Err(PreconditionError::DuplicateTaskId(task.id));
                    }
                    if task.title.trim().is_empty() {
                        return Err(PreconditionError::EmptyField("title"));
                    }
                }
                Ok(())
            }
        }
    }
}

fn check_text(field: &'static str, value: &str) -> Result<(), PreconditionError> {
    if value.trim().is_empty() {
        return Err(PreconditionError::EmptyField(field));
    }
    if value.chars().count() > MAX_TEXT_CHARS {
        return Err(PreconditionError::TooLong {
            field,
            max: MAX_TEXT_CHARS,
        });
    }
    Ok(())
}

/// Invalid caller input. Surfaced as-is and never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("at least one task is required")]
    NoTasks,
    #[error("at most {max} tasks can be prioritized at once")]
    TooManyTasks { max: usize },
    #[error("duplicate task id {0}")]
    DuplicateTaskId(i64),
}

// ── Results ────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct RankedTask {
    #[serde(rename = "todo_id")]
    pub task_id: i64,
    pub title: String,
    pub recommended_priority: Priority,
    pub reasoning: String,
}

/// One step of a breakdown. `order` is 1-based; `dependencies` hold the
/// `order` values of earlier steps.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct Subtask {
    pub title: String,
    pub order: u32,
    pub dependencies: Vec<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssistanceResult {
    Suggestions { suggestions: Vec<Suggestion> },
    RankedTasks { ranked_todos: Vec<RankedTask> },
    Subtasks { subtasks: Vec<Subtask> },
}

impl AssistanceResult {
    /// Structural validity: non-empty, dense 1-based subtask orders, and
    /// dependencies pointing only at earlier steps.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Suggestions { suggestions } => {
                !suggestions.is_empty() && suggestions.iter().all(|s| !s.title.trim().is_empty())
            }
            Self::RankedTasks { ranked_todos } => {
                let mut seen = HashSet::new();
                !ranked_todos.is_empty() && ranked_todos.iter().all(|r| seen.insert(r.task_id))
            }
            Self::Subtasks { subtasks } => {
                !subtasks.is_empty()
                    && subtasks.iter().enumerate().all(|(i, s)| {
                        s.order as usize == i + 1
                            && s.dependencies.iter().all(|&d| d >= 1 && d < s.order)
                    })
            }
        }
    }
}

/// Where a result came from.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Model,
    Fallback,
}

/// A result plus its provenance.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Assistance {
    pub result: AssistanceResult,
    #[serde(rename = "source")]
    pub provenance: Provenance,
}

impl Assistance {
    pub fn model(result: AssistanceResult) -> Self {
        Self {
            result,
            provenance: Provenance::Model,
        }
    }

    pub fn fallback(result: AssistanceResult) -> Self {
        Self {
            result,
            provenance: Provenance::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.provenance == Provenance::Fallback
    }
}
