//! Todo records, filters, and the [`TodoService`] collaborator trait.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

// ── Enums ──────────────────────────────────────────────────────────

/// Todo priority. Totally ordered `low < medium < high < urgent`.
#[derive(
    Serialize,
    Deserialize,
    JsonSchema,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Todo lifecycle status.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    /// Whether the todo still needs work.
    pub fn is_open(&self) -> bool {
        matches!(self, Status::Pending | Status::InProgress)
    }
}

// ── Records ────────────────────────────────────────────────────────

/// A stored todo item.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub status: Status,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Fields for a new todo. Absent priority means `medium`.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewTodo {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial update. `None` fields are left untouched.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct TodoPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

// ── Listing ────────────────────────────────────────────────────────

/// List filter. A todo must carry every tag in `tags` to match.
#[derive(Clone, Debug, Default)]
pub struct TodoFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
}

impl TodoFilter {
    pub fn matches(&self, todo: &Todo) -> bool {
        self.status.is_none_or(|s| todo.status == s)
            && self.priority.is_none_or(|p| todo.priority == p)
            && self.tags.iter().all(|t| todo.tags.iter().any(|have| have == t))
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TodoSortKey {
    #[default]
    CreatedAt,
    ModifiedAt,
    DueDate,
    Priority,
    Title,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Sort specification. Defaults to newest first; ties break on id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TodoSort {
    pub key: TodoSortKey,
    pub order: SortOrder,
}

impl TodoSort {
    pub fn new(key: TodoSortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// Compare two todos. Missing due dates sort last in either direction.
    pub fn compare(&self, a: &Todo, b: &Todo) -> Ordering {
        let ord = match self.key {
            TodoSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            TodoSortKey::ModifiedAt => a.modified_at.cmp(&b.modified_at),
            TodoSortKey::Priority => a.priority.cmp(&b.priority),
            TodoSortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            TodoSortKey::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
        .then(a.id.cmp(&b.id));
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

// ── Service ────────────────────────────────────────────────────────

/// Domain failures. Messages are surfaced to tool callers verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Todo with id {0} not found")]
    NotFound(i64),
    #[error("{0}")]
    Invalid(String),
}

/// CRUD operations over the todo store.
///
/// All calls are synchronous; implementations serialize access internally.
pub trait TodoService: Send + Sync {
    fn create(&self, new: NewTodo) -> Result<Todo, DomainError>;

    fn get(&self, id: i64) -> Result<Todo, DomainError>;

    fn list(&self, filter: &TodoFilter, sort: TodoSort) -> Vec<Todo>;

    fn update(&self, id: i64, patch: TodoPatch) -> Result<Todo, DomainError>;

    /// Soft delete. Deleted todos are invisible to every other operation.
    fn delete(&self, id: i64) -> Result<(), DomainError>;
}
