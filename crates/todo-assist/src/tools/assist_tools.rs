//! Assistance tools backed by the [`ModelGateway`].
//!
//! Provider trouble never reaches the caller here: the gateway always
//! answers, with fallback content if it has to. Only bad input and missing
//! todos become tool errors.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use super::core::{ToolDefinition, ToolError};
use crate::assist::types::MAX_TASKS;
use crate::assist::{ModelGateway, PreconditionError, TaskSummary};
use crate::domain::{SortOrder, Status, TodoFilter, TodoService, TodoSort, TodoSortKey};

impl From<PreconditionError> for ToolError {
    fn from(e: PreconditionError) -> Self {
        Self::InvalidArguments(e.to_string())
    }
}

/// Arguments for `suggest_todos`.
#[derive(Deserialize, JsonSchema)]
pub struct SuggestTodosArgs {
    /// What the user wants to get done, in their own words
    #[schemars(length(min = 1, max = 2000))]
    pub description: String,
}

/// Arguments for `prioritize_todos`.
#[derive(Deserialize, JsonSchema)]
pub struct PrioritizeTodosArgs {
    /// Todo IDs to rank, in order. Defaults to the 50 oldest open todos.
    #[serde(default)]
    pub ids: Option<Vec<i64>>,
    /// Rank only todos with this status (ignored when `ids` is given)
    #[serde(default)]
    pub status: Option<Status>,
}

/// Arguments for `breakdown_task`.
#[derive(Deserialize, JsonSchema)]
pub struct BreakdownTaskArgs {
    /// The task to split into subtasks
    #[schemars(length(min = 1, max = 2000))]
    pub task: String,
}

/// Collect the tasks a prioritization covers. Without explicit ids, the
/// selection is the oldest [`MAX_TASKS`] matching todos.
fn gather_tasks(
    service: &dyn TodoService,
    args: &PrioritizeTodosArgs,
) -> Result<Vec<TaskSummary>, ToolError> {
    let todos = match &args.ids {
        Some(ids) => ids
            .iter()
            .map(|&id| service.get(id))
            .collect::<Result<Vec<_>, _>>()?,
        None => {
            let filter = TodoFilter {
                status: args.status,
                ..TodoFilter::default()
            };
            let sort = TodoSort::new(TodoSortKey::CreatedAt, SortOrder::Asc);
            service
                .list(&filter, sort)
                .into_iter()
                .filter(|t| args.status.is_some() || t.status.is_open())
                .take(MAX_TASKS)
                .collect()
        }
    };
    if todos.is_empty() {
        return Err(ToolError::Domain("no todos to prioritize".into()));
    }
    Ok(todos.iter().map(TaskSummary::from).collect())
}

/// `suggest_todos`, `prioritize_todos`, and `breakdown_task`.
pub fn assist_tools(gateway: ModelGateway, service: Arc<dyn TodoService>) -> Vec<ToolDefinition> {
    let suggest = {
        let gateway = gateway.clone();
        ToolDefinition::from_fn(
            "suggest_todos",
            "Suggest todo items for a free-text description",
            move |args: SuggestTodosArgs| {
                let gateway = gateway.clone();
                async move { Ok::<_, ToolError>(gateway.suggest(args.description).await?) }
            },
        )
    };

    let prioritize = {
        let gateway = gateway.clone();
        ToolDefinition::from_fn(
            "prioritize_todos",
            "Rank todo items by recommended priority",
            move |args: PrioritizeTodosArgs| {
                let gateway = gateway.clone();
                let service = service.clone();
                async move {
                    let tasks = gather_tasks(service.as_ref(), &args)?;
                    Ok::<_, ToolError>(gateway.prioritize(tasks).await?)
                }
            },
        )
    };

    let breakdown = ToolDefinition::from_fn(
        "breakdown_task",
        "Break a task down into ordered subtasks",
        move |args: BreakdownTaskArgs| {
            let gateway = gateway.clone();
            async move { Ok::<_, ToolError>(gateway.breakdown(args.task).await?) }
        },
    );

    vec![suggest, prioritize, breakdown]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InMemoryTodoStore, NewTodo, Priority, TodoPatch};
    use crate::tools::core::ErrorCode;

    fn store() -> InMemoryTodoStore {
        let store = InMemoryTodoStore::new();
        store.create(NewTodo::titled("write report")).unwrap();
        store
            .create(NewTodo::titled("pay rent").with_priority(Priority::Urgent))
            .unwrap();
        let done = store.create(NewTodo::titled("old chore")).unwrap();
        store
            .update(
                done.id,
                TodoPatch {
                    status: Some(Status::Completed),
                    ..TodoPatch::default()
                },
            )
            .unwrap();
        store
    }

    #[test]
    fn defaults_to_open_todos_in_creation_order() {
        let store = store();
        let args = PrioritizeTodosArgs {
            ids: None,
            status: None,
        };
        let tasks = gather_tasks(&store, &args).unwrap();
        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["write report", "pay rent"]);
    }

    #[test]
    fn explicit_status_is_honored() {
        let store = store();
        let args = PrioritizeTodosArgs {
            ids: None,
            status: Some(Status::Completed),
        };
        let tasks = gather_tasks(&store, &args).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "old chore");
    }

    #[test]
    fn default_selection_is_capped_at_the_oldest_open_todos() {
        let store = InMemoryTodoStore::new();
        for n in 0..=MAX_TASKS {
            store.create(NewTodo::titled(format!("chore {n}"))).unwrap();
        }
        let args = PrioritizeTodosArgs {
            ids: None,
            status: None,
        };
        let tasks = gather_tasks(&store, &args).unwrap();
        assert_eq!(tasks.len(), MAX_TASKS);
        assert_eq!(tasks[0].title, "chore 0");
        assert_eq!(tasks[MAX_TASKS - 1].title, format!("chore {}", MAX_TASKS - 1));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = store();
        let args = PrioritizeTodosArgs {
            ids: Some(vec![1, 404]),
            status: None,
        };
        let err = gather_tasks(&store, &args).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn nothing_to_rank_is_a_domain_error() {
        let store = InMemoryTodoStore::new();
        let args = PrioritizeTodosArgs {
            ids: None,
            status: None,
        };
        let err = gather_tasks(&store, &args).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DomainError);
    }

    #[test]
    fn precondition_errors_are_invalid_arguments() {
        let err: ToolError = PreconditionError::EmptyField("description").into();
        assert_eq!(err.code(), ErrorCode::InvalidArguments);
        assert_eq!(err.to_string(), "description must not be empty");
    }
}
