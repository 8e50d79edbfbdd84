//! CRUD tools over a [`TodoService`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::core::{ToolDefinition, ToolError};
use crate::domain::{
    NewTodo, Priority, SortOrder, Status, TodoFilter, TodoPatch, TodoService, TodoSort, TodoSortKey,
};

/// Arguments for `create_todo`.
#[derive(Deserialize, JsonSchema)]
pub struct CreateTodoArgs {
    /// Todo title (required)
    #[schemars(length(min = 1, max = 200))]
    pub title: String,
    /// Todo description
    #[serde(default)]
    #[schemars(length(max = 2000))]
    pub description: Option<String>,
    /// Due date for the todo (ISO 8601 format)
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Todo priority level (defaults to medium)
    #[serde(default)]
    pub priority: Option<Priority>,
    /// List of tags for the todo
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Arguments for `list_todos`.
#[derive(Deserialize, JsonSchema)]
pub struct ListTodosArgs {
    /// Filter todos by status
    #[serde(default)]
    pub status: Option<Status>,
    /// Filter todos by priority
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Only todos carrying all of these tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Sort field (defaults to created_at)
    #[serde(default)]
    pub sort_by: Option<TodoSortKey>,
    /// Sort direction (defaults to desc)
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

/// Arguments for `update_todo`.
#[derive(Deserialize, JsonSchema)]
pub struct UpdateTodoArgs {
    /// Todo ID to update (required)
    pub id: i64,
    /// New title for the todo
    #[serde(default)]
    #[schemars(length(min = 1, max = 200))]
    pub title: Option<String>,
    /// New description for the todo
    #[serde(default)]
    #[schemars(length(max = 2000))]
    pub description: Option<String>,
    /// New due date (ISO 8601 format)
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// New status for the todo
    #[serde(default)]
    pub status: Option<Status>,
    /// New priority for the todo
    #[serde(default)]
    pub priority: Option<Priority>,
    /// New tags for the todo
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Arguments for `delete_todo`.
#[derive(Deserialize, JsonSchema)]
pub struct DeleteTodoArgs {
    /// Todo ID to delete (required)
    pub id: i64,
}

/// `create_todo`, `list_todos`, `update_todo`, and `delete_todo`.
pub fn todo_tools(service: Arc<dyn TodoService>) -> Vec<ToolDefinition> {
    let create = {
        let service = service.clone();
        ToolDefinition::from_fn(
            "create_todo",
            "Create a new todo item",
            move |args: CreateTodoArgs| {
                let service = service.clone();
                async move {
                    let todo = service.create(NewTodo {
                        title: args.title,
                        description: args.description,
                        due_date: args.due_date,
                        priority: args.priority,
                        tags: args.tags,
                    })?;
                    Ok::<_, ToolError>(todo)
                }
            },
        )
    };

    let list = {
        let service = service.clone();
        ToolDefinition::from_fn(
            "list_todos",
            "List todo items with optional filters and sorting",
            move |args: ListTodosArgs| {
                let service = service.clone();
                async move {
                    let filter = TodoFilter {
                        status: args.status,
                        priority: args.priority,
                        tags: args.tags,
                    };
                    let sort = TodoSort::new(
                        args.sort_by.unwrap_or_default(),
                        args.sort_order.unwrap_or_default(),
                    );
                    let todos = service.list(&filter, sort);
                    Ok::<_, ToolError>(json!({ "count": todos.len(), "todos": todos }))
                }
            },
        )
    };

    let update = {
        let service = service.clone();
        ToolDefinition::from_fn(
            "update_todo",
            "Update an existing todo item (partial update)",
            move |args: UpdateTodoArgs| {
                let service = service.clone();
                async move {
                    let patch = TodoPatch {
                        title: args.title,
                        description: args.description,
                        due_date: args.due_date,
                        priority: args.priority,
                        status: args.status,
                        tags: args.tags,
                    };
                    Ok::<_, ToolError>(service.update(args.id, patch)?)
                }
            },
        )
    };

    let delete = ToolDefinition::from_fn(
        "delete_todo",
        "Delete a todo item (soft delete)",
        move |args: DeleteTodoArgs| {
            let service = service.clone();
            async move {
                service.delete(args.id)?;
                Ok::<_, ToolError>(json!({ "id": args.id, "deleted": true }))
            }
        },
    );

    vec![create, list, update, delete]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_schema_for;

    #[test]
    fn create_schema_carries_limits_and_enums() {
        let schema = json_schema_for::<CreateTodoArgs>();
        assert_eq!(schema["required"], json!(["title"]));
        assert_eq!(schema["properties"]["title"]["minLength"], 1);
        assert_eq!(schema["properties"]["title"]["maxLength"], 200);
        let text = schema.to_string();
        assert!(text.contains("\"urgent\""));
        assert!(text.contains("date-time"));
    }

    #[test]
    fn update_requires_integer_id() {
        let schema = json_schema_for::<UpdateTodoArgs>();
        assert_eq!(schema["required"], json!(["id"]));
        assert_eq!(schema["properties"]["id"]["type"], "integer");
    }
}
