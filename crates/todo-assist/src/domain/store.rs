//! Process-local todo store.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::Utc;
use tracing::debug;

use super::todo::{
    DomainError, MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS, NewTodo, Todo, TodoFilter, TodoPatch,
    TodoService, TodoSort,
};

#[derive(Debug)]
struct StoredTodo {
    todo: Todo,
    deleted: bool,
}

#[derive(Debug)]
struct StoreInner {
    next_id: i64,
    todos: BTreeMap<i64, StoredTodo>,
}

/// In-memory [`TodoService`] with soft delete. Contents live as long as
/// the process.
#[derive(Debug)]
pub struct InMemoryTodoStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                next_id: 1,
                todos: BTreeMap::new(),
            }),
        }
    }

    /// Number of live (not deleted) todos.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.todos.values().filter(|s| !s.deleted).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryTodoStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::Invalid("title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(DomainError::Invalid(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

fn check_description(description: &str) -> Result<(), DomainError> {
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(DomainError::Invalid(format!(
            "description must be at most {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(())
}

impl TodoService for InMemoryTodoStore {
    fn create(&self, new: NewTodo) -> Result<Todo, DomainError> {
        let title = check_title(&new.title)?;
        if let Some(ref d) = new.description {
            check_description(d)?;
        }

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = inner.next_id;
        inner.next_id += 1;

        let now = Utc::now();
        let todo = Todo {
            id,
            title,
            description: new.description,
            due_date: new.due_date,
            priority: new.priority.unwrap_or_default(),
            status: Default::default(),
            tags: new.tags,
            created_at: now,
            modified_at: now,
        };
        inner.todos.insert(
            id,
            StoredTodo {
                todo: todo.clone(),
                deleted: false,
            },
        );
        debug!("Created todo {id}");
        Ok(todo)
    }

    fn get(&self, id: i64) -> Result<Todo, DomainError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .todos
            .get(&id)
            .filter(|s| !s.deleted)
            .map(|s| s.todo.clone())
            .ok_or(DomainError::NotFound(id))
    }

    fn list(&self, filter: &TodoFilter, sort: TodoSort) -> Vec<Todo> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut todos: Vec<Todo> = inner
            .todos
            .values()
            .filter(|s| !s.deleted && filter.matches(&s.todo))
            .map(|s| s.todo.clone())
            .collect();
        drop(inner);
        todos.sort_by(|a, b| sort.compare(a, b));
        todos
    }

    fn update(&self, id: i64, patch: TodoPatch) -> Result<Todo, DomainError> {
        let title = patch.title.as_deref().map(check_title).transpose()?;
        if let Some(ref d) = patch.description {
            check_description(d)?;
        }

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let stored = inner
            .todos
            .get_mut(&id)
            .filter(|s| !s.deleted)
            .ok_or(DomainError::NotFound(id))?;

        let todo = &mut stored.todo;
        if let Some(title) = title {
            todo.title = title;
        }
        if patch.description.is_some() {
            todo.description = patch.description;
        }
        if patch.due_date.is_some() {
            todo.due_date = patch.due_date;
        }
        if let Some(p) = patch.priority {
            todo.priority = p;
        }
        if let Some(s) = patch.status {
            todo.status = s;
        }
        if let Some(tags) = patch.tags {
            todo.tags = tags;
        }
        todo.modified_at = Utc::now();
        debug!("Updated todo {id}");
        Ok(todo.clone())
    }

    fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let stored = inner
            .todos
            .get_mut(&id)
            .filter(|s| !s.deleted)
            .ok_or(DomainError::NotFound(id))?;
        stored.deleted = true;
        stored.todo.modified_at = Utc::now();
        debug!("Soft-deleted todo {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::todo::{Priority, SortOrder, Status, TodoSortKey};

    #[test]
    fn create_assigns_ids_and_defaults() {
        let store = InMemoryTodoStore::new();
        let a = store.create(NewTodo::titled("  first  ")).unwrap();
        let b = store.create(NewTodo::titled("second")).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.title, "first");
        assert_eq!(a.priority, Priority::Medium);
        assert_eq!(a.status, Status::Pending);
    }

    #[test]
    fn create_rejects_blank_and_long_titles() {
        let store = InMemoryTodoStore::new();
        assert!(matches!(
            store.create(NewTodo::titled("   ")),
            Err(DomainError::Invalid(_))
        ));
        assert!(matches!(
            store.create(NewTodo::titled("x".repeat(201))),
            Err(DomainError::Invalid(_))
        ));
    }

    #[test]
    fn update_is_partial() {
        let store = InMemoryTodoStore::new();
        let t = store
            .create(NewTodo::titled("write report").with_priority(Priority::High))
            .unwrap();
        let updated = store
            .update(
                t.id,
                TodoPatch {
                    status: Some(Status::Completed),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "write report");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.status, Status::Completed);
    }

    #[test]
    fn update_missing_is_not_found() {
        let store = InMemoryTodoStore::new();
        let err = store.update(99999, TodoPatch::default()).unwrap_err();
        assert_eq!(err, DomainError::NotFound(99999));
    }

    #[test]
    fn soft_delete_hides_todo() {
        let store = InMemoryTodoStore::new();
        let t = store.create(NewTodo::titled("gone soon")).unwrap();
        store.delete(t.id).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.get(t.id), Err(DomainError::NotFound(t.id)));
        assert_eq!(store.delete(t.id), Err(DomainError::NotFound(t.id)));
    }

    #[test]
    fn list_filters_and_sorts() {
        let store = InMemoryTodoStore::new();
        store
            .create(NewTodo::titled("b").with_priority(Priority::Low))
            .unwrap();
        store
            .create(
                NewTodo::titled("a")
                    .with_priority(Priority::Urgent)
                    .with_tags(["home"]),
            )
            .unwrap();
        store
            .create(NewTodo::titled("c").with_priority(Priority::High))
            .unwrap();

        let by_priority = store.list(
            &TodoFilter::default(),
            TodoSort::new(TodoSortKey::Priority, SortOrder::Desc),
        );
        let titles: Vec<_> = by_priority.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["a", "c", "b"]);

        let tagged = store.list(
            &TodoFilter {
                tags: vec!["home".into()],
                ..Default::default()
            },
            TodoSort::default(),
        );
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].title, "a");
    }
}
