//! Todo domain: records, the [`TodoService`] trait, and the in-memory store
//! the tool router dispatches CRUD calls into.

pub mod store;
pub mod todo;

pub use store::InMemoryTodoStore;
pub use todo::{
    DomainError, NewTodo, Priority, SortOrder, Status, Todo, TodoFilter, TodoPatch, TodoService,
    TodoSort, TodoSortKey,
};
