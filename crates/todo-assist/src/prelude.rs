//! Convenience re-exports for common `todo-assist` types.
//!
//! ```ignore
//! use todo_assist::prelude::*;
//! ```
//!
//! Covers wiring ([`GatewayConfig`], [`Assistant`]), the gateway and its
//! request/result types, the tool router, and the todo domain. Cache
//! internals, retry state, and reply parsing stay in their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::config::{Assistant, GatewayConfig};
pub use crate::{ChatClient, ChatRequest, Message, json_schema_for};

// ── Gateway ─────────────────────────────────────────────────────────
pub use crate::api::{
    ChatProvider, DisabledProvider, ModelProvider, ProviderError, RetryConfig, ScriptedProvider,
};
pub use crate::assist::{
    Assistance, AssistanceRequest, AssistanceResult, ModelGateway, PreconditionError, Provenance,
    RankedTask, ResponseCache, Subtask, Suggestion, TaskSummary,
};

// ── Tools ───────────────────────────────────────────────────────────
pub use crate::tools::{
    ErrorCode, ToolCallRequest, ToolCallResponse, ToolDefinition, ToolDescriptor, ToolError,
    ToolRegistry, ToolRouter,
};

// ── Domain ──────────────────────────────────────────────────────────
pub use crate::domain::{
    DomainError, InMemoryTodoStore, NewTodo, Priority, Status, Todo, TodoFilter, TodoPatch,
    TodoService,
};
