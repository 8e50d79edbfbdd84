//! Tool-invocation routing.
//!
//! External agents list the registered tools and call them by name with JSON
//! arguments. The [`ToolRouter`] validates those arguments against each
//! tool's schema before anything reaches a handler, and every call ends in a
//! [`ToolCallResponse`] carrying either a result or an [`ErrorCode`].
//!
//! - [`core`]: tool definitions, handlers, and error codes.
//! - [`registry`]: name → tool lookup with compiled validators.
//! - [`validate`]: argument coercion and validation messages.
//! - [`router`]: the dispatch lifecycle.
//! - [`todo_tools`] / [`assist_tools`]: the built-in tool set.

pub mod assist_tools;
pub mod core;
pub mod registry;
pub mod router;
pub mod todo_tools;
pub mod validate;

use std::sync::Arc;

pub use assist_tools::assist_tools;
pub use core::{ErrorCode, FnHandler, ToolDefinition, ToolDescriptor, ToolError, ToolHandler};
pub use registry::{RegistryError, ToolRegistry};
pub use router::{ToolCallRequest, ToolCallResponse, ToolRouter};
pub use todo_tools::todo_tools;

use crate::assist::ModelGateway;
use crate::domain::TodoService;

/// Registry with the todo CRUD tools followed by the assistance tools.
pub fn standard_registry(
    service: Arc<dyn TodoService>,
    gateway: ModelGateway,
) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    for tool in todo_tools(service.clone())
        .into_iter()
        .chain(assist_tools(gateway, service))
    {
        registry.register(tool)?;
    }
    Ok(registry)
}
