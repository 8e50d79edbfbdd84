//! Tool definitions and handlers.
//!
//! A [`ToolDefinition`] pairs a name, description, and JSON input schema
//! with a [`ToolHandler`]. Handlers receive arguments that already passed
//! schema validation and return a JSON result or a [`ToolError`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::DomainError;
use crate::json_schema_for;

/// Protocol error codes returned to tool callers.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UnknownTool,
    InvalidArguments,
    NotFound,
    DomainError,
    /// Reserved. Assistance tools fall back instead of reporting this.
    ProviderUnavailable,
}

/// Failure raised by a tool handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Domain(String),
}

impl ToolError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArguments(_) => ErrorCode::InvalidArguments,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Domain(_) => ErrorCode::DomainError,
        }
    }
}

impl From<DomainError> for ToolError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(_) => Self::NotFound(e.to_string()),
            DomainError::Invalid(msg) => Self::Domain(msg),
        }
    }
}

/// Boxed future returned by [`ToolHandler::call`].
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'a>>;

/// The business side of a tool.
///
/// Uses a boxed future so the trait is dyn-compatible.
pub trait ToolHandler: Send + Sync {
    /// Run the tool with validated, coerced arguments.
    fn call(&self, arguments: Value) -> HandlerFuture<'_>;
}

/// Type-erased async handler for [`FnHandler`].
type ErasedHandler = Box<dyn Fn(Value) -> HandlerFuture<'static> + Send + Sync>;

/// A closure-based handler that deserializes typed arguments and
/// serializes the result.
///
/// Arguments that pass the schema but still fail to deserialize (a
/// malformed `date-time` string, for example) become
/// [`ToolError::InvalidArguments`].
pub struct FnHandler {
    handler: ErasedHandler,
}

impl FnHandler {
    pub fn new<A, R, F, Fut>(handler: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ToolError>> + Send + 'static,
    {
        let erased = move |raw: Value| -> HandlerFuture<'static> {
            let args: A = match serde_json::from_value(raw) {
                Ok(a) => a,
                Err(e) => {
                    return Box::pin(async move {
                        Err(ToolError::InvalidArguments(format!("invalid arguments: {e}")))
                    });
                }
            };
            let fut = handler(args);
            Box::pin(async move {
                let result = fut.await?;
                serde_json::to_value(result)
                    .map_err(|e| ToolError::Domain(format!("failed to encode result: {e}")))
            })
        };
        Self {
            handler: Box::new(erased),
        }
    }
}

impl ToolHandler for FnHandler {
    fn call(&self, arguments: Value) -> HandlerFuture<'_> {
        (self.handler)(arguments)
    }
}

impl fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// A registrable tool.
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    handler: Box<dyn ToolHandler>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler: Box::new(handler),
        }
    }

    /// Build a tool whose schema is derived from its argument type.
    ///
    /// ```
    /// use schemars::JsonSchema;
    /// use serde::Deserialize;
    /// use todo_assist::tools::core::{ToolDefinition, ToolError};
    ///
    /// #[derive(Deserialize, JsonSchema)]
    /// struct EchoArgs {
    ///     text: String,
    /// }
    ///
    /// let tool = ToolDefinition::from_fn("echo", "Echo text back", |args: EchoArgs| async move {
    ///     Ok::<_, ToolError>(args.text)
    /// });
    /// assert_eq!(tool.input_schema["required"][0], "text");
    /// ```
    pub fn from_fn<A, R, F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Self
    where
        A: JsonSchema + DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ToolError>> + Send + 'static,
    {
        Self::new(
            name,
            description,
            json_schema_for::<A>(),
            FnHandler::new(handler),
        )
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }

    pub(crate) fn handler(&self) -> &dyn ToolHandler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Public view of a tool, as listed to callers.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize, JsonSchema)]
    struct AddArgs {
        a: i64,
        b: i64,
    }

    fn add_tool() -> ToolDefinition {
        ToolDefinition::from_fn("add", "Add two integers", |args: AddArgs| async move {
            Ok::<_, ToolError>(args.a + args.b)
        })
    }

    #[tokio::test]
    async fn fn_handler_round_trips_typed_args() {
        let tool = add_tool();
        let out = tool
            .handler()
            .call(serde_json::json!({"a": 2, "b": 3}))
            .await
            .unwrap();
        assert_eq!(out, serde_json::json!(5));
    }

    #[tokio::test]
    async fn fn_handler_reports_bad_args() {
        let tool = add_tool();
        let err = tool
            .handler()
            .call(serde_json::json!({"a": "x"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArguments);
    }

    #[test]
    fn domain_errors_map_to_codes() {
        let nf: ToolError = DomainError::NotFound(3).into();
        assert_eq!(nf.code(), ErrorCode::NotFound);
        assert_eq!(nf.to_string(), "Todo with id 3 not found");
        let inv: ToolError = DomainError::Invalid("title must not be empty".into()).into();
        assert_eq!(inv.code(), ErrorCode::DomainError);
    }

    #[test]
    fn error_codes_are_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::InvalidArguments).unwrap();
        assert_eq!(json, "\"INVALID_ARGUMENTS\"");
    }

    #[test]
    fn descriptor_uses_input_schema_key() {
        let json = serde_json::to_value(add_tool().descriptor()).unwrap();
        assert_eq!(json["name"], "add");
        assert_eq!(json["inputSchema"]["type"], "object");
    }
}
