//! Tool-call dispatch.
//!
//! Every call moves through `Received → Validated → Dispatched →
//! Completed | Failed` and ends in exactly one [`ToolCallResponse`]. The
//! router checks names and arguments; what a tool does is up to its handler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, trace};

use super::core::{ErrorCode, ToolDescriptor};
use super::registry::ToolRegistry;
use super::validate::{coerce_arguments, validation_errors};

/// A call from an external agent.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Protocol-shaped call result.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "status")]
pub enum ToolCallResponse {
    #[serde(rename = "ok")]
    Ok { result: Value },
    #[serde(rename = "error")]
    Err { code: ErrorCode, message: String },
}

impl ToolCallResponse {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Err {
            code,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The error code, if this is an error.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Ok { .. } => None,
            Self::Err { code, .. } => Some(*code),
        }
    }
}

/// Lifecycle of a single call, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Received,
    Validated,
    Dispatched,
    Completed,
    Failed,
}

fn next_call_id() -> String {
    let ts = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("tc-{ts:x}-{count:04x}")
}

fn log_phase(call_id: &str, name: &str, phase: CallPhase) {
    debug!("[{call_id}] {name}: {phase:?}");
}

/// Dispatches tool calls against a read-only [`ToolRegistry`].
#[derive(Debug)]
pub struct ToolRouter {
    registry: ToolRegistry,
}

impl ToolRouter {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.registry.descriptors()
    }

    /// Call a tool with loosely typed arguments. `null` means no arguments;
    /// anything other than an object is rejected.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> ToolCallResponse {
        let arguments = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return ToolCallResponse::error(
                    ErrorCode::InvalidArguments,
                    format!("arguments for '{name}' must be a JSON object, got {other}"),
                );
            }
        };
        self.dispatch(ToolCallRequest::new(name, arguments)).await
    }

    pub async fn dispatch(&self, request: ToolCallRequest) -> ToolCallResponse {
        let call_id = next_call_id();
        let ToolCallRequest {
            name,
            mut arguments,
        } = request;
        log_phase(&call_id, &name, CallPhase::Received);

        let Some(tool) = self.registry.get(&name) else {
            log_phase(&call_id, &name, CallPhase::Failed);
            return ToolCallResponse::error(ErrorCode::UnknownTool, format!("unknown tool '{name}'"));
        };

        coerce_arguments(&tool.definition.input_schema, &mut arguments);
        let arguments = Value::Object(arguments);
        let errors = validation_errors(&tool.validator, &arguments);
        if !errors.is_empty() {
            log_phase(&call_id, &name, CallPhase::Failed);
            info!("[tool] {name} rejected: {}", errors.join("; "));
            return ToolCallResponse::error(
                ErrorCode::InvalidArguments,
                format!("invalid arguments for '{name}': {}", errors.join("; ")),
            );
        }
        log_phase(&call_id, &name, CallPhase::Validated);

        let args_preview: String = arguments.to_string().chars().take(120).collect();
        info!("[tool] {name}({args_preview})");
        log_phase(&call_id, &name, CallPhase::Dispatched);
        let start = Instant::now();

        let outcome = tool.definition.handler().call(arguments).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(result) => {
                log_phase(&call_id, &name, CallPhase::Completed);
                debug!("[tool] {name} completed in {elapsed_ms:.0}ms");
                trace!("[tool] {name} result: {result}");
                ToolCallResponse::Ok { result }
            }
            Err(e) => {
                log_phase(&call_id, &name, CallPhase::Failed);
                info!("[tool] {name} failed in {elapsed_ms:.0}ms: {e}");
                ToolCallResponse::error(e.code(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::core::{ToolDefinition, ToolError};
    use schemars::JsonSchema;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    struct LookupArgs {
        id: i64,
    }

    fn router() -> ToolRouter {
        let registry = ToolRegistry::new()
            .with(ToolDefinition::from_fn(
                "lookup",
                "Look up a record",
                |args: LookupArgs| async move {
                    if args.id == 1 {
                        Ok(json!({"id": 1}))
                    } else {
                        Err(ToolError::NotFound(format!("record {} not found", args.id)))
                    }
                },
            ))
            .unwrap();
        ToolRouter::new(registry)
    }

    #[tokio::test]
    async fn unknown_tool() {
        let resp = router().call_tool("nonexistent_tool", json!({})).await;
        assert_eq!(resp.code(), Some(ErrorCode::UnknownTool));
    }

    #[tokio::test]
    async fn coerces_numeric_strings() {
        let resp = router().call_tool("lookup", json!({"id": "1"})).await;
        assert_eq!(resp, ToolCallResponse::Ok { result: json!({"id": 1}) });
    }

    #[tokio::test]
    async fn invalid_arguments_name_the_field() {
        let resp = router().call_tool("lookup", json!({"id": "one"})).await;
        let ToolCallResponse::Err { code, message } = resp else {
            panic!("expected error");
        };
        assert_eq!(code, ErrorCode::InvalidArguments);
        assert!(message.contains("id: "), "{message}");
    }

    #[tokio::test]
    async fn non_object_arguments_are_rejected() {
        let resp = router().call_tool("lookup", json!([1])).await;
        assert_eq!(resp.code(), Some(ErrorCode::InvalidArguments));
    }

    #[tokio::test]
    async fn handler_errors_pass_through_verbatim() {
        let resp = router().call_tool("lookup", json!({"id": 2})).await;
        assert_eq!(
            resp,
            ToolCallResponse::error(ErrorCode::NotFound, "record 2 not found")
        );
    }

    #[test]
    fn response_wire_shape() {
        let ok = serde_json::to_value(ToolCallResponse::Ok { result: json!(1) }).unwrap();
        assert_eq!(ok, json!({"status": "ok", "result": 1}));
        let err = serde_json::to_value(ToolCallResponse::error(ErrorCode::UnknownTool, "nope"))
            .unwrap();
        assert_eq!(
            err,
            json!({"status": "error", "code": "UNKNOWN_TOOL", "message": "nope"})
        );
    }
}
