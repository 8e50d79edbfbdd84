//! REST endpoint handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use todo_assist::assist::{Assistance, CacheStats, ModelGateway, PreconditionError, TaskSummary};
use todo_assist::config::Assistant;
use todo_assist::tools::{ToolCallRequest, ToolCallResponse, ToolDescriptor, ToolRouter};
use tracing::{info, warn};

use crate::extract::AppJson;

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub gateway: ModelGateway,
    pub router: Arc<ToolRouter>,
}

impl From<&Assistant> for AppState {
    fn from(assistant: &Assistant) -> Self {
        Self {
            gateway: assistant.gateway.clone(),
            router: assistant.router.clone(),
        }
    }
}

/// Invalid request body or assistance input, rendered as `422` with the
/// `VALIDATION_ERROR` envelope.
#[derive(Debug)]
pub struct ValidationError {
    message: String,
}

impl From<PreconditionError> for ValidationError {
    fn from(e: PreconditionError) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

impl From<JsonRejection> for ValidationError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            message: format!("Invalid request body: {}", rejection.body_text()),
        }
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        warn!("Validation error: {}", self.message);
        let body = json!({
            "error": {"code": "VALIDATION_ERROR", "message": self.message}
        });
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}

type AssistResult = Result<Json<Assistance>, ValidationError>;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub provider: String,
}

/// GET /health
pub async fn get_health(State(app): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        provider: app.gateway.provider_name().to_string(),
    })
}

#[derive(Deserialize)]
pub struct SuggestBody {
    pub description: String,
}

/// POST /api/v1/ai/suggest
pub async fn post_suggest(
    State(app): State<AppState>,
    AppJson(body): AppJson<SuggestBody>,
) -> AssistResult {
    let preview: String = body.description.chars().take(100).collect();
    info!("Generating suggestions for: {preview}");
    Ok(Json(app.gateway.suggest(body.description).await?))
}

#[derive(Deserialize)]
pub struct PrioritizeBody {
    pub todos: Vec<TaskSummary>,
}

/// POST /api/v1/ai/prioritize
pub async fn post_prioritize(
    State(app): State<AppState>,
    AppJson(body): AppJson<PrioritizeBody>,
) -> AssistResult {
    info!("Prioritizing {} todos", body.todos.len());
    Ok(Json(app.gateway.prioritize(body.todos).await?))
}

#[derive(Deserialize)]
pub struct BreakdownBody {
    pub task: String,
}

/// POST /api/v1/ai/breakdown
pub async fn post_breakdown(
    State(app): State<AppState>,
    AppJson(body): AppJson<BreakdownBody>,
) -> AssistResult {
    let preview: String = body.task.chars().take(100).collect();
    info!("Breaking down task: {preview}");
    Ok(Json(app.gateway.breakdown(body.task).await?))
}

/// GET /api/v1/ai/cache
pub async fn get_cache_stats(State(app): State<AppState>) -> Json<CacheStats> {
    Json(app.gateway.cache().stats())
}

/// GET /api/v1/tools
pub async fn get_tools(State(app): State<AppState>) -> Json<Vec<ToolDescriptor>> {
    Json(app.router.list_tools())
}

/// POST /api/v1/tools/call
///
/// Always `200` once the request parses; the body says whether the call
/// succeeded.
pub async fn post_tool_call(
    State(app): State<AppState>,
    AppJson(request): AppJson<ToolCallRequest>,
) -> Json<ToolCallResponse> {
    Json(app.router.dispatch(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prioritize_body_defaults_priority_and_tags() {
        let body: PrioritizeBody =
            serde_json::from_str(r#"{"todos": [{"id": 1, "title": "a"}]}"#).unwrap();
        assert_eq!(body.todos[0].tags.len(), 0);
    }

    #[test]
    fn validation_error_is_422() {
        let err = ValidationError::from(PreconditionError::NoTasks);
        assert_eq!(err.message, PreconditionError::NoTasks.to_string());
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
