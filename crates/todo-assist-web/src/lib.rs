//! HTTP surface for the `todo-assist` gateway and tool router.
//!
//! `todo-assist-web` serves the assistance operations as REST endpoints and
//! exposes the tool router to external agents.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use todo_assist::prelude::*;
//! use todo_assist_web::{AppState, WebConfig, spawn_web};
//!
//! let todos: Arc<dyn TodoService> = Arc::new(InMemoryTodoStore::new());
//! let assistant = GatewayConfig::from_env().build_assistant(todos)?;
//!
//! let addr = spawn_web(AppState::from(&assistant), WebConfig::default()).await?;
//! println!("Listening on http://{addr}");
//! ```
//!
//! # Endpoints
//!
//! | Route | Body | Response |
//! |-------|------|----------|
//! | `GET /health` | | provider name and status |
//! | `POST /api/v1/ai/suggest` | `{description}` | `Assistance` |
//! | `POST /api/v1/ai/prioritize` | `{todos: [TaskSummary]}` | `Assistance` |
//! | `POST /api/v1/ai/breakdown` | `{task}` | `Assistance` |
//! | `GET /api/v1/ai/cache` | | cache hit/miss counters |
//! | `GET /api/v1/tools` | | tool descriptors |
//! | `POST /api/v1/tools/call` | `{name, arguments}` | `ToolCallResponse` |
//!
//! A malformed request body or invalid assistance input gets `422` with
//! `{"error": {"code": "VALIDATION_ERROR", "message": ...}}`. Tool calls
//! always answer `200`; failures are reported in the body.

mod api;
mod extract;
mod server;

pub use api::AppState;
pub use server::build_router;

use std::net::SocketAddr;

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3001`.
    pub bind_addr: SocketAddr,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// The server runs until the Tokio runtime shuts down.
pub async fn spawn_web(state: AppState, config: WebConfig) -> std::io::Result<SocketAddr> {
    let router = server::build_router(state);
    server::start_server(router, config.bind_addr).await
}
