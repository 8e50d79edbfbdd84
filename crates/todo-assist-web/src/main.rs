//! HTTP server for the todo-assist gateway and tool router.
//!
//! ```sh
//! OPENAI_API_KEY=sk-... todo-assist-server --bind 0.0.0.0:3001
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use todo_assist::config::{API_KEY_ENV, ENDPOINT_ENV, GatewayConfig, MODEL_ENV};
use todo_assist::domain::{InMemoryTodoStore, TodoService};
use todo_assist::logging::init_tracing;
use todo_assist::{DEFAULT_MODEL, OPENAI_CHAT_URL};
use todo_assist_web::{AppState, WebConfig, spawn_web};
use tracing::info;

/// Serve AI assistance and tool calls over HTTP.
#[derive(Parser)]
#[command(name = "todo-assist-server", version)]
struct Cli {
    /// Address to bind to.
    #[arg(long, env = "TODO_ASSIST_BIND", default_value = "127.0.0.1:3001")]
    bind: SocketAddr,

    /// Provider API key. Omit to serve fallback content only.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Model to use for completions.
    #[arg(long, env = MODEL_ENV, default_value = DEFAULT_MODEL)]
    model: String,

    /// Chat completions endpoint.
    #[arg(long, env = ENDPOINT_ENV, default_value = OPENAI_CHAT_URL)]
    endpoint: String,

    /// Cache entry lifetime, in seconds.
    #[arg(long, default_value_t = 600)]
    cache_ttl: u64,

    /// Maximum cached responses.
    #[arg(long, default_value_t = 512)]
    cache_capacity: usize,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    let config = GatewayConfig::default()
        .with_model(cli.model)
        .with_endpoint(cli.endpoint)
        .with_api_key(cli.api_key)
        .with_cache_ttl(Duration::from_secs(cli.cache_ttl))
        .with_cache_capacity(cli.cache_capacity);

    let todos: Arc<dyn TodoService> = Arc::new(InMemoryTodoStore::new());
    let assistant = match config.build_assistant(todos) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: failed to register tools: {e}");
            std::process::exit(1);
        }
    };

    let web_config = WebConfig {
        bind_addr: cli.bind,
    };
    let addr = match spawn_web(AppState::from(&assistant), web_config).await {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Error: failed to bind {}: {e}", cli.bind);
            std::process::exit(1);
        }
    };
    info!("Listening on http://{addr}");

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Error: failed to listen for shutdown signal: {e}");
        std::process::exit(1);
    }
    info!("Shutting down");
}
