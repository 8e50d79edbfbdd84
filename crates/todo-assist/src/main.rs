//! Command-line front end for the assistance gateway and tool router.
//!
//! Reads the API key from `OPENAI_API_KEY`. Without a key every answer
//! comes from the fallback catalog, so the commands work offline.
//!
//! # Examples
//!
//! ```sh
//! todo-assist suggest "organize my files and write docs"
//! todo-assist breakdown "Launch the new website"
//! todo-assist prioritize --file tasks.json
//! todo-assist tools
//! todo-assist call create_todo '{"title": "Sort photos", "priority": "high"}'
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use todo_assist::config::{API_KEY_ENV, ENDPOINT_ENV, MODEL_ENV};
use todo_assist::logging::init_tracing;
use todo_assist::prelude::*;
use todo_assist::{DEFAULT_MODEL, OPENAI_CHAT_URL};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// AI assistance and tool routing for todos.
#[derive(Parser)]
#[command(name = "todo-assist", version)]
struct Cli {
    /// Provider API key. Omit to use fallback content only.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Model to use for completions.
    #[arg(long, env = MODEL_ENV, default_value = DEFAULT_MODEL)]
    model: String,

    /// Chat completions endpoint.
    #[arg(long, env = ENDPOINT_ENV, default_value = OPENAI_CHAT_URL)]
    endpoint: String,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Suggest todos for a free-text description.
    Suggest { description: String },
    /// Rank tasks read from a JSON array (file or stdin).
    Prioritize {
        /// JSON file with `[{"id", "title", "due_date"?, "priority"?}]`.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Break a task into ordered subtasks.
    Breakdown { task: String },
    /// List the registered tools and their input schemas.
    Tools,
    /// Call a tool against an empty in-memory store.
    Call {
        name: String,
        /// JSON object of arguments.
        #[arg(default_value = "{}")]
        arguments: String,
    },
}

fn print_json(value: &impl Serialize) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_tasks(file: Option<&PathBuf>) -> CliResult<Vec<TaskSummary>> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?,
        None => std::io::read_to_string(std::io::stdin())?,
    };
    Ok(serde_json::from_str(&text).map_err(|e| format!("invalid task list: {e}"))?)
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = GatewayConfig::default()
        .with_model(cli.model)
        .with_endpoint(cli.endpoint)
        .with_api_key(cli.api_key);
    let todos: Arc<dyn TodoService> = Arc::new(InMemoryTodoStore::new());
    let assistant = config.build_assistant(todos)?;

    match cli.command {
        Command::Suggest { description } => {
            print_json(&assistant.gateway.suggest(description).await?)
        }
        Command::Prioritize { file } => {
            let tasks = read_tasks(file.as_ref())?;
            print_json(&assistant.gateway.prioritize(tasks).await?)
        }
        Command::Breakdown { task } => print_json(&assistant.gateway.breakdown(task).await?),
        Command::Tools => print_json(&assistant.router.list_tools()),
        Command::Call { name, arguments } => {
            let arguments: serde_json::Value = serde_json::from_str(&arguments)
                .map_err(|e| format!("arguments are not valid JSON: {e}"))?;
            let response = assistant.router.call_tool(&name, arguments).await;
            print_json(&response)?;
            if response.is_ok() {
                Ok(())
            } else {
                Err(format!("tool '{name}' failed").into())
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
