use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use taskboard_engine::{create_board_registry, BoardService, CommandInterpreter, InterpreterConfig};
use taskboard_llm::{ChatCompletionsProvider, ProviderConfig};
use taskboard_server::{AppState, ServerConfig};
use taskboard_settings::Settings;
use taskboard_store::{Database, TaskRepo};
use taskboard_telemetry::{init_telemetry, TelemetryConfig};

#[derive(Parser)]
#[command(name = "taskboard", version, about = "Kanban board with a chat assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve(ServeArgs),
}

#[derive(clap::Args, Default)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    /// SQLite database file.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Settings file instead of ~/.taskboard/settings.json.
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(args).await,
    }
}

fn load_settings(args: &ServeArgs) -> anyhow::Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => taskboard_settings::load_settings_from_path(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => taskboard_settings::load_settings().context("loading settings")?,
    };
    if let Some(host) = &args.host {
        settings.server.host = host.clone();
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if let Some(db) = &args.db {
        settings.database.path = db.clone();
    }
    Ok(settings)
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let settings = load_settings(&args)?;

    let logging = &settings.logging;
    let (telemetry, rejected) = TelemetryConfig::from_names(
        &logging.level,
        logging.modules.iter().map(|(m, l)| (m.as_str(), l.as_str())),
        logging.json,
    );
    init_telemetry(telemetry)?;
    for (target, level) in rejected {
        tracing::warn!(target_module = %target, level = %level, "invalid log level in settings, ignoring");
    }

    let db = Database::open(&settings.database.path)
        .with_context(|| format!("opening database {}", settings.database.path.display()))?;
    tracing::info!(path = %settings.database.path.display(), "database opened");

    let completion = settings.completion;
    if completion.api_key.is_none() {
        tracing::warn!("TASKBOARD_API_KEY is not set; chat requests will fail until it is");
    }
    let provider = ChatCompletionsProvider::new(ProviderConfig {
        base_url: completion.base_url,
        model: completion.model,
        api_key: completion.api_key,
    })
    .context("building completion client")?;

    let repo = TaskRepo::new(db);
    let registry = Arc::new(create_board_registry(repo.clone()));
    let interpreter = CommandInterpreter::new(
        Arc::new(provider),
        registry,
        InterpreterConfig {
            max_tool_calls: completion.max_tool_calls,
            stream_summary: completion.stream_summary,
        },
    );
    let state = AppState {
        board: BoardService::new(repo),
        interpreter: Arc::new(interpreter),
    };

    let config = ServerConfig {
        host: settings.server.host,
        port: settings.server.port,
    };
    let handle = taskboard_server::start(config, state)
        .await
        .context("starting server")?;
    tracing::info!(port = handle.port, "taskboard ready");

    tokio::select! {
        () = handle.wait() => {}
        res = tokio::signal::ctrl_c() => {
            res.context("listening for ctrl+c")?;
            tracing::info!("shutting down");
        }
    }
    Ok(())
}
