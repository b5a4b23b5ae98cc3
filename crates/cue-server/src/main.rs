use anyhow::{Context, Result};
use clap::Parser;
use cue_core::{Cue, Definition, FileStore, MemoryStore, Store};
use cue_orchestrator::{LineInput, LogOutput, Orchestrator, OrchestratorConfig, OrchestratorEvent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

mod definition;
mod logging;

use definition::load_definition;
use logging::init_logging;

#[derive(Parser, Debug, Clone)]
#[command(name = "cue-server")]
#[command(about = "Run a show definition, reading commands from stdin")]
#[command(version)]
struct Cli {
    /// Show definition (.json, .yaml or .yml)
    #[arg(long, env = "CUE_DEFINITION")]
    definition: Option<PathBuf>,

    /// Where sessions, cues and interactions are kept
    #[arg(long, env = "CUE_STORE", value_enum, default_value = "memory")]
    store: StoreType,

    /// Directory used by the file store
    #[arg(long, env = "CUE_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Commands inputs may send (comma separated, defaults to the built-in list)
    #[arg(long, env = "CUE_INPUT_COMMANDS", value_delimiter = ',')]
    input_commands: Option<Vec<String>>,

    /// Enable debug mode
    #[arg(long, env = "DEBUG", default_value = "false")]
    debug: bool,

    /// Log level (overrides debug flag)
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum StoreType {
    Memory,
    File,
}

/// Grace period for blocking tasks (the stdin reader) at shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.log_level.as_deref());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build the tokio runtime")?;
    let result = runtime.block_on(run(cli));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run(cli: Cli) -> Result<()> {
    let definition = match &cli.definition {
        Some(path) => load_definition(path)?,
        None => {
            tracing::warn!("No definition given, running an empty show");
            Definition::new("show", Vec::<Cue>::new())
        }
    };

    let store: Arc<dyn Store> = match cli.store {
        StoreType::Memory => Arc::new(MemoryStore::new()),
        StoreType::File => Arc::new(FileStore::new(&cli.data_dir)),
    };

    let mut config = OrchestratorConfig::default();
    if let Some(commands) = cli.input_commands.clone() {
        config = config.with_input_commands(
            commands
                .into_iter()
                .map(|command| command.trim().to_string())
                .filter(|command| !command.is_empty()),
        );
    }

    tracing::info!(
        definition = %definition.id,
        cues = definition.cues.len(),
        store = ?cli.store,
        "Starting cue server"
    );
    if cli.debug {
        tracing::debug!("Server configuration: {:?}", cli);
    }

    let orchestrator = Orchestrator::new(definition, store, config);
    orchestrator.add_output(Arc::new(LogOutput::default())).await;
    orchestrator.add_input(Arc::new(LineInput::stdin())).await;

    let events = tokio::spawn(log_events(orchestrator.clone()));

    orchestrator
        .start()
        .await
        .context("Failed to start the show")?;
    tracing::info!("Show running, type commands such as `cue \"Q1\"` (Ctrl-C to quit)");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutting down");
    events.abort();
    orchestrator
        .destroy()
        .await
        .context("Failed to shut the show down")?;

    Ok(())
}

async fn log_events(orchestrator: Orchestrator) {
    let mut events = orchestrator.subscribe();
    loop {
        match events.recv().await {
            Ok(OrchestratorEvent::Transition { transition, from, to }) => {
                tracing::debug!(?transition, ?from, ?to, "Transition");
            }
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => tracing::debug!(event = %json, "Orchestrator event"),
                Err(error) => tracing::warn!(error = %error, "Unserializable event"),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event log fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
