use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::info;
use pipe_adapters::steps_payload;
use pipe_core::{CoreEngineError, ResolveMode, SessionConfig, SessionContext, SessionSnapshot, Workbench};
use pipe_graph::{project_dependencies, project_table, PreviewSettings};
use serde_json::Value;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline tools over a pipeline session snapshot")]
struct Args {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Execution order of the snapshot's processes
    Plan {
        snapshot: PathBuf,
        /// Append rows that cannot be ordered instead of failing
        #[arg(long)]
        lenient: bool,
    },
    /// JSON steps payload as sent to createProcess
    Payload {
        snapshot: PathBuf,
        /// Build it even if some rows are not ready (preview payload)
        #[arg(long)]
        lenient: bool,
    },
    /// Graph description for the drawing service
    Graph {
        snapshot: PathBuf,
        /// JSON file with {edge, global, graph, node} attribute overrides
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Processes and dependencies only
        #[arg(long)]
        dependencies: bool,
        #[arg(long)]
        no_colors: bool,
        #[arg(long)]
        hide_not_ready: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON in {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
    #[error(transparent)]
    Core(#[from] CoreEngineError),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Io { .. } | CliError::Json { .. } => 2,
            CliError::Core(CoreEngineError::DependencyLoop { .. }) | CliError::Core(CoreEngineError::InputsNotReady) => 4,
            CliError::Core(_) => 5,
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io { path: path.to_path_buf(),
                                                                             source })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json { path: path.to_path_buf(),
                                                                  source })
}

/// Sesión a partir del snapshot. Si el snapshot no trae contexto se usa el
/// del entorno.
fn load(path: &Path) -> Result<Workbench, CliError> {
    let config = SessionConfig::from_env()?;
    let mut snapshot: SessionSnapshot = read_json(path)?;
    if snapshot.context == SessionContext::default() {
        snapshot.context = config.context;
    }
    snapshot.constructor.set_id_allocator(config.id_allocator());
    let wb = Workbench::from_snapshot(snapshot)?;
    info!("loaded {} process(es), {} file(s) from {}",
          wb.constructor().processes.len(),
          wb.catalog().len(),
          path.display());
    Ok(wb)
}

fn mode(lenient: bool) -> ResolveMode {
    if lenient {
        ResolveMode::Lenient
    } else {
        ResolveMode::Strict
    }
}

fn run(cmd: Cmd) -> Result<Value, CliError> {
    let to_json = |v: Result<Value, serde_json::Error>| v.map_err(|e| CliError::Core(CoreEngineError::Internal(e.to_string())));
    match cmd {
        Cmd::Plan { snapshot, lenient } => {
            let wb = load(&snapshot)?;
            let plan = wb.execution_plan(mode(lenient))?;
            to_json(serde_json::to_value(plan))
        }
        Cmd::Payload { snapshot, lenient } => {
            let mut wb = load(&snapshot)?;
            let plan = if lenient { wb.execution_plan(ResolveMode::Lenient)? } else { wb.create_run()? };
            let payload = steps_payload(&plan, wb.constructor())?;
            to_json(serde_json::to_value(payload))
        }
        Cmd::Graph { snapshot,
                     settings,
                     dependencies,
                     no_colors,
                     hide_not_ready, } => {
            let wb = load(&snapshot)?;
            let mut preview = PreviewSettings { use_colors: !no_colors,
                                                show_not_ready: !hide_not_ready,
                                                ..PreviewSettings::default() };
            if let Some(path) = settings {
                let overrides: Value = read_json(&path)?;
                preview.update(&overrides)?;
            }
            let graph = if dependencies {
                project_dependencies(wb.constructor(), &preview)
            } else {
                project_table(wb.constructor(), wb.table(), wb.catalog(), &preview, None)?
            };
            to_json(serde_json::to_value(graph))
        }
    }
}

fn main() -> ExitCode {
    // .env opcional
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    match run(args.command) {
        Ok(value) => {
            println!("{value:#}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("[pipe-cli] {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
