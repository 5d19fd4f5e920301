//! Llamadas al backend como RPC opacas.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use log::debug;
use pipe_core::{Commandline, Commandlines};
use pipe_domain::EntityId;
use pipe_graph::GraphDescription;
use tokio::sync::Mutex;

use crate::dto::{CommandBundle, HelpResponse, ProcessBundle};
use crate::errors::BackendError;
use crate::payload::StepsPayload;

#[async_trait]
pub trait PipelineBackend: Send + Sync {
    /// `getCommand`
    async fn get_command(&self, command_id: EntityId) -> Result<CommandBundle, BackendError>;
    /// `getProcessWithDependencies`
    async fn get_process_with_dependencies(&self, process_id: EntityId) -> Result<ProcessBundle, BackendError>;
    /// `getBashCommandPreview`
    async fn get_bash_command_preview(&self, steps: &StepsPayload, short_file_names: bool) -> Result<Commandlines, BackendError>;
    /// `getGraphvizSvg`
    async fn get_graphviz_svg(&self, graph: &GraphDescription) -> Result<String, BackendError>;
    /// `createProcess`
    async fn create_process(&self, steps: &StepsPayload) -> Result<Commandlines, BackendError>;
    /// `getHelp`
    async fn get_help(&self, subject: &str) -> Result<HelpResponse, BackendError>;
}

/// Backend en memoria: catálogo fijo de comandos/procesos y registro de los
/// pedidos `createProcess`. Se le pueden inyectar fallas transitorias.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    commands: HashMap<EntityId, CommandBundle>,
    processes: HashMap<EntityId, ProcessBundle>,
    help: HashMap<String, String>,
    created: Mutex<Vec<StepsPayload>>,
    transient_failures: AtomicU32,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(mut self, bundle: CommandBundle) -> Self {
        self.commands.insert(bundle.command.id, bundle);
        self
    }

    pub fn with_process(mut self, bundle: ProcessBundle) -> Self {
        self.processes.insert(bundle.process.id, bundle);
        self
    }

    pub fn with_help(mut self, subject: &str, html: &str) -> Self {
        self.help.insert(subject.to_string(), html.to_string());
        self
    }

    /// Las próximas `n` llamadas fallan con un error de transporte.
    pub fn fail_next(&self, n: u32) {
        self.transient_failures.store(n, Ordering::SeqCst);
    }

    pub async fn created(&self) -> Vec<StepsPayload> {
        self.created.lock().await.clone()
    }

    fn check_transport(&self) -> Result<(), BackendError> {
        let pending = self.transient_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.transient_failures.store(pending - 1, Ordering::SeqCst);
            return Err(BackendError::Transport("connection reset".into()));
        }
        Ok(())
    }
}

/// Línea de comando sintética: nombre del proceso seguido de sus valores.
fn render_lines(steps: &StepsPayload, short_file_names: bool) -> Commandlines {
    let lines = steps.steps
                     .iter()
                     .map(|s| {
                         let mut words = vec![s.process.name.clone()];
                         for v in &s.process_parameter_values {
                             for word in v.value.split_whitespace() {
                                 if short_file_names {
                                     words.push(word.chars().take(8).collect());
                                 } else {
                                     words.push(word.to_string());
                                 }
                             }
                         }
                         Commandline { step: s.step,
                                       process_id: s.process.id,
                                       command: words.join(" ") }
                     })
                     .collect();
    Commandlines::new(lines)
}

#[async_trait]
impl PipelineBackend for InMemoryBackend {
    async fn get_command(&self, command_id: EntityId) -> Result<CommandBundle, BackendError> {
        self.check_transport()?;
        self.commands
            .get(&command_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound { what: "command",
                                                    id: command_id.to_string() })
    }

    async fn get_process_with_dependencies(&self, process_id: EntityId) -> Result<ProcessBundle, BackendError> {
        self.check_transport()?;
        self.processes
            .get(&process_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound { what: "process",
                                                    id: process_id.to_string() })
    }

    async fn get_bash_command_preview(&self, steps: &StepsPayload, short_file_names: bool) -> Result<Commandlines, BackendError> {
        self.check_transport()?;
        Ok(render_lines(steps, short_file_names))
    }

    async fn get_graphviz_svg(&self, graph: &GraphDescription) -> Result<String, BackendError> {
        self.check_transport()?;
        Ok(format!("<svg id=\"svgGraph\" data-nodes=\"{}\" data-edges=\"{}\"></svg>",
                   graph.nodes.len(),
                   graph.edges.len()))
    }

    async fn create_process(&self, steps: &StepsPayload) -> Result<Commandlines, BackendError> {
        self.check_transport()?;
        let mut created = self.created.lock().await;
        created.push(steps.clone());
        debug!("createProcess #{} with {} step(s)", created.len(), steps.steps.len());
        Ok(render_lines(steps, false))
    }

    async fn get_help(&self, subject: &str) -> Result<HelpResponse, BackendError> {
        self.check_transport()?;
        self.help
            .get(subject)
            .map(|html| HelpResponse { help: html.clone() })
            .ok_or_else(|| BackendError::NotFound { what: "help subject",
                                                    id: subject.to_string() })
    }
}
