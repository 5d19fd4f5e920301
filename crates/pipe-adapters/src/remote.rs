//! Glue entre una `Workbench` y el backend.
//!
//! Cada pedido se arma sobre el estado actual y se etiqueta con su epoch; la
//! respuesta se aplica con `Workbench::apply_command_lines`, que la descarta
//! si entretanto se confirmó otro lote. Un error del backend nunca toca el
//! estado local.
use log::debug;
use pipe_core::{Commandlines, EventStore, ResolveMode, SessionAction, Workbench};
use pipe_domain::EntityId;
use pipe_graph::{project_table, PreviewSettings};

use crate::backend::PipelineBackend;
use crate::errors::BackendError;
use crate::payload::steps_payload;
use crate::retry::{with_retry, RetryPolicy};

pub struct RemoteSession<'a, B: PipelineBackend> {
    backend: &'a B,
    retry: RetryPolicy,
}

impl<'a, B: PipelineBackend> RemoteSession<'a, B> {
    pub fn new(backend: &'a B, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    /// Trae un comando y lo agrega como proceso plantilla nuevo.
    pub async fn add_command<E: EventStore>(&self, wb: &mut Workbench<E>, command_id: EntityId) -> Result<u64, BackendError> {
        let backend = self.backend;
        let bundle = with_retry(self.retry, move || backend.get_command(command_id)).await?;
        Ok(wb.apply_one(SessionAction::AddCommand { bundle: bundle.into_constructor() })?)
    }

    /// Trae un proceso guardado con su cierre y lo une a la sesión.
    pub async fn load_process<E: EventStore>(&self, wb: &mut Workbench<E>, process_id: EntityId) -> Result<u64, BackendError> {
        let backend = self.backend;
        let bundle = with_retry(self.retry, move || backend.get_process_with_dependencies(process_id)).await?;
        Ok(wb.apply_one(SessionAction::LoadProcess { bundle: bundle.into_constructor() })?)
    }

    /// Pide las líneas de comando de la vista previa (tolerante con filas
    /// incompletas). Devuelve el epoch del pedido junto con la respuesta.
    pub async fn request_preview<E: EventStore>(&self,
                                                wb: &Workbench<E>,
                                                short_file_names: bool)
                                                -> Result<(u64, Commandlines), BackendError> {
        let epoch = wb.epoch();
        let plan = wb.execution_plan(ResolveMode::Lenient)?;
        let payload = steps_payload(&plan, wb.constructor())?;
        let backend = self.backend;
        let payload = &payload;
        let lines = with_retry(self.retry, move || backend.get_bash_command_preview(payload, short_file_names)).await?;
        debug!("preview for epoch {}: {} line(s)", epoch, lines.steps.len());
        Ok((epoch, lines))
    }

    /// `request_preview` + aplicación. `false` si la respuesta quedó vieja.
    pub async fn refresh_preview<E: EventStore>(&self, wb: &mut Workbench<E>, short_file_names: bool) -> Result<bool, BackendError> {
        let (epoch, lines) = self.request_preview(wb, short_file_names).await?;
        Ok(wb.apply_command_lines(epoch, lines))
    }

    /// Confirma una corrida: todas las filas listas, orden estricto y
    /// `createProcess`.
    pub async fn submit_run<E: EventStore>(&self, wb: &mut Workbench<E>) -> Result<Commandlines, BackendError> {
        let epoch = wb.epoch();
        let plan = wb.create_run()?;
        let payload = steps_payload(&plan, wb.constructor())?;
        let backend = self.backend;
        let payload = &payload;
        let lines = with_retry(self.retry, move || backend.create_process(payload)).await?;
        wb.apply_command_lines(epoch, lines.clone());
        Ok(lines)
    }

    /// Dibujo de la tabla actual.
    pub async fn render_graph<E: EventStore>(&self, wb: &Workbench<E>, settings: &PreviewSettings) -> Result<String, BackendError> {
        let lines = if settings.add_commands_to_graph { Some(wb.command_lines()) } else { None };
        let graph = project_table(wb.constructor(), wb.table(), wb.catalog(), settings, lines)?;
        let backend = self.backend;
        let graph = &graph;
        with_retry(self.retry, move || backend.get_graphviz_svg(graph)).await
    }

    pub async fn help(&self, subject: &str) -> Result<String, BackendError> {
        let backend = self.backend;
        let response = with_retry(self.retry, move || backend.get_help(subject)).await?;
        Ok(response.help)
    }
}
