//! `Workbench`: sesión de edición explícita (sin estado global).
//!
//! Todas las mutaciones entran por `apply` como un lote de acciones. El lote
//! se ejecuta sobre copias del constructor y de la tabla; después de cada
//! acción se recalcula la disponibilidad y se poda a punto fijo, y al final
//! la colocación se vuelca en los PPVs. Si alguna acción falla, el lote se
//! descarta completo y el estado visible no cambia.
//!
//! Cada lote confirmado incrementa el `epoch` de la sesión; las respuestas
//! asíncronas del backend se etiquetan con el epoch de su pedido y se
//! ignoran si ya no es el actual.
use log::{debug, warn};
use pipe_domain::EntityId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commandline::Commandlines;
use crate::constructor::CommandConstructor;
use crate::context::SessionContext;
use crate::errors::CoreEngineError;
use crate::event::{EventStore, InMemoryEventStore, SessionEvent, SessionEventKind};
use crate::placement::{DragSource, FileCatalog, PlacementTable, ProjectFile};
use crate::resolver::{resolve, ExecutionPlan, ResolveMode};

/// Una acción de usuario (o la llegada de datos del backend).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SessionAction {
    /// Comando recién obtenido: se une y se crea un proceso plantilla por
    /// cada comando del paquete.
    AddCommand { bundle: CommandConstructor },
    /// Proceso guardado con su cierre de entidades: se une tal cual.
    LoadProcess { bundle: CommandConstructor },
    Drop { source: DragSource, target: EntityId },
    RemoveItem { slot: EntityId, index: usize },
    RemoveProcess { process_id: EntityId },
    RemoveCommand { command_id: EntityId },
    SetParameterUsage { process_id: EntityId, parameter_id: EntityId, used: bool },
    AddParameterValue { process_id: EntityId, parameter_id: EntityId },
    RemoveParameterValue { value_id: EntityId },
    RenameProcess { process_id: EntityId, name: String },
    DescribeProcess { process_id: EntityId, description: String },
    SetParameterValue { value_id: EntityId, value: String },
}

impl SessionAction {
    pub fn label(&self) -> String {
        match self {
            SessionAction::AddCommand { bundle } => format!("add_command({})", bundle.commands.len()),
            SessionAction::LoadProcess { bundle } => format!("load_process({})", bundle.processes.len()),
            SessionAction::Drop { target, .. } => format!("drop({target})"),
            SessionAction::RemoveItem { slot, index } => format!("remove_item({slot},{index})"),
            SessionAction::RemoveProcess { process_id } => format!("remove_process({process_id})"),
            SessionAction::RemoveCommand { command_id } => format!("remove_command({command_id})"),
            SessionAction::SetParameterUsage { process_id, parameter_id, used } => {
                format!("set_parameter_usage({process_id},{parameter_id},{used})")
            }
            SessionAction::AddParameterValue { process_id, parameter_id } => format!("add_parameter_value({process_id},{parameter_id})"),
            SessionAction::RemoveParameterValue { value_id } => format!("remove_parameter_value({value_id})"),
            SessionAction::RenameProcess { process_id, .. } => format!("rename_process({process_id})"),
            SessionAction::DescribeProcess { process_id, .. } => format!("describe_process({process_id})"),
            SessionAction::SetParameterValue { value_id, .. } => format!("set_parameter_value({value_id})"),
        }
    }
}

/// Estado serializable de una sesión.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub context: SessionContext,
    #[serde(default)]
    pub files: Vec<ProjectFile>,
    #[serde(default)]
    pub constructor: CommandConstructor,
}

pub struct Workbench<E: EventStore = InMemoryEventStore> {
    id: Uuid,
    context: SessionContext,
    catalog: FileCatalog,
    constructor: CommandConstructor,
    table: PlacementTable,
    epoch: u64,
    command_lines: Commandlines,
    events: E,
}

impl Workbench<InMemoryEventStore> {
    /// Sesión vacía con bitácora en memoria.
    pub fn new(context: SessionContext, catalog: FileCatalog) -> Self {
        Self::empty(context, catalog, CommandConstructor::new(), InMemoryEventStore::default())
    }

    pub fn from_snapshot(snapshot: SessionSnapshot) -> Result<Self, CoreEngineError> {
        let catalog: FileCatalog = snapshot.files.into_iter().collect();
        Self::with_store(snapshot.context, catalog, snapshot.constructor, InMemoryEventStore::default())
    }
}

impl<E: EventStore> Workbench<E> {
    fn empty(context: SessionContext, catalog: FileCatalog, constructor: CommandConstructor, events: E) -> Self {
        Self { id: Uuid::new_v4(),
               context,
               catalog,
               constructor,
               table: PlacementTable::default(),
               epoch: 0,
               command_lines: Commandlines::default(),
               events }
    }

    /// Sesión a partir de un constructor existente; la tabla se deriva de
    /// sus PPVs.
    pub fn with_store(context: SessionContext, catalog: FileCatalog, constructor: CommandConstructor, events: E) -> Result<Self, CoreEngineError> {
        let mut wb = Self::empty(context, catalog, constructor, events);
        let mut table = PlacementTable::rebuild(&mut wb.constructor, &wb.catalog)?;
        table.prune_unreachable_outputs(&mut wb.constructor)?;
        table.sync_values(&mut wb.constructor)?;
        wb.table = table;
        Ok(wb)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn catalog(&self) -> &FileCatalog {
        &self.catalog
    }

    pub fn constructor(&self) -> &CommandConstructor {
        &self.constructor
    }

    pub fn table(&self) -> &PlacementTable {
        &self.table
    }

    pub fn command_lines(&self) -> &Commandlines {
        &self.command_lines
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.list(self.id)
    }

    pub fn event_store(&self) -> &E {
        &self.events
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot { context: self.context,
                          files: self.catalog.iter().cloned().collect(),
                          constructor: self.constructor.clone() }
    }

    /// Aplica un lote de acciones de forma atómica. Devuelve el nuevo epoch.
    pub fn apply(&mut self, actions: Vec<SessionAction>) -> Result<u64, CoreEngineError> {
        let labels: Vec<String> = actions.iter().map(SessionAction::label).collect();
        debug!("applying batch {:?} at epoch {}", labels, self.epoch);
        let mut cc = self.constructor.clone();
        let mut table = self.table.clone();
        match self.apply_batch(&mut cc, &mut table, actions) {
            Ok(pruned) => {
                self.constructor = cc;
                self.table = table;
                self.command_lines = Commandlines::default();
                self.epoch += 1;
                self.events
                    .append_kind(self.id, self.epoch, SessionEventKind::BatchApplied { actions: labels, pruned });
                Ok(self.epoch)
            }
            Err(error) => {
                warn!("batch {:?} rejected: {}", labels, error);
                self.events.append_kind(self.id,
                                        self.epoch,
                                        SessionEventKind::BatchRejected { actions: labels,
                                                                          error: error.clone() });
                Err(error)
            }
        }
    }

    pub fn apply_one(&mut self, action: SessionAction) -> Result<u64, CoreEngineError> {
        self.apply(vec![action])
    }

    fn apply_batch(&self, cc: &mut CommandConstructor, table: &mut PlacementTable, actions: Vec<SessionAction>) -> Result<usize, CoreEngineError> {
        let mut pruned = 0;
        for action in actions {
            let structural = match action {
                SessionAction::AddCommand { bundle } => {
                    table.sync_values(cc)?;
                    let commands: Vec<EntityId> = bundle.commands.keys().copied().collect();
                    cc.merge(&bundle);
                    for command_id in commands {
                        cc.create_process_with_command(command_id, &self.context)?;
                    }
                    true
                }
                SessionAction::LoadProcess { bundle } => {
                    table.sync_values(cc)?;
                    cc.merge(&bundle);
                    true
                }
                SessionAction::Drop { source, target } => {
                    table.drop_item(cc, &self.catalog, &source, target)?;
                    false
                }
                SessionAction::RemoveItem { slot, index } => {
                    table.remove_item(cc, slot, index)?;
                    false
                }
                SessionAction::RemoveProcess { process_id } => {
                    cc.processes.require(&process_id)?;
                    table.sync_values(cc)?;
                    cc.remove_process_and_dependents(process_id);
                    true
                }
                SessionAction::RemoveCommand { command_id } => {
                    cc.remove_command_if_unused(command_id)?;
                    false
                }
                SessionAction::SetParameterUsage { process_id, parameter_id, used } => {
                    table.sync_values(cc)?;
                    cc.set_parameter_usage(process_id, parameter_id, used)?;
                    true
                }
                SessionAction::AddParameterValue { process_id, parameter_id } => {
                    table.sync_values(cc)?;
                    cc.add_parameter_value(process_id, parameter_id)?;
                    true
                }
                SessionAction::RemoveParameterValue { value_id } => {
                    table.sync_values(cc)?;
                    cc.remove_parameter_value(value_id)?;
                    true
                }
                SessionAction::RenameProcess { process_id, name } => {
                    cc.rename_process(process_id, &name)?;
                    false
                }
                SessionAction::DescribeProcess { process_id, description } => {
                    cc.describe_process(process_id, &description)?;
                    false
                }
                SessionAction::SetParameterValue { value_id, value } => {
                    cc.set_parameter_value(value_id, &value)?;
                    false
                }
            };
            if structural {
                *table = PlacementTable::rebuild(cc, &self.catalog)?;
            }
            pruned += table.prune_unreachable_outputs(cc)?;
        }
        table.sync_values(cc)?;
        Ok(pruned)
    }

    /// Consulta sin efectos: ¿se aceptaría este arrastre ahora?
    pub fn is_drop_allowed(&self, source: &DragSource, target: EntityId) -> bool {
        self.table.is_drop_allowed(&self.constructor, &self.catalog, source, target)
    }

    pub fn all_rows_ready(&self) -> bool {
        self.table.all_rows_ready()
    }

    /// Plan sobre el estado actual (estricto o vista previa tolerante).
    pub fn execution_plan(&self, mode: ResolveMode) -> Result<ExecutionPlan, CoreEngineError> {
        resolve(&self.constructor, &self.table, &self.context, mode)
    }

    /// Plan confirmable: exige todas las filas listas y orden estricto.
    pub fn create_run(&mut self) -> Result<ExecutionPlan, CoreEngineError> {
        if !self.table.all_rows_ready() {
            return Err(CoreEngineError::InputsNotReady);
        }
        let plan = self.execution_plan(ResolveMode::Strict)?;
        self.events.append_kind(self.id,
                                self.epoch,
                                SessionEventKind::RunCreated { fingerprint: plan.fingerprint.clone(),
                                                               step_count: plan.steps.len() });
        Ok(plan)
    }

    pub fn is_current(&self, request_epoch: u64) -> bool {
        request_epoch == self.epoch
    }

    /// Aplica las líneas de comando de una respuesta del backend si el pedido
    /// se hizo sobre el epoch actual; si no, la descarta.
    pub fn apply_command_lines(&mut self, request_epoch: u64, lines: Commandlines) -> bool {
        if !self.is_current(request_epoch) {
            warn!("discarding stale response for epoch {} (current {})", request_epoch, self.epoch);
            self.events
                .append_kind(self.id, self.epoch, SessionEventKind::ResponseDiscarded { request_epoch });
            return false;
        }
        let count = lines.steps.len();
        self.command_lines = lines;
        self.events
            .append_kind(self.id, self.epoch, SessionEventKind::CommandLinesApplied { count });
        true
    }
}
