//! `CommandConstructor`: raíz de agregado de una sesión de edición.
//!
//! Agrupa todas las tablas de entidades y concentra las mutaciones que deben
//! mantener la consistencia entre ellas:
//! - inserción idempotente por clave primaria (`add_*`) y unión (`merge`);
//! - borrado en cascada de un proceso (dependencias + PPVs), nunca del
//!   comando, que es compartido;
//! - ids temporales (`dummyId<n>`) y tokens de salida (`NEWFILE<n>`) únicos
//!   dentro de la sesión;
//! - materialización de procesos plantilla a partir de un comando.
use log::debug;
use pipe_domain::{Arity, Command, Dependency, EntityId, FileToken, Filetype, OutputToken, Parameter, ParameterRole, ParameterType,
                  Process, ProcessParameterValue, ProcessType, Software, Table};
use serde::{Deserialize, Serialize};

use crate::context::SessionContext;
use crate::errors::CoreEngineError;
use crate::ids::IdAllocator;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandConstructor {
    #[serde(default)]
    pub commands: Table<Command>,
    #[serde(default)]
    pub filetypes: Table<Filetype>,
    #[serde(default)]
    pub parameters: Table<Parameter>,
    #[serde(default, rename = "parametertypes")]
    pub parameter_types: Table<ParameterType>,
    #[serde(default)]
    pub processes: Table<Process>,
    #[serde(default, rename = "processparametervalues")]
    pub values: Table<ProcessParameterValue>,
    #[serde(default)]
    pub softwares: Table<Software>,
    #[serde(default)]
    pub dependencies: Table<Dependency>,
    #[serde(skip)]
    ids: IdAllocator,
}

/// Filas eliminadas por `remove_process_and_dependents`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedProcess {
    pub process: Process,
    pub dependencies: Vec<Dependency>,
    pub values: Vec<ProcessParameterValue>,
}

impl CommandConstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_allocator(ids: IdAllocator) -> Self {
        Self { ids, ..Self::default() }
    }

    pub fn set_id_allocator(&mut self, ids: IdAllocator) {
        self.ids = ids;
    }

    // ------------------------------------------------------------------
    // Inserción idempotente
    // ------------------------------------------------------------------

    pub fn add_command(&mut self, command: Command) -> bool {
        self.commands.add(command)
    }

    pub fn add_filetype(&mut self, filetype: Filetype) -> bool {
        self.filetypes.add(filetype)
    }

    pub fn add_parameter(&mut self, parameter: Parameter) -> bool {
        self.parameters.add(parameter)
    }

    pub fn add_parameter_type(&mut self, parameter_type: ParameterType) -> bool {
        self.parameter_types.add(parameter_type)
    }

    pub fn add_process(&mut self, process: Process) -> bool {
        self.processes.add(process)
    }

    pub fn add_process_parameter_value(&mut self, value: ProcessParameterValue) -> bool {
        self.values.add(value)
    }

    pub fn add_software(&mut self, software: Software) -> bool {
        self.softwares.add(software)
    }

    /// Deduplica por el par (consumidor, productor).
    pub fn add_dependency(&mut self, dependency: Dependency) -> bool {
        self.dependencies.add(dependency)
    }

    /// Une todas las tablas de `other` en `self`. Devuelve filas nuevas.
    pub fn merge(&mut self, other: &CommandConstructor) -> usize {
        self.commands.union(&other.commands)
        + self.filetypes.union(&other.filetypes)
        + self.parameters.union(&other.parameters)
        + self.parameter_types.union(&other.parameter_types)
        + self.processes.union(&other.processes)
        + self.values.union(&other.values)
        + self.softwares.union(&other.softwares)
        + self.dependencies.union(&other.dependencies)
    }

    // ------------------------------------------------------------------
    // Borrado
    // ------------------------------------------------------------------

    /// Quita el proceso, sus dependencias como consumidor y sus PPVs.
    /// `None` si el proceso no existe (no se toca nada).
    pub fn remove_process_and_dependents(&mut self, process_id: EntityId) -> Option<RemovedProcess> {
        let process = self.processes.remove(&process_id)?;
        let dependencies = self.dependencies.remove_where(|d| d.process_id == process_id);
        let values = self.values.remove_where(|v| v.process_id == process_id);
        debug!("removed process {} with {} dependencies and {} values",
               process_id,
               dependencies.len(),
               values.len());
        Some(RemovedProcess { process, dependencies, values })
    }

    /// Quita un comando sólo si ningún proceso lo referencia.
    pub fn remove_command_if_unused(&mut self, command_id: EntityId) -> Result<Option<Command>, CoreEngineError> {
        let processes = self.processes.with_command_id(command_id).len();
        if processes > 0 {
            return Err(CoreEngineError::CommandInUse { command_id, processes });
        }
        Ok(self.commands.remove(&command_id))
    }

    // ------------------------------------------------------------------
    // Ids temporales
    // ------------------------------------------------------------------

    /// Procesos y PPVs comparten el espacio `dummyId<n>`.
    pub fn create_dummy_process_id(&mut self) -> Result<EntityId, CoreEngineError> {
        self.allocate_temporary_id()
    }

    pub fn create_dummy_process_parameter_value_id(&mut self) -> Result<EntityId, CoreEngineError> {
        self.allocate_temporary_id()
    }

    fn allocate_temporary_id(&mut self) -> Result<EntityId, CoreEngineError> {
        let (processes, values) = (&self.processes, &self.values);
        self.ids
            .allocate(|n| {
                let id = EntityId::Temporary(n);
                processes.contains(&id) || values.contains(&id)
            })
            .map(EntityId::Temporary)
    }

    /// Token de salida que ningún PPV de la sesión usa todavía.
    pub fn create_output_token(&mut self) -> Result<OutputToken, CoreEngineError> {
        let values = &self.values;
        self.ids
            .allocate(|n| {
                let wanted = FileToken::Pending(OutputToken(n));
                values.iter().any(|v| FileToken::parse_all(&v.value).contains(&wanted))
            })
            .map(OutputToken)
    }

    // ------------------------------------------------------------------
    // Materialización
    // ------------------------------------------------------------------

    /// Un proceso plantilla por cada comando presente, con los PPVs mínimos.
    pub fn materialize_default_instances(&mut self, ctx: &SessionContext) -> Result<Vec<EntityId>, CoreEngineError> {
        let command_ids: Vec<EntityId> = self.commands.keys().copied().collect();
        command_ids.into_iter()
                   .map(|command_id| self.create_process_with_command(command_id, ctx))
                   .collect()
    }

    /// Crea un proceso plantilla para `command_id`.
    ///
    /// Por cada parámetro obligatorio: un PPV vacío si su aridad es (0,0),
    /// o `min_items` PPVs vacíos con locus `0..min_items`.
    pub fn create_process_with_command(&mut self, command_id: EntityId, ctx: &SessionContext) -> Result<EntityId, CoreEngineError> {
        let command = self.commands.require(&command_id)?.clone();
        let process_id = self.create_dummy_process_id()?;
        self.add_process(Process { id: process_id,
                                   name: command.name.clone(),
                                   description: command.description.clone(),
                                   command_id,
                                   project_id: ctx.project_id,
                                   person_id: ctx.person_id,
                                   process_type: ProcessType::Template });

        let mandatory: Vec<Parameter> = self.parameters
                                            .with_command_id(command_id)
                                            .sorted_by_locus()
                                            .into_iter()
                                            .filter(|p| p.is_mandatory)
                                            .cloned()
                                            .collect();
        for parameter in &mandatory {
            let count = match parameter.arity() {
                Arity::None => 1,
                _ => parameter.min_required(),
            };
            for locus in 0..count {
                self.push_empty_value(process_id, parameter.id, locus)?;
            }
        }
        debug!("materialized process {} for command {}", process_id, command.name);
        Ok(process_id)
    }

    fn push_empty_value(&mut self, process_id: EntityId, parameter_id: EntityId, locus: u32) -> Result<EntityId, CoreEngineError> {
        let id = self.create_dummy_process_parameter_value_id()?;
        self.add_process_parameter_value(ProcessParameterValue { id,
                                                                 process_id,
                                                                 parameter_id,
                                                                 value: String::new(),
                                                                 locus });
        Ok(id)
    }

    fn next_locus(&self, process_id: EntityId, parameter_id: EntityId) -> u32 {
        self.values.max_locus(process_id, parameter_id).map(|l| l + 1).unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Edición de parámetros
    // ------------------------------------------------------------------

    /// Activa o desactiva un parámetro de un proceso.
    ///
    /// Activar completa los PPVs faltantes hasta el mínimo (locus a
    /// continuación del máximo actual); un parámetro (0,0) queda con
    /// exactamente un PPV vacío. Desactivar borra todos sus PPVs y no está
    /// permitido para parámetros obligatorios.
    pub fn set_parameter_usage(&mut self, process_id: EntityId, parameter_id: EntityId, used: bool) -> Result<(), CoreEngineError> {
        self.processes.require(&process_id)?;
        let parameter = self.parameters.require(&parameter_id)?.clone();
        let existing = self.values.with_process_and_parameter(process_id, parameter_id).len() as u32;

        if !used {
            if parameter.is_mandatory {
                return Err(CoreEngineError::MandatoryParameter { parameter_id });
            }
            self.values.remove_where(|v| v.process_id == process_id && v.parameter_id == parameter_id);
            return Ok(());
        }

        match parameter.arity() {
            Arity::None => {
                if existing != 1 {
                    self.values.remove_where(|v| v.process_id == process_id && v.parameter_id == parameter_id);
                    self.push_empty_value(process_id, parameter_id, 0)?;
                }
            }
            _ => {
                for _ in existing..parameter.min_required() {
                    let locus = self.next_locus(process_id, parameter_id);
                    self.push_empty_value(process_id, parameter_id, locus)?;
                }
            }
        }
        Ok(())
    }

    /// Agrega una ocurrencia más del parámetro, si la aridad lo permite.
    pub fn add_parameter_value(&mut self, process_id: EntityId, parameter_id: EntityId) -> Result<EntityId, CoreEngineError> {
        self.processes.require(&process_id)?;
        let parameter = self.parameters.require(&parameter_id)?;
        let existing = self.values.with_process_and_parameter(process_id, parameter_id).len();
        if !parameter.can_add_one_more(existing) {
            return Err(CoreEngineError::ParameterLimit { parameter_id });
        }
        let locus = self.next_locus(process_id, parameter_id);
        self.push_empty_value(process_id, parameter_id, locus)
    }

    /// Quita una ocurrencia; un parámetro obligatorio no baja de su mínimo
    /// (ni de un valor, si su mínimo es cero).
    pub fn remove_parameter_value(&mut self, value_id: EntityId) -> Result<ProcessParameterValue, CoreEngineError> {
        let value = self.values.require(&value_id)?.clone();
        let parameter = self.parameters.require(&value.parameter_id)?;
        let existing = self.values.with_process_and_parameter(value.process_id, value.parameter_id).len() as u32;
        if parameter.is_mandatory && existing <= parameter.min_required().max(1) {
            return Err(CoreEngineError::ParameterLimit { parameter_id: value.parameter_id });
        }
        self.values.remove(&value_id);
        Ok(value)
    }

    /// Cambia el valor de un PPV escalar.
    pub fn set_parameter_value(&mut self, value_id: EntityId, value: &str) -> Result<(), CoreEngineError> {
        let parameter_id = self.values.require(&value_id)?.parameter_id;
        if self.file_slot_of(parameter_id)?.is_some() {
            return Err(CoreEngineError::NotAScalar(value_id));
        }
        self.values.require_mut(&value_id)?.value = value.to_string();
        Ok(())
    }

    /// Un nombre vacío vuelve al nombre del comando.
    pub fn rename_process(&mut self, process_id: EntityId, name: &str) -> Result<(), CoreEngineError> {
        let command_id = self.processes.require(&process_id)?.command_id;
        let name = if name.trim().is_empty() {
            self.commands.require(&command_id)?.name.clone()
        } else {
            name.to_string()
        };
        self.processes.require_mut(&process_id)?.name = name;
        Ok(())
    }

    /// Una descripción vacía vuelve a la descripción del comando.
    pub fn describe_process(&mut self, process_id: EntityId, description: &str) -> Result<(), CoreEngineError> {
        let command_id = self.processes.require(&process_id)?.command_id;
        let description = if description.trim().is_empty() {
            self.commands.require(&command_id)?.description.clone()
        } else {
            description.to_string()
        };
        self.processes.require_mut(&process_id)?.description = description;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Consultas
    // ------------------------------------------------------------------

    /// Rol y tipo aceptado si el parámetro es un slot de archivo.
    pub fn file_slot_of(&self, parameter_id: EntityId) -> Result<Option<(ParameterRole, EntityId)>, CoreEngineError> {
        let parameter = self.parameters.require(&parameter_id)?;
        let parameter_type = self.parameter_types.require(&parameter.parameter_type_id)?;
        Ok(parameter_type.file_slot())
    }

    /// PPVs de un proceso ordenados por locus de parámetro y luego locus
    /// propio.
    pub fn ordered_values(&self, process_id: EntityId) -> Result<Vec<ProcessParameterValue>, CoreEngineError> {
        let mut keyed = Vec::new();
        for value in self.values.iter().filter(|v| v.process_id == process_id) {
            let parameter_locus = self.parameters.require(&value.parameter_id)?.locus;
            keyed.push(((parameter_locus, value.locus), value.clone()));
        }
        keyed.sort_by_key(|(k, _)| *k);
        Ok(keyed.into_iter().map(|(_, v)| v).collect())
    }
}
