use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::ids::EntityId;
use crate::store::{Entity, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProcessType {
    #[default]
    Template,
    Job,
    Done,
}

impl TryFrom<u8> for ProcessType {
    type Error = DomainError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(ProcessType::Template),
            2 => Ok(ProcessType::Job),
            3 => Ok(ProcessType::Done),
            other => Err(DomainError::InvalidProcessType(other)),
        }
    }
}

impl From<ProcessType> for u8 {
    fn from(t: ProcessType) -> u8 {
        match t {
            ProcessType::Template => 1,
            ProcessType::Job => 2,
            ProcessType::Done => 3,
        }
    }
}

/// Una fila del pipeline: un comando con valores concretos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub command_id: EntityId,
    pub project_id: Option<i64>,
    pub person_id: Option<i64>,
    #[serde(rename = "type", default)]
    pub process_type: ProcessType,
}

impl Entity for Process {
    type Key = EntityId;
    const TABLE: &'static str = "process";

    fn key(&self) -> EntityId {
        self.id
    }
}

impl Table<Process> {
    pub fn with_command_id(&self, command_id: EntityId) -> Table<Process> {
        self.filter(|p| p.command_id == command_id)
    }
}

/// Valor concreto de una ocurrencia de parámetro para un proceso (PPV).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessParameterValue {
    pub id: EntityId,
    pub process_id: EntityId,
    pub parameter_id: EntityId,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub locus: u32,
}

impl Entity for ProcessParameterValue {
    type Key = EntityId;
    const TABLE: &'static str = "processparametervalue";

    fn key(&self) -> EntityId {
        self.id
    }
}

impl Table<ProcessParameterValue> {
    pub fn with_process_id(&self, process_id: EntityId) -> Table<ProcessParameterValue> {
        self.filter(|v| v.process_id == process_id)
    }

    pub fn with_parameter_id(&self, parameter_id: EntityId) -> Table<ProcessParameterValue> {
        self.filter(|v| v.parameter_id == parameter_id)
    }

    pub fn with_process_and_parameter(&self, process_id: EntityId, parameter_id: EntityId) -> Table<ProcessParameterValue> {
        self.filter(|v| v.process_id == process_id && v.parameter_id == parameter_id)
    }

    /// Locus más alto usado por un par proceso/parámetro.
    pub fn max_locus(&self, process_id: EntityId, parameter_id: EntityId) -> Option<u32> {
        self.iter()
            .filter(|v| v.process_id == process_id && v.parameter_id == parameter_id)
            .map(|v| v.locus)
            .max()
    }

    /// Ids de parámetro distintos, en orden de primera aparición.
    pub fn parameter_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = Vec::new();
        for v in self.iter() {
            if !ids.contains(&v.parameter_id) {
                ids.push(v.parameter_id);
            }
        }
        ids
    }
}
