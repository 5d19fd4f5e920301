//! Errores del core de sesión (constructor, placement, resolver).

use pipe_domain::{DomainError, EntityId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CoreEngineError {
    /// El resolver no encontró un orden válido: quedan filas sin resolver.
    #[error("could not construct an execution order, check for a dependency loop (unresolved: {})", .unresolved.join(", "))]
    DependencyLoop { unresolved: Vec<String> },
    #[error("not every process has all of its inputs set")]
    InputsNotReady,
    #[error("temporary id space exhausted after {attempts} attempts")]
    IdSpaceExhausted { attempts: u32 },
    #[error("drop rejected: item not accepted by slot {slot}")]
    DropRejected { slot: EntityId },
    #[error("unknown slot {0}")]
    UnknownSlot(EntityId),
    #[error("no item at position {index} of slot {slot}")]
    UnknownItem { slot: EntityId, index: usize },
    #[error("command {command_id} is still used by {processes} process(es)")]
    CommandInUse { command_id: EntityId, processes: usize },
    #[error("parameter {parameter_id} does not allow that many values")]
    ParameterLimit { parameter_id: EntityId },
    #[error("parameter {parameter_id} is mandatory")]
    MandatoryParameter { parameter_id: EntityId },
    #[error("value {0} is a file slot, not a scalar")]
    NotAScalar(EntityId),
    #[error("invalid configuration {key}={value}")]
    InvalidConfig { key: String, value: String },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("internal: {0}")]
    Internal(String),
}
