//! Tipos de evento de la sesión y estructura `SessionEvent`.
//!
//! Cada lote de acciones aplicado (o rechazado) por el `Workbench` deja un
//! evento; el `epoch` es el de la sesión después del lote.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreEngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEventKind {
    /// Lote confirmado. `actions`: etiquetas de las acciones en orden.
    BatchApplied { actions: Vec<String>, pruned: usize },
    /// Lote descartado completo; el estado no cambió.
    BatchRejected { actions: Vec<String>, error: CoreEngineError },
    /// Corrida creada a partir de un plan estricto.
    RunCreated { fingerprint: String, step_count: usize },
    /// Respuesta de backend emitida para un epoch anterior, ignorada.
    ResponseDiscarded { request_epoch: u64 },
    /// Líneas de comando aplicadas al estado actual.
    CommandLinesApplied { count: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub seq: u64, // asignado por el store (orden append)
    pub session_id: Uuid,
    pub epoch: u64,
    pub kind: SessionEventKind,
    pub ts: DateTime<Utc>,
}
