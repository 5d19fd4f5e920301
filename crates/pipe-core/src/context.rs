use pipe_domain::{Process, ProcessType};
use serde::{Deserialize, Serialize};

/// Contexto inyectado de la sesión de edición: quién edita, en qué
/// proyecto, y con qué tipo se guardarán los procesos resueltos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionContext {
    pub project_id: Option<i64>,
    pub person_id: Option<i64>,
    #[serde(default)]
    pub process_type: ProcessType,
}

impl SessionContext {
    pub fn new(project_id: i64, person_id: i64, process_type: ProcessType) -> Self {
        Self { project_id: Some(project_id),
               person_id: Some(person_id),
               process_type }
    }

    /// Copia de `process` con proyecto, persona y tipo de esta sesión.
    pub fn stamp(&self, process: &Process) -> Process {
        Process { project_id: self.project_id,
                  person_id: self.person_id,
                  process_type: self.process_type,
                  ..process.clone() }
    }
}
