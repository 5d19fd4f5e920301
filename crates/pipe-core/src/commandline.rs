//! Texto de línea de comandos por proceso, tal como lo devuelve el backend
//! (`getBashCommandPreview` / `createProcess`).
use pipe_domain::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commandline {
    pub step: usize,
    pub process_id: EntityId,
    pub command: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commandlines {
    pub steps: Vec<Commandline>,
}

impl Commandlines {
    pub fn new(steps: Vec<Commandline>) -> Self {
        Self { steps }
    }

    pub fn command_for(&self, process_id: EntityId) -> Option<&str> {
        self.steps.iter().find(|c| c.process_id == process_id).map(|c| c.command.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
