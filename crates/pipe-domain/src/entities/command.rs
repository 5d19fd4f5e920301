use serde::{Deserialize, Serialize};

use crate::ids::EntityId;
use crate::store::Entity;

/// Plantilla inmutable de una invocación de shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub software_id: Option<EntityId>,
}

impl Entity for Command {
    type Key = EntityId;
    const TABLE: &'static str = "command";

    fn key(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Software {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl Entity for Software {
    type Key = EntityId;
    const TABLE: &'static str = "software";

    fn key(&self) -> EntityId {
        self.id
    }
}
