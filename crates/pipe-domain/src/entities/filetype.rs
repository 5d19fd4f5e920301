use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;
use crate::store::{Entity, Table};

/// Tipo de archivo. Forma un bosque vía `parent_file_type_id`
/// (un SORTEDBAM es-un BAM).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filetype {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub extension: String,
    pub parent_file_type_id: Option<EntityId>,
}

impl Entity for Filetype {
    type Key = EntityId;
    const TABLE: &'static str = "filetype";

    fn key(&self) -> EntityId {
        self.id
    }
}

impl Table<Filetype> {
    /// El tipo mismo seguido de su cadena de ancestros.
    ///
    /// Se detiene en un padre nulo, después de un padre ausente de la tabla
    /// o al revisitar un tipo (bosque mal formado).
    pub fn ancestors_of(&self, filetype_id: EntityId) -> Vec<EntityId> {
        let mut chain = vec![filetype_id];
        let mut seen = HashSet::from([filetype_id]);
        let mut current = self.get(&filetype_id).and_then(|f| f.parent_file_type_id);
        while let Some(parent) = current {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = self.get(&parent).and_then(|f| f.parent_file_type_id);
        }
        chain
    }

    /// `true` si un item de tipo `item_type` puede ocupar un slot que acepta
    /// `accepted` (mismo tipo o descendiente).
    pub fn accepts(&self, accepted: EntityId, item_type: EntityId) -> bool {
        self.ancestors_of(item_type).contains(&accepted)
    }
}
