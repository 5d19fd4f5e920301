use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;
use crate::store::{Entity, Table};

/// Arista dirigida: `process_id` consume una salida de `parent_process_id`.
/// `level` es sólo informativo; nunca se usa para ordenar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub process_id: EntityId,
    pub parent_process_id: EntityId,
    #[serde(default)]
    pub level: u32,
}

impl Dependency {
    pub fn new(process_id: EntityId, parent_process_id: EntityId) -> Self {
        Self { process_id, parent_process_id, level: 0 }
    }
}

/// Clave de una dependencia: el par (consumidor, productor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyKey {
    pub process_id: EntityId,
    pub parent_process_id: EntityId,
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<-{}", self.process_id, self.parent_process_id)
    }
}

impl Entity for Dependency {
    type Key = DependencyKey;
    const TABLE: &'static str = "dependency";

    fn key(&self) -> DependencyKey {
        DependencyKey { process_id: self.process_id,
                        parent_process_id: self.parent_process_id }
    }
}

impl Table<Dependency> {
    /// Aristas donde `process_id` es el consumidor.
    pub fn for_process(&self, process_id: EntityId) -> Table<Dependency> {
        self.filter(|d| d.process_id == process_id)
    }

    pub fn with_parent(&self, parent_process_id: EntityId) -> Table<Dependency> {
        self.filter(|d| d.parent_process_id == parent_process_id)
    }

    /// Todas las aristas alcanzables siguiendo `parent_process_id` desde
    /// `process_id` (DFS, con conjunto de visitados).
    pub fn transitive_parents_of(&self, process_id: EntityId) -> Vec<Dependency> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.collect_parents(process_id, &mut visited, &mut out);
        out
    }

    fn collect_parents(&self, process_id: EntityId, visited: &mut HashSet<EntityId>, out: &mut Vec<Dependency>) {
        if !visited.insert(process_id) {
            return;
        }
        for dep in self.iter().filter(|d| d.process_id == process_id) {
            out.push(dep.clone());
            self.collect_parents(dep.parent_process_id, visited, out);
        }
    }

    /// ¿`process_id` depende (directa o transitivamente) de `ancestor`?
    pub fn depends_on(&self, process_id: EntityId, ancestor: EntityId) -> bool {
        self.transitive_parents_of(process_id).iter().any(|d| d.parent_process_id == ancestor)
    }
}
