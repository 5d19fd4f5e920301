use serde::{Deserialize, Serialize};

use crate::ids::EntityId;
use crate::store::{Entity, Table};

/// Parámetro de un comando. `min_items`/`max_items` codifican la aridad,
/// ver [`Arity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub locus: i32,
    #[serde(default)]
    pub min_items: u32,
    #[serde(default)]
    pub max_items: u32,
    pub parameter_type_id: EntityId,
    pub command_id: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// (0,0): flag sin argumento; usado = exactamente un valor vacío.
    None,
    /// min == max > 0
    Fixed(u32),
    /// min < max
    Range { min: u32, max: u32 },
    /// min > max: "al menos min"
    Unbounded { min: u32 },
}

impl Parameter {
    pub fn arity(&self) -> Arity {
        match (self.min_items, self.max_items) {
            (0, 0) => Arity::None,
            (min, max) if min == max => Arity::Fixed(min),
            (min, max) if min < max => Arity::Range { min, max },
            (min, _) => Arity::Unbounded { min },
        }
    }

    /// Cantidad mínima de valores con argumento que requiere el parámetro.
    pub fn min_required(&self) -> u32 {
        match self.arity() {
            Arity::None => 0,
            _ => self.min_items,
        }
    }

    /// ¿Se puede agregar un valor más teniendo `existing`?
    pub fn can_add_one_more(&self, existing: usize) -> bool {
        let existing = existing as u64;
        match self.arity() {
            Arity::None => false,
            Arity::Unbounded { .. } => true,
            Arity::Fixed(n) => existing < n as u64,
            Arity::Range { max, .. } => existing < max as u64,
        }
    }
}

impl Entity for Parameter {
    type Key = EntityId;
    const TABLE: &'static str = "parameter";

    fn key(&self) -> EntityId {
        self.id
    }
}

impl Table<Parameter> {
    pub fn with_command_id(&self, command_id: EntityId) -> Table<Parameter> {
        self.filter(|p| p.command_id == command_id)
    }

    /// Parámetros ordenados por locus (estable ante empates).
    pub fn sorted_by_locus(&self) -> Vec<&Parameter> {
        let mut params: Vec<&Parameter> = self.iter().collect();
        params.sort_by_key(|p| p.locus);
        params
    }
}

/// Rol de un parámetro, por convención sobre el nombre de su tipo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterRole {
    Input,
    Output,
    Scalar,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterType {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// `None`: valor escalar. `Some`: slot de archivo que acepta ese tipo.
    pub file_type_id: Option<EntityId>,
}

impl ParameterType {
    pub fn role(&self) -> ParameterRole {
        if self.name.eq_ignore_ascii_case("input") {
            ParameterRole::Input
        } else if self.name.eq_ignore_ascii_case("output") {
            ParameterRole::Output
        } else {
            ParameterRole::Scalar
        }
    }

    /// Slot de archivo: rol de entrada/salida con tipo de archivo asociado.
    pub fn file_slot(&self) -> Option<(ParameterRole, EntityId)> {
        match (self.role(), self.file_type_id) {
            (ParameterRole::Scalar, _) | (_, None) => None,
            (role, Some(ft)) => Some((role, ft)),
        }
    }
}

impl Entity for ParameterType {
    type Key = EntityId;
    const TABLE: &'static str = "parametertype";

    fn key(&self) -> EntityId {
        self.id
    }
}
