//! Tablas en memoria (id → entidad) con orden de inserción estable.
//!
//! Contrato común a todas las tablas:
//! - `add` es idempotente: si ya existe una fila con la misma clave no hace
//!   nada (unión).
//! - `get` devuelve `Option` (ausencia esperada); `require` devuelve
//!   `Result` (ausencia = violación de invariante).
//! - `remove` elimina como mucho una fila y preserva el orden del resto.
//! - Los filtros devuelven una tabla nueva del mismo tipo en orden de
//!   inserción.
use std::fmt::{Debug, Display};
use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::DomainError;

/// Entidad almacenable en una `Table`.
pub trait Entity: Clone + Debug {
    type Key: Clone + Eq + Hash + Display + Debug;
    /// Nombre de la tabla (para mensajes de error).
    const TABLE: &'static str;

    fn key(&self) -> Self::Key;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table<T: Entity> {
    rows: IndexMap<T::Key, T>,
}

impl<T: Entity> Default for Table<T> {
    fn default() -> Self {
        Self { rows: IndexMap::new() }
    }
}

impl<T: Entity> Table<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserta si la clave no existe. Devuelve `true` si insertó.
    pub fn add(&mut self, row: T) -> bool {
        let key = row.key();
        if self.rows.contains_key(&key) {
            return false;
        }
        self.rows.insert(key, row);
        true
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.rows.get(key)
    }

    pub fn get_mut(&mut self, key: &T::Key) -> Option<&mut T> {
        self.rows.get_mut(key)
    }

    pub fn require(&self, key: &T::Key) -> Result<&T, DomainError> {
        self.rows.get(key).ok_or_else(|| missing::<T>(key))
    }

    pub fn require_mut(&mut self, key: &T::Key) -> Result<&mut T, DomainError> {
        match self.rows.get_mut(key) {
            Some(row) => Ok(row),
            None => Err(missing::<T>(key)),
        }
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.rows.contains_key(key)
    }

    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        self.rows.shift_remove(key)
    }

    /// Elimina todas las filas que cumplen `pred`; devuelve las eliminadas.
    pub fn remove_where<F>(&mut self, mut pred: F) -> Vec<T>
        where F: FnMut(&T) -> bool
    {
        let keys: Vec<T::Key> = self.rows.iter().filter(|(_, v)| pred(v)).map(|(k, _)| k.clone()).collect();
        keys.iter().filter_map(|k| self.rows.shift_remove(k)).collect()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn filter<F>(&self, mut pred: F) -> Table<T>
        where F: FnMut(&T) -> bool
    {
        self.rows.values().filter(|r| pred(r)).cloned().collect()
    }

    /// Une `other` en `self` (nunca resta).
    pub fn union(&mut self, other: &Table<T>) -> usize {
        other.iter().filter(|r| self.add((*r).clone())).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.values_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &T::Key> {
        self.rows.keys()
    }

    pub fn first(&self) -> Option<&T> {
        self.rows.first().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn missing<T: Entity>(key: &T::Key) -> DomainError {
    DomainError::MissingEntity { table: T::TABLE.to_string(),
                                 key: key.to_string() }
}

impl<T: Entity> FromIterator<T> for Table<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Table::new();
        for row in iter {
            table.add(row);
        }
        table
    }
}

impl<'a, T: Entity> IntoIterator for &'a Table<T> {
    type Item = &'a T;
    type IntoIter = indexmap::map::Values<'a, T::Key, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.values()
    }
}

// Serializa como arreglo: es la forma en que el backend envía y recibe las
// colecciones de entidades.
impl<T> Serialize for Table<T> where T: Entity + Serialize
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer
    {
        serializer.collect_seq(self.rows.values())
    }
}

impl<'de, T> Deserialize<'de> for Table<T> where T: Entity + Deserialize<'de>
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: Deserializer<'de>
    {
        let rows = Vec::<T>::deserialize(deserializer)?;
        Ok(rows.into_iter().collect())
    }
}
