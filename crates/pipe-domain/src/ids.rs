//! Identificadores y tokens de archivo.
//!
//! Tres familias distinguibles por forma:
//! - `EntityId::Persisted(n)`: id asignado por el servidor (entero).
//! - `EntityId::Temporary(n)`: id local de la sesión, serializado como
//!   `dummyId<n>`, nunca colisiona con un id persistido.
//! - `FileToken`: valor de un slot de archivo; un hash de contenido opaco
//!   (archivo existente) o `NEWFILE<n>` (salida pendiente de otro proceso).
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::DomainError;

pub const TEMPORARY_ID_PREFIX: &str = "dummyId";
pub const PENDING_OUTPUT_PREFIX: &str = "NEWFILE";

/// Identificador de cualquier entidad de las tablas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityId {
    Persisted(i64),
    Temporary(u32),
}

impl EntityId {
    pub fn is_temporary(&self) -> bool {
        matches!(self, EntityId::Temporary(_))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Persisted(n) => write!(f, "{n}"),
            EntityId::Temporary(n) => write!(f, "{TEMPORARY_ID_PREFIX}{n}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(rest) = trimmed.strip_prefix(TEMPORARY_ID_PREFIX) {
            return rest.parse::<u32>()
                       .map(EntityId::Temporary)
                       .map_err(|_| DomainError::InvalidIdentifier(s.to_string()));
        }
        trimmed.parse::<i64>()
               .map(EntityId::Persisted)
               .map_err(|_| DomainError::InvalidIdentifier(s.to_string()))
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Persisted(n)
    }
}

// Los ids viajan como string (así los espera el backend), pero los payloads
// del servidor pueden traerlos numéricos.
impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer
    {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: Deserializer<'de>
    {
        match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Ok(EntityId::Persisted(n)),
            RawId::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Token de una salida aún no materializada (`NEWFILE<n>`), único en la sesión.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputToken(pub u32);

impl fmt::Display for OutputToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PENDING_OUTPUT_PREFIX}{}", self.0)
    }
}

/// Hash de contenido de un archivo existente del proyecto.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileHash(pub String);

impl FileHash {
    pub fn new(hash: impl Into<String>) -> Self {
        FileHash(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Valor almacenado en un PPV de archivo.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileToken {
    Existing(FileHash),
    Pending(OutputToken),
}

impl FileToken {
    /// Interpreta un fragmento de `value`. `None` si está vacío.
    pub fn parse(raw: &str) -> Option<FileToken> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(rest) = raw.strip_prefix(PENDING_OUTPUT_PREFIX) {
            if let Ok(n) = rest.parse::<u32>() {
                return Some(FileToken::Pending(OutputToken(n)));
            }
        }
        Some(FileToken::Existing(FileHash::new(raw)))
    }

    /// Todos los tokens de un valor (separados por espacios).
    pub fn parse_all(value: &str) -> Vec<FileToken> {
        value.split_whitespace().filter_map(FileToken::parse).collect()
    }
}

impl fmt::Display for FileToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileToken::Existing(hash) => write!(f, "{hash}"),
            FileToken::Pending(token) => write!(f, "{token}"),
        }
    }
}
