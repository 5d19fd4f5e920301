// errors.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errores del modelo de entidades (tablas en memoria + identificadores).
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum DomainError {
    /// Se esperaba la presencia de la entidad (invariante tras una validación).
    #[error("missing {table} with key {key}")]
    MissingEntity { table: String, key: String },

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid file token: {0}")]
    InvalidToken(String),

    #[error("invalid process type: {0}")]
    InvalidProcessType(u8),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Serialization(e.to_string())
    }
}
