use pipe_core::CoreEngineError;
use thiserror::Error;

/// Fallas de una llamada al backend. Nunca modifican el estado local.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend responded {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode backend response: {0}")]
    Decode(String),
    #[error("{what} {id} not found on backend")]
    NotFound { what: &'static str, id: String },
    #[error(transparent)]
    Core(#[from] CoreEngineError),
}

impl BackendError {
    /// Errores transitorios: vale la pena repetir la misma llamada.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Transport(_) => true,
            BackendError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::Decode(e.to_string())
    }
}
