//! Pipeflow: núcleo del constructor de pipelines.
//!
//! Reexporta los crates del workspace:
//! - `domain`: entidades, identificadores y tablas en memoria.
//! - `engine`: constructor, colocación, resolver y sesión.
//! - `graph`: proyección del estado a un grafo para dibujar.
//! - `adapters`: frontera con el backend.

pub use pipe_adapters as adapters;
pub use pipe_core as engine;
pub use pipe_domain as domain;
pub use pipe_graph as graph;

/// Tipos de uso frecuente.
pub mod prelude {
    pub use pipe_adapters::{InMemoryBackend, PipelineBackend, RemoteSession, RetryPolicy};
    pub use pipe_core::{CoreEngineError, DragSource, ExecutionPlan, FileCatalog, ProjectFile, ResolveMode, SessionAction,
                        SessionConfig, SessionContext, Workbench};
    pub use pipe_domain::{EntityId, FileHash, FileToken, OutputToken, ProcessType};
    pub use pipe_graph::{project_table, PreviewSettings};
}
