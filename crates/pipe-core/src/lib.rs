//! pipe-core: sesión de edición de pipelines.
//!
//! Capas, de abajo hacia arriba:
//! - `constructor`: raíz de agregado sobre las tablas de `pipe-domain`.
//! - `placement`: colocación de archivos/salidas en slots y validez por fila.
//! - `resolver`: orden de ejecución lineal a partir de la colocación.
//! - `session`: lotes atómicos de acciones, epoch de pedidos y bitácora.
pub mod commandline;
pub mod config;
pub mod constants;
pub mod constructor;
pub mod context;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod ids;
pub mod placement;
pub mod resolver;
pub mod session;

pub use commandline::{Commandline, Commandlines};
pub use config::{IdStrategy, SessionConfig};
pub use constructor::{CommandConstructor, RemovedProcess};
pub use context::SessionContext;
pub use errors::CoreEngineError;
pub use event::{EventStore, InMemoryEventStore, SessionEvent, SessionEventKind};
pub use ids::{IdAllocator, IdSource, RandomIds, SequentialIds};
pub use placement::{DragSource, FileCatalog, InputSlot, OutputSlot, PlacedFile, PlacementTable, ProjectFile, Row};
pub use resolver::{resolve, ExecutionPlan, InputBinding, PlanStep, ResolveMode, StepInput, StepOutput};
pub use session::{SessionAction, SessionSnapshot, Workbench};
