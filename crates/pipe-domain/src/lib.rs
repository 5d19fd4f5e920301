//! pipe-domain: entidades y tablas en memoria del constructor de pipelines.
pub mod entities;
pub mod errors;
pub mod ids;
pub mod store;

pub use entities::{Arity, Command, Dependency, DependencyKey, Filetype, Parameter, ParameterRole, ParameterType, Process,
                   ProcessParameterValue, ProcessType, Software};
pub use errors::DomainError;
pub use ids::{EntityId, FileHash, FileToken, OutputToken, PENDING_OUTPUT_PREFIX, TEMPORARY_ID_PREFIX};
pub use store::{Entity, Table};
