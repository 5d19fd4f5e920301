//! Entidades del constructor de pipelines.
//!
//! Todas son valores planos (serde) sin lógica de sesión; las consultas por
//! clave foránea y los cierres recursivos viven como `impl Table<_>` junto a
//! cada entidad.
mod command;
mod dependency;
mod filetype;
mod parameter;
mod process;

pub use command::{Command, Software};
pub use dependency::{Dependency, DependencyKey};
pub use filetype::Filetype;
pub use parameter::{Arity, Parameter, ParameterRole, ParameterType};
pub use process::{Process, ProcessParameterValue, ProcessType};
