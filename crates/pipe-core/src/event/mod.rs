//! Bitácora append-only de la sesión de edición.
pub mod store;
pub mod types;

pub use store::{EventStore, InMemoryEventStore};
pub use types::{SessionEvent, SessionEventKind};
