//! Motor de colocación y validez.
//!
//! Cada fila (proceso) tiene slots de entrada con los items arrastrados y
//! slots de salida que se vuelven arrastrables cuando todas las entradas de
//! la fila tienen exactamente un item. Las reglas:
//! - `is_drop_allowed`: compatibilidad de tipo por cierre de supertipos y
//!   ausencia de ciclos de dependencia.
//! - `recompute_readiness` / `all_rows_ready`: disponibilidad por fila y
//!   global (una fila sin entradas está lista y no cuenta en el total).
//! - `prune_unreachable_outputs`: cascada a punto fijo cuando una fila deja
//!   de estar lista.
mod model;
mod table;

pub use model::{DragSource, FileCatalog, InputSlot, OutputSlot, PlacedFile, ProjectFile, Row};
pub use table::PlacementTable;
