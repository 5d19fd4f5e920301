//! pipe-graph: descripción nodo/arista de la sesión para el servicio de
//! dibujo (`getGraphvizSvg`).
pub mod projection;
pub mod settings;

pub use projection::{min_unique_prefix_len, project_dependencies, project_table, GraphDescription, GraphEdge, GraphNode,
                     GraphStyle};
pub use settings::{is_known_shape, Attributes, PreviewSettings, KNOWN_SHAPES};
