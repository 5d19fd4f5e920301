//! Configuración de la vista previa del grafo (no se persiste).
use indexmap::IndexMap;
use log::debug;
use pipe_core::CoreEngineError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Atributos graphviz en orden de inserción.
pub type Attributes = IndexMap<String, String>;

pub const FONT_NAME: &str = "'lucida grande',tahoma,verdana, sans-serif";

pub const READY_COLOR: &str = "#00a000";
pub const NOT_READY_COLOR: &str = "#f00000";
pub const FILE_FONT_COLOR: &str = "#0000FF";

/// Formas de nodo que acepta el servicio de dibujo.
pub const KNOWN_SHAPES: &[&str] = &["box",
                                    "box3d",
                                    "circle",
                                    "component",
                                    "diamond",
                                    "doublecircle",
                                    "doubleoctagon",
                                    "egg",
                                    "ellipse",
                                    "folder",
                                    "hexagon",
                                    "house",
                                    "invhouse",
                                    "invtrapezium",
                                    "invtriangle",
                                    "Mcircle",
                                    "Mdiamond",
                                    "Msquare",
                                    "none",
                                    "note",
                                    "octagon",
                                    "oval",
                                    "parallelogram",
                                    "pentagon",
                                    "plaintext",
                                    "point",
                                    "polygon",
                                    "rect",
                                    "rectangle",
                                    "septagon",
                                    "square",
                                    "tab",
                                    "trapezium",
                                    "triangle",
                                    "tripleoctagon"];

pub fn is_known_shape(shape: &str) -> bool {
    KNOWN_SHAPES.contains(&shape)
}

fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSettings {
    pub edge: Attributes,
    pub global: Attributes,
    pub graph: Attributes,
    pub node: Attributes,
    /// Colorea filas listas / no listas y nodos de archivo.
    pub use_colors: bool,
    /// Etiqueta de proceso = línea de comando en vez del nombre.
    pub add_commands_to_graph: bool,
    /// Incluye filas con slots de entrada sin cubrir.
    pub show_not_ready: bool,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self { edge: attrs(&[("color", "black"), ("fontname", FONT_NAME), ("fontsize", "10")]),
               global: attrs(&[("directed", "1"), ("name", "svg")]),
               graph: attrs(&[("id", "svgGraph"),
                              ("label", ""),
                              ("rankdir", "TB"),
                              ("fontname", FONT_NAME),
                              ("fontsize", "14"),
                              ("size", "7.292,"),
                              ("bgcolor", "transparent")]),
               node: attrs(&[("shape", "oval"), ("fontname", FONT_NAME), ("fontsize", "10")]),
               use_colors: true,
               add_commands_to_graph: false,
               show_not_ready: true }
    }
}

impl PreviewSettings {
    /// Mezcla `{"edge":{..},"global":{..},"graph":{..},"node":{..}}` sobre la
    /// configuración actual. Otras claves se ignoran. Devuelve la cantidad de
    /// atributos escritos; si `node.shape` no es una forma conocida no se
    /// aplica nada.
    pub fn update(&mut self, properties: &Value) -> Result<usize, CoreEngineError> {
        if let Some(shape) = properties.pointer("/node/shape") {
            let shape = attr_value(shape);
            if !is_known_shape(&shape) {
                return Err(CoreEngineError::InvalidConfig { key: "node.shape".into(),
                                                            value: shape });
            }
        }
        let mut written = 0;
        for (section, target) in [("edge", &mut self.edge),
                                  ("global", &mut self.global),
                                  ("graph", &mut self.graph),
                                  ("node", &mut self.node)]
        {
            let Some(Value::Object(map)) = properties.get(section) else {
                continue;
            };
            for (key, value) in map {
                target.insert(key.clone(), attr_value(value));
                written += 1;
            }
        }
        debug!("preview settings updated ({} attribute(s))", written);
        Ok(written)
    }
}

fn attr_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
