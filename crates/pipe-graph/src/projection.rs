//! Proyección de la tabla de colocación a una descripción nodo/arista para
//! el servicio externo de dibujo. No guarda estado.
use std::collections::HashSet;

use indexmap::IndexSet;
use log::debug;
use pipe_core::{CommandConstructor, Commandlines, CoreEngineError, FileCatalog, PlacedFile, PlacementTable};
use pipe_domain::{FileHash, OutputToken};
use serde::{Deserialize, Serialize};

use crate::settings::{Attributes, PreviewSettings, FILE_FONT_COLOR, NOT_READY_COLOR, READY_COLOR};

/// Largo mínimo de prefijo para las etiquetas de archivo.
pub const MIN_PREFIX_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub name: String,
    #[serde(flatten)]
    pub attrs: Attributes,
}

impl GraphNode {
    fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               attrs: Attributes::new() }
    }

    fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    #[serde(flatten)]
    pub attrs: Attributes,
}

impl GraphEdge {
    fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(),
               to: to.into(),
               attrs: Attributes::new() }
    }
}

/// Atributos generales del dibujo (el elemento de `graphs`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStyle {
    pub edge: Attributes,
    pub global: Attributes,
    pub graph: Attributes,
    pub node: Attributes,
}

impl From<&PreviewSettings> for GraphStyle {
    fn from(s: &PreviewSettings) -> Self {
        Self { edge: s.edge.clone(),
               global: s.global.clone(),
               graph: s.graph.clone(),
               node: s.node.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDescription {
    pub graphs: Vec<GraphStyle>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphDescription {
    fn empty(settings: &PreviewSettings) -> Self {
        Self { graphs: vec![GraphStyle::from(settings)],
               nodes: Vec::new(),
               edges: Vec::new() }
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn edges_to(&self, name: &str) -> Vec<&GraphEdge> {
        self.edges.iter().filter(|e| e.to == name).collect()
    }
}

/// Menor largo `>= MIN_PREFIX_LEN` con el que los prefijos de todos los
/// hashes son distintos.
pub fn min_unique_prefix_len<'a, I>(hashes: I) -> usize
    where I: IntoIterator<Item = &'a str>
{
    let hashes: Vec<&str> = hashes.into_iter().collect();
    let longest = hashes.iter().map(|h| h.chars().count()).max().unwrap_or(0);
    let mut len = MIN_PREFIX_LEN;
    while len < longest {
        let mut seen = HashSet::with_capacity(hashes.len());
        if hashes.iter().all(|h| seen.insert(prefix(h, len))) {
            break;
        }
        len += 1;
    }
    len
}

fn prefix(hash: &str, len: usize) -> &str {
    match hash.char_indices().nth(len) {
        Some((end, _)) => &hash[..end],
        None => hash,
    }
}

/// Grafo de la tabla actual: un nodo por proceso, una arista por cada item
/// colocado, nodos de archivo sin borde y salidas listas sin consumir como
/// nodos sueltos.
pub fn project_table(cc: &CommandConstructor,
                     table: &PlacementTable,
                     catalog: &FileCatalog,
                     settings: &PreviewSettings,
                     command_lines: Option<&Commandlines>)
                     -> Result<GraphDescription, CoreEngineError> {
    let mut out = GraphDescription::empty(settings);
    let consumed: HashSet<OutputToken> = table.rows()
                                              .iter()
                                              .flat_map(|r| r.items())
                                              .filter_map(|item| match item {
                                                  PlacedFile::Pending { token, .. } => Some(*token),
                                                  PlacedFile::Existing { .. } => None,
                                              })
                                              .collect();
    let mut files: IndexSet<FileHash> = IndexSet::new();

    for row in table.rows() {
        if !settings.show_not_ready && !row.inputs.iter().all(|s| s.is_filled()) {
            continue;
        }
        let process = cc.processes.require(&row.process_id)?;
        let pid = row.process_id.to_string();
        let label = match command_lines.and_then(|l| l.command_for(row.process_id)) {
            Some(command) if settings.add_commands_to_graph => command,
            _ => process.name.as_str(),
        };
        let mut node = GraphNode::new(pid.clone()).with("id", pid.clone())
                                                  .with("tooltip", process.name.clone())
                                                  .with("label", label);

        for item in row.items() {
            match item {
                PlacedFile::Existing { hash, .. } => {
                    out.edges.push(GraphEdge::new(hash.as_str(), pid.clone()));
                    files.insert(hash.clone());
                }
                PlacedFile::Pending { process_id, token, .. } => {
                    let mut edge = GraphEdge::new(process_id.to_string(), pid.clone());
                    edge.attrs.insert("label".into(), format!(" File: {token}"));
                    out.edges.push(edge);
                }
            }
        }

        if settings.use_colors {
            node = node.with("color", if row.ready { READY_COLOR } else { NOT_READY_COLOR });
        }
        node = node.with("penwidth", "2");

        for output in &row.outputs {
            if output.ready && !consumed.contains(&output.token) {
                let token = output.token.to_string();
                out.edges.push(GraphEdge::new(pid.clone(), token.clone()));
                out.nodes.push(GraphNode::new(token.clone()).with("label", token).with("shape", "none"));
            }
        }
        out.nodes.push(node);
    }

    let len = min_unique_prefix_len(catalog.hashes().map(FileHash::as_str));
    for hash in &files {
        let mut node = GraphNode::new(hash.as_str()).with("label", format!("File:{}...", prefix(hash.as_str(), len)))
                                                    .with("URL", hash.as_str());
        if settings.use_colors {
            node = node.with("fontcolor", FILE_FONT_COLOR);
        }
        out.nodes.push(node.with("shape", "none"));
    }

    debug!("graph projection: {} node(s), {} edge(s)", out.nodes.len(), out.edges.len());
    Ok(out)
}

/// Grafo de dependencias del constructor: procesos como nodos y una arista
/// proceso → padre por cada dependencia.
pub fn project_dependencies(cc: &CommandConstructor, settings: &PreviewSettings) -> GraphDescription {
    let mut out = GraphDescription::empty(settings);
    for process in cc.processes.iter() {
        out.nodes.push(GraphNode::new(process.id.to_string()).with("label", process.name.clone()));
    }
    for dep in cc.dependencies.iter() {
        out.edges.push(GraphEdge::new(dep.process_id.to_string(), dep.parent_process_id.to_string()));
    }
    out
}
