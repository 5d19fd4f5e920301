//! Estado de colocación y reglas de validez.
//!
//! La tabla se deriva de los valores de los PPVs (`rebuild`) y se vuelca de
//! nuevo sobre ellos (`sync_values`), de modo que el constructor sigue siendo
//! la única fuente de verdad entre lotes de acciones.
use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use pipe_domain::{Dependency, DependencyKey, EntityId, FileToken, OutputToken, ParameterRole};
use serde::{Deserialize, Serialize};

use super::model::{DragSource, FileCatalog, InputSlot, OutputSlot, PlacedFile, Row};
use crate::constructor::CommandConstructor;
use crate::errors::CoreEngineError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementTable {
    rows: Vec<Row>,
}

/// token → (proceso productor, PPV de salida, tipo de archivo).
type OutputIndex = HashMap<OutputToken, (EntityId, EntityId, EntityId)>;

impl PlacementTable {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut table = Self { rows };
        table.recompute_readiness();
        table
    }

    /// Reconstruye la tabla desde los PPVs del constructor.
    ///
    /// - Una fila por proceso, en orden de inserción.
    /// - Salidas sin token válido (o con token repetido) reciben uno nuevo,
    ///   escrito en su PPV.
    /// - Hashes que no están en el catálogo y tokens pendientes sin slot de
    ///   salida productor se descartan.
    /// - Las dependencias se re-derivan de los items pendientes.
    pub fn rebuild(cc: &mut CommandConstructor, catalog: &FileCatalog) -> Result<PlacementTable, CoreEngineError> {
        let process_ids: Vec<EntityId> = cc.processes.keys().copied().collect();
        let mut rows: Vec<Row> = process_ids.iter().map(|pid| Row::new(*pid)).collect();
        let mut outputs: OutputIndex = HashMap::new();

        // 1. salidas (hace falta conocerlas todas antes de ubicar entradas)
        for row in rows.iter_mut() {
            for value in cc.ordered_values(row.process_id)? {
                let Some((ParameterRole::Output, filetype_id)) = cc.file_slot_of(value.parameter_id)? else {
                    continue;
                };
                let token = match FileToken::parse(&value.value) {
                    Some(FileToken::Pending(t)) if !outputs.contains_key(&t) => t,
                    _ => {
                        let t = cc.create_output_token()?;
                        cc.values.require_mut(&value.id)?.value = t.to_string();
                        t
                    }
                };
                outputs.insert(token, (row.process_id, value.id, filetype_id));
                row.outputs.push(OutputSlot { ppv_id: value.id,
                                              parameter_id: value.parameter_id,
                                              filetype_id,
                                              token,
                                              ready: false });
            }
        }

        // 2. entradas
        for row in rows.iter_mut() {
            for value in cc.ordered_values(row.process_id)? {
                let Some((ParameterRole::Input, accepts)) = cc.file_slot_of(value.parameter_id)? else {
                    continue;
                };
                let mut slot = InputSlot { ppv_id: value.id,
                                           parameter_id: value.parameter_id,
                                           accepts,
                                           items: Vec::new() };
                for token in FileToken::parse_all(&value.value) {
                    match resolve_stored(&token, row.process_id, catalog, &outputs) {
                        Some(item) => slot.items.push(item),
                        None => debug!("dropping stale token {} from {}", token, value.id),
                    }
                }
                row.inputs.push(slot);
            }
        }

        let table = PlacementTable::from_rows(rows);
        table.derive_dependencies(cc);
        Ok(table)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, process_id: EntityId) -> Option<&Row> {
        self.rows.iter().find(|r| r.process_id == process_id)
    }

    /// `Some(ready)` si la fila existe.
    pub fn row_ready(&self, process_id: EntityId) -> Option<bool> {
        self.row(process_id).map(|r| r.ready)
    }

    pub fn input_slot(&self, slot_id: EntityId) -> Option<&InputSlot> {
        self.locate_input(slot_id).map(|(r, s)| &self.rows[r].inputs[s])
    }

    /// Fila dueña y slot de salida con ese PPV.
    pub fn output_slot(&self, slot_id: EntityId) -> Option<(&Row, &OutputSlot)> {
        self.rows
            .iter()
            .find_map(|row| row.outputs.iter().find(|o| o.ppv_id == slot_id).map(|o| (row, o)))
    }

    fn locate_input(&self, slot_id: EntityId) -> Option<(usize, usize)> {
        self.rows.iter().enumerate().find_map(|(ri, row)| {
                                        row.inputs.iter().position(|s| s.ppv_id == slot_id).map(|si| (ri, si))
                                    })
    }

    /// Item concreto que representa un arrastre; `None` si el origen no
    /// existe o no es arrastrable (salida no lista).
    pub fn resolve_source(&self, catalog: &FileCatalog, source: &DragSource) -> Option<PlacedFile> {
        match source {
            DragSource::ExistingFile { hash } => catalog.get(hash).map(|f| PlacedFile::Existing { hash: f.hash.clone(),
                                                                                               filetype_id: f.filetype_id }),
            DragSource::Output { slot_id } => {
                let (row, out) = self.output_slot(*slot_id)?;
                if !out.ready {
                    return None;
                }
                Some(PlacedFile::Pending { process_id: row.process_id,
                                           slot_id: out.ppv_id,
                                           token: out.token,
                                           filetype_id: out.filetype_id })
            }
            DragSource::Placed { slot_id, index } => self.input_slot(*slot_id)?.items.get(*index).cloned(),
        }
    }

    /// ¿Se puede soltar `source` en el slot de entrada `target`?
    ///
    /// Requiere tipo compatible (mismo tipo o descendiente) y, para salidas
    /// pendientes, que el productor no sea el proceso destino ni dependa
    /// ya de él (cerraría un ciclo).
    pub fn is_drop_allowed(&self, cc: &CommandConstructor, catalog: &FileCatalog, source: &DragSource, target: EntityId) -> bool {
        let Some((ri, si)) = self.locate_input(target) else {
            return false;
        };
        let Some(item) = self.resolve_source(catalog, source) else {
            return false;
        };
        if !cc.filetypes.accepts(self.rows[ri].inputs[si].accepts, item.filetype_id()) {
            return false;
        }
        if let Some(producer) = item.producer() {
            let consumer = self.rows[ri].process_id;
            if producer == consumer || cc.dependencies.depends_on(producer, consumer) {
                return false;
            }
        }
        true
    }

    /// Coloca un item. Copia desde archivos y salidas; mueve desde otro slot.
    pub fn drop_item(&mut self,
                     cc: &mut CommandConstructor,
                     catalog: &FileCatalog,
                     source: &DragSource,
                     target: EntityId)
                     -> Result<(), CoreEngineError> {
        if !self.is_drop_allowed(cc, catalog, source, target) {
            warn!("drop rejected on slot {target}: {source:?}");
            return Err(CoreEngineError::DropRejected { slot: target });
        }
        let item = match source {
            DragSource::Placed { slot_id, index } => self.remove_item(cc, *slot_id, *index)?,
            other => self.resolve_source(catalog, other)
                         .ok_or(CoreEngineError::DropRejected { slot: target })?,
        };
        let (ri, si) = self.locate_input(target).ok_or(CoreEngineError::UnknownSlot(target))?;
        if let Some(producer) = item.producer() {
            cc.add_dependency(Dependency::new(self.rows[ri].process_id, producer));
        }
        self.rows[ri].inputs[si].items.push(item);
        Ok(())
    }

    /// Quita un item de un slot. Si era el último item de la fila que venía
    /// de cierto productor, se borra también esa dependencia.
    pub fn remove_item(&mut self, cc: &mut CommandConstructor, slot_id: EntityId, index: usize) -> Result<PlacedFile, CoreEngineError> {
        let (ri, si) = self.locate_input(slot_id).ok_or(CoreEngineError::UnknownSlot(slot_id))?;
        let slot = &mut self.rows[ri].inputs[si];
        if index >= slot.items.len() {
            return Err(CoreEngineError::UnknownItem { slot: slot_id, index });
        }
        let item = slot.items.remove(index);
        if let Some(producer) = item.producer() {
            let row = &self.rows[ri];
            if !row.items().any(|i| i.producer() == Some(producer)) {
                cc.dependencies.remove(&DependencyKey { process_id: row.process_id,
                                                        parent_process_id: producer });
            }
        }
        Ok(item)
    }

    /// Recalcula la disponibilidad de cada fila y de sus salidas.
    /// Devuelve las filas que pasaron de lista a no lista.
    pub fn recompute_readiness(&mut self) -> Vec<EntityId> {
        let mut regressed = Vec::new();
        for row in self.rows.iter_mut() {
            let ready = row.inputs.iter().all(InputSlot::is_filled);
            if row.ready && !ready {
                regressed.push(row.process_id);
            }
            row.ready = ready;
            for out in row.outputs.iter_mut() {
                out.ready = ready;
            }
        }
        regressed
    }

    /// Todas las filas con entradas están listas.
    pub fn all_rows_ready(&self) -> bool {
        self.rows.iter().filter(|r| r.has_inputs()).all(|r| r.ready)
    }

    /// Quita, hasta punto fijo, todo item que provenga de una salida de una
    /// fila no lista. Devuelve cuántos items se quitaron.
    pub fn prune_unreachable_outputs(&mut self, cc: &mut CommandConstructor) -> Result<usize, CoreEngineError> {
        let mut removed = 0;
        loop {
            self.recompute_readiness();
            let blocked: HashSet<EntityId> = self.rows
                                                 .iter()
                                                 .filter(|r| !r.ready)
                                                 .flat_map(|r| r.outputs.iter().map(|o| o.ppv_id))
                                                 .collect();
            let mut victims = Vec::new();
            for row in &self.rows {
                for slot in &row.inputs {
                    for (index, item) in slot.items.iter().enumerate().rev() {
                        if let PlacedFile::Pending { slot_id, .. } = item {
                            if blocked.contains(slot_id) {
                                victims.push((slot.ppv_id, index));
                            }
                        }
                    }
                }
            }
            if victims.is_empty() {
                break;
            }
            for (slot_id, index) in victims {
                self.remove_item(cc, slot_id, index)?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("pruned {removed} item(s) sourced from unready outputs");
        }
        Ok(removed)
    }

    /// Vuelca la colocación en los valores de los PPVs y re-deriva las
    /// dependencias.
    pub fn sync_values(&self, cc: &mut CommandConstructor) -> Result<(), CoreEngineError> {
        for row in &self.rows {
            for slot in &row.inputs {
                let value = slot.items.iter().map(|i| i.token().to_string()).collect::<Vec<_>>().join(" ");
                cc.values.require_mut(&slot.ppv_id)?.value = value;
            }
            for out in &row.outputs {
                cc.values.require_mut(&out.ppv_id)?.value = out.token.to_string();
            }
        }
        self.derive_dependencies(cc);
        Ok(())
    }

    fn derive_dependencies(&self, cc: &mut CommandConstructor) {
        cc.dependencies.clear();
        for row in &self.rows {
            for producer in row.items().filter_map(PlacedFile::producer) {
                cc.add_dependency(Dependency::new(row.process_id, producer));
            }
        }
    }
}

fn resolve_stored(token: &FileToken, consumer: EntityId, catalog: &FileCatalog, outputs: &OutputIndex) -> Option<PlacedFile> {
    match token {
        FileToken::Existing(hash) => catalog.get(hash).map(|f| PlacedFile::Existing { hash: f.hash.clone(),
                                                                                       filetype_id: f.filetype_id }),
        FileToken::Pending(t) => {
            let (producer, slot_id, filetype_id) = outputs.get(t)?;
            if *producer == consumer {
                return None;
            }
            Some(PlacedFile::Pending { process_id: *producer,
                                       slot_id: *slot_id,
                                       token: *t,
                                       filetype_id: *filetype_id })
        }
    }
}
