//! Resolución del orden de ejecución.
//!
//! Worklist en el orden de la tabla: un cursor recorre las filas pendientes
//! y emite toda fila cuyas entradas estén cubiertas por archivos existentes
//! o por salidas de pasos ya emitidos. Se termina cuando no quedan filas o
//! cuando una vuelta completa no emite nada; en ese caso lo que queda es un
//! ciclo (o entradas vacías) y el modo estricto lo reporta.
use std::collections::HashMap;

use log::{debug, warn};
use pipe_domain::{EntityId, FileHash, OutputToken, Process};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::PLAN_FORMAT_VERSION;
use crate::constructor::CommandConstructor;
use crate::context::SessionContext;
use crate::errors::CoreEngineError;
use crate::hashing::hash_value;
use crate::placement::{PlacedFile, PlacementTable, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolveMode {
    /// Falla si alguna fila no se puede ordenar.
    #[default]
    Strict,
    /// Agrega al final las filas sin resolver, sin bindings (vista previa).
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputBinding {
    Existing { hash: FileHash },
    /// Salida `token` del paso `step` (anterior).
    Produced { step: usize, token: OutputToken },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInput {
    pub ppv_id: EntityId,
    pub parameter_id: EntityId,
    pub bindings: Vec<InputBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutput {
    pub ppv_id: EntityId,
    pub parameter_id: EntityId,
    pub token: OutputToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub step: usize,
    pub process: Process,
    pub inputs: Vec<StepInput>,
    pub outputs: Vec<StepOutput>,
    /// `false` sólo para filas agregadas por el modo tolerante.
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub steps: Vec<PlanStep>,
    pub complete: bool,
    /// blake3 del JSON canónico de los pasos.
    pub fingerprint: String,
}

impl ExecutionPlan {
    pub fn process_order(&self) -> Vec<EntityId> {
        self.steps.iter().map(|s| s.process.id).collect()
    }

    pub fn step_for(&self, process_id: EntityId) -> Option<&PlanStep> {
        self.steps.iter().find(|s| s.process.id == process_id)
    }
}

pub fn resolve(cc: &CommandConstructor,
               table: &PlacementTable,
               ctx: &SessionContext,
               mode: ResolveMode)
               -> Result<ExecutionPlan, CoreEngineError> {
    let mut pending: Vec<&Row> = table.rows().iter().collect();
    let mut produced: HashMap<OutputToken, usize> = HashMap::new();
    let mut steps: Vec<PlanStep> = Vec::with_capacity(pending.len());

    // el cursor avanza módulo la lista que queda, también tras emitir
    let mut cursor = 0;
    let mut misses = 0;
    while !pending.is_empty() && misses < pending.len() {
        let at = cursor % pending.len();
        cursor += 1;
        let Some(inputs) = bind_inputs(pending[at], &produced) else {
            misses += 1;
            continue;
        };
        misses = 0;
        let row = pending.remove(at);
        let step = steps.len();
        let outputs: Vec<StepOutput> = row.outputs
                                          .iter()
                                          .map(|o| StepOutput { ppv_id: o.ppv_id,
                                                                parameter_id: o.parameter_id,
                                                                token: o.token })
                                          .collect();
        for out in &outputs {
            produced.insert(out.token, step);
        }
        steps.push(PlanStep { step,
                              process: ctx.stamp(cc.processes.require(&row.process_id)?),
                              inputs,
                              outputs,
                              resolved: true });
    }

    if !pending.is_empty() {
        match mode {
            ResolveMode::Strict => {
                let unresolved: Vec<String> = pending.iter().map(|r| r.process_id.to_string()).collect();
                warn!("execution order not found, unresolved rows: {:?}", unresolved);
                return Err(CoreEngineError::DependencyLoop { unresolved });
            }
            ResolveMode::Lenient => {
                for row in pending {
                    steps.push(PlanStep { step: steps.len(),
                                          process: ctx.stamp(cc.processes.require(&row.process_id)?),
                                          inputs: Vec::new(),
                                          outputs: Vec::new(),
                                          resolved: false });
                }
            }
        }
    }

    let complete = steps.iter().all(|s| s.resolved);
    let fingerprint = fingerprint_steps(&steps)?;
    debug!("resolved {} step(s), complete={}, fingerprint={}", steps.len(), complete, fingerprint);
    Ok(ExecutionPlan { steps, complete, fingerprint })
}

/// Bindings de cada slot si todos están cubiertos ahora.
fn bind_inputs(row: &Row, produced: &HashMap<OutputToken, usize>) -> Option<Vec<StepInput>> {
    let mut inputs = Vec::with_capacity(row.inputs.len());
    for slot in &row.inputs {
        if slot.items.is_empty() {
            return None;
        }
        let mut bindings = Vec::with_capacity(slot.items.len());
        for item in &slot.items {
            let binding = match item {
                PlacedFile::Existing { hash, .. } => InputBinding::Existing { hash: hash.clone() },
                PlacedFile::Pending { token, .. } => InputBinding::Produced { step: *produced.get(token)?,
                                                                              token: *token },
            };
            bindings.push(binding);
        }
        inputs.push(StepInput { ppv_id: slot.ppv_id,
                                parameter_id: slot.parameter_id,
                                bindings });
    }
    Some(inputs)
}

fn fingerprint_steps(steps: &[PlanStep]) -> Result<String, CoreEngineError> {
    let steps_json = serde_json::to_value(steps).map_err(|e| CoreEngineError::Internal(e.to_string()))?;
    Ok(hash_value(&json!({ "version": PLAN_FORMAT_VERSION, "steps": steps_json })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{InputSlot, OutputSlot};
    use pipe_domain::ProcessType;

    fn id(n: i64) -> EntityId {
        EntityId::Persisted(n)
    }

    fn cc_with(processes: &[i64]) -> CommandConstructor {
        let mut cc = CommandConstructor::new();
        for p in processes {
            cc.add_process(Process { id: id(*p),
                                     name: format!("p{p}"),
                                     description: String::new(),
                                     command_id: id(1),
                                     project_id: None,
                                     person_id: None,
                                     process_type: ProcessType::Template });
        }
        cc
    }

    /// Fila `p` con salida `NEWFILE<p>` y una entrada por cada fuente.
    fn row(p: i64, sources: &[Option<i64>]) -> Row {
        let inputs = sources.iter()
                            .enumerate()
                            .map(|(i, src)| {
                                let item = match src {
                                    None => PlacedFile::Existing { hash: FileHash::new(format!("hash{p}")),
                                                                   filetype_id: id(1) },
                                    Some(q) => PlacedFile::Pending { process_id: id(*q),
                                                                     slot_id: id(1000 + q),
                                                                     token: OutputToken(*q as u32),
                                                                     filetype_id: id(1) },
                                };
                                InputSlot { ppv_id: id(100 * p + i as i64),
                                            parameter_id: id(1),
                                            accepts: id(1),
                                            items: vec![item] }
                            })
                            .collect();
        Row { process_id: id(p),
              inputs,
              outputs: vec![OutputSlot { ppv_id: id(1000 + p),
                                         parameter_id: id(2),
                                         filetype_id: id(1),
                                         token: OutputToken(p as u32),
                                         ready: false }],
              ready: false }
    }

    #[test]
    fn chain_is_ordered_regardless_of_table_order() {
        // A=1 usa un archivo, B=2 consume A, C=3 consume B; tabla en orden C, B, A
        let cc = cc_with(&[3, 2, 1]);
        let table = PlacementTable::from_rows(vec![row(3, &[Some(2)]), row(2, &[Some(1)]), row(1, &[None])]);
        let plan = resolve(&cc, &table, &SessionContext::default(), ResolveMode::Strict).expect("plan");
        assert_eq!(plan.process_order(), vec![id(1), id(2), id(3)]);
        assert!(plan.complete);
        let c = plan.step_for(id(3)).expect("C");
        assert_eq!(c.inputs[0].bindings, vec![InputBinding::Produced { step: 1, token: OutputToken(2) }]);
    }

    #[test]
    fn cursor_keeps_advancing_after_an_emitted_row() {
        // tabla B(consume A), A, C: tras A el cursor cae sobre B antes que C
        let cc = cc_with(&[2, 1, 3]);
        let table = PlacementTable::from_rows(vec![row(2, &[Some(1)]), row(1, &[None]), row(3, &[None])]);
        let plan = resolve(&cc, &table, &SessionContext::default(), ResolveMode::Strict).expect("plan");
        assert_eq!(plan.process_order(), vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn resolution_is_deterministic() {
        let cc = cc_with(&[1, 2, 3, 4]);
        let rows = vec![row(4, &[Some(2), Some(3)]), row(2, &[Some(1)]), row(3, &[Some(1)]), row(1, &[None])];
        let a = resolve(&cc, &PlacementTable::from_rows(rows.clone()), &SessionContext::default(), ResolveMode::Strict).expect("a");
        let b = resolve(&cc, &PlacementTable::from_rows(rows), &SessionContext::default(), ResolveMode::Strict).expect("b");
        assert_eq!(serde_json::to_string(&a).expect("a json"), serde_json::to_string(&b).expect("b json"));
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.process_order(), vec![id(1), id(2), id(3), id(4)]);
    }

    #[test]
    fn cycle_is_reported_not_truncated() {
        let cc = cc_with(&[1, 2]);
        let table = PlacementTable::from_rows(vec![row(1, &[Some(2)]), row(2, &[Some(1)])]);
        let err = resolve(&cc, &table, &SessionContext::default(), ResolveMode::Strict).expect_err("cycle");
        assert_eq!(err, CoreEngineError::DependencyLoop { unresolved: vec!["1".into(), "2".into()] });
        assert!(err.to_string().contains("dependency loop"));
    }

    #[test]
    fn lenient_mode_appends_unresolved_rows_without_bindings() {
        let cc = cc_with(&[1, 2, 3]);
        let table = PlacementTable::from_rows(vec![row(1, &[Some(2)]), row(2, &[Some(1)]), row(3, &[None])]);
        let plan = resolve(&cc, &table, &SessionContext::default(), ResolveMode::Lenient).expect("preview");
        assert_eq!(plan.process_order(), vec![id(3), id(1), id(2)]);
        assert!(!plan.complete);
        assert!(plan.steps[1].inputs.is_empty() && plan.steps[1].outputs.is_empty());
        assert!(!plan.steps[2].resolved);
    }

    #[test]
    fn steps_are_stamped_with_session_context() {
        let cc = cc_with(&[1]);
        let table = PlacementTable::from_rows(vec![row(1, &[None])]);
        let ctx = SessionContext::new(7, 9, ProcessType::Job);
        let plan = resolve(&cc, &table, &ctx, ResolveMode::Strict).expect("plan");
        let p = &plan.steps[0].process;
        assert_eq!((p.project_id, p.person_id, p.process_type), (Some(7), Some(9), ProcessType::Job));
    }
}
