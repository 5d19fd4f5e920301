//! JSON de pasos para `createProcess` y `getBashCommandPreview`.
//!
//! ```json
//! {"steps":[{"step":0,"process":{..},"dependencies":[..],
//!            "process_parameter_values":[{"process_id","parameter_id","value","locus"}]}]}
//! ```
use std::collections::HashMap;

use pipe_core::{CommandConstructor, CoreEngineError, ExecutionPlan, InputBinding, PlanStep};
use pipe_domain::{Dependency, EntityId, Process};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepValue {
    pub process_id: EntityId,
    pub parameter_id: EntityId,
    pub value: String,
    pub locus: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPayload {
    pub step: usize,
    pub process: Process,
    pub dependencies: Vec<Dependency>,
    pub process_parameter_values: Vec<StepValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepsPayload {
    pub steps: Vec<StepPayload>,
}

/// Arma el payload de un plan. Los slots de archivo llevan los tokens
/// ligados por el resolver; el resto, el valor guardado del PPV.
pub fn steps_payload(plan: &ExecutionPlan, cc: &CommandConstructor) -> Result<StepsPayload, CoreEngineError> {
    let mut steps = Vec::with_capacity(plan.steps.len());
    for step in &plan.steps {
        let bound = bound_values(step);
        let process_parameter_values = cc.ordered_values(step.process.id)?
                                         .into_iter()
                                         .map(|v| StepValue { process_id: v.process_id,
                                                              parameter_id: v.parameter_id,
                                                              value: bound.get(&v.id).cloned().unwrap_or(v.value),
                                                              locus: v.locus })
                                         .collect();
        steps.push(StepPayload { step: step.step,
                                 process: step.process.clone(),
                                 dependencies: cc.dependencies.for_process(step.process.id).iter().cloned().collect(),
                                 process_parameter_values });
    }
    Ok(StepsPayload { steps })
}

fn bound_values(step: &PlanStep) -> HashMap<EntityId, String> {
    let mut out = HashMap::new();
    for input in &step.inputs {
        let tokens: Vec<String> = input.bindings
                                       .iter()
                                       .map(|b| match b {
                                           InputBinding::Existing { hash } => hash.to_string(),
                                           InputBinding::Produced { token, .. } => token.to_string(),
                                       })
                                       .collect();
        out.insert(input.ppv_id, tokens.join(" "));
    }
    for output in &step.outputs {
        out.insert(output.ppv_id, output.token.to_string());
    }
    out
}
