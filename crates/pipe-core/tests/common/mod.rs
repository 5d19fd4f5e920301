#![allow(dead_code)]

use pipe_core::{CommandConstructor, DragSource, FileCatalog, ProjectFile, SessionAction, SessionContext, Workbench};
use pipe_domain::{Command, EntityId, FileHash, Filetype, Parameter, ParameterType, ProcessType};

pub const BAM: EntityId = EntityId::Persisted(1);
pub const SORTEDBAM: EntityId = EntityId::Persisted(2);

pub const SORT: EntityId = EntityId::Persisted(1);
pub const INDEX: EntityId = EntityId::Persisted(2);
pub const MERGE: EntityId = EntityId::Persisted(3);

pub const F1: &str = "a1b2c3d4e5f6";
pub const F2: &str = "a1b2ffff0000";

fn filetype(id: EntityId, name: &str, parent: Option<EntityId>) -> Filetype {
    Filetype { id,
               name: name.to_string(),
               extension: name.to_lowercase(),
               parent_file_type_id: parent }
}

fn parameter_type(id: i64, role: &str, file_type_id: EntityId) -> ParameterType {
    ParameterType { id: EntityId::Persisted(id),
                    name: role.to_string(),
                    description: String::new(),
                    file_type_id: Some(file_type_id) }
}

fn parameter(id: i64, command_id: EntityId, parameter_type_id: i64, locus: i32, min: u32, max: u32) -> Parameter {
    Parameter { id: EntityId::Persisted(id),
                name: format!("param{id}"),
                description: String::new(),
                template: String::new(),
                is_mandatory: true,
                locus,
                min_items: min,
                max_items: max,
                parameter_type_id: EntityId::Persisted(parameter_type_id),
                command_id }
}

/// Paquete de `getCommand` para uno de los comandos de prueba.
///
/// - sort: entrada BAM (1..1) → salida SORTEDBAM
/// - index: entrada SORTEDBAM (1..1), sin salidas
/// - merge: entrada BAM (2..2) → salida SORTEDBAM
pub fn bundle(command_id: EntityId) -> CommandConstructor {
    let mut cc = CommandConstructor::new();
    cc.add_filetype(filetype(BAM, "BAM", None));
    cc.add_filetype(filetype(SORTEDBAM, "SORTEDBAM", Some(BAM)));
    cc.add_parameter_type(parameter_type(10, "input", BAM));
    cc.add_parameter_type(parameter_type(11, "output", SORTEDBAM));
    cc.add_parameter_type(parameter_type(12, "input", SORTEDBAM));
    let name = match command_id {
        SORT => "sort",
        INDEX => "index",
        _ => "merge",
    };
    cc.add_command(Command { id: command_id,
                             name: name.to_string(),
                             description: format!("{name} description"),
                             software_id: None });
    match command_id {
        SORT => {
            cc.add_parameter(parameter(100, SORT, 10, 1, 1, 1));
            cc.add_parameter(parameter(101, SORT, 11, 2, 1, 1));
        }
        INDEX => {
            cc.add_parameter(parameter(102, INDEX, 12, 1, 1, 1));
        }
        _ => {
            cc.add_parameter(parameter(103, MERGE, 10, 1, 2, 2));
            cc.add_parameter(parameter(104, MERGE, 11, 2, 1, 1));
        }
    }
    cc
}

pub fn catalog() -> FileCatalog {
    vec![ProjectFile { hash: FileHash::new(F1),
                       name: "reads.bam".into(),
                       filetype_id: BAM },
         ProjectFile { hash: FileHash::new(F2),
                       name: "reads.sorted.bam".into(),
                       filetype_id: SORTEDBAM }].into_iter()
                                                 .collect()
}

pub fn workbench() -> Workbench {
    Workbench::new(SessionContext::new(5, 8, ProcessType::Job), catalog())
}

/// Agrega un comando y devuelve el id del proceso creado.
pub fn add(wb: &mut Workbench, command_id: EntityId) -> EntityId {
    wb.apply_one(SessionAction::AddCommand { bundle: bundle(command_id) }).expect("add command");
    *wb.constructor().processes.keys().last().expect("process created")
}

pub fn input_slot(wb: &Workbench, process_id: EntityId, n: usize) -> EntityId {
    wb.table().row(process_id).expect("row").inputs[n].ppv_id
}

pub fn output_slot(wb: &Workbench, process_id: EntityId) -> EntityId {
    wb.table().row(process_id).expect("row").outputs[0].ppv_id
}

pub fn file(hash: &str) -> DragSource {
    DragSource::ExistingFile { hash: FileHash::new(hash) }
}

pub fn output_of(wb: &Workbench, process_id: EntityId) -> DragSource {
    DragSource::Output { slot_id: output_slot(wb, process_id) }
}

pub fn drop_into(wb: &mut Workbench, source: DragSource, target: EntityId) {
    wb.apply_one(SessionAction::Drop { source, target }).expect("drop accepted");
}

/// Suelta un archivo existente en la entrada `n` de `process_id`.
pub fn drop_file(wb: &mut Workbench, hash: &str, process_id: EntityId, n: usize) {
    let target = input_slot(wb, process_id, n);
    drop_into(wb, file(hash), target);
}

/// Suelta la salida de `producer` en la entrada `n` de `consumer`.
pub fn drop_output(wb: &mut Workbench, producer: EntityId, consumer: EntityId, n: usize) {
    let source = output_of(wb, producer);
    let target = input_slot(wb, consumer, n);
    drop_into(wb, source, target);
}

/// Ids temporales repetidos entre procesos y PPVs (vacío si no hay choque).
pub fn colliding_temporary_ids(cc: &CommandConstructor) -> Vec<EntityId> {
    let mut seen = std::collections::HashSet::new();
    cc.processes
      .keys()
      .chain(cc.values.keys())
      .filter(|id| id.is_temporary() && !seen.insert(**id))
      .copied()
      .collect()
}
