use pipe_adapters::{steps_payload, BackendError, CommandBundle, InMemoryBackend, ProcessBundle, RemoteSession, RetryPolicy};
use pipe_core::{CoreEngineError, DragSource, FileCatalog, ProjectFile, ResolveMode, SessionAction, SessionContext, Workbench};
use pipe_domain::{Dependency, EntityId, FileHash, ProcessType};
use pipe_graph::PreviewSettings;
use serde_json::{json, Value};
use tokio_test::block_on;

const SORT: EntityId = EntityId::Persisted(1);
const F1: &str = "a1b2c3d4e5f6";

fn schema() -> Value {
    json!({
        "filetypes": [{ "id": 1, "name": "BAM", "extension": "bam", "parent_file_type_id": null }],
        "parametertypes": [
            { "id": 10, "name": "input", "file_type_id": 1 },
            { "id": 11, "name": "output", "file_type_id": 1 },
            { "id": 12, "name": "scalar", "file_type_id": null }
        ],
        "parameters": [
            { "id": 100, "name": "in", "is_mandatory": true, "locus": 1, "min_items": 1, "max_items": 1,
              "parameter_type_id": 10, "command_id": 1 },
            { "id": 101, "name": "out", "is_mandatory": true, "locus": 2, "min_items": 1, "max_items": 1,
              "parameter_type_id": 11, "command_id": 1 },
            { "id": 102, "name": "threads", "is_mandatory": true, "locus": 0, "min_items": 1, "max_items": 1,
              "parameter_type_id": 12, "command_id": 1 }
        ]
    })
}

fn command_bundle() -> CommandBundle {
    let mut value = schema();
    value["command"] = json!({ "id": 1, "name": "sort", "description": "sort reads", "software_id": 3 });
    value["software"] = json!({ "id": 3, "name": "samtools", "version": "1.19" });
    serde_json::from_value(value).expect("getCommand response")
}

fn process_bundle() -> ProcessBundle {
    let mut value = schema();
    value["process"] = json!({ "id": 500, "name": "stored sort", "command_id": 1, "type": 1 });
    value["commands"] = json!([{ "id": 1, "name": "sort", "software_id": null }]);
    value["processparametervalues"] = json!([
        { "id": 900, "process_id": 500, "parameter_id": 100, "value": F1, "locus": 0 },
        { "id": 901, "process_id": 500, "parameter_id": 101, "value": "NEWFILE7", "locus": 0 },
        { "id": 902, "process_id": 500, "parameter_id": 102, "value": "2", "locus": 0 }
    ]);
    serde_json::from_value(value).expect("getProcessWithDependencies response")
}

fn backend() -> InMemoryBackend {
    InMemoryBackend::new().with_command(command_bundle())
                          .with_process(process_bundle())
                          .with_help("sort", "<p>sorts reads</p>")
}

fn workbench() -> Workbench {
    let catalog: FileCatalog = std::iter::once(ProjectFile { hash: FileHash::new(F1),
                                                             name: "reads.bam".into(),
                                                             filetype_id: EntityId::Persisted(1) }).collect();
    Workbench::new(SessionContext::new(5, 8, ProcessType::Job), catalog)
}

fn fast() -> RetryPolicy {
    RetryPolicy { max_retries: 3,
                  base_delay_ms: 1 }
}

fn last_process(wb: &Workbench) -> EntityId {
    *wb.constructor().processes.keys().last().expect("process")
}

fn place(wb: &mut Workbench, source: DragSource, consumer: EntityId) {
    let target = wb.table().row(consumer).expect("row").inputs[0].ppv_id;
    wb.apply_one(SessionAction::Drop { source, target }).expect("drop");
}

fn set_threads(wb: &mut Workbench, process_id: EntityId, value: &str) {
    let ppv = wb.constructor()
                .values
                .with_process_and_parameter(process_id, EntityId::Persisted(102))
                .first()
                .map(|v| v.id)
                .expect("threads ppv");
    wb.apply_one(SessionAction::SetParameterValue { value_id: ppv,
                                                    value: value.into() })
      .expect("set value");
}

#[test]
fn add_command_survives_transient_failures() {
    let backend = backend();
    let remote = RemoteSession::new(&backend, fast());
    let mut wb = workbench();
    backend.fail_next(2);
    block_on(remote.add_command(&mut wb, SORT)).expect("added");
    assert_eq!(wb.constructor().processes.len(), 1);
    assert!(wb.constructor().softwares.contains(&EntityId::Persisted(3)));
}

#[test]
fn backend_errors_leave_the_session_untouched() {
    let backend = backend();
    let mut wb = workbench();
    let err = block_on(RemoteSession::new(&backend, fast()).add_command(&mut wb, EntityId::Persisted(77))).expect_err("missing");
    assert!(matches!(err, BackendError::NotFound { what: "command", .. }));

    backend.fail_next(1);
    let err = block_on(RemoteSession::new(&backend, RetryPolicy::none()).add_command(&mut wb, SORT)).expect_err("no retry");
    assert!(err.is_retryable());
    assert_eq!(wb.epoch(), 0);
    assert!(wb.constructor().processes.is_empty());
}

#[test]
fn submit_run_sends_values_in_locus_order() {
    let backend = backend();
    let remote = RemoteSession::new(&backend, fast());
    let mut wb = workbench();
    block_on(remote.add_command(&mut wb, SORT)).expect("added");
    let p1 = last_process(&wb);
    set_threads(&mut wb, p1, "4");
    place(&mut wb, DragSource::ExistingFile { hash: FileHash::new(F1) }, p1);
    let token = wb.table().row(p1).expect("row").outputs[0].token;

    let lines = block_on(remote.submit_run(&mut wb)).expect("run");
    let created = block_on(backend.created());
    assert_eq!(created.len(), 1);
    let step = &created[0].steps[0];
    assert_eq!(step.process.process_type, ProcessType::Job);
    let values: Vec<&str> = step.process_parameter_values.iter().map(|v| v.value.as_str()).collect();
    assert_eq!(values, vec!["4".to_string(), F1.to_string(), token.to_string()]);
    assert_eq!(lines.command_for(p1), Some(format!("sort 4 {F1} {token}").as_str()));
    assert_eq!(wb.command_lines(), &lines);
}

#[test]
fn submit_run_is_refused_until_every_row_is_ready() {
    let backend = backend();
    let remote = RemoteSession::new(&backend, fast());
    let mut wb = workbench();
    block_on(remote.add_command(&mut wb, SORT)).expect("added");
    let err = block_on(remote.submit_run(&mut wb)).expect_err("not ready");
    assert_eq!(err, BackendError::Core(CoreEngineError::InputsNotReady));
    assert!(block_on(backend.created()).is_empty());
}

#[test]
fn payload_carries_dependencies_and_bound_tokens() {
    let backend = backend();
    let remote = RemoteSession::new(&backend, fast());
    let mut wb = workbench();
    block_on(remote.add_command(&mut wb, SORT)).expect("first");
    let p1 = last_process(&wb);
    block_on(remote.add_command(&mut wb, SORT)).expect("second");
    let p2 = last_process(&wb);
    place(&mut wb, DragSource::ExistingFile { hash: FileHash::new(F1) }, p1);
    let out = wb.table().row(p1).expect("row").outputs[0].clone();
    place(&mut wb, DragSource::Output { slot_id: out.ppv_id }, p2);

    let plan = wb.execution_plan(ResolveMode::Strict).expect("plan");
    let payload = steps_payload(&plan, wb.constructor()).expect("payload");
    assert_eq!(payload.steps[0].process.id, p1);
    assert!(payload.steps[0].dependencies.is_empty());
    assert_eq!(payload.steps[1].dependencies, vec![Dependency::new(p2, p1)]);
    assert_eq!(payload.steps[1].process_parameter_values[1].value, out.token.to_string());

    let json = serde_json::to_value(&payload).expect("json");
    assert_eq!(json["steps"][1]["step"], json!(1));
    assert!(json["steps"][1]["process_parameter_values"][0].get("locus").is_some());
}

#[test]
fn preview_responses_for_old_epochs_are_dropped() {
    let backend = backend();
    let remote = RemoteSession::new(&backend, fast());
    let mut wb = workbench();
    block_on(remote.add_command(&mut wb, SORT)).expect("added");
    let p1 = last_process(&wb);

    let (epoch, lines) = block_on(remote.request_preview(&wb, true)).expect("preview");
    place(&mut wb, DragSource::ExistingFile { hash: FileHash::new(F1) }, p1);
    assert!(!wb.apply_command_lines(epoch, lines));
    assert!(wb.command_lines().is_empty());

    assert!(block_on(remote.refresh_preview(&mut wb, true)).expect("fresh"));
    let line = wb.command_lines().command_for(p1).expect("line");
    assert!(line.starts_with("sort"));
    assert!(line.contains("a1b2c3d4") && !line.contains(F1));
}

#[test]
fn stored_process_is_loaded_with_its_placement() {
    let backend = backend();
    let remote = RemoteSession::new(&backend, fast());
    let mut wb = workbench();
    block_on(remote.load_process(&mut wb, EntityId::Persisted(500))).expect("loaded");
    let row = wb.table().row(EntityId::Persisted(500)).expect("row");
    assert!(row.ready);
    assert_eq!(row.outputs[0].token.to_string(), "NEWFILE7");
    assert!(wb.all_rows_ready());
}

#[test]
fn graph_and_help_pass_through() {
    let backend = backend();
    let remote = RemoteSession::new(&backend, fast());
    let mut wb = workbench();
    block_on(remote.add_command(&mut wb, SORT)).expect("added");
    let svg = block_on(remote.render_graph(&wb, &PreviewSettings::default())).expect("svg");
    assert!(svg.starts_with("<svg") && svg.contains("data-nodes=\"1\""));
    assert_eq!(block_on(remote.help("sort")).expect("help"), "<p>sorts reads</p>");
    assert!(block_on(remote.help("merge")).is_err());
}
