use pipe_core::{Commandline, Commandlines, CommandConstructor, DragSource, FileCatalog, ProjectFile, SessionAction,
                SessionContext, Workbench};
use pipe_domain::{Command, EntityId, FileHash, Filetype, Parameter, ParameterType};
use pipe_graph::{project_dependencies, project_table, GraphDescription, PreviewSettings};
use serde_json::json;

const BAM: EntityId = EntityId::Persisted(1);
const SORT: EntityId = EntityId::Persisted(1);
const INDEX: EntityId = EntityId::Persisted(2);
const F1: &str = "a1b2c3d4e5f6";
const F2: &str = "a1b2ffff0000";

fn sort_bundle() -> CommandConstructor {
    let mut cc = CommandConstructor::new();
    cc.add_filetype(Filetype { id: BAM,
                               name: "BAM".into(),
                               extension: "bam".into(),
                               parent_file_type_id: None });
    for (id, role) in [(10, "input"), (11, "output")] {
        cc.add_parameter_type(ParameterType { id: EntityId::Persisted(id),
                                              name: role.into(),
                                              description: String::new(),
                                              file_type_id: Some(BAM) });
    }
    cc.add_command(Command { id: SORT,
                             name: "sort".into(),
                             description: String::new(),
                             software_id: None });
    for (id, ptype, locus) in [(100, 10, 1), (101, 11, 2)] {
        cc.add_parameter(Parameter { id: EntityId::Persisted(id),
                                     name: format!("param{id}"),
                                     description: String::new(),
                                     template: String::new(),
                                     is_mandatory: true,
                                     locus,
                                     min_items: 1,
                                     max_items: 1,
                                     parameter_type_id: EntityId::Persisted(ptype),
                                     command_id: SORT });
    }
    cc
}

/// Comando de sólo entrada: la fila no tiene slots de salida.
fn index_bundle() -> CommandConstructor {
    let mut cc = CommandConstructor::new();
    cc.add_filetype(Filetype { id: BAM,
                               name: "BAM".into(),
                               extension: "bam".into(),
                               parent_file_type_id: None });
    cc.add_parameter_type(ParameterType { id: EntityId::Persisted(10),
                                          name: "input".into(),
                                          description: String::new(),
                                          file_type_id: Some(BAM) });
    cc.add_command(Command { id: INDEX,
                             name: "index".into(),
                             description: String::new(),
                             software_id: None });
    cc.add_parameter(Parameter { id: EntityId::Persisted(110),
                                 name: "bam".into(),
                                 description: String::new(),
                                 template: String::new(),
                                 is_mandatory: true,
                                 locus: 1,
                                 min_items: 1,
                                 max_items: 1,
                                 parameter_type_id: EntityId::Persisted(10),
                                 command_id: INDEX });
    cc
}

fn add_sort(wb: &mut Workbench) -> EntityId {
    wb.apply_one(SessionAction::AddCommand { bundle: sort_bundle() }).expect("add");
    *wb.constructor().processes.keys().last().expect("process")
}

fn place(wb: &mut Workbench, source: DragSource, consumer: EntityId) {
    let target = wb.table().row(consumer).expect("row").inputs[0].ppv_id;
    wb.apply_one(SessionAction::Drop { source, target }).expect("drop");
}

/// p1 lee F1, p2 consume la salida de p1, p3 sin entradas.
fn chain() -> (Workbench, [EntityId; 3]) {
    let catalog: FileCatalog = [F1, F2].into_iter()
                                       .map(|h| ProjectFile { hash: FileHash::new(h),
                                                              name: String::new(),
                                                              filetype_id: BAM })
                                       .collect();
    let mut wb = Workbench::new(SessionContext::default(), catalog);
    let p1 = add_sort(&mut wb);
    let p2 = add_sort(&mut wb);
    let p3 = add_sort(&mut wb);
    place(&mut wb, DragSource::ExistingFile { hash: FileHash::new(F1) }, p1);
    let out = wb.table().row(p1).expect("row").outputs[0].ppv_id;
    place(&mut wb, DragSource::Output { slot_id: out }, p2);
    (wb, [p1, p2, p3])
}

fn project(wb: &Workbench, settings: &PreviewSettings, lines: Option<&Commandlines>) -> GraphDescription {
    project_table(wb.constructor(), wb.table(), wb.catalog(), settings, lines).expect("graph")
}

#[test]
fn table_projection_marks_ready_rows_and_links_inputs() {
    let (wb, [p1, p2, p3]) = chain();
    let g = project(&wb, &PreviewSettings::default(), None);
    let (p1s, p2s, p3s) = (p1.to_string(), p2.to_string(), p3.to_string());

    let n1 = g.node(&p1s).expect("p1 node");
    assert_eq!(n1.attrs["label"], "sort");
    assert_eq!(n1.attrs["color"], "#00a000");
    assert_eq!(n1.attrs["penwidth"], "2");
    assert_eq!(g.node(&p3s).expect("p3 node").attrs["color"], "#f00000");

    let into_p1 = g.edges_to(&p1s);
    assert_eq!((into_p1.len(), into_p1[0].from.as_str()), (1, F1));
    let into_p2 = g.edges_to(&p2s);
    let token = wb.table().row(p1).expect("row").outputs[0].token;
    assert_eq!(into_p2[0].from, p1s);
    assert_eq!(into_p2[0].attrs["label"], format!(" File: {token}"));

    // la salida de p2 no la consume nadie: nodo suelto sin borde
    let loose = wb.table().row(p2).expect("row").outputs[0].token.to_string();
    assert_eq!(g.node(&loose).expect("token node").attrs["shape"], "none");
    assert_eq!(g.edges_to(&loose)[0].from, p2s);
    assert!(g.node(&token.to_string()).is_none());

    let file = g.node(F1).expect("file node");
    assert_eq!(file.attrs["label"], "File:a1b2c...");
    assert_eq!(file.attrs["URL"], F1);
    assert_eq!(file.attrs["fontcolor"], "#0000FF");
    assert!(g.node(F2).is_none());
}

#[test]
fn options_hide_unready_rows_colors_and_swap_labels() {
    let (wb, [p1, _, p3]) = chain();
    let lines = Commandlines::new(vec![Commandline { step: 0,
                                                     process_id: p1,
                                                     command: "samtools sort a1b2c3d4e5f6".into() }]);
    let settings = PreviewSettings { use_colors: false,
                                     add_commands_to_graph: true,
                                     show_not_ready: false,
                                     ..PreviewSettings::default() };
    let g = project(&wb, &settings, Some(&lines));
    assert!(g.node(&p3.to_string()).is_none());
    let n1 = g.node(&p1.to_string()).expect("p1 node");
    assert_eq!(n1.attrs["label"], "samtools sort a1b2c3d4e5f6");
    assert_eq!(n1.attrs["tooltip"], "sort");
    assert!(!n1.attrs.contains_key("color"));
    assert!(!g.node(F1).expect("file").attrs.contains_key("fontcolor"));
}

#[test]
fn json_shape_matches_the_drawing_service() {
    let (wb, [p1, p2, _]) = chain();
    let value = serde_json::to_value(project(&wb, &PreviewSettings::default(), None)).expect("json");
    assert_eq!(value["graphs"][0]["graph"]["id"], json!("svgGraph"));
    assert_eq!(value["graphs"][0]["global"], json!({ "directed": "1", "name": "svg" }));
    let node = value["nodes"].as_array()
                             .and_then(|nodes| nodes.iter().find(|n| n["name"] == json!(p1.to_string())))
                             .cloned()
                             .expect("p1 node");
    assert_eq!(node["id"], json!(p1.to_string()));

    let deps = serde_json::to_value(project_dependencies(wb.constructor(), &PreviewSettings::default())).expect("deps");
    assert_eq!(deps["edges"], json!([{ "from": p2.to_string(), "to": p1.to_string() }]));
    assert_eq!(deps["nodes"].as_array().map(Vec::len), Some(3));
}

#[test]
fn rows_without_outputs_still_carry_the_readiness_marker() {
    let (mut wb, _) = chain();
    wb.apply_one(SessionAction::AddCommand { bundle: index_bundle() }).expect("add index");
    let index = *wb.constructor().processes.keys().last().expect("index process");
    assert!(wb.table().row(index).expect("row").outputs.is_empty());

    let name = index.to_string();
    let g = project(&wb, &PreviewSettings::default(), None);
    assert_eq!(g.node(&name).expect("index node").attrs["color"], "#f00000");
    assert_eq!(g.node(&name).expect("index node").attrs["penwidth"], "2");

    place(&mut wb, DragSource::ExistingFile { hash: FileHash::new(F2) }, index);
    let g = project(&wb, &PreviewSettings::default(), None);
    assert_eq!(g.node(&name).expect("index node").attrs["color"], "#00a000");
}
