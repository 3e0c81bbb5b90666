mod common;

use std::fs;

use common::{calc_program, demo_program};
use sdg_core::model::{Program, ProgramModel};
use tempfile::tempdir;

#[test]
fn program_model_loads_from_json_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("demo.json");
    let program = demo_program();
    fs::write(&path, serde_json::to_string_pretty(program.source()).expect("json")).expect("write");

    let loaded = Program::load(&path).expect("load");
    assert_eq!(loaded.source(), program.source());
    let main = loaded.method("Demo.main(String[])void").expect("main");
    assert_eq!(main.line_number(4), Some(9));
}

#[test]
fn non_json_extensions_are_read_as_yaml() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("calc.model");
    let program = calc_program();
    fs::write(&path, serde_yaml::to_string(program.source()).expect("yaml")).expect("write");

    let loaded = Program::load(&path).expect("load");
    assert_eq!(loaded.source(), program.source());
    assert_eq!(loaded.main_entrypoints("Calc"), vec!["Calc.main(String[])void".to_string()]);
}

#[test]
fn handwritten_yaml_with_classes_resolves_virtual_calls() {
    let yaml = r#"
classes:
  - { name: Shape, is_interface: true }
  - { name: Square, interfaces: [Shape] }
methods:
  - signature: { class: App, name: main, params: ["String[]"] }
    params: [1]
    instructions:
      - { inst: new, def: 2, class: Square, line: 4 }
      - inst: invoke
        def: 3
        target: { class: Shape, name: area, returns: int }
        args: [2]
        kind: interface
        line: 5
      - { inst: return, line: 6 }
  - signature: { class: Square, name: area, returns: int }
    is_static: false
    params: [1]
    instructions:
      - { inst: const, def: 2, literal: "4" }
      - { inst: return, value: 2 }
"#;
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("shapes.yaml");
    fs::write(&path, yaml).expect("write");

    let program = Program::load(&path).expect("load");
    let cg = sdg_core::callgraph::CallGraph::for_main_class(&program, "App").expect("call graph");
    let main = cg.node_for_method("App.main(String[])void").expect("main node");
    let targets = cg.targets(main, 1);
    assert_eq!(targets.len(), 1);
    assert_eq!(cg.node(targets[0]).expect("callee").method, "Square.area()int");
}

#[test]
fn unreadable_and_malformed_files_report_context() {
    let dir = tempdir().expect("tempdir");
    let missing = Program::load(&dir.path().join("missing.json")).unwrap_err();
    assert!(missing.to_string().contains("Failed to read program model"));

    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"methods\": [ { \"signature\": 3 } ] }").expect("write");
    let broken = Program::load(&path).unwrap_err();
    assert!(broken.to_string().contains("Failed to parse program model JSON"));
}
