use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use sdg_core::db::{ProjectDb, ProjectLayout};
use sha2::{Digest, Sha256};
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn init(root: &Path) {
    cargo_bin_cmd!("sdg-slicer")
        .arg("init-project")
        .arg("--root")
        .arg(root)
        .arg("--name")
        .arg("TestProject")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized slicing project"));
}

#[test]
fn init_project_uses_current_directory_by_default() {
    let dir = tempdir().expect("tempdir");
    cargo_bin_cmd!("sdg-slicer").current_dir(dir.path()).arg("init-project").assert().success();

    let layout = ProjectLayout::new(dir.path());
    assert!(layout.project_config_path.exists());
    assert!(layout.db_path.exists());
    assert!(layout.programs_dir.is_dir());
    assert!(layout.graphs_dir.is_dir());
    assert!(layout.reports_dir.is_dir());
}

#[test]
fn project_info_fails_without_config() {
    let dir = tempdir().expect("tempdir");
    cargo_bin_cmd!("sdg-slicer")
        .arg("project-info")
        .arg("--root")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read project config"));
}

#[test]
fn project_info_reports_config_and_defaults() {
    let dir = tempdir().expect("tempdir");
    init(dir.path());

    cargo_bin_cmd!("sdg-slicer")
        .arg("project-info")
        .arg("--root")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Name: TestProject"))
        .stdout(predicate::str::contains("data=full, control=full"))
        .stdout(predicate::str::contains("viewer=evince"));

    let output = cargo_bin_cmd!("sdg-slicer")
        .arg("project-info")
        .arg("--root")
        .arg(dir.path())
        .arg("--json")
        .output()
        .expect("run project-info");
    assert!(output.status.success());
    let snapshot: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(snapshot["config"]["name"], "TestProject");
    assert_eq!(snapshot["config"]["tools"]["dot"], "dot");
    assert_eq!(snapshot["programs"].as_array().map(Vec::len), Some(0));
}

#[test]
fn add_program_registers_relative_path_and_hash() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init(root);

    let program_path = root.join("programs/demo.yaml");
    fs::copy(fixture("demo.yaml"), &program_path).expect("copy fixture");

    cargo_bin_cmd!("sdg-slicer")
        .arg("add-program")
        .arg("--root")
        .arg(root)
        .arg("--path")
        .arg(&program_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Methods: 3"));

    let db = ProjectDb::open(&ProjectLayout::new(root).db_path).expect("open db");
    let programs = db.list_programs().expect("programs");
    assert_eq!(programs.len(), 1);
    assert_eq!(programs[0].name, "demo");
    assert_eq!(programs[0].path, "programs/demo.yaml");

    let mut hasher = Sha256::new();
    hasher.update(fs::read(&program_path).expect("read fixture"));
    let expected = format!("{:x}", hasher.finalize());
    assert_eq!(programs[0].hash.as_deref(), Some(expected.as_str()));
}

#[test]
fn add_program_honours_skip_hash_and_explicit_name() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init(root);
    fs::copy(fixture("calc.json"), root.join("calc.json")).expect("copy fixture");

    cargo_bin_cmd!("sdg-slicer")
        .arg("add-program")
        .arg("--root")
        .arg(root)
        .arg("--path")
        .arg("calc.json")
        .arg("--name")
        .arg("calculator")
        .arg("--skip-hash")
        .assert()
        .success();

    cargo_bin_cmd!("sdg-slicer")
        .arg("list-programs")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("- calculator (path: calc.json, hash: (none))"));
}

#[test]
fn add_program_rejects_missing_and_malformed_models() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init(root);

    cargo_bin_cmd!("sdg-slicer")
        .arg("add-program")
        .arg("--root")
        .arg(root)
        .arg("--path")
        .arg("nowhere.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Program model file does not exist"));

    fs::write(root.join("broken.json"), "{ not json").expect("write");
    cargo_bin_cmd!("sdg-slicer")
        .arg("add-program")
        .arg("--root")
        .arg(root)
        .arg("--path")
        .arg("broken.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse program model JSON"));

    cargo_bin_cmd!("sdg-slicer")
        .arg("list-programs")
        .arg("--root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("(none)"));
}

#[test]
fn duplicate_program_names_fail() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    init(root);
    fs::copy(fixture("calc.json"), root.join("calc.json")).expect("copy fixture");

    for expect_success in [true, false] {
        let assert = cargo_bin_cmd!("sdg-slicer")
            .arg("add-program")
            .arg("--root")
            .arg(root)
            .arg("--path")
            .arg("calc.json")
            .assert();
        if expect_success {
            assert.success();
        } else {
            assert.failure().stderr(predicate::str::contains("Failed to insert program record"));
        }
    }
}
