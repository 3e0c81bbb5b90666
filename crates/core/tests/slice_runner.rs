mod common;

use std::fs;
use std::path::{Path, PathBuf};

use common::demo_program;
use sdg_core::cancel::CancellationToken;
use sdg_core::db::{ProgramRecord, ProjectConfig, ProjectContext, ProjectLayout, SliceRunStatus};
use sdg_core::sdg::{ControlDependenceOptions, DataDependenceOptions};
use sdg_core::services::{PipelineError, SliceRequest, SliceRunner};
use sdg_core::slicer::{Direction, SliceError};
use tempfile::tempdir;

fn init_project(root: &Path) -> ProjectContext {
    let layout = ProjectLayout::new(root);
    fs::create_dir_all(&layout.meta_dir).expect("meta dir");
    fs::create_dir_all(&layout.programs_dir).expect("programs dir");
    let config = ProjectConfig::new("demo-project", layout.db_path_relative_string());
    fs::write(&layout.project_config_path, serde_json::to_string_pretty(&config).expect("config"))
        .expect("write config");

    let program_path = layout.programs_dir.join("demo.json");
    fs::write(&program_path, serde_json::to_string(demo_program().source()).expect("program"))
        .expect("write program");

    let ctx = ProjectContext::from_root(root).expect("context");
    ctx.db.insert_program(&ProgramRecord::new("demo", "programs/demo.json")).expect("register");
    ctx
}

fn request(ctx: &ProjectContext, direction: Direction) -> SliceRequest {
    let record = ctx.program("demo").expect("program record");
    SliceRequest {
        program_name: record.name.clone(),
        program_path: ctx.program_path(&record),
        main_class: "Demo".into(),
        src_caller: "main".into(),
        src_callee: "print".into(),
        direction,
        data: DataDependenceOptions::Full,
        control: ControlDependenceOptions::Full,
    }
}

#[test]
fn successful_run_is_recorded() {
    let dir = tempdir().expect("tempdir");
    let ctx = init_project(dir.path());
    let runner = SliceRunner { ctx: &ctx };

    let outcome = runner.run(&request(&ctx, Direction::Backward), None).expect("slice");
    assert_eq!(outcome.seed, "NORMAL n0:4");
    assert_eq!(outcome.slice_size, outcome.statements.len());
    assert!(outcome.dot.starts_with("digraph Slice"));
    assert!(outcome.source_lines["Demo"]["Demo.main(String[])void"].contains(&8));

    let runs = ctx.db.list_slice_runs(Some("demo")).expect("runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, SliceRunStatus::Succeeded);
    assert_eq!(runs[0].seed, "NORMAL n0:4");
    assert_eq!(runs[0].slice_size, outcome.slice_size);
    assert_eq!(runs[0].edge_count, outcome.pruned_edges);
    assert_eq!(runs[0].direction, "backward");
    assert!(runs[0].message.is_none());
}

#[test]
fn forward_run_from_void_call_is_recorded_as_failed() {
    let dir = tempdir().expect("tempdir");
    let ctx = init_project(dir.path());
    let runner = SliceRunner { ctx: &ctx };

    let err = runner.run(&request(&ctx, Direction::Forward), None).unwrap_err();
    assert!(matches!(err, PipelineError::Slice(SliceError::InvalidSliceSeed { .. })));

    let runs = ctx.db.list_slice_runs(None).expect("runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, SliceRunStatus::Failed);
    assert_eq!(runs[0].seed, "main -> print");
    assert!(runs[0].message.as_deref().is_some_and(|m| m.contains("returns void")));
}

#[test]
fn cancelled_run_is_recorded_as_cancelled() {
    let dir = tempdir().expect("tempdir");
    let ctx = init_project(dir.path());
    let runner = SliceRunner { ctx: &ctx };
    let token = CancellationToken::new();
    token.cancel();

    let err = runner.run(&request(&ctx, Direction::Backward), Some(&token)).unwrap_err();
    assert!(err.is_cancelled());
    let runs = ctx.db.list_slice_runs(None).expect("runs");
    assert_eq!(runs[0].status, SliceRunStatus::Cancelled);
}

#[test]
fn missing_program_file_fails_without_slicing() {
    let dir = tempdir().expect("tempdir");
    let ctx = init_project(dir.path());
    let runner = SliceRunner { ctx: &ctx };
    let mut req = request(&ctx, Direction::Backward);
    req.program_path = PathBuf::from(dir.path()).join("programs/gone.json");

    let err = runner.run(&req, None).unwrap_err();
    assert!(matches!(err, PipelineError::MissingProgram(_)));
    let runs = ctx.db.list_slice_runs(None).expect("runs");
    assert_eq!(runs[0].status, SliceRunStatus::Failed);
    assert!(runs[0].message.as_deref().is_some_and(|m| m.contains("gone.json")));
}

#[test]
fn unknown_program_name_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let ctx = init_project(dir.path());
    let err = ctx.program("nope").unwrap_err();
    assert!(err.to_string().contains("not registered"));
}
