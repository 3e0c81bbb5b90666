use std::fs;

use anyhow::{Context, Result};
use sdg_core::db::{ProjectConfig, ProjectDb, ProjectLayout, ProjectSnapshot};

use crate::commands::{open_project_db, print_dir_status};
use crate::{canonicalize_or_current, infer_project_name};

/// Initialize a new project at `root`.
pub fn init_project_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    let project_name = match name {
        Some(n) => n,
        None => infer_project_name(&root_path),
    };

    for (label, dir) in [
        ("meta dir", &layout.meta_dir),
        ("programs dir", &layout.programs_dir),
        ("graphs dir", &layout.graphs_dir),
        ("reports dir", &layout.reports_dir),
    ] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {label}: {}", dir.display()))?;
    }

    let config = ProjectConfig::new(&project_name, layout.db_path_relative_string());
    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.project_config_path, json).with_context(|| {
        format!("Failed to write project config: {}", layout.project_config_path.display())
    })?;

    // Create the database now so later commands can rely on it.
    ProjectDb::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize project database at {}", layout.db_path.display())
    })?;

    println!("Initialized slicing project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  DB path (relative): {}", config.db.path);
    println!("  Programs dir: {}", layout.programs_dir.display());
    println!("  Graphs dir: {}", layout.graphs_dir.display());
    println!("  Reports dir: {}", layout.reports_dir.display());

    Ok(())
}

/// Show basic information about an existing project.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    let (config, db_path, db) = open_project_db(&layout)?;
    let programs = db.list_programs().context("Failed to list programs")?;
    let runs = db.list_slice_runs(None).context("Failed to list slice runs")?;

    if json {
        let snapshot = ProjectSnapshot { config, programs, runs };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Slicing Project Info (sdg-core v{})", sdg_core::version());
    println!("====================");
    println!("Name: {}", config.name);
    println!("Root: {}", layout.root.display());
    println!("Config file: {}", layout.project_config_path.display());
    println!("Config version: {}", config.config_version);
    println!("DB path: {}", db_path.display());
    println!(
        "Default options: data={}, control={}",
        config.defaults.data_options, config.defaults.control_options
    );
    println!("Tools: dot={}, viewer={}", config.tools.dot, config.tools.viewer);
    println!();

    println!("Directories:");
    print_dir_status("Meta dir (.slicer)", &layout.meta_dir);
    print_dir_status("Programs dir", &layout.programs_dir);
    print_dir_status("Graphs dir", &layout.graphs_dir);
    print_dir_status("Reports dir", &layout.reports_dir);
    println!();

    println!("Programs: {}", programs.len());
    println!("Slice runs: {}", runs.len());
    if let Some(last) = runs.last() {
        println!("Last run: {} {} [{}] at {}", last.program, last.seed, last.status, last.finished_at);
    }

    Ok(())
}
