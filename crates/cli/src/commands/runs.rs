use anyhow::{Context, Result};
use sdg_core::db::ProjectLayout;

use crate::canonicalize_or_current;
use crate::commands::open_project_db;

/// List recorded slice runs, optionally for one program.
pub fn list_runs_command(root: &str, program: Option<&str>, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);
    let (_config, _db_path, db) = open_project_db(&layout)?;
    let runs = db.list_slice_runs(program).context("Failed to list slice runs")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    println!("Slice runs:");
    if runs.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for run in runs {
        println!(
            "- {} [{}] {} dir={} data={} control={} size={} edges={} at {}",
            run.program,
            run.status,
            run.seed,
            run.direction,
            run.data_options,
            run.control_options,
            run.slice_size,
            run.edge_count,
            run.finished_at
        );
        if let Some(message) = &run.message {
            println!("    {message}");
        }
    }

    Ok(())
}
