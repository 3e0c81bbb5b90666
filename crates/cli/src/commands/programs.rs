use std::path::Path;

use anyhow::{anyhow, Context, Result};
use sdg_core::db::{ProgramRecord, ProjectLayout};
use sdg_core::model::{Program, ProgramModel};

use crate::commands::open_project_db;
use crate::{canonicalize_or_current, relative_to_root, sha256_file};

/// Register a program model file in the project database.
///
/// The file is parsed once so broken models are rejected at registration time.
pub fn add_program_command(
    root: &str,
    path: &str,
    name: Option<String>,
    hash: Option<String>,
    skip_hash: bool,
) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);
    let (_config, db_path, db) = open_project_db(&layout)?;

    let input_path = Path::new(path);
    let abs_path =
        if input_path.is_absolute() { input_path.to_path_buf() } else { root_path.join(input_path) };
    if !abs_path.is_file() {
        return Err(anyhow!("Program model file does not exist: {}", abs_path.display()));
    }

    let program = Program::load(&abs_path)?;
    let method_count = program.methods().len();

    let rel_path = relative_to_root(&root_path, &abs_path).to_string_lossy().to_string();
    let program_name = name.unwrap_or_else(|| {
        input_path.file_stem().and_then(|os| os.to_str()).unwrap_or(path).to_string()
    });

    let hash = if let Some(h) = hash {
        Some(h)
    } else if skip_hash {
        None
    } else {
        Some(sha256_file(&abs_path)?)
    };

    let record = ProgramRecord::new(program_name, rel_path).with_hash(hash);
    let id = db.insert_program(&record).context("Failed to insert program record")?;

    println!("Added program:");
    println!("  Id: {}", id);
    println!("  Name: {}", record.name);
    println!("  Path (relative): {}", record.path);
    println!("  Methods: {}", method_count);
    println!("  DB: {}", db_path.display());

    Ok(())
}

/// List all programs registered in the project database.
pub fn list_programs_command(root: &str, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);
    let (_config, _db_path, db) = open_project_db(&layout)?;
    let programs = db.list_programs().context("Failed to list programs")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&programs)?);
        return Ok(());
    }

    println!("Programs:");
    if programs.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for program in programs {
        let hash_display = program.hash.as_deref().unwrap_or("(none)");
        println!("- {} (path: {}, hash: {})", program.name, program.path, hash_display);
    }

    Ok(())
}
