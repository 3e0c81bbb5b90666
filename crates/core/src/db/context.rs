use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::db::{open_project_db, ProgramRecord, ProjectConfig, ProjectDb, ProjectLayout};

/// Layout, config, db path and an open ProjectDb for one project root.
#[derive(Debug)]
pub struct ProjectContext {
    pub layout: ProjectLayout,
    pub config: ProjectConfig,
    pub db_path: PathBuf,
    pub db: ProjectDb,
}

impl ProjectContext {
    /// Load project config and open the database for a given root.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = ProjectLayout::new(root);
        let (config, db_path, db) = open_project_db(&layout)?;
        Ok(Self { layout, config, db_path, db })
    }

    /// Registered program by name.
    pub fn program(&self, name: &str) -> Result<ProgramRecord> {
        let programs = self.db.list_programs().context("Failed to list programs")?;
        programs
            .into_iter()
            .find(|p| p.name == name)
            .with_context(|| format!("Program '{name}' is not registered in this project"))
    }

    /// Absolute path of a program model file; relative paths are resolved against the root.
    pub fn program_path(&self, record: &ProgramRecord) -> PathBuf {
        let path = Path::new(&record.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.layout.root.join(path)
        }
    }
}
