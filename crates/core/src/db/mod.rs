//! Project layout, configuration and the SQLite project database.
//!
//! A project keeps its metadata under `.slicer/` in the project root:
//! - `ProjectLayout`: computed paths for project directories/files.
//! - `ProjectConfig`: serializable project metadata (`project.json`).
//! - `ProjectDb`: SQLite wrapper with `PRAGMA user_version` migrations.
//! - Record types (`ProgramRecord`, `SliceRunRecord`) stored in the database.

mod config;
mod context;
mod layout;
mod models;
mod project_db;
mod util;

pub use config::{DbConfig, ProjectConfig, SliceDefaults, ToolConfig};
pub use context::ProjectContext;
pub use layout::ProjectLayout;
pub use models::{ProgramRecord, ProjectSnapshot, SliceRunRecord, SliceRunStatus};
pub use project_db::{DbError, DbResult, ProjectDb, CURRENT_SCHEMA_VERSION};
pub use util::{load_project_config, open_project_db, resolve_db_path};
