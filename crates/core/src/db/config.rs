use serde::{Deserialize, Serialize};

use crate::sdg::{ControlDependenceOptions, DataDependenceOptions};

/// Location of the project database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the project database file (typically relative to project root).
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// External programs used to render and view slice graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Graphviz `dot` executable.
    #[serde(default = "default_dot")]
    pub dot: String,
    /// PDF viewer launched with the rendered graph.
    #[serde(default = "default_viewer")]
    pub viewer: String,
}

fn default_dot() -> String {
    "dot".to_string()
}

fn default_viewer() -> String {
    "evince".to_string()
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self { dot: default_dot(), viewer: default_viewer() }
    }
}

/// Dependence options used when the command line does not name any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceDefaults {
    #[serde(default)]
    pub data_options: DataDependenceOptions,
    #[serde(default)]
    pub control_options: ControlDependenceOptions,
}

/// Serializable configuration describing a slicing project.
///
/// This lives at `.slicer/project.json` in the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-friendly project name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Schema/config version. This is about the config format, not the program.
    pub config_version: String,
    /// Database configuration (path is typically relative to project root).
    pub db: DbConfig,
    #[serde(default)]
    pub tools: ToolConfig,
    #[serde(default)]
    pub defaults: SliceDefaults,
}

impl ProjectConfig {
    /// Create a new project configuration using the given name and db path.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
            tools: ToolConfig::default(),
            defaults: SliceDefaults::default(),
        }
    }
}
