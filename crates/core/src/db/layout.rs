use std::path::{Path, PathBuf};

/// Logical layout of a project on disk.
///
/// This is derived from a chosen root path. It does *not* perform any IO itself.
/// The CLI is responsible for creating directories and files based on this layout.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// Root directory of the project.
    pub root: PathBuf,
    /// Directory for internal metadata (.slicer).
    pub meta_dir: PathBuf,
    /// Path to the project config file (JSON).
    pub project_config_path: PathBuf,
    /// Path to the project database file.
    pub db_path: PathBuf,
    /// Directory where registered program model files are kept.
    pub programs_dir: PathBuf,
    /// Directory for DOT/PDF renderings of pruned slices.
    pub graphs_dir: PathBuf,
    /// Directory for slice reports (JSON).
    pub reports_dir: PathBuf,
}

impl ProjectLayout {
    /// Compute the default layout for a project rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".slicer");
        let project_config_path = meta_dir.join("project.json");
        let db_path = meta_dir.join("project.db");
        let programs_dir = root.join("programs");
        let graphs_dir = root.join("graphs");
        let reports_dir = root.join("reports");

        Self { root, meta_dir, project_config_path, db_path, programs_dir, graphs_dir, reports_dir }
    }

    /// Compute a database path string suitable for storing in `ProjectConfig`,
    /// typically as a path relative to `root`.
    pub fn db_path_relative_string(&self) -> String {
        match self.db_path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => self.db_path.to_string_lossy().to_string(),
        }
    }

    /// DOT file for a named slice run.
    pub fn graph_dot_path(&self, run_name: &str) -> PathBuf {
        self.graphs_dir.join(format!("{run_name}.dot"))
    }

    /// PDF rendering for a named slice run.
    pub fn graph_pdf_path(&self, run_name: &str) -> PathBuf {
        self.graphs_dir.join(format!("{run_name}.pdf"))
    }

    /// JSON report for a named slice run.
    pub fn report_path(&self, run_name: &str) -> PathBuf {
        self.reports_dir.join(format!("{run_name}.json"))
    }
}
