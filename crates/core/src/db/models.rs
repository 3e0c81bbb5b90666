use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A program model file registered with the project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgramRecord {
    /// Short name used on the command line (e.g., "demo").
    pub name: String,
    /// Path to the model file, relative to the project root if possible.
    pub path: String,
    /// SHA-256 of the file contents at registration time.
    pub hash: Option<String>,
}

impl ProgramRecord {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self { name: name.into(), path: path.into(), hash: None }
    }

    pub fn with_hash(mut self, hash: Option<String>) -> Self {
        self.hash = hash;
        self
    }
}

/// Outcome of a slice run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SliceRunStatus {
    Succeeded,
    Failed,
    Cancelled,
}

impl SliceRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SliceRunStatus::Succeeded => "succeeded",
            SliceRunStatus::Failed => "failed",
            SliceRunStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SliceRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SliceRunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "succeeded" => Ok(SliceRunStatus::Succeeded),
            "failed" => Ok(SliceRunStatus::Failed),
            "cancelled" | "canceled" => Ok(SliceRunStatus::Cancelled),
            other => Err(format!("unknown slice run status '{other}'")),
        }
    }
}

/// One execution of the slicing pipeline, as recorded in the database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SliceRunRecord {
    pub program: String,
    /// Display form of the seed statement (or the requested caller/callee on failure).
    pub seed: String,
    pub direction: String,
    pub data_options: String,
    pub control_options: String,
    pub slice_size: usize,
    pub edge_count: usize,
    pub status: SliceRunStatus,
    /// Error message for failed runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub started_at: String,
    pub finished_at: String,
}

/// A high-level snapshot of project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub config: crate::db::ProjectConfig,
    pub programs: Vec<ProgramRecord>,
    pub runs: Vec<SliceRunRecord>,
}
