use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

/// Render a DOT file to PDF with Graphviz (`<dot> -Tpdf -o <pdf> <dot_file>`).
pub fn render_pdf(dot_tool: &str, dot_path: &Path, pdf_path: &Path) -> Result<()> {
    debug!(tool = dot_tool, dot = %dot_path.display(), "rendering slice graph");
    let output = Command::new(dot_tool)
        .arg("-Tpdf")
        .arg("-o")
        .arg(pdf_path)
        .arg(dot_path)
        .output()
        .with_context(|| format!("Failed to run '{dot_tool}'; is Graphviz installed?"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("'{dot_tool}' exited with {}: {}", output.status, stderr.trim()));
    }
    info!(pdf = %pdf_path.display(), "slice graph rendered");
    Ok(())
}

/// Launch the PDF viewer without waiting for it to exit.
pub fn open_viewer(viewer: &str, pdf_path: &Path) -> Result<()> {
    Command::new(viewer)
        .arg(pdf_path)
        .spawn()
        .with_context(|| format!("Failed to launch viewer '{viewer}' for {}", pdf_path.display()))?;
    Ok(())
}
