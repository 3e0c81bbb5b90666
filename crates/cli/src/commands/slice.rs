use std::fs;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use sdg_core::db::ProjectContext;
use sdg_core::sdg::{ControlDependenceOptions, DataDependenceOptions};
use sdg_core::services::{SliceOutcome, SliceRequest, SliceRunner};
use sdg_core::slicer::Direction;
use serde::Serialize;
use tracing::info;

use crate::canonicalize_or_current;
use crate::commands::{open_viewer, render_pdf};

/// Options of the `slice` command.
#[derive(Args, Debug, Clone)]
pub struct SliceArgs {
    /// Project root directory. Defaults to the current working directory.
    #[arg(long, default_value = ".")]
    pub root: String,

    /// Name of a registered program.
    #[arg(long)]
    pub program: String,

    /// Class whose `main` methods are the analysis entrypoints (e.g. `Lslice/Demo`).
    #[arg(long)]
    pub main_class: String,

    /// Method containing the call to slice from.
    #[arg(long)]
    pub src_caller: String,

    /// Method called by the statement to slice from.
    #[arg(long)]
    pub src_callee: String,

    /// `backward` (default) or `forward`.
    #[arg(long)]
    pub dir: Option<Direction>,

    /// Data dependence precision: full, no_base_ptrs, no_base_no_heap, no_heap,
    /// no_base_no_heap_no_cast or none. Defaults to the project setting.
    #[arg(long)]
    pub dd: Option<DataDependenceOptions>,

    /// Control dependence: full or none. Defaults to the project setting.
    #[arg(long)]
    pub cd: Option<ControlDependenceOptions>,

    /// Render the pruned graph to PDF with Graphviz.
    #[arg(long, default_value_t = false)]
    pub render: bool,

    /// Render and open the PDF in the configured viewer.
    #[arg(long, default_value_t = false)]
    pub view: bool,

    /// Emit JSON instead of human-readable text.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Serialize)]
struct SliceReport<'a> {
    run: &'a str,
    program: &'a str,
    dot_path: String,
    pdf_path: Option<String>,
    #[serde(flatten)]
    outcome: &'a SliceOutcome,
}

/// Compute a slice of a registered program and write its pruned graph.
pub fn slice_command(args: &SliceArgs) -> Result<()> {
    let root_path = canonicalize_or_current(&args.root)?;
    let ctx = ProjectContext::from_root(&root_path)?;
    let record = ctx.program(&args.program)?;

    let direction = args.dir.unwrap_or_default();
    let data = args.dd.unwrap_or(ctx.config.defaults.data_options);
    let control = args.cd.unwrap_or(ctx.config.defaults.control_options);

    let request = SliceRequest {
        program_name: record.name.clone(),
        program_path: ctx.program_path(&record),
        main_class: args.main_class.clone(),
        src_caller: args.src_caller.clone(),
        src_callee: args.src_callee.clone(),
        direction,
        data,
        control,
    };
    let outcome = SliceRunner { ctx: &ctx }
        .run(&request, None)
        .with_context(|| format!("Failed to slice program '{}'", record.name))?;

    let run_name = format!("{}-{}", record.name, Utc::now().format("%Y%m%d-%H%M%S%3f"));
    let layout = &ctx.layout;
    fs::create_dir_all(&layout.graphs_dir)
        .with_context(|| format!("Failed to create graphs dir: {}", layout.graphs_dir.display()))?;
    let dot_path = layout.graph_dot_path(&run_name);
    fs::write(&dot_path, &outcome.dot)
        .with_context(|| format!("Failed to write slice graph: {}", dot_path.display()))?;

    let pdf_path = if args.render || args.view {
        let pdf_path = layout.graph_pdf_path(&run_name);
        render_pdf(&ctx.config.tools.dot, &dot_path, &pdf_path)?;
        if args.view {
            open_viewer(&ctx.config.tools.viewer, &pdf_path)?;
        }
        Some(pdf_path)
    } else {
        None
    };

    let report = SliceReport {
        run: &run_name,
        program: &record.name,
        dot_path: dot_path.display().to_string(),
        pdf_path: pdf_path.as_ref().map(|p| p.display().to_string()),
        outcome: &outcome,
    };
    let report_json = serde_json::to_string_pretty(&report)?;
    fs::create_dir_all(&layout.reports_dir)
        .with_context(|| format!("Failed to create reports dir: {}", layout.reports_dir.display()))?;
    let report_path = layout.report_path(&run_name);
    fs::write(&report_path, &report_json)
        .with_context(|| format!("Failed to write slice report: {}", report_path.display()))?;
    info!(run = %run_name, report = %report_path.display(), "slice report written");

    if args.json {
        println!("{}", report_json);
        return Ok(());
    }

    println!("Slice of {} ({}):", record.name, run_name);
    println!("  Seed: {}", outcome.seed);
    println!(
        "  Options: dir={}, data={}, control={}",
        outcome.direction, outcome.data_options, outcome.control_options
    );
    println!("  Dependence graph: {} statements, {} edges", outcome.sdg_statements, outcome.sdg_edges);
    println!("  Slice: {} statements, {} edges", outcome.slice_size, outcome.pruned_edges);
    println!("  Graph: {}", dot_path.display());
    if let Some(pdf) = &pdf_path {
        println!("  PDF: {}", pdf.display());
    }
    println!();
    println!("Statements:");
    for line in &outcome.statements {
        println!("  {line}");
    }
    println!();
    println!("Source lines:");
    if outcome.source_lines.is_empty() {
        println!("  (none)");
    }
    for (class, methods) in &outcome.source_lines {
        println!("  {class}");
        for (method, lines) in methods {
            let lines: Vec<String> = lines.iter().map(u32::to_string).collect();
            println!("    {method}: {}", lines.join(", "));
        }
    }

    Ok(())
}
