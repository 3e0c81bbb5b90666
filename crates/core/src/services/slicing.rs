use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::callgraph::{CallGraph, CallGraphError};
use crate::cancel::CancellationToken;
use crate::db::{ProjectContext, SliceRunRecord, SliceRunStatus};
use crate::model::Program;
use crate::pointsto::AndersenPointsTo;
use crate::present::{render_dot, SourceLineTable, StatementLabeler};
use crate::prune::{prune, GraphIntegrityError};
use crate::sdg::{build_sdg, ControlDependenceOptions, DataDependenceOptions, SdgError};
use crate::slicer::{find_call_to, find_method, Direction, SeedError, SliceError, Slicer};

/// Everything needed to slice one program from a call statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceRequest {
    pub program_name: String,
    pub program_path: PathBuf,
    /// Class whose `main` methods are the call graph entrypoints.
    pub main_class: String,
    /// Name of the method containing the statement of interest.
    pub src_caller: String,
    /// Name of the method called by the statement of interest.
    pub src_callee: String,
    pub direction: Direction,
    pub data: DataDependenceOptions,
    pub control: ControlDependenceOptions,
}

/// Result of the slicing pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct SliceOutcome {
    /// Statement the slice was computed from (after the forward redirect).
    pub seed: String,
    pub direction: Direction,
    pub data_options: DataDependenceOptions,
    pub control_options: ControlDependenceOptions,
    pub sdg_statements: usize,
    pub sdg_edges: usize,
    pub slice_size: usize,
    pub pruned_edges: usize,
    pub statements: Vec<String>,
    pub source_lines: SourceLineTable,
    #[serde(skip)]
    pub dot: String,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Program model not found at {0}")]
    MissingProgram(PathBuf),
    #[error("Failed to load program model: {0}")]
    Load(String),
    #[error(transparent)]
    CallGraph(#[from] CallGraphError),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Build(#[from] SdgError),
    #[error(transparent)]
    Slice(#[from] SliceError),
    #[error(transparent)]
    Integrity(#[from] GraphIntegrityError),
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            PipelineError::Build(SdgError::Cancelled)
                | PipelineError::Slice(SliceError::Cancelled)
                | PipelineError::Slice(SliceError::Build(SdgError::Cancelled))
        )
    }
}

/// Call graph, points-to, dependence graph, seed, slice, prune and render.
pub fn run_pipeline(
    program: &Program,
    request: &SliceRequest,
    cancel: Option<&CancellationToken>,
) -> Result<SliceOutcome, PipelineError> {
    let cg = CallGraph::for_main_class(program, &request.main_class)?;
    let pts = AndersenPointsTo::analyze(program, &cg);
    let sdg = build_sdg(program, &cg, &pts, request.data, request.control, cancel)?;

    let caller = find_method(&cg, program, &request.src_caller)?;
    let seed = find_call_to(&cg, program, caller, &request.src_callee)?;
    info!(%seed, "seed statement");

    let mut slicer = Slicer::new(&sdg);
    if let Some(token) = cancel {
        slicer = slicer.with_cancellation(token.clone());
    }
    let effective = slicer.effective_seed(&seed, request.direction)?;
    let slice = slicer.compute_slice(&seed, request.direction, request.data, request.control)?;
    let pruned = prune(&sdg, &slice)?;

    let labeler = StatementLabeler::new(program, &cg);
    let outcome = SliceOutcome {
        seed: effective.to_string(),
        direction: request.direction,
        data_options: request.data,
        control_options: request.control,
        sdg_statements: sdg.statement_count(),
        sdg_edges: sdg.edge_count(),
        slice_size: slice.len(),
        pruned_edges: pruned.edge_count(),
        statements: labeler.dump_slice(&slice),
        source_lines: labeler.source_line_table(&slice),
        dot: render_dot(&pruned, &labeler),
    };
    info!(slice = outcome.slice_size, edges = outcome.pruned_edges, "slice pruned");
    Ok(outcome)
}

/// Coordinator that runs the pipeline for a project and records the run.
pub struct SliceRunner<'a> {
    pub ctx: &'a ProjectContext,
}

impl<'a> SliceRunner<'a> {
    pub fn run(
        &self,
        request: &SliceRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<SliceOutcome, PipelineError> {
        let started_at = Utc::now().to_rfc3339();
        let result = self.load_and_slice(request, cancel);

        let (status, seed, size, edges, message) = match &result {
            Ok(outcome) => (
                SliceRunStatus::Succeeded,
                outcome.seed.clone(),
                outcome.slice_size,
                outcome.pruned_edges,
                None,
            ),
            Err(err) => {
                let status =
                    if err.is_cancelled() { SliceRunStatus::Cancelled } else { SliceRunStatus::Failed };
                let seed = format!("{} -> {}", request.src_caller, request.src_callee);
                (status, seed, 0, 0, Some(err.to_string()))
            }
        };
        let record = SliceRunRecord {
            program: request.program_name.clone(),
            seed,
            direction: request.direction.to_string(),
            data_options: request.data.to_string(),
            control_options: request.control.to_string(),
            slice_size: size,
            edge_count: edges,
            status,
            message,
            started_at,
            finished_at: Utc::now().to_rfc3339(),
        };
        if let Err(err) = self.ctx.db.insert_slice_run(&record) {
            warn!(error = %err, "failed to record slice run");
        }
        result
    }

    fn load_and_slice(
        &self,
        request: &SliceRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<SliceOutcome, PipelineError> {
        if !request.program_path.is_file() {
            return Err(PipelineError::MissingProgram(request.program_path.clone()));
        }
        let program = Program::load(&request.program_path)
            .map_err(|err| PipelineError::Load(format!("{err:#}")))?;
        run_pipeline(&program, request, cancel)
    }
}
