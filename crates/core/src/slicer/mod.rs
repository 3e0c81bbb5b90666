//! Slicing over a built dependence graph.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::callgraph::CallGraph;
use crate::cancel::CancellationToken;
use crate::model::ProgramModel;
use crate::pointsto::PointsToResult;
use crate::sdg::{
    build_sdg, ControlDependenceOptions, DataDependenceOptions, DataFlavor, DependenceFilter, Sdg,
    SdgError, Slice, Statement,
};

mod seed;

pub use seed::{find_call_to, find_method, SeedError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    #[default]
    Backward,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('-') {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            other => Err(format!("unknown slice direction '{other}'; expected forward or backward")),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SliceError {
    /// Forward slices start from a call's return value, which a void call lacks.
    #[error("Cannot slice forward from a call to {signature}: it returns void")]
    InvalidSliceSeed { signature: String },

    #[error("Statement {0} is not part of the dependence graph")]
    UnknownStatement(String),

    #[error(
        "Dependence graph built with data={built_data}, control={built_control} cannot answer a query with data={requested_data}, control={requested_control}"
    )]
    UnsupportedOptions {
        built_data: DataDependenceOptions,
        built_control: ControlDependenceOptions,
        requested_data: DataDependenceOptions,
        requested_control: ControlDependenceOptions,
    },

    #[error("Slicing was cancelled")]
    Cancelled,

    #[error(transparent)]
    Build(#[from] SdgError),
}

/// Computes slices against one dependence graph.
pub struct Slicer<'g> {
    sdg: &'g Sdg,
    cancel: Option<CancellationToken>,
}

impl<'g> Slicer<'g> {
    pub fn new(sdg: &'g Sdg) -> Self {
        Self { sdg, cancel: None }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The statement a slice in `direction` actually starts from. Forward
    /// slices from a call start at the call's normal return value.
    pub fn effective_seed(&self, seed: &Statement, direction: Direction) -> Result<Statement, SliceError> {
        if direction == Direction::Backward {
            return Ok(seed.clone());
        }
        let Statement::Normal { node, index } = seed else {
            return Ok(seed.clone());
        };
        match self.sdg.declared_target(*node, *index) {
            Some(target) if target.returns_void() => {
                Err(SliceError::InvalidSliceSeed { signature: target.signature() })
            }
            Some(_) => Ok(Statement::NormalReturnCaller { node: *node, call: *index }),
            None => Ok(seed.clone()),
        }
    }

    /// All statements reachable from `seed` over the edges admitted by `data`
    /// and `control`. The (effective) seed is always a member.
    pub fn compute_slice(
        &self,
        seed: &Statement,
        direction: Direction,
        data: DataDependenceOptions,
        control: ControlDependenceOptions,
    ) -> Result<Slice, SliceError> {
        let built_data = self.sdg.data_options();
        let built_control = self.sdg.control_options();
        if !built_data.subsumes(data) || !built_control.subsumes(control) {
            return Err(SliceError::UnsupportedOptions {
                built_data,
                built_control,
                requested_data: data,
                requested_control: control,
            });
        }

        let start = self.effective_seed(seed, direction)?;
        if !self.sdg.contains(&start) {
            return Err(SliceError::UnknownStatement(start.to_string()));
        }

        let filter = DependenceFilter::new(data, control);
        let heap = data.admits(DataFlavor::Heap);
        let mut slice = Slice::new();
        let mut worklist = VecDeque::new();
        slice.insert(start.clone());
        worklist.push_back(start);

        while let Some(current) = worklist.pop_front() {
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return Err(SliceError::Cancelled);
            }
            let neighbors = match direction {
                Direction::Forward => self.sdg.successors(&current),
                Direction::Backward => self.sdg.predecessors(&current),
            };
            for (next, dependence) in neighbors {
                if !filter.admits(dependence) || (!heap && next.is_heap()) {
                    continue;
                }
                if slice.insert(next.clone()) {
                    worklist.push_back(next.clone());
                }
            }
        }

        debug!(size = slice.len(), %direction, data = %data, control = %control, "slice computed");
        Ok(slice)
    }
}

/// Build a dependence graph with the requested options and slice backward from `seed`.
pub fn compute_backward_slice(
    seed: &Statement,
    program: &dyn ProgramModel,
    call_graph: &CallGraph,
    points_to: &dyn PointsToResult,
    data: DataDependenceOptions,
    control: ControlDependenceOptions,
) -> Result<Slice, SliceError> {
    let sdg = build_sdg(program, call_graph, points_to, data, control, None)?;
    Slicer::new(&sdg).compute_slice(seed, Direction::Backward, data, control)
}

/// Build a dependence graph with the requested options and slice forward from `seed`.
pub fn compute_forward_slice(
    seed: &Statement,
    program: &dyn ProgramModel,
    call_graph: &CallGraph,
    points_to: &dyn PointsToResult,
    data: DataDependenceOptions,
    control: ControlDependenceOptions,
) -> Result<Slice, SliceError> {
    let sdg = build_sdg(program, call_graph, points_to, data, control, None)?;
    Slicer::new(&sdg).compute_slice(seed, Direction::Forward, data, control)
}
